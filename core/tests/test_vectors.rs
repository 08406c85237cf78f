//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! `requests.json` describes operation inputs and the exact request each one
//! must produce; `responses.json` describes simulated responses and the
//! envelope or error they must parse into. Bodies are compared as parsed JSON,
//! not raw strings, so field order does not matter.

use boss_core::{
    ApiError, ApiResponse, BossClient, Credentials, HttpMethod, HttpRequest, HttpResponse,
    ServicePlanUpdate, SessionContext, Subscriber,
};
use chrono::NaiveDateTime;
use serde_json::Value;

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        other => panic!("unknown method: {other}"),
    }
}

fn parse_headers(value: &Value) -> Vec<(String, String)> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|h| {
            let arr = h.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect()
}

fn str_field(value: &Value, key: &str) -> String {
    value[key].as_str().unwrap().to_string()
}

fn subscriber(value: &Value) -> Subscriber {
    Subscriber {
        sub_id: str_field(value, "sub_id"),
        sub_name: str_field(value, "sub_name"),
        imsi: value["imsi"].as_u64(),
        id_num: value["id_num"].as_u64(),
        phone_number: value["phone_number"].as_u64(),
        email: value["email"].as_str().map(str::to_string),
        address: value["address"].as_str().map(str::to_string),
    }
}

fn simulated(case: &Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse {
        status: sim["status"].as_u64().unwrap() as u16,
        headers: Vec::new(),
        body: sim["body"].as_str().unwrap().to_string(),
    }
}

fn client_from(session: &Value) -> (BossClient, String) {
    let creds = Credentials::new(
        session["username"].as_str().unwrap(),
        session["password"].as_str().unwrap(),
        session["cloud_key"].as_str().unwrap(),
    );
    let clock: NaiveDateTime = session["clock"].as_str().unwrap().parse().unwrap();
    let base_url = session["base_url"].as_str().unwrap();
    let ctx = SessionContext::at(&creds, base_url, clock);
    (BossClient::new(ctx), base_url.trim_end_matches('/').to_string())
}

fn build(c: &BossClient, operation: &str, input: &Value) -> HttpRequest {
    let request = match operation {
        "query_by_imsi" => c.build_query_by_imsi(input["imsi"].as_u64().unwrap()),
        "query_by_sub_id" => c.build_query_by_sub_id(input["sub_id"].as_str().unwrap()),
        "create_subscriber" => c.build_create_subscriber(&subscriber(&input["subscriber"])),
        "bulk_create_subscribers" => {
            let subs: Vec<Subscriber> =
                input["subscribers"].as_array().unwrap().iter().map(subscriber).collect();
            c.build_bulk_create_subscribers(input["service_plan_id"].as_str().unwrap(), &subs)
        }
        "bind_service_plan" => c.build_bind_service_plan(
            input["sub_id"].as_str().unwrap(),
            input["service_plan_id"].as_str().unwrap(),
        ),
        "update_service_plan" => c.build_update_service_plan(
            input["sub_id"].as_str().unwrap(),
            input["service_plan_id"].as_str().unwrap(),
        ),
        "bind_imsi" => c.build_bind_imsi(
            input["sub_id"].as_str().unwrap(),
            input["imsi"].as_u64().unwrap(),
        ),
        "unbind_imsi" => c.build_unbind_imsi(input["sub_id"].as_str().unwrap()),
        "activate" => c.build_activate(input["sub_id"].as_str().unwrap()),
        "deactivate" => c.build_deactivate(input["sub_id"].as_str().unwrap()),
        "bulk_activate" | "bulk_deactivate" => {
            let ids: Vec<String> = serde_json::from_value(input["sub_ids"].clone()).unwrap();
            if operation == "bulk_activate" {
                c.build_bulk_activate(&ids)
            } else {
                c.build_bulk_deactivate(&ids)
            }
        }
        "update_subscriber" => c.build_update_subscriber(
            input["sub_id"].as_str().unwrap(),
            &subscriber(&input["subscriber"]),
        ),
        "delete_subscriber" => c.build_delete_subscriber(input["sub_id"].as_str().unwrap()),
        "get_service_plans" => Ok(c.build_get_service_plans()),
        "modify_service_plan" => {
            let plan: ServicePlanUpdate = serde_json::from_value(input["plan"].clone()).unwrap();
            c.build_modify_service_plan(&plan)
        }
        other => panic!("unknown operation: {other}"),
    };
    request.unwrap()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[test]
fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let (c, base_url) = client_from(&vectors["session"]);
    let post_headers = parse_headers(&vectors["post_headers"]);
    let get_headers = parse_headers(&vectors["get_headers"]);

    let mut seen = Vec::new();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let operation = case["operation"].as_str().unwrap();
        let expected = &case["expected_request"];
        seen.push(operation.to_string());

        let req = build(&c, operation, &case["input"]);
        let method = parse_method(expected["method"].as_str().unwrap());
        assert_eq!(req.method, method, "{name}: method");
        assert_eq!(req.path, format!("{base_url}{}", expected["path"].as_str().unwrap()), "{name}: path");

        match method {
            HttpMethod::Post => {
                assert_eq!(req.headers, post_headers, "{name}: headers");
                let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
                assert_eq!(body, expected["body"], "{name}: body");
            }
            HttpMethod::Get => {
                assert_eq!(req.headers, get_headers, "{name}: headers");
                assert!(req.body.is_none(), "{name}: body should be None");
            }
        }
    }

    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 16, "every operation has a vector");
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[test]
fn response_test_vectors() {
    let raw = include_str!("../../test-vectors/responses.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let requests: Value =
        serde_json::from_str(include_str!("../../test-vectors/requests.json")).unwrap();
    let (c, _) = client_from(&requests["session"]);

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let result = c.parse_response(simulated(case));

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            match expected_error.as_str().unwrap() {
                "DeserializationError" => {
                    assert!(matches!(err, ApiError::DeserializationError(_)), "{name}: {err:?}")
                }
                other => panic!("{name}: unknown expected_error: {other}"),
            }
        } else {
            let envelope = result.unwrap();
            let expected: ApiResponse = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(envelope, expected, "{name}: parsed result");
        }
    }
}

#[test]
fn resolution_test_vectors() {
    let raw = include_str!("../../test-vectors/responses.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let requests: Value =
        serde_json::from_str(include_str!("../../test-vectors/requests.json")).unwrap();
    let (c, _) = client_from(&requests["session"]);

    for case in vectors["resolution_cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let imsi = case["imsi"].as_u64().unwrap();
        let result = c.parse_resolved_sub_id(imsi, simulated(case));

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            match expected_error.as_str().unwrap() {
                "ResolutionError" => assert!(
                    matches!(err, ApiError::ResolutionError { imsi: i, .. } if i == imsi),
                    "{name}: {err:?}"
                ),
                other => panic!("{name}: unknown expected_error: {other}"),
            }
        } else {
            assert_eq!(result.unwrap(), case["expected_sub_id"].as_str().unwrap(), "{name}");
        }
    }
}
