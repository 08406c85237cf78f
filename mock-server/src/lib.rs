use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSubscriber {
    pub sub_id: String,
    pub sub_name: String,
    pub imsi: Option<u64>,
    pub id_num: u64,
    pub phone_number: u64,
    pub email: String,
    pub address: String,
    pub service_plan_id: Option<String>,
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePlan {
    pub service_plan_id: String,
    pub service_plan_name: String,
    pub uplink: u64,
    pub downlink: u64,
}

/// A request as the server received it. `body` is `Null` for GET.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecordedRequest {
    pub path: String,
    pub body: Value,
}

#[derive(Debug)]
pub struct MockState {
    pub subscribers: HashMap<String, StoredSubscriber>,
    pub plans: BTreeMap<String, ServicePlan>,
    pub requests: Vec<RecordedRequest>,
}

impl Default for MockState {
    fn default() -> Self {
        let plans = [
            ("plan-basic", "Basic", 1_024, 4_096),
            ("plan-gold", "Gold", 10_240, 51_200),
        ]
        .into_iter()
        .map(|(id, name, uplink, downlink)| {
            let plan = ServicePlan {
                service_plan_id: id.to_string(),
                service_plan_name: name.to_string(),
                uplink,
                downlink,
            };
            (plan.service_plan_id.clone(), plan)
        })
        .collect();
        Self {
            subscribers: HashMap::new(),
            plans,
            requests: Vec::new(),
        }
    }
}

impl MockState {
    fn by_imsi(&self, imsi: u64) -> Option<&StoredSubscriber> {
        self.subscribers.values().find(|s| s.imsi == Some(imsi))
    }

    fn subscriber_mut(&mut self, sub_id: &str) -> Result<&mut StoredSubscriber, Reply> {
        self.subscribers.get_mut(sub_id).ok_or_else(not_found)
    }

    fn insert(&mut self, sub: StoredSubscriber) -> Result<(), Reply> {
        if self.subscribers.contains_key(&sub.sub_id) {
            return Err(reply(StatusCode::CONFLICT, "subscriber already exists"));
        }
        if let Some(imsi) = sub.imsi {
            if self.by_imsi(imsi).is_some() {
                return Err(reply(StatusCode::CONFLICT, "imsi already bound"));
            }
        }
        self.subscribers.insert(sub.sub_id.clone(), sub);
        Ok(())
    }
}

pub type Db = Arc<RwLock<MockState>>;

type Reply = (StatusCode, Json<Value>);

pub fn app() -> Router {
    app_with_db(Db::default())
}

/// Router over a caller-held store, so tests can inspect recorded requests.
pub fn app_with_db(db: Db) -> Router {
    let customers = Router::new()
        .route("/query", post(query_by_imsi))
        .route("/querybyid", post(query_by_sub_id))
        .route("/create", post(create))
        .route("/bulkcreate", post(bulk_create))
        .route("/bindservice", post(bind_service))
        .route("/update", post(update_service))
        .route("/bindimsi", post(bind_imsi))
        .route("/unbindimsi", post(unbind_imsi))
        .route("/activate", post(activate))
        .route("/bulkactivate", post(bulk_activate))
        .route("/deactivate", post(deactivate))
        .route("/bulkdeactivate", post(bulk_deactivate))
        .route("/modify", post(modify))
        .route("/delete", post(delete));
    let products = Router::new()
        .route("/queryallplans", get(query_all_plans))
        .route("/modify", post(modify_plan));
    Router::new()
        .nest("/baicellsapi/customers", customers)
        .nest("/baicellsapi/products", products)
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_db(listener, Db::default()).await
}

pub async fn run_with_db(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_db(db)).await
}

fn reply(status: StatusCode, message: &str) -> Reply {
    (status, Json(json!({ "message": message })))
}

fn ok(extra: Value) -> Reply {
    let mut body = json!({ "message": "success" });
    if let (Some(body), Value::Object(extra)) = (body.as_object_mut(), extra) {
        body.extend(extra);
    }
    (StatusCode::OK, Json(body))
}

fn not_found() -> Reply {
    reply(StatusCode::NOT_FOUND, "subscriber not found")
}

fn subscriber_json(sub: &StoredSubscriber) -> Reply {
    (StatusCode::OK, Json(json!(sub)))
}

/// Record the request, check headers and `session_id`, then decode the body.
async fn accept<T: DeserializeOwned>(
    db: &Db,
    headers: &HeaderMap,
    path: &str,
    body: Value,
) -> Result<T, Reply> {
    info!(path, "handling request");
    db.write().await.requests.push(RecordedRequest {
        path: path.to_string(),
        body: body.clone(),
    });
    authorize(headers)?;
    if !body.get("session_id").is_some_and(Value::is_string) {
        return Err(reply(StatusCode::BAD_REQUEST, "missing session_id"));
    }
    serde_json::from_value(body).map_err(|e| reply(StatusCode::UNPROCESSABLE_ENTITY, &e.to_string()))
}

fn authorize(headers: &HeaderMap) -> Result<(), Reply> {
    let present = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| !v.is_empty())
    };
    if present("cloud_key") && present("authorization") {
        Ok(())
    } else {
        Err(reply(StatusCode::UNAUTHORIZED, "missing credentials"))
    }
}

#[derive(Deserialize)]
struct ImsiInput {
    imsi: u64,
}

#[derive(Deserialize)]
struct SubIdInput {
    sub_id: String,
}

#[derive(Deserialize)]
struct SubscriberInput {
    sub_id: String,
    sub_name: String,
    #[serde(default)]
    imsi: u64,
    id_num: u64,
    phone_number: u64,
    email: String,
    address: String,
}

impl SubscriberInput {
    fn into_stored(self, service_plan_id: Option<String>) -> StoredSubscriber {
        StoredSubscriber {
            sub_id: self.sub_id,
            sub_name: self.sub_name,
            imsi: bound_imsi(self.imsi),
            id_num: self.id_num,
            phone_number: self.phone_number,
            email: self.email,
            address: self.address,
            service_plan_id,
            active: false,
        }
    }
}

#[derive(Deserialize)]
struct BulkCreateInput {
    service_plan_id: String,
    sub_list: Vec<SubscriberInput>,
}

#[derive(Deserialize)]
struct BindServiceInput {
    sub_id: String,
    service_plan_id: String,
}

#[derive(Deserialize)]
struct UpdateServiceInput {
    sub_id: String,
    new_service_plan_id: String,
}

#[derive(Deserialize)]
struct BindImsiInput {
    sub_id: String,
    imsi: u64,
}

#[derive(Deserialize)]
struct SubIdListInput {
    data: Vec<String>,
}

async fn query_by_imsi(State(db): State<Db>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let input: ImsiInput = match accept(&db, &headers, "customers/query", body).await {
        Ok(input) => input,
        Err(reply) => return reply,
    };
    let state = db.read().await;
    state.by_imsi(input.imsi).map(subscriber_json).unwrap_or_else(not_found)
}

async fn query_by_sub_id(State(db): State<Db>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let input: SubIdInput = match accept(&db, &headers, "customers/querybyid", body).await {
        Ok(input) => input,
        Err(reply) => return reply,
    };
    let state = db.read().await;
    state.subscribers.get(&input.sub_id).map(subscriber_json).unwrap_or_else(not_found)
}

async fn create(State(db): State<Db>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let input: SubscriberInput = match accept(&db, &headers, "customers/create", body).await {
        Ok(input) => input,
        Err(reply) => return reply,
    };
    let sub_id = input.sub_id.clone();
    match db.write().await.insert(input.into_stored(None)) {
        Ok(()) => ok(json!({ "sub_id": sub_id })),
        Err(reply) => reply,
    }
}

async fn bulk_create(State(db): State<Db>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let input: BulkCreateInput = match accept(&db, &headers, "customers/bulkcreate", body).await {
        Ok(input) => input,
        Err(reply) => return reply,
    };
    let mut state = db.write().await;
    if !state.plans.contains_key(&input.service_plan_id) {
        return reply(StatusCode::NOT_FOUND, "service plan not found");
    }
    let mut created = Vec::new();
    let mut failed = Vec::new();
    for sub in input.sub_list {
        let sub_id = sub.sub_id.clone();
        match state.insert(sub.into_stored(Some(input.service_plan_id.clone()))) {
            Ok(()) => created.push(sub_id),
            Err(_) => failed.push(sub_id),
        }
    }
    ok(json!({ "created": created, "failed": failed }))
}

async fn bind_service(State(db): State<Db>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let input: BindServiceInput = match accept(&db, &headers, "customers/bindservice", body).await {
        Ok(input) => input,
        Err(reply) => return reply,
    };
    set_plan(&db, &input.sub_id, input.service_plan_id).await
}

async fn update_service(State(db): State<Db>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let input: UpdateServiceInput = match accept(&db, &headers, "customers/update", body).await {
        Ok(input) => input,
        Err(reply) => return reply,
    };
    set_plan(&db, &input.sub_id, input.new_service_plan_id).await
}

async fn set_plan(db: &Db, sub_id: &str, service_plan_id: String) -> Reply {
    let mut state = db.write().await;
    if !state.plans.contains_key(&service_plan_id) {
        return reply(StatusCode::NOT_FOUND, "service plan not found");
    }
    match state.subscriber_mut(sub_id) {
        Ok(sub) => {
            sub.service_plan_id = Some(service_plan_id);
            ok(json!({ "sub_id": sub_id }))
        }
        Err(reply) => reply,
    }
}

/// Clients send `0` for "no SIM"; it never counts as a bound IMSI.
fn bound_imsi(imsi: u64) -> Option<u64> {
    (imsi != 0).then_some(imsi)
}

async fn bind_imsi(State(db): State<Db>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let input: BindImsiInput = match accept(&db, &headers, "customers/bindimsi", body).await {
        Ok(input) => input,
        Err(reply) => return reply,
    };
    let imsi = bound_imsi(input.imsi);
    let mut state = db.write().await;
    if imsi
        .and_then(|imsi| state.by_imsi(imsi))
        .is_some_and(|s| s.sub_id != input.sub_id)
    {
        return reply(StatusCode::CONFLICT, "imsi already bound");
    }
    match state.subscriber_mut(&input.sub_id) {
        Ok(sub) => {
            sub.imsi = imsi;
            ok(json!({ "sub_id": input.sub_id, "imsi": input.imsi }))
        }
        Err(reply) => reply,
    }
}

async fn unbind_imsi(State(db): State<Db>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let input: SubIdInput = match accept(&db, &headers, "customers/unbindimsi", body).await {
        Ok(input) => input,
        Err(reply) => return reply,
    };
    match db.write().await.subscriber_mut(&input.sub_id) {
        Ok(sub) => {
            sub.imsi = None;
            ok(json!({ "sub_id": input.sub_id }))
        }
        Err(reply) => reply,
    }
}

async fn activate(State(db): State<Db>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let input: SubIdInput = match accept(&db, &headers, "customers/activate", body).await {
        Ok(input) => input,
        Err(reply) => return reply,
    };
    set_active(&db, &input.sub_id, true).await
}

async fn deactivate(State(db): State<Db>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let input: SubIdInput = match accept(&db, &headers, "customers/deactivate", body).await {
        Ok(input) => input,
        Err(reply) => return reply,
    };
    set_active(&db, &input.sub_id, false).await
}

async fn set_active(db: &Db, sub_id: &str, active: bool) -> Reply {
    match db.write().await.subscriber_mut(sub_id) {
        Ok(sub) => {
            sub.active = active;
            ok(json!({ "sub_id": sub_id, "active": active }))
        }
        Err(reply) => reply,
    }
}

async fn bulk_activate(State(db): State<Db>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let input: SubIdListInput = match accept(&db, &headers, "customers/bulkactivate", body).await {
        Ok(input) => input,
        Err(reply) => return reply,
    };
    set_active_many(&db, input.data, true).await
}

async fn bulk_deactivate(State(db): State<Db>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let input: SubIdListInput = match accept(&db, &headers, "customers/bulkdeactivate", body).await {
        Ok(input) => input,
        Err(reply) => return reply,
    };
    set_active_many(&db, input.data, false).await
}

async fn set_active_many(db: &Db, sub_ids: Vec<String>, active: bool) -> Reply {
    let mut state = db.write().await;
    let (mut updated, mut failed) = (Vec::new(), Vec::new());
    for sub_id in sub_ids {
        match state.subscriber_mut(&sub_id) {
            Ok(sub) => {
                sub.active = active;
                updated.push(sub_id);
            }
            Err(_) => failed.push(sub_id),
        }
    }
    ok(json!({ "updated": updated, "failed": failed }))
}

async fn modify(State(db): State<Db>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let input: SubscriberInput = match accept(&db, &headers, "customers/modify", body).await {
        Ok(input) => input,
        Err(reply) => return reply,
    };
    match db.write().await.subscriber_mut(&input.sub_id) {
        Ok(sub) => {
            sub.sub_name = input.sub_name;
            sub.id_num = input.id_num;
            sub.phone_number = input.phone_number;
            sub.email = input.email;
            sub.address = input.address;
            ok(json!({ "sub_id": input.sub_id }))
        }
        Err(reply) => reply,
    }
}

async fn delete(State(db): State<Db>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let input: SubIdInput = match accept(&db, &headers, "customers/delete", body).await {
        Ok(input) => input,
        Err(reply) => return reply,
    };
    match db.write().await.subscribers.remove(&input.sub_id) {
        Some(_) => ok(json!({ "sub_id": input.sub_id })),
        None => not_found(),
    }
}

async fn query_all_plans(State(db): State<Db>, headers: HeaderMap) -> Reply {
    info!(path = "products/queryallplans", "handling request");
    let mut state = db.write().await;
    state.requests.push(RecordedRequest {
        path: "products/queryallplans".to_string(),
        body: Value::Null,
    });
    if let Err(reply) = authorize(&headers) {
        return reply;
    }
    let plans: Vec<&ServicePlan> = state.plans.values().collect();
    (StatusCode::OK, Json(json!(plans)))
}

async fn modify_plan(State(db): State<Db>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let input: ServicePlan = match accept(&db, &headers, "products/modify", body).await {
        Ok(input) => input,
        Err(reply) => return reply,
    };
    let mut state = db.write().await;
    match state.plans.get_mut(&input.service_plan_id) {
        Some(plan) => {
            *plan = input;
            ok(json!({ "service_plan_id": plan.service_plan_id }))
        }
        None => reply(StatusCode::NOT_FOUND, "service plan not found"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(body: Value) -> SubscriberInput {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn zero_imsi_is_stored_as_unbound() {
        let sub = input(json!({
            "sub_id": "ada", "sub_name": "Ada", "imsi": 0, "id_num": 0,
            "phone_number": 0, "email": "", "address": ""
        }))
        .into_stored(None);
        assert_eq!(sub.imsi, None);
        assert!(!sub.active);
    }

    #[test]
    fn create_input_defaults_missing_imsi() {
        let sub = input(json!({
            "sub_id": "ada", "sub_name": "Ada", "id_num": 1,
            "phone_number": 2, "email": "a@b.c", "address": "x"
        }));
        assert_eq!(sub.imsi, 0);
    }

    #[test]
    fn subscriber_input_rejects_missing_name() {
        let result: Result<SubscriberInput, _> = serde_json::from_value(json!({"sub_id": "ada"}));
        assert!(result.is_err());
    }

    #[test]
    fn default_state_seeds_plans() {
        let state = MockState::default();
        assert_eq!(state.plans.len(), 2);
        assert!(state.plans.contains_key("plan-basic"));
        assert!(state.subscribers.is_empty());
    }

    #[test]
    fn insert_rejects_duplicate_imsi() {
        let mut state = MockState::default();
        let make = |id: &str| StoredSubscriber {
            sub_id: id.to_string(),
            sub_name: id.to_string(),
            imsi: Some(42),
            id_num: 0,
            phone_number: 0,
            email: String::new(),
            address: String::new(),
            service_plan_id: None,
            active: false,
        };
        state.insert(make("a")).unwrap();
        let (status, _) = state.insert(make("b")).unwrap_err();
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[test]
    fn ok_merges_extra_fields() {
        let (status, Json(body)) = ok(json!({"sub_id": "ada"}));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "success", "sub_id": "ada"}));
    }
}
