use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{delete, get, post, put},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const SYSTEM_DATABASE: &str = "_system";
pub const SERVER_VERSION: &str = "3.11.4";

#[derive(Debug, Default)]
pub struct CollectionState {
    pub id: u64,
    pub documents: BTreeMap<String, Value>,
}

#[derive(Debug, Default)]
pub struct DatabaseState {
    /// Users granted access at creation; `root` sees every database.
    pub users: Vec<String>,
    pub collections: BTreeMap<String, CollectionState>,
}

#[derive(Debug)]
pub struct ServerState {
    pub available: bool,
    pub databases: BTreeMap<String, DatabaseState>,
    next_id: u64,
}

impl Default for ServerState {
    fn default() -> Self {
        let mut state = Self {
            available: true,
            databases: BTreeMap::new(),
            next_id: 1,
        };
        state.add_database(SYSTEM_DATABASE, Vec::new());
        state
    }
}

impl ServerState {
    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn add_database(&mut self, name: &str, users: Vec<String>) {
        let graphs_id = self.next_id();
        let mut db = DatabaseState {
            users,
            ..Default::default()
        };
        db.collections.insert(
            "_graphs".to_string(),
            CollectionState {
                id: graphs_id,
                ..Default::default()
            },
        );
        self.databases.insert(name.to_string(), db);
    }
}

pub type SharedState = Arc<RwLock<ServerState>>;

type Reply = (StatusCode, Json<Value>);

#[derive(Deserialize)]
pub struct CreateDatabase {
    pub name: String,
    #[serde(default)]
    pub users: Option<Vec<DatabaseUser>>,
}

#[derive(Deserialize)]
pub struct DatabaseUser {
    pub username: String,
}

#[derive(Deserialize)]
pub struct CreateCollection {
    pub name: String,
}

pub fn new_state() -> SharedState {
    Arc::new(RwLock::new(ServerState::default()))
}

pub fn app() -> Router {
    app_with_state(new_state())
}

pub fn app_with_state(state: SharedState) -> Router {
    Router::new()
        .route("/_api/version", get(version))
        .route("/_api/database", get(list_databases).post(create_database))
        .route("/_api/database/user", get(list_user_databases))
        .route("/_api/database/{name}", delete(delete_database))
        .route(
            "/_api/collection",
            get(list_system_collections).post(create_system_collection),
        )
        .merge(database_routes())
        .nest(
            "/_db/{db}",
            database_routes().route("/_api/collection", get(list_collections).post(create_collection)),
        )
        .with_state(state)
}

/// Routes served both at the root (for `_system`) and under `/_db/{db}`.
/// Every route here has at least one capture, so `Path` always extracts.
fn database_routes() -> Router<SharedState> {
    Router::new()
        .route("/_api/collection/{name}", delete(delete_collection))
        .route("/_api/collection/{name}/count", get(count_collection))
        .route("/_api/collection/{name}/truncate", put(truncate_collection))
        .route("/_api/document/{collection}", post(create_document))
        .route(
            "/_api/document/{collection}/{key}",
            get(get_document).delete(delete_document),
        )
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_state(listener: TcpListener, state: SharedState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

fn ok(status: StatusCode, mut body: Value) -> Reply {
    if let Some(obj) = body.as_object_mut() {
        obj.insert("error".to_string(), json!(false));
        obj.insert("code".to_string(), json!(status.as_u16()));
    }
    (status, Json(body))
}

fn error(status: StatusCode, error_num: u32, message: &str) -> Reply {
    (
        status,
        Json(json!({
            "error": true,
            "code": status.as_u16(),
            "errorNum": error_num,
            "errorMessage": message,
        })),
    )
}

fn database_not_found() -> Reply {
    error(StatusCode::NOT_FOUND, 1228, "database not found")
}

fn collection_not_found() -> Reply {
    error(StatusCode::NOT_FOUND, 1203, "collection or view not found")
}

fn document_not_found() -> Reply {
    error(StatusCode::NOT_FOUND, 1202, "document not found")
}

/// Letters, digits, `_` and `-`, at most `max` bytes, not starting with a
/// digit or `-`. A leading `_` is only allowed where `system_ok`.
fn valid_name(name: &str, max: usize, system_ok: bool) -> bool {
    let Some(first) = name.chars().next() else {
        return false;
    };
    name.len() <= max
        && (first.is_ascii_alphabetic() || (system_ok && first == '_'))
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn database_of(params: &HashMap<String, String>) -> String {
    params
        .get("db")
        .cloned()
        .unwrap_or_else(|| SYSTEM_DATABASE.to_string())
}

fn param<'a>(params: &'a HashMap<String, String>, name: &str) -> &'a str {
    params.get(name).map(String::as_str).unwrap_or_default()
}

fn collection_entry(name: &str, coll: &CollectionState) -> Value {
    json!({
        "id": coll.id.to_string(),
        "name": name,
        "isSystem": name.starts_with('_'),
        "status": 3,
        "type": 2,
    })
}

// --- server ---

async fn version(State(state): State<SharedState>) -> Reply {
    if !state.read().await.available {
        return error(StatusCode::SERVICE_UNAVAILABLE, 503, "service unavailable");
    }
    (
        StatusCode::OK,
        Json(json!({"server": "arango", "version": SERVER_VERSION, "license": "community"})),
    )
}

// --- databases ---

async fn list_databases(State(state): State<SharedState>) -> Reply {
    let names: Vec<String> = state.read().await.databases.keys().cloned().collect();
    ok(StatusCode::OK, json!({"result": names}))
}

/// Username from a Basic `Authorization` header, if any.
fn basic_user(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let decoded = STANDARD.decode(value.strip_prefix("Basic ")?).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    let (user, _) = credentials.split_once(':')?;
    Some(user.to_string())
}

/// Databases `user` may access. Anonymous requests act as `root`.
fn visible_databases(state: &ServerState, user: Option<&str>) -> Vec<String> {
    state
        .databases
        .iter()
        .filter(|(name, db)| match user {
            None | Some("root") => true,
            Some(user) => name.as_str() == SYSTEM_DATABASE || db.users.iter().any(|u| u == user),
        })
        .map(|(name, _)| name.clone())
        .collect()
}

async fn list_user_databases(State(state): State<SharedState>, headers: HeaderMap) -> Reply {
    let user = basic_user(&headers);
    let names = visible_databases(&*state.read().await, user.as_deref());
    ok(StatusCode::OK, json!({"result": names}))
}

async fn create_database(State(state): State<SharedState>, Json(input): Json<CreateDatabase>) -> Reply {
    if !valid_name(&input.name, 64, false) {
        return error(StatusCode::BAD_REQUEST, 1229, "database name invalid");
    }
    let mut state = state.write().await;
    if state.databases.contains_key(&input.name) {
        return error(StatusCode::CONFLICT, 1207, "duplicate database name");
    }
    let users = input
        .users
        .unwrap_or_default()
        .into_iter()
        .map(|u| u.username)
        .collect();
    state.add_database(&input.name, users);
    tracing::info!(database = %input.name, "database created");
    ok(StatusCode::CREATED, json!({"result": true}))
}

async fn delete_database(State(state): State<SharedState>, Path(name): Path<String>) -> Reply {
    if name == SYSTEM_DATABASE {
        return error(StatusCode::FORBIDDEN, 11, "forbidden");
    }
    let mut state = state.write().await;
    if state.databases.remove(&name).is_none() {
        return database_not_found();
    }
    tracing::info!(database = %name, "database deleted");
    ok(StatusCode::OK, json!({"result": true}))
}

// --- collections ---

async fn list_collections(
    State(state): State<SharedState>,
    Path(params): Path<HashMap<String, String>>,
) -> Reply {
    collections_in(&state, &database_of(&params)).await
}

async fn list_system_collections(State(state): State<SharedState>) -> Reply {
    collections_in(&state, SYSTEM_DATABASE).await
}

async fn collections_in(state: &SharedState, database: &str) -> Reply {
    let state = state.read().await;
    let Some(db) = state.databases.get(database) else {
        return database_not_found();
    };
    let result: Vec<Value> = db
        .collections
        .iter()
        .map(|(name, coll)| collection_entry(name, coll))
        .collect();
    ok(StatusCode::OK, json!({"result": result}))
}

async fn create_collection(
    State(state): State<SharedState>,
    Path(params): Path<HashMap<String, String>>,
    Json(input): Json<CreateCollection>,
) -> Reply {
    add_collection(&state, &database_of(&params), input).await
}

async fn create_system_collection(
    State(state): State<SharedState>,
    Json(input): Json<CreateCollection>,
) -> Reply {
    add_collection(&state, SYSTEM_DATABASE, input).await
}

async fn add_collection(state: &SharedState, database: &str, input: CreateCollection) -> Reply {
    if !valid_name(&input.name, 256, true) {
        return error(StatusCode::BAD_REQUEST, 1208, "illegal name");
    }
    let mut state = state.write().await;
    let id = state.next_id();
    let Some(db) = state.databases.get_mut(database) else {
        return database_not_found();
    };
    if db.collections.contains_key(&input.name) {
        return error(StatusCode::CONFLICT, 1207, "duplicate name");
    }
    let coll = CollectionState {
        id,
        ..Default::default()
    };
    let body = collection_entry(&input.name, &coll);
    db.collections.insert(input.name, coll);
    ok(StatusCode::OK, body)
}

async fn delete_collection(
    State(state): State<SharedState>,
    Path(params): Path<HashMap<String, String>>,
) -> Reply {
    let mut state = state.write().await;
    let Some(db) = state.databases.get_mut(&database_of(&params)) else {
        return database_not_found();
    };
    match db.collections.remove(param(&params, "name")) {
        Some(coll) => ok(StatusCode::OK, json!({"id": coll.id.to_string()})),
        None => collection_not_found(),
    }
}

async fn count_collection(
    State(state): State<SharedState>,
    Path(params): Path<HashMap<String, String>>,
) -> Reply {
    let state = state.read().await;
    let Some(db) = state.databases.get(&database_of(&params)) else {
        return database_not_found();
    };
    let name = param(&params, "name");
    match db.collections.get(name) {
        Some(coll) => ok(StatusCode::OK, json!({"name": name, "count": coll.documents.len()})),
        None => collection_not_found(),
    }
}

async fn truncate_collection(
    State(state): State<SharedState>,
    Path(params): Path<HashMap<String, String>>,
) -> Reply {
    let mut state = state.write().await;
    let Some(db) = state.databases.get_mut(&database_of(&params)) else {
        return database_not_found();
    };
    let name = param(&params, "name");
    match db.collections.get_mut(name) {
        Some(coll) => {
            coll.documents.clear();
            ok(StatusCode::OK, collection_entry(name, coll))
        }
        None => collection_not_found(),
    }
}

// --- documents ---

fn document_meta(collection: &str, doc: &Value) -> Value {
    json!({
        "_id": format!("{collection}/{}", doc["_key"].as_str().unwrap_or_default()),
        "_key": doc["_key"],
        "_rev": doc["_rev"],
    })
}

async fn create_document(
    State(state): State<SharedState>,
    Path(params): Path<HashMap<String, String>>,
    Json(input): Json<Value>,
) -> Reply {
    let Value::Object(mut fields) = input else {
        return error(StatusCode::BAD_REQUEST, 1227, "invalid document type");
    };
    let mut state = state.write().await;
    let Some(db) = state.databases.get_mut(&database_of(&params)) else {
        return database_not_found();
    };
    let name = param(&params, "collection");
    let Some(coll) = db.collections.get_mut(name) else {
        return collection_not_found();
    };

    let key = match fields.get("_key") {
        Some(Value::String(key)) => key.clone(),
        Some(_) => return error(StatusCode::BAD_REQUEST, 1221, "illegal document key"),
        None => Uuid::new_v4().simple().to_string(),
    };
    if coll.documents.contains_key(&key) {
        return error(StatusCode::CONFLICT, 1210, "unique constraint violated");
    }
    fields.insert("_key".to_string(), json!(key));
    fields.insert("_id".to_string(), json!(format!("{name}/{key}")));
    fields.insert("_rev".to_string(), json!(Uuid::new_v4().simple().to_string()));
    let doc = Value::Object(fields);
    let meta = document_meta(name, &doc);
    coll.documents.insert(key, doc);
    (StatusCode::CREATED, Json(meta))
}

async fn get_document(
    State(state): State<SharedState>,
    Path(params): Path<HashMap<String, String>>,
) -> Reply {
    let state = state.read().await;
    let Some(db) = state.databases.get(&database_of(&params)) else {
        return database_not_found();
    };
    let Some(coll) = db.collections.get(param(&params, "collection")) else {
        return collection_not_found();
    };
    match coll.documents.get(param(&params, "key")) {
        Some(doc) => (StatusCode::OK, Json(doc.clone())),
        None => document_not_found(),
    }
}

async fn delete_document(
    State(state): State<SharedState>,
    Path(params): Path<HashMap<String, String>>,
) -> Reply {
    let mut state = state.write().await;
    let Some(db) = state.databases.get_mut(&database_of(&params)) else {
        return database_not_found();
    };
    let name = param(&params, "collection");
    let Some(coll) = db.collections.get_mut(name) else {
        return collection_not_found();
    };
    match coll.documents.remove(param(&params, "key")) {
        Some(doc) => (StatusCode::OK, Json(document_meta(name, &doc))),
        None => document_not_found(),
    }
}
