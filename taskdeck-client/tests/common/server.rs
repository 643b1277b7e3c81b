/// In-process double of the remote Taskdeck API
///
/// Implements the exact REST surface the client depends on, backed by an
/// in-memory state the tests can inspect and manipulate directly:
///
/// - `POST /api/auth/login` — `{email, password}` → `{token, user}`
/// - `POST /api/users` — `{email, password}` → created user
/// - `GET /api/tasks` — the caller's tasks (bearer token required)
/// - `GET /api/tasks/:id` — one task
/// - `POST /api/tasks` — create (requires `userId` matching the token)
/// - `PUT /api/tasks/:id` — update present fields
/// - `DELETE /api/tasks/:id` — remove
///
/// Tokens are issued as `t1`, `t2`, ... in login order so tests can assert
/// on persisted values. `fail_next_request` makes the next request answer
/// with an arbitrary status for failure-path tests.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared state of the API double
pub struct ApiState {
    inner: Mutex<ApiInner>,
}

struct ApiInner {
    users: Vec<FakeUser>,
    tokens: HashMap<String, String>,
    tasks: Vec<FakeTask>,
    next_user_id: i64,
    next_task_id: i64,
    next_token: u64,
    request_count: u64,
    fail_next: Option<u16>,
}

struct FakeUser {
    id: String,
    email: String,
    password: String,
}

struct FakeTask {
    id: i64,
    owner: String,
    title: String,
    description: String,
    completed: bool,
}

type ApiError = (StatusCode, Json<Value>);

impl ApiState {
    pub fn new() -> Self {
        ApiState {
            inner: Mutex::new(ApiInner {
                users: Vec::new(),
                tokens: HashMap::new(),
                tasks: Vec::new(),
                next_user_id: 1,
                next_task_id: 1,
                next_token: 1,
                request_count: 0,
                fail_next: None,
            }),
        }
    }

    /// Seeds an account without going through registration
    pub fn seed_user(&self, id: &str, email: &str, password: &str) {
        self.inner.lock().unwrap().users.push(FakeUser {
            id: id.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        });
    }

    /// Seeds a task directly into server state, returning its id
    pub fn seed_task(&self, owner: &str, title: &str, description: &str, completed: bool) -> i64 {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_task_id;
        inner.next_task_id += 1;
        inner.tasks.push(FakeTask {
            id,
            owner: owner.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            completed,
        });
        id
    }

    /// Sets the id the next created task will receive
    pub fn set_next_task_id(&self, id: i64) {
        self.inner.lock().unwrap().next_task_id = id;
    }

    /// Makes the next request fail with `status` before touching state
    pub fn fail_next_request(&self, status: u16) {
        self.inner.lock().unwrap().fail_next = Some(status);
    }

    /// Number of requests the double has received
    pub fn request_count(&self) -> u64 {
        self.inner.lock().unwrap().request_count
    }
}

/// Starts the double on an ephemeral port
pub async fn spawn() -> anyhow::Result<(SocketAddr, Arc<ApiState>)> {
    let state = Arc::new(ApiState::new());
    let app = router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("API double error: {e}");
        }
    });

    Ok((addr, state))
}

fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/users", post(register))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/:id",
            get(get_task).put(update_task).delete(delete_task),
        )
        .with_state(state)
}

fn api_error(status: StatusCode, message: &str) -> ApiError {
    (status, Json(json!({ "message": message })))
}

/// Counts the request and applies an injected failure, if armed
fn begin(state: &ApiState) -> Result<MutexGuard<'_, ApiInner>, ApiError> {
    let mut inner = state.inner.lock().unwrap();
    inner.request_count += 1;

    if let Some(status) = inner.fail_next.take() {
        return Err(api_error(
            StatusCode::from_u16(status).unwrap(),
            "Injected failure",
        ));
    }

    Ok(inner)
}

/// Resolves the bearer token to a user id
fn authed(inner: &ApiInner, headers: &HeaderMap) -> Result<String, ApiError> {
    let header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| api_error(StatusCode::UNAUTHORIZED, "Missing authorization header"))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Expected Bearer token"))?;

    inner
        .tokens
        .get(token)
        .cloned()
        .ok_or_else(|| api_error(StatusCode::UNAUTHORIZED, "Invalid token"))
}

/// The `userId` every write must carry, checked against the token owner
fn stamped_owner(inner: &ApiInner, headers: &HeaderMap, body: &Value) -> Result<String, ApiError> {
    let owner = authed(inner, headers)?;

    let user_id = body
        .get("userId")
        .and_then(Value::as_str)
        .ok_or_else(|| api_error(StatusCode::UNPROCESSABLE_ENTITY, "userId is required"))?;

    if user_id != owner {
        return Err(api_error(
            StatusCode::FORBIDDEN,
            "userId does not match token owner",
        ));
    }

    Ok(owner)
}

fn task_json(task: &FakeTask) -> Value {
    json!({
        "id": task.id,
        "title": task.title,
        "description": task.description,
        "completed": task.completed,
    })
}

async fn login(
    State(state): State<Arc<ApiState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let mut api = begin(&state)?;

    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let user = api
        .users
        .iter()
        .find(|u| u.email == email && u.password == password)
        .map(|u| (u.id.clone(), u.email.clone()))
        .ok_or_else(|| api_error(StatusCode::UNAUTHORIZED, "Invalid email or password"))?;

    let token = format!("t{}", api.next_token);
    api.next_token += 1;
    api.tokens.insert(token.clone(), user.0.clone());

    Ok(Json(json!({
        "token": token,
        "user": { "id": user.0, "email": user.1 },
    })))
}

async fn register(
    State(state): State<Arc<ApiState>>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut api = begin(&state)?;

    let email = body["email"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();

    if api.users.iter().any(|u| u.email == email) {
        return Err(api_error(
            StatusCode::CONFLICT,
            "An account with this email already exists",
        ));
    }

    let id = api.next_user_id.to_string();
    api.next_user_id += 1;
    api.users.push(FakeUser {
        id: id.clone(),
        email: email.clone(),
        password,
    });

    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": id, "email": email })),
    ))
}

async fn list_tasks(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let api = begin(&state)?;
    let owner = authed(&api, &headers)?;

    let tasks: Vec<Value> = api
        .tasks
        .iter()
        .filter(|t| t.owner == owner)
        .map(task_json)
        .collect();

    Ok(Json(Value::Array(tasks)))
}

async fn get_task(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let api = begin(&state)?;
    let owner = authed(&api, &headers)?;

    api.tasks
        .iter()
        .find(|t| t.id == id && t.owner == owner)
        .map(|t| Json(task_json(t)))
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Task not found"))
}

async fn create_task(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let mut api = begin(&state)?;
    let owner = stamped_owner(&api, &headers, &body)?;

    let id = api.next_task_id;
    api.next_task_id += 1;

    let task = FakeTask {
        id,
        owner,
        title: body["title"].as_str().unwrap_or_default().to_string(),
        description: body["description"].as_str().unwrap_or_default().to_string(),
        completed: body["completed"].as_bool().unwrap_or(false),
    };

    let response = task_json(&task);
    api.tasks.push(task);

    Ok(Json(response))
}

async fn update_task(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let mut api = begin(&state)?;
    let owner = stamped_owner(&api, &headers, &body)?;

    let task = api
        .tasks
        .iter_mut()
        .find(|t| t.id == id && t.owner == owner)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Task not found"))?;

    if let Some(title) = body.get("title").and_then(Value::as_str) {
        task.title = title.to_string();
    }
    if let Some(description) = body.get("description").and_then(Value::as_str) {
        task.description = description.to_string();
    }
    if let Some(completed) = body.get("completed").and_then(Value::as_bool) {
        task.completed = completed;
    }

    Ok(Json(task_json(task)))
}

async fn delete_task(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let mut api = begin(&state)?;
    let owner = authed(&api, &headers)?;

    let before = api.tasks.len();
    api.tasks.retain(|t| !(t.id == id && t.owner == owner));

    if api.tasks.len() == before {
        return Err(api_error(StatusCode::NOT_FOUND, "Task not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
