//! Throwaway task service speaking the same HTTP protocol as the real one.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::json;

use tasktrack::config::ApiConfig;
use tasktrack::models::{Credentials, NewTaskRequest, Status, Task, UpdateTaskRequest, User};

#[derive(Default)]
pub struct FakeState {
    pub users: HashMap<String, (i64, String)>,
    pub sessions: HashMap<String, String>,
    pub tasks: Vec<Task>,
    pub next_task_id: i64,
    pub next_token: u64,
    pub logout_content_type: Option<String>,
}

pub type Shared = Arc<Mutex<FakeState>>;

impl FakeState {
    pub fn add_user(&mut self, email: &str, password: &str) -> i64 {
        let id = self.users.len() as i64 + 1;
        self.users
            .insert(email.to_string(), (id, password.to_string()));
        id
    }

    fn open_session(&mut self, email: &str) -> String {
        self.next_token += 1;
        let token = format!("token-{}", self.next_token);
        self.sessions.insert(token.clone(), email.to_string());
        token
    }

    fn user_for(&self, headers: &HeaderMap) -> Option<(i64, String)> {
        let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
        let token = cookies
            .split(';')
            .filter_map(|pair| pair.trim().strip_prefix("sid="))
            .next()?;
        let email = self.sessions.get(token)?;
        let (id, _) = self.users.get(email)?;
        Some((*id, email.clone()))
    }
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

fn with_cookie(token: &str, status: StatusCode, body: serde_json::Value) -> Response {
    (
        status,
        [(header::SET_COOKIE, format!("sid={}; Path=/; HttpOnly", token))],
        Json(body),
    )
        .into_response()
}

async fn sign_up(State(state): State<Shared>, Json(creds): Json<Credentials>) -> Response {
    let mut state = state.lock().unwrap();
    if creds.email.contains("boom") {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    if state.users.contains_key(&creds.email) {
        return message(StatusCode::CONFLICT, "User already exists");
    }
    state.add_user(&creds.email, &creds.password);
    let token = state.open_session(&creds.email);
    with_cookie(&token, StatusCode::CREATED, json!({ "success": true }))
}

/// `status-<code>@...` addresses answer sign-in with that status code.
fn forced_status(email: &str) -> Option<StatusCode> {
    let code = email.strip_prefix("status-")?.split('@').next()?;
    StatusCode::from_u16(code.parse().ok()?).ok()
}

async fn sign_in(State(state): State<Shared>, Json(creds): Json<Credentials>) -> Response {
    if let Some(status) = forced_status(&creds.email) {
        return status.into_response();
    }
    let mut state = state.lock().unwrap();
    let accepted = state
        .users
        .get(&creds.email)
        .is_some_and(|(_, pw)| *pw == creds.password);
    if !accepted {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let token = state.open_session(&creds.email);
    (
        StatusCode::OK,
        [(header::SET_COOKIE, format!("sid={}; Path=/; HttpOnly", token))],
    )
        .into_response()
}

async fn current_user(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = state.lock().unwrap();
    match state.user_for(&headers) {
        Some((_, email)) => Json(User { email }).into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn logout(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = state.lock().unwrap();
    state.logout_content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    if state.user_for(&headers).is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    state.sessions.clear();
    StatusCode::OK.into_response()
}

async fn list_tasks(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = state.lock().unwrap();
    let Some((user_id, _)) = state.user_for(&headers) else {
        return message(StatusCode::UNAUTHORIZED, "Not authenticated");
    };
    let tasks: Vec<Task> = state
        .tasks
        .iter()
        .filter(|t| t.user_id == user_id)
        .cloned()
        .collect();
    Json(tasks).into_response()
}

async fn create_task(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(req): Json<NewTaskRequest>,
) -> Response {
    let mut state = state.lock().unwrap();
    let Some((user_id, _)) = state.user_for(&headers) else {
        return message(StatusCode::UNAUTHORIZED, "Not authenticated");
    };
    if req.title.trim().is_empty() {
        return message(StatusCode::BAD_REQUEST, "Title is required");
    }
    state.next_task_id += 1;
    let task = Task {
        id: state.next_task_id,
        title: req.title,
        text: req.text.unwrap_or_default(),
        status: Status::Todo,
        user_id,
        created_at: Utc::now().naive_utc(),
        done_at: None,
    };
    state.tasks.push(task.clone());
    (StatusCode::CREATED, Json(task)).into_response()
}

async fn update_task(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTaskRequest>,
) -> Response {
    let mut state = state.lock().unwrap();
    let Some((user_id, _)) = state.user_for(&headers) else {
        return message(StatusCode::UNAUTHORIZED, "Not authenticated");
    };
    let Some(task) = state
        .tasks
        .iter_mut()
        .find(|t| t.id == id && t.user_id == user_id)
    else {
        return message(StatusCode::NOT_FOUND, "Task not found");
    };
    task.title = req.title;
    task.text = req.text;
    task.status = req.status;
    task.done_at = if req.status == Status::Done {
        task.done_at.or_else(|| Some(Utc::now().naive_utc()))
    } else {
        None
    };
    Json(task.clone()).into_response()
}

async fn delete_task(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let mut state = state.lock().unwrap();
    let Some((user_id, _)) = state.user_for(&headers) else {
        return message(StatusCode::UNAUTHORIZED, "Not authenticated");
    };
    let before = state.tasks.len();
    state.tasks.retain(|t| !(t.id == id && t.user_id == user_id));
    if state.tasks.len() == before {
        return message(StatusCode::NOT_FOUND, "Task not found");
    }
    StatusCode::NO_CONTENT.into_response()
}

pub fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/auth/sign-up", post(sign_up))
        .route("/api/auth/sign-in", post(sign_in))
        .route("/api/auth/logout", post(logout))
        .route("/api/user", get(current_user))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/{id}", put(update_task).delete(delete_task))
        .with_state(state)
}

/// Starts the fake service on an ephemeral port.
pub async fn spawn_server() -> (ApiConfig, Shared) {
    let state: Shared = Arc::new(Mutex::new(FakeState::default()));
    let app = router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server failed");
    });

    let config = ApiConfig::new(format!("http://{}/api", addr)).expect("valid test url");
    (config, state)
}
