//! Process-local stand-in for the task service, following the same rules
//! the real service enforces. Used to exercise the session and task layers
//! without a network.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use super::{AuthApi, TaskApi};
use crate::error::AppError;
use crate::models::{Credentials, NewTaskRequest, Status, Task, UpdateTaskRequest, User};

#[derive(Debug, Default)]
struct Account {
    id: i64,
    password: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    accounts: HashMap<String, Account>,
    session: Option<String>,
    tasks: Vec<Task>,
    next_task_id: i64,
    offline: bool,
    calls: usize,
}

#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: Mutex<MemoryState>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an account without signing it in.
    pub fn with_account(self, email: &str, password: &str) -> Self {
        {
            let mut state = self.lock();
            let id = state.accounts.len() as i64 + 1;
            state.accounts.insert(
                email.to_string(),
                Account {
                    id,
                    password: password.to_string(),
                },
            );
        }
        self
    }

    /// While offline every call fails as if the service were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Drops the server-side session, as an expired cookie would.
    pub fn expire_session(&self) {
        self.lock().session = None;
    }

    /// Number of calls that reached the backend.
    pub fn calls(&self) -> usize {
        self.lock().calls
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(&self) -> Result<MutexGuard<'_, MemoryState>, AppError> {
        let mut state = self.lock();
        state.calls += 1;
        if state.offline {
            return Err(AppError::Server {
                status: 503,
                message: "Service unavailable".to_string(),
            });
        }
        Ok(state)
    }
}

impl MemoryState {
    fn session_user_id(&self) -> Result<i64, AppError> {
        self.session
            .as_ref()
            .and_then(|email| self.accounts.get(email))
            .map(|account| account.id)
            .ok_or_else(|| AppError::Auth("Not authenticated".to_string()))
    }

    fn owned_task_mut(&mut self, id: i64) -> Result<&mut Task, AppError> {
        let user_id = self.session_user_id()?;
        self.tasks
            .iter_mut()
            .find(|t| t.id == id && t.user_id == user_id)
            .ok_or_else(|| AppError::NotFound("Task not found".to_string()))
    }
}

#[async_trait]
impl AuthApi for InMemoryBackend {
    async fn sign_up(&self, credentials: &Credentials) -> Result<(), AppError> {
        let mut state = self.enter()?;
        if state.accounts.contains_key(&credentials.email) {
            return Err(AppError::Conflict("User already exists".to_string()));
        }
        let id = state.accounts.len() as i64 + 1;
        state.accounts.insert(
            credentials.email.clone(),
            Account {
                id,
                password: credentials.password.clone(),
            },
        );
        state.session = Some(credentials.email.clone());
        Ok(())
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<bool, AppError> {
        let mut state = self.enter()?;
        let accepted = state
            .accounts
            .get(&credentials.email)
            .is_some_and(|account| account.password == credentials.password);
        if accepted {
            state.session = Some(credentials.email.clone());
        }
        Ok(accepted)
    }

    async fn current_user(&self) -> Result<Option<User>, AppError> {
        let state = self.enter()?;
        Ok(state.session.clone().map(|email| User { email }))
    }

    async fn logout(&self) -> Result<(), AppError> {
        let mut state = self.enter()?;
        match state.session.take() {
            Some(_) => Ok(()),
            None => Err(AppError::Auth("Not authenticated".to_string())),
        }
    }
}

#[async_trait]
impl TaskApi for InMemoryBackend {
    async fn list_tasks(&self) -> Result<Vec<Task>, AppError> {
        let state = self.enter()?;
        let user_id = state.session_user_id()?;
        Ok(state
            .tasks
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create_task(&self, req: &NewTaskRequest) -> Result<Task, AppError> {
        let mut state = self.enter()?;
        let user_id = state.session_user_id()?;
        let title = req.title.trim();
        if title.is_empty() {
            return Err(AppError::BadRequest("Title is required".to_string()));
        }

        state.next_task_id += 1;
        let task = Task {
            id: state.next_task_id,
            title: title.to_string(),
            text: req.text.clone().unwrap_or_default(),
            status: Status::Todo,
            user_id,
            created_at: Utc::now().naive_utc(),
            done_at: None,
        };
        state.tasks.push(task.clone());
        Ok(task)
    }

    async fn update_task(&self, id: i64, req: &UpdateTaskRequest) -> Result<Task, AppError> {
        let mut state = self.enter()?;
        if req.title.trim().is_empty() {
            return Err(AppError::BadRequest("Title is required".to_string()));
        }

        let task = state.owned_task_mut(id)?;
        task.title = req.title.trim().to_string();
        task.text = req.text.clone();
        task.done_at = match req.status {
            Status::Done => task.done_at.or_else(|| Some(Utc::now().naive_utc())),
            Status::Todo | Status::InProgress => None,
        };
        task.status = req.status;
        Ok(task.clone())
    }

    async fn delete_task(&self, id: i64) -> Result<(), AppError> {
        let mut state = self.enter()?;
        state.owned_task_mut(id)?;
        state.tasks.retain(|t| t.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tasks_are_scoped_to_the_signed_in_user() {
        let backend = InMemoryBackend::new()
            .with_account("a@x.io", "pw1")
            .with_account("b@x.io", "pw2");

        assert!(backend.sign_in(&Credentials::new("a@x.io", "pw1")).await.unwrap());
        let task = backend
            .create_task(&NewTaskRequest {
                title: "mine".to_string(),
                text: None,
            })
            .await
            .unwrap();

        assert!(backend.sign_in(&Credentials::new("b@x.io", "pw2")).await.unwrap());
        assert!(backend.list_tasks().await.unwrap().is_empty());
        assert!(matches!(
            backend.delete_task(task.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn done_at_tracks_status() {
        let backend = InMemoryBackend::new().with_account("a@x.io", "pw1");
        backend.sign_in(&Credentials::new("a@x.io", "pw1")).await.unwrap();
        let task = backend
            .create_task(&NewTaskRequest {
                title: "t".to_string(),
                text: None,
            })
            .await
            .unwrap();

        let mut req = UpdateTaskRequest::from(&task);
        req.status = Status::Done;
        let done = backend.update_task(task.id, &req).await.unwrap();
        assert!(done.done_at.is_some());

        req.status = Status::InProgress;
        let reopened = backend.update_task(task.id, &req).await.unwrap();
        assert!(reopened.done_at.is_none());
    }

    #[tokio::test]
    async fn requests_without_session_are_rejected() {
        let backend = InMemoryBackend::new();
        assert!(matches!(backend.list_tasks().await, Err(AppError::Auth(_))));
        assert!(matches!(backend.logout().await, Err(AppError::Auth(_))));
        assert_eq!(backend.current_user().await.unwrap(), None);
    }
}
