pub mod auth;
pub mod memory;
pub mod tasks;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{Credentials, NewTaskRequest, Task, UpdateTaskRequest, User};

pub use auth::HttpAuthApi;
pub use memory::InMemoryBackend;
pub use tasks::HttpTaskApi;

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn sign_up(&self, credentials: &Credentials) -> Result<(), AppError>;
    /// `Ok(false)` when the server rejects the credentials.
    async fn sign_in(&self, credentials: &Credentials) -> Result<bool, AppError>;
    /// `Ok(None)` for any non-success answer; `Err` only when the request
    /// itself could not be completed.
    async fn current_user(&self) -> Result<Option<User>, AppError>;
    async fn logout(&self) -> Result<(), AppError>;
}

#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list_tasks(&self) -> Result<Vec<Task>, AppError>;
    async fn create_task(&self, req: &NewTaskRequest) -> Result<Task, AppError>;
    async fn update_task(&self, id: i64, req: &UpdateTaskRequest) -> Result<Task, AppError>;
    async fn delete_task(&self, id: i64) -> Result<(), AppError>;
}
