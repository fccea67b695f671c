use async_trait::async_trait;

use super::TaskApi;
use crate::error::AppError;
use crate::http::ApiClient;
use crate::models::{NewTaskRequest, Task, UpdateTaskRequest};

pub struct HttpTaskApi {
    client: ApiClient,
}

impl HttpTaskApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn list_tasks(&self) -> Result<Vec<Task>, AppError> {
        let response = self.client.get("/tasks").send().await?;
        ApiClient::read_json(response, "Failed to fetch tasks").await
    }

    async fn create_task(&self, req: &NewTaskRequest) -> Result<Task, AppError> {
        let response = self.client.post("/tasks").json(req).send().await?;
        ApiClient::read_json(response, "Failed to create task").await
    }

    async fn update_task(&self, id: i64, req: &UpdateTaskRequest) -> Result<Task, AppError> {
        let response = self
            .client
            .put(&format!("/tasks/{}", id))
            .json(req)
            .send()
            .await?;
        ApiClient::read_json(response, "Failed to update task").await
    }

    async fn delete_task(&self, id: i64) -> Result<(), AppError> {
        let response = self
            .client
            .delete(&format!("/tasks/{}", id))
            .send()
            .await?;
        ApiClient::expect_success(response, "Failed to delete task").await
    }
}
