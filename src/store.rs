use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use crate::api::TaskApi;
use crate::error::AppError;
use crate::guard::InFlight;
use crate::models::{NewTaskRequest, Status, Task, TaskDraft, UpdateTaskRequest};
use crate::validation;

/// Tasks split for display. `IN_PROGRESS` counts as incomplete, so every
/// task appears in exactly one list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskBoard {
    pub incomplete: Vec<Task>,
    pub completed: Vec<Task>,
}

pub fn partition(tasks: &[Task]) -> TaskBoard {
    let (completed, incomplete): (Vec<Task>, Vec<Task>) =
        tasks.iter().cloned().partition(|t| t.status.is_done());
    TaskBoard {
        incomplete,
        completed,
    }
}

/// Local copy of the signed-in user's tasks, kept in step with the server
/// after every successful call.
pub struct TaskStore {
    api: Arc<dyn TaskApi>,
    tasks: RwLock<Vec<Task>>,
    in_flight: InFlight,
}

impl TaskStore {
    pub fn new(api: Arc<dyn TaskApi>) -> Self {
        Self {
            api,
            tasks: RwLock::new(Vec::new()),
            in_flight: InFlight::new(),
        }
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.tasks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self, id: i64) -> Option<Task> {
        self.tasks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    pub fn board(&self) -> TaskBoard {
        partition(&self.tasks.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Drops the cache, e.g. after sign-out.
    pub fn clear(&self) {
        self.write().clear();
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Task>> {
        self.tasks.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetches the full collection and replaces the cache with it.
    pub async fn list(&self) -> Result<Vec<Task>, AppError> {
        let _token = self.in_flight.begin("list tasks")?;
        let tasks = self.api.list_tasks().await?;
        info!(count = tasks.len(), "tasks loaded");
        *self.write() = tasks.clone();
        Ok(tasks)
    }

    /// The new task goes to the front of the cache.
    pub async fn create(&self, title: &str, text: &str) -> Result<Task, AppError> {
        validation::validate_title(title).into_result()?;

        let _token = self.in_flight.begin("create task")?;
        let req = NewTaskRequest {
            title: title.trim().to_string(),
            text: Some(text.to_string()),
        };
        let task = self.api.create_task(&req).await?;
        info!(id = task.id, "task created");
        self.write().insert(0, task.clone());
        Ok(task)
    }

    /// Full-replacement update; replaces the cached entry with the server's
    /// version.
    pub async fn update(&self, id: i64, req: UpdateTaskRequest) -> Result<Task, AppError> {
        validation::validate_title(&req.title).into_result()?;

        let _token = self.in_flight.begin(format!("update task {}", id))?;
        let task = self.api.update_task(id, &req).await?;
        info!(id, status = %task.status, "task updated");

        let mut tasks = self.write();
        match tasks.iter_mut().find(|t| t.id == id) {
            Some(slot) => *slot = task.clone(),
            None => tasks.insert(0, task.clone()),
        }
        Ok(task)
    }

    /// Applies `edit` to the cached task's current fields and sends all of
    /// them back.
    pub async fn modify<F>(&self, id: i64, edit: F) -> Result<Task, AppError>
    where
        F: FnOnce(&mut UpdateTaskRequest),
    {
        let current = self
            .get(id)
            .ok_or_else(|| AppError::NotFound(format!("Task {} is not loaded", id)))?;
        let mut req = UpdateTaskRequest::from(&current);
        edit(&mut req);
        self.update(id, req).await
    }

    pub async fn set_status(&self, id: i64, status: Status) -> Result<Task, AppError> {
        self.modify(id, |req| req.status = status).await
    }

    /// Saves an editor draft. `Ok(None)` when nothing changed.
    pub async fn save_draft(&self, draft: &TaskDraft) -> Result<Option<Task>, AppError> {
        if !draft.has_changes() {
            return Ok(None);
        }
        self.update(draft.task_id(), draft.to_update()).await.map(Some)
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let _token = self.in_flight.begin(format!("delete task {}", id))?;
        self.api.delete_task(id).await?;
        info!(id, "task deleted");
        self.write().retain(|t| t.id != id);
        Ok(())
    }
}
