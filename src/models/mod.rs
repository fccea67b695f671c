pub mod datetime;
pub mod task;
pub mod user;

pub use datetime::{format_date, format_date_time};
pub use task::{NewTaskRequest, Status, Task, TaskDraft, UpdateTaskRequest};
pub use user::{Credentials, User};
