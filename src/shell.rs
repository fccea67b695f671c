//! Line-oriented front end over the session and task layers.

use std::fmt::Write;

use tracing::warn;

use crate::error::AppError;
use crate::models::{Status, Task, TaskDraft, format_date, format_date_time};
use crate::session::{SessionManager, SessionProbe, SignInOutcome};
use crate::store::{TaskBoard, TaskStore};

pub const HELP: &str = "\
Commands:
  register <email> <password> <repeat>   create an account and sign in
  login <email> <password>               sign in
  logout                                 sign out
  whoami                                 show the signed-in user
  list                                   reload and show tasks
  add <title...>                         create a task
  show <id>                              show one task
  edit <id> <title...>                   change a task's title
  note <id> <text...>                    replace a task's text
  start <id> | done <id> | undo <id>     set status to IN_PROGRESS / DONE / TODO
  rm <id>                                delete a task
  help                                   show this message
  quit                                   leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Register {
        email: String,
        password: String,
        repeat_password: String,
    },
    Login {
        email: String,
        password: String,
    },
    Logout,
    WhoAmI,
    List,
    Add {
        title: String,
    },
    Show {
        id: i64,
    },
    Edit {
        id: i64,
        title: String,
    },
    Note {
        id: i64,
        text: String,
    },
    SetStatus {
        id: i64,
        status: Status,
    },
    Remove {
        id: i64,
    },
    Help,
    Quit,
}

fn parse_id(raw: Option<&str>) -> Result<i64, String> {
    let raw = raw.ok_or_else(|| "missing task id".to_string())?;
    raw.parse::<i64>()
        .map_err(|_| format!("invalid task id: {}", raw))
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let mut args = rest.split_whitespace();

    let command = match verb {
        "register" => {
            let email = args.next().unwrap_or_default().to_string();
            let password = args.next().unwrap_or_default().to_string();
            let repeat_password = args.next().unwrap_or_default().to_string();
            Command::Register {
                email,
                password,
                repeat_password,
            }
        }
        "login" => {
            let email = args.next().unwrap_or_default().to_string();
            let password = args.next().unwrap_or_default().to_string();
            Command::Login { email, password }
        }
        "logout" => Command::Logout,
        "whoami" => Command::WhoAmI,
        "list" | "ls" => Command::List,
        "add" => Command::Add {
            title: rest.to_string(),
        },
        "show" => Command::Show {
            id: parse_id(args.next())?,
        },
        "edit" | "note" => {
            let (raw_id, value) = match rest.split_once(char::is_whitespace) {
                Some((id, value)) => (Some(id), value.trim().to_string()),
                None => (if rest.is_empty() { None } else { Some(rest) }, String::new()),
            };
            let id = parse_id(raw_id)?;
            if verb == "edit" {
                Command::Edit { id, title: value }
            } else {
                Command::Note { id, text: value }
            }
        }
        "start" | "done" | "undo" => {
            let status = match verb {
                "start" => Status::InProgress,
                "done" => Status::Done,
                _ => Status::Todo,
            };
            Command::SetStatus {
                id: parse_id(args.next())?,
                status,
            }
        }
        "rm" | "delete" => Command::Remove {
            id: parse_id(args.next())?,
        },
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "" => return Err("empty command".to_string()),
        other => return Err(format!("unknown command: {} (try `help`)", other)),
    };
    Ok(command)
}

fn render_task_line(out: &mut String, task: &Task) {
    let marker = match task.status {
        Status::Done => "x",
        Status::InProgress => "~",
        Status::Todo => " ",
    };
    let _ = writeln!(out, "  [{}] #{} {}", marker, task.id, task.title);
    if !task.text.is_empty() {
        let _ = writeln!(out, "        {}", task.text);
    }
    if task.status.is_done() {
        let _ = writeln!(out, "        Completed: {}", format_date(task.done_at));
    } else {
        let _ = writeln!(out, "        Created: {}", format_date(Some(task.created_at)));
    }
}

pub fn render_board(board: &TaskBoard) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Incomplete Tasks ({})", board.incomplete.len());
    if board.incomplete.is_empty() {
        let _ = writeln!(out, "  No incomplete tasks");
    }
    for task in &board.incomplete {
        render_task_line(&mut out, task);
    }

    let _ = writeln!(out, "Completed Tasks ({})", board.completed.len());
    if board.completed.is_empty() {
        let _ = writeln!(out, "  No completed tasks");
    }
    for task in &board.completed {
        render_task_line(&mut out, task);
    }

    out.trim_end().to_string()
}

pub fn render_task(task: &Task) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "#{} {}", task.id, task.title);
    let _ = writeln!(out, "Status:    {}", task.status);
    let _ = writeln!(out, "Created:   {}", format_date_time(Some(task.created_at)));
    let _ = writeln!(out, "Completed: {}", format_date_time(task.done_at));
    if !task.text.is_empty() {
        let _ = writeln!(out, "\n{}", task.text);
    }
    out.trim_end().to_string()
}

pub struct Shell {
    session: SessionManager,
    store: TaskStore,
}

impl Shell {
    pub fn new(session: SessionManager, store: TaskStore) -> Self {
        Self { session, store }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    /// Startup greeting: restores an existing session if the server still
    /// honours it.
    pub async fn start(&self) -> String {
        match self.session.check_session().await {
            SessionProbe::Authenticated(user) => match self.store.list().await {
                Ok(_) => format!(
                    "Hello, {}!\n{}",
                    user.email,
                    render_board(&self.store.board())
                ),
                Err(err) => format!("Hello, {}! ({})", user.email, err.user_message()),
            },
            SessionProbe::Anonymous => "Welcome! Use `login` or `register` to begin.".to_string(),
            SessionProbe::ProbeFailed(err) => format!(
                "Could not check your session: {}. Use `login` to begin.",
                err.user_message()
            ),
        }
    }

    /// Swaps the cache over to the newly signed-in user. A failed load
    /// does not undo the sign-in; it is only reported next to `greeting`.
    async fn reload_for(&self, greeting: String) -> String {
        self.store.clear();
        match self.store.list().await {
            Ok(tasks) => format!("{} You have {} task(s).", greeting, tasks.len()),
            Err(err) => {
                warn!(error = %err, "failed to load tasks after sign-in");
                format!("{} (could not load tasks: {})", greeting, err.user_message())
            }
        }
    }

    fn draft(&self, id: i64) -> Result<TaskDraft, AppError> {
        self.require_session()?;
        self.store
            .get(id)
            .map(|task| TaskDraft::new(&task))
            .ok_or_else(|| AppError::NotFound(format!("Task {} is not loaded", id)))
    }

    fn require_session(&self) -> Result<(), AppError> {
        if self.session.is_authenticated() {
            Ok(())
        } else {
            Err(AppError::Auth("Please log in first".to_string()))
        }
    }

    pub async fn execute(&self, command: Command) -> Result<String, AppError> {
        match command {
            Command::Register {
                email,
                password,
                repeat_password,
            } => match self.session.register(&email, &password, &repeat_password).await? {
                Some(user) => Ok(self
                    .reload_for(format!("Registered and signed in as {}.", user.email))
                    .await),
                None => Ok("Registered. Use `login` to sign in.".to_string()),
            },
            Command::Login { email, password } => {
                match self.session.sign_in(&email, &password).await? {
                    SignInOutcome::Authenticated(user) => {
                        Ok(self.reload_for(format!("Hello, {}!", user.email)).await)
                    }
                    SignInOutcome::Rejected => Ok("Login failed: invalid email or password".to_string()),
                }
            }
            Command::Logout => {
                let result = self.session.logout().await;
                self.store.clear();
                result.map(|_| "Signed out".to_string())
            }
            Command::WhoAmI => Ok(match self.session.user() {
                Some(user) => user.email,
                None => "Not signed in".to_string(),
            }),
            Command::List => {
                self.require_session()?;
                self.store.list().await?;
                Ok(render_board(&self.store.board()))
            }
            Command::Add { title } => {
                self.require_session()?;
                let task = self.store.create(&title, "").await?;
                Ok(format!("Added #{} {}", task.id, task.title))
            }
            Command::Show { id } => {
                self.require_session()?;
                self.store
                    .get(id)
                    .map(|task| render_task(&task))
                    .ok_or_else(|| AppError::NotFound(format!("Task {} is not loaded", id)))
            }
            Command::Edit { id, title } => {
                let mut draft = self.draft(id)?;
                draft.title = title;
                Ok(match self.store.save_draft(&draft).await? {
                    Some(task) => format!("Renamed #{} to {}", task.id, task.title),
                    None => format!("No changes to #{}", id),
                })
            }
            Command::Note { id, text } => {
                let mut draft = self.draft(id)?;
                draft.text = text;
                Ok(match self.store.save_draft(&draft).await? {
                    Some(task) => format!("Updated text of #{}", task.id),
                    None => format!("No changes to #{}", id),
                })
            }
            Command::SetStatus { id, status } => {
                self.require_session()?;
                let task = self.store.set_status(id, status).await?;
                Ok(format!("#{} is now {}", task.id, task.status))
            }
            Command::Remove { id } => {
                self.require_session()?;
                self.store.delete(id).await?;
                Ok(format!("Deleted #{}", id))
            }
            Command::Help => Ok(HELP.to_string()),
            Command::Quit => Ok("Bye".to_string()),
        }
    }
}
