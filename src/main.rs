use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tasktrack::api::{HttpAuthApi, HttpTaskApi};
use tasktrack::config::ApiConfig;
use tasktrack::http::ApiClient;
use tasktrack::session::SessionManager;
use tasktrack::shell::{Command, Shell, parse_command};
use tasktrack::store::TaskStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "tasktrack=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ApiConfig::new_from_env()?;
    info!("using task service at {}", config.base_url);

    let client = ApiClient::new(&config)?;
    let shell = Shell::new(
        SessionManager::new(Arc::new(HttpAuthApi::new(client.clone()))),
        TaskStore::new(Arc::new(HttpTaskApi::new(client))),
    );

    let mut stdout = tokio::io::stdout();
    let greeting = shell.start().await;
    stdout.write_all(format!("{}\n", greeting).as_bytes()).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let reply = match parse_command(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => match shell.execute(command).await {
                Ok(out) => out,
                Err(err) => {
                    tracing::debug!("command failed: {:?}", err);
                    format!("Error: {}", err.user_message())
                }
            },
            Err(msg) => msg,
        };
        stdout.write_all(format!("{}\n", reply).as_bytes()).await?;
    }

    Ok(())
}
