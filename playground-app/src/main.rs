use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use playground_app::{commands, config::Config, session::PlaygroundSession};
use playground_core::ScoreStore;
use playground_persistence::{SqliteKeyValueStore, connect_and_migrate};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they never interleave with game output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting playground...");

    let config = Config::from_env()?;

    let db = match connect_and_migrate(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to database and run migrations: {}", e);
            std::process::exit(1);
        }
    };
    let store = Arc::new(ScoreStore::new(Arc::new(SqliteKeyValueStore::new(db))));
    let mut session = PlaygroundSession::new(config, store);

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    stdout
        .write_all(b"Welcome to the playground. Type 'help' for commands.\n> ")
        .await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let mut output = String::new();
        match commands::parse(&line) {
            Ok(command) => match session.execute(command).await {
                Ok(reply) => {
                    for text in &reply.lines {
                        output.push_str(text);
                        output.push('\n');
                    }
                    if reply.quit {
                        stdout.write_all(output.as_bytes()).await?;
                        break;
                    }
                }
                Err(e) => {
                    warn!("Command failed: {:#}", e);
                    output.push_str("Something went wrong, please try again.\n");
                }
            },
            Err(commands::ParseError::Empty) => {}
            Err(e) => {
                output.push_str(&e.to_string());
                output.push('\n');
            }
        }
        output.push_str("> ");
        stdout.write_all(output.as_bytes()).await?;
        stdout.flush().await?;
    }

    stdout.flush().await?;
    info!("Playground stopped");
    Ok(())
}
