//! Smoke tool: streams one answer from a completion endpoint to stdout.
//! Reads COMPLETION_API_URL, COMPLETION_MODEL and optional COMPLETION_API_TOKEN from env / .env.

use anyhow::Context;
use completion_client::{CompletionChunk, CompletionClient, CompletionRequest};
use prompt::ChatMessage;
use std::io::Write;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let endpoint = std::env::var("COMPLETION_API_URL")
        .unwrap_or_else(|_| "http://localhost:11434/api/chat".to_string());
    let model = std::env::var("COMPLETION_MODEL").context("COMPLETION_MODEL not set")?;
    let token = std::env::var("COMPLETION_API_TOKEN")
        .ok()
        .filter(|t| !t.is_empty());
    let question = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Hello, how are you?".to_string());

    let request = CompletionRequest::new(model, Vec::<String>::new(), vec![ChatMessage::user(question)]);
    let mut lines = CompletionClient::new()
        .stream_chat(&endpoint, token.as_deref(), &request)
        .await?;

    let mut stdout = std::io::stdout();
    while let Some(line) = lines.next_line().await? {
        let Ok(chunk) = CompletionChunk::from_line(&line) else {
            continue;
        };
        write!(stdout, "{}", chunk.delta_text())?;
        stdout.flush()?;
        if chunk.is_final() {
            break;
        }
    }
    writeln!(stdout)?;

    Ok(())
}
