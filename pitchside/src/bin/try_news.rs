//! Manual smoke test against a live chat-completion endpoint.
//!
//!   OPENAI_API_KEY=... cargo run --bin try_news -- "Borussia Dortmund"

use std::sync::Arc;

use anyhow::Context;
use pitchside::llm::remote::RemoteLlmProvider;
use pitchside::news::NewsGateway;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let api_key = std::env::var("OPENAI_API_KEY").context("Set OPENAI_API_KEY")?;

    // Allow custom base URL or use OpenAI default
    let base_url = std::env::var("LLM_BASE_URL")
        .unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".to_string());

    let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

    let query = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "latest football news".to_string());

    println!("\n{}", "=".repeat(60));
    println!("Base URL: {}", base_url);
    println!("Model: {}", model);
    println!("Query: {}", query);
    println!("{}", "=".repeat(60));

    let gateway = NewsGateway::new(Arc::new(RemoteLlmProvider::new(&base_url, &api_key, &model)));

    let items = match gateway.fetch_news(&query).await {
        Ok(items) => items,
        Err(e) => {
            eprintln!("✗ News failed ({}): {}", e.kind(), e);
            return Ok(());
        }
    };

    for (i, item) in items.iter().enumerate() {
        println!("  {}. [{}] {}", i + 1, item.date, item.title);
        println!("     {}", item.url);
    }

    if let Some(first) = items.first() {
        println!("\nSummary of \"{}\":", first.title);
        match gateway.summarize(&first.title).await {
            Ok(summary) => println!("{}", summary),
            Err(e) => eprintln!("✗ Summary failed ({}): {}", e.kind(), e),
        }
    }

    Ok(())
}
