//! System status and inference connectivity commands.

use anyhow::Result;
use console::style;

use causerie_infra::config::resolve_database_url;
use causerie_infra::llm::test_provider_connection;

use crate::state::AppState;

/// Display store counts and the effective configuration.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let stats = state.conversation_service.stats().await?;
    let config = &state.config;
    let database_url = resolve_database_url(config, &state.data_dir);

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "database_url": database_url,
            "conversations": stats.conversations,
            "turns": stats.turns,
            "server": {
                "host": config.server.host,
                "port": config.server.port,
            },
            "inference": {
                "provider": config.inference.provider.to_string(),
                "base_url": config.inference.base_url,
                "model": config.inference.model,
            },
            "generation": config.generation,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Causerie v{}",
        style("⚡").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();

    println!("  {}", style("── Store ──").dim());
    println!("  Conversations: {}", style(stats.conversations).bold());
    println!("  Turns:         {}", style(stats.turns).bold());
    println!();

    println!("  {}", style("── Inference ──").dim());
    println!("  Provider: {}", style(&config.inference.provider).cyan());
    println!("  Endpoint: {}", config.inference.base_url);
    if let Some(model) = &config.inference.model {
        println!("  Model:    {model}");
    }
    println!(
        "  Sampling: {} tokens max, temperature {}, {} turn(s) of context",
        config.generation.max_tokens, config.generation.temperature, config.generation.context_turns
    );
    println!();

    println!("  {}", style("── System ──").dim());
    println!("  Data dir: {}", style(state.data_dir.display()).dim());
    println!("  Database: {}", style(&database_url).dim());
    println!(
        "  Listen:   {}",
        style(format!("{}:{}", config.server.host, config.server.port)).dim()
    );
    println!();

    Ok(())
}

/// Send a one-token request to the configured engine and report the outcome.
pub async fn check(state: &AppState, json: bool) -> Result<()> {
    let provider = state.conversation_service.provider();
    let base_url = &state.config.inference.base_url;

    let start = std::time::Instant::now();
    let result = test_provider_connection(provider).await;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    if json {
        let value = serde_json::json!({
            "provider": provider.name(),
            "base_url": base_url,
            "healthy": result.is_ok(),
            "latency_ms": elapsed_ms,
            "error": result.as_ref().err().map(|e| e.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        match &result {
            Ok(()) => println!(
                "  {} {} at {} answered in {elapsed_ms}ms",
                style("✓").green().bold(),
                provider.name(),
                style(base_url).cyan()
            ),
            Err(e) => println!(
                "  {} {} at {} failed: {e}",
                style("✗").red().bold(),
                provider.name(),
                style(base_url).cyan()
            ),
        }
    }

    result.map_err(Into::into)
}
