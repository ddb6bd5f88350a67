//! Conversation inspection and maintenance commands.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;

use causerie_types::conversation::ConversationId;

use crate::state::AppState;

/// List every conversation with its turn count.
pub async fn list_conversations(state: &AppState, json: bool) -> Result<()> {
    let service = &state.conversation_service;
    let conversations = service.list_conversations().await?;
    let counts = service.turn_counts().await?;

    let rows: Vec<_> = conversations
        .into_iter()
        .map(|c| {
            let turns = counts.get(&c.id).copied().unwrap_or(0);
            (c, turns)
        })
        .collect();

    if json {
        let value: Vec<_> = rows
            .iter()
            .map(|(c, turns)| {
                serde_json::json!({
                    "id": c.id,
                    "system_prompt": c.system_prompt,
                    "created_at": c.created_at,
                    "turns": turns,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!();
        println!(
            "  {} No conversations yet. Create one with: {}",
            style("i").blue().bold(),
            style("POST /new_conversation").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Id").fg(Color::White),
        Cell::new("System prompt").fg(Color::White),
        Cell::new("Turns").fg(Color::White),
        Cell::new("Created").fg(Color::White),
    ]);

    for (conversation, turns) in &rows {
        table.add_row(vec![
            Cell::new(&conversation.id).fg(Color::Cyan),
            Cell::new(truncate(&conversation.system_prompt, 50)),
            Cell::new(turns),
            Cell::new(format_relative_time(&conversation.created_at)).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} conversation{}",
        style(rows.len()).bold(),
        if rows.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Show one conversation: system prompt then every turn.
pub async fn show_conversation(state: &AppState, id: &str, json: bool) -> Result<()> {
    let conversation_id = ConversationId::from(id);
    let service = &state.conversation_service;

    let system_prompt = service.get_system_prompt(&conversation_id).await?;
    let turns = service.get_turns(&conversation_id).await?;

    if json {
        let value = serde_json::json!({
            "conversation_id": conversation_id,
            "pre_prompt": system_prompt,
            "turns": turns,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!();
    println!("  {} {}", style("Conversation").bold(), style(&conversation_id).cyan());
    println!();
    println!("  {}", style("── System prompt ──").dim());
    if system_prompt.is_empty() {
        println!("  {}", style("(empty)").dim());
    } else {
        println!("  {system_prompt}");
    }
    println!();
    println!("  {}", style(format!("── Turns ({}) ──", turns.len())).dim());
    for turn in &turns {
        println!("  {} {}", style("User:").green().bold(), turn.user_text);
        println!("  {} {}", style("Bot:").blue().bold(), turn.bot_text);
        println!();
    }
    if turns.is_empty() {
        println!("  {}", style("(no turns)").dim());
        println!();
    }

    Ok(())
}

/// Delete every conversation and turn, after confirmation unless `force`.
pub async fn reset(state: &AppState, force: bool, json: bool) -> Result<()> {
    let stats = state.conversation_service.stats().await?;

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Permanently delete {} conversation(s) and {} turn(s)?",
                style(stats.conversations).red().bold(),
                style(stats.turns).red().bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    state.conversation_service.reset().await?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "reset": true,
                "conversations_deleted": stats.conversations,
                "turns_deleted": stats.turns,
            })
        );
    } else {
        println!(
            "  {} Deleted {} conversation(s) and {} turn(s).",
            style("✓").red().bold(),
            stats.conversations,
            stats.turns
        );
    }

    Ok(())
}

/// Shorten `text` to at most `max` characters, marking the cut with "...".
fn truncate(text: &str, max: usize) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() > max {
        let kept: String = single_line.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        single_line
    }
}

fn format_relative_time(dt: &chrono::DateTime<chrono::Utc>) -> String {
    let diff = chrono::Utc::now() - *dt;

    if diff.num_minutes() < 1 {
        "just now".to_string()
    } else if diff.num_hours() < 1 {
        format!("{}m ago", diff.num_minutes())
    } else if diff.num_days() < 1 {
        format!("{}h ago", diff.num_hours())
    } else if diff.num_days() < 30 {
        format!("{}d ago", diff.num_days())
    } else {
        dt.format("%Y-%m-%d").to_string()
    }
}
