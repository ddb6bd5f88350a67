//! Generation context assembly and text sanitation.
//!
//! The model sees a flat transcript:
//!
//! ```text
//! <system prompt>
//! User: <older user text>
//! Bot: <older bot text>
//! User: <newer user text>
//! Bot: <newer bot text>
//! User: <new prompt>
//! Bot:
//! ```
//!
//! and is stopped as soon as it starts a new `User:`/`Bot:` line.

use causerie_types::conversation::Turn;

pub const USER_MARKER: &str = "User:";
pub const BOT_MARKER: &str = "Bot:";

/// Stop sequences that end a reply before the model writes the next role line.
pub fn stop_sequences() -> Vec<String> {
    vec![format!("\n{USER_MARKER}"), format!("\n{BOT_MARKER}")]
}

/// Render one stored turn as two transcript lines.
pub fn render_turn(turn: &Turn) -> String {
    format!(
        "{USER_MARKER} {}\n{BOT_MARKER} {}",
        turn.user_text, turn.bot_text
    )
}

/// Assemble the full prompt for the engine.
///
/// `history` must already be ordered oldest first. An empty history still
/// produces its (empty) line so the layout never depends on turn count.
pub fn build_prompt(system_prompt: &str, history: &[Turn], user_prompt: &str) -> String {
    let history = history
        .iter()
        .map(render_turn)
        .collect::<Vec<_>>()
        .join("\n");

    format!("{system_prompt}\n{history}\n{USER_MARKER} {user_prompt}\n{BOT_MARKER}")
}

/// Clean raw engine output: trim, drop every echoed role marker, trim again.
pub fn sanitize_reply(raw: &str) -> String {
    raw.trim()
        .replace(USER_MARKER, "")
        .replace(BOT_MARKER, "")
        .trim()
        .to_string()
}

/// Clean the user text before it is stored.
///
/// Drops a leading echo of the system prompt (clients that resend it ahead of
/// the question). The echo must end at whitespace or at the end of the text.
/// Text elsewhere in the prompt is left alone, and a blank system prompt never
/// strips anything.
pub fn sanitize_user_text(user_prompt: &str, system_prompt: &str) -> String {
    let trimmed = user_prompt.trim();
    let system_prompt = system_prompt.trim();
    if system_prompt.is_empty() {
        return trimmed.to_string();
    }
    match trimmed.strip_prefix(system_prompt) {
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => {
            rest.trim_start().to_string()
        }
        _ => trimmed.to_string(),
    }
}
