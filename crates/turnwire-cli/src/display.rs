//! Display utilities for CLI output formatting
//!
//! Provides colored output for decoded messages, partial segments and warnings

use colored::Colorize;
use turnwire::{Decoded, Message, MessageRole, Tail, Warning};

/// Maximum characters of a payload shown per message
const PREVIEW_CHARS: usize = 400;

/// Label for a message, e.g. `assistant to=get_car_price`
fn message_label(message: &Message) -> String {
    match (message.role, message.function_name()) {
        (MessageRole::Assistant, Some(name)) => format!("assistant to={name}"),
        (MessageRole::Function, Some(name)) => format!("function name={name}"),
        (role, _) => role.to_string(),
    }
}

fn colored_label(message: &Message) -> String {
    let label = message_label(message);
    match message.role {
        MessageRole::System => label.bright_black().bold().to_string(),
        MessageRole::User => label.bright_cyan().bold().to_string(),
        MessageRole::Assistant if message.is_function_call() => {
            label.bright_yellow().bold().to_string()
        }
        MessageRole::Assistant => label.bright_green().bold().to_string(),
        MessageRole::Function => label.bright_magenta().bold().to_string(),
    }
}

/// Shortens long payloads
fn preview(text: &str) -> String {
    let count = text.chars().count();
    if count > PREVIEW_CHARS {
        let truncate_idx = text
            .char_indices()
            .take(PREVIEW_CHARS)
            .last()
            .map_or(0, |(idx, ch)| idx + ch.len_utf8());
        format!("{}... ({count} chars)", &text[..truncate_idx])
    } else {
        text.to_string()
    }
}

/// Formats one message with an index gutter
pub fn format_message(index: usize, message: &Message, partial: bool) -> String {
    let marker = if partial {
        "…".yellow().to_string()
    } else {
        "●".bright_blue().to_string()
    };
    let payload = message.function_call.as_ref().map_or_else(
        || message.content_str(),
        |call| call.arguments.as_str(),
    );

    let mut out = format!("{marker} {} {}", format!("[{index}]").dimmed(), colored_label(message));
    for line in preview(payload).lines() {
        out.push_str("\n  ");
        out.push_str(line);
    }
    out
}

/// Formats a warning line
pub fn format_warning(warning: &Warning) -> String {
    format!("{} {warning}", "warning:".bright_yellow())
}

/// Display a decoded transcript
pub fn display_decoded(decoded: &Decoded) {
    for (index, message) in decoded.messages.iter().enumerate() {
        println!("{}", format_message(index, message, false));
    }
    if let Some(partial) = &decoded.partial {
        println!(
            "{}",
            format_message(decoded.messages.len(), partial, true)
        );
    }

    let status = match decoded.tail {
        Tail::Complete => "complete".bright_green(),
        Tail::Truncated => "truncated".yellow(),
        Tail::Unparsed => "unparsed".bright_red(),
    };
    println!(
        "\n{} {} message(s), tail {status}",
        "○".bright_blue(),
        decoded.messages.len()
    );

    for warning in &decoded.warnings {
        eprintln!("{}", format_warning(warning));
    }
}
