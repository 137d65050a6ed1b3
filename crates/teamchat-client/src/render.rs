use chrono::Local;
use colored::Colorize;

use teamchat_types::mention::{Segment, segments};
use teamchat_types::models::{Channel, Message};

/// `h:mm AM` in local time.
pub fn format_time(message: &Message) -> String {
    message.created_at.with_timezone(&Local).format("%-I:%M %p").to_string()
}

/// Message content with `@mentions` highlighted.
pub fn highlight_mentions(content: &str) -> String {
    segments(content)
        .into_iter()
        .map(|segment| match segment {
            Segment::Text(text) => text.to_string(),
            Segment::Mention(mention) => mention.bold().cyan().to_string(),
        })
        .collect()
}

pub fn message_line(message: &Message) -> String {
    let author = if message.is_ai {
        message.user_name.magenta().bold()
    } else {
        message.user_name.bold()
    };
    format!("{} {}: {}", format_time(message).dimmed(), author, highlight_mentions(&message.content))
}

pub fn channel_header(channel: &Channel) -> String {
    let name = format!("#{}", channel.name).bold();
    match &channel.description {
        Some(description) => format!("{}  {}", name, description.dimmed()),
        None => name.to_string(),
    }
}

/// Shown in place of history when a channel has no messages yet.
pub fn welcome(channel: &Channel) -> String {
    let mut text = format!(
        "Welcome to #{}\nThis is the start of the #{} channel.",
        channel.name, channel.name
    );
    if channel.name == "ai-help" {
        text.push_str(" Type @Claude to get AI assistance!");
    }
    text
}
