//! Terminal chat client.
//!
//! Lines typed are sent to the active channel. Commands:
//! `/join <channel>`, `/name <display name>`, `/channels`, `/quit`.

use anyhow::Context;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};

use teamchat_client::render;
use teamchat_client::session::DEFAULT_USER;
use teamchat_client::{ChatSession, HttpBackend};
use teamchat_types::ASSISTANT_NAME;
use teamchat_types::events::GatewayEvent;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "teamchat=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let server_url = std::env::var("TEAMCHAT_SERVER_URL").unwrap_or_else(|_| "http://127.0.0.1:3000".into());
    let user_name = std::env::var("TEAMCHAT_USER").unwrap_or_else(|_| DEFAULT_USER.into());

    let mut session = ChatSession::new(HttpBackend::new(&server_url), user_name);
    session
        .load_channels()
        .await
        .with_context(|| format!("loading channels from {}", server_url))?;
    print_channels(&session);
    print_active(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_line(&mut session, &line).await? {
                    break;
                }
            }
            Some(event) = session.next_event() => {
                if let GatewayEvent::MessageCreate(message) = &event {
                    if session.active_channel().is_some_and(|c| c.id == message.channel_id) {
                        println!("{}", render::message_line(message));
                    }
                }
            }
        }
    }

    Ok(())
}

/// Returns false when the user asked to quit.
async fn handle_line(session: &mut ChatSession<HttpBackend>, line: &str) -> anyhow::Result<bool> {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix('/') {
        let (command, arg) = rest.split_once(' ').unwrap_or((rest, ""));
        let arg = arg.trim();
        match command {
            "quit" | "exit" => return Ok(false),
            "channels" => print_channels(session),
            "name" if !arg.is_empty() => {
                session.set_user_name(arg);
                println!("{}", format!("You are now {}", session.user_name()).dimmed());
            }
            "join" => match session.find_channel(arg).map(|c| c.id) {
                Some(id) => match session.select_channel(id).await {
                    Ok(()) => print_active(session),
                    Err(e) => println!("{}", format!("Could not join '{}': {}", arg, e).red()),
                },
                None => println!("{}", format!("No channel named '{}'", arg).red()),
            },
            _ => println!("{}", "Commands: /join <channel>, /name <name>, /channels, /quit".dimmed()),
        }
        return Ok(true);
    }

    if let Err(e) = session.post_message(line).await {
        println!("{}", format!("Failed to send: {}", e).red());
        return Ok(true);
    }
    if session.is_ai_thinking() {
        println!("{}", format!("{} is thinking...", ASSISTANT_NAME).dimmed());
        session.answer_pending().await;
    }
    Ok(true)
}

fn print_channels<B: teamchat_client::ChatBackend>(session: &ChatSession<B>) {
    let names: Vec<String> = session.channels().iter().map(|c| format!("#{}", c.name)).collect();
    println!("{} {}", "Channels:".bold(), names.join("  "));
}

fn print_active<B: teamchat_client::ChatBackend>(session: &ChatSession<B>) {
    let Some(channel) = session.active_channel() else { return };
    println!("{}", render::channel_header(channel));

    if session.messages().is_empty() {
        println!("{}", render::welcome(channel).dimmed());
    }
    for message in session.messages() {
        println!("{}", render::message_line(message));
    }
}
