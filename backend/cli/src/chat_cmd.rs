//! `omnix chat`: interactive terminal client for a running relay.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio_util::sync::CancellationToken;

use omnix_client::{
    load_attachment, ChatSession, RelayClient, StaticToken, StreamingConsumer,
};
use omnix_config::OmnixConfig;
use omnix_core::{adapter_for, builtin_modes, ContentPart, FileContent, OmnixError};

use crate::terminal_output::{
    dim, note_error, note_info, note_success, note_warn, speaker_label, stream_write, CYAN,
    MAGENTA,
};

pub struct ChatOptions {
    pub relay_url: String,
    pub mode: Option<String>,
    pub streaming: bool,
}

/// One line of user input.
#[derive(Debug, PartialEq)]
enum Input {
    Empty,
    Quit,
    Help,
    /// `/mode <tag>`; no tag (or `none`) clears the mode
    Mode(Option<String>),
    Attach(PathBuf),
    Image(String),
    Message(String),
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Input::Message(line.to_string());
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };
    match name {
        "quit" | "exit" => Input::Quit,
        "help" => Input::Help,
        "mode" if arg.is_empty() || arg == "none" => Input::Mode(None),
        "mode" => Input::Mode(Some(arg.to_string())),
        "attach" if !arg.is_empty() => Input::Attach(PathBuf::from(arg)),
        "image" if !arg.is_empty() => Input::Image(arg.to_string()),
        // Unknown commands are sent as text.
        _ => Input::Message(line.to_string()),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  /mode <tag>      switch mode ({})", builtin_modes().collect::<Vec<_>>().join(", "));
    println!("  /mode            clear the mode");
    println!("  /attach <path>   attach a file to the next message");
    println!("  /image <prompt>  generate an image");
    println!("  /quit            leave");
    println!("{}", dim("Ctrl-C cancels a reply in progress, or leaves at the prompt."));
}

pub async fn run(config: &OmnixConfig, options: ChatOptions) -> Result<()> {
    let token = config.client.as_ref().and_then(|c| c.access_token.clone());
    let relay = RelayClient::new(options.relay_url.as_str())
        .with_credentials(Arc::new(StaticToken(token)));
    let mut session =
        ChatSession::new(build_consumer(config, relay.clone())).with_streaming(options.streaming);

    note_info(&format!(
        "Connected to {} ({})",
        relay.base_url(),
        if options.streaming { "streaming" } else { "single-shot" }
    ));
    println!("{}", dim("Type /help for commands."));

    if let Some(mode) = options.mode.as_deref() {
        switch_mode(&mut session, Some(mode));
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending: Vec<ContentPart> = Vec::new();

    loop {
        print!("{}", speaker_label("you", CYAN));
        let _ = stream_write(&mut std::io::stdout(), "");
        // The signal handler stays installed after the first reply; Ctrl-C here leaves.
        let Some(line) = read_line(&mut lines, tokio::signal::ctrl_c()).await? else {
            break;
        };

        match parse_input(&line) {
            Input::Empty => {}
            Input::Quit => break,
            Input::Help => print_help(),
            Input::Mode(mode) => switch_mode(&mut session, mode.as_deref()),
            Input::Attach(path) => match load_attachment(&path).await {
                Ok(part) => {
                    pending.push(part);
                    note_success(&format!(
                        "Attached {} ({} pending)",
                        path.display(),
                        pending.len()
                    ));
                }
                Err(e) => note_error(&e.to_string()),
            },
            Input::Image(prompt) => match relay.generate_image(&prompt, None).await {
                Ok(image) => println!("{}{}", speaker_label("image", MAGENTA), image.image_url),
                Err(e) => note_error(&e.to_string()),
            },
            Input::Message(text) => {
                let attachments = if pending.is_empty() {
                    None
                } else {
                    Some(FileContent::from(std::mem::take(&mut pending)))
                };
                send(&mut session, &text, attachments).await;
            }
        }
    }

    Ok(())
}

/// Next input line, or `None` at end of input or once `interrupt` fires.
async fn read_line<R, F, T>(lines: &mut Lines<R>, interrupt: F) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
    F: Future<Output = T>,
{
    tokio::select! {
        line = lines.next_line() => line,
        _ = interrupt => {
            println!();
            Ok(None)
        }
    }
}

/// Delta shape follows the configured chat provider; 0 disables the idle timeout.
fn build_consumer(config: &OmnixConfig, relay: RelayClient) -> StreamingConsumer {
    let chunk_timeout = match config.chunk_timeout_secs() {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };
    StreamingConsumer::new(relay)
        .with_adapter(adapter_for(config.chat_provider()))
        .with_chunk_timeout(chunk_timeout)
}

fn switch_mode(session: &mut ChatSession, mode: Option<&str>) {
    match session.select_mode(mode) {
        Ok(()) => match session.conversation().turns().last() {
            Some(welcome) => println!("{}{}", speaker_label("omnix", MAGENTA), welcome.content),
            None => note_info("Mode cleared"),
        },
        Err(e) => note_error(&e.to_string()),
    }
}

/// Send one message and print the reply as it arrives. Ctrl-C cancels it.
async fn send(session: &mut ChatSession, text: &str, attachments: Option<FileContent>) {
    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    print!("{}", speaker_label("omnix", MAGENTA));
    let mut stdout = std::io::stdout();
    let result = session
        .send(
            text,
            attachments,
            |token| {
                let _ = stream_write(&mut stdout, token);
            },
            cancel,
        )
        .await;
    watcher.abort();
    println!();

    match result {
        Ok(_) => {}
        Err(OmnixError::Cancelled) => note_warn("Reply cancelled"),
        Err(e) => {
            if let Some(turn) = session.conversation().turns().last() {
                println!("{}", turn.content);
            }
            note_error(&e.to_string());
        }
    }
}
