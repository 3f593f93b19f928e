//! A simple terminal client demonstrating how to use `huddle` as a
//! library.

#[macro_use]
extern crate tracing;

use std::env;
use std::path::Path;

use bytes::Bytes;
use huddle::engine::Notice;
use huddle::engine::SessionSnapshot;
use huddle::wire::{Message, MessageId, WorkItemId};
use huddle::{Workroom, WorkroomBuilder};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc;

enum ViewEvent {
    Session(SessionSnapshot),
    Notice(Notice),
}

const BAR_CHAR: &str = "▎";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let Ok(base_url) = env::var("HUDDLE_BASE_URL") else {
        eprintln!("HUDDLE_BASE_URL environment variable is not set");
        return;
    };
    let Ok(socket_url) = env::var("HUDDLE_SOCKET_URL") else {
        eprintln!("HUDDLE_SOCKET_URL environment variable is not set");
        return;
    };
    let token = env::var("HUDDLE_TOKEN").ok();

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let mut builder = WorkroomBuilder::new(base_url, socket_url)
        .on_session({
            let event_tx = event_tx.clone();
            move |snapshot| {
                event_tx.send(ViewEvent::Session(snapshot)).ok();
            }
        })
        .on_notice({
            let event_tx = event_tx.clone();
            move |notice| {
                event_tx.send(ViewEvent::Notice(notice)).ok();
            }
        });
    if let Some(token) = token {
        builder = builder.with_token(token);
    }
    let room = match builder.connect().await {
        Ok(room) => room,
        Err(err) => {
            eprintln!("could not connect: {err}");
            return;
        }
    };

    println!(
        "Commands: /open <work-item>, /reply <message-id> <text>, \
         /attach <path>, /delete <message-id>, /find <text>, /quit. \
         Anything else is sent as a message."
    );

    let spinner_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    let mut lines = io::BufReader::new(io::stdin()).lines();
    let mut view = View::default();
    let mut spinner: Option<ProgressBar> = None;

    loop {
        select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(err) => {
                        error!("error reading input: {err}");
                        break;
                    }
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "/quit" {
                    break;
                }
                if handle_command(&room, line, &view) {
                    if line.starts_with("/attach ") {
                        let bar = ProgressBar::new_spinner();
                        bar.set_style(spinner_style.clone());
                        bar.set_message("uploading...");
                        bar.enable_steady_tick(
                            std::time::Duration::from_millis(100),
                        );
                        spinner = Some(bar);
                    }
                }
            }
            event = event_rx.recv() => {
                let Some(event) = event else {
                    break;
                };
                if let Some(spinner) = spinner.take() {
                    spinner.finish_and_clear();
                }
                match event {
                    ViewEvent::Session(snapshot) => view.render(snapshot),
                    ViewEvent::Notice(notice) => {
                        println!(
                            "{}{}",
                            BAR_CHAR.bright_red(),
                            format!("{notice}").bright_red()
                        );
                    }
                }
            }
        }
    }
    room.close();
}

/// Interprets one input line. Returns whether it was accepted.
fn handle_command(room: &Workroom, line: &str, view: &View) -> bool {
    if let Some(work_item) = line.strip_prefix("/open ") {
        room.open_conversation(WorkItemId::from(work_item.trim()));
        return true;
    }
    if let Some(rest) = line.strip_prefix("/reply ") {
        let Some((id, text)) = rest.trim().split_once(' ') else {
            eprintln!("usage: /reply <message-id> <text>");
            return false;
        };
        room.set_reply_target(Some(MessageId::from(id)));
        room.send(text);
        return true;
    }
    if let Some(path) = line.strip_prefix("/attach ") {
        let path = Path::new(path.trim());
        let bytes = match std::fs::read(path) {
            Ok(bytes) => Bytes::from(bytes),
            Err(err) => {
                eprintln!("could not read {}: {err}", path.display());
                return false;
            }
        };
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_owned());
        room.send_attachment(file_name, content_type_of(path), bytes);
        return true;
    }
    if let Some(id) = line.strip_prefix("/delete ") {
        room.delete_message(MessageId::from(id.trim()));
        return true;
    }
    if let Some(query) = line.strip_prefix("/find ") {
        for message in view.snapshot.iter().flat_map(|s| s.search(query)) {
            print_message(message);
        }
        return false;
    }
    room.send(line);
    true
}

fn content_type_of(path: &Path) -> String {
    let extension = path
        .extension()
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.to_string_lossy().as_ref() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
    .to_owned()
}

#[derive(Default)]
struct View {
    snapshot: Option<SessionSnapshot>,
    shown: usize,
}

impl View {
    fn render(&mut self, snapshot: SessionSnapshot) {
        let same_conversation = match (&self.snapshot, &snapshot) {
            (Some(old), new) => {
                old.conversation.as_ref().map(|c| &c.id)
                    == new.conversation.as_ref().map(|c| &c.id)
            }
            (None, _) => false,
        };
        if !same_conversation {
            self.shown = 0;
            if let Some(conversation) = &snapshot.conversation {
                println!(
                    "{}joined {}",
                    BAR_CHAR.bright_cyan(),
                    conversation.id.as_str().bright_white().bold()
                );
            }
        }
        // The list only ever changes at the tail or by removal.
        if snapshot.messages.len() < self.shown {
            self.shown = snapshot.messages.len();
        }
        for message in &snapshot.messages[self.shown..] {
            print_message(message);
        }
        self.shown = snapshot.messages.len();
        self.snapshot = Some(snapshot);
    }
}

fn print_message(message: &Message) {
    let bar = BAR_CHAR.bright_cyan();
    if let Some(reply) = &message.reply_to {
        println!(
            "{bar}  {} {}: {}",
            "↪".dimmed(),
            reply.author_name.dimmed(),
            reply.excerpt.dimmed()
        );
    }
    let author_color = message.author.display_name.bright_white();
    let author = author_color.bold();
    if let Some(body) = &message.body {
        println!("{bar}[{}] {author}: {body}", message.id);
    } else if let Some(attachment) = &message.attachment {
        println!(
            "{bar}[{}] {author}: sent {} ({})",
            message.id,
            attachment.file_name.bright_white(),
            attachment.url.dimmed()
        );
    } else if let Some(voice) = &message.voice {
        println!(
            "{bar}[{}] {author}: sent a {}s voice note ({})",
            message.id,
            voice.duration_secs,
            voice.url.dimmed()
        );
    }
}
