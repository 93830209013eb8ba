//! Keyboard input for a chart without a native window: each stdin line maps
//! to one key press.

use super::{Event, EventSender, Key};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;

pub fn parse_line(line: &str) -> Event {
    if line == " " {
        return Event::KeyDown(Key::Space);
    }

    match line.trim().to_ascii_lowercase().as_str() {
        "" | "s" => Event::KeyDown(Key::Return),
        "p" => Event::KeyDown(Key::Space),
        "q" | "quit" | "exit" => Event::Quit,
        _ => Event::KeyDown(Key::Other),
    }
}

/// Forwards stdin lines to `sender` until the chart stops listening.
pub fn spawn(sender: EventSender) -> JoinHandle<()> {
    tokio::spawn(forward_stdin(sender))
}

async fn forward_stdin(sender: EventSender) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if sender.send(parse_line(&line)).is_err() {
                    break;
                }
            }
            Ok(None) => {
                log::debug!("stdin closed");
                break;
            }
            Err(e) => {
                log::warn!("Failed to read stdin: {e}");
                break;
            }
        }
    }
}
