use std::io::{self, Write};

use convlog_core::Role;
use convlog_monitor::{ConversationMonitor, SaveOutcome};

/// Reads chat turns from stdin and feeds them to the monitor until EOF or
/// `quit`, then stops monitoring (which flushes anything pending).
pub async fn run_feed(monitor: ConversationMonitor) -> anyhow::Result<()> {
    println!("Monitoring started. Feed turns with 'u <text>' / 'a <text>'.");
    println!("Commands: save [context], status, quit.");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut input = String::new();

    loop {
        print!("> ");
        stdout.flush()?;
        input.clear();
        if stdin.read_line(&mut input)? == 0 {
            break;
        }

        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "quit" || trimmed == "exit" {
            break;
        }

        if trimmed == "status" {
            println!(
                "buffered: {} | active: {} | session: {}s",
                monitor.buffer_size(),
                monitor.is_active(),
                monitor.session_duration().as_secs()
            );
            continue;
        }

        if trimmed == "save" || trimmed.starts_with("save ") {
            let context = trimmed
                .strip_prefix("save")
                .map(str::trim)
                .filter(|c| !c.is_empty());
            match monitor.save_now(context).await {
                Ok(SaveOutcome::Saved(path)) => println!("Logged to {}", path.display()),
                Ok(SaveOutcome::NothingToSave) => println!("Nothing to save."),
                Ok(SaveOutcome::NoWorkspace) => println!("No workspace to log to."),
                Err(err) => println!("Save failed: {err}"),
            }
            continue;
        }

        if let Some(text) = trimmed.strip_prefix("a ") {
            monitor.add_message(Role::Assistant, text);
        } else if let Some(text) = trimmed.strip_prefix("u ") {
            monitor.add_message(Role::User, text);
        } else {
            // Bare lines count as user turns.
            monitor.add_message(Role::User, trimmed);
        }
    }

    monitor.stop_monitoring().await;
    println!("Session closed.");
    Ok(())
}
