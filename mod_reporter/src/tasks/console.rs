use std::io::{stdin, IsTerminal};
use std::thread;

use async_shutdown::ShutdownManager;
use clap::{Parser, Subcommand};
use poise::serenity_prelude::{ChannelId, Context};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{error, info, instrument};

use crate::ModReporter;

#[instrument(skip_all)]
pub async fn console_task(
    ctx: Context,
    mr: ModReporter,
    s: ShutdownManager<&'static str>,
) -> anyhow::Result<()> {
    if !stdin().is_terminal() {
        info!("We are not in a terminal, no console will be used");
        return Ok(());
    }
    let dead_token = s.trigger_shutdown_token("Console thread died.");
    let (tx, rx) = unbounded_channel();
    thread::spawn(move || {
        read_console(tx);
        info!("Console closed");
        drop(dead_token);
    });
    console_process(s, rx, mr, ctx).await;
    Ok(())
}

fn read_console(tx: UnboundedSender<String>) {
    for line in stdin().lines() {
        let Ok(line) = line else { break };
        if tx.send(line).is_err() {
            break;
        }
    }
}

async fn console_process(
    s: ShutdownManager<&'static str>,
    mut rx: UnboundedReceiver<String>,
    mr: ModReporter,
    ctx: Context,
) {
    loop {
        tokio::select! {
            _ = s.wait_shutdown_triggered() => {
                info!("Console task shutting down!");
                break;
            }
            Some(line) = rx.recv() => {
                match parse_line(&line) {
                    Ok(Some(Commands::Quit)) => {
                        let _ = s.trigger_shutdown("Console request");
                    }
                    Ok(Some(Commands::Sweep { channel })) => {
                        let channel = ChannelId::new(channel);
                        match mod_reporter::spam::sweep_channel(&ctx, channel, mr.config.spam.scan_limit()).await {
                            Ok(n) => info!("Removed {} gift scam messages from {}", n, channel),
                            Err(e) => error!("Sweeping {} failed: {:?}", channel, e),
                        }
                    }
                    Ok(None) => {}
                    Err(e) => e.split('\n').for_each(|l| error!("{}", l)),
                }
            }
        }
    }
}

/// Blank lines are `Ok(None)`. Errors come back rendered.
fn parse_line(line: &str) -> Result<Option<Commands>, String> {
    let words = shellwords::split(line).map_err(|e| format!("Error parsing command: {}", e))?;
    if words.is_empty() {
        return Ok(None);
    }
    Command::try_parse_from(words)
        .map(|c| Some(c.command))
        .map_err(|e| e.render().to_string())
}

#[derive(Parser, Debug)]
#[command(no_binary_name(true), disable_help_flag(true))]
struct Command {
    #[command(subcommand)]
    command: Commands,
}
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Commands {
    /// Exits the bot
    Quit,
    /// Deletes gift scam messages from the recent history of a channel
    Sweep {
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        channel: u64,
    },
}
