//! Interactive session: keeps the page on screen and reacts to one-letter
//! commands read from stdin.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use client_core::{
    render_page, ApiTransport, ControllerEvent, IndicatorRegistry, NotificationSink,
    ProcessingIssuesController, ViewState,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing::debug;

use crate::render::{render_indicators, render_text, INTERACTIVE_HINTS};

const HELP: &str = "commands: r = retry/refresh, p = trigger reprocessing, q = quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchCommand {
    Refresh,
    Reprocess,
    Quit,
}

pub fn parse_command(line: &str) -> Option<WatchCommand> {
    match line.trim().to_ascii_lowercase().as_str() {
        "r" | "retry" | "refresh" => Some(WatchCommand::Refresh),
        "p" | "reprocess" => Some(WatchCommand::Reprocess),
        "q" | "quit" | "exit" => Some(WatchCommand::Quit),
        _ => None,
    }
}

fn draw(view: &ViewState, indicators: &IndicatorRegistry) {
    let mut screen = render_text(&render_page(view), Utc::now(), INTERACTIVE_HINTS);
    let active = indicators.active();
    if !active.is_empty() {
        screen.push('\n');
        screen.push_str(&render_indicators(&active));
    }
    println!("{screen}");
    println!("{HELP}");
}

pub async fn run<T, N>(
    controller: &Arc<ProcessingIssuesController<T, N>>,
    indicators: &IndicatorRegistry,
) -> Result<()>
where
    T: ApiTransport + 'static,
    N: NotificationSink + 'static,
{
    let mut events = controller.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    draw(&controller.snapshot().await, indicators);
    controller.mount();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(ControllerEvent::StateChanged(view)) => draw(&view, indicators),
                Ok(ControllerEvent::ReprocessFailed(message)) => {
                    println!("Reprocessing could not be started: {message}");
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "watch view lagged behind controller events");
                    draw(&controller.snapshot().await, indicators);
                }
                Err(RecvError::Closed) => break,
            },
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse_command(&line) {
                    Some(WatchCommand::Refresh) => controller.spawn_fetch(),
                    Some(WatchCommand::Reprocess) => {
                        if controller.snapshot().await.can_reprocess() {
                            controller.spawn_reprocessing();
                        } else {
                            println!("Nothing to reprocess right now.");
                        }
                    }
                    Some(WatchCommand::Quit) => break,
                    None => println!("{HELP}"),
                }
            }
        }
    }

    Ok(())
}
