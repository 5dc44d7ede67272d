//! Watch command: the polling panel

use crate::api::ApiClient;
use crate::config::Settings;
use crate::poller::{PanelEvent, PollCommand, Poller};
use crate::render::print_table;
use anyhow::{Context, Result};
use console::style;
use tokio::sync::mpsc;

/// Run the interactive panel, or print each render when `plain` is set
pub async fn run(settings: &Settings, plain: bool) -> Result<()> {
    let api = ApiClient::new(&settings.api).context("Failed to build HTTP client")?;

    if plain {
        run_plain(api, settings).await
    } else {
        crate::panel::run(api, settings).await
    }
}

/// Line-oriented mode for non-interactive terminals
async fn run_plain(api: ApiClient, settings: &Settings) -> Result<()> {
    println!(
        "Watching {} every {}ms (Ctrl+C to stop)",
        style(&settings.api).green(),
        settings.polling_interval.as_millis()
    );

    // Held so the poller's command channel stays open
    let (_command_tx, command_rx) = mpsc::channel::<PollCommand>(1);
    let (event_tx, mut event_rx) = mpsc::channel::<PanelEvent>(16);

    let poller = Poller::new(api);
    let poll_task = tokio::spawn(poller.run(settings.polling_interval, command_rx, event_tx));

    loop {
        tokio::select! {
            event = event_rx.recv() => match event {
                Some(PanelEvent::Table(view)) => {
                    println!();
                    println!("{}", style(chrono::Local::now().format("%H:%M:%S")).dim());
                    print_table(&view);
                }
                // Already logged by the poller; the last table stays valid
                Some(PanelEvent::RefreshFailed(_)) => {}
                Some(PanelEvent::Notice(message)) => println!("{}", message),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    poll_task.abort();
    Ok(())
}
