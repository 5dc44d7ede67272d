//! Interactive terminal panel for managing clients

mod app;
mod ui;

pub use app::{PanelApp, PanelEffect};
pub use ui::draw;

use crate::actions::{ActionTable, Dispatcher};
use crate::api::ApiClient;
use crate::config::Settings;
use crate::poller::{PanelEvent, PollCommand, Poller};
use anyhow::Result;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;

/// Run the panel until the user quits
pub async fn run(api: ApiClient, settings: &Settings) -> Result<()> {
    let (event_tx, event_rx) = mpsc::channel::<PanelEvent>(64);
    let (command_tx, command_rx) = mpsc::channel::<PollCommand>(16);

    let poller = Poller::new(api.clone());
    let poll_task = tokio::spawn(poller.run(settings.polling_interval, command_rx, event_tx.clone()));

    let dispatcher = Dispatcher::new(api, command_tx.clone(), event_tx);
    let mut app = PanelApp::new(
        settings.api.clone(),
        settings.environment.as_str(),
        ActionTable::default(),
    );

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &mut app, event_rx, &dispatcher, &command_tx).await;

    poll_task.abort();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut PanelApp,
    mut event_rx: mpsc::Receiver<PanelEvent>,
    dispatcher: &Dispatcher,
    command_tx: &mpsc::Sender<PollCommand>,
) -> Result<()> {
    let mut tick_interval = tokio::time::interval(Duration::from_millis(100));

    loop {
        terminal.draw(|f| draw(f, app))?;

        tokio::select! {
            // Handle keyboard events (non-blocking)
            _ = tick_interval.tick() => {
                while event::poll(Duration::from_millis(0))? {
                    let Event::Key(key) = event::read()? else {
                        continue;
                    };
                    match app.handle_key(key) {
                        Some(PanelEffect::Mutate(mutation)) => {
                            dispatcher.spawn(mutation);
                        }
                        Some(PanelEffect::Refresh) => {
                            if command_tx.try_send(PollCommand::Force).is_err() {
                                tracing::debug!("Refresh already queued");
                            }
                        }
                        None => {}
                    }
                    if app.should_quit {
                        return Ok(());
                    }
                }
            }

            // Tables and notices from the poller and dispatcher
            Some(event) = event_rx.recv() => {
                app.apply_event(event);
            }
        }
    }
}
