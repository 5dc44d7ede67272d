//! Panel application state and event handling

use crate::actions::{ActionId, ActionTable, Mutation, Scope};
use crate::poller::PanelEvent;
use crate::render::{RowView, TableView};
use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Status line severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    RefreshError,
}

/// Message shown under the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub kind: StatusKind,
    pub message: String,
}

/// Modal dialog for creating a client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateDialog {
    pub open: bool,
    pub name: String,
}

/// Work the panel loop must start after a key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEffect {
    Mutate(Mutation),
    Refresh,
}

/// Panel application state
pub struct PanelApp {
    pub api_url: String,
    pub environment: &'static str,
    pub table: TableView,
    pub selected_index: usize,
    pub dialog: CreateDialog,
    pub status: Option<Status>,
    pub last_refresh: Option<DateTime<Local>>,
    pub should_quit: bool,
    actions: ActionTable,
}

impl PanelApp {
    pub fn new(api_url: String, environment: &'static str, actions: ActionTable) -> Self {
        Self {
            api_url,
            environment,
            table: TableView::default(),
            selected_index: 0,
            dialog: CreateDialog::default(),
            status: None,
            last_refresh: None,
            should_quit: false,
            actions,
        }
    }

    pub fn actions(&self) -> &ActionTable {
        &self.actions
    }

    /// Scope that key presses currently resolve in
    pub fn scope(&self) -> Scope {
        if self.dialog.open {
            Scope::Dialog
        } else {
            Scope::Table
        }
    }

    pub fn selected(&self) -> Option<&RowView> {
        self.table.get(self.selected_index)
    }

    /// Apply an update from the poller or dispatcher
    pub fn apply_event(&mut self, event: PanelEvent) {
        match event {
            PanelEvent::Table(view) => {
                self.table = view;
                self.selected_index = self
                    .selected_index
                    .min(self.table.len().saturating_sub(1));
                self.last_refresh = Some(Local::now());
                if matches!(&self.status, Some(s) if s.kind == StatusKind::RefreshError) {
                    self.status = None;
                }
            }
            PanelEvent::RefreshFailed(message) => {
                self.set_status(StatusKind::RefreshError, format!("Refresh failed: {}", message));
            }
            PanelEvent::Notice(message) => {
                self.set_status(StatusKind::Info, message);
            }
        }
    }

    /// Handle key events
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<PanelEffect> {
        if key.kind == KeyEventKind::Release {
            return None;
        }

        let scope = self.scope();
        if let Some(action) = self.actions.resolve(scope, &key) {
            return self.apply(action);
        }

        if scope == Scope::Dialog {
            match key.code {
                KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    self.dialog.name.push(c);
                }
                KeyCode::Backspace => {
                    self.dialog.name.pop();
                }
                _ => {}
            }
        }
        None
    }

    /// Run one action
    pub fn apply(&mut self, action: ActionId) -> Option<PanelEffect> {
        match action {
            ActionId::DeleteClient => {
                let id = self.selected()?.id;
                self.set_status(StatusKind::Info, format!("Deleting client {}...", id));
                Some(PanelEffect::Mutate(Mutation::Delete(id)))
            }
            ActionId::GenerateKey => {
                let id = self.selected()?.id;
                self.set_status(StatusKind::Info, format!("Generating key for client {}...", id));
                Some(PanelEffect::Mutate(Mutation::GenerateKey(id)))
            }
            ActionId::OpenCreateDialog => {
                self.open_create_dialog();
                None
            }
            ActionId::CloseCreateDialog => {
                self.close_create_dialog();
                None
            }
            ActionId::SubmitCreate => self.submit_create(),
            ActionId::Refresh => Some(PanelEffect::Refresh),
            ActionId::SelectNext => {
                if self.selected_index < self.table.len().saturating_sub(1) {
                    self.selected_index += 1;
                }
                None
            }
            ActionId::SelectPrevious => {
                self.selected_index = self.selected_index.saturating_sub(1);
                None
            }
            ActionId::Quit => {
                self.should_quit = true;
                None
            }
        }
    }

    pub fn open_create_dialog(&mut self) {
        self.dialog.name.clear();
        self.dialog.open = true;
    }

    pub fn close_create_dialog(&mut self) {
        self.dialog.open = false;
    }

    fn submit_create(&mut self) -> Option<PanelEffect> {
        let name = self.dialog.name.trim().to_string();
        if name.is_empty() {
            self.set_status(StatusKind::Info, "Client name is required".to_string());
            return None;
        }
        self.close_create_dialog();
        self.set_status(StatusKind::Info, format!("Creating client '{}'...", name));
        Some(PanelEffect::Mutate(Mutation::Create(name)))
    }

    fn set_status(&mut self, kind: StatusKind, message: String) {
        self.status = Some(Status { kind, message });
    }
}
