//! Panel actions: the key-to-action table and the mutation dispatcher
//!
//! Every user interaction goes through an [`ActionId`]. Keys are resolved
//! to actions by an [`ActionTable`], and actions that change backend state
//! become a [`Mutation`] executed by the [`Dispatcher`].

use crate::api::ApiClient;
use crate::poller::{PanelEvent, PollCommand};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use keydesk_common::{Client, ClientId};
use std::fmt;
use std::str::FromStr;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Identifier of a panel action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionId {
    DeleteClient,
    GenerateKey,
    OpenCreateDialog,
    CloseCreateDialog,
    SubmitCreate,
    Refresh,
    SelectNext,
    SelectPrevious,
    Quit,
}

impl ActionId {
    pub const ALL: [ActionId; 9] = [
        ActionId::DeleteClient,
        ActionId::GenerateKey,
        ActionId::OpenCreateDialog,
        ActionId::CloseCreateDialog,
        ActionId::SubmitCreate,
        ActionId::Refresh,
        ActionId::SelectNext,
        ActionId::SelectPrevious,
        ActionId::Quit,
    ];

    /// Stable identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionId::DeleteClient => "delete-client",
            ActionId::GenerateKey => "gen-client-key",
            ActionId::OpenCreateDialog => "open-create-dialog",
            ActionId::CloseCreateDialog => "close-create-dialog",
            ActionId::SubmitCreate => "create-client",
            ActionId::Refresh => "refresh",
            ActionId::SelectNext => "select-next",
            ActionId::SelectPrevious => "select-previous",
            ActionId::Quit => "quit",
        }
    }

    /// Short label for key hints
    pub fn label(&self) -> &'static str {
        match self {
            ActionId::DeleteClient => "Delete",
            ActionId::GenerateKey => "New key",
            ActionId::OpenCreateDialog => "Create",
            ActionId::CloseCreateDialog => "Cancel",
            ActionId::SubmitCreate => "Save",
            ActionId::Refresh => "Refresh",
            ActionId::SelectNext => "Down",
            ActionId::SelectPrevious => "Up",
            ActionId::Quit => "Quit",
        }
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionId::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| format!("Unknown action: {}", s))
    }
}

/// Where a key press is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Table,
    Dialog,
}

/// A key plus modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub const fn plain(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub const fn ctrl(c: char) -> Self {
        Self {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::CONTROL,
        }
    }

    /// Human-readable key name for hints
    pub fn label(&self) -> String {
        let key = match self.code {
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Enter => "Enter".to_string(),
            KeyCode::Esc => "Esc".to_string(),
            KeyCode::Up => "↑".to_string(),
            KeyCode::Down => "↓".to_string(),
            KeyCode::Delete => "Del".to_string(),
            other => format!("{:?}", other),
        };
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            format!("Ctrl+{}", key.to_uppercase())
        } else {
            key
        }
    }
}

/// Ordered key-to-action table, one list per scope
#[derive(Debug, Clone)]
pub struct ActionTable {
    table: Vec<(KeyBinding, ActionId)>,
    dialog: Vec<(KeyBinding, ActionId)>,
}

impl Default for ActionTable {
    fn default() -> Self {
        let mut actions = Self {
            table: Vec::new(),
            dialog: Vec::new(),
        };

        let table = [
            (KeyBinding::plain(KeyCode::Char('n')), ActionId::OpenCreateDialog),
            (KeyBinding::plain(KeyCode::Char('d')), ActionId::DeleteClient),
            (KeyBinding::plain(KeyCode::Delete), ActionId::DeleteClient),
            (KeyBinding::plain(KeyCode::Char('g')), ActionId::GenerateKey),
            (KeyBinding::plain(KeyCode::Char('r')), ActionId::Refresh),
            (KeyBinding::plain(KeyCode::Up), ActionId::SelectPrevious),
            (KeyBinding::plain(KeyCode::Char('k')), ActionId::SelectPrevious),
            (KeyBinding::plain(KeyCode::Down), ActionId::SelectNext),
            (KeyBinding::plain(KeyCode::Char('j')), ActionId::SelectNext),
            (KeyBinding::plain(KeyCode::Char('q')), ActionId::Quit),
            (KeyBinding::ctrl('c'), ActionId::Quit),
        ];
        for (binding, action) in table {
            actions.bind(Scope::Table, binding, action);
        }

        let dialog = [
            (KeyBinding::plain(KeyCode::Enter), ActionId::SubmitCreate),
            (KeyBinding::plain(KeyCode::Esc), ActionId::CloseCreateDialog),
            (KeyBinding::ctrl('c'), ActionId::Quit),
        ];
        for (binding, action) in dialog {
            actions.bind(Scope::Dialog, binding, action);
        }

        actions
    }
}

impl ActionTable {
    fn entries(&self, scope: Scope) -> &[(KeyBinding, ActionId)] {
        match scope {
            Scope::Table => &self.table,
            Scope::Dialog => &self.dialog,
        }
    }

    /// Bind a key in a scope, replacing any previous binding of that key
    pub fn bind(&mut self, scope: Scope, binding: KeyBinding, action: ActionId) {
        let entries = match scope {
            Scope::Table => &mut self.table,
            Scope::Dialog => &mut self.dialog,
        };
        entries.retain(|(b, _)| *b != binding);
        entries.push((binding, action));
    }

    /// Resolve a key press to an action
    pub fn resolve(&self, scope: Scope, key: &KeyEvent) -> Option<ActionId> {
        let lookup = |binding: KeyBinding| {
            self.entries(scope)
                .iter()
                .find(|(b, _)| *b == binding)
                .map(|(_, a)| *a)
        };

        let exact = KeyBinding {
            code: key.code,
            modifiers: key.modifiers,
        };
        lookup(exact).or_else(|| {
            // Terminals report SHIFT on some plain characters
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                lookup(KeyBinding {
                    code: key.code,
                    modifiers: key.modifiers - KeyModifiers::SHIFT,
                })
            } else {
                None
            }
        })
    }

    /// First binding of each action in a scope, for the footer
    pub fn hints(&self, scope: Scope) -> Vec<(String, &'static str)> {
        let mut seen: Vec<ActionId> = Vec::new();
        let mut hints = Vec::new();
        for (binding, action) in self.entries(scope) {
            if seen.contains(action) {
                continue;
            }
            seen.push(*action);
            hints.push((binding.label(), action.label()));
        }
        hints
    }
}

/// A change to backend state requested from the panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Delete(ClientId),
    GenerateKey(ClientId),
    Create(String),
}

impl Mutation {
    pub fn action(&self) -> ActionId {
        match self {
            Mutation::Delete(_) => ActionId::DeleteClient,
            Mutation::GenerateKey(_) => ActionId::GenerateKey,
            Mutation::Create(_) => ActionId::SubmitCreate,
        }
    }

    fn describe(&self) -> String {
        match self {
            Mutation::Delete(id) => format!("delete client {}", id),
            Mutation::GenerateKey(id) => format!("generate key for client {}", id),
            Mutation::Create(name) => format!("create client '{}'", name),
        }
    }

    fn success_message(&self, client: &Client) -> String {
        match self {
            Mutation::Delete(_) => format!("Removed client {} ({})", client.id, client.name),
            Mutation::GenerateKey(_) => format!("Generated key for client {}", client.id),
            Mutation::Create(_) => format!("Created client {} ({})", client.id, client.name),
        }
    }
}

/// Result of executing a mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Applied(Client),
    Failed(String),
}

/// Executes mutations against the API and forces a refresh on success
#[derive(Clone)]
pub struct Dispatcher {
    api: ApiClient,
    commands: mpsc::Sender<PollCommand>,
    events: mpsc::Sender<PanelEvent>,
}

impl Dispatcher {
    pub fn new(
        api: ApiClient,
        commands: mpsc::Sender<PollCommand>,
        events: mpsc::Sender<PanelEvent>,
    ) -> Self {
        Self {
            api,
            commands,
            events,
        }
    }

    /// Run a mutation to completion.
    ///
    /// Only a successful mutation sends [`PollCommand::Force`]. Failures are
    /// logged and surfaced as a notice.
    pub async fn execute(&self, mutation: Mutation) -> MutationOutcome {
        let result = match &mutation {
            Mutation::Delete(id) => self.api.delete_client(*id).await,
            Mutation::GenerateKey(id) => self.api.generate_key(*id).await,
            Mutation::Create(name) => self.api.create_client(name).await,
        };

        match result {
            Ok(client) => {
                tracing::info!(action = %mutation.action(), id = client.id, "mutation applied");
                let _ = self
                    .events
                    .send(PanelEvent::Notice(mutation.success_message(&client)))
                    .await;
                if self.commands.send(PollCommand::Force).await.is_err() {
                    tracing::debug!("Poller stopped; forced refresh dropped");
                }
                MutationOutcome::Applied(client)
            }
            Err(e) => {
                tracing::warn!("Failed to {}: {}", mutation.describe(), e);
                let message = format!("Failed to {}: {}", mutation.describe(), e);
                let _ = self.events.send(PanelEvent::Notice(message.clone())).await;
                MutationOutcome::Failed(message)
            }
        }
    }

    /// Run a mutation in the background
    pub fn spawn(&self, mutation: Mutation) -> JoinHandle<MutationOutcome> {
        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.execute(mutation).await })
    }
}
