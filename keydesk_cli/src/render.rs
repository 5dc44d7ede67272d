//! Client table rendering

use crate::actions::ActionId;
use keydesk_common::{Client, ClientId};

/// Actions offered on every row
pub const ROW_ACTIONS: [ActionId; 2] = [ActionId::DeleteClient, ActionId::GenerateKey];

/// One rendered table row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub id: ClientId,
    pub name: String,
    pub key: String,
}

/// The rendered client table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableView {
    pub rows: Vec<RowView>,
}

impl TableView {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RowView> {
        self.rows.get(index)
    }
}

/// Rebuild the whole table from a client list, keeping backend order
pub fn render(clients: &[Client]) -> TableView {
    TableView {
        rows: clients
            .iter()
            .map(|c| RowView {
                id: c.id,
                name: c.name.clone(),
                key: c.key.clone(),
            })
            .collect(),
    }
}

/// Format the table as fixed-width text lines
pub fn format_table(view: &TableView) -> Vec<String> {
    let mut lines = Vec::with_capacity(view.len() + 2);
    lines.push(format!("{:<8} {:<30} {:<40}", "ID", "NAME", "KEY"));
    lines.push("-".repeat(80));
    for row in &view.rows {
        lines.push(format!(
            "{:<8} {:<30} {:<40}",
            row.id,
            truncate(&row.name, 28),
            truncate(display_key(&row.key), 38)
        ));
    }
    lines
}

/// Print the table to stdout
pub fn print_table(view: &TableView) {
    if view.is_empty() {
        println!("No clients.");
        println!();
        println!("Create one with: keydesk create <NAME>");
        return;
    }

    for line in format_table(view) {
        println!("{}", line);
    }
}

/// Placeholder for clients that have no key yet
pub fn display_key(key: &str) -> &str {
    if key.is_empty() {
        "-"
    } else {
        key
    }
}

pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len && max_len > 3 {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    } else {
        s.to_string()
    }
}
