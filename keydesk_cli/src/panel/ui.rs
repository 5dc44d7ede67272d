//! Panel rendering functions

use super::app::{PanelApp, StatusKind};
use crate::actions::Scope;
use crate::render::{display_key, truncate, ROW_ACTIONS};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame,
};

/// Draw the panel
pub fn draw(frame: &mut Frame, app: &PanelApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title bar
            Constraint::Min(5),    // Client table
            Constraint::Length(1), // Status line
            Constraint::Length(1), // Footer
        ])
        .split(frame.area());

    draw_title_bar(frame, app, chunks[0]);
    draw_clients(frame, app, chunks[1]);
    draw_status(frame, app, chunks[2]);
    draw_footer(frame, app, chunks[3]);

    if app.dialog.open {
        draw_create_dialog(frame, app);
    }
}

fn draw_title_bar(frame: &mut Frame, app: &PanelApp, area: Rect) {
    let refreshed = app
        .last_refresh
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "loading...".to_string());

    let lines = vec![
        Line::from(vec![
            Span::styled(
                " KEYDESK ",
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("  API ", Style::default().fg(Color::DarkGray)),
            Span::styled(app.api_url.as_str(), Style::default().fg(Color::Green)),
            Span::styled("  Env ", Style::default().fg(Color::DarkGray)),
            Span::styled(app.environment, Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::styled(" Refreshed ", Style::default().fg(Color::DarkGray)),
            Span::styled(refreshed, Style::default().fg(Color::White)),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_clients(frame: &mut Frame, app: &PanelApp, area: Rect) {
    let fixed_width = 8 + 24 + 4;
    let key_width = (area.width as usize).saturating_sub(fixed_width).max(10);

    let header = Row::new(vec!["ID", "Name", "Key"])
        .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .bottom_margin(0);

    let rows: Vec<Row> = app
        .table
        .rows
        .iter()
        .map(|row| {
            let key_style = if row.key.is_empty() {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::Yellow)
            };
            Row::new(vec![
                Cell::from(row.id.to_string()),
                Cell::from(truncate(&row.name, 22)),
                Cell::from(truncate(display_key(&row.key), key_width)).style(key_style),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Length(24),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .title(format!(" Clients ({}) ", app.table.len()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    )
    .row_highlight_style(Style::default().bg(Color::Rgb(40, 40, 60)));

    let mut state = TableState::default();
    if !app.table.is_empty() {
        state.select(Some(app.selected_index));
    }

    frame.render_stateful_widget(table, area, &mut state);
}

fn draw_status(frame: &mut Frame, app: &PanelApp, area: Rect) {
    let line = match &app.status {
        Some(status) => {
            let color = match status.kind {
                StatusKind::Info => Color::Cyan,
                StatusKind::RefreshError => Color::Red,
            };
            Line::from(Span::styled(
                format!(" {}", status.message),
                Style::default().fg(color),
            ))
        }
        None => Line::from(""),
    };

    frame.render_widget(Paragraph::new(line), area);
}

/// Draw the footer with key hints for the active scope
fn draw_footer(frame: &mut Frame, app: &PanelApp, area: Rect) {
    let scope = app.scope();
    let mut spans = Vec::new();
    for (key, label) in app.actions().hints(scope) {
        spans.push(Span::styled(key, Style::default().fg(Color::Cyan)));
        spans.push(Span::styled(
            format!(" {}  ", label),
            Style::default().fg(Color::DarkGray),
        ));
    }

    if scope == Scope::Table && app.selected().is_some() {
        let row_actions: Vec<&str> = ROW_ACTIONS.iter().map(|a| a.label()).collect();
        spans.push(Span::styled(
            format!("│ row: {}", row_actions.join(", ")),
            Style::default().fg(Color::DarkGray),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_create_dialog(frame: &mut Frame, app: &PanelApp) {
    let area = centered_rect(50, 5, frame.area());

    let lines = vec![
        Line::from(Span::styled("Name", Style::default().fg(Color::DarkGray))),
        Line::from(vec![
            Span::styled(app.dialog.name.as_str(), Style::default().fg(Color::White)),
            Span::styled("█", Style::default().fg(Color::Cyan)),
        ]),
    ];

    let block = Block::default()
        .title(" New client ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Rectangle of `width` percent and `height` rows centered in `area`
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width) / 2),
            Constraint::Percentage(width),
            Constraint::Percentage((100 - width) / 2),
        ])
        .split(vertical[1])[1]
}
