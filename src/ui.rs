// src/ui.rs
// Handles rendering the TUI layout and widgets.

use crate::app::{AppState, SettingsForm, View};
use crate::panel::Panel;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Tabs, Wrap},
    Frame,
};

/// Cursor character for text input fields
/// Uses ASCII underline character for maximum terminal compatibility
const CURSOR_CHAR: char = '_';
const ABSENT: &str = "—";

pub fn draw(f: &mut Frame, panel: &Panel) {
    let app = panel.state();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Percentage(45),
                Constraint::Min(5),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(f.size());

    draw_header(f, app, chunks[0]);
    match app.view {
        View::Models => draw_models(f, app, chunks[1]),
        View::Run => draw_run(f, app, chunks[1]),
        View::Pull => draw_pull(f, app, chunks[1]),
        View::Settings => draw_settings(f, app, chunks[1]),
    }
    draw_output(f, app, chunks[2]);
    draw_status_bar(f, panel, chunks[3]);
}

fn draw_header(f: &mut Frame, app: &AppState, area: Rect) {
    let split = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(30), Constraint::Length(48)].as_ref())
        .split(area);

    let selected = View::ALL.iter().position(|v| *v == app.view).unwrap_or(0);
    let titles: Vec<Line> = View::ALL
        .iter()
        .enumerate()
        .map(|(i, v)| Line::from(format!("{} {}", i + 1, v.title())))
        .collect();
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title("ollama-remote"))
        .select(selected)
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, split[0]);

    let chips = Paragraph::new(Line::from(vec![
        Span::raw(app.host_chip()),
        Span::raw("  "),
        Span::raw(app.mode_chip()),
    ]))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(chips, split[1]);
}

fn draw_models(f: &mut Frame, app: &AppState, area: Rect) {
    let show_filter = app.is_filtering || !app.filter_input.is_empty();
    let (table_area, filter_area) = if show_filter {
        let split = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
            .split(area);
        (split[1], Some(split[0]))
    } else {
        (area, None)
    };

    let visible = app.visible_models();
    let title = if app.filter_input.is_empty() {
        "Models".to_string()
    } else {
        format!("Models (filtered: {}/{})", visible.len(), app.models.len())
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    if visible.is_empty() {
        let hint = if app.models.is_empty() {
            "No models loaded. Press l to list installed models."
        } else {
            "No models match the filter."
        };
        f.render_widget(Paragraph::new(hint).italic().block(block), table_area);
    } else {
        let rows: Vec<Row> = visible
            .iter()
            .map(|m| {
                Row::new(vec![
                    Cell::from(m.name.clone()),
                    Cell::from(m.id.clone().unwrap_or_else(|| ABSENT.into())),
                    Cell::from(m.size.clone().unwrap_or_else(|| ABSENT.into())),
                    Cell::from(m.modified.clone().unwrap_or_else(|| ABSENT.into())),
                ])
            })
            .collect();
        let widths = [
            Constraint::Percentage(35),
            Constraint::Percentage(20),
            Constraint::Percentage(15),
            Constraint::Percentage(30),
        ];
        let table = Table::new(rows, widths)
            .header(Row::new(vec!["Name", "ID", "Size", "Modified"]).bold())
            .block(block)
            .highlight_style(
                Style::default()
                    .bg(Color::LightBlue)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        let mut table_state = TableState::default();
        table_state.select(app.selected);
        f.render_stateful_widget(table, table_area, &mut table_state);
    }

    if let Some(filter_area) = filter_area {
        draw_input(f, "Filter", &app.filter_input, app.is_filtering, filter_area);
    }
}

fn draw_run(f: &mut Frame, app: &AppState, area: Rect) {
    let split = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);
    draw_input(f, "Model", &app.run_model, app.focus == 0, split[0]);
    draw_input(
        f,
        "Prompt (Ctrl+R to run)",
        &app.prompt,
        app.focus == 1,
        split[1],
    );
}

fn draw_pull(f: &mut Frame, app: &AppState, area: Rect) {
    let split = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);
    draw_input(f, "Model to pull", &app.pull_model, true, split[0]);
    let hint = Paragraph::new("Enter: pull. The daemon may refuse pulls unless unsafe mode is on.")
        .italic()
        .wrap(Wrap { trim: true });
    f.render_widget(hint, split[1]);
}

fn draw_settings(f: &mut Frame, app: &AppState, area: Rect) {
    let mut lines: Vec<Line> = (0..SettingsForm::FIELDS)
        .map(|i| {
            let focused = app.focus == i;
            let mut value = app.settings.display_value(i);
            if focused && i < 4 {
                value.push(CURSOR_CHAR);
            }
            let marker = if focused { "> " } else { "  " };
            let style = if focused {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(
                    format!("{marker}{:<14}", SettingsForm::LABELS[i]),
                    Style::default().bold(),
                ),
                Span::styled(value, style),
            ])
        })
        .collect();

    let path = app
        .config
        .as_ref()
        .and_then(|c| c.config_path.clone())
        .unwrap_or_default();
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  Config file:  ", Style::default().bold()),
        Span::raw(path),
    ]));

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Settings (Ctrl+S to save)"),
    );
    f.render_widget(paragraph, area);
}

fn draw_input(f: &mut Frame, title: &str, value: &str, focused: bool, area: Rect) {
    let input_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title.to_string())
        .border_style(input_style);

    let mut input_display = value.to_string();
    if focused {
        input_display.push(CURSOR_CHAR);
    }

    let paragraph = Paragraph::new(input_display)
        .block(block)
        .style(input_style)
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn draw_output(f: &mut Frame, app: &AppState, area: Rect) {
    let title = if app.wrap_output { "Output (wrapped)" } else { "Output" };
    let block = Block::default().borders(Borders::ALL).title(title);

    // Keep the tail in view.
    let inner_height = area.height.saturating_sub(2) as usize;
    let line_count = app.output.lines().count();
    let offset = u16::try_from(line_count.saturating_sub(inner_height)).unwrap_or(u16::MAX);

    let mut paragraph = Paragraph::new(app.output.as_str())
        .block(block)
        .scroll((offset, 0));
    if app.wrap_output {
        paragraph = paragraph.wrap(Wrap { trim: false });
    }
    f.render_widget(paragraph, area);
}

fn draw_status_bar(f: &mut Frame, panel: &Panel, area: Rect) {
    let app = panel.state();
    let status_line = if let Some(notice) = app.notice_text() {
        Line::from(notice.to_string().yellow())
    } else if panel.is_busy() {
        Line::from(format!("Busy ({} in flight)...", panel.busy_count()).yellow())
    } else {
        Line::from(match app.view {
            View::Models if app.is_filtering => {
                "Filter: type to search | Enter: Confirm | Esc: Clear".to_string()
            }
            View::Models => {
                "q: Quit | l: List | j/k: Move | Enter: Run | p: Pull | /: Filter | Tab: Next view"
                    .to_string()
            }
            View::Run => "Ctrl+R: Run | ↑/↓: Field | Esc: Models | Ctrl+K: Clear output".to_string(),
            View::Pull => "Enter: Pull | Esc: Models | Ctrl+W: Wrap output".to_string(),
            View::Settings => "Ctrl+S: Save | ↑/↓: Field | Space: Toggle | Esc: Models".to_string(),
        })
    };

    let paragraph = Paragraph::new(status_line).style(Style::default().bg(Color::DarkGray));
    f.render_widget(paragraph, area);
}
