use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, Paragraph, Wrap};

use super::app::App;
use crate::perms::Action;
use crate::ui::{self, TreeMode};

pub fn render(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[0]);

    render_tree(frame, app, panes[0]);
    render_form(frame, app, panes[1]);
    render_footer(frame, app, chunks[1]);

    if app.tree.mode == TreeMode::Help {
        render_help(frame);
    }
}

fn render_tree(frame: &mut Frame, app: &mut App, area: Rect) {
    let title = if app.tree.query.trim().is_empty() {
        " Groups ".to_string()
    } else {
        format!(" Groups matching \"{}\" ", app.tree.query.trim())
    };

    if app.tree.rows.is_empty() {
        let msg = if app.tree.forest.is_empty() {
            format!("No groups in {}.", app.source)
        } else {
            "No groups match the search.".to_string()
        };
        frame.render_widget(
            Paragraph::new(msg)
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().borders(Borders::ALL).title(title)),
            area,
        );
        return;
    }

    let items = ui::build_tree_items(&app.tree.rows, app.tree.state.selected_key());
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::DarkGray));
    frame.render_stateful_widget(list, area, &mut app.tree.list_state);
}

fn render_form(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = Vec::new();
    match &app.form.selection {
        Some(sel) => {
            lines.push(Line::from(vec![
                Span::styled("Group: ", Style::default().fg(Color::Cyan)),
                Span::styled(sel.display_name.clone(), Style::default().bold()),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Code:  ", Style::default().fg(Color::Cyan)),
                Span::raw(sel.id.clone().unwrap_or_else(|| "(none)".into())),
            ]));
            if app.selection_is_stale() {
                lines.push(Line::styled(
                    "No longer present in the latest snapshot.",
                    Style::default().fg(Color::Yellow),
                ));
            }
        }
        None => lines.push(Line::styled(
            "Select a group with Enter.",
            Style::default().fg(Color::DarkGray),
        )),
    }

    if let Some(perms) = &app.form.permissions {
        lines.push(Line::raw(""));
        let actions: Vec<Span> = Action::ALL
            .into_iter()
            .map(|a| {
                let style = if perms.allows(a) {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::DarkGray).crossed_out()
                };
                Span::styled(format!("[{a}] "), style)
            })
            .collect();
        lines.push(Line::from(actions));
    }

    frame.render_widget(
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(" Form "))
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let line = if app.tree.mode == TreeMode::Search {
        Line::from(vec![
            Span::styled("/", Style::default().fg(Color::Cyan)),
            Span::raw(app.tree.query.clone()),
            Span::raw("_"),
        ])
    } else if let Some(err) = &app.tree.error {
        Line::styled(err.clone(), Style::default().fg(Color::Red))
    } else if let Some(w) = app.tree.warnings.first() {
        let more = app.tree.warnings.len() - 1;
        let suffix = if more > 0 {
            format!(" (+{more} more)")
        } else {
            String::new()
        };
        Line::styled(format!("{w}{suffix}"), Style::default().fg(Color::Yellow))
    } else {
        Line::styled(
            "j/k: move  Space: expand  Enter: select  /: search  ?: help  q: quit",
            Style::default().fg(Color::DarkGray),
        )
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn help_line(keys: &'static str, text: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(keys, Style::default().fg(Color::Cyan)),
        Span::raw(text),
    ])
}

fn render_help(frame: &mut Frame) {
    let term = frame.area();
    let width = 50.min(term.width.saturating_sub(4));
    let height = 15.min(term.height.saturating_sub(2));
    let area = ui::centered_rect(width, height, term);

    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let help_text = vec![
        help_line("j/Down  ", "Move down"),
        help_line("k/Up    ", "Move up"),
        help_line("Space   ", "Expand/collapse group"),
        help_line("Enter   ", "Select group into the form"),
        help_line("c       ", "Clear selection"),
        help_line("/       ", "Search groups"),
        help_line("r       ", "Reload snapshot"),
        help_line("?       ", "Toggle help"),
        help_line("q/Esc   ", "Quit"),
        Line::raw(""),
        Line::from(vec![Span::styled("Search:", Style::default().bold())]),
        help_line("  Enter     ", "Keep query"),
        help_line("  Esc       ", "Clear query"),
    ];

    frame.render_widget(Paragraph::new(help_text), inner);
}
