use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::{Block, Borders},
    Frame,
};

use crate::app::{App, Focus, Session, ViewMode};
use crate::components::content::ContentWidget;
use crate::components::status_bar::StatusBarWidget;
use crate::components::tree::TreeWidget;

/// Render the application UI.
pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    match app.session {
        Session::DualPane => render_dual_pane(app, frame, chunks[0]),
        Session::Document { .. } => render_content_pane(app, frame, chunks[0]),
    }
    render_status_bar(app, frame, chunks[1]);
}

fn render_dual_pane(app: &mut App, frame: &mut Frame, area: Rect) {
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(app.tree_width()),
            Constraint::Min(0),
        ])
        .split(area);

    let tree_focused = app.focus == Focus::Tree;
    let tree_block = Block::default()
        .title(" Files ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if tree_focused {
            app.theme.border_focused_fg
        } else {
            app.theme.border_fg
        }));

    let tree = TreeWidget::new(
        &app.tree_lines,
        app.selected_line,
        app.tree_viewport,
        tree_focused,
        &app.theme,
    )
    .block(tree_block);
    frame.render_widget(tree, panes[0]);

    render_content_pane(app, frame, panes[1]);
}

fn render_content_pane(app: &mut App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == Focus::Content;
    let title = app
        .current_doc_path()
        .and_then(|p| p.file_name().map(|n| format!(" {} ", n.to_string_lossy())))
        .unwrap_or_else(|| " Content ".to_string());

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .style(Style::default().fg(app.theme.content_fg))
        .border_style(Style::default().fg(if focused {
            app.theme.border_focused_fg
        } else {
            app.theme.border_fg
        }));

    let content = ContentWidget::new(&app.rendered_lines, app.content_viewport, &app.theme)
        .block(block);
    frame.render_widget(content, area);
}

fn render_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let doc_name = app
        .current_doc_path()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| "No document".to_string());
    let view_mode = match app.view_mode {
        ViewMode::Rendered => "Rendered",
        ViewMode::Raw => "Raw",
    };
    let focus = match app.focus {
        Focus::Tree => "Tree",
        Focus::Content => "Content",
    };
    let scan_status = app.scan_status();

    let mut bar = StatusBarWidget::new(&doc_name, view_mode, &app.theme);
    if app.session == Session::DualPane {
        bar = bar.focus(focus).scan_status(&scan_status);
    }
    frame.render_widget(bar, area);
}
