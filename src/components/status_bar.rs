use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;

/// Status bar widget: current document, view mode, focus, scan progress,
/// and key hints.
pub struct StatusBarWidget<'a> {
    doc_name: &'a str,
    view_mode: &'a str,
    theme: &'a ThemeColors,
    focus: Option<&'a str>,
    scan_status: Option<&'a str>,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(doc_name: &'a str, view_mode: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            doc_name,
            view_mode,
            theme,
            focus: None,
            scan_status: None,
        }
    }

    pub fn focus(mut self, focus: &'a str) -> Self {
        self.focus = Some(focus);
        self
    }

    pub fn scan_status(mut self, status: &'a str) -> Self {
        if !status.is_empty() {
            self.scan_status = Some(status);
        }
        self
    }
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let width = area.width as usize;
        let key_hints = " tab:focus  j/k:move  r:raw  q:quit ";

        let name_style = Style::default()
            .fg(self.theme.status_fg)
            .add_modifier(Modifier::BOLD);
        let meta_style = Style::default().fg(self.theme.status_fg);
        let hints_style = Style::default()
            .fg(self.theme.dim_fg)
            .add_modifier(Modifier::DIM);

        let mut spans = vec![
            Span::styled(format!(" {} ", self.doc_name), name_style),
            Span::styled(format!("│ {} ", self.view_mode), meta_style),
        ];
        if let Some(focus) = self.focus {
            spans.push(Span::styled(format!("│ Focus: {} ", focus), meta_style));
        }
        if let Some(status) = self.scan_status {
            spans.push(Span::styled(
                format!("│ {} ", status),
                Style::default().fg(self.theme.dim_fg),
            ));
        }

        let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        let pad = width.saturating_sub(used).saturating_sub(key_hints.len());
        if pad > 0 {
            spans.push(Span::raw(" ".repeat(pad)));
        }
        if used + key_hints.len() <= width {
            spans.push(Span::styled(key_hints, hints_style));
        }

        let line = Line::from(spans).style(Style::default().bg(self.theme.status_bg));
        buf.set_line(area.x, area.y, &line, area.width);
    }
}
