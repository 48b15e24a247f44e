use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::theme::ThemeColors;

/// Tree pane widget: renders the pre-flattened display lines with a cursor
/// on the selected document's line.
pub struct TreeWidget<'a> {
    lines: &'a [String],
    selected_line: usize,
    viewport: usize,
    focused: bool,
    theme: &'a ThemeColors,
    block: Option<Block<'a>>,
}

impl<'a> TreeWidget<'a> {
    pub fn new(
        lines: &'a [String],
        selected_line: usize,
        viewport: usize,
        focused: bool,
        theme: &'a ThemeColors,
    ) -> Self {
        Self {
            lines,
            selected_line,
            viewport,
            focused,
            theme,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }

    /// Fit a line into `width` display columns.
    fn truncate(text: &str, width: usize) -> String {
        if text.width() <= width {
            return text.to_string();
        }
        let mut out = String::new();
        let mut used = 0;
        for ch in text.chars() {
            let w = ch.width().unwrap_or(0);
            if used + w > width.saturating_sub(1) {
                break;
            }
            used += w;
            out.push(ch);
        }
        out.push('…');
        out
    }
}

impl<'a> Widget for TreeWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        let visible_height = inner_area.height as usize;
        if self.lines.is_empty() || visible_height == 0 || inner_area.width == 0 {
            return;
        }

        let visible = self
            .lines
            .iter()
            .enumerate()
            .skip(self.viewport)
            .take(visible_height);

        let width = inner_area.width as usize;
        for (i, (idx, text)) in visible.enumerate() {
            let y = inner_area.y + i as u16;
            let is_selected = idx == self.selected_line;

            let (cursor, style) = if is_selected && self.focused {
                (
                    "❯ ",
                    Style::default()
                        .bg(self.theme.tree_selected_bg)
                        .fg(self.theme.tree_selected_fg)
                        .add_modifier(Modifier::BOLD),
                )
            } else if is_selected {
                (
                    "  ",
                    Style::default()
                        .bg(self.theme.tree_selected_bg)
                        .fg(self.theme.tree_selected_fg),
                )
            } else {
                ("  ", Style::default().fg(self.theme.tree_fg))
            };

            let content = Self::truncate(
                &format!("{}{}", cursor, text),
                width,
            );
            // Pad selected rows so the highlight spans the pane.
            let content = if is_selected {
                let pad = width.saturating_sub(content.width());
                format!("{}{}", content, " ".repeat(pad))
            } else {
                content
            };

            let line = Line::from(Span::styled(content, style));
            buf.set_line(inner_area.x, y, &line, inner_area.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme;

    fn render_to_strings(widget: TreeWidget, width: u16, height: u16) -> Vec<String> {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| buf.cell((x, y)).unwrap().symbol().to_string())
                    .collect::<String>()
                    .trim_end()
                    .to_string()
            })
            .collect()
    }

    #[test]
    fn renders_lines_with_cursor_on_selection() {
        let tc = theme::dark_theme();
        let lines = vec![
            "    ├── [+] docs/".to_string(),
            "    │   └── [-] guide.md".to_string(),
            "    └── [-] README.md".to_string(),
        ];
        let widget = TreeWidget::new(&lines, 1, 0, true, &tc);
        let rows = render_to_strings(widget, 40, 3);
        assert_eq!(rows[0], "      ├── [+] docs/");
        assert_eq!(rows[1], "❯     │   └── [-] guide.md");
        assert_eq!(rows[2], "      └── [-] README.md");
    }

    #[test]
    fn unfocused_selection_has_no_cursor() {
        let tc = theme::dark_theme();
        let lines = vec!["    └── [-] a.md".to_string()];
        let widget = TreeWidget::new(&lines, 0, 0, false, &tc);
        let rows = render_to_strings(widget, 30, 1);
        assert!(!rows[0].contains('❯'));
        assert!(rows[0].contains("a.md"));
    }

    #[test]
    fn viewport_skips_leading_lines() {
        let tc = theme::dark_theme();
        let lines: Vec<String> = (0..10).map(|i| format!("line {}", i)).collect();
        let widget = TreeWidget::new(&lines, 5, 4, true, &tc);
        let rows = render_to_strings(widget, 20, 3);
        assert!(rows[0].contains("line 4"));
        assert!(rows[1].contains("line 5"));
        assert!(rows[2].contains("line 6"));
    }

    #[test]
    fn long_lines_are_truncated_with_ellipsis() {
        let tc = theme::dark_theme();
        let lines = vec!["    └── [-] a_very_long_document_name.md".to_string()];
        let widget = TreeWidget::new(&lines, 1, 0, true, &tc);
        let rows = render_to_strings(widget, 16, 1);
        assert!(rows[0].ends_with('…'));
    }

    #[test]
    fn zero_area_does_not_panic() {
        let tc = theme::dark_theme();
        let lines = vec!["x".to_string()];
        let widget = TreeWidget::new(&lines, 0, 0, true, &tc);
        let area = Rect::new(0, 0, 0, 0);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
    }
}
