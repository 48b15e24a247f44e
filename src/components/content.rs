use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::Line,
    widgets::{Block, Widget},
};

use crate::theme::ThemeColors;

/// Content pane widget: shows a window of pre-rendered lines plus a
/// scrollbar column along the right edge.
pub struct ContentWidget<'a> {
    lines: &'a [Line<'static>],
    viewport: usize,
    theme: &'a ThemeColors,
    block: Option<Block<'a>>,
}

impl<'a> ContentWidget<'a> {
    pub fn new(lines: &'a [Line<'static>], viewport: usize, theme: &'a ThemeColors) -> Self {
        Self {
            lines,
            viewport,
            theme,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }

    /// Thumb extent for the scrollbar: which rows of the track get the
    /// filled glyph at the current scroll position.
    fn thumb_range(total: usize, height: usize, viewport: usize) -> (usize, usize) {
        if total <= height || height == 0 {
            return (0, height);
        }
        let thumb_len = ((height * height) / total).max(1);
        let max_top = total - height;
        let thumb_top = (viewport * (height - thumb_len)) / max_top;
        (thumb_top, thumb_top + thumb_len)
    }
}

impl<'a> Widget for ContentWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        let height = inner_area.height as usize;
        if height == 0 || inner_area.width < 2 {
            return;
        }

        // Last column is reserved for the scrollbar.
        let text_width = inner_area.width - 1;
        let visible = self.lines.iter().skip(self.viewport).take(height);
        for (i, line) in visible.enumerate() {
            let y = inner_area.y + i as u16;
            buf.set_line(inner_area.x, y, line, text_width);
        }

        if self.lines.len() > height {
            let (thumb_top, thumb_end) =
                Self::thumb_range(self.lines.len(), height, self.viewport);
            let x = inner_area.x + inner_area.width - 1;
            for row in 0..height {
                let (glyph, color) = if row >= thumb_top && row < thumb_end {
                    ("█", self.theme.scrollbar_thumb_fg)
                } else {
                    ("░", self.theme.scrollbar_track_fg)
                };
                buf.set_string(
                    x,
                    inner_area.y + row as u16,
                    glyph,
                    Style::default().fg(color),
                );
            }
        }
    }
}
