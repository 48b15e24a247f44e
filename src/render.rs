//! Markdown render pipeline: pulldown-cmark event stream → styled ratatui
//! lines, word-wrapped to a target width, with syntect highlighting for
//! fenced code blocks.
//!
//! Engine construction parses the syntect syntax and theme sets, which is
//! expensive; engines are therefore cached per wrap width in a process-wide
//! shared [`RendererCache`] and never recreated for an already-seen width.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use unicode_width::UnicodeWidthStr;

use crate::app::ViewMode;
use crate::error::{AppError, Result};

/// Fallback syntect theme when the configured name is unknown.
pub const DEFAULT_SYNTAX_THEME: &str = "base16-ocean.dark";

/// A markdown rendering engine configured for one wrap width.
pub struct MarkdownRenderer {
    wrap_width: usize,
    syntax_set: SyntaxSet,
    theme: Theme,
}

impl MarkdownRenderer {
    /// Build an engine for the given syntect theme name and wrap width.
    pub fn new(theme_name: &str, wrap_width: usize) -> Result<Self> {
        let syntax_set = SyntaxSet::load_defaults_newlines();
        let ts = ThemeSet::load_defaults();
        let theme = ts
            .themes
            .get(theme_name)
            .or_else(|| ts.themes.get(DEFAULT_SYNTAX_THEME))
            .cloned()
            .ok_or_else(|| AppError::Render(format!("theme {} unavailable", theme_name)))?;

        Ok(Self {
            wrap_width: wrap_width.max(1),
            syntax_set,
            theme,
        })
    }

    /// Render markdown text to styled, wrapped lines.
    pub fn render(&self, text: &str) -> Vec<Line<'static>> {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        let parser = Parser::new_ext(text, options);

        let mut out = MarkdownBuilder::new(self);
        for event in parser {
            out.handle(event);
        }
        out.finish()
    }

    fn highlight_code_block(&self, code: &str, lang: &str) -> Vec<Line<'static>> {
        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());
        let mut highlighter = HighlightLines::new(syntax, &self.theme);

        let mut lines = Vec::new();
        for code_line in code.lines() {
            let mut spans: Vec<Span<'static>> = vec![Span::raw("    ")];
            match highlighter.highlight_line(code_line, &self.syntax_set) {
                Ok(ranges) => {
                    for (style, piece) in ranges {
                        let fg = syntect_color_to_ratatui(style.foreground);
                        spans.push(Span::styled(
                            piece.to_string(),
                            Style::default().fg(fg),
                        ));
                    }
                }
                Err(_) => spans.push(Span::raw(code_line.to_string())),
            }
            lines.push(Line::from(spans));
        }
        if lines.is_empty() {
            lines.push(Line::from("    "));
        }
        lines
    }
}

/// Convert syntect color to ratatui Color.
fn syntect_color_to_ratatui(c: syntect::highlighting::Color) -> Color {
    Color::Rgb(c.r, c.g, c.b)
}

/// Event-stream accumulator building styled lines.
struct MarkdownBuilder<'r> {
    renderer: &'r MarkdownRenderer,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    style_stack: Vec<Style>,
    /// Ordered-list counters; `None` for bullet lists.
    list_stack: Vec<Option<u64>>,
    quote_depth: usize,
    in_code_block: bool,
    code_lang: String,
    code_buffer: String,
}

impl<'r> MarkdownBuilder<'r> {
    fn new(renderer: &'r MarkdownRenderer) -> Self {
        Self {
            renderer,
            lines: Vec::new(),
            current: Vec::new(),
            style_stack: vec![Style::default()],
            list_stack: Vec::new(),
            quote_depth: 0,
            in_code_block: false,
            code_lang: String::new(),
            code_buffer: String::new(),
        }
    }

    fn style(&self) -> Style {
        *self.style_stack.last().unwrap_or(&Style::default())
    }

    fn push_text(&mut self, text: &str) {
        if self.current.is_empty() {
            self.push_line_prefix();
        }
        self.current.push(Span::styled(text.to_string(), self.style()));
    }

    /// Quote bars and list indentation at the start of a fresh line.
    fn push_line_prefix(&mut self) {
        if self.quote_depth > 0 {
            let bars = "│ ".repeat(self.quote_depth);
            self.current
                .push(Span::styled(bars, Style::default().fg(Color::DarkGray)));
        }
    }

    fn flush_line(&mut self) {
        if !self.current.is_empty() {
            let spans = std::mem::take(&mut self.current);
            let wrapped = wrap_spans(&spans, self.renderer.wrap_width);
            self.lines.extend(wrapped);
        }
    }

    fn blank_line(&mut self) {
        self.flush_line();
        if !self.lines.is_empty() {
            self.lines.push(Line::default());
        }
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => {
                if self.in_code_block {
                    self.code_buffer.push_str(&text);
                } else {
                    self.push_text(&text);
                }
            }
            Event::Code(code) => {
                if self.current.is_empty() {
                    self.push_line_prefix();
                }
                self.current.push(Span::styled(
                    code.to_string(),
                    self.style().fg(Color::Yellow),
                ));
            }
            Event::SoftBreak => self.push_text(" "),
            Event::HardBreak => self.flush_line(),
            Event::Rule => {
                self.blank_line();
                self.lines.push(Line::from(Span::styled(
                    "─".repeat(self.renderer.wrap_width),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            // Raw HTML and other constructs pass through as plain text.
            Event::Html(html) | Event::InlineHtml(html) => self.push_text(&html),
            _ => {}
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if !self.list_stack.is_empty() {
                    return;
                }
                self.blank_line();
            }
            Tag::Heading { level, .. } => {
                self.blank_line();
                self.style_stack.push(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                );
                let hashes = "#".repeat(heading_depth(level));
                self.push_text(&hashes);
                self.push_text(" ");
            }
            Tag::Strong => {
                let s = self.style().add_modifier(Modifier::BOLD);
                self.style_stack.push(s);
            }
            Tag::Emphasis => {
                let s = self.style().add_modifier(Modifier::ITALIC);
                self.style_stack.push(s);
            }
            Tag::Strikethrough => {
                let s = self.style().add_modifier(Modifier::CROSSED_OUT);
                self.style_stack.push(s);
            }
            Tag::Link { .. } | Tag::Image { .. } => {
                let s = self
                    .style()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::UNDERLINED);
                self.style_stack.push(s);
            }
            Tag::BlockQuote(_) => {
                self.blank_line();
                self.quote_depth += 1;
                let s = self.style().add_modifier(Modifier::ITALIC);
                self.style_stack.push(s);
            }
            Tag::List(start) => {
                if self.list_stack.is_empty() {
                    self.blank_line();
                } else {
                    self.flush_line();
                }
                self.list_stack.push(start);
            }
            Tag::Item => {
                self.flush_line();
                self.push_line_prefix();
                let depth = self.list_stack.len().saturating_sub(1);
                let indent = "  ".repeat(depth);
                let marker = match self.list_stack.last_mut() {
                    Some(Some(n)) => {
                        let m = format!("{}{}. ", indent, n);
                        *n += 1;
                        m
                    }
                    _ => format!("{}• ", indent),
                };
                self.current
                    .push(Span::styled(marker, Style::default().fg(Color::Magenta)));
            }
            Tag::CodeBlock(kind) => {
                self.blank_line();
                self.in_code_block = true;
                self.code_lang = match kind {
                    CodeBlockKind::Fenced(lang) => lang.to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                self.code_buffer.clear();
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.flush_line(),
            TagEnd::Heading(_) => {
                self.style_stack.pop();
                self.flush_line();
            }
            TagEnd::Strong
            | TagEnd::Emphasis
            | TagEnd::Strikethrough
            | TagEnd::Link
            | TagEnd::Image => {
                self.style_stack.pop();
            }
            TagEnd::BlockQuote(_) => {
                self.style_stack.pop();
                self.flush_line();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            TagEnd::List(_) => {
                self.flush_line();
                self.list_stack.pop();
            }
            TagEnd::Item => self.flush_line(),
            TagEnd::CodeBlock => {
                let code = std::mem::take(&mut self.code_buffer);
                let lang = std::mem::take(&mut self.code_lang);
                let highlighted = self.renderer.highlight_code_block(&code, &lang);
                self.lines.extend(highlighted);
                self.in_code_block = false;
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush_line();
        if self.lines.is_empty() {
            self.lines.push(Line::default());
        }
        self.lines
    }
}

fn heading_depth(level: HeadingLevel) -> usize {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Word-wrap a styled span sequence to a display width.
///
/// Breaks at word boundaries when possible, falling back to mid-word breaks
/// for segments wider than the whole line.
fn wrap_spans(spans: &[Span<'static>], max_width: usize) -> Vec<Line<'static>> {
    let total: usize = spans.iter().map(|s| s.content.width()).sum();
    if total <= max_width {
        return vec![Line::from(spans.to_vec())];
    }

    // Split spans into word/space segments, keeping each segment's style.
    let mut segments: Vec<(String, Style)> = Vec::new();
    for span in spans {
        let mut chars = span.content.chars().peekable();
        while chars.peek().is_some() {
            let mut segment = String::new();
            while let Some(&c) = chars.peek() {
                if c != ' ' {
                    break;
                }
                segment.push(c);
                chars.next();
            }
            while let Some(&c) = chars.peek() {
                if c == ' ' {
                    break;
                }
                segment.push(c);
                chars.next();
            }
            if !segment.is_empty() {
                segments.push((segment, span.style));
            }
        }
    }

    let mut result = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut current_width = 0usize;

    for (segment, style) in segments {
        let seg_width = segment.as_str().width();
        if current_width + seg_width <= max_width {
            current.push(Span::styled(segment, style));
            current_width += seg_width;
        } else if current_width == 0 {
            // Segment wider than a whole line: hard-break it.
            let mut remaining = segment.as_str();
            while remaining.as_bytes().len() > 0 {
                let mut take_bytes = 0;
                let mut take_width = 0;
                for (idx, c) in remaining.char_indices() {
                    let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(1);
                    if take_width + w > max_width && take_bytes > 0 {
                        break;
                    }
                    take_width += w;
                    take_bytes = idx + c.len_utf8();
                }
                let (head, rest) = remaining.split_at(take_bytes);
                if rest.is_empty() {
                    current.push(Span::styled(head.to_string(), style));
                    current_width = take_width;
                } else {
                    result.push(Line::from(vec![Span::styled(head.to_string(), style)]));
                }
                remaining = rest;
            }
        } else {
            result.push(Line::from(std::mem::take(&mut current)));
            let trimmed = segment.trim_start().to_string();
            current_width = trimmed.as_str().width();
            current.push(Span::styled(trimmed, style));
        }
    }

    if !current.is_empty() {
        result.push(Line::from(current));
    }
    result
}

// ── Renderer cache ───────────────────────────────────────────────────────────

/// Width-keyed cache of rendering engines.
///
/// Shared across the event loop and background render tasks: concurrent
/// readers, exclusive insert. Entries are created at most once per width and
/// never evicted, so a resize back to an earlier width reuses its engine.
#[derive(Default)]
pub struct RendererCache {
    engines: RwLock<HashMap<usize, Arc<MarkdownRenderer>>>,
}

impl RendererCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the engine for a width, building and inserting it on first use.
    /// Returns `None` when engine construction fails; callers fall back to
    /// verbatim text.
    pub fn get_or_create(&self, theme_name: &str, width: usize) -> Option<Arc<MarkdownRenderer>> {
        if let Ok(engines) = self.engines.read() {
            if let Some(engine) = engines.get(&width) {
                return Some(Arc::clone(engine));
            }
        }

        let engine = Arc::new(MarkdownRenderer::new(theme_name, width).ok()?);
        if let Ok(mut engines) = self.engines.write() {
            // Another task may have inserted while we were building.
            let entry = engines.entry(width).or_insert_with(|| Arc::clone(&engine));
            return Some(Arc::clone(entry));
        }
        Some(engine)
    }

    /// Number of distinct widths cached.
    pub fn len(&self) -> usize {
        self.engines.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Render a document through the pipeline.
///
/// Raw mode, empty text, or an unavailable engine all take the verbatim
/// split path; it is a supported mode, not an error.
pub fn render_document(
    cache: &RendererCache,
    theme_name: &str,
    text: &str,
    width: usize,
    mode: ViewMode,
) -> Vec<Line<'static>> {
    if mode == ViewMode::Raw || text.is_empty() {
        return verbatim_lines(text);
    }
    match cache.get_or_create(theme_name, width) {
        Some(engine) => engine.render(text),
        None => verbatim_lines(text),
    }
}

/// Split text on line breaks with no styling or wrapping.
pub fn verbatim_lines(text: &str) -> Vec<Line<'static>> {
    text.split('\n')
        .map(|l| Line::from(l.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn texts(lines: &[Line<'_>]) -> Vec<String> {
        lines.iter().map(line_text).collect()
    }

    #[test]
    fn raw_mode_splits_verbatim() {
        let cache = RendererCache::new();
        let lines = render_document(&cache, DEFAULT_SYNTAX_THEME, "# H\n\nbody", 80, ViewMode::Raw);
        assert_eq!(texts(&lines), vec!["# H", "", "body"]);
        // Raw mode never touches the engine cache.
        assert!(cache.is_empty());
    }

    #[test]
    fn rendered_mode_styles_heading() {
        let cache = RendererCache::new();
        let lines = render_document(
            &cache,
            DEFAULT_SYNTAX_THEME,
            "# H\n\nbody",
            80,
            ViewMode::Rendered,
        );
        let all = texts(&lines).join("\n");
        assert!(all.contains("# H"));
        assert!(all.contains("body"));
        let heading = lines
            .iter()
            .find(|l| line_text(l).contains("# H"))
            .unwrap();
        assert!(heading
            .spans
            .iter()
            .any(|s| s.style.add_modifier.contains(Modifier::BOLD)));
    }

    #[test]
    fn empty_text_falls_back_to_verbatim() {
        let cache = RendererCache::new();
        let lines = render_document(&cache, DEFAULT_SYNTAX_THEME, "", 80, ViewMode::Rendered);
        assert_eq!(texts(&lines), vec![""]);
        assert!(cache.is_empty());
    }

    #[test]
    fn long_paragraph_wraps_to_width() {
        let renderer = MarkdownRenderer::new(DEFAULT_SYNTAX_THEME, 20).unwrap();
        let text = "one two three four five six seven eight nine ten";
        let lines = renderer.render(text);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line_text(line).len() <= 20, "line too wide: {:?}", line_text(line));
        }
    }

    #[test]
    fn overlong_word_breaks_mid_word() {
        let renderer = MarkdownRenderer::new(DEFAULT_SYNTAX_THEME, 10).unwrap();
        let lines = renderer.render("aaaaaaaaaaaaaaaaaaaaaaaaa");
        assert!(lines.len() >= 3);
    }

    #[test]
    fn unknown_theme_falls_back_to_default() {
        let renderer = MarkdownRenderer::new("no-such-theme", 60);
        assert!(renderer.is_ok());
    }

    #[test]
    fn code_block_is_indented() {
        let renderer = MarkdownRenderer::new(DEFAULT_SYNTAX_THEME, 60).unwrap();
        let lines = renderer.render("```rust\nlet x = 1;\n```");
        let code_line = lines
            .iter()
            .map(line_text)
            .find(|l| l.contains("let x = 1;"))
            .unwrap();
        assert!(code_line.starts_with("    "));
    }

    #[test]
    fn bullet_list_uses_markers() {
        let renderer = MarkdownRenderer::new(DEFAULT_SYNTAX_THEME, 60).unwrap();
        let lines = renderer.render("- first\n- second");
        let all = texts(&lines);
        assert!(all.iter().any(|l| l.contains("• first")));
        assert!(all.iter().any(|l| l.contains("• second")));
    }

    #[test]
    fn ordered_list_counts() {
        let renderer = MarkdownRenderer::new(DEFAULT_SYNTAX_THEME, 60).unwrap();
        let all = texts(&renderer.render("1. a\n2. b"));
        assert!(all.iter().any(|l| l.contains("1. a")));
        assert!(all.iter().any(|l| l.contains("2. b")));
    }

    #[test]
    fn block_quote_carries_bar() {
        let renderer = MarkdownRenderer::new(DEFAULT_SYNTAX_THEME, 60).unwrap();
        let all = texts(&renderer.render("> quoted"));
        assert!(all.iter().any(|l| l.contains("│ ") && l.contains("quoted")));
    }

    #[test]
    fn cache_reuses_engine_per_width() {
        let cache = RendererCache::new();
        let a = cache.get_or_create(DEFAULT_SYNTAX_THEME, 60).unwrap();
        let b = cache.get_or_create(DEFAULT_SYNTAX_THEME, 60).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn cache_keeps_entries_for_other_widths() {
        let cache = RendererCache::new();
        let first = cache.get_or_create(DEFAULT_SYNTAX_THEME, 60).unwrap();
        cache.get_or_create(DEFAULT_SYNTAX_THEME, 80).unwrap();
        assert_eq!(cache.len(), 2);
        // Returning to a previous width reuses its engine.
        let again = cache.get_or_create(DEFAULT_SYNTAX_THEME, 60).unwrap();
        assert!(Arc::ptr_eq(&first, &again));
    }

    #[test]
    fn render_never_returns_empty() {
        let renderer = MarkdownRenderer::new(DEFAULT_SYNTAX_THEME, 60).unwrap();
        assert!(!renderer.render("").is_empty());
    }
}
