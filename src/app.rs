use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use ratatui::text::Line;
use tokio::sync::mpsc::UnboundedSender;

use crate::config::Settings;
use crate::event::Event;
use crate::fs::flatten::{collect_documents, find_line_for_document, flatten_tree};
use crate::fs::scan::{self, DocNode};
use crate::render::{self, RendererCache};
use crate::theme::{resolve_theme, ThemeColors};

/// Which pane receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Tree,
    Content,
}

/// How the content pane presents the current document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Rendered,
    Raw,
}

/// Startup-mode of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    /// Directory tree mode: tree pane + content pane, progressive scanning.
    DualPane,
    /// Single-document mode (file argument or piped input): no tree pane,
    /// no scanning.
    Document { path: PathBuf },
}

/// Progressive scan progress.
///
/// Depth only ever increases; `in_flight` is true for at most one scan at a
/// time.
#[derive(Debug, Clone, Copy)]
pub struct ScanProgress {
    /// -1 before the first scan, 0 after the instant depth-0 pass, then the
    /// deepest level requested so far.
    pub depth: i32,
    pub in_flight: bool,
}

/// Clamp a requested viewport offset into `[0, max(0, len - height)]`.
pub fn clamp_viewport(offset: isize, len: usize, height: usize) -> usize {
    let max_top = len.saturating_sub(height);
    offset.max(0).min(max_top as isize) as usize
}

/// Main application state: the dual-pane controller.
///
/// All mutation happens inside the event loop; background scans, file reads,
/// and renders message back through the event channel and are re-checked
/// against current state before being applied.
pub struct App {
    pub session: Session,
    pub root_path: PathBuf,
    pub include_ignored: bool,

    // Tree state, replaced wholesale on each accepted scan.
    pub tree: DocNode,
    pub tree_lines: Vec<String>,
    pub documents: Vec<PathBuf>,
    pub selected_doc: usize,
    pub selected_line: usize,
    pub tree_viewport: usize,

    // Content state.
    pub current_content: String,
    pub rendered_lines: Vec<Line<'static>>,
    pub content_viewport: usize,
    content_loaded: bool,

    // Layout.
    pub width: u16,
    pub height: u16,
    pub split_ratio: f64,

    pub focus: Focus,
    pub view_mode: ViewMode,
    pub scan: ScanProgress,

    pub renderer_cache: Arc<RendererCache>,
    pub settings: Settings,
    pub theme: ThemeColors,
    pub should_quit: bool,

    events: UnboundedSender<Event>,
}

impl App {
    /// Dual-pane session rooted at a directory. Nothing is scanned yet; the
    /// first frame paints a loading placeholder and `start` kicks off the
    /// depth-0 scan.
    pub fn new_dual(
        root_path: PathBuf,
        include_ignored: bool,
        settings: Settings,
        events: UnboundedSender<Event>,
    ) -> Self {
        let theme = resolve_theme(&settings.scheme);
        let split_ratio = settings.split_ratio;
        Self {
            session: Session::DualPane,
            tree: DocNode::empty_root(&root_path),
            root_path,
            include_ignored,
            tree_lines: vec!["Loading markdown files...".to_string()],
            documents: Vec::new(),
            selected_doc: 0,
            selected_line: 0,
            tree_viewport: 0,
            current_content: String::new(),
            rendered_lines: Vec::new(),
            content_viewport: 0,
            content_loaded: false,
            width: 0,
            height: 0,
            split_ratio,
            focus: Focus::Tree,
            view_mode: ViewMode::Rendered,
            scan: ScanProgress {
                depth: -1,
                in_flight: false,
            },
            renderer_cache: Arc::new(RendererCache::new()),
            settings,
            theme,
            should_quit: false,
            events,
        }
    }

    /// Single-document session; the file is read off-loop on `start`.
    pub fn new_document(path: PathBuf, settings: Settings, events: UnboundedSender<Event>) -> Self {
        let mut app = Self::new_dual(
            path.parent().map(PathBuf::from).unwrap_or_default(),
            false,
            settings,
            events,
        );
        app.session = Session::Document { path };
        app.focus = Focus::Content;
        app.tree_lines = Vec::new();
        app.rendered_lines = render::verbatim_lines("Loading file...");
        app
    }

    /// Single-document session with pre-loaded text (piped input); no
    /// filesystem read happens at all.
    pub fn new_piped(text: String, settings: Settings, events: UnboundedSender<Event>) -> Self {
        let mut app = Self::new_document(PathBuf::from("stdin"), settings, events);
        app.current_content = text;
        app.content_loaded = true;
        app
    }

    /// Kick off the session's initial background work.
    pub fn start(&mut self) {
        match self.session.clone() {
            Session::DualPane => {
                if self.scan.depth == -1 {
                    self.scan.depth = 0;
                    self.scan.in_flight = true;
                    self.dispatch_scan(0);
                }
            }
            Session::Document { path } => {
                if self.content_loaded {
                    self.rerender_content();
                } else {
                    self.dispatch_load(path);
                }
            }
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    // ── Layout math ──────────────────────────────────────────────────────────

    /// Rows visible inside a bordered pane: total height minus the status
    /// line and the pane borders.
    pub fn pane_height(&self) -> usize {
        self.height.saturating_sub(3) as usize
    }

    /// Columns given to the tree pane.
    pub fn tree_width(&self) -> u16 {
        (self.width as f64 * self.split_ratio) as u16
    }

    /// Wrap width for the content renderer at the current layout.
    pub fn wrap_width(&self) -> usize {
        let content_width = match self.session {
            Session::DualPane => self.width.saturating_sub(self.tree_width()) as usize,
            Session::Document { .. } => self.width as usize,
        };
        // Borders, padding, and the scrollbar column.
        content_width
            .saturating_sub(6)
            .max(self.settings.min_wrap_width)
    }

    /// React to a terminal resize: pane widths change, so the content is
    /// re-rendered at the new wrap width. Other cached widths stay cached.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.rerender_content();
    }

    // ── Scan lifecycle ───────────────────────────────────────────────────────

    fn dispatch_scan(&self, depth: i32) {
        let root = self.root_path.clone();
        let include_ignored = self.include_ignored;
        let tx = self.events.clone();
        tokio::task::spawn_blocking(move || {
            let result = if depth == 0 {
                scan::scan_quick(&root, include_ignored)
            } else {
                scan::scan_with_depth(&root, include_ignored, depth)
            };
            let tree = result.unwrap_or_else(|_| DocNode::empty_root(&root));
            let _ = tx.send(Event::ScanComplete { depth, tree });
        });
    }

    fn schedule_deepen(&self, delay: Duration) {
        let tx = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Event::Deepen);
        });
    }

    /// A deepening step is due. No-op while another scan is in flight
    /// (at-most-one-concurrent-scan); manual requests go through here too and
    /// are not subject to the automatic ceiling.
    pub fn handle_deepen(&mut self) {
        if self.session != Session::DualPane || self.scan.in_flight {
            return;
        }
        self.scan.depth += 1;
        self.scan.in_flight = true;
        self.dispatch_scan(self.scan.depth);
    }

    /// Apply a finished scan.
    ///
    /// The depth-0 scan always replaces state and selects the first
    /// document. Deeper scans replace state only when they discovered
    /// strictly more documents than currently known, so stale or fruitless
    /// completions degrade to no-ops.
    pub fn handle_scan_complete(&mut self, depth: i32, tree: DocNode) {
        if self.session != Session::DualPane {
            return;
        }
        self.scan.in_flight = false;
        let docs = collect_documents(&tree);

        if depth == 0 {
            self.tree_lines = flatten_tree(&tree);
            self.documents = docs;
            self.tree = tree;
            if !self.documents.is_empty() {
                self.selected_doc = 0;
                self.selected_line =
                    find_line_for_document(0, &self.tree_lines, &self.documents);
                self.load_selected();
            }
            self.schedule_deepen(self.settings.initial_delay);
            return;
        }

        if docs.len() > self.documents.len() {
            self.tree_lines = flatten_tree(&tree);
            self.documents = docs;
            self.tree = tree;
            if self.selected_doc < self.documents.len() {
                self.selected_line = find_line_for_document(
                    self.selected_doc,
                    &self.tree_lines,
                    &self.documents,
                );
                self.adjust_tree_viewport();
            }
        }

        if self.scan.depth < self.settings.depth_ceiling {
            self.schedule_deepen(self.settings.step_delay);
        }
    }

    // ── Content loading & rendering ──────────────────────────────────────────

    /// The path whose content the content pane currently shows.
    pub fn current_doc_path(&self) -> Option<PathBuf> {
        match &self.session {
            Session::DualPane => self.documents.get(self.selected_doc).cloned(),
            Session::Document { path } => Some(path.clone()),
        }
    }

    /// Read and render the selected document off-loop.
    fn load_selected(&mut self) {
        let Some(path) = self.current_doc_path() else {
            return;
        };
        self.content_viewport = 0;
        self.dispatch_load(path);
    }

    fn dispatch_load(&self, path: PathBuf) {
        let tx = self.events.clone();
        let cache = Arc::clone(&self.renderer_cache);
        let theme = self.settings.syntax_theme.clone();
        let width = self.wrap_width();
        let mode = self.view_mode;
        tokio::task::spawn_blocking(move || {
            let (text, lines) = match std::fs::read_to_string(&path) {
                Ok(text) => {
                    let lines = render::render_document(&cache, &theme, &text, width, mode);
                    (text, lines)
                }
                // Read failures become the sole content line, never an abort.
                Err(e) => {
                    let msg = format!("Error loading file: {}", e);
                    let lines = render::verbatim_lines(&msg);
                    (msg, lines)
                }
            };
            let _ = tx.send(Event::ContentReady { path, text, lines });
        });
    }

    /// Re-render the already-loaded content (mode toggle, resize, split
    /// change) at the active wrap width.
    fn rerender_content(&self) {
        let Some(path) = self.current_doc_path() else {
            return;
        };
        if self.current_content.is_empty() && !self.content_loaded {
            return;
        }
        let tx = self.events.clone();
        let cache = Arc::clone(&self.renderer_cache);
        let theme = self.settings.syntax_theme.clone();
        let width = self.wrap_width();
        let mode = self.view_mode;
        let text = self.current_content.clone();
        tokio::task::spawn_blocking(move || {
            let lines = render::render_document(&cache, &theme, &text, width, mode);
            let _ = tx.send(Event::ContentReady { path, text, lines });
        });
    }

    /// Apply a finished load/render, unless the selection moved on while it
    /// was in flight.
    pub fn handle_content_ready(
        &mut self,
        path: PathBuf,
        text: String,
        lines: Vec<Line<'static>>,
    ) {
        if self.current_doc_path().as_deref() != Some(path.as_path()) {
            return;
        }
        self.current_content = text;
        self.content_loaded = true;
        self.rendered_lines = lines;
        self.content_viewport = clamp_viewport(
            self.content_viewport as isize,
            self.rendered_lines.len(),
            self.pane_height(),
        );
    }

    /// Flip raw/rendered and re-render the current document.
    pub fn toggle_view_mode(&mut self) {
        self.view_mode = match self.view_mode {
            ViewMode::Rendered => ViewMode::Raw,
            ViewMode::Raw => ViewMode::Rendered,
        };
        self.rerender_content();
    }

    // ── Focus & selection ────────────────────────────────────────────────────

    pub fn toggle_focus(&mut self) {
        if matches!(self.session, Session::Document { .. }) {
            return;
        }
        self.focus = match self.focus {
            Focus::Tree => Focus::Content,
            Focus::Content => Focus::Tree,
        };
    }

    pub fn focus_tree(&mut self) {
        if self.session == Session::DualPane {
            self.focus = Focus::Tree;
        }
    }

    pub fn focus_content(&mut self) {
        self.focus = Focus::Content;
    }

    /// Confirm the tree selection and move into the content pane.
    pub fn confirm_selection(&mut self) {
        if self.focus == Focus::Tree && self.selected_doc < self.documents.len() {
            self.focus = Focus::Content;
            self.content_viewport = 0;
        }
    }

    fn select_index(&mut self, index: usize) {
        if self.documents.is_empty() {
            return;
        }
        let clamped = index.min(self.documents.len() - 1);
        if clamped == self.selected_doc && self.content_loaded {
            return;
        }
        self.selected_doc = clamped;
        self.selected_line =
            find_line_for_document(clamped, &self.tree_lines, &self.documents);
        self.load_selected();
        self.adjust_tree_viewport();
    }

    pub fn select_next(&mut self) {
        if self.selected_doc + 1 < self.documents.len() {
            self.select_index(self.selected_doc + 1);
        }
    }

    pub fn select_previous(&mut self) {
        if self.selected_doc > 0 {
            self.select_index(self.selected_doc - 1);
        }
    }

    pub fn select_first(&mut self) {
        self.tree_viewport = 0;
        self.select_index(0);
    }

    pub fn select_last(&mut self) {
        if !self.documents.is_empty() {
            self.select_index(self.documents.len() - 1);
        }
    }

    /// Keep the selected display line inside the tree viewport.
    fn adjust_tree_viewport(&mut self) {
        let height = self.pane_height();
        if height == 0 {
            return;
        }
        if self.selected_line < self.tree_viewport {
            self.tree_viewport = self.selected_line;
        } else if self.selected_line >= self.tree_viewport + height {
            self.tree_viewport = self.selected_line - height + 1;
        }
    }

    // ── Scrolling ────────────────────────────────────────────────────────────

    pub fn scroll_content(&mut self, delta: isize) {
        self.content_viewport = clamp_viewport(
            self.content_viewport as isize + delta,
            self.rendered_lines.len(),
            self.pane_height(),
        );
    }

    pub fn scroll_content_half_page(&mut self, down: bool) {
        let half = (self.pane_height() / 2) as isize;
        self.scroll_content(if down { half } else { -half });
    }

    pub fn scroll_content_page(&mut self) {
        self.scroll_content(self.pane_height().saturating_sub(1) as isize);
    }

    pub fn content_home(&mut self) {
        self.content_viewport = 0;
    }

    pub fn content_end(&mut self) {
        self.content_viewport = clamp_viewport(
            isize::MAX,
            self.rendered_lines.len(),
            self.pane_height(),
        );
    }

    pub fn scroll_tree(&mut self, delta: isize) {
        self.tree_viewport = clamp_viewport(
            self.tree_viewport as isize + delta,
            self.tree_lines.len(),
            self.pane_height(),
        );
    }

    // ── Split ratio ──────────────────────────────────────────────────────────

    /// Adjust the tree pane share of the width, clamped to [0.2, 0.5], and
    /// re-render at the resulting wrap width.
    pub fn adjust_split(&mut self, delta: f64) {
        self.split_ratio = (self.split_ratio + delta).clamp(0.2, 0.5);
        self.rerender_content();
    }

    // ── Status line data ─────────────────────────────────────────────────────

    /// Human label for the current scan state, shown in the status bar.
    pub fn scan_status(&self) -> String {
        if self.scan.depth == -1 {
            "Initializing...".to_string()
        } else if self.scan.in_flight {
            "Scanning...".to_string()
        } else if self.scan.depth > 0 {
            format!("Depth {}", self.scan.depth)
        } else {
            String::new()
        }
    }
}
