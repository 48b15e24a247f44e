use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, Focus, Session};

/// Handle a key event.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),
        KeyCode::Esc => app.quit(),

        KeyCode::Tab => app.toggle_focus(),
        KeyCode::Char('h') | KeyCode::Left => app.focus_tree(),
        KeyCode::Char('l') | KeyCode::Right => app.focus_content(),

        KeyCode::Char('j') | KeyCode::Down => match app.focus {
            Focus::Tree => app.select_next(),
            Focus::Content => app.scroll_content(1),
        },
        KeyCode::Char('k') | KeyCode::Up => match app.focus {
            Focus::Tree => app.select_previous(),
            Focus::Content => app.scroll_content(-1),
        },

        KeyCode::Enter => app.confirm_selection(),

        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_content_half_page(true)
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_content_half_page(false)
        }
        KeyCode::PageDown => app.scroll_content_half_page(true),
        KeyCode::PageUp => app.scroll_content_half_page(false),
        KeyCode::Char(' ') => app.scroll_content_page(),

        KeyCode::Char('g') | KeyCode::Home => match app.focus {
            Focus::Tree => app.select_first(),
            Focus::Content => app.content_home(),
        },
        KeyCode::Char('G') | KeyCode::End => match app.focus {
            Focus::Tree => app.select_last(),
            Focus::Content => app.content_end(),
        },

        KeyCode::Char('r') => app.toggle_view_mode(),

        KeyCode::Char('<') | KeyCode::Char('{') => app.adjust_split(-0.05),
        KeyCode::Char('>') | KeyCode::Char('}') => app.adjust_split(0.05),

        KeyCode::Char('e') => app.handle_deepen(),

        _ => {}
    }
}

/// Handle a mouse event. Wheel scrolling is routed to whichever pane the
/// pointer is over, independent of keyboard focus.
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    let over_tree =
        app.session == Session::DualPane && mouse.column < app.tree_width();
    match mouse.kind {
        MouseEventKind::ScrollDown => {
            if over_tree {
                app.scroll_tree(3);
            } else {
                app.scroll_content(3);
            }
        }
        MouseEventKind::ScrollUp => {
            if over_tree {
                app.scroll_tree(-3);
            } else {
                app.scroll_content(-3);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crossterm::event::{KeyEventKind, KeyEventState, MouseButton};
    use ratatui::text::Line;
    use std::path::PathBuf;
    use tokio::sync::mpsc;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn wheel(kind: MouseEventKind, column: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row: 5,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn test_app() -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new_dual(PathBuf::from("."), false, Settings::default(), tx);
        app.width = 100;
        app.height = 30;
        app.rendered_lines = (0..200).map(|i| Line::from(i.to_string())).collect();
        app
    }

    #[test]
    fn quit_keys() {
        for event in [key(KeyCode::Char('q')), ctrl('c'), key(KeyCode::Esc)] {
            let mut app = test_app();
            handle_key_event(&mut app, event);
            assert!(app.should_quit);
        }
    }

    #[test]
    fn tab_toggles_focus() {
        let mut app = test_app();
        assert_eq!(app.focus, Focus::Tree);
        handle_key_event(&mut app, key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::Content);
        handle_key_event(&mut app, key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::Tree);
    }

    #[test]
    fn directional_focus_moves() {
        let mut app = test_app();
        handle_key_event(&mut app, key(KeyCode::Char('l')));
        assert_eq!(app.focus, Focus::Content);
        handle_key_event(&mut app, key(KeyCode::Char('h')));
        assert_eq!(app.focus, Focus::Tree);
        handle_key_event(&mut app, key(KeyCode::Right));
        assert_eq!(app.focus, Focus::Content);
        handle_key_event(&mut app, key(KeyCode::Left));
        assert_eq!(app.focus, Focus::Tree);
    }

    #[test]
    fn content_scroll_keys() {
        let mut app = test_app();
        app.focus = Focus::Content;
        handle_key_event(&mut app, key(KeyCode::Char('j')));
        assert_eq!(app.content_viewport, 1);
        handle_key_event(&mut app, key(KeyCode::Char('k')));
        assert_eq!(app.content_viewport, 0);
        handle_key_event(&mut app, ctrl('d'));
        assert_eq!(app.content_viewport, app.pane_height() / 2);
        handle_key_event(&mut app, ctrl('u'));
        assert_eq!(app.content_viewport, 0);
        handle_key_event(&mut app, key(KeyCode::Char(' ')));
        assert_eq!(app.content_viewport, app.pane_height() - 1);
        handle_key_event(&mut app, key(KeyCode::Char('G')));
        assert_eq!(app.content_viewport, 200 - app.pane_height());
        handle_key_event(&mut app, key(KeyCode::Char('g')));
        assert_eq!(app.content_viewport, 0);
    }

    #[test]
    fn split_adjustment_clamps() {
        let mut app = test_app();
        for _ in 0..20 {
            handle_key_event(&mut app, key(KeyCode::Char('>')));
        }
        assert!((app.split_ratio - 0.5).abs() < 1e-9);
        for _ in 0..20 {
            handle_key_event(&mut app, key(KeyCode::Char('<')));
        }
        assert!((app.split_ratio - 0.2).abs() < 1e-9);
    }

    #[test]
    fn wheel_routes_by_pointer_column() {
        let mut app = test_app();
        let tree_width = app.tree_width();
        app.tree_lines = (0..50).map(|i| i.to_string()).collect();

        handle_mouse_event(&mut app, wheel(MouseEventKind::ScrollDown, 0));
        assert_eq!(app.tree_viewport, 3);
        assert_eq!(app.content_viewport, 0);

        handle_mouse_event(&mut app, wheel(MouseEventKind::ScrollDown, tree_width + 1));
        assert_eq!(app.content_viewport, 3);

        handle_mouse_event(&mut app, wheel(MouseEventKind::ScrollUp, tree_width + 1));
        assert_eq!(app.content_viewport, 0);
    }

    #[test]
    fn clicks_are_ignored() {
        let mut app = test_app();
        handle_mouse_event(
            &mut app,
            wheel(MouseEventKind::Down(MouseButton::Left), 10),
        );
        assert_eq!(app.tree_viewport, 0);
        assert_eq!(app.content_viewport, 0);
    }

    #[test]
    fn raw_toggle_key() {
        use crate::app::ViewMode;
        let mut app = test_app();
        handle_key_event(&mut app, key(KeyCode::Char('r')));
        assert_eq!(app.view_mode, ViewMode::Raw);
    }
}
