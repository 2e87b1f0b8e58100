use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Position;
use tokio::sync::mpsc;

use crate::app::{App, MetadataJob};
use crate::components::breadcrumbs;
use crate::components::help::HelpOverlay;
use crate::event::Event;

fn dispatch(job: Option<MetadataJob>, event_tx: &mpsc::UnboundedSender<Event>) {
    if let Some(job) = job {
        job.spawn(event_tx.clone());
    }
}

/// Handle a key event.
pub fn handle_key_event(app: &mut App, key: KeyEvent, event_tx: &mpsc::UnboundedSender<Event>) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    if app.show_help {
        handle_help_key(app, key);
        return;
    }

    let job = match key.code {
        KeyCode::Char('q') => {
            app.quit();
            None
        }
        KeyCode::Char('?') => {
            app.toggle_help();
            None
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.select_next();
            None
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.select_previous();
            None
        }
        KeyCode::Char('g') | KeyCode::Home => {
            app.select_first();
            None
        }
        KeyCode::Char('G') | KeyCode::End => {
            app.select_last();
            None
        }
        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => app.activate_selected(),
        KeyCode::Backspace | KeyCode::Char('h') | KeyCode::Left => app.go_up(),
        KeyCode::Char('~') => app.go_root(),
        KeyCode::Char('r') => app.reload_metadata(),
        KeyCode::Char('y') => {
            let link = app.selection_link();
            app.set_status_message(link);
            None
        }
        KeyCode::Char(c @ '1'..='9') => {
            let crumb = c as usize - '1' as usize;
            app.go_to_crumb(crumb)
        }
        _ => None,
    };
    dispatch(job, event_tx);
}

fn handle_help_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => app.toggle_help(),
        KeyCode::Char('j') | KeyCode::Down => {
            if app.help_scroll + 1 < HelpOverlay::total_lines() {
                app.help_scroll += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.help_scroll = app.help_scroll.saturating_sub(1);
        }
        _ => {}
    }
}

/// Handle a mouse event: clicks on crumbs and rows, wheel scrolling.
pub fn handle_mouse_event(
    app: &mut App,
    mouse: MouseEvent,
    event_tx: &mpsc::UnboundedSender<Event>,
) {
    if app.show_help {
        return;
    }
    let pos = Position::new(mouse.column, mouse.row);
    let job = match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if app.areas.breadcrumbs.contains(pos) {
                let offset = mouse.column - app.areas.breadcrumbs.x;
                breadcrumbs::hit_test(app.navigator.breadcrumb_trail(), offset)
                    .and_then(|crumb| app.go_to_crumb(crumb))
            } else if app.areas.listing.contains(pos) {
                let row = (mouse.row - app.areas.listing.y) as usize + app.scroll_offset;
                if app.select_index(row) {
                    app.activate_selected()
                } else {
                    None
                }
            } else {
                None
            }
        }
        MouseEventKind::ScrollDown => {
            app.select_next();
            None
        }
        MouseEventKind::ScrollUp => {
            app.select_previous();
            None
        }
        _ => None,
    };
    dispatch(job, event_tx);
}
