use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::Style,
    widgets::{Block, Borders},
    Frame,
};

use crate::app::{App, MetadataState};
use crate::components::breadcrumbs::BreadcrumbBar;
use crate::components::help::HelpOverlay;
use crate::components::listing::ListingWidget;
use crate::components::status_bar::StatusBarWidget;

/// Render the application UI.
pub fn render(app: &mut App, frame: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let listing_block = Block::default()
        .title(format!(
            " {} · {} objects ",
            app.source_label,
            app.navigator.index().leaf_count()
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border_fg))
        .style(Style::default().bg(app.theme.tree_bg).fg(app.theme.tree_fg));

    // Mouse hit-testing needs the areas from this frame.
    app.areas.breadcrumbs = chunks[0];
    app.areas.listing = listing_block.inner(chunks[1]);
    app.update_scroll(app.areas.listing.height as usize);
    app.clear_expired_status();

    let app = &*app;
    let children = app.children();

    frame.render_widget(
        BreadcrumbBar::new(app.navigator.breadcrumb_trail(), &app.theme),
        chunks[0],
    );

    let listing = ListingWidget::new(&children, &app.metadata, &app.metadata_state, &app.theme)
        .selection(app.selected_index, app.scroll_offset)
        .block(listing_block);
    frame.render_widget(listing, chunks[1]);

    let link = app.selection_link();
    let dirs = children.iter().filter(|c| c.is_directory()).count();
    let info = folder_info(dirs, children.len() - dirs, &app.metadata_state);
    let mut status_bar = StatusBarWidget::new(&link, &info, &app.theme);
    if let Some(msg) = &app.status_message {
        status_bar = status_bar.status_message(&msg.text, msg.is_error);
    }
    frame.render_widget(status_bar, chunks[2]);

    if app.show_help {
        frame.render_widget(HelpOverlay::new(&app.theme, app.help_scroll), frame.area());
    }
}

/// Short summary of the current folder for the status bar.
fn folder_info(dirs: usize, files: usize, state: &MetadataState) -> String {
    let counts = format!("{} dirs · {} files", dirs, files);
    match state {
        MetadataState::Pending(range) => format!("{} · loading {} rows", counts, range.len()),
        MetadataState::Failed(_) => format!("{} · metadata unavailable", counts),
        MetadataState::Idle | MetadataState::Loaded => counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::setup_app;
    use crate::tree::navigator::RowRange;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn folder_info_reports_pending_reads() {
        let range = RowRange {
            row_start: 2,
            row_end: 9,
        };
        assert_eq!(
            folder_info(1, 2, &MetadataState::Pending(range)),
            "1 dirs · 2 files · loading 7 rows"
        );
        assert_eq!(folder_info(0, 0, &MetadataState::Idle), "0 dirs · 0 files");
    }

    #[test]
    fn render_records_screen_areas() {
        let mut app = setup_app(None, false);
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        assert_eq!(app.areas.breadcrumbs.height, 1);
        assert_eq!(app.areas.listing.y, 2);
        assert_eq!(app.areas.listing.height, 12 - 2 - 2);
    }

    #[test]
    fn render_with_help_does_not_panic() {
        let mut app = setup_app(None, false);
        app.toggle_help();
        let mut terminal = Terminal::new(TestBackend::new(40, 10)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
    }
}
