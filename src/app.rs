use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use ratatui::layout::Rect;
use tokio::sync::mpsc;

use crate::event::{Event, MetadataUpdate};
use crate::inventory::{self, InventoryReader, ObjectRow};
use crate::theme::ThemeColors;
use crate::tree::index::LeafPayload;
use crate::tree::navigator::{metadata_request, Child, RowRange, TreeNavigator};

/// How long a status message stays on screen.
const STATUS_TTL_SECS: u64 = 3;

/// State of the metadata read for the current folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataState {
    /// Nothing requested (no files here, or reads disabled).
    Idle,
    Pending(RowRange),
    Loaded,
    Failed(String),
}

/// A transient message in the status bar.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    pub created: Instant,
}

/// A metadata read to run for a given navigation generation.
pub struct MetadataJob {
    pub generation: u64,
    pub range: RowRange,
    reader: Arc<dyn InventoryReader>,
}

impl MetadataJob {
    /// Run the read in the background and report back on `tx`.
    pub fn spawn(self, tx: mpsc::UnboundedSender<Event>) {
        tokio::spawn(async move {
            let result = inventory::read_rows_async(self.reader, self.range)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(Event::MetadataLoaded(MetadataUpdate {
                generation: self.generation,
                range: self.range,
                result,
            }));
        });
    }
}

/// Screen regions recorded at render time, used for mouse hit-testing.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScreenAreas {
    pub breadcrumbs: Rect,
    pub listing: Rect,
}

/// Main application state.
pub struct App {
    pub navigator: TreeNavigator,
    reader: Option<Arc<dyn InventoryReader>>,
    pub source_label: String,
    pub link_prefix: String,
    pub theme: ThemeColors,
    pub selected_index: usize,
    pub scroll_offset: usize,
    /// Metadata for the current folder, keyed by source row index.
    pub metadata: HashMap<usize, ObjectRow>,
    pub metadata_state: MetadataState,
    /// Bumped on every navigation; reads from older generations are dropped.
    generation: u64,
    pub status_message: Option<StatusMessage>,
    pub show_help: bool,
    pub help_scroll: usize,
    pub areas: ScreenAreas,
    pub should_quit: bool,
}

impl App {
    /// Create the app. `reader` is `None` when metadata reads are disabled.
    pub fn new(
        navigator: TreeNavigator,
        reader: Option<Arc<dyn InventoryReader>>,
        source_label: String,
        link_prefix: String,
        theme: ThemeColors,
    ) -> Self {
        Self {
            navigator,
            reader,
            source_label,
            link_prefix,
            theme,
            selected_index: 0,
            scroll_offset: 0,
            metadata: HashMap::new(),
            metadata_state: MetadataState::Idle,
            generation: 0,
            status_message: None,
            show_help: false,
            help_scroll: 0,
            areas: ScreenAreas::default(),
            should_quit: false,
        }
    }

    /// Children of the current folder.
    pub fn children(&self) -> Vec<Child<'_>> {
        self.navigator.current_children()
    }

    pub fn selected_child(&self) -> Option<Child<'_>> {
        self.children().into_iter().nth(self.selected_index)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Reset per-folder state after the position changed.
    ///
    /// Returns the metadata read to issue for the new folder, if any.
    pub fn navigated(&mut self) -> Option<MetadataJob> {
        self.generation += 1;
        self.selected_index = 0;
        self.scroll_offset = 0;
        self.metadata.clear();
        self.metadata_state = MetadataState::Idle;

        let path = self.navigator.current_path();
        tracing::debug!(path = %path, generation = self.generation, "navigated");
        if !self.navigator.position_exists() {
            tracing::warn!(path = %path, "folder not found in inventory");
            self.set_error(format!("Folder not found: {}", path));
            return None;
        }

        let reader = self.reader.clone()?;
        let range = metadata_request(&self.children())?;
        self.metadata_state = MetadataState::Pending(range);
        Some(MetadataJob {
            generation: self.generation,
            range,
            reader,
        })
    }

    /// Apply a finished metadata read, ignoring reads for folders the user
    /// has already left.
    pub fn handle_metadata(&mut self, update: MetadataUpdate) {
        if update.generation != self.generation() {
            tracing::debug!(
                stale = update.generation,
                current = self.generation(),
                "dropping stale metadata read"
            );
            return;
        }
        let rows = match update.result {
            Ok(rows) => rows,
            Err(message) => {
                tracing::warn!(error = %message, "metadata read failed");
                self.metadata_state = MetadataState::Failed(message.clone());
                self.set_error(format!("Metadata unavailable: {}", message));
                return;
            }
        };

        let leaves: Vec<LeafPayload> = self
            .children()
            .into_iter()
            .filter_map(|c| c.leaf.cloned())
            .collect();
        for leaf in leaves {
            if let Some(row) =
                inventory::match_row(&rows, update.range, leaf.source_row_index, &leaf.original_key)
            {
                self.metadata.insert(leaf.source_row_index, row.clone());
            }
        }
        tracing::debug!(
            rows = rows.len(),
            matched = self.metadata.len(),
            "metadata applied"
        );
        self.metadata_state = MetadataState::Loaded;
    }

    /// Re-issue the metadata read for the current folder.
    pub fn reload_metadata(&mut self) -> Option<MetadataJob> {
        let selected = self.selected_index;
        let job = self.navigated();
        self.selected_index = selected.min(self.children().len().saturating_sub(1));
        job
    }

    /// Open the selected entry: descend into a folder, or show a file's link.
    pub fn activate_selected(&mut self) -> Option<MetadataJob> {
        let child = self.selected_child()?;
        match child.leaf {
            None => {
                let segment = child.name.to_string();
                self.navigator.descend(&segment);
                self.navigated()
            }
            Some(leaf) => {
                let link = TreeNavigator::download_link(leaf, &self.link_prefix);
                tracing::info!(key = %leaf.original_key, link = %link, "opened file");
                self.set_status_message(link);
                None
            }
        }
    }

    /// Go to the parent folder.
    pub fn go_up(&mut self) -> Option<MetadataJob> {
        if self.navigator.is_at_root() {
            return None;
        }
        // Re-select the folder we came from.
        let from = self
            .navigator
            .breadcrumb_trail()
            .last()
            .map(|b| b.segment.clone());
        self.navigator.ascend_one();
        let job = self.navigated();
        if let Some(from) = from {
            if let Some(idx) = self
                .children()
                .iter()
                .position(|c| c.is_directory() && c.name == from)
            {
                self.selected_index = idx;
            }
        }
        job
    }

    /// Jump to the breadcrumb at `position_index`.
    pub fn go_to_crumb(&mut self, position_index: usize) -> Option<MetadataJob> {
        let trail_len = self.navigator.breadcrumb_trail().len();
        if position_index + 1 >= trail_len {
            return None;
        }
        self.navigator.ascend_to_crumb(position_index);
        self.navigated()
    }

    pub fn go_root(&mut self) -> Option<MetadataJob> {
        self.go_to_crumb(0)
    }

    /// Link for the current selection: the file link, or the folder deep link.
    pub fn selection_link(&self) -> String {
        match self.selected_child() {
            Some(Child {
                leaf: Some(leaf), ..
            }) => TreeNavigator::download_link(leaf, &self.link_prefix),
            Some(child) => {
                let path = self.navigator.current_path();
                if path.is_empty() {
                    format!("?folder={}", child.name)
                } else {
                    format!("?folder={}/{}", path, child.name)
                }
            }
            None => self.navigator.folder_link(),
        }
    }

    /// Move selection down by one item.
    pub fn select_next(&mut self) {
        let len = self.children().len();
        if len > 0 && self.selected_index < len - 1 {
            self.selected_index += 1;
        }
    }

    /// Move selection up by one item.
    pub fn select_previous(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }

    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    pub fn select_last(&mut self) {
        let len = self.children().len();
        if len > 0 {
            self.selected_index = len - 1;
        }
    }

    /// Select the row at `index` if it exists. Returns whether it did.
    pub fn select_index(&mut self, index: usize) -> bool {
        if index < self.children().len() {
            self.selected_index = index;
            true
        } else {
            false
        }
    }

    /// Update the scroll offset to ensure the selected item is visible.
    pub fn update_scroll(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.selected_index < self.scroll_offset {
            self.scroll_offset = self.selected_index;
        } else if self.selected_index >= self.scroll_offset + visible_height {
            self.scroll_offset = self.selected_index - visible_height + 1;
        }
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        self.help_scroll = 0;
    }

    /// Set a status message with current timestamp.
    pub fn set_status_message(&mut self, msg: String) {
        self.status_message = Some(StatusMessage {
            text: msg,
            is_error: false,
            created: Instant::now(),
        });
    }

    pub fn set_error(&mut self, msg: String) {
        self.status_message = Some(StatusMessage {
            text: msg,
            is_error: true,
            created: Instant::now(),
        });
    }

    /// Clear the status message once it has been displayed long enough.
    pub fn clear_expired_status(&mut self) {
        if let Some(ref status) = self.status_message {
            if status.created.elapsed().as_secs() > STATUS_TTL_SECS {
                self.status_message = None;
            }
        }
    }

    /// Quit the application.
    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::Result;
    use crate::theme;
    use crate::tree::index::PathIndex;

    pub(crate) const KEYS: &[&str] = &[
        "/a/b/file1.txt",
        "/a/b/",
        "/a/c/file2.txt",
        "/a/c/file3.txt",
        "/top.txt",
    ];

    /// Reader serving one row per key, with size equal to the row index.
    pub(crate) struct KeyReader(pub Vec<String>);

    impl InventoryReader for KeyReader {
        fn read_keys(&self) -> Result<Vec<String>> {
            Ok(self.0.clone())
        }

        fn read_rows(&self, range: RowRange) -> Result<Vec<ObjectRow>> {
            Ok((range.row_start..range.row_end.min(self.0.len()))
                .map(|i| ObjectRow {
                    key: self.0[i].clone(),
                    size: Some(i as u64 * 100),
                    last_modified: None,
                })
                .collect())
        }
    }

    pub(crate) fn setup_app(start: Option<&str>, with_reader: bool) -> App {
        let keys: Vec<String> = KEYS.iter().map(|k| k.to_string()).collect();
        let navigator = TreeNavigator::new(PathIndex::from_keys(&keys), start);
        let reader: Option<Arc<dyn InventoryReader>> = if with_reader {
            Some(Arc::new(KeyReader(keys)))
        } else {
            None
        };
        App::new(
            navigator,
            reader,
            "test.parquet".to_string(),
            "/index.html?file=".to_string(),
            theme::dark_theme(),
        )
    }

    fn complete(app: &mut App, job: &MetadataJob) {
        let rows = job.reader.read_rows(job.range).map_err(|e| e.to_string());
        app.handle_metadata(MetadataUpdate {
            generation: job.generation,
            range: job.range,
            result: rows,
        });
    }

    #[test]
    fn root_listing_interleaves_in_record_order() {
        let app = setup_app(None, true);
        let names: Vec<_> = app.children().iter().map(|c| c.name.to_string()).collect();
        assert_eq!(names, vec!["a", "top.txt"]);
    }

    #[test]
    fn activate_directory_descends_and_requests_metadata() {
        let mut app = setup_app(None, true);
        assert!(app.activate_selected().is_none()); // "a" has no files
        assert_eq!(app.navigator.current_path(), "a");
        app.select_next(); // c
        let job = app.activate_selected().expect("c has files");
        assert_eq!(
            job.range,
            RowRange {
                row_start: 2,
                row_end: 4
            }
        );
        assert_eq!(app.metadata_state, MetadataState::Pending(job.range));
        complete(&mut app, &job);
        assert_eq!(app.metadata_state, MetadataState::Loaded);
        assert_eq!(app.metadata.get(&3).and_then(|r| r.size), Some(300));
    }

    #[test]
    fn stale_metadata_is_dropped() {
        let mut app = setup_app(Some("a/c"), true);
        let job = app.reload_metadata().unwrap();
        app.go_up();
        complete(&mut app, &job);
        assert!(app.metadata.is_empty());
        assert_eq!(app.metadata_state, MetadataState::Idle);
    }

    #[test]
    fn failed_metadata_sets_error() {
        let mut app = setup_app(Some("a/b"), true);
        let job = app.reload_metadata().unwrap();
        app.handle_metadata(MetadataUpdate {
            generation: job.generation,
            range: job.range,
            result: Err("boom".to_string()),
        });
        assert_eq!(app.metadata_state, MetadataState::Failed("boom".to_string()));
        assert!(app.status_message.as_ref().unwrap().is_error);
    }

    #[test]
    fn no_reader_means_no_job() {
        let mut app = setup_app(Some("a/c"), false);
        assert!(app.reload_metadata().is_none());
        assert_eq!(app.metadata_state, MetadataState::Idle);
    }

    #[test]
    fn activate_leaf_shows_link() {
        let mut app = setup_app(Some("a/b"), true);
        assert!(app.activate_selected().is_none());
        let status = app.status_message.as_ref().unwrap();
        assert_eq!(status.text, "/index.html?file=a/b/file1.txt");
        assert!(!status.is_error);
        assert_eq!(app.navigator.current_path(), "a/b");
    }

    #[test]
    fn go_up_reselects_previous_folder() {
        let mut app = setup_app(Some("a/c"), true);
        app.go_up();
        assert_eq!(app.navigator.current_path(), "a");
        assert_eq!(app.selected_child().unwrap().name, "c");
    }

    #[test]
    fn go_up_at_root_is_noop() {
        let mut app = setup_app(None, true);
        let generation = app.generation();
        assert!(app.go_up().is_none());
        assert_eq!(app.generation(), generation);
    }

    #[test]
    fn go_to_crumb_and_root() {
        let mut app = setup_app(Some("a/c"), true);
        app.go_to_crumb(1);
        assert_eq!(app.navigator.current_path(), "a");
        // Clicking the current crumb does nothing.
        let generation = app.generation();
        assert!(app.go_to_crumb(1).is_none());
        assert_eq!(app.generation(), generation);
        app.go_root();
        assert!(app.navigator.is_at_root());
    }

    #[test]
    fn missing_deep_link_reports_error() {
        let mut app = setup_app(Some("nope/here"), true);
        assert!(app.navigated().is_none());
        assert!(app.children().is_empty());
        let status = app.status_message.as_ref().unwrap();
        assert!(status.is_error);
        assert!(status.text.contains("nope/here"));
    }

    #[test]
    fn selection_link_for_folder_and_file() {
        let mut app = setup_app(None, true);
        assert_eq!(app.selection_link(), "?folder=a");
        app.select_last();
        assert_eq!(app.selection_link(), "/index.html?file=top.txt");
    }

    #[test]
    fn selection_clamps() {
        let mut app = setup_app(None, true);
        app.select_previous();
        assert_eq!(app.selected_index, 0);
        app.select_last();
        app.select_next();
        assert_eq!(app.selected_index, 1);
        assert!(!app.select_index(7));
        assert!(app.select_index(0));
    }

    #[test]
    fn update_scroll_keeps_selection_visible() {
        let mut app = setup_app(None, true);
        app.selected_index = 1;
        app.update_scroll(1);
        assert_eq!(app.scroll_offset, 1);
        app.selected_index = 0;
        app.update_scroll(1);
        assert_eq!(app.scroll_offset, 0);
    }

    #[test]
    fn clear_expired_status_removes_old() {
        let mut app = setup_app(None, true);
        app.set_status_message("fresh".to_string());
        app.clear_expired_status();
        assert!(app.status_message.is_some());
        app.status_message.as_mut().unwrap().created =
            Instant::now() - std::time::Duration::from_secs(5);
        app.clear_expired_status();
        assert!(app.status_message.is_none());
    }
}
