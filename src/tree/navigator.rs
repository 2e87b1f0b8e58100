use super::index::{EntryKey, LeafPayload, PathIndex, ROOT_SEGMENT, SEPARATOR};

/// Default prefix of the link that opens a leaf object.
pub const DEFAULT_LINK_PREFIX: &str = "/index.html?file=";

/// One step of the current position, from the root downward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    pub segment: String,
    pub position_index: usize,
}

impl Breadcrumb {
    fn root() -> Self {
        Self {
            segment: ROOT_SEGMENT.to_string(),
            position_index: 0,
        }
    }
}

/// A child of the current directory, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Child<'a> {
    /// Directory segment, or the leaf's display name.
    pub name: &'a str,
    /// Present for leaves, absent for directories.
    pub leaf: Option<&'a LeafPayload>,
}

impl Child<'_> {
    pub fn is_directory(&self) -> bool {
        self.leaf.is_none()
    }
}

/// Half-open range of inventory rows, `[row_start, row_end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub row_start: usize,
    pub row_end: usize,
}

impl RowRange {
    pub fn len(&self) -> usize {
        self.row_end.saturating_sub(self.row_start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, row: usize) -> bool {
        row >= self.row_start && row < self.row_end
    }

    /// Position of `row` within rows returned for this range.
    pub fn slot_for(&self, row: usize) -> Option<usize> {
        self.contains(row).then(|| row - self.row_start)
    }
}

/// Compute the single row range covering every leaf among `children`.
///
/// Returns `None` when the listing contains no leaves.
pub fn metadata_request(children: &[Child<'_>]) -> Option<RowRange> {
    let rows = children
        .iter()
        .filter_map(|child| child.leaf.map(|leaf| leaf.source_row_index));
    let (min, max) = rows.fold(None, |acc: Option<(usize, usize)>, row| match acc {
        None => Some((row, row)),
        Some((lo, hi)) => Some((lo.min(row), hi.max(row))),
    })?;
    Some(RowRange {
        row_start: min,
        row_end: max + 1,
    })
}

/// Current position over a [`PathIndex`], expressed as a breadcrumb trail.
#[derive(Debug, Clone)]
pub struct TreeNavigator {
    index: PathIndex,
    breadcrumbs: Vec<Breadcrumb>,
}

impl TreeNavigator {
    /// Create a navigator positioned at `start_path`, or at the root.
    pub fn new(index: PathIndex, start_path: Option<&str>) -> Self {
        let mut navigator = Self {
            index,
            breadcrumbs: vec![Breadcrumb::root()],
        };
        navigator.initialize(start_path);
        navigator
    }

    /// Reset to the root and append each non-empty segment of `start_path`.
    ///
    /// Segments are trusted; they are not checked against the index.
    pub fn initialize(&mut self, start_path: Option<&str>) {
        self.breadcrumbs.clear();
        self.breadcrumbs.push(Breadcrumb::root());
        if let Some(path) = start_path {
            for segment in path.split(SEPARATOR).filter(|s| !s.is_empty()) {
                let position_index = self.breadcrumbs.len();
                self.breadcrumbs.push(Breadcrumb {
                    segment: segment.to_string(),
                    position_index,
                });
            }
        }
    }

    pub fn index(&self) -> &PathIndex {
        &self.index
    }

    fn segments(&self) -> Vec<&str> {
        self.breadcrumbs.iter().map(|b| b.segment.as_str()).collect()
    }

    /// Whether the breadcrumb path resolves to a directory in the index.
    pub fn position_exists(&self) -> bool {
        self.index.directory(&self.segments()).is_some()
    }

    /// Children of the current directory in index order.
    ///
    /// A position that does not exist yields an empty list.
    pub fn current_children(&self) -> Vec<Child<'_>> {
        let Some(dir) = self.index.directory(&self.segments()) else {
            return Vec::new();
        };
        let mut children = Vec::with_capacity(dir.len());
        for (key, node) in dir.entries() {
            let child = match key {
                EntryKey::Slot(_) => node.as_leaf().map(|leaf| Child {
                    name: leaf.name.as_str(),
                    leaf: Some(leaf),
                }),
                EntryKey::Segment(segment) => node.as_directory().map(|_| Child {
                    name: segment.as_str(),
                    leaf: None,
                }),
            };
            children.extend(child);
        }
        children
    }

    /// Move into `segment`. The caller is responsible for naming an existing
    /// child directory.
    pub fn descend(&mut self, segment: &str) {
        let position_index = self.breadcrumbs.len();
        self.breadcrumbs.push(Breadcrumb {
            segment: segment.to_string(),
            position_index,
        });
    }

    /// Truncate the trail to `target_position_index` crumbs.
    ///
    /// No-op when already at the root; the root crumb is never removed.
    pub fn ascend(&mut self, target_position_index: usize) {
        if self.breadcrumbs.len() == 1 {
            return;
        }
        self.breadcrumbs.truncate(target_position_index.max(1));
    }

    /// Move to the parent directory.
    pub fn ascend_one(&mut self) {
        let len = self.breadcrumbs.len();
        self.ascend(len.saturating_sub(1));
    }

    /// Make the crumb at `position_index` the current position.
    pub fn ascend_to_crumb(&mut self, position_index: usize) {
        self.ascend(position_index + 1);
    }

    pub fn is_at_root(&self) -> bool {
        self.breadcrumbs.len() == 1
    }

    pub fn breadcrumb_trail(&self) -> &[Breadcrumb] {
        &self.breadcrumbs
    }

    /// Non-root segments joined by the separator; empty at the root.
    pub fn current_path(&self) -> String {
        self.breadcrumbs[1..]
            .iter()
            .map(|b| b.segment.as_str())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Deep link that reopens the current position.
    pub fn folder_link(&self) -> String {
        format!("?folder={}", self.current_path())
    }

    /// Link that opens a leaf object.
    pub fn download_link(leaf: &LeafPayload, prefix: &str) -> String {
        format!("{}{}", prefix, leaf.original_key.trim_start_matches(SEPARATOR))
    }
}
