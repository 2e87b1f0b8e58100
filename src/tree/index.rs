use indexmap::IndexMap;

/// Separator between segments of an object key.
pub const SEPARATOR: char = '/';

/// Synthetic segment prepended to every key so all paths share one root.
pub const ROOT_SEGMENT: &str = "/";

/// Key of a single entry inside a directory node.
///
/// Directories are keyed by their segment name; leaves by a slot number local
/// to the directory, so files never collide with each other or with
/// subdirectories of the same name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryKey {
    Segment(String),
    Slot(usize),
}

/// Payload stored for a downloadable object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafPayload {
    /// 0-based position of the record in the ingestion sequence.
    pub source_row_index: usize,
    /// The full object key as it appeared in the inventory.
    pub original_key: String,
    /// Final segment of the key, used for display.
    pub name: String,
}

/// A directory level: ordered entries plus the next free leaf slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirNode {
    entries: IndexMap<EntryKey, NodeKind>,
    next_slot: usize,
}

/// What an entry in the index holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Directory(DirNode),
    Leaf(LeafPayload),
}

impl NodeKind {
    pub fn as_directory(&self) -> Option<&DirNode> {
        match self {
            NodeKind::Directory(dir) => Some(dir),
            NodeKind::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&LeafPayload> {
        match self {
            NodeKind::Leaf(leaf) => Some(leaf),
            NodeKind::Directory(_) => None,
        }
    }
}

impl DirNode {
    /// Entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&EntryKey, &NodeKind)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &EntryKey> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Look up a child directory by segment name.
    pub fn child_dir(&self, segment: &str) -> Option<&DirNode> {
        self.entries
            .get(&EntryKey::Segment(segment.to_string()))
            .and_then(NodeKind::as_directory)
    }

    /// Return the child directory for `segment`, creating it if absent.
    /// The flag reports whether a new node was created.
    ///
    /// An existing directory is reused so shared prefixes merge into one node.
    fn child_dir_mut(&mut self, segment: &str) -> (&mut DirNode, bool) {
        let key = EntryKey::Segment(segment.to_string());
        let created = !self.entries.contains_key(&key);
        let entry = self
            .entries
            .entry(key)
            .or_insert_with(|| NodeKind::Directory(DirNode::default()));
        match entry {
            NodeKind::Directory(dir) => (dir, created),
            // Segment keys are only ever created as directories.
            NodeKind::Leaf(_) => unreachable!("segment key bound to a leaf"),
        }
    }

    fn push_leaf(&mut self, payload: LeafPayload) -> usize {
        let slot = self.next_slot;
        self.next_slot += 1;
        self.entries.insert(EntryKey::Slot(slot), NodeKind::Leaf(payload));
        slot
    }
}

/// Split a raw key into its non-empty segments.
///
/// Returns the segments and whether the key names a directory placeholder
/// (trailing separator or no segments at all).
pub fn split_key(key: &str) -> (Vec<&str>, bool) {
    let is_directory = key.is_empty() || key.ends_with(SEPARATOR);
    let segments = key.split(SEPARATOR).filter(|s| !s.is_empty()).collect();
    (segments, is_directory)
}

/// Hierarchical index built from a flat sequence of object keys.
///
/// A trie keyed by path segment. Construction is a single linear pass and
/// sibling order is the order in which entries first arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathIndex {
    root: DirNode,
    records: usize,
    leaves: usize,
    directories: usize,
}

impl Default for PathIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl PathIndex {
    pub fn new() -> Self {
        let mut root = DirNode::default();
        let _ = root.child_dir_mut(ROOT_SEGMENT);
        Self {
            root,
            records: 0,
            leaves: 0,
            directories: 1,
        }
    }

    /// Build an index from keys in record order.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index = Self::new();
        for key in keys {
            index.insert(key.as_ref(), None);
        }
        index
    }

    /// Insert one record.
    ///
    /// Every call consumes one row index. Directory placeholders only create
    /// intermediate nodes; any other key attaches a leaf to its parent
    /// directory. When `payload` is `None` one is generated from the current
    /// row index and the key.
    pub fn insert(&mut self, path: &str, payload: Option<LeafPayload>) {
        let row_index = self.records;
        self.records += 1;

        let (mut segments, is_directory) = split_key(path);
        let leaf_name = if is_directory { None } else { segments.pop() };

        let (mut node, _) = self.root.child_dir_mut(ROOT_SEGMENT);
        for segment in segments {
            let (child, created) = node.child_dir_mut(segment);
            if created {
                self.directories += 1;
            }
            node = child;
        }

        if let Some(name) = leaf_name {
            let payload = payload.unwrap_or_else(|| LeafPayload {
                source_row_index: row_index,
                original_key: path.to_string(),
                name: name.to_string(),
            });
            node.push_leaf(payload);
            self.leaves += 1;
        }
    }

    /// Walk the index one segment at a time, starting with the root segment.
    ///
    /// Returns `None` for prefixes that do not exist rather than failing.
    pub fn get<S: AsRef<str>>(&self, segments: &[S]) -> Option<&NodeKind> {
        let (last, parents) = segments.split_last()?;
        let parent = parents
            .iter()
            .try_fold(&self.root, |dir, segment| dir.child_dir(segment.as_ref()))?;
        parent
            .entries
            .get(&EntryKey::Segment(last.as_ref().to_string()))
    }

    /// Like [`PathIndex::get`] but only yields directories.
    pub fn directory<S: AsRef<str>>(&self, segments: &[S]) -> Option<&DirNode> {
        self.get(segments).and_then(NodeKind::as_directory)
    }

    /// Keys directly under the root segment, in insertion order.
    #[allow(dead_code)]
    pub fn root_child_keys(&self) -> Vec<&EntryKey> {
        self.directory(&[ROOT_SEGMENT])
            .map(|dir| dir.keys().collect())
            .unwrap_or_default()
    }

    /// Number of records ingested, placeholders included.
    pub fn record_count(&self) -> usize {
        self.records
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves
    }

    /// Number of directory nodes, the root included.
    pub fn directory_count(&self) -> usize {
        self.directories
    }
}
