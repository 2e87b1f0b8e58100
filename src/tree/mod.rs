//! Path-to-tree indexing and navigation over a flat list of object keys.

pub mod index;
pub mod navigator;
