//! Import management: the deduplicated import list of one file.
//!
//! Entries are added speculatively before a rewrite and pruned once the
//! rewritten tree shows which package names are actually referenced.

pub mod errors;
pub mod path;
pub mod render;
pub mod set;
pub mod splice;
pub mod usage;

pub use errors::ImportError;
pub use render::{render_block, render_into};
pub use set::{ImportEntry, ImportSet};
pub use splice::{sync_edits, CGO_PATH};
pub use usage::Usages;

impl ImportSet {
    /// Splice this set into `file` at `target_offset`. See [`render_into`].
    pub fn render(&self, target_offset: usize, file: &crate::ts::SourceFile) -> Result<String, ImportError> {
        render_into(self, target_offset, file)
    }
}
