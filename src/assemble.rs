//! Document assembly.
//!
//! Concatenates the selected fragments, in stable source order, into the
//! ordered paragraph list the writer serializes. Selection can only thin the
//! sequence, never reorder it.

use crate::extract::Fragment;
use crate::select::SelectionSet;
use serde::Serialize;

/// Ordered sequence of output paragraphs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OutputDocument {
    paragraphs: Vec<String>,
}

impl OutputDocument {
    /// Paragraphs in output order.
    pub fn paragraphs(&self) -> &[String] {
        &self.paragraphs
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    /// Zero paragraphs is a valid outcome (nothing selected), not an error.
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }
}

/// Build the output document from sanitized fragments and a selection.
///
/// Fragments are filtered to those marked included, sorted by
/// `(unit_index, order_in_unit)`, and emitted one paragraph per fragment,
/// text unchanged. Blank fragments are dropped. Sorting here keeps assembly
/// deterministic regardless of the order extraction completed in.
pub fn assemble(fragments: &[Fragment], selection: &SelectionSet) -> OutputDocument {
    let mut selected: Vec<&Fragment> = fragments
        .iter()
        .filter(|f| selection.is_included(f.key()))
        .filter(|f| !f.text.trim().is_empty())
        .collect();
    selected.sort_by_key(|f| f.key());

    OutputDocument {
        paragraphs: selected.iter().map(|f| f.text.clone()).collect(),
    }
}
