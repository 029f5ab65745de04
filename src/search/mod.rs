//! Backward-search engine over the built index.

pub mod cache;
pub mod cell;
pub mod peptide;
pub mod tag;

use std::collections::HashMap;

use crate::index::builder::BuiltIndex;
use crate::index::fm::Interval;

/// Resolved peptide -> accession -> 0-based offsets within that protein.
pub type ProteinMapping = HashMap<String, HashMap<String, Vec<usize>>>;

/// Resolves every row of `iv` and groups the offsets by accession.
pub(crate) fn collect_hits(index: &BuiltIndex, iv: Interval, hits: &mut HashMap<String, Vec<usize>>) {
    for (protein, offset) in index.locate_all(iv) {
        let accession = index.proteins.accession(protein);
        match hits.get_mut(accession) {
            Some(offsets) => offsets.push(offset),
            None => {
                hits.insert(accession.to_string(), vec![offset]);
            }
        }
    }
}

/// Sorts and de-duplicates offsets; drops peptides that resolved to no protein.
pub(crate) fn finish(mapping: &mut ProteinMapping) {
    mapping.retain(|_, per_protein| {
        for offsets in per_protein.values_mut() {
            offsets.sort_unstable();
            offsets.dedup();
        }
        !per_protein.is_empty()
    });
}
