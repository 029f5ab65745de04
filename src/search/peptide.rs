use tracing::{debug, trace};

use super::cell::{SearchCell, Trellis};
use super::{collect_hits, ProteinMapping};
use crate::config::MatchingOptions;
use crate::index::builder::BuiltIndex;
use crate::util::amino::{candidates, normalize_query};

/// Maps a peptide to every occurrence, expanding ambiguous residues per the matching policy.
///
/// The peptide is consumed back to front. Every live cell is branched once per candidate
/// residue and cells are never merged: two cells with the same interval can still stand
/// for different resolved sequences.
pub fn map_peptide(index: &BuiltIndex, peptide: &str, options: &MatchingOptions) -> ProteinMapping {
    let mut mapping = ProteinMapping::new();
    let residues = normalize_query(peptide);
    if residues.is_empty() || index.primary.is_empty() {
        return mapping;
    }
    if options.rejects(&residues) {
        debug!(peptide, limit_x = options.limit_x, "peptide rejected: too many X");
        return mapping;
    }

    let fm = &index.primary;
    let mut trellis = Trellis::new();
    let mut live = vec![trellis.push(SearchCell::root(fm.full_interval()))];

    for &residue in residues.iter().rev() {
        let choices = candidates(residue, options.policy);
        let mut next = Vec::with_capacity(live.len() * choices.len());
        for &id in &live {
            let iv = trellis.get(id).interval;
            for &c in &choices {
                if let Some(child) = fm.extend(iv, c) {
                    next.push(trellis.extend(id, child, c, 0.0));
                }
            }
        }
        if next.is_empty() {
            return mapping;
        }
        live = next;
    }
    trace!(peptide, cells = trellis.len(), terminals = live.len(), "peptide trellis solved");

    // 终端节点回溯得到的符号顺序即为肽段的正向顺序
    for id in live {
        let (symbols, _) = trellis.traceback(id);
        let resolved: String = symbols.iter().map(|&b| b as char).collect();
        collect_hits(index, trellis.get(id).interval, mapping.entry(resolved).or_default());
    }
    super::finish(&mut mapping);
    mapping
}
