use tracing::trace;

use super::cache::{CacheKey, SeedCell, TagCache};
use super::cell::{CellId, SearchCell, Trellis};
use super::{collect_hits, finish, ProteinMapping};
use crate::config::{MatchingOptions, MatchingPolicy};
use crate::error::{IndexError, Result};
use crate::index::builder::BuiltIndex;
use crate::index::fm::FmIndex;
use crate::tag::TagElement;
use crate::util::amino::{candidates, normalize_query, MassTable, MASS_ROUNDING};

/// Tag element in search orientation.
#[derive(Debug, Clone, PartialEq)]
enum Part {
    Literal(Vec<u8>),
    Gap(f64),
}

impl Part {
    fn from_element(element: &TagElement) -> Self {
        match element {
            TagElement::Sequence(s) => Part::Literal(normalize_query(s)),
            TagElement::MassGap(m) => Part::Gap(*m),
        }
    }

    fn reversed(&self) -> Self {
        match self {
            Part::Literal(s) => Part::Literal(s.iter().rev().copied().collect()),
            Part::Gap(m) => Part::Gap(*m),
        }
    }
}

/// One trellis column: a literal residue with its admissible symbols, or a mass gap.
#[derive(Debug, Clone, PartialEq)]
enum Step {
    Residues(Vec<u8>),
    Gap(f64),
}

fn expand(parts: &[Part], policy: MatchingPolicy) -> Vec<Step> {
    let mut steps = Vec::new();
    for part in parts {
        match part {
            Part::Literal(s) => steps.extend(s.iter().map(|&r| Step::Residues(candidates(r, policy)))),
            Part::Gap(m) => steps.push(Step::Gap(*m)),
        }
    }
    steps
}

/// Upper bound on the residues any gap of `parts` can absorb beyond its first.
fn max_insertions(parts: &[Part], min_mass: f64) -> usize {
    parts
        .iter()
        .map(|p| match p {
            Part::Gap(m) => (m / min_mass).ceil() as usize,
            Part::Literal(_) => 0,
        })
        .sum()
}

/// Longest literal, earliest on ties; 0 when the tag has no literal.
fn pivot(parts: &[Part]) -> usize {
    let mut best: Option<(usize, usize)> = None;
    for (i, part) in parts.iter().enumerate() {
        if let Part::Literal(s) = part {
            if best.map_or(true, |(_, len)| s.len() > len) {
                best = Some((i, s.len()));
            }
        }
    }
    best.map_or(0, |(i, _)| i)
}

/// gap-literal-gap with the lighter gap in front: search the tag from its other end.
fn is_turned(tag: &[TagElement]) -> bool {
    match tag {
        [TagElement::MassGap(lead), TagElement::Sequence(_), TagElement::MassGap(trail)] => lead < trail,
        _ => false,
    }
}

fn cache_key(tail: &[Part], turned: bool, policy: MatchingPolicy, tolerance: f64) -> Option<CacheKey> {
    match tail {
        [Part::Literal(sequence), Part::Gap(mass)] => Some(CacheKey {
            sequence: sequence.clone(),
            mass: *mass,
            turned,
            policy,
            tolerance,
        }),
        _ => None,
    }
}

/// Mass-bounded trellis over one FM direction.
struct GapSearch<'a> {
    fm: &'a FmIndex,
    masses: &'a MassTable,
    tolerance: f64,
}

impl GapSearch<'_> {
    /// Fills the (insertions x steps) matrix from `roots` and returns the cells of the last column.
    ///
    /// A gap hypothesis stays in its column one row further down while its mass is below
    /// `target - tolerance`, moves to the next column once within tolerance and is dropped
    /// above `target + tolerance`. Both bounds are widened by [`MASS_ROUNDING`].
    fn solve(&self, trellis: &mut Trellis, roots: Vec<CellId>, steps: &[Step], max_insertions: usize) -> Vec<CellId> {
        let window = self.tolerance + MASS_ROUNDING;
        let width = steps.len() + 1;
        let mut matrix: Vec<Vec<Vec<CellId>>> = vec![vec![Vec::new(); width]; max_insertions + 1];
        matrix[0][0] = roots;

        for i in 0..=max_insertions {
            let mut next_row = false;
            for (j, step) in steps.iter().enumerate() {
                let cells = std::mem::take(&mut matrix[i][j]);
                for id in cells {
                    let (iv, mass) = {
                        let cell = trellis.get(id);
                        (cell.interval, cell.mass)
                    };
                    match step {
                        Step::Residues(choices) => {
                            for &c in choices {
                                if let Some(child) = self.fm.extend(iv, c) {
                                    matrix[i][j + 1].push(trellis.extend(id, child, c, 0.0));
                                }
                            }
                        }
                        Step::Gap(target) => {
                            for c in self.fm.symbols_in(iv) {
                                // 分隔符、哨兵与无质量的残基不能填补缺口
                                let Some(residue_mass) = self.masses.get(c) else { continue };
                                let total = mass + residue_mass;
                                if total > target + window {
                                    continue;
                                }
                                let Some(child) = self.fm.extend(iv, c) else { continue };
                                if (target - total).abs() <= window {
                                    matrix[i][j + 1].push(trellis.extend(id, child, c, 0.0));
                                } else if i < max_insertions {
                                    matrix[i + 1][j].push(trellis.extend(id, child, c, total));
                                    next_row = true;
                                }
                            }
                        }
                    }
                }
            }
            if !next_row {
                break;
            }
        }

        matrix.into_iter().filter_map(|mut row| row.pop()).flatten().collect()
    }
}

/// Searches the pivot and everything after it in `first`, then replays each match into
/// `second` so the remaining elements can be searched from there.
fn search_tail(
    first: &FmIndex,
    second: &FmIndex,
    masses: &MassTable,
    tolerance: f64,
    min_mass: f64,
    tail: &[Part],
    policy: MatchingPolicy,
) -> Vec<SeedCell> {
    let search = GapSearch { fm: first, masses, tolerance };
    let mut trellis = Trellis::new();
    let root = trellis.push(SearchCell::root(first.full_interval()));
    let steps = expand(tail, policy);
    let terminals = search.solve(&mut trellis, vec![root], &steps, max_insertions(tail, min_mass));
    trace!(cells = trellis.len(), terminals = terminals.len(), "tail trellis solved");

    terminals
        .into_iter()
        .filter_map(|id| {
            let (mut fragment, _) = trellis.traceback(id);
            fragment.reverse();
            let interval = second.backward_search(&fragment)?;
            Some(SeedCell { interval, fragment })
        })
        .collect()
}

/// Maps a sequence tag to every peptide whose residues fill its gaps within `tolerance`.
pub fn map_tag(
    index: &BuiltIndex,
    masses: &MassTable,
    cache: &TagCache,
    tag: &[TagElement],
    options: &MatchingOptions,
    tolerance: f64,
) -> Result<ProteinMapping> {
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(IndexError::InvalidTolerance(tolerance));
    }
    for element in tag {
        element.validate()?;
    }
    let reversed = index.reversed.as_ref().ok_or(IndexError::MissingReverseIndex)?;
    let min_mass = masses.min_mass().ok_or(IndexError::EmptyMassTable)?;

    let mut mapping = ProteinMapping::new();
    if tag.is_empty() || index.primary.is_empty() {
        return Ok(mapping);
    }

    // 非 turned：先在反向索引上向右扩展，再回到正向索引向左扩展；turned 时两者对调
    let turned = is_turned(tag);
    let mut parts: Vec<Part> = tag.iter().map(Part::from_element).collect();
    let (first, second) = if turned {
        parts = parts.iter().rev().map(Part::reversed).collect();
        (&index.primary, reversed)
    } else {
        (reversed, &index.primary)
    };

    let split = pivot(&parts);
    let tail = &parts[split..];
    let head: Vec<Part> = parts[..split].iter().rev().map(Part::reversed).collect();

    let key = cache_key(tail, turned, options.policy, tolerance);
    let seeds = match key.as_ref().and_then(|k| cache.get(k)) {
        Some(seeds) => seeds,
        None => {
            let seeds = search_tail(first, second, masses, tolerance, min_mass, tail, options.policy);
            if let Some(key) = key {
                cache.insert(key, &seeds);
            }
            seeds
        }
    };
    if seeds.is_empty() {
        return Ok(mapping);
    }

    let search = GapSearch { fm: second, masses, tolerance };
    let mut trellis = Trellis::new();
    let roots = seeds
        .iter()
        .enumerate()
        .map(|(k, seed)| trellis.push(SearchCell::seeded(seed.interval, k)))
        .collect();
    let steps = expand(&head, options.policy);
    let terminals = search.solve(&mut trellis, roots, &steps, max_insertions(&head, min_mass));
    trace!(seeds = seeds.len(), cells = trellis.len(), terminals = terminals.len(), turned, "head trellis solved");

    for id in terminals {
        let (mut peptide, root) = trellis.traceback(id);
        let Some(seed) = trellis.get(root).seed.and_then(|k| seeds.get(k)) else { continue };
        peptide.extend_from_slice(&seed.fragment);

        let interval = if turned {
            peptide.reverse();
            match first.backward_search(&peptide) {
                Some(iv) => iv,
                None => continue,
            }
        } else {
            trellis.get(id).interval
        };

        let resolved: String = peptide.iter().map(|&b| b as char).collect();
        collect_hits(index, interval, mapping.entry(resolved).or_default());
    }
    finish(&mut mapping);
    Ok(mapping)
}
