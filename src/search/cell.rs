use crate::index::fm::Interval;

pub type CellId = usize;

/// One trellis node: a suffix-array interval reached by appending `symbol` to the
/// parent's match. Cells are append-only; the arena owns them and children refer to
/// parents by id.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCell {
    pub interval: Interval,
    pub symbol: u8,
    pub parent: Option<CellId>,
    /// Mass accumulated inside the currently open gap.
    pub mass: f64,
    /// Residues matched since the root.
    pub length: usize,
    /// Index of the seed this root was created from, if any.
    pub seed: Option<usize>,
}

impl SearchCell {
    pub fn root(interval: Interval) -> Self {
        Self { interval, symbol: 0, parent: None, mass: 0.0, length: 0, seed: None }
    }

    pub fn seeded(interval: Interval, seed: usize) -> Self {
        Self { seed: Some(seed), ..Self::root(interval) }
    }
}

/// Arena holding every cell created during one query.
#[derive(Debug, Default)]
pub struct Trellis {
    cells: Vec<SearchCell>,
}

impl Trellis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn push(&mut self, cell: SearchCell) -> CellId {
        self.cells.push(cell);
        self.cells.len() - 1
    }

    /// Appends a child of `parent` reached through `symbol`.
    pub fn extend(&mut self, parent: CellId, interval: Interval, symbol: u8, mass: f64) -> CellId {
        let length = self.cells[parent].length + 1;
        self.push(SearchCell { interval, symbol, parent: Some(parent), mass, length, seed: None })
    }

    pub fn get(&self, id: CellId) -> &SearchCell {
        &self.cells[id]
    }

    /// Symbols on the path from `id` back to its root, in that order, plus the root id.
    pub fn traceback(&self, id: CellId) -> (Vec<u8>, CellId) {
        let mut symbols = Vec::with_capacity(self.cells[id].length);
        let mut current = id;
        while let Some(parent) = self.cells[current].parent {
            symbols.push(self.cells[current].symbol);
            current = parent;
        }
        (symbols, current)
    }
}
