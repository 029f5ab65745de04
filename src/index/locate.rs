use super::fm::FmIndex;

/// 稀疏采样的后缀数组：仅保留行号为 2^shift 倍数的条目，
/// 其余行通过 LF 映射回退到最近的采样行再补偿步数。
#[derive(Debug, Clone)]
pub struct SampledSuffixArray {
    samples: Vec<u32>,
    shift: u32,
    text_len: usize,
}

impl SampledSuffixArray {
    pub fn from_full(sa: &[u32], shift: u32) -> Self {
        let samples = sa.iter().step_by(1 << shift).copied().collect();
        Self { samples, shift, text_len: sa.len() }
    }

    pub fn stride(&self) -> usize {
        1 << self.shift
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// 求任意行对应的文本偏移。`fm` 必须是与该后缀数组同向（正向）的索引。
    pub fn resolve(&self, fm: &FmIndex, mut row: usize) -> usize {
        let mask = self.stride() - 1;
        let mut steps = 0usize;
        while row & mask != 0 {
            row = fm.lf(row);
            steps += 1;
        }
        (self.samples[row >> self.shift] as usize + steps) % self.text_len
    }
}

/// 蛋白质边界表：boundaries[i] 为第 i 条蛋白在拼接文本中的起始偏移，
/// 最后一项为文本总长（包含哨兵）。
#[derive(Debug, Clone, Default)]
pub struct ProteinTable {
    boundaries: Vec<usize>,
    accessions: Vec<String>,
}

impl ProteinTable {
    pub fn new() -> Self {
        Self { boundaries: vec![0], accessions: Vec::new() }
    }

    /// 登记一条长度为 len 的蛋白，为其后的分隔符（或末尾哨兵）预留一个位置。
    pub fn push(&mut self, accession: String, len: usize) {
        let start = self.boundaries.last().copied().unwrap_or(0);
        self.boundaries.push(start + len + 1);
        self.accessions.push(accession);
    }

    pub fn len(&self) -> usize {
        self.accessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accessions.is_empty()
    }

    pub fn accession(&self, index: usize) -> &str {
        &self.accessions[index]
    }

    /// 将文本偏移映射到 (蛋白序号, 蛋白内偏移)：二分查找不大于 offset 的最大边界。
    /// 落在边界上的偏移属于该蛋白的第一个残基。
    pub fn resolve(&self, offset: usize) -> Option<(usize, usize)> {
        let idx = self.boundaries.partition_point(|&b| b <= offset).checked_sub(1)?;
        if idx >= self.accessions.len() {
            return None;
        }
        Some((idx, offset - self.boundaries[idx]))
    }
}
