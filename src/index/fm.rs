use super::rank::WaveletMatrix;

/// 后缀数组行区间 [left, right]（闭区间）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub left: usize,
    pub right: usize,
}

impl Interval {
    pub fn new(left: usize, right: usize) -> Self {
        Self { left, right }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.right - self.left + 1
    }

    #[inline]
    pub fn is_single(&self) -> bool {
        self.left == self.right
    }

    pub fn rows(&self) -> std::ops::RangeInclusive<usize> {
        self.left..=self.right
    }
}

/// 单方向 FM 索引：
/// - BWT 保存在小波矩阵中（rank / access / 区间符号集均为对数复杂度）。
/// - less 表：less[c] = BWT 中字节值严格小于 c 的符号总数。
/// - 正向与反向文本各建一份，反向仅用于标签搜索中的双向扩展。
#[derive(Debug, Clone)]
pub struct FmIndex {
    occ: WaveletMatrix,
    less: Vec<usize>,
}

impl FmIndex {
    pub fn build(bwt: &[u8]) -> Self {
        let occ = WaveletMatrix::build(bwt);
        let counts = occ.symbol_counts();
        let mut less = vec![0usize; 256];
        let mut acc = 0usize;
        for (c, &n) in counts.iter().enumerate() {
            less[c] = acc;
            acc += n;
        }
        Self { occ, less }
    }

    /// 文本（= BWT）长度。
    pub fn len(&self) -> usize {
        self.occ.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occ.is_empty()
    }

    /// 覆盖全部后缀的初始区间。
    pub fn full_interval(&self) -> Interval {
        Interval::new(0, self.len().saturating_sub(1))
    }

    #[inline]
    pub fn less(&self, c: u8) -> usize {
        self.less[c as usize]
    }

    #[inline]
    pub fn char_at(&self, row: usize) -> u8 {
        self.occ.char_at(row)
    }

    /// 区间内 BWT 出现过的不同符号（即可向左扩展的候选字符）。
    /// 单行区间直接读取该行字符。
    pub fn symbols_in(&self, iv: Interval) -> Vec<u8> {
        if iv.is_single() {
            vec![self.char_at(iv.left)]
        } else {
            self.occ.symbols_in_range(iv.left, iv.right)
        }
    }

    /// 以字符 c 向左扩展区间：
    /// left' = less[c] + rank(left - 1, c)，right' = less[c] + rank(right, c) - 1。
    /// 扩展后为空时返回 None。
    #[inline]
    pub fn extend(&self, iv: Interval, c: u8) -> Option<Interval> {
        let base = self.less(c);
        let lo = base + self.occ.occ(c, iv.left);
        let hi = base + self.occ.occ(c, iv.right + 1);
        if lo < hi {
            Some(Interval::new(lo, hi - 1))
        } else {
            None
        }
    }

    /// LF 映射：返回文本中位于 row 对应后缀前一个位置的后缀所在行。
    #[inline]
    pub fn lf(&self, row: usize) -> usize {
        let c = self.char_at(row);
        self.less(c) + self.occ.occ(c, row)
    }

    /// 反向搜索精确匹配（从模式末尾向前扩展）。
    pub fn backward_search(&self, pat: &[u8]) -> Option<Interval> {
        if self.is_empty() {
            return None;
        }
        let mut iv = self.full_interval();
        for &a in pat.iter().rev() {
            iv = self.extend(iv, a)?;
        }
        Some(iv)
    }
}
