//! BWT 上的秩结构：带两级索引的位向量 + 字节字母表上的小波矩阵。
//!
//! - `occ` / `char_at` 均为 O(log σ)，σ 由最大符号的位宽决定（蛋白质文本为 7 层）。
//! - `symbols_in_range` 枚举区间内出现过的不同符号，代价与结果数成正比。

/// 超级块大小（bit），必须是 64 的倍数。
const SUPERBLOCK_BITS: usize = 512;
const WORDS_PER_SUPER: usize = SUPERBLOCK_BITS / 64;

/// 支持 O(1) rank 的位向量。
#[derive(Debug, Clone)]
pub struct RankBitVec {
    words: Vec<u64>,
    /// 每个超级块起点之前的 1 的累计个数
    supers: Vec<u32>,
    len: usize,
}

impl RankBitVec {
    pub fn from_bits(bits: impl ExactSizeIterator<Item = bool>) -> Self {
        let len = bits.len();
        let mut words = vec![0u64; (len + 63) / 64];
        for (i, b) in bits.enumerate() {
            if b {
                words[i / 64] |= 1u64 << (i % 64);
            }
        }

        let mut supers = Vec::with_capacity(words.len() / WORDS_PER_SUPER + 1);
        let mut acc = 0u32;
        for (w, word) in words.iter().enumerate() {
            if w % WORDS_PER_SUPER == 0 {
                supers.push(acc);
            }
            acc += word.count_ones();
        }
        supers.push(acc);

        Self { words, supers, len }
    }

    #[inline]
    pub fn get(&self, i: usize) -> bool {
        (self.words[i / 64] >> (i % 64)) & 1 == 1
    }

    /// [0, i) 中 1 的个数。
    #[inline]
    pub fn rank1(&self, i: usize) -> usize {
        debug_assert!(i <= self.len);
        let word = i / 64;
        let sb = word / WORDS_PER_SUPER;
        let mut count = self.supers[sb] as usize;
        for w in sb * WORDS_PER_SUPER..word {
            count += self.words[w].count_ones() as usize;
        }
        let bit = i % 64;
        if bit != 0 {
            count += (self.words[word] & ((1u64 << bit) - 1)).count_ones() as usize;
        }
        count
    }

    #[inline]
    pub fn rank0(&self, i: usize) -> usize {
        i - self.rank1(i)
    }

    pub fn count_zeros(&self) -> usize {
        self.rank0(self.len)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// 字节字母表上的小波矩阵，用于保存 BWT 并回答 rank / access / 区间符号集查询。
#[derive(Debug, Clone)]
pub struct WaveletMatrix {
    /// levels[0] 对应最高位
    levels: Vec<RankBitVec>,
    /// 每层 0 的个数
    zeros: Vec<usize>,
    len: usize,
}

impl WaveletMatrix {
    pub fn build(symbols: &[u8]) -> Self {
        let len = symbols.len();
        let max = symbols.iter().copied().max().unwrap_or(0);
        let depth = (u8::BITS - max.leading_zeros()).max(1) as usize;

        let mut levels = Vec::with_capacity(depth);
        let mut zeros = Vec::with_capacity(depth);
        let mut current = symbols.to_vec();
        let mut next = Vec::with_capacity(len);

        for level in 0..depth {
            let bit = 1u8 << (depth - 1 - level);
            let bv = RankBitVec::from_bits(current.iter().map(|&s| s & bit != 0));
            zeros.push(bv.count_zeros());
            levels.push(bv);

            // 稳定划分：该位为 0 的在前，为 1 的在后
            next.clear();
            next.extend(current.iter().copied().filter(|&s| s & bit == 0));
            next.extend(current.iter().copied().filter(|&s| s & bit != 0));
            std::mem::swap(&mut current, &mut next);
        }

        Self { levels, zeros, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    fn depth(&self) -> usize {
        self.levels.len()
    }

    /// 位置 i 处的符号。
    pub fn char_at(&self, mut i: usize) -> u8 {
        debug_assert!(i < self.len);
        let depth = self.depth();
        let mut symbol = 0u8;
        for (level, bv) in self.levels.iter().enumerate() {
            if bv.get(i) {
                symbol |= 1 << (depth - 1 - level);
                i = self.zeros[level] + bv.rank1(i);
            } else {
                i = bv.rank0(i);
            }
        }
        symbol
    }

    /// [0, pos) 中 c 的出现次数。
    pub fn occ(&self, c: u8, pos: usize) -> usize {
        let depth = self.depth();
        if pos == 0 || (depth < 8 && c >> depth != 0) {
            return 0;
        }
        let mut lo = 0usize;
        let mut hi = pos.min(self.len);
        for (level, bv) in self.levels.iter().enumerate() {
            if c & (1 << (depth - 1 - level)) != 0 {
                lo = self.zeros[level] + bv.rank1(lo);
                hi = self.zeros[level] + bv.rank1(hi);
            } else {
                lo = bv.rank0(lo);
                hi = bv.rank0(hi);
            }
        }
        hi - lo
    }

    /// [left, right] 中出现过的不同符号，按升序返回。
    pub fn symbols_in_range(&self, left: usize, right: usize) -> Vec<u8> {
        let mut out = Vec::new();
        if left <= right && right < self.len {
            self.collect_symbols(0, left, right + 1, 0, &mut out);
        }
        out
    }

    fn collect_symbols(&self, level: usize, lo: usize, hi: usize, prefix: u8, out: &mut Vec<u8>) {
        if lo >= hi {
            return;
        }
        if level == self.depth() {
            out.push(prefix);
            return;
        }
        let bv = &self.levels[level];
        let bit = 1u8 << (self.depth() - 1 - level);
        self.collect_symbols(level + 1, bv.rank0(lo), bv.rank0(hi), prefix, out);
        let z = self.zeros[level];
        self.collect_symbols(level + 1, z + bv.rank1(lo), z + bv.rank1(hi), prefix | bit, out);
    }

    /// 各符号的出现次数。
    pub fn symbol_counts(&self) -> [usize; 256] {
        let mut counts = [0usize; 256];
        let upper = if self.depth() >= 8 { 256 } else { 1usize << self.depth() };
        for c in 0..upper {
            counts[c] = self.occ(c as u8, self.len);
        }
        counts
    }
}
