use crate::config::MatchingPolicy;

/// 文本末尾哨兵，字典序最小。
pub const SENTINEL: u8 = b'$';
/// 蛋白质序列之间的分隔符。
pub const DELIMITER: u8 = b'/';
/// 残基表覆盖的字节范围
pub const ALPHABET_SIZE: usize = 128;

/// 质量比较的绝对余量，吸收残基质量按不同顺序累加产生的舍入误差。
pub const MASS_ROUNDING: f64 = 1e-9;

pub const STANDARD_RESIDUES: &[u8; 20] = b"ACDEFGHIKLMNPQRSTVWY";

/// 组合码及其成员残基。
pub fn sub_residues(code: u8) -> Option<&'static [u8]> {
    match code {
        b'B' => Some(b"DN"),
        b'J' => Some(b"IL"),
        b'Z' => Some(b"EQ"),
        b'X' => Some(STANDARD_RESIDUES),
        _ => None,
    }
}

/// 蛋白质序列规范化：转大写，非字母一律记为 X，保证不会与哨兵 / 分隔符冲突。
pub fn normalize_protein(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .map(|&b| {
            let up = b.to_ascii_uppercase();
            if up.is_ascii_uppercase() { up } else { b'X' }
        })
        .collect()
}

/// 查询序列仅转大写，非字母保留原样（不会匹配任何残基）。
pub fn normalize_query(seq: &str) -> Vec<u8> {
    seq.trim().bytes().map(|b| b.to_ascii_uppercase()).collect()
}

/// 按匹配策略给出查询残基的候选字符，原字符在前，不重复。
pub fn candidates(residue: u8, policy: MatchingPolicy) -> Vec<u8> {
    if !residue.is_ascii_uppercase() {
        return Vec::new();
    }
    let mut out = vec![residue];
    if policy == MatchingPolicy::Exact {
        return out;
    }
    if let Some(members) = sub_residues(residue) {
        out.extend_from_slice(members);
    } else if policy == MatchingPolicy::Indistinguishable {
        match residue {
            b'I' => out.extend_from_slice(b"JXL"),
            b'L' => out.extend_from_slice(b"JXI"),
            _ => {}
        }
    }
    out
}

/// 单同位素残基质量表，按残基字节索引；0 表示未定义。
#[derive(Debug, Clone, PartialEq)]
pub struct MassTable {
    masses: Vec<f64>,
}

impl MassTable {
    pub fn empty() -> Self {
        Self { masses: vec![0.0; ALPHABET_SIZE] }
    }

    /// 20 种标准氨基酸 + 硒半胱氨酸 (U) + 吡咯赖氨酸 (O)。
    pub fn monoisotopic() -> Self {
        Self::from_residues([
            (b'G', 57.021464),
            (b'A', 71.037114),
            (b'S', 87.032028),
            (b'P', 97.052764),
            (b'V', 99.068414),
            (b'T', 101.047679),
            (b'C', 103.009185),
            (b'L', 113.084064),
            (b'I', 113.084064),
            (b'N', 114.042927),
            (b'D', 115.026943),
            (b'Q', 128.058578),
            (b'K', 128.094963),
            (b'E', 129.042593),
            (b'M', 131.040485),
            (b'H', 137.058912),
            (b'F', 147.068414),
            (b'U', 150.953636),
            (b'R', 156.101111),
            (b'Y', 163.063329),
            (b'W', 186.079313),
            (b'O', 237.147727),
        ])
    }

    pub fn from_residues(residues: impl IntoIterator<Item = (u8, f64)>) -> Self {
        let mut table = Self::empty();
        for (residue, mass) in residues {
            table.set(residue, mass);
        }
        table
    }

    pub fn set(&mut self, residue: u8, mass: f64) {
        if let Some(slot) = self.masses.get_mut(residue as usize) {
            *slot = mass;
        }
    }

    /// 残基质量；未定义或非正的残基返回 None（不能用来填补质量缺口）。
    #[inline]
    pub fn get(&self, residue: u8) -> Option<f64> {
        self.masses.get(residue as usize).copied().filter(|&m| m > 0.0)
    }

    /// 最小的正残基质量。
    pub fn min_mass(&self) -> Option<f64> {
        self.masses.iter().copied().filter(|&m| m > 0.0).reduce(f64::min)
    }

    pub fn peptide_mass(&self, residues: &[u8]) -> Option<f64> {
        residues.iter().map(|&r| self.get(r)).sum()
    }
}

impl Default for MassTable {
    fn default() -> Self {
        Self::monoisotopic()
    }
}
