use tracing::debug;

use super::bwt::{build_bwt, build_reversed_text};
use super::fm::{FmIndex, Interval};
use super::locate::{ProteinTable, SampledSuffixArray};
use super::sa::build_sa;
use crate::config::{IndexConfig, MAX_SAMPLING_SHIFT};
use crate::error::{IndexError, Result};
use crate::progress::ProgressHandle;
use crate::util::amino::{normalize_protein, DELIMITER, SENTINEL};

/// 构建完成、只读的索引各部分。
#[derive(Debug, Clone)]
pub struct BuiltIndex {
    /// 正向文本的 FM 表（定位与普通肽段搜索）
    pub primary: FmIndex,
    /// 反向文本的 FM 表，仅在标签搜索中作为互补方向使用
    pub reversed: Option<FmIndex>,
    pub sampled: SampledSuffixArray,
    pub proteins: ProteinTable,
    pub residues: usize,
}

impl BuiltIndex {
    pub fn text_len(&self) -> usize {
        self.primary.len()
    }

    /// 行号 -> (蛋白序号, 蛋白内偏移)。
    pub fn locate(&self, row: usize) -> Option<(usize, usize)> {
        let pos = self.sampled.resolve(&self.primary, row);
        self.proteins.resolve(pos)
    }

    /// 区间内全部命中，按 (蛋白序号, 偏移) 返回。
    pub fn locate_all(&self, iv: Interval) -> impl Iterator<Item = (usize, usize)> + '_ {
        iv.rows().filter_map(move |row| self.locate(row))
    }
}

fn checkpoint(progress: &dyn ProgressHandle) -> Result<()> {
    if progress.is_cancelled() {
        Err(IndexError::Cancelled)
    } else {
        Ok(())
    }
}

/// 拼接蛋白序列：`P1/P2/.../Pn$`，同时登记边界表与登录号。
fn concatenate<I, A, S>(proteins: I, progress: &dyn ProgressHandle) -> Result<(Vec<u8>, ProteinTable, usize)>
where
    I: IntoIterator<Item = (A, S)>,
    A: Into<String>,
    S: AsRef<[u8]>,
{
    let mut text = Vec::new();
    let mut table = ProteinTable::new();
    let mut residues = 0usize;
    for (accession, sequence) in proteins {
        checkpoint(progress)?;
        if !table.is_empty() {
            text.push(DELIMITER);
        }
        let norm = normalize_protein(sequence.as_ref());
        residues += norm.len();
        table.push(accession.into(), norm.len());
        text.extend_from_slice(&norm);
    }
    text.push(SENTINEL);
    if text.len() >= u32::MAX as usize {
        return Err(IndexError::TooLarge(text.len()));
    }
    Ok((text, table, residues))
}

/// 由文本依次构建 SA -> BWT -> FM 表；每个阶段结束推进一次进度。
fn build_direction(text: &[u8], progress: &dyn ProgressHandle) -> Result<(FmIndex, Vec<u32>)> {
    let sa = build_sa(text);
    progress.advance_step();
    checkpoint(progress)?;

    let bwt = build_bwt(text, &sa);
    progress.advance_step();
    checkpoint(progress)?;

    let fm = FmIndex::build(&bwt);
    Ok((fm, sa))
}

/// 从有序的 (登录号, 序列) 流构建索引。取消后返回 [`IndexError::Cancelled`]，不保留任何中间结果。
pub fn build_index<I, A, S>(proteins: I, config: &IndexConfig, progress: &dyn ProgressHandle) -> Result<BuiltIndex>
where
    I: IntoIterator<Item = (A, S)>,
    A: Into<String>,
    S: AsRef<[u8]>,
{
    if config.sampling_shift > MAX_SAMPLING_SHIFT {
        return Err(IndexError::InvalidSamplingShift(config.sampling_shift));
    }
    progress.set_total_steps(if config.build_reverse { 8 } else { 5 });
    checkpoint(progress)?;

    let (text, proteins, residues) = concatenate(proteins, progress)?;
    debug!(proteins = proteins.len(), residues, text_len = text.len(), "concatenated protein text");
    progress.advance_step();
    checkpoint(progress)?;

    let (primary, sa) = build_direction(&text, progress)?;
    progress.advance_step();
    checkpoint(progress)?;
    debug!("built primary FM index");

    let sampled = SampledSuffixArray::from_full(&sa, config.sampling_shift);
    drop(sa);
    progress.advance_step();
    checkpoint(progress)?;
    debug!(samples = sampled.len(), stride = sampled.stride(), "sampled suffix array");

    let reversed = if config.build_reverse {
        let reversed_text = build_reversed_text(&text);
        drop(text);
        let (fm, _) = build_direction(&reversed_text, progress)?;
        progress.advance_step();
        checkpoint(progress)?;
        debug!("built reversed FM index");
        Some(fm)
    } else {
        None
    };

    Ok(BuiltIndex { primary, reversed, sampled, proteins, residues })
}
