//! 对外的蛋白索引：构建、肽段映射、标签映射与生命周期管理。

use serde::Serialize;
use tracing::info;

use crate::config::{IndexConfig, MatchingOptions};
use crate::error::{IndexError, Result};
use crate::index::builder::{build_index, BuiltIndex};
use crate::progress::ProgressHandle;
use crate::search::cache::TagCache;
use crate::search::{peptide, tag, ProteinMapping};
use crate::tag::TagElement;
use crate::util::amino::MassTable;

/// 构建结果摘要。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexStats {
    pub proteins: usize,
    pub residues: usize,
    /// 含分隔符与哨兵的文本长度
    pub text_len: usize,
    /// 是否构建了反向索引（标签映射所需）
    pub reversed: bool,
    /// RFC 3339 构建时间
    pub built_at: String,
}

/// FM-index over a protein database.
///
/// Queries take `&self` and may run from many threads at once; the tag cache is the only
/// state they share. After [`close`](Self::close) every query returns [`IndexError::Closed`].
#[derive(Debug)]
pub struct ProteinIndex {
    data: Option<BuiltIndex>,
    masses: MassTable,
    cache: TagCache,
    stats: IndexStats,
}

impl ProteinIndex {
    pub fn build<I, A, S>(
        proteins: I,
        masses: MassTable,
        config: &IndexConfig,
        progress: &dyn ProgressHandle,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (A, S)>,
        A: Into<String>,
        S: AsRef<[u8]>,
    {
        if masses.min_mass().is_none() {
            return Err(IndexError::EmptyMassTable);
        }
        let data = build_index(proteins, config, progress)?;
        let stats = IndexStats {
            proteins: data.proteins.len(),
            residues: data.residues,
            text_len: data.text_len(),
            reversed: data.reversed.is_some(),
            built_at: chrono::Utc::now().to_rfc3339(),
        };
        info!(
            proteins = stats.proteins,
            residues = stats.residues,
            reversed = stats.reversed,
            "protein index ready"
        );
        Ok(Self { data: Some(data), masses, cache: TagCache::new(config.cache_capacity), stats })
    }

    fn data(&self) -> Result<&BuiltIndex> {
        self.data.as_ref().ok_or(IndexError::Closed)
    }

    pub fn map_peptide(&self, peptide: &str, options: &MatchingOptions) -> Result<ProteinMapping> {
        Ok(peptide::map_peptide(self.data()?, peptide, options))
    }

    /// Maps a sequence tag; gap masses match when within `tolerance` (inclusive) of the
    /// summed residue masses.
    pub fn map_tag(&self, tag: &[TagElement], options: &MatchingOptions, tolerance: f64) -> Result<ProteinMapping> {
        tag::map_tag(self.data()?, &self.masses, &self.cache, tag, options, tolerance)
    }

    /// 释放索引内存；可重复调用。
    pub fn close(&mut self) {
        if self.data.take().is_some() {
            self.cache.clear();
            info!("protein index closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.data.is_none()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }

    pub fn masses(&self) -> &MassTable {
        &self.masses
    }
}
