//! # protein-fm
//!
//! 面向蛋白质数据库的 FM 索引，用于肽段与序列标签（sequence tag）映射。
//!
//! 本 crate 提供：
//!
//! - **索引构建**：蛋白序列拼接为 `P1/P2/.../Pn$`，构建正向与反向两套 FM 表（后缀数组 + BWT + 小波矩阵）
//! - **肽段映射**：精确匹配，或按匹配策略展开 B/J/Z/X 与 I/L 的歧义残基
//! - **标签映射**：已知残基片段与未知质量缺口交替的标签，在给定质量容差内双向回溯搜索
//! - **位置解析**：采样后缀数组 + 蛋白边界表，将命中行映射为 (登录号, 偏移)
//!
//! ## 快速示例
//!
//! ```rust
//! use protein_fm::{IndexConfig, MassTable, MatchingOptions, NoProgress, ProteinIndex, TagElement};
//!
//! let proteins = [("P1", "PEPTIDER"), ("P2", "TIDERPEP")];
//! let index = ProteinIndex::build(proteins, MassTable::default(), &IndexConfig::default(), &NoProgress)?;
//!
//! // 精确肽段映射
//! let hits = index.map_peptide("TIDER", &MatchingOptions::default())?;
//! assert_eq!(hits["TIDER"]["P1"], vec![3]);
//! assert_eq!(hits["TIDER"]["P2"], vec![0]);
//!
//! // 标签映射：PEP 后接一个质量等于 TIDE 的缺口
//! let gap = index.masses().peptide_mass(b"TIDE").unwrap_or_default();
//! let tag = [TagElement::Sequence("PEP".into()), TagElement::MassGap(gap)];
//! let hits = index.map_tag(&tag, &MatchingOptions::default(), 0.02)?;
//! assert_eq!(hits["PEPTIDE"]["P1"], vec![0]);
//! # Ok::<(), protein_fm::IndexError>(())
//! ```
//!
//! ## 模块说明
//!
//! - [`index`]：索引构建（后缀数组、BWT、小波矩阵、采样后缀数组）
//! - [`search`]：回溯搜索引擎（肽段、标签、结果缓存）
//! - [`mapper`]：对外的 [`ProteinIndex`]
//! - [`tag`]：标签类型与文本 / JSON 解析
//! - [`io`]：FASTA 文件解析
//! - [`util`]：残基字母表、歧义展开与质量表

pub mod config;
pub mod error;
pub mod index;
pub mod io;
pub mod mapper;
pub mod progress;
pub mod search;
pub mod tag;
pub mod util;

pub use config::{IndexConfig, MatchingOptions, MatchingPolicy};
pub use error::{IndexError, Result};
pub use mapper::{IndexStats, ProteinIndex};
pub use progress::{NoProgress, ProgressCounter, ProgressHandle};
pub use search::ProteinMapping;
pub use tag::{Tag, TagElement};
pub use util::amino::MassTable;
