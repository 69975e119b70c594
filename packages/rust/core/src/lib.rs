//! Link orchestration and domain logic for pdblink.
//!
//! This crate ties together symbol reading, repository access, path
//! normalization, index building, and embedding into the end-to-end
//! [`Linker::link`] workflow.

pub mod embed;
pub mod linker;
pub mod normalize;
pub mod repository;
pub mod symbols;
pub mod verify;

pub use embed::{Embedder, PdbstrEmbedder};
pub use linker::{LinkReport, Linker};
pub use normalize::{FsNormalizer, IndexNormalizer, PathNormalizer};
pub use repository::{GitCli, Repository, RepositoryOpener, find_repository_root};
pub use symbols::{ManifestSymbolOpener, SymbolOpener, SymbolReader};
