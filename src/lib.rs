//! # History Mapper - Method Identity Across Git History
//!
//! Given a method's qualified name valid at one commit, finds the name the same method
//! carries at another commit, following renames and file moves by comparing the
//! structure of method bodies rather than their names.
//!
//! ## Overview
//!
//! The mapper walks the first-parent line between two commits one commit at a time.
//! Whenever the file declaring the tracked method changes, the file is re-tokenized
//! and the method's body tokens are compared against every method the file declares
//! afterwards using longest-common-subsequence similarity. Methods of the same file
//! compete for candidates, so a renamed method is not confused with a sibling.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │   HistoryMapper  │  get_method_qualified_name()
//! └────────┬─────────┘
//!          │
//!    ┌─────┴───────────┬──────────────────┬────────────────┐
//!    │                 │                  │                │
//! ┌──▼──────────────┐ ┌▼───────────────┐ ┌▼─────────────┐ ┌▼──────────────┐
//! │HistoryRepository│ │CommitDiffWalker│ │  Tokenizer   │ │ MethodMatcher │
//! │ (bare mirror)   │ │ (tree diffs)   │ │ (tree-sitter)│ │ (LCS ratio)   │
//! └─────────────────┘ └────────────────┘ └──────────────┘ └───────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`mapper`]: the orchestrator walking history and resolving names
//! - [`repository`]: private git mirror, revision resolution and per-commit diffs
//! - [`tokenizer`]: the tokenizer seam and the tree-sitter implementation
//! - [`matching`]: LCS similarity and one-to-one method assignment
//! - [`config`]: configuration management with environment variable support
//! - [`types`]: qualified names and tokenized methods
//! - [`error`]: error types and result aliases
//! - [`paths`]: platform directories for configuration and mirrors
//!
//! ## Usage Example
//!
//! ```no_run
//! use history_mapper::{ArtifactQualifiedName, HistoryMapper, MapperConfig, SyntaxTokenizer};
//!
//! fn main() -> history_mapper::Result<()> {
//!     let mapper = HistoryMapper::initialize(".", SyntaxTokenizer::new(), MapperConfig::new()?)?;
//!
//!     let old = ArtifactQualifiedName::method("GetterMethod.getStr()", "HEAD~1");
//!     if let Some(name) = mapper.get_method_qualified_name(&old, "HEAD", false)? {
//!         println!("{} is now {}", old.identifier, name.identifier);
//!     }
//!
//!     mapper.dispose()
//! }
//! ```

/// Configuration management with environment variable overrides
pub mod config;

/// Error types and utilities
pub mod error;

/// History walk and name resolution
pub mod mapper;

/// Token-sequence similarity and method matching
pub mod matching;

/// Platform directories
pub mod paths;

/// Git mirror access and commit diffs
pub mod repository;

/// Tokenizer trait and tree-sitter implementation
pub mod tokenizer;

/// Qualified names and tokenized methods
pub mod types;

pub use config::MapperConfig;
pub use error::{MapperError, Result};
pub use mapper::HistoryMapper;
pub use matching::MethodMatcher;
pub use repository::{CommitDiffWalker, HistoryRepository};
pub use tokenizer::{SyntaxTokenizer, Tokenizer};
pub use types::{ArtifactQualifiedName, ArtifactType, TokenizedMethod};
