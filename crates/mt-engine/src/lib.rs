//! Translation engine for migrating Sphinx reStructuredText to MkDocs Markdown.
//!
//! The engine never runs the external converter itself. It rewrites source
//! text before conversion ([`preprocess`]) and repairs converter output after
//! conversion ([`postprocess`]). Both directions share a per-run [`Context`]
//! and report non-fatal problems through [`Warnings`].
//!
//! # Architecture
//!
//! - [`AnchorIndex`]: reference labels and document titles scanned from the corpus
//! - [`directive`]: indentation-aware directive scanner and block transforms
//! - [`inline`]: ordered role rewriting rules
//! - [`nav`]: navigation tree built by following toctrees
//! - [`fenced`]: fenced-div admonitions rewritten to `!!!` blocks
//! - [`roundtrip`]: cleanup around the translation service round trip
//!
//! # Example
//!
//! ```
//! use mt_engine::{AnchorIndex, Context, FileScope, MemorySource, preprocess};
//!
//! let ctx = Context::new(AnchorIndex::parse("/setup.rst=/setup.rst\n/setup.rst.title=Setup\n"));
//! let source = MemorySource::new();
//! let mut scope = FileScope::new(&ctx, "index.rst", &source);
//!
//! let text = preprocess(&mut scope, "See :doc:`setup`.\n");
//! assert_eq!(text, "See `Setup <setup.rst>`_.\n");
//! ```

pub mod anchors;
mod context;
pub mod directive;
pub mod downloads;
mod fence;
pub mod fenced;
pub mod inline;
pub mod nav;
pub mod paths;
mod pipeline;
pub mod roundtrip;
mod warnings;

pub use anchors::{AnchorError, AnchorIndex};
pub use context::{Context, ExtLink, FileScope};
pub use fenced::FenceError;
pub use nav::{MemorySource, NavBuilder, NavError, NavNode, SourceTree, FsSource};
pub use pipeline::{postprocess, preprocess};
pub use warnings::{Warning, Warnings};
