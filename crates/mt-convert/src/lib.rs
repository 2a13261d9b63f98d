//! Conversion pipeline for mkdocs-translate.
//!
//! Wraps the engine's text passes around an external [`Converter`]:
//!
//! - rST migration: [`preprocess`](mt_engine::preprocess), converter,
//!   [`postprocess`](mt_engine::postprocess), atomic write into the docs folder
//! - translation round trip: Markdown to HTML for upload, translated HTML
//!   back to Markdown
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use mt_config::Config;
//! use mt_convert::{Migrator, Pandoc, context};
//! use mt_engine::AnchorIndex;
//!
//! let config = Config::load(None, None)?;
//! let anchors = AnchorIndex::load(&config.project_resolved.anchor_file)?;
//! let ctx = context(&config, anchors);
//!
//! let pandoc = Pandoc::new("pandoc", Duration::from_secs(120));
//! let migrator = Migrator::new(&config.project_resolved, &pandoc);
//! let converted = migrator.convert_rst(&ctx, &config.project_resolved.rst_dir.join("index.rst"))?;
//! println!("{}", converted.output.display());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod converter;
mod error;
mod migrate;
mod write;

use mt_config::Config;
use mt_engine::{AnchorIndex, Context, ExtLink};

pub use converter::{Converter, MARKDOWN_IN, MARKDOWN_OUT, Pandoc};
pub use error::ConvertError;
pub use migrate::{Converted, Migrator};
pub use write::write_atomic;

/// Build the engine context for a migration run.
pub fn context(config: &Config, anchors: AnchorIndex) -> Context {
    let extlinks = config
        .extlinks
        .iter()
        .map(|(name, extlink)| ExtLink {
            name: name.clone(),
            url: extlink.url.clone(),
            label: extlink.label.clone(),
        })
        .collect();

    Context::new(anchors)
        .with_substitutions(config.substitutions.clone())
        .with_extlinks(extlinks)
        .with_nav_titles(config.nav.clone())
        .with_macro_ignore(config.project_resolved.macro_ignore.clone())
        .with_collapse_tables(config.project_resolved.collapse_tables)
}

/// Converter configured by the `[converter]` section.
pub fn pandoc(config: &Config) -> Pandoc {
    Pandoc::new(
        config.converter.program.clone(),
        std::time::Duration::from_secs(config.converter.timeout_secs),
    )
}
