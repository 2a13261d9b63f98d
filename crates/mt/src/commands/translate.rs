//! Translation commands: `french` and its `internal-*` steps.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use mt_config::{CliSettings, Config, DeeplConfig};
use mt_convert::Migrator;
use mt_deepl::{DeeplClient, TranslateOptions};

use crate::discover::absolute;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the french command.
#[derive(Args)]
pub(crate) struct FrenchArgs {
    /// Markdown page in the docs folder.
    md_file: PathBuf,

    /// Translation service key (overrides the config file).
    #[arg(long, env = "DEEPL_AUTH", hide_env_values = true)]
    auth_key: Option<String>,
}

impl FrenchArgs {
    /// Execute the french command.
    ///
    /// Converts the page to HTML, translates it and writes the translated
    /// Markdown beside the original as `<name>.<lang>.md`.
    ///
    /// # Errors
    ///
    /// Returns an error if conversion or translation fails.
    pub(crate) fn execute(self, config_path: Option<&Path>) -> Result<(), CliError> {
        let output = Output::new();
        let config = load(config_path, self.auth_key)?;
        let deepl = config.require_deepl()?;
        let md_file = absolute(&self.md_file);

        let pandoc = mt_convert::pandoc(&config);
        let migrator = Migrator::new(&config.project_resolved, &pandoc);

        let html = migrator.convert_markdown(&md_file)?;
        let upload = migrator.protect_for_translation(&html)?;
        let translated = migrator.translated_path(&html, &deepl.target_lang);
        translate(deepl, &upload, &translated)?;
        let translated_md = migrator.convert_html(&translated)?;

        let target = beside(&md_file, &translated_md);
        fs::copy(&translated_md, &target)?;
        tracing::info!(path = %target.display(), "Translated");
        output.result(&target.display().to_string());
        Ok(())
    }
}

/// Arguments for the internal-html command.
#[derive(Args)]
pub(crate) struct InternalHtmlArgs {
    /// Markdown page in the docs folder.
    md_file: PathBuf,
}

impl InternalHtmlArgs {
    /// Execute the internal-html command.
    ///
    /// # Errors
    ///
    /// Returns an error if the conversion fails.
    pub(crate) fn execute(self, config_path: Option<&Path>) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(config_path, None)?;
        let pandoc = mt_convert::pandoc(&config);
        let migrator = Migrator::new(&config.project_resolved, &pandoc);

        let html = migrator.convert_markdown(&absolute(&self.md_file))?;
        output.result(&html.display().to_string());
        Ok(())
    }
}

/// Arguments for the internal-markdown command.
#[derive(Args)]
pub(crate) struct InternalMarkdownArgs {
    /// Translated HTML file.
    html_file: PathBuf,
}

impl InternalMarkdownArgs {
    /// Execute the internal-markdown command.
    ///
    /// # Errors
    ///
    /// Returns an error if the conversion fails.
    pub(crate) fn execute(self, config_path: Option<&Path>) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(config_path, None)?;
        let pandoc = mt_convert::pandoc(&config);
        let migrator = Migrator::new(&config.project_resolved, &pandoc);

        let md = migrator.convert_html(&absolute(&self.html_file))?;
        output.result(&md.display().to_string());
        Ok(())
    }
}

/// Arguments for the internal-document command.
#[derive(Args)]
pub(crate) struct InternalDocumentArgs {
    /// HTML file to translate.
    en_file: PathBuf,

    /// Where to write the translated HTML.
    fr_file: PathBuf,

    /// Translation service key (overrides the config file).
    #[arg(long, env = "DEEPL_AUTH", hide_env_values = true)]
    auth_key: Option<String>,
}

impl InternalDocumentArgs {
    /// Execute the internal-document command.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload, translation or download fails.
    pub(crate) fn execute(self, config_path: Option<&Path>) -> Result<(), CliError> {
        let output = Output::new();
        let config = load(config_path, self.auth_key)?;
        let deepl = config.require_deepl()?;
        let pandoc = mt_convert::pandoc(&config);
        let migrator = Migrator::new(&config.project_resolved, &pandoc);

        let upload = migrator.protect_for_translation(&absolute(&self.en_file))?;
        let fr_file = absolute(&self.fr_file);
        translate(deepl, &upload, &fr_file)?;
        output.result(&fr_file.display().to_string());
        Ok(())
    }
}

fn load(config_path: Option<&Path>, auth_key: Option<String>) -> Result<Config, CliError> {
    let settings = CliSettings {
        deepl_auth_key: auth_key,
        ..CliSettings::default()
    };
    Ok(Config::load(config_path, Some(&settings))?)
}

fn translate(deepl: &DeeplConfig, input: &Path, output: &Path) -> Result<(), CliError> {
    let client = DeeplClient::new(&deepl.api_url, &deepl.auth_key)
        .with_timeout(Duration::from_secs(deepl.timeout_secs))
        .with_max_retries(deepl.max_retries);
    let options = TranslateOptions::new(&deepl.source_lang, &deepl.target_lang)
        .with_formality(deepl.formality.clone());

    tracing::info!(path = %input.display(), target_lang = %deepl.target_lang, "Uploading for translation");
    let handle = client.translate_document(input, output, &options)?;
    tracing::debug!(document = %handle.id, path = %output.display(), "Downloaded translation");
    Ok(())
}

/// `translated` renamed into the folder of `original`.
fn beside(original: &Path, translated: &Path) -> PathBuf {
    let folder = original.parent().unwrap_or_else(|| Path::new("."));
    match translated.file_name() {
        Some(name) => folder.join(name),
        None => original.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_beside_moves_into_original_folder() {
        assert_eq!(
            beside(
                Path::new("/p/docs/install/index.md"),
                Path::new("/p/target/download/install/index.fr.md")
            ),
            PathBuf::from("/p/docs/install/index.fr.md")
        );
    }
}
