//! Configuration management for mkdocs-translate.
//!
//! Parses `translate.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `converter.program`
//! - `deepl.auth_key`
//! - `deepl.api_url`

mod expand;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override docs output directory.
    pub docs_dir: Option<PathBuf>,
    /// Override rst source directory.
    pub rst_dir: Option<PathBuf>,
    /// Override translation service key.
    pub deepl_auth_key: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "translate.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Folder layout (paths are relative strings from TOML).
    project: ProjectConfigRaw,
    /// `|name|` substitution values.
    pub substitutions: BTreeMap<String, String>,
    /// External link roles keyed by role name.
    pub extlinks: BTreeMap<String, ExtLinkConfig>,
    /// Navigation title overrides keyed by `dir/file.md`.
    pub nav: BTreeMap<String, String>,
    /// External format converter.
    pub converter: ConverterConfig,
    /// Translation service.
    pub deepl: DeeplConfig,

    /// Resolved folder layout (set after loading).
    #[serde(skip)]
    pub project_resolved: ProjectConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw folder layout as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ProjectConfigRaw {
    project_folder: Option<String>,
    docs_folder: Option<String>,
    rst_folder: Option<String>,
    build_folder: Option<String>,
    upload_folder: Option<String>,
    convert_folder: Option<String>,
    download_folder: Option<String>,
    anchor_file: Option<String>,
    collapse_tables: Option<bool>,
    macro_ignore: Option<Vec<String>>,
}

/// Resolved folder layout with absolute paths.
#[derive(Debug, Default)]
pub struct ProjectConfig {
    /// Root every other folder is relative to.
    pub project_dir: PathBuf,
    /// Markdown output folder.
    pub docs_dir: PathBuf,
    /// reStructuredText source folder. Same as `docs_dir` unless configured.
    pub rst_dir: PathBuf,
    /// Build folder holding the working folders below.
    pub build_dir: PathBuf,
    /// HTML staged for translation.
    pub upload_dir: PathBuf,
    /// Intermediate files of rst conversion.
    pub convert_dir: PathBuf,
    /// Translated documents.
    pub download_dir: PathBuf,
    /// Anchor index file.
    pub anchor_file: PathBuf,
    /// Collapse simple list tables into pipe tables.
    pub collapse_tables: bool,
    /// Markdown files (relative to `docs_dir`) that must not render macros.
    pub macro_ignore: BTreeSet<String>,
}

/// External link role configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ExtLinkConfig {
    /// URL template, `%s` is replaced by the role target.
    pub url: String,
    /// Link text template used when the role has no explicit label.
    pub label: Option<String>,
}

/// External format converter configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Converter executable.
    pub program: String,
    /// Seconds before a conversion is killed.
    pub timeout_secs: u64,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            program: "pandoc".to_owned(),
            timeout_secs: 120,
        }
    }
}

/// Translation service configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DeeplConfig {
    /// API authentication key.
    pub auth_key: String,
    /// API base URL.
    pub api_url: String,
    pub source_lang: String,
    pub target_lang: String,
    /// Formality preference (`more`, `less`, `prefer_more`...).
    pub formality: Option<String>,
    /// Upload attempts after the first one fails.
    pub max_retries: u32,
    /// Seconds to wait for each HTTP request.
    pub timeout_secs: u64,
}

impl Default for DeeplConfig {
    fn default() -> Self {
        Self {
            auth_key: "${DEEPL_AUTH:-}".to_owned(),
            api_url: "https://api-free.deepl.com".to_owned(),
            source_lang: "EN".to_owned(),
            target_lang: "FR".to_owned(),
            formality: Some("more".to_owned()),
            max_retries: 3,
            timeout_secs: 60,
        }
    }
}

impl DeeplConfig {
    /// Validate that all required fields are properly set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any field is empty or has invalid format.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.auth_key, "deepl.auth_key")?;
        require_non_empty(&self.api_url, "deepl.api_url")?;
        require_http_url(&self.api_url, "deepl.api_url")?;
        require_non_empty(&self.source_lang, "deepl.source_lang")?;
        require_non_empty(&self.target_lang, "deepl.target_lang")?;
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`deepl.auth_key`").
        field: String,
        /// Error message (e.g., "${`DEEPL_AUTH`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

/// Drop `.` components so joined folders read cleanly in logs.
fn clean(path: &Path) -> PathBuf {
    path.components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect()
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `translate.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()?
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(docs_dir) = &settings.docs_dir {
            // An rst folder that followed the docs folder keeps following it.
            if self.project_resolved.rst_dir == self.project_resolved.docs_dir {
                self.project_resolved.rst_dir.clone_from(docs_dir);
            }
            self.project_resolved.docs_dir.clone_from(docs_dir);
        }
        if let Some(rst_dir) = &settings.rst_dir {
            self.project_resolved.rst_dir.clone_from(rst_dir);
        }
        if let Some(auth_key) = &settings.deepl_auth_key {
            self.deepl.auth_key.clone_from(auth_key);
        }
    }

    /// Get validated translation service configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the auth key is missing or a field is invalid.
    pub fn require_deepl(&self) -> Result<&DeeplConfig, ConfigError> {
        self.deepl.validate()?;
        Ok(&self.deepl)
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().unwrap_or_default();
        let mut config = Self::default_with_base(&cwd);
        config.expand_env_vars()?;
        Ok(config)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        let mut config = Self {
            project: ProjectConfigRaw::default(),
            substitutions: BTreeMap::new(),
            extlinks: BTreeMap::new(),
            nav: BTreeMap::new(),
            converter: ConverterConfig::default(),
            deepl: DeeplConfig::default(),
            project_resolved: ProjectConfig::default(),
            config_path: None,
        };
        config.resolve_paths(base);
        config
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.validate()?;
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Checks that all required fields are properly set and contain valid values.
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_project()?;
        self.validate_converter()?;
        self.validate_extlinks()?;
        require_http_url(&self.deepl.api_url, "deepl.api_url")?;
        Ok(())
    }

    /// Validate folder names.
    fn validate_project(&self) -> Result<(), ConfigError> {
        let project = &self.project;
        let folders = [
            (&project.project_folder, "project.project_folder"),
            (&project.docs_folder, "project.docs_folder"),
            (&project.rst_folder, "project.rst_folder"),
            (&project.build_folder, "project.build_folder"),
            (&project.upload_folder, "project.upload_folder"),
            (&project.convert_folder, "project.convert_folder"),
            (&project.download_folder, "project.download_folder"),
            (&project.anchor_file, "project.anchor_file"),
        ];
        for (value, field) in folders {
            if let Some(value) = value {
                require_non_empty(value.trim(), field)?;
            }
        }
        Ok(())
    }

    fn validate_converter(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.converter.program, "converter.program")?;
        if self.converter.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "converter.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_extlinks(&self) -> Result<(), ConfigError> {
        for (name, extlink) in &self.extlinks {
            if !extlink.url.contains("%s") {
                return Err(ConfigError::Validation(format!(
                    "extlinks.{name}.url must contain %s"
                )));
            }
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.converter.program = expand::expand_env(&self.converter.program, "converter.program")?;
        self.deepl.auth_key = expand::expand_env(&self.deepl.auth_key, "deepl.auth_key")?;
        self.deepl.api_url = expand::expand_env(&self.deepl.api_url, "deepl.api_url")?;
        Ok(())
    }

    /// Resolve relative folder names to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let raw = &self.project;
        let folder = |value: Option<&String>, default: &str| -> PathBuf {
            PathBuf::from(value.map_or(default, String::as_str))
        };

        let project_dir = clean(&config_dir.join(folder(raw.project_folder.as_ref(), ".")));
        let docs_dir = clean(&project_dir.join(folder(raw.docs_folder.as_ref(), "docs")));
        let rst_dir = match &raw.rst_folder {
            Some(rst) => clean(&project_dir.join(rst)),
            None => docs_dir.clone(),
        };
        let build_dir = clean(&project_dir.join(folder(raw.build_folder.as_ref(), "target")));
        let convert_dir = build_dir.join(folder(raw.convert_folder.as_ref(), "convert"));

        self.project_resolved = ProjectConfig {
            anchor_file: convert_dir.join(folder(raw.anchor_file.as_ref(), "anchors.txt")),
            upload_dir: build_dir.join(folder(raw.upload_folder.as_ref(), "upload")),
            download_dir: build_dir.join(folder(raw.download_folder.as_ref(), "download")),
            collapse_tables: raw.collapse_tables.unwrap_or(false),
            macro_ignore: raw.macro_ignore.iter().flatten().cloned().collect(),
            project_dir,
            docs_dir,
            rst_dir,
            build_dir,
            convert_dir,
        };
    }
}
