//! Configuration file loading for absfix.
//!
//! Discovers and loads `absfix.toml` from the repository root.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use absfix_types::edit::StubPolicy;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde::Deserialize;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "absfix.toml";

const DEFAULT_INDENT: &str = "    ";

/// Top-level configuration from absfix.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AbsfixConfig {
    /// How stubs are written.
    pub stubs: StubsConfig,

    /// Caps and preconditions.
    pub policy: PolicyConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StubsConfig {
    pub policy: Option<StubPolicy>,

    /// Indentation added per nesting level, e.g. `"  "` or `"\t"`.
    pub indent: Option<String>,

    pub newline: Option<NewlineStyle>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    /// Maximum number of files a plan may touch.
    pub max_files: Option<u64>,

    /// Maximum number of classes a plan may repair.
    pub max_classes: Option<u64>,

    /// Record and verify sha256 preconditions (default: true).
    pub require_clean_hashes: Option<bool>,
}

/// Line ending used for inserted blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NewlineStyle {
    /// Follow each file's existing line endings.
    #[default]
    Auto,
    Lf,
    Crlf,
}

impl NewlineStyle {
    /// The literal newline to force, or `None` to detect per file.
    pub fn literal(self) -> Option<String> {
        match self {
            NewlineStyle::Auto => None,
            NewlineStyle::Lf => Some("\n".to_string()),
            NewlineStyle::Crlf => Some("\r\n".to_string()),
        }
    }
}

/// Discover the absfix.toml config file.
pub fn discover_config(repo_root: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = repo_root.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse an absfix.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<AbsfixConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

/// Parse a config file from a string.
pub fn parse_config(contents: &str) -> anyhow::Result<AbsfixConfig> {
    let config: AbsfixConfig = toml::from_str(contents).context("invalid TOML")?;
    if let Some(indent) = &config.stubs.indent {
        validate_indent(indent)?;
    }
    Ok(config)
}

/// Load config from repo root, or return default if not found.
pub fn load_or_default(repo_root: &Utf8Path) -> anyhow::Result<AbsfixConfig> {
    match discover_config(repo_root) {
        Some(path) => load_config(&path),
        None => Ok(AbsfixConfig::default()),
    }
}

/// An indent unit must be non-empty and made of spaces or tabs only.
pub fn validate_indent(indent: &str) -> anyhow::Result<()> {
    if indent.is_empty() || !indent.chars().all(|c| c == ' ' || c == '\t') {
        anyhow::bail!("invalid indent {:?}: use spaces or tabs", indent);
    }
    Ok(())
}

/// Merged configuration combining config file and CLI arguments.
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub stub_policy: StubPolicy,
    pub indent_unit: String,
    pub newline: Option<String>,
    pub max_files: Option<u64>,
    pub max_classes: Option<u64>,
    pub require_clean_hashes: bool,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: AbsfixConfig,
}

impl ConfigMerger {
    pub fn new(config: AbsfixConfig) -> Self {
        Self { config }
    }

    /// Merge with plan command CLI arguments.
    ///
    /// Each CLI value replaces the file value when given. `no_clean_hashes` always wins.
    pub fn merge_plan_args(
        self,
        cli_policy: Option<StubPolicy>,
        cli_indent: Option<&str>,
        cli_newline: Option<NewlineStyle>,
        no_clean_hashes: bool,
    ) -> anyhow::Result<MergedConfig> {
        let mut merged = self.merge_layout(cli_indent, cli_newline)?;
        if let Some(policy) = cli_policy {
            merged.stub_policy = policy;
        }
        if no_clean_hashes {
            merged.require_clean_hashes = false;
        }
        Ok(merged)
    }

    /// Merge with apply command CLI arguments (layout only; policy comes from the plan).
    pub fn merge_apply_args(
        self,
        cli_indent: Option<&str>,
        cli_newline: Option<NewlineStyle>,
    ) -> anyhow::Result<MergedConfig> {
        self.merge_layout(cli_indent, cli_newline)
    }

    fn merge_layout(
        self,
        cli_indent: Option<&str>,
        cli_newline: Option<NewlineStyle>,
    ) -> anyhow::Result<MergedConfig> {
        let indent_unit = match cli_indent {
            Some(indent) => {
                validate_indent(indent)?;
                indent.to_string()
            }
            None => self
                .config
                .stubs
                .indent
                .clone()
                .unwrap_or_else(|| DEFAULT_INDENT.to_string()),
        };
        let newline = cli_newline
            .or(self.config.stubs.newline)
            .unwrap_or_default()
            .literal();

        Ok(MergedConfig {
            stub_policy: self.config.stubs.policy.unwrap_or_default(),
            indent_unit,
            newline,
            max_files: self.config.policy.max_files,
            max_classes: self.config.policy.max_classes,
            require_clean_hashes: self.config.policy.require_clean_hashes.unwrap_or(true),
        })
    }
}
