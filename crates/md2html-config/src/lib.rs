//! Configuration loader for md2html.
//!
//! Settings are resolved from layered `.md2html.toml` files:
//! built-in defaults → git root → working directory → override flag.
//! Later layers replace individual keys of earlier ones; command-line flags are
//! applied on top by the CLI.

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = ".md2html.toml";

/// Complete configuration resolved from defaults and on-disk overrides.
#[derive(Clone, Debug)]
pub struct Config {
    pub page: PageSettings,
    pub highlight: HighlightSettings,
    pub render: RenderSettings,
    pub sources: ConfigSources,
}

/// Defaults for the page shell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageSettings {
    pub standalone: bool,
    /// Stylesheet URL; empty means the built-in stylesheet.
    pub css: String,
}

/// Defaults for code highlighting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HighlightSettings {
    /// Theme name; empty means the built-in default theme.
    pub theme: String,
}

/// Markdown extensions applied during conversion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderSettings {
    pub gfm: bool,
    pub smart_punctuation: bool,
    pub hard_wraps: bool,
    pub heading_ids: bool,
}

/// Provenance information for resolved configuration.
#[derive(Clone, Debug)]
pub struct ConfigSources {
    pub working_directory: PathBuf,
    pub layers: Vec<ConfigSource>,
}

/// Specific layer of configuration (default/git/local/override).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: Option<PathBuf>,
}

impl ConfigSource {
    fn default() -> Self {
        ConfigSource {
            kind: ConfigSourceKind::Default,
            path: None,
        }
    }

    fn for_file(kind: ConfigSourceKind, path: PathBuf) -> Self {
        ConfigSource {
            kind,
            path: Some(path),
        }
    }

    fn describe(&self) -> String {
        match (&self.kind, &self.path) {
            (ConfigSourceKind::Default, _) => "built-in defaults".to_owned(),
            (kind, Some(path)) => format!("{} at {}", kind, path.display()),
            (kind, None) => kind.to_string(),
        }
    }
}

/// Kinds of configuration sources, ordered from lowest to highest precedence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSourceKind {
    Default,
    GitRoot,
    Local,
    Override,
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSourceKind::Default => "defaults",
            ConfigSourceKind::GitRoot => "git-root config",
            ConfigSourceKind::Local => "local config",
            ConfigSourceKind::Override => "override config",
        };
        f.write_str(label)
    }
}

/// Loader options, typically supplied by the CLI layer.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub override_path: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
}

impl LoadOptions {
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }
}

/// Errors surfaced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to resolve working directory {attempted}: {source}")]
    WorkingDirectory {
        attempted: PathBuf,
        source: io::Error,
    },
    #[error("override config {path} not found")]
    OverrideNotFound { path: PathBuf },
    #[error("failed to read config {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("configuration validation failed:\n{0}")]
    Validation(ConfigValidationErrors),
}

impl Config {
    /// Loads configuration using the precedence rules and returns typed settings.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let working_dir = resolve_working_dir(options.working_dir)?;
        let override_path = options
            .override_path
            .map(|path| make_absolute(&path, &working_dir));

        if let Some(path) = &override_path {
            if !path.exists() {
                return Err(ConfigError::OverrideNotFound { path: path.clone() });
            }
        }

        let mut merged = defaults_layer(ConfigSource::default());
        let mut source_layers = vec![ConfigSource::default()];

        let local_config_path = working_dir.join(CONFIG_FILE_NAME);
        let git_config_path = find_git_root(&working_dir).map(|root| root.join(CONFIG_FILE_NAME));

        if let Some(path) = git_config_path.as_ref() {
            if path.exists() && Some(path) != override_path.as_ref() && path != &local_config_path {
                let source = ConfigSource::for_file(ConfigSourceKind::GitRoot, path.clone());
                merged.merge(load_layer(path, source.clone())?);
                source_layers.push(source);
            }
        }

        if local_config_path.exists() && Some(&local_config_path) != override_path.as_ref() {
            let source = ConfigSource::for_file(ConfigSourceKind::Local, local_config_path.clone());
            merged.merge(load_layer(&local_config_path, source.clone())?);
            source_layers.push(source);
        }

        if let Some(path) = override_path {
            let source = ConfigSource::for_file(ConfigSourceKind::Override, path.clone());
            merged.merge(load_layer(&path, source.clone())?);
            source_layers.push(source);
        }

        let resolved = merged.finalize().map_err(ConfigError::Validation)?;
        Ok(Config {
            page: resolved.page,
            highlight: resolved.highlight,
            render: resolved.render,
            sources: ConfigSources {
                working_directory: working_dir,
                layers: source_layers,
            },
        })
    }

    /// Built-in defaults without consulting the filesystem.
    pub fn builtin() -> Self {
        let resolved = defaults_layer(ConfigSource::default())
            .finalize()
            .unwrap_or_else(|err| panic!("built-in md2html defaults are invalid: {err}"));
        Config {
            page: resolved.page,
            highlight: resolved.highlight,
            render: resolved.render,
            sources: ConfigSources {
                working_directory: PathBuf::from("."),
                layers: vec![ConfigSource::default()],
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::builtin()
    }
}

fn resolve_working_dir(override_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match override_dir {
        Some(path) => fs::canonicalize(&path).map_err(|source| ConfigError::WorkingDirectory {
            attempted: path,
            source,
        }),
        None => env::current_dir().map_err(|source| ConfigError::WorkingDirectory {
            attempted: PathBuf::from("."),
            source,
        }),
    }
}

fn make_absolute(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn find_git_root(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

fn load_layer(path: &Path, source: ConfigSource) -> Result<PartialConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.into(),
        source,
    })?;
    parse_layer(&contents, source).map_err(|source| ConfigError::Parse {
        path: path.into(),
        source,
    })
}

fn parse_layer(contents: &str, source: ConfigSource) -> Result<PartialConfig, toml::de::Error> {
    let raw: RawConfig = toml::from_str(contents)?;
    Ok(raw.into_partial(source))
}

fn defaults_layer(source: ConfigSource) -> PartialConfig {
    let enabled = || Some(Located::new(true, source.clone()));
    let empty = || Some(Located::new(String::new(), source.clone()));
    PartialConfig {
        standalone: enabled(),
        css: empty(),
        theme: empty(),
        gfm: enabled(),
        smart_punctuation: enabled(),
        hard_wraps: enabled(),
        heading_ids: enabled(),
    }
}

#[derive(Clone, Debug)]
struct Located<T> {
    value: T,
    source: ConfigSource,
}

impl<T> Located<T> {
    fn new(value: T, source: ConfigSource) -> Self {
        Located { value, source }
    }
}

#[derive(Clone, Debug, Default)]
struct PartialConfig {
    standalone: Option<Located<bool>>,
    css: Option<Located<String>>,
    theme: Option<Located<String>>,
    gfm: Option<Located<bool>>,
    smart_punctuation: Option<Located<bool>>,
    hard_wraps: Option<Located<bool>>,
    heading_ids: Option<Located<bool>>,
}

struct ResolvedConfig {
    page: PageSettings,
    highlight: HighlightSettings,
    render: RenderSettings,
}

impl PartialConfig {
    fn merge(&mut self, other: PartialConfig) {
        merge_field(&mut self.standalone, other.standalone);
        merge_field(&mut self.css, other.css);
        merge_field(&mut self.theme, other.theme);
        merge_field(&mut self.gfm, other.gfm);
        merge_field(&mut self.smart_punctuation, other.smart_punctuation);
        merge_field(&mut self.hard_wraps, other.hard_wraps);
        merge_field(&mut self.heading_ids, other.heading_ids);
    }

    fn finalize(self) -> Result<ResolvedConfig, ConfigValidationErrors> {
        let mut errors = Vec::new();

        let css = self.css.unwrap_or_else(|| Located::new(String::new(), ConfigSource::default()));
        if css.value.contains(['\n', '\r']) {
            errors.push(
                ConfigValidationError::new(
                    Some(css.source.clone()),
                    "stylesheet URL must not contain line breaks".into(),
                )
                .with_context("page.css"),
            );
        }

        let theme = self
            .theme
            .unwrap_or_else(|| Located::new(String::new(), ConfigSource::default()));
        if theme.value.contains(['\n', '\r']) {
            errors.push(
                ConfigValidationError::new(
                    Some(theme.source.clone()),
                    "theme name must not contain line breaks".into(),
                )
                .with_context("highlight.theme"),
            );
        }

        if !errors.is_empty() {
            return Err(ConfigValidationErrors(errors));
        }

        let flag = |field: Option<Located<bool>>| field.map(|located| located.value).unwrap_or(true);

        Ok(ResolvedConfig {
            page: PageSettings {
                standalone: flag(self.standalone),
                css: css.value.trim().to_string(),
            },
            highlight: HighlightSettings {
                theme: theme.value.trim().to_string(),
            },
            render: RenderSettings {
                gfm: flag(self.gfm),
                smart_punctuation: flag(self.smart_punctuation),
                hard_wraps: flag(self.hard_wraps),
                heading_ids: flag(self.heading_ids),
            },
        })
    }
}

fn merge_field<T>(target: &mut Option<T>, other: Option<T>) {
    if other.is_some() {
        *target = other;
    }
}

/// Collection of validation errors.
#[derive(Clone, Debug)]
pub struct ConfigValidationErrors(pub Vec<ConfigValidationError>);

impl fmt::Display for ConfigValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "- {err}")?;
        }
        Ok(())
    }
}

/// Validation failure with optional provenance.
#[derive(Clone, Debug)]
pub struct ConfigValidationError {
    pub source: Option<ConfigSource>,
    pub message: String,
    pub context: Option<String>,
}

impl ConfigValidationError {
    fn new(source: Option<ConfigSource>, message: String) -> Self {
        ConfigValidationError {
            source,
            message,
            context: None,
        }
    }

    fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(f, "{}: {}", context, self.message)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(source) = &self.source {
            write!(f, " ({})", source.describe())?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    page: Option<RawPage>,
    #[serde(default)]
    highlight: Option<RawHighlight>,
    #[serde(default)]
    render: Option<RawRender>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPage {
    #[serde(default)]
    standalone: Option<bool>,
    #[serde(default)]
    css: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawHighlight {
    #[serde(default)]
    theme: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRender {
    #[serde(default)]
    gfm: Option<bool>,
    #[serde(default)]
    smart_punctuation: Option<bool>,
    #[serde(default)]
    hard_wraps: Option<bool>,
    #[serde(default)]
    heading_ids: Option<bool>,
}

impl RawConfig {
    fn into_partial(self, source: ConfigSource) -> PartialConfig {
        let at = |value| Located::new(value, source.clone());
        let page = self.page.unwrap_or_default();
        let highlight = self.highlight.unwrap_or_default();
        let render = self.render.unwrap_or_default();

        PartialConfig {
            standalone: page.standalone.map(&at),
            css: page.css.map(|css| Located::new(css, source.clone())),
            theme: highlight.theme.map(|theme| Located::new(theme, source.clone())),
            gfm: render.gfm.map(&at),
            smart_punctuation: render.smart_punctuation.map(&at),
            hard_wraps: render.hard_wraps.map(&at),
            heading_ids: render.heading_ids.map(&at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(path: &str) -> ConfigSource {
        ConfigSource::for_file(ConfigSourceKind::Local, PathBuf::from(path))
    }

    #[test]
    fn builtin_defaults_produce_standalone_pages() {
        let config = Config::builtin();
        assert!(config.page.standalone);
        assert!(config.page.css.is_empty());
        assert!(config.highlight.theme.is_empty());
        assert!(config.render.gfm);
        assert!(config.render.smart_punctuation);
        assert!(config.render.hard_wraps);
        assert!(config.render.heading_ids);
    }

    #[test]
    fn later_layers_override_individual_keys() {
        let mut merged = defaults_layer(ConfigSource::default());
        merged.merge(
            parse_layer(
                "[page]\nstandalone = false\n[render]\nhard_wraps = false\n",
                local("a.toml"),
            )
            .unwrap(),
        );
        merged.merge(parse_layer("[highlight]\ntheme = \"  Solarized (dark) \"\n", local("b.toml")).unwrap());

        let resolved = merged.finalize().unwrap();
        assert!(!resolved.page.standalone);
        assert!(!resolved.render.hard_wraps);
        assert!(resolved.render.smart_punctuation);
        assert_eq!(resolved.highlight.theme, "Solarized (dark)");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse_layer("[page]\nstandalon = true\n", local("a.toml")).is_err());
        assert!(parse_layer("[colours]\n", local("a.toml")).is_err());
    }

    #[test]
    fn css_with_line_break_fails_validation() {
        let mut merged = defaults_layer(ConfigSource::default());
        merged.merge(parse_layer("[page]\ncss = \"a.css\\nb\"\n", local("site.toml")).unwrap());

        let errors = merged.finalize().err().expect("validation error");
        let message = errors.to_string();
        assert!(message.contains("page.css"));
        assert!(message.contains("local config at site.toml"));
    }
}
