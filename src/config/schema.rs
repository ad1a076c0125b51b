use serde::Deserialize;
use std::fmt;

/// Contents of a `rew.toml` file.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RewriteConfig {
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub format: FormatConfig,
    #[serde(default)]
    pub imports: ImportsConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FilesConfig {
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default = "default_excludes")]
    pub exclude: Vec<String>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            exclude: default_excludes(),
        }
    }
}

fn default_extension() -> String {
    ".go".to_string()
}

fn default_excludes() -> Vec<String> {
    vec!["vendor/".to_string(), ".git/".to_string()]
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FormatConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_formatter")]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: default_formatter(),
            args: Vec::new(),
        }
    }
}

fn default_formatter() -> String {
    "gofmt".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ImportsConfig {
    #[serde(default = "default_true")]
    pub clean: bool,
}

impl Default for ImportsConfig {
    fn default() -> Self {
        Self { clean: true }
    }
}

impl RewriteConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        let ext = self.files.extension.trim_start_matches('.');
        if ext.is_empty() {
            issues.push(ValidationIssue::MissingField {
                field: "files.extension",
            });
        } else if ext.contains(['/', '\\', '*']) {
            issues.push(ValidationIssue::InvalidValue {
                field: "files.extension",
                message: format!("'{}' is not a file extension", self.files.extension),
            });
        }

        for pattern in &self.files.exclude {
            if pattern.trim().is_empty() {
                issues.push(ValidationIssue::InvalidValue {
                    field: "files.exclude",
                    message: "empty pattern".to_string(),
                });
            } else if let Err(e) =
                ignore::gitignore::GitignoreBuilder::new("").add_line(None, pattern)
            {
                issues.push(ValidationIssue::InvalidValue {
                    field: "files.exclude",
                    message: format!("'{pattern}': {e}"),
                });
            }
        }

        if self.format.enabled && self.format.command.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                field: "format.command",
            });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    MissingField {
        field: &'static str,
    },
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

impl ValidationIssue {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationIssue::MissingField { field } | ValidationIssue::InvalidValue { field, .. } => {
                field
            }
        }
    }

    /// The `[section]` of `rew.toml` the field lives in.
    pub fn section(&self) -> &'static str {
        self.field().split_once('.').map_or("", |(section, _)| section)
    }

    fn key(&self) -> &'static str {
        let field = self.field();
        field.split_once('.').map_or(field, |(_, key)| key)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (section, key) = (self.section(), self.key());
        match self {
            ValidationIssue::MissingField { .. } => write!(f, "[{section}] {key} must be set"),
            ValidationIssue::InvalidValue { message, .. } => {
                write!(f, "[{section}] {key}: {message}")
            }
        }
    }
}
