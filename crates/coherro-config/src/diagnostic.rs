// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns Figment extraction failures into miette diagnostics.
//!
//! Unknown keys get a source span pointing into the offending TOML file and a
//! "did you mean?" hint chosen by Jaro-Winkler similarity.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration problem, rendered by miette at startup.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(coherro::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        /// Comma-separated keys accepted in the same section.
        valid_keys: String,
        #[label("not a recognized key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(coherro::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(coherro::config::missing_key),
        help("add `{key} = <value>` to coherro.toml")
    )]
    MissingKey { key: String },

    /// A value parsed fine but violates a semantic constraint.
    #[error("invalid value for `{key}`: {message}")]
    #[diagnostic(code(coherro::config::validation))]
    Validation { key: String, message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(coherro::config::other))]
    Other(String),
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, message: impl Into<String>) -> Self {
        ConfigError::Validation {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Convert every error carried by a `figment::Error` into a `ConfigError`.
///
/// `toml_sources` holds `(path, content)` pairs used to locate unknown keys.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let dotted = error
                .path
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(".");

            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    let suggestion = suggest_key(field, expected);
                    let (span, src) = locate_key(&error, field, toml_sources);
                    ConfigError::UnknownKey {
                        key: if dotted.is_empty() {
                            field.clone()
                        } else {
                            format!("{dotted}.{field}")
                        },
                        suggestion,
                        valid_keys: expected.join(", "),
                        span,
                        src,
                    }
                }
                Kind::MissingField(field) => ConfigError::MissingKey {
                    key: field.to_string(),
                },
                Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                    key: dotted,
                    detail: format!("found {actual}"),
                    expected: expected.clone(),
                },
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

/// Resolve which source the error came from and find the key inside it.
///
/// Errors from files are matched by path; when a single inline source was
/// supplied it is used directly.
fn locate_key(
    error: &figment::error::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let file_path = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    let source = match file_path {
        Some(path) => toml_sources.iter().find(|(p, _)| *p == path),
        None if toml_sources.len() == 1 => toml_sources.first(),
        None => None,
    };

    let Some((name, content)) = source else {
        return (None, None);
    };

    let section: Vec<String> = error.path.iter().cloned().collect();
    match find_key_offset(content, &section, field) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), field.len())),
            Some(NamedSource::new(name, content.clone())),
        ),
        None => (None, None),
    }
}

/// Byte offset of `field` as a key inside the table named by `path`.
///
/// Only the first path segment is used to find the `[section]` header, and the
/// search stops at the next header.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let start = match path.first() {
        Some(section) => {
            let header = format!("[{section}]");
            content.find(&header)? + header.len()
        }
        None => 0,
    };

    let mut offset = start;
    for line in content[start..].split_inclusive('\n') {
        let trimmed = line.trim_start();
        if !path.is_empty() && trimmed.starts_with('[') {
            return None;
        }
        if let Some(after) = trimmed.strip_prefix(field)
            && matches!(after.trim_start_matches([' ', '\t']).chars().next(), Some('='))
        {
            return Some(offset + (line.len() - trimmed.len()));
        }
        offset += line.len();
    }

    None
}

/// Best match for `unknown` among `valid_keys`, if any is similar enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Print each error to stderr through miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        match handler.render_report(&mut buf, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{buf}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_close_render_keys() {
        let valid = &["program", "args", "timeout_secs", "script_name"];
        assert_eq!(suggest_key("progam", valid), Some("program".to_string()));
        assert_eq!(
            suggest_key("timeout_sec", valid),
            Some("timeout_secs".to_string())
        );
    }

    #[test]
    fn no_suggestion_for_distant_typo() {
        let valid = &["bucket", "region", "endpoint"];
        assert_eq!(suggest_key("zzzzzz", valid), None);
    }

    #[test]
    fn find_key_offset_in_section() {
        let content = "[gateway]\nhots = \"0.0.0.0\"\n";
        let path = vec!["gateway".to_string()];
        let o = find_key_offset(content, &path, "hots").unwrap();
        assert_eq!(&content[o..o + 4], "hots");
    }

    #[test]
    fn find_key_offset_stops_at_next_section() {
        let content = "[model]\nmodel = \"x\"\n[gateway]\nport = 1\n";
        let path = vec!["model".to_string()];
        assert_eq!(find_key_offset(content, &path, "port"), None);
    }

    #[test]
    fn find_key_offset_requires_assignment() {
        let content = "[render]\nprogram_extra = 1\nprogram = \"x\"\n";
        let path = vec!["render".to_string()];
        let o = find_key_offset(content, &path, "program").unwrap();
        assert!(content[o..].starts_with("program ="));
    }

    #[test]
    fn unknown_key_help_lists_valid_keys() {
        assert_eq!(
            unknown_key_help(Some("port"), "host, port"),
            "did you mean `port`? Valid keys: host, port"
        );
        assert_eq!(unknown_key_help(None, "host"), "valid keys: host");
    }
}
