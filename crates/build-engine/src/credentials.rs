//! Credential Source
//!
//! Loads `key.properties` style credential files. The format follows
//! `java.util.Properties`, which is what Gradle scripts read them with.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{BuildError, Result};

/// Conventional credential file name at the project root
pub const DEFAULT_CREDENTIALS_FILE: &str = "key.properties";

/// Parsed key/value pairs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    /// Parse `.properties` text
    pub fn parse(content: &str) -> Result<Self> {
        let mut entries = BTreeMap::new();

        for (line_no, line) in logical_lines(content) {
            let (key, value) = split_entry(&line);
            let key = unescape(key, line_no)?;
            let value = unescape(value, line_no)?;
            entries.insert(key, value);
        }

        Ok(Self { entries })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Locator for a credential file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialSource {
    path: PathBuf,
}

impl CredentialSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The conventional `key.properties` under a project root
    pub fn in_project(project_root: &Path) -> Self {
        Self::new(project_root.join(DEFAULT_CREDENTIALS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the source. A missing file yields `None`.
    pub fn load(&self) -> Result<Option<Properties>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No credential source at {:?}", self.path);
                return Ok(None);
            }
            Err(source) => {
                return Err(BuildError::CredentialSourceUnreadable {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let content = match String::from_utf8(bytes) {
            Ok(text) => text,
            // Properties.load decodes ISO-8859-1
            Err(e) => e.into_bytes().iter().map(|&b| b as char).collect(),
        };

        let properties = Properties::parse(&content)?;
        debug!(
            "Loaded {} credential entries from {:?}",
            properties.len(),
            self.path
        );
        Ok(Some(properties))
    }
}

/// Join continuation lines and drop blanks and comments.
/// Yields the 1-based number of the first physical line of each entry.
fn logical_lines(content: &str) -> Vec<(usize, String)> {
    let mut result = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (idx, raw) in content.lines().enumerate() {
        let continuing = pending.is_some();
        let trimmed = raw.trim_start_matches([' ', '\t', '\u{c}']);

        if !continuing && (trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!')) {
            continue;
        }

        let (line_no, mut buf) = pending.take().unwrap_or((idx + 1, String::new()));
        if ends_with_continuation(trimmed) {
            buf.push_str(&trimmed[..trimmed.len() - 1]);
            pending = Some((line_no, buf));
        } else {
            buf.push_str(trimmed);
            result.push((line_no, buf));
        }
    }

    if let Some(entry) = pending {
        result.push(entry);
    }

    result
}

/// An odd number of trailing backslashes continues the line
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Split a logical line into its raw (still escaped) key and value
fn split_entry(line: &str) -> (&str, &str) {
    let mut key_end = line.len();
    let mut escaped = false;

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' | ' ' | '\t' | '\u{c}' => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let mut rest = line[key_end..].trim_start_matches([' ', '\t', '\u{c}']);
    if let Some(stripped) = rest.strip_prefix(['=', ':']) {
        rest = stripped.trim_start_matches([' ', '\t', '\u{c}']);
    }

    (key, rest)
}

fn unescape(raw: &str, line_no: usize) -> Result<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let malformed = |hex: &str| {
                    BuildError::credentials(
                        format!("line {}", line_no),
                        format!("malformed \\u escape '\\u{}'", hex),
                    )
                };
                let hex: String = chars.by_ref().take(4).collect();
                let unit = parse_code_unit(&hex).ok_or_else(|| malformed(&hex))?;

                let ch = match unit {
                    // High surrogate: must be followed by an escaped low surrogate
                    0xD800..=0xDBFF => {
                        let mut lookahead = chars.clone();
                        let low = match (lookahead.next(), lookahead.next()) {
                            (Some('\\'), Some('u')) => {
                                let low_hex: String = lookahead.by_ref().take(4).collect();
                                parse_code_unit(&low_hex).filter(|u| (0xDC00..=0xDFFF).contains(u))
                            }
                            _ => None,
                        };
                        let low = low.ok_or_else(|| malformed(&hex))?;
                        chars = lookahead;
                        char::from_u32(0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00))
                    }
                    _ => char::from_u32(unit),
                };
                out.push(ch.ok_or_else(|| malformed(&hex))?);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    Ok(out)
}

fn parse_code_unit(hex: &str) -> Option<u32> {
    if hex.len() == 4 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        None
    }
}

/// Escape a string so `Properties::parse` reads it back unchanged
pub fn escape(value: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(value.len());

    for (i, c) in value.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{c}' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            _ => out.push(c),
        }
    }

    out
}
