//! Release Signing
//!
//! Signing profile built from a validated credential source.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::credentials::Properties;
use crate::{BuildError, Result};

const REDACTED: &str = "********";

/// Password-like value that never shows up in formatted output
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw value, for handing to the signing tool
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({})", REDACTED)
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(REDACTED)
    }
}

/// Keystore type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KeyStoreType {
    Jks,
    Pkcs12,
}

impl KeyStoreType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyStoreType::Jks => "JKS",
            KeyStoreType::Pkcs12 => "PKCS12",
        }
    }

    /// Infer the type from the store file extension
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("p12") | Some("pfx") => KeyStoreType::Pkcs12,
            _ => KeyStoreType::Jks,
        }
    }
}

/// Credential keys, in validation order
pub const KEY_ALIAS: &str = "keyAlias";
pub const KEY_PASSWORD: &str = "keyPassword";
pub const STORE_FILE: &str = "storeFile";
pub const STORE_PASSWORD: &str = "storePassword";

/// Release signing profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SigningProfile {
    key_alias: String,
    key_password: Secret,
    store_file: PathBuf,
    store_password: Secret,
}

impl SigningProfile {
    pub fn new(
        key_alias: impl Into<String>,
        key_password: Secret,
        store_file: PathBuf,
        store_password: Secret,
    ) -> Self {
        Self {
            key_alias: key_alias.into(),
            key_password,
            store_file,
            store_password,
        }
    }

    /// Build a profile from credential properties.
    ///
    /// All four keys must be present and non-empty. A relative `storeFile`
    /// is resolved against `project_root`.
    pub fn from_properties(props: &Properties, project_root: &Path) -> Result<Self> {
        let key_alias = required(props, KEY_ALIAS)?;
        let key_password = required(props, KEY_PASSWORD)?;
        let store_file = required(props, STORE_FILE)?;
        let store_password = required(props, STORE_PASSWORD)?;

        let store_file = PathBuf::from(store_file);
        let store_file = if store_file.is_absolute() {
            store_file
        } else {
            project_root.join(store_file)
        };

        debug!("Signing profile for alias '{}' using {:?}", key_alias, store_file);

        Ok(Self::new(
            key_alias,
            Secret::new(key_password),
            store_file,
            Secret::new(store_password),
        ))
    }

    pub fn key_alias(&self) -> &str {
        &self.key_alias
    }

    pub fn key_password(&self) -> &Secret {
        &self.key_password
    }

    pub fn store_file(&self) -> &Path {
        &self.store_file
    }

    pub fn store_password(&self) -> &Secret {
        &self.store_password
    }

    pub fn store_type(&self) -> KeyStoreType {
        KeyStoreType::from_path(&self.store_file)
    }

    /// Check if the keystore file exists
    pub fn store_exists(&self) -> bool {
        self.store_file.exists()
    }

    /// Log a warning when the keystore is not on disk yet
    pub(crate) fn warn_if_store_missing(&self) {
        if !self.store_exists() {
            warn!(
                "Keystore {:?} does not exist; signing will fail downstream",
                self.store_file
            );
        }
    }
}

fn required(props: &Properties, key: &str) -> Result<String> {
    match props.get(key) {
        None => Err(BuildError::credentials(key, "missing")),
        Some(value) if value.is_empty() => Err(BuildError::credentials(key, "empty value")),
        Some(value) => Ok(value.to_string()),
    }
}
