//! Android Build Engine
//!
//! Resolves packaging profiles for Android builds: the build variant, the
//! versioned app parameters and an optional release signing profile loaded
//! from a `key.properties` credential source.

pub mod config;
pub mod credentials;
pub mod signing;
pub mod descriptor;
pub mod resolver;

pub use config::{BuildVariant, BuildType, VariantSpec, BuildParameters, PackagingConfig};
pub use credentials::{CredentialSource, Properties};
pub use signing::{KeyStoreType, Secret, SigningProfile};
pub use descriptor::BuildDescriptor;
pub use resolver::BuildProfileResolver;

use std::path::PathBuf;

/// Build errors
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("unknown variant: '{0}' (expected one of {names})", names = BuildVariant::names().join(", "))]
    UnknownVariant(String),
    #[error("invalid credentials: {field}: {reason}")]
    InvalidCredentials { field: String, reason: String },
    #[error("credential source unreadable: {}", .path.display())]
    CredentialSourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid build parameters: {field}: {reason}")]
    InvalidParameters { field: &'static str, reason: String },
    #[error("missing signing profile: release signing is required but no credential source was found")]
    MissingSigningProfile,
    #[error("configuration error: {0}")]
    Config(String),
    #[error("render error: {0}")]
    Render(String),
}

impl BuildError {
    pub(crate) fn credentials(field: impl Into<String>, reason: impl Into<String>) -> Self {
        BuildError::InvalidCredentials {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn parameters(field: &'static str, reason: impl Into<String>) -> Self {
        BuildError::InvalidParameters {
            field,
            reason: reason.into(),
        }
    }

    /// Short machine-friendly name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            BuildError::UnknownVariant(_) => "UnknownVariant",
            BuildError::InvalidCredentials { .. } => "InvalidCredentials",
            BuildError::CredentialSourceUnreadable { .. } => "CredentialSourceUnreadable",
            BuildError::InvalidParameters { .. } => "InvalidParameters",
            BuildError::MissingSigningProfile => "MissingSigningProfile",
            BuildError::Config(_) => "Config",
            BuildError::Render(_) => "Render",
        }
    }
}

/// Result type alias for build engine operations
pub type Result<T> = std::result::Result<T, BuildError>;
