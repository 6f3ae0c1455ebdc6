//! Build Configuration
//!
//! Defines build variants, versioned app parameters and the
//! `packaging.toml` project file.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{BuildError, Result};

/// Default name of the project packaging file
pub const CONFIG_FILE_NAME: &str = "packaging.toml";

/// Build variant (debug/profile/release)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildVariant {
    #[default]
    Debug,
    Profile,
    Release,
}

impl BuildVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildVariant::Debug => "debug",
            BuildVariant::Profile => "profile",
            BuildVariant::Release => "release",
        }
    }

    pub fn gradle_task_suffix(&self) -> &'static str {
        match self {
            BuildVariant::Debug => "Debug",
            BuildVariant::Profile => "Profile",
            BuildVariant::Release => "Release",
        }
    }

    pub fn all() -> &'static [BuildVariant] {
        &[BuildVariant::Debug, BuildVariant::Profile, BuildVariant::Release]
    }

    pub fn names() -> Vec<&'static str> {
        Self::all().iter().map(BuildVariant::as_str).collect()
    }

    /// Static packaging policy for this variant
    pub fn spec(&self) -> VariantSpec {
        match self {
            BuildVariant::Debug => VariantSpec {
                variant: BuildVariant::Debug,
                minify_enabled: false,
                shrink_resources_enabled: false,
                debuggable: true,
                signing_eligible: false,
            },
            BuildVariant::Profile => VariantSpec {
                variant: BuildVariant::Profile,
                minify_enabled: false,
                shrink_resources_enabled: false,
                debuggable: false,
                signing_eligible: false,
            },
            // Minify and shrink are off for every variant, release included.
            BuildVariant::Release => VariantSpec {
                variant: BuildVariant::Release,
                minify_enabled: false,
                shrink_resources_enabled: false,
                debuggable: false,
                signing_eligible: true,
            },
        }
    }
}

impl FromStr for BuildVariant {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| BuildError::UnknownVariant(s.to_string()))
    }
}

impl std::fmt::Display for BuildVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build type (APK or AAB)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BuildType {
    #[default]
    Apk,
    Bundle, // AAB
}

impl BuildType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildType::Apk => "apk",
            BuildType::Bundle => "bundle",
        }
    }
}

/// Per-variant packaging policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VariantSpec {
    pub variant: BuildVariant,
    pub minify_enabled: bool,
    pub shrink_resources_enabled: bool,
    pub debuggable: bool,
    /// Whether a signing profile may be attached
    pub signing_eligible: bool,
}

impl VariantSpec {
    pub fn gradle_task(&self, build_type: BuildType) -> String {
        let suffix = self.variant.gradle_task_suffix();
        match build_type {
            BuildType::Apk => format!("assemble{}", suffix),
            BuildType::Bundle => format!("bundle{}", suffix),
        }
    }
}

/// Versioned app parameters shared by every variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildParameters {
    /// Application ID (package name)
    pub application_id: String,

    /// Code namespace, defaults to the application ID
    pub namespace: Option<String>,

    /// Compile SDK version
    pub compile_sdk: u32,

    /// Minimum SDK version
    pub min_sdk: u32,

    /// Target SDK version
    pub target_sdk: u32,

    /// Version code
    pub version_code: u32,

    /// Version name
    pub version_name: String,

    /// JVM bytecode target
    pub jvm_target: String,
}

impl Default for BuildParameters {
    fn default() -> Self {
        Self {
            application_id: "com.example.app".to_string(),
            namespace: None,
            compile_sdk: 36,
            min_sdk: 21,
            target_sdk: 36,
            version_code: 1,
            version_name: "1.0.0".to_string(),
            jvm_target: "11".to_string(),
        }
    }
}

impl BuildParameters {
    /// Effective namespace
    pub fn effective_namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or(&self.application_id)
    }

    /// Check the parameters for values the toolchain would reject
    pub fn validate(&self) -> Result<()> {
        validate_package_name("application_id", &self.application_id)?;
        if let Some(ref namespace) = self.namespace {
            validate_package_name("namespace", namespace)?;
        }

        if self.version_code == 0 {
            return Err(BuildError::parameters("version_code", "must be greater than 0"));
        }
        if self.version_name.trim().is_empty() {
            return Err(BuildError::parameters("version_name", "must not be empty"));
        }
        if self.jvm_target.trim().is_empty() {
            return Err(BuildError::parameters("jvm_target", "must not be empty"));
        }
        if self.min_sdk > self.target_sdk {
            return Err(BuildError::parameters(
                "min_sdk",
                format!("{} is above target_sdk {}", self.min_sdk, self.target_sdk),
            ));
        }
        if self.target_sdk > self.compile_sdk {
            return Err(BuildError::parameters(
                "target_sdk",
                format!("{} is above compile_sdk {}", self.target_sdk, self.compile_sdk),
            ));
        }

        Ok(())
    }
}

fn validate_package_name(field: &'static str, name: &str) -> Result<()> {
    let segments: Vec<&str> = name.split('.').collect();
    if segments.len() < 2 {
        return Err(BuildError::parameters(
            field,
            format!("'{}' needs at least two dot-separated segments", name),
        ));
    }

    for segment in segments {
        let valid = segment
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
            && segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(BuildError::parameters(
                field,
                format!("'{}' has an invalid segment '{}'", name, segment),
            ));
        }
    }

    Ok(())
}

/// Contents of `packaging.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackagingConfig {
    /// Credential source, relative to the project root
    pub credentials: Option<PathBuf>,

    /// Fail release resolution when no signing profile is available
    pub require_release_signing: bool,

    /// App parameters
    pub app: BuildParameters,
}

impl PackagingConfig {
    /// Parse a config from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| BuildError::Config(e.to_string()))
    }

    /// Load a config file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                debug!("Loading packaging config from {:?}", path);
                Self::from_toml(&content)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No packaging config at {:?}, using defaults", path);
                Ok(Self::default())
            }
            Err(e) => Err(BuildError::Config(format!("{}: {}", path.display(), e))),
        }
    }
}
