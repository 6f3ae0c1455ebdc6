//! CLI commands for R-Droid Packager
//!
//! Each command returns the text to print so it can be driven from tests
//! and scripts alike.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use r_droid_build_engine::config::CONFIG_FILE_NAME;
use r_droid_build_engine::credentials::DEFAULT_CREDENTIALS_FILE;
use r_droid_build_engine::{BuildProfileResolver, BuildVariant, PackagingConfig};

/// Descriptor output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Properties,
}

/// Resolve command options
#[derive(Debug, Clone)]
pub struct ResolveCommand {
    pub project_root: PathBuf,
    pub config: Option<PathBuf>,
    pub variant: String,
    pub credentials: Option<PathBuf>,
    pub no_credentials: bool,
    pub format: OutputFormat,
    pub expose_secrets: bool,
    pub require_release_signing: bool,
}

impl ResolveCommand {
    /// Execute the resolve command
    pub fn execute(&self) -> Result<String> {
        let config = load_config(&self.project_root, self.config.as_deref())?;

        let resolver = BuildProfileResolver::from_config(&self.project_root, &config)
            .with_release_signing_required(
                self.require_release_signing || config.require_release_signing,
            );

        let source = self.credential_source(&config);
        debug!("Credential source: {:?}", source);

        let descriptor = resolver.resolve(&self.variant, source.as_deref())?;

        let rendered = match self.format {
            OutputFormat::Json => descriptor.to_json(self.expose_secrets)?,
            OutputFormat::Properties => descriptor.to_gradle_properties(self.expose_secrets),
        };
        Ok(rendered)
    }

    /// Flag, then config file, then `<project-root>/key.properties`
    fn credential_source(&self, config: &PackagingConfig) -> Option<PathBuf> {
        if self.no_credentials {
            return None;
        }
        let path = self
            .credentials
            .clone()
            .or_else(|| config.credentials.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_FILE));
        Some(path)
    }
}

/// Variants command: list the known variants and their policy
pub struct VariantsCommand;

impl VariantsCommand {
    pub fn execute(&self) -> String {
        let mut out = String::new();
        for variant in BuildVariant::all() {
            let spec = variant.spec();
            out.push_str(&format!(
                "{:<8} minify={} shrink={} debuggable={} signing={}\n",
                variant.as_str(),
                spec.minify_enabled,
                spec.shrink_resources_enabled,
                spec.debuggable,
                if spec.signing_eligible { "optional" } else { "never" },
            ));
        }
        out
    }
}

fn load_config(project_root: &Path, explicit: Option<&Path>) -> Result<PackagingConfig> {
    let path = match explicit {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => project_root.join(path),
        None => project_root.join(CONFIG_FILE_NAME),
    };

    if explicit.is_some() && !path.exists() {
        anyhow::bail!("config file not found: {}", path.display());
    }

    PackagingConfig::load(&path)
        .with_context(|| format!("failed to load {}", path.display()))
}
