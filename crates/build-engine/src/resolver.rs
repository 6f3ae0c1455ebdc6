//! Build Profile Resolver
//!
//! Turns a variant name and an optional credential source into a
//! [`BuildDescriptor`].

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::{BuildParameters, BuildVariant, PackagingConfig};
use crate::credentials::CredentialSource;
use crate::descriptor::BuildDescriptor;
use crate::signing::SigningProfile;
use crate::{BuildError, Result};

/// Resolves build descriptors for a project
#[derive(Debug, Clone)]
pub struct BuildProfileResolver {
    project_root: PathBuf,
    parameters: BuildParameters,
    require_release_signing: bool,
}

impl BuildProfileResolver {
    /// Create a new resolver
    pub fn new(project_root: impl Into<PathBuf>, parameters: BuildParameters) -> Self {
        Self {
            project_root: project_root.into(),
            parameters,
            require_release_signing: false,
        }
    }

    /// Create from a loaded `packaging.toml`
    pub fn from_config(project_root: impl Into<PathBuf>, config: &PackagingConfig) -> Self {
        Self::new(project_root, config.app.clone())
            .with_release_signing_required(config.require_release_signing)
    }

    /// Fail release resolution instead of producing an unsigned release
    pub fn with_release_signing_required(mut self, required: bool) -> Self {
        self.require_release_signing = required;
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn parameters(&self) -> &BuildParameters {
        &self.parameters
    }

    /// Resolve one variant.
    ///
    /// A credential source that does not exist is treated the same as no
    /// source at all. Credentials are validated before the variant is looked
    /// up, so a broken source fails for every variant.
    pub fn resolve(&self, variant_name: &str, credential_source: Option<&Path>) -> Result<BuildDescriptor> {
        self.parameters.validate()?;

        let signing = match credential_source {
            Some(path) => self.load_signing(path)?,
            None => None,
        };

        let variant: BuildVariant = variant_name.parse()?;
        let spec = variant.spec();

        let signing = if spec.signing_eligible {
            match signing {
                Some(profile) => {
                    profile.warn_if_store_missing();
                    Some(profile)
                }
                None if self.require_release_signing => return Err(BuildError::MissingSigningProfile),
                None => {
                    warn!("Resolving {} without a signing profile; the artifact will be unsigned", variant);
                    None
                }
            }
        } else {
            if signing.is_some() {
                debug!("Ignoring signing profile for {} variant", variant);
            }
            None
        };

        let descriptor = BuildDescriptor::new(&self.parameters, spec, signing);
        info!(
            "Resolved {} {} ({}) signed={}",
            descriptor.application_id(),
            variant,
            descriptor.version_name(),
            descriptor.is_signed()
        );
        Ok(descriptor)
    }

    fn load_signing(&self, path: &Path) -> Result<Option<SigningProfile>> {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        };

        match CredentialSource::new(path).load()? {
            Some(props) => SigningProfile::from_properties(&props, &self.project_root).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::escape;
    use crate::signing::{KEY_ALIAS, KEY_PASSWORD, STORE_FILE, STORE_PASSWORD};
    use std::fs;
    use tempfile::TempDir;

    const FULL: &str = "storePassword=store-pass\nkeyPassword=key-pass\nkeyAlias=upload\nstoreFile=upload-keystore.jks\n";

    fn project() -> (TempDir, BuildProfileResolver) {
        let dir = tempfile::tempdir().unwrap();
        let resolver = BuildProfileResolver::new(dir.path(), BuildParameters::default());
        (dir, resolver)
    }

    fn write_source(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("key.properties");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_every_variant_resolves_without_source() {
        let (_dir, resolver) = project();
        for variant in BuildVariant::names() {
            let d = resolver.resolve(variant, None).unwrap();
            assert!(d.signing().is_none());
            assert_eq!(d.variant().variant.as_str(), variant);
        }
    }

    #[test]
    fn test_absent_source_file_is_not_an_error() {
        let (dir, resolver) = project();
        let missing = dir.path().join("key.properties");
        let d = resolver.resolve("release", Some(&missing)).unwrap();
        assert!(!d.is_signed());
    }

    #[test]
    fn test_release_attaches_profile() {
        let (dir, resolver) = project();
        let source = write_source(&dir, FULL);

        let d = resolver.resolve("Release", Some(&source)).unwrap();
        let profile = d.signing().unwrap();
        assert_eq!(profile.key_alias(), "upload");
        assert_eq!(profile.key_password().expose(), "key-pass");
        assert_eq!(profile.store_file(), dir.path().join("upload-keystore.jks"));
        assert_eq!(profile.store_password().expose(), "store-pass");
    }

    #[test]
    fn test_relative_source_is_under_project_root() {
        let (dir, resolver) = project();
        write_source(&dir, FULL);
        let d = resolver.resolve("release", Some(Path::new("key.properties"))).unwrap();
        assert!(d.is_signed());
    }

    #[test]
    fn test_debug_never_signed() {
        let (dir, resolver) = project();
        let source = write_source(&dir, FULL);
        assert!(!resolver.resolve("debug", Some(&source)).unwrap().is_signed());
        assert!(!resolver.resolve("profile", Some(&source)).unwrap().is_signed());
    }

    #[test]
    fn test_incomplete_source_fails_for_every_variant() {
        let lines = [
            (KEY_ALIAS, "upload"),
            (KEY_PASSWORD, "key-pass"),
            (STORE_FILE, "upload.jks"),
            (STORE_PASSWORD, "store-pass"),
        ];

        for skip in 0..lines.len() {
            let content: String = lines
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != skip)
                .map(|(_, (k, v))| format!("{}={}\n", k, v))
                .collect();

            let (dir, resolver) = project();
            let source = write_source(&dir, &content);

            for variant in BuildVariant::names() {
                match resolver.resolve(variant, Some(&source)) {
                    Err(BuildError::InvalidCredentials { field, .. }) => assert_eq!(field, lines[skip].0),
                    other => panic!("{variant}: unexpected result {other:?}"),
                }
            }
        }
    }

    #[test]
    fn test_unknown_variant_for_any_source() {
        let (dir, resolver) = project();
        assert!(matches!(
            resolver.resolve("nonexistent-variant", None),
            Err(BuildError::UnknownVariant(_))
        ));

        let missing = dir.path().join("missing.properties");
        assert!(matches!(
            resolver.resolve("nonexistent-variant", Some(&missing)),
            Err(BuildError::UnknownVariant(_))
        ));

        let source = write_source(&dir, FULL);
        assert!(matches!(
            resolver.resolve("nonexistent-variant", Some(&source)),
            Err(BuildError::UnknownVariant(name)) if name == "nonexistent-variant"
        ));
    }

    #[test]
    fn test_unreadable_source() {
        let (dir, resolver) = project();
        let as_dir = dir.path().join("key.properties");
        fs::create_dir(&as_dir).unwrap();
        assert!(matches!(
            resolver.resolve("release", Some(&as_dir)),
            Err(BuildError::CredentialSourceUnreadable { .. })
        ));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let (dir, resolver) = project();
        let source = write_source(&dir, FULL);
        for variant in BuildVariant::names() {
            let first = resolver.resolve(variant, Some(&source)).unwrap();
            let second = resolver.resolve(variant, Some(&source)).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_quadruple_round_trip() {
        let quadruples = [
            ("upload", "k", "/abs/store.jks", "s"),
            ("my alias", " leading space", "rel/dir/ks.p12", "trailing  "),
            ("a=b:c", "#not-a-comment", "/x/y\\z.jks", "ünïcödé\tpass"),
            ("alias", "   ", "ks.jks", " \t "),
            ("\u{1F511}", "p\u{1F600}", "keys/\u{1F4C1}.jks", "\\\n"),
        ];

        for (alias, key_pass, store, store_pass) in quadruples {
            let (dir, resolver) = project();
            let content = format!(
                "{}={}\n{}={}\n{}={}\n{}={}\n",
                KEY_ALIAS,
                escape(alias, false),
                KEY_PASSWORD,
                escape(key_pass, false),
                STORE_FILE,
                escape(store, false),
                STORE_PASSWORD,
                escape(store_pass, false),
            );
            let source = write_source(&dir, &content);

            let d = resolver.resolve("release", Some(&source)).unwrap();
            let profile = d.signing().unwrap();
            assert_eq!(profile.key_alias(), alias);
            assert_eq!(profile.key_password().expose(), key_pass);
            assert_eq!(profile.store_file(), dir.path().join(store));
            assert_eq!(profile.store_password().expose(), store_pass);
        }
    }

    #[test]
    fn test_required_release_signing() {
        let (dir, resolver) = project();
        let resolver = resolver.with_release_signing_required(true);

        assert!(matches!(
            resolver.resolve("release", None),
            Err(BuildError::MissingSigningProfile)
        ));
        assert!(resolver.resolve("debug", None).is_ok());

        let source = write_source(&dir, FULL);
        assert!(resolver.resolve("release", Some(&source)).unwrap().is_signed());
    }

    #[test]
    fn test_parameters_flow_into_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let config = PackagingConfig::from_toml(
            "[app]\napplication_id = \"com.kavin200506.collegemate\"\nversion_code = 3\nversion_name = \"1.0.2\"\n",
        )
        .unwrap();
        let resolver = BuildProfileResolver::from_config(dir.path(), &config);

        let d = resolver.resolve("release", None).unwrap();
        assert_eq!(d.application_id(), "com.kavin200506.collegemate");
        assert_eq!(d.namespace(), "com.kavin200506.collegemate");
        assert_eq!(d.compile_sdk(), 36);
        assert_eq!(d.target_sdk(), 36);
        assert_eq!(d.min_sdk(), 21);
        assert_eq!(d.version_code(), 3);
        assert_eq!(d.version_name(), "1.0.2");
        assert_eq!(d.jvm_target(), "11");
    }

    #[test]
    fn test_invalid_parameters_fail_first() {
        let dir = tempfile::tempdir().unwrap();
        let params = BuildParameters {
            version_code: 0,
            ..Default::default()
        };
        let resolver = BuildProfileResolver::new(dir.path(), params);
        assert!(matches!(
            resolver.resolve("debug", None),
            Err(BuildError::InvalidParameters { field: "version_code", .. })
        ));
    }
}
