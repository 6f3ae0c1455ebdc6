//! Build Descriptor
//!
//! The resolved, read-only set of parameters handed to the Android toolchain.

use serde::Serialize;
use serde_json::{json, Value};

use crate::config::{BuildParameters, BuildType, VariantSpec};
use crate::credentials::escape;
use crate::signing::{Secret, SigningProfile};
use crate::BuildError;

/// Fully resolved build parameters for one variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildDescriptor {
    application_id: String,
    namespace: String,
    compile_sdk: u32,
    min_sdk: u32,
    target_sdk: u32,
    version_code: u32,
    version_name: String,
    jvm_target: String,
    variant: VariantSpec,
    signing: Option<SigningProfile>,
}

impl BuildDescriptor {
    pub(crate) fn new(
        parameters: &BuildParameters,
        variant: VariantSpec,
        signing: Option<SigningProfile>,
    ) -> Self {
        Self {
            application_id: parameters.application_id.clone(),
            namespace: parameters.effective_namespace().to_string(),
            compile_sdk: parameters.compile_sdk,
            min_sdk: parameters.min_sdk,
            target_sdk: parameters.target_sdk,
            version_code: parameters.version_code,
            version_name: parameters.version_name.clone(),
            jvm_target: parameters.jvm_target.clone(),
            variant,
            // Only signing-eligible variants carry a profile
            signing: signing.filter(|_| variant.signing_eligible),
        }
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn compile_sdk(&self) -> u32 {
        self.compile_sdk
    }

    pub fn min_sdk(&self) -> u32 {
        self.min_sdk
    }

    pub fn target_sdk(&self) -> u32 {
        self.target_sdk
    }

    pub fn version_code(&self) -> u32 {
        self.version_code
    }

    pub fn version_name(&self) -> &str {
        &self.version_name
    }

    pub fn jvm_target(&self) -> &str {
        &self.jvm_target
    }

    pub fn variant(&self) -> &VariantSpec {
        &self.variant
    }

    pub fn signing(&self) -> Option<&SigningProfile> {
        self.signing.as_ref()
    }

    pub fn is_signed(&self) -> bool {
        self.signing.is_some()
    }

    /// Toolchain task names for this variant, e.g. `assembleRelease`
    pub fn gradle_tasks(&self) -> [(BuildType, String); 2] {
        [BuildType::Apk, BuildType::Bundle].map(|t| (t, self.variant.gradle_task(t)))
    }

    /// Pretty JSON rendering
    pub fn to_json(&self, expose_secrets: bool) -> Result<String, BuildError> {
        let mut value = serde_json::to_value(self).map_err(|e| BuildError::Render(e.to_string()))?;

        let tasks: serde_json::Map<String, Value> = self
            .gradle_tasks()
            .into_iter()
            .map(|(t, task)| (t.as_str().to_string(), json!(task)))
            .collect();
        value["gradle_tasks"] = Value::Object(tasks);

        if let (Some(profile), Some(signing)) = (&self.signing, value.get_mut("signing")) {
            signing["store_type"] = json!(profile.store_type().as_str());
            if expose_secrets {
                signing["key_password"] = json!(profile.key_password().expose());
                signing["store_password"] = json!(profile.store_password().expose());
            }
        }

        serde_json::to_string_pretty(&value).map_err(|e| BuildError::Render(e.to_string()))
    }

    /// `key=value` lines for the Gradle side of the build, escaped so
    /// `Properties.load` reads every value back unchanged
    pub fn to_gradle_properties(&self, expose_secrets: bool) -> String {
        let mut entries: Vec<(&str, String)> = vec![
            ("android.applicationId", self.application_id.clone()),
            ("android.namespace", self.namespace.clone()),
            ("android.compileSdk", self.compile_sdk.to_string()),
            ("android.minSdk", self.min_sdk.to_string()),
            ("android.targetSdk", self.target_sdk.to_string()),
            ("android.versionCode", self.version_code.to_string()),
            ("android.versionName", self.version_name.clone()),
            ("android.jvmTarget", self.jvm_target.clone()),
            ("android.buildType", self.variant.variant.to_string()),
            ("android.minifyEnabled", self.variant.minify_enabled.to_string()),
            ("android.shrinkResources", self.variant.shrink_resources_enabled.to_string()),
            ("android.debuggable", self.variant.debuggable.to_string()),
        ];
        let [(_, apk_task), (_, bundle_task)] = self.gradle_tasks();
        entries.push(("android.assembleTask", apk_task));
        entries.push(("android.bundleTask", bundle_task));

        if let Some(ref profile) = self.signing {
            let secret = |s: &Secret| {
                if expose_secrets {
                    s.expose().to_string()
                } else {
                    s.to_string()
                }
            };
            entries.push(("android.signing.keyAlias", profile.key_alias().to_string()));
            entries.push(("android.signing.keyPassword", secret(profile.key_password())));
            entries.push(("android.signing.storeFile", profile.store_file().to_string_lossy().into_owned()));
            entries.push(("android.signing.storePassword", secret(profile.store_password())));
            entries.push(("android.signing.storeType", profile.store_type().as_str().to_string()));
        }

        entries
            .into_iter()
            .map(|(key, value)| format!("{}={}\n", escape(key, true), escape(&value, false)))
            .collect()
    }
}
