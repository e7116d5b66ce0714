//! Variant resolution
//!
//! Merges a [`Descriptor`], a set of [`DynamicInputs`] and a variant name into
//! a fully concrete [`ResolvedBuildProfile`]. Resolution is a pure function of
//! its arguments: it performs no I/O and holds no state between calls, so
//! variants may be resolved in parallel by the caller.

use crate::descriptor::Descriptor;
use crate::inputs::DynamicInputs;
use crate::signing::SigningProfile;
use crate::types::{ConfigError, LanguageLevel};
use serde::{Deserialize, Serialize};

/// The merged configuration of one variant.
///
/// Every field is owned. Changing the descriptor or the inputs after a call
/// to [`resolve`] never affects a profile it already returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedBuildProfile {
    /// Variant name, e.g. `release`.
    pub variant: String,
    /// Application id including the variant's suffix.
    pub application_id: String,
    /// Code namespace.
    pub namespace: String,
    pub min_sdk: u32,
    pub compile_sdk: u32,
    pub target_sdk: u32,
    pub version_code: u32,
    /// Version name including the variant's suffix.
    pub version_name: String,
    /// Shared source/target compatibility level.
    pub language_level: LanguageLevel,
    /// Kotlin `jvmTarget`, always equal to `language_level`.
    pub jvm_target: String,
    pub ndk_version: String,
    /// Applied plugin ids, in declaration order.
    pub plugins: Vec<String>,
    /// Name of the selected signing profile (`default` for the default profile).
    pub signing_profile: String,
    /// The selected signing profile.
    pub signing: SigningProfile,
    /// Whether the default profile was selected.
    pub signing_is_default: bool,
    pub debuggable: bool,
    pub minify: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,
}

/// Resolves one variant into a concrete build profile.
///
/// Steps, each failing the whole call:
///
/// 1. Validate the descriptor ([`ConfigError::InvalidDescriptor`], all violations)
/// 2. Check inputs against `min_sdk` ([`ConfigError::IncompatiblePlatformVersion`],
///    [`ConfigError::InvalidInputs`])
/// 3. Look up the variant ([`ConfigError::UnknownVariant`])
/// 4. Look up its signing profile ([`ConfigError::MissingSigningProfile`])
/// 5. Copy everything into a [`ResolvedBuildProfile`]
///
/// # Example
///
/// ```
/// use buildplan_sdk::{Descriptor, DynamicInputs, resolve};
///
/// let descriptor = Descriptor::starter("com.example.app");
/// let inputs = DynamicInputs::new(34, 34, 7, "1.2.0");
///
/// let profile = resolve(&descriptor, &inputs, "debug")?;
/// assert_eq!(profile.application_id, "com.example.app");
/// assert_eq!(profile.compile_sdk, 34);
/// assert!(profile.signing_is_default);
/// # Ok::<(), buildplan_sdk::ConfigError>(())
/// ```
pub fn resolve(
    descriptor: &Descriptor,
    inputs: &DynamicInputs,
    variant: &str,
) -> Result<ResolvedBuildProfile, ConfigError> {
    descriptor.validate()?;
    inputs.check_against(descriptor.min_sdk)?;
    resolve_checked(descriptor, inputs, variant)
}

/// Resolves every declared variant, in name order.
///
/// The descriptor and inputs are validated once. The first failing variant
/// fails the whole call.
pub fn resolve_all(
    descriptor: &Descriptor,
    inputs: &DynamicInputs,
) -> Result<Vec<ResolvedBuildProfile>, ConfigError> {
    descriptor.validate()?;
    inputs.check_against(descriptor.min_sdk)?;
    descriptor
        .variants
        .keys()
        .map(|variant| resolve_checked(descriptor, inputs, variant))
        .collect()
}

/// Checks that every named signing reference points at a configured profile.
///
/// # Errors
///
/// [`ConfigError::MissingSigningProfile`] for the first variant, in name
/// order, whose profile is missing.
pub fn verify_signing(descriptor: &Descriptor) -> Result<(), ConfigError> {
    for (variant, config) in &descriptor.variants {
        if descriptor.signing.lookup(&config.signing).is_none() {
            return Err(missing_profile(variant, config.signing.profile_name()));
        }
    }
    Ok(())
}

fn missing_profile(variant: &str, profile: &str) -> ConfigError {
    ConfigError::MissingSigningProfile {
        variant: variant.to_string(),
        profile: profile.to_string(),
    }
}

fn resolve_checked(
    descriptor: &Descriptor,
    inputs: &DynamicInputs,
    variant: &str,
) -> Result<ResolvedBuildProfile, ConfigError> {
    tracing::debug!(
        variant,
        compile_sdk = inputs.compile_sdk,
        target_sdk = inputs.target_sdk,
        "resolving build variant"
    );

    let config = descriptor
        .variants
        .get(variant)
        .filter(|_| !variant.is_empty())
        .ok_or_else(|| ConfigError::UnknownVariant {
            name: variant.to_string(),
            available: descriptor.variant_names(),
        })?;

    let (profile_name, profile) = descriptor
        .signing
        .lookup(&config.signing)
        .ok_or_else(|| missing_profile(variant, config.signing.profile_name()))?;

    let debuggable = config.is_debuggable(variant);
    let signing_is_default = profile_name == crate::signing::DEFAULT_PROFILE_NAME;
    if signing_is_default && !debuggable {
        tracing::warn!(
            variant,
            "non-debuggable variant is signed with the default ephemeral profile"
        );
    }

    let language_level = descriptor.compatibility.level()?;
    let application_id = match &config.application_id_suffix {
        Some(suffix) => format!("{}{suffix}", descriptor.application_id),
        None => descriptor.application_id.clone(),
    };
    let version_name = match &config.version_name_suffix {
        Some(suffix) => format!("{}{suffix}", inputs.version_name),
        None => inputs.version_name.clone(),
    };

    tracing::debug!(variant, profile = profile_name, %application_id, "variant resolved");

    Ok(ResolvedBuildProfile {
        variant: variant.to_string(),
        application_id,
        namespace: descriptor.namespace().to_string(),
        min_sdk: descriptor.min_sdk,
        compile_sdk: inputs.compile_sdk,
        target_sdk: inputs.target_sdk,
        version_code: inputs.version_code,
        version_name,
        language_level,
        jvm_target: language_level.as_str().to_string(),
        ndk_version: descriptor.ndk_version.clone(),
        plugins: descriptor.plugins.iter().map(|p| p.id.clone()).collect(),
        signing_profile: profile_name.to_string(),
        signing: profile.clone(),
        signing_is_default,
        debuggable,
        minify: config.minify,
        source_root: descriptor.source_root.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::VariantConfig;
    use crate::signing::SigningReference;
    use crate::types::PlatformMismatch;
    use std::path::PathBuf;

    fn upload_profile() -> SigningProfile {
        SigningProfile {
            store_file: Some(PathBuf::from("keystores/upload.jks")),
            store_password_env: Some("UPLOAD_STORE_PASSWORD".to_string()),
            key_alias: Some("upload".to_string()),
            key_password_env: None,
            ephemeral: false,
        }
    }

    fn descriptor() -> Descriptor {
        let mut descriptor = Descriptor::starter("com.example.aura");
        descriptor
            .signing
            .profiles
            .insert("upload".to_string(), upload_profile());
        descriptor.variants.insert(
            "release".to_string(),
            VariantConfig {
                minify: true,
                ..VariantConfig::signed_with("upload")
            },
        );
        descriptor.variants.insert(
            "staging".to_string(),
            VariantConfig {
                application_id_suffix: Some(".staging".to_string()),
                version_name_suffix: Some("-rc".to_string()),
                ..VariantConfig::signed_with(SigningReference::Default)
            },
        );
        descriptor
    }

    fn inputs() -> DynamicInputs {
        DynamicInputs::new(34, 34, 7, "1.2.0")
    }

    #[test]
    fn test_resolve_release_with_named_profile() {
        let profile = resolve(&descriptor(), &inputs(), "release").unwrap();

        assert_eq!(profile.variant, "release");
        assert_eq!(profile.application_id, "com.example.aura");
        assert_eq!(profile.namespace, "com.example.aura");
        assert_eq!(profile.signing_profile, "upload");
        assert_eq!(profile.signing, upload_profile());
        assert!(!profile.signing_is_default);
        assert!(!profile.debuggable);
        assert!(profile.minify);
        assert_eq!(profile.language_level, LanguageLevel::Java11);
        assert_eq!(profile.jvm_target, "11");
        assert_eq!(profile.plugins, vec!["com.android.application", "kotlin-android"]);
    }

    #[test]
    fn test_resolve_applies_suffixes() {
        let profile = resolve(&descriptor(), &inputs(), "staging").unwrap();
        assert_eq!(profile.application_id, "com.example.aura.staging");
        assert_eq!(profile.version_name, "1.2.0-rc");
        assert_eq!(profile.namespace, "com.example.aura");
        assert!(profile.signing_is_default);
    }

    #[test]
    fn test_missing_named_profile_is_not_defaulted() {
        let mut descriptor = descriptor();
        descriptor.signing.profiles.clear();

        let err = resolve(&descriptor, &inputs(), "release").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingSigningProfile { ref variant, ref profile }
                if variant == "release" && profile == "upload"
        ));
        assert!(matches!(
            verify_signing(&descriptor),
            Err(ConfigError::MissingSigningProfile { .. })
        ));
        // Variants signed with the default profile still resolve.
        assert!(resolve(&descriptor, &inputs(), "debug").is_ok());
    }

    #[test]
    fn test_empty_variant_name_is_unknown() {
        assert!(matches!(
            resolve(&descriptor(), &inputs(), ""),
            Err(ConfigError::UnknownVariant { .. })
        ));

        // Declaring an empty name is itself a descriptor violation.
        let mut with_empty = descriptor();
        with_empty
            .variants
            .insert(String::new(), VariantConfig::signed_with(SigningReference::Default));
        assert!(matches!(
            resolve(&with_empty, &inputs(), ""),
            Err(ConfigError::InvalidDescriptor { .. })
        ));
    }

    #[test]
    fn test_invalid_descriptor_wins_over_inputs() {
        let mut descriptor = descriptor();
        descriptor.application_id = "aura".to_string();
        let old = DynamicInputs::new(20, 20, 1, "1.0");

        assert!(matches!(
            resolve(&descriptor, &old, "debug"),
            Err(ConfigError::InvalidDescriptor { .. })
        ));
    }

    #[test]
    fn test_resolve_all_in_name_order() {
        let profiles = resolve_all(&descriptor(), &inputs()).unwrap();
        let names: Vec<_> = profiles.iter().map(|p| p.variant.as_str()).collect();
        assert_eq!(names, vec!["debug", "release", "staging"]);
    }

    #[test]
    fn test_resolve_all_checks_floor() {
        let result = resolve_all(&descriptor(), &DynamicInputs::new(21, 21, 1, "1.0"));
        assert!(matches!(
            result,
            Err(ConfigError::IncompatiblePlatformVersion(
                PlatformMismatch::CompileBelowFloor { compile_sdk: 21, min_sdk: 23 }
            ))
        ));
    }

    #[test]
    fn test_profile_serializes_to_json() {
        let profile = resolve(&descriptor(), &inputs(), "release").unwrap();
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["language_level"], "11");
        assert_eq!(json["signing_profile"], "upload");
        assert_eq!(json["signing"]["key_alias"], "upload");
        assert!(json.get("source_root").is_none());
    }
}
