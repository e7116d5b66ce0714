//! Static build descriptor.
//!
//! The descriptor is the author-provided half of a build configuration:
//! application identity, the minimum SDK, applied plugins, language
//! compatibility, the pinned NDK and the signing decision of every variant.
//! It is usually loaded from a `buildplan.toml` document.
//!
//! ## Example Document
//!
//! ```toml
//! application_id = "com.example.aura"
//! min_sdk = 23
//! ndk_version = "27.0.12077973"
//! source_root = "../.."
//!
//! [compatibility]
//! source = "11"
//! target = "11"
//! jvm_target = "11"
//!
//! [[plugins]]
//! id = "com.android.application"
//!
//! [[plugins]]
//! id = "com.google.gms.google-services"
//!
//! [signing.profiles.upload]
//! store_file = "keystores/upload.jks"
//! store_password_env = "UPLOAD_STORE_PASSWORD"
//! key_alias = "upload"
//! key_password_env = "UPLOAD_KEY_PASSWORD"
//!
//! [variants.debug]
//! signing = "default"
//! application_id_suffix = ".debug"
//!
//! [variants.release]
//! signing = "upload"
//! minify = true
//! ```

use crate::plugins::PluginDecl;
use crate::signing::{SigningProfiles, SigningReference};
use crate::types::{ConfigError, LanguageLevel, Violation};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The static, author-provided build configuration.
///
/// Descriptors loaded through [`Descriptor::from_toml_str`] are validated
/// before they are returned. Descriptors built in code can be checked with
/// [`Descriptor::validate`]; [`crate::resolve`] validates again on every call.
///
/// Required keys default to empty values when absent so that a missing key
/// is reported by [`Descriptor::violations`] together with every other
/// problem instead of failing the parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Descriptor {
    /// Reverse-domain application id, e.g. `com.example.aura`.
    #[serde(default)]
    pub application_id: String,

    /// Code namespace. Defaults to the application id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Lowest platform version the app installs on.
    #[serde(default)]
    pub min_sdk: u32,

    /// Exact NDK version, e.g. `27.0.12077973`.
    #[serde(default)]
    pub ndk_version: String,

    /// Path of the application sources handed to the orchestrator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,

    /// Java/Kotlin compatibility levels.
    #[serde(default)]
    pub compatibility: CompatibilityOptions,

    /// Applied plugins, in declaration order.
    #[serde(default)]
    pub plugins: Vec<PluginDecl>,

    /// Configured signing profiles.
    #[serde(default)]
    pub signing: SigningProfiles,

    /// Declared variants, keyed by name.
    #[serde(default)]
    pub variants: BTreeMap<String, VariantConfig>,
}

/// Source, target and Kotlin JVM compatibility levels.
///
/// Values are kept as written so validation can report unsupported levels
/// next to every other violation instead of failing the parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompatibilityOptions {
    /// `sourceCompatibility`.
    #[serde(default)]
    pub source: String,
    /// `targetCompatibility`. Must match `source`.
    #[serde(default)]
    pub target: String,
    /// Kotlin `jvmTarget`. Must match `source` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jvm_target: Option<String>,
}

impl CompatibilityOptions {
    /// Uses one level for source, target and JVM target.
    pub fn uniform(level: LanguageLevel) -> Self {
        Self {
            source: level.as_str().to_string(),
            target: level.as_str().to_string(),
            jvm_target: Some(level.as_str().to_string()),
        }
    }

    /// Returns the shared language level.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidDescriptor`] if `source` is not a supported level.
    pub fn level(&self) -> Result<LanguageLevel, ConfigError> {
        self.source
            .parse()
            .map_err(|e: String| ConfigError::invalid("compatibility.source", e))
    }

    fn violations(&self, out: &mut Vec<Violation>) {
        let source = parse_level("compatibility.source", &self.source, out);
        let target = parse_level("compatibility.target", &self.target, out);
        let jvm_target = self
            .jvm_target
            .as_deref()
            .and_then(|value| parse_level("compatibility.jvm_target", value, out));

        let Some(source) = source else {
            return;
        };
        for (field, level) in [
            ("compatibility.target", target),
            ("compatibility.jvm_target", jvm_target),
        ] {
            if let Some(level) = level
                && level != source
            {
                out.push(Violation::new(
                    field,
                    format!("must match compatibility.source ({source}), found {level}"),
                ));
            }
        }
    }
}

fn parse_level(field: &str, value: &str, out: &mut Vec<Violation>) -> Option<LanguageLevel> {
    if value.trim().is_empty() {
        out.push(Violation::new(field, "is required"));
        return None;
    }
    match value.parse() {
        Ok(level) => Some(level),
        Err(message) => {
            out.push(Violation::new(field, message));
            None
        }
    }
}

/// Per-variant build type settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariantConfig {
    /// Signing decision. Required: use `"default"` for the ephemeral profile.
    pub signing: SigningReference,

    /// Whether the artifact is debuggable. Defaults to `true` for a variant
    /// named `debug` and `false` otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debuggable: Option<bool>,

    /// Whether code shrinking is enabled.
    #[serde(default)]
    pub minify: bool,

    /// Appended to the application id, e.g. `.debug`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id_suffix: Option<String>,

    /// Appended to the version name, e.g. `-beta`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_name_suffix: Option<String>,
}

impl VariantConfig {
    /// A variant with the given signing decision and no other overrides.
    pub fn signed_with(signing: impl Into<SigningReference>) -> Self {
        Self {
            signing: signing.into(),
            debuggable: None,
            minify: false,
            application_id_suffix: None,
            version_name_suffix: None,
        }
    }

    /// Returns whether the variant called `name` produces a debuggable artifact.
    pub fn is_debuggable(&self, name: &str) -> bool {
        self.debuggable.unwrap_or(name == "debug")
    }
}

impl Descriptor {
    /// Parses and validates a descriptor document.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Parse`] - the document is not valid TOML, has unknown keys
    ///   or a variant without a `signing` key
    /// * [`ConfigError::InvalidDescriptor`] - missing required keys and every
    ///   other broken invariant, reported together
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let descriptor: Descriptor = toml::from_str(contents)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Returns a minimal descriptor for `application_id` with `debug` and
    /// `release` variants, both signed with the default profile.
    ///
    /// Resolving the starter `release` variant logs a warning until it is
    /// pointed at a named profile.
    pub fn starter(application_id: impl Into<String>) -> Self {
        let variants = ["debug", "release"]
            .into_iter()
            .map(|name| (name.to_string(), VariantConfig::signed_with(SigningReference::Default)))
            .collect();

        Self {
            application_id: application_id.into(),
            namespace: None,
            min_sdk: 23,
            ndk_version: "27.0.12077973".to_string(),
            source_root: None,
            compatibility: CompatibilityOptions::uniform(LanguageLevel::Java11),
            plugins: vec![
                PluginDecl::new("com.android.application"),
                PluginDecl::new("kotlin-android"),
            ],
            signing: SigningProfiles::default(),
            variants,
        }
    }

    /// Returns the code namespace, falling back to the application id.
    pub fn namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or(&self.application_id)
    }

    /// Returns the declared variant names in sorted order.
    pub fn variant_names(&self) -> Vec<String> {
        self.variants.keys().cloned().collect()
    }

    /// Checks every structural invariant.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidDescriptor`] carrying every violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let violations = self.violations();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::InvalidDescriptor { violations })
        }
    }

    /// Collects every structural violation without stopping at the first.
    pub fn violations(&self) -> Vec<Violation> {
        let mut out = Vec::new();

        if self.application_id.trim().is_empty() {
            out.push(Violation::new("application_id", "is required and must not be empty"));
        } else if let Err(message) = check_identifier(&self.application_id, 2) {
            out.push(Violation::new("application_id", message));
        }

        if let Some(namespace) = &self.namespace
            && let Err(message) = check_identifier(namespace, 2)
        {
            out.push(Violation::new("namespace", message));
        }

        if self.min_sdk == 0 {
            out.push(Violation::new("min_sdk", "must be greater than zero"));
        }

        let mut seen = BTreeSet::new();
        for (index, plugin) in self.plugins.iter().enumerate() {
            let field = format!("plugins[{index}].id");
            if plugin.id.trim().is_empty() {
                out.push(Violation::new(field, "must not be empty"));
                continue;
            }
            if !seen.insert(plugin.id.as_str()) {
                let message = format!("plugin '{}' is declared twice", plugin.id);
                out.push(Violation::new(field, message));
                continue;
            }
            if let Some(floor) = plugin.effective_floor()
                && self.min_sdk > 0
                && floor > self.min_sdk
            {
                out.push(Violation::new(
                    "min_sdk",
                    format!(
                        "plugin '{}' requires min_sdk >= {floor}, found {}",
                        plugin.id, self.min_sdk
                    ),
                ));
            }
        }

        self.compatibility.violations(&mut out);

        if let Err(message) = check_pinned_version(&self.ndk_version) {
            out.push(Violation::new("ndk_version", message));
        }

        self.signing.violations(&mut out);

        if self.variants.is_empty() {
            out.push(Violation::new("variants", "at least one variant must be declared"));
        }
        for (name, variant) in &self.variants {
            let field = format!("variants.{name}");
            if name.trim().is_empty() || name.chars().any(char::is_whitespace) {
                out.push(Violation::new(
                    field.clone(),
                    "variant name must be non-empty and contain no whitespace",
                ));
            }
            if variant.signing.profile_name().trim().is_empty() {
                out.push(Violation::new(
                    format!("{field}.signing"),
                    "must name a signing profile; use \"default\" for the debug keystore",
                ));
            }
            if let Some(suffix) = &variant.application_id_suffix {
                let check = suffix
                    .strip_prefix('.')
                    .ok_or_else(|| "must start with '.'".to_string())
                    .and_then(|rest| check_identifier(rest, 1));
                if let Err(message) = check {
                    out.push(Violation::new(format!("{field}.application_id_suffix"), message));
                }
            }
            if variant
                .version_name_suffix
                .as_deref()
                .is_some_and(|suffix| suffix.trim().is_empty())
            {
                out.push(Violation::new(
                    format!("{field}.version_name_suffix"),
                    "must not be blank when set",
                ));
            }
        }

        out
    }
}

/// Checks a dot-separated identifier such as `com.example.app`.
fn check_identifier(value: &str, min_segments: usize) -> Result<(), String> {
    let segments: Vec<&str> = value.split('.').collect();
    if segments.len() < min_segments {
        return Err(format!(
            "'{value}' must have at least {min_segments} dot-separated segments"
        ));
    }
    for segment in segments {
        let mut chars = segment.chars();
        match chars.next() {
            None => return Err(format!("'{value}' contains an empty segment")),
            Some(first) if !first.is_ascii_alphabetic() => {
                return Err(format!(
                    "segment '{segment}' of '{value}' must start with a letter"
                ));
            }
            Some(_) => {}
        }
        if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(format!(
                "segment '{segment}' of '{value}' may only contain letters, digits and '_'"
            ));
        }
    }
    Ok(())
}

/// Checks that a toolchain version is an exact dotted numeric version.
fn check_pinned_version(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err("is required".to_string());
    }
    let exact = !value.is_empty()
        && value
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
    if exact {
        Ok(())
    } else {
        Err(format!(
            "'{value}' must be pinned to an exact version such as 27.0.12077973"
        ))
    }
}
