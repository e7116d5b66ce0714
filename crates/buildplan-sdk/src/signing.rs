//! Signing profiles and per-variant signing references
//!
//! The configured profile set always contains a default profile: the
//! ephemeral debug keystore the build tool generates on demand. Any number of
//! named profiles may be declared next to it. Passwords are never stored in a
//! descriptor; profiles name the environment variables that hold them.

use crate::types::Violation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Reserved name of the default profile, also used as the sentinel value of
/// [`SigningReference::Default`] in descriptor documents.
pub const DEFAULT_PROFILE_NAME: &str = "default";

/// A credential set used to sign a produced artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SigningProfile {
    /// Keystore file, relative to the project root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_file: Option<PathBuf>,

    /// Environment variable holding the keystore password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_password_env: Option<String>,

    /// Alias of the signing key inside the keystore.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_alias: Option<String>,

    /// Environment variable holding the key password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_password_env: Option<String>,

    /// Whether the build tool generates this keystore itself (debug keystore).
    #[serde(default)]
    pub ephemeral: bool,
}

impl SigningProfile {
    /// The build tool's generated debug keystore.
    pub fn ephemeral() -> Self {
        Self {
            store_file: None,
            store_password_env: None,
            key_alias: None,
            key_password_env: None,
            ephemeral: true,
        }
    }

    fn violations(&self, field: &str, out: &mut Vec<Violation>) {
        if self.ephemeral {
            return;
        }
        if self.store_file.is_none() {
            out.push(Violation::new(
                format!("{field}.store_file"),
                "required unless the profile is ephemeral",
            ));
        }
        if self.key_alias.as_deref().is_none_or(str::is_empty) {
            out.push(Violation::new(
                format!("{field}.key_alias"),
                "required unless the profile is ephemeral",
            ));
        }
    }
}

impl Default for SigningProfile {
    fn default() -> Self {
        Self::ephemeral()
    }
}

/// The configured set of signing profiles.
///
/// The default profile is a plain field rather than a map entry, so a
/// profile set without one cannot be constructed or deserialized.
///
/// ```toml
/// [signing.profiles.upload]
/// store_file = "keystores/upload.jks"
/// store_password_env = "UPLOAD_STORE_PASSWORD"
/// key_alias = "upload"
/// key_password_env = "UPLOAD_KEY_PASSWORD"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SigningProfiles {
    /// Profile used by variants whose reference is [`SigningReference::Default`].
    ///
    /// Absent from a document, this is the ephemeral keystore. A
    /// `[signing.default]` table replaces it as a whole, and a table without
    /// `ephemeral = true` is a regular profile that needs `store_file` and
    /// `key_alias`.
    pub default: SigningProfile,

    /// Named profiles, keyed by name.
    pub profiles: BTreeMap<String, SigningProfile>,
}

impl SigningProfiles {
    /// Returns the default profile.
    pub fn default_profile(&self) -> &SigningProfile {
        &self.default
    }

    /// Looks up the profile a reference points at, with its name.
    ///
    /// A named reference only matches a named profile. It never falls back
    /// to the default profile.
    pub fn lookup(&self, reference: &SigningReference) -> Option<(&str, &SigningProfile)> {
        match reference {
            SigningReference::Default => Some((DEFAULT_PROFILE_NAME, &self.default)),
            SigningReference::Named(name) => self
                .profiles
                .get_key_value(name)
                .map(|(name, profile)| (name.as_str(), profile)),
        }
    }

    /// Appends every structural problem of the profile set to `out`.
    pub(crate) fn violations(&self, out: &mut Vec<Violation>) {
        self.default.violations("signing.default", out);
        for (name, profile) in &self.profiles {
            let field = format!("signing.profiles.{name}");
            if name.trim().is_empty() {
                out.push(Violation::new(field.clone(), "profile name must not be empty"));
            } else if name == DEFAULT_PROFILE_NAME {
                out.push(Violation::new(
                    field.clone(),
                    "'default' is reserved; configure it under [signing.default]",
                ));
            }
            profile.violations(&field, out);
        }
    }
}

/// Which profile a variant is signed with.
///
/// In descriptor documents this is always written explicitly: the sentinel
/// string `"default"` selects the default profile, anything else names a
/// profile under `[signing.profiles]`.
///
/// ```
/// use buildplan_sdk::SigningReference;
///
/// assert_eq!(SigningReference::from("default"), SigningReference::Default);
/// assert_eq!(
///     SigningReference::from("upload"),
///     SigningReference::Named("upload".to_string())
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SigningReference {
    /// Use the default (ephemeral) profile.
    Default,
    /// Use the named profile, which must be configured.
    Named(String),
}

impl SigningReference {
    /// Returns the profile name this reference selects.
    pub fn profile_name(&self) -> &str {
        match self {
            SigningReference::Default => DEFAULT_PROFILE_NAME,
            SigningReference::Named(name) => name,
        }
    }
}

impl From<String> for SigningReference {
    fn from(value: String) -> Self {
        if value == DEFAULT_PROFILE_NAME {
            SigningReference::Default
        } else {
            SigningReference::Named(value)
        }
    }
}

impl From<&str> for SigningReference {
    fn from(value: &str) -> Self {
        SigningReference::from(value.to_string())
    }
}

impl From<SigningReference> for String {
    fn from(reference: SigningReference) -> Self {
        match reference {
            SigningReference::Default => DEFAULT_PROFILE_NAME.to_string(),
            SigningReference::Named(name) => name,
        }
    }
}

impl fmt::Display for SigningReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile_name())
    }
}
