//! Core types for buildplan-sdk.
//!
//! This module defines the fundamental types shared by the descriptor,
//! input and resolver modules:
//!
//! - [`ConfigError`] - Error taxonomy for descriptor loading and variant resolution
//! - [`Violation`] - A single structural problem found while validating a descriptor
//! - [`PlatformMismatch`] - Why a set of dynamic inputs does not fit the descriptor
//! - [`LanguageLevel`] - Supported Java/Kotlin compatibility levels

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error types for buildplan-sdk operations.
///
/// Every error is terminal for the resolution call that produced it. None of
/// them describe transient conditions, so callers should report them rather
/// than retry.
///
/// # Example
///
/// ```
/// use buildplan_sdk::{ConfigError, Descriptor, DynamicInputs, resolve};
///
/// let descriptor = Descriptor::from_toml_str(r#"
/// application_id = "com.example.app"
/// min_sdk = 23
/// ndk_version = "27.0.12077973"
///
/// [compatibility]
/// source = "11"
/// target = "11"
///
/// [variants.debug]
/// signing = "default"
/// "#)?;
///
/// let inputs = DynamicInputs::new(34, 34, 7, "1.2.0");
///
/// match resolve(&descriptor, &inputs, "beta") {
///     Err(ConfigError::UnknownVariant { name, available }) => {
///         assert_eq!(name, "beta");
///         assert_eq!(available, vec!["debug".to_string()]);
///     }
///     other => panic!("unexpected result: {other:?}"),
/// }
/// # Ok::<(), ConfigError>(())
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The descriptor breaks one or more structural invariants.
    ///
    /// Validation never stops at the first problem: every violated field is
    /// listed so the descriptor can be fixed in a single pass.
    #[error(
        "invalid descriptor ({} violation(s)):\n{}",
        .violations.len(),
        format_violations(.violations)
    )]
    InvalidDescriptor {
        /// All violations found, in field order.
        violations: Vec<Violation>,
    },

    /// The dynamic platform versions do not fit the descriptor's floor.
    #[error("incompatible platform version: {0}")]
    IncompatiblePlatformVersion(PlatformMismatch),

    /// The requested variant is not declared in the descriptor.
    ///
    /// This is never defaulted: a request for an undeclared variant means the
    /// build scripts and the descriptor have drifted apart.
    #[error("unknown variant '{name}'. Declared variants: {available:?}")]
    UnknownVariant {
        /// The variant name that was requested.
        name: String,
        /// Variant names the descriptor declares, sorted.
        available: Vec<String>,
    },

    /// A variant names a signing profile that is not configured.
    ///
    /// An explicitly named profile is never replaced by the default one.
    #[error(
        "variant '{variant}' is signed with profile '{profile}', \
         which is not configured under [signing.profiles]"
    )]
    MissingSigningProfile {
        /// The variant whose signing reference could not be satisfied.
        variant: String,
        /// The profile name it references.
        profile: String,
    },

    /// A dynamic input scalar is malformed (zero version code, empty version name).
    #[error("invalid dynamic inputs: {0}")]
    InvalidInputs(String),

    /// The descriptor document could not be parsed.
    #[error("failed to parse descriptor: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ConfigError {
    /// Builds an [`ConfigError::InvalidDescriptor`] from a single violation.
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::InvalidDescriptor {
            violations: vec![Violation::new(field, message)],
        }
    }
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("  - {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A single structural problem found in a descriptor.
///
/// `field` is a dotted path into the descriptor document, e.g.
/// `compatibility.target` or `variants.release.application_id_suffix`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Dotted path of the offending field.
    pub field: String,
    /// Human readable description of what is wrong.
    pub message: String,
}

impl Violation {
    /// Creates a new violation for `field`.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Reason a set of dynamic inputs was rejected against a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PlatformMismatch {
    /// The compile SDK is below the descriptor's minimum SDK.
    #[error("compile SDK {compile_sdk} is below the minimum SDK {min_sdk}")]
    CompileBelowFloor { compile_sdk: u32, min_sdk: u32 },

    /// The target SDK is newer than the SDK being compiled against.
    #[error("target SDK {target_sdk} is above the compile SDK {compile_sdk}")]
    TargetAboveCompile { target_sdk: u32, compile_sdk: u32 },

    /// The target SDK is below the descriptor's minimum SDK.
    #[error("target SDK {target_sdk} is below the minimum SDK {min_sdk}")]
    TargetBelowFloor { target_sdk: u32, min_sdk: u32 },
}

/// Java/Kotlin language compatibility level.
///
/// Source compatibility, target compatibility and the Kotlin JVM target all
/// share one level; the descriptor rejects any divergence between them.
///
/// # Example
///
/// ```
/// use buildplan_sdk::LanguageLevel;
///
/// let level: LanguageLevel = "11".parse().unwrap();
/// assert_eq!(level, LanguageLevel::Java11);
/// assert_eq!(level.as_str(), "11");
///
/// let legacy: LanguageLevel = "VERSION_1_8".parse().unwrap();
/// assert_eq!(legacy.as_str(), "1.8");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LanguageLevel {
    /// Java 8, written `1.8` by Gradle and the Kotlin compiler.
    #[serde(rename = "1.8")]
    Java8,
    /// Java 11.
    #[serde(rename = "11")]
    Java11,
    /// Java 17.
    #[serde(rename = "17")]
    Java17,
    /// Java 21.
    #[serde(rename = "21")]
    Java21,
}

impl LanguageLevel {
    /// All supported levels, oldest first.
    pub const ALL: [LanguageLevel; 4] = [
        LanguageLevel::Java8,
        LanguageLevel::Java11,
        LanguageLevel::Java17,
        LanguageLevel::Java21,
    ];

    /// Returns the canonical string form, as passed to `jvmTarget`.
    ///
    /// # Returns
    ///
    /// - `"1.8"` for [`LanguageLevel::Java8`]
    /// - `"11"`, `"17"`, `"21"` for the others
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageLevel::Java8 => "1.8",
            LanguageLevel::Java11 => "11",
            LanguageLevel::Java17 => "17",
            LanguageLevel::Java21 => "21",
        }
    }
}

impl fmt::Display for LanguageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageLevel {
    type Err = String;

    /// Accepts the plain forms (`1.8`, `8`, `11`, ...) as well as the Gradle
    /// constant names (`VERSION_11`, `JavaVersion.VERSION_11`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let bare = trimmed
            .strip_prefix("JavaVersion.")
            .unwrap_or(trimmed)
            .strip_prefix("VERSION_")
            .map(|v| v.replace('_', "."))
            .unwrap_or_else(|| trimmed.to_string());

        match bare.as_str() {
            "1.8" | "8" => Ok(LanguageLevel::Java8),
            "11" => Ok(LanguageLevel::Java11),
            "17" => Ok(LanguageLevel::Java17),
            "21" => Ok(LanguageLevel::Java21),
            _ => Err(format!(
                "unsupported language level '{s}' (supported: 1.8, 11, 17, 21)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_level_parsing() {
        assert_eq!("8".parse::<LanguageLevel>(), Ok(LanguageLevel::Java8));
        assert_eq!("1.8".parse::<LanguageLevel>(), Ok(LanguageLevel::Java8));
        assert_eq!(
            "JavaVersion.VERSION_17".parse::<LanguageLevel>(),
            Ok(LanguageLevel::Java17)
        );
        assert_eq!(" 21 ".parse::<LanguageLevel>(), Ok(LanguageLevel::Java21));
        assert!("9".parse::<LanguageLevel>().is_err());
        assert!("".parse::<LanguageLevel>().is_err());
    }

    #[test]
    fn test_language_level_round_trips_through_display() {
        for level in LanguageLevel::ALL {
            assert_eq!(level.to_string().parse::<LanguageLevel>(), Ok(level));
        }
    }

    #[test]
    fn test_invalid_descriptor_message_lists_every_violation() {
        let err = ConfigError::InvalidDescriptor {
            violations: vec![
                Violation::new("application_id", "must not be empty"),
                Violation::new("min_sdk", "must be greater than zero"),
            ],
        };
        let message = err.to_string();
        assert!(message.contains("2 violation(s)"));
        assert!(message.contains("  - application_id: must not be empty"));
        assert!(message.contains("  - min_sdk: must be greater than zero"));
    }

    #[test]
    fn test_platform_mismatch_display() {
        let err = ConfigError::IncompatiblePlatformVersion(PlatformMismatch::CompileBelowFloor {
            compile_sdk: 20,
            min_sdk: 23,
        });
        assert_eq!(
            err.to_string(),
            "incompatible platform version: compile SDK 20 is below the minimum SDK 23"
        );
    }
}
