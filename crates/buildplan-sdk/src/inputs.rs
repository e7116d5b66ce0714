//! Dynamic inputs supplied by the build orchestrator
//!
//! Compile SDK, target SDK, version code and version name are not owned by
//! the descriptor. The orchestrator derives them from its own toolchain
//! registry and passes them in per invocation.

use crate::types::{ConfigError, PlatformMismatch};
use serde::{Deserialize, Serialize};

/// Per-invocation version values.
///
/// # Example
///
/// ```
/// use buildplan_sdk::{ConfigError, DynamicInputs, PlatformMismatch};
///
/// let inputs = DynamicInputs::new(34, 34, 7, "1.2.0");
/// assert!(inputs.check_against(23).is_ok());
///
/// let old = DynamicInputs::new(20, 20, 7, "1.2.0");
/// assert!(matches!(
///     old.check_against(23),
///     Err(ConfigError::IncompatiblePlatformVersion(
///         PlatformMismatch::CompileBelowFloor { compile_sdk: 20, min_sdk: 23 }
///     ))
/// ));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DynamicInputs {
    /// SDK level the sources are compiled against.
    pub compile_sdk: u32,
    /// SDK level the app declares it targets. Must not exceed `compile_sdk`.
    pub target_sdk: u32,
    /// Monotonic release number. Must be positive.
    pub version_code: u32,
    /// User-visible version string.
    pub version_name: String,
}

impl DynamicInputs {
    /// Creates a new set of inputs.
    pub fn new(
        compile_sdk: u32,
        target_sdk: u32,
        version_code: u32,
        version_name: impl Into<String>,
    ) -> Self {
        Self {
            compile_sdk,
            target_sdk,
            version_code,
            version_name: version_name.into(),
        }
    }

    /// Checks these inputs against a descriptor's minimum SDK.
    ///
    /// The compile SDK floor is checked first, so an outdated toolchain is
    /// always reported as [`PlatformMismatch::CompileBelowFloor`] even when
    /// the target SDK is out of range as well.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::IncompatiblePlatformVersion`] - SDK levels do not fit
    /// * [`ConfigError::InvalidInputs`] - zero version code or blank version name
    pub fn check_against(&self, min_sdk: u32) -> Result<(), ConfigError> {
        if self.compile_sdk < min_sdk {
            return Err(ConfigError::IncompatiblePlatformVersion(
                PlatformMismatch::CompileBelowFloor {
                    compile_sdk: self.compile_sdk,
                    min_sdk,
                },
            ));
        }
        if self.target_sdk > self.compile_sdk {
            return Err(ConfigError::IncompatiblePlatformVersion(
                PlatformMismatch::TargetAboveCompile {
                    target_sdk: self.target_sdk,
                    compile_sdk: self.compile_sdk,
                },
            ));
        }
        if self.target_sdk < min_sdk {
            return Err(ConfigError::IncompatiblePlatformVersion(
                PlatformMismatch::TargetBelowFloor {
                    target_sdk: self.target_sdk,
                    min_sdk,
                },
            ));
        }
        if self.version_code == 0 {
            return Err(ConfigError::InvalidInputs(
                "version code must be greater than zero".to_string(),
            ));
        }
        if self.version_name.trim().is_empty() {
            return Err(ConfigError::InvalidInputs(
                "version name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
