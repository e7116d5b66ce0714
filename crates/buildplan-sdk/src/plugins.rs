//! Build plugin declarations and their platform floors
//!
//! Some plugins only work above a certain minimum SDK (the Google services
//! plugin pulls in Firebase, which needs API 23). A descriptor's `min_sdk` must
//! stay at or above the floor of every plugin it declares.

use serde::{Deserialize, Serialize};

/// Minimum SDK floors for well-known plugin ids.
///
/// A declaration may raise a floor with its own `min_sdk`, never lower it.
pub const KNOWN_PLUGIN_FLOORS: &[(&str, u32)] = &[
    ("com.android.application", 1),
    ("com.android.library", 1),
    ("kotlin-android", 1),
    ("org.jetbrains.kotlin.android", 1),
    ("dev.flutter.flutter-gradle-plugin", 21),
    ("com.google.gms.google-services", 23),
    ("com.google.firebase.crashlytics", 23),
];

/// A plugin applied by the build descriptor.
///
/// # Example
///
/// ```
/// use buildplan_sdk::PluginDecl;
///
/// let plugin = PluginDecl::new("com.google.gms.google-services");
/// assert_eq!(plugin.effective_floor(), Some(23));
///
/// let custom = PluginDecl {
///     id: "com.example.internal".to_string(),
///     min_sdk: Some(26),
/// };
/// assert_eq!(custom.effective_floor(), Some(26));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginDecl {
    /// Plugin id as written in the `plugins { }` block.
    pub id: String,

    /// Minimum SDK the plugin requires, if stricter than the known floor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_sdk: Option<u32>,
}

impl PluginDecl {
    /// Declares a plugin with no explicit floor.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            min_sdk: None,
        }
    }

    /// Returns the floor this plugin imposes on the descriptor's `min_sdk`.
    ///
    /// This is the larger of the declared `min_sdk` and the registry entry
    /// for the id. `None` means the plugin imposes no floor at all.
    pub fn effective_floor(&self) -> Option<u32> {
        match (self.min_sdk, known_floor(&self.id)) {
            (Some(declared), Some(known)) => Some(declared.max(known)),
            (declared, known) => declared.or(known),
        }
    }
}

/// Looks up the registry floor for a plugin id.
pub fn known_floor(id: &str) -> Option<u32> {
    KNOWN_PLUGIN_FLOORS
        .iter()
        .find(|(known, _)| *known == id)
        .map(|(_, floor)| *floor)
}
