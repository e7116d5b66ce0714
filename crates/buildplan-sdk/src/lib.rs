//! Build variant resolution for mobile apps
//!
//! `buildplan-sdk` turns a static build descriptor (application identity,
//! minimum SDK, plugins, language compatibility, signing) and a handful of
//! values supplied by the build orchestrator (compile/target SDK, version
//! code and name) into one concrete, immutable build profile per variant.
//!
//! # Quick Start
//!
//! ```
//! use buildplan_sdk::{Descriptor, DynamicInputs, resolve};
//!
//! let descriptor = Descriptor::from_toml_str(r#"
//! application_id = "com.example.aura"
//! min_sdk = 23
//! ndk_version = "27.0.12077973"
//!
//! [compatibility]
//! source = "11"
//! target = "11"
//!
//! [[plugins]]
//! id = "com.google.gms.google-services"
//!
//! [signing.profiles.debugProfile]
//! ephemeral = true
//!
//! [variants.debug]
//! signing = "debugProfile"
//!
//! [variants.release]
//! signing = "default"
//! "#)?;
//!
//! let inputs = DynamicInputs::new(34, 34, 7, "1.2.0");
//!
//! let debug = resolve(&descriptor, &inputs, "debug")?;
//! assert_eq!(debug.signing_profile, "debugProfile");
//!
//! let release = resolve(&descriptor, &inputs, "release")?;
//! assert!(release.signing_is_default);
//! # Ok::<(), buildplan_sdk::ConfigError>(())
//! ```
//!
//! # Architecture
//!
//! - **Descriptor**: static configuration, validated collect-all
//! - **Inputs**: per-invocation values from the orchestrator
//! - **Signing**: the configured profile set and per-variant references
//! - **Plugins**: known plugin floors raising the minimum SDK
//! - **Resolver**: the pure merge producing [`ResolvedBuildProfile`]

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod descriptor;
pub mod inputs;
pub mod plugins;
pub mod resolver;
pub mod signing;
pub mod types;

pub use descriptor::{CompatibilityOptions, Descriptor, VariantConfig};
pub use inputs::DynamicInputs;
pub use plugins::{KNOWN_PLUGIN_FLOORS, PluginDecl, known_floor};
pub use resolver::{ResolvedBuildProfile, resolve, resolve_all, verify_signing};
pub use signing::{DEFAULT_PROFILE_NAME, SigningProfile, SigningProfiles, SigningReference};
pub use types::{ConfigError, LanguageLevel, PlatformMismatch, Violation};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
