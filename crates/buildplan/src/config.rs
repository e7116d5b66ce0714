//! Descriptor file support for buildplan.
//!
//! This module locates, loads and scaffolds `buildplan.toml` descriptor files.
//!
//! ## Descriptor File Location
//!
//! When `--descriptor` is not given, the file is searched for in the
//! following order:
//! 1. Current working directory (`./buildplan.toml`)
//! 2. Parent directories (up to the repository root or filesystem root)

use anyhow::{Context, Result, bail};
use buildplan_sdk::Descriptor;
use std::fs;
use std::path::{Path, PathBuf};

/// The default descriptor file name.
pub const DESCRIPTOR_FILE_NAME: &str = "buildplan.toml";

/// Loads and validates a descriptor from the specified file path.
///
/// # Returns
///
/// * `Ok(Descriptor)` - Successfully loaded and validated descriptor
/// * `Err` - If the file cannot be read, parsed, or breaks an invariant
pub fn load_from_file(path: &Path) -> Result<Descriptor> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read descriptor: {:?}", path))?;

    let descriptor = Descriptor::from_toml_str(&contents)
        .with_context(|| format!("Failed to load descriptor: {:?}", path))?;

    tracing::debug!(
        path = %path.display(),
        variants = descriptor.variants.len(),
        "descriptor loaded"
    );
    Ok(descriptor)
}

/// Attempts to find a descriptor file starting from the specified directory.
///
/// Walks up the directory tree until a descriptor is found, a `.git`
/// directory marks the repository root, or the filesystem root is reached.
///
/// # Returns
///
/// * `Some(path)` - Path of the nearest descriptor file
/// * `None` - No descriptor file found
pub fn discover_from(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let candidate = current.join(DESCRIPTOR_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }

        // Stop at repository root or filesystem root
        if current.join(".git").exists() || !current.pop() {
            return None;
        }
    }
}

/// Resolves the descriptor path: an explicit path wins over discovery.
pub fn locate(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    match discover_from(&cwd) {
        Some(path) => Ok(path),
        None => bail!(
            "no {} found in {:?} or its parents. \
             Create one with `buildplan init` or pass --descriptor",
            DESCRIPTOR_FILE_NAME,
            cwd
        ),
    }
}

/// Writes a starter descriptor, refusing to overwrite an existing file.
pub fn write_starter(path: &Path, application_id: &str) -> Result<()> {
    if path.exists() {
        bail!("refusing to overwrite existing file: {:?}", path);
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating parent directory {:?}", parent))?;
    }

    fs::write(path, generate_starter_toml(application_id))
        .with_context(|| format!("Failed to write descriptor: {:?}", path))?;
    Ok(())
}

/// Generates a starter descriptor as a formatted TOML string.
///
/// This includes comments explaining each option. The result parses to
/// the same descriptor as [`Descriptor::starter`].
pub fn generate_starter_toml(application_id: &str) -> String {
    format!(
        r#"# buildplan descriptor
# Static build configuration resolved per variant by `buildplan resolve`.
# Compile SDK, target SDK, version code and version name are supplied at
# resolution time (flags or BUILDPLAN_* environment variables).

# Reverse-domain application id
application_id = "{application_id}"

# Code namespace (defaults to application_id)
# namespace = "{application_id}"

# Minimum Android SDK version. Must be at least the floor of every plugin.
min_sdk = 23

# Exact NDK version (no ranges)
ndk_version = "27.0.12077973"

# Application sources handed to the orchestrator (optional)
# source_root = "../.."

[compatibility]
# Source, target and Kotlin JVM target must all match (1.8, 11, 17 or 21)
source = "11"
target = "11"
jvm_target = "11"

[[plugins]]
id = "com.android.application"

[[plugins]]
id = "kotlin-android"

# Named signing profiles. Passwords are read from the named environment variables.
# [signing.profiles.upload]
# store_file = "keystores/upload.jks"
# store_password_env = "UPLOAD_STORE_PASSWORD"
# key_alias = "upload"
# key_password_env = "UPLOAD_KEY_PASSWORD"

# Every variant states its signing profile. "default" is the ephemeral debug keystore.
[variants.debug]
signing = "default"

[variants.release]
# Release builds signed with "default" resolve with a warning.
# Point this at a named profile under [signing.profiles] before shipping.
signing = "default"
"#,
        application_id = application_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_starter_toml_matches_starter_descriptor() {
        let toml = generate_starter_toml("com.example.app");
        let parsed = Descriptor::from_toml_str(&toml).unwrap();
        assert_eq!(parsed, Descriptor::starter("com.example.app"));
    }

    #[test]
    fn test_starter_release_is_flagged_until_renamed() {
        let toml = generate_starter_toml("com.example.app");
        assert!(toml.contains("# Release builds signed with \"default\" resolve with a warning."));

        let descriptor = Descriptor::from_toml_str(&toml).unwrap();
        let inputs = buildplan_sdk::DynamicInputs::new(34, 34, 1, "1.0.0");
        let profile = buildplan_sdk::resolve(&descriptor, &inputs, "release").unwrap();
        assert!(profile.signing_is_default);
        assert!(!profile.debuggable);
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(DESCRIPTOR_FILE_NAME);
        std::fs::write(&path, generate_starter_toml("com.test.bench")).unwrap();

        let descriptor = load_from_file(&path).unwrap();
        assert_eq!(descriptor.application_id, "com.test.bench");
        assert_eq!(descriptor.variant_names(), vec!["debug", "release"]);
    }

    #[test]
    fn test_load_invalid_file_reports_violations() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(DESCRIPTOR_FILE_NAME);
        let contents =
            generate_starter_toml("com.test.bench").replace("min_sdk = 23", "min_sdk = 0");
        std::fs::write(&path, contents).unwrap();

        let err = load_from_file(&path).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("Failed to load descriptor"));
        assert!(message.contains("min_sdk: must be greater than zero"));
    }

    #[test]
    fn test_discover_descriptor_in_parent() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join(".git")).unwrap();
        let path = temp_dir.path().join(DESCRIPTOR_FILE_NAME);
        std::fs::write(&path, generate_starter_toml("com.test.bench")).unwrap();

        let nested = temp_dir.path().join("android").join("app");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(discover_from(&nested), Some(path));
    }

    #[test]
    fn test_discover_no_descriptor() {
        let temp_dir = TempDir::new().unwrap();
        // Create a .git directory to stop the search
        std::fs::create_dir(temp_dir.path().join(".git")).unwrap();

        assert_eq!(discover_from(temp_dir.path()), None);
    }

    #[test]
    fn test_write_starter_refuses_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join(DESCRIPTOR_FILE_NAME);

        write_starter(&path, "com.test.bench").unwrap();
        assert!(path.is_file());
        assert!(write_starter(&path, "com.test.bench").is_err());
    }

    #[test]
    fn test_locate_prefers_explicit_path() {
        let explicit = Path::new("custom/descriptor.toml");
        assert_eq!(locate(Some(explicit)).unwrap(), explicit);
    }
}
