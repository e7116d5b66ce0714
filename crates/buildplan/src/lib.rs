//! # buildplan
//!
//! Command-line tool for resolving mobile build variants into concrete
//! build profiles.
//!
//! ## Overview
//!
//! `buildplan` is the thin front end over `buildplan-sdk`. It handles:
//!
//! - **Discovery** - Locates `buildplan.toml` in the current directory or its parents
//! - **Validation** - Reports every descriptor violation in one pass
//! - **Resolution** - Merges the descriptor with orchestrator-supplied versions
//!
//! ## Quick Start
//!
//! ```bash
//! # Scaffold a descriptor
//! buildplan init --app-id com.example.aura
//!
//! # Validate it
//! buildplan check
//!
//! # Resolve the release variant
//! buildplan resolve --variant release \
//!     --compile-sdk 34 --target-sdk 34 --version-code 7 --version-name 1.2.0
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `init` | Write a starter descriptor |
//! | `check` | Validate the descriptor and its signing references |
//! | `variants` | List declared variants and their signing decision |
//! | `resolve` | Resolve one variant to JSON |
//! | `resolve-all` | Resolve every variant to a JSON array |
//!
//! ## Dynamic Inputs
//!
//! Version values are normally supplied by the outer build. Each flag has an
//! environment fallback, and a `.env.local` file in the working directory is
//! loaded before arguments are parsed:
//!
//! ```bash
//! BUILDPLAN_COMPILE_SDK=34
//! BUILDPLAN_TARGET_SDK=34
//! BUILDPLAN_VERSION_CODE=7
//! BUILDPLAN_VERSION_NAME=1.2.0
//! ```
//!
//! ## Logging
//!
//! Diagnostics go to stderr through `tracing`. `RUST_LOG` overrides the
//! default level (`warn`, or `debug` with `--verbose`).

#![cfg_attr(docsrs, feature(doc_cfg))]

use anyhow::{Context, Result};
use buildplan_sdk::{Descriptor, DynamicInputs, resolve, resolve_all, verify_signing};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

pub mod config;

/// Resolve mobile build variants into concrete build profiles.
#[derive(Parser, Debug)]
#[command(
    name = "buildplan",
    author,
    version,
    about = "Mobile build variant resolver",
    long_about = None
)]
pub struct Cli {
    /// Path to the descriptor (default: nearest buildplan.toml)
    #[arg(long, global = true, env = "BUILDPLAN_DESCRIPTOR")]
    descriptor: Option<PathBuf>,

    /// Print debug diagnostics to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a starter descriptor.
    Init {
        #[arg(long, default_value = config::DESCRIPTOR_FILE_NAME)]
        output: PathBuf,
        #[arg(long, default_value = "com.example.app", help = "Reverse-domain application id")]
        app_id: String,
    },
    /// Validate the descriptor and every signing reference.
    Check,
    /// List declared variants.
    Variants,
    /// Resolve one variant and print the profile as JSON.
    Resolve {
        #[arg(long, help = "Variant to resolve, e.g. release")]
        variant: String,
        #[command(flatten)]
        inputs: InputArgs,
        #[arg(long, help = "Write JSON to this path instead of stdout")]
        output: Option<PathBuf>,
    },
    /// Resolve every declared variant and print a JSON array.
    ResolveAll {
        #[command(flatten)]
        inputs: InputArgs,
        #[arg(long, help = "Write JSON to this path instead of stdout")]
        output: Option<PathBuf>,
    },
}

/// Version values supplied by the outer build.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
struct InputArgs {
    #[arg(long, env = "BUILDPLAN_COMPILE_SDK")]
    compile_sdk: u32,
    #[arg(long, env = "BUILDPLAN_TARGET_SDK")]
    target_sdk: u32,
    #[arg(long, env = "BUILDPLAN_VERSION_CODE")]
    version_code: u32,
    #[arg(long, env = "BUILDPLAN_VERSION_NAME")]
    version_name: String,
}

impl From<InputArgs> for DynamicInputs {
    fn from(args: InputArgs) -> Self {
        DynamicInputs::new(
            args.compile_sdk,
            args.target_sdk,
            args.version_code,
            args.version_name,
        )
    }
}

pub fn run() -> Result<()> {
    load_dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    execute(cli)
}

fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Init { output, app_id } => cmd_init(&output, &app_id),
        Command::Check => {
            let path = config::locate(cli.descriptor.as_deref())?;
            cmd_check(&path)
        }
        Command::Variants => {
            let descriptor = load_descriptor(cli.descriptor.as_deref())?;
            cmd_variants(&descriptor);
            Ok(())
        }
        Command::Resolve {
            variant,
            inputs,
            output,
        } => {
            let descriptor = load_descriptor(cli.descriptor.as_deref())?;
            let profile = resolve(&descriptor, &inputs.into(), &variant)
                .with_context(|| format!("resolving variant '{variant}'"))?;
            emit_json(&profile, output.as_deref())
        }
        Command::ResolveAll { inputs, output } => {
            let descriptor = load_descriptor(cli.descriptor.as_deref())?;
            let profiles =
                resolve_all(&descriptor, &inputs.into()).context("resolving all variants")?;
            emit_json(&profiles, output.as_deref())
        }
    }
}

fn load_descriptor(explicit: Option<&Path>) -> Result<Descriptor> {
    let path = config::locate(explicit)?;
    config::load_from_file(&path)
}

fn cmd_init(output: &Path, app_id: &str) -> Result<()> {
    config::write_starter(output, app_id)?;
    println!("Wrote starter descriptor to {:?}", output);
    println!("Next: declare signing profiles and run `buildplan check`");
    Ok(())
}

fn cmd_check(path: &Path) -> Result<()> {
    let descriptor = config::load_from_file(path)?;
    verify_signing(&descriptor)
        .with_context(|| format!("checking signing references in {:?}", path))?;

    println!(
        "{:?} is valid: {} variant(s), {} signing profile(s) besides the default",
        path,
        descriptor.variants.len(),
        descriptor.signing.profiles.len()
    );
    Ok(())
}

fn cmd_variants(descriptor: &Descriptor) {
    println!("Found {} variant(s):", descriptor.variants.len());
    for line in variant_lines(descriptor) {
        println!("  - {line}");
    }
}

fn variant_lines(descriptor: &Descriptor) -> Vec<String> {
    descriptor
        .variants
        .iter()
        .map(|(name, variant)| {
            let mut line = format!("{name}: signing={}", variant.signing);
            if variant.is_debuggable(name) {
                line.push_str(", debuggable");
            }
            if variant.minify {
                line.push_str(", minify");
            }
            line
        })
        .collect()
}

fn emit_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let contents = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating directory {:?}", parent))?;
            }
            fs::write(path, contents).with_context(|| format!("writing {:?}", path))?;
            tracing::info!(path = %path.display(), "wrote resolved profile");
        }
        None => println!("{contents}"),
    }
    Ok(())
}

fn load_dotenv() {
    let _ = dotenvy::from_path(".env.local");
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const INPUT_FLAGS: [&str; 8] = [
        "--compile-sdk",
        "34",
        "--target-sdk",
        "34",
        "--version-code",
        "7",
        "--version-name",
        "1.2.0",
    ];

    const STARTER_RELEASE: &str = "before shipping.\nsigning = \"default\"";

    /// Starter descriptor with the release variant pointed at `release`.
    fn starter_with_release(release: &str) -> String {
        config::generate_starter_toml("com.example.aura")
            .replace(STARTER_RELEASE, &format!("before shipping.\n{release}"))
    }

    fn write_descriptor(dir: &Path) -> PathBuf {
        let path = dir.join(config::DESCRIPTOR_FILE_NAME);
        let contents = format!(
            "{}\n[signing.profiles.upload]\n\
             store_file = \"keystores/upload.jks\"\n\
             key_alias = \"upload\"\n",
            starter_with_release("signing = \"upload\"\nminify = true")
        );
        fs::write(&path, contents).unwrap();
        path
    }

    fn descriptor_args(descriptor: &Path, rest: &[&str]) -> Vec<String> {
        let mut args = vec![
            "buildplan".to_string(),
            "--descriptor".to_string(),
            descriptor.display().to_string(),
        ];
        args.extend(rest.iter().map(|s| s.to_string()));
        args.extend(INPUT_FLAGS.iter().map(|s| s.to_string()));
        args
    }

    #[test]
    fn parses_resolve_command() {
        let mut args = vec!["buildplan", "resolve", "--variant", "release"];
        args.extend(INPUT_FLAGS);
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Command::Resolve {
                variant,
                inputs,
                output,
            } => {
                assert_eq!(variant, "release");
                assert_eq!(
                    DynamicInputs::from(inputs),
                    DynamicInputs::new(34, 34, 7, "1.2.0")
                );
                assert!(output.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn resolve_writes_profile_json() {
        let temp_dir = TempDir::new().unwrap();
        let descriptor = write_descriptor(temp_dir.path());
        let output = temp_dir.path().join("out").join("release.json");

        let output_arg = output.display().to_string();
        let args = descriptor_args(
            &descriptor,
            &["resolve", "--variant", "release", "--output", &output_arg],
        );
        execute(Cli::try_parse_from(args).unwrap()).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(json["variant"], "release");
        assert_eq!(json["signing_profile"], "upload");
        assert_eq!(json["minify"], true);
        assert_eq!(json["version_code"], 7);
    }

    #[test]
    fn resolve_all_writes_profile_array() {
        let temp_dir = TempDir::new().unwrap();
        let descriptor = write_descriptor(temp_dir.path());
        let output = temp_dir.path().join("all.json");

        let output_arg = output.display().to_string();
        let args = descriptor_args(&descriptor, &["resolve-all", "--output", &output_arg]);
        execute(Cli::try_parse_from(args).unwrap()).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        let profiles = json.as_array().unwrap();
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0]["variant"], "debug");
        assert_eq!(profiles[0]["signing_profile"], "default");
        assert_eq!(profiles[0]["debuggable"], true);
        assert_eq!(profiles[1]["variant"], "release");
        assert_eq!(profiles[1]["signing_profile"], "upload");
        assert_eq!(profiles[1]["version_name"], "1.2.0");
    }

    #[test]
    fn resolve_all_stops_on_incompatible_inputs() {
        let temp_dir = TempDir::new().unwrap();
        let descriptor = write_descriptor(temp_dir.path());

        let args: Vec<String> = descriptor_args(&descriptor, &["resolve-all"])
            .into_iter()
            .map(|arg| if arg == "34" { "20".to_string() } else { arg })
            .collect();
        let err = execute(Cli::try_parse_from(args).unwrap()).unwrap_err();

        let message = format!("{err:#}");
        assert!(message.contains("resolving all variants"));
        assert!(message.contains("compile SDK 20"), "{message}");
    }

    #[test]
    fn resolve_unknown_variant_fails() {
        let temp_dir = TempDir::new().unwrap();
        let descriptor = write_descriptor(temp_dir.path());

        let args = descriptor_args(&descriptor, &["resolve", "--variant", "beta"]);
        let err = execute(Cli::try_parse_from(args).unwrap()).unwrap_err();

        let message = format!("{err:#}");
        assert!(message.contains("resolving variant 'beta'"));
        assert!(message.contains("unknown variant 'beta'"));
    }

    #[test]
    fn check_reports_missing_signing_profile() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(config::DESCRIPTOR_FILE_NAME);
        let contents = starter_with_release("signing = \"upload\"");
        fs::write(&path, contents).unwrap();

        let err = cmd_check(&path).unwrap_err();
        assert!(format!("{err:#}").contains("profile 'upload'"));

        let valid_dir = temp_dir.path().join("valid");
        fs::create_dir_all(&valid_dir).unwrap();
        let valid = write_descriptor(&valid_dir);
        assert!(cmd_check(&valid).is_ok());
    }

    #[test]
    fn lists_variants_with_flags() {
        let temp_dir = TempDir::new().unwrap();
        let descriptor = config::load_from_file(&write_descriptor(temp_dir.path())).unwrap();

        assert_eq!(
            variant_lines(&descriptor),
            vec![
                "debug: signing=default, debuggable".to_string(),
                "release: signing=upload, minify".to_string(),
            ]
        );
    }
}
