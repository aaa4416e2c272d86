use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use crate::domain::manifest::manifest_checks::{check_manifest, Severity};
use crate::domain::manifest::manifest_loader::load_manifest;

#[derive(Debug, Parser)]
#[command(author, version, about = "Creates Traefik Ingresses for Services annotated with auto-ingress")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Watch Services and manage their Ingresses (default)
    Run,
    /// Plan every Service once and print what would change, without writing
    DryRun,
    /// Statically check a Deployment/Service manifest
    CheckManifest {
        /// Path to a multi-document YAML manifest
        file: PathBuf,

        /// Annotation key to validate on Services
        #[arg(long, env = "AUTO_INGRESS_ANNOTATION", default_value = crate::config::DEFAULT_ANNOTATION_KEY)]
        annotation: String,
    },
}

/// Prints the report for `file` and fails when it has errors.
pub fn run_check_manifest(file: &PathBuf, annotation: &str) -> Result<()> {
    let manifest = load_manifest(file)?;
    let report = check_manifest(&manifest, annotation);

    println!("{}: {} document(s)", file.display(), report.documents);
    for issue in &report.issues {
        match issue.severity {
            Severity::Error => eprintln!("  {issue}"),
            Severity::Warning => println!("  {issue}"),
        }
    }

    if !report.is_ok() {
        bail!("manifest check failed with {} error(s)", report.error_count());
    }
    println!("  ok");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_none() {
        let cli = Cli::try_parse_from(["auto-ingress-operator"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_check_manifest() {
        let cli = Cli::try_parse_from([
            "auto-ingress-operator",
            "check-manifest",
            "deploy/example-app.yaml",
            "--annotation",
            "expose",
        ])
        .unwrap();
        match cli.command {
            Some(Command::CheckManifest { file, annotation }) => {
                assert_eq!(file, PathBuf::from("deploy/example-app.yaml"));
                assert_eq!(annotation, "expose");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_check_shipped_manifest() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("deploy/example-app.yaml");
        run_check_manifest(&path, "auto-ingress").unwrap();
    }
}
