//! R-Droid Packager - command line entry point
//!
//! Resolves a build variant into a descriptor for the Android toolchain.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use r_droid_build_engine::BuildError;
use r_droid_packager::commands::{OutputFormat, ResolveCommand, VariantsCommand};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(name = "r-droid-packager", version, about = "Resolve Android packaging profiles")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Project root that relative paths are resolved against
    #[arg(long, default_value = ".", global = true)]
    project_root: PathBuf,

    /// Packaging config file (defaults to <project-root>/packaging.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve one variant into a build descriptor
    Resolve {
        /// Variant name (debug, profile, release)
        variant: String,

        /// Credential source (defaults to <project-root>/key.properties)
        #[arg(long, conflicts_with = "no_credentials")]
        credentials: Option<PathBuf>,

        /// Resolve without any credential source
        #[arg(long)]
        no_credentials: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Print passwords instead of redacting them
        #[arg(long)]
        expose_secrets: bool,

        /// Fail when a release build has no signing profile
        #[arg(long)]
        require_release_signing: bool,
    },
    /// List the known variants
    Variants,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("warning: a tracing subscriber is already installed");
    }
}

/// What the process prints and how it exits
#[derive(Debug)]
struct Outcome {
    success: bool,
    stdout: String,
    stderr: String,
}

impl Outcome {
    fn exit_code(&self) -> ExitCode {
        if self.success {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Outcome {
    let result = match cli.command {
        Command::Resolve {
            variant,
            credentials,
            no_credentials,
            format,
            expose_secrets,
            require_release_signing,
        } => ResolveCommand {
            project_root: cli.project_root,
            config: cli.config,
            variant,
            credentials,
            no_credentials,
            format,
            expose_secrets,
            require_release_signing,
        }
        .execute(),
        Command::Variants => Ok(VariantsCommand.execute()),
    };

    match result {
        Ok(mut stdout) => {
            if !stdout.ends_with('\n') {
                stdout.push('\n');
            }
            Outcome {
                success: true,
                stdout,
                stderr: String::new(),
            }
        }
        Err(e) => {
            if let Some(build) = e.downcast_ref::<BuildError>() {
                debug!("Resolution failed with {}", build.kind());
            }
            Outcome {
                success: false,
                stdout: String::new(),
                stderr: format!("error: {:#}\n", e),
            }
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    debug!("r-droid-packager v{}", VERSION);

    let outcome = run(cli);
    print!("{}", outcome.stdout);
    eprint!("{}", outcome.stderr);
    outcome.exit_code()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn assert_exit(outcome: &Outcome, expected: ExitCode) {
        assert_eq!(format!("{:?}", outcome.exit_code()), format!("{:?}", expected));
    }

    fn run_args(args: &[&str]) -> Outcome {
        let cli = Cli::try_parse_from(std::iter::once("r-droid-packager").chain(args.iter().copied())).unwrap();
        run(cli)
    }

    #[test]
    fn test_unknown_variant_exits_with_failure() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();

        let outcome = run_args(&["--project-root", root, "resolve", "beta"]);
        assert!(!outcome.success);
        assert_exit(&outcome, ExitCode::FAILURE);
        assert!(outcome.stdout.is_empty());
        assert!(outcome.stderr.starts_with("error: unknown variant: 'beta'"));
        assert!(outcome.stderr.ends_with('\n'));
    }

    #[test]
    fn test_invalid_credentials_name_the_field() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("key.properties"), "keyAlias=upload\n").unwrap();
        let root = dir.path().to_str().unwrap();

        let outcome = run_args(&["--project-root", root, "resolve", "release"]);
        assert_exit(&outcome, ExitCode::FAILURE);
        assert_eq!(outcome.stderr, "error: invalid credentials: keyPassword: missing\n");
    }

    #[test]
    fn test_unreadable_source_includes_io_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("key.properties")).unwrap();
        let root = dir.path().to_str().unwrap();

        let outcome = run_args(&["--project-root", root, "resolve", "release"]);
        assert!(!outcome.success);
        assert!(outcome.stderr.starts_with("error: credential source unreadable: "));
        // the io error is appended after the path
        assert!(outcome.stderr.matches(": ").count() >= 2);
    }

    #[test]
    fn test_successful_resolve_prints_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();

        let outcome = run_args(&["--project-root", root, "resolve", "debug", "--format", "properties"]);
        assert!(outcome.success);
        assert_exit(&outcome, ExitCode::SUCCESS);
        assert!(outcome.stderr.is_empty());
        assert!(outcome.stdout.contains("android.buildType=debug\n"));
    }

    #[test]
    fn test_credentials_conflict_with_no_credentials() {
        let result = Cli::try_parse_from([
            "r-droid-packager",
            "resolve",
            "release",
            "--credentials",
            "key.properties",
            "--no-credentials",
        ]);
        assert!(result.is_err());
    }
}
