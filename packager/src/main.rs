//! APG packager CLI entrypoint.
//!
//! Validates a package tree, writes its checksum manifest, and archives it
//! as a `.apg` file. Diagnostics go to stderr; `--structure` output and the
//! path of the finished archive go to stdout.

use apg_packager::cli::Cli;
use apg_packager::config::PackagerConfig;
use apg_packager::error::PackagerError;
use apg_packager::interrupt;
use apg_packager::layout::{APG_RULES, describe_rules};
use apg_packager::pipeline::{BuildFailure, Pipeline};
use clap::Parser;
use clap::error::ErrorKind;
use std::io::Write;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a log filter that overrides `--verbose`.
const LOG_ENV: &str = "APG_LOG";

/// Everything that can stop a run.
#[derive(Debug, Error)]
enum RunError {
    /// Arguments or configuration were unusable.
    #[error(transparent)]
    Setup(#[from] PackagerError),
    /// A build stage failed.
    #[error(transparent)]
    Build(#[from] BuildFailure),
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Help and version go to stdout, usage errors to stderr.
            if err.print().is_err() {
                // Best-effort output; ignore write failures.
            }
            std::process::exit(exit_code_for_parse_error(&err));
        }
    };
    init_logging(cli.verbose);
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stdout);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Map a clap outcome to the packager's exit codes: 0 when help or the
/// version was requested, 1 for every usage error.
fn exit_code_for_parse_error(err: &clap::Error) -> i32 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
    if installed.is_err() {
        // A subscriber is already in place; keep it.
    }
}

fn run(cli: &Cli, stdout: &mut dyn Write) -> Result<(), RunError> {
    if cli.structure {
        write_line(stdout, describe_rules(APG_RULES).trim_end());
        return Ok(());
    }

    interrupt::install()?;
    let config = PackagerConfig::discover(cli.config.as_deref())?;
    let request = cli.build_request(&config)?;
    let output = Pipeline::new().run(&request)?;
    write_line(stdout, output.archive_path.display());
    Ok(())
}

fn exit_code_for_run_result(result: Result<(), RunError>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(RunError::Build(failure)) if failure.is_interrupted() => {
            write_line(stderr, PackagerError::Interrupted);
            1
        }
        Err(err) => {
            write_line(stderr, format_args!("error: {err}"));
            1
        }
    }
}

fn write_line(out: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(out, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apg_packager::pipeline::BuildStage;
    use apg_packager::test_support::PackageTree;
    use rstest::rstest;
    use tempfile::TempDir;

    fn stdout_of(cli: &Cli) -> (Result<(), RunError>, String) {
        let mut stdout = Vec::new();
        let result = run(cli, &mut stdout);
        let text = String::from_utf8(stdout).expect("stdout was not UTF-8");
        (result, text)
    }

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Ok(()), &mut stderr);
        assert_eq!(exit_code, 0);
        assert!(stderr.is_empty());
    }

    #[test]
    fn exit_code_for_run_result_prints_error_and_returns_one() {
        let err = RunError::Setup(PackagerError::UnknownCompression {
            value: "lz4".to_owned(),
        });
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Err(err), &mut stderr);
        assert_eq!(exit_code, 1);

        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(stderr_text.starts_with("error: "));
        assert!(stderr_text.contains("\"lz4\""));
    }

    #[rstest]
    #[case::missing_source(&["apg-packager"], 1)]
    #[case::bad_level(&["apg-packager", "pkg", "-l", "abc"], 1)]
    #[case::unknown_compression(&["apg-packager", "pkg", "-c", "lz4"], 1)]
    #[case::conflicting_outputs(&["apg-packager", "pkg", "-o", "a.apg", "-d", "dist"], 1)]
    #[case::help(&["apg-packager", "--help"], 0)]
    #[case::version(&["apg-packager", "--version"], 0)]
    fn parse_errors_map_to_packager_exit_codes(#[case] args: &[&str], #[case] expected: i32) {
        let err = Cli::try_parse_from(args).expect_err("clap stops early");
        assert_eq!(exit_code_for_parse_error(&err), expected);
    }

    #[test]
    fn interruption_prints_cancellation_notice() {
        let err = RunError::Build(BuildFailure {
            stage: BuildStage::Archiving,
            error: PackagerError::Interrupted,
        });
        let mut stderr = Vec::new();
        assert_eq!(exit_code_for_run_result(Err(err), &mut stderr), 1);
        assert_eq!(
            String::from_utf8(stderr).expect("stderr was not UTF-8"),
            "build cancelled by user\n"
        );
    }

    #[test]
    fn structure_prints_rule_table_without_source() {
        let cli = Cli {
            structure: true,
            source_dir: Some("/definitely/not/here".into()),
            ..Cli::default()
        };
        let (result, text) = stdout_of(&cli);
        assert!(result.is_ok());
        assert!(text.starts_with("Expected APG package structure:"));
        assert!(text.contains("scripts/postremove"));
    }

    #[rstest]
    fn build_prints_archive_path() {
        let tree = PackageTree::valid();
        let out = TempDir::new().expect("temp dir");
        let cli = Cli {
            source_dir: Some(tree.root().to_path_buf()),
            output_dir: Some(out.path().to_path_buf()),
            level: Some(1),
            config: Some(tree.path("no-such-config.toml")),
            ..Cli::default()
        };
        let (result, _) = stdout_of(&cli);
        // An explicit config path must exist.
        assert!(matches!(result, Err(RunError::Setup(PackagerError::Config { .. }))));

        tree.write_file("apg.toml", "[compression]\nalgorithm = \"gzip\"\n");
        let cli = Cli {
            config: Some(tree.path("apg.toml")),
            ..cli
        };
        let (result, text) = stdout_of(&cli);
        assert!(result.is_ok(), "{result:?}");
        assert!(text.trim_end().ends_with("foo-1.0-1-x86_64.apg"), "{text}");
    }

    #[rstest]
    fn invalid_tree_reports_every_violation() {
        let tree = PackageTree::valid();
        tree.remove("scripts/postinstall");
        tree.write_file("manifest.json", "{ broken");
        let out = TempDir::new().expect("temp dir");
        let cli = Cli {
            source_dir: Some(tree.root().to_path_buf()),
            output_dir: Some(out.path().to_path_buf()),
            config: Some(tree.path("empty.toml")),
            ..Cli::default()
        };
        tree.write_file("empty.toml", "");

        let (result, _) = stdout_of(&cli);
        let mut stderr = Vec::new();
        assert_eq!(exit_code_for_run_result(result, &mut stderr), 1);
        let message = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(message.contains("missing required file: scripts/postinstall"), "{message}");
        assert!(message.contains("manifest.json: malformed JSON"), "{message}");
        assert_eq!(std::fs::read_dir(out.path()).expect("read dir").count(), 0);
    }
}
