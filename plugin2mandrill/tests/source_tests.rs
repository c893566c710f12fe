//! Snapshot tests over the plugin inputs in `tests/inputs`.
//!
//! Each `*.xml` input is converted by the installed binary with its output on
//! stdout, and the captured stdout/stderr are compared against the TOML
//! snapshot stored next to the input. Set `P2M_UPDATE_SNAP` to regenerate
//! snapshots. Per-input configuration is read from `<!--~ ... -->` comment
//! lines, parsed as TOML.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::{env, fs, io, process};
use walkdir::WalkDir;

fn main() {
    let args = libtest_mimic::Arguments::from_args();

    let tests = find_source_files("tests/inputs").map(extract_test).collect();

    libtest_mimic::run(&args, tests).exit();
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "kebab-case")]
struct Config {
    #[serde(default = "DEFAULT_IGNORE")]
    ignore: bool,
    #[serde(default = "DEFAULT_EXIT_CODE")]
    exit_code: i32,
    #[serde(skip)]
    update_snapshots: bool,
}

const DEFAULT_IGNORE: fn() -> bool = || false;
const DEFAULT_EXIT_CODE: fn() -> i32 = || 0;

const CONFIG_COMMENT_START: &str = "<!--~";
const CONFIG_COMMENT_END: &str = "-->";

struct TestFailure {
    name: &'static str,
    details: Vec<(&'static str, String)>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "kebab-case")]
struct SnapshotData {
    stdout: String,
    stderr: String,
}

#[derive(Debug)]
struct Snapshot {
    path: PathBuf,
    expected: Option<SnapshotData>,
    actual: SnapshotData,
}

#[derive(Eq, PartialEq, Debug)]
enum SnapshotOutcome {
    Equal,
    Different,
    Missing,
}

/// Recursively walk over test inputs under a file path.
fn find_source_files(root: impl AsRef<Path>) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| matches!(entry.path().extension(), Some(ext) if ext == "xml"))
        .map(|entry| entry.into_path())
}

fn extract_test(path: PathBuf) -> libtest_mimic::Trial {
    let name = path.display().to_string();
    match read_config(&path) {
        Ok(config) => {
            let ignored = config.ignore;
            libtest_mimic::Trial::test(name, move || run_test(&config, &path))
                .with_ignored_flag(ignored)
        }
        Err(error) => libtest_mimic::Trial::test(name, move || {
            Err(format!("config parse error: {error}").into())
        }),
    }
}

/// Collect the `<!--~ ... -->` lines of an input and parse them as TOML.
fn read_config(path: &Path) -> Result<Config, toml::de::Error> {
    let input_source = fs::read_to_string(path).unwrap();
    let config_source = input_source
        .lines()
        .filter_map(|line| line.trim().strip_prefix(CONFIG_COMMENT_START))
        .filter_map(|line| line.trim_end().strip_suffix(CONFIG_COMMENT_END))
        .join("\n");

    let mut config = toml::from_str::<Config>(&config_source)?;
    config.update_snapshots = env::var_os("P2M_UPDATE_SNAP").is_some();
    Ok(config)
}

fn run_test(config: &Config, input_file: &Path) -> Result<(), libtest_mimic::Failed> {
    let mut failures = Vec::new();

    let mut exe = process::Command::new(env!("CARGO_BIN_EXE_plugin2mandrill"));
    exe.arg(input_file);
    exe.arg("-");

    match exe.output() {
        Ok(output) => {
            let mut snapshot = Snapshot::new(input_file, &output)
                .map_err(|error| format!("couldn't read snapshot: {error}"))?;

            // Update if requested
            if config.update_snapshots && snapshot.outcome() != SnapshotOutcome::Equal {
                snapshot
                    .update()
                    .map_err(|error| format!("couldn't write snapshot: {error}"))?;
            }

            match snapshot.outcome() {
                SnapshotOutcome::Equal => {}
                SnapshotOutcome::Different => {
                    let mut details = vec![("path", snapshot.path.to_string_lossy().into_owned())];
                    if let Some(diff) = snapshot.stdout_diff() {
                        details.push(("stdout diff", diff));
                    }
                    if let Some(diff) = snapshot.stderr_diff() {
                        details.push(("stderr diff", diff));
                    }

                    failures.push(TestFailure {
                        name: "snapshot mismatch",
                        details,
                    });
                }
                SnapshotOutcome::Missing => {
                    let mut details = vec![("path", snapshot.path.to_string_lossy().into_owned())];
                    if !snapshot.stdout().is_empty() {
                        details.push(("stdout", snapshot.stdout().to_string()));
                    }
                    if !snapshot.stderr().is_empty() {
                        details.push(("stderr", snapshot.stderr().to_string()));
                    }

                    failures.push(TestFailure {
                        name: "snapshot missing",
                        details,
                    });
                }
            }

            if output.status.code() != Some(config.exit_code) {
                let mut details = vec![("command", format!("{exe:?}"))];
                details.push(("status", output.status.to_string()));
                if !snapshot.stdout().is_empty() {
                    details.push(("stdout", snapshot.stdout().to_string()));
                }
                if !snapshot.stderr().is_empty() {
                    details.push(("stderr", snapshot.stderr().to_string()));
                }

                failures.push(TestFailure {
                    name: "unexpected exit code",
                    details,
                });
            }
        }
        Err(error) => {
            failures.push(TestFailure {
                name: "unexpected command error",
                details: vec![("std::io::Error", error.to_string())],
            });
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures_message(&failures).into())
    }
}

fn failures_message(failures: &[TestFailure]) -> String {
    let mut msg = String::new();

    writeln!(msg).unwrap();
    for failure in failures {
        writeln!(msg, "    {}:", failure.name).unwrap();
        for (name, data) in &failure.details {
            writeln!(msg, "        ---- {name} ----").unwrap();
            for line in data.lines() {
                writeln!(msg, "        {line}").unwrap();
            }
        }
        writeln!(msg).unwrap();
    }

    msg
}

impl Snapshot {
    fn new(test_path: &Path, output: &process::Output) -> Result<Snapshot, io::Error> {
        let path = test_path.with_extension("snap");
        let actual = SnapshotData {
            stdout: String::from_utf8_lossy(&output.stdout).into(),
            stderr: String::from_utf8_lossy(&output.stderr).into(),
        };
        let expected = match fs::read_to_string(&path) {
            Ok(snap) => toml::from_str(&snap)
                .map(Some)
                .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?,
            Err(err) => match err.kind() {
                io::ErrorKind::NotFound => {
                    // Snapshot is missing and needs to be generated
                    None
                }
                _ => return Err(err),
            },
        };
        Ok(Snapshot {
            path,
            expected,
            actual,
        })
    }

    fn stdout(&self) -> &str {
        &self.actual.stdout
    }

    fn stderr(&self) -> &str {
        &self.actual.stderr
    }

    fn update(&mut self) -> Result<(), io::Error> {
        let serialised = toml::to_string_pretty(&self.actual)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        fs::write(&self.path, serialised)?;
        self.expected = Some(self.actual.clone());
        Ok(())
    }

    fn outcome(&self) -> SnapshotOutcome {
        match self.expected {
            Some(ref expected) => {
                if expected == &self.actual {
                    SnapshotOutcome::Equal
                } else {
                    SnapshotOutcome::Different
                }
            }
            None => SnapshotOutcome::Missing,
        }
    }

    fn stdout_diff(&self) -> Option<String> {
        self.expected
            .as_ref()
            .and_then(|expected| make_diff(&self.actual.stdout, &expected.stdout))
    }

    fn stderr_diff(&self) -> Option<String> {
        self.expected
            .as_ref()
            .and_then(|expected| make_diff(&self.actual.stderr, &expected.stderr))
    }
}

fn make_diff(actual: &str, expected: &str) -> Option<String> {
    let mut diff = String::new();
    let mut left_line_number = 0;
    let mut right_line_number = 0;
    let line_width = (actual.lines().count().max(expected.lines().count()) as f32)
        .log10()
        .ceil() as usize;
    for result in diff::lines(expected, actual).into_iter() {
        match result {
            diff::Result::Left(l) => {
                left_line_number += 1;
                diff.push_str(&diff_line('-', left_line_number, line_width, l));
            }
            diff::Result::Both(_l, _r) => {
                left_line_number += 1;
                right_line_number += 1;
            }
            diff::Result::Right(r) => {
                right_line_number += 1;
                diff.push_str(&diff_line('+', right_line_number, line_width, r));
            }
        }
    }
    if diff.is_empty() {
        None
    } else {
        Some(diff)
    }
}

fn diff_line(sign: char, line_number: usize, line_width: usize, line: &str) -> String {
    format!("{line_number:>line_width$}| {sign} {line}\n")
}
