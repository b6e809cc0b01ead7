//! External command execution.
//!
//! Wraps `std::process::Command` with argument plumbing and output
//! filtering for the headless browser the pdf exporter drives.

use crate::log;
use anyhow::{Context, Result};
use std::{
    ffi::OsString,
    path::Path,
    process::{Command, Output},
};

// ============================================================================
// Macros
// ============================================================================

/// Run an external command with arguments.
///
/// # Examples
/// ```ignore
/// // Without working directory
/// run_command!(["chromium"]; "--version")?;
///
/// // With working directory
/// run_command!(root; &config.pdf.browser; "--headless=new", input)?;
/// ```
#[macro_export]
macro_rules! run_command {
    ($cmd:expr; $($arg:expr),* $(,)?) => {{
        $crate::utils::command::run(
            None,
            &$crate::utils::command::to_cmd_vec($cmd),
            &$crate::utils::command::filter_args(&[$($crate::utils::command::to_os($arg)),*]),
        )
    }};
    ($root:expr; $cmd:expr; $($arg:expr),* $(,)?) => {{
        $crate::utils::command::run(
            Some($root),
            &$crate::utils::command::to_cmd_vec($cmd),
            &$crate::utils::command::filter_args(&[$($crate::utils::command::to_os($arg)),*]),
        )
    }};
}

// ============================================================================
// Argument Conversion
// ============================================================================

/// Convert to OsString.
#[inline]
pub fn to_os<S: Into<OsString>>(s: S) -> OsString {
    s.into()
}

/// Trait for converting to command vector.
pub trait ToCmd {
    fn to_cmd(self) -> Vec<OsString>;
}

impl<const N: usize> ToCmd for [&str; N] {
    #[inline]
    fn to_cmd(self) -> Vec<OsString> {
        self.into_iter().map(OsString::from).collect()
    }
}

impl ToCmd for &[String] {
    #[inline]
    fn to_cmd(self) -> Vec<OsString> {
        self.iter().map(OsString::from).collect()
    }
}

impl ToCmd for &Vec<String> {
    #[inline]
    fn to_cmd(self) -> Vec<OsString> {
        self.iter().map(OsString::from).collect()
    }
}

/// Convert command to Vec<OsString>.
#[inline]
pub fn to_cmd_vec<C: ToCmd>(cmd: C) -> Vec<OsString> {
    cmd.to_cmd()
}

/// Filter out empty args.
#[inline]
pub fn filter_args(args: &[OsString]) -> Vec<OsString> {
    args.iter().filter(|a| !a.is_empty()).cloned().collect()
}

// ============================================================================
// Command Execution
// ============================================================================

/// Execute a command and capture its output.
///
/// # Errors
/// Returns error if command fails to execute or returns non-zero exit code.
pub fn run(root: Option<&Path>, cmd: &[OsString], args: &[OsString]) -> Result<Output> {
    let (name, mut command) = prepare(root, cmd, args)?;

    let output = command
        .output()
        .with_context(|| format!("Failed to execute `{name}`"))?;

    log_output(&name, &output)?;
    Ok(output)
}

/// Prepare a Command from components.
fn prepare(root: Option<&Path>, cmd: &[OsString], args: &[OsString]) -> Result<(String, Command)> {
    let name = cmd
        .first()
        .and_then(|s| s.to_str())
        .context("Empty command")?
        .to_owned();

    let mut command = Command::new(&cmd[0]);
    command.args(&cmd[1..]).args(args);

    if let Some(dir) = root {
        command.current_dir(dir);
    }

    Ok((name, command))
}

// ============================================================================
// Output Filtering
// ============================================================================

/// Filter rule for CLI output noise.
///
/// Matches lines that start with a prefix AND contain all required keywords.
/// This is more precise than keyword-only matching to avoid filtering user errors.
struct FilterRule {
    /// Line must start with one of these (case-insensitive, after trim).
    starts_with: &'static [&'static str],
    /// Line must also contain ALL of these keywords (case-insensitive).
    contains: &'static [&'static str],
}

impl FilterRule {
    const fn new(starts_with: &'static [&'static str], contains: &'static [&'static str]) -> Self {
        Self { starts_with, contains }
    }

    fn matches(&self, line: &str) -> bool {
        let lower = line.trim().to_ascii_lowercase();
        let has_prefix = self.starts_with.is_empty()
            || self.starts_with.iter().any(|p| lower.starts_with(p));
        let has_keywords = self.contains.iter().all(|kw| lower.contains(kw));
        has_prefix && has_keywords
    }
}

/// Output filter configuration.
struct OutputFilter {
    /// Lines matching any rule are filtered out.
    line_rules: &'static [FilterRule],
    /// Prefixes indicating non-output (HTML, JSON).
    skip_prefixes: &'static [&'static str],
}

impl OutputFilter {
    const STDOUT: Self = Self {
        line_rules: &[],
        skip_prefixes: &["<!DOCTYPE", "{"],
    };

    // Headless Chromium chatter, e.g.:
    //   DevTools listening on ws://127.0.0.1:9222/devtools/...
    //   [0101/000000.000000:WARNING:bluez_dbus_manager.cc(248)] ...
    //   Fontconfig error: Cannot load default config file
    //   libva error: vaGetDriverNameByIndex() failed
    const STDERR: Self = Self {
        line_rules: &[
            FilterRule::new(&["devtools listening"], &[]),
            FilterRule::new(&["["], &[":warning:"]),
            FilterRule::new(&["["], &[":info:"]),
            FilterRule::new(&["fontconfig"], &[]),
            FilterRule::new(&["libva error:"], &[]),
            FilterRule::new(&["warning:"], &["sandbox"]),
        ],
        skip_prefixes: &[],
    };

    /// Check if entire output block should be skipped.
    fn should_skip(&self, output: &str) -> bool {
        output.is_empty() || self.skip_prefixes.iter().any(|p| output.starts_with(p))
    }

    /// Check if a line should be filtered.
    fn should_filter_line(&self, line: &str) -> bool {
        self.line_rules.iter().any(|r| r.matches(line))
    }

    /// Log non-filtered lines.
    fn log(&self, name: &str, output: &str) {
        if self.should_skip(output) {
            return;
        }
        for line in output.lines() {
            if !line.trim().is_empty() && !self.should_filter_line(line) {
                log!(name; "{line}");
            }
        }
    }

    /// Extract error message, skipping filtered lines at start.
    fn extract_error<'a>(&self, stderr: &'a str) -> &'a str {
        stderr
            .lines()
            .find(|line| !line.trim().is_empty() && !self.should_filter_line(line))
            .map(|first| {
                let offset = first.as_ptr() as usize - stderr.as_ptr() as usize;
                &stderr[offset..]
            })
            .unwrap_or(stderr)
            .trim()
    }
}

/// Log command output, filtering known noise.
fn log_output(name: &str, output: &Output) -> Result<()> {
    let stdout = std::str::from_utf8(&output.stdout)
        .context("Invalid UTF-8 in stdout")?
        .trim();
    let stderr = std::str::from_utf8(&output.stderr)
        .context("Invalid UTF-8 in stderr")?
        .trim();

    if !output.status.success() {
        let error_msg = OutputFilter::STDERR.extract_error(stderr);
        if !error_msg.is_empty() {
            eprintln!("{error_msg}");
        }
        anyhow::bail!("Command `{name}` failed with {}", output.status);
    }

    OutputFilter::STDOUT.log(name, stdout);
    OutputFilter::STDERR.log(name, stderr);

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
