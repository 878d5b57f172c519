//! Subprocess execution for synthesized compile/link commands.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use anyhow::{Context, Result};

/// Builder for a single compiler/linker invocation.
///
/// Distinct from [`crate::command`]'s string-based command synthesis:
/// this is the thing that actually spawns a process, given a program and
/// a flat argument list split from a synthesized command string.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    env: HashMap<String, String>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            env: HashMap::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }

    /// Run the command, capturing stdout/stderr, and wait for completion.
    pub fn exec(&self) -> Result<Output> {
        let mut cmd = self.build_command();
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", self.program.display()))?;

        child
            .wait_with_output()
            .with_context(|| format!("failed to wait for `{}`", self.program.display()))
    }

    /// Render the full command as a single display string, e.g. for
    /// diagnostics or `--list-cmd` echoing.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Split a synthesized command string into `(program, args)` for
/// spawning. Commands produced by [`crate::command`] use simple
/// double-quote grouping (see [`crate::shell::quote`]); this performs
/// the matching split.
pub fn split_command(command: &str) -> (String, Vec<String>) {
    let tokens = tokenize(command);
    let mut iter = tokens.into_iter();
    let program = iter.next().unwrap_or_default();
    (program, iter.collect())
}

fn tokenize(command: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = command.chars().peekable();
    let mut has_token = false;

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            '\\' if in_quotes => {
                if let Some(&next) = chars.peek() {
                    if next == '"' || next == '\\' {
                        current.push(next);
                        chars.next();
                        continue;
                    }
                }
                current.push(c);
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }

    if has_token {
        tokens.push(current);
    }

    tokens
}

/// Build a [`ProcessBuilder`] from a fully synthesized command string.
pub fn process_from_command(command: &str) -> ProcessBuilder {
    let (program, args) = split_command(command);
    ProcessBuilder::new(program).args(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_splits_on_whitespace() {
        assert_eq!(
            tokenize("gcc -c file.c -o file.o"),
            vec!["gcc", "-c", "file.c", "-o", "file.o"]
        );
    }

    #[test]
    fn tokenize_respects_quotes() {
        assert_eq!(
            tokenize(r#"gcc -I"/my project" -c"#),
            vec!["gcc", "-I/my project", "-c"]
        );
    }

    #[test]
    fn display_command_round_trips() {
        let pb = ProcessBuilder::new("gcc").args(["-Wall", "-o", "out", "in.c"]);
        assert_eq!(pb.display_command(), "gcc -Wall -o out in.c");
    }
}
