//! git::mock
//!
//! Scripted command runner for deterministic testing.
//!
//! # Design
//!
//! Responses are registered against an argument prefix. When several
//! responses are queued for the same prefix they are handed out in order and
//! the last one repeats. Unmatched invocations succeed with empty output.
//! Every invocation is recorded.
//!
//! # Example
//!
//! ```
//! use reposync::git::mock::MockRunner;
//! use reposync::git::{CommandOutput, CommandRunner};
//! use std::path::Path;
//!
//! # tokio_test::block_on(async {
//! let runner = MockRunner::new()
//!     .on(&["rev-parse", "HEAD"], CommandOutput::ok("aaa\n"))
//!     .on(&["rev-parse", "HEAD"], CommandOutput::ok("bbb\n"));
//!
//! let args = vec!["rev-parse".to_string(), "HEAD".to_string()];
//! let first = runner.run("git", &args, Path::new(".")).await.unwrap();
//! let second = runner.run("git", &args, Path::new(".")).await.unwrap();
//! assert_eq!(first.stdout, "aaa\n");
//! assert_eq!(second.stdout, "bbb\n");
//! assert_eq!(runner.invocations().len(), 2);
//! # });
//! ```

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::interface::{CommandOutput, CommandRunner};

/// One recorded process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl Invocation {
    /// Arguments joined with spaces, e.g. `status -s`.
    pub fn command_line(&self) -> String {
        self.args.join(" ")
    }
}

/// Scripted runner for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockRunner {
    inner: Arc<Mutex<MockRunnerInner>>,
}

#[derive(Debug, Default)]
struct MockRunnerInner {
    rules: Vec<Rule>,
    invocations: Vec<Invocation>,
}

#[derive(Debug)]
struct Rule {
    prefix: Vec<String>,
    responses: VecDeque<CommandOutput>,
}

impl MockRunner {
    /// Create a runner where every command succeeds with empty output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `output` for invocations whose arguments start with `prefix`.
    pub fn on(self, prefix: &[&str], output: CommandOutput) -> Self {
        {
            let mut inner = self.lock();
            let prefix: Vec<String> = prefix.iter().map(|s| s.to_string()).collect();
            match inner.rules.iter_mut().find(|r| r.prefix == prefix) {
                Some(rule) => rule.responses.push_back(output),
                None => inner.rules.push(Rule {
                    prefix,
                    responses: VecDeque::from([output]),
                }),
            }
        }
        self
    }

    /// Get all recorded invocations.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.lock().invocations.clone()
    }

    /// Recorded invocations as argument lines, e.g. `["status -s", ...]`.
    pub fn command_lines(&self) -> Vec<String> {
        self.lock()
            .invocations
            .iter()
            .map(Invocation::command_line)
            .collect()
    }

    /// Whether any invocation started with `prefix`.
    pub fn ran(&self, prefix: &[&str]) -> bool {
        self.lock().invocations.iter().any(|inv| {
            inv.args.len() >= prefix.len() && inv.args.iter().zip(prefix).all(|(a, p)| a == p)
        })
    }

    fn lock(&self) -> MutexGuard<'_, MockRunnerInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
    ) -> std::io::Result<CommandOutput> {
        let mut inner = self.lock();
        inner.invocations.push(Invocation {
            program: program.to_string(),
            args: args.to_vec(),
            cwd: cwd.to_path_buf(),
        });

        let rule = inner
            .rules
            .iter_mut()
            .find(|r| args.len() >= r.prefix.len() && args[..r.prefix.len()] == r.prefix[..]);

        let output = match rule {
            Some(rule) if rule.responses.len() > 1 => rule.responses.pop_front(),
            Some(rule) => rule.responses.front().cloned(),
            None => None,
        };

        Ok(output.unwrap_or_default())
    }
}
