//! In-memory fake for the runner trait (testing only)
//!
//! [`ScriptedRunner`] answers each invocation with a canned outcome chosen by
//! substring match on the command line, and records every invocation so tests
//! can assert how often a step ran.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::command::{CommandSpec, ProcessOutput};
use crate::error::ProcessError;
use crate::runner::ProcessRunner;
use crate::Result;

/// Canned outcome for a scripted invocation.
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Exit 0 with this stdout.
    Stdout(String),
    /// Exit with a non-zero code and this stderr.
    Exit { code: i32, stderr: String },
    /// Behave as if the deadline fired.
    Timeout,
    /// Behave as if the program could not be started.
    SpawnFailure,
}

impl Scripted {
    pub fn stdout(text: impl Into<String>) -> Self {
        Scripted::Stdout(text.into())
    }

    pub fn exit(code: i32) -> Self {
        Scripted::Exit {
            code,
            stderr: String::new(),
        }
    }

    fn resolve(&self, spec: &CommandSpec) -> Result<ProcessOutput> {
        let program = spec.display_program();
        match self {
            Scripted::Stdout(text) => Ok(ProcessOutput::with_stdout(text.clone())),
            Scripted::Exit { code, stderr } => Err(ProcessError::NonZeroExit {
                program,
                code: *code,
                stderr: stderr.clone(),
            }),
            Scripted::Timeout => Err(ProcessError::Timeout {
                program,
                after: spec.timeout.unwrap_or_default(),
            }),
            Scripted::SpawnFailure => Err(ProcessError::SpawnFailed {
                program,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "scripted spawn failure"),
            }),
        }
    }
}

type Effect = Arc<dyn Fn(&CommandSpec) + Send + Sync>;

struct Rule {
    needle: String,
    outcome: Scripted,
    effect: Option<Effect>,
}

/// Scripted [`ProcessRunner`] with call recording.
///
/// Rules are checked in insertion order; the first whose needle occurs in the
/// command line wins. Unmatched invocations succeed with empty stdout.
pub struct ScriptedRunner {
    rules: Vec<Rule>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl Default for ScriptedRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedRunner {
    pub fn new() -> Self {
        ScriptedRunner {
            rules: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer commands containing `needle` with `outcome`.
    pub fn on(mut self, needle: impl Into<String>, outcome: Scripted) -> Self {
        self.rules.push(Rule {
            needle: needle.into(),
            outcome,
            effect: None,
        });
        self
    }

    /// Like [`ScriptedRunner::on`], also running `effect` before answering.
    pub fn on_with<F>(mut self, needle: impl Into<String>, outcome: Scripted, effect: F) -> Self
    where
        F: Fn(&CommandSpec) + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            needle: needle.into(),
            outcome,
            effect: Some(Arc::new(effect)),
        });
        self
    }

    /// Every invocation so far, oldest first.
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of invocations whose command line contains `needle`.
    pub fn calls_matching(&self, needle: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|spec| spec.display_command().contains(needle))
            .count()
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<ProcessOutput> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(spec.clone());

        let line = spec.display_command();
        match self.rules.iter().find(|rule| line.contains(&rule.needle)) {
            Some(rule) => {
                if let Some(effect) = &rule.effect {
                    effect(spec);
                }
                rule.outcome.resolve(spec)
            }
            None => Ok(ProcessOutput::with_stdout("")),
        }
    }
}
