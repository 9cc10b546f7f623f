//! Inference gateway: one subprocess per prompt.
//!
//! Per call the state machine is
//! `Idle -> Spawned -> {Completed | TimedOut | NonZeroExit | EmptyResponse} -> Terminated`.
//! The runner kills and reaps the child on every branch, so control only
//! returns to the caller from `Terminated`.

use crate::error::InferError;
use crate::metrics::METRICS;
use crate::obs::{emit_inference_finished, emit_inference_started, inference_span};
use proc_runner::{CommandSpec, ProcessError, ProcessRunner};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::{debug, warn, Instrument};
use uuid::Uuid;

/// Longest stderr excerpt copied into logs for a failed call.
const STDERR_LOG_LIMIT: usize = 2048;

/// Phase of one inference call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferencePhase {
    Idle,
    Spawned,
    Completed,
    TimedOut,
    NonZeroExit,
    EmptyResponse,
    /// Any other failure to run the child (spawn, drain, wait)
    Failed,
    Terminated,
}

impl InferencePhase {
    /// Terminal branch reached by a finished call.
    pub fn of(result: &Result<String, InferError>) -> Self {
        match result {
            Ok(_) => InferencePhase::Completed,
            Err(InferError::Timeout(_)) => InferencePhase::TimedOut,
            Err(InferError::NonZeroExit { .. }) => InferencePhase::NonZeroExit,
            Err(InferError::EmptyResponse) => InferencePhase::EmptyResponse,
            Err(_) => InferencePhase::Failed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InferencePhase::Idle => "idle",
            InferencePhase::Spawned => "spawned",
            InferencePhase::Completed => "completed",
            InferencePhase::TimedOut => "timed_out",
            InferencePhase::NonZeroExit => "non_zero_exit",
            InferencePhase::EmptyResponse => "empty_response",
            InferencePhase::Failed => "failed",
            InferencePhase::Terminated => "terminated",
        }
    }
}

/// Request/response facade over the external inference command.
///
/// Holds no per-request state. Concurrent callers share only the optional
/// permit pool, and waiting for a permit counts against the call's deadline.
pub struct InferenceGateway {
    runner: Arc<dyn ProcessRunner>,
    command: CommandSpec,
    timeout: Duration,
    permits: Semaphore,
}

impl InferenceGateway {
    /// `command` is the inference invocation without the prompt; the prompt
    /// is appended as the last positional argument of each call.
    ///
    /// `max_concurrent` caps running subprocesses; `None` leaves them unlimited.
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        command: CommandSpec,
        timeout: Duration,
        max_concurrent: Option<usize>,
    ) -> Self {
        let permits = max_concurrent.map_or(Semaphore::MAX_PERMITS, |n| n.max(1));
        InferenceGateway {
            runner,
            command,
            timeout,
            permits: Semaphore::new(permits),
        }
    }

    /// Refuse new and queued calls. Running calls finish normally.
    pub fn close(&self) {
        self.permits.close();
    }

    /// Run one inference and return the trimmed stdout of the command.
    ///
    /// The whole call, including any wait for a permit, is bounded by the
    /// gateway timeout.
    pub async fn infer(&self, prompt: &str) -> Result<String, InferError> {
        if prompt.trim().is_empty() {
            return Err(InferError::InvalidPrompt);
        }

        let request_id = Uuid::new_v4();
        let deadline = Instant::now() + self.timeout;
        async {
            debug!(phase = InferencePhase::Idle.as_str(), "Waiting for an inference slot");
            let _permit = match tokio::time::timeout_at(deadline, self.permits.acquire()).await {
                Ok(Ok(permit)) => permit,
                Ok(Err(_)) => return Err(InferError::Unavailable),
                Err(_) => {
                    warn!("No inference slot freed up before the deadline");
                    METRICS.inc_timed_out();
                    METRICS.inc_failed();
                    return Err(InferError::Timeout(self.timeout));
                }
            };
            self.run_once(prompt, deadline).await
        }
        .instrument(inference_span(&request_id))
        .await
    }

    async fn run_once(&self, prompt: &str, deadline: Instant) -> Result<String, InferError> {
        let start = Instant::now();
        METRICS.inc_started();
        emit_inference_started(prompt.chars().count());

        let remaining = deadline.saturating_duration_since(start);
        let spec = self.command.clone().arg(prompt).timeout(remaining);
        debug!(phase = InferencePhase::Spawned.as_str(), "Running inference command");

        let result = match self.runner.run(&spec).await {
            Ok(output) => {
                let response = output.stdout_trimmed();
                if response.is_empty() {
                    Err(InferError::EmptyResponse)
                } else {
                    Ok(response.to_string())
                }
            }
            Err(ProcessError::Timeout { .. }) => Err(InferError::Timeout(self.timeout)),
            Err(ProcessError::NonZeroExit { code, stderr, .. }) => {
                warn!(code, stderr = %tail(&stderr, STDERR_LOG_LIMIT), "Inference command failed");
                Err(InferError::NonZeroExit { code })
            }
            Err(other) => {
                warn!(error = %other, "Inference command could not be run");
                Err(InferError::Launch(other))
            }
        };

        let phase = InferencePhase::of(&result);
        match phase {
            InferencePhase::Completed => METRICS.inc_succeeded(),
            InferencePhase::TimedOut => {
                METRICS.inc_timed_out();
                METRICS.inc_failed();
            }
            _ => METRICS.inc_failed(),
        }
        emit_inference_finished(phase.as_str(), start.elapsed().as_millis() as u64);
        debug!(phase = InferencePhase::Terminated.as_str(), "Inference call returned");

        result
    }
}

/// Last `limit` bytes of `text`, cut on a char boundary.
fn tail(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }
    let mut cut = text.len() - limit;
    while !text.is_char_boundary(cut) {
        cut += 1;
    }
    &text[cut..]
}
