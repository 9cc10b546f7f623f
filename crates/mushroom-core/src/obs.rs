//! Structured observability hooks for startup and inference events.
//!
//! This module provides:
//! - An inference-scoped tracing span tagged with a request id
//! - Emission functions for key lifecycle events
//!
//! Events are emitted at `info!` level (filter with `RUST_LOG`).

use tracing::info;
use uuid::Uuid;

/// Span covering one inference call.
///
/// Attach with `tracing::Instrument` rather than entering it, since the call
/// crosses await points.
pub fn inference_span(request_id: &Uuid) -> tracing::Span {
    tracing::info_span!("mushroom.inference", request_id = %request_id)
}

/// Emit event: one startup step is about to run.
pub fn emit_bootstrap_step(step: &str) {
    info!(event = "bootstrap.step", step = %step);
}

/// Emit event: inference call accepted.
pub fn emit_inference_started(prompt_chars: usize) {
    info!(event = "inference.started", prompt_chars = prompt_chars);
}

/// Emit event: inference call returned, with its terminal phase.
pub fn emit_inference_finished(phase: &str, duration_ms: u64) {
    info!(
        event = "inference.finished",
        phase = %phase,
        duration_ms = duration_ms,
    );
}
