use std::future::Future;
use std::time::Instant;

use orbit_contracts::InvokeError;
use orbit_kernel::RequestContext;
use orbit_logging::sanitize_for_log;

const COMMAND_SLOW_TRACE_MS: u64 = 300;

fn elapsed_ms(started_at: Instant) -> u64 {
    u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
}

pub(crate) fn command_start(command: &str, context: &RequestContext) -> Instant {
    tracing::debug!(
        event = "command_start",
        command = command,
        request_id = context.request_id(),
        request_id_generated = context.is_generated(),
        window_label = context.window_label().unwrap_or("unknown")
    );
    Instant::now()
}

pub(crate) fn command_end_ok(command: &str, request_id: &str, started_at: Instant) {
    let duration_ms = elapsed_ms(started_at);
    if duration_ms >= COMMAND_SLOW_TRACE_MS {
        tracing::info!(
            event = "command_end",
            command = command,
            request_id = request_id,
            ok = true,
            duration_ms = duration_ms
        );
    } else {
        tracing::debug!(
            event = "command_end",
            command = command,
            request_id = request_id,
            ok = true,
            duration_ms = duration_ms
        );
    }
}

pub(crate) fn command_end_error(
    command: &str,
    request_id: &str,
    started_at: Instant,
    error: &InvokeError,
) {
    let duration_ms = elapsed_ms(started_at);
    let primary_cause = error
        .causes
        .first()
        .map(|cause| sanitize_for_log(cause))
        .unwrap_or_default();

    tracing::error!(
        event = "command_end",
        command = command,
        request_id = request_id,
        ok = false,
        duration_ms = duration_ms,
        error_code = error.code.as_str(),
        error_message = sanitize_for_log(&error.message),
        error_causes_count = error.causes.len(),
        error_primary_cause = primary_cause.as_str()
    );
}

fn finish<T, E>(
    command: &str,
    context: &RequestContext,
    started_at: Instant,
    result: Result<T, E>,
) -> Result<T, InvokeError>
where
    E: Into<InvokeError>,
{
    match result {
        Ok(value) => {
            command_end_ok(command, context.request_id(), started_at);
            Ok(value)
        }
        Err(error) => {
            let error = error.into().with_request_id(context.request_id());
            command_end_error(command, context.request_id(), started_at, &error);
            Err(error)
        }
    }
}

pub(crate) fn run_command_sync<T, E, F>(
    command: &str,
    request_id: Option<String>,
    window_label: Option<String>,
    op: F,
) -> Result<T, InvokeError>
where
    E: Into<InvokeError>,
    F: FnOnce() -> Result<T, E>,
{
    let context = RequestContext::new(request_id, window_label);
    let started_at = command_start(command, &context);
    finish(command, &context, started_at, op())
}

pub(crate) async fn run_command_async<T, E, Fut, F>(
    command: &str,
    request_id: Option<String>,
    window_label: Option<String>,
    op: F,
) -> Result<T, InvokeError>
where
    E: Into<InvokeError>,
    Fut: Future<Output = Result<T, E>>,
    F: FnOnce() -> Fut,
{
    let context = RequestContext::new(request_id, window_label);
    let started_at = command_start(command, &context);
    let result = op().await;
    finish(command, &context, started_at, result)
}
