use std::sync::atomic::{AtomicU64, Ordering};

const GENERATED_ID_PREFIX: &str = "orbit-local";

static LOCAL_REQUEST_SEQ: AtomicU64 = AtomicU64::new(0);

/// Correlation data a command receives from the webview.
///
/// Calls that arrive without a request id get a process-local one, so every
/// `command_start`/`command_end` pair in the log can still be matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    request_id: String,
    window_label: Option<String>,
}

impl RequestContext {
    pub fn new(request_id: Option<String>, window_label: Option<String>) -> Self {
        Self {
            request_id: trimmed(request_id).unwrap_or_else(next_local_request_id),
            window_label: trimmed(window_label),
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn window_label(&self) -> Option<&str> {
        self.window_label.as_deref()
    }

    pub fn is_generated(&self) -> bool {
        self.request_id.starts_with(GENERATED_ID_PREFIX)
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn next_local_request_id() -> String {
    let seq = LOCAL_REQUEST_SEQ.fetch_add(1, Ordering::Relaxed) + 1;
    format!("{GENERATED_ID_PREFIX}-{seq}")
}

#[cfg(test)]
#[path = "../tests/context/request_tests.rs"]
mod tests;
