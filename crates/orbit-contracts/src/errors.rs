use serde::Serialize;
use std::error::Error as StdError;
use std::fmt::{Display, Formatter};
use std::ops::{Deref, DerefMut};

const DEFAULT_CODE: &str = "internal_error";
const DEFAULT_MESSAGE: &str = "Operation failed";
const RELEASE_REDACTED_CAUSE: &str = "Details hidden, see the log file";
const REDACTED_PATH: &str = "<path>";
const RELEASE_CAUSE_MAX_CHARS: usize = 160;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorContextItem {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppErrorPayload {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<ErrorContextItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error carried through every layer of the backend.
///
/// The payload is boxed so `AppResult<T>` stays one pointer wide on the error
/// side; `code` is the stable identifier the UI switches on.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct AppError(Box<AppErrorPayload>);

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self(Box::new(AppErrorPayload {
            code: code.into(),
            message: message.into(),
            context: Vec::new(),
            causes: Vec::new(),
            request_id: None,
        }))
    }

    pub fn with_code(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.0.code = code.into();
        self.0.message = message.into();
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.context.push(ErrorContextItem {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        push_cause(&mut self.0.causes, cause.into());
        self
    }

    pub fn with_causes<I, S>(mut self, causes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for cause in causes {
            push_cause(&mut self.0.causes, cause.into());
        }
        self
    }

    /// Records the source's type name and its whole `source()` chain.
    pub fn with_source<E>(self, error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        let chain = std::iter::successors(Some(&error as &(dyn StdError + 'static)), |&cause| {
            cause.source()
        });
        let causes = chain_to_causes(chain);
        let error = if self.context_value("sourceType").is_some() {
            self
        } else {
            self.with_context("sourceType", std::any::type_name::<E>())
        };
        error.with_causes(causes)
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        if let Some(request_id) = non_blank(request_id.into()) {
            self.0.request_id = Some(request_id);
        }
        self
    }

    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.0
            .context
            .iter()
            .find(|item| item.key == key)
            .map(|item| item.value.as_str())
    }

    /// Keeps an `AppError` carried inside `error` intact; anything else
    /// becomes `internal_error` with the context chain as causes.
    pub fn from_anyhow(error: anyhow::Error) -> Self {
        match error.downcast::<Self>() {
            Ok(app_error) => app_error,
            Err(error) => Self::new(DEFAULT_CODE, DEFAULT_MESSAGE)
                .with_causes(chain_to_causes(error.chain())),
        }
    }
}

impl Deref for AppError {
    type Target = AppErrorPayload;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl DerefMut for AppError {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0.as_mut()
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl StdError for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        Self::from_anyhow(value)
    }
}

/// Serialized error returned from a Tauri command.
///
/// Debug builds keep the full cause chain; release builds keep only the
/// first cause, with filesystem paths masked.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeError {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<ErrorContextItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl InvokeError {
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        if let Some(request_id) = non_blank(request_id.into()) {
            self.request_id = Some(request_id);
        }
        self
    }

    pub fn from_anyhow(error: anyhow::Error) -> Self {
        AppError::from_anyhow(error).into()
    }
}

impl Display for InvokeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl StdError for InvokeError {}

impl From<AppError> for InvokeError {
    fn from(value: AppError) -> Self {
        let payload = *value.0;
        let causes = if cfg!(debug_assertions) {
            payload.causes
        } else {
            payload
                .causes
                .first()
                .map(|cause| vec![sanitize_cause_for_release(cause)])
                .unwrap_or_default()
        };

        Self {
            code: payload.code,
            message: payload.message,
            context: payload.context,
            causes,
            request_id: payload.request_id,
        }
    }
}

impl From<anyhow::Error> for InvokeError {
    fn from(value: anyhow::Error) -> Self {
        Self::from_anyhow(value)
    }
}

/// Lifts foreign errors into `AppError` at the point they occur.
pub trait ResultExt<T> {
    fn with_code(self, code: impl Into<String>, message: impl Into<String>) -> AppResult<T>;
    fn with_ctx(self, key: impl Into<String>, value: impl Into<String>) -> AppResult<T>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn with_code(self, code: impl Into<String>, message: impl Into<String>) -> AppResult<T> {
        self.map_err(|error| AppError::from_anyhow(error.into()).with_code(code, message))
    }

    fn with_ctx(self, key: impl Into<String>, value: impl Into<String>) -> AppResult<T> {
        self.map_err(|error| AppError::from_anyhow(error.into()).with_context(key, value))
    }
}

fn non_blank(value: String) -> Option<String> {
    (!value.trim().is_empty()).then_some(value)
}

/// Appends unless blank or equal to the previous cause; wrappers often
/// repeat their inner message.
fn push_cause(causes: &mut Vec<String>, cause: String) {
    if cause.trim().is_empty() || causes.last() == Some(&cause) {
        return;
    }
    causes.push(cause);
}

fn chain_to_causes<'a, I>(chain: I) -> Vec<String>
where
    I: Iterator<Item = &'a (dyn StdError + 'static)>,
{
    let mut causes = Vec::new();
    for cause in chain {
        push_cause(&mut causes, cause.to_string());
    }
    causes
}

/// One line, path-like tokens masked, bounded length.
fn sanitize_cause_for_release(cause: &str) -> String {
    let masked = cause
        .split_whitespace()
        .map(|token| {
            if token.contains('/') || token.contains('\\') {
                REDACTED_PATH
            } else {
                token
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    if masked.is_empty() {
        return RELEASE_REDACTED_CAUSE.to_string();
    }
    if masked.chars().count() <= RELEASE_CAUSE_MAX_CHARS {
        return masked;
    }
    let mut truncated: String = masked.chars().take(RELEASE_CAUSE_MAX_CHARS).collect();
    truncated.push('…');
    truncated
}

#[cfg(test)]
#[path = "../tests/errors/errors_tests.rs"]
mod tests;
