///! User-facing error handling for the console
///!
///! Turns failed REST calls into readable messages and renders them

use leptos::*;

/// Failed request as seen by the UI. `status` is 0 when no response came back.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiError {
    pub status: u16,
    pub message: String,
    /// Response body, if the manager sent one
    pub details: Option<String>,
}

impl ApiError {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: 0,
            message: message.into(),
            details: None,
        }
    }

    pub fn from_status(status: u16, details: Option<String>) -> Self {
        Self {
            status,
            message: format!("HTTP {}", status),
            details: details.filter(|d| !d.trim().is_empty()),
        }
    }

    pub fn user_message(&self) -> String {
        match self.status {
            0 => "The manager could not be reached.".to_string(),
            401 => "Your session has expired. Please log in again.".to_string(),
            403 => "Your account is missing the role for this action.".to_string(),
            404 => "The user or ruleset no longer exists.".to_string(),
            409 => "A user with this username already exists.".to_string(),
            400..=499 => format!("Rejected by the manager: {}", self.details.as_deref().unwrap_or(&self.message)),
            503 => "The manager is starting up or overloaded. Try again shortly.".to_string(),
            500..=599 => "The manager failed to handle the request.".to_string(),
            _ => self.message.clone(),
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.status {
            400..=499 => ErrorSeverity::Warning,
            0 | 500..=599 => ErrorSeverity::Error,
            _ => ErrorSeverity::Info,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self.status {
            0 => "🔌",
            401 => "🔐",
            403 => "🚫",
            404 => "🔍",
            400..=499 => "⚠️",
            _ => "❌",
        }
    }

    /// Worth offering a retry; client errors won't go away by themselves
    pub fn is_retryable(&self) -> bool {
        matches!(self.status, 0 | 502 | 503 | 504)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::network(format!("Body could not be encoded: {}", err))
    }
}

impl From<ApiError> for console_common::Error {
    fn from(err: ApiError) -> Self {
        match err.status {
            0 => console_common::Error::Http(err.message),
            401 => console_common::Error::NotAuthenticated,
            status => console_common::Error::Status {
                status,
                message: err.details.unwrap_or(err.message),
            },
        }
    }
}

/// The reverse mapping, for errors surfaced by the shared state
impl From<&console_common::Error> for ApiError {
    fn from(err: &console_common::Error) -> Self {
        match err {
            console_common::Error::Status { status, message } => ApiError::from_status(*status, Some(message.clone())),
            console_common::Error::NotAuthenticated => ApiError::from_status(401, None),
            console_common::Error::Forbidden(role) => ApiError::from_status(403, Some(role.to_string())),
            other => ApiError::network(other.to_string()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
}

impl ErrorSeverity {
    pub fn class(&self) -> &'static str {
        match self {
            ErrorSeverity::Info => "alert-info",
            ErrorSeverity::Warning => "alert-warning",
            ErrorSeverity::Error => "alert-error",
        }
    }
}

/// Dismissable banner for a failed request
#[component]
pub fn ErrorAlert(
    error: ApiError,
    #[prop(optional)]
    on_retry: Option<Callback<()>>,
    #[prop(optional)]
    on_dismiss: Option<Callback<()>>,
) -> impl IntoView {
    let severity = error.severity();
    let icon = error.icon();
    let message = error.user_message();
    let retry = on_retry.filter(|_| error.is_retryable());

    let details = error.details.clone();

    view! {
        <div class={format!("alert {}", severity.class())} role="alert">
            <span class="alert-icon">{icon}</span>
            <div class="alert-body">
                <p>{message}</p>
                {details.map(|body| view! {
                    <details>
                        <summary>"Response"</summary>
                        <pre>{body}</pre>
                    </details>
                })}
            </div>
            <div class="alert-actions">
                {retry.map(|on_retry| view! {
                    <button class="btn-secondary btn-sm" on:click=move |_| on_retry.call(())>
                        "Retry"
                    </button>
                })}
                {on_dismiss.map(|on_dismiss| view! {
                    <button class="btn-ghost btn-sm" on:click=move |_| on_dismiss.call(())>
                        "✕"
                    </button>
                })}
            </div>
        </div>
    }
}

/// Inline helper text under a form field
#[component]
pub fn FieldError(message: String) -> impl IntoView {
    view! {
        <small class="field-error">{message}</small>
    }
}

/// Placeholder shown instead of a list that has nothing to show
#[component]
pub fn EmptyState(
    #[prop(default = "📦")]
    icon: &'static str,
    title: String,
    description: String,
) -> impl IntoView {
    view! {
        <div class="empty-state">
            <span class="empty-icon">{icon}</span>
            <strong>{title}</strong>
            <p>{description}</p>
        </div>
    }
}
