//! Alert fragments for reporting the outcome of htmx requests.
//!
//! Alerts render into the `#alert-container` element declared by the base
//! page template.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

const SUCCESS_STYLE: &str = "rounded border border-green-300 bg-green-50 px-4 py-3 \
    text-sm text-green-800 shadow dark:border-green-700 dark:bg-green-900 \
    dark:text-green-200";

const ERROR_STYLE: &str = "rounded border border-red-300 bg-red-50 px-4 py-3 \
    text-sm text-red-800 shadow dark:border-red-700 dark:bg-red-900 \
    dark:text-red-200";

/// A dismissable message shown at the bottom of the page.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// An operation succeeded.
    SuccessSimple {
        /// The headline of the alert.
        message: String,
    },
    /// An operation failed, with extra context for the user.
    Error {
        /// The headline of the alert.
        message: String,
        /// Supporting detail shown below the headline.
        details: String,
    },
    /// An operation failed.
    ErrorSimple {
        /// The headline of the alert.
        message: String,
    },
}

impl Alert {
    /// Render the alert as an out-of-band fragment targeting `#alert-container`.
    pub fn into_html(self) -> Markup {
        let (style, message, details) = match self {
            Alert::SuccessSimple { message } => (SUCCESS_STYLE, message, String::new()),
            Alert::Error { message, details } => (ERROR_STYLE, message, details),
            Alert::ErrorSimple { message } => (ERROR_STYLE, message, String::new()),
        };

        html!(
            div role="alert" class=(style)
            {
                p class="font-semibold" { (message) }

                @if !details.is_empty() {
                    p { (details) }
                }
            }
        )
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        (StatusCode::OK, self.into_html()).into_response()
    }
}
