//! Vitrin is the admin panel for a storefront's category tree.
//!
//! This library provides a REST API that directly serves HTML pages for
//! listing, creating, inspecting, renaming and soft-deleting categories.
//! Categories form a two-level hierarchy: main categories carry an image and
//! sub-categories reference a main category as their parent.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod category;
mod db;
mod endpoints;
mod html;
mod image_store;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod routing;
#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use image_store::ImageStore;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;

use crate::{
    alert::Alert,
    internal_server_error::InternalServerError,
    not_found::get_404_not_found_response,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An empty or whitespace-only string was used as a category name.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// Another active main category already uses this name.
    ///
    /// Names are compared case-insensitively and only against categories that
    /// have not been soft-deleted.
    #[error("A category named \"{0}\" already exists")]
    DuplicateCategoryName(String),

    /// Another active sub-category of the same parent already uses this name.
    ///
    /// Sub-categories under *different* parents may share a name.
    #[error("A sub-category named \"{0}\" already exists under this category")]
    DuplicateSubcategoryName(String),

    /// A main category was submitted without an image file.
    #[error("Please choose an image")]
    MissingImage,

    /// The uploaded file does not look like an image.
    #[error("Please choose an image file (JPEG, PNG, GIF or WebP)")]
    NotAnImage,

    /// The uploaded image exceeds the size limit.
    #[error("Please choose an image smaller than 1 MB")]
    ImageTooLarge,

    /// A sub-category was submitted without selecting a parent category.
    #[error("Please select a parent category")]
    NoParentSelected,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows or the
    /// row has been soft-deleted.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The category ID in the URL disagrees with the ID in the submitted form.
    #[error("the category ID in the URL does not match the submitted form")]
    IdMismatch,

    /// The multipart form could not be parsed.
    #[error("Could not parse multipart form: {0}")]
    MultipartError(String),

    /// The category image could not be written to disk.
    ///
    /// Image validation runs before storage, so this aborts the create
    /// operation before any database write.
    #[error("could not store the category image: {0}")]
    StorageError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to delete a category that does not exist or is already deleted
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// Tried to update a category that does not exist
    #[error("tried to update a category that is not in the database")]
    UpdateMissingCategory,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    fn into_alert_response(self) -> Response {
        match self {
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Category not found".to_owned(),
                    details: "The category may have been deleted. \
                        Try refreshing the page."
                        .to_owned(),
                }
                .into_html(),
            )
                .into_response(),
            Error::DeleteMissingCategory => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete category".to_owned(),
                    details: "The category could not be found. \
                        Try refreshing the page to see if the category has already been deleted."
                        .to_owned(),
                }
                .into_html(),
            )
                .into_response(),
            Error::UpdateMissingCategory => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update category".to_owned(),
                    details: "The category could not be found.".to_owned(),
                }
                .into_html(),
            )
                .into_response(),
            Error::IdMismatch => (
                StatusCode::BAD_REQUEST,
                Alert::ErrorSimple {
                    message: "The category ID in the URL does not match the submitted form."
                        .to_owned(),
                }
                .into_html(),
            )
                .into_response(),
            Error::MultipartError(details) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Could not read the submitted form".to_owned(),
                    details,
                }
                .into_html(),
            )
                .into_response(),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details: "An unexpected error occurred, check the server logs for more details."
                        .to_owned(),
                }
                .into_html(),
            )
                .into_response(),
        }
    }
}
