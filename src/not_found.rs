//! The 404 page shown for unknown routes and missing categories.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::html::error_view;

pub async fn get_404_not_found() -> Response {
    get_404_not_found_response()
}

pub fn get_404_not_found_response() -> Response {
    (
        StatusCode::NOT_FOUND,
        error_view(
            "Not Found",
            "404",
            "Sorry, that page does not exist.",
            "Check the URL or head back to the category list.",
        ),
    )
        .into_response()
}
