//! Category deletion endpoint.
//!
//! Deletion is always a soft delete: the row is flagged and, for main
//! categories, the flag cascades to the currently active children.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    category::{CategoryId, db::soft_delete_category},
};

/// The state needed for deleting a category.
#[derive(Debug, Clone)]
pub struct DeleteCategoryEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteCategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Handle category deletion. Returns success alert or error.
pub async fn delete_category_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<DeleteCategoryEndpointState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match soft_delete_category(category_id, &connection) {
        Ok(_) => Alert::SuccessSimple {
            message: "Category deleted successfully".to_owned(),
        }
        .into_response(),
        Err(Error::DeleteMissingCategory) => Error::DeleteMissingCategory.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting category {category_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_category_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use scraper::Html;

    use crate::{
        category::{
            db::test_helpers::{
                create_main_category, create_sub_category, get_test_db_connection,
            },
            delete_category_endpoint, find_category,
        },
        test_utils::{assert_valid_html, get_header, parse_html_fragment},
    };

    use super::DeleteCategoryEndpointState;

    fn get_delete_category_state() -> DeleteCategoryEndpointState {
        DeleteCategoryEndpointState {
            db_connection: Arc::new(Mutex::new(get_test_db_connection())),
        }
    }

    #[tokio::test]
    async fn delete_category_endpoint_cascades_to_children() {
        let state = get_delete_category_state();
        let (electronics, phones) = {
            let connection = state.db_connection.lock().unwrap();
            let electronics = create_main_category("Electronics", &connection);
            let phones = create_sub_category("Phones", electronics.id, &connection);
            (electronics, phones)
        };

        let response = delete_category_endpoint(Path(electronics.id), State(state.clone()))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);

        let connection = state.db_connection.lock().unwrap();
        assert!(find_category(electronics.id, &connection).unwrap().is_deleted);
        assert!(find_category(phones.id, &connection).unwrap().is_deleted);
    }

    #[tokio::test]
    async fn delete_category_endpoint_with_invalid_id_returns_error_html() {
        let state = get_delete_category_state();
        let invalid_id = 999999;

        let response = delete_category_endpoint(Path(invalid_id), State(state))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            get_header(&response, "content-type"),
            "text/html; charset=utf-8"
        );

        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        assert_error_content(&html, "Could not delete category");
    }

    #[track_caller]
    fn assert_error_content(html: &Html, want_error_message: &str) {
        let p = scraper::Selector::parse("p").unwrap();
        let error_message = html
            .select(&p)
            .next()
            .expect("No error message found")
            .text()
            .collect::<Vec<_>>()
            .join("");
        let got_error_message = error_message.trim();

        assert_eq!(want_error_message, got_error_message);
    }
}
