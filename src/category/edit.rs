//! Category editing page and endpoint.
//!
//! Only the name can be edited. The kind, image and parent of a category are
//! fixed at creation time and the update endpoint never touches them,
//! whatever the submitted form contains.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, base,
    },
    navigation::NavBar,
    category::{
        CategoryId, CategoryName,
        db::{category_name_exists_excluding, find_category, get_category_detail,
            update_category_name,
        },
        domain::UpdateCategoryFormData,
    },
};

/// The state needed for the edit category page.
#[derive(Debug, Clone)]
pub struct EditCategoryPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditCategoryPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The state needed for updating a category.
#[derive(Debug, Clone)]
pub struct UpdateCategoryEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdateCategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the category editing page.
pub async fn get_edit_category_page(
    Path(category_id): Path<CategoryId>,
    State(state): State<EditCategoryPageState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let edit_endpoint = endpoints::format_endpoint(endpoints::EDIT_CATEGORY_VIEW, category_id);
    let update_endpoint = endpoints::format_endpoint(endpoints::PUT_CATEGORY, category_id);

    match get_category_detail(category_id, &connection) {
        Ok(detail) => {
            let view = edit_category_view(
                &edit_endpoint,
                &update_endpoint,
                category_id,
                detail.category.name.as_ref(),
                detail.parent.map(|parent| parent.name.to_string()),
                "",
            );
            Ok(view.into_response())
        }
        Err(error) => {
            let error_message = match error {
                Error::NotFound => "Category not found",
                _ => {
                    tracing::error!("Failed to retrieve category {category_id}: {error}");
                    "Failed to load category"
                }
            };

            Ok(edit_category_view(
                &edit_endpoint,
                &update_endpoint,
                category_id,
                "",
                None,
                error_message,
            )
            .into_response())
        }
    }
}

/// Handle category update form submission.
///
/// The path ID must match the ID carried in the form; a mismatch is rejected
/// outright with no mutation. The new name is checked against every other
/// active category, regardless of kind or parent.
pub async fn update_category_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<UpdateCategoryEndpointState>,
    Form(form_data): Form<UpdateCategoryFormData>,
) -> Response {
    if category_id != form_data.id {
        tracing::warn!(
            "Rejected category update: path ID {category_id} does not match form ID {}",
            form_data.id
        );
        return Error::IdMismatch.into_alert_response();
    }

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let update_endpoint = endpoints::format_endpoint(endpoints::PUT_CATEGORY, category_id);
    let render_form_error = |submitted_name: &str, error: &Error| {
        edit_category_form_view(
            &update_endpoint,
            category_id,
            submitted_name,
            &error.to_string(),
        )
        .into_response()
    };

    let name = match CategoryName::new(&form_data.name) {
        Ok(name) => name,
        Err(error) => return render_form_error(&form_data.name, &error),
    };

    if let Err(error) = find_category(category_id, &connection) {
        return match error {
            Error::NotFound => Error::UpdateMissingCategory.into_alert_response(),
            error => {
                tracing::error!("Failed to look up category {category_id}: {error}");
                error.into_alert_response()
            }
        };
    }

    match category_name_exists_excluding(name.as_ref(), category_id, &connection) {
        Ok(true) => {
            let error = Error::DuplicateCategoryName(name.to_string());
            return render_form_error(name.as_ref(), &error);
        }
        Ok(false) => {}
        Err(error) => {
            tracing::error!("Failed to check for duplicate category name: {error}");
            return error.into_alert_response();
        }
    }

    match update_category_name(category_id, name, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::UpdateMissingCategory) => Error::UpdateMissingCategory.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while updating category {category_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

fn edit_category_view(
    edit_endpoint: &str,
    update_endpoint: &str,
    category_id: CategoryId,
    category_name: &str,
    parent_name: Option<String>,
    error_message: &str,
) -> Markup {
    let nav_bar = NavBar::new(edit_endpoint).into_html();
    let form = edit_category_form_view(update_endpoint, category_id, category_name, error_message);

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE)
        {
            @if let Some(parent_name) = parent_name {
                p class="mb-4 text-sm text-gray-500 dark:text-gray-400"
                {
                    "Sub-category of " (parent_name)
                }
            }

            (form)
        }
    };

    base("Edit Category", &content)
}

fn edit_category_form_view(
    update_endpoint: &str,
    category_id: CategoryId,
    category_name: &str,
    error_message: &str,
) -> Markup {
    html! {
        form
            hx-put=(update_endpoint)
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            input type="hidden" name="id" value=(category_id);

            div
            {
                label
                    for="name"
                    class=(FORM_LABEL_STYLE)
                {
                    "Category Name"
                }

                input
                    id="name"
                    type="text"
                    name="name"
                    placeholder="Category Name"
                    value=(category_name)
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            @if !error_message.is_empty() {
                p class=(FORM_ERROR_STYLE)
                {
                    (error_message)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Update Category" }
        }
    }
}


#[cfg(test)]
mod update_category_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Form,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };

    use crate::{
        endpoints,
        category::{
            db::test_helpers::{
                create_main_category, create_sub_category, get_test_db_connection,
            },
            domain::UpdateCategoryFormData,
            find_category, update_category_endpoint,
        },
        test_utils::{
            assert_form_error_message, assert_hx_redirect, assert_valid_html, must_get_form,
            parse_html_fragment,
        },
    };

    use super::UpdateCategoryEndpointState;

    fn get_update_category_state() -> UpdateCategoryEndpointState {
        UpdateCategoryEndpointState {
            db_connection: Arc::new(Mutex::new(get_test_db_connection())),
        }
    }

    #[tokio::test]
    async fn update_category_endpoint_succeeds() {
        let state = get_update_category_state();
        let electronics =
            create_main_category("Electronics", &state.db_connection.lock().unwrap());

        let form = UpdateCategoryFormData {
            id: electronics.id,
            name: "Gadgets".to_string(),
        };

        let response = update_category_endpoint(
            Path(electronics.id),
            State(state.clone()),
            Form(form),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::CATEGORIES_VIEW);

        let connection = state.db_connection.lock().unwrap();
        let updated = find_category(electronics.id, &connection).unwrap();
        assert_eq!(updated.name.as_ref(), "Gadgets");
    }

    #[tokio::test]
    async fn update_leaves_kind_image_and_parent_untouched() {
        let state = get_update_category_state();
        let (electronics, phones) = {
            let connection = state.db_connection.lock().unwrap();
            let electronics = create_main_category("Electronics", &connection);
            let phones = create_sub_category("Phones", electronics.id, &connection);
            (electronics, phones)
        };

        let form = UpdateCategoryFormData {
            id: phones.id,
            name: "Mobiles".to_string(),
        };

        let response = update_category_endpoint(Path(phones.id), State(state.clone()), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let connection = state.db_connection.lock().unwrap();
        let updated = find_category(phones.id, &connection).unwrap();
        assert_eq!(updated.name.as_ref(), "Mobiles");
        assert!(!updated.is_main);
        assert_eq!(updated.image, None);
        assert_eq!(updated.parent_id, Some(electronics.id));
    }

    #[tokio::test]
    async fn update_category_endpoint_with_mismatched_id_returns_bad_request() {
        let state = get_update_category_state();
        let electronics =
            create_main_category("Electronics", &state.db_connection.lock().unwrap());

        let form = UpdateCategoryFormData {
            id: electronics.id + 1,
            name: "Gadgets".to_string(),
        };

        let response = update_category_endpoint(
            Path(electronics.id),
            State(state.clone()),
            Form(form),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let connection = state.db_connection.lock().unwrap();
        let unchanged = find_category(electronics.id, &connection).unwrap();
        assert_eq!(unchanged.name.as_ref(), "Electronics");
    }

    #[tokio::test]
    async fn update_category_endpoint_with_invalid_id_returns_not_found() {
        let state = get_update_category_state();
        let invalid_id = 999999;
        let form = UpdateCategoryFormData {
            id: invalid_id,
            name: "Gadgets".to_string(),
        };

        let response = update_category_endpoint(Path(invalid_id), State(state), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_category_endpoint_rejects_duplicate_name_in_any_scope() {
        let state = get_update_category_state();
        let phones = {
            let connection = state.db_connection.lock().unwrap();
            let electronics = create_main_category("Electronics", &connection);
            create_main_category("Clothing", &connection);
            create_sub_category("Phones", electronics.id, &connection)
        };

        // Renaming a sub-category to a main category's name collides because
        // the rename check is not scoped by kind or parent.
        let form = UpdateCategoryFormData {
            id: phones.id,
            name: "clothing".to_string(),
        };

        let response = update_category_endpoint(Path(phones.id), State(state.clone()), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        assert_form_error_message(
            &must_get_form(&html),
            "A category named \"clothing\" already exists",
        );

        let connection = state.db_connection.lock().unwrap();
        let unchanged = find_category(phones.id, &connection).unwrap();
        assert_eq!(unchanged.name.as_ref(), "Phones");
    }

    #[tokio::test]
    async fn update_category_endpoint_with_empty_name_returns_error() {
        let state = get_update_category_state();
        let electronics =
            create_main_category("Electronics", &state.db_connection.lock().unwrap());

        let form = UpdateCategoryFormData {
            id: electronics.id,
            name: "".to_string(),
        };

        let response = update_category_endpoint(Path(electronics.id), State(state), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        assert_form_error_message(&must_get_form(&html), "Category name cannot be empty");
    }
}
