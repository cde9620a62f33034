//! Category creation page and endpoint.
//!
//! The create form submits `multipart/form-data` because main categories
//! carry an image upload. Validation runs in a fixed order and the image is
//! only written to disk after every image check has passed, so a rejected
//! request never leaves a file or a row behind.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, ImageStore, endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE,
        FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE, FORM_SELECT_STYLE, FORM_TEXT_INPUT_STYLE,
        base,
    },
    image_store::{MAX_IMAGE_BYTES, is_image},
    navigation::NavBar,
    category::{
        Category, CategoryId, CategoryName, NewCategory,
        db::{get_active_main_categories, get_active_main_with_children, insert_category},
    },
};

/// The state needed for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub image_store: ImageStore,
}

impl FromRef<AppState> for CreateCategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            image_store: state.image_store.clone(),
        }
    }
}

/// An image file submitted with the create form.
struct ImageUpload {
    file_name: String,
    bytes: Vec<u8>,
}

/// The raw fields parsed out of the multipart create form.
struct NewCategoryForm {
    name: String,
    is_main: bool,
    parent_category_id: CategoryId,
    image: Option<ImageUpload>,
}

impl Default for NewCategoryForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            is_main: true,
            parent_category_id: 0,
            image: None,
        }
    }
}

/// Render the category creation page.
pub async fn get_new_category_page(
    State(state): State<CreateCategoryEndpointState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let main_categories = get_active_main_categories(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve main categories: {error}"))?;

    Ok(new_category_view(&main_categories).into_response())
}

/// Handle category creation form submission.
///
/// Main categories are checked for a duplicate name among active main
/// categories and must carry a valid image no larger than 1 MB.
/// Sub-categories must reference an active main parent and are checked for a
/// duplicate name among that parent's active children.
pub async fn create_category_endpoint(
    State(state): State<CreateCategoryEndpointState>,
    multipart: Multipart,
) -> Response {
    let form = match parse_new_category_form(multipart).await {
        Ok(form) => form,
        Err(error) => {
            tracing::error!("Could not parse create category form: {error}");
            return error.into_alert_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    // The active main categories double as the parent dropdown options for
    // form re-renders and as the duplicate-name scope for main categories.
    let main_categories = match get_active_main_categories(&connection) {
        Ok(main_categories) => main_categories,
        Err(error) => {
            tracing::error!("Failed to retrieve main categories: {error}");
            return error.into_alert_response();
        }
    };

    let render_error = |error: Error| {
        new_category_form_view(&main_categories, &form, Some(&error)).into_response()
    };

    let name = match CategoryName::new(&form.name) {
        Ok(name) => name,
        Err(error) => return render_error(error),
    };

    let new_category = if form.is_main {
        let duplicate = main_categories
            .iter()
            .any(|category| name.eq_ignore_case(category.name.as_ref()));
        if duplicate {
            return render_error(Error::DuplicateCategoryName(name.to_string()));
        }

        let Some(image) = &form.image else {
            return render_error(Error::MissingImage);
        };

        if !is_image(&image.bytes) {
            return render_error(Error::NotAnImage);
        }

        if image.bytes.len() > MAX_IMAGE_BYTES {
            return render_error(Error::ImageTooLarge);
        }

        // Image validation is complete; a storage failure from here aborts
        // the whole operation before any database write.
        let file_name = match state.image_store.store(&image.file_name, &image.bytes) {
            Ok(file_name) => file_name,
            Err(error) => {
                tracing::error!("Failed to store category image: {error}");
                return error.into_alert_response();
            }
        };

        NewCategory {
            name,
            is_main: true,
            image: Some(file_name),
            parent_id: None,
        }
    } else {
        if form.parent_category_id == 0 {
            return render_error(Error::NoParentSelected);
        }

        let (parent, children) =
            match get_active_main_with_children(form.parent_category_id, &connection) {
                Ok(parent_with_children) => parent_with_children,
                Err(Error::NotFound) => return Error::NotFound.into_alert_response(),
                Err(error) => {
                    tracing::error!("Failed to load parent category: {error}");
                    return error.into_alert_response();
                }
            };

        let duplicate = children
            .iter()
            .any(|child| name.eq_ignore_case(child.name.as_ref()));
        if duplicate {
            return render_error(Error::DuplicateSubcategoryName(name.to_string()));
        }

        NewCategory {
            name,
            is_main: false,
            image: None,
            parent_id: Some(parent.id),
        }
    };

    match insert_category(new_category, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a category: {error}");
            error.into_alert_response()
        }
    }
}

async fn parse_new_category_form(mut multipart: Multipart) -> Result<NewCategoryForm, Error> {
    let mut form = NewCategoryForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| Error::MultipartError(error.to_string()))?
    {
        match field.name() {
            Some("name") => {
                form.name = field
                    .text()
                    .await
                    .map_err(|error| Error::MultipartError(error.to_string()))?;
            }
            Some("kind") => {
                let kind = field
                    .text()
                    .await
                    .map_err(|error| Error::MultipartError(error.to_string()))?;
                form.is_main = kind != "sub";
            }
            Some("parent_category_id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|error| Error::MultipartError(error.to_string()))?;
                form.parent_category_id = text.trim().parse().unwrap_or(0);
            }
            Some("image") => {
                let file_name = field.file_name().unwrap_or_default().to_owned();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|error| Error::MultipartError(error.to_string()))?;

                // Browsers submit an empty file part when no file is chosen.
                if !bytes.is_empty() {
                    form.image = Some(ImageUpload {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

fn new_category_view(main_categories: &[Category]) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_CATEGORY_VIEW).into_html();
    let form = new_category_form_view(main_categories, &NewCategoryForm::default(), None);

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Create Category", &content)
}

fn new_category_form_view(
    main_categories: &[Category],
    form: &NewCategoryForm,
    error: Option<&Error>,
) -> Markup {
    // Duplicate name errors belong to the name field; everything else is a
    // form-level message.
    let (name_error, form_error) = match error {
        Some(
            error @ (Error::EmptyCategoryName
            | Error::DuplicateCategoryName(_)
            | Error::DuplicateSubcategoryName(_)),
        ) => (Some(error.to_string()), None),
        Some(error) => (None, Some(error.to_string())),
        None => (None, None),
    };

    html! {
        form
            hx-post=(endpoints::POST_CATEGORY)
            hx-encoding="multipart/form-data"
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
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
                    value=(form.name)
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);

                @if let Some(name_error) = &name_error {
                    p class=(FORM_ERROR_STYLE) { (name_error) }
                }
            }

            div class=(FORM_RADIO_GROUP_STYLE)
            {
                label class=(FORM_LABEL_STYLE)
                {
                    input
                        type="radio"
                        name="kind"
                        value="main"
                        checked[form.is_main]
                        class=(FORM_RADIO_INPUT_STYLE);
                    " Main category"
                }

                label class=(FORM_LABEL_STYLE)
                {
                    input
                        type="radio"
                        name="kind"
                        value="sub"
                        checked[!form.is_main]
                        class=(FORM_RADIO_INPUT_STYLE);
                    " Sub-category"
                }
            }

            div
            {
                label
                    for="parent_category_id"
                    class=(FORM_LABEL_STYLE)
                {
                    "Parent Category (sub-categories only)"
                }

                select
                    id="parent_category_id"
                    name="parent_category_id"
                    class=(FORM_SELECT_STYLE)
                {
                    option value="0" { "-- Select a category --" }

                    @for category in main_categories {
                        option
                            value=(category.id)
                            selected[category.id == form.parent_category_id]
                        {
                            (category.name)
                        }
                    }
                }
            }

            div
            {
                label
                    for="image"
                    class=(FORM_LABEL_STYLE)
                {
                    "Image (main categories only, up to 1 MB)"
                }

                input
                    id="image"
                    type="file"
                    name="image"
                    accept="image/*"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            @if let Some(form_error) = &form_error {
                p class=(FORM_ERROR_STYLE)
                {
                    (form_error)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Category" }
        }
    }
}

#[cfg(test)]
mod new_category_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};

    use crate::{
        ImageStore, endpoints,
        category::{
            create::CreateCategoryEndpointState,
            db::test_helpers::{create_main_category, get_test_db_connection},
            get_new_category_page,
        },
        test_utils::{
            assert_form_input, assert_form_select_with_option, assert_form_submit_button,
            assert_hx_endpoint, assert_valid_html, must_get_form, parse_html_document,
        },
    };

    fn get_create_category_state() -> CreateCategoryEndpointState {
        CreateCategoryEndpointState {
            db_connection: Arc::new(Mutex::new(get_test_db_connection())),
            image_store: ImageStore::new(
                tempfile::tempdir()
                    .expect("Could not create temp directory")
                    .keep(),
            ),
        }
    }

    #[tokio::test]
    async fn render_page_with_parent_options() {
        let state = get_create_category_state();
        create_main_category("Electronics", &state.db_connection.lock().unwrap());

        let response = get_new_category_page(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::POST_CATEGORY, "hx-post");
        assert_form_input(&form, "name", "text");
        assert_form_select_with_option(&form, "parent_category_id", "Electronics");
        assert_form_submit_button(&form);
    }
}
