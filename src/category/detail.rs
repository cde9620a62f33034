//! Category detail page.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    html::{
        LINK_STYLE, MAIN_BADGE_STYLE, PAGE_CONTAINER_STYLE, SUB_BADGE_STYLE, base,
        edit_delete_action_links,
    },
    navigation::NavBar,
    category::{CategoryDetail, CategoryId, db::get_category_detail},
};

/// The state needed for the category detail page.
#[derive(Debug, Clone)]
pub struct CategoryDetailPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryDetailPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the detail page for a single active category.
///
/// # Errors
///
/// Returns [Error::NotFound] if the category does not exist or has been
/// deleted.
pub async fn get_category_detail_page(
    Path(category_id): Path<CategoryId>,
    State(state): State<CategoryDetailPageState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let detail = get_category_detail(category_id, &connection)?;

    Ok(category_detail_view(&detail).into_response())
}

fn category_detail_view(detail: &CategoryDetail) -> Markup {
    let category = &detail.category;
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW).into_html();
    let edit_url = endpoints::format_endpoint(endpoints::EDIT_CATEGORY_VIEW, category.id);

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            article class="space-y-4 w-full max-w-md"
            {
                header class="flex items-center gap-3"
                {
                    h1 class="text-xl font-bold" { (category.name) }

                    @if category.is_main {
                        span class=(MAIN_BADGE_STYLE) { "Main" }
                    } @else {
                        span class=(SUB_BADGE_STYLE) { "Sub" }
                    }
                }

                @if let Some(image) = &category.image {
                    img
                        src=(format!("{}/{image}", endpoints::IMAGES))
                        alt=(format!("Image for {}", category.name))
                        class="rounded max-h-64 object-contain";
                }

                @if let Some(parent) = &detail.parent {
                    p
                    {
                        "Sub-category of "
                        a
                            href=(endpoints::format_endpoint(
                                endpoints::CATEGORY_DETAIL_VIEW,
                                parent.id,
                            ))
                            class=(LINK_STYLE)
                        {
                            (parent.name)
                        }
                    }
                }

                @if category.is_main {
                    section
                    {
                        h2 class="text-lg font-semibold mb-2" { "Sub-categories" }

                        @if detail.children.is_empty() {
                            p class="text-gray-500 dark:text-gray-400"
                            {
                                "No sub-categories yet."
                            }
                        } @else {
                            ul class="list-disc list-inside space-y-1"
                            {
                                @for child in &detail.children {
                                    li
                                    {
                                        a
                                            href=(endpoints::format_endpoint(
                                                endpoints::CATEGORY_DETAIL_VIEW,
                                                child.id,
                                            ))
                                            class=(LINK_STYLE)
                                        {
                                            (child.name)
                                        }
                                    }
                                }
                            }
                        }
                    }
                }

                footer class="flex gap-4"
                {
                    (edit_delete_action_links(
                        &edit_url,
                        &endpoints::format_endpoint(endpoints::DELETE_CATEGORY, category.id),
                        &format!("Are you sure you want to delete '{}'?", category.name),
                        "closest article",
                    ))
                }
            }
        }
    );

    base(category.name.as_ref(), &content)
}

#[cfg(test)]
mod category_detail_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use scraper::Selector;

    use crate::{
        Error, endpoints,
        category::{
            db::test_helpers::{
                create_main_category, create_sub_category, get_test_db_connection,
            },
            soft_delete_category,
        },
        test_utils::{assert_valid_html, parse_html_document},
    };

    use super::{CategoryDetailPageState, get_category_detail_page};

    fn get_detail_page_state() -> CategoryDetailPageState {
        CategoryDetailPageState {
            db_connection: Arc::new(Mutex::new(get_test_db_connection())),
        }
    }

    #[tokio::test]
    async fn main_category_page_shows_image_and_children() {
        let state = get_detail_page_state();
        let electronics = {
            let connection = state.db_connection.lock().unwrap();
            let electronics = create_main_category("Electronics", &connection);
            create_sub_category("Phones", electronics.id, &connection);
            create_sub_category("Laptops", electronics.id, &connection);
            electronics
        };

        let response = get_category_detail_page(Path(electronics.id), State(state))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let img_selector = Selector::parse("img").unwrap();
        let image = html
            .select(&img_selector)
            .next()
            .expect("Main category page should show an image");
        let image_file = electronics.image.expect("Test main category should have an image");
        assert_eq!(
            image.attr("src").unwrap(),
            format!("{}/{image_file}", endpoints::IMAGES)
        );

        let child_selector = Selector::parse("article ul li a").unwrap();
        let children: Vec<String> = html
            .select(&child_selector)
            .map(|link| link.text().collect())
            .collect();
        assert_eq!(children, vec!["Phones", "Laptops"]);
    }

    #[tokio::test]
    async fn sub_category_page_links_to_parent() {
        let state = get_detail_page_state();
        let (electronics, phones) = {
            let connection = state.db_connection.lock().unwrap();
            let electronics = create_main_category("Electronics", &connection);
            let phones = create_sub_category("Phones", electronics.id, &connection);
            (electronics, phones)
        };

        let response = get_category_detail_page(Path(phones.id), State(state))
            .await
            .unwrap();

        let html = parse_html_document(response).await;

        let link_selector = Selector::parse("p a").unwrap();
        let parent_link = html
            .select(&link_selector)
            .next()
            .expect("Sub-category page should link to its parent");
        assert_eq!(
            parent_link.attr("href").unwrap(),
            endpoints::format_endpoint(endpoints::CATEGORY_DETAIL_VIEW, electronics.id)
        );
        assert_eq!(parent_link.text().collect::<String>(), "Electronics");

        let img_selector = Selector::parse("img").unwrap();
        assert!(
            html.select(&img_selector).next().is_none(),
            "Sub-category page should not show an image"
        );
    }

    #[tokio::test]
    async fn deleted_category_returns_not_found() {
        let state = get_detail_page_state();
        let electronics = {
            let connection = state.db_connection.lock().unwrap();
            let electronics = create_main_category("Electronics", &connection);
            soft_delete_category(electronics.id, &connection).unwrap();
            electronics
        };

        let result = get_category_detail_page(Path(electronics.id), State(state)).await;

        assert_eq!(result.err(), Some(Error::NotFound));
    }

    #[tokio::test]
    async fn missing_category_returns_not_found() {
        let state = get_detail_page_state();

        let result = get_category_detail_page(Path(999999), State(state)).await;

        assert_eq!(result.err(), Some(Error::NotFound));
    }
}
