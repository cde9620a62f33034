//! Categories listing page.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    html::{
        LINK_STYLE, MAIN_BADGE_STYLE, PAGE_CONTAINER_STYLE, SUB_BADGE_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, edit_delete_action_links,
    },
    navigation::NavBar,
    category::{Category, CategoryId, db::get_active_categories},
};

/// The state needed for the categories listing page.
#[derive(Debug, Clone)]
pub struct CategoriesPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoriesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A category with the extra strings the listing template needs.
#[derive(Debug, Clone)]
struct CategoryRow {
    category: Category,
    parent_name: Option<String>,
    detail_url: String,
    edit_url: String,
    delete_url: String,
}

/// Render the categories listing page.
pub async fn get_categories_page(
    State(state): State<CategoriesPageState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_active_categories(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;

    // Every active sub-category's parent is itself active, so the fetched
    // list contains all the parent names we need.
    let names_by_id: HashMap<CategoryId, String> = categories
        .iter()
        .map(|category| (category.id, category.name.to_string()))
        .collect();

    let rows = categories
        .into_iter()
        .map(|category| CategoryRow {
            parent_name: category
                .parent_id
                .and_then(|parent_id| names_by_id.get(&parent_id).cloned()),
            detail_url: endpoints::format_endpoint(endpoints::CATEGORY_DETAIL_VIEW, category.id),
            edit_url: endpoints::format_endpoint(endpoints::EDIT_CATEGORY_VIEW, category.id),
            delete_url: endpoints::format_endpoint(endpoints::DELETE_CATEGORY, category.id),
            category,
        })
        .collect::<Vec<_>>();

    Ok(categories_view(&rows).into_response())
}

fn categories_view(rows: &[CategoryRow]) -> Markup {
    let new_category_route = endpoints::NEW_CATEGORY_VIEW;
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW).into_html();

    let table_row = |row: &CategoryRow| {
        let confirm_message = if row.category.is_main {
            format!(
                "Are you sure you want to delete '{}'? Its sub-categories will be deleted too.",
                row.category.name
            )
        } else {
            format!("Are you sure you want to delete '{}'?", row.category.name)
        };

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE)
                {
                    a href=(row.detail_url) class=(LINK_STYLE)
                    {
                        (row.category.name)
                    }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    @if row.category.is_main {
                        span class=(MAIN_BADGE_STYLE) { "Main" }
                    } @else {
                        span class=(SUB_BADGE_STYLE) { "Sub" }
                    }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    @if let Some(parent_name) = &row.parent_name {
                        (parent_name)
                    } @else {
                        "-"
                    }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        (edit_delete_action_links(
                            &row.edit_url,
                            &row.delete_url,
                            &confirm_message,
                            "closest tr",
                        ))
                    }
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Categories" }

                    a href=(new_category_route) class=(LINK_STYLE)
                    {
                        "Create Category"
                    }
                }

                section class="dark:bg-gray-800 lg:max-w-5xl lg:w-full lg:mx-auto"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Kind" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Parent" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for row in rows {
                                (table_row(row))
                            }

                            @if rows.is_empty() {
                                tr
                                {
                                    td
                                        colspan="4"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No categories created yet. "
                                        a href=(new_category_route) class=(LINK_STYLE)
                                        {
                                            "Create your first category"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Categories", &content)
}
