//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/categories/{category_id}', use [format_endpoint].

/// The root route which redirects to the category list.
pub const ROOT: &str = "/";
/// The page listing all active categories.
pub const CATEGORIES_VIEW: &str = "/categories";
/// The page for creating a new category.
pub const NEW_CATEGORY_VIEW: &str = "/categories/new";
/// The page showing a single category with its parent and children.
pub const CATEGORY_DETAIL_VIEW: &str = "/categories/{category_id}";
/// The page for renaming an existing category.
pub const EDIT_CATEGORY_VIEW: &str = "/categories/{category_id}/edit";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";
/// The route serving stored category images.
pub const IMAGES: &str = "/images";

/// The route to create a category.
pub const POST_CATEGORY: &str = "/api/categories";
/// The route to rename a category.
pub const PUT_CATEGORY: &str = "/api/categories/{category_id}";
/// The route to soft-delete a category.
pub const DELETE_CATEGORY: &str = "/api/categories/{category_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a brace-delimited name such as '{category_id}'. This
/// function assumes an endpoint path contains at most one parameter; if none
/// is found the original path is returned unchanged.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
