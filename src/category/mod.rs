//! The two-level category tree and the admin pages that manage it.
//!
//! Main categories carry an image and no parent; sub-categories reference an
//! active main category. Deletion is a soft delete that cascades one level
//! down from a main category to its active children.

mod create;
mod db;
mod delete;
mod detail;
mod domain;
mod edit;
mod list;

pub use create::{create_category_endpoint, get_new_category_page};
pub use db::create_category_table;
pub use delete::delete_category_endpoint;
pub use detail::get_category_detail_page;
pub use domain::{Category, CategoryDetail, CategoryId, CategoryName, NewCategory};
pub use edit::{get_edit_category_page, update_category_endpoint};
pub use list::get_categories_page;

// The handlers reach the query functions through `db::`; tests exercise them
// through the module root.
#[cfg(test)]
pub(crate) use db::{
    category_name_exists_excluding, find_category, get_active_categories,
    get_active_main_categories, get_active_main_with_children, get_category_detail,
    insert_category, soft_delete_category, update_category_name,
};
