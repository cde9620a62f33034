//! Core category domain types.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// Database identifier for a category.
pub type CategoryId = i64;

/// A validated, non-empty category name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// Leading and trailing whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategoryName] if `name` is an empty string.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the non-empty invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }

    /// Compare against another name, ignoring case.
    ///
    /// Category names must be unique case-insensitively within their scope,
    /// so "Phones" and "phones" are considered the same name.
    pub fn eq_ignore_case(&self, other: &str) -> bool {
        self.0.to_lowercase() == other.trim().to_lowercase()
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node in the two-level category tree.
///
/// Main categories (`is_main == true`) carry an image and never have a
/// parent. Sub-categories reference a main category through `parent_id` and
/// never carry an image. Rows are soft-deleted: `is_deleted` is flipped
/// instead of removing the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Category {
    pub id: CategoryId,
    pub name: CategoryName,
    pub is_main: bool,
    pub image: Option<String>,
    pub is_deleted: bool,
    pub parent_id: Option<CategoryId>,
}

/// The fields needed to insert a category row.
///
/// Only the create use case builds this, after validation has passed, so the
/// insert path never sees an unvalidated name or a main category without an
/// image.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    pub name: CategoryName,
    pub is_main: bool,
    pub image: Option<String>,
    pub parent_id: Option<CategoryId>,
}

/// A category together with its loaded relations, for the detail page.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryDetail {
    pub category: Category,
    /// The parent, present only for sub-categories.
    pub parent: Option<Category>,
    /// The active (non-deleted) children, present only for main categories.
    pub children: Vec<Category>,
}

/// Form data for the category edit page.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateCategoryFormData {
    pub id: CategoryId,
    pub name: String,
}
