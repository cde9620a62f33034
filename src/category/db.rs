//! Database operations for categories.
//!
//! Relations are loaded with explicit two-step queries: first the row, then
//! its parent or active children with a separate predicate query.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    category::{Category, CategoryDetail, CategoryId, CategoryName, NewCategory},
};

const CATEGORY_COLUMNS: &str = "id, name, is_main, image, is_deleted, parent_id";

/// Insert a category row and return it with its generated ID.
///
/// This is the only insert path; callers are expected to have validated the
/// candidate first. The row is always inserted with `is_deleted = false`.
pub fn insert_category(new_category: NewCategory, connection: &Connection) -> Result<Category, Error> {
    connection.execute(
        "INSERT INTO category (name, is_main, image, is_deleted, parent_id)
            VALUES (?1, ?2, ?3, 0, ?4);",
        (
            new_category.name.as_ref(),
            new_category.is_main,
            &new_category.image,
            new_category.parent_id,
        ),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Category {
        id,
        name: new_category.name,
        is_main: new_category.is_main,
        image: new_category.image,
        is_deleted: false,
        parent_id: new_category.parent_id,
    })
}

/// Retrieve all categories that have not been soft-deleted, in insertion order.
pub fn get_active_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category WHERE is_deleted = 0;"
        ))?
        .query_map([], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Retrieve all active main categories, the valid parents for a new sub-category.
pub fn get_active_main_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category WHERE is_deleted = 0 AND is_main = 1;"
        ))?
        .query_map([], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Retrieve a single category by ID without loading relations.
///
/// Returns soft-deleted rows too; the update path uses this for its bare
/// existence check.
pub fn find_category(category_id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category WHERE id = :id;"
        ))?
        .query_row(&[(":id", &category_id)], map_row)
        .map_err(|error| error.into())
}

fn get_active_category(category_id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category WHERE id = :id AND is_deleted = 0;"
        ))?
        .query_row(&[(":id", &category_id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve the active children of a category, in insertion order.
pub fn get_active_children(
    parent_id: CategoryId,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category
                WHERE parent_id = :parent_id AND is_deleted = 0;"
        ))?
        .query_map(&[(":parent_id", &parent_id)], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Load an active category together with its parent and active children.
///
/// # Errors
/// Returns [Error::NotFound] if the ID does not resolve to an active row.
pub fn get_category_detail(
    category_id: CategoryId,
    connection: &Connection,
) -> Result<CategoryDetail, Error> {
    let category = get_active_category(category_id, connection)?;

    let parent = match category.parent_id {
        Some(parent_id) => Some(find_category(parent_id, connection)?),
        None => None,
    };

    // Sub-categories have no children in the two-level model.
    let children = if category.is_main {
        get_active_children(category.id, connection)?
    } else {
        Vec::new()
    };

    Ok(CategoryDetail {
        category,
        parent,
        children,
    })
}

/// Load an active main category with its active children, for validating and
/// attaching a new sub-category.
///
/// # Errors
/// Returns [Error::NotFound] if the ID does not resolve to an active main
/// category.
pub fn get_active_main_with_children(
    category_id: CategoryId,
    connection: &Connection,
) -> Result<(Category, Vec<Category>), Error> {
    let category = connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category
                WHERE id = :id AND is_deleted = 0 AND is_main = 1;"
        ))?
        .query_row(&[(":id", &category_id)], map_row)
        .map_err(Error::from)?;

    let children = get_active_children(category.id, connection)?;

    Ok((category, children))
}

/// Check whether any *other* active category uses `name`, ignoring case.
///
/// Unlike the create path, this check is not scoped by parent or by kind:
/// the rename path compares against the whole active set.
pub fn category_name_exists_excluding(
    name: &str,
    exclude_id: CategoryId,
    connection: &Connection,
) -> Result<bool, Error> {
    connection
        .prepare(
            "SELECT EXISTS (
                SELECT 1 FROM category
                    WHERE LOWER(name) = LOWER(:name)
                        AND id <> :exclude_id
                        AND is_deleted = 0
            );",
        )?
        .query_row(
            rusqlite::named_params! { ":name": name, ":exclude_id": exclude_id },
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Soft-delete a category.
///
/// Main categories cascade the flag to their currently active children; the
/// cascade is one level deep because the hierarchy is two levels deep.
/// Children that were already deleted are not touched. Rows are never
/// physically removed.
///
/// # Errors
/// Returns [Error::DeleteMissingCategory] if the ID does not resolve to an
/// active category.
pub fn soft_delete_category(category_id: CategoryId, connection: &Connection) -> Result<(), Error> {
    let tx = connection.unchecked_transaction()?;

    let is_main: bool = tx
        .query_row(
            "SELECT is_main FROM category WHERE id = ?1 AND is_deleted = 0;",
            [category_id],
            |row| row.get(0),
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::DeleteMissingCategory,
            error => error.into(),
        })?;

    tx.execute(
        "UPDATE category SET is_deleted = 1 WHERE id = ?1;",
        [category_id],
    )?;

    if is_main {
        tx.execute(
            "UPDATE category SET is_deleted = 1 WHERE parent_id = ?1 AND is_deleted = 0;",
            [category_id],
        )?;
    }

    tx.commit()?;

    Ok(())
}

/// Overwrite a category's name, leaving every other field untouched.
///
/// Clears the `is_deleted` flag, matching the original update semantics.
///
/// # Errors
/// Returns [Error::UpdateMissingCategory] if the ID does not resolve to a row.
pub fn update_category_name(
    category_id: CategoryId,
    new_name: CategoryName,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE category SET name = ?1, is_deleted = 0 WHERE id = ?2;",
        (new_name.as_ref(), category_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCategory);
    }

    Ok(())
}

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            is_main INTEGER NOT NULL,
            image TEXT,
            is_deleted INTEGER NOT NULL DEFAULT 0,
            parent_id INTEGER REFERENCES category(id)
        );

        CREATE INDEX IF NOT EXISTS idx_category_parent_id ON category(parent_id);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let raw_name: String = row.get(1)?;

    Ok(Category {
        id: row.get(0)?,
        name: CategoryName::new_unchecked(&raw_name),
        is_main: row.get(2)?,
        image: row.get(3)?,
        is_deleted: row.get(4)?,
        parent_id: row.get(5)?,
    })
}

#[cfg(test)]
pub(crate) mod test_helpers {
    use rusqlite::Connection;

    use crate::category::{Category, CategoryName, NewCategory, insert_category};

    use super::create_category_table;

    pub(crate) fn get_test_db_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        create_category_table(&connection).expect("Could not create category table");
        connection
    }

    pub(crate) fn create_main_category(name: &str, connection: &Connection) -> Category {
        insert_category(
            NewCategory {
                name: CategoryName::new_unchecked(name),
                is_main: true,
                image: Some(format!("{}.jpg", name.to_lowercase())),
                parent_id: None,
            },
            connection,
        )
        .expect("Could not create test main category")
    }

    pub(crate) fn create_sub_category(
        name: &str,
        parent_id: i64,
        connection: &Connection,
    ) -> Category {
        insert_category(
            NewCategory {
                name: CategoryName::new_unchecked(name),
                is_main: false,
                image: None,
                parent_id: Some(parent_id),
            },
            connection,
        )
        .expect("Could not create test sub-category")
    }
}
