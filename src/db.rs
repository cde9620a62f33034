//! Database initialization for the application.

use rusqlite::Connection;

use crate::{Error, category::create_category_table};

/// Create the tables for the application's domain models if they do not
/// already exist.
///
/// # Errors
/// Returns an [Error::SqlError] if a table could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    create_category_table(connection)?;

    Ok(())
}
