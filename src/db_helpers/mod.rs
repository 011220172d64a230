use sqlx::SqlitePool;

use crate::{errors::RequestError, models::User};

mod comment_helpers;
mod group_helpers;
mod post_helpers;
mod profile_helpers;
mod user_helpers;

pub use comment_helpers::*;
pub use group_helpers::*;
pub use post_helpers::*;
pub use profile_helpers::*;
pub use user_helpers::*;

const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, password, created_at";

// ----------------- Helper Functions -----------------

pub async fn get_user_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<User>, RequestError> {
    let query = format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS);
    let result = sqlx::query_as::<_, User>(&query)
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}

/// Emails are not unique; the oldest account with the address wins.
pub async fn get_user_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<User>, RequestError> {
    let query = format!(
        "SELECT {} FROM users WHERE email = ? ORDER BY id LIMIT 1",
        USER_COLUMNS
    );
    let result = sqlx::query_as::<_, User>(&query)
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}

pub async fn get_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, RequestError> {
    let query = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
    let result = sqlx::query_as::<_, User>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}
