use sqlx::SqlitePool;

use crate::{errors::RequestError, models::Comment};

pub async fn add_comment_to_post_in_db(
    pool: &SqlitePool,
    author_id: i64,
    post_id: i64,
    text: &str,
) -> Result<i64, RequestError> {
    let mut tx = pool.begin().await?;
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO comments (post_id, author_id, text)
        VALUES (?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(post_id)
    .bind(author_id)
    .bind(text)
    .fetch_one(&mut tx)
    .await?;
    tx.commit().await?;
    Ok(id)
}

pub async fn get_comments_for_post_in_db(
    pool: &SqlitePool,
    post_id: i64,
) -> Result<Vec<Comment>, RequestError> {
    let comments = sqlx::query_as::<_, Comment>(
        r#"
        SELECT comments.id         AS "id",
               comments.post_id    AS "post_id",
               comments.author_id  AS "author_id",
               users.username      AS "author_username",
               comments.text       AS "text",
               comments.created    AS "created"
        FROM   comments
            JOIN users
                ON comments.author_id = users.id
        WHERE  comments.post_id = ?
        ORDER  BY comments.created, comments.id
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await?;
    Ok(comments)
}

pub async fn count_detached_comments(pool: &SqlitePool) -> Result<i64, RequestError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE post_id IS NULL")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
