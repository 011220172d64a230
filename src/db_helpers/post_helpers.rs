use sqlx::SqlitePool;

use crate::{
    errors::RequestError,
    models::Post,
    pagination::{Page, Paginator},
};

const POST_QUERY: &str = r#"
            SELECT posts.id                AS "id",
                   posts.text              AS "text",
                   posts.pub_date          AS "pub_date",
                   posts.author_id         AS "author_id",
                   users.username          AS "author_username",
                   posts.group_id          AS "group_id",
                   post_groups.title       AS "group_title",
                   post_groups.slug        AS "group_slug",
                   posts.image             AS "image"
            FROM   posts
                JOIN users
                    ON posts.author_id = users.id
                LEFT JOIN post_groups
                    ON posts.group_id = post_groups.id
"#;

const POST_ORDERING: &str = "ORDER BY posts.pub_date DESC, posts.id DESC";

/// Which posts a listing shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(i64),
    /// Posts by every author the given user follows.
    FollowedBy(i64),
}

impl PostFilter {
    fn clause(&self) -> &'static str {
        match self {
            PostFilter::All => "",
            PostFilter::Group(_) => "WHERE posts.group_id = ?",
            PostFilter::Author(_) => "WHERE posts.author_id = ?",
            PostFilter::FollowedBy(_) => {
                "WHERE posts.author_id IN (SELECT author_id FROM follows WHERE user_id = ?)"
            }
        }
    }

    fn param(&self) -> Option<i64> {
        match *self {
            PostFilter::All => None,
            PostFilter::Group(id) | PostFilter::Author(id) | PostFilter::FollowedBy(id) => Some(id),
        }
    }
}

/// The image is a path relative to the media root.
#[derive(Debug, Clone, Default)]
pub struct PostFields {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

pub async fn insert_post(
    pool: &SqlitePool,
    author_id: i64,
    fields: &PostFields,
) -> Result<i64, RequestError> {
    let mut tx = pool.begin().await?;
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO posts (text, author_id, group_id, image)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(&fields.text)
    .bind(author_id)
    .bind(fields.group_id)
    .bind(&fields.image)
    .fetch_one(&mut tx)
    .await?;
    tx.commit().await?;
    Ok(id)
}

pub async fn get_post_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Post>, RequestError> {
    let query = format!("{} WHERE posts.id = ?", POST_QUERY);
    let post = sqlx::query_as::<_, Post>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(post)
}

/// Author and publication date never change.
pub async fn update_post_in_db(
    pool: &SqlitePool,
    id: i64,
    fields: &PostFields,
) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query("UPDATE posts SET text = ?, group_id = ?, image = ? WHERE id = ?")
        .bind(&fields.text)
        .bind(fields.group_id)
        .bind(&fields.image)
        .bind(id)
        .execute(&mut tx)
        .await?;
    tx.commit().await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound);
    }
    Ok(())
}

/// Comments on the post stay, detached from it.
pub async fn delete_post_in_db(pool: &SqlitePool, id: i64) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(id)
        .execute(&mut tx)
        .await?;
    tx.commit().await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound);
    }
    Ok(())
}

pub async fn count_posts(pool: &SqlitePool, filter: PostFilter) -> Result<i64, RequestError> {
    let query = format!("SELECT COUNT(*) FROM posts {}", filter.clause());
    let mut query = sqlx::query_scalar::<_, i64>(&query);
    if let Some(param) = filter.param() {
        query = query.bind(param);
    }
    Ok(query.fetch_one(pool).await?)
}

pub async fn list_posts(
    pool: &SqlitePool,
    filter: PostFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Post>, RequestError> {
    let query = format!(
        "{} {} {} LIMIT ? OFFSET ?",
        POST_QUERY,
        filter.clause(),
        POST_ORDERING
    );
    let mut query = sqlx::query_as::<_, Post>(&query);
    if let Some(param) = filter.param() {
        query = query.bind(param);
    }
    let posts = query.bind(limit).bind(offset).fetch_all(pool).await?;
    Ok(posts)
}

/// Resolves the requested page number against the current count and loads
/// that page of posts.
pub async fn paginate_posts(
    pool: &SqlitePool,
    filter: PostFilter,
    paginator: Paginator,
    page: Option<&str>,
) -> Result<Page<Post>, RequestError> {
    let count = count_posts(pool, filter).await?;
    let number = paginator.page_number(page, count);
    let posts = list_posts(
        pool,
        filter,
        paginator.limit(),
        paginator.offset(number),
    )
    .await?;
    Ok(paginator.page(posts, number, count))
}
