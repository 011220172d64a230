use chrono::NaiveDateTime;

const POST_SHORT_LEN: usize = 15;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub created_at: NaiveDateTime,
}

impl User {
    /// First and last name, falling back to the username when both are empty.
    pub fn display_name(&self) -> String {
        let full_name = format!("{} {}", self.first_name, self.last_name);
        let full_name = full_name.trim();
        if full_name.is_empty() {
            self.username.clone()
        } else {
            full_name.to_string()
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// A post row joined with its author's username and its group, if any.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub pub_date: NaiveDateTime,
    pub author_id: i64,
    pub author_username: String,
    pub group_id: Option<i64>,
    pub group_title: Option<String>,
    pub group_slug: Option<String>,
    pub image: Option<String>,
}

impl Post {
    pub fn short(&self) -> String {
        self.text.chars().take(POST_SHORT_LEN).collect()
    }

    pub fn pub_date_display(&self) -> String {
        self.pub_date.format("%d %b %Y %H:%M").to_string()
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub post_id: Option<i64>,
    pub author_id: i64,
    pub author_username: String,
    pub text: String,
    pub created: NaiveDateTime,
}

impl Comment {
    pub fn created_display(&self) -> String {
        self.created.format("%d %b %Y %H:%M").to_string()
    }
}
