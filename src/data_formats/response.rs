use askama::Template;
use axum::response::{Html, IntoResponse, Response};

use crate::{
    authentication::AuthUser,
    errors::RequestError,
    models::{Comment, Group, Post, User},
    pagination::Page,
};

use super::{FormErrors, PostFormValues, SignupForm};

/// Renders an askama template as an HTML response.
pub struct HtmlTemplate<T>(pub T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(e) => RequestError::from(e).into_response(),
        }
    }
}

// ----------------- Post Pages -----------------

#[derive(Template)]
#[template(path = "posts/index.html")]
pub struct IndexTemplate {
    pub current_user: Option<AuthUser>,
    pub page: Page<Post>,
}

#[derive(Template)]
#[template(path = "posts/group_list.html")]
pub struct GroupListTemplate {
    pub current_user: Option<AuthUser>,
    pub group: Group,
    pub page: Page<Post>,
}

#[derive(Template)]
#[template(path = "posts/profile.html")]
pub struct ProfileTemplate {
    pub current_user: Option<AuthUser>,
    pub author: User,
    pub page: Page<Post>,
    pub following: bool,
    pub is_self: bool,
    pub followers_count: i64,
}

#[derive(Template)]
#[template(path = "posts/post_detail.html")]
pub struct PostDetailTemplate {
    pub current_user: Option<AuthUser>,
    pub post: Post,
    pub comments: Vec<Comment>,
    pub author_posts_count: i64,
    pub is_author: bool,
}

#[derive(Template)]
#[template(path = "posts/create.html")]
pub struct PostFormTemplate {
    pub current_user: Option<AuthUser>,
    pub form: PostFormValues,
    pub errors: FormErrors,
    pub groups: Vec<Group>,
    pub is_edit: bool,
    pub action: String,
    pub current_image: Option<String>,
}

#[derive(Template)]
#[template(path = "posts/follow.html")]
pub struct FollowTemplate {
    pub current_user: Option<AuthUser>,
    pub page: Page<Post>,
}

// ----------------- User Pages -----------------

#[derive(Template)]
#[template(path = "users/signup.html")]
pub struct SignupTemplate {
    pub current_user: Option<AuthUser>,
    pub form: SignupForm,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "users/login.html")]
pub struct LoginTemplate {
    pub current_user: Option<AuthUser>,
    pub username: String,
    pub next: String,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "users/logged_out.html")]
pub struct LoggedOutTemplate {
    pub current_user: Option<AuthUser>,
}

#[derive(Template)]
#[template(path = "users/password_change_form.html")]
pub struct PasswordChangeTemplate {
    pub current_user: Option<AuthUser>,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "users/password_change_done.html")]
pub struct PasswordChangeDoneTemplate {
    pub current_user: Option<AuthUser>,
}

#[derive(Template)]
#[template(path = "users/password_reset_form.html")]
pub struct PasswordResetTemplate {
    pub current_user: Option<AuthUser>,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "users/password_reset_done.html")]
pub struct PasswordResetDoneTemplate {
    pub current_user: Option<AuthUser>,
}

#[derive(Template)]
#[template(path = "users/password_reset_confirm.html")]
pub struct PasswordResetConfirmTemplate {
    pub current_user: Option<AuthUser>,
    pub valid_link: bool,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "users/password_reset_complete.html")]
pub struct PasswordResetCompleteTemplate {
    pub current_user: Option<AuthUser>,
}

// ----------------- Static Pages -----------------

#[derive(Template)]
#[template(path = "about/author.html")]
pub struct AboutAuthorTemplate {
    pub current_user: Option<AuthUser>,
}

#[derive(Template)]
#[template(path = "about/tech.html")]
pub struct AboutTechTemplate {
    pub current_user: Option<AuthUser>,
}

#[derive(Template)]
#[template(path = "core/404.html")]
pub struct NotFoundTemplate {
    pub current_user: Option<AuthUser>,
}

#[derive(Template)]
#[template(path = "core/500.html")]
pub struct ServerErrorTemplate {
    pub current_user: Option<AuthUser>,
}
