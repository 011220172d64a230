use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
    Form,
};

use crate::{
    authentication::{
        expired_session_cookie, get_reset_token, get_session_token, hash_password_argon2,
        safe_next_url, session_cookie, verify_password_argon2, verify_reset_token, AuthUser,
        MaybeUser, RequireUser,
    },
    data_formats::{
        FormErrors, HtmlTemplate, LoggedOutTemplate, LoginForm, LoginTemplate, NextQuery,
        PasswordChangeDoneTemplate, PasswordChangeForm, PasswordChangeTemplate,
        PasswordResetCompleteTemplate, PasswordResetConfirmTemplate, PasswordResetDoneTemplate,
        PasswordResetForm, PasswordResetTemplate, SetPasswordForm, SignupForm, SignupTemplate,
    },
    db_helpers::{
        get_user_by_email, get_user_by_id, get_user_by_username, insert_user,
        update_password_in_db, username_taken, NewUser,
    },
    errors::RequestError,
    models::User,
    AppState,
};

const USERNAME_TAKEN: &str = "A user with that username already exists.";
const INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

// ----------------- Signup -----------------

pub async fn signup_form(MaybeUser(current_user): MaybeUser) -> HtmlTemplate<SignupTemplate> {
    HtmlTemplate(SignupTemplate {
        current_user,
        form: SignupForm::default(),
        errors: FormErrors::default(),
    })
}

pub async fn signup(
    State(state): State<AppState>,
    MaybeUser(current_user): MaybeUser,
    Form(mut form): Form<SignupForm>,
) -> Result<Response, RequestError> {
    form.username = form.username.trim().to_string();
    form.email = form.email.trim().to_string();
    let mut errors = form.validate();
    if errors.field("username").is_empty() && username_taken(&state.pool, &form.username).await? {
        errors.add("username", USERNAME_TAKEN);
    }
    if !errors.is_empty() {
        return Ok(render_signup(current_user, form, errors));
    }

    let new_user = NewUser {
        username: form.username.clone(),
        email: form.email.clone(),
        first_name: form.first_name.trim().to_string(),
        last_name: form.last_name.trim().to_string(),
        password: hash_password_argon2(form.password1.clone()).await?,
    };
    match insert_user(&state.pool, &new_user).await {
        Ok(user) => {
            tracing::info!(user_id = user.id, username = %user.username, "User signed up");
            Ok(Redirect::to("/").into_response())
        }
        Err(e) if e.is_unique_violation() => {
            let mut errors = FormErrors::default();
            errors.add("username", USERNAME_TAKEN);
            Ok(render_signup(current_user, form, errors))
        }
        Err(e) => Err(e),
    }
}

fn render_signup(
    current_user: Option<AuthUser>,
    mut form: SignupForm,
    errors: FormErrors,
) -> Response {
    form.password1.clear();
    form.password2.clear();
    HtmlTemplate(SignupTemplate {
        current_user,
        form,
        errors,
    })
    .into_response()
}

// ----------------- Login / Logout -----------------

pub async fn login_form(
    MaybeUser(current_user): MaybeUser,
    Query(NextQuery { next }): Query<NextQuery>,
) -> HtmlTemplate<LoginTemplate> {
    HtmlTemplate(LoginTemplate {
        current_user,
        username: String::new(),
        next: next.unwrap_or_default(),
        errors: FormErrors::default(),
    })
}

pub async fn login(
    State(state): State<AppState>,
    Form(LoginForm {
        username,
        password,
        next,
    }): Form<LoginForm>,
) -> Result<Response, RequestError> {
    let user = get_user_by_username(&state.pool, username.trim()).await?;
    let authenticated = match &user {
        Some(user) => verify_password_argon2(password, &user.password).await?,
        None => false,
    };
    let user = match user {
        Some(user) if authenticated => user,
        _ => {
            tracing::info!(username = %username, "Failed login attempt");
            let mut errors = FormErrors::default();
            errors.add(FormErrors::NON_FIELD, INVALID_LOGIN);
            return Ok(HtmlTemplate(LoginTemplate {
                current_user: None,
                username,
                next: next.unwrap_or_default(),
                errors,
            })
            .into_response());
        }
    };

    let token = get_session_token(user.id, &state.config.secret_key)?;
    tracing::info!(user_id = user.id, username = %user.username, "User logged in");
    let destination = safe_next_url(next.as_deref().filter(|n| !n.is_empty()));
    Ok((
        [(header::SET_COOKIE, session_cookie(&token))],
        Redirect::to(destination),
    )
        .into_response())
}

pub async fn logout() -> Response {
    (
        [(header::SET_COOKIE, expired_session_cookie())],
        HtmlTemplate(LoggedOutTemplate { current_user: None }),
    )
        .into_response()
}

// ----------------- Password Change -----------------

pub async fn password_change_form(
    RequireUser(user): RequireUser,
) -> HtmlTemplate<PasswordChangeTemplate> {
    HtmlTemplate(PasswordChangeTemplate {
        current_user: Some(user),
        errors: FormErrors::default(),
    })
}

pub async fn password_change(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Form(form): Form<PasswordChangeForm>,
) -> Result<Response, RequestError> {
    let account = get_user_by_id(&state.pool, user.id)
        .await?
        .ok_or(RequestError::NotFound)?;
    let mut errors = form.validate();
    if !form.old_password.is_empty()
        && !verify_password_argon2(form.old_password.clone(), &account.password).await?
    {
        errors.add(
            "old_password",
            "Your old password was entered incorrectly. Please enter it again.",
        );
    }
    if !errors.is_empty() {
        return Ok(HtmlTemplate(PasswordChangeTemplate {
            current_user: Some(user),
            errors,
        })
        .into_response());
    }
    let hash = hash_password_argon2(form.new_password1).await?;
    update_password_in_db(&state.pool, account.id, &hash).await?;
    tracing::info!(user_id = account.id, "Password changed");
    Ok(Redirect::to("/auth/password_change/done/").into_response())
}

pub async fn password_change_done(
    RequireUser(user): RequireUser,
) -> HtmlTemplate<PasswordChangeDoneTemplate> {
    HtmlTemplate(PasswordChangeDoneTemplate {
        current_user: Some(user),
    })
}

// ----------------- Password Reset -----------------

pub async fn password_reset_form(
    MaybeUser(current_user): MaybeUser,
) -> HtmlTemplate<PasswordResetTemplate> {
    HtmlTemplate(PasswordResetTemplate {
        current_user,
        errors: FormErrors::default(),
    })
}

/// There is no mail transport: the reset link goes to the log. The response
/// is the same whether or not an account matched.
pub async fn password_reset(
    State(state): State<AppState>,
    Form(PasswordResetForm { email }): Form<PasswordResetForm>,
) -> Result<Redirect, RequestError> {
    let email = email.trim();
    if !email.is_empty() {
        if let Some(user) = get_user_by_email(&state.pool, email).await? {
            let token = get_reset_token(&user, &state.config.secret_key)?;
            tracing::info!(
                user_id = user.id,
                link = %format!("/auth/reset/{}/{}/", user.id, token),
                "Password reset link issued"
            );
        }
    }
    Ok(Redirect::to("/auth/password_reset/done/"))
}

pub async fn password_reset_done(
    MaybeUser(current_user): MaybeUser,
) -> HtmlTemplate<PasswordResetDoneTemplate> {
    HtmlTemplate(PasswordResetDoneTemplate { current_user })
}

/// A malformed uid reads the same as an unknown one: the link is invalid.
async fn user_for_reset_link(
    state: &AppState,
    uid: &str,
    token: &str,
) -> Result<Option<User>, RequestError> {
    let Ok(uid) = uid.parse::<i64>() else {
        return Ok(None);
    };
    let user = get_user_by_id(&state.pool, uid).await?;
    Ok(user.filter(|user| verify_reset_token(token, &state.config.secret_key, user)))
}

pub async fn password_reset_confirm_form(
    State(state): State<AppState>,
    MaybeUser(current_user): MaybeUser,
    Path((uid, token)): Path<(String, String)>,
) -> Result<HtmlTemplate<PasswordResetConfirmTemplate>, RequestError> {
    let valid_link = user_for_reset_link(&state, &uid, &token).await?.is_some();
    Ok(HtmlTemplate(PasswordResetConfirmTemplate {
        current_user,
        valid_link,
        errors: FormErrors::default(),
    }))
}

pub async fn password_reset_confirm(
    State(state): State<AppState>,
    MaybeUser(current_user): MaybeUser,
    Path((uid, token)): Path<(String, String)>,
    Form(form): Form<SetPasswordForm>,
) -> Result<Response, RequestError> {
    let Some(user) = user_for_reset_link(&state, &uid, &token).await? else {
        return Ok(HtmlTemplate(PasswordResetConfirmTemplate {
            current_user,
            valid_link: false,
            errors: FormErrors::default(),
        })
        .into_response());
    };
    let errors = form.validate();
    if !errors.is_empty() {
        return Ok(HtmlTemplate(PasswordResetConfirmTemplate {
            current_user,
            valid_link: true,
            errors,
        })
        .into_response());
    }
    let hash = hash_password_argon2(form.new_password1).await?;
    update_password_in_db(&state.pool, user.id, &hash).await?;
    tracing::info!(user_id = user.id, "Password reset completed");
    Ok(Redirect::to("/auth/reset/done/").into_response())
}

pub async fn password_reset_complete(
    MaybeUser(current_user): MaybeUser,
) -> HtmlTemplate<PasswordResetCompleteTemplate> {
    HtmlTemplate(PasswordResetCompleteTemplate { current_user })
}
