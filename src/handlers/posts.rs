use askama::Template;
use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    headers::ContentLength,
    http::Uri,
    response::{Html, IntoResponse, Redirect, Response},
    Form, TypedHeader,
};

use crate::{
    authentication::{AuthUser, MaybeUser, RequireUser},
    cache::PageCache,
    data_formats::{
        CommentForm, FollowTemplate, FormErrors, GroupListTemplate, HtmlTemplate, IndexTemplate,
        PageQuery, PostDetailTemplate, PostForm, PostFormTemplate, PostFormValues,
        ProfileTemplate,
    },
    db_helpers::{
        add_comment_to_post_in_db, count_followers, count_posts, follow_user_in_db,
        get_comments_for_post_in_db, get_group_by_slug, get_post_by_id, get_user_by_username,
        insert_post, is_following_in_db, list_groups, paginate_posts, unfollow_user_in_db,
        update_post_in_db, PostFields, PostFilter,
    },
    errors::RequestError,
    handlers::parse_id,
    media::{save_post_image, ImageKind},
    models::Post,
    AppState,
};

fn post_detail_url(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

fn profile_url(username: &str) -> String {
    format!("/profile/{}/", username)
}

// ----------------- Listing Handlers -----------------

/// The main page is served from the page cache while a fresh copy exists.
pub async fn index(
    State(state): State<AppState>,
    MaybeUser(current_user): MaybeUser,
    uri: Uri,
    Query(PageQuery { page }): Query<PageQuery>,
) -> Result<Response, RequestError> {
    let key = PageCache::key(&uri, current_user.as_ref().map(|u| u.id));
    if let Some(html) = state.page_cache.get(&key) {
        return Ok(Html(html).into_response());
    }
    let page = paginate_posts(
        &state.pool,
        PostFilter::All,
        state.paginator(),
        page.as_deref(),
    )
    .await?;
    let html = IndexTemplate { current_user, page }.render()?;
    state.page_cache.insert(key, html.clone());
    Ok(Html(html).into_response())
}

pub async fn group_posts(
    State(state): State<AppState>,
    MaybeUser(current_user): MaybeUser,
    Path(slug): Path<String>,
    Query(PageQuery { page }): Query<PageQuery>,
) -> Result<HtmlTemplate<GroupListTemplate>, RequestError> {
    let group = get_group_by_slug(&state.pool, &slug)
        .await?
        .ok_or(RequestError::NotFound)?;
    let page = paginate_posts(
        &state.pool,
        PostFilter::Group(group.id),
        state.paginator(),
        page.as_deref(),
    )
    .await?;
    Ok(HtmlTemplate(GroupListTemplate {
        current_user,
        group,
        page,
    }))
}

pub async fn profile(
    State(state): State<AppState>,
    MaybeUser(current_user): MaybeUser,
    Path(username): Path<String>,
    Query(PageQuery { page }): Query<PageQuery>,
) -> Result<HtmlTemplate<ProfileTemplate>, RequestError> {
    let author = get_user_by_username(&state.pool, &username)
        .await?
        .ok_or(RequestError::NotFound)?;
    let is_self = current_user.as_ref().map_or(false, |u| u.id == author.id);
    let following = match &current_user {
        Some(user) if !is_self => is_following_in_db(&state.pool, user.id, author.id).await?,
        _ => false,
    };
    let followers_count = count_followers(&state.pool, author.id).await?;
    let page = paginate_posts(
        &state.pool,
        PostFilter::Author(author.id),
        state.paginator(),
        page.as_deref(),
    )
    .await?;
    Ok(HtmlTemplate(ProfileTemplate {
        current_user,
        author,
        page,
        following,
        is_self,
        followers_count,
    }))
}

pub async fn follow_index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(PageQuery { page }): Query<PageQuery>,
) -> Result<HtmlTemplate<FollowTemplate>, RequestError> {
    let page = paginate_posts(
        &state.pool,
        PostFilter::FollowedBy(user.id),
        state.paginator(),
        page.as_deref(),
    )
    .await?;
    Ok(HtmlTemplate(FollowTemplate {
        current_user: Some(user),
        page,
    }))
}

// ----------------- Post Handlers -----------------

pub async fn post_detail(
    State(state): State<AppState>,
    MaybeUser(current_user): MaybeUser,
    Path(post_id): Path<String>,
) -> Result<HtmlTemplate<PostDetailTemplate>, RequestError> {
    let post_id = parse_id(&post_id)?;
    let post = get_post_by_id(&state.pool, post_id)
        .await?
        .ok_or(RequestError::NotFound)?;
    let comments = get_comments_for_post_in_db(&state.pool, post.id).await?;
    let author_posts_count = count_posts(&state.pool, PostFilter::Author(post.author_id)).await?;
    let is_author = current_user
        .as_ref()
        .map_or(false, |u| u.id == post.author_id);
    Ok(HtmlTemplate(PostDetailTemplate {
        current_user,
        post,
        comments,
        author_posts_count,
        is_author,
    }))
}

async fn render_post_form(
    state: &AppState,
    current_user: AuthUser,
    form: PostFormValues,
    errors: FormErrors,
    editing: Option<&Post>,
) -> Result<Response, RequestError> {
    let groups = list_groups(&state.pool).await?;
    let template = match editing {
        Some(post) => PostFormTemplate {
            current_user: Some(current_user),
            form,
            errors,
            groups,
            is_edit: true,
            action: format!("/posts/{}/edit/", post.id),
            current_image: post.image.clone(),
        },
        None => PostFormTemplate {
            current_user: Some(current_user),
            form,
            errors,
            groups,
            is_edit: false,
            action: "/create/".to_string(),
            current_image: None,
        },
    };
    Ok(HtmlTemplate(template).into_response())
}

/// Rejects a declared body larger than the upload limit before any of it is
/// read. Bodies without a length are capped while streaming instead.
fn check_upload_size(
    state: &AppState,
    content_length: Option<TypedHeader<ContentLength>>,
) -> Result<(), RequestError> {
    match content_length {
        Some(TypedHeader(ContentLength(length)))
            if length > state.config.max_upload_bytes as u64 =>
        {
            Err(RequestError::PayloadTooLarge)
        }
        _ => Ok(()),
    }
}

async fn store_image(
    state: &AppState,
    image: Option<(ImageKind, Bytes)>,
) -> Result<Option<String>, RequestError> {
    match image {
        Some((kind, data)) => {
            let path = save_post_image(&state.config.media_root, kind, &data).await?;
            Ok(Some(path))
        }
        None => Ok(None),
    }
}

pub async fn post_create_form(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Response, RequestError> {
    render_post_form(
        &state,
        user,
        PostFormValues::default(),
        FormErrors::default(),
        None,
    )
    .await
}

pub async fn post_create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    content_length: Option<TypedHeader<ContentLength>>,
    multipart: Multipart,
) -> Result<Response, RequestError> {
    check_upload_size(&state, content_length)?;
    let form = PostForm::from_multipart(multipart).await?;
    let groups = list_groups(&state.pool).await?;
    let valid = match form.validate(&groups) {
        Ok(valid) => valid,
        Err(errors) => return render_post_form(&state, user, form.values(), errors, None).await,
    };
    let image = store_image(&state, valid.image).await?;
    let fields = PostFields {
        text: valid.text,
        group_id: valid.group_id,
        image,
    };
    let post_id = insert_post(&state.pool, user.id, &fields).await?;
    tracing::info!(post_id, author = %user.username, "Post created");
    Ok(Redirect::to(&profile_url(&user.username)).into_response())
}

pub async fn post_edit_form(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(post_id): Path<String>,
) -> Result<Response, RequestError> {
    let post_id = parse_id(&post_id)?;
    let post = get_post_by_id(&state.pool, post_id)
        .await?
        .ok_or(RequestError::NotFound)?;
    if post.author_id != user.id {
        return Ok(Redirect::to(&post_detail_url(post.id)).into_response());
    }
    let form = PostFormValues {
        text: post.text.clone(),
        group_id: post.group_id,
    };
    render_post_form(&state, user, form, FormErrors::default(), Some(&post)).await
}

/// Only the author may edit. A new upload replaces the image, the clear
/// checkbox drops it, otherwise the current image is kept.
pub async fn post_edit(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(post_id): Path<String>,
    content_length: Option<TypedHeader<ContentLength>>,
    multipart: Multipart,
) -> Result<Response, RequestError> {
    check_upload_size(&state, content_length)?;
    let post_id = parse_id(&post_id)?;
    let post = get_post_by_id(&state.pool, post_id)
        .await?
        .ok_or(RequestError::NotFound)?;
    if post.author_id != user.id {
        tracing::info!(post_id, user = %user.username, "Refused edit by non-author");
        return Ok(Redirect::to(&post_detail_url(post.id)).into_response());
    }
    let form = PostForm::from_multipart(multipart).await?;
    let groups = list_groups(&state.pool).await?;
    let valid = match form.validate(&groups) {
        Ok(valid) => valid,
        Err(errors) => {
            return render_post_form(&state, user, form.values(), errors, Some(&post)).await
        }
    };
    let image = match store_image(&state, valid.image).await? {
        Some(path) => Some(path),
        None if valid.clear_image => None,
        None => post.image.clone(),
    };
    let fields = PostFields {
        text: valid.text,
        group_id: valid.group_id,
        image,
    };
    update_post_in_db(&state.pool, post.id, &fields).await?;
    tracing::info!(post_id, author = %user.username, "Post edited");
    Ok(Redirect::to(&post_detail_url(post.id)).into_response())
}

// ----------------- Comment Handlers -----------------

/// Blank comments are dropped silently; the user always lands back on the post.
pub async fn add_comment(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(post_id): Path<String>,
    Form(CommentForm { text }): Form<CommentForm>,
) -> Result<Redirect, RequestError> {
    let post_id = parse_id(&post_id)?;
    let post = get_post_by_id(&state.pool, post_id)
        .await?
        .ok_or(RequestError::NotFound)?;
    let text = text.trim();
    if !text.is_empty() {
        let comment_id = add_comment_to_post_in_db(&state.pool, user.id, post.id, text).await?;
        tracing::info!(comment_id, post_id, author = %user.username, "Comment added");
    }
    Ok(Redirect::to(&post_detail_url(post.id)))
}

// ----------------- Follow Handlers -----------------

pub async fn profile_follow(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(username): Path<String>,
) -> Result<Redirect, RequestError> {
    let author = get_user_by_username(&state.pool, &username)
        .await?
        .ok_or(RequestError::NotFound)?;
    if author.id != user.id && follow_user_in_db(&state.pool, user.id, author.id).await? {
        tracing::info!(follower = %user.username, author = %author.username, "Followed");
    }
    Ok(Redirect::to(&profile_url(&author.username)))
}

pub async fn profile_unfollow(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(username): Path<String>,
) -> Result<Redirect, RequestError> {
    let author = get_user_by_username(&state.pool, &username)
        .await?
        .ok_or(RequestError::NotFound)?;
    if unfollow_user_in_db(&state.pool, user.id, author.id).await? {
        tracing::info!(follower = %user.username, author = %author.username, "Unfollowed");
    }
    Ok(Redirect::to(&profile_url(&author.username)))
}
