#![allow(dead_code)]

use std::{net::TcpListener, path::PathBuf, time::Duration};

use reqwest::{
    header::{HeaderMap, HeaderValue, COOKIE, LOCATION, SET_COOKIE},
    redirect::Policy,
    Client, Response, StatusCode,
};
use yatube::{
    authentication::{hash_password_argon2, SESSION_COOKIE},
    config::Config,
    db_helpers::{insert_group, insert_post, insert_user, NewUser, PostFields},
    models::{Group, User},
    run_app, AppState,
};

pub const PASSWORD: &str = "test-password-1";

pub const SMALL_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00,
    0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00, 0x00, 0x00,
    0x02, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x0C, 0x0A, 0x00, 0x3B,
];

pub struct TestApp {
    pub address: String,
    pub state: AppState,
    pub media_root: PathBuf,
    password_hash: String,
}

/// Starts the application on a random port with a fresh database and media
/// directory.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

/// Like [`spawn_app`], with a chance to adjust the configuration first.
pub async fn spawn_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let run_id = format!("{}-{}", std::process::id(), rand::random::<u64>());
    let scratch = std::env::temp_dir().join(format!("yatube-test-{}", run_id));
    std::fs::create_dir_all(&scratch).expect("Failed to create scratch directory");
    let media_root = scratch.join("media");
    let mut config = Config {
        database_url: format!("sqlite://{}", scratch.join("yatube.db").display()),
        secret_key: "test-secret-key".to_string(),
        bind_address: "127.0.0.1:0".parse().unwrap(),
        media_root: media_root.clone(),
        page_size: 10,
        index_cache_ttl: Duration::from_secs(20),
        max_upload_bytes: 5 * 1024 * 1024,
    };
    configure(&mut config);
    let state = AppState::new(config).await.expect("Failed to start app");
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let address = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(run_app(listener, state.clone()));

    let password_hash = hash_password_argon2(PASSWORD.to_string())
        .await
        .expect("Failed to hash password");
    TestApp {
        address,
        state,
        media_root,
        password_hash,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// An anonymous visitor that does not follow redirects.
    pub fn guest(&self) -> Client {
        client_with_headers(HeaderMap::new())
    }

    pub async fn create_user(&self, username: &str) -> User {
        let user = NewUser {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            first_name: String::new(),
            last_name: String::new(),
            password: self.password_hash.clone(),
        };
        insert_user(&self.state.pool, &user)
            .await
            .expect("Failed to insert user")
    }

    pub async fn create_group(&self, title: &str, slug: &str) -> Group {
        insert_group(&self.state.pool, title, slug, "test-description")
            .await
            .expect("Failed to insert group")
    }

    pub async fn create_post(&self, author: &User, text: &str, group: Option<&Group>) -> i64 {
        let fields = PostFields {
            text: text.to_string(),
            group_id: group.map(|g| g.id),
            image: None,
        };
        insert_post(&self.state.pool, author.id, &fields)
            .await
            .expect("Failed to insert post")
    }

    pub async fn login(&self, username: &str, password: &str) -> Response {
        self.guest()
            .post(self.url("/auth/login/"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .expect("Failed to send login request")
    }

    /// Logs in through the login form and returns a client carrying the
    /// session cookie.
    pub async fn client_for(&self, user: &User) -> Client {
        let response = self.login(&user.username, PASSWORD).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let cookie = session_cookie(&response).expect("Login did not set a session cookie");
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("{}={}", SESSION_COOKIE, cookie)).unwrap(),
        );
        client_with_headers(headers)
    }
}

fn client_with_headers(headers: HeaderMap) -> Client {
    Client::builder()
        .redirect(Policy::none())
        .default_headers(headers)
        .build()
        .expect("Failed to build client")
}

/// The value of the session cookie set by the response, if any.
pub fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| {
            let pair = value.split(';').next()?;
            let (name, value) = pair.split_once('=')?;
            (name.trim() == SESSION_COOKIE).then(|| value.trim().to_string())
        })
}

/// A post form carrying the given bytes as its image.
pub fn post_form_with_image(text: &str, image: &[u8]) -> reqwest::multipart::Form {
    reqwest::multipart::Form::new().text("text", text.to_string()).part(
        "image",
        reqwest::multipart::Part::bytes(image.to_vec())
            .file_name("small.gif")
            .mime_str("image/gif")
            .unwrap(),
    )
}

pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub async fn get_page(client: &Client, url: String) -> (StatusCode, String) {
    let response = client.get(url).send().await.expect("Request failed");
    let status = response.status();
    let body = response.text().await.expect("Failed to read body");
    (status, body)
}

pub fn title_of(body: &str) -> &str {
    body.split_once("<title>")
        .and_then(|(_, rest)| rest.split_once("</title>"))
        .map(|(title, _)| title.trim())
        .unwrap_or_default()
}

pub fn post_cards(body: &str) -> usize {
    body.matches("class=\"post-card\"").count()
}
