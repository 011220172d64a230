use axum::{body::Bytes, extract::Multipart};
use serde::Deserialize;

use crate::{errors::RequestError, media::ImageKind, models::Group};

use super::{FormErrors, FIELD_REQUIRED};

const USERNAME_MAX_LEN: usize = 150;
const PASSWORD_MIN_LEN: usize = 8;

// ----------------- Post Forms -----------------

#[derive(Debug)]
pub struct UploadedImage {
    pub data: Bytes,
}

/// The post create/edit form as submitted (`multipart/form-data`).
#[derive(Debug, Default)]
pub struct PostForm {
    pub text: String,
    pub group: String,
    pub image: Option<UploadedImage>,
    pub clear_image: bool,
}

/// A [`PostForm`] that passed validation.
#[derive(Debug)]
pub struct ValidPost {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<(ImageKind, Bytes)>,
    pub clear_image: bool,
}

/// What the post form shows when it is rendered.
#[derive(Debug, Default, Clone)]
pub struct PostFormValues {
    pub text: String,
    pub group_id: Option<i64>,
}

impl PostFormValues {
    pub fn is_selected(&self, group_id: &i64) -> bool {
        self.group_id == Some(*group_id)
    }
}

impl PostForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, RequestError> {
        let mut form = PostForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|_| RequestError::BadRequest("Malformed form data"))?
        {
            let name = field.name().unwrap_or_default().to_owned();
            match name.as_str() {
                "text" => form.text = read_text(field).await?,
                "group" => form.group = read_text(field).await?,
                "image-clear" => form.clear_image = true,
                "image" => {
                    let data = field
                        .bytes()
                        .await
                        .map_err(|_| RequestError::BadRequest("Failed to read the uploaded file"))?;
                    // Browsers send an empty part when no file was chosen.
                    if !data.is_empty() {
                        form.image = Some(UploadedImage { data });
                    }
                }
                _ => {}
            }
        }
        Ok(form)
    }

    pub fn values(&self) -> PostFormValues {
        PostFormValues {
            text: self.text.clone(),
            group_id: self.group.trim().parse().ok(),
        }
    }

    pub fn validate(&self, groups: &[Group]) -> Result<ValidPost, FormErrors> {
        let mut errors = FormErrors::default();

        let text = self.text.trim();
        if text.is_empty() {
            errors.add("text", FIELD_REQUIRED);
        }

        let group = self.group.trim();
        let group_id = if group.is_empty() {
            None
        } else {
            match group.parse::<i64>() {
                Ok(id) if groups.iter().any(|g| g.id == id) => Some(id),
                _ => {
                    errors.add(
                        "group",
                        "Select a valid choice. That choice is not one of the available choices.",
                    );
                    None
                }
            }
        };

        let image = match &self.image {
            Some(upload) => match ImageKind::detect(&upload.data) {
                Some(kind) => Some((kind, upload.data.clone())),
                None => {
                    errors.add(
                        "image",
                        "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
                    );
                    None
                }
            },
            None => None,
        };

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(ValidPost {
            text: text.to_string(),
            group_id,
            image,
            clear_image: self.clear_image,
        })
    }
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, RequestError> {
    field
        .text()
        .await
        .map_err(|_| RequestError::BadRequest("Malformed form data"))
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct CommentForm {
    pub text: String,
}

// ----------------- User Forms -----------------

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct SignupForm {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
}

impl SignupForm {
    /// Checks everything that does not need the database.
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::default();
        validate_username(self.username.trim(), &mut errors);
        let email = self.email.trim();
        if !email.is_empty() && !is_valid_email(email) {
            errors.add("email", "Enter a valid email address.");
        }
        validate_new_password(&self.password1, &self.password2, "password", &mut errors);
        errors
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub next: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct PasswordChangeForm {
    pub old_password: String,
    pub new_password1: String,
    pub new_password2: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct PasswordResetForm {
    pub email: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct SetPasswordForm {
    pub new_password1: String,
    pub new_password2: String,
}

impl SetPasswordForm {
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::default();
        validate_new_password(
            &self.new_password1,
            &self.new_password2,
            "new_password",
            &mut errors,
        );
        errors
    }
}

impl PasswordChangeForm {
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::default();
        if self.old_password.is_empty() {
            errors.add("old_password", FIELD_REQUIRED);
        }
        validate_new_password(
            &self.new_password1,
            &self.new_password2,
            "new_password",
            &mut errors,
        );
        errors
    }
}

fn validate_username(username: &str, errors: &mut FormErrors) {
    if username.is_empty() {
        errors.add("username", FIELD_REQUIRED);
    } else if username.chars().count() > USERNAME_MAX_LEN {
        errors.add(
            "username",
            "Ensure this value has at most 150 characters.",
        );
    } else if !username
        .chars()
        .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
    {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
}

fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// `field` is the error key shared by both password inputs.
fn validate_new_password(
    password1: &str,
    password2: &str,
    field: &'static str,
    errors: &mut FormErrors,
) {
    if password1.is_empty() || password2.is_empty() {
        errors.add(field, FIELD_REQUIRED);
    } else if password1 != password2 {
        errors.add(field, "The two password fields didn't match.");
    } else if password1.chars().count() < PASSWORD_MIN_LEN {
        errors.add(
            field,
            "This password is too short. It must contain at least 8 characters.",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups() -> Vec<Group> {
        vec![Group {
            id: 3,
            title: "Cats".into(),
            slug: "cats".into(),
            description: "All about cats".into(),
        }]
    }

    fn signup(username: &str, password1: &str, password2: &str) -> SignupForm {
        SignupForm {
            username: username.into(),
            password1: password1.into(),
            password2: password2.into(),
            ..Default::default()
        }
    }

    #[test]
    fn post_text_is_required() {
        let form = PostForm {
            text: "   ".into(),
            ..Default::default()
        };
        let errors = form.validate(&groups()).unwrap_err();
        assert_eq!(errors.field("text"), vec![FIELD_REQUIRED]);
    }

    #[test]
    fn post_group_must_exist() {
        let mut form = PostForm {
            text: "hello".into(),
            group: "99".into(),
            ..Default::default()
        };
        assert!(!form.validate(&groups()).unwrap_err().field("group").is_empty());

        form.group = "3".into();
        let post = form.validate(&groups()).unwrap();
        assert_eq!(post.group_id, Some(3));
        assert_eq!(post.text, "hello");
    }

    #[test]
    fn post_image_must_be_an_image() {
        let form = PostForm {
            text: "hello".into(),
            image: Some(UploadedImage {
                data: Bytes::from_static(b"just some text"),
            }),
            ..Default::default()
        };
        let errors = form.validate(&groups()).unwrap_err();
        assert_eq!(errors.field("image").len(), 1);
    }

    #[test]
    fn post_image_with_corrupt_body_is_rejected() {
        let form = PostForm {
            text: "hello".into(),
            image: Some(UploadedImage {
                data: Bytes::from_static(b"GIF89athis is definitely not an image body"),
            }),
            ..Default::default()
        };
        let errors = form.validate(&groups()).unwrap_err();
        assert_eq!(errors.field("image").len(), 1);
    }

    #[test]
    fn values_keep_selected_group() {
        let form = PostForm {
            text: "draft".into(),
            group: "3".into(),
            ..Default::default()
        };
        let values = form.values();
        assert!(values.is_selected(&3));
        assert!(!values.is_selected(&4));
    }

    #[test]
    fn signup_checks_passwords_and_username() {
        assert!(signup("leo", "longpassword", "longpassword")
            .validate()
            .is_empty());
        assert!(!signup("leo", "longpassword", "different1")
            .validate()
            .field("password")
            .is_empty());
        assert!(!signup("leo", "short", "short")
            .validate()
            .field("password")
            .is_empty());
        assert!(!signup("", "longpassword", "longpassword")
            .validate()
            .field("username")
            .is_empty());
        assert!(!signup("bad name!", "longpassword", "longpassword")
            .validate()
            .field("username")
            .is_empty());
        assert!(signup("leo.t+1@x_y-z", "longpassword", "longpassword")
            .validate()
            .is_empty());
    }

    #[test]
    fn email_is_optional_but_checked() {
        let mut form = signup("leo", "longpassword", "longpassword");
        form.email = "not-an-email".into();
        assert!(!form.validate().field("email").is_empty());
        form.email = "leo@example.com".into();
        assert!(form.validate().is_empty());
    }

    #[test]
    fn password_change_requires_old_password() {
        let form = PasswordChangeForm {
            old_password: String::new(),
            new_password1: "longpassword".into(),
            new_password2: "longpassword".into(),
        };
        assert_eq!(form.validate().field("old_password"), vec![FIELD_REQUIRED]);
    }
}
