//! HTML form payloads and their validation.
//!
//! Validation never touches the store except where a rule needs existing
//! rows (group choices); username uniqueness is checked by the handler and
//! folded into [`SignupErrors`].

use axum_extra::extract::Multipart;
use bytes::Bytes;
use lettre::Address;
use serde::Deserialize;
use yatube_core::group::Group;

use crate::{error::Error, media};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_USERNAME: &str = "Enter a valid username. This value may contain only letters, \
                                    numbers, and @/./+/-/_ characters.";
pub const USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const USERNAME_RESERVED: &str = "This username is reserved.";
pub const INVALID_EMAIL: &str = "Enter a valid email address.";
pub const PASSWORD_MISMATCH: &str = "The two password fields didn't match.";
pub const WRONG_OLD_PASSWORD: &str =
  "Your old password was entered incorrectly. Please enter it again.";
pub const BAD_LOGIN: &str = "Please enter a correct username and password. Note that both \
                             fields may be case-sensitive.";
pub const INVALID_GROUP: &str =
  "Select a valid choice. That choice is not one of the available choices.";
pub const INVALID_IMAGE: &str = "Upload a valid image. The file you uploaded was either not an \
                                 image or a corrupted image.";
pub const EMPTY_FILE: &str = "The submitted file is empty.";
pub const CLEAR_AND_UPLOAD: &str =
  "Please either submit a file or check the clear checkbox, not both.";

pub const USERNAME_MAX_LEN: usize = 150;

/// First path segments owned by fixed routes. A user with one of these names
/// would have a profile URL that never reaches the profile page.
const RESERVED_USERNAMES: &[&str] =
  &["about-author", "about-spec", "auth", "follow", "group", "media", "new"];

// ─── Accounts ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SignupForm {
  pub first_name: String,
  pub last_name:  String,
  pub username:   String,
  pub email:      String,
  pub password1:  String,
  pub password2:  String,
}

#[derive(Debug, Clone, Default)]
pub struct SignupErrors {
  pub username:  Option<String>,
  pub email:     Option<String>,
  pub password1: Option<String>,
  pub password2: Option<String>,
}

impl SignupErrors {
  pub fn is_empty(&self) -> bool {
    self.username.is_none()
      && self.email.is_none()
      && self.password1.is_none()
      && self.password2.is_none()
  }
}

impl SignupForm {
  pub fn validate(&self) -> SignupErrors {
    let mut errors = SignupErrors {
      username: username_error(self.username.trim()),
      ..SignupErrors::default()
    };

    let email = self.email.trim();
    if email.is_empty() {
      errors.email = Some(REQUIRED.into());
    } else if email.parse::<Address>().is_err() {
      errors.email = Some(INVALID_EMAIL.into());
    }

    if self.password1.is_empty() {
      errors.password1 = Some(REQUIRED.into());
    }
    if self.password2.is_empty() {
      errors.password2 = Some(REQUIRED.into());
    } else if self.password1 != self.password2 {
      errors.password2 = Some(PASSWORD_MISMATCH.into());
    }
    errors
  }
}

fn username_error(username: &str) -> Option<String> {
  let len = username.chars().count();
  if len == 0 {
    Some(REQUIRED.into())
  } else if len > USERNAME_MAX_LEN {
    Some(format!(
      "Ensure this value has at most {USERNAME_MAX_LEN} characters (it has {len})."
    ))
  } else if !username.chars().all(is_username_char) {
    Some(INVALID_USERNAME.into())
  } else if RESERVED_USERNAMES.contains(&username.to_lowercase().as_str()) {
    Some(USERNAME_RESERVED.into())
  } else {
    None
  }
}

/// Word characters plus `.@+-`.
fn is_username_char(c: char) -> bool {
  c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-')
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
  pub username: String,
  pub password: String,
  pub next:     Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NextQuery {
  pub next: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PasswordChangeForm {
  pub old_password:  String,
  pub new_password1: String,
  pub new_password2: String,
}

#[derive(Debug, Clone, Default)]
pub struct PasswordChangeErrors {
  pub old_password:  Option<String>,
  pub new_password1: Option<String>,
  pub new_password2: Option<String>,
}

impl PasswordChangeErrors {
  pub fn is_empty(&self) -> bool {
    self.old_password.is_none() && self.new_password1.is_none() && self.new_password2.is_none()
  }
}

impl PasswordChangeForm {
  /// Checks that do not need the stored hash; the old password is verified
  /// by the handler.
  pub fn validate(&self) -> PasswordChangeErrors {
    let mut errors = PasswordChangeErrors::default();
    if self.old_password.is_empty() {
      errors.old_password = Some(REQUIRED.into());
    }
    if self.new_password1.is_empty() {
      errors.new_password1 = Some(REQUIRED.into());
    }
    if self.new_password2.is_empty() {
      errors.new_password2 = Some(REQUIRED.into());
    } else if self.new_password1 != self.new_password2 {
      errors.new_password2 = Some(PASSWORD_MISMATCH.into());
    }
    errors
  }
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommentForm {
  pub text: String,
}

impl CommentForm {
  /// The trimmed text, or the field error.
  pub fn validate(&self) -> Result<String, &'static str> {
    let text = self.text.trim();
    if text.is_empty() { Err(REQUIRED) } else { Ok(text.to_owned()) }
  }
}

// ─── Posts ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Upload {
  pub file_name: String,
  pub bytes:     Bytes,
}

/// A submitted post form, as read from `multipart/form-data`.
#[derive(Debug, Clone, Default)]
pub struct PostForm {
  pub text:        String,
  /// Raw value of the group selector; empty means "no group".
  pub group:       String,
  pub image:       Option<Upload>,
  pub clear_image: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PostFormErrors {
  pub text:  Option<String>,
  pub group: Option<String>,
  pub image: Option<String>,
}

/// A post form that passed validation.
#[derive(Debug, Clone)]
pub struct ValidPost {
  pub text:        String,
  pub group_id:    Option<i64>,
  /// Image bytes and their file extension.
  pub image:       Option<(Bytes, &'static str)>,
  pub clear_image: bool,
}

impl PostForm {
  pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, Error> {
    let mut form = PostForm::default();
    while let Some(field) = multipart.next_field().await? {
      let Some(name) = field.name().map(str::to_owned) else { continue };
      match name.as_str() {
        "text" => form.text = field.text().await?,
        "group" => form.group = field.text().await?,
        "image" => {
          let file_name = field.file_name().unwrap_or_default().to_owned();
          let bytes = field.bytes().await?;
          // An untouched file input still sends an empty, unnamed part.
          if !(file_name.is_empty() && bytes.is_empty()) {
            form.image = Some(Upload { file_name, bytes });
          }
        }
        "image-clear" => form.clear_image = !field.text().await?.is_empty(),
        _ => {}
      }
    }
    Ok(form)
  }

  pub fn validate(&self, groups: &[Group]) -> Result<ValidPost, PostFormErrors> {
    let mut errors = PostFormErrors::default();

    let text = self.text.trim();
    if text.is_empty() {
      errors.text = Some(REQUIRED.into());
    }

    let group = self.group.trim();
    let group_id = if group.is_empty() {
      None
    } else {
      match group.parse::<i64>() {
        Ok(id) if groups.iter().any(|g| g.id == id) => Some(id),
        _ => {
          errors.group = Some(INVALID_GROUP.into());
          None
        }
      }
    };

    let image = match &self.image {
      None => None,
      Some(_) if self.clear_image => {
        errors.image = Some(CLEAR_AND_UPLOAD.into());
        None
      }
      Some(upload) if upload.bytes.is_empty() => {
        errors.image = Some(EMPTY_FILE.into());
        None
      }
      Some(upload) => match media::image_extension(&upload.bytes) {
        Some(ext) => Some((upload.bytes.clone(), ext)),
        None => {
          errors.image = Some(INVALID_IMAGE.into());
          None
        }
      },
    };

    if errors.text.is_some() || errors.group.is_some() || errors.image.is_some() {
      return Err(errors);
    }
    Ok(ValidPost {
      text: text.to_owned(),
      group_id,
      image,
      clear_image: self.clear_image,
    })
  }
}
