use chrono::{DateTime, Utc};
use hermes_shared::{Masked, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Optional vehicle description, editable from the profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CarDetails {
    pub car_brand: Option<String>,
    pub car_model: Option<String>,
    pub car_year: Option<i32>,
    pub car_color: Option<String>,
    pub car_number: Option<String>,
}

/// Public profile. The password hash lives only in [`UserCredentials`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: Masked<String>,
    pub phone: Masked<String>,
    pub role: Role,
    pub avatar_url: Option<String>,
    #[serde(flatten)]
    pub car: CarDetails,
    pub rating: f64,
    pub reviews_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What login needs to verify a password and issue a token.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub id: Uuid,
    pub full_name: String,
    pub email: Masked<String>,
    pub role: Role,
    pub password_hash: Masked<String>,
    pub rating: f64,
    pub reviews_count: i32,
}

/// `POST /auth/register` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub full_name: String,
    pub email: Masked<String>,
    pub phone: Masked<String>,
    pub password: Masked<String>,
    #[serde(default)]
    pub is_driver: bool,
}

impl Registration {
    /// Trim fields, lowercase the email, check the password length.
    pub fn validate(mut self) -> Result<Self, IdentityError> {
        self.full_name = self.full_name.trim().to_string();
        if self.full_name.is_empty() {
            return Err(IdentityError::MissingField("fullName"));
        }
        let email = self.email.expose().trim().to_lowercase();
        if !email.contains('@') {
            return Err(IdentityError::InvalidEmail);
        }
        self.email = Masked(email);
        let phone = self.phone.expose().trim().to_string();
        if phone.is_empty() {
            return Err(IdentityError::MissingField("phone"));
        }
        self.phone = Masked(phone);
        if self.password.expose().chars().count() < MIN_PASSWORD_LEN {
            return Err(IdentityError::PasswordTooShort);
        }
        Ok(self)
    }

    pub fn role(&self) -> Role {
        Role::from_driver_flag(self.is_driver)
    }
}

/// A registration with the password already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub email: Masked<String>,
    pub phone: Masked<String>,
    pub password_hash: Masked<String>,
    pub role: Role,
}

/// `POST /auth/login` body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: Masked<String>,
    pub password: Masked<String>,
}

impl LoginRequest {
    pub fn normalized_email(&self) -> String {
        self.email.expose().trim().to_lowercase()
    }
}

/// `PUT /users/profile` body. Car fields are overwritten as sent.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub full_name: String,
    pub phone: Masked<String>,
    #[serde(flatten)]
    pub car: CarDetails,
}

impl ProfileUpdate {
    pub fn validate(mut self) -> Result<Self, IdentityError> {
        self.full_name = self.full_name.trim().to_string();
        if self.full_name.is_empty() {
            return Err(IdentityError::MissingField("fullName"));
        }
        self.phone = Masked(self.phone.expose().trim().to_string());
        if self.phone.expose().is_empty() {
            return Err(IdentityError::MissingField("phone"));
        }
        if let Some(year) = self.car.car_year {
            if !(1900..=2100).contains(&year) {
                return Err(IdentityError::InvalidCarYear(year));
            }
        }
        Ok(self)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Field {0} is required")]
    MissingField(&'static str),

    #[error("Email address is not valid")]
    InvalidEmail,

    #[error("Password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,

    #[error("Car year {0} is not plausible")]
    InvalidCarYear(i32),

    #[error("User already exists")]
    EmailTaken,
}
