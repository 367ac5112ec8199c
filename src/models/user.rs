//! User, profile and session types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::dates;

/// Account role. Anything the server sends besides `admin` is a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    #[default]
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Member => "member",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Member => "Member",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        if s.eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::Member
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

/// Denormalized user summary kept next to the tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default, deserialize_with = "dates::optional")]
    pub date_of_membership: Option<NaiveDate>,
}

impl UserRecord {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Profile of the signed-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub id: Option<i64>,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default, deserialize_with = "dates::optional")]
    pub date_of_membership: Option<NaiveDate>,
    /// Loan length in days
    #[serde(default)]
    pub loan_duration: Option<u32>,
    #[serde(default)]
    pub active_status: Option<bool>,
}

impl Profile {
    pub fn loan_days(&self) -> u32 {
        self.loan_duration.unwrap_or(14)
    }

    pub fn is_active(&self) -> bool {
        self.active_status.unwrap_or(false)
    }
}

/// Body of a successful login or registration
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    #[serde(flatten)]
    pub user: UserRecord,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Body of the token refresh exchange
#[derive(Debug, Clone, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    /// Present when the server rotates refresh tokens
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Credential pair plus user record, as created on login
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserRecord,
}

impl From<LoginResponse> for Session {
    fn from(response: LoginResponse) -> Self {
        Self {
            access_token: response.access,
            refresh_token: response.refresh,
            user: response.user,
        }
    }
}

/// Outcome of a password reset request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordResetResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub email_exists: Option<bool>,
    #[serde(default)]
    pub suggest_signup: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordResetConfirm {
    pub uid: String,
    pub token: String,
    pub new_password: String,
    pub new_password_confirm: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordResetOtpVerify {
    pub email: String,
    pub otp: String,
    pub new_password: String,
    pub new_password_confirm: String,
}
