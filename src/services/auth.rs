//! Authentication service: sign-in, registration, logout, password reset

use serde_json::{json, Value};
use validator::Validate;

use crate::{
    api::ApiClient,
    error::{ClientError, ClientResult},
    models::user::{
        LoginRequest, LoginResponse, PasswordResetConfirm, PasswordResetOtpVerify,
        PasswordResetResponse, RegisterRequest, Session, UserRecord,
    },
    session::SessionKey,
};

const MIN_PASSWORD_LEN: usize = 8;
const OTP_LEN: usize = 6;

#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Sign in and persist the credential pair with the user record
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<UserRecord> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ClientError::InvalidInput(
                "Both username and password are required".to_string(),
            ));
        }

        let response: LoginResponse = self
            .client
            .post("/login/", &LoginRequest { username, password })
            .await?;
        self.start_session(response)
    }

    /// Create an account; the server signs the new user in immediately
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> ClientResult<UserRecord> {
        let request = RegisterRequest {
            username: username.trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        request
            .validate()
            .map_err(|e| ClientError::InvalidInput(e.to_string()))?;

        let response: LoginResponse = self.client.post("/register/", &request).await?;
        self.start_session(response)
    }

    fn start_session(&self, response: LoginResponse) -> ClientResult<UserRecord> {
        let session = Session::from(response);
        self.client.session().save(&session)?;
        tracing::info!("Signed in as {} ({})", session.user.username, session.user.role);
        Ok(session.user)
    }

    /// Blacklist the refresh token server-side, then forget the session.
    ///
    /// The local session is cleared even when the server call fails.
    pub async fn logout(&self) -> ClientResult<()> {
        if let Some(refresh) = self.client.session().refresh_token()? {
            if let Err(e) = self
                .client
                .post::<Value, _>("/logout/", &json!({ "refresh": refresh }))
                .await
            {
                tracing::warn!("Logout request failed: {}", e);
            }
        }

        self.client.session().clear()?;
        tracing::info!("Signed out");
        Ok(())
    }

    /// Pick up a session persisted by an earlier run.
    ///
    /// Needs both an access token and a user record; a user record that no
    /// longer parses wipes the whole session.
    pub fn restore(&self) -> ClientResult<Option<UserRecord>> {
        let store = self.client.session();
        if store.access_token()?.is_none() || store.get(SessionKey::User)?.is_none() {
            return Ok(None);
        }

        match store.user() {
            Ok(user) => Ok(user),
            Err(e) => {
                tracing::error!("Error parsing stored user record: {}", e);
                store.clear()?;
                Ok(None)
            }
        }
    }

    pub fn current_user(&self) -> ClientResult<Option<UserRecord>> {
        self.client.session().user()
    }

    /// Ask for a reset link by email
    pub async fn request_password_reset(&self, email: &str) -> ClientResult<PasswordResetResponse> {
        let email = checked_email(email)?;
        let mut response: PasswordResetResponse = self
            .client
            .post("/password-reset/", &json!({ "email": email }))
            .await?;
        response
            .message
            .get_or_insert_with(|| "Password reset link has been sent to your email.".to_string());
        Ok(response)
    }

    /// Complete a link-based reset
    pub async fn confirm_password_reset(
        &self,
        uid: &str,
        token: &str,
        new_password: &str,
        new_password_confirm: &str,
    ) -> ClientResult<String> {
        check_new_password(new_password, new_password_confirm)?;

        let body = PasswordResetConfirm {
            uid: uid.to_string(),
            token: token.to_string(),
            new_password: new_password.to_string(),
            new_password_confirm: new_password_confirm.to_string(),
        };
        let response: Option<PasswordResetResponse> =
            self.client.post("/password-reset-confirm/", &body).await?;
        Ok(response
            .and_then(|r| r.message)
            .unwrap_or_else(|| "Password has been reset successfully.".to_string()))
    }

    /// Ask for a one-time code by email
    pub async fn request_password_reset_otp(
        &self,
        email: &str,
    ) -> ClientResult<PasswordResetResponse> {
        let email = checked_email(email)?;
        let mut response: PasswordResetResponse = self
            .client
            .post("/password-reset-otp/", &json!({ "email": email }))
            .await?;
        if response.email_exists != Some(false) && response.suggest_signup != Some(true) {
            response.message.get_or_insert_with(|| {
                "A 6-digit verification code has been sent to your email address.".to_string()
            });
        } else {
            response
                .message
                .get_or_insert_with(|| "No account found with this email address.".to_string());
        }
        Ok(response)
    }

    /// Complete a code-based reset
    pub async fn verify_password_reset_otp(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
        new_password_confirm: &str,
    ) -> ClientResult<String> {
        let email = checked_email(email)?;
        let otp = otp.trim();
        if otp.len() != OTP_LEN || !otp.chars().all(|c| c.is_ascii_digit()) {
            return Err(ClientError::InvalidInput(
                "Please enter a valid 6-digit code".to_string(),
            ));
        }
        check_new_password(new_password, new_password_confirm)?;

        let body = PasswordResetOtpVerify {
            email,
            otp: otp.to_string(),
            new_password: new_password.to_string(),
            new_password_confirm: new_password_confirm.to_string(),
        };
        let response: Option<PasswordResetResponse> =
            self.client.post("/password-reset-otp-verify/", &body).await?;
        Ok(response
            .and_then(|r| r.message)
            .unwrap_or_else(|| "Password has been reset successfully.".to_string()))
    }
}

fn checked_email(email: &str) -> ClientResult<String> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ClientError::InvalidInput(
            "Please enter a valid email address".to_string(),
        ));
    }
    Ok(email.to_string())
}

fn check_new_password(new_password: &str, confirm: &str) -> ClientResult<()> {
    if new_password != confirm {
        return Err(ClientError::InvalidInput("Passwords do not match".to_string()));
    }
    if new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ClientError::InvalidInput(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}
