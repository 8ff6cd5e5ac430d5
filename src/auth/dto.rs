use serde::{Deserialize, Serialize};

/// Request body for signup.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// First step of the forgot-password wizard: prove the email is on record.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Second step of the wizard: the replacement password.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Public part of a user returned to the client. The stored password never
/// leaves the blob.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub email: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
