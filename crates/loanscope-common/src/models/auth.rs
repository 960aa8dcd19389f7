use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque bearer token issued by `POST /auth/login`.
///
/// The client never inspects the token; its presence is the only local
/// authorization signal and its validity is decided by the backend.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

// Tokens must not end up in logs or span fields.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Body of `POST /auth/login`
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Successful login response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: Credential,
}

/// Body of `POST /auth/register`
#[derive(Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl SignupRequest {
    /// The login request that follows a successful registration
    pub fn login(&self) -> LoginRequest {
        LoginRequest {
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

impl fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupRequest")
            .field("username", &self.username)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_debug_is_redacted() {
        let cred = Credential::new("eyJhbGciOiJIUzI1NiJ9.secret");
        let dbg = format!("{:?}", cred);
        assert!(!dbg.contains("secret"), "got: {dbg}");
        assert_eq!(cred.bearer(), "Bearer eyJhbGciOiJIUzI1NiJ9.secret");
    }

    #[test]
    fn test_token_response_parses() {
        let resp: TokenResponse = serde_json::from_str(r#"{"token": "abc.def"}"#).unwrap();
        assert_eq!(resp.token.as_str(), "abc.def");
    }

    #[test]
    fn test_login_request_debug_hides_password() {
        let req = LoginRequest {
            username: "ana".to_string(),
            password: "hunter2".to_string(),
        };
        let dbg = format!("{:?}", req);
        assert!(dbg.contains("ana"));
        assert!(!dbg.contains("hunter2"));
    }

    #[test]
    fn test_signup_login_carries_credentials() {
        let req = SignupRequest {
            username: "ana".to_string(),
            first_name: "Ana".to_string(),
            last_name: "Lee".to_string(),
            password: "pw".to_string(),
        };
        let login = req.login();
        assert_eq!(login.username, "ana");
        assert_eq!(login.password, "pw");
    }
}
