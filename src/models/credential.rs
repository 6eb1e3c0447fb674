use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::constants::{DEFAULT_USER_EMAIL, DEFAULT_USER_PASSWORD};

/// Email/password pair used to drive sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub email: String,
    pub password: String,
}

impl Credential {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl Default for Credential {
    fn default() -> Self {
        Self::new(DEFAULT_USER_EMAIL, DEFAULT_USER_PASSWORD)
    }
}

/// Payload sent to the API when creating a throwaway user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreateRequest {
    pub is_subscribed: bool,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl UserCreateRequest {
    /// A fresh user with a unique `test+<uuid>@test.com` address.
    pub fn random(password: impl Into<String>) -> Self {
        Self {
            is_subscribed: false,
            email: format!("test+{}@test.com", Uuid::new_v4()),
            first_name: "test".to_string(),
            last_name: "test".to_string(),
            password: password.into(),
        }
    }

    pub fn credential(&self) -> Credential {
        Credential::new(self.email.clone(), self.password.clone())
    }
}

/// User record returned by the API after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreatedResponse {
    #[serde(default)]
    pub id: Option<String>,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Identity handed to tests that asked for a brand new user.
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_model: UserCreateRequest,
    pub created_user: UserCreatedResponse,
}
