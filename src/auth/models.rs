use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Entry in the local mock user registry. Lives only in local storage,
/// there is no real identity provider behind it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub password: String,
    pub email: String,
}

/// The logged-in display identity. Never carries the password.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

impl Identity {
    pub fn from_record(record: &UserRecord) -> Self {
        Self {
            id: record.id,
            username: record.username.clone(),
            email: record.email.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub repeat_password: String,
    pub email: String,
}
