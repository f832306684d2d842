//! User account model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A back-office user. Soft-deleted accounts keep their event history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub login: String,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub deleted: bool,
}
