use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Directory view of a doctor. Profile CRUD lives outside the scheduling core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    pub id: Uuid,
    /// Subject of the doctor's login token.
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub specialization: Option<String>,
    pub department_name: Option<String>,
}

impl Doctor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub patient_unique_id: Option<String>,
}

