//! Identity directory used to pre-populate fields on insert.

use crate::config::{DirectoryConfig, PersonConfig};
use crate::error::AppError;
use async_trait::async_trait;
use std::collections::HashMap;

/// Field names whose values come from the directory rather than the submission.
pub const DIRECTORY_FIELDS: [&str; 11] = [
    "user_employee_number",
    "user_display_name",
    "user_department",
    "user_email",
    "user_location",
    "manager",
    "manager_employee_number",
    "manager_display_name",
    "manager_department",
    "manager_email",
    "manager_location",
];

pub fn is_directory_field(name: &str) -> bool {
    DIRECTORY_FIELDS.contains(&name)
}

/// Attributes of a user and of their manager.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdentityAttributes {
    pub user_employee_number: String,
    pub user_display_name: String,
    pub user_department: String,
    pub user_email: String,
    pub user_location: String,
    /// Manager's username.
    pub manager: String,
    pub manager_employee_number: String,
    pub manager_display_name: String,
    pub manager_department: String,
    pub manager_email: String,
    pub manager_location: String,
}

impl IdentityAttributes {
    /// Value for one of [`DIRECTORY_FIELDS`].
    pub fn get(&self, field: &str) -> Option<&str> {
        let v = match field {
            "user_employee_number" => &self.user_employee_number,
            "user_display_name" => &self.user_display_name,
            "user_department" => &self.user_department,
            "user_email" => &self.user_email,
            "user_location" => &self.user_location,
            "manager" => &self.manager,
            "manager_employee_number" => &self.manager_employee_number,
            "manager_display_name" => &self.manager_display_name,
            "manager_department" => &self.manager_department,
            "manager_email" => &self.manager_email,
            "manager_location" => &self.manager_location,
            _ => return None,
        };
        Some(v.as_str())
    }
}

#[async_trait]
pub trait Directory: Send + Sync {
    /// Attributes for `username`. Any failure is `DirectoryLookupFailed`.
    async fn lookup_identity(&self, username: &str) -> Result<IdentityAttributes, AppError>;
}

/// Directory backed by the `[directory]` config section.
#[derive(Clone, Debug, Default)]
pub struct StaticDirectory {
    people: HashMap<String, PersonConfig>,
}

impl StaticDirectory {
    pub fn from_config(config: &DirectoryConfig) -> Self {
        StaticDirectory {
            people: config
                .people
                .iter()
                .map(|p| (p.username.clone(), p.clone()))
                .collect(),
        }
    }

    fn person(&self, username: &str, what: &str) -> Result<&PersonConfig, AppError> {
        self.people
            .get(username)
            .ok_or_else(|| AppError::DirectoryLookupFailed(format!("unable to find details for {} {}", what, username)))
    }
}

#[async_trait]
impl Directory for StaticDirectory {
    async fn lookup_identity(&self, username: &str) -> Result<IdentityAttributes, AppError> {
        let user = self.person(username, "user")?;
        let manager_name = user
            .manager
            .as_deref()
            .ok_or_else(|| AppError::DirectoryLookupFailed(format!("no manager recorded for user {}", username)))?;
        let manager = self.person(manager_name, "manager")?;
        Ok(IdentityAttributes {
            user_employee_number: user.employee_number.clone(),
            user_display_name: user.display_name.clone(),
            user_department: user.department.clone(),
            user_email: user.email.clone(),
            user_location: user.location.clone(),
            manager: manager.username.clone(),
            manager_employee_number: manager.employee_number.clone(),
            manager_display_name: manager.display_name.clone(),
            manager_department: manager.department.clone(),
            manager_email: manager.email.clone(),
            manager_location: manager.location.clone(),
        })
    }
}
