//! Authorization gate: classify the caller against a form's admins and anonymous flag.

use crate::error::AppError;
use crate::schema::FormHeader;
use std::collections::BTreeSet;

/// Owner name recorded for unauthenticated submissions.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Row-level role used when building statements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Sees and updates every row.
    Admin,
    /// Restricted to rows whose `created_user` is the caller.
    Owner,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Access {
    Admin(String),
    Owner(String),
    Anonymous,
    Rejected,
}

impl Access {
    /// Pure classification; no queries. An empty identity counts as none.
    /// The synthetic anonymous user is never an admin.
    pub fn classify(identity: Option<&str>, admins: &BTreeSet<String>, allow_anonymous: bool) -> Access {
        match identity.map(str::trim).filter(|s| !s.is_empty()) {
            Some(user) if admins.contains(user) => Access::Admin(user.to_string()),
            Some(user) => Access::Owner(user.to_string()),
            None if allow_anonymous => Access::Anonymous,
            None => Access::Rejected,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Access::Admin(_) => Role::Admin,
            _ => Role::Owner,
        }
    }

    /// Name written to and matched against `created_user`.
    pub fn username(&self) -> &str {
        match self {
            Access::Admin(u) | Access::Owner(u) => u,
            Access::Anonymous => ANONYMOUS_USER,
            Access::Rejected => "",
        }
    }
}

/// Classify and turn `Rejected` into `Unauthorized`.
pub fn authorize(identity: Option<&str>, header: &FormHeader) -> Result<Access, AppError> {
    match Access::classify(identity, &header.admins, header.allow_anonymous) {
        Access::Rejected => Err(AppError::Unauthorized(
            "unable to determine logged in user; check the authentication front end".into(),
        )),
        access => Ok(access),
    }
}
