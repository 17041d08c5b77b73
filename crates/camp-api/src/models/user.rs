use std::fmt;

use bson::{Bson, Document, doc};
use serde::{Deserialize, Serialize};

use super::{Mode, is_email, require_text};
use crate::auth::password::hash_password;
use crate::error::ApiError;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Fields never returned to clients and never usable in a listing query.
pub const HIDDEN: &[&str] = &["password", "resetPasswordToken", "resetPasswordExpire"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Publisher,
    Admin,
}

impl Role {
    pub const SELF_SERVICE: &'static [Role] = &[Role::User, Role::Publisher];
    pub const ALL: &'static [Role] = &[Role::User, Role::Publisher, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Publisher => "publisher",
            Role::Admin => "admin",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "user" => Some(Role::User),
            "publisher" => Some(Role::Publisher),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

impl UserInput {
    /// `roles` lists the roles this caller may assign.
    pub fn validate(&self, mode: Mode, roles: &[Role]) -> Vec<String> {
        let mut errors = Vec::new();
        require_text(&mut errors, self.name.as_deref(), mode, "Please add a name");
        require_text(&mut errors, self.email.as_deref(), mode, "Please add an email");
        if let Some(email) = self.email.as_deref().map(str::trim) {
            if !email.is_empty() && !is_email(email) {
                errors.push("Please add a valid email".into());
            }
        }

        match self.password.as_deref() {
            None if mode == Mode::Create => errors.push("Please add a password".into()),
            Some(p) if p.chars().count() < MIN_PASSWORD_LEN => errors.push(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )),
            _ => {}
        }

        if let Some(raw) = self.role.as_deref() {
            match Role::parse(raw) {
                Some(role) if roles.contains(&role) => {}
                Some(role) => errors.push(format!("Role {role} cannot be assigned")),
                None => errors.push(format!("`{raw}` is not a valid role")),
            }
        }
        errors
    }

    /// Fields to store. The password, when present, is hashed.
    pub fn into_fields(self) -> Result<Document, ApiError> {
        let mut out = Document::new();
        if let Some(name) = self.name {
            out.insert("name", name.trim());
        }
        if let Some(email) = self.email {
            out.insert("email", email.trim());
        }
        if let Some(password) = self.password {
            out.insert("password", hash_password(&password)?);
        }
        if let Some(role) = self.role {
            out.insert("role", role);
        }
        Ok(out)
    }
}

/// A new user document with defaults applied.
pub fn new_document(fields: Document) -> Document {
    let mut out = doc! {
        "role": Role::User.as_str(),
        "createdAt": bson::DateTime::now(),
    };
    for (key, value) in fields {
        out.insert(key, value);
    }
    out
}

/// Strip hidden fields before a user leaves the service.
pub fn public(mut doc: Document) -> Document {
    for field in HIDDEN {
        doc.remove(*field);
    }
    doc
}

pub fn role_of(doc: &Document) -> Role {
    match doc.get("role") {
        Some(Bson::String(s)) => Role::parse(s).unwrap_or(Role::User),
        _ => Role::User,
    }
}
