use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use bson::Document;
use bson::oid::ObjectId;

use super::{bearer_token, token};
use crate::error::ApiError;
use crate::models::USERS;
use crate::models::user::{Role, role_of};
use crate::state::AppState;

/// The authenticated caller, resolved from the session token on every request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: ObjectId,
    pub role: Role,
    pub name: String,
    pub email: String,
}

impl CurrentUser {
    pub fn from_document(doc: &Document) -> Option<Self> {
        Some(Self {
            id: doc.get_object_id("_id").ok()?,
            role: role_of(doc),
            name: doc.get_str("name").unwrap_or_default().to_string(),
            email: doc.get_str("email").unwrap_or_default().to_string(),
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fail with 403 unless the caller holds one of `roles`.
    pub fn authorize(&self, roles: &[Role]) -> Result<(), ApiError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!(
                "User role {} is not authorized to access this route",
                self.role
            )))
        }
    }

    /// Fail with 403 unless the caller owns `doc` (its `user` field) or is an
    /// admin. `action` completes "is not authorized to ...".
    pub fn ensure_owner(&self, doc: &Document, action: &str) -> Result<(), ApiError> {
        if self.is_admin() || doc.get_object_id("user").is_ok_and(|owner| owner == self.id) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!(
                "User {} is not authorized to {action}",
                self.id.to_hex()
            )))
        }
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let raw = bearer_token(&parts.headers).ok_or_else(ApiError::not_authorized)?;
        let id = token::verify(&raw, &state.config.jwt_secret).ok_or_else(ApiError::not_authorized)?;

        let user = state
            .blocking(move |store| Ok(store.find_by_id(USERS, &id)?))
            .await?;
        user.as_ref()
            .and_then(CurrentUser::from_document)
            .ok_or_else(ApiError::not_authorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn caller(role: Role) -> CurrentUser {
        CurrentUser {
            id: ObjectId::new(),
            role,
            name: "Test".into(),
            email: "test@gmail.com".into(),
        }
    }

    #[test]
    fn role_gate() {
        let user = caller(Role::User);
        assert!(user.authorize(&[Role::User, Role::Admin]).is_ok());
        let err = user.authorize(&[Role::Publisher, Role::Admin]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "User role user is not authorized to access this route"
        );
    }

    #[test]
    fn ownership() {
        let owner = caller(Role::Publisher);
        let doc = doc! { "user": owner.id };
        assert!(owner.ensure_owner(&doc, "update this bootcamp").is_ok());

        let stranger = caller(Role::Publisher);
        let err = stranger.ensure_owner(&doc, "update this bootcamp").unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        assert!(caller(Role::Admin).ensure_owner(&doc, "x").is_ok());
    }

    #[test]
    fn from_stored_user() {
        let id = ObjectId::new();
        let user = CurrentUser::from_document(&doc! {
            "_id": id, "name": "Mary", "email": "mary@gmail.com", "role": "publisher"
        })
        .unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.role, Role::Publisher);
    }
}
