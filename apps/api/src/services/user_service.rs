//! User service.
//!
//! Two surfaces over the same table:
//! - the users collection, admin only, addressed by username
//! - `me`, the caller's own profile, where `role` is read-only

use std::sync::Arc;

use tracing::info;
use yamdb_core::validation::{validate_email, validate_profile_fields, validate_username};
use yamdb_core::{authorize, Action, Actor, NewUser, Resource, User, UserPatch, UserView};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// User service implementation.
pub struct UserService {
    state: Arc<AppState>,
}

impl UserService {
    pub fn new(state: Arc<AppState>) -> Self {
        UserService { state }
    }

    pub async fn list(&self, actor: &Actor, search: Option<&str>) -> ApiResult<Vec<UserView>> {
        authorize(actor, Action::List, &Resource::OtherUserAccount)?;

        let users = self.state.db.users().list(search).await?;
        Ok(users.iter().map(UserView::from).collect())
    }

    pub async fn create(&self, actor: &Actor, new_user: NewUser) -> ApiResult<UserView> {
        authorize(actor, Action::Create, &Resource::OtherUserAccount)?;

        validate_username(&new_user.username)?;
        validate_email(&new_user.email)?;
        validate_profile_fields(&new_user.first_name, &new_user.last_name, &new_user.bio)?;

        let user = self.state.db.users().insert(&new_user).await?;

        info!(user_id = %user.id, username = %user.username, role = %user.role, "User created");
        Ok(UserView::from(&user))
    }

    pub async fn retrieve(&self, actor: &Actor, username: &str) -> ApiResult<UserView> {
        authorize(actor, Action::Retrieve, &Resource::OtherUserAccount)?;

        let user = self.find(username).await?;
        Ok(UserView::from(&user))
    }

    /// Admin edit. Unlike [`update_me`](Self::update_me), this may change
    /// the role.
    pub async fn partial_update(&self, actor: &Actor, username: &str, patch: UserPatch) -> ApiResult<UserView> {
        authorize(actor, Action::PartialUpdate, &Resource::OtherUserAccount)?;

        let user = self.find(username).await?;
        validate_patch(&user, &patch)?;

        let updated = self.state.db.users().update(user.id, &patch).await?;

        if updated.role != user.role {
            info!(user_id = %user.id, from = %user.role, to = %updated.role, "Role changed");
        }
        Ok(UserView::from(&updated))
    }

    /// Deletes the account together with its reviews and comments.
    pub async fn destroy(&self, actor: &Actor, username: &str) -> ApiResult<()> {
        authorize(actor, Action::Destroy, &Resource::OtherUserAccount)?;

        let user = self.find(username).await?;
        self.state.db.users().delete(user.id).await?;

        info!(user_id = %user.id, username = %user.username, "User deleted");
        Ok(())
    }

    pub async fn me(&self, actor: &Actor) -> ApiResult<UserView> {
        authorize(actor, Action::Retrieve, &Resource::UserProfile)?;

        let user = self.current(actor).await?;
        Ok(UserView::from(&user))
    }

    /// Self-service edit. A submitted `role` is ignored.
    pub async fn update_me(&self, actor: &Actor, mut patch: UserPatch) -> ApiResult<UserView> {
        authorize(actor, Action::PartialUpdate, &Resource::UserProfile)?;

        patch.role = None;

        let user = self.current(actor).await?;
        validate_patch(&user, &patch)?;

        let updated = self.state.db.users().update(user.id, &patch).await?;
        Ok(UserView::from(&updated))
    }

    async fn find(&self, username: &str) -> ApiResult<User> {
        self.state
            .db
            .users()
            .get_by_username(username)
            .await?
            .ok_or_else(|| ApiError::not_found("User", username))
    }

    async fn current(&self, actor: &Actor) -> ApiResult<User> {
        let id = actor
            .user_id()
            .ok_or_else(|| ApiError::unauthenticated("Authentication required"))?;

        self.state
            .db
            .users()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::unauthenticated("User not found"))
    }
}

/// Validates the fields a patch sets, against the values it would leave.
fn validate_patch(user: &User, patch: &UserPatch) -> ApiResult<()> {
    if let Some(username) = &patch.username {
        validate_username(username)?;
    }
    if let Some(email) = &patch.email {
        validate_email(email)?;
    }
    validate_profile_fields(
        patch.first_name.as_deref().unwrap_or(&user.first_name),
        patch.last_name.as_deref().unwrap_or(&user.last_name),
        patch.bio.as_deref().unwrap_or(&user.bio),
    )?;
    Ok(())
}
