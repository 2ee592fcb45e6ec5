//! Signed-in user's profile row

use crate::backend::{BackendClientTrait, StoreError};
use crate::state::models::{UserRow, UserUpdate};
use anyhow::Result;

#[derive(Debug, Clone, Default)]
pub struct UserStore {
    pub user: Option<UserRow>,
}

impl UserStore {
    pub async fn get_user(&mut self, backend: &dyn BackendClientTrait) -> Result<()> {
        let auth_user = backend.get_user().await?.ok_or(StoreError::UserNotFound)?;
        self.user = Some(backend.get_user_row(&auth_user.id).await?);
        Ok(())
    }

    /// Re-fetch the profile, then apply `update` to it
    pub async fn update_user(
        &mut self,
        backend: &dyn BackendClientTrait,
        update: UserUpdate,
    ) -> Result<()> {
        self.get_user(backend).await?;
        let user = self.user.as_mut().ok_or(StoreError::UserNotFound)?;
        backend.update_user(&user.id, update.clone()).await?;

        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(avatar) = update.avatar {
            user.avatar = avatar;
        }
        if let Some(company_id) = update.company_id {
            user.company_id = company_id;
        }
        Ok(())
    }
}
