//! Company invites: shareable tokens and e-mail invitations

use super::company::CompanyStore;
use crate::backend::{BackendClientTrait, StoreError};
use crate::state::models::{
    CompanyDetail, InviteEmail, InviteToken, InviteWithCompany, NewInviteEmail, NewInviteToken,
    UserUpdate,
};
use anyhow::Result;
use rand::distributions::Alphanumeric;
use rand::Rng;

pub const INVITE_TOKEN_LEN: usize = 32;

/// Random alphanumeric invite token
pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(INVITE_TOKEN_LEN)
        .map(char::from)
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct InviteStore {
    pub invite_token: Option<InviteToken>,
    pub invite: Option<InviteWithCompany>,
    pub invite_email: Option<InviteEmail>,
}

impl InviteStore {
    /// Reuse the company's first token, or create one
    pub async fn get_invite_token(
        &mut self,
        backend: &dyn BackendClientTrait,
        company: Option<&CompanyDetail>,
    ) -> Result<&InviteToken> {
        let company_id = company
            .map(|c| c.company.id.clone())
            .ok_or(StoreError::CompanyNotFound)?;

        let existing = backend
            .list_invite_tokens(&company_id)
            .await?
            .into_iter()
            .next();

        let token = match existing {
            Some(token) => token,
            None => {
                let created = backend
                    .create_invite_token(NewInviteToken {
                        company_id,
                        token: generate_token(),
                    })
                    .await?;
                tracing::info!(company_id = %created.company_id, "invite token created");
                created
            }
        };
        Ok(&*self.invite_token.insert(token))
    }

    /// Look up an invite and the company it grants access to
    pub async fn get_invite_by_token(
        &mut self,
        backend: &dyn BackendClientTrait,
        token: &str,
    ) -> Result<&InviteWithCompany> {
        let invite = backend.get_invite_by_token(token).await?;
        Ok(&*self.invite.insert(invite))
    }

    /// Attach the signed-in user to the invite's company, then reload it
    pub async fn accept_invite(
        &mut self,
        backend: &dyn BackendClientTrait,
        token: &str,
        company: &mut CompanyStore,
    ) -> Result<()> {
        let company_id = self
            .get_invite_by_token(backend, token)
            .await?
            .invite
            .company_id
            .clone();

        let user = backend.get_user().await?.ok_or(StoreError::UserNotFound)?;
        backend
            .update_user(
                &user.id,
                UserUpdate {
                    company_id: Some(Some(company_id.clone())),
                    ..Default::default()
                },
            )
            .await?;
        tracing::info!(user_id = %user.id, %company_id, "invite accepted");

        company.get_company(backend).await?;
        Ok(())
    }

    pub async fn invite_by_email(
        &mut self,
        backend: &dyn BackendClientTrait,
        invite: NewInviteEmail,
    ) -> Result<InviteEmail> {
        let created = backend.create_invite_email(invite).await?;
        self.invite_email = Some(created.clone());
        Ok(created)
    }
}
