//! Session and sign-in actions

use crate::backend::{map_auth_error, BackendClientTrait};
use crate::state::models::{AuthUser, OAuthProvider, Session};
use anyhow::Result;

#[derive(Debug, Clone, Default)]
pub struct AuthStore {
    pub session: Option<Session>,
}

impl AuthStore {
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.session.as_ref().map(|s| &s.user)
    }

    /// Refresh the session from the backend
    pub async fn fetch_session(&mut self, backend: &dyn BackendClientTrait) -> Result<()> {
        self.session = backend.get_session().await?;
        Ok(())
    }

    pub async fn login_with_password(
        &mut self,
        backend: &dyn BackendClientTrait,
        email: &str,
        password: &str,
    ) -> Result<()> {
        let session = backend
            .sign_in_with_password(email, password)
            .await
            .map_err(map_auth_error)?;
        tracing::info!(user_id = %session.user.id, "signed in");
        self.session = Some(session);
        Ok(())
    }

    /// Register an account. Returns false when the account still needs email confirmation.
    pub async fn register_with_password(
        &mut self,
        backend: &dyn BackendClientTrait,
        email: &str,
        password: &str,
    ) -> Result<bool> {
        let session = backend
            .sign_up(email, password)
            .await
            .map_err(map_auth_error)?;
        let signed_in = session.is_some();
        self.session = session;
        Ok(signed_in)
    }

    pub async fn login_with_magic_link(
        &self,
        backend: &dyn BackendClientTrait,
        email: &str,
    ) -> Result<()> {
        backend
            .sign_in_with_otp(email)
            .await
            .map_err(map_auth_error)
    }

    /// Provider authorize URL the user has to open
    pub fn login_with_oauth(
        &self,
        backend: &dyn BackendClientTrait,
        provider: OAuthProvider,
        redirect_to: Option<&str>,
    ) -> Result<String> {
        backend.oauth_url(provider, redirect_to.map(str::to_string))
    }

    pub async fn reset_password(
        &self,
        backend: &dyn BackendClientTrait,
        email: &str,
        redirect_to: Option<&str>,
    ) -> Result<()> {
        backend
            .reset_password_for_email(email, redirect_to.map(str::to_string))
            .await
            .map_err(map_auth_error)
    }

    pub async fn logout(&mut self, backend: &dyn BackendClientTrait) -> Result<()> {
        self.session = None;
        backend.sign_out().await
    }
}
