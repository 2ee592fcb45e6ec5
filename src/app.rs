//! Application state and core logic

use crate::backend::{BackendClient, BackendClientTrait};
use crate::config::{AppConfig, LocalState};
use crate::router::{Decision, Location, NavigationError};
use crate::state::models::{
    NewCompany, NewRespondent, NewResponse, OAuthProvider, Response, ResponseStatus,
};
use crate::state::{AppState, FormResponse};
use anyhow::Result;
use std::path::PathBuf;

/// Main application struct
pub struct App {
    /// Current application state
    pub state: AppState,
    /// Backend client for REST and auth calls
    backend: Box<dyn BackendClientTrait>,
    config: AppConfig,
    /// Pending invite slot and session kept between runs
    local: LocalState,
    /// Where `local` is written; `None` keeps it in memory only
    local_path: Option<PathBuf>,
}

impl App {
    /// Create an App talking to the configured backend, restoring local state
    pub fn new(config: AppConfig) -> Result<Self> {
        let local_path = LocalState::state_path();
        let local = match &local_path {
            Some(path) => LocalState::load_from(path)?,
            None => LocalState::default(),
        };
        let backend = BackendClient::new(config.backend_url()?, config.api_key()?)?
            .with_session(local.session.clone());

        Ok(Self::with_backend(
            Box::new(backend),
            config,
            local,
            local_path,
        ))
    }

    pub fn with_backend(
        backend: Box<dyn BackendClientTrait>,
        config: AppConfig,
        local: LocalState,
        local_path: Option<PathBuf>,
    ) -> Self {
        Self {
            state: AppState::default(),
            backend,
            config,
            local,
            local_path,
        }
    }

    pub fn backend(&self) -> &dyn BackendClientTrait {
        self.backend.as_ref()
    }

    pub fn pending_invite(&self) -> Option<&str> {
        self.local.pending_invite_token.as_deref()
    }

    pub fn location(&self) -> Option<&Location> {
        self.state.location()
    }

    /// Write the invite slot and the current session to disk
    fn persist(&mut self) -> Result<()> {
        self.local.session = self.state.auth.session.clone();
        if let Some(path) = &self.local_path {
            self.local.save_to(path)?;
        }
        Ok(())
    }

    /// Navigate to `path` through the guard and record the outcome
    pub async fn navigate(&mut self, path: &str) -> Result<Decision> {
        let decision = self
            .state
            .router
            .navigate(
                self.backend.as_ref(),
                &mut self.state.auth,
                &mut self.state.company,
                &mut self.local.pending_invite_token,
                path,
            )
            .await;

        match &decision {
            Decision::Fail(reason) => self.state.push_error(reason.clone()),
            _ => self.state.clear_error(),
        }
        self.persist()?;
        Ok(decision)
    }

    /// Navigate ahead of a guarded action. Anything but `Allow` is an error
    pub async fn enter(&mut self, path: &str) -> Result<()> {
        match NavigationError::from_decision(self.navigate(path).await?) {
            None => Ok(()),
            Some(err) => Err(err.into()),
        }
    }

    /// Go back to previous location
    pub fn go_back(&mut self) -> Option<&Location> {
        self.state.router.go_back()
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<()> {
        self.state
            .auth
            .login_with_password(self.backend.as_ref(), email, password)
            .await?;
        self.persist()
    }

    /// Returns false when the new account still has to confirm its e-mail
    pub async fn register(&mut self, email: &str, password: &str) -> Result<bool> {
        let signed_in = self
            .state
            .auth
            .register_with_password(self.backend.as_ref(), email, password)
            .await?;
        self.persist()?;
        Ok(signed_in)
    }

    pub async fn send_magic_link(&self, email: &str) -> Result<()> {
        self.state
            .auth
            .login_with_magic_link(self.backend.as_ref(), email)
            .await
    }

    pub fn oauth_url(&self, provider: OAuthProvider) -> Result<String> {
        self.state.auth.login_with_oauth(
            self.backend.as_ref(),
            provider,
            self.config.redirect_url.as_deref(),
        )
    }

    pub async fn reset_password(&self, email: &str) -> Result<()> {
        self.state
            .auth
            .reset_password(
                self.backend.as_ref(),
                email,
                self.config.redirect_url.as_deref(),
            )
            .await
    }

    pub async fn logout(&mut self) -> Result<()> {
        let result = self.state.auth.logout(self.backend.as_ref()).await;
        self.state.company.company = None;
        self.persist()?;
        result
    }

    /// Onboarding: create the company and attach the signed-in user
    pub async fn register_business(&mut self, company: NewCompany) -> Result<()> {
        self.state
            .company
            .create_company(self.backend.as_ref(), company)
            .await
    }

    /// Token of the company's shareable invite link
    pub async fn invite_token(&mut self) -> Result<String> {
        let invite = self
            .state
            .invites
            .get_invite_token(self.backend.as_ref(), self.state.company.company.as_ref())
            .await?;
        Ok(invite.token.clone())
    }

    pub async fn accept_invite(&mut self, token: &str) -> Result<()> {
        self.state
            .invites
            .accept_invite(self.backend.as_ref(), token, &mut self.state.company)
            .await
    }

    /// Load everything the surveys overview shows
    pub async fn load_overview(&mut self) -> Result<()> {
        let backend = self.backend.as_ref();
        let company = self.state.company.company.as_ref();
        let surveys = &mut self.state.surveys;

        surveys.get_recent_surveys(backend, company).await?;
        surveys.get_surveys_count(backend, company).await?;
        surveys.get_published_surveys_count(backend, company).await?;
        surveys.get_unpublished_surveys_count(backend, company).await?;
        self.state.responses.get_recent_responses(backend).await?;
        self.state.responses.get_responses_count(backend).await?;
        Ok(())
    }

    /// Register the respondent and open a pending response for them
    pub async fn start_interview(
        &mut self,
        survey_id: &str,
        respondent: NewRespondent,
    ) -> Result<Response> {
        let backend = self.backend.as_ref();
        let respondent = self
            .state
            .respondents
            .create_respondent(backend, respondent)
            .await?;
        self.state
            .responses
            .create_response(
                backend,
                NewResponse {
                    survey_id: survey_id.to_string(),
                    respondent_id: respondent.id,
                    status: ResponseStatus::Pending,
                },
            )
            .await
    }

    /// Load a survey and an empty answer form for it
    pub async fn open_form(&mut self, survey_id: &str) -> Result<FormResponse> {
        self.state
            .surveys
            .get_survey(self.backend.as_ref(), survey_id)
            .await?;
        Ok(self
            .state
            .surveys
            .survey
            .as_ref()
            .map(FormResponse::for_survey)
            .unwrap_or_default())
    }

    pub async fn submit_response(&mut self, response_id: &str, form: &FormResponse) -> Result<()> {
        self.state
            .answers
            .submit(self.backend.as_ref(), response_id, form)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackendClientTrait;
    use crate::router::RouteName;
    use crate::router::Params;
    use crate::stores::fixtures::{auth_user, company_detail, session};
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn app(backend: MockBackendClientTrait, local_path: Option<PathBuf>) -> App {
        App::with_backend(
            Box::new(backend),
            AppConfig {
                redirect_url: Some("http://localhost:5173".to_string()),
                ..Default::default()
            },
            LocalState::default(),
            local_path,
        )
    }

    #[tokio::test]
    async fn test_invite_link_survives_restart() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        let mut backend = MockBackendClientTrait::new();
        backend.expect_get_session().returning(|| Ok(None));
        let mut first = app(backend, Some(path.clone()));
        first.navigate("/start/invite/abc123").await.unwrap();
        assert_eq!(first.location().map(|l| l.name), Some(RouteName::Login));

        let restored = LocalState::load_from(&path).unwrap();
        assert_eq!(restored.pending_invite_token.as_deref(), Some("abc123"));

        let mut backend = MockBackendClientTrait::new();
        backend
            .expect_get_session()
            .returning(|| Ok(Some(session("u1"))));
        let mut second = App::with_backend(
            Box::new(backend),
            AppConfig::default(),
            restored,
            Some(path.clone()),
        );
        second.navigate("/surveys").await.unwrap();

        assert_eq!(second.location().map(|l| l.name), Some(RouteName::Invite));
        assert_eq!(second.pending_invite(), None);
        assert_eq!(LocalState::load_from(&path).unwrap().pending_invite_token, None);
    }

    #[tokio::test]
    async fn test_failed_navigation_records_error() {
        let mut backend = MockBackendClientTrait::new();
        backend
            .expect_get_session()
            .returning(|| Err(anyhow::anyhow!("offline")));

        let mut app = app(backend, None);
        let decision = app.navigate("/surveys").await.unwrap();
        assert_eq!(decision, Decision::Fail("offline".to_string()));
        assert_eq!(app.state.last_error.as_deref(), Some("offline"));
        assert!(app.location().is_none());
    }

    #[tokio::test]
    async fn test_login_persists_session() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        let mut backend = MockBackendClientTrait::new();
        backend
            .expect_sign_in_with_password()
            .returning(|_, _| Ok(session("u1")));
        let mut app = app(backend, Some(path.clone()));
        app.login("u1@example.com", "secret").await.unwrap();

        let stored = LocalState::load_from(&path).unwrap();
        assert_eq!(stored.session.map(|s| s.user.id), Some("u1".to_string()));
    }

    #[test]
    fn test_oauth_uses_configured_redirect() {
        let mut backend = MockBackendClientTrait::new();
        backend
            .expect_oauth_url()
            .withf(|provider, redirect| {
                *provider == OAuthProvider::Google
                    && redirect.as_deref() == Some("http://localhost:5173")
            })
            .returning(|_, _| Ok("https://auth.example/authorize".to_string()));

        let app = app(backend, None);
        assert_eq!(
            app.oauth_url(OAuthProvider::Google).unwrap(),
            "https://auth.example/authorize"
        );
    }

    #[tokio::test]
    async fn test_start_interview_opens_pending_response() {
        let mut backend = MockBackendClientTrait::new();
        backend.expect_create_respondent().returning(|new| {
            Ok(crate::state::models::Respondent {
                id: "p1".to_string(),
                first_name: new.first_name,
                last_name: new.last_name,
                address: new.address,
                complement: None,
                lat: 0.0,
                lng: 0.0,
            })
        });
        backend
            .expect_create_response()
            .withf(|new| new.respondent_id == "p1" && new.status == ResponseStatus::Pending)
            .returning(|new| {
                Ok(Response {
                    id: "r1".to_string(),
                    survey_id: new.survey_id,
                    respondent_id: new.respondent_id,
                    status: Some(new.status),
                    created_at: Utc::now(),
                })
            });

        let mut app = app(backend, None);
        let response = app
            .start_interview("s1", NewRespondent::default())
            .await
            .unwrap();
        assert_eq!(response.survey_id, "s1");
    }

    #[test]
    fn test_load_overview_requires_company() {
        let backend = MockBackendClientTrait::new();
        let mut app = app(backend, None);
        let result = tokio_test::block_on(app.load_overview());
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_accept_invite_loads_company() {
        let mut backend = MockBackendClientTrait::new();
        backend.expect_get_invite_by_token().returning(|t| {
            Ok(crate::state::models::InviteWithCompany {
                invite: crate::state::models::InviteToken {
                    id: 1,
                    company_id: "c1".to_string(),
                    token: t.to_string(),
                    created_at: None,
                },
                companies: None,
            })
        });
        backend
            .expect_get_user()
            .returning(|| Ok(Some(auth_user("u1"))));
        backend.expect_update_user().returning(|_, _| Ok(()));
        backend
            .expect_get_user_company_id()
            .returning(|_| Ok(Some("c1".to_string())));
        backend
            .expect_get_company()
            .returning(|id| Ok(company_detail(id)));

        let mut app = app(backend, None);
        app.accept_invite("abc123").await.unwrap();
        assert_eq!(app.state.company.company_id(), Some("c1"));
    }

    #[tokio::test]
    async fn test_enter_allows_reached_location() {
        let mut backend = MockBackendClientTrait::new();
        backend
            .expect_get_session()
            .returning(|| Ok(Some(session("u1"))));

        let mut app = app(backend, None);
        app.enter("/start").await.unwrap();
        assert_eq!(app.location().map(|l| l.name), Some(RouteName::RegisterBusiness));
    }

    #[tokio::test]
    async fn test_enter_stops_at_sign_in_redirect() {
        let mut backend = MockBackendClientTrait::new();
        backend.expect_get_session().returning(|| Ok(None));
        backend.expect_get_user_company_id().never();

        let mut app = app(backend, None);
        let err = app.enter("/surveys").await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<NavigationError>(),
            Some(&NavigationError::Redirected(Location::new(RouteName::Login)))
        );
        assert_eq!(err.to_string(), "redirected to login (/auth/login)");
    }

    #[tokio::test]
    async fn test_enter_stops_at_invite_redirect() {
        let mut backend = MockBackendClientTrait::new();
        backend
            .expect_get_session()
            .returning(|| Ok(Some(session("u1"))));
        backend.expect_get_user_company_id().never();

        let mut app = App::with_backend(
            Box::new(backend),
            AppConfig::default(),
            LocalState {
                pending_invite_token: Some("abc123".to_string()),
                ..Default::default()
            },
            None,
        );
        let err = app.enter("/surveys").await.unwrap_err();

        let mut params = Params::new();
        params.insert("token".to_string(), "abc123".to_string());
        assert_eq!(
            err.downcast_ref::<NavigationError>(),
            Some(&NavigationError::Redirected(Location::with_params(
                RouteName::Invite,
                params
            )))
        );
        assert_eq!(app.pending_invite(), None);
    }

    #[tokio::test]
    async fn test_enter_reports_guard_failure() {
        let mut backend = MockBackendClientTrait::new();
        backend
            .expect_get_session()
            .returning(|| Err(anyhow::anyhow!("offline")));

        let mut app = app(backend, None);
        let err = app.enter("/settings").await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<NavigationError>(),
            Some(&NavigationError::Failed("offline".to_string()))
        );
    }

    #[tokio::test]
    async fn test_revoked_session_is_forgotten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        let mut backend = MockBackendClientTrait::new();
        backend.expect_get_session().returning(|| Ok(None));
        let mut app = App::with_backend(
            Box::new(backend),
            AppConfig::default(),
            LocalState {
                session: Some(session("u1")),
                ..Default::default()
            },
            Some(path.clone()),
        );

        assert_eq!(app.navigate("/auth/login").await.unwrap(), Decision::Allow);
        assert_eq!(LocalState::load_from(&path).unwrap().session, None);
    }
}
