//! Respondents and their responses to surveys

use crate::backend::{BackendClientTrait, ResponseFilter};
use crate::state::models::{
    NewRespondent, NewResponse, Respondent, Response, ResponseDetail, ResponseStatus,
};
use anyhow::Result;

/// Number of responses shown on the dashboard
pub const RECENT_RESPONSES: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct RespondentStore {
    pub respondent: Option<Respondent>,
}

impl RespondentStore {
    pub async fn create_respondent(
        &mut self,
        backend: &dyn BackendClientTrait,
        respondent: NewRespondent,
    ) -> Result<Respondent> {
        let created = backend.create_respondent(respondent).await?;
        self.respondent = Some(created.clone());
        Ok(created)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResponseStore {
    pub responses: Vec<ResponseDetail>,
    pub response: Option<Response>,
    pub responses_count: Option<u64>,
}

impl ResponseStore {
    async fn load(&mut self, backend: &dyn BackendClientTrait, filter: ResponseFilter) -> Result<()> {
        tracing::debug!(?filter, "loading responses");
        self.responses = backend.list_responses(filter).await?;
        Ok(())
    }

    /// Every completed response
    pub async fn get_responses(&mut self, backend: &dyn BackendClientTrait) -> Result<()> {
        self.load(
            backend,
            ResponseFilter {
                status: Some(ResponseStatus::Completed),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn get_recent_responses(&mut self, backend: &dyn BackendClientTrait) -> Result<()> {
        self.load(
            backend,
            ResponseFilter {
                status: Some(ResponseStatus::Completed),
                newest_first: true,
                limit: Some(RECENT_RESPONSES),
                ..Default::default()
            },
        )
        .await
    }

    /// Interviews started for a survey but not yet answered, newest first
    pub async fn get_pending_responses_by_survey(
        &mut self,
        backend: &dyn BackendClientTrait,
        survey_id: &str,
    ) -> Result<()> {
        self.load(
            backend,
            ResponseFilter {
                status: Some(ResponseStatus::Pending),
                survey_id: Some(survey_id.to_string()),
                newest_first: true,
                limit: None,
            },
        )
        .await
    }

    pub async fn get_responses_by_survey(
        &mut self,
        backend: &dyn BackendClientTrait,
        survey_id: &str,
    ) -> Result<()> {
        self.load(
            backend,
            ResponseFilter {
                status: Some(ResponseStatus::Completed),
                survey_id: Some(survey_id.to_string()),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn get_responses_count(&mut self, backend: &dyn BackendClientTrait) -> Result<()> {
        self.responses_count = Some(backend.count_responses(ResponseStatus::Completed).await?);
        Ok(())
    }

    pub async fn create_response(
        &mut self,
        backend: &dyn BackendClientTrait,
        response: NewResponse,
    ) -> Result<Response> {
        let created = backend.create_response(response).await?;
        tracing::info!(response_id = %created.id, "response started");
        self.response = Some(created.clone());
        Ok(created)
    }
}
