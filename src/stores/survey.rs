//! Company surveys: listing, counters, creation and status changes

use crate::backend::{BackendClientTrait, StoreError};
use crate::state::models::{
    CompanyDetail, NewSurvey, Survey, SurveyDetail, SurveySummary, SurveyUpdate,
};
use anyhow::Result;
use chrono::Utc;

/// Number of surveys shown on the dashboard
pub const RECENT_SURVEYS: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct SurveyStore {
    pub survey: Option<SurveyDetail>,
    pub surveys: Vec<SurveySummary>,
    pub created_count: Option<u64>,
    pub published_count: Option<u64>,
    pub unpublished_count: Option<u64>,
}

fn require_company(company: Option<&CompanyDetail>) -> Result<&str> {
    Ok(company
        .map(|c| c.company.id.as_str())
        .ok_or(StoreError::CompanyNotFound)?)
}

impl SurveyStore {
    /// Load a survey with its status and questions in display order
    pub async fn get_survey(&mut self, backend: &dyn BackendClientTrait, id: &str) -> Result<()> {
        let mut survey = backend.get_survey(id).await?;
        survey.sort_questions();
        self.survey = Some(survey);
        Ok(())
    }

    pub async fn get_surveys(
        &mut self,
        backend: &dyn BackendClientTrait,
        company: Option<&CompanyDetail>,
    ) -> Result<()> {
        let company_id = require_company(company)?;
        self.surveys = backend.list_surveys(company_id, None).await?;
        Ok(())
    }

    pub async fn get_recent_surveys(
        &mut self,
        backend: &dyn BackendClientTrait,
        company: Option<&CompanyDetail>,
    ) -> Result<()> {
        let company_id = require_company(company)?;
        self.surveys = backend
            .list_surveys(company_id, Some(RECENT_SURVEYS))
            .await?;
        Ok(())
    }

    pub async fn get_surveys_count(
        &mut self,
        backend: &dyn BackendClientTrait,
        company: Option<&CompanyDetail>,
    ) -> Result<()> {
        let company_id = require_company(company)?;
        self.created_count = Some(backend.count_surveys(company_id, None).await?);
        Ok(())
    }

    pub async fn get_published_surveys_count(
        &mut self,
        backend: &dyn BackendClientTrait,
        company: Option<&CompanyDetail>,
    ) -> Result<()> {
        let company_id = require_company(company)?;
        self.published_count = Some(backend.count_surveys(company_id, Some(true)).await?);
        Ok(())
    }

    pub async fn get_unpublished_surveys_count(
        &mut self,
        backend: &dyn BackendClientTrait,
        company: Option<&CompanyDetail>,
    ) -> Result<()> {
        let company_id = require_company(company)?;
        self.unpublished_count = Some(backend.count_surveys(company_id, Some(false)).await?);
        Ok(())
    }

    pub async fn create_survey(
        &mut self,
        backend: &dyn BackendClientTrait,
        survey: NewSurvey,
    ) -> Result<Survey> {
        let created = backend.create_survey(survey).await?;
        tracing::info!(survey_id = %created.id, "survey created");
        self.survey = Some(SurveyDetail {
            survey: created.clone(),
            survey_status: None,
            questions: Vec::new(),
        });
        Ok(created)
    }

    /// Change a survey. The status is mandatory; moving to the published
    /// status marks the survey as published for good.
    pub async fn update_survey(
        &mut self,
        backend: &dyn BackendClientTrait,
        survey_id: &str,
        mut update: SurveyUpdate,
    ) -> Result<Survey> {
        let status_id = update
            .survey_status_id
            .clone()
            .ok_or(StoreError::SurveyStatusUndefined)?;

        let status = backend.get_survey_status(&status_id).await?;
        if status.is_published() {
            update.has_published = Some(true);
        }
        update.updated_at = Some(Utc::now());

        let updated = backend.update_survey(survey_id, update).await?;

        match self.survey.as_mut() {
            Some(current) if current.survey.id == updated.id => {
                current.survey = updated.clone();
                current.survey_status = Some(status);
            }
            _ => {
                self.survey = Some(SurveyDetail {
                    survey: updated.clone(),
                    survey_status: Some(status),
                    questions: Vec::new(),
                });
            }
        }
        Ok(updated)
    }
}
