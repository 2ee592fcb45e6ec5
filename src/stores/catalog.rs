//! Reference lists: survey statuses and question types

use crate::backend::BackendClientTrait;
use crate::state::models::{QuestionType, SurveyStatus};
use anyhow::Result;

#[derive(Debug, Clone, Default)]
pub struct SurveyStatusStore {
    pub statuses: Vec<SurveyStatus>,
}

impl SurveyStatusStore {
    pub async fn get_statuses(&mut self, backend: &dyn BackendClientTrait) -> Result<()> {
        self.statuses = backend.list_survey_statuses().await?;
        Ok(())
    }

    pub fn by_slug(&self, slug: &str) -> Option<&SurveyStatus> {
        self.statuses.iter().find(|s| s.slug == slug)
    }
}

#[derive(Debug, Clone, Default)]
pub struct QuestionTypeStore {
    pub types: Vec<QuestionType>,
}

impl QuestionTypeStore {
    pub async fn get_types(&mut self, backend: &dyn BackendClientTrait) -> Result<()> {
        self.types = backend.list_question_types().await?;
        Ok(())
    }

    pub fn by_slug(&self, slug: &str) -> Option<&QuestionType> {
        self.types.iter().find(|t| t.slug == slug)
    }
}
