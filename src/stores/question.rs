//! Survey questions and their options

use crate::backend::BackendClientTrait;
use crate::state::models::{NewOption, NewQuestion, OptionDraft, Question, QuestionUpdate};
use anyhow::Result;

#[derive(Debug, Clone, Default)]
pub struct QuestionStore {
    pub questions: Vec<Question>,
    pub question: Option<Question>,
}

impl QuestionStore {
    /// Questions of a survey, ascending by order
    pub async fn get_questions(
        &mut self,
        backend: &dyn BackendClientTrait,
        survey_id: &str,
    ) -> Result<()> {
        self.questions = backend.list_questions(survey_id).await?;
        Ok(())
    }

    /// Append a question after the survey's last one, then insert its options
    pub async fn create_question(
        &mut self,
        backend: &dyn BackendClientTrait,
        mut question: NewQuestion,
        options: Vec<OptionDraft>,
    ) -> Result<Question> {
        self.get_questions(backend, &question.survey_id).await?;
        if let Some(last) = self.questions.iter().map(|q| q.order).max() {
            question.order = last + 1;
        }

        let created = backend.create_question(question).await?;
        tracing::debug!(question_id = %created.id, order = created.order, "question created");

        if !options.is_empty() {
            let options = options
                .into_iter()
                .map(|draft| NewOption {
                    question_id: created.id.clone(),
                    option_text: draft.option_text,
                    order: draft.order,
                })
                .collect();
            backend.create_options(options).await?;
        }

        self.questions.push(created.clone());
        self.question = Some(created.clone());
        Ok(created)
    }

    pub async fn update_question_order(
        &mut self,
        backend: &dyn BackendClientTrait,
        question_id: &str,
        order: i32,
    ) -> Result<()> {
        let updated = backend
            .update_question(
                question_id,
                QuestionUpdate {
                    order: Some(order),
                    ..Default::default()
                },
            )
            .await?;

        if let Some(existing) = self.questions.iter_mut().find(|q| q.id == updated.id) {
            existing.order = updated.order;
        }
        self.questions.sort_by_key(|q| q.order);
        self.question = Some(updated);
        Ok(())
    }

    pub async fn delete_question(
        &mut self,
        backend: &dyn BackendClientTrait,
        question_id: &str,
    ) -> Result<()> {
        backend.delete_question(question_id).await?;
        self.questions.retain(|q| q.id != question_id);
        Ok(())
    }
}
