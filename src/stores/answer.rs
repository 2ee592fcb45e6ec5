//! Answer persistence for a respondent's submission

use crate::backend::{BackendClientTrait, StoreError};
use crate::state::forms::{normalize, AnswerRecord, FormResponse};
use crate::state::models::{Answer, NewAnswerOption, ResponseStatus};
use anyhow::Result;

#[derive(Debug, Clone, Default)]
pub struct AnswerStore {
    pub answers: Vec<Answer>,
}

impl AnswerStore {
    /// Insert every answer with its chosen options, in order, then mark the
    /// response completed. Stops at the first failure.
    pub async fn create_answers(
        &mut self,
        backend: &dyn BackendClientTrait,
        response_id: &str,
        records: Vec<AnswerRecord>,
    ) -> Result<()> {
        if records.is_empty() {
            return Err(StoreError::EmptySubmission.into());
        }

        self.answers.clear();
        for record in records {
            let answer = backend.create_answer(record.to_new_answer()).await?;

            if !record.selected_option_ids.is_empty() {
                let options = record
                    .selected_option_ids
                    .into_iter()
                    .map(|question_option_id| NewAnswerOption {
                        answer_id: answer.id.clone(),
                        question_option_id,
                    })
                    .collect();
                backend.create_answer_options(options).await?;
            }
            self.answers.push(answer);
        }

        backend
            .set_response_status(response_id, ResponseStatus::Completed)
            .await?;
        tracing::info!(response_id, answers = self.answers.len(), "response completed");
        Ok(())
    }

    /// Check required questions, normalize the form and persist it
    pub async fn submit(
        &mut self,
        backend: &dyn BackendClientTrait,
        response_id: &str,
        form: &FormResponse,
    ) -> Result<()> {
        let missing = form.missing_required();
        if !missing.is_empty() {
            return Err(StoreError::MissingRequiredAnswers(missing).into());
        }

        let records = normalize(form, response_id);
        self.create_answers(backend, response_id, records).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackendClientTrait;
    use crate::state::forms::QuestionEntry;
    use mockall::Sequence;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn answer(id: &str, question_id: &str) -> Answer {
        Answer {
            id: id.to_string(),
            question_id: question_id.to_string(),
            response_id: "r1".to_string(),
            answer: None,
        }
    }

    fn sample_form() -> FormResponse {
        let mut form = FormResponse::default();
        let multi = form.entry_mut("q1");
        multi.required = true;
        multi.toggle_option("o1");
        multi.toggle_option("o2");
        form.entry_mut("q2").set_text("Fine");
        form
    }

    #[tokio::test]
    async fn test_submit_persists_in_order_then_completes() {
        let mut backend = MockBackendClientTrait::new();
        let mut seq = Sequence::new();

        backend
            .expect_create_answer()
            .withf(|a| a.question_id == "q1" && a.answer.is_none())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|a| Ok(answer("a1", &a.question_id)));
        backend
            .expect_create_answer_options()
            .withf(|options| {
                options
                    == &vec![
                        NewAnswerOption {
                            answer_id: "a1".to_string(),
                            question_option_id: "o1".to_string(),
                        },
                        NewAnswerOption {
                            answer_id: "a1".to_string(),
                            question_option_id: "o2".to_string(),
                        },
                    ]
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![]));
        backend
            .expect_create_answer()
            .withf(|a| a.question_id == "q2" && a.answer.as_deref() == Some("Fine"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|a| Ok(answer("a2", &a.question_id)));
        backend
            .expect_set_response_status()
            .withf(|id, status| id == "r1" && *status == ResponseStatus::Completed)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let mut store = AnswerStore::default();
        store.submit(&backend, "r1", &sample_form()).await.unwrap();
        assert_eq!(store.answers.len(), 2);
    }

    #[tokio::test]
    async fn test_submit_rejects_missing_required() {
        let mut backend = MockBackendClientTrait::new();
        backend.expect_create_answer().never();
        backend.expect_set_response_status().never();

        let mut form = FormResponse::default();
        form.entries.push(QuestionEntry::new("q1", "text", true));
        form.entry_mut("q2").set_text("optional");

        let mut store = AnswerStore::default();
        let err = store.submit(&backend, "r1", &form).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<StoreError>(),
            Some(&StoreError::MissingRequiredAnswers(vec!["q1".to_string()]))
        );
    }

    #[tokio::test]
    async fn test_empty_submission_is_refused() {
        let backend = MockBackendClientTrait::new();
        let mut store = AnswerStore::default();
        let err = store
            .submit(&backend, "r1", &FormResponse::default())
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<StoreError>(),
            Some(&StoreError::EmptySubmission)
        );
    }

    #[tokio::test]
    async fn test_failure_stops_persistence() {
        let mut backend = MockBackendClientTrait::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        backend.expect_create_answer().returning(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(anyhow::anyhow!("insert failed"))
        });
        backend.expect_set_response_status().never();

        let mut store = AnswerStore::default();
        let result = store.submit(&backend, "r1", &sample_form()).await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
