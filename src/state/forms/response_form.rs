//! Response form and answer normalization
//!
//! The interview form collects one [`QuestionEntry`] per question. On submit
//! the form is reshaped into [`AnswerRecord`]s: one record per answered
//! question, carrying either the chosen option ids or the free text.

use super::field::QuestionEntry;
use crate::state::models::{NewAnswer, SurveyDetail};
use serde::{Deserialize, Serialize};

/// Form state for one respondent's submission, in question order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormResponse {
    pub entries: Vec<QuestionEntry>,
}

impl FormResponse {
    /// Build an empty form with one entry per survey question
    pub fn for_survey(survey: &SurveyDetail) -> Self {
        let entries = survey
            .questions
            .iter()
            .map(|q| {
                let question_type = q
                    .question_types
                    .as_ref()
                    .map(|t| t.slug.as_str())
                    .unwrap_or_default();
                QuestionEntry::new(&q.question.id, question_type, q.question.required)
            })
            .collect();
        Self { entries }
    }

    /// Get the entry for a question, creating it at the end if missing
    pub fn entry_mut(&mut self, question_id: &str) -> &mut QuestionEntry {
        let index = match self
            .entries
            .iter()
            .position(|e| e.question_id == question_id)
        {
            Some(index) => index,
            None => {
                self.entries.push(QuestionEntry::new(question_id, "", false));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index]
    }

    pub fn entry(&self, question_id: &str) -> Option<&QuestionEntry> {
        self.entries.iter().find(|e| e.question_id == question_id)
    }

    /// Required questions that would produce no answer record
    pub fn missing_required(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.required && classify(e, "").is_empty())
            .map(|e| e.question_id.clone())
            .collect()
    }
}

/// Normalized answer for one question of one response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: String,
    pub response_id: String,
    pub selected_option_ids: Vec<String>,
    pub answer_text: Option<String>,
}

impl AnswerRecord {
    /// Insert payload for the `answers` row
    pub fn to_new_answer(&self) -> NewAnswer {
        NewAnswer {
            question_id: self.question_id.clone(),
            response_id: self.response_id.clone(),
            answer: self.answer_text.clone(),
        }
    }
}

/// Single answer fragment produced while classifying entries
#[derive(Debug, Clone, PartialEq, Eq)]
enum AnswerValue {
    Option(String),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AnswerTuple {
    question_id: String,
    response_id: String,
    value: AnswerValue,
}

/// Reshape a submitted form into per-question answer records.
///
/// Multi-select flags count only when no single option is chosen; a single
/// option beats free text; empty entries are skipped. Output keeps the order
/// in which questions first produced an answer.
pub fn normalize(form: &FormResponse, response_id: &str) -> Vec<AnswerRecord> {
    let tuples = form
        .entries
        .iter()
        .flat_map(|entry| classify(entry, response_id));
    fold(tuples)
}

fn classify(entry: &QuestionEntry, response_id: &str) -> Vec<AnswerTuple> {
    let tuple = |value| AnswerTuple {
        question_id: entry.question_id.clone(),
        response_id: response_id.to_string(),
        value,
    };

    let flagged: Vec<&str> = entry.flagged_options().collect();
    let unique = entry
        .answer_unique_option
        .as_deref()
        .filter(|id| !id.is_empty());

    match unique {
        None if !flagged.is_empty() => flagged
            .into_iter()
            .map(|id| tuple(AnswerValue::Option(id.to_string())))
            .collect(),
        Some(id) => vec![tuple(AnswerValue::Option(id.to_string()))],
        None if !entry.answer_text.is_empty() => {
            vec![tuple(AnswerValue::Text(entry.answer_text.clone()))]
        }
        None => Vec::new(),
    }
}

/// Group tuples by question. A record never ends up with both options and
/// text: options win over text regardless of arrival order.
fn fold(tuples: impl IntoIterator<Item = AnswerTuple>) -> Vec<AnswerRecord> {
    let mut records: Vec<AnswerRecord> = Vec::new();

    for tuple in tuples {
        let index = match records
            .iter()
            .position(|r| r.question_id == tuple.question_id)
        {
            Some(index) => index,
            None => {
                records.push(AnswerRecord {
                    question_id: tuple.question_id.clone(),
                    response_id: tuple.response_id.clone(),
                    ..Default::default()
                });
                records.len() - 1
            }
        };

        let record = &mut records[index];
        match tuple.value {
            AnswerValue::Option(id) => {
                if record.answer_text.take().is_some() {
                    tracing::debug!(
                        question_id = %record.question_id,
                        "dropping free text in favor of selected options"
                    );
                }
                record.selected_option_ids.push(id);
            }
            AnswerValue::Text(text) => {
                if record.selected_option_ids.is_empty() {
                    record.answer_text = Some(text);
                } else {
                    tracing::debug!(
                        question_id = %record.question_id,
                        "ignoring free text for question with selected options"
                    );
                }
            }
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::forms::OptionFlag;
    use pretty_assertions::assert_eq;

    fn text_entry(question_id: &str, text: &str) -> QuestionEntry {
        let mut entry = QuestionEntry::new(question_id, "text", false);
        entry.set_text(text);
        entry
    }

    mod normalize_tests {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_free_text_only_yields_single_text_record() {
            let form = FormResponse {
                entries: vec![text_entry("q1", "Great service")],
            };

            let records = normalize(&form, "r1");

            assert_eq!(
                records,
                vec![AnswerRecord {
                    question_id: "q1".to_string(),
                    response_id: "r1".to_string(),
                    selected_option_ids: vec![],
                    answer_text: Some("Great service".to_string()),
                }]
            );
        }

        #[test]
        fn test_multi_select_keeps_flagged_order() {
            let mut form = FormResponse::default();
            let entry = form.entry_mut("q1");
            entry.answer_multiple_options = vec![
                OptionFlag {
                    option_id: "o3".to_string(),
                    selected: true,
                },
                OptionFlag {
                    option_id: "o1".to_string(),
                    selected: false,
                },
                OptionFlag {
                    option_id: "o2".to_string(),
                    selected: true,
                },
            ];

            let records = normalize(&form, "r1");

            assert_eq!(records.len(), 1);
            assert_eq!(records[0].selected_option_ids, vec!["o3", "o2"]);
            assert_eq!(records[0].answer_text, None);
        }

        #[test]
        fn test_single_option_beats_multi_flags_and_text() {
            let mut form = FormResponse::default();
            let entry = form.entry_mut("q1");
            entry.toggle_option("o1");
            entry.toggle_option("o2");
            entry.select_option("o9");
            entry.set_text("ignored");

            let records = normalize(&form, "r1");

            assert_eq!(records.len(), 1);
            assert_eq!(records[0].selected_option_ids, vec!["o9"]);
            assert_eq!(records[0].answer_text, None);
        }

        #[test]
        fn test_unanswered_question_is_skipped() {
            let mut form = FormResponse::default();
            form.entry_mut("q1").toggle_option("o1");
            form.entry_mut("q1").toggle_option("o1");
            form.entries.push(QuestionEntry::new("q2", "text", false));
            form.entries.push(text_entry("q3", "answer"));

            let records = normalize(&form, "r1");

            let ids: Vec<_> = records.iter().map(|r| r.question_id.as_str()).collect();
            assert_eq!(ids, vec!["q3"]);
        }

        #[test]
        fn test_unflagged_options_fall_through_to_text() {
            let mut entry = text_entry("q1", "fallback");
            entry.answer_multiple_options.push(OptionFlag {
                option_id: "o1".to_string(),
                selected: false,
            });
            let form = FormResponse {
                entries: vec![entry],
            };

            let records = normalize(&form, "r1");
            assert_eq!(records[0].answer_text.as_deref(), Some("fallback"));
        }

        #[test]
        fn test_empty_unique_option_is_ignored() {
            let mut entry = text_entry("q1", "typed");
            entry.answer_unique_option = Some(String::new());
            let form = FormResponse {
                entries: vec![entry],
            };

            let records = normalize(&form, "r1");
            assert_eq!(records[0].answer_text.as_deref(), Some("typed"));
            assert!(records[0].selected_option_ids.is_empty());
        }

        #[test]
        fn test_output_follows_form_order() {
            let mut form = FormResponse::default();
            form.entries.push(text_entry("b", "2"));
            form.entry_mut("a").select_option("o1");
            form.entries.push(text_entry("c", "3"));

            let records = normalize(&form, "r1");
            let ids: Vec<_> = records.iter().map(|r| r.question_id.as_str()).collect();
            assert_eq!(ids, vec!["b", "a", "c"]);
        }

        #[test]
        fn test_normalize_is_idempotent() {
            let mut form = FormResponse::default();
            form.entries.push(text_entry("q1", "a"));
            form.entry_mut("q2").toggle_option("o1");
            form.entry_mut("q2").toggle_option("o2");

            assert_eq!(normalize(&form, "r1"), normalize(&form, "r1"));
        }

        #[test]
        fn test_empty_form_yields_nothing() {
            assert!(normalize(&FormResponse::default(), "r1").is_empty());
        }
    }

    mod fold_tests {
        use super::*;
        use pretty_assertions::assert_eq;

        fn option(question_id: &str, id: &str) -> AnswerTuple {
            AnswerTuple {
                question_id: question_id.to_string(),
                response_id: "r1".to_string(),
                value: AnswerValue::Option(id.to_string()),
            }
        }

        fn text(question_id: &str, value: &str) -> AnswerTuple {
            AnswerTuple {
                question_id: question_id.to_string(),
                response_id: "r1".to_string(),
                value: AnswerValue::Text(value.to_string()),
            }
        }

        #[test]
        fn test_options_accumulate_under_one_record() {
            let records = fold(vec![option("q1", "a"), option("q2", "x"), option("q1", "b")]);
            assert_eq!(records.len(), 2);
            assert_eq!(records[0].selected_option_ids, vec!["a", "b"]);
            assert_eq!(records[1].selected_option_ids, vec!["x"]);
        }

        #[test]
        fn test_later_text_overwrites_text() {
            let records = fold(vec![text("q1", "first"), text("q1", "second")]);
            assert_eq!(records[0].answer_text.as_deref(), Some("second"));
        }

        #[test]
        fn test_text_after_options_is_dropped() {
            let records = fold(vec![option("q1", "a"), text("q1", "stray")]);
            assert_eq!(records[0].selected_option_ids, vec!["a"]);
            assert_eq!(records[0].answer_text, None);
        }

        #[test]
        fn test_options_after_text_clear_the_text() {
            let records = fold(vec![text("q1", "stray"), option("q1", "a")]);
            assert_eq!(records[0].selected_option_ids, vec!["a"]);
            assert_eq!(records[0].answer_text, None);
        }
    }

    mod form_tests {
        use super::*;
        use pretty_assertions::assert_eq;
        use crate::state::models::{
            Question, QuestionDetail, QuestionType, Survey, SurveyDetail,
        };
        use chrono::Utc;

        fn question(id: &str, required: bool, slug: Option<&str>) -> QuestionDetail {
            QuestionDetail {
                question: Question {
                    id: id.to_string(),
                    survey_id: "s1".to_string(),
                    question_type_id: "t".to_string(),
                    question_text: id.to_uppercase(),
                    placeholder: None,
                    required,
                    order: 0,
                },
                options: vec![],
                question_types: slug.map(|slug| QuestionType {
                    id: "t".to_string(),
                    slug: slug.to_string(),
                    title: slug.to_string(),
                    description: String::new(),
                }),
            }
        }

        #[test]
        fn test_for_survey_creates_entry_per_question() {
            let survey = SurveyDetail {
                survey: Survey {
                    id: "s1".to_string(),
                    company_id: "c1".to_string(),
                    title: "t".to_string(),
                    description: String::new(),
                    has_published: true,
                    survey_status_id: "st".to_string(),
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                },
                survey_status: None,
                questions: vec![question("q1", true, Some("text")), question("q2", false, None)],
            };

            let form = FormResponse::for_survey(&survey);

            assert_eq!(form.entries.len(), 2);
            assert_eq!(form.entries[0].question_type, "text");
            assert!(form.entries[0].required);
            assert_eq!(form.entries[1].question_type, "");
        }

        #[test]
        fn test_missing_required_lists_unanswered_required_questions() {
            let mut form = FormResponse {
                entries: vec![
                    QuestionEntry::new("q1", "text", true),
                    QuestionEntry::new("q2", "text", false),
                    QuestionEntry::new("q3", "single", true),
                ],
            };
            form.entry_mut("q3").select_option("o1");

            assert_eq!(form.missing_required(), vec!["q1".to_string()]);
        }

        #[test]
        fn test_entry_mut_upserts() {
            let mut form = FormResponse::default();
            form.entry_mut("q1").set_text("a");
            form.entry_mut("q1").push_char('b');
            assert_eq!(form.entries.len(), 1);
            assert_eq!(form.entry("q1").map(|e| e.answer_text.as_str()), Some("ab"));
        }

        #[test]
        fn test_form_deserializes_from_json() {
            let json = r#"{"entries": [
                {"question_id": "q1", "required": true, "question_type": "multiple",
                 "answer_multiple_options": [{"option_id": "o1", "selected": true}]},
                {"question_id": "q2", "answer_text": "hello"}
            ]}"#;
            let form: FormResponse = serde_json::from_str(json).unwrap();
            let records = normalize(&form, "r9");
            assert_eq!(records.len(), 2);
            assert_eq!(records[0].selected_option_ids, vec!["o1"]);
            assert_eq!(records[1].response_id, "r9");
        }
    }
}
