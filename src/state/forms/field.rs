//! Per-question answer entry of the response form

use serde::{Deserialize, Serialize};

/// Multi-select checkbox state for one option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionFlag {
    pub option_id: String,
    pub selected: bool,
}

/// One question's entry in the response form.
///
/// An entry exposes three answer channels (free text, single option,
/// multi-select flags). Which one counts is decided at normalization time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionEntry {
    pub question_id: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub question_type: String,
    #[serde(default)]
    pub answer_text: String,
    #[serde(default)]
    pub answer_unique_option: Option<String>,
    #[serde(default)]
    pub answer_multiple_options: Vec<OptionFlag>,
}

impl QuestionEntry {
    pub fn new(question_id: &str, question_type: &str, required: bool) -> Self {
        Self {
            question_id: question_id.to_string(),
            question_type: question_type.to_string(),
            required,
            ..Default::default()
        }
    }

    /// Set the free text answer
    pub fn set_text(&mut self, value: impl Into<String>) {
        self.answer_text = value.into();
    }

    /// Push a character to the free text answer
    pub fn push_char(&mut self, c: char) {
        self.answer_text.push(c);
    }

    /// Remove the last character from the free text answer
    pub fn pop_char(&mut self) {
        self.answer_text.pop();
    }

    /// Choose the single-select option
    pub fn select_option(&mut self, option_id: &str) {
        self.answer_unique_option = Some(option_id.to_string());
    }

    /// Flip a multi-select checkbox, adding it on first use
    pub fn toggle_option(&mut self, option_id: &str) {
        match self
            .answer_multiple_options
            .iter_mut()
            .find(|flag| flag.option_id == option_id)
        {
            Some(flag) => flag.selected = !flag.selected,
            None => self.answer_multiple_options.push(OptionFlag {
                option_id: option_id.to_string(),
                selected: true,
            }),
        }
    }

    /// Flagged multi-select options, in the order they were first touched
    pub fn flagged_options(&self) -> impl Iterator<Item = &str> {
        self.answer_multiple_options
            .iter()
            .filter(|flag| flag.selected)
            .map(|flag| flag.option_id.as_str())
    }

    /// Clear every answer channel
    pub fn clear(&mut self) {
        self.answer_text.clear();
        self.answer_unique_option = None;
        self.answer_multiple_options.clear();
    }
}
