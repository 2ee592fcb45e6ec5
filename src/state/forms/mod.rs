//! Form domain layer
//!
//! Interview response form and its normalization into answer records.

mod field;
mod response_form;

pub use field::{OptionFlag, QuestionEntry};
pub use response_form::{normalize, AnswerRecord, FormResponse};
