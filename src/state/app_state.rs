//! Application state definitions

use crate::router::{Location, Router};
use crate::stores::{
    AnswerStore, AuthStore, CompanyStore, InviteStore, PeopleStore, QuestionStore,
    QuestionTypeStore, RespondentStore, ResponseStore, SurveyStatusStore, SurveyStore, UserStore,
};

/// Main application state
#[derive(Debug, Clone, Default)]
pub struct AppState {
    // Navigation
    pub router: Router,

    // Account
    pub auth: AuthStore,
    pub user: UserStore,
    pub company: CompanyStore,
    pub people: PeopleStore,
    pub invites: InviteStore,

    // Surveys
    pub surveys: SurveyStore,
    pub statuses: SurveyStatusStore,
    pub questions: QuestionStore,
    pub question_types: QuestionTypeStore,

    // Interviews
    pub respondents: RespondentStore,
    pub responses: ResponseStore,
    pub answers: AnswerStore,

    /// Last user-facing error, cleared on the next successful action
    pub last_error: Option<String>,
}

impl AppState {
    pub fn location(&self) -> Option<&Location> {
        self.router.current()
    }

    pub fn push_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_empty() {
        let state = AppState::default();
        assert!(state.location().is_none());
        assert!(!state.auth.is_authenticated());
        assert!(state.company.company_id().is_none());
        assert!(state.last_error.is_none());
    }

    #[test]
    fn test_error_slot() {
        let mut state = AppState::default();
        state.push_error("Invalid email or password");
        assert_eq!(state.last_error.as_deref(), Some("Invalid email or password"));
        state.clear_error();
        assert!(state.last_error.is_none());
    }
}
