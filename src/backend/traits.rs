//! Trait abstraction for the backend client to enable mocking in tests

use crate::state::models::{
    Answer, AnswerOption, AuthUser, Company, CompanyDetail, CompanyUpdate, InviteEmail,
    InviteToken, InviteWithCompany, NewAnswer, NewAnswerOption, NewCompany, NewInviteEmail,
    NewInviteToken, NewOption, NewPerson, NewQuestion, NewRespondent, NewResponse, NewSurvey,
    OAuthProvider, Person, Question, QuestionOption, QuestionType, QuestionUpdate, Respondent,
    Response, ResponseDetail, ResponseStatus, Session, Survey, SurveyDetail, SurveyStatus,
    SurveySummary, SurveyUpdate, UserRow, UserUpdate,
};
use anyhow::Result;
use async_trait::async_trait;

/// Filter for response listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseFilter {
    pub status: Option<ResponseStatus>,
    pub survey_id: Option<String>,
    /// Newest first
    pub newest_first: bool,
    pub limit: Option<usize>,
}

/// Trait for backend operations, enabling mocking in tests
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BackendClientTrait: Send + Sync {
    // Auth

    /// Current session, refreshed when expired; `None` when signed out
    async fn get_session(&self) -> Result<Option<Session>>;

    /// Identity behind the current session, verified by the auth service
    async fn get_user(&self) -> Result<Option<AuthUser>>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session>;

    /// Register a new account; returns a session when no confirmation is required
    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>>;

    /// Send a one-time sign-in link
    async fn sign_in_with_otp(&self, email: &str) -> Result<()>;

    /// URL the user must visit to sign in with an OAuth provider
    fn oauth_url(&self, provider: OAuthProvider, redirect_to: Option<String>) -> Result<String>;

    async fn reset_password_for_email(&self, email: &str, redirect_to: Option<String>)
        -> Result<()>;

    async fn sign_out(&self) -> Result<()>;

    // Companies and users

    /// Company the user belongs to, if any
    async fn get_user_company_id(&self, user_id: &str) -> Result<Option<String>>;

    async fn get_company(&self, company_id: &str) -> Result<CompanyDetail>;

    async fn create_company(&self, company: NewCompany) -> Result<Company>;

    async fn update_company(&self, company_id: &str, update: CompanyUpdate) -> Result<()>;

    async fn get_user_row(&self, user_id: &str) -> Result<UserRow>;

    async fn update_user(&self, user_id: &str, update: UserUpdate) -> Result<()>;

    async fn list_people(&self, company_id: &str) -> Result<Vec<Person>>;

    async fn create_person(&self, person: NewPerson) -> Result<Person>;

    // Surveys

    async fn get_survey(&self, survey_id: &str) -> Result<SurveyDetail>;

    /// Company surveys, newest first
    async fn list_surveys(&self, company_id: &str, limit: Option<usize>)
        -> Result<Vec<SurveySummary>>;

    /// Count company surveys, optionally restricted by publication
    async fn count_surveys(&self, company_id: &str, published: Option<bool>) -> Result<u64>;

    async fn create_survey(&self, survey: NewSurvey) -> Result<Survey>;

    async fn update_survey(&self, survey_id: &str, update: SurveyUpdate) -> Result<Survey>;

    async fn get_survey_status(&self, status_id: &str) -> Result<SurveyStatus>;

    async fn list_survey_statuses(&self) -> Result<Vec<SurveyStatus>>;

    // Questions

    async fn list_questions(&self, survey_id: &str) -> Result<Vec<Question>>;

    async fn create_question(&self, question: NewQuestion) -> Result<Question>;

    async fn create_options(&self, options: Vec<NewOption>) -> Result<Vec<QuestionOption>>;

    async fn update_question(&self, question_id: &str, update: QuestionUpdate) -> Result<Question>;

    async fn delete_question(&self, question_id: &str) -> Result<()>;

    async fn list_question_types(&self) -> Result<Vec<QuestionType>>;

    // Responses and answers

    async fn create_respondent(&self, respondent: NewRespondent) -> Result<Respondent>;

    async fn list_responses(&self, filter: ResponseFilter) -> Result<Vec<ResponseDetail>>;

    async fn count_responses(&self, status: ResponseStatus) -> Result<u64>;

    async fn create_response(&self, response: NewResponse) -> Result<Response>;

    async fn set_response_status(&self, response_id: &str, status: ResponseStatus) -> Result<()>;

    async fn create_answer(&self, answer: NewAnswer) -> Result<Answer>;

    async fn create_answer_options(&self, options: Vec<NewAnswerOption>)
        -> Result<Vec<AnswerOption>>;

    // Invites

    async fn list_invite_tokens(&self, company_id: &str) -> Result<Vec<InviteToken>>;

    async fn create_invite_token(&self, invite: NewInviteToken) -> Result<InviteToken>;

    async fn get_invite_by_token(&self, token: &str) -> Result<InviteWithCompany>;

    async fn create_invite_email(&self, invite: NewInviteEmail) -> Result<InviteEmail>;
}
