//! Typed rows and nested-select shapes returned by the backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Slug of the survey status that marks a survey as published
pub const PUBLISHED_STATUS_SLUG: &str = "published";

/// Lifecycle of a respondent's attempt at a survey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Pending,
    Completed,
}

impl ResponseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

/// Tenant organization owning surveys and users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Company with its members and registered people (`*, users(*), people(*)`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub company: Company,
    #[serde(default)]
    pub users: Vec<UserRow>,
    #[serde(default)]
    pub people: Vec<Person>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewCompany {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CompanyUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Application user profile row (`users`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: String,
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// `Some(None)` detaches the user from its company
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<Option<String>>,
}

/// Person registered by a company (`people`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub company_id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewPerson {
    pub company_id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyStatus {
    pub id: String,
    pub slug: String,
    pub title: String,
}

impl SurveyStatus {
    pub fn is_published(&self) -> bool {
        self.slug == PUBLISHED_STATUS_SLUG
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Survey {
    pub id: String,
    pub company_id: String,
    pub title: String,
    pub description: String,
    pub has_published: bool,
    pub survey_status_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Survey with its status (`*, survey_status(*)`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveySummary {
    #[serde(flatten)]
    pub survey: Survey,
    pub survey_status: Option<SurveyStatus>,
}

/// Survey with status and ordered questions
/// (`*, survey_status(*), questions(*, options(*), question_types(*))`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyDetail {
    #[serde(flatten)]
    pub survey: Survey,
    pub survey_status: Option<SurveyStatus>,
    #[serde(default)]
    pub questions: Vec<QuestionDetail>,
}

impl SurveyDetail {
    /// Sort questions by their display order
    pub fn sort_questions(&mut self) {
        self.questions.sort_by_key(|q| q.question.order);
        for question in &mut self.questions {
            question.options.sort_by_key(|o| o.order);
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewSurvey {
    pub company_id: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub survey_status_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SurveyUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub survey_status_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionType {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub survey_id: String,
    pub question_type_id: String,
    pub question_text: String,
    #[serde(default)]
    pub placeholder: Option<String>,
    pub required: bool,
    pub order: i32,
}

/// Question with its options and type (`*, options(*), question_types(*)`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionDetail {
    #[serde(flatten)]
    pub question: Question,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    pub question_types: Option<QuestionType>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewQuestion {
    pub survey_id: String,
    pub question_type_id: String,
    pub question_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    pub required: bool,
    pub order: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuestionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: String,
    pub question_id: String,
    pub option_text: String,
    pub order: i32,
}

/// Option text as entered in the question editor, before it has a question id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionDraft {
    pub option_text: String,
    pub order: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewOption {
    pub question_id: String,
    pub option_text: String,
    pub order: i32,
}

/// Individual answering a survey instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Respondent {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    #[serde(default)]
    pub complement: Option<String>,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewRespondent {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complement: Option<String>,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: String,
    pub survey_id: String,
    pub respondent_id: String,
    #[serde(default)]
    pub status: Option<ResponseStatus>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewResponse {
    pub survey_id: String,
    pub respondent_id: String,
    pub status: ResponseStatus,
}

/// Answer with its chosen options (`*, answer_options(*)`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerDetail {
    #[serde(flatten)]
    pub answer: Answer,
    #[serde(default)]
    pub answer_options: Vec<AnswerOption>,
}

/// Question as seen when reviewing responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewQuestion {
    #[serde(flatten)]
    pub question: Question,
    pub question_types: Option<QuestionType>,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    #[serde(default)]
    pub answers: Vec<AnswerDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSurvey {
    #[serde(flatten)]
    pub survey: Survey,
    #[serde(default)]
    pub questions: Vec<ReviewQuestion>,
}

/// Response with respondent and the full answered survey tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseDetail {
    #[serde(flatten)]
    pub response: Response,
    pub respondents: Option<Respondent>,
    pub surveys: Option<ReviewSurvey>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: String,
    pub question_id: String,
    pub response_id: String,
    #[serde(default)]
    pub answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAnswer {
    pub question_id: String,
    pub response_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: String,
    pub answer_id: String,
    pub question_option_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAnswerOption {
    pub answer_id: String,
    pub question_option_id: String,
}

/// Credential allowing a new user to join an existing company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InviteToken {
    pub id: i64,
    pub company_id: String,
    pub token: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInviteToken {
    pub company_id: String,
    pub token: String,
}

/// Invite token with the company it grants access to (`*, companies(*)`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InviteWithCompany {
    #[serde(flatten)]
    pub invite: InviteToken,
    pub companies: Option<Company>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InviteEmail {
    pub id: String,
    pub company_id: String,
    pub email: String,
    pub invited_by: String,
    pub role: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewInviteEmail {
    pub company_id: String,
    pub email: String,
    pub invited_by: String,
    pub role: String,
}

/// Authenticated identity as reported by the auth service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Signed-in session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: AuthUser,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// OAuth providers offered on the sign-in page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
}

impl OAuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
        }
    }
}
