//! REST client for the hosted backend
//!
//! Row access goes through the PostgREST endpoint (`rest/v1`), sign-in and
//! session handling through the auth endpoint (`auth/v1`). The current
//! session is kept in memory and used as bearer token for row access.

use super::error::BackendError;
use super::query::{parse_content_range, select, Method, Shape, TableQuery};
use super::traits::{BackendClientTrait, ResponseFilter};
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
use chrono::{Duration, Utc};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use url::Url;

/// Sessions this close to expiry are refreshed before use
const EXPIRY_MARGIN_SECS: i64 = 10;

/// Token payload returned by the auth service
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
            .unwrap_or_else(|| Utc::now() + Duration::seconds(self.expires_in));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

/// Error payload of either endpoint
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorBody {
    fn into_error(self, status: StatusCode) -> BackendError {
        let code = self.error_code.or(self.error).or_else(|| {
            self.code.map(|c| match c {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
        });
        let message = self
            .message
            .or(self.msg)
            .or(self.error_description)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            });
        BackendError::Api {
            status: status.as_u16(),
            code,
            message,
        }
    }
}

#[derive(Deserialize)]
struct CompanyRef {
    company_id: Option<String>,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// Client for the hosted backend
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    session: RwLock<Option<Session>>,
}

impl BackendClient {
    /// Create a new client for the backend at `base_url`
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url).map_err(BackendError::from)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            api_key: api_key.to_string(),
            session: RwLock::new(None),
        })
    }

    /// Restore a session persisted by a previous run
    pub fn with_session(self, session: Option<Session>) -> Self {
        self.store_session(session);
        self
    }

    /// Snapshot of the in-memory session
    pub fn current_session(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn store_session(&self, session: Option<Session>) {
        *self
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = session;
    }

    fn bearer(&self) -> String {
        self.current_session()
            .map(|s| s.access_token)
            .unwrap_or_else(|| self.api_key.clone())
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path).map_err(BackendError::from)?)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(self.bearer())
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.map_err(BackendError::from)?;
        let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
        let error = parsed.into_error(status);
        tracing::warn!("backend error: {}", error);
        Err(error.into())
    }

    /// Send a table query and return the raw successful response
    async fn execute(&self, query: &TableQuery) -> Result<reqwest::Response> {
        let method = match query.method {
            Method::Get => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };
        tracing::debug!(table = %query.table, method = ?query.method, "backend request");

        let mut builder = self
            .request(method, self.endpoint(&query.path())?)
            .query(&query.query_pairs());
        for (name, value) in query.headers() {
            builder = builder.header(name, value);
        }
        if let Some(body) = &query.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(BackendError::from)?;
        Self::check(response).await
    }

    async fn fetch_many<T: DeserializeOwned>(&self, query: TableQuery) -> Result<Vec<T>> {
        let response = self.execute(&query).await?;
        let bytes = response.bytes().await.map_err(BackendError::from)?;
        Ok(serde_json::from_slice(&bytes).map_err(BackendError::from)?)
    }

    async fn fetch_one<T: DeserializeOwned>(&self, query: TableQuery) -> Result<T> {
        let response = self.execute(&query.single()).await?;
        let bytes = response.bytes().await.map_err(BackendError::from)?;
        Ok(serde_json::from_slice(&bytes).map_err(BackendError::from)?)
    }

    async fn fetch_count(&self, query: TableQuery) -> Result<u64> {
        debug_assert_eq!(query.shape, Shape::Count);
        let response = self.execute(&query).await?;
        let count = response
            .headers()
            .get(reqwest::header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or(BackendError::MissingCount)?;
        Ok(count)
    }

    async fn run(&self, query: TableQuery) -> Result<()> {
        self.execute(&query).await?;
        Ok(())
    }

    async fn token_grant<B: Serialize + ?Sized>(&self, grant_type: &str, body: &B) -> Result<Session> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);

        let response = self
            .http
            .post(url)
            .header("apikey", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(BackendError::from)?;
        let token: TokenResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(BackendError::from)?;

        let session = token.into_session();
        self.store_session(Some(session.clone()));
        Ok(session)
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session> {
        tracing::debug!("refreshing expired session");
        self.token_grant(
            "refresh_token",
            &serde_json::json!({ "refresh_token": refresh_token }),
        )
        .await
    }
}

fn to_body<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(value).map_err(BackendError::from)?)
}

#[async_trait]
impl BackendClientTrait for BackendClient {
    async fn get_session(&self) -> Result<Option<Session>> {
        let Some(session) = self.current_session() else {
            return Ok(None);
        };
        if !session.is_expired(Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS)) {
            return Ok(Some(session));
        }
        match self.refresh_session(&session.refresh_token).await {
            Ok(session) => Ok(Some(session)),
            Err(err)
                if err
                    .downcast_ref::<BackendError>()
                    .is_some_and(BackendError::is_rejection) =>
            {
                tracing::warn!(user_id = %session.user.id, "session refresh rejected, signing out");
                self.store_session(None);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn get_user(&self) -> Result<Option<AuthUser>> {
        if self.current_session().is_none() {
            return Ok(None);
        }
        let response = self
            .request(reqwest::Method::GET, self.endpoint("auth/v1/user")?)
            .send()
            .await
            .map_err(BackendError::from)?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Ok(None);
        }
        let user = Self::check(response)
            .await?
            .json()
            .await
            .map_err(BackendError::from)?;
        Ok(Some(user))
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        self.token_grant("password", &Credentials { email, password })
            .await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>> {
        let response = self
            .http
            .post(self.endpoint("auth/v1/signup")?)
            .header("apikey", &self.api_key)
            .json(&Credentials { email, password })
            .send()
            .await
            .map_err(BackendError::from)?;
        let body: serde_json::Value = Self::check(response)
            .await?
            .json()
            .await
            .map_err(BackendError::from)?;

        if body.get("access_token").is_none() {
            tracing::info!("sign up requires email confirmation");
            return Ok(None);
        }
        let token: TokenResponse = serde_json::from_value(body).map_err(BackendError::from)?;
        let session = token.into_session();
        self.store_session(Some(session.clone()));
        Ok(Some(session))
    }

    async fn sign_in_with_otp(&self, email: &str) -> Result<()> {
        let response = self
            .http
            .post(self.endpoint("auth/v1/otp")?)
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email, "create_user": true }))
            .send()
            .await
            .map_err(BackendError::from)?;
        Self::check(response).await?;
        Ok(())
    }

    fn oauth_url(&self, provider: OAuthProvider, redirect_to: Option<String>) -> Result<String> {
        let mut url = self.endpoint("auth/v1/authorize")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("provider", provider.as_str());
            if let Some(redirect_to) = &redirect_to {
                pairs.append_pair("redirect_to", redirect_to);
            }
        }
        Ok(url.to_string())
    }

    async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: Option<String>,
    ) -> Result<()> {
        let mut url = self.endpoint("auth/v1/recover")?;
        if let Some(redirect_to) = &redirect_to {
            url.query_pairs_mut().append_pair("redirect_to", redirect_to);
        }
        let response = self
            .http
            .post(url)
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await
            .map_err(BackendError::from)?;
        Self::check(response).await?;
        Ok(())
    }

    async fn sign_out(&self) -> Result<()> {
        if self.current_session().is_none() {
            return Ok(());
        }
        let request = self.request(reqwest::Method::POST, self.endpoint("auth/v1/logout")?);
        self.store_session(None);
        let response = request.send().await.map_err(BackendError::from)?;
        Self::check(response).await?;
        Ok(())
    }

    async fn get_user_company_id(&self, user_id: &str) -> Result<Option<String>> {
        let row: CompanyRef = self
            .fetch_one(TableQuery::select("users", select::COMPANY_ID).eq("id", user_id))
            .await?;
        Ok(row.company_id)
    }

    async fn get_company(&self, company_id: &str) -> Result<CompanyDetail> {
        self.fetch_one(
            TableQuery::select("companies", select::COMPANY_WITH_MEMBERS).eq("id", company_id),
        )
        .await
    }

    async fn create_company(&self, company: NewCompany) -> Result<Company> {
        self.fetch_one(TableQuery::insert("companies", to_body(&company)?))
            .await
    }

    async fn update_company(&self, company_id: &str, update: CompanyUpdate) -> Result<()> {
        self.run(TableQuery::update("companies", to_body(&update)?).eq("id", company_id))
            .await
    }

    async fn get_user_row(&self, user_id: &str) -> Result<UserRow> {
        self.fetch_one(TableQuery::select("users", select::ALL).eq("id", user_id))
            .await
    }

    async fn update_user(&self, user_id: &str, update: UserUpdate) -> Result<()> {
        self.run(TableQuery::update("users", to_body(&update)?).eq("id", user_id))
            .await
    }

    async fn list_people(&self, company_id: &str) -> Result<Vec<Person>> {
        self.fetch_many(TableQuery::select("people", select::ALL).eq("company_id", company_id))
            .await
    }

    async fn create_person(&self, person: NewPerson) -> Result<Person> {
        self.fetch_one(TableQuery::insert("people", to_body(&person)?))
            .await
    }

    async fn get_survey(&self, survey_id: &str) -> Result<SurveyDetail> {
        let mut survey: SurveyDetail = self
            .fetch_one(TableQuery::select("surveys", select::SURVEY_DETAIL).eq("id", survey_id))
            .await?;
        survey.sort_questions();
        Ok(survey)
    }

    async fn list_surveys(
        &self,
        company_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<SurveySummary>> {
        let mut query = TableQuery::select("surveys", select::SURVEY_WITH_STATUS)
            .eq("company_id", company_id)
            .order("created_at", false);
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        self.fetch_many(query).await
    }

    async fn count_surveys(&self, company_id: &str, published: Option<bool>) -> Result<u64> {
        let mut query = TableQuery::count("surveys");
        if let Some(published) = published {
            query = query.eq("has_published", published);
        }
        self.fetch_count(query.eq("company_id", company_id)).await
    }

    async fn create_survey(&self, survey: NewSurvey) -> Result<Survey> {
        self.fetch_one(TableQuery::insert("surveys", to_body(&survey)?))
            .await
    }

    async fn update_survey(&self, survey_id: &str, update: SurveyUpdate) -> Result<Survey> {
        self.fetch_one(TableQuery::update("surveys", to_body(&update)?).eq("id", survey_id))
            .await
    }

    async fn get_survey_status(&self, status_id: &str) -> Result<SurveyStatus> {
        self.fetch_one(TableQuery::select("survey_status", select::ALL).eq("id", status_id))
            .await
    }

    async fn list_survey_statuses(&self) -> Result<Vec<SurveyStatus>> {
        self.fetch_many(TableQuery::select("survey_status", select::ALL))
            .await
    }

    async fn list_questions(&self, survey_id: &str) -> Result<Vec<Question>> {
        let mut questions: Vec<Question> = self
            .fetch_many(TableQuery::select("questions", select::ALL).eq("survey_id", survey_id))
            .await?;
        questions.sort_by_key(|q| q.order);
        Ok(questions)
    }

    async fn create_question(&self, question: NewQuestion) -> Result<Question> {
        self.fetch_one(TableQuery::insert("questions", to_body(&question)?))
            .await
    }

    async fn create_options(&self, options: Vec<NewOption>) -> Result<Vec<QuestionOption>> {
        self.fetch_many(TableQuery::insert("options", to_body(&options)?))
            .await
    }

    async fn update_question(&self, question_id: &str, update: QuestionUpdate) -> Result<Question> {
        self.fetch_one(TableQuery::update("questions", to_body(&update)?).eq("id", question_id))
            .await
    }

    async fn delete_question(&self, question_id: &str) -> Result<()> {
        self.run(TableQuery::delete("questions").eq("id", question_id))
            .await
    }

    async fn list_question_types(&self) -> Result<Vec<QuestionType>> {
        self.fetch_many(TableQuery::select("question_types", select::ALL))
            .await
    }

    async fn create_respondent(&self, respondent: NewRespondent) -> Result<Respondent> {
        self.fetch_one(TableQuery::insert("respondents", to_body(&respondent)?))
            .await
    }

    async fn list_responses(&self, filter: ResponseFilter) -> Result<Vec<ResponseDetail>> {
        let mut query = TableQuery::select("responses", select::RESPONSE_DETAIL);
        if let Some(status) = filter.status {
            query = query.eq("status", status.as_str());
        }
        if let Some(survey_id) = &filter.survey_id {
            query = query.eq("survey_id", survey_id);
        }
        if filter.newest_first {
            query = query.order("created_at", false);
        }
        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }
        self.fetch_many(query).await
    }

    async fn count_responses(&self, status: ResponseStatus) -> Result<u64> {
        self.fetch_count(TableQuery::count("responses").eq("status", status.as_str()))
            .await
    }

    async fn create_response(&self, response: NewResponse) -> Result<Response> {
        self.fetch_one(TableQuery::insert("responses", to_body(&response)?))
            .await
    }

    async fn set_response_status(&self, response_id: &str, status: ResponseStatus) -> Result<()> {
        self.run(
            TableQuery::update("responses", serde_json::json!({ "status": status }))
                .eq("id", response_id),
        )
        .await
    }

    async fn create_answer(&self, answer: NewAnswer) -> Result<Answer> {
        self.fetch_one(TableQuery::insert("answers", to_body(&answer)?))
            .await
    }

    async fn create_answer_options(
        &self,
        options: Vec<NewAnswerOption>,
    ) -> Result<Vec<AnswerOption>> {
        self.fetch_many(TableQuery::insert("answer_options", to_body(&options)?))
            .await
    }

    async fn list_invite_tokens(&self, company_id: &str) -> Result<Vec<InviteToken>> {
        self.fetch_many(
            TableQuery::select("invite_tokens", select::ALL).eq("company_id", company_id),
        )
        .await
    }

    async fn create_invite_token(&self, invite: NewInviteToken) -> Result<InviteToken> {
        self.fetch_one(TableQuery::insert("invite_tokens", to_body(&invite)?))
            .await
    }

    async fn get_invite_by_token(&self, token: &str) -> Result<InviteWithCompany> {
        self.fetch_one(
            TableQuery::select("invite_tokens", select::INVITE_WITH_COMPANY).eq("token", token),
        )
        .await
    }

    async fn create_invite_email(&self, invite: NewInviteEmail) -> Result<InviteEmail> {
        self.fetch_one(TableQuery::insert("invite_emails", to_body(&invite)?))
            .await
    }
}
