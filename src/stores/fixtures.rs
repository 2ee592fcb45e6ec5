//! Sample rows shared by store and router tests

use crate::state::models::{
    AuthUser, Company, CompanyDetail, Question, Session, Survey, SurveyDetail, SurveyStatus,
};
use chrono::{Duration, TimeZone, Utc};

pub fn auth_user(id: &str) -> AuthUser {
    AuthUser {
        id: id.to_string(),
        email: Some(format!("{id}@example.com")),
    }
}

pub fn session(user_id: &str) -> Session {
    Session {
        access_token: format!("token-{user_id}"),
        refresh_token: "refresh".to_string(),
        expires_at: Utc::now() + Duration::hours(1),
        user: auth_user(user_id),
    }
}

pub fn company(id: &str) -> Company {
    Company {
        id: id.to_string(),
        name: "Acme".to_string(),
        email: "hello@acme.test".to_string(),
        phone: "000".to_string(),
        created_at: None,
        updated_at: None,
    }
}

pub fn company_detail(id: &str) -> CompanyDetail {
    CompanyDetail {
        company: company(id),
        users: Vec::new(),
        people: Vec::new(),
    }
}

pub fn survey(id: &str) -> Survey {
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Survey {
        id: id.to_string(),
        company_id: "c1".to_string(),
        title: format!("Survey {id}"),
        description: String::new(),
        has_published: false,
        survey_status_id: "draft".to_string(),
        created_at: created,
        updated_at: created,
    }
}

pub fn survey_detail(id: &str) -> SurveyDetail {
    SurveyDetail {
        survey: survey(id),
        survey_status: None,
        questions: Vec::new(),
    }
}

pub fn status(id: &str, slug: &str) -> SurveyStatus {
    SurveyStatus {
        id: id.to_string(),
        slug: slug.to_string(),
        title: slug.to_string(),
    }
}

pub fn question(id: &str, order: i32) -> Question {
    Question {
        id: id.to_string(),
        survey_id: "s1".to_string(),
        question_type_id: "t1".to_string(),
        question_text: format!("Question {id}"),
        placeholder: None,
        required: false,
        order,
    }
}
