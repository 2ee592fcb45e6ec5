//! Application stores: state containers with async actions over the backend

mod answer;
mod auth;
mod catalog;
mod company;
mod invite;
mod people;
mod question;
mod response;
mod survey;
mod user;

#[cfg(test)]
pub(crate) mod fixtures;

pub use answer::AnswerStore;
pub use auth::AuthStore;
pub use catalog::{QuestionTypeStore, SurveyStatusStore};
pub use company::CompanyStore;
pub use invite::{generate_token, InviteStore};
pub use people::PeopleStore;
pub use question::QuestionStore;
pub use response::{RespondentStore, ResponseStore};
pub use survey::SurveyStore;
pub use user::UserStore;
