//! SurveyDesk - survey management client
//!
//! Companies create surveys, invite team members and collect responses from
//! respondents over a hosted REST backend. The crate holds the typed backend
//! client, the stores, the answer normalizer and the navigation guard.

pub mod app;
pub mod backend;
pub mod config;
pub mod router;
pub mod state;
pub mod stores;
