//! Backend client module for the hosted REST service

mod client;
mod error;
pub mod query;
mod traits;

pub use client::BackendClient;
pub use error::{map_auth_error, AuthError, BackendError, StoreError};
pub use traits::{BackendClientTrait, ResponseFilter};

#[cfg(test)]
pub use traits::MockBackendClientTrait;
