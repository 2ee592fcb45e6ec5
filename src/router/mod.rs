//! Named routes, the navigation guard and the history-keeping router

mod guard;
mod routes;

pub use guard::{guard, Decision, NavigationOutcome, NavigationRequest};
pub use routes::{Location, Params, RouteMeta, RouteName, AUTH_PREFIX, HOME};

use crate::backend::BackendClientTrait;
use crate::stores::{AuthStore, CompanyStore};
use thiserror::Error;

/// Upper bound on redirects followed by a single navigation
pub const MAX_REDIRECTS: usize = 8;

/// A guarded action did not reach the location it asked for
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("redirected to {0}")]
    Redirected(Location),
    #[error("{0}")]
    Failed(String),
}

impl NavigationError {
    /// `None` when the navigation was allowed
    pub fn from_decision(decision: Decision) -> Option<Self> {
        match decision {
            Decision::Allow => None,
            Decision::RedirectTo(name, params) => {
                Some(Self::Redirected(Location::with_params(name, params)))
            }
            Decision::Fail(reason) => Some(Self::Failed(reason)),
        }
    }
}

/// Current location plus the locations visited before it
#[derive(Debug, Clone, Default)]
pub struct Router {
    current: Option<Location>,
    history: Vec<Location>,
}

impl Router {
    pub fn current(&self) -> Option<&Location> {
        self.current.as_ref()
    }

    pub fn history(&self) -> &[Location] {
        &self.history
    }

    /// Resolve `path`, run the guard and follow redirects.
    ///
    /// Returns `Allow` when the requested location was reached, the last
    /// redirect followed when the router landed elsewhere, or `Fail` when
    /// nothing changed.
    pub async fn navigate(
        &mut self,
        backend: &dyn BackendClientTrait,
        auth: &mut AuthStore,
        company: &mut CompanyStore,
        pending_invite: &mut Option<String>,
        path: &str,
    ) -> Decision {
        let Some(target) = Location::resolve(path) else {
            tracing::warn!(path, "no route matches");
            return Decision::Fail(format!("no route matches {path}"));
        };
        self.navigate_to(backend, auth, company, pending_invite, target)
            .await
    }

    pub async fn navigate_to(
        &mut self,
        backend: &dyn BackendClientTrait,
        auth: &mut AuthStore,
        company: &mut CompanyStore,
        pending_invite: &mut Option<String>,
        mut target: Location,
    ) -> Decision {
        let mut last_redirect = None;

        for _ in 0..=MAX_REDIRECTS {
            if let Some(forward) = target.name.redirect() {
                target = Location::with_params(forward, target.params);
                last_redirect = Some(Decision::RedirectTo(forward, target.params.clone()));
                continue;
            }

            let request = NavigationRequest {
                target: target.clone(),
                pending_invite: pending_invite.clone(),
            };
            let outcome = match guard(backend, auth, company, request).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!(target = %target, "navigation failed: {e:#}");
                    return Decision::Fail(e.to_string());
                }
            };
            *pending_invite = outcome.pending_invite;

            match outcome.decision {
                Decision::Allow => {
                    tracing::info!(location = %target, "navigated");
                    self.arrive(target);
                    return last_redirect.unwrap_or(Decision::Allow);
                }
                Decision::RedirectTo(name, params) => {
                    tracing::debug!(from = %target, to = %name, "redirected");
                    last_redirect = Some(Decision::RedirectTo(name, params.clone()));
                    target = Location::with_params(name, params);
                }
                Decision::Fail(reason) => {
                    tracing::warn!(target = %target, %reason, "navigation refused");
                    return Decision::Fail(reason);
                }
            }
        }

        tracing::warn!(target = %target, "too many redirects");
        Decision::Fail(format!("too many redirects while navigating to {target}"))
    }

    fn arrive(&mut self, location: Location) {
        if let Some(previous) = self.current.replace(location) {
            self.history.push(previous);
        }
    }

    /// Return to the previous location without running the guard
    pub fn go_back(&mut self) -> Option<&Location> {
        let previous = self.history.pop()?;
        self.current = Some(previous);
        self.current.as_ref()
    }
}
