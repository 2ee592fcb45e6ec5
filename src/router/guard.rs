//! Navigation guard
//!
//! Runs before every navigation and decides whether the target may be shown.
//! The session is fetched fresh each time; company membership is fetched only
//! when the target needs it. The pending invite token travels in the request
//! and comes back, possibly changed, in the outcome.

use super::routes::{Location, Params, RouteName, HOME};
use crate::backend::BackendClientTrait;
use crate::stores::{AuthStore, CompanyStore};
use anyhow::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    RedirectTo(RouteName, Params),
    Fail(String),
}

impl Decision {
    fn redirect(name: RouteName) -> Self {
        Self::RedirectTo(name, Params::new())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    pub target: Location,
    pub pending_invite: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationOutcome {
    pub decision: Decision,
    pub pending_invite: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Policy {
    /// Protected target without a session: remember the invite, go sign in
    RequireSession,
    /// Signed-in users skip the auth pages
    LeaveAuthSection,
    /// Business pages need a company, or an invite to join one
    RequireBusiness,
}

/// First matching policy wins; no match allows the navigation
const POLICIES: [Policy; 3] = [
    Policy::RequireSession,
    Policy::LeaveAuthSection,
    Policy::RequireBusiness,
];

struct GuardContext<'a> {
    backend: &'a dyn BackendClientTrait,
    auth: &'a AuthStore,
    company: &'a mut CompanyStore,
    target: &'a Location,
    pending_invite: &'a mut Option<String>,
}

impl Policy {
    async fn evaluate(self, ctx: &mut GuardContext<'_>) -> Result<Option<Decision>> {
        let meta = ctx.target.meta();
        match self {
            Self::RequireSession => {
                if !meta.requires_auth || ctx.auth.is_authenticated() {
                    return Ok(None);
                }
                if let Some(token) = ctx.target.invite_token() {
                    tracing::debug!("keeping invite token until sign-in");
                    *ctx.pending_invite = Some(token.to_string());
                }
                Ok(Some(Decision::redirect(RouteName::Login)))
            }
            Self::LeaveAuthSection => {
                if ctx.auth.is_authenticated() && ctx.target.is_auth_section() {
                    Ok(Some(Decision::redirect(HOME)))
                } else {
                    Ok(None)
                }
            }
            Self::RequireBusiness => {
                if !meta.requires_business_info {
                    return Ok(None);
                }
                if let Some(token) = ctx.pending_invite.take() {
                    let mut params = Params::new();
                    params.insert("token".to_string(), token);
                    return Ok(Some(Decision::RedirectTo(RouteName::Invite, params)));
                }
                match ctx.company.get_company(ctx.backend).await? {
                    Some(_) => Ok(Some(Decision::Allow)),
                    None => Ok(Some(Decision::redirect(RouteName::RegisterBusiness))),
                }
            }
        }
    }
}

/// Decide a navigation. Backend failures are returned as errors.
pub async fn guard(
    backend: &dyn BackendClientTrait,
    auth: &mut AuthStore,
    company: &mut CompanyStore,
    request: NavigationRequest,
) -> Result<NavigationOutcome> {
    auth.fetch_session(backend).await?;

    let NavigationRequest {
        target,
        mut pending_invite,
    } = request;
    let mut ctx = GuardContext {
        backend,
        auth: &*auth,
        company,
        target: &target,
        pending_invite: &mut pending_invite,
    };

    let mut decision = Decision::Allow;
    for policy in POLICIES {
        if let Some(matched) = policy.evaluate(&mut ctx).await? {
            tracing::debug!(?policy, ?matched, target = %target, "guard decided");
            decision = matched;
            break;
        }
    }

    Ok(NavigationOutcome {
        decision,
        pending_invite,
    })
}
