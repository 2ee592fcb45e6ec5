//! Route table and path resolution

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Path prefix of the sign-in / sign-up section
pub const AUTH_PREFIX: &str = "/auth";

/// Where signed-in users land
pub const HOME: RouteName = RouteName::Surveys;

pub type Params = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteName {
    Login,
    Register,
    RegisterBusiness,
    Invite,
    Dashboard,
    Surveys,
    Survey,
    Settings,
    SaveParticipant,
    ShareLink,
    ThankYou,
    SurveyInterviewFinished,
    SaveResponse,
}

/// Requirements a route declares to the guard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteMeta {
    pub requires_auth: bool,
    pub requires_business_info: bool,
}

const PUBLIC: RouteMeta = RouteMeta {
    requires_auth: false,
    requires_business_info: false,
};
const AUTHENTICATED: RouteMeta = RouteMeta {
    requires_auth: true,
    requires_business_info: false,
};
const BUSINESS: RouteMeta = RouteMeta {
    requires_auth: true,
    requires_business_info: true,
};

#[derive(Clone, Copy)]
struct RouteDef {
    pattern: &'static str,
    meta: RouteMeta,
    redirect: Option<RouteName>,
}

const fn route(pattern: &'static str, meta: RouteMeta) -> RouteDef {
    RouteDef {
        pattern,
        meta,
        redirect: None,
    }
}

/// Matched in order; static segments come before dynamic ones
const ROUTES: &[RouteName] = &[
    RouteName::Login,
    RouteName::Register,
    RouteName::RegisterBusiness,
    RouteName::Invite,
    RouteName::Dashboard,
    RouteName::Surveys,
    RouteName::Survey,
    RouteName::Settings,
    RouteName::SaveParticipant,
    RouteName::ShareLink,
    RouteName::ThankYou,
    RouteName::SurveyInterviewFinished,
    RouteName::SaveResponse,
];

impl RouteName {
    const fn def(self) -> RouteDef {
        match self {
            Self::Login => route("/auth/login", PUBLIC),
            Self::Register => route("/auth/register", PUBLIC),
            Self::RegisterBusiness => route("/start", AUTHENTICATED),
            Self::Invite => route("/start/invite/:token", AUTHENTICATED),
            Self::Dashboard => RouteDef {
                pattern: "/",
                meta: BUSINESS,
                redirect: Some(Self::Surveys),
            },
            Self::Surveys => route("/surveys", BUSINESS),
            Self::Survey => route("/survey/:id", BUSINESS),
            Self::Settings => route("/settings", BUSINESS),
            Self::SaveParticipant => route("/ask/participant/:surveyId", PUBLIC),
            Self::ShareLink => route("/ask/share-link/:surveyId/:participantId", PUBLIC),
            Self::ThankYou => route("/ask/thank-you", PUBLIC),
            Self::SurveyInterviewFinished => route("/ask/finished", PUBLIC),
            Self::SaveResponse => route("/ask/:surveyId/:participantId", PUBLIC),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Register => "register",
            Self::RegisterBusiness => "register-business",
            Self::Invite => "invite",
            Self::Dashboard => "dashboard",
            Self::Surveys => "surveys",
            Self::Survey => "survey",
            Self::Settings => "settings",
            Self::SaveParticipant => "save-participant",
            Self::ShareLink => "share-link",
            Self::ThankYou => "thank-you",
            Self::SurveyInterviewFinished => "survey-interview-finished",
            Self::SaveResponse => "save-response",
        }
    }

    pub fn pattern(&self) -> &'static str {
        self.def().pattern
    }

    pub fn meta(&self) -> RouteMeta {
        self.def().meta
    }

    /// Route this one always forwards to
    pub fn redirect(&self) -> Option<RouteName> {
        self.def().redirect
    }
}

impl fmt::Display for RouteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouteName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ROUTES
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| format!("unknown route: {s}"))
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// A resolved navigation target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub name: RouteName,
    pub params: Params,
    pub query: Params,
}

impl Location {
    pub fn new(name: RouteName) -> Self {
        Self {
            name,
            params: Params::new(),
            query: Params::new(),
        }
    }

    pub fn with_params(name: RouteName, params: Params) -> Self {
        Self {
            name,
            params,
            query: Params::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: &str) -> Self {
        self.params.insert(key.to_string(), value.to_string());
        self
    }

    /// Match a path (with optional query string) against the route table
    pub fn resolve(path: &str) -> Option<Self> {
        let (path, query) = match path.split_once('?') {
            Some((path, query)) => (path, query),
            None => (path, ""),
        };
        let parts: Vec<&str> = segments(path).collect();

        ROUTES.iter().find_map(|&name| {
            let pattern: Vec<&str> = segments(name.pattern()).collect();
            if pattern.len() != parts.len() {
                return None;
            }

            let mut params = Params::new();
            for (expected, actual) in pattern.iter().zip(&parts) {
                match expected.strip_prefix(':') {
                    Some(key) => {
                        params.insert(key.to_string(), (*actual).to_string());
                    }
                    None if expected == actual => {}
                    None => return None,
                }
            }

            Some(Self {
                name,
                params,
                query: url::form_urlencoded::parse(query.as_bytes())
                    .into_owned()
                    .collect(),
            })
        })
    }

    /// Concrete path with parameters substituted
    pub fn path(&self) -> String {
        let parts: Vec<&str> = segments(self.name.pattern())
            .map(|segment| match segment.strip_prefix(':') {
                Some(key) => self.params.get(key).map(String::as_str).unwrap_or(""),
                None => segment,
            })
            .collect();
        format!("/{}", parts.join("/"))
    }

    pub fn meta(&self) -> RouteMeta {
        self.name.meta()
    }

    pub fn is_auth_section(&self) -> bool {
        let path = self.path();
        path == AUTH_PREFIX || path.starts_with(&format!("{AUTH_PREFIX}/"))
    }

    /// Invite token carried as the `token` path parameter or query value
    pub fn invite_token(&self) -> Option<&str> {
        self.params
            .get("token")
            .or_else(|| self.query.get("token"))
            .map(String::as_str)
            .filter(|t| !t.is_empty())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.path())
    }
}
