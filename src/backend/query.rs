//! PostgREST request description
//!
//! A [`TableQuery`] captures table, select expression, filters, ordering and
//! result shape. The client turns it into an HTTP request.

use std::fmt;

/// Nested select expressions used by the stores
pub mod select {
    pub const ALL: &str = "*";
    pub const COMPANY_ID: &str = "company_id";
    pub const COMPANY_WITH_MEMBERS: &str = "*, users(*), people(*)";
    pub const SURVEY_WITH_STATUS: &str = "*, survey_status(*)";
    pub const SURVEY_DETAIL: &str = "*, survey_status(*), questions(*, options(*), question_types(*))";
    pub const RESPONSE_DETAIL: &str = "*, respondents(*), surveys(*, questions(*, question_types(*), options(*), answers(*, answer_options(*))))";
    pub const INVITE_WITH_COMPANY: &str = "*, companies(*)";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Post,
    Patch,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Eq(String, String),
}

impl Filter {
    fn to_pair(&self) -> (String, String) {
        match self {
            Self::Eq(column, value) => (column.clone(), format!("eq.{value}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = if self.ascending { "asc" } else { "desc" };
        write!(f, "{}.{}", self.column, direction)
    }
}

/// Expected shape of the result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shape {
    #[default]
    Many,
    /// Exactly one row, returned as an object
    Single,
    /// Only the exact row count
    Count,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableQuery {
    pub method: Method,
    pub table: String,
    pub select: Option<String>,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
    pub shape: Shape,
    pub body: Option<serde_json::Value>,
}

impl TableQuery {
    fn new(method: Method, table: &str) -> Self {
        Self {
            method,
            table: table.to_string(),
            select: None,
            filters: Vec::new(),
            order: None,
            limit: None,
            shape: Shape::Many,
            body: None,
        }
    }

    pub fn select(table: &str, columns: &str) -> Self {
        let mut query = Self::new(Method::Get, table);
        query.select = Some(columns.to_string());
        query
    }

    /// Exact row count without fetching rows
    pub fn count(table: &str) -> Self {
        let mut query = Self::new(Method::Head, table);
        query.select = Some(select::ALL.to_string());
        query.shape = Shape::Count;
        query
    }

    /// Insert and return the stored rows
    pub fn insert(table: &str, body: serde_json::Value) -> Self {
        let mut query = Self::new(Method::Post, table);
        query.select = Some(select::ALL.to_string());
        query.body = Some(body);
        query
    }

    /// Update matching rows and return them
    pub fn update(table: &str, body: serde_json::Value) -> Self {
        let mut query = Self::new(Method::Patch, table);
        query.select = Some(select::ALL.to_string());
        query.body = Some(body);
        query
    }

    pub fn delete(table: &str) -> Self {
        Self::new(Method::Delete, table)
    }

    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push(Filter::Eq(column.to_string(), value.to_string()));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn single(mut self) -> Self {
        self.shape = Shape::Single;
        self
    }

    /// Relative path below the REST root
    pub fn path(&self) -> String {
        format!("rest/v1/{}", self.table)
    }

    /// Query string pairs in a stable order
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(select) = &self.select {
            pairs.push(("select".to_string(), compact_select(select)));
        }
        pairs.extend(self.filters.iter().map(Filter::to_pair));
        if let Some(order) = &self.order {
            pairs.push(("order".to_string(), order.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }

    /// Extra headers required by the method and result shape
    pub fn headers(&self) -> Vec<(&'static str, &'static str)> {
        let mut headers = Vec::new();
        match self.method {
            Method::Post | Method::Patch => headers.push(("Prefer", "return=representation")),
            Method::Head => headers.push(("Prefer", "count=exact")),
            _ => {}
        }
        if self.shape == Shape::Single {
            headers.push(("Accept", "application/vnd.pgrst.object+json"));
        }
        headers
    }
}

/// PostgREST rejects whitespace inside select expressions
fn compact_select(select: &str) -> String {
    select.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Parse the total from a `Content-Range` header such as `0-24/3573` or `*/0`
pub fn parse_content_range(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.parse().ok()
}
