//! Maps failed responses to user-facing [`ApiError`]s.
//!
//! Rules are looked up top to bottom and the first match wins, so rows that
//! name a resource sit above the catch-all rows.

use serde_json::Value;

use super::types::{ApiError, ErrorKind, DRIVERS, USERS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    GetOne,
    Create,
    Update,
    Delete,
}

/// What a failed call was doing, used to pick and fill an error rule.
#[derive(Debug, Clone, Copy)]
pub struct ErrorContext<'a> {
    pub resource: &'a str,
    pub operation: Operation,
    pub id: Option<&'a str>,
}

impl<'a> ErrorContext<'a> {
    pub fn new(resource: &'a str, operation: Operation) -> Self {
        Self {
            resource,
            operation,
            id: None,
        }
    }

    pub fn with_id(mut self, id: &'a str) -> Self {
        self.id = Some(id);
        self
    }
}

#[derive(Debug, Clone, Copy)]
enum StatusMatch {
    Exact(u16),
    ServerError,
    Any,
}

impl StatusMatch {
    fn matches(&self, status: u16) -> bool {
        match self {
            StatusMatch::Exact(code) => *code == status,
            StatusMatch::ServerError => (500..=599).contains(&status),
            StatusMatch::Any => true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Message {
    /// Always this text, with placeholders filled.
    Text(&'static str),
    /// The server's detail when it sent one, otherwise this text.
    DetailOr(&'static str),
}

#[derive(Debug, Clone, Copy)]
struct ErrorRule {
    resource: Option<&'static str>,
    operations: Option<&'static [Operation]>,
    status: StatusMatch,
    kind: ErrorKind,
    message: Message,
}

impl ErrorRule {
    fn applies(&self, ctx: &ErrorContext<'_>, status: u16) -> bool {
        self.resource.map_or(true, |r| r == ctx.resource)
            && self
                .operations
                .map_or(true, |ops| ops.contains(&ctx.operation))
            && self.status.matches(status)
    }
}

const WRITES: &[Operation] = &[Operation::Create, Operation::Update];
const MUTATIONS: &[Operation] = &[Operation::Create, Operation::Update, Operation::Delete];
const ADDRESSED: &[Operation] = &[Operation::GetOne, Operation::Update, Operation::Delete];

const fn rule(
    resource: Option<&'static str>,
    operations: Option<&'static [Operation]>,
    status: StatusMatch,
    kind: ErrorKind,
    message: Message,
) -> ErrorRule {
    ErrorRule {
        resource,
        operations,
        status,
        kind,
        message,
    }
}

const RULES: &[ErrorRule] = &[
    rule(
        Some(USERS),
        Some(WRITES),
        StatusMatch::Exact(409),
        ErrorKind::Conflict,
        Message::Text("A user with this username or email already exists"),
    ),
    rule(
        Some(USERS),
        Some(MUTATIONS),
        StatusMatch::Exact(403),
        ErrorKind::AccessDenied,
        Message::Text("Administrator access required to manage users"),
    ),
    rule(
        Some(USERS),
        Some(&[Operation::Delete]),
        StatusMatch::Exact(400),
        ErrorKind::ValidationFailed,
        Message::DetailOr("This user cannot be deleted"),
    ),
    rule(
        Some(DRIVERS),
        Some(WRITES),
        StatusMatch::Exact(409),
        ErrorKind::Conflict,
        Message::Text("A driver with this reference or code already exists"),
    ),
    rule(
        Some(DRIVERS),
        Some(&[Operation::Delete]),
        StatusMatch::Exact(409),
        ErrorKind::Conflict,
        Message::Text("This driver still has related race results and cannot be deleted"),
    ),
    rule(
        Some(DRIVERS),
        Some(MUTATIONS),
        StatusMatch::Exact(403),
        ErrorKind::AccessDenied,
        Message::Text("Administrator access required to modify drivers"),
    ),
    rule(
        None,
        None,
        StatusMatch::Exact(401),
        ErrorKind::AuthRequired,
        Message::Text("Your session has expired. Please log in again."),
    ),
    rule(
        None,
        None,
        StatusMatch::Exact(403),
        ErrorKind::AuthRequired,
        Message::Text("You are not allowed to access {resource}"),
    ),
    rule(
        None,
        Some(ADDRESSED),
        StatusMatch::Exact(404),
        ErrorKind::NotFound,
        Message::Text("{Resource} {id} not found"),
    ),
    rule(
        None,
        Some(WRITES),
        StatusMatch::Exact(409),
        ErrorKind::Conflict,
        Message::DetailOr("This record conflicts with an existing one"),
    ),
    rule(
        None,
        None,
        StatusMatch::Exact(422),
        ErrorKind::ValidationFailed,
        Message::Text("Validation failed: {detail}"),
    ),
    rule(
        None,
        None,
        StatusMatch::Exact(400),
        ErrorKind::ValidationFailed,
        Message::DetailOr("The request was invalid"),
    ),
    rule(
        None,
        None,
        StatusMatch::ServerError,
        ErrorKind::ServerFault,
        Message::Text("The server encountered an error. Please try again later."),
    ),
    rule(
        None,
        None,
        StatusMatch::Any,
        ErrorKind::RequestFailed,
        Message::DetailOr("Request failed with status {status}"),
    ),
];

/// Builds the error for a non-success `status`. `body` is the raw response
/// text; its detail is used for messages and kept in `details`.
pub fn map_status(ctx: &ErrorContext<'_>, status: u16, body: &str) -> ApiError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let detail = parsed.as_ref().and_then(extract_detail);

    // The final row matches any status, so a rule is always found.
    let (kind, message) = RULES
        .iter()
        .find(|rule| rule.applies(ctx, status))
        .map(|rule| (rule.kind, render(rule.message, ctx, status, detail.as_deref())))
        .unwrap_or_else(|| {
            (
                ErrorKind::Unknown,
                format!("Request failed with status {}", status),
            )
        });

    log::debug!(
        "{} {:?} failed with {} -> {}",
        ctx.resource,
        ctx.operation,
        status,
        kind.as_code()
    );

    let error = ApiError::new(kind, message).with_status(status);
    match parsed {
        Some(body) => error.with_details(body),
        None => error,
    }
}

/// Pulls a readable message out of an error body. Understands FastAPI's
/// `{"detail": "..."}` and `{"detail": [{"msg": "..."}]}` shapes, plus
/// `error` and `message` fields.
pub fn extract_detail(body: &Value) -> Option<String> {
    let text = match body.get("detail") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Array(items)) => {
            let messages: Vec<String> = items
                .iter()
                .filter_map(|item| {
                    let msg = item.get("msg").and_then(Value::as_str)?;
                    let field = item
                        .get("loc")
                        .and_then(Value::as_array)
                        .and_then(|loc| loc.last())
                        .and_then(Value::as_str);
                    Some(match field {
                        Some(field) => format!("{}: {}", field, msg),
                        None => msg.to_string(),
                    })
                })
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    };

    text.or_else(|| {
        ["error", "message"]
            .iter()
            .find_map(|key| body.get(*key).and_then(Value::as_str))
            .map(str::to_string)
    })
    .map(|s| s.trim().to_string())
    .filter(|s| !s.is_empty())
}

fn render(message: Message, ctx: &ErrorContext<'_>, status: u16, detail: Option<&str>) -> String {
    let template = match (message, detail) {
        (Message::DetailOr(_), Some(detail)) => return detail.to_string(),
        (Message::DetailOr(template) | Message::Text(template), _) => template,
    };
    template
        .replace("{Resource}", &capitalized_singular(ctx.resource))
        .replace("{resource}", ctx.resource)
        .replace("{id}", ctx.id.unwrap_or("record"))
        .replace("{status}", &status.to_string())
        .replace("{detail}", detail.unwrap_or("invalid input"))
}

fn capitalized_singular(resource: &str) -> String {
    let singular = resource.strip_suffix('s').unwrap_or(resource);
    let mut chars = singular.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::from("Record"),
    }
}
