//! Generic CRUD against `{base}/{resource}` endpoints.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::{
    header::{HeaderMap, CONTENT_RANGE},
    Method,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{
    client::{parse_optional_json, ApiClient},
    errors::{ErrorContext, Operation},
    types::ApiError,
    validation,
};

const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'?')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}');

const TOTAL_COUNT_HEADER: &str = "x-total-count";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordId::Int(id) => write!(f, "{}", id),
            RecordId::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        RecordId::Int(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        RecordId::Text(id.to_string())
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        RecordId::Text(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based.
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
}

impl Sort {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListParams {
    pub pagination: Pagination,
    pub sort: Option<Sort>,
    pub filter: Map<String, Value>,
}

impl ListParams {
    pub fn page(page: u32, per_page: u32) -> Self {
        Self {
            pagination: Pagination { page, per_page },
            ..Self::default()
        }
    }

    pub fn sorted_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some(Sort::new(field, order));
        self
    }

    pub fn filter_by(mut self, field: impl Into<String>, value: Value) -> Self {
        self.filter.insert(field.into(), value);
        self
    }

    /// Query pairs in the `_start`/`_end`/`_sort`/`_order` form the API reads.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let page = self.pagination.page.max(1) as u64;
        let per_page = self.pagination.per_page as u64;
        let mut query = vec![
            ("_start".to_string(), ((page - 1) * per_page).to_string()),
            ("_end".to_string(), (page * per_page).to_string()),
        ];
        if let Some(sort) = &self.sort {
            query.push(("_sort".to_string(), sort.field.clone()));
            query.push(("_order".to_string(), sort.order.as_str().to_string()));
        }
        for (field, value) in &self.filter {
            push_filter(&mut query, field, value);
        }
        query
    }
}

fn push_filter(query: &mut Vec<(String, String)>, field: &str, value: &Value) {
    match value {
        Value::Null => {}
        Value::String(s) => query.push((field.to_string(), s.clone())),
        Value::Array(items) => {
            for item in items {
                push_filter(query, field, item);
            }
        }
        other => query.push((field.to_string(), other.to_string())),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListResult {
    pub records: Vec<Value>,
    pub total: u64,
}

impl ApiClient {
    pub async fn list(&self, resource: &str, params: &ListParams) -> Result<ListResult, ApiError> {
        let ctx = ErrorContext::new(resource, Operation::List);
        let url = self.endpoint(&encode_segment(resource)).await;
        let request = self
            .authorized(Method::GET, &url)?
            .query(&params.to_query());
        let response = self.send_checked(&ctx, request).await?;
        let header_total = total_from_headers(response.headers());
        let body = parse_optional_json(response).await?;
        let result = list_result(body, header_total)?;
        log::debug!(
            "{}: {} records of {}",
            resource,
            result.records.len(),
            result.total
        );
        Ok(result)
    }

    pub async fn get_one(&self, resource: &str, id: &RecordId) -> Result<Value, ApiError> {
        let id_text = id.to_string();
        let ctx = ErrorContext::new(resource, Operation::GetOne).with_id(&id_text);
        let url = self.record_url(resource, &id_text).await;
        let request = self.authorized(Method::GET, &url)?;
        let response = self.send_checked(&ctx, request).await?;
        parse_optional_json(response)
            .await?
            .ok_or_else(|| ApiError::unknown(format!("{} {} returned no data", resource, id)))
    }

    pub async fn create(&self, resource: &str, data: &Value) -> Result<Value, ApiError> {
        validation::validate(resource, Operation::Create, data)?;
        let ctx = ErrorContext::new(resource, Operation::Create);
        let url = self.endpoint(&encode_segment(resource)).await;
        let request = self.authorized(Method::POST, &url)?.json(data);
        let response = self.send_checked(&ctx, request).await?;
        let created = parse_optional_json(response)
            .await?
            .ok_or_else(|| ApiError::unknown(format!("Creating {} returned no data", resource)))?;
        log::info!("Created {} {}", resource, created.get("id").unwrap_or(&Value::Null));
        Ok(created)
    }

    pub async fn update(
        &self,
        resource: &str,
        id: &RecordId,
        data: &Value,
    ) -> Result<Value, ApiError> {
        validation::validate(resource, Operation::Update, data)?;
        let id_text = id.to_string();
        let ctx = ErrorContext::new(resource, Operation::Update).with_id(&id_text);
        let url = self.record_url(resource, &id_text).await;
        let request = self.authorized(Method::PUT, &url)?.json(data);
        let response = self.send_checked(&ctx, request).await?;
        let updated = match parse_optional_json(response).await? {
            Some(record) => record,
            None => with_id(data.clone(), id),
        };
        log::info!("Updated {} {}", resource, id);
        Ok(updated)
    }

    pub async fn delete(&self, resource: &str, id: &RecordId) -> Result<Value, ApiError> {
        let id_text = id.to_string();
        let ctx = ErrorContext::new(resource, Operation::Delete).with_id(&id_text);
        let url = self.record_url(resource, &id_text).await;
        let request = self.authorized(Method::DELETE, &url)?;
        let response = self.send_checked(&ctx, request).await?;
        let deleted = match parse_optional_json(response).await? {
            Some(record) if record.get("id").is_some() => record,
            _ => json!({ "id": id }),
        };
        log::info!("Deleted {} {}", resource, id);
        Ok(deleted)
    }

    async fn record_url(&self, resource: &str, id: &str) -> String {
        self.endpoint(&format!(
            "{}/{}",
            encode_segment(resource),
            encode_segment(id)
        ))
        .await
    }
}

pub(crate) fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

fn with_id(data: Value, id: &RecordId) -> Value {
    match data {
        Value::Object(mut map) => {
            map.entry("id").or_insert_with(|| json!(id));
            Value::Object(map)
        }
        _ => json!({ "id": id }),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn total_from_headers(headers: &HeaderMap) -> Option<u64> {
    header_str(headers, TOTAL_COUNT_HEADER)
        .and_then(|v| v.trim().parse().ok())
        .or_else(|| header_str(headers, CONTENT_RANGE.as_str()).and_then(parse_content_range))
}

/// `users 0-24/319` -> 319
fn parse_content_range(value: &str) -> Option<u64> {
    value.rsplit('/').next()?.trim().parse().ok()
}

fn list_result(body: Option<Value>, header_total: Option<u64>) -> Result<ListResult, ApiError> {
    let (records, body_total) = match body {
        None | Some(Value::Null) => (Vec::new(), None),
        Some(Value::Array(records)) => (records, None),
        Some(Value::Object(mut envelope)) => {
            let records = ["items", "data", "results"]
                .iter()
                .find_map(|key| match envelope.remove(*key) {
                    Some(Value::Array(records)) => Some(records),
                    _ => None,
                })
                .ok_or_else(|| ApiError::unknown("List response has no records"))?;
            let total = ["total", "count"]
                .iter()
                .find_map(|key| envelope.get(*key).and_then(Value::as_u64));
            (records, total)
        }
        Some(_) => return Err(ApiError::unknown("Unexpected list response")),
    };
    let total = header_total
        .or(body_total)
        .unwrap_or(records.len() as u64);
    Ok(ListResult { records, total })
}
