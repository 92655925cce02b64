//! Response envelope normalization.
//!
//! The backend wraps payloads inconsistently: some endpoints return the bare
//! resource, others `{ "data": ... }` or Spring-style `{ "content": ... }`
//! pages. Every response is normalized here, once, so the rest of the crate
//! only sees plain resources and [`Page`]s.

use serde::Deserialize;
use serde_json::Value;

/// A single resource, bare or wrapped.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Data { data: T },
    Content { content: T },
    Bare(T),
}

impl<T> Envelope<T> {
    /// Unwrap the resource.
    pub fn into_inner(self) -> T {
        match self {
            Self::Data { data } | Self::Content { content: data } | Self::Bare(data) => data,
        }
    }
}

/// A list response in any of the shapes the backend emits.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope<T> {
    /// `{ data: [...], total, page, pageSize, totalPages }`
    #[serde(rename_all = "camelCase")]
    Paginated {
        data: Vec<T>,
        #[serde(default)]
        total: Option<u64>,
        #[serde(default)]
        page: Option<u32>,
        #[serde(default)]
        page_size: Option<u32>,
        #[serde(default, alias = "total_pages")]
        total_pages: Option<u32>,
    },
    /// `{ content: [...], totalElements, number, size, totalPages }`
    #[serde(rename_all = "camelCase")]
    Spring {
        content: Vec<T>,
        #[serde(default)]
        total_elements: Option<u64>,
        #[serde(default)]
        number: Option<u32>,
        #[serde(default)]
        size: Option<u32>,
        #[serde(default, alias = "total_pages")]
        total_pages: Option<u32>,
    },
    /// `{ content: { content: [...], ... } }`
    Nested { content: Box<ListEnvelope<T>> },
    Bare(Vec<T>),
}

/// One page of a list, 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Whether a later page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

impl<T> From<ListEnvelope<T>> for Page<T> {
    fn from(envelope: ListEnvelope<T>) -> Self {
        match envelope {
            ListEnvelope::Paginated {
                data,
                total,
                page,
                page_size,
                total_pages,
            } => Self::assemble(data, total, page, page_size, total_pages),
            // Spring pages are 0-based
            ListEnvelope::Spring {
                content,
                total_elements,
                number,
                size,
                total_pages,
            } => Self::assemble(
                content,
                total_elements,
                number.map(|n| n.saturating_add(1)),
                size,
                total_pages,
            ),
            ListEnvelope::Nested { content } => Self::from(*content),
            ListEnvelope::Bare(items) => Self::assemble(items, None, None, None, None),
        }
    }
}

impl<T> Page<T> {
    fn assemble(
        items: Vec<T>,
        total: Option<u64>,
        page: Option<u32>,
        page_size: Option<u32>,
        total_pages: Option<u32>,
    ) -> Self {
        let count = u32::try_from(items.len()).unwrap_or(u32::MAX);
        let page_size = page_size.filter(|size| *size > 0).unwrap_or(count.max(1));
        let total = total.unwrap_or(u64::from(count));
        let total_pages = total_pages.unwrap_or_else(|| {
            u32::try_from(total.div_ceil(u64::from(page_size))).unwrap_or(u32::MAX)
        });

        Self {
            items,
            page: page.unwrap_or(1).max(1),
            page_size,
            total,
            total_pages: total_pages.max(1),
        }
    }
}

/// Message and machine code pulled from an error body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetails {
    pub message: String,
    pub code: Option<String>,
}

/// Extract a human-readable message from an error response body.
///
/// Looks at `message`, `msg`, `error` and `detail` in that order. A body that
/// is not JSON is used as the message itself; an empty one falls back to the
/// status line.
#[must_use]
pub fn error_details(status: reqwest::StatusCode, body: &str) -> ErrorDetails {
    let fallback = || format!("HTTP {status}");

    let Ok(payload) = serde_json::from_str::<Value>(body) else {
        let trimmed = body.trim();
        return ErrorDetails {
            message: if trimmed.is_empty() {
                fallback()
            } else {
                trimmed.to_string()
            },
            code: None,
        };
    };

    let message = ["message", "msg", "error", "detail"]
        .iter()
        .find_map(|key| match payload.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            // `{"error": {"message": "..."}}`
            Some(Value::Object(inner)) => inner
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        })
        .or_else(|| match &payload {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            _ => None,
        })
        .unwrap_or_else(fallback);

    let code = ["code", "errorCode", "error_code"]
        .iter()
        .find_map(|key| payload.get(key).and_then(Value::as_str))
        .or_else(|| {
            payload
                .get("error")
                .and_then(|inner| inner.get("code"))
                .and_then(Value::as_str)
        })
        .map(str::to_string);

    ErrorDetails { message, code }
}
