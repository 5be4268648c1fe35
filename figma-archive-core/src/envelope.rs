//! Transport-neutral response wrapper.
//!
//! Both backends answer every request with an [`Envelope`]. Absent and
//! malformed resources are represented as a 404 envelope without data rather
//! than as errors, so callers inspect `status` the same way whichever backend
//! produced the response.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const STATUS_OK: u16 = 200;
pub const STATUS_NOT_FOUND: u16 = 404;

pub const CONTENT_TYPE: &str = "content-type";
pub const CONTENT_LENGTH: &str = "content-length";
pub const CONTENT_ENCODING: &str = "content-encoding";

/// Response headers keyed by lower-cased name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.0
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.get(CONTENT_TYPE)
    }

    pub fn content_length(&self) -> Option<u64> {
        self.get(CONTENT_LENGTH)?.parse().ok()
    }

    pub fn content_encoding(&self) -> Option<&str> {
        self.get(CONTENT_ENCODING)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Status, headers and (possibly absent) payload of one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T = Value> {
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T, headers: Headers) -> Self {
        Self {
            status: STATUS_OK,
            status_text: "OK".into(),
            headers,
            data: Some(data),
        }
    }

    /// The uniform failure envelope: 404, no data, no headers.
    pub fn not_found() -> Self {
        Self {
            status: STATUS_NOT_FOUND,
            status_text: "Not Found".into(),
            headers: Headers::new(),
            data: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Keeps status and headers, transforming the payload if there is one.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope {
            status: self.status,
            status_text: self.status_text,
            headers: self.headers,
            data: self.data.map(f),
        }
    }

    /// Same status and headers with the payload dropped.
    pub fn without_data<U>(self) -> Envelope<U> {
        Envelope {
            status: self.status,
            status_text: self.status_text,
            headers: self.headers,
            data: None,
        }
    }
}

impl Envelope<Value> {
    /// Decodes the payload into `T`.
    ///
    /// A payload that does not fit `T` is a malformed resource and yields
    /// [`Envelope::not_found`], same as a missing one.
    pub fn decode<T: DeserializeOwned>(self) -> Envelope<T> {
        let Some(data) = self.data else {
            return self.without_data();
        };
        match serde_json::from_value(data) {
            Ok(decoded) => Envelope {
                status: self.status,
                status_text: self.status_text,
                headers: self.headers,
                data: Some(decoded),
            },
            Err(err) => {
                tracing::warn!(
                    "payload does not decode as {}: {err}",
                    std::any::type_name::<T>()
                );
                Envelope::not_found()
            }
        }
    }
}
