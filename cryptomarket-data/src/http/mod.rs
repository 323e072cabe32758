use crate::error::DataError;
use cryptomarket_instrument::exchange::ExchangeId;
use reqwest::StatusCode;
use serde_json::Value;

/// [`RestClient`](client::RestClient) executing [`RestRequest`]s against a vendor base URL.
pub mod client;

/// HTTP method of a vendor call.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Fully built vendor request, relative to the exchange base URL.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RestRequest {
    pub method: HttpMethod,
    /// Path appended to the base URL, eg/ `/products/ETH-BTC/candles`. Empty for vendors that
    /// dispatch on a query parameter (Poloniex `command`).
    pub path: String,
    pub query: Vec<(String, String)>,
    /// Form-encoded body, only sent when non-empty.
    pub form: Vec<(String, String)>,
}

impl RestRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            form: Vec::new(),
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn queries<Pairs>(mut self, pairs: Pairs) -> Self
    where
        Pairs: IntoIterator<Item = (String, String)>,
    {
        self.query.extend(pairs);
        self
    }

    pub fn form<Pairs>(mut self, pairs: Pairs) -> Self
    where
        Pairs: IntoIterator<Item = (String, String)>,
    {
        self.form.extend(pairs);
        self
    }

    /// Value of the first query parameter named `key`.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

/// Vendor specific translation of HTTP responses into [`DataError`]s.
pub trait HttpParser {
    fn exchange(&self) -> ExchangeId;

    /// Map a non-2xx response payload to a [`DataError`].
    ///
    /// Payloads that are not JSON are passed through as a [`Value::String`].
    fn parse_api_error(&self, status: StatusCode, payload: &Value) -> DataError {
        DataError::Http {
            exchange: self.exchange(),
            status: status.as_u16(),
            message: error_message(payload),
        }
    }

    /// Inspect a 2xx payload for an embedded vendor error (eg/ `{"error": "..."}`).
    fn validate_payload(&self, _payload: &Value) -> Result<(), DataError> {
        Ok(())
    }
}

/// Best effort human readable message from a vendor error payload.
pub fn error_message(payload: &Value) -> String {
    ["message", "error", "msg"]
        .iter()
        .find_map(|key| match payload.get(key) {
            Some(Value::String(message)) => Some(message.clone()),
            Some(Value::Object(inner)) => inner
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_owned),
            _ => None,
        })
        .unwrap_or_else(|| match payload {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
}
