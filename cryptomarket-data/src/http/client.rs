use crate::{
    error::DataError,
    http::{HttpParser, RestRequest},
};
use reqwest::{StatusCode, header::RETRY_AFTER};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Executes [`RestRequest`]s against a single vendor base URL, translating failures via the
/// vendor's [`HttpParser`].
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
}

impl RestClient {
    /// Construct a [`RestClient`] for the provided base URL (eg/ `https://poloniex.com/public`).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DataError> {
        let base_url = Url::parse(base_url)
            .map_err(|error| DataError::InvalidArgument(format!("base url {base_url}: {error}")))?;

        if base_url.cannot_be_a_base() {
            return Err(DataError::InvalidArgument(format!(
                "base url {base_url} cannot be a base"
            )));
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full URL of a [`RestRequest`]: the request path is appended to the base URL path.
    pub fn url(&self, request: &RestRequest) -> Url {
        let mut url = self.base_url.clone();
        let path = format!(
            "{}{}",
            self.base_url.path().trim_end_matches('/'),
            request.path
        );
        url.set_path(&path);
        url
    }

    /// Execute a [`RestRequest`], returning the JSON payload of a successful response.
    pub async fn execute<Parser>(
        &self,
        parser: &Parser,
        request: &RestRequest,
    ) -> Result<Value, DataError>
    where
        Parser: HttpParser + ?Sized,
    {
        let url = self.url(request);

        debug!(
            method = ?request.method,
            %url,
            query = ?request.query,
            "sending request"
        );

        let mut builder = self
            .http
            .request(request.method.into(), url)
            .query(&request.query);

        if !request.form.is_empty() {
            builder = builder.form(&request.form);
        }

        let response = builder.send().await?;
        let status = response.status();
        let retry_after = retry_after(response.headers());
        let bytes = response.bytes().await?;

        debug!(%status, bytes = bytes.len(), "received response");

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!(exchange = %parser.exchange(), ?retry_after, "rate limited");
            return Err(DataError::RateLimit {
                exchange: parser.exchange(),
                retry_after,
            });
        }

        let payload = serde_json::from_slice::<Value>(&bytes);

        if !status.is_success() {
            let payload = payload
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
            let error = parser.parse_api_error(status, &payload);
            warn!(%error, "request failed");
            return Err(error);
        }

        let payload = payload.map_err(|error| DataError::malformed(parser.exchange(), error))?;
        parser.validate_payload(&payload)?;

        Ok(payload)
    }
}

/// Parse a `Retry-After` header expressed in seconds.
fn retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};

    #[test]
    fn test_url_joins_base_path() {
        let client = RestClient::new("https://poloniex.com/public", Duration::from_secs(1)).unwrap();
        let url = client.url(&RestRequest::get(""));
        assert_eq!(url.as_str(), "https://poloniex.com/public");

        let client = RestClient::new("https://www.bitmex.com/api/v1/", Duration::from_secs(1)).unwrap();
        let url = client.url(&RestRequest::get("/trade/bucketed"));
        assert_eq!(url.as_str(), "https://www.bitmex.com/api/v1/trade/bucketed");
    }

    #[test]
    fn test_new_rejects_invalid_base_url() {
        assert!(matches!(
            RestClient::new("not a url", Duration::from_secs(1)),
            Err(DataError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_retry_after() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(7)));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(retry_after(&headers), None);
    }
}
