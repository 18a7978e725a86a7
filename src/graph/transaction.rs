//! Transaction Batch Client for the Neo4j transactional HTTP endpoint.
//!
//! One transaction is opened per run. Every statement is its own request
//! inside that transaction and the final commit is checked for errors
//! reported in the response body.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, LOCATION};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, trace};

use super::{cypher, domain::Statement, store::GraphStore};
use crate::{config::ServerSettings, Error, Result};

const REST_ENDPOINT: &str = "/db/data";
const TRANSACTION_ENDPOINT: &str = "/db/data/transaction";

/// Open transaction on the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionHandle {
    id: String,
}

impl TransactionHandle {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Default, Deserialize)]
struct TransactionResponse {
    #[serde(default)]
    errors: Vec<StoreError>,
}

#[derive(Debug, Deserialize)]
struct StoreError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// HTTP client speaking the transactional Cypher protocol.
#[derive(Debug, Clone)]
pub struct TransactionClient {
    http: reqwest::Client,
    root: String,
    user: Option<String>,
    password: Option<String>,
}

impl TransactionClient {
    /// Builds a client for the server described by `settings`.
    ///
    /// # Errors
    ///
    /// Fails when the underlying HTTP client cannot be constructed.
    pub fn new(settings: &ServerSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json; charset=UTF-8"),
        );
        headers.insert("X-Stream", HeaderValue::from_static("true"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|source| Error::Transport {
                url: settings.url.clone(),
                source,
            })?;

        Ok(Self {
            http,
            root: settings.url.trim_end_matches('/').to_string(),
            user: settings.user.clone(),
            password: settings.password.clone(),
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.user {
            Some(user) => request.basic_auth(user, self.password.as_deref()),
            None => request,
        }
    }

    /// Checks that the server answers and accepts the credentials before any
    /// write is attempted.
    ///
    /// # Errors
    ///
    /// [`Error::Unreachable`] when no connection can be made,
    /// [`Error::Unauthorized`] when the server answers 401 or 403.
    pub async fn probe(&self) -> Result<()> {
        for url in [self.root.clone(), format!("{}{REST_ENDPOINT}", self.root)] {
            let response = self
                .authorize(self.http.get(&url))
                .send()
                .await
                .map_err(|source| Error::Unreachable {
                    url: url.clone(),
                    source,
                })?;
            let status = response.status();
            if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
                return Err(Error::Unauthorized {
                    url,
                    status: status.as_u16(),
                });
            }
            info!(%url, status = status.as_u16(), "graph store answered");
        }
        Ok(())
    }

    /// Runs `statements` in a single auto-committed transaction.
    ///
    /// # Errors
    ///
    /// Fails on transport errors, unexpected statuses or reported errors.
    pub async fn run_autocommit(&self, statements: &[Statement]) -> Result<()> {
        let url = format!("{}{TRANSACTION_ENDPOINT}/commit", self.root);
        let body = json!({
            "statements": statements
                .iter()
                .map(|statement| json!({ "statement": cypher::render(statement) }))
                .collect::<Vec<_>>(),
        });
        let response = self.post(&url, &body).await?;
        let parsed = Self::read("autocommit", response).await?;
        if let Some(error) = parsed.errors.first() {
            return Err(Error::statement("autocommit", &error.code, &error.message));
        }
        Ok(())
    }

    async fn post(&self, url: &str, body: &serde_json::Value) -> Result<Response> {
        trace!(%url, %body, "POST");
        self.authorize(self.http.post(url))
            .json(body)
            .send()
            .await
            .map_err(|source| Error::Transport {
                url: url.to_string(),
                source,
            })
    }

    async fn read(operation: &str, response: Response) -> Result<TransactionResponse> {
        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(Error::Unauthorized {
                url: response.url().to_string(),
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(Error::UnexpectedStatus {
                operation: operation.to_string(),
                status: status.as_u16(),
            });
        }
        let text = response.text().await.map_err(|err| Error::malformed(operation, err.to_string()))?;
        if text.trim().is_empty() {
            return Ok(TransactionResponse::default());
        }
        serde_json::from_str(&text).map_err(|err| Error::malformed(operation, err.to_string()))
    }
}

/// Extracts the transaction id from a `location` header value.
fn transaction_id(location: &str) -> Option<&str> {
    location
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty() && !id.contains(':'))
}

#[async_trait]
impl GraphStore for TransactionClient {
    type Handle = TransactionHandle;

    async fn begin(&self) -> Result<TransactionHandle> {
        let url = format!("{}{TRANSACTION_ENDPOINT}", self.root);
        let response = self.post(&url, &json!({ "statements": [] })).await?;
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);
        let parsed = Self::read("begin transaction", response).await?;
        if let Some(error) = parsed.errors.first() {
            return Err(Error::statement("begin transaction", &error.code, &error.message));
        }

        let location = location
            .ok_or_else(|| Error::malformed("begin transaction", "missing location header"))?;
        let id = transaction_id(&location).ok_or_else(|| {
            Error::malformed(
                "begin transaction",
                format!("cannot read transaction id from `{location}`"),
            )
        })?;
        info!(transaction = id, "transaction opened");
        Ok(TransactionHandle { id: id.to_string() })
    }

    async fn submit(&self, handle: &TransactionHandle, statement: &Statement) -> Result<()> {
        let url = format!("{}{TRANSACTION_ENDPOINT}/{}", self.root, handle.id);
        let text = cypher::render(statement);
        debug!(transaction = %handle.id, statement = %text, "submitting statement");
        let body = json!({ "statements": [{ "statement": text }] });
        let response = self.post(&url, &body).await?;
        let parsed = Self::read("statement", response).await?;
        if let Some(error) = parsed.errors.first() {
            return Err(Error::statement(
                format!("statement `{text}`"),
                &error.code,
                &error.message,
            ));
        }
        Ok(())
    }

    async fn commit(&self, handle: TransactionHandle) -> Result<()> {
        let url = format!("{}{TRANSACTION_ENDPOINT}/{}/commit", self.root, handle.id);
        let response = self.post(&url, &json!({ "statements": [] })).await?;
        let parsed = Self::read("commit", response).await?;
        if let Some(error) = parsed.errors.first() {
            return Err(Error::CommitRejected {
                code: error.code.clone(),
                message: error.message.clone(),
            });
        }
        info!(transaction = %handle.id, "transaction committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::transaction_id;

    #[rstest]
    #[case("http://localhost:7474/db/data/transaction/7", Some("7"))]
    #[case("http://localhost:7474/db/data/transaction/42/", Some("42"))]
    #[case("/db/data/transaction/9", Some("9"))]
    #[case("http://localhost:7474", None)]
    #[case("", None)]
    fn reads_transaction_id_from_location(#[case] location: &str, #[case] expected: Option<&str>) {
        assert_eq!(transaction_id(location), expected);
    }
}
