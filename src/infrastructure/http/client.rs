use super::envelope::ApiEnvelope;
use crate::application::session::Session;
use crate::config::ClientConfig;
use crate::error::{Result, ShopError};
use reqwest::multipart::Form;
use reqwest::{RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

const ERROR_BODY_LIMIT: usize = 200;

/// The shared REST client.
///
/// Attaches the session's bearer token to every request, parses every answer
/// into an [`ApiEnvelope`] once, and expires the session on a 401. Cloning is
/// cheap and shares the connection pool.
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<Session>,
}

impl RestClient {
    pub fn new(config: &ClientConfig, session: Arc<Session>) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.response_timeout)
            .user_agent(concat!("shopdesk/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url().to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Option<T>> {
        let request = match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().path().to_string();
        debug!(%url, status = status.as_u16(), "response received");

        if status == StatusCode::UNAUTHORIZED {
            warn!(%url, "token rejected, login required");
            self.session.expire();
            return Err(ShopError::Unauthorized);
        }

        let body = response.bytes().await?;
        match serde_json::from_slice::<ApiEnvelope<T>>(&body) {
            Ok(envelope) => envelope.into_data(),
            Err(_) if !status.is_success() => {
                let text = String::from_utf8_lossy(&body);
                Err(ShopError::HttpStatus {
                    status: status.as_u16(),
                    body: text.chars().take(ERROR_BODY_LIMIT).collect(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn required<T>(data: Option<T>) -> Result<T> {
        data.ok_or_else(|| ShopError::Api("Response contained no data".to_string()))
    }

    pub async fn get<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        debug!(path, "GET");
        let data = self.send(self.http.get(self.url(path)).query(query)).await?;
        Self::required(data)
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(path, "POST json");
        let data = self.send(self.http.post(self.url(path)).json(body)).await?;
        Self::required(data)
    }

    /// Posts url-encoded fields; keys may repeat. The payload, if any, is ignored.
    pub async fn post_form(&self, path: &str, fields: &[(String, String)]) -> Result<()> {
        debug!(path, fields = fields.len(), "POST form");
        self.send::<serde_json::Value>(self.http.post(self.url(path)).form(fields))
            .await?;
        Ok(())
    }

    pub async fn post_multipart<T: DeserializeOwned>(&self, path: &str, form: Form) -> Result<T> {
        debug!(path, "POST multipart");
        let data = self.send(self.http.post(self.url(path)).multipart(form)).await?;
        Self::required(data)
    }
}
