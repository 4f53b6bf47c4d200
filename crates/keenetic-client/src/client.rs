//! Keenetic RCI HTTP client.

use crate::auth::{password_hash, CHALLENGE_HEADER, REALM_HEADER};
use crate::error::{RouterError, RouterResult};
use crate::gateway::{InterfaceInfo, Message, MessageId, RouterGateway};
use crate::rci::{self, SmsAction};
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Root URL of the router web interface.
///
/// A bare host gets `http://`. Path, query and fragment are dropped.
pub fn host_root_url(host: &str) -> RouterResult<Url> {
    let host = host.trim();
    let raw = if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    };

    let mut url = Url::parse(&raw)?;
    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Router session over the RCI API.
///
/// The session cookie lives in the HTTP client's cookie store, so one
/// client is one router session.
pub struct KeeneticClient {
    http_client: reqwest::Client,
    base_url: Url,
    username: String,
    password: String,
}

impl KeeneticClient {
    /// Build a client without touching the network.
    pub fn new(host: &str, username: &str, password: &str) -> RouterResult<Self> {
        Self::with_timeout(host, username, password, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        host: &str,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> RouterResult<Self> {
        let http_client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url: host_root_url(host)?,
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    /// Build a client and open an authenticated session.
    pub async fn connect(host: &str, username: &str, password: &str) -> RouterResult<Self> {
        let client = Self::new(host, username, password)?;
        client.authenticate().await?;
        info!(router = %client.base_url, "Router session established");
        Ok(client)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Run the challenge/response handshake unless the cookie is still valid.
    pub async fn authenticate(&self) -> RouterResult<()> {
        let auth_url = self.base_url.join("auth")?;

        let response = self.http_client.get(auth_url.clone()).send().await?;
        if response.status().is_success() {
            debug!("Router session cookie still valid");
            return Ok(());
        }
        if response.status() != StatusCode::UNAUTHORIZED {
            return Err(status_error(response).await);
        }

        let realm = header_value(&response, REALM_HEADER)?;
        let challenge = header_value(&response, CHALLENGE_HEADER)?;

        let body = serde_json::json!({
            "login": self.username,
            "password": password_hash(&self.username, &self.password, &realm, &challenge),
        });

        let response = self.http_client.post(auth_url).json(&body).send().await?;
        match response.status() {
            status if status.is_success() => {
                debug!(realm = %realm, "Router authentication succeeded");
                Ok(())
            }
            StatusCode::UNAUTHORIZED => Err(RouterError::Auth(format!(
                "router rejected credentials for user {}",
                self.username
            ))),
            _ => Err(status_error(response).await),
        }
    }

    /// Call an RCI endpoint, re-authenticating once on 401.
    async fn execute(&self, method: Method, path: &str, body: Option<&Value>) -> RouterResult<Value> {
        let url = self.base_url.join(path)?;

        let response = self.send(method.clone(), url.clone(), body).await?;
        let response = if response.status() == StatusCode::UNAUTHORIZED {
            warn!(path, "Router session expired, re-authenticating");
            self.authenticate().await?;
            let retry = self.send(method, url, body).await?;
            if retry.status() == StatusCode::UNAUTHORIZED {
                return Err(RouterError::Auth(format!(
                    "router still answers 401 on {} after re-authentication",
                    path
                )));
            }
            retry
        } else {
            response
        };

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        Ok(response.json::<Value>().await?)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> RouterResult<reqwest::Response> {
        let mut request = self.http_client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    async fn change_state(
        &self,
        action: SmsAction,
        interface: &str,
        ids: &[MessageId],
    ) -> RouterResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let body = rci::sms_state_commands(action, interface, ids);
        let answer = self.execute(Method::POST, "rci/", Some(&body)).await?;
        rci::check_status(&answer)?;

        debug!(interface, count = ids.len(), action = ?action, "SMS state updated");
        Ok(())
    }
}

#[async_trait]
impl RouterGateway for KeeneticClient {
    async fn list_interfaces(&self) -> RouterResult<Vec<InterfaceInfo>> {
        let answer = self.execute(Method::GET, "rci/show/interface", None).await?;
        rci::parse_mobile_interfaces(&answer)
    }

    async fn list_unread(&self, interface: &str) -> RouterResult<Vec<Message>> {
        let body = rci::sms_list_command(interface);
        let answer = self.execute(Method::POST, "rci/", Some(&body)).await?;
        rci::parse_sms_list(interface, &answer)
    }

    async fn mark_as_read(&self, interface: &str, ids: &[MessageId]) -> RouterResult<()> {
        self.change_state(SmsAction::Read, interface, ids).await
    }

    async fn delete(&self, interface: &str, ids: &[MessageId]) -> RouterResult<()> {
        self.change_state(SmsAction::Delete, interface, ids).await
    }
}

impl std::fmt::Debug for KeeneticClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeeneticClient")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

fn header_value(response: &reqwest::Response, name: &str) -> RouterResult<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| RouterError::Auth(format!("auth challenge without {} header", name)))
}

async fn status_error(response: reqwest::Response) -> RouterError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    RouterError::Status { status, body }
}
