//! reqwest-backed verdict client.
//!
//! - One pooled `reqwest::Client` shared by all requests.
//! - Connect and total timeouts from config; the total bound is also
//!   enforced around the whole call (send + body read).
//! - No retries: a failure resolves to a pass verdict right away.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, SET_COOKIE};

use vgate_core::error::{Result, VGateError};
use vgate_core::{HeaderBag, RequestAttributes, UpstreamReply, Verdict};

use super::VerdictClient;
use crate::config::schema::ApiSection;

const USER_AGENT: &str = "DataDome";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Static fields appended to every payload.
#[derive(Debug, Clone)]
pub struct ModuleInfo {
    pub key: String,
    pub module_name: String,
    pub module_version: String,
    pub server_name: String,
}

impl ModuleInfo {
    pub fn from_api(api: &ApiSection) -> Self {
        let server_name = api
            .server_name
            .clone()
            .or_else(|| std::env::var("HOSTNAME").ok())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            key: api.key.clone(),
            module_name: env!("CARGO_PKG_NAME").to_string(),
            module_version: env!("CARGO_PKG_VERSION").to_string(),
            server_name,
        }
    }

    fn form_fields(&self) -> [(&str, &str); 4] {
        [
            ("Key", self.key.as_str()),
            ("RequestModuleName", self.module_name.as_str()),
            ("ModuleVersion", self.module_version.as_str()),
            ("ServerName", self.server_name.as_str()),
        ]
    }
}

pub struct HttpVerdictClient {
    http: reqwest::Client,
    endpoint: String,
    module: ModuleInfo,
    total_timeout: Duration,
}

impl HttpVerdictClient {
    pub fn new(api: &ApiSection) -> Result<Self> {
        let total_timeout = Duration::from_millis(api.timeout_ms);
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(api.connect_timeout_ms))
            .timeout(total_timeout)
            .user_agent(USER_AGENT)
            // 301/302 are verdicts, not hops to follow.
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| VGateError::Internal(format!("http client build failed: {e}")))?;

        Ok(Self {
            http,
            endpoint: api.endpoint(),
            module: ModuleInfo::from_api(api),
            total_timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn module(&self) -> &ModuleInfo {
        &self.module
    }

    async fn send(&self, attributes: &RequestAttributes) -> Result<UpstreamReply> {
        let body = attributes.to_form_body(&self.module.form_fields());

        let resp = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status().as_u16();
        let mut headers = HeaderBag::new();
        for (name, value) in resp.headers() {
            let value = Bytes::copy_from_slice(value.as_bytes());
            if name == SET_COOKIE {
                headers.append(name.as_str(), value);
            } else {
                headers.insert(name.as_str(), value);
            }
        }
        let body = resp.bytes().await.map_err(transport_error)?;

        Ok(UpstreamReply {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl VerdictClient for HttpVerdictClient {
    async fn evaluate(&self, attributes: &RequestAttributes) -> Verdict {
        let outcome = match tokio::time::timeout(self.total_timeout, self.send(attributes)).await {
            Ok(r) => r,
            Err(_) => Err(VGateError::Timeout),
        };

        match outcome {
            Ok(reply) => Verdict::from_upstream(&reply),
            Err(e) => {
                tracing::warn!(
                    endpoint = %self.endpoint,
                    code = e.client_code().as_str(),
                    error = %e,
                    "verdict service call failed, letting request through"
                );
                if e.is_timeout() {
                    Verdict::timed_out()
                } else {
                    Verdict::pass()
                }
            }
        }
    }
}

fn transport_error(e: reqwest::Error) -> VGateError {
    if e.is_timeout() {
        VGateError::Timeout
    } else {
        VGateError::Transport(e.to_string())
    }
}
