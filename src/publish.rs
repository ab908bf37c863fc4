// Config Export Builder - Repository Publishing
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Pushes export bundles to a configuration repository.
//!
//! The repository accepts the bundle as an XML POST to its push-export
//! endpoint, authenticated by the access token in the query string.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use tracing::{debug, info, warn};

use crate::models::{AppConfig, Error, Repository, Result};

const PUSH_EXPORT_PATH: &str = "/rest-api/push-export";
const BUNDLE_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

/// HTTP settings for publishing.
#[derive(Debug, Clone)]
pub struct PublishOptions {
    pub timeout: Duration,
    pub user_agent: String,
    /// Repository replies larger than this are not read.
    pub max_response_bytes: usize,
}

impl PublishOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.publish_timeout_secs),
            user_agent: format!("{}/{}", crate::PACKAGE_NAME, crate::VERSION),
            max_response_bytes: config.max_response_bytes,
        }
    }
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Push-export endpoint of `repository`, without the access token.
pub fn push_endpoint(repository: &Repository) -> String {
    format!(
        "{}{}",
        repository.url.trim_end_matches('/'),
        PUSH_EXPORT_PATH
    )
}

/// Repository client.
pub struct Publisher {
    client: reqwest::Client,
    options: PublishOptions,
}

impl Publisher {
    pub fn new(options: PublishOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent.as_str())
            .build()?;
        Ok(Self::with_client(client, options))
    }

    /// Use a preconfigured client.
    pub fn with_client(client: reqwest::Client, options: PublishOptions) -> Self {
        Self { client, options }
    }

    /// Upload `bundle` to `repository`. Anything but HTTP 200 is an error.
    pub async fn push_export(&self, repository: &Repository, bundle: &str) -> Result<()> {
        let endpoint = push_endpoint(repository);
        info!(
            "Publishing {} byte export to repository {} ({})",
            bundle.len(),
            repository.id,
            endpoint
        );

        let response = self
            .client
            .post(&endpoint)
            .query(&[("accessToken", repository.auth_token.as_str())])
            .header(CONTENT_TYPE, BUNDLE_CONTENT_TYPE)
            .body(bundle.to_string())
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let detail = match response.bytes().await {
                Ok(body) if body.len() <= self.options.max_response_bytes => {
                    String::from_utf8_lossy(&body).trim().to_string()
                }
                Ok(body) => {
                    warn!("Repository reply too large ({} bytes), ignoring", body.len());
                    String::new()
                }
                Err(e) => {
                    debug!("Cannot read repository reply: {}", e);
                    String::new()
                }
            };
            return Err(Error::PublishFailed(if detail.is_empty() {
                format!("HTTP error {}", status.as_u16())
            } else {
                format!("HTTP error {}: {}", status.as_u16(), detail)
            }));
        }

        info!("Export published to repository {}", repository.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn repository(url: &str) -> Repository {
        Repository {
            id: 1,
            url: url.to_string(),
            auth_token: "s3cret".to_string(),
            description: String::new(),
        }
    }

    fn publisher() -> Publisher {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        Publisher::with_client(client, PublishOptions::default())
    }

    /// Accept one request, answer with `status_line`, return the raw request.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .filter_map(|line| line.split_once(':'))
                        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
            }
            let reply = format!(
                "{}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });
        (url, handle)
    }

    #[test]
    fn test_push_endpoint() {
        assert_eq!(
            push_endpoint(&repository("https://repo.example.com/")),
            "https://repo.example.com/rest-api/push-export"
        );
        assert_eq!(
            push_endpoint(&repository("http://10.0.0.5:8080")),
            "http://10.0.0.5:8080/rest-api/push-export"
        );
    }

    #[test]
    fn test_user_agent_names_application() {
        let options = PublishOptions::default();
        assert!(options.user_agent.starts_with("config-export-builder/"));
        assert_eq!(options.timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_push_export_posts_bundle() {
        let (url, server) = serve_once("HTTP/1.1 200 OK", "").await;
        publisher()
            .push_export(&repository(&url), "<configuration/>")
            .await
            .unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /rest-api/push-export?accessToken=s3cret HTTP/1.1"));
        assert!(request
            .to_lowercase()
            .contains("content-type: application/xml; charset=utf-8"));
        assert!(request.ends_with("<configuration/>"));
    }

    #[tokio::test]
    async fn test_non_ok_status_is_error() {
        let (url, server) = serve_once("HTTP/1.1 403 Forbidden", "bad token").await;
        let err = publisher()
            .push_export(&repository(&url), "<configuration/>")
            .await
            .unwrap_err();
        server.await.unwrap();

        match err {
            Error::PublishFailed(message) => {
                assert_eq!(message, "HTTP error 403: bad token");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
