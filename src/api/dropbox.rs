//! Implements the `Storage` trait against the Dropbox HTTP API v2.

use crate::api::Storage;
use crate::Result;
use anyhow::{bail, Context};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

const UPLOAD_URL: &str = "https://content.dropboxapi.com/2/files/upload";
const LIST_LINKS_URL: &str = "https://api.dropboxapi.com/2/sharing/list_shared_links";
const CREATE_LINK_URL: &str = "https://api.dropboxapi.com/2/sharing/create_shared_link_with_settings";
const API_ARG: &str = "Dropbox-API-Arg";
const LINK_EXISTS: &str = "shared_link_already_exists";

#[derive(Debug, Serialize)]
struct UploadArg<'a> {
    path: &'a str,
    mode: &'a str,
    autorename: bool,
    mute: bool,
}

#[derive(Debug, Serialize)]
struct ListLinksArg<'a> {
    path: &'a str,
    direct_only: bool,
}

#[derive(Debug, Serialize)]
struct CreateLinkArg<'a> {
    path: &'a str,
}

#[derive(Debug, Deserialize)]
struct SharedLink {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ListLinksResponse {
    #[serde(default)]
    links: Vec<SharedLink>,
}

pub(super) struct DropboxStorage {
    token: String,
    http: reqwest::Client,
}

impl DropboxStorage {
    pub(super) fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            bail!("The storage access token is empty");
        }
        Ok(Self {
            token,
            http: reqwest::Client::new(),
        })
    }
}

#[async_trait::async_trait]
impl Storage for DropboxStorage {
    async fn upload(&mut self, path: &str, content: &[u8]) -> Result<()> {
        trace!("upload {} bytes to {path}", content.len());
        let arg = header_json(&UploadArg {
            path,
            mode: "overwrite",
            autorename: false,
            mute: false,
        })?;
        let response = self
            .http
            .post(UPLOAD_URL)
            .bearer_auth(&self.token)
            .header(API_ARG, arg)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(content.to_vec())
            .send()
            .await
            .with_context(|| format!("Failed to send upload request for {path}"))?;
        check(response, "upload")
            .await
            .with_context(|| format!("Unable to upload {path}"))?;
        Ok(())
    }

    async fn list_shared_links(&mut self, path: &str) -> Result<Vec<String>> {
        let response = self
            .http
            .post(LIST_LINKS_URL)
            .bearer_auth(&self.token)
            .json(&ListLinksArg {
                path,
                direct_only: true,
            })
            .send()
            .await
            .with_context(|| format!("Failed to send list links request for {path}"))?;
        let response = check(response, "list_shared_links").await?;
        let list: ListLinksResponse = response
            .json()
            .await
            .context("Failed to parse the list_shared_links response")?;
        Ok(list.links.into_iter().map(|l| l.url).collect())
    }

    async fn create_shared_link(&mut self, path: &str) -> Result<String> {
        let response = self
            .http
            .post(CREATE_LINK_URL)
            .bearer_auth(&self.token)
            .json(&CreateLinkArg { path })
            .send()
            .await
            .with_context(|| format!("Failed to send create link request for {path}"))?;

        if response.status() == StatusCode::CONFLICT {
            let body = response.text().await.unwrap_or_default();
            if body.contains(LINK_EXISTS) {
                debug!("A shared link for {path} already exists, listing it instead");
                let links = self.list_shared_links(path).await?;
                return links
                    .into_iter()
                    .next()
                    .with_context(|| format!("No shared link found for {path}"));
            }
            bail!("create_shared_link_with_settings failed with status 409: {body}");
        }

        let response = check(response, "create_shared_link_with_settings").await?;
        let link: SharedLink = response
            .json()
            .await
            .context("Failed to parse the create_shared_link_with_settings response")?;
        Ok(link.url)
    }
}

/// Passes a successful response through and turns anything else into an error with its body.
async fn check(response: Response, endpoint: &str) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read response body".to_string());
    bail!("Dropbox {endpoint} failed with status {status}: {body}")
}

/// Serializes `value` as JSON that is safe to put in an HTTP header: every non-ASCII character is
/// written as a `\uXXXX` escape.
fn header_json<T: Serialize>(value: &T) -> Result<HeaderValue> {
    let json = serde_json::to_string(value).context("Unable to serialize the API argument")?;
    let mut escaped = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_ascii() {
            escaped.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                escaped.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    HeaderValue::from_str(&escaped).context("The API argument is not a valid header value")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_json_ascii() {
        let value = header_json(&UploadArg {
            path: "/Juan_Perez/20250601_101112_recibo.png",
            mode: "overwrite",
            autorename: false,
            mute: false,
        })
        .unwrap();
        assert_eq!(
            value.to_str().unwrap(),
            r#"{"path":"/Juan_Perez/20250601_101112_recibo.png","mode":"overwrite","autorename":false,"mute":false}"#
        );
    }

    #[test]
    fn test_header_json_escapes_non_ascii() {
        let value = header_json(&CreateLinkArg {
            path: "/José_Núñez/a😀.png",
        })
        .unwrap();
        assert_eq!(
            value.to_str().unwrap(),
            r#"{"path":"/Jos\u00e9_N\u00fa\u00f1ez/a\ud83d\ude00.png"}"#
        );
    }

    #[test]
    fn test_empty_token_rejected() {
        assert!(DropboxStorage::new("  ").is_err());
        assert!(DropboxStorage::new("sl.abc").is_ok());
    }
}
