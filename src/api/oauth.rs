//! Keeps the stored Google access token fresh.
//!
//! The token file is created outside of this app. Here it is only read, refreshed with its
//! refresh token when it is about to expire, and written back.

use crate::api::files::{File, SecretFile, TokenFile};
use crate::Result;
use anyhow::{anyhow, Context};
use chrono::Utc;
use oauth2::basic::BasicClient;
use oauth2::{ClientId, ClientSecret, RefreshToken, TokenResponse, TokenUrl};
use std::path::Path;
use tracing::debug;

/// Lifetime assumed when the token endpoint does not say how long a new token is valid.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

pub(crate) struct TokenProvider {
    secret: SecretFile,
    token: File<TokenFile>,
}

impl TokenProvider {
    pub(crate) async fn load(
        client_secret_path: impl AsRef<Path>,
        token_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let secret = SecretFile::load(client_secret_path.as_ref()).await?;
        let token = TokenFile::load(token_path.as_ref()).await.with_context(|| {
            format!(
                "Unable to load the Google token from {}",
                token_path.as_ref().display()
            )
        })?;
        Ok(Self { secret, token })
    }

    /// The current access token, which may be expired.
    pub(crate) fn token(&self) -> &str {
        self.token.data().access_token()
    }

    /// The access token, refreshed first if it is about to expire.
    pub(crate) async fn token_with_refresh(&mut self) -> Result<&str> {
        if self.token.data().is_expired() {
            self.refresh().await?;
        }
        Ok(self.token())
    }

    async fn refresh(&mut self) -> Result<()> {
        debug!("Refreshing the Google access token");
        let client = BasicClient::new(ClientId::new(self.secret.client_id().to_string()))
            .set_client_secret(ClientSecret::new(self.secret.client_secret().to_string()))
            .set_token_uri(
                TokenUrl::new(self.secret.token_uri().to_string())
                    .context("Invalid token URI in the client secret file")?,
            );

        let http = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("Unable to build the HTTP client")?;

        let refresh_token = RefreshToken::new(self.token.data().refresh_token().to_string());
        let response = client
            .exchange_refresh_token(&refresh_token)
            .request_async(&http)
            .await
            .map_err(|e| anyhow!("Unable to refresh the Google access token: {e}"))?;

        let lifetime = response
            .expires_in()
            .and_then(|d| chrono::Duration::from_std(d).ok())
            .unwrap_or_else(|| chrono::Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS));
        let new_refresh_token = response.refresh_token().map(|t| t.secret().to_string());
        self.token.data_mut().update(
            response.access_token().secret().to_string(),
            Utc::now() + lifetime,
            new_refresh_token,
        );
        self.token.save().await?;
        debug!("Google access token refreshed");
        Ok(())
    }
}
