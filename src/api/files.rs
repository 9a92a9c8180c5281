//! The on-disk Google credential files.
//! - `client_secret.json`: the OAuth 2.0 client downloaded from Google Cloud Console
//! - `token.json`: the stored access and refresh tokens, rewritten after every refresh

use crate::api::OAUTH_SCOPES;
use crate::{utils, Result};
use anyhow::{bail, ensure, Context};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// Holds the `path` a value was loaded from so that it can be written back after a change.
#[derive(Debug, Clone)]
pub(super) struct File<F>
where
    F: Serialize + DeserializeOwned + Clone + Debug,
{
    path: PathBuf,
    data: F,
}

impl<F> File<F>
where
    F: Serialize + DeserializeOwned + Clone + Debug,
{
    pub(super) fn new(path: impl Into<PathBuf>, data: F) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }

    /// Writes the data back to its file with owner-only permissions.
    pub(super) async fn save(&self) -> Result<()> {
        let json =
            serde_json::to_string_pretty(&self.data).context("Failed to serialize data to JSON")?;
        utils::write(&self.path, json).await?;

        #[cfg(unix)]
        {
            use std::fs::Permissions;
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.path, Permissions::from_mode(0o600))
                .await
                .context("Failed to set file permissions")?;
        }

        Ok(())
    }

    pub(super) fn data(&self) -> &F {
        &self.data
    }

    pub(super) fn data_mut(&mut self) -> &mut F {
        &mut self.data
    }
}

/// The `client_secret.json` file. Google wraps desktop-app credentials in an `installed` object.
///
/// ```json
/// {
///   "installed": {
///     "client_id": "YOUR_CLIENT_ID.apps.googleusercontent.com",
///     "client_secret": "YOUR_CLIENT_SECRET",
///     "token_uri": "https://oauth2.googleapis.com/token"
///   }
/// }
/// ```
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SecretFile {
    installed: InstalledCredentials,
}

impl SecretFile {
    pub(crate) async fn load(path: &Path) -> Result<SecretFile> {
        let secret: SecretFile = utils::deserialize(path)
            .await
            .context("Unable to read the OAuth client secret file")?;
        ensure!(
            !secret.installed.client_id.is_empty(),
            "The OAuth client secret file has an empty client_id"
        );
        Ok(secret)
    }

    pub(super) fn client_id(&self) -> &str {
        &self.installed.client_id
    }

    pub(super) fn client_secret(&self) -> &str {
        &self.installed.client_secret
    }

    pub(super) fn token_uri(&self) -> &str {
        &self.installed.token_uri
    }
}

#[derive(Default, Debug, Clone, Serialize, Deserialize)]
struct InstalledCredentials {
    client_id: String,
    client_secret: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// The stored Google token.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(super) struct TokenFile {
    scopes: Vec<String>,
    access_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
    #[serde(default)]
    id_token: Option<String>,
}

impl TokenFile {
    /// Loads the token and checks that it was granted the scopes the app needs.
    pub(super) async fn load(p: impl AsRef<Path>) -> Result<File<Self>> {
        let path = p.as_ref();
        let token_file: Self = utils::deserialize(path)
            .await
            .context("Unable to deserialize the token JSON file")?;
        token_file.validate()?;
        Ok(File::new(path, token_file))
    }

    fn validate(&self) -> Result<()> {
        if self.refresh_token.is_empty() {
            bail!("The token file has no refresh token");
        }
        let found_scopes: HashSet<&str> = self.scopes.iter().map(|s| s.as_str()).collect();
        for &required_scope in OAUTH_SCOPES {
            if !found_scopes.contains(required_scope) {
                bail!("OAuth scope '{required_scope}' is missing.");
            }
        }
        Ok(())
    }

    pub(super) fn access_token(&self) -> &str {
        &self.access_token
    }

    pub(super) fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    /// True if the token is expired or will expire within 5 minutes.
    pub(super) fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now() + chrono::Duration::minutes(5)
    }

    pub(super) fn update(
        &mut self,
        access_token: String,
        expires_at: DateTime<Utc>,
        refresh_token: Option<String>,
    ) {
        self.access_token = access_token;
        self.expires_at = expires_at;
        if let Some(rt) = refresh_token {
            self.refresh_token = rt;
        }
    }
}
