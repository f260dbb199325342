//! Google Drive/Docs client authenticated with a service account.

use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::{DigestError, DigestResult};

use super::docs::{DocRequest, DocumentService};

pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
pub const DOCS_API_BASE: &str = "https://docs.googleapis.com/v1";
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";
const DOCUMENT_MIME_TYPE: &str = "application/vnd.google-apps.document";

/// Refresh tokens this long before they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// The fields of a service account key file that the token exchange needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl ServiceAccountKey {
    pub fn from_file(path: impl AsRef<Path>) -> DigestResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            DigestError::Auth(format!("cannot read service account file {}: {e}", path.display()))
        })?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug)]
enum TokenSource {
    Static(String),
    ServiceAccount {
        key: ServiceAccountKey,
        cached: Mutex<Option<CachedToken>>,
    },
}

#[derive(Debug, Deserialize)]
struct CreatedFile {
    id: String,
}

/// Drive + Docs REST client.
#[derive(Debug)]
pub struct GoogleDocsClient {
    client: Client,
    token: TokenSource,
    drive_base: String,
    docs_base: String,
}

impl GoogleDocsClient {
    /// Client that exchanges a service account assertion for access tokens on demand.
    pub fn from_service_account(key: ServiceAccountKey) -> DigestResult<Self> {
        Self::build(TokenSource::ServiceAccount {
            key,
            cached: Mutex::new(None),
        })
    }

    pub fn from_service_account_file(path: impl AsRef<Path>) -> DigestResult<Self> {
        Self::from_service_account(ServiceAccountKey::from_file(path)?)
    }

    /// Client using a pre-issued bearer token.
    pub fn with_access_token(token: impl Into<String>) -> DigestResult<Self> {
        Self::build(TokenSource::Static(token.into()))
    }

    fn build(token: TokenSource) -> DigestResult<Self> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self {
            client,
            token,
            drive_base: DRIVE_API_BASE.to_string(),
            docs_base: DOCS_API_BASE.to_string(),
        })
    }

    /// Point both APIs at a different root (used by tests).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        self.drive_base = format!("{base}/drive/v3");
        self.docs_base = format!("{base}/v1");
        self
    }

    fn access_token(&self) -> DigestResult<String> {
        match &self.token {
            TokenSource::Static(t) => Ok(t.clone()),
            TokenSource::ServiceAccount { key, cached } => {
                let mut guard = cached
                    .lock()
                    .map_err(|_| DigestError::Auth("token cache poisoned".to_string()))?;
                if let Some(tok) = guard.as_ref() {
                    if Instant::now() + EXPIRY_MARGIN < tok.expires_at {
                        return Ok(tok.value.clone());
                    }
                }
                let fresh = self.exchange_assertion(key)?;
                let value = fresh.value.clone();
                *guard = Some(fresh);
                Ok(value)
            }
        }
    }

    fn exchange_assertion(&self, key: &ServiceAccountKey) -> DigestResult<CachedToken> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let claims = Claims {
            iss: &key.client_email,
            scope: DRIVE_SCOPE,
            aud: &key.token_uri,
            iat: now,
            exp: now + 3600,
        };
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| DigestError::Auth(format!("invalid service account key: {e}")))?;
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &signing_key)
            .map_err(|e| DigestError::Auth(format!("failed to sign assertion: {e}")))?;

        let resp = self
            .client
            .post(&key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            return Err(DigestError::Auth(format!("token exchange failed: {status}: {body}")));
        }
        let token: TokenResponse = resp.json()?;
        debug!(expires_in = token.expires_in, "access token issued");
        Ok(CachedToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        })
    }

    fn check(service: &str, resp: Response) -> DigestResult<Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        Err(DigestError::publish(service, format!("{status}: {body}")))
    }
}

impl DocumentService for GoogleDocsClient {
    fn create_document(&self, title: &str, folder_id: &str) -> DigestResult<String> {
        let resp = self
            .client
            .post(format!("{}/files", self.drive_base))
            .bearer_auth(self.access_token()?)
            .query(&[("fields", "id")])
            .json(&json!({
                "name": title,
                "mimeType": DOCUMENT_MIME_TYPE,
                "parents": [folder_id],
            }))
            .send()?;
        let created: CreatedFile = Self::check("drive", resp)?.json()?;
        Ok(created.id)
    }

    fn batch_update(&self, document_id: &str, requests: &[DocRequest]) -> DigestResult<()> {
        let resp = self
            .client
            .post(format!("{}/documents/{document_id}:batchUpdate", self.docs_base))
            .bearer_auth(self.access_token()?)
            .json(&json!({ "requests": requests }))
            .send()?;
        Self::check("docs", resp)?;
        Ok(())
    }

    fn share_document(&self, document_id: &str, email: &str) -> DigestResult<()> {
        let resp = self
            .client
            .post(format!("{}/files/{document_id}/permissions", self.drive_base))
            .bearer_auth(self.access_token()?)
            .query(&[("fields", "id")])
            .json(&json!({
                "type": "user",
                "role": "writer",
                "emailAddress": email,
            }))
            .send()?;
        Self::check("drive", resp)?;
        Ok(())
    }
}
