//! GitHub App authentication: RS256 JWT signing and installation tokens.

use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Duration, Utc};
use orgposture_core::{Clock, FetchError};
use reqwest::Client;
use ring::rand::SystemRandom;
use ring::signature::{RSA_PKCS1_SHA256, RsaKeyPair};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

const JWT_HEADER: &str = r#"{"alg":"RS256","typ":"JWT"}"#;
const JWT_BACKDATE_SECS: i64 = 60;
/// GitHub rejects app JWTs that live longer than ten minutes.
const JWT_LIFETIME_SECS: i64 = 540;
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

const PKCS1_LABEL: &str = "RSA PRIVATE KEY";
const PKCS8_LABEL: &str = "PRIVATE KEY";

#[derive(Serialize)]
struct JwtClaims {
    iat: i64,
    exp: i64,
    iss: String,
}

/// Installation token payload returned by GitHub.
#[derive(Debug, Deserialize)]
struct InstallationTokenResponse {
    token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Signs app JWTs with the app's RSA private key.
pub(crate) struct AppSigner {
    app_id: u64,
    key_pair: RsaKeyPair,
    rng: SystemRandom,
}

impl std::fmt::Debug for AppSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppSigner")
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

impl AppSigner {
    /// Parse a PKCS#1 or PKCS#8 PEM private key.
    pub(crate) fn from_pem(app_id: u64, pem: &str) -> Result<Self, FetchError> {
        let (label, der) = decode_pem(pem)?;
        let key_pair = match label.as_str() {
            PKCS1_LABEL => RsaKeyPair::from_der(&der),
            PKCS8_LABEL => RsaKeyPair::from_pkcs8(&der),
            other => {
                return Err(FetchError::Auth(format!(
                    "unsupported private key type: {other}"
                )));
            }
        }
        .map_err(|err| FetchError::Auth(format!("invalid private key: {err}")))?;
        Ok(Self {
            app_id,
            key_pair,
            rng: SystemRandom::new(),
        })
    }

    /// Build a signed JWT valid around `now`.
    pub(crate) fn sign_jwt(&self, now: DateTime<Utc>) -> Result<String, FetchError> {
        let issued = now.timestamp();
        let claims = JwtClaims {
            iat: issued - JWT_BACKDATE_SECS,
            exp: issued + JWT_LIFETIME_SECS,
            iss: self.app_id.to_string(),
        };
        let claims = serde_json::to_vec(&claims)
            .map_err(|err| FetchError::Auth(format!("failed to encode jwt claims: {err}")))?;
        let message = format!(
            "{}.{}",
            general_purpose::URL_SAFE_NO_PAD.encode(JWT_HEADER),
            general_purpose::URL_SAFE_NO_PAD.encode(claims)
        );

        let mut signature = vec![0u8; self.key_pair.public().modulus_len()];
        self.key_pair
            .sign(
                &RSA_PKCS1_SHA256,
                &self.rng,
                message.as_bytes(),
                &mut signature,
            )
            .map_err(|_| FetchError::Auth("failed to sign jwt".to_string()))?;
        Ok(format!(
            "{message}.{}",
            general_purpose::URL_SAFE_NO_PAD.encode(signature)
        ))
    }
}

/// Exchanges app JWTs for installation access tokens and caches them.
pub(crate) struct InstallationTokens {
    http: Client,
    api_url: String,
    installation_id: u64,
    signer: AppSigner,
    clock: Arc<dyn Clock + Send + Sync>,
    cached: Mutex<Option<CachedToken>>,
}

impl InstallationTokens {
    pub(crate) fn new(
        http: Client,
        api_url: &str,
        installation_id: u64,
        signer: AppSigner,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            installation_id,
            signer,
            clock,
            cached: Mutex::new(None),
        }
    }

    /// Current installation token, refreshed shortly before it expires.
    pub(crate) async fn token(&self) -> Result<String, FetchError> {
        let mut cached = self.cached.lock().await;
        let now = self.clock.now();
        if let Some(current) = cached.as_ref() {
            if current.expires_at - Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) > now {
                return Ok(current.token.clone());
            }
        }

        let fresh = self.exchange(now).await?;
        log::debug!(
            "obtained installation token for {} valid until {}",
            self.installation_id,
            fresh.expires_at
        );
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    async fn exchange(&self, now: DateTime<Utc>) -> Result<CachedToken, FetchError> {
        let jwt = self.signer.sign_jwt(now)?;
        let url = format!(
            "{}/app/installations/{}/access_tokens",
            self.api_url, self.installation_id
        );
        let response = self
            .http
            .post(url)
            .bearer_auth(jwt)
            .send()
            .await
            .map_err(|err| FetchError::Auth(format!("token request failed: {err}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Auth(format!(
                "installation token request returned {status}: {body}"
            )));
        }
        let payload = response
            .json::<InstallationTokenResponse>()
            .await
            .map_err(|err| {
                FetchError::Auth(format!("invalid installation token response: {err}"))
            })?;
        Ok(CachedToken {
            token: payload.token,
            expires_at: payload.expires_at,
        })
    }
}

/// Decode a PEM document into its label and DER bytes.
///
/// Keys passed through environment variables often carry literal `\n`
/// sequences instead of newlines; both forms are accepted.
fn decode_pem(pem: &str) -> Result<(String, Vec<u8>), FetchError> {
    let normalized = pem.replace("\\n", "\n");
    let mut lines = normalized
        .lines()
        .map(str::trim)
        .skip_while(|line| !line.starts_with("-----BEGIN "));
    let label = lines
        .next()
        .and_then(|line| line.strip_prefix("-----BEGIN "))
        .and_then(|line| line.strip_suffix("-----"))
        .ok_or_else(|| FetchError::Auth("private key is not PEM encoded".to_string()))?
        .to_string();

    let mut body = String::new();
    let mut terminated = false;
    for line in lines {
        if line.starts_with("-----END ") {
            terminated = true;
            break;
        }
        body.push_str(line);
    }
    if !terminated {
        return Err(FetchError::Auth(format!("missing END line for {label}")));
    }
    let der = general_purpose::STANDARD
        .decode(body)
        .map_err(|err| FetchError::Auth(format!("invalid PEM body: {err}")))?;
    Ok((label, der))
}
