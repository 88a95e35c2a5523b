//! OAuth2 service-account flow: a signed RS256 assertion is exchanged for a
//! short-lived bearer token, which is reused until shortly before it expires.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::{error_from_response, FirestoreError};
use crate::config::FirebaseCredentials;

pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const SCOPE: &str = "https://www.googleapis.com/auth/datastore";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Serialize, PartialEq, Eq)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(REFRESH_MARGIN_SECS) < self.expires_at
    }
}

pub struct ServiceAccountAuth {
    client: Client,
    client_email: String,
    key: EncodingKey,
    token_url: String,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    /// Fails if the private key is not a valid RSA PEM.
    pub fn new(
        client: Client,
        credentials: &FirebaseCredentials,
        token_url: &str,
    ) -> Result<Self, FirestoreError> {
        let key = EncodingKey::from_rsa_pem(credentials.private_key.as_bytes())?;
        Ok(Self {
            client,
            client_email: credentials.client_email.clone(),
            key,
            token_url: token_url.to_string(),
            cached: Mutex::new(None),
        })
    }

    pub async fn access_token(&self) -> Result<String, FirestoreError> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        tracing::debug!(client_email = %self.client_email, "requesting firestore access token");
        let assertion = self.assertion(now)?;
        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        let token: TokenResponse = response.json().await?;

        let value = token.access_token.clone();
        *cached = Some(CachedToken {
            value: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in),
        });
        Ok(value)
    }

    fn assertion(&self, now: DateTime<Utc>) -> Result<String, FirestoreError> {
        let claims = claims(&self.client_email, &self.token_url, now);
        Ok(encode(&Header::new(Algorithm::RS256), &claims, &self.key)?)
    }
}

fn claims<'a>(client_email: &'a str, audience: &'a str, now: DateTime<Utc>) -> Claims<'a> {
    let iat = now.timestamp();
    Claims {
        iss: client_email,
        scope: SCOPE,
        aud: audience,
        iat,
        exp: iat + ASSERTION_LIFETIME_SECS,
    }
}
