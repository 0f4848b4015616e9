use chrono::{DateTime, Duration, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::ClientError;

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

/// Tokens of a signed-in user.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// `None` for tokens that never expire.
    pub expires_at: Option<DateTime<Utc>>,
    pub user: Option<AuthUser>,
}

impl AuthTokens {
    pub fn expires_within(&self, margin: Duration, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at - margin <= now)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    /// Unix seconds.
    expires_at: Option<i64>,
    user: Option<AuthUser>,
}

impl TokenResponse {
    fn into_tokens(self, now: DateTime<Utc>) -> AuthTokens {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| self.expires_in.map(|secs| now + Duration::seconds(secs)));
        AuthTokens {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

/// Client of the hosted auth provider.
#[derive(Debug, Clone)]
pub struct AuthClient {
    base_url: Url,
    api_key: String,
    http: reqwest::Client,
}

impl AuthClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, ClientError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            api_key: api_key.to_string(),
            http: reqwest::Client::new(),
        })
    }

    pub(crate) fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn api_key(&self) -> &str {
        &self.api_key
    }

    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthTokens, ClientError> {
        tracing::debug!(%email, "signing in");
        self.token("password", &PasswordGrant { email, password })
            .await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, ClientError> {
        tracing::debug!("refreshing access token");
        self.token("refresh_token", &RefreshGrant { refresh_token })
            .await
    }

    pub async fn sign_out(&self, access_token: &str) -> Result<(), ClientError> {
        let endpoint = join(&self.base_url, "auth/v1/logout")?;
        let res = self
            .http
            .post(endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if res.status().is_success() {
            return Ok(());
        }
        Err(ClientError::from_response(res).await)
    }

    async fn token<B: Serialize>(&self, grant_type: &str, body: &B) -> Result<AuthTokens, ClientError> {
        let endpoint = join(
            &self.base_url,
            &format!("auth/v1/token?grant_type={grant_type}"),
        )?;
        let res = self
            .http
            .post(endpoint)
            .header("apikey", &self.api_key)
            .json(body)
            .send()
            .await?;

        if res.status().is_success() {
            let token = res.json::<TokenResponse>().await?;
            return Ok(token.into_tokens(Utc::now()));
        }
        Err(ClientError::from_response(res).await)
    }
}

/// Parses a base URL so that relative joins append to its path.
pub(crate) fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Url::parse(&raw).map_err(|err| ClientError::InvalidUrl(format!("{raw}: {err}")))
}

pub(crate) fn join(base: &Url, path: &str) -> Result<Url, ClientError> {
    base.join(path)
        .map_err(|err| ClientError::InvalidUrl(format!("{path}: {err}")))
}
