use chrono::{Duration, Utc};
use tokio::sync::Mutex;

use crate::{AuthClient, AuthTokens, AuthUser, ClientError};

/// Tokens are refreshed this long before they expire.
const REFRESH_MARGIN_SECS: i64 = 60;

/// The signed-in user's tokens, shared by every client through an `Arc`.
///
/// The lock is held across a refresh, so concurrent callers wait for one
/// refresh instead of racing several.
#[derive(Debug)]
pub struct Session {
    auth: Option<AuthClient>,
    tokens: Mutex<Option<AuthTokens>>,
}

impl Session {
    /// A signed-out session backed by the auth provider.
    pub fn new(auth: AuthClient) -> Self {
        Self {
            auth: Some(auth),
            tokens: Mutex::new(None),
        }
    }

    /// A session holding a fixed token that is never refreshed.
    pub fn with_token(access_token: impl Into<String>) -> Self {
        Self {
            auth: None,
            tokens: Mutex::new(Some(AuthTokens {
                access_token: access_token.into(),
                refresh_token: None,
                expires_at: None,
                user: None,
            })),
        }
    }

    pub fn auth(&self) -> Option<&AuthClient> {
        self.auth.as_ref()
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, ClientError> {
        let auth = self.auth.as_ref().ok_or(ClientError::NotAuthenticated)?;
        let tokens = auth.sign_in_with_password(email, password).await?;
        let user = tokens.user.clone().unwrap_or(AuthUser {
            id: String::new(),
            email: Some(email.to_string()),
        });
        tracing::info!(user = %user.id, "signed in");
        *self.tokens.lock().await = Some(tokens);
        Ok(user)
    }

    /// Installs tokens obtained elsewhere.
    pub async fn restore(&self, tokens: AuthTokens) {
        *self.tokens.lock().await = Some(tokens);
    }

    /// Forgets the tokens locally even when the provider call fails.
    pub async fn sign_out(&self) -> Result<(), ClientError> {
        let tokens = self.tokens.lock().await.take();
        match (tokens, &self.auth) {
            (Some(tokens), Some(auth)) => auth.sign_out(&tokens.access_token).await,
            _ => Ok(()),
        }
    }

    pub async fn is_signed_in(&self) -> bool {
        self.tokens.lock().await.is_some()
    }

    pub async fn user(&self) -> Option<AuthUser> {
        self.tokens
            .lock()
            .await
            .as_ref()
            .and_then(|tokens| tokens.user.clone())
    }

    /// A valid access token, refreshed first when close to expiry.
    pub async fn access_token(&self) -> Result<String, ClientError> {
        let mut guard = self.tokens.lock().await;
        let Some(tokens) = guard.as_ref() else {
            return Err(ClientError::NotAuthenticated);
        };
        if !tokens.expires_within(Duration::seconds(REFRESH_MARGIN_SECS), Utc::now()) {
            return Ok(tokens.access_token.clone());
        }

        let (Some(auth), Some(refresh_token)) = (&self.auth, tokens.refresh_token.clone()) else {
            tracing::info!("access token expired without a way to refresh it");
            *guard = None;
            return Err(ClientError::NotAuthenticated);
        };

        match auth.refresh(&refresh_token).await {
            Ok(mut fresh) => {
                if fresh.user.is_none() {
                    fresh.user = tokens.user.clone();
                }
                let access_token = fresh.access_token.clone();
                *guard = Some(fresh);
                Ok(access_token)
            }
            Err(err) => {
                tracing::warn!(error = %err, "token refresh failed, signing out");
                *guard = None;
                Err(ClientError::NotAuthenticated)
            }
        }
    }
}
