/// Hosted auth provider client (GoTrue-compatible REST API)
///
/// Salon owners sign up and log in against the provider; this service only
/// relays credentials and verifies the access tokens it issues.
use crate::error::{Result, TryOnError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Tokens returned by a password or code grant
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub user: ProviderUser,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpOutcome {
    pub user: ProviderUser,
    /// `None` while the provider waits for e-mail confirmation
    pub session: Option<ProviderSession>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str, salon_name: &str)
        -> Result<SignUpOutcome>;

    async fn sign_in_with_password(&self, email: &str, password: &str)
        -> Result<ProviderSession>;

    async fn exchange_code(&self, auth_code: &str, code_verifier: &str)
        -> Result<ProviderSession>;
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignUpBody<'a> {
    email: &'a str,
    password: &'a str,
    data: SignUpMetadata<'a>,
}

#[derive(Serialize)]
struct SignUpMetadata<'a> {
    salon_name: &'a str,
}

#[derive(Serialize)]
struct PkceBody<'a> {
    auth_code: &'a str,
    code_verifier: &'a str,
}

/// Sign-up returns either a bare user or a full session, depending on
/// whether the project auto-confirms e-mail addresses
#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(ProviderSession),
    User(ProviderUser),
}

#[derive(Deserialize, Default)]
struct ProviderErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
}

impl ProviderErrorBody {
    fn into_message(self) -> Option<String> {
        self.msg.or(self.error_description).or(self.message)
    }
}

#[derive(Debug, Clone, Copy)]
enum Grant {
    SignUp,
    Password,
    Pkce,
}

impl Grant {
    fn describe(self) -> &'static str {
        match self {
            Grant::SignUp => "sign-up",
            Grant::Password => "password login",
            Grant::Pkce => "code exchange",
        }
    }
}

/// Map a rejected provider call to the caller-facing error
fn map_provider_error(grant: Grant, status: StatusCode, message: Option<String>) -> TryOnError {
    match (grant, status.as_u16()) {
        (Grant::SignUp, 400 | 422) => TryOnError::InvalidArgument(
            message.unwrap_or_else(|| "Sign-up rejected by auth provider".to_string()),
        ),
        (Grant::SignUp, 429) | (_, 500..) => TryOnError::Upstream(format!(
            "auth provider {} failed with HTTP {status}",
            grant.describe()
        )),
        (Grant::Password, 400 | 401 | 403 | 422) => {
            TryOnError::AuthenticationFailure("Invalid email or password".to_string())
        }
        (Grant::Pkce, 400 | 401 | 403 | 404 | 422) => {
            TryOnError::AuthenticationFailure("Invalid or expired authorization code".to_string())
        }
        _ => TryOnError::Upstream(format!(
            "auth provider {} failed with HTTP {status}",
            grant.describe()
        )),
    }
}

#[derive(Clone)]
pub struct RestAuthProvider {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl RestAuthProvider {
    pub fn new(client: Client, base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        }
    }

    fn token_url(&self, grant_type: &str) -> String {
        format!(
            "{}/auth/v1/token?grant_type={}",
            self.base_url,
            urlencoding::encode(grant_type)
        )
    }

    async fn post<B, T>(&self, grant: Grant, url: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync,
        T: serde::de::DeserializeOwned,
    {
        if self.base_url.is_empty() {
            return Err(TryOnError::Upstream(
                "auth provider is not configured".to_string(),
            ));
        }

        debug!(grant = grant.describe(), "Calling auth provider");

        let response = self
            .client
            .post(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ProviderErrorBody>()
                .await
                .unwrap_or_default()
                .into_message();
            warn!(
                grant = grant.describe(),
                status = %status,
                "Auth provider rejected request"
            );
            return Err(map_provider_error(grant, status, message));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl AuthProvider for RestAuthProvider {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        salon_name: &str,
    ) -> Result<SignUpOutcome> {
        let url = format!("{}/auth/v1/signup", self.base_url);
        let body = SignUpBody {
            email,
            password,
            data: SignUpMetadata { salon_name },
        };

        let outcome = match self.post::<_, SignUpResponse>(Grant::SignUp, &url, &body).await? {
            SignUpResponse::Session(session) => SignUpOutcome {
                user: session.user.clone(),
                session: Some(session),
            },
            SignUpResponse::User(user) => SignUpOutcome {
                user,
                session: None,
            },
        };
        Ok(outcome)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<ProviderSession> {
        let url = self.token_url("password");
        self.post(Grant::Password, &url, &Credentials { email, password })
            .await
    }

    async fn exchange_code(&self, auth_code: &str, code_verifier: &str) -> Result<ProviderSession> {
        let url = self.token_url("pkce");
        self.post(
            Grant::Pkce,
            &url,
            &PkceBody {
                auth_code,
                code_verifier,
            },
        )
        .await
    }
}
