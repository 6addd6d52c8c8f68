//! Thin HTTP binding for the assistant API endpoints.

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{AccessToken, Settings},
    error::ErrorBody,
    protocol::{
        ChatRequest, ChatResponse, LoginForm, RegisterRequest, SettingsSaved, SettingsUpdate,
        TokenResponse, UserProfile,
    },
};
use url::Url;

use crate::error::ClientError;

#[derive(Clone)]
pub struct HttpApi {
    http: Client,
    base_url: Url,
}

impl HttpApi {
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: &str) -> Result<Self, ClientError> {
        let invalid = |reason: String| ClientError::InvalidServerUrl {
            url: server_url.to_string(),
            reason,
        };
        let mut base_url = Url::parse(server_url.trim()).map_err(|e| invalid(e.to_string()))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https".into()));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidServerUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<TokenResponse, ClientError> {
        let builder = self.http.post(self.endpoint("register")?).json(request);
        send_and_decode(builder).await
    }

    pub async fn login(&self, form: &LoginForm) -> Result<TokenResponse, ClientError> {
        let builder = self.http.post(self.endpoint("login")?).form(form);
        send_and_decode(builder).await
    }

    pub async fn chat(&self, token: &AccessToken, message: &str) -> Result<ChatResponse, ClientError> {
        let builder = self
            .http
            .post(self.endpoint("chat")?)
            .bearer_auth(token.as_str())
            .json(&ChatRequest {
                message: message.to_string(),
            });
        send_and_decode(builder).await
    }

    pub async fn fetch_settings(&self, token: &AccessToken) -> Result<Settings, ClientError> {
        let builder = self
            .http
            .get(self.endpoint("settings")?)
            .bearer_auth(token.as_str());
        send_and_decode(builder).await
    }

    pub async fn save_settings(
        &self,
        token: &AccessToken,
        update: &SettingsUpdate,
    ) -> Result<SettingsSaved, ClientError> {
        let builder = self
            .http
            .post(self.endpoint("settings")?)
            .bearer_auth(token.as_str())
            .json(update);
        send_and_decode(builder).await
    }

    pub async fn me(&self, token: &AccessToken) -> Result<UserProfile, ClientError> {
        let builder = self
            .http
            .get(self.endpoint("me")?)
            .bearer_auth(token.as_str());
        send_and_decode(builder).await
    }
}

async fn send_and_decode<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ClientError> {
    let response = builder
        .send()
        .await
        .map_err(|e| ClientError::Network(e.to_string()))?;
    decode(response).await
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.json::<ErrorBody>().await.unwrap_or_default();
        return Err(ClientError::Http {
            status: status.as_u16(),
            detail: body.message(),
        });
    }
    response
        .json::<T>()
        .await
        .map_err(|e| ClientError::InvalidResponse(e.to_string()))
}
