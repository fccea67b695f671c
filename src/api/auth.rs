use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use super::AuthApi;
use crate::error::AppError;
use crate::http::ApiClient;
use crate::models::{Credentials, User};

pub struct HttpAuthApi {
    client: ApiClient,
}

impl HttpAuthApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn sign_up(&self, credentials: &Credentials) -> Result<(), AppError> {
        let response = self
            .client
            .post("/auth/sign-up")
            .json(credentials)
            .send()
            .await?;

        // The success body varies between server versions and is not used.
        ApiClient::expect_success(response, "Registration failed").await
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<bool, AppError> {
        let response = self
            .client
            .post("/auth/sign-in")
            .json(credentials)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                debug!(status = %response.status(), "sign-in rejected");
                Ok(false)
            }
            _ => ApiClient::expect_success(response, "Login failed")
                .await
                .map(|_| false),
        }
    }

    async fn current_user(&self) -> Result<Option<User>, AppError> {
        let response = self.client.get("/user").send().await?;

        if !response.status().is_success() {
            debug!(status = %response.status(), "no active session");
            return Ok(None);
        }

        ApiClient::read_json::<User>(response, "Failed to load user")
            .await
            .map(Some)
    }

    async fn logout(&self) -> Result<(), AppError> {
        let response = self.client.post("/auth/logout").send().await?;
        ApiClient::expect_success(response, "Logout failed").await
    }
}
