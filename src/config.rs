use std::env;

use crate::error::AppError;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AppError> {
        let raw = base_url.into();
        let base_url = raw.trim().trim_end_matches('/').to_string();

        if base_url.is_empty() {
            return Err(AppError::Config("API base URL is empty".to_string()));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "API base URL must start with http:// or https://: {}",
                raw
            )));
        }

        Ok(Self { base_url })
    }

    /// Reads `TASKTRACK_API_URL`, falling back to the local development server.
    pub fn new_from_env() -> Result<Self, AppError> {
        let base_url = env::var("TASKTRACK_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::new(base_url)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_slash() {
        let config = ApiConfig::new("http://example.test/api/").unwrap();
        assert_eq!(config.base_url, "http://example.test/api");
    }

    #[test]
    fn rejects_missing_scheme() {
        assert!(matches!(
            ApiConfig::new("example.test/api"),
            Err(AppError::Config(_))
        ));
        assert!(matches!(ApiConfig::new("   "), Err(AppError::Config(_))));
    }

    #[test]
    fn default_points_at_local_server() {
        assert_eq!(ApiConfig::default().base_url, DEFAULT_API_URL);
    }
}
