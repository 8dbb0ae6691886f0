//! Access token supplied through configuration.

use async_trait::async_trait;
use docketsync_core::sync::ports::AccessTokenProvider;

/// Hands out a static bearer token. Token issuance and refresh live outside
/// this service.
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn get_valid_access_token(&self) -> Result<String, String> {
        self.token
            .clone()
            .ok_or_else(|| "No matter API access token configured (MATTER_API_TOKEN)".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blank_token_is_unavailable() {
        let provider = StaticTokenProvider::new(Some("   ".to_string()));
        assert!(provider.get_valid_access_token().await.is_err());

        let provider = StaticTokenProvider::new(Some("abc".to_string()));
        assert_eq!(provider.get_valid_access_token().await.as_deref(), Ok("abc"));
    }
}
