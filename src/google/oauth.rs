//! OAuth token refresh for Google API access.

use anyhow::Result;
use serde::Deserialize;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

#[derive(Debug, Deserialize)]
pub struct OauthToken {
    pub access_token: String,
    pub expires_in: Option<i64>,
    pub token_type: Option<String>,
}

/// Exchange a long-lived refresh token for a short-lived access token.
/// Called per request rather than cached; access tokens are cheap and
/// this avoids tracking expiry.
pub async fn refresh_access_token(
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<OauthToken> {
    refresh_access_token_at(TOKEN_URL, client_id, client_secret, refresh_token).await
}

pub(crate) async fn refresh_access_token_at(
    token_url: &str,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<OauthToken> {
    let params = [
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("refresh_token", refresh_token),
        ("grant_type", "refresh_token"),
    ];

    let token = reqwest::Client::new()
        .post(token_url)
        .form(&params)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_refresh_access_token() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("POST", "/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"ya29.test","expires_in":3599,"token_type":"Bearer"}"#)
            .create();

        let url = format!("{}/token", server.url());
        let token = refresh_access_token_at(&url, "client-id", "client-secret", "refresh-token")
            .await
            .unwrap();

        mock.assert();
        assert_eq!(token.access_token, "ya29.test");
        assert_eq!(token.expires_in, Some(3599));
    }

    #[tokio::test]
    async fn test_refresh_access_token_http_error() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create();

        let url = format!("{}/token", server.url());
        let result = refresh_access_token_at(&url, "id", "secret", "stale").await;
        assert!(result.is_err());
    }
}
