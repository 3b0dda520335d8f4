// Azure Speech token issuance for the browser speech SDK

use anyhow::{bail, Context, Result};
use interview_common::config::AzureSpeechConfig;
use std::time::Duration;

const ISSUE_TIMEOUT: Duration = Duration::from_secs(10);
const TOKEN_PATH: &str = "/sts/v1.0/issueToken";

/// Region reported to the browser when only an endpoint is configured
pub const FALLBACK_REGION: &str = "eastus";

/// Token endpoint; an explicit endpoint wins over the region
pub fn token_url(config: &AzureSpeechConfig) -> Option<String> {
    if let Some(endpoint) = &config.endpoint {
        return Some(format!("{}{}", endpoint.trim_end_matches('/'), TOKEN_PATH));
    }
    config
        .region
        .as_ref()
        .map(|region| format!("https://{}.api.cognitive.microsoft.com{}", region, TOKEN_PATH))
}

/// Issue a short-lived token
pub async fn issue_token(http: &reqwest::Client, config: &AzureSpeechConfig) -> Result<String> {
    let (Some(key), Some(url)) = (config.key.as_deref(), token_url(config)) else {
        bail!("Missing Azure config: require key and (region or endpoint)");
    };

    let response = http
        .post(&url)
        .header("Ocp-Apim-Subscription-Key", key)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .timeout(ISSUE_TIMEOUT)
        .send()
        .await
        .with_context(|| format!("request to {} failed", url))?
        .error_for_status()?;

    Ok(response.text().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(key: Option<&str>, region: Option<&str>, endpoint: Option<&str>) -> AzureSpeechConfig {
        AzureSpeechConfig {
            key: key.map(str::to_string),
            region: region.map(str::to_string),
            endpoint: endpoint.map(str::to_string),
        }
    }

    #[test]
    fn test_token_url() {
        assert_eq!(
            token_url(&config(Some("k"), Some("westeurope"), None)).as_deref(),
            Some("https://westeurope.api.cognitive.microsoft.com/sts/v1.0/issueToken")
        );
        assert_eq!(
            token_url(&config(Some("k"), Some("westeurope"), Some("https://speech.example/"))).as_deref(),
            Some("https://speech.example/sts/v1.0/issueToken")
        );
        assert_eq!(token_url(&config(Some("k"), None, None)), None);
    }

    #[tokio::test]
    async fn test_unconfigured_is_an_error() {
        let http = reqwest::Client::new();
        let err = issue_token(&http, &config(None, Some("eastus"), None)).await.unwrap_err();
        assert!(err.to_string().starts_with("Missing Azure config"));
        assert!(issue_token(&http, &config(Some("k"), None, None)).await.is_err());
    }
}
