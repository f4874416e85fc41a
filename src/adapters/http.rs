use crate::config::toml_config::HttpConfig;
use crate::utils::error::{Result, SourceError};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

/// Built once and shared by every provider; each request is bounded by the
/// configured timeout.
pub fn build_client(config: &HttpConfig) -> Result<Client> {
    let client = Client::builder()
        .timeout(config.timeout())
        .user_agent(config.user_agent.as_str())
        .build()?;
    Ok(client)
}

/// 非 2xx 回應視為失敗，其餘解析為 JSON
pub async fn read_json<T: DeserializeOwned>(response: Response) -> std::result::Result<T, SourceError> {
    let status = response.status();
    tracing::debug!("Provider response status: {}", status);

    if !status.is_success() {
        return Err(SourceError::Status {
            status: status.as_u16(),
        });
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| SourceError::Decode {
        message: e.to_string(),
    })
}
