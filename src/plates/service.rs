use color_eyre::{eyre::eyre, Result};
use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::RemoteConfig;
use crate::error::RemoteError;

use super::api_types::{ApiPlate, ApiPlateTypesResponse};
use super::types::{Plate, PlateType};

/// Remote source of plate information.
///
/// Calls may be slow and may fail transiently; callers treat errors as
/// retryable.
pub trait PlateService: Send + Sync {
  /// Fetch a single plate. `Ok(None)` means the service does not know it.
  fn fetch_plate(
    &self,
    requester: &str,
    plate_id: &str,
  ) -> impl Future<Output = Result<Option<Plate>, RemoteError>> + Send;

  /// Fetch every plate type the service knows.
  fn fetch_plate_types(
    &self,
    requester: &str,
  ) -> impl Future<Output = Result<Vec<PlateType>, RemoteError>> + Send;
}

/// Plate service client over HTTP/JSON
#[derive(Clone)]
pub struct HttpPlateService {
  client: reqwest::Client,
  base: Url,
  timeout: Duration,
  token: Option<String>,
}

impl HttpPlateService {
  pub fn new(config: &RemoteConfig, token: Option<String>) -> Result<Self> {
    let base =
      Url::parse(&config.url).map_err(|e| eyre!("Invalid plate service URL {}: {}", config.url, e))?;
    if base.cannot_be_a_base() {
      return Err(eyre!("Plate service URL {} cannot be used as a base", base));
    }

    let timeout = config.timeout();
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      client,
      base,
      timeout,
      token,
    })
  }

  async fn get(&self, url: Url) -> Result<reqwest::Response, RemoteError> {
    debug!(%url, "plate service request");
    let mut request = self.client.get(url);
    if let Some(token) = &self.token {
      request = request.bearer_auth(token);
    }
    request.send().await.map_err(|e| self.transport_error(e))
  }

  fn transport_error(&self, err: reqwest::Error) -> RemoteError {
    if err.is_timeout() {
      RemoteError::Timeout(self.timeout)
    } else {
      RemoteError::Transport(err.to_string())
    }
  }
}

/// Build `{base}/{segments..}?requester=..`, escaping each segment.
fn endpoint(base: &Url, segments: &[&str], requester: &str) -> Result<Url, RemoteError> {
  let mut url = base.clone();
  url
    .path_segments_mut()
    .map_err(|_| RemoteError::Transport(format!("{} cannot be a base URL", base)))?
    .pop_if_empty()
    .extend(segments);
  url.query_pairs_mut().append_pair("requester", requester);
  Ok(url)
}

async fn status_error(response: reqwest::Response) -> RemoteError {
  let status = response.status().as_u16();
  let message = response.text().await.unwrap_or_default();
  RemoteError::Status { status, message }
}

impl PlateService for HttpPlateService {
  async fn fetch_plate(&self, requester: &str, plate_id: &str) -> Result<Option<Plate>, RemoteError> {
    let url = endpoint(&self.base, &["plates", plate_id], requester)?;
    let response = self.get(url).await?;

    if response.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    if !response.status().is_success() {
      return Err(status_error(response).await);
    }

    let plate: ApiPlate = response
      .json()
      .await
      .map_err(|e| RemoteError::Decode(format!("plate {}: {}", plate_id, e)))?;
    Ok(Some(plate.into()))
  }

  async fn fetch_plate_types(&self, requester: &str) -> Result<Vec<PlateType>, RemoteError> {
    let url = endpoint(&self.base, &["plate-types"], requester)?;
    let response = self.get(url).await?;

    if !response.status().is_success() {
      return Err(status_error(response).await);
    }

    let body: ApiPlateTypesResponse = response
      .json()
      .await
      .map_err(|e| RemoteError::Decode(format!("plate types: {}", e)))?;
    Ok(body.plate_types.into_iter().map(PlateType::from).collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn base(url: &str) -> Url {
    Url::parse(url).unwrap()
  }

  #[test]
  fn test_endpoint_escapes_plate_id() {
    let url = endpoint(
      &base("https://imaging.example.org/api/"),
      &["plates", "A 1/2"],
      "lab user",
    )
    .unwrap();

    assert_eq!(
      url.as_str(),
      "https://imaging.example.org/api/plates/A%201%2F2?requester=lab+user"
    );
  }

  #[test]
  fn test_endpoint_without_trailing_slash() {
    let url = endpoint(&base("https://imaging.example.org/api"), &["plate-types"], "lab").unwrap();

    assert_eq!(url.as_str(), "https://imaging.example.org/api/plate-types?requester=lab");
  }

  #[test]
  fn test_rejects_non_base_url() {
    let config = RemoteConfig {
      url: "mailto:lab@example.org".to_string(),
      timeout_secs: 5,
      requester: None,
    };
    assert!(HttpPlateService::new(&config, None).is_err());
  }
}
