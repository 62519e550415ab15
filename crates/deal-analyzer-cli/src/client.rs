//! HTTP client for the authoritative analysis backend.

use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

use deal_analyzer_core::analysis::DealAnalysis;
use deal_analyzer_core::deal::DealInput;

pub const ANALYZE_PATH: &str = "/api/analyze-deal";

/// Errors from a single analysis request. None of them are retried.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection, TLS or body transfer failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-2xx status
    #[error("Analysis backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// 2xx body that is not a bare DealAnalysis
    #[error("Could not decode analysis response: {0}")]
    Decode(String),
}

#[derive(Clone)]
pub struct AnalysisClient {
    client: Client,
    base_url: String,
}

impl AnalysisClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, ANALYZE_PATH)
    }

    /// POST the deal and decode the analysis. One attempt only.
    pub async fn analyze(&self, input: &DealInput) -> Result<DealAnalysis, ClientError> {
        let url = self.endpoint();
        debug!(%url, "posting deal for analysis");

        let response = self.client.post(&url).json(input).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "analysis request rejected");
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deal_analyzer_core::analysis::build_analysis;
    use deal_analyzer_core::deal::{DealDraft, PropertyType};
    use rust_decimal_macros::dec;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn deal() -> DealInput {
        DealDraft {
            property_type: Some(PropertyType::Industrial),
            purchase_price: Some(dec!(2400000)),
            number_of_units: Some(3),
            ..DealDraft::default()
        }
        .finalize()
        .unwrap()
    }

    #[tokio::test]
    async fn test_posts_deal_and_decodes_bare_analysis() {
        let server = MockServer::start().await;
        let analysis = build_analysis(&deal(), &mut Vec::new()).unwrap();

        Mock::given(method("POST"))
            .and(path(ANALYZE_PATH))
            .and(body_partial_json(serde_json::json!({
                "propertyType": "industrial",
                "numberOfUnits": 3
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(&analysis))
            .expect(1)
            .mount(&server)
            .await;

        let client = AnalysisClient::new(format!("{}/", server.uri())).unwrap();
        let result = client.analyze(&deal()).await.unwrap();
        assert_eq!(result, analysis);
    }

    #[tokio::test]
    async fn test_non_success_status_carries_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ANALYZE_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_string("Analysis failed: boom"))
            .expect(1)
            .mount(&server)
            .await;

        let client = AnalysisClient::new(server.uri()).unwrap();
        match client.analyze(&deal()).await {
            Err(ClientError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "Analysis failed: boom");
            }
            other => panic!("Expected Status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_data_envelope_is_a_decode_error() {
        let server = MockServer::start().await;
        let analysis = build_analysis(&deal(), &mut Vec::new()).unwrap();
        Mock::given(method("POST"))
            .and(path(ANALYZE_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": analysis })),
            )
            .mount(&server)
            .await;

        let client = AnalysisClient::new(server.uri()).unwrap();
        assert!(matches!(
            client.analyze(&deal()).await,
            Err(ClientError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        // Nothing listens on port 9 locally
        let client = AnalysisClient::new("http://127.0.0.1:9").unwrap();
        assert!(matches!(
            client.analyze(&deal()).await,
            Err(ClientError::Http(_))
        ));
    }
}
