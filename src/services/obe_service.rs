use std::sync::Arc;
use log::info;
use reqwest::Method;
use serde_json::Value;
use url::form_urlencoded;
use crate::models::obe::{CoAttainment, ReportArtifact, ReportRequest};
use crate::services::gateway::{Gateway, GatewayError, RequestBody};

/// Outcome-based-education analytics.
#[derive(Clone)]
pub struct ObeService {
    gateway: Arc<Gateway>,
}

impl ObeService {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        ObeService { gateway }
    }

    pub async fn co_attainment(&self, subject: Option<&str>) -> Result<Vec<CoAttainment>, GatewayError> {
        let path = match subject.map(str::trim).filter(|s| !s.is_empty()) {
            Some(subject) => {
                let query: String = form_urlencoded::Serializer::new(String::new())
                    .append_pair("subject", subject)
                    .finish();
                format!("/obe/co-attainment?{}", query)
            }
            None => "/obe/co-attainment".to_string(),
        };
        let payload: Value = self.gateway.get_json(&path).await?;
        let attainments = CoAttainment::list_from_wire(&payload);
        info!("Loaded attainment for {} course outcomes", attainments.len());
        Ok(attainments)
    }

    pub async fn generate_report(&self, request: &ReportRequest) -> Result<ReportArtifact, GatewayError> {
        let body = serde_json::to_value(request).map_err(|e| GatewayError::InvalidPayload(e.to_string()))?;
        let response = self
            .gateway
            .send(Method::POST, "/obe/generate-report", RequestBody::Json(body))
            .await?;
        let artifact = ReportArtifact::new(
            &request.subject,
            response.header("content-type"),
            response.header("content-disposition"),
            response.body.clone(),
        );
        info!("Generated {} ({} bytes)", artifact.filename, artifact.bytes.len());
        Ok(artifact)
    }
}
