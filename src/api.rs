//! Client side of the dashboard backend's REST API.
//!
//! `DashboardApi` is the seam between the dashboard logic and HTTP; the
//! `HttpBackend` implementation talks to the real service over `reqwest`.

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::BackendConfig;
use crate::controls::ControlCommand;
use crate::error::ApiError;
use crate::models::{
    Job, JobId, LastValidCommand, NextValidCommandRequest, PrinterStatus, RatingRequest,
};

#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn printer_status(&self) -> Result<PrinterStatus, ApiError>;
    async fn jobs(&self) -> Result<Vec<Job>, ApiError>;
    async fn last_valid_command(&self) -> Result<LastValidCommand, ApiError>;
    async fn submit_next_valid(&self, request: &NextValidCommandRequest) -> Result<(), ApiError>;
    async fn send_control(&self, command: ControlCommand) -> Result<(), ApiError>;
    async fn rate_job(&self, request: &RatingRequest) -> Result<(), ApiError>;
    async fn timelapse(&self, job_id: JobId) -> Result<Vec<u8>, ApiError>;
    async fn picture_history(&self, job_id: JobId) -> Result<Vec<u8>, ApiError>;
}

pub struct HttpBackend {
    http: Client,
    config: BackendConfig,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> Result<Self, ApiError> {
        let http = ClientBuilder::new()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    async fn checked(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_response(response).await)
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.http.get(self.config.url(path)).send().await?;
        let body = Self::checked(response).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn post_empty(&self, path: &str) -> Result<(), ApiError> {
        let response = self.http.post(self.config.url(path)).send().await?;
        Self::checked(response).await?;
        Ok(())
    }

    async fn post_json<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.config.url(path))
            .json(body)
            .send()
            .await?;
        Self::checked(response).await?;
        Ok(())
    }

    async fn get_bytes(&self, path: &str, job_id: JobId) -> Result<Vec<u8>, ApiError> {
        let response = self
            .http
            .get(self.config.url(path))
            .query(&[("jobId", job_id)])
            .send()
            .await?;
        let body = Self::checked(response).await?.bytes().await?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl DashboardApi for HttpBackend {
    async fn printer_status(&self) -> Result<PrinterStatus, ApiError> {
        self.get_json(&self.config.endpoints.printer_status).await
    }

    async fn jobs(&self) -> Result<Vec<Job>, ApiError> {
        self.get_json(&self.config.endpoints.jobs).await
    }

    async fn last_valid_command(&self) -> Result<LastValidCommand, ApiError> {
        self.get_json(&self.config.endpoints.last_valid).await
    }

    async fn submit_next_valid(&self, request: &NextValidCommandRequest) -> Result<(), ApiError> {
        self.post_json(&self.config.endpoints.next_valid, request).await
    }

    async fn send_control(&self, command: ControlCommand) -> Result<(), ApiError> {
        self.post_empty(command.endpoint(&self.config.endpoints)).await
    }

    async fn rate_job(&self, request: &RatingRequest) -> Result<(), ApiError> {
        self.post_json(&self.config.endpoints.rate_job, request).await
    }

    async fn timelapse(&self, job_id: JobId) -> Result<Vec<u8>, ApiError> {
        self.get_bytes(&self.config.endpoints.timelapse, job_id).await
    }

    async fn picture_history(&self, job_id: JobId) -> Result<Vec<u8>, ApiError> {
        self.get_bytes(&self.config.endpoints.picture_history, job_id).await
    }
}
