//! HTTP adapter for the hosted stored-procedure API.

mod mapping;

use std::env;
use std::sync::Arc;

use async_trait::async_trait;
use exam_core::model::{CompletedAttempt, ExamSerial, MockWindow, StudentId};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::repository::{
    AnswerRecord, AnswerSink, Backend, BackendError, MockCatalog, SectionPayload, SectionSource,
};
use mapping::{
    CompletedAttemptRow, LoadSectionParams, MockWindowRow, SectionResponse, SubmitAnswerParams,
    student_params,
};

const LOAD_SECTION_FN: &str = "get_mock_section";
const SUBMIT_ANSWER_FN: &str = "submit_mock_answer";
const MOCK_WINDOW_FN: &str = "get_mock_window";
const COMPLETED_ATTEMPTS_FN: &str = "list_completed_mock_attempts";

#[derive(Clone, Debug)]
pub struct RpcConfig {
    pub base_url: String,
    pub api_key: String,
}

impl RpcConfig {
    /// Read `EXAM_BACKEND_URL` and `EXAM_BACKEND_KEY`; `None` when either is unset or blank.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("EXAM_BACKEND_URL").ok()?;
        let api_key = env::var("EXAM_BACKEND_KEY").ok()?;
        if base_url.trim().is_empty() || api_key.trim().is_empty() {
            return None;
        }
        Some(Self { base_url, api_key })
    }

    fn endpoint(&self, function: &str) -> String {
        format!(
            "{}/rest/v1/rpc/{function}",
            self.base_url.trim_end_matches('/')
        )
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Serialization(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Backend client speaking JSON to named remote procedures.
#[derive(Clone)]
pub struct RpcBackend {
    client: Client,
    config: RpcConfig,
}

impl RpcBackend {
    #[must_use]
    pub fn new(config: RpcConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    async fn post<P: Serialize + Sync>(
        &self,
        function: &str,
        params: &P,
    ) -> Result<reqwest::Response, BackendError> {
        tracing::debug!(function, "rpc call");
        let response = self
            .client
            .post(self.config.endpoint(function))
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .json(params)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound);
        }
        if !status.is_success() {
            return Err(BackendError::HttpStatus(status.as_u16()));
        }
        Ok(response)
    }

    async fn call<P: Serialize + Sync, R: DeserializeOwned>(
        &self,
        function: &str,
        params: &P,
    ) -> Result<R, BackendError> {
        Ok(self.post(function, params).await?.json().await?)
    }
}

impl Backend {
    /// All three boundaries served by one HTTP client.
    #[must_use]
    pub fn rpc(config: RpcConfig) -> Self {
        let client = Arc::new(RpcBackend::new(config));
        Self {
            sections: client.clone(),
            answers: client.clone(),
            catalog: client,
        }
    }
}

#[async_trait]
impl SectionSource for RpcBackend {
    async fn load_section(
        &self,
        student_id: &StudentId,
        exam_serial: ExamSerial,
    ) -> Result<SectionPayload, BackendError> {
        let params = LoadSectionParams {
            p_student_id: student_id.as_str(),
            p_exam_serial: exam_serial.value(),
        };
        let response: SectionResponse = self.call(LOAD_SECTION_FN, &params).await?;
        response.into_payload()
    }
}

#[async_trait]
impl AnswerSink for RpcBackend {
    async fn submit_answer(&self, record: &AnswerRecord) -> Result<(), BackendError> {
        let params = SubmitAnswerParams::from_record(record);
        self.post(SUBMIT_ANSWER_FN, &params).await?;
        Ok(())
    }
}

#[async_trait]
impl MockCatalog for RpcBackend {
    async fn mock_windows(&self) -> Result<Vec<MockWindow>, BackendError> {
        let rows: Vec<MockWindowRow> = self.call(MOCK_WINDOW_FN, &serde_json::json!({})).await?;
        Ok(rows.into_iter().map(MockWindow::from).collect())
    }

    async fn completed_attempts(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<CompletedAttempt>, BackendError> {
        let rows: Vec<CompletedAttemptRow> = self
            .call(COMPLETED_ATTEMPTS_FN, &student_params(student_id))
            .await?;
        Ok(rows.into_iter().map(CompletedAttempt::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let config = RpcConfig {
            base_url: "https://example.test/".into(),
            api_key: "k".into(),
        };
        assert_eq!(
            config.endpoint(LOAD_SECTION_FN),
            "https://example.test/rest/v1/rpc/get_mock_section"
        );
    }
}
