//! HTTP+JSON implementation of [`LearningApi`].

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{ApiConfig, Certificate, CertificateLookup, Enrollment, Progress};
use crate::utils::http::create_async_client;
use crate::utils::{endpoint, path_segment};

use super::{LearningApi, LessonUpdate};

/// Strip the optional `{ "data": ... }` wrapper some endpoints add.
fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// How a response status is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusClass {
    Success,
    AuthExpired,
    NotFound,
    /// 403 or any 5xx: the service refuses or is down
    Unavailable,
    Failed,
}

fn classify(status: StatusCode) -> StatusClass {
    match status {
        s if s.is_success() => StatusClass::Success,
        StatusCode::UNAUTHORIZED => StatusClass::AuthExpired,
        StatusCode::NOT_FOUND => StatusClass::NotFound,
        StatusCode::FORBIDDEN => StatusClass::Unavailable,
        s if s.is_server_error() => StatusClass::Unavailable,
        _ => StatusClass::Failed,
    }
}

/// Backend client over reqwest.
#[derive(Debug, Clone)]
pub struct HttpLearningApi {
    client: Client,
    base_url: Url,
}

impl HttpLearningApi {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = create_async_client(config)?;
        Self::with_client(client, &config.base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self> {
        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        endpoint(&self.base_url, path)
    }

    /// Send a request and fail on anything but a 2xx.
    async fn send(&self, request: RequestBuilder, context: &str) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        match classify(status) {
            StatusClass::Success => Ok(response),
            StatusClass::AuthExpired => {
                log::debug!("{} answered 401", context);
                Err(AppError::AuthExpired)
            }
            _ => Err(AppError::status(context, status.as_u16())),
        }
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let bytes = response.bytes().await?;
        let value: Value = serde_json::from_slice(&bytes)?;
        Ok(serde_json::from_value(unwrap_envelope(value))?)
    }

    async fn post_lesson(&self, update: &LessonUpdate, action: &str) -> Result<()> {
        let path = format!("progress/{}/{}", path_segment(&update.course_id), action);
        let request = self.client.post(self.url(&path)?).json(update);
        self.send(request, &path).await?;
        Ok(())
    }
}

#[async_trait]
impl LearningApi for HttpLearningApi {
    async fn fetch_enrollment(&self, course_id: &str) -> Result<Enrollment> {
        let path = format!("enrollments/course/{}", path_segment(course_id));
        let response = self.send(self.client.get(self.url(&path)?), &path).await?;
        Self::read_json(response).await
    }

    async fn fetch_progress(&self, course_id: &str) -> Result<Progress> {
        let path = format!("progress/{}", path_segment(course_id));
        let response = self.send(self.client.get(self.url(&path)?), &path).await?;
        Self::read_json(response).await
    }

    async fn mark_lesson_complete(&self, update: &LessonUpdate) -> Result<()> {
        self.post_lesson(update, "complete").await
    }

    async fn unmark_lesson_complete(&self, update: &LessonUpdate) -> Result<()> {
        self.post_lesson(update, "incomplete").await
    }

    async fn get_certificate_by_course(&self, course_id: &str) -> Result<CertificateLookup> {
        let path = format!("certificates/course/{}", path_segment(course_id));
        let response = match self.client.get(self.url(&path)?).send().await {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Certificate lookup unreachable: {}", e);
                return Ok(CertificateLookup::Unavailable(format!("unreachable: {e}")));
            }
        };

        let status = response.status();
        match classify(status) {
            StatusClass::Success => match Self::read_json::<Option<Certificate>>(response).await {
                Ok(Some(certificate)) => Ok(CertificateLookup::Found(certificate)),
                Ok(None) => Ok(CertificateLookup::NotFound),
                Err(e) => {
                    log::warn!("Unreadable certificate lookup response: {}", e);
                    Ok(CertificateLookup::Unavailable(e.to_string()))
                }
            },
            StatusClass::AuthExpired => Err(AppError::AuthExpired),
            StatusClass::NotFound => Ok(CertificateLookup::NotFound),
            StatusClass::Unavailable | StatusClass::Failed => Ok(CertificateLookup::Unavailable(
                format!("status {}", status.as_u16()),
            )),
        }
    }

    async fn generate_certificate(&self, course_id: &str) -> Result<Certificate> {
        let path = "certificates/generate";
        let body = serde_json::json!({ "courseId": course_id });
        let response = self
            .client
            .post(self.url(path)?)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ServiceUnavailable(format!("unreachable: {e}")))?;

        let status = response.status();
        match classify(status) {
            StatusClass::Success => Self::read_json(response).await,
            StatusClass::AuthExpired => Err(AppError::AuthExpired),
            StatusClass::NotFound | StatusClass::Unavailable => Err(
                AppError::ServiceUnavailable(format!("status {}", status.as_u16())),
            ),
            StatusClass::Failed => Err(AppError::status(path, status.as_u16())),
        }
    }
}
