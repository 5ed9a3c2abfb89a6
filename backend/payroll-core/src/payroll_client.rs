// src/payroll_client.rs
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, error, info};
use url::Url;

use crate::config::Config;
use crate::error::PayrollError;
use crate::period::Period;
use crate::reconcile::{hydrate_rows, PayrollRow, RawRow, SaveRow};

pub const PERIODS_PATH: &str = "payroll/periods";
pub const SUMMARY_PATH: &str = "payroll/summary";
pub const SAVE_PATH: &str = "payroll/save";

/// Result of a lookup that may legitimately find nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

/// Body of `GET payroll/summary`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollSummary {
    #[serde(default)]
    pub period: Option<Period>,
    #[serde(default)]
    pub rows: Vec<RawRow>,
    #[serde(default)]
    pub global_notes: Option<String>,
}

impl PayrollSummary {
    pub fn payroll_rows(&self) -> Vec<PayrollRow> {
        hydrate_rows(&self.rows)
    }
}

/// Body of `POST payroll/save`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePayload {
    pub period_id: String,
    pub rows: Vec<SaveRow>,
    pub global_notes: String,
}

impl SavePayload {
    pub fn new(period_id: impl Into<String>, rows: &[PayrollRow], global_notes: impl Into<String>) -> Self {
        Self {
            period_id: period_id.into(),
            rows: rows.iter().map(PayrollRow::to_save_row).collect(),
            global_notes: global_notes.into(),
        }
    }
}

// The periods endpoint answers either with a bare list or wrapped in an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PeriodsResponse {
    List(Vec<Period>),
    Wrapped { periods: Vec<Period> },
}

impl PeriodsResponse {
    fn into_periods(self) -> Vec<Period> {
        match self {
            PeriodsResponse::List(periods) => periods,
            PeriodsResponse::Wrapped { periods } => periods,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorPayload {
    message: Option<String>,
    error: Option<String>,
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorPayload>(body) {
        Ok(ApiErrorPayload {
            message: Some(message),
            ..
        }) => message,
        Ok(ApiErrorPayload {
            error: Some(error), ..
        }) => error,
        _ => body.trim().to_string(),
    }
}

/// Thin client over the payroll endpoints of the admin backend. No retries.
#[derive(Clone)]
pub struct PayrollApiClient {
    http_client: Client,
    base_url: Url,
    api_token: Option<String>,
}

impl PayrollApiClient {
    pub fn new(base_url: &str, api_token: Option<String>) -> Result<Self, PayrollError> {
        // Url::join drops the last segment unless the base ends with a slash
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Self {
            http_client: Client::new(),
            base_url: Url::parse(&base)?,
            api_token: api_token.filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, PayrollError> {
        Self::new(&config.api_base_url, config.api_token.clone())
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, PayrollError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn build_request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .http_client
            .request(method, url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json");
        match &self.api_token {
            Some(token) => builder.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => builder,
        }
    }

    /// Sends the request and returns the body of a 2xx answer. A 404 maps to
    /// `NotFound`, any other non-2xx status to `PayrollError::Api`.
    async fn execute(
        &self,
        request_builder: RequestBuilder,
        context_msg: &str,
    ) -> Result<Lookup<String>, PayrollError> {
        let response = request_builder.send().await.map_err(|e| {
            error!("HTTP request for '{}' failed before a response: {}", context_msg, e);
            PayrollError::Request(e)
        })?;

        let status = response.status();
        let request_url = response.url().to_string();
        info!(
            "Received response for '{}' (URL: {}): Status={}",
            context_msg, request_url, status
        );

        if status == StatusCode::NOT_FOUND {
            return Ok(Lookup::NotFound);
        }

        let body = response.text().await?;
        if !status.is_success() {
            error!(
                "API Error Response: Status={}, Body='{}' for URL: {}",
                status, body, request_url
            );
            return Err(PayrollError::Api {
                status,
                message: error_message(&body),
            });
        }

        debug!("Raw response body for '{}': {}", context_msg, body);
        Ok(Lookup::Found(body))
    }

    async fn send_and_deserialize<T: DeserializeOwned>(
        &self,
        request_builder: RequestBuilder,
        context_msg: &str,
    ) -> Result<Lookup<T>, PayrollError> {
        match self.execute(request_builder, context_msg).await? {
            Lookup::Found(body) => {
                let data = serde_json::from_str::<T>(&body).map_err(|e| {
                    error!("JSON deserialization failed for '{}': {}", context_msg, e);
                    PayrollError::Json(e)
                })?;
                Ok(Lookup::Found(data))
            }
            Lookup::NotFound => Ok(Lookup::NotFound),
        }
    }

    pub async fn list_periods(&self) -> Result<Vec<Period>, PayrollError> {
        let url = self.endpoint(PERIODS_PATH)?;
        let request = self.build_request(Method::GET, url);
        match self
            .send_and_deserialize::<PeriodsResponse>(request, "list periods")
            .await?
        {
            Lookup::Found(response) => Ok(response.into_periods()),
            Lookup::NotFound => Ok(Vec::new()),
        }
    }

    pub async fn fetch_summary(&self, period_id: &str) -> Result<Lookup<PayrollSummary>, PayrollError> {
        let mut url = self.endpoint(SUMMARY_PATH)?;
        url.query_pairs_mut().append_pair("periodId", period_id);
        let request = self.build_request(Method::GET, url);
        self.send_and_deserialize(request, &format!("summary {}", period_id))
            .await
    }

    pub async fn save(&self, payload: &SavePayload) -> Result<(), PayrollError> {
        let url = self.endpoint(SAVE_PATH)?;
        let request = self.build_request(Method::POST, url).json(payload);
        info!(
            "Saving {} payroll rows for period {}",
            payload.rows.len(),
            payload.period_id
        );
        // The body of a successful save is not used and may be empty.
        match self.execute(request, "save payroll").await? {
            Lookup::Found(_) => Ok(()),
            Lookup::NotFound => Err(PayrollError::Api {
                status: StatusCode::NOT_FOUND,
                message: format!("save endpoint not found for period {}", payload.period_id),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = PayrollApiClient::new("https://admin.example.com/api", None).unwrap();
        assert_eq!(
            client.endpoint(SUMMARY_PATH).unwrap().as_str(),
            "https://admin.example.com/api/payroll/summary"
        );
        assert_eq!(
            client.endpoint("/payroll/save").unwrap().as_str(),
            "https://admin.example.com/api/payroll/save"
        );
    }

    #[test]
    fn test_new_rejects_bad_base_url() {
        assert!(matches!(
            PayrollApiClient::new("not a url", None),
            Err(PayrollError::UrlParse(_))
        ));
    }

    #[test]
    fn test_blank_token_is_ignored() {
        let client = PayrollApiClient::new("http://localhost:3000", Some("  ".into())).unwrap();
        assert!(client.api_token.is_none());
    }

    #[test]
    fn test_periods_response_shapes() {
        let bare: PeriodsResponse =
            serde_json::from_value(json!([{"id": "2025-01-01_2025-01-14", "label": "x"}])).unwrap();
        let wrapped: PeriodsResponse =
            serde_json::from_value(json!({"periods": [{"id": "2025-01-15_2025-01-28"}]})).unwrap();
        assert_eq!(bare.into_periods()[0].id, "2025-01-01_2025-01-14");
        assert_eq!(wrapped.into_periods()[0].id, "2025-01-15_2025-01-28");
    }

    #[test]
    fn test_summary_payload_decodes_and_hydrates() {
        let summary: PayrollSummary = serde_json::from_value(json!({
            "period": {"id": "2025-01-01_2025-01-14", "label": "Jan 1 - Jan 14"},
            "rows": [{"employeeId": "e1", "employeeName": "Ana", "totalHours": 10, "hoursPaid": 4, "cashHourlyRate": 20}],
            "globalNotes": "check fuel card"
        }))
        .unwrap();

        let rows = summary.payroll_rows();
        assert_eq!(rows[0].balance(), dec!(6));
        assert_eq!(rows[0].cash_paid(), dec!(80));
        assert_eq!(summary.global_notes.as_deref(), Some("check fuel card"));

        let empty: PayrollSummary = serde_json::from_value(json!({})).unwrap();
        assert!(empty.rows.is_empty());
        assert!(empty.period.is_none());
    }

    #[test]
    fn test_save_payload_shape() {
        let rows = vec![PayrollRow::new("e1", "Ana", dec!(10), Some(dec!(20)), dec!(7.5), "ok")];
        let payload = SavePayload::new("2025-01-01_2025-01-14", &rows, "");
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "periodId": "2025-01-01_2025-01-14",
                "rows": [{"employeeId": "e1", "hoursPaid": 7.5, "notes": "ok"}],
                "globalNotes": ""
            })
        );
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(r#"{"message": "period locked"}"#), "period locked");
        assert_eq!(error_message(r#"{"error": "unauthorized"}"#), "unauthorized");
        assert_eq!(error_message("  Bad Gateway \n"), "Bad Gateway");
    }
}
