//! Google Sheets (v4 REST) store

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Result, SyncError};

use super::auth::CredentialChain;
use super::{value_to_text, SheetStore};

const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// One worksheet of a Google spreadsheet
pub struct GoogleSheetStore {
    client: Client,
    credentials: CredentialChain,
    spreadsheet_id: String,
    sheet_name: String,
    base_url: String,
}

impl GoogleSheetStore {
    /// Build a store for the configured spreadsheet/sheet. No request is
    /// made until the first operation.
    pub fn new(config: &Config, credentials: CredentialChain) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("ordersync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SyncError::Unavailable(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            credentials,
            spreadsheet_id: config.spreadsheet_id.clone(),
            sheet_name: config.sheet_name.clone(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the store at another API host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// A1 range naming the whole sheet, or a cell in it
    fn range(&self, cell: Option<&str>) -> String {
        let quoted = format!("'{}'", self.sheet_name.replace('\'', "''"));
        match cell {
            Some(cell) => format!("{}!{}", quoted, cell),
            None => quoted,
        }
    }

    /// `.../v4/spreadsheets/{id}/values/{range}[:{action}]`
    fn values_url(&self, range: &str, action: Option<&str>) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SyncError::Config(format!("invalid API base url: {}", e)))?;
        let segment = match action {
            Some(action) => format!("{}:{}", range, action),
            None => range.to_string(),
        };
        url.path_segments_mut()
            .map_err(|_| SyncError::Config("API base url cannot hold a path".to_string()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", segment.as_str()]);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.credentials.access_token(&self.client)?;
        Ok(request.bearer_auth(token.secret))
    }

    /// Send a request; transport and HTTP failures are mapped with `on_error`
    fn send(&self, request: RequestBuilder, on_error: fn(String) -> SyncError) -> Result<Response> {
        let response = self
            .authorized(request)?
            .send()
            .map_err(|e| SyncError::Unavailable(format!("request failed: {}", e)))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        let message = format!("{} {}", status, body.trim());
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SyncError::Unavailable(message)),
            _ => Err(on_error(message)),
        }
    }

    fn write_values(&self, rows: &[Vec<Value>]) -> Result<()> {
        let range = self.range(Some("A1"));
        let mut url = self.values_url(&range, None)?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        let body = json!({ "range": range, "majorDimension": "ROWS", "values": rows });
        self.send(self.client.put(url).json(&body), SyncError::WriteError)?;
        Ok(())
    }
}

impl SheetStore for GoogleSheetStore {
    fn list(&self) -> Result<Vec<Vec<String>>> {
        let mut url = self.values_url(&self.range(None), None)?;
        url.query_pairs_mut().append_pair("majorDimension", "ROWS");
        let response = self.send(self.client.get(url), SyncError::Unavailable)?;
        let range: ValueRange = response
            .json()
            .map_err(|e| SyncError::Unavailable(format!("unexpected sheet payload: {}", e)))?;
        debug!(rows = range.values.len(), sheet = %self.sheet_name, "listed sheet");
        Ok(range
            .values
            .iter()
            .map(|row| row.iter().map(value_to_text).collect())
            .collect())
    }

    fn clear(&self) -> Result<()> {
        let url = self.values_url(&self.range(None), Some("clear"))?;
        self.send(self.client.post(url).json(&json!({})), SyncError::WriteError)?;
        info!(sheet = %self.sheet_name, "cleared sheet");
        Ok(())
    }

    fn append_header(&self, fields: &[String]) -> Result<()> {
        let row: Vec<Value> = fields.iter().cloned().map(Value::String).collect();
        self.append_rows(&[row])
    }

    fn append_rows(&self, rows: &[Vec<Value>]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut url = self.values_url(&self.range(Some("A1")), Some("append"))?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");
        let body = json!({ "majorDimension": "ROWS", "values": rows });
        self.send(self.client.post(url).json(&body), SyncError::WriteError)?;
        Ok(())
    }

    /// Clear, then overwrite from A1 with the whole batch in one request
    fn replace(&self, header: &[String], rows: &[Vec<Value>]) -> Result<()> {
        let mut batch: Vec<Vec<Value>> = Vec::with_capacity(rows.len() + 1);
        batch.push(header.iter().cloned().map(Value::String).collect());
        batch.extend(rows.iter().cloned());

        self.clear()?;
        self.write_values(&batch)?;
        info!(rows = rows.len(), sheet = %self.sheet_name, "replaced sheet contents");
        Ok(())
    }
}
