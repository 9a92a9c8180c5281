//! Implements the `Sheet` trait against the Google Sheets API.

use crate::api::{quote_tab, Sheet, SheetRange, TokenProvider};
use crate::{Config, Result};
use anyhow::Context;
use sheets::types::{
    BatchUpdateValuesRequest, DateTimeRenderOption, Dimension, ValueInputOption, ValueRange,
    ValueRenderOption,
};
use sheets::ClientError;
use tracing::trace;

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Reads and batch-writes through `sheets::Client`. Appends go straight to the REST endpoint
/// because the client does not expose the insert-rows option. The `TokenProvider` is consulted
/// before every call so that a long session keeps working after the token expires.
pub(super) struct GoogleSheet {
    config: Config,
    token_provider: TokenProvider,
    client: sheets::Client,
    http: reqwest::Client,
}

impl GoogleSheet {
    pub(super) async fn new(config: Config, mut token_provider: TokenProvider) -> Result<Self> {
        let client = create_sheets_client(&mut token_provider).await?;
        Ok(Self {
            config,
            token_provider,
            client,
            http: reqwest::Client::new(),
        })
    }

    async fn refresh_client(&mut self) -> Result<()> {
        self.client = create_sheets_client(&mut self.token_provider).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Sheet for GoogleSheet {
    async fn get(&mut self, tab: &str) -> Result<Vec<Vec<String>>> {
        trace!("get for {tab}");
        self.refresh_client().await?;
        let range = format!("{}!A:ZZ", quote_tab(tab));
        let response = self
            .client
            .spreadsheets()
            .values_get(
                self.config.spreadsheet_id(),
                &range,
                DateTimeRenderOption::FormattedString,
                Dimension::Rows,
                ValueRenderOption::FormattedValue,
            )
            .await
            .map_err(map_client_error)
            .with_context(|| format!("Failed to fetch {tab} sheet data"))?;
        Ok(response.body.values)
    }

    async fn append_rows(&mut self, tab: &str, rows: &[Vec<String>]) -> Result<()> {
        trace!("append_rows for {tab}, {} rows", rows.len());
        let token = self.token_provider.token_with_refresh().await?.to_string();
        let range = format!("{}!A1", quote_tab(tab));
        let mut url = url::Url::parse(SHEETS_API).context("Invalid Sheets API URL")?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Sheets API URL cannot be a base"))?
            .push(self.config.spreadsheet_id())
            .push("values")
            .push(&format!("{range}:append"));
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&serde_json::json!({
                "majorDimension": "ROWS",
                "values": rows,
            }))
            .send()
            .await
            .with_context(|| format!("Failed to send append request for {tab}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            anyhow::bail!("Appending to {tab} failed with status {status}: {body}");
        }
        Ok(())
    }

    async fn write_ranges(&mut self, data: &[SheetRange]) -> Result<()> {
        self.refresh_client().await?;
        let value_ranges: Vec<ValueRange> = data
            .iter()
            .map(|sr| ValueRange {
                major_dimension: Some(Dimension::Rows),
                range: sr.range.clone(),
                values: sr.values.clone(),
            })
            .collect();

        let request = BatchUpdateValuesRequest {
            data: value_ranges,
            include_values_in_response: Some(false),
            response_date_time_render_option: None,
            response_value_render_option: None,
            value_input_option: Some(ValueInputOption::UserEntered),
        };

        self.client
            .spreadsheets()
            .values_batch_update(self.config.spreadsheet_id(), &request)
            .await
            .map_err(map_client_error)
            .context("Failed to write ranges")?;
        Ok(())
    }
}

/// Creates a sheets client carrying a fresh access token. The other constructor arguments are
/// only used by the crate's own OAuth flow, which is not used here.
async fn create_sheets_client(token_provider: &mut TokenProvider) -> Result<sheets::Client> {
    let access_token = token_provider.token_with_refresh().await?;
    Ok(sheets::Client::new(
        String::new(),
        String::new(),
        String::new(),
        access_token.to_string(),
        String::new(),
    ))
}

fn map_client_error(e: ClientError) -> anyhow::Error {
    let error_name = match &e {
        ClientError::EmptyRefreshToken => "EmptyRefreshToken".to_string(),
        ClientError::FromUtf8Error(inner) => format!("FromUtf8Error {inner}"),
        ClientError::UrlParserError(inner) => format!("UrlParserError {inner}"),
        ClientError::SerdeJsonError(inner) => format!("SerdeJsonError {inner}"),
        ClientError::ReqwestError(inner) => format!("ReqwestError {inner}"),
        ClientError::InvalidHeaderValue(inner) => format!("InvalidHeaderValue {inner}"),
        ClientError::ReqwestMiddleWareError(inner) => format!("ReqwestMiddleWareError {inner}"),
        ClientError::HttpError { .. } => "HttpError".to_string(),
        ClientError::Other(_) => "Other".to_string(),
    };
    anyhow::Error::new(e).context(error_name)
}
