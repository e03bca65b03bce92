//! Upstream row sources: hosted spreadsheet CSV exports and local CSV files.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};

use fleettally_shared::{FleetError, RawRow, Result, SourceSpec};

/// User-Agent string for export requests.
const USER_AGENT: &str = concat!("fleettally/", env!("CARGO_PKG_VERSION"));

/// Retrieves the raw rows of one source.
///
/// Implementations signal rate limiting with [`FleetError::Throttled`] and
/// every other failure with [`FleetError::SourceUnavailable`] or
/// [`FleetError::Parse`].
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn fetch(&self, spec: &SourceSpec) -> Result<Vec<RawRow>>;
}

fn sheet_id(spec: &SourceSpec) -> Result<&str> {
    spec.sheet_id
        .as_deref()
        .ok_or_else(|| FleetError::unavailable(&spec.region, "no sheet id configured"))
}

/// Parse a CSV document into rows keyed by its (trimmed) header line.
///
/// Ragged rows are accepted; rows whose cells are all blank are skipped.
pub fn parse_csv(source_id: &str, body: &str) -> Result<Vec<RawRow>> {
    let body = body.trim_start_matches('\u{feff}');
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| FleetError::parse(format!("{source_id}: {e}")))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| FleetError::parse(format!("{source_id}: {e}")))?;
        let row = RawRow::new(
            headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.clone(), v.to_string()))
                .collect(),
        );
        if !row.is_blank() {
            rows.push(row);
        }
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// SheetCsvSource
// ---------------------------------------------------------------------------

/// Reads the CSV export of a hosted spreadsheet over HTTP.
pub struct SheetCsvSource {
    client: Client,
    url_template: String,
}

impl SheetCsvSource {
    /// `url_template` must contain a `{sheet_id}` placeholder.
    pub fn new(url_template: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(timeout)
            .build()
            .map_err(|e| FleetError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url_template: url_template.into(),
        })
    }

    fn url_for(&self, sheet_id: &str) -> String {
        self.url_template.replace("{sheet_id}", sheet_id)
    }
}

#[async_trait]
impl RowSource for SheetCsvSource {
    #[instrument(skip_all, fields(source = %spec.region))]
    async fn fetch(&self, spec: &SourceSpec) -> Result<Vec<RawRow>> {
        let url = self.url_for(sheet_id(spec)?);
        debug!("requesting export");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FleetError::unavailable(&spec.region, e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FleetError::throttled(&spec.region));
        }
        if !status.is_success() {
            return Err(FleetError::unavailable(&spec.region, format!("HTTP {status}")));
        }

        // A sheet that is not shared answers with a sign-in page.
        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("text/html"));
        if is_html {
            return Err(FleetError::unavailable(
                &spec.region,
                "export returned HTML, is the sheet shared?",
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FleetError::unavailable(&spec.region, format!("body read failed: {e}")))?;

        let rows = parse_csv(&spec.region, &body)?;
        debug!(rows = rows.len(), bytes = body.len(), "export parsed");
        Ok(rows)
    }
}

// ---------------------------------------------------------------------------
// CsvDirSource
// ---------------------------------------------------------------------------

/// Reads `<dir>/<sheet_id>.csv` from the local filesystem.
pub struct CsvDirSource {
    dir: PathBuf,
}

impl CsvDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl RowSource for CsvDirSource {
    #[instrument(skip_all, fields(source = %spec.region))]
    async fn fetch(&self, spec: &SourceSpec) -> Result<Vec<RawRow>> {
        let path = self.dir.join(format!("{}.csv", sheet_id(spec)?));
        let body = tokio::fs::read_to_string(&path).await.map_err(|e| {
            FleetError::unavailable(&spec.region, format!("{}: {e}", path.display()))
        })?;
        parse_csv(&spec.region, &body)
    }
}
