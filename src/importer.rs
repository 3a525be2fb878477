//! CSV upload pipeline: save the file, decode it, check the header and turn
//! each row into a [`NewMovie`]. Nothing is stored until every row parsed.

use std::{
    borrow::Cow,
    collections::HashMap,
    path::{Path, PathBuf},
};

use csv::StringRecord;
use jiff::civil::Date;
use tracing::{debug, info, warn};

use crate::{
    error::{AppError, AppResult},
    models::NewMovie,
    store::MovieStore,
};

pub const REQUIRED_COLUMNS: [&str; 15] = [
    "title",
    "original_title",
    "overview",
    "release_date",
    "budget",
    "revenue",
    "runtime",
    "vote_average",
    "vote_count",
    "status",
    "homepage",
    "original_language",
    "production_company_id",
    "genre_id",
    "languages",
];

/// Cell values read as "no value", in addition to blank cells.
const NULL_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Invalid date format for {title}")]
    InvalidDate { title: String },

    #[error("invalid number {value:?} in column {column} on line {line}")]
    InvalidNumber { column: &'static str, value: String, line: u64 },

    #[error("invalid language list {value:?} on line {line}")]
    InvalidLanguages { value: String, line: u64 },

    #[error("missing title on line {line}")]
    MissingTitle { line: u64 },

    #[error("failed to read CSV header: {0}")]
    Header(#[source] csv::Error),
}

impl ImportError {
    /// Errors caused by the uploaded content that the client can fix.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ImportError::MissingColumns(_) | ImportError::InvalidDate { .. })
    }
}

pub fn is_csv_file_name(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".csv")
}

/// Reduces an uploaded file name to a safe single path component made of
/// ASCII letters, digits, `_`, `.` and `-`.
pub fn sanitize_file_name(name: &str) -> String {
    let spaced: String =
        name.chars().map(|c| if c == '/' || c == '\\' { ' ' } else { c }).collect();
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_');

    if cleaned.is_empty() { "upload.csv".to_string() } else { cleaned.to_string() }
}

/// Decodes as UTF-8, falling back to Latin-1 which accepts any byte sequence.
pub fn decode_text(data: &[u8]) -> Cow<'_, str> {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    match std::str::from_utf8(data) {
        Ok(text) => Cow::Borrowed(text),
        Err(err) => {
            debug!(error = %err, "upload is not UTF-8, decoding as Latin-1");
            Cow::Owned(data.iter().copied().map(char::from).collect())
        },
    }
}

/// Parses a list literal such as `['en', 'fr']` into its items. Brackets and
/// quotes around items are optional. Returns `None` when the literal is
/// malformed.
pub fn parse_language_list(raw: &str) -> Option<Vec<String>> {
    let raw = raw.trim();
    let inner = match (raw.strip_prefix('['), raw.strip_suffix(']')) {
        (Some(rest), Some(_)) => &rest[..rest.len() - 1],
        (None, None) => raw,
        _ => return None,
    };

    let mut items = Vec::new();
    for item in inner.split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let unquoted = match item.chars().next() {
            Some(q @ ('\'' | '"')) => {
                item.strip_prefix(q).and_then(|s| s.strip_suffix(q)).filter(|s| !s.is_empty())?
            },
            _ => item,
        };
        if unquoted.contains(['\'', '"', '[', ']']) {
            return None;
        }
        items.push(unquoted.to_string());
    }

    Some(items)
}

/// Parses decoded CSV text into movies, in file order.
///
/// Lines the CSV reader cannot parse and lines with more fields than the
/// header are skipped. Short lines are padded with absent values.
pub fn parse_movies(text: &str) -> Result<Vec<NewMovie>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers().map_err(ImportError::Header)?.clone();
    let columns = resolve_columns(&headers)?;

    let mut movies = Vec::new();
    let mut skipped = 0usize;

    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(err) => {
                warn!(error = %err, "skipping malformed CSV line");
                skipped += 1;
                continue;
            },
        };

        let line = record.position().map(|p| p.line()).unwrap_or_default();
        if record.len() > headers.len() {
            warn!(
                line,
                fields = record.len(),
                expected = headers.len(),
                "skipping CSV line with extra fields"
            );
            skipped += 1;
            continue;
        }

        let row = Row { record: &record, columns: &columns, line };
        movies.push(row.to_movie()?);
    }

    debug!(rows = movies.len(), skipped, "parsed CSV");
    Ok(movies)
}

fn resolve_columns(headers: &StringRecord) -> Result<HashMap<&'static str, usize>, ImportError> {
    let mut columns = HashMap::with_capacity(REQUIRED_COLUMNS.len());
    let mut missing = Vec::new();

    for name in REQUIRED_COLUMNS {
        match headers.iter().position(|h| h == name) {
            Some(idx) => {
                columns.insert(name, idx);
            },
            None => missing.push(name.to_string()),
        }
    }

    if missing.is_empty() { Ok(columns) } else { Err(ImportError::MissingColumns(missing)) }
}

struct Row<'a> {
    record: &'a StringRecord,
    columns: &'a HashMap<&'static str, usize>,
    line: u64,
}

impl<'a> Row<'a> {
    fn raw(&self, name: &str) -> Option<&'a str> {
        self.columns.get(name).and_then(|&idx| self.record.get(idx))
    }

    fn cell(&self, name: &str) -> Option<&'a str> {
        self.raw(name).filter(|v| !v.trim().is_empty() && !NULL_MARKERS.contains(v))
    }

    fn text(&self, name: &str) -> Option<String> {
        self.cell(name).map(str::to_string)
    }

    fn integer<T: TryFrom<i64>>(&self, column: &'static str) -> Result<Option<T>, ImportError> {
        let Some(raw) = self.cell(column) else {
            return Ok(None);
        };
        parse_integer(raw.trim())
            .and_then(|v| T::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| ImportError::InvalidNumber {
                column,
                value: raw.to_string(),
                line: self.line,
            })
    }

    fn float(&self, column: &'static str) -> Result<Option<f64>, ImportError> {
        let Some(raw) = self.cell(column) else {
            return Ok(None);
        };
        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(ImportError::InvalidNumber {
                column,
                value: raw.to_string(),
                line: self.line,
            }),
        }
    }

    fn to_movie(&self) -> Result<NewMovie, ImportError> {
        let release_date = match self.cell("release_date") {
            None => None,
            Some(raw) => Some(Date::strptime(DATE_FORMAT, raw.trim()).map_err(|_| {
                let title = self.raw("title").unwrap_or_default().to_string();
                ImportError::InvalidDate { title }
            })?),
        };

        let title = self.text("title").ok_or(ImportError::MissingTitle { line: self.line })?;

        let languages = match self.cell("languages") {
            None => None,
            Some(raw) => Some(parse_language_list(raw).ok_or_else(|| {
                ImportError::InvalidLanguages { value: raw.to_string(), line: self.line }
            })?),
        };

        Ok(NewMovie {
            title,
            original_title: self.text("original_title"),
            overview: self.text("overview"),
            release_date,
            budget: self.integer("budget")?,
            revenue: self.integer("revenue")?,
            runtime: self.integer("runtime")?,
            vote_average: self.float("vote_average")?,
            vote_count: self.integer("vote_count")?,
            status: self.text("status"),
            homepage: self.text("homepage"),
            original_language: self.text("original_language"),
            production_company_id: self.integer("production_company_id")?,
            genre_id: self.integer("genre_id")?,
            languages,
        })
    }
}

/// Integer columns exported from spreadsheets often read `120.0`; those are
/// truncated toward zero.
fn parse_integer(s: &str) -> Option<i64> {
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    let f: f64 = s.parse().ok()?;
    (f.is_finite() && f.abs() < i64::MAX as f64).then(|| f.trunc() as i64)
}

async fn save_upload(upload_dir: &Path, file_name: &str, data: &[u8]) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(upload_dir).await?;
    let path = upload_dir.join(sanitize_file_name(file_name));
    tokio::fs::write(&path, data).await?;
    Ok(path)
}

/// Saves the upload, parses it and stores every row in one commit.
pub async fn import_upload(
    store: &MovieStore,
    upload_dir: &Path,
    file_name: &str,
    data: &[u8],
) -> AppResult<usize> {
    let path = save_upload(upload_dir, file_name, data)
        .await
        .map_err(|e| AppError::Processing(anyhow::Error::new(e).context("failed to save upload")))?;
    debug!(path = %path.display(), bytes = data.len(), "saved upload");

    let text = decode_text(data);
    let movies = parse_movies(&text)?;

    let stored = store.insert_batch(movies).await.map_err(|e| AppError::Processing(e.into()))?;
    info!(file = %path.display(), rows = stored, "imported movies");

    Ok(stored)
}
