// CSV input for the report pipeline

use crate::error::DataSourceError;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Raw CSV contents: one header row plus string cells.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Read CSV data from a file path
pub fn read_csv_from_path(path: impl AsRef<Path>) -> Result<CsvData, DataSourceError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| DataSourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let data = read_csv(file)?;
    debug!(
        path = %path.display(),
        columns = data.headers.len(),
        rows = data.rows.len(),
        "loaded CSV"
    );
    Ok(data)
}

/// Read CSV data from any reader.
///
/// A header row is required. Data rows may be absent, but every row present
/// must have exactly as many fields as the header.
pub fn read_csv<R: Read>(reader: R) -> Result<CsvData, DataSourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(DataSourceError::Empty);
    }

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != headers.len() {
            return Err(DataSourceError::Ragged {
                row: idx + 1,
                expected: headers.len(),
                found: record.len(),
            });
        }
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }

    Ok(CsvData { headers, rows })
}
