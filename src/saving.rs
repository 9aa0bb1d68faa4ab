use crate::error::SurveyError;
use crate::submission::{CSV_HEADER, RequestRow};
use csv::{ReaderBuilder, WriterBuilder};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Name of the file collecting one day's requests, `request_YYYYMMDD.csv`
pub fn request_file_name(req_date: &str) -> String {
    format!("request_{}.csv", req_date)
}

/// Append a request to its day's CSV file
///
/// The file is created on first use with a UTF-8 BOM (so spreadsheet tools
/// pick the right encoding) and the header line. Later calls only append.
/// Returns the path written to.
pub fn append_request(dir: impl AsRef<Path>, row: &RequestRow) -> Result<PathBuf, SurveyError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let path = dir.join(request_file_name(&row.req_date));

    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    let is_new = file.metadata()?.len() == 0;
    if is_new {
        file.write_all(UTF8_BOM)?;
    }

    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
    if is_new {
        writer.write_record(CSV_HEADER)?;
    }
    writer.write_record(row.fields().iter().map(|(_, value)| *value))?;
    writer.flush()?;

    Ok(path)
}

/// Read back every request stored in a daily file
pub fn load_requests(path: impl AsRef<Path>) -> Result<Vec<RequestRow>, SurveyError> {
    let bytes = fs::read(path)?;
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes);

    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(body);
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}
