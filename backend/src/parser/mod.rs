//! CSV reading and writing for LMS exports.
//!
//! Exports arrive as raw bytes in whatever encoding the LMS (or a spreadsheet
//! round-trip) produced. Reading detects the encoding, decodes, skips banner
//! rows and hands back a plain header + records table. No SLO logic here.

use std::path::Path;

use crate::error::{CsvError, CsvResult};

/// A decoded export: trimmed headers and raw string records.
#[derive(Debug, Clone)]
pub struct RawTable {
    /// Column headers, whitespace stripped.
    pub headers: Vec<String>,
    /// Data records, cells untouched.
    pub rows: Vec<Vec<String>>,
    /// Detected or used encoding.
    pub encoding: String,
}

impl RawTable {
    /// Index of the first header equal to `name`.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Names from `required` that are not headers of this table.
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| self.column(name).is_none())
            .map(|name| name.to_string())
            .collect()
    }

    /// Cell at (`row`, `col`), empty for short records.
    pub fn cell<'a>(&self, row: &'a [String], col: usize) -> &'a str {
        row.get(col).map(String::as_str).unwrap_or("")
    }
}

/// Detect the encoding of raw bytes.
///
/// Valid UTF-8 is taken as such; anything else goes through chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let charset = chardet::detect(bytes).0;
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "utf-8-sig" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        "" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes using the given encoding label. Leading BOM is removed.
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8_lossy(bytes).into_owned(),
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        label => {
            let codec = encoding_rs::Encoding::for_label(label.as_bytes())
                .ok_or_else(|| CsvError::Encoding(label.to_string()))?;
            let (text, _, had_errors) = codec.decode(bytes);
            if had_errors {
                String::from_utf8_lossy(bytes).into_owned()
            } else {
                text.into_owned()
            }
        }
    };

    Ok(decoded.trim_start_matches('\u{feff}').to_string())
}

/// Read CSV bytes with auto-detected encoding.
///
/// The first `skip_rows` non-blank records are banner rows and are discarded;
/// the next record is the header. Records made only of empty cells are skipped.
pub fn read_table(bytes: &[u8], skip_rows: usize) -> CsvResult<RawTable> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    read_str(&content, skip_rows, encoding)
}

/// Read an already decoded CSV string.
pub fn read_str(content: &str, skip_rows: usize, encoding: String) -> CsvResult<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| CsvError::Parse {
            line: e.position().map(|p| p.line() as usize).unwrap_or(0),
            message: e.to_string(),
        })?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        records.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    if records.is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let mut records = records.into_iter().skip(skip_rows);
    let headers: Vec<String> = records
        .next()
        .ok_or(CsvError::NoHeaders(skip_rows))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    Ok(RawTable {
        headers,
        rows: records.collect(),
        encoding,
    })
}

/// Read a CSV file from disk.
pub fn read_table_file<P: AsRef<Path>>(path: P, skip_rows: usize) -> CsvResult<RawTable> {
    let bytes = std::fs::read(path.as_ref())?;
    read_table(&bytes, skip_rows)
}

/// Serialize a header and records as UTF-8 CSV bytes.
pub fn write_table<I>(headers: &[String], records: I) -> CsvResult<Vec<u8>>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());

    writer.write_record(headers).map_err(|e| CsvError::Parse {
        line: 1,
        message: e.to_string(),
    })?;
    for (idx, record) in records.into_iter().enumerate() {
        writer.write_record(&record).map_err(|e| CsvError::Parse {
            line: idx + 2,
            message: e.to_string(),
        })?;
    }

    writer
        .into_inner()
        .map_err(|e| CsvError::Io(e.into_error()))
}
