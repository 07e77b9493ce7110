//! Writing query results to disk.
//!
//! - [`persist_stream`] saves a [`ByteStream`] as-is.
//! - [`decompress_gzip_file`] inflates a downloaded `.gz` next to itself.
//! - [`flatten_records`] turns nested JSON records into a flat table with
//!   dotted column names, which [`write_csv`] and [`write_csv_columns`] use.
//! - [`write_json`] writes the records as a pretty JSON array.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use serde_json::{Map, Value};

use crate::error::{Error, ErrorKind, Result};
use crate::stream::ByteStream;

/// Column used for records that are not JSON objects.
pub const SCALAR_COLUMN: &str = "value";

/// Records flattened into named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatTable {
    /// Column names in first-seen order.
    pub columns: Vec<String>,
    /// One map per record; absent columns are empty cells.
    pub rows: Vec<HashMap<String, String>>,
}

impl FlatTable {
    /// Cell value, empty when the record lacks the column.
    pub fn cell(&self, row: usize, column: &str) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Write a stream to `path`. Returns the number of bytes written.
pub async fn persist_stream(stream: ByteStream, path: impl AsRef<Path>) -> Result<u64> {
    stream.write_to(path).await
}

/// Decompress a gzip file into a sibling file.
///
/// `list-vuln.csv.gz` is written to `list-vuln.csv`; a file without a `.gz`
/// suffix gets `.out` appended instead. Returns the output path.
pub fn decompress_gzip_file(src: impl AsRef<Path>) -> Result<PathBuf> {
    let src = src.as_ref();
    let dest = decompressed_path(src);

    let input = File::open(src)?;
    let mut decoder = MultiGzDecoder::new(BufReader::new(input));
    let mut output = BufWriter::new(File::create(&dest)?);

    let copied = std::io::copy(&mut decoder, &mut output)
        .map_err(|e| decompress_error(src, e))
        .and_then(|written| output.flush().map(|()| written).map_err(Error::from));
    drop(output);
    let written = match copied {
        Ok(written) => written,
        Err(e) => {
            let _ = std::fs::remove_file(&dest);
            return Err(e);
        }
    };

    tracing::info!(
        src = %src.display(),
        dest = %dest.display(),
        bytes = written,
        "decompressed gzip file"
    );
    Ok(dest)
}

fn decompress_error(src: &Path, err: std::io::Error) -> Error {
    use std::io::ErrorKind as IoKind;
    match err.kind() {
        IoKind::InvalidInput | IoKind::InvalidData | IoKind::UnexpectedEof => {
            let message = format!("{}: {err}", src.display());
            Error::with_source(ErrorKind::Decompress(message), err)
        }
        _ => Error::from(err),
    }
}

fn decompressed_path(src: &Path) -> PathBuf {
    match src.extension() {
        Some(ext) if ext.eq_ignore_ascii_case("gz") => src.with_extension(""),
        _ => {
            let mut name = src.as_os_str().to_os_string();
            name.push(".out");
            PathBuf::from(name)
        }
    }
}

/// Flatten records into dotted columns.
///
/// Nested objects become `parent.child` columns; arrays are kept as compact
/// JSON text; `null` becomes an empty cell. Columns appear in the order they
/// are first seen across all records.
pub fn flatten_records(records: &[Value]) -> FlatTable {
    let mut columns = Vec::new();
    let mut seen = HashSet::new();
    let mut rows = Vec::with_capacity(records.len());

    for record in records {
        let mut row = Vec::new();
        match record {
            Value::Object(map) => flatten_object("", map, &mut row),
            other => row.push((SCALAR_COLUMN.to_string(), cell_text(other))),
        }
        for (column, _) in &row {
            if seen.insert(column.clone()) {
                columns.push(column.clone());
            }
        }
        rows.push(row.into_iter().collect());
    }

    FlatTable { columns, rows }
}

fn flatten_object(prefix: &str, map: &Map<String, Value>, out: &mut Vec<(String, String)>) {
    for (key, value) in map {
        let column = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(inner) => flatten_object(&column, inner, out),
            other => out.push((column, cell_text(other))),
        }
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Write all flattened columns as CSV. Returns the number of rows written.
pub fn write_csv(path: impl AsRef<Path>, records: &[Value]) -> Result<usize> {
    let table = flatten_records(records);
    write_table(path.as_ref(), &table, &table.columns)
}

/// Write only the given columns, in the given order.
///
/// Records lacking a column get an empty cell. Returns the number of rows
/// written.
pub fn write_csv_columns<S: AsRef<str>>(
    path: impl AsRef<Path>,
    records: &[Value],
    columns: &[S],
) -> Result<usize> {
    let table = flatten_records(records);
    let columns: Vec<String> = columns.iter().map(|c| c.as_ref().to_string()).collect();
    write_table(path.as_ref(), &table, &columns)
}

fn write_table(path: &Path, table: &FlatTable, columns: &[String]) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(columns)?;
    for row in 0..table.rows.len() {
        writer.write_record(columns.iter().map(|c| table.cell(row, c)))?;
    }
    writer.flush()?;

    tracing::info!(path = %path.display(), rows = table.rows.len(), "wrote CSV");
    Ok(table.rows.len())
}

/// Write records as a pretty-printed JSON array.
pub fn write_json(path: impl AsRef<Path>, records: &[Value]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush()?;

    tracing::info!(path = %path.display(), records = records.len(), "wrote JSON");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use serde_json::json;

    #[test]
    fn test_flatten_dotted_columns_first_seen_order() {
        let records = vec![
            json!({"hostname": "h1", "systemInfo": {"kernelVersion": "5.10", "distro": "debian"}}),
            json!({"hostname": "h2", "tags": ["a", "b"], "systemInfo": {"kernelVersion": "6.1"}}),
        ];
        let table = flatten_records(&records);
        assert_eq!(
            table.columns,
            vec![
                "hostname",
                "systemInfo.kernelVersion",
                "systemInfo.distro",
                "tags"
            ]
        );
        assert_eq!(table.cell(0, "systemInfo.kernelVersion"), "5.10");
        assert_eq!(table.cell(1, "tags"), "[\"a\",\"b\"]");
        assert_eq!(table.cell(1, "systemInfo.distro"), "");
    }

    #[test]
    fn test_flatten_null_and_scalars() {
        let table = flatten_records(&[json!({"a": null, "b": 3, "c": true}), json!("plain")]);
        assert_eq!(table.cell(0, "a"), "");
        assert_eq!(table.cell(0, "b"), "3");
        assert_eq!(table.cell(0, "c"), "true");
        assert_eq!(table.cell(1, SCALAR_COLUMN), "plain");
    }

    #[test]
    fn test_write_csv_columns_projection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filtered_hostname_kernel.csv");
        let records = vec![
            json!({"hostname": "h1", "connected": true, "systemInfo": {"kernelVersion": "5.10"}}),
            json!({"hostname": "h2"}),
        ];

        let rows = write_csv_columns(&path, &records, &["hostname", "systemInfo.kernelVersion"])
            .unwrap();
        assert_eq!(rows, 2);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "hostname,systemInfo.kernelVersion\nh1,5.10\nh2,\n"
        );
    }

    #[test]
    fn test_write_csv_quotes_embedded_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_csv(&path, &[json!({"id": 1, "labels": ["x", "y"]})]).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, vec!["id", "labels"]);
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[1], "[\"x\",\"y\"]");
    }

    #[test]
    fn test_write_json_pretty_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let records = vec![json!({"id": 1}), json!({"id": 2})];
        write_json(&path, &records).unwrap();

        let parsed: Vec<Value> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, records);
    }

    #[test]
    fn test_decompress_gzip_file_strips_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("list-vuln.csv.gz");
        let original = b"cve,severity\nCVE-2024-0001,critical\n";

        let mut encoder = GzEncoder::new(File::create(&src).unwrap(), Compression::default());
        encoder.write_all(original).unwrap();
        encoder.finish().unwrap();

        let dest = decompress_gzip_file(&src).unwrap();
        assert_eq!(dest, dir.path().join("list-vuln.csv"));
        assert_eq!(std::fs::read(&dest).unwrap(), original);
    }

    #[test]
    fn test_decompress_gzip_file_reads_every_member() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("list-vuln.csv.gz");

        let mut body = Vec::new();
        for part in [&b"cve,severity\n"[..], &b"CVE-1,critical\n"[..]] {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(part).unwrap();
            body.extend(encoder.finish().unwrap());
        }
        std::fs::write(&src, &body).unwrap();

        let dest = decompress_gzip_file(&src).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"cve,severity\nCVE-1,critical\n");
    }

    #[test]
    fn test_decompress_truncated_trailer_removes_output() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("list-vuln.csv.gz");

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&[b'x'; 4096]).unwrap();
        let body = encoder.finish().unwrap();
        std::fs::write(&src, &body[..body.len() - 4]).unwrap();

        let err = decompress_gzip_file(&src).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Decompress(_)), "{err}");
        assert!(!dir.path().join("list-vuln.csv").exists());
    }

    #[test]
    fn test_decompress_gzip_file_without_gz_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("download.bin");
        let mut encoder = GzEncoder::new(File::create(&src).unwrap(), Compression::fast());
        encoder.write_all(b"data").unwrap();
        encoder.finish().unwrap();

        let dest = decompress_gzip_file(&src).unwrap();
        assert_eq!(dest, dir.path().join("download.bin.out"));
        assert_eq!(std::fs::read(&dest).unwrap(), b"data");
    }

    #[test]
    fn test_decompress_rejects_plain_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("not-gzip.csv.gz");
        std::fs::write(&src, b"this is not gzip").unwrap();

        let err = decompress_gzip_file(&src).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Decompress(_)), "{err}");
    }

    #[test]
    fn test_decompress_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = decompress_gzip_file(dir.path().join("missing.gz")).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Io(_)));
    }
}
