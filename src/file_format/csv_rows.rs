use std::borrow::Cow;
use std::path::Path;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1251};
use tracing::{debug, info, warn};

use crate::config::CsvHeaders;
use crate::errors::{ConvertError, Result};
use crate::hierarchy::Record;

/// Candidate encodings, in the order they are attempted.  Exports produced by
/// the asset management system are either UTF-8 (usually with a BOM) or
/// cp1251.
pub const ENCODINGS: &[&str] = &["utf-8-sig", "utf-8", "cp1251", "windows-1251"];

/// The delimiter is sniffed from this many leading characters.
const SNIFF_CHARS: usize = 1024;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// The one cp1251 byte without a character assigned.  WHATWG windows-1251
/// maps it to U+0098 anyway, so it is rejected by hand.
const CP1251_UNDEFINED: u8 = 0x98;

/// Strictly decode `bytes` with the named encoding; `None` on any malformed
/// sequence.
fn decode_strict<'a>(bytes: &'a [u8], label: &str) -> Option<Cow<'a, str>> {
    match label {
        "utf-8-sig" => UTF_8.decode_without_bom_handling_and_without_replacement(
            bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes),
        ),
        other => {
            let encoding = Encoding::for_label(other.as_bytes())?;
            if encoding == WINDOWS_1251 && bytes.contains(&CP1251_UNDEFINED) {
                return None;
            }
            encoding.decode_without_bom_handling_and_without_replacement(bytes)
        }
    }
}

pub fn sniff_delimiter(text: &str) -> u8 {
    let sample: String = text.chars().take(SNIFF_CHARS).collect();
    if sample.contains(';') {
        b';'
    } else if sample.contains('\t') {
        b'\t'
    } else {
        b','
    }
}

struct Columns {
    path: usize,
    uid: Option<usize>,
    inventory_code: Option<usize>,
}

fn locate_columns(header_row: &csv::StringRecord, headers: &CsvHeaders) -> Option<Columns> {
    let position = |name: &str| header_row.iter().position(|h| h.trim() == name);

    let path = position(&headers.path)?;
    let uid = position(&headers.uid);
    if uid.is_none() {
        warn!(column = %headers.uid, "uid column missing; every row is treated as having no uid");
    }
    let inventory_code = match &headers.inventory_code {
        Some(name) => {
            let found = position(name);
            if found.is_none() {
                warn!(column = %name, "inventory code column missing; no codes will be emitted");
            }
            found
        }
        None => None,
    };

    Some(Columns {
        path,
        uid,
        inventory_code,
    })
}

/// Parse decoded text.  `Ok(None)` means the header row lacks the path column.
fn parse_text(text: &str, headers: &CsvHeaders) -> Result<Option<Vec<Record>>> {
    let delimiter = sniff_delimiter(text);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .has_headers(true)
        .from_reader(text.as_bytes());

    let header_row = reader.headers()?.clone();
    let columns = match locate_columns(&header_row, headers) {
        Some(columns) => columns,
        None => return Ok(None),
    };
    debug!(delimiter = %(delimiter as char).escape_default(), "parsing rows");

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result?;
        let path = row.get(columns.path).unwrap_or("").trim();
        if path.is_empty() {
            continue;
        }
        let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i));
        records.push(Record::new(
            path,
            cell(columns.uid),
            cell(columns.inventory_code),
        ));
    }
    Ok(Some(records))
}

/// Decode and parse an export.  Encodings are tried in `ENCODINGS` order and the
/// first one that decodes cleanly and yields a header row with the path column
/// wins.
pub fn decode_records(bytes: &[u8], headers: &CsvHeaders, source: &Path) -> Result<Vec<Record>> {
    let mut decoded_any = false;

    for label in ENCODINGS {
        let text = match decode_strict(bytes, label) {
            Some(text) => text,
            None => {
                debug!(encoding = label, "not decodable");
                continue;
            }
        };
        decoded_any = true;

        match parse_text(&text, headers)? {
            Some(records) => {
                info!(
                    file = %source.display(),
                    encoding = label,
                    rows = records.len(),
                    "read export"
                );
                return Ok(records);
            }
            None => {
                debug!(encoding = label, column = %headers.path, "decoded but no path column");
            }
        }
    }

    if decoded_any {
        Err(ConvertError::MalformedInput(format!(
            "{} has no '{}' column",
            source.display(),
            headers.path
        )))
    } else {
        Err(ConvertError::Encoding {
            path: source.to_path_buf(),
            tried: ENCODINGS.iter().map(|e| e.to_string()).collect(),
        })
    }
}

pub fn read_records(path: &Path, headers: &CsvHeaders) -> Result<Vec<Record>> {
    let bytes = std::fs::read(path).map_err(|err| ConvertError::io(path, err))?;
    decode_records(&bytes, headers, path)
}
