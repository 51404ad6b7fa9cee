// ── Query result parsing ──
//
// Flux queries answer with RFC 4180 CSV. Each result table starts with its
// own header row and tables are separated by an empty line. Annotation rows
// (leading `#`) are skipped.

use std::collections::HashMap;

use crate::error::Error;

/// One result row keyed by column name.
pub type Row = HashMap<String, String>;

/// Parse a Flux CSV response body into rows.
pub fn parse(body: &str) -> Result<Vec<Row>, Error> {
    let mut rows = Vec::new();
    let mut header: Option<Vec<String>> = None;

    for record in records(body)? {
        if record.iter().all(String::is_empty) {
            header = None;
            continue;
        }
        if record.first().is_some_and(|f| f.starts_with('#')) {
            continue;
        }
        let Some(columns) = &header else {
            header = Some(record);
            continue;
        };
        if record.len() != columns.len() {
            return Err(Error::Csv(format!(
                "row has {} columns, header has {}",
                record.len(),
                columns.len()
            )));
        }
        let row = columns
            .iter()
            .zip(record)
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, value)| (name.clone(), value))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

/// Split a CSV body into records, honouring quoted fields with embedded
/// delimiters, doubled quotes, and line breaks.
fn records(body: &str) -> Result<Vec<Vec<String>>, Error> {
    let mut out = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if quoted {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => quoted = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => quoted = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                out.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if quoted {
        return Err(Error::Csv("unterminated quoted field".into()));
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        out.push(record);
    }
    Ok(out)
}
