//! CSV parsing into [`AddressRecord`]s.
//!
//! The first non-empty line is the header. Each line is split on the
//! delimiter on its own, so quote characters never span lines or escape
//! the delimiter. Every field is trimmed and stripped of surrounding
//! quote characters; rows shorter than the header read missing columns
//! as `""`. Rows without both a `City` and a `State` are dropped
//! silently.

use std::collections::BTreeMap;

use locator_ingest_models::AddressRecord;
use thiserror::Error;

/// Errors that make a CSV unusable as a whole.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The input has no non-empty lines.
    #[error("Empty CSV")]
    Empty,

    /// No row passed the city/state admission check.
    #[error("No valid data found in CSV")]
    NoValidRecords,

    /// The header row could not be read.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Parses comma-delimited text.
///
/// # Errors
///
/// Returns [`ParseError`] if the input is empty or no row is admitted.
pub fn parse_records(text: &str) -> Result<Vec<AddressRecord>, ParseError> {
    parse_records_with_delimiter(text, b',')
}

/// Parses text using `delimiter` as the field separator.
///
/// # Errors
///
/// Returns [`ParseError`] if the input is empty, the header cannot be
/// read, or no row is admitted.
pub fn parse_records_with_delimiter(
    text: &str,
    delimiter: u8,
) -> Result<Vec<AddressRecord>, ParseError> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return Err(ParseError::Empty);
    }
    let body = lines.join("\n");

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .quoting(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(clean_field).collect();

    let mut records = Vec::new();
    let mut dropped = 0u64;

    for (i, result) in reader.records().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                log::debug!("Skipping unreadable CSV row {}: {e}", i + 2);
                dropped += 1;
                continue;
            }
        };

        let fields: BTreeMap<String, String> = headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                (
                    header.clone(),
                    row.get(idx).map(clean_field).unwrap_or_default(),
                )
            })
            .collect();

        let record = AddressRecord::new(fields);
        if record.is_admissible() {
            records.push(record);
        } else {
            dropped += 1;
        }
    }

    log::info!(
        "Parsed {} records from CSV ({dropped} rows dropped)",
        records.len()
    );

    if records.is_empty() {
        return Err(ParseError::NoValidRecords);
    }

    Ok(records)
}

fn clean_field(raw: &str) -> String {
    raw.trim().trim_matches('"').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "ID,Program Type,Address,Address 2,City,State,Zip,Region";

    #[test]
    fn parses_rows_keyed_by_header() {
        let csv =
            format!("{HEADER}\n1,After School,100 Main St,Suite 4,Richmond,VA,23219,Central\n");
        let records = parse_records(&csv).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.id(), "1");
        assert_eq!(r.get("Program Type"), "After School");
        assert_eq!(r.address(), "100 Main St");
        assert_eq!(r.address2(), "Suite 4");
        assert_eq!(r.city(), "Richmond");
        assert_eq!(r.state(), "VA");
        assert_eq!(r.region(), "Central");
    }

    #[test]
    fn trims_whitespace_and_quotes() {
        let csv = "\"ID\", \"Address\" ,City,State\n \"7\" ,  \"1 Elm St\" , Albany ,\" NY \"\n";
        let records = parse_records(csv).unwrap();
        let r = &records[0];
        assert_eq!(r.id(), "7");
        assert_eq!(r.address(), "1 Elm St");
        assert_eq!(r.city(), "Albany");
        assert_eq!(r.state(), "NY");
    }

    #[test]
    fn missing_trailing_values_are_empty() {
        let csv = format!("{HEADER}\n2,Mentoring,5 Oak Ave,,Austin,TX\n");
        let records = parse_records(&csv).unwrap();
        assert_eq!(records[0].get("Zip"), "");
        assert_eq!(records[0].region(), "");
    }

    #[test]
    fn drops_rows_without_city_or_state() {
        let csv = format!(
            "{HEADER}\n\
             1,A,1 Main St,,Richmond,VA,,\n\
             2,B,2 Main St,,,VA,,\n\
             3,C,3 Main St,,Richmond,,,\n\
             4,D,4 Main St,,  ,  ,,\n\
             5,E\n\
             6,F,,,Denver,CO,,\n"
        );
        let records = parse_records(&csv).unwrap();
        let ids: Vec<&str> = records.iter().map(AddressRecord::id).collect();
        assert_eq!(ids, ["1", "6"]);
    }

    #[test]
    fn skips_blank_lines() {
        let csv = format!("\n\n{HEADER}\r\n\r\n1,A,1 Main St,,Richmond,VA,,\r\n   \n");
        assert_eq!(parse_records(&csv).unwrap().len(), 1);
    }

    #[test]
    fn empty_input_is_fatal() {
        assert!(matches!(parse_records(""), Err(ParseError::Empty)));
        assert!(matches!(parse_records("  \n\t\n"), Err(ParseError::Empty)));
        assert_eq!(parse_records("").unwrap_err().to_string(), "Empty CSV");
    }

    #[test]
    fn header_only_is_fatal() {
        assert!(matches!(
            parse_records(HEADER),
            Err(ParseError::NoValidRecords)
        ));
    }

    #[test]
    fn no_admitted_rows_is_fatal() {
        let csv = format!("{HEADER}\n1,A,1 Main St,,,,,\n");
        assert!(matches!(
            parse_records(&csv),
            Err(ParseError::NoValidRecords)
        ));
    }

    #[test]
    fn honours_custom_delimiter() {
        let csv = "ID;Address;City;State\n9;1 Pine Rd;Salem;OR\n";
        let records = parse_records_with_delimiter(csv, b';').unwrap();
        assert_eq!(records[0].city(), "Salem");
        assert_eq!(records[0].state(), "OR");
    }

    #[test]
    fn stray_quote_does_not_swallow_later_rows() {
        let csv = "ID,Address,City,State\n\
                   1,\"Bob's Place,Richmond,VA\n\
                   2,5 Oak Ave,Albany,NY\n\
                   3,7 Elm St,Austin,TX\n";
        let records = parse_records(csv).unwrap();
        let ids: Vec<&str> = records.iter().map(AddressRecord::id).collect();
        assert_eq!(ids, ["1", "2", "3"]);
        assert_eq!(records[0].address(), "Bob's Place");
        assert_eq!(records[0].city(), "Richmond");
    }

    #[test]
    fn quoted_delimiter_splits_the_field() {
        let csv = "ID,Address,City,State\n3,\"12 Main St, Unit 5\",Tampa,FL\n";
        let records = parse_records(csv).unwrap();
        assert_eq!(records[0].address(), "12 Main St");
        assert_eq!(records[0].city(), "Unit 5");
        assert_eq!(records[0].state(), "Tampa");
    }
}
