use super::text::decode_text;
use super::{ExtractError, Extracted, Extractor};
use calamine::{Data, ExcelDateTime, Reader};
use chrono::NaiveTime;
use std::io::Cursor;
use tracing::debug;

/// Excel and OpenDocument spreadsheets, one section per sheet
pub struct SpreadsheetExtractor;

impl Extractor for SpreadsheetExtractor {
    fn extract(&self, _name: &str, bytes: &[u8]) -> Result<Extracted, ExtractError> {
        let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| ExtractError::malformed("spreadsheet", e))?;

        let mut sections = Vec::new();
        let sheet_names = workbook.sheet_names().to_vec();
        for sheet_name in &sheet_names {
            let range = match workbook.worksheet_range(sheet_name) {
                Ok(range) => range,
                Err(e) => {
                    debug!(sheet = %sheet_name, error = %e, "Skipping unreadable sheet");
                    continue;
                }
            };

            let mut section = format!("Sheet: {}", sheet_name);
            for row in range.rows() {
                let cells: Vec<String> = row.iter().map(cell_text).collect();
                if cells.iter().all(|c| c.is_empty()) {
                    continue;
                }
                section.push('\n');
                section.push_str(&cells.join(" | "));
            }
            sections.push(section);
        }

        Ok(Extracted::new(sections.join("\n\n")).with("sheets", sheet_names.len()))
    }

    fn name(&self) -> &'static str {
        "spreadsheet"
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => date_text(dt),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#{:?}", e),
    }
}

/// Dates as `YYYY-MM-DD` (plus the time when it is not midnight),
/// durations as `H:MM:SS`. Values chrono cannot place stay as the serial.
fn date_text(dt: &ExcelDateTime) -> String {
    if dt.is_duration() {
        if let Some(duration) = dt.as_duration() {
            let secs = duration.num_seconds();
            return format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60);
        }
    } else if let Some(datetime) = dt.as_datetime() {
        let pattern = if datetime.time() == NaiveTime::MIN {
            "%Y-%m-%d"
        } else {
            "%Y-%m-%d %H:%M:%S"
        };
        return datetime.format(pattern).to_string();
    }
    dt.as_f64().to_string()
}

/// CSV files: each row becomes a block of `header: value` lines
pub struct CsvExtractor;

impl Extractor for CsvExtractor {
    fn extract(&self, _name: &str, bytes: &[u8]) -> Result<Extracted, ExtractError> {
        let data =
            decode_text(bytes).unwrap_or_else(|| String::from_utf8_lossy(bytes).into_owned());
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(data.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| ExtractError::malformed("csv", e))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    debug!(row = index + 1, error = %e, "Skipping malformed CSV row");
                    continue;
                }
            };

            let lines: Vec<String> = record
                .iter()
                .enumerate()
                .map(|(i, value)| match headers.get(i) {
                    Some(header) if !header.is_empty() => format!("{}: {}", header, value.trim()),
                    _ => value.trim().to_string(),
                })
                .collect();
            rows.push(lines.join("\n"));
        }

        let count = rows.len();
        Ok(Extracted::new(rows.join("\n\n")).with("rows", count))
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}

#[cfg(test)]
mod sheet_tests {
    use super::*;
    use calamine::ExcelDateTimeType;

    #[test]
    fn test_csv_rows_become_blocks() {
        let csv = b"name,role\nAda,engineer\nGrace,admiral\n";
        let extracted = CsvExtractor.extract("people.csv", csv).unwrap();
        assert_eq!(
            extracted.text,
            "name: Ada\nrole: engineer\n\nname: Grace\nrole: admiral"
        );
        assert_eq!(extracted.metadata.get("rows").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_csv_ragged_rows() {
        let csv = b"a,b\n1\n2,3,4\n";
        let extracted = CsvExtractor.extract("ragged.csv", csv).unwrap();
        assert_eq!(extracted.text, "a: 1\n\na: 2\nb: 3\n4");
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_text(&Data::String("  x ".into())), "x");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    #[test]
    fn test_dates_render_as_calendar_dates() {
        let date = ExcelDateTime::new(45000.0, ExcelDateTimeType::DateTime, false);
        assert_eq!(cell_text(&Data::DateTime(date)), "2023-03-15");

        let noon = ExcelDateTime::new(45123.5, ExcelDateTimeType::DateTime, false);
        assert_eq!(cell_text(&Data::DateTime(noon)), "2023-07-16 12:00:00");

        let span = ExcelDateTime::new(1.25, ExcelDateTimeType::TimeDelta, false);
        assert_eq!(cell_text(&Data::DateTime(span)), "30:00:00");
    }

    #[test]
    fn test_spreadsheet_rejects_non_workbook() {
        let err = SpreadsheetExtractor
            .extract("table.xlsx", b"plain text")
            .unwrap_err();
        assert!(matches!(err, ExtractError::Malformed { format: "spreadsheet", .. }));
    }
}
