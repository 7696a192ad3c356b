//! Tab-separated report files.
//!
//! One header row, then one row per item in input order. The file carries no
//! aggregate row; totals go to the summary instead.

use crate::batch::{ScrapeResult, ScrapeSummary};
use crate::error::ScrapeError;
use crate::market::models::PriceQuote;
use crate::market::normalize;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Header row of every report.
pub const REPORT_HEADER: &str = "Source Name\tScraped Name\tPrice (PHP)";

/// Philippine Standard Time has no DST.
const PHT_OFFSET_SECS: i32 = 8 * 3600;

/// Same-minute reports get `_2`, `_3`, ... up to this many names.
const MAX_NAME_ATTEMPTS: usize = 100;

/// Receives rows while a batch runs. Owned exclusively by one batch.
pub trait ReportSink: Send {
    /// Called once before the first row.
    fn begin(&mut self) -> io::Result<()>;

    /// Called once per item, in input order.
    fn record(&mut self, result: &ScrapeResult) -> io::Result<()>;

    /// Called once after the last row.
    fn finish(&mut self, summary: &ScrapeSummary) -> io::Result<()>;
}

/// Writes results as TSV to any writer.
pub struct TsvReport<W: Write> {
    writer: W,
    rows: usize,
}

impl<W: Write> TsvReport<W> {
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self { writer, rows: 0 }
    }

    /// Rows written so far (header excluded).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl TsvReport<BufWriter<File>> {
    /// Creates a timestamped report file in `dir`, returning its path.
    ///
    /// Never reuses an existing file: a report from the same minute gets a
    /// numbered name instead of being truncated.
    pub fn create(dir: impl AsRef<Path>) -> io::Result<(Self, PathBuf)> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let name = report_file_name(Utc::now());
        for attempt in 1..=MAX_NAME_ATTEMPTS {
            let path = dir.join(numbered(&name, attempt));

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    debug!("Creating report file: {}", path.display());
                    return Ok((Self::new(BufWriter::new(file)), path));
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    debug!("Report {} already exists", path.display());
                }
                Err(e) => return Err(e),
            }
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("too many reports named {} in {}", name, dir.display()),
        ))
    }
}

/// `name.txt` for the first attempt, `name_N.txt` after that.
fn numbered(name: &str, attempt: usize) -> String {
    if attempt == 1 {
        return name.to_string();
    }
    match name.strip_suffix(".txt") {
        Some(stem) => format!("{}_{}.txt", stem, attempt),
        None => format!("{}_{}", name, attempt),
    }
}

impl<W: Write + Send> ReportSink for TsvReport<W> {
    fn begin(&mut self) -> io::Result<()> {
        writeln!(self.writer, "{}", REPORT_HEADER)
    }

    fn record(&mut self, result: &ScrapeResult) -> io::Result<()> {
        writeln!(
            self.writer,
            "{}\t{}\t{}",
            sanitize(&result.raw_name),
            sanitize(result.normalized_name.as_str()),
            sanitize(&result.quote.raw_text)
        )?;
        self.rows += 1;
        Ok(())
    }

    fn finish(&mut self, summary: &ScrapeSummary) -> io::Result<()> {
        info!("Report complete: {} of {} rows written", self.rows, summary.total_items);
        self.writer.flush()
    }
}

/// Tabs and newlines inside a cell would break the row layout.
fn sanitize(cell: &str) -> String {
    cell.replace(['\t', '\r', '\n'], " ")
}

/// `Price_Checker_Dota2_YYYY-MM-DD_HH-MM.txt`, stamped in Philippine time.
pub fn report_file_name(now: DateTime<Utc>) -> String {
    let pht = FixedOffset::east_opt(PHT_OFFSET_SECS).unwrap_or(Utc.fix());
    let local = now.with_timezone(&pht);
    format!("Price_Checker_Dota2_{}.txt", local.format("%Y-%m-%d_%H-%M"))
}

/// Reads a report back into results.
pub fn read_report(path: impl AsRef<Path>) -> Result<Vec<ScrapeResult>, ScrapeError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ScrapeError::Report {
        line: 0,
        message: format!("cannot open {}: {}", path.display(), e),
    })?;

    parse_report(BufReader::new(file))
}

/// Parses report rows from any reader. The header row is required.
pub fn parse_report(reader: impl BufRead) -> Result<Vec<ScrapeResult>, ScrapeError> {
    let mut results = Vec::new();
    let mut lines = reader.lines().enumerate();

    match lines.next() {
        Some((_, Ok(header))) if header.trim_end() == REPORT_HEADER => {}
        Some((_, Ok(other))) => {
            return Err(ScrapeError::Report {
                line: 1,
                message: format!("unexpected header: {}", other),
            })
        }
        Some((_, Err(e))) => return Err(ScrapeError::Report { line: 1, message: e.to_string() }),
        None => return Err(ScrapeError::Report { line: 1, message: "empty report".to_string() }),
    }

    for (idx, line) in lines {
        let line_no = idx + 1;
        let line = line.map_err(|e| ScrapeError::Report { line: line_no, message: e.to_string() })?;
        let line = line.trim_end_matches('\r');

        if line.trim().is_empty() {
            continue;
        }

        let mut cells = line.splitn(3, '\t');
        let (Some(raw), Some(scraped), Some(price)) = (cells.next(), cells.next(), cells.next())
        else {
            return Err(ScrapeError::Report {
                line: line_no,
                message: "expected 3 tab-separated columns".to_string(),
            });
        };

        // Re-normalizing the stored name keeps rows from older reports canonical
        results.push(ScrapeResult {
            raw_name: raw.to_string(),
            normalized_name: normalize(scraped),
            quote: PriceQuote::from_report_text(price),
        });
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::QuoteStatus;
    use chrono::TimeZone;
    use std::io::Cursor;

    fn make_result(name: &str, quote: PriceQuote) -> ScrapeResult {
        ScrapeResult { raw_name: name.to_string(), normalized_name: normalize(name), quote }
    }

    fn write_report(results: &[ScrapeResult]) -> String {
        let mut report = TsvReport::new(Vec::new());
        report.begin().unwrap();
        for result in results {
            report.record(result).unwrap();
        }
        report.finish(&ScrapeSummary::from_results(results)).unwrap();
        assert_eq!(report.rows(), results.len());
        String::from_utf8(report.into_inner()).unwrap()
    }

    #[test]
    fn test_header_and_rows() {
        let output = write_report(&[
            make_result("Malefic Drake’s Hood", PriceQuote::success("₱1,234.50")),
            make_result("Profane Union", PriceQuote::no_listing()),
            make_result("Shatterblast Core", PriceQuote::fetch_error()),
        ]);

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Source Name\tScraped Name\tPrice (PHP)");
        assert_eq!(lines[1], "Malefic Drake’s Hood\tMalefic Drake's Hood\t₱1,234.50");
        assert_eq!(lines[2], "Profane Union\tProfane Union\tNo price listed");
        assert_eq!(lines[3], "Shatterblast Core\tShatterblast Core\tError fetching price");
    }

    #[test]
    fn test_rows_keep_input_order() {
        let output = write_report(&[
            make_result("B", PriceQuote::success("₱2.00")),
            make_result("A", PriceQuote::success("₱1.00")),
        ]);

        let names: Vec<&str> =
            output.lines().skip(1).map(|l| l.split('\t').next().unwrap()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn test_no_aggregate_row() {
        let output = write_report(&[make_result("Widget", PriceQuote::success("₱5.00"))]);
        assert!(!output.contains("Total"));
        assert_eq!(output.lines().count(), 2);
    }

    #[test]
    fn test_sanitize_cells() {
        let output = write_report(&[make_result("Odd\tName", PriceQuote::success("₱5.00"))]);
        let row = output.lines().nth(1).unwrap();
        assert_eq!(row.split('\t').count(), 3);
    }

    #[test]
    fn test_report_file_name_uses_philippine_time() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 18, 5, 0).unwrap();
        assert_eq!(report_file_name(now), "Price_Checker_Dota2_2024-03-10_02-05.txt");
    }

    #[test]
    fn test_numbered_names() {
        let name = "Price_Checker_Dota2_2024-03-10_02-05.txt";
        assert_eq!(numbered(name, 1), name);
        assert_eq!(numbered(name, 2), "Price_Checker_Dota2_2024-03-10_02-05_2.txt");
    }

    #[test]
    fn test_create_never_truncates_existing_report() {
        let dir = tempfile::tempdir().unwrap();

        let (mut first, first_path) = TsvReport::create(dir.path()).unwrap();
        first.begin().unwrap();
        first.record(&make_result("Widget A", PriceQuote::success("₱10.00"))).unwrap();
        first.finish(&ScrapeSummary::new()).unwrap();
        drop(first);
        let before = std::fs::read_to_string(&first_path).unwrap();

        let (mut second, second_path) = TsvReport::create(dir.path()).unwrap();
        second.begin().unwrap();
        second.finish(&ScrapeSummary::new()).unwrap();

        assert_ne!(first_path, second_path);
        assert_eq!(std::fs::read_to_string(&first_path).unwrap(), before);
        assert!(before.contains("Widget A\tWidget A\t₱10.00"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_create_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let (mut report, path) = TsvReport::create(dir.path().join("nested")).unwrap();

        report.begin().unwrap();
        report.record(&make_result("Widget", PriceQuote::success("₱5.00"))).unwrap();
        report.finish(&ScrapeSummary::new()).unwrap();

        assert!(path.starts_with(dir.path()));
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(REPORT_HEADER));
        assert!(content.contains("Widget\tWidget\t₱5.00"));
    }

    #[test]
    fn test_parse_report_roundtrip_statuses() {
        let output = write_report(&[
            make_result("Widget A", PriceQuote::success("₱10.00")),
            make_result("Widget B", PriceQuote::no_listing()),
            make_result("Widget C", PriceQuote::fetch_error()),
        ]);

        let results = parse_report(Cursor::new(output)).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].quote.status, QuoteStatus::Success);
        assert_eq!(results[0].quote.numeric_value, 10.0);
        assert_eq!(results[1].quote.status, QuoteStatus::NoListing);
        assert_eq!(results[2].quote.status, QuoteStatus::FetchError);

        let summary = ScrapeSummary::from_results(&results);
        assert_eq!(summary.success_count, 1);
        assert_eq!(summary.fail_count, 2);
    }

    #[test]
    fn test_parse_report_bad_header() {
        let err = parse_report(Cursor::new("Name\tPrice\n")).unwrap_err();
        assert!(matches!(err, ScrapeError::Report { line: 1, .. }));
    }

    #[test]
    fn test_parse_report_empty() {
        let err = parse_report(Cursor::new("")).unwrap_err();
        assert!(err.to_string().contains("empty report"));
    }

    #[test]
    fn test_parse_report_short_row() {
        let input = format!("{}\nWidget\t₱5.00\n", REPORT_HEADER);
        let err = parse_report(Cursor::new(input)).unwrap_err();
        assert!(matches!(err, ScrapeError::Report { line: 2, .. }));
    }

    #[test]
    fn test_parse_report_skips_blank_lines() {
        let input = format!("{}\r\nWidget\tWidget\t₱5.00\r\n\r\n", REPORT_HEADER);
        let results = parse_report(Cursor::new(input)).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].quote.raw_text, "₱5.00");
    }

    #[test]
    fn test_read_report_missing_file() {
        let err = read_report("/nonexistent/report.txt").unwrap_err();
        assert!(err.to_string().contains("cannot open"));
    }
}
