//! Terminal client backed by the terminal's "Export Bars" files.
//!
//! Each export is a tab-separated file named `<SYMBOL>_<LABEL>.csv`, e.g.
//! `EURUSD_H1.csv`, with a header row such as
//!
//! ```text
//! <DATE>	<TIME>	<OPEN>	<HIGH>	<LOW>	<CLOSE>	<TICKVOL>	<VOL>	<SPREAD>
//! 2024.01.02	04:00:00	1.09380	1.09420	1.09350	1.09400	1210	0	7
//! ```
//!
//! Daily and coarser exports omit the `<TIME>` column.

use super::{TerminalClient, TerminalError, TerminalRate, TerminalTimeframe};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct ExportDirClient {
    root: PathBuf,
    initialized: bool,
}

impl ExportDirClient {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            initialized: false,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `None` when `symbol` could escape the export directory.
    fn export_path(&self, symbol: &str, label: &str) -> Option<PathBuf> {
        if symbol.contains(['/', '\\']) || symbol.contains("..") {
            return None;
        }
        Some(self.root.join(format!("{}_{}.csv", symbol, label)))
    }
}

struct Columns {
    date: usize,
    time: Option<usize>,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    tick_volume: Option<usize>,
    real_volume: Option<usize>,
    spread: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, TerminalError> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| {
                TerminalError::new(TerminalError::FAIL, format!("export is missing {name} column"))
            })
        };
        Ok(Self {
            date: require("<DATE>")?,
            time: find("<TIME>"),
            open: require("<OPEN>")?,
            high: require("<HIGH>")?,
            low: require("<LOW>")?,
            close: require("<CLOSE>")?,
            tick_volume: find("<TICKVOL>"),
            real_volume: find("<VOL>"),
            spread: find("<SPREAD>"),
        })
    }
}

fn field<'r>(
    record: &'r csv::StringRecord,
    idx: usize,
    name: &str,
) -> Result<&'r str, TerminalError> {
    record.get(idx).ok_or_else(|| {
        TerminalError::new(TerminalError::FAIL, format!("row is missing {name} value"))
    })
}

fn parse_num<T: std::str::FromStr>(
    record: &csv::StringRecord,
    idx: usize,
    name: &str,
) -> Result<T, TerminalError>
where
    T::Err: std::fmt::Display,
{
    field(record, idx, name)?.parse().map_err(|e: T::Err| {
        TerminalError::new(TerminalError::FAIL, format!("invalid {name} value: {e}"))
    })
}

fn parse_opt<T: std::str::FromStr + Default>(
    record: &csv::StringRecord,
    idx: Option<usize>,
    name: &str,
) -> Result<T, TerminalError>
where
    T::Err: std::fmt::Display,
{
    match idx {
        Some(i) => parse_num(record, i, name),
        None => Ok(T::default()),
    }
}

fn parse_time(record: &csv::StringRecord, cols: &Columns) -> Result<DateTime<Utc>, TerminalError> {
    let date_str = field(record, cols.date, "<DATE>")?;
    let date = NaiveDate::parse_from_str(date_str, "%Y.%m.%d").map_err(|e| {
        TerminalError::new(TerminalError::FAIL, format!("invalid date format: {e}"))
    })?;
    let time = match cols.time {
        Some(idx) => {
            let time_str = field(record, idx, "<TIME>")?;
            NaiveTime::parse_from_str(time_str, "%H:%M:%S")
                .or_else(|_| NaiveTime::parse_from_str(time_str, "%H:%M"))
                .map_err(|e| {
                    TerminalError::new(TerminalError::FAIL, format!("invalid time format: {e}"))
                })?
        }
        None => NaiveTime::MIN,
    };
    Ok(date.and_time(time).and_utc())
}

impl TerminalClient for ExportDirClient {
    fn initialize(&mut self) -> Result<(), TerminalError> {
        if !self.root.is_dir() {
            return Err(TerminalError::new(
                TerminalError::NOT_FOUND,
                format!("export directory {} not found", self.root.display()),
            ));
        }
        self.initialized = true;
        Ok(())
    }

    fn copy_rates_range(
        &self,
        symbol: &str,
        timeframe: TerminalTimeframe,
        time_from: DateTime<Utc>,
        time_to: DateTime<Utc>,
    ) -> Result<Vec<TerminalRate>, TerminalError> {
        if !self.initialized {
            return Err(TerminalError::new(
                TerminalError::INTERNAL_FAIL_INIT,
                "terminal not initialized",
            ));
        }
        let label = timeframe.label().ok_or_else(|| {
            TerminalError::new(
                TerminalError::INVALID_PARAMS,
                format!("unknown timeframe {}", timeframe.0),
            )
        })?;

        let Some(path) = self.export_path(symbol, label) else {
            debug!(symbol, "symbol is not a plain file name, no export");
            return Ok(Vec::new());
        };
        if !path.is_file() {
            debug!(path = %path.display(), "no export for symbol");
            return Ok(Vec::new());
        }

        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|e| {
                TerminalError::new(
                    TerminalError::FAIL,
                    format!("failed to read {}: {}", path.display(), e),
                )
            })?;

        let headers = rdr.headers().map_err(|e| {
            TerminalError::new(TerminalError::FAIL, format!("export header error: {e}"))
        })?;
        let cols = Columns::from_headers(headers)?;

        let mut rates = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| {
                TerminalError::new(TerminalError::FAIL, format!("export parse error: {e}"))
            })?;

            let time = parse_time(&record, &cols)?;
            if time < time_from || time > time_to {
                continue;
            }

            rates.push(TerminalRate {
                time: time.timestamp(),
                open: parse_num(&record, cols.open, "<OPEN>")?,
                high: parse_num(&record, cols.high, "<HIGH>")?,
                low: parse_num(&record, cols.low, "<LOW>")?,
                close: parse_num(&record, cols.close, "<CLOSE>")?,
                tick_volume: parse_opt(&record, cols.tick_volume, "<TICKVOL>")?,
                spread: parse_opt(&record, cols.spread, "<SPREAD>")?,
                real_volume: parse_opt(&record, cols.real_volume, "<VOL>")?,
            });
        }

        rates.sort_by_key(|r| r.time);
        Ok(rates)
    }

    fn shutdown(&mut self) {
        self.initialized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    const H1_EXPORT: &str = "<DATE>\t<TIME>\t<OPEN>\t<HIGH>\t<LOW>\t<CLOSE>\t<TICKVOL>\t<VOL>\t<SPREAD>\n\
        2024.01.02\t05:00:00\t1.09400\t1.09510\t1.09390\t1.09500\t1500\t0\t6\n\
        2024.01.02\t04:00:00\t1.09380\t1.09420\t1.09350\t1.09400\t1210\t0\t7\n\
        2024.01.03\t00:00:00\t1.09200\t1.09300\t1.09100\t1.09250\t900\t0\t8\n";

    const D1_EXPORT: &str = "<DATE>\t<OPEN>\t<HIGH>\t<LOW>\t<CLOSE>\t<TICKVOL>\t<VOL>\t<SPREAD>\n\
        2024.01.02\t1.10000\t1.10500\t1.09000\t1.09400\t65000\t0\t5\n";

    fn setup() -> (TempDir, ExportDirClient) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("EURUSD_H1.csv"), H1_EXPORT).unwrap();
        fs::write(dir.path().join("EURUSD_D1.csv"), D1_EXPORT).unwrap();
        let client = ExportDirClient::new(dir.path().to_path_buf());
        (dir, client)
    }

    fn utc(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, h, 0, 0).unwrap()
    }

    #[test]
    fn initialize_fails_for_missing_directory() {
        let mut client = ExportDirClient::new(PathBuf::from("/nonexistent/terminal/export"));
        let err = client.initialize().unwrap_err();
        assert_eq!(err.code, TerminalError::NOT_FOUND);
    }

    #[test]
    fn copy_requires_initialize() {
        let (_dir, client) = setup();
        let err = client
            .copy_rates_range("EURUSD", TerminalTimeframe::H1, utc(1, 0), utc(4, 0))
            .unwrap_err();
        assert_eq!(err.code, TerminalError::INTERNAL_FAIL_INIT);
    }

    #[test]
    fn reads_sorted_rates_in_range() {
        let (_dir, mut client) = setup();
        client.initialize().unwrap();

        let rates = client
            .copy_rates_range("EURUSD", TerminalTimeframe::H1, utc(1, 0), utc(4, 0))
            .unwrap();

        assert_eq!(rates.len(), 3);
        assert_eq!(rates[0].time, utc(2, 4).timestamp());
        assert_eq!(rates[0].open, 1.09380);
        assert_eq!(rates[0].close, 1.09400);
        assert_eq!(rates[0].tick_volume, 1210);
        assert_eq!(rates[0].spread, 7);
        assert_eq!(rates[2].time, utc(3, 0).timestamp());
    }

    #[test]
    fn range_is_inclusive_on_both_ends() {
        let (_dir, mut client) = setup();
        client.initialize().unwrap();

        let rates = client
            .copy_rates_range("EURUSD", TerminalTimeframe::H1, utc(2, 4), utc(2, 5))
            .unwrap();
        assert_eq!(rates.len(), 2);
    }

    #[test]
    fn daily_export_without_time_column() {
        let (_dir, mut client) = setup();
        client.initialize().unwrap();

        let rates = client
            .copy_rates_range("EURUSD", TerminalTimeframe::D1, utc(1, 0), utc(31, 0))
            .unwrap();
        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].time, utc(2, 0).timestamp());
        assert_eq!(rates[0].tick_volume, 65000);
    }

    #[test]
    fn missing_export_yields_no_rates() {
        let (_dir, mut client) = setup();
        client.initialize().unwrap();

        let rates = client
            .copy_rates_range("GBPUSD", TerminalTimeframe::H1, utc(1, 0), utc(31, 0))
            .unwrap();
        assert!(rates.is_empty());
    }

    #[test]
    fn symbol_cannot_leave_export_directory() {
        let outer = TempDir::new().unwrap();
        let root = outer.path().join("export");
        fs::create_dir(&root).unwrap();
        fs::write(outer.path().join("SECRET_D1.csv"), D1_EXPORT).unwrap();
        let mut client = ExportDirClient::new(root);
        client.initialize().unwrap();

        for symbol in ["../SECRET", "..\\SECRET", "sub/EURUSD", "..SECRET"] {
            let rates = client
                .copy_rates_range(symbol, TerminalTimeframe::D1, utc(1, 0), utc(31, 0))
                .unwrap();
            assert!(rates.is_empty(), "{symbol} read outside the export directory");
        }
    }

    #[test]
    fn malformed_row_is_an_error() {
        let (dir, mut client) = setup();
        fs::write(
            dir.path().join("USDJPY_H1.csv"),
            "<DATE>\t<TIME>\t<OPEN>\t<HIGH>\t<LOW>\t<CLOSE>\n2024.01.02\t04:00\tabc\t1\t1\t1\n",
        )
        .unwrap();
        client.initialize().unwrap();

        let err = client
            .copy_rates_range("USDJPY", TerminalTimeframe::H1, utc(1, 0), utc(31, 0))
            .unwrap_err();
        assert!(err.description.contains("<OPEN>"));
    }

    #[test]
    fn shutdown_detaches() {
        let (_dir, mut client) = setup();
        client.initialize().unwrap();
        client.shutdown();
        assert!(client
            .copy_rates_range("EURUSD", TerminalTimeframe::H1, utc(1, 0), utc(31, 0))
            .is_err());
    }
}
