//! # cache — Day-Partitioned Result Cache
//!
//! One JSON file per `(symbol, partition date, data kind)`:
//!
//! ```text
//! cache/AAPL_2026-10-19_options.json
//! cache/AAPL_2026-10-19_history_2024-01-01_2024-06-30.json
//! ```
//!
//! - File exists = cache hit. Nothing else is checked.
//! - วันใหม่ = partition ใหม่ → cold cache ทุก symbol.  Old files are never
//!   touched; they pile up until purged from outside.
//! - `lookup` fails open: any I/O or decode error is a miss.
//! - `store` of an empty sequence does nothing, and a failed write is only
//!   logged.
//! - Writes go to a temp file in the same directory and are renamed into
//!   place, so a reader sees either the old file, the new one, or none.
//!   Same-key writers race; last rename wins.

use std::fs;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{DataKind, Symbol};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cache persist error: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub cache_dir: PathBuf,
    pub enabled:   bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("cache"),
            enabled:   true,
        }
    }
}

/// Source of the partition date.
#[derive(Debug, Clone, Copy)]
pub enum PartitionClock {
    /// Local calendar day.
    Local,
    #[cfg(test)]
    Fixed(NaiveDate),
}

impl PartitionClock {
    fn today(&self) -> NaiveDate {
        match self {
            PartitionClock::Local => Local::now().date_naive(),
            #[cfg(test)]
            PartitionClock::Fixed(date) => *date,
        }
    }
}

pub struct CacheStore {
    config: CacheConfig,
    clock:  PartitionClock,
}

impl CacheStore {
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, PartitionClock::Local)
    }

    pub fn with_clock(config: CacheConfig, clock: PartitionClock) -> Self {
        if config.enabled {
            if let Err(e) = fs::create_dir_all(&config.cache_dir) {
                warn!(dir = ?config.cache_dir, error = %e, "Cache directory unavailable — running uncached");
            }
        }

        Self { config, clock }
    }

    pub fn partition_date(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn cache_dir(&self) -> &Path {
        &self.config.cache_dir
    }

    fn entry_path(&self, symbol: &Symbol, kind: &DataKind, date: NaiveDate) -> PathBuf {
        self.config
            .cache_dir
            .join(format!("{}_{}_{}.json", symbol, date, kind.tag()))
    }

    /// Cached records for the current partition, or `None` on miss or any
    /// storage failure. Never touches the network.
    pub fn lookup<T: DeserializeOwned>(&self, symbol: &Symbol, kind: &DataKind) -> Option<Vec<T>> {
        if !self.config.enabled {
            return None;
        }

        let path = self.entry_path(symbol, kind, self.partition_date());
        match read_entry(&path) {
            Ok(Some(records)) => {
                info!(%symbol, kind = %kind.tag(), "📦 Loading from cache");
                Some(records)
            }
            Ok(None) => {
                debug!(%symbol, kind = %kind.tag(), "Cache miss");
                None
            }
            Err(e) => {
                warn!(%symbol, path = ?path, error = %e, "Cache read failed — treating as miss");
                None
            }
        }
    }

    /// Write `records` under the current partition. Empty input is not cached.
    pub fn store<T: Serialize>(&self, symbol: &Symbol, kind: &DataKind, records: &[T]) {
        if !self.config.enabled || records.is_empty() {
            return;
        }

        let path = self.entry_path(symbol, kind, self.partition_date());
        match write_entry(&self.config.cache_dir, &path, records) {
            Ok(()) => info!(%symbol, count = records.len(), path = ?path, "💾 Saved to cache"),
            Err(e) => warn!(%symbol, path = ?path, error = %e, "Cache write failed"),
        }
    }
}

fn read_entry<T: DeserializeOwned>(path: &Path) -> Result<Option<Vec<T>>, CacheError> {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let records = serde_json::from_reader(BufReader::new(file))?;
    Ok(Some(records))
}

fn write_entry<T: Serialize>(dir: &Path, path: &Path, records: &[T]) -> Result<(), CacheError> {
    let tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        serde_json::to_writer(&mut writer, records)?;
        writer.flush()?;
    }
    tmp.persist(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContractType, DateRange, OptionRecord, PriceBar};
    use tempfile::tempdir;

    fn sym(raw: &str) -> Symbol {
        Symbol::parse(raw).unwrap().unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn store_at(dir: &Path, date: NaiveDate) -> CacheStore {
        CacheStore::with_clock(
            CacheConfig { cache_dir: dir.to_path_buf(), enabled: true },
            PartitionClock::Fixed(date),
        )
    }

    fn record(strike: f64) -> OptionRecord {
        OptionRecord {
            symbol:             "AAPL".into(),
            contract_type:      ContractType::Call,
            strike,
            expiration:         day(30),
            implied_volatility: Some(0.2),
            last_price:         None,
            spot:               Some(230.0),
        }
    }

    #[test]
    fn test_round_trip_same_partition() {
        let dir = tempdir().unwrap();
        let cache = store_at(dir.path(), day(19));
        let records = vec![record(220.0), record(225.0)];

        cache.store(&sym("aapl"), &DataKind::Options, &records);
        let loaded: Vec<OptionRecord> = cache.lookup(&sym("AAPL"), &DataKind::Options).unwrap();

        assert_eq!(loaded, records);
        assert!(dir.path().join("AAPL_2026-10-19_options.json").exists());
    }

    #[test]
    fn test_empty_store_leaves_miss() {
        let dir = tempdir().unwrap();
        let cache = store_at(dir.path(), day(19));

        cache.store::<OptionRecord>(&sym("AAPL"), &DataKind::Options, &[]);
        let loaded: Option<Vec<OptionRecord>> = cache.lookup(&sym("AAPL"), &DataKind::Options);

        assert!(loaded.is_none());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_new_partition_is_cold_and_old_entry_survives() {
        let dir = tempdir().unwrap();
        store_at(dir.path(), day(19)).store(&sym("AAPL"), &DataKind::Options, &[record(1.0)]);

        let tomorrow = store_at(dir.path(), day(20));
        let loaded: Option<Vec<OptionRecord>> = tomorrow.lookup(&sym("AAPL"), &DataKind::Options);

        assert!(loaded.is_none());
        assert!(dir.path().join("AAPL_2026-10-19_options.json").exists());
    }

    #[test]
    fn test_history_ranges_do_not_alias() {
        let dir = tempdir().unwrap();
        let cache = store_at(dir.path(), day(19));
        let jan = DataKind::History(DateRange::parse("2024-01-01", "2024-02-01").unwrap());
        let feb = DataKind::History(DateRange::parse("2024-02-01", "2024-03-01").unwrap());
        let bars = vec![PriceBar { date: day(1), open: 1.0, high: 1.0, low: 1.0, close: 1.0 }];

        cache.store(&sym("SPY"), &jan, &bars);

        assert_eq!(cache.lookup::<PriceBar>(&sym("SPY"), &jan), Some(bars));
        assert!(cache.lookup::<PriceBar>(&sym("SPY"), &feb).is_none());
    }

    #[test]
    fn test_corrupt_entry_fails_open() {
        let dir = tempdir().unwrap();
        let cache = store_at(dir.path(), day(19));
        fs::write(dir.path().join("AAPL_2026-10-19_options.json"), b"{not json").unwrap();

        assert!(cache.lookup::<OptionRecord>(&sym("AAPL"), &DataKind::Options).is_none());
    }

    #[test]
    fn test_unusable_directory_fails_open() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"file").unwrap();
        let cache = store_at(&blocker, day(19));

        // Neither call may panic or error out.
        cache.store(&sym("AAPL"), &DataKind::Options, &[record(1.0)]);
        assert!(cache.lookup::<OptionRecord>(&sym("AAPL"), &DataKind::Options).is_none());
    }

    #[test]
    fn test_disabled_cache_never_hits() {
        let dir = tempdir().unwrap();
        let cache = CacheStore::with_clock(
            CacheConfig { cache_dir: dir.path().to_path_buf(), enabled: false },
            PartitionClock::Fixed(day(19)),
        );

        cache.store(&sym("AAPL"), &DataKind::Options, &[record(1.0)]);
        assert!(cache.lookup::<OptionRecord>(&sym("AAPL"), &DataKind::Options).is_none());
    }
}
