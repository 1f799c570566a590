//! In-memory tick source.
//!
//! Series are kept sorted by timestamp with one tick per timestamp, so every
//! lookup is a binary search.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info};

use super::{EntryPricePolicy, Tick, TickSource, TickSourceError};
use crate::domain::ContractId;

/// Errors loading tick data.
#[derive(Debug, Error)]
pub enum TickLoadError {
    /// IO error reading the tick file.
    #[error("IO error reading '{path}': {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Malformed JSON, unknown contract code or bad tick.
    #[error("Failed to parse tick data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tick series held in memory, keyed by contract.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTickSource {
    series: HashMap<ContractId, Vec<Tick>>,
}

impl InMemoryTickSource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add ticks for a contract, merging with any already loaded.
    ///
    /// A later tick at an existing timestamp replaces the earlier one.
    pub fn add_ticks(&mut self, contract: ContractId, ticks: impl IntoIterator<Item = Tick>) {
        let series = self.series.entry(contract).or_default();
        series.extend(ticks);
        // Stable sort keeps insertion order for equal timestamps
        series.sort_by_key(|t| t.at);

        let mut merged: Vec<Tick> = Vec::with_capacity(series.len());
        for tick in series.drain(..) {
            match merged.last_mut() {
                Some(last) if last.at == tick.at => *last = tick,
                _ => merged.push(tick),
            }
        }
        *series = merged;
    }

    /// Builder-style `add_ticks`.
    #[must_use]
    pub fn with_ticks(
        mut self,
        contract: ContractId,
        ticks: impl IntoIterator<Item = (NaiveDateTime, Decimal)>,
    ) -> Self {
        self.add_ticks(
            contract,
            ticks.into_iter().map(|(at, price)| Tick::new(at, price)),
        );
        self
    }

    /// Load from JSON: `{ "<contract code>": [["<timestamp>", "<price>"], ...] }`.
    pub fn from_json_reader(reader: impl Read) -> Result<Self, TickLoadError> {
        let raw: HashMap<ContractId, Vec<(NaiveDateTime, Decimal)>> =
            serde_json::from_reader(reader)?;

        let mut source = Self::new();
        for (contract, ticks) in raw {
            debug!(contract = %contract, ticks = ticks.len(), "Loaded tick series");
            source.add_ticks(
                contract,
                ticks.into_iter().map(|(at, price)| Tick::new(at, price)),
            );
        }
        Ok(source)
    }

    /// Load from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, TickLoadError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| TickLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let source = Self::from_json_reader(std::io::BufReader::new(file))?;

        info!(
            path = %path.display(),
            contracts = source.series.len(),
            ticks = source.tick_count(),
            "Tick data loaded"
        );
        Ok(source)
    }

    /// Get the series for a contract.
    #[must_use]
    pub fn series(&self, contract: &ContractId) -> Option<&[Tick]> {
        self.series.get(contract).map(Vec::as_slice)
    }

    /// Total ticks across all contracts.
    #[must_use]
    pub fn tick_count(&self) -> usize {
        self.series.values().map(Vec::len).sum()
    }

    fn lookup(&self, contract: &ContractId) -> Result<&[Tick], TickSourceError> {
        self.series(contract).ok_or_else(|| TickSourceError::NoData {
            contract: contract.clone(),
        })
    }
}

impl TickSource for InMemoryTickSource {
    fn entry_tick(
        &self,
        contract: &ContractId,
        at: NaiveDateTime,
        policy: EntryPricePolicy,
    ) -> Result<Tick, TickSourceError> {
        let series = self.lookup(contract)?;
        let found = match policy {
            EntryPricePolicy::AtOrBefore => {
                let idx = series.partition_point(|t| t.at <= at);
                idx.checked_sub(1).and_then(|i| series.get(i))
            }
            EntryPricePolicy::AtOrAfter => {
                let idx = series.partition_point(|t| t.at < at);
                series.get(idx)
            }
        };

        found.copied().ok_or_else(|| TickSourceError::NoEntryTick {
            contract: contract.clone(),
            at,
            policy,
        })
    }

    fn next_tick_after(&self, contract: &ContractId, after: NaiveDateTime) -> Option<Tick> {
        let series = self.series.get(contract)?;
        let idx = series.partition_point(|t| t.at <= after);
        series.get(idx).copied()
    }

    fn name(&self) -> &str {
        "InMemory"
    }
}
