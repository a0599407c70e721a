//! JSON vector sweeps for offline verification.
//!
//! A sweep file describes one array (generation, seed, bank configs, entry
//! programming) plus a list of search keys. Running it produces one record
//! per (key, logical table) pair so two model builds, or the model and an
//! independent reference, can be diffed line by line.

use crate::array::{ArrayConfig, TcamArray};
use crate::bank::BankConfig;
use crate::caps::ENTRIES_PER_BANK;
use crate::entry::TcamEntry;
use crate::error::ModelError;
use crate::hitvec::HitVector;
use crate::placement::PlacementOverrides;
use mau_types::{ChipGeneration, Gress, LogicalTableId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Errors surfaced by the sweep harness.
#[derive(Debug, Error)]
pub enum SweepError {
    /// Vector or report file could not be read or written.
    #[error("sweep file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Vector file is not valid JSON or violates the schema.
    #[error("malformed sweep file: {0}")]
    Format(#[from] serde_json::Error),

    /// The described array is invalid.
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// 64-bit words in vector files are hex strings ("0xdead_beef"); decimal
/// strings are accepted too.
mod hex_word {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{:#x}", value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let trimmed = raw.trim().replace('_', "");
        let (digits, radix) = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
            Some(hex) => (hex, 16),
            None => (trimmed.as_str(), 10),
        };
        u64::from_str_radix(digits, radix)
            .map_err(|e| de::Error::custom(format!("invalid word {:?}: {}", raw, e)))
    }
}

fn default_boundary() -> bool {
    true
}

/// One programmed entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryVector {
    pub index: usize,
    #[serde(with = "hex_word")]
    pub value: u64,
    #[serde(with = "hex_word")]
    pub mask: u64,
    #[serde(default)]
    pub action: bool,
    #[serde(default = "default_boundary")]
    pub boundary: bool,
}

/// One configured bank with its entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankVector {
    pub col: usize,
    pub row: usize,
    #[serde(default)]
    pub config: BankConfig,
    #[serde(default)]
    pub entries: Vec<EntryVector>,
    /// Entry indexes removed from the bank's hits-mask.
    #[serde(default)]
    pub masked: Vec<usize>,
}

/// One search key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyVector {
    #[serde(with = "hex_word")]
    pub key: u64,
    #[serde(default)]
    pub gress: Gress,
}

/// A complete sweep description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepFile {
    pub generation: ChipGeneration,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub match_addr_shift: u32,
    #[serde(default)]
    pub strict_placement: bool,
    #[serde(default)]
    pub overrides: PlacementOverrides,
    #[serde(default)]
    pub banks: Vec<BankVector>,
    #[serde(default)]
    pub keys: Vec<KeyVector>,
}

/// One (key, logical table) outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepRecord {
    #[serde(with = "hex_word")]
    pub key: u64,
    pub gress: Gress,
    pub table: LogicalTableId,
    pub hit: bool,
    pub address: u32,
    pub action: bool,
    pub priority: i32,
}

impl fmt::Display for SweepRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hit {
            write!(
                f,
                "key {:#x} {} table {}: hit addr={:#x} action={} rank={}",
                self.key, self.gress, self.table, self.address, self.action as u8, self.priority
            )
        } else {
            write!(f, "key {:#x} {} table {}: miss", self.key, self.gress, self.table)
        }
    }
}

/// The full result of one sweep run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub generation: ChipGeneration,
    pub keys: usize,
    pub hits: usize,
    pub records: Vec<SweepRecord>,
}

/// Loads a vector file.
pub fn load_file(path: &Path) -> Result<SweepFile, SweepError> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Builds and installs the array a vector file describes.
pub fn build_array(sweep: &SweepFile) -> Result<TcamArray, SweepError> {
    let config = ArrayConfig::new(sweep.generation)
        .with_seed(sweep.seed)
        .with_match_addr_shift(sweep.match_addr_shift)
        .with_strict_placement(sweep.strict_placement)
        .with_overrides(sweep.overrides);
    let mut array = TcamArray::new(config)?;
    let key_mask = array.caps().key_mask();

    for bank in &sweep.banks {
        array.configure(bank.col, bank.row, bank.config)?;
        for entry in &bank.entries {
            if entry.value & !key_mask != 0 {
                return Err(ModelError::field_range("value", entry.value, key_mask).into());
            }
            if entry.mask & !key_mask != 0 {
                return Err(ModelError::field_range("mask", entry.mask, key_mask).into());
            }
            let image = TcamEntry::from_value_mask(entry.value, entry.mask)
                .with_action(entry.action)
                .with_boundary(entry.boundary);
            array.write_entry(bank.col, bank.row, entry.index, image)?;
        }
        if !bank.masked.is_empty() {
            let mut mask = HitVector::ones();
            for &index in &bank.masked {
                if index >= ENTRIES_PER_BANK {
                    return Err(ModelError::geometry(format!(
                        "masked entry index {} out of range",
                        index
                    ))
                    .into());
                }
                mask.clear_bit(index);
            }
            array.set_hits_mask(bank.col, bank.row, mask)?;
        }
    }

    array.install()?;
    Ok(array)
}

/// Runs every key of a vector file and collects the per-table records.
pub fn run(sweep: &SweepFile) -> Result<SweepReport, SweepError> {
    let mut array = build_array(sweep)?;
    let mut records = Vec::with_capacity(sweep.keys.len() * LogicalTableId::COUNT);
    let mut hits = 0usize;

    for vector in &sweep.keys {
        let outcome = array.lookup(vector.key, vector.gress)?;
        for (table, result) in outcome.iter() {
            if result.hit {
                hits += 1;
            }
            records.push(SweepRecord {
                key: vector.key,
                gress: vector.gress,
                table,
                hit: result.hit,
                address: result.address,
                action: result.action,
                priority: result.priority,
            });
        }
    }

    info!(
        "sweep complete: {} generation, {} keys, {} hit record(s)",
        sweep.generation,
        sweep.keys.len(),
        hits
    );
    Ok(SweepReport {
        generation: sweep.generation,
        keys: sweep.keys.len(),
        hits,
        records,
    })
}

/// Writes a report as pretty JSON for diffing.
pub fn write_report(report: &SweepReport, path: &Path) -> Result<(), SweepError> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, report)?;
    Ok(())
}
