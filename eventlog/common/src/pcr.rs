/*
 * Copyright (c) Huawei Technologies Co., Ltd. 2025. All rights reserved.
 * Global Trust Authority is licensed under the Mulan PSL v2.
 * You can use this software according to the terms and conditions of the Mulan PSL v2.
 * You may obtain a copy of Mulan PSL v2 at:
 *     http://license.coscl.org.cn/MulanPSL2
 * THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY KIND, EITHER EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR
 * PURPOSE.
 * See the Mulan PSL v2 for more details.
 */

//! PCR replay engine
//!
//! Reconstructs PCR values by simulating the TPM extend operation
//! `PCR_new = H(PCR_old || event_digest)` over the events of a log, one bank per algorithm.
//!
//! # Examples
//! ```
//! use eventlog_common::algorithm::{Digest, DigestAlgorithm};
//! use eventlog_common::model::{Event, EventLog, EventType, LogFormat};
//! use eventlog_common::pcr::replay;
//!
//! let mut log = EventLog::new(LogFormat::LegacyTcg);
//! log.algorithms.insert(DigestAlgorithm::Sha1);
//! let digest = Digest::new(DigestAlgorithm::Sha1, vec![0xaa; 20]).unwrap();
//! log.events.push(Event::new(0, EventType::PcClient(0x0d), vec![digest], Vec::new()));
//!
//! let bank = replay(&log, DigestAlgorithm::Sha1, None).unwrap();
//! assert_eq!(bank.get(0, DigestAlgorithm::Sha1).unwrap().len(), 20);
//! ```

use std::collections::BTreeMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::algorithm::{hash_parts, Digest, DigestAlgorithm};
use crate::error::{DecodeError, ReplayError};
use crate::model::{Event, EventLog, EventType, HandleKind};

/// Signature carried by the StartupLocality EV_NO_ACTION event
pub const STARTUP_LOCALITY_SIGNATURE: &[u8; 16] = b"StartupLocality\0";

/// PCRs reset to all 0xFF on platform reset (dynamic root of trust range)
const DRTM_PCR_RANGE: std::ops::RangeInclusive<u32> = 17..=22;

/// Behaviour when an event lacks a digest for the replayed algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayPolicy {
    /// Skip the event
    #[default]
    Lenient,
    /// Fail when the log declares the algorithm but the event omits it
    Strict,
}

/// Reset values used for PCRs without a caller supplied initial value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetMode {
    /// Every PCR starts at all zero bytes
    #[default]
    Zero,
    /// PC Client platform reset: PCRs 17-22 start at all 0xFF and PCR 0 carries the
    /// startup locality in its last byte
    Platform,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ReplayOptions {
    pub policy: ReplayPolicy,
    pub reset_mode: ResetMode,
}

/// Mapping from (PCR index, algorithm) to the current register value
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PcrBank {
    values: BTreeMap<(u32, DigestAlgorithm), Vec<u8>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PcrValueEntry {
    pub pcr_index: u32,
    pub pcr_value: String,
}

/// JSON exchange shape of one bank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PcrValues {
    pub hash_alg: String,
    pub pcr_values: Vec<PcrValueEntry>,
}

impl PcrBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw register value; lengths are validated when the bank seeds a replay
    pub fn set(&mut self, pcr_index: u32, algorithm: DigestAlgorithm, value: Vec<u8>) {
        self.values.insert((pcr_index, algorithm), value);
    }

    pub fn get(&self, pcr_index: u32, algorithm: DigestAlgorithm) -> Option<&[u8]> {
        self.values.get(&(pcr_index, algorithm)).map(|v| v.as_slice())
    }

    /// Register value as a typed digest, if present and of the right length
    pub fn digest(&self, pcr_index: u32, algorithm: DigestAlgorithm) -> Option<Digest> {
        self.get(pcr_index, algorithm)
            .and_then(|value| Digest::new(algorithm, value.to_vec()).ok())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, DigestAlgorithm, &[u8])> {
        self.values.iter().map(|((pcr, alg), value)| (*pcr, *alg, value.as_slice()))
    }

    /// Registers of one algorithm, ascending by PCR index
    pub fn bank(&self, algorithm: DigestAlgorithm) -> impl Iterator<Item = (u32, &[u8])> {
        self.iter()
            .filter(move |(_, alg, _)| *alg == algorithm)
            .map(|(pcr, _, value)| (pcr, value))
    }

    /// Copy every entry of `other` into this bank, overwriting shared keys
    pub fn merge(&mut self, other: PcrBank) {
        self.values.extend(other.values);
    }

    /// Load one algorithm bank from its JSON exchange form
    ///
    /// # Example
    /// ```
    /// use eventlog_common::pcr::PcrBank;
    /// use serde_json::json;
    ///
    /// let value = json!({
    ///     "hash_alg": "sha1",
    ///     "pcr_values": [
    ///         {"pcr_index": 0, "pcr_value": "0000000000000000000000000000000000000000"}
    ///     ]
    /// });
    /// let bank = PcrBank::from_json(&value).unwrap();
    /// assert_eq!(bank.len(), 1);
    /// ```
    pub fn from_json(json: &serde_json::Value) -> Result<Self, DecodeError> {
        let values: PcrValues = serde_json::from_value(json.clone()).map_err(|e| {
            DecodeError::SchemaViolation(format!("Failed to parse PCR values: {}", e))
        })?;
        let algorithm = DigestAlgorithm::from_name(&values.hash_alg)?;
        let mut bank = PcrBank::new();
        for entry in values.pcr_values {
            let value = hex::decode(&entry.pcr_value).map_err(|e| {
                DecodeError::SchemaViolation(format!(
                    "Failed to parse PCR value: PCR{} = {}, error: {}",
                    entry.pcr_index, entry.pcr_value, e
                ))
            })?;
            bank.set(entry.pcr_index, algorithm, value);
        }
        Ok(bank)
    }

    /// Render one algorithm bank in its JSON exchange form
    pub fn to_json(&self, algorithm: DigestAlgorithm) -> serde_json::Value {
        let values = PcrValues {
            hash_alg: algorithm.to_string(),
            pcr_values: self
                .bank(algorithm)
                .map(|(pcr_index, value)| PcrValueEntry {
                    pcr_index,
                    pcr_value: hex::encode(value),
                })
                .collect(),
        };
        serde_json::to_value(values).unwrap_or(serde_json::Value::Null)
    }
}

/// Locality recorded by a StartupLocality EV_NO_ACTION event on PCR 0
pub fn startup_locality(log: &EventLog) -> Option<u8> {
    log.events
        .iter()
        .filter(|e| e.pcr_index == 0 && e.event_type.is_no_action())
        .find_map(|e| {
            let data = &e.event_data;
            if data.len() > STARTUP_LOCALITY_SIGNATURE.len()
                && data.starts_with(STARTUP_LOCALITY_SIGNATURE)
            {
                Some(data[STARTUP_LOCALITY_SIGNATURE.len()])
            } else {
                None
            }
        })
}

fn reset_value(
    pcr_index: u32,
    algorithm: DigestAlgorithm,
    mode: ResetMode,
    locality: Option<u8>,
) -> Vec<u8> {
    let size = algorithm.digest_size();
    match mode {
        ResetMode::Zero => vec![0u8; size],
        ResetMode::Platform if DRTM_PCR_RANGE.contains(&pcr_index) => vec![0xffu8; size],
        ResetMode::Platform => {
            let mut value = vec![0u8; size];
            if pcr_index == 0 {
                if let Some(locality) = locality {
                    value[size - 1] = locality;
                }
            }
            value
        },
    }
}

fn is_extended(event: &Event) -> bool {
    event.handle_kind == HandleKind::Pcr && !event.event_type.is_no_action()
}

// IMA records a measurement violation as an all-zero template hash but extends 0xFF bytes.
fn measurement_bytes(event: &Event, digest: &Digest, size: usize) -> Vec<u8> {
    if matches!(event.event_type, EventType::ImaTemplate(_)) && digest.is_zero() {
        vec![0xffu8; size]
    } else {
        digest.value().to_vec()
    }
}

/// Replay a log into a bank for one algorithm with default options
///
/// # Errors
/// * `ReplayError::InvalidInitialBankLength` when a seed value has the wrong length
pub fn replay(
    log: &EventLog,
    algorithm: DigestAlgorithm,
    initial_bank: Option<&PcrBank>,
) -> Result<PcrBank, ReplayError> {
    replay_with_options(log, algorithm, initial_bank, &ReplayOptions::default())
}

/// Replay a log into a bank for one algorithm
///
/// Only entries of `algorithm` are taken from `initial_bank`; the result contains every
/// seeded PCR plus every PCR referenced by an extended event.
pub fn replay_with_options(
    log: &EventLog,
    algorithm: DigestAlgorithm,
    initial_bank: Option<&PcrBank>,
    options: &ReplayOptions,
) -> Result<PcrBank, ReplayError> {
    let size = algorithm.digest_size();
    let mut registers: BTreeMap<u32, Vec<u8>> = BTreeMap::new();

    if let Some(initial) = initial_bank {
        for (pcr_index, value) in initial.bank(algorithm) {
            if value.len() != size {
                return Err(ReplayError::InvalidInitialBankLength {
                    pcr_index,
                    algorithm: algorithm.to_string(),
                    expected: size,
                    actual: value.len(),
                });
            }
            registers.insert(pcr_index, value.to_vec());
        }
    }

    let locality = match options.reset_mode {
        ResetMode::Platform => startup_locality(log),
        ResetMode::Zero => None,
    };
    for event in log.events.iter().filter(|e| is_extended(e)) {
        registers
            .entry(event.pcr_index)
            .or_insert_with(|| {
                reset_value(event.pcr_index, algorithm, options.reset_mode, locality)
            });
    }

    let declared = log.algorithms.contains(&algorithm);
    if !declared {
        warn!("Replaying {} over a log that declares only {:?}", algorithm, log.algorithms);
    }

    for event in log.events.iter().filter(|e| is_extended(e)) {
        let digest = match event.digest(algorithm) {
            Some(digest) => digest,
            None if declared && options.policy == ReplayPolicy::Strict => {
                return Err(ReplayError::MissingDigest {
                    sequence_number: event.sequence_number,
                    pcr_index: event.pcr_index,
                    algorithm: algorithm.to_string(),
                });
            },
            None => {
                debug!("Event {} has no {} digest, skipped", event.sequence_number, algorithm);
                continue;
            },
        };
        let measurement = measurement_bytes(event, digest, size);
        let current = registers
            .entry(event.pcr_index)
            .or_insert_with(|| vec![0u8; size]);
        let extended = hash_parts(algorithm, &[current.as_slice(), measurement.as_slice()])?;
        *current = extended.into_value();
    }

    let mut bank = PcrBank::new();
    for (pcr_index, value) in registers {
        bank.set(pcr_index, algorithm, value);
    }
    Ok(bank)
}

/// Replay every algorithm the log declares and merge the banks
pub fn replay_all(log: &EventLog, options: &ReplayOptions) -> Result<PcrBank, ReplayError> {
    let mut merged = PcrBank::new();
    for algorithm in &log.algorithms {
        merged.merge(replay_with_options(log, *algorithm, None, options)?);
    }
    Ok(merged)
}
