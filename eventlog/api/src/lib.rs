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


//! TPM 2.0 event log toolkit
//!
//! Decodes legacy and crypto-agile TCG logs, IMA measurement lists and Canonical Event Logs
//! into one event model, replays them into PCR banks, edits them and writes them back in any
//! format that can represent them.
//!
//! # Example
//! ```no_run
//! use eventlog::{decode, replay, DigestAlgorithm, LogFormat};
//!
//! let raw = std::fs::read("/sys/kernel/security/tpm0/binary_bios_measurements").unwrap();
//! let log = decode(LogFormat::CryptoAgileTcg, &raw).unwrap();
//! let bank = replay(&log, DigestAlgorithm::Sha256).unwrap();
//! println!("{:?}", bank.get(0, DigestAlgorithm::Sha256));
//! ```

pub mod config;
pub mod engine;
pub mod logger;
pub mod registry;

use once_cell::sync::Lazy;
use thiserror::Error;

pub use config::{ConfigError, EventLogConfig, LoggerConfig};
pub use engine::EventLogEngine;
pub use eventlog_common::editor::{insert, rehash, remove, replace};
pub use eventlog_common::{
    DecodeError, DecodeLimits, Digest, DigestAlgorithm, EditError, EncodeError, Event, EventLog,
    EventType, HandleKind, LogFormat, PcrBank, RegistryError, ReplayError, ReplayOptions,
    ReplayPolicy, ResetMode, SpecIdHeader,
};
pub use registry::{EventDecoderRegistry, TypedEventPayload};

static DEFAULT_ENGINE: Lazy<EventLogEngine> = Lazy::new(EventLogEngine::default);

/// Any error the toolkit reports
#[derive(Error, Debug)]
pub enum EventLogError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Replay(#[from] ReplayError),
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Decode a serialized log with default limits
pub fn decode(format: LogFormat, data: &[u8]) -> Result<EventLog, DecodeError> {
    DEFAULT_ENGINE.decode(format, data)
}

/// Encode a log into `format`
///
/// # Errors
/// * `EncodeError::UnsupportedConversion` when an event has no representation in `format`
/// * `EncodeError::LossyConversion` when writing would drop digests or data
pub fn encode(format: LogFormat, log: &EventLog) -> Result<Vec<u8>, EncodeError> {
    DEFAULT_ENGINE.encode(format, log)
}

/// Replay one algorithm from all-zero registers, skipping events without a digest for it
pub fn replay(log: &EventLog, algorithm: DigestAlgorithm) -> Result<PcrBank, ReplayError> {
    DEFAULT_ENGINE.replay(log, algorithm)
}

/// Interpret an event with the process-wide decoder registry
pub fn interpret_event(event: &Event) -> TypedEventPayload {
    EventDecoderRegistry::global().interpret(event)
}

pub fn detect_format(data: &[u8]) -> Option<LogFormat> {
    DEFAULT_ENGINE.detect_format(data)
}

pub fn describe(log: &EventLog) -> serde_json::Value {
    DEFAULT_ENGINE.describe(log)
}
