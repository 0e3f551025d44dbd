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

//! Error types shared by every event log component.

use thiserror::Error;

use crate::model::LogFormat;

/// Errors raised by the digest algorithm registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown digest algorithm: {0}")]
    UnknownAlgorithm(String),
    #[error("Hash backend error: {0}")]
    Backend(String),
}

/// Errors raised while decoding a serialized event log
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Truncated record at offset {offset}: requested {requested} bytes, {remaining} remain")]
    TruncatedRecord { offset: u64, requested: u64, remaining: u64 },
    #[error("Malformed line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },
    #[error("Malformed TLV at offset {offset}: {reason}")]
    MalformedTlv { offset: u64, reason: String },
    #[error("Schema violation: {0}")]
    SchemaViolation(String),
    #[error("Unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("Digest length mismatch for {algorithm}: expected {expected} bytes, got {actual}")]
    DigestLengthMismatch { algorithm: String, expected: usize, actual: usize },
    #[error("Invalid log header: {0}")]
    InvalidHeader(String),
    #[error("Invalid digest list in event {sequence_number}: {reason}")]
    InvalidDigestList { sequence_number: u64, reason: String },
    #[error("Invalid event data: {0}")]
    InvalidEventData(String),
}

/// Errors raised while encoding an event log into a concrete format
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Cannot convert {from} log to {to}: {reason}")]
    UnsupportedConversion { from: LogFormat, to: LogFormat, reason: String },
    #[error("Converting {from} log to {to} would lose data: {reason}")]
    LossyConversion { from: LogFormat, to: LogFormat, reason: String },
    #[error("Field {field} of event {sequence_number} does not fit the target encoding")]
    FieldOverflow { sequence_number: u64, field: &'static str },
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors raised by the PCR replay engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    #[error("Event {sequence_number} (PCR {pcr_index}) has no {algorithm} digest")]
    MissingDigest { sequence_number: u64, pcr_index: u32, algorithm: String },
    #[error("Initial PCR {pcr_index} value for {algorithm} must be {expected} bytes, got {actual}")]
    InvalidInitialBankLength { pcr_index: u32, algorithm: String, expected: usize, actual: usize },
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Errors raised by the log editor
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("Algorithm {0} is not declared by the log")]
    AlgorithmNotDeclared(String),
    #[error("Index {index} out of range for a log of {len} events")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Invalid event: {0}")]
    InvalidEvent(String),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl From<RegistryError> for DecodeError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownAlgorithm(alg) => DecodeError::UnsupportedAlgorithm(alg),
            RegistryError::Backend(msg) => DecodeError::InvalidEventData(msg),
        }
    }
}
