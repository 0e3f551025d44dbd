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

//! Digest algorithm registry
//!
//! Maps TPM algorithm identifiers (TPM_ALG_ID) to hash functions and their fixed output sizes.
//! The table is built into the binary and never changes at runtime.
//!
//! # Examples
//! ```
//! use eventlog_common::algorithm::{hash, DigestAlgorithm};
//!
//! let digest = hash(DigestAlgorithm::Sha256, b"abc").unwrap();
//! assert_eq!(digest.value().len(), 32);
//! ```

use std::fmt;
use std::str::FromStr;

use openssl::hash::{Hasher, MessageDigest};
use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, RegistryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
#[repr(u16)]
pub enum DigestAlgorithm {
    Sha1 = 0x0004,
    Sha256 = 0x000B,
    Sha384 = 0x000C,
    Sha512 = 0x000D,
    Sm3_256 = 0x0012,
}

/// Registry entry: identifier, canonical name and output length
struct AlgorithmEntry {
    algorithm: DigestAlgorithm,
    name: &'static str,
    output_length: usize,
}

const ALGORITHM_TABLE: [AlgorithmEntry; 5] = [
    AlgorithmEntry { algorithm: DigestAlgorithm::Sha1, name: "sha1", output_length: 20 },
    AlgorithmEntry { algorithm: DigestAlgorithm::Sha256, name: "sha256", output_length: 32 },
    AlgorithmEntry { algorithm: DigestAlgorithm::Sha384, name: "sha384", output_length: 48 },
    AlgorithmEntry { algorithm: DigestAlgorithm::Sha512, name: "sha512", output_length: 64 },
    AlgorithmEntry { algorithm: DigestAlgorithm::Sm3_256, name: "sm3_256", output_length: 32 },
];

/// Result of a registry lookup
#[derive(Clone)]
pub struct AlgorithmSpec {
    pub algorithm: DigestAlgorithm,
    pub message_digest: MessageDigest,
    pub output_length: usize,
}

impl fmt::Debug for AlgorithmSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlgorithmSpec")
            .field("algorithm", &self.algorithm)
            .field("output_length", &self.output_length)
            .finish()
    }
}

impl DigestAlgorithm {
    /// All algorithms known to the registry, ordered by identifier
    pub fn all() -> impl Iterator<Item = DigestAlgorithm> {
        ALGORITHM_TABLE.iter().map(|entry| entry.algorithm)
    }

    fn entry(self) -> &'static AlgorithmEntry {
        // The table covers every variant.
        &ALGORITHM_TABLE[match self {
            DigestAlgorithm::Sha1 => 0,
            DigestAlgorithm::Sha256 => 1,
            DigestAlgorithm::Sha384 => 2,
            DigestAlgorithm::Sha512 => 3,
            DigestAlgorithm::Sm3_256 => 4,
        }]
    }

    /// Resolve a TPM_ALG_ID
    ///
    /// # Errors
    /// * `RegistryError::UnknownAlgorithm` when the identifier is not in the registry
    pub fn from_id(id: u16) -> Result<Self, RegistryError> {
        ALGORITHM_TABLE
            .iter()
            .find(|entry| entry.algorithm as u16 == id)
            .map(|entry| entry.algorithm)
            .ok_or_else(|| RegistryError::UnknownAlgorithm(format!("0x{:04x}", id)))
    }

    /// Resolve a canonical lowercase name; `sm3` is accepted as an alias of `sm3_256`
    pub fn from_name(name: &str) -> Result<Self, RegistryError> {
        let lowered = name.to_lowercase();
        let lookup = if lowered == "sm3" { "sm3_256" } else { lowered.as_str() };
        ALGORITHM_TABLE
            .iter()
            .find(|entry| entry.name == lookup)
            .map(|entry| entry.algorithm)
            .ok_or_else(|| RegistryError::UnknownAlgorithm(name.to_string()))
    }

    pub fn id(self) -> u16 {
        self as u16
    }

    pub fn name(self) -> &'static str {
        self.entry().name
    }

    pub fn digest_size(self) -> usize {
        self.entry().output_length
    }

    pub fn message_digest(self) -> MessageDigest {
        match self {
            DigestAlgorithm::Sha1 => MessageDigest::sha1(),
            DigestAlgorithm::Sha256 => MessageDigest::sha256(),
            DigestAlgorithm::Sha384 => MessageDigest::sha384(),
            DigestAlgorithm::Sha512 => MessageDigest::sha512(),
            DigestAlgorithm::Sm3_256 => MessageDigest::sm3(),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DigestAlgorithm::from_name(s)
    }
}

impl TryFrom<String> for DigestAlgorithm {
    type Error = RegistryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        DigestAlgorithm::from_name(&value)
    }
}

impl From<DigestAlgorithm> for String {
    fn from(value: DigestAlgorithm) -> Self {
        value.name().to_string()
    }
}

/// A digest value bound to its algorithm
///
/// The length of `value` always equals the algorithm's output length.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digest {
    algorithm: DigestAlgorithm,
    value: Vec<u8>,
}

impl Digest {
    /// Build a digest, rejecting values whose length disagrees with the algorithm
    ///
    /// # Errors
    /// * `DecodeError::DigestLengthMismatch` when the byte length is wrong
    pub fn new(algorithm: DigestAlgorithm, value: Vec<u8>) -> Result<Self, DecodeError> {
        if value.len() != algorithm.digest_size() {
            return Err(DecodeError::DigestLengthMismatch {
                algorithm: algorithm.to_string(),
                expected: algorithm.digest_size(),
                actual: value.len(),
            });
        }
        Ok(Self { algorithm, value })
    }

    /// Parse a hex string into a digest of the given algorithm
    pub fn from_hex(algorithm: DigestAlgorithm, hex_str: &str) -> Result<Self, DecodeError> {
        let value = hex::decode(hex_str).map_err(|e| {
            DecodeError::InvalidEventData(format!("Invalid {} digest hex: {}", algorithm, e))
        })?;
        Self::new(algorithm, value)
    }

    /// All-zero digest of the algorithm's length
    pub fn zero(algorithm: DigestAlgorithm) -> Self {
        Self { algorithm, value: vec![0u8; algorithm.digest_size()] }
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn is_zero(&self) -> bool {
        self.value.iter().all(|b| *b == 0)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.value)
    }

    pub fn into_value(self) -> Vec<u8> {
        self.value
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

/// Look up a TPM_ALG_ID in the registry
///
/// # Errors
/// * `RegistryError::UnknownAlgorithm` for identifiers outside the built-in table
pub fn lookup(id: u16) -> Result<AlgorithmSpec, RegistryError> {
    let algorithm = DigestAlgorithm::from_id(id)?;
    Ok(AlgorithmSpec {
        algorithm,
        message_digest: algorithm.message_digest(),
        output_length: algorithm.digest_size(),
    })
}

/// Hash a sequence of byte slices with the given algorithm
pub fn hash_parts(algorithm: DigestAlgorithm, parts: &[&[u8]]) -> Result<Digest, RegistryError> {
    let backend = |action: &str, e: openssl::error::ErrorStack| {
        RegistryError::Backend(format!("Failed to {} {} hash: {}", action, algorithm, e))
    };
    let mut hasher = Hasher::new(algorithm.message_digest()).map_err(|e| backend("create", e))?;
    for part in parts {
        hasher.update(part).map_err(|e| backend("update", e))?;
    }
    let result = hasher.finish().map_err(|e| backend("finalize", e))?;
    Ok(Digest { algorithm, value: result.to_vec() })
}

/// Hash a byte string with the given algorithm
pub fn hash(algorithm: DigestAlgorithm, data: &[u8]) -> Result<Digest, RegistryError> {
    hash_parts(algorithm, &[data])
}

/// Hash a byte string with the algorithm identified by a TPM_ALG_ID
pub fn hash_id(id: u16, data: &[u8]) -> Result<Digest, RegistryError> {
    hash(lookup(id)?.algorithm, data)
}
