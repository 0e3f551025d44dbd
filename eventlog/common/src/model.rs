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

//! Unified event model shared by every log format.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::algorithm::{hash, Digest, DigestAlgorithm};
use crate::error::RegistryError;

/// TCG PC Client EV_NO_ACTION event type
pub const EV_NO_ACTION: u32 = 0x0000_0003;

/// Concrete serialization a log was decoded from or will be encoded into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    LegacyTcg,
    CryptoAgileTcg,
    ImaAscii,
    ImaBinary,
    CelTlv,
    CelJson,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogFormat::LegacyTcg => "legacy TCG",
            LogFormat::CryptoAgileTcg => "crypto-agile TCG",
            LogFormat::ImaAscii => "IMA ASCII",
            LogFormat::ImaBinary => "IMA binary",
            LogFormat::CelTlv => "CEL-TLV",
            LogFormat::CelJson => "CEL-JSON",
        };
        f.write_str(name)
    }
}

/// Target of an event's measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleKind {
    #[default]
    Pcr,
    NvIndex,
}

/// Event type tag
///
/// TCG logs carry a numeric PC Client event type, IMA logs carry the template name and
/// CEL management records carry their management type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    PcClient(u32),
    ImaTemplate(String),
    CelManagement(u8),
}

impl EventType {
    pub fn is_no_action(&self) -> bool {
        matches!(self, EventType::PcClient(EV_NO_ACTION))
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::PcClient(value) => write!(f, "pcclient:0x{:08x}", value),
            EventType::ImaTemplate(name) => write!(f, "ima:{}", name),
            EventType::CelManagement(value) => write!(f, "cel:0x{:02x}", value),
        }
    }
}

/// One log entry in the unified representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub sequence_number: u64,
    pub pcr_index: u32,
    pub handle_kind: HandleKind,
    pub digests: Vec<Digest>,
    pub event_type: EventType,
    pub event_data: Vec<u8>,
}

impl Event {
    pub fn new(
        pcr_index: u32,
        event_type: EventType,
        digests: Vec<Digest>,
        event_data: Vec<u8>,
    ) -> Self {
        Self {
            sequence_number: 0,
            pcr_index,
            handle_kind: HandleKind::Pcr,
            digests,
            event_type,
            event_data,
        }
    }

    /// Build an event whose digests are the hash of its data under each algorithm
    pub fn measure(
        pcr_index: u32,
        event_type: EventType,
        event_data: Vec<u8>,
        algorithms: &[DigestAlgorithm],
    ) -> Result<Self, RegistryError> {
        let digests = algorithms
            .iter()
            .map(|alg| hash(*alg, &event_data))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(pcr_index, event_type, digests, event_data))
    }

    pub fn digest(&self, algorithm: DigestAlgorithm) -> Option<&Digest> {
        self.digests.iter().find(|d| d.algorithm() == algorithm)
    }

    pub fn algorithms(&self) -> impl Iterator<Item = DigestAlgorithm> + '_ {
        self.digests.iter().map(|d| d.algorithm())
    }

    /// Check that the digest list is non-empty and names each algorithm at most once
    pub fn check_digests(&self) -> Result<(), String> {
        if self.digests.is_empty() {
            return Err("digest list is empty".to_string());
        }
        let mut seen = HashSet::new();
        for digest in &self.digests {
            if !seen.insert(digest.algorithm()) {
                return Err(format!("algorithm {} appears more than once", digest.algorithm()));
            }
        }
        Ok(())
    }
}

/// Crypto-agile log header (TCG_EfiSpecIdEvent)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecIdHeader {
    pub platform_class: u32,
    pub spec_version_minor: u8,
    pub spec_version_major: u8,
    pub spec_errata: u8,
    pub uintn_size: u8,
    pub algorithms: Vec<(DigestAlgorithm, u16)>,
    pub vendor_info: Vec<u8>,
}

impl SpecIdHeader {
    /// Header used when a log without one is written as a crypto-agile log
    pub fn for_algorithms<I: IntoIterator<Item = DigestAlgorithm>>(algorithms: I) -> Self {
        Self {
            platform_class: 0,
            spec_version_minor: 0,
            spec_version_major: 2,
            spec_errata: 0,
            uintn_size: 2,
            algorithms: algorithms
                .into_iter()
                .map(|alg| (alg, alg.digest_size() as u16))
                .collect(),
            vendor_info: Vec::new(),
        }
    }
}

/// Ordered collection of events plus the algorithms the log claims to carry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLog {
    pub format: LogFormat,
    pub algorithms: BTreeSet<DigestAlgorithm>,
    pub header: Option<SpecIdHeader>,
    pub events: Vec<Event>,
}

impl EventLog {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            algorithms: BTreeSet::new(),
            header: None,
            events: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Assign sequence numbers from zero in log order
    pub fn renumber(&mut self) {
        for (index, event) in self.events.iter_mut().enumerate() {
            event.sequence_number = index as u64;
        }
    }
}
