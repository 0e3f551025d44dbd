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

//! Codec interface implemented once per log format.

use serde::Deserialize;

use crate::error::{DecodeError, EncodeError};
use crate::model::{EventLog, LogFormat};

pub const DEFAULT_MAX_EVENT_SIZE: u32 = 16 * 1024 * 1024;
pub const DEFAULT_MAX_DIGEST_COUNT: u32 = 5;
pub const DEFAULT_MAX_TLV_DEPTH: usize = 4;

/// Upper bounds applied by decoders to attacker-controlled length fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DecodeLimits {
    pub max_event_size: u32,
    pub max_digest_count: u32,
    pub max_tlv_depth: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_event_size: DEFAULT_MAX_EVENT_SIZE,
            max_digest_count: DEFAULT_MAX_DIGEST_COUNT,
            max_tlv_depth: DEFAULT_MAX_TLV_DEPTH,
        }
    }
}

/// Decoder and encoder for one concrete log serialization
///
/// Implementations hold only immutable options, so a codec can be shared between threads.
pub trait EventLogCodec {
    fn format(&self) -> LogFormat;

    /// Parse a serialized log into the unified model
    fn decode(&self, data: &[u8]) -> Result<EventLog, DecodeError>;

    /// Serialize a log; fails when the log cannot be represented in this format
    fn encode(&self, log: &EventLog) -> Result<Vec<u8>, EncodeError>;
}
