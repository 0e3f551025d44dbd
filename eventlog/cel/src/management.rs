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


//! CEL management records

use std::fmt;

use serde::{Deserialize, Serialize};

use eventlog_common::codec::DEFAULT_MAX_TLV_DEPTH;
use eventlog_common::error::{DecodeError, EncodeError};

use crate::tlv::{TlvReader, TlvWriter};

pub const CEL_VERSION: u8 = 1;
pub const FIRMWARE_END: u8 = 2;
pub const CEL_TIMESTAMP: u8 = 0x80;
pub const STATE_TRANS: u8 = 0x81;

pub const MANAGEMENT_TYPES: [u8; 4] = [CEL_VERSION, FIRMWARE_END, CEL_TIMESTAMP, STATE_TRANS];

const VERSION_MAJOR: u8 = 0;
const VERSION_MINOR: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateTransition {
    Suspend,
    Hibernate,
    Kexec,
}

impl StateTransition {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(StateTransition::Suspend),
            1 => Some(StateTransition::Hibernate),
            2 => Some(StateTransition::Kexec),
            _ => None,
        }
    }

    pub fn value(self) -> u8 {
        self as u8
    }
}

/// Content of a `cel` record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CelManagementEvent {
    CelVersion { major: u16, minor: u16 },
    FirmwareEnd,
    CelTimestamp(u64),
    StateTrans(StateTransition),
}

impl fmt::Display for CelManagementEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CelManagementEvent::CelVersion { major, minor } => {
                write!(f, "cel_version {}.{}", major, minor)
            },
            CelManagementEvent::FirmwareEnd => f.write_str("firmware_end"),
            CelManagementEvent::CelTimestamp(timestamp) => write!(f, "cel_timestamp {}", timestamp),
            CelManagementEvent::StateTrans(state) => write!(f, "state_trans {:?}", state),
        }
    }
}

impl CelManagementEvent {
    pub fn management_type(&self) -> u8 {
        match self {
            CelManagementEvent::CelVersion { .. } => CEL_VERSION,
            CelManagementEvent::FirmwareEnd => FIRMWARE_END,
            CelManagementEvent::CelTimestamp(_) => CEL_TIMESTAMP,
            CelManagementEvent::StateTrans(_) => STATE_TRANS,
        }
    }

    /// Parse the value of a management TLV whose content is held by `value`
    pub fn decode_value(
        management_type: u8,
        value: &mut TlvReader<'_>,
    ) -> Result<Self, DecodeError> {
        let event = match management_type {
            CEL_VERSION => {
                let mut major = None;
                let mut minor = None;
                while !value.is_end() {
                    let offset = value.offset();
                    let (field, length) = value.read_header(&[VERSION_MAJOR, VERSION_MINOR])?;
                    let number = value.read_int(length, 2)? as u16;
                    let slot = if field == VERSION_MAJOR { &mut major } else { &mut minor };
                    if slot.replace(number).is_some() {
                        return Err(DecodeError::MalformedTlv {
                            offset,
                            reason: format!("cel_version field {} repeated", field),
                        });
                    }
                }
                match (major, minor) {
                    (Some(major), Some(minor)) => CelManagementEvent::CelVersion { major, minor },
                    _ => return Err(value.malformed("cel_version needs both major and minor")),
                }
            },
            FIRMWARE_END => CelManagementEvent::FirmwareEnd,
            CEL_TIMESTAMP => {
                let length = value.remaining() as u32;
                CelManagementEvent::CelTimestamp(value.read_int(length, 8)?)
            },
            STATE_TRANS => {
                let length = value.remaining() as u32;
                let state = value.read_int(length, 1)? as u8;
                let state = StateTransition::from_u8(state)
                    .ok_or_else(|| value.malformed(format!("unknown state transition {}", state)))?;
                CelManagementEvent::StateTrans(state)
            },
            other => return Err(value.malformed(format!("unknown management type {}", other))),
        };
        value.finish()?;
        Ok(event)
    }

    /// Interpret the event data of a `CelManagement` event
    pub fn from_event_data(management_type: u8, data: &[u8]) -> Result<Self, DecodeError> {
        let mut value = TlvReader::new(data, DEFAULT_MAX_TLV_DEPTH);
        Self::decode_value(management_type, &mut value)
    }

    /// Canonical value bytes: version numbers as 2 bytes, timestamp as 8, state as 1
    pub fn to_event_data(&self) -> Result<Vec<u8>, EncodeError> {
        let mut writer = TlvWriter::new();
        match self {
            CelManagementEvent::CelVersion { major, minor } => {
                writer.write_int(VERSION_MAJOR, u64::from(*major), 2)?;
                writer.write_int(VERSION_MINOR, u64::from(*minor), 2)?;
                Ok(writer.into_inner())
            },
            CelManagementEvent::FirmwareEnd => Ok(Vec::new()),
            CelManagementEvent::CelTimestamp(timestamp) => Ok(timestamp.to_be_bytes().to_vec()),
            CelManagementEvent::StateTrans(state) => Ok(vec![state.value()]),
        }
    }
}
