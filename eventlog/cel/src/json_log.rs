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


//! CEL-JSON encoding
//!
//! ```json
//! [{"recnum": 0, "pcr": 0,
//!   "digests": [{"hashAlg": "sha256", "digest": "..."}],
//!   "content_type": "pcclient_std",
//!   "content": {"event_type": 8, "event_data": "base64..."}}]
//! ```

use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use eventlog_common::algorithm::{Digest, DigestAlgorithm};
use eventlog_common::codec::{DecodeLimits, EventLogCodec};
use eventlog_common::error::{DecodeError, EncodeError};
use eventlog_common::model::{Event, EventLog, HandleKind, LogFormat};

use crate::management::{CelManagementEvent, StateTransition};
use crate::record::{check_record, collect_algorithms, record_event, CelContent};

const PCCLIENT_STD: &str = "pcclient_std";
const IMA_TEMPLATE: &str = "ima_template";
const CEL: &str = "cel";

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct JsonDigest {
    #[serde(rename = "hashAlg")]
    hash_alg: String,
    digest: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct JsonRecord {
    recnum: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pcr: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nv_index: Option<u32>,
    digests: Vec<JsonDigest>,
    content_type: String,
    content: Value,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PcClientStdContent {
    event_type: u32,
    event_data: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ImaTemplateContent {
    template_name: String,
    template_data: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
enum ManagementContent {
    CelVersion { major: u16, minor: u16 },
    FirmwareEnd(()),
    CelTimestamp(u64),
    StateTrans(StateTransition),
}

fn schema(reason: impl Into<String>) -> DecodeError {
    DecodeError::SchemaViolation(reason.into())
}

fn decode_base64(recnum: u64, field: &str, text: &str) -> Result<Vec<u8>, DecodeError> {
    STANDARD
        .decode(text)
        .map_err(|e| schema(format!("record {}: invalid base64 in {}: {}", recnum, field, e)))
}

fn content_from<T: for<'de> Deserialize<'de>>(
    recnum: u64,
    content_type: &str,
    content: Value,
) -> Result<T, DecodeError> {
    serde_json::from_value(content).map_err(|e| {
        schema(format!("record {}: invalid {} content: {}", recnum, content_type, e))
    })
}

#[derive(Debug, Clone, Default)]
pub struct CelJsonCodec {
    limits: DecodeLimits,
}

impl CelJsonCodec {
    pub fn new(limits: DecodeLimits) -> Self {
        Self { limits }
    }

    fn parse_digests(
        &self,
        recnum: u64,
        entries: Vec<JsonDigest>,
    ) -> Result<Vec<Digest>, DecodeError> {
        if entries.len() > self.limits.max_digest_count as usize {
            return Err(DecodeError::InvalidDigestList {
                sequence_number: recnum,
                reason: format!(
                    "{} digests exceed the limit of {}",
                    entries.len(),
                    self.limits.max_digest_count
                ),
            });
        }
        entries
            .into_iter()
            .map(|entry| {
                let algorithm = DigestAlgorithm::from_name(&entry.hash_alg)?;
                let value = hex::decode(&entry.digest).map_err(|e| {
                    schema(format!("record {}: invalid {} digest hex: {}", recnum, algorithm, e))
                })?;
                Digest::new(algorithm, value)
            })
            .collect()
    }

    fn parse_content(
        &self,
        recnum: u64,
        content_type: &str,
        content: Value,
    ) -> Result<CelContent, DecodeError> {
        let parsed = match content_type {
            PCCLIENT_STD => {
                let content: PcClientStdContent = content_from(recnum, content_type, content)?;
                let event_data = decode_base64(recnum, "event_data", &content.event_data)?;
                CelContent::PcClientStd { event_type: content.event_type, event_data }
            },
            IMA_TEMPLATE => {
                let content: ImaTemplateContent = content_from(recnum, content_type, content)?;
                let template_data = decode_base64(recnum, "template_data", &content.template_data)?;
                CelContent::ImaTemplate { template_name: content.template_name, template_data }
            },
            CEL => {
                let content: ManagementContent = content_from(recnum, content_type, content)?;
                let management = match content {
                    ManagementContent::CelVersion { major, minor } => {
                        CelManagementEvent::CelVersion { major, minor }
                    },
                    ManagementContent::FirmwareEnd(()) => CelManagementEvent::FirmwareEnd,
                    ManagementContent::CelTimestamp(timestamp) => {
                        CelManagementEvent::CelTimestamp(timestamp)
                    },
                    ManagementContent::StateTrans(state) => CelManagementEvent::StateTrans(state),
                };
                CelContent::Management(management)
            },
            other => {
                return Err(schema(format!("record {}: unknown content type {:?}", recnum, other)));
            },
        };
        Ok(parsed)
    }

    fn parse_record(&self, record: JsonRecord) -> Result<Event, DecodeError> {
        let recnum = record.recnum;
        let (handle_kind, handle) = match (record.pcr, record.nv_index) {
            (Some(pcr), None) => (HandleKind::Pcr, pcr),
            (None, Some(nv_index)) => (HandleKind::NvIndex, nv_index),
            _ => {
                return Err(schema(format!(
                    "record {}: exactly one of pcr and nv_index is required",
                    recnum
                )));
            },
        };
        let digests = self.parse_digests(recnum, record.digests)?;
        let content = self.parse_content(recnum, &record.content_type, record.content)?;
        record_event(recnum, handle_kind, handle, digests, content)
    }

    fn to_record(event: &Event, content: CelContent) -> Result<JsonRecord, EncodeError> {
        let (pcr, nv_index) = match event.handle_kind {
            HandleKind::Pcr => (Some(event.pcr_index), None),
            HandleKind::NvIndex => (None, Some(event.pcr_index)),
        };
        let digests = event
            .digests
            .iter()
            .map(|digest| JsonDigest {
                hash_alg: digest.algorithm().name().to_string(),
                digest: digest.to_hex(),
            })
            .collect();

        let (content_type, content) = match content {
            CelContent::PcClientStd { event_type, event_data } => (
                PCCLIENT_STD,
                serde_json::to_value(PcClientStdContent {
                    event_type,
                    event_data: STANDARD.encode(event_data),
                }),
            ),
            CelContent::ImaTemplate { template_name, template_data } => (
                IMA_TEMPLATE,
                serde_json::to_value(ImaTemplateContent {
                    template_name,
                    template_data: STANDARD.encode(template_data),
                }),
            ),
            CelContent::Management(management) => {
                let management = match management {
                    CelManagementEvent::CelVersion { major, minor } => {
                        ManagementContent::CelVersion { major, minor }
                    },
                    CelManagementEvent::FirmwareEnd => ManagementContent::FirmwareEnd(()),
                    CelManagementEvent::CelTimestamp(timestamp) => {
                        ManagementContent::CelTimestamp(timestamp)
                    },
                    CelManagementEvent::StateTrans(state) => ManagementContent::StateTrans(state),
                };
                (CEL, serde_json::to_value(management))
            },
        };
        let content = content.map_err(|e| EncodeError::Serialization(e.to_string()))?;

        Ok(JsonRecord {
            recnum: event.sequence_number,
            pcr,
            nv_index,
            digests,
            content_type: content_type.to_string(),
            content,
        })
    }
}

impl EventLogCodec for CelJsonCodec {
    fn format(&self) -> LogFormat {
        LogFormat::CelJson
    }

    fn decode(&self, data: &[u8]) -> Result<EventLog, DecodeError> {
        let records: Vec<JsonRecord> = serde_json::from_slice(data)
            .map_err(|e| schema(format!("not a CEL-JSON record array: {}", e)))?;
        let mut log = EventLog::new(LogFormat::CelJson);
        for record in records {
            log.events.push(self.parse_record(record)?);
        }
        collect_algorithms(&mut log);
        debug!("Decoded {} CEL-JSON records", log.events.len());
        Ok(log)
    }

    fn encode(&self, log: &EventLog) -> Result<Vec<u8>, EncodeError> {
        let records = log
            .events
            .iter()
            .map(|event| {
                let content = check_record(log, event, LogFormat::CelJson)?;
                Self::to_record(event, content)
            })
            .collect::<Result<Vec<_>, _>>()?;
        serde_json::to_vec_pretty(&records).map_err(|e| EncodeError::Serialization(e.to_string()))
    }
}
