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


//! CEL-TLV encoding

use log::debug;

use eventlog_common::algorithm::{Digest, DigestAlgorithm};
use eventlog_common::codec::{DecodeLimits, EventLogCodec};
use eventlog_common::error::{DecodeError, EncodeError};
use eventlog_common::model::{Event, EventLog, HandleKind, LogFormat};

use crate::management::{CelManagementEvent, MANAGEMENT_TYPES};
use crate::record::{
    check_record, collect_algorithms, record_event, CelContent, CONTENT_CEL,
    CONTENT_IMA_TEMPLATE, CONTENT_PCCLIENT_STD, DIGESTS, HANDLE_NV_INDEX, HANDLE_PCR,
    IMA_TEMPLATE_DATA, IMA_TEMPLATE_NAME, PCCLIENT_EVENT_DATA, PCCLIENT_EVENT_TYPE, RECNUM,
};
use crate::tlv::{TlvReader, TlvWriter};

const RECNUM_SIZE: usize = 8;
const HANDLE_SIZE: usize = 4;
const EVENT_TYPE_SIZE: usize = 4;

/// Read the two fields of a content container in either order, each exactly once
fn read_pair<'a>(
    content: &mut TlvReader<'a>,
    first: u8,
    second: u8,
    name: &str,
) -> Result<(&'a [u8], &'a [u8]), DecodeError> {
    let mut slots: [Option<&'a [u8]>; 2] = [None, None];
    while !content.is_end() {
        let offset = content.offset();
        let (field, length) = content.read_header(&[first, second])?;
        let value = content.read_value(length)?;
        let slot = if field == first { &mut slots[0] } else { &mut slots[1] };
        if slot.replace(value).is_some() {
            return Err(DecodeError::MalformedTlv {
                offset,
                reason: format!("{} field {} repeated", name, field),
            });
        }
    }
    match slots {
        [Some(a), Some(b)] => Ok((a, b)),
        _ => Err(content.malformed(format!("{} content is missing a field", name))),
    }
}

#[derive(Debug, Clone, Default)]
pub struct CelTlvCodec {
    limits: DecodeLimits,
}

impl CelTlvCodec {
    pub fn new(limits: DecodeLimits) -> Self {
        Self { limits }
    }

    fn read_digests(
        &self,
        reader: &mut TlvReader<'_>,
        recnum: u64,
    ) -> Result<Vec<Digest>, DecodeError> {
        let (_, length) = reader.read_header(&[DIGESTS])?;
        let mut list = reader.nested(length)?;
        let mut digests = Vec::new();
        while !list.is_end() {
            let (algorithm_id, size) = list.read_header(&[])?;
            let algorithm = DigestAlgorithm::from_id(u16::from(algorithm_id))?;
            if size as usize != algorithm.digest_size() {
                return Err(DecodeError::DigestLengthMismatch {
                    algorithm: algorithm.to_string(),
                    expected: algorithm.digest_size(),
                    actual: size as usize,
                });
            }
            digests.push(Digest::new(algorithm, list.read_value(size)?.to_vec())?);
            if digests.len() > self.limits.max_digest_count as usize {
                return Err(DecodeError::InvalidDigestList {
                    sequence_number: recnum,
                    reason: format!("more than {} digests", self.limits.max_digest_count),
                });
            }
        }
        Ok(digests)
    }

    fn read_content(&self, reader: &mut TlvReader<'_>) -> Result<CelContent, DecodeError> {
        let (content_type, length) =
            reader.read_header(&[CONTENT_CEL, CONTENT_PCCLIENT_STD, CONTENT_IMA_TEMPLATE])?;
        if length > self.limits.max_event_size {
            return Err(reader.malformed(format!(
                "content of {} bytes exceeds the {} byte limit",
                length, self.limits.max_event_size
            )));
        }
        let mut content = reader.nested(length)?;

        let parsed = match content_type {
            CONTENT_PCCLIENT_STD => {
                let (event_type, event_data) = read_pair(
                    &mut content,
                    PCCLIENT_EVENT_TYPE,
                    PCCLIENT_EVENT_DATA,
                    "pcclient_std",
                )?;
                if event_type.len() > EVENT_TYPE_SIZE {
                    return Err(
                        content.malformed(format!("event type of {} bytes", event_type.len()))
                    );
                }
                CelContent::PcClientStd {
                    event_type: event_type
                        .iter()
                        .fold(0u32, |acc, byte| (acc << 8) | u32::from(*byte)),
                    event_data: event_data.to_vec(),
                }
            },
            CONTENT_IMA_TEMPLATE => {
                let (name, template_data) =
                    read_pair(&mut content, IMA_TEMPLATE_NAME, IMA_TEMPLATE_DATA, "ima_template")?;
                let template_name = String::from_utf8(name.to_vec())
                    .map_err(|_| content.malformed("template name is not valid UTF-8"))?;
                CelContent::ImaTemplate { template_name, template_data: template_data.to_vec() }
            },
            _ => {
                let (management_type, value_length) = content.read_header(&MANAGEMENT_TYPES)?;
                let mut value = content.nested(value_length)?;
                let management = CelManagementEvent::decode_value(management_type, &mut value)?;
                CelContent::Management(management)
            },
        };
        content.finish()?;
        Ok(parsed)
    }

    fn read_record(&self, reader: &mut TlvReader<'_>) -> Result<Event, DecodeError> {
        let (_, length) = reader.read_header(&[RECNUM])?;
        let recnum = reader.read_int(length, RECNUM_SIZE)?;

        let (handle_type, length) = reader.read_header(&[HANDLE_PCR, HANDLE_NV_INDEX])?;
        let handle = reader.read_int(length, HANDLE_SIZE)? as u32;
        let handle_kind =
            if handle_type == HANDLE_PCR { HandleKind::Pcr } else { HandleKind::NvIndex };

        let digests = self.read_digests(reader, recnum)?;
        let content = self.read_content(reader)?;
        record_event(recnum, handle_kind, handle, digests, content)
    }

    fn write_record(
        writer: &mut TlvWriter,
        event: &Event,
        content: CelContent,
    ) -> Result<(), EncodeError> {
        writer.write_int(RECNUM, event.sequence_number, RECNUM_SIZE)?;
        let handle_type = match event.handle_kind {
            HandleKind::Pcr => HANDLE_PCR,
            HandleKind::NvIndex => HANDLE_NV_INDEX,
        };
        writer.write_int(handle_type, u64::from(event.pcr_index), HANDLE_SIZE)?;

        let mut digests = TlvWriter::new();
        for digest in &event.digests {
            let algorithm_type =
                u8::try_from(digest.algorithm().id()).map_err(|_| EncodeError::FieldOverflow {
                    sequence_number: event.sequence_number,
                    field: "digest_algorithm",
                })?;
            digests.write_tlv(algorithm_type, digest.value())?;
        }
        writer.write_nested(DIGESTS, digests)?;

        let content_type = content.content_type();
        let mut body = TlvWriter::new();
        match content {
            CelContent::PcClientStd { event_type, event_data } => {
                body.write_int(PCCLIENT_EVENT_TYPE, u64::from(event_type), EVENT_TYPE_SIZE)?;
                body.write_tlv(PCCLIENT_EVENT_DATA, &event_data)?;
            },
            CelContent::ImaTemplate { template_name, template_data } => {
                body.write_tlv(IMA_TEMPLATE_NAME, template_name.as_bytes())?;
                body.write_tlv(IMA_TEMPLATE_DATA, &template_data)?;
            },
            CelContent::Management(management) => {
                body.write_tlv(management.management_type(), &management.to_event_data()?)?;
            },
        }
        writer.write_nested(content_type, body)
    }
}

impl EventLogCodec for CelTlvCodec {
    fn format(&self) -> LogFormat {
        LogFormat::CelTlv
    }

    fn decode(&self, data: &[u8]) -> Result<EventLog, DecodeError> {
        let mut reader = TlvReader::new(data, self.limits.max_tlv_depth);
        let mut log = EventLog::new(LogFormat::CelTlv);
        while !reader.is_end() {
            let event = self.read_record(&mut reader)?;
            log.events.push(event);
        }
        collect_algorithms(&mut log);
        debug!("Decoded {} CEL-TLV records", log.events.len());
        Ok(log)
    }

    fn encode(&self, log: &EventLog) -> Result<Vec<u8>, EncodeError> {
        let mut writer = TlvWriter::new();
        for event in &log.events {
            let content = check_record(log, event, LogFormat::CelTlv)?;
            Self::write_record(&mut writer, event, content)?;
        }
        Ok(writer.into_inner())
    }
}
