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

//! SHA1-only TCG event log (TCG_PCR_EVENT records)

use log::debug;

use eventlog_common::algorithm::DigestAlgorithm;
use eventlog_common::byte_reader::ByteReader;
use eventlog_common::byte_writer::ByteWriter;
use eventlog_common::codec::{DecodeLimits, EventLogCodec};
use eventlog_common::error::{DecodeError, EncodeError};
use eventlog_common::model::{EventLog, LogFormat};

use crate::record::{
    at_terminator, event_size, parse_event_entry, pc_client_type, write_event_v1, TcgDigestParseV1,
};

#[derive(Debug, Clone, Default)]
pub struct LegacyTcgCodec {
    limits: DecodeLimits,
}

impl LegacyTcgCodec {
    pub fn new(limits: DecodeLimits) -> Self {
        Self { limits }
    }

    fn unsupported(log: &EventLog, reason: String) -> EncodeError {
        EncodeError::UnsupportedConversion { from: log.format, to: LogFormat::LegacyTcg, reason }
    }

    fn lossy(log: &EventLog, reason: String) -> EncodeError {
        EncodeError::LossyConversion { from: log.format, to: LogFormat::LegacyTcg, reason }
    }
}

impl EventLogCodec for LegacyTcgCodec {
    fn format(&self) -> LogFormat {
        LogFormat::LegacyTcg
    }

    fn decode(&self, data: &[u8]) -> Result<EventLog, DecodeError> {
        let mut reader = ByteReader::new(data);
        let mut log = EventLog::new(LogFormat::LegacyTcg);
        log.algorithms.insert(DigestAlgorithm::Sha1);

        while !reader.is_end() {
            if at_terminator(&reader) {
                debug!(
                    "Terminator record at offset {}, {} trailing bytes ignored",
                    reader.position(),
                    reader.remaining()
                );
                break;
            }
            let sequence_number = log.events.len() as u64;
            let event =
                parse_event_entry(&mut reader, &TcgDigestParseV1, sequence_number, &self.limits)?;
            log.events.push(event);
        }

        debug!("Decoded {} legacy TCG events", log.events.len());
        Ok(log)
    }

    fn encode(&self, log: &EventLog) -> Result<Vec<u8>, EncodeError> {
        if log.algorithms.len() > 1 {
            return Err(Self::lossy(
                log,
                format!(
                    "log declares {} digest algorithms, legacy records carry only sha1",
                    log.algorithms.len()
                ),
            ));
        }

        let mut writer = ByteWriter::new();
        for event in &log.events {
            let event_type =
                pc_client_type(event).map_err(|reason| Self::unsupported(log, reason))?;
            let sha1 = match event.digests.as_slice() {
                [digest] if digest.algorithm() == DigestAlgorithm::Sha1 => digest,
                [digest] => {
                    return Err(Self::unsupported(
                        log,
                        format!(
                            "event {} carries only a {} digest",
                            event.sequence_number,
                            digest.algorithm()
                        ),
                    ));
                },
                [] => {
                    return Err(Self::unsupported(
                        log,
                        format!("event {} carries no digest", event.sequence_number),
                    ));
                },
                digests => {
                    return Err(Self::lossy(
                        log,
                        format!(
                            "event {} carries {} digests",
                            event.sequence_number,
                            digests.len()
                        ),
                    ));
                },
            };
            event_size(event)?;
            write_event_v1(
                &mut writer,
                event.pcr_index,
                event_type,
                sha1.value(),
                &event.event_data,
            );
        }
        Ok(writer.into_inner())
    }
}
