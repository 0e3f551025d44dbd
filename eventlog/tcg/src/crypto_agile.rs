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

//! Crypto-agile TCG event log
//!
//! The log opens with a TCG_PCR_EVENT record carrying the Spec ID event, which declares the digest
//! algorithms and sizes used by every following TCG_PCR_EVENT2 record. The header record is kept
//! in `EventLog::header`; events are numbered from zero starting after it.

use log::{debug, info};

use eventlog_common::byte_reader::ByteReader;
use eventlog_common::byte_writer::ByteWriter;
use eventlog_common::codec::{DecodeLimits, EventLogCodec};
use eventlog_common::error::{DecodeError, EncodeError};
use eventlog_common::model::{EventLog, EventType, LogFormat, SpecIdHeader, EV_NO_ACTION};

use crate::record::{
    at_terminator, parse_event_entry, pc_client_type, write_event_v1, write_event_v2,
    TcgDigestParseV1, TcgDigestParseV2,
};
use crate::spec_id::{parse_spec_id_event, spec_id_event_bytes};

const HEADER_SHA1: [u8; 20] = [0u8; 20];

#[derive(Debug, Clone, Default)]
pub struct CryptoAgileTcgCodec {
    limits: DecodeLimits,
}

impl CryptoAgileTcgCodec {
    pub fn new(limits: DecodeLimits) -> Self {
        Self { limits }
    }

    /// Parse the leading TCG_PCR_EVENT record and its Spec ID payload
    fn parse_header(&self, reader: &mut ByteReader<'_>) -> Result<SpecIdHeader, DecodeError> {
        let first =
            parse_event_entry(reader, &TcgDigestParseV1, 0, &self.limits).map_err(|e| match e {
                DecodeError::TruncatedRecord { .. } => {
                    DecodeError::InvalidHeader(format!("truncated header record: {}", e))
                },
                other => other,
            })?;
        if first.pcr_index != 0 || first.event_type != EventType::PcClient(EV_NO_ACTION) {
            return Err(DecodeError::InvalidHeader(format!(
                "first record is {} on PCR {}, expected EV_NO_ACTION on PCR 0",
                first.event_type, first.pcr_index
            )));
        }
        parse_spec_id_event(&first.event_data)
    }
}

impl EventLogCodec for CryptoAgileTcgCodec {
    fn format(&self) -> LogFormat {
        LogFormat::CryptoAgileTcg
    }

    fn decode(&self, data: &[u8]) -> Result<EventLog, DecodeError> {
        let mut reader = ByteReader::new(data);
        let header = self.parse_header(&mut reader)?;
        info!(
            "Crypto-agile log declares {:?}",
            header.algorithms.iter().map(|(alg, _)| alg.name()).collect::<Vec<_>>()
        );

        let mut log = EventLog::new(LogFormat::CryptoAgileTcg);
        log.algorithms = header.algorithms.iter().map(|(alg, _)| *alg).collect();

        let digest_parser = TcgDigestParseV2::new(&header.algorithms, self.limits.max_digest_count);
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
                parse_event_entry(&mut reader, &digest_parser, sequence_number, &self.limits)?;
            log.events.push(event);
        }

        log.header = Some(header);
        debug!("Decoded {} crypto-agile TCG events", log.events.len());
        Ok(log)
    }

    fn encode(&self, log: &EventLog) -> Result<Vec<u8>, EncodeError> {
        let header = match &log.header {
            Some(header) => header.clone(),
            None => SpecIdHeader::for_algorithms(log.algorithms.iter().copied()),
        };
        let unsupported = |reason: String| EncodeError::UnsupportedConversion {
            from: log.format,
            to: LogFormat::CryptoAgileTcg,
            reason,
        };

        let mut writer = ByteWriter::new();
        let header_data = spec_id_event_bytes(&header)?;
        write_event_v1(&mut writer, 0, EV_NO_ACTION, &HEADER_SHA1, &header_data);

        for event in &log.events {
            let event_type = pc_client_type(event).map_err(unsupported)?;
            if event.digests.is_empty() {
                return Err(unsupported(format!(
                    "event {} carries no digest",
                    event.sequence_number
                )));
            }
            if let Some(digest) = event
                .digests
                .iter()
                .find(|d| !header.algorithms.iter().any(|(alg, _)| *alg == d.algorithm()))
            {
                return Err(unsupported(format!(
                    "event {} carries a {} digest the header does not declare",
                    event.sequence_number,
                    digest.algorithm()
                )));
            }
            write_event_v2(&mut writer, event, event_type)?;
        }
        Ok(writer.into_inner())
    }
}
