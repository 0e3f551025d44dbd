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

//! TCG record layout shared by the legacy and crypto-agile codecs
//!
//! Both formats lay out a record as PCR index, event type, digest area, event size and event
//! data. Only the digest area differs: TCG_PCR_EVENT carries one SHA1 digest, TCG_PCR_EVENT2
//! carries a counted list of (algorithm, digest) pairs whose sizes come from the log header.

use std::collections::HashSet;

use eventlog_common::algorithm::{Digest, DigestAlgorithm};
use eventlog_common::byte_reader::ByteReader;
use eventlog_common::byte_writer::ByteWriter;
use eventlog_common::codec::DecodeLimits;
use eventlog_common::error::{DecodeError, EncodeError};
use eventlog_common::model::{Event, EventType, HandleKind};

use crate::event_type::event_type_name;

/// PCR index value firmware writes after the last record
pub const TERMINATOR_PCR: u32 = 0xFFFF_FFFF;

const SHA1_DIGEST_SIZE: usize = 20;

/// Parses the digest area of a record
pub trait TcgDigestParse {
    fn parse_digests(
        &self,
        reader: &mut ByteReader<'_>,
        sequence_number: u64,
    ) -> Result<Vec<Digest>, DecodeError>;
}

/// TCG_PCR_EVENT: a single SHA1 digest
pub struct TcgDigestParseV1;

/// TCG_PCR_EVENT2: digest count followed by (algorithm id, digest) pairs
pub struct TcgDigestParseV2<'h> {
    declared: &'h [(DigestAlgorithm, u16)],
    max_count: u32,
}

impl TcgDigestParse for TcgDigestParseV1 {
    fn parse_digests(
        &self,
        reader: &mut ByteReader<'_>,
        _sequence_number: u64,
    ) -> Result<Vec<Digest>, DecodeError> {
        let value = reader.read_bytes(SHA1_DIGEST_SIZE)?;
        Ok(vec![Digest::new(DigestAlgorithm::Sha1, value)?])
    }
}

impl<'h> TcgDigestParseV2<'h> {
    pub fn new(declared: &'h [(DigestAlgorithm, u16)], max_count: u32) -> Self {
        Self { declared, max_count }
    }
}

impl TcgDigestParse for TcgDigestParseV2<'_> {
    fn parse_digests(
        &self,
        reader: &mut ByteReader<'_>,
        sequence_number: u64,
    ) -> Result<Vec<Digest>, DecodeError> {
        let digest_count = reader.read_u32()?;
        if digest_count == 0 || digest_count > self.max_count {
            return Err(DecodeError::InvalidDigestList {
                sequence_number,
                reason: format!("invalid digest count {}", digest_count),
            });
        }

        let mut seen = HashSet::new();
        let mut digests = Vec::with_capacity(digest_count as usize);
        for _ in 0..digest_count {
            let algorithm_id = reader.read_u16()?;
            let (algorithm, size) = self
                .declared
                .iter()
                .find(|(alg, _)| alg.id() == algorithm_id)
                .copied()
                .ok_or_else(|| {
                    DecodeError::UnsupportedAlgorithm(format!(
                        "0x{:04x} is not declared by the log header",
                        algorithm_id
                    ))
                })?;
            if !seen.insert(algorithm) {
                return Err(DecodeError::InvalidDigestList {
                    sequence_number,
                    reason: format!("algorithm {} appears more than once", algorithm),
                });
            }
            let value = reader.read_bytes(size as usize)?;
            digests.push(Digest::new(algorithm, value)?);
        }
        Ok(digests)
    }
}

/// True when the next four bytes are the firmware terminator
pub fn at_terminator(reader: &ByteReader<'_>) -> bool {
    matches!(reader.peek(4), Ok(bytes) if bytes == TERMINATOR_PCR.to_le_bytes())
}

/// Parse one record into an event numbered `sequence_number`
pub fn parse_event_entry(
    reader: &mut ByteReader<'_>,
    digest_parser: &dyn TcgDigestParse,
    sequence_number: u64,
    limits: &DecodeLimits,
) -> Result<Event, DecodeError> {
    let pcr_index = reader.read_u32()?;
    let event_type = reader.read_u32()?;
    let digests = digest_parser.parse_digests(reader, sequence_number)?;

    let event_size = reader.read_u32()?;
    if event_size as u64 > reader.remaining() {
        return Err(DecodeError::TruncatedRecord {
            offset: reader.position(),
            requested: event_size as u64,
            remaining: reader.remaining(),
        });
    }
    if event_size > limits.max_event_size {
        return Err(DecodeError::InvalidEventData(format!(
            "event {} ({}) declares {} bytes of data, limit is {}",
            sequence_number,
            event_type_name(event_type),
            event_size,
            limits.max_event_size
        )));
    }
    let event_data = reader.read_bytes(event_size as usize)?;

    Ok(Event {
        sequence_number,
        pcr_index,
        handle_kind: HandleKind::Pcr,
        digests,
        event_type: EventType::PcClient(event_type),
        event_data,
    })
}

/// Event size field of a record, or `FieldOverflow` when the data does not fit a u32
pub fn event_size(event: &Event) -> Result<u32, EncodeError> {
    u32::try_from(event.event_data.len()).map_err(|_| EncodeError::FieldOverflow {
        sequence_number: event.sequence_number,
        field: "event_size",
    })
}

/// Write a TCG_PCR_EVENT record
pub fn write_event_v1(
    writer: &mut ByteWriter,
    pcr_index: u32,
    event_type: u32,
    sha1: &[u8],
    data: &[u8],
) {
    writer.write_u32(pcr_index);
    writer.write_u32(event_type);
    writer.write_bytes(sha1);
    writer.write_u32(data.len() as u32);
    writer.write_bytes(data);
}

/// Write a TCG_PCR_EVENT2 record for a PC Client event
pub fn write_event_v2(
    writer: &mut ByteWriter,
    event: &Event,
    event_type: u32,
) -> Result<(), EncodeError> {
    let size = event_size(event)?;
    writer.write_u32(event.pcr_index);
    writer.write_u32(event_type);
    writer.write_u32(event.digests.len() as u32);
    for digest in &event.digests {
        writer.write_u16(digest.algorithm().id());
        writer.write_bytes(digest.value());
    }
    writer.write_u32(size);
    writer.write_bytes(&event.event_data);
    Ok(())
}

/// Reject events the TCG formats have no field for
pub fn pc_client_type(event: &Event) -> Result<u32, String> {
    if event.handle_kind != HandleKind::Pcr {
        return Err(format!("event {} targets an NV index", event.sequence_number));
    }
    match &event.event_type {
        EventType::PcClient(value) => Ok(*value),
        other => Err(format!("event {} has non PC Client type {}", event.sequence_number, other)),
    }
}
