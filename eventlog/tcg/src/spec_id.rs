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

//! TCG_EfiSpecIdEvent, the payload of the first record of a crypto-agile log

use std::collections::HashSet;

use eventlog_common::algorithm::DigestAlgorithm;
use eventlog_common::byte_reader::{ByteParseable, ByteReader};
use eventlog_common::byte_writer::ByteWriter;
use eventlog_common::error::{DecodeError, EncodeError};
use eventlog_common::model::SpecIdHeader;

pub const SPEC_ID_SIGNATURE_SIZE: usize = 16;

/// "Spec ID Event03\0"
pub const SPEC_ID_EVENT_SIGNATURE_03: &[u8; SPEC_ID_SIGNATURE_SIZE] = b"Spec ID Event03\0";

/// "Spec ID Event00\0", written by TPM 1.2 firmware
pub const SPEC_ID_EVENT_SIGNATURE_00: &[u8; SPEC_ID_SIGNATURE_SIZE] = b"Spec ID Event00\0";

/// Header body following the signature
pub struct SpecIdBody(pub SpecIdHeader);

impl ByteParseable for SpecIdBody {
    fn parse_from(parser: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        let platform_class = parser.read_u32()?;
        let spec_version_minor = parser.read_u8()?;
        let spec_version_major = parser.read_u8()?;
        let spec_errata = parser.read_u8()?;
        let uintn_size = parser.read_u8()?;

        let algorithm_count = parser.read_u32()?;
        if algorithm_count == 0 {
            return Err(DecodeError::InvalidHeader(
                "header declares no digest algorithms".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut algorithms =
            Vec::with_capacity((algorithm_count as usize).min(parser.remaining() as usize / 4));
        for _ in 0..algorithm_count {
            let algorithm_id = parser.read_u16()?;
            let digest_size = parser.read_u16()?;
            let algorithm = DigestAlgorithm::from_id(algorithm_id)?;
            if digest_size as usize != algorithm.digest_size() {
                return Err(DecodeError::DigestLengthMismatch {
                    algorithm: algorithm.to_string(),
                    expected: algorithm.digest_size(),
                    actual: digest_size as usize,
                });
            }
            if !seen.insert(algorithm) {
                return Err(DecodeError::InvalidHeader(format!(
                    "algorithm {} declared twice",
                    algorithm
                )));
            }
            algorithms.push((algorithm, digest_size));
        }

        let vendor_info_size = parser.read_u8()?;
        let vendor_info = parser.read_bytes(vendor_info_size as usize)?;

        Ok(SpecIdBody(SpecIdHeader {
            platform_class,
            spec_version_minor,
            spec_version_major,
            spec_errata,
            uintn_size,
            algorithms,
            vendor_info,
        }))
    }
}

/// Parse a complete TCG_EfiSpecIdEvent payload, signature included
///
/// # Errors
/// * `InvalidHeader` when the signature is not "Spec ID Event03"
/// * `UnsupportedAlgorithm` or `DigestLengthMismatch` for bad algorithm declarations
pub fn parse_spec_id_event(data: &[u8]) -> Result<SpecIdHeader, DecodeError> {
    let mut parser = ByteReader::new(data);
    let signature = parser.read_slice(SPEC_ID_SIGNATURE_SIZE).map_err(|_| {
        DecodeError::InvalidHeader("first record is too short for a Spec ID event".to_string())
    })?;
    if signature == SPEC_ID_EVENT_SIGNATURE_00 {
        return Err(DecodeError::InvalidHeader("Spec ID Event00 marks a SHA1-only log".to_string()));
    }
    if signature != SPEC_ID_EVENT_SIGNATURE_03 {
        return Err(DecodeError::InvalidHeader(format!(
            "unexpected signature {:?}",
            String::from_utf8_lossy(signature).trim_end_matches('\0')
        )));
    }
    SpecIdBody::parse_from(&mut parser).map(|body| body.0)
}

/// Serialize a header into a TCG_EfiSpecIdEvent payload
///
/// # Errors
/// * `FieldOverflow` when the vendor info does not fit its one byte size field
pub fn spec_id_event_bytes(header: &SpecIdHeader) -> Result<Vec<u8>, EncodeError> {
    let vendor_info_size = u8::try_from(header.vendor_info.len())
        .map_err(|_| EncodeError::FieldOverflow { sequence_number: 0, field: "vendor_info_size" })?;

    let mut writer = ByteWriter::new();
    writer.write_bytes(SPEC_ID_EVENT_SIGNATURE_03);
    writer.write_u32(header.platform_class);
    writer.write_u8(header.spec_version_minor);
    writer.write_u8(header.spec_version_major);
    writer.write_u8(header.spec_errata);
    writer.write_u8(header.uintn_size);
    writer.write_u32(header.algorithms.len() as u32);
    for (algorithm, size) in &header.algorithms {
        writer.write_u16(algorithm.id());
        writer.write_u16(*size);
    }
    writer.write_u8(vendor_info_size);
    writer.write_bytes(&header.vendor_info);
    Ok(writer.into_inner())
}
