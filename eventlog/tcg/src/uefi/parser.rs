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

//! PC Client payload parsers
//!
//! Every payload structure implements `ByteParseable`. UEFI variable events are dispatched on
//! both the event type and the variable name, so they have a dedicated entry point,
//! `parse_variable_event`.

use std::mem::size_of;

use eventlog_common::byte_reader::{ByteParseable, ByteReader, UEFI_GUID_SIZE};
use eventlog_common::error::DecodeError;
use eventlog_common::pcr::STARTUP_LOCALITY_SIGNATURE;

use crate::event_type::TcgEventType;
use crate::spec_id::{SpecIdBody, SPEC_ID_EVENT_SIGNATURE_03, SPEC_ID_SIGNATURE_SIZE};
use crate::uefi::device_path::parse_device_path;
use crate::uefi::model::{
    ActionEvent, BootOrderEvent, FirmwareBlobEvent, GptEvent, HandoffTable, HandoffTablesEvent,
    ImageLoadEvent, LoadOption, NoActionEvent, PartitionEntry, PartitionHeader, SCrtmVersionEvent,
    SeparatorEvent, SignatureData, SignatureList, TaggedEvent, UefiVariableData, UefiVariableEvent,
    VariableEvent, EFI_CERT_SHA256_GUID, EFI_CERT_X509_GUID, UEFI_PARTITION_ENTRY_MIN_SIZE,
    UEFI_PARTITION_NAME_UNITS,
};

const VAR_SECURE_BOOT: &str = "SecureBoot";
const VAR_DB: &str = "db";
const VAR_DBX: &str = "dbx";
const VAR_KEK: &str = "KEK";
const VAR_PK: &str = "PK";
const VAR_SBAT_LEVEL: &str = "SbatLevel";
const VAR_SHIM: &str = "shim";
const VAR_MOK_LIST_TRUSTED: &str = "MokListTrusted";
const VAR_BOOT_ORDER: &str = "BootOrder";
const VAR_BOOT_PREFIX: &str = "Boot";

// LOAD_OPTION_ACTIVE
const LOAD_OPTION_ACTIVE: u32 = 0x0000_0001;
// guid + list size + header size + signature size
const SIGNATURE_LIST_HEADER_SIZE: usize = UEFI_GUID_SIZE + size_of::<u32>() * 3;
const FIRMWARE_BLOB_SIZE: u64 = (size_of::<u64>() * 2) as u64;

fn to_usize(value: u64, field: &str) -> Result<usize, DecodeError> {
    usize::try_from(value).map_err(|_| {
        DecodeError::InvalidEventData(format!("{} {} does not fit in memory", field, value))
    })
}

fn rest(parser: &mut ByteReader<'_>) -> Result<Vec<u8>, DecodeError> {
    parser.read_bytes(parser.remaining() as usize)
}

impl ByteParseable for NoActionEvent {
    fn parse_from(parser: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        if parser.remaining() < SPEC_ID_SIGNATURE_SIZE as u64 {
            return Ok(NoActionEvent::Unknown { data: hex::encode(rest(parser)?) });
        }
        let signature = parser.peek(SPEC_ID_SIGNATURE_SIZE)?;
        if signature == SPEC_ID_EVENT_SIGNATURE_03 {
            parser.read_slice(SPEC_ID_SIGNATURE_SIZE)?;
            let body = SpecIdBody::parse_from(parser)?;
            Ok(NoActionEvent::SpecId(body.0))
        } else if signature == STARTUP_LOCALITY_SIGNATURE {
            parser.read_slice(SPEC_ID_SIGNATURE_SIZE)?;
            Ok(NoActionEvent::StartupLocality { locality: parser.read_u8()? })
        } else {
            Ok(NoActionEvent::Unknown { data: hex::encode(rest(parser)?) })
        }
    }
}

impl ByteParseable for SeparatorEvent {
    fn parse_from(parser: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        if parser.remaining() == size_of::<u32>() as u64 {
            Ok(SeparatorEvent::Value(parser.read_u32()?))
        } else {
            Ok(SeparatorEvent::Raw(hex::encode(rest(parser)?)))
        }
    }
}

impl ByteParseable for ActionEvent {
    /// Parses all remaining bytes as a string
    fn parse_from(parser: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        let value = rest(parser)?;
        Ok(ActionEvent {
            action: String::from_utf8_lossy(&value).trim_end_matches('\0').to_string(),
        })
    }
}

impl ByteParseable for TaggedEvent {
    fn parse_from(parser: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        let tagged_event_id = parser.read_u32()?;
        let tagged_event_data_size = parser.read_u32()?;
        let tagged_event_data = parser.read_bytes(tagged_event_data_size as usize)?;
        Ok(TaggedEvent { tagged_event_id, tagged_event_data: hex::encode(tagged_event_data) })
    }
}

impl ByteParseable for FirmwareBlobEvent {
    /// Version 1 (base, length), version 2 (description, base, length), or a plain description
    fn parse_from(parser: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        if parser.remaining() == FIRMWARE_BLOB_SIZE {
            return Ok(FirmwareBlobEvent::Blob {
                blob_base: parser.read_u64()?,
                blob_length: parser.read_u64()?,
            });
        }

        if parser.remaining() > FIRMWARE_BLOB_SIZE {
            let description_size = parser.peek(1)?[0] as u64;
            if parser.remaining() == 1 + description_size + FIRMWARE_BLOB_SIZE {
                parser.read_u8()?;
                let description = parser.read_bytes(description_size as usize)?;
                return Ok(FirmwareBlobEvent::Blob2 {
                    blob_description: String::from_utf8_lossy(&description)
                        .trim_end_matches('\0')
                        .to_string(),
                    blob_base: parser.read_u64()?,
                    blob_length: parser.read_u64()?,
                });
            }
        }

        let data = rest(parser)?;
        let description = String::from_utf8_lossy(&data).trim_end_matches('\0').to_string();
        Ok(FirmwareBlobEvent::Description(description))
    }
}

impl ByteParseable for SCrtmVersionEvent {
    fn parse_from(parser: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        if parser.remaining() as usize == UEFI_GUID_SIZE {
            Ok(SCrtmVersionEvent { version: parser.read_guid()? })
        } else {
            Ok(SCrtmVersionEvent { version: parser.read_ucs2_string()? })
        }
    }
}

impl ByteParseable for SignatureData {
    /// EFI_SIGNATURE_DATA filling the rest of the reader
    fn parse_from(parser: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        let signature_owner = parser.read_guid()?;
        let signature_data = rest(parser)?;
        Ok(SignatureData { signature_owner, signature_data: hex::encode(signature_data) })
    }
}

fn signature_kind(signature_type: &str) -> &'static str {
    match signature_type {
        EFI_CERT_X509_GUID => "x509",
        EFI_CERT_SHA256_GUID => "sha256",
        _ => "unknown",
    }
}

impl ByteParseable for SignatureList {
    fn parse_from(parser: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        let signature_type = parser.read_guid()?;
        let signature_list_size = parser.read_u32()?;
        let signature_header_size = parser.read_u32()?;
        let signature_size = parser.read_u32()?;
        let signature_header = parser.read_bytes(signature_header_size as usize)?;

        let prefix_size = SIGNATURE_LIST_HEADER_SIZE + signature_header_size as usize;
        if (signature_list_size as usize) < prefix_size
            || (signature_size as usize) < UEFI_GUID_SIZE
        {
            return Err(DecodeError::InvalidEventData(format!(
                "invalid signature list size {} or signature size {}",
                signature_list_size, signature_size
            )));
        }

        let body_size = signature_list_size as usize - prefix_size;
        if body_size % signature_size as usize != 0 {
            return Err(DecodeError::InvalidEventData(format!(
                "signature list body of {} bytes is not a multiple of signature size {}",
                body_size, signature_size
            )));
        }
        let signature_count = body_size / signature_size as usize;
        let mut signatures = Vec::with_capacity(
            signature_count.min(parser.remaining() as usize / signature_size as usize),
        );
        for _ in 0..signature_count {
            let entry = parser.read_slice(signature_size as usize)?;
            signatures.push(SignatureData::parse_from(&mut ByteReader::new(entry))?);
        }

        Ok(SignatureList {
            signature_kind: signature_kind(&signature_type),
            signature_type,
            signature_list_size,
            signature_header_size,
            signature_size,
            signature_header: hex::encode(signature_header),
            signatures,
        })
    }
}

impl ByteParseable for LoadOption {
    fn parse_from(parser: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        let attributes = parser.read_u32()?;
        let file_path_list_length = parser.read_u16()?;
        let description = parser.read_ucs2_string()?;
        let file_path_list = parse_device_path(parser.read_slice(file_path_list_length as usize)?)?;
        let optional_data = rest(parser)?;
        Ok(LoadOption {
            attributes,
            active: attributes & LOAD_OPTION_ACTIVE != 0,
            description,
            file_path_list,
            optional_data: hex::encode(optional_data),
        })
    }
}

fn is_boot_option(name: &str) -> bool {
    name.len() == VAR_BOOT_PREFIX.len() + 4
        && name.starts_with(VAR_BOOT_PREFIX)
        && name[VAR_BOOT_PREFIX.len()..].chars().all(|c| c.is_ascii_hexdigit())
}

fn parse_signature_lists(parser: &mut ByteReader<'_>) -> Result<UefiVariableData, DecodeError> {
    let mut lists = Vec::new();
    while !parser.is_end() {
        lists.push(SignatureList::parse_from(parser)?);
    }
    Ok(UefiVariableData::SignatureLists(lists))
}

fn parse_flag(parser: &mut ByteReader<'_>) -> Result<UefiVariableData, DecodeError> {
    Ok(UefiVariableData::SecureBoot { enabled: parser.read_u8()? == 1 })
}

fn raw(parser: &mut ByteReader<'_>) -> Result<UefiVariableData, DecodeError> {
    Ok(UefiVariableData::Raw(hex::encode(rest(parser)?)))
}

/// Parse a UEFI_VARIABLE_DATA payload
///
/// The variable content is interpreted by event type and variable name:
/// - driver config: SecureBoot, PK, KEK, db, dbx
/// - authority: SbatLevel, db, shim, MokListTrusted
/// - boot: BootOrder and Boot#### load options
///
/// Anything else keeps its content as hex.
///
/// # Errors
/// * `TruncatedRecord` when a length field runs past the payload
/// * `InvalidEventData` when a recognised variable is malformed
pub fn parse_variable_event(
    event_type: TcgEventType,
    parser: &mut ByteReader<'_>,
) -> Result<VariableEvent, DecodeError> {
    let variable_guid = parser.read_guid()?;
    // name length in UTF-16 code units, data length in bytes
    let unicode_name_length = to_usize(parser.read_u64()?, "unicode name length")?;
    let variable_data_length = to_usize(parser.read_u64()?, "variable data length")?;

    let name_bytes = parser.read_slice(unicode_name_length.saturating_mul(2))?;
    let name = ByteReader::new(name_bytes).read_unicode_name(unicode_name_length)?;
    let mut data_parser = ByteReader::new(parser.read_slice(variable_data_length)?);
    let data_parser = &mut data_parser;

    let data = match event_type {
        TcgEventType::EvEfiVariableDriverConfig => match name.as_str() {
            VAR_SECURE_BOOT => parse_flag(data_parser)?,
            VAR_PK | VAR_KEK | VAR_DB | VAR_DBX => parse_signature_lists(data_parser)?,
            _ => raw(data_parser)?,
        },
        TcgEventType::EvEfiVariableAuthority => match name.as_str() {
            VAR_SBAT_LEVEL => {
                let value = rest(data_parser)?;
                UefiVariableData::SbatLevel(String::from_utf8_lossy(&value).to_string())
            },
            VAR_DB | VAR_SHIM => {
                UefiVariableData::SignatureData(SignatureData::parse_from(data_parser)?)
            },
            VAR_MOK_LIST_TRUSTED => parse_flag(data_parser)?,
            _ => raw(data_parser)?,
        },
        TcgEventType::EvEfiVariableBoot | TcgEventType::EvEfiVariableBoot2 => match name.as_str() {
            VAR_BOOT_ORDER => {
                let mut entries = Vec::with_capacity(variable_data_length / 2);
                while data_parser.remaining() >= size_of::<u16>() as u64 {
                    entries.push(data_parser.read_u16()?);
                }
                return Ok(VariableEvent::BootOrder(BootOrderEvent { variable_guid, entries }));
            },
            option if is_boot_option(option) => {
                UefiVariableData::LoadOption(LoadOption::parse_from(data_parser)?)
            },
            _ => raw(data_parser)?,
        },
        _ => raw(data_parser)?,
    };

    Ok(VariableEvent::Variable(UefiVariableEvent { variable_guid, name, data }))
}

impl ByteParseable for ImageLoadEvent {
    fn parse_from(parser: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        let image_location_in_memory = parser.read_u64()?;
        let image_length_in_memory = parser.read_u64()?;
        let image_link_time_address = parser.read_u64()?;
        let length_of_device_path = to_usize(parser.read_u64()?, "device path length")?;
        let device_path = parse_device_path(parser.read_slice(length_of_device_path)?)?;
        Ok(ImageLoadEvent {
            image_location_in_memory,
            image_length_in_memory,
            image_link_time_address,
            device_path,
        })
    }
}

impl ByteParseable for PartitionHeader {
    fn parse_from(parser: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        let signature = String::from_utf8_lossy(parser.read_slice(size_of::<u64>())?).to_string();
        let revision = parser.read_u32()?;
        let header_size = parser.read_u32()?;
        let header_crc32 = parser.read_u32()?;
        let _reserved = parser.read_u32()?;
        Ok(PartitionHeader {
            signature,
            revision,
            header_size,
            header_crc32,
            my_lba: parser.read_u64()?,
            alternate_lba: parser.read_u64()?,
            first_usable_lba: parser.read_u64()?,
            last_usable_lba: parser.read_u64()?,
            disk_guid: parser.read_guid()?,
            partition_entries_lba: parser.read_u64()?,
            number_of_partition_entries: parser.read_u32()?,
            size_of_partition_entry: parser.read_u32()?,
            partition_entry_array_crc32: parser.read_u32()?,
        })
    }
}

impl ByteParseable for PartitionEntry {
    fn parse_from(parser: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        let partition_type_guid = parser.read_guid()?;
        let unique_partition_guid = parser.read_guid()?;
        let starting_lba = parser.read_u64()?;
        let ending_lba = parser.read_u64()?;
        let attributes = parser.read_u64()?;
        let name = parser.read_slice(UEFI_PARTITION_NAME_UNITS * 2)?;
        let partition_name = ByteReader::new(name).read_unicode_name(UEFI_PARTITION_NAME_UNITS)?;
        Ok(PartitionEntry {
            partition_type_guid,
            unique_partition_guid,
            starting_lba,
            ending_lba,
            attributes,
            partition_name,
        })
    }
}

impl ByteParseable for GptEvent {
    /// Partition entries are `size_of_partition_entry` bytes apart
    fn parse_from(parser: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        let header = PartitionHeader::parse_from(parser)?;
        let entry_size = header.size_of_partition_entry as usize;
        if entry_size < UEFI_PARTITION_ENTRY_MIN_SIZE {
            return Err(DecodeError::InvalidEventData(format!(
                "partition entry size {} is too small",
                entry_size
            )));
        }

        let number_of_partitions = to_usize(parser.read_u64()?, "partition count")?;
        let mut partitions =
            Vec::with_capacity(number_of_partitions.min(parser.remaining() as usize / entry_size));
        for _ in 0..number_of_partitions {
            let entry = parser.read_slice(entry_size)?;
            partitions.push(PartitionEntry::parse_from(&mut ByteReader::new(entry))?);
        }
        Ok(GptEvent { header, partitions })
    }
}

impl ByteParseable for HandoffTablesEvent {
    fn parse_from(parser: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        let number_of_tables = to_usize(parser.read_u64()?, "table count")?;
        let entry_size = UEFI_GUID_SIZE + size_of::<u64>();
        let mut tables =
            Vec::with_capacity(number_of_tables.min(parser.remaining() as usize / entry_size));
        for _ in 0..number_of_tables {
            tables.push(HandoffTable {
                vendor_guid: parser.read_guid()?,
                vendor_table: parser.read_u64()?,
            });
        }
        Ok(HandoffTablesEvent { tables })
    }
}

/// Parse a payload of type `T` from the whole of `data`
///
/// # Errors
/// * Returns `InvalidEventData` naming `event_name` when the payload does not parse
pub fn parse_typed_event<T: ByteParseable>(
    data: &[u8],
    event_name: &str,
) -> Result<T, DecodeError> {
    let mut parser = ByteReader::new(data);
    T::parse_from(&mut parser).map_err(|e| {
        DecodeError::InvalidEventData(format!("Failed to parse {}: {}", event_name, e))
    })
}
