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

//! UEFI device path nodes
//!
//! A device path is a packed list of nodes, each starting with type (u8), subtype (u8) and a
//! u16 length that includes the four header bytes. Node types without a parser here are kept
//! as `Unknown` with their raw payload.

use serde::Serialize;
use uuid::Uuid;

use eventlog_common::byte_reader::{ByteReader, UEFI_GUID_SIZE};
use eventlog_common::error::DecodeError;

const NODE_HEADER_SIZE: u16 = 4;

const TYPE_HARDWARE: u8 = 0x01;
const TYPE_ACPI: u8 = 0x02;
const TYPE_MESSAGING: u8 = 0x03;
const TYPE_MEDIA: u8 = 0x04;
const TYPE_END: u8 = 0x7F;

const SUBTYPE_PCI: u8 = 0x01;
const SUBTYPE_ACPI: u8 = 0x01;
const SUBTYPE_NVME_NAMESPACE: u8 = 0x17;
const SUBTYPE_HARD_DRIVE: u8 = 0x01;
const SUBTYPE_FILE_PATH: u8 = 0x04;

const SIGNATURE_TYPE_MBR: u8 = 0x01;
const SIGNATURE_TYPE_GUID: u8 = 0x02;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DevicePathNode {
    Acpi { hid: u32, uid: u32 },
    Pci { function: u8, device: u8 },
    NvmeNamespace { namespace_id: u32, eui64: u64 },
    HardDrive {
        partition_number: u32,
        partition_start: u64,
        partition_size: u64,
        signature: Option<String>,
        mbr_type: u8,
        signature_type: u8,
    },
    FilePath { path: String },
    End { subtype: u8 },
    Unknown { device_type: u8, subtype: u8, data: String },
}

fn parse_hard_drive(parser: &mut ByteReader<'_>) -> Result<DevicePathNode, DecodeError> {
    let partition_number = parser.read_u32()?;
    let partition_start = parser.read_u64()?;
    let partition_size = parser.read_u64()?;
    let raw_signature = parser.read_slice(UEFI_GUID_SIZE)?;
    let mbr_type = parser.read_u8()?;
    let signature_type = parser.read_u8()?;

    let signature = match signature_type {
        SIGNATURE_TYPE_MBR => Some(format!(
            "{:08x}",
            u32::from_be_bytes([
                raw_signature[0],
                raw_signature[1],
                raw_signature[2],
                raw_signature[3]
            ])
        )),
        SIGNATURE_TYPE_GUID => {
            let mut guid = [0u8; UEFI_GUID_SIZE];
            guid.copy_from_slice(raw_signature);
            Some(Uuid::from_bytes_le(guid).to_string())
        },
        _ => None,
    };

    Ok(DevicePathNode::HardDrive {
        partition_number,
        partition_start,
        partition_size,
        signature,
        mbr_type,
        signature_type,
    })
}

fn parse_node(device_type: u8, subtype: u8, body: &[u8]) -> Result<DevicePathNode, DecodeError> {
    let mut parser = ByteReader::new(body);
    let node = match (device_type, subtype) {
        (TYPE_ACPI, SUBTYPE_ACPI) => DevicePathNode::Acpi {
            hid: parser.read_u32()?,
            uid: parser.read_u32()?,
        },
        (TYPE_HARDWARE, SUBTYPE_PCI) => DevicePathNode::Pci {
            function: parser.read_u8()?,
            device: parser.read_u8()?,
        },
        (TYPE_MESSAGING, SUBTYPE_NVME_NAMESPACE) => DevicePathNode::NvmeNamespace {
            namespace_id: parser.read_u32()?,
            eui64: parser.read_u64()?,
        },
        (TYPE_MEDIA, SUBTYPE_HARD_DRIVE) => parse_hard_drive(&mut parser)?,
        (TYPE_MEDIA, SUBTYPE_FILE_PATH) => {
            DevicePathNode::FilePath { path: parser.read_ucs2_string()? }
        },
        (TYPE_END, _) => DevicePathNode::End { subtype },
        _ => DevicePathNode::Unknown { device_type, subtype, data: hex::encode(body) },
    };
    Ok(node)
}

/// Parse a packed device path into its nodes
///
/// # Errors
/// * `InvalidEventData` when a node declares a length shorter than its own header
/// * `TruncatedRecord` when a node runs past the end of `data`
pub fn parse_device_path(data: &[u8]) -> Result<Vec<DevicePathNode>, DecodeError> {
    let mut parser = ByteReader::new(data);
    let mut nodes = Vec::new();
    while !parser.is_end() {
        let device_type = parser.read_u8()?;
        let subtype = parser.read_u8()?;
        let length = parser.read_u16()?;
        if length < NODE_HEADER_SIZE {
            return Err(DecodeError::InvalidEventData(format!(
                "device path node {:#04x}/{:#04x} declares length {}",
                device_type, subtype, length
            )));
        }
        let body = parser.read_slice((length - NODE_HEADER_SIZE) as usize)?;
        nodes.push(parse_node(device_type, subtype, body)?);
    }
    Ok(nodes)
}
