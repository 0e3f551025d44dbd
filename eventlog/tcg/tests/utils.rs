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

#![allow(dead_code)]

/// Append a TCG_PCR_EVENT record
pub fn legacy_record(out: &mut Vec<u8>, pcr: u32, event_type: u32, sha1: &[u8; 20], data: &[u8]) {
    out.extend_from_slice(&pcr.to_le_bytes());
    out.extend_from_slice(&event_type.to_le_bytes());
    out.extend_from_slice(sha1);
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(data);
}

/// Build a TCG_EfiSpecIdEvent payload declaring `algorithms` as (id, size) pairs
pub fn spec_id_payload(algorithms: &[(u16, u16)]) -> Vec<u8> {
    let mut data = b"Spec ID Event03\0".to_vec();
    data.extend_from_slice(&0u32.to_le_bytes());
    data.extend_from_slice(&[0, 2, 0, 2]);
    data.extend_from_slice(&(algorithms.len() as u32).to_le_bytes());
    for (id, size) in algorithms {
        data.extend_from_slice(&id.to_le_bytes());
        data.extend_from_slice(&size.to_le_bytes());
    }
    data.push(0);
    data
}

/// Start a crypto-agile log with its header record
pub fn crypto_agile_header(algorithms: &[(u16, u16)]) -> Vec<u8> {
    let mut out = Vec::new();
    legacy_record(&mut out, 0, 3, &[0u8; 20], &spec_id_payload(algorithms));
    out
}

/// Append a TCG_PCR_EVENT2 record
pub fn agile_record(
    out: &mut Vec<u8>,
    pcr: u32,
    event_type: u32,
    digests: &[(u16, Vec<u8>)],
    data: &[u8],
) {
    out.extend_from_slice(&pcr.to_le_bytes());
    out.extend_from_slice(&event_type.to_le_bytes());
    out.extend_from_slice(&(digests.len() as u32).to_le_bytes());
    for (id, value) in digests {
        out.extend_from_slice(&id.to_le_bytes());
        out.extend_from_slice(value);
    }
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(data);
}

/// UTF-16LE encoding without terminator
pub fn utf16(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(|unit| unit.to_le_bytes()).collect()
}

/// EFI_GLOBAL_VARIABLE in its little-endian on-disk layout
pub fn global_variable_guid() -> Vec<u8> {
    vec![
        0x61, 0xdf, 0xe4, 0x8b, 0xca, 0x93, 0xd2, 0x11,
        0xaa, 0x0d, 0x00, 0xe0, 0x98, 0x03, 0x2b, 0x8c,
    ]
}

/// UEFI_VARIABLE_DATA for the global variable namespace
pub fn variable_payload(name: &str, data: &[u8]) -> Vec<u8> {
    let mut out = global_variable_guid();
    out.extend_from_slice(&(name.encode_utf16().count() as u64).to_le_bytes());
    out.extend_from_slice(&(data.len() as u64).to_le_bytes());
    out.extend_from_slice(&utf16(name));
    out.extend_from_slice(data);
    out
}

/// A single device path node
pub fn device_path_node(device_type: u8, subtype: u8, body: &[u8]) -> Vec<u8> {
    let mut out = vec![device_type, subtype];
    out.extend_from_slice(&((body.len() + 4) as u16).to_le_bytes());
    out.extend_from_slice(body);
    out
}

pub fn end_node() -> Vec<u8> {
    device_path_node(0x7f, 0xff, &[])
}
