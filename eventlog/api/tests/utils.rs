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

use openssl::sha::sha1;

/// Append a TCG_PCR_EVENT record
pub fn legacy_record(out: &mut Vec<u8>, pcr: u32, event_type: u32, sha1: &[u8; 20], data: &[u8]) {
    out.extend_from_slice(&pcr.to_le_bytes());
    out.extend_from_slice(&event_type.to_le_bytes());
    out.extend_from_slice(sha1);
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(data);
}

/// Start a crypto-agile log whose header declares SHA256 only
pub fn sha256_agile_header() -> Vec<u8> {
    let mut payload = b"Spec ID Event03\0".to_vec();
    payload.extend_from_slice(&0u32.to_le_bytes());
    payload.extend_from_slice(&[0, 2, 0, 2]);
    payload.extend_from_slice(&1u32.to_le_bytes());
    payload.extend_from_slice(&0x000bu16.to_le_bytes());
    payload.extend_from_slice(&32u16.to_le_bytes());
    payload.push(0);
    let mut out = Vec::new();
    legacy_record(&mut out, 0, 3, &[0u8; 20], &payload);
    out
}

/// Append a TCG_PCR_EVENT2 record carrying one SHA256 digest
pub fn sha256_record(out: &mut Vec<u8>, pcr: u32, event_type: u32, digest: &[u8; 32], data: &[u8]) {
    out.extend_from_slice(&pcr.to_le_bytes());
    out.extend_from_slice(&event_type.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&0x000bu16.to_le_bytes());
    out.extend_from_slice(digest);
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(data);
}

/// Legacy log with a version event in PCR0 and a separator in PCR7
pub fn legacy_log() -> Vec<u8> {
    let mut raw = Vec::new();
    legacy_record(&mut raw, 0, 0x8, &[0xaa; 20], b"1.0");
    legacy_record(&mut raw, 7, 0x4, &sha1(&[0, 0, 0, 0]), &[0, 0, 0, 0]);
    raw
}

/// Two-line ima-ng list with SHA1 template hashes
pub fn ima_ascii_log() -> String {
    [
        concat!(
            "10 91f34b5c671d73504b274a919661cf80dab1e127 ima-ng ",
            "sha1:1801e1be3e65ef1eaa5c16617bec8f1274eaf6b3 boot_aggregate",
        ),
        concat!(
            "10 8b1683287f61f96e5448a40ac3ee2c8c7c2b2fd0 ima-ng ",
            "sha256:6b4bd5b2d5d1a0b3a3ad7d3b9a2a0e1c2f6b3e4c2d1a0f9e8d7c6b5a49382716 ",
            "/usr/bin/bash",
        ),
    ]
    .join("\n")
}

pub const EV_SEPARATOR: u32 = 0x4;
pub const EV_NO_ACTION: u32 = 0x3;
pub const EV_S_CRTM_VERSION: u32 = 0x8;
pub const EV_EFI_ACTION: u32 = 0x80000007;
pub const EV_EFI_VARIABLE_BOOT: u32 = 0x80000002;
pub const EV_EFI_BOOT_SERVICES_APPLICATION: u32 = 0x80000003;

/// UEFI_VARIABLE_DATA in the EFI_GLOBAL_VARIABLE namespace
pub fn variable_payload(name: &str, data: &[u8]) -> Vec<u8> {
    let mut out = vec![
        0x61, 0xdf, 0xe4, 0x8b, 0xca, 0x93, 0xd2, 0x11,
        0xaa, 0x0d, 0x00, 0xe0, 0x98, 0x03, 0x2b, 0x8c,
    ];
    out.extend_from_slice(&(name.encode_utf16().count() as u64).to_le_bytes());
    out.extend_from_slice(&(data.len() as u64).to_le_bytes());
    out.extend(name.encode_utf16().flat_map(|unit| unit.to_le_bytes()));
    out.extend_from_slice(data);
    out
}
