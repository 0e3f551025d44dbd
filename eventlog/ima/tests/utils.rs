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

/// Append one length-prefixed template field
pub fn push_field(out: &mut Vec<u8>, value: &[u8]) {
    out.extend_from_slice(&(value.len() as u32).to_le_bytes());
    out.extend_from_slice(value);
}

/// ima-ng template data built field by field
pub fn ima_ng_data(algorithm: &str, digest: &[u8], path: &str) -> Vec<u8> {
    let mut digest_field = format!("{}:", algorithm).into_bytes();
    digest_field.push(0);
    digest_field.extend_from_slice(digest);
    let mut name_field = path.as_bytes().to_vec();
    name_field.push(0);

    let mut out = Vec::new();
    push_field(&mut out, &digest_field);
    push_field(&mut out, &name_field);
    out
}

/// One binary_runtime_measurements record
pub fn binary_record(
    out: &mut Vec<u8>,
    pcr: u32,
    template_hash: &[u8],
    template_name: &str,
    data: &[u8],
) {
    out.extend_from_slice(&pcr.to_le_bytes());
    out.extend_from_slice(template_hash);
    out.extend_from_slice(&(template_name.len() as u32).to_le_bytes());
    out.extend_from_slice(template_name.as_bytes());
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(data);
}

/// One `ima` template record as the kernel writes it: raw digest, then the unterminated name
pub fn ima_template_record(
    out: &mut Vec<u8>,
    pcr: u32,
    template_hash: &[u8],
    file_digest: &[u8; 20],
    path: &str,
) {
    out.extend_from_slice(&pcr.to_le_bytes());
    out.extend_from_slice(template_hash);
    out.extend_from_slice(&3u32.to_le_bytes());
    out.extend_from_slice(b"ima");
    out.extend_from_slice(file_digest);
    out.extend_from_slice(&(path.len() as u32).to_le_bytes());
    out.extend_from_slice(path.as_bytes());
}

pub const BASH_DIGEST: &str = "6b4bd5b2d5d1a0b3a3ad7d3b9a2a0e1c2f6b3e4c2d1a0f9e8d7c6b5a49382716";
