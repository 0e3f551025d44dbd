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

pub const SHA1: u8 = 0x04;
pub const SHA256: u8 = 0x0b;

pub fn tlv(tlv_type: u8, value: &[u8]) -> Vec<u8> {
    let mut out = vec![tlv_type];
    out.extend_from_slice(&(value.len() as u32).to_be_bytes());
    out.extend_from_slice(value);
    out
}

/// Integer TLV using the low `size` big-endian bytes of `value`
pub fn int_tlv(tlv_type: u8, value: u64, size: usize) -> Vec<u8> {
    tlv(tlv_type, &value.to_be_bytes()[8 - size..])
}

pub fn digests_tlv(digests: &[(u8, Vec<u8>)]) -> Vec<u8> {
    let body: Vec<u8> = digests.iter().flat_map(|(alg, value)| tlv(*alg, value)).collect();
    tlv(3, &body)
}

/// A full record: recnum, handle, digests, content
pub fn record(
    recnum: u64,
    handle: (u8, u32),
    digests: &[(u8, Vec<u8>)],
    content: Vec<u8>,
) -> Vec<u8> {
    let mut out = int_tlv(0, recnum, 8);
    out.extend(int_tlv(handle.0, u64::from(handle.1), 4));
    out.extend(digests_tlv(digests));
    out.extend(content);
    out
}

pub fn sha1_zero() -> Vec<(u8, Vec<u8>)> {
    vec![(SHA1, vec![0u8; 20])]
}

pub fn pcclient_content(event_type: u32, data: &[u8]) -> Vec<u8> {
    let mut body = int_tlv(0, u64::from(event_type), 4);
    body.extend(tlv(1, data));
    tlv(5, &body)
}

pub fn ima_content(name: &str, data: &[u8]) -> Vec<u8> {
    let mut body = tlv(0, name.as_bytes());
    body.extend(tlv(1, data));
    tlv(7, &body)
}

pub fn management_content(management_type: u8, value: &[u8]) -> Vec<u8> {
    tlv(4, &tlv(management_type, value))
}

pub fn version_value(major: u16, minor: u16) -> Vec<u8> {
    let mut value = int_tlv(0, u64::from(major), 2);
    value.extend(int_tlv(1, u64::from(minor), 2));
    value
}
