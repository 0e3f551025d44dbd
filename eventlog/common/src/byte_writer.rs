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

//! Append-only buffer used by the format encoders.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        let mut raw = [0u8; 2];
        LittleEndian::write_u16(&mut raw, value);
        self.buf.extend_from_slice(&raw);
    }

    pub fn write_u32(&mut self, value: u32) {
        let mut raw = [0u8; 4];
        LittleEndian::write_u32(&mut raw, value);
        self.buf.extend_from_slice(&raw);
    }

    pub fn write_u64(&mut self, value: u64) {
        let mut raw = [0u8; 8];
        LittleEndian::write_u64(&mut raw, value);
        self.buf.extend_from_slice(&raw);
    }

    pub fn write_u32_be(&mut self, value: u32) {
        let mut raw = [0u8; 4];
        BigEndian::write_u32(&mut raw, value);
        self.buf.extend_from_slice(&raw);
    }

    /// Write the low `size` bytes of `value` in big-endian order
    pub fn write_uint_be(&mut self, value: u64, size: usize) {
        let mut raw = [0u8; 8];
        BigEndian::write_u64(&mut raw, value);
        self.buf.extend_from_slice(&raw[8 - size.min(8)..]);
    }

    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}
