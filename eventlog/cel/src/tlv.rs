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


//! Type-length-value primitives
//!
//! A TLV is a one byte type, a big-endian u32 length and `length` value bytes. Integer values
//! are big-endian and may use fewer bytes than their maximum width.

use eventlog_common::byte_reader::ByteReader;
use eventlog_common::byte_writer::ByteWriter;
use eventlog_common::error::{DecodeError, EncodeError};

pub const TLV_HEADER_SIZE: u64 = 5;

/// Bounds-checked TLV reader over one container
pub struct TlvReader<'a> {
    reader: ByteReader<'a>,
    base: u64,
    depth: usize,
    max_depth: usize,
}

impl<'a> TlvReader<'a> {
    pub fn new(data: &'a [u8], max_depth: usize) -> Self {
        Self { reader: ByteReader::new(data), base: 0, depth: 1, max_depth }
    }

    /// Absolute offset of the cursor in the outermost buffer
    pub fn offset(&self) -> u64 {
        self.base + self.reader.position()
    }

    pub fn is_end(&self) -> bool {
        self.reader.is_end()
    }

    pub fn remaining(&self) -> u64 {
        self.reader.remaining()
    }

    pub fn malformed(&self, reason: impl Into<String>) -> DecodeError {
        DecodeError::MalformedTlv { offset: self.offset(), reason: reason.into() }
    }

    /// Read a type and length, failing if the type is not one of `expected`
    pub fn read_header(&mut self, expected: &[u8]) -> Result<(u8, u32), DecodeError> {
        if self.remaining() < TLV_HEADER_SIZE {
            return Err(self.malformed(format!(
                "TLV header needs {} bytes, {} remain",
                TLV_HEADER_SIZE,
                self.remaining()
            )));
        }
        let offset = self.offset();
        let tlv_type = self.reader.read_u8()?;
        if !expected.is_empty() && !expected.contains(&tlv_type) {
            return Err(DecodeError::MalformedTlv {
                offset,
                reason: format!("unexpected type {}, expected one of {:?}", tlv_type, expected),
            });
        }
        let length = self.reader.read_u32_be()?;
        Ok((tlv_type, length))
    }

    /// Borrow `length` value bytes
    pub fn read_value(&mut self, length: u32) -> Result<&'a [u8], DecodeError> {
        if u64::from(length) > self.remaining() {
            return Err(self.malformed(format!(
                "length {} overruns the {} remaining bytes",
                length,
                self.remaining()
            )));
        }
        self.reader.read_slice(length as usize)
    }

    /// Read a big-endian integer of `length` bytes, at most `max_size` wide
    pub fn read_int(&mut self, length: u32, max_size: usize) -> Result<u64, DecodeError> {
        if length as usize > max_size {
            return Err(
                self.malformed(format!("integer of {} bytes exceeds {} bytes", length, max_size))
            );
        }
        let value = self.read_value(length)?;
        Ok(value.iter().fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte)))
    }

    /// Reader over the next `length` bytes, one nesting level deeper
    pub fn nested(&mut self, length: u32) -> Result<TlvReader<'a>, DecodeError> {
        if self.depth >= self.max_depth {
            return Err(self.malformed(format!("nesting exceeds {} levels", self.max_depth)));
        }
        let base = self.offset();
        let value = self.read_value(length)?;
        Ok(TlvReader {
            reader: ByteReader::new(value),
            base,
            depth: self.depth + 1,
            max_depth: self.max_depth,
        })
    }

    /// Fail if the container holds unconsumed bytes
    pub fn finish(&self) -> Result<(), DecodeError> {
        if !self.is_end() {
            return Err(self.malformed(format!("{} bytes not consumed", self.remaining())));
        }
        Ok(())
    }
}

/// Collects TLVs into a container
#[derive(Debug, Default)]
pub struct TlvWriter {
    writer: ByteWriter,
}

impl TlvWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_tlv(&mut self, tlv_type: u8, value: &[u8]) -> Result<(), EncodeError> {
        let length = u32::try_from(value.len()).map_err(|_| {
            EncodeError::Serialization(format!(
                "TLV of type {} holds {} bytes",
                tlv_type,
                value.len()
            ))
        })?;
        self.writer.write_u8(tlv_type);
        self.writer.write_u32_be(length);
        self.writer.write_bytes(value);
        Ok(())
    }

    /// Write an integer as exactly `size` big-endian bytes
    pub fn write_int(&mut self, tlv_type: u8, value: u64, size: usize) -> Result<(), EncodeError> {
        let mut value_writer = ByteWriter::new();
        value_writer.write_uint_be(value, size);
        self.write_tlv(tlv_type, &value_writer.into_inner())
    }

    /// Write a container TLV whose value is another writer's content
    pub fn write_nested(&mut self, tlv_type: u8, nested: TlvWriter) -> Result<(), EncodeError> {
        self.write_tlv(tlv_type, &nested.into_inner())
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}
