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

//! Byte Reader Module
//!
//! Bounds-checked reading of binary event log records. Every read verifies the number of
//! remaining bytes before touching the buffer, so a corrupted length field surfaces as
//! `DecodeError::TruncatedRecord` instead of a panic or an oversized allocation.
//!
//! The module contains two main components:
//! - `ByteReader`: cursor over a byte slice with little-endian and big-endian readers
//! - `ByteParseable`: types implementing this trait can be parsed directly from a `ByteReader`

use std::io::{Cursor, Read};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use uuid::Uuid;

use crate::error::DecodeError;

/// UEFI GUID size
pub const UEFI_GUID_SIZE: usize = 16;

/// Binary data parsing helper
pub struct ByteReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

/// Trait for types that can be parsed from a byte stream
///
/// # Example
///
/// ```rust ignore
/// use eventlog_common::byte_reader::{ByteReader, ByteParseable};
/// use eventlog_common::error::DecodeError;
///
/// struct MyStruct {
///     field1: u32,
///     field2: String,
/// }
///
/// impl ByteParseable for MyStruct {
///     fn parse_from(parser: &mut ByteReader) -> Result<Self, DecodeError> {
///         let field1 = parser.read_u32()?;
///         let field2 = parser.read_string(16)?;
///         Ok(Self { field1, field2 })
///     }
/// }
/// ```
pub trait ByteParseable: Sized {
    /// Parse an instance of the current type from a byte reader
    ///
    /// # Errors
    ///
    /// Returns a DecodeError when the byte stream contains insufficient data or is incorrectly
    /// formatted
    fn parse_from(parser: &mut ByteReader<'_>) -> Result<Self, DecodeError>;
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    /// Current reading position (byte offset)
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    /// Move the cursor
    ///
    /// # Errors
    /// * Returns an error when the position exceeds the data range
    pub fn set_position(&mut self, pos: u64) -> Result<(), DecodeError> {
        if pos > self.get_length() {
            return Err(self.truncated(pos.saturating_sub(self.position())));
        }
        self.cursor.set_position(pos);
        Ok(())
    }

    /// Number of unread bytes remaining
    pub fn remaining(&self) -> u64 {
        self.get_length().saturating_sub(self.cursor.position())
    }

    fn truncated(&self, requested: u64) -> DecodeError {
        DecodeError::TruncatedRecord {
            offset: self.position(),
            requested,
            remaining: self.remaining(),
        }
    }

    fn ensure(&self, requested: u64) -> Result<(), DecodeError> {
        if requested > self.remaining() {
            return Err(self.truncated(requested));
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        self.ensure(1)?;
        self.cursor.read_u8().map_err(|_| self.truncated(1))
    }

    /// Read a u16 value (little-endian)
    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        self.ensure(2)?;
        self.cursor.read_u16::<LittleEndian>().map_err(|_| self.truncated(2))
    }

    /// Read a u32 value (little-endian)
    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        self.ensure(4)?;
        self.cursor.read_u32::<LittleEndian>().map_err(|_| self.truncated(4))
    }

    /// Read a u64 value (little-endian)
    pub fn read_u64(&mut self) -> Result<u64, DecodeError> {
        self.ensure(8)?;
        self.cursor.read_u64::<LittleEndian>().map_err(|_| self.truncated(8))
    }

    /// Read a u32 value (big-endian)
    pub fn read_u32_be(&mut self) -> Result<u32, DecodeError> {
        self.ensure(4)?;
        self.cursor.read_u32::<BigEndian>().map_err(|_| self.truncated(4))
    }

    /// Read bytes of specified length
    ///
    /// # Errors
    /// * Returns `TruncatedRecord` when the requested number of bytes exceeds the remaining bytes
    pub fn read_bytes(&mut self, length: usize) -> Result<Vec<u8>, DecodeError> {
        self.ensure(length as u64)?;
        let mut buffer: Vec<u8> = vec![0u8; length];
        self.cursor.read_exact(&mut buffer).map_err(|_| self.truncated(length as u64))?;
        Ok(buffer)
    }

    /// Borrow the next `length` bytes without copying and advance past them
    pub fn read_slice(&mut self, length: usize) -> Result<&'a [u8], DecodeError> {
        self.ensure(length as u64)?;
        let start = self.position() as usize;
        let data: &'a [u8] = *self.cursor.get_ref();
        self.cursor.set_position((start + length) as u64);
        Ok(&data[start..start + length])
    }

    /// Look at the next `length` bytes without moving the cursor
    pub fn peek(&self, length: usize) -> Result<&'a [u8], DecodeError> {
        self.ensure(length as u64)?;
        let start = self.position() as usize;
        let data: &'a [u8] = *self.cursor.get_ref();
        Ok(&data[start..start + length])
    }

    /// Read a UTF-8 string of `length` bytes
    pub fn read_string(&mut self, length: usize) -> Result<String, DecodeError> {
        let bytes: Vec<u8> = self.read_bytes(length)?;
        String::from_utf8(bytes).map_err(|e| {
            DecodeError::InvalidEventData(format!("Failed to convert to UTF-8 string: {}", e))
        })
    }

    /// Read a little-endian encoded GUID and format it in registry form
    pub fn read_guid(&mut self) -> Result<String, DecodeError> {
        let raw = self.read_bytes(UEFI_GUID_SIZE)?;
        let mut guid_bytes: [u8; UEFI_GUID_SIZE] = [0; UEFI_GUID_SIZE];
        guid_bytes.copy_from_slice(&raw);
        Ok(Uuid::from_bytes_le(guid_bytes).to_string())
    }

    /// Read up to `length` UTF-16LE code units, stopping early at a NUL character
    pub fn read_unicode_name(&mut self, length: usize) -> Result<String, DecodeError> {
        let mut units: Vec<u16> = Vec::with_capacity(length.min(self.remaining() as usize / 2));
        for _ in 0..length {
            let unit = self.read_u16()?;
            if unit == 0 {
                break;
            }
            units.push(unit);
        }
        Ok(String::from_utf16_lossy(&units))
    }

    /// Read characters until a NUL byte or `max_length` bytes, consuming the NUL
    pub fn read_null_terminated_string(
        &mut self,
        max_length: usize,
    ) -> Result<String, DecodeError> {
        let data: &'a [u8] = *self.cursor.get_ref();
        let start = self.position() as usize;
        let limit = data.len().min(start.saturating_add(max_length));
        let end = data[start..limit]
            .iter()
            .position(|b| *b == 0)
            .map(|offset| start + offset)
            .unwrap_or(limit);

        let next = if end < data.len() && data[end] == 0 { end + 1 } else { end };
        self.cursor.set_position(next as u64);

        String::from_utf8(data[start..end].to_vec())
            .map_err(|e| DecodeError::InvalidEventData(format!("Invalid UTF-8 sequence: {}", e)))
    }

    /// Read a UCS-2 string running to a NUL code unit or the end of data
    pub fn read_ucs2_string(&mut self) -> Result<String, DecodeError> {
        let mut unicode_str = String::new();
        while self.remaining() >= 2 {
            let code_unit = self.read_u16()?;
            if code_unit == 0 {
                break;
            }
            unicode_str.push(char::from_u32(code_unit as u32).unwrap_or('\u{FFFD}'));
        }
        Ok(unicode_str)
    }

    pub fn is_end(&self) -> bool {
        self.cursor.position() >= self.get_length()
    }

    /// Total data length
    pub fn get_length(&self) -> u64 {
        self.cursor.get_ref().len() as u64
    }
}
