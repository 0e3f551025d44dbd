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

//! IMA runtime measurement lists in their ASCII and binary forms

use std::str;

use log::debug;
use serde::Deserialize;

use eventlog_common::algorithm::{Digest, DigestAlgorithm};
use eventlog_common::byte_reader::ByteReader;
use eventlog_common::byte_writer::ByteWriter;
use eventlog_common::codec::{DecodeLimits, EventLogCodec};
use eventlog_common::error::{DecodeError, EncodeError};
use eventlog_common::model::{Event, EventLog, EventType, HandleKind, LogFormat};

use crate::template::{
    digest_ng_value, digest_ngv2_value, join_template_data, lookup_template, name_value,
    split_template_data, ImaMeasurement, TemplateField,
};

/// Templates whose fields all have a textual rendering
const ASCII_TEMPLATES: [&str; 6] =
    ["ima", "ima-ng", "ima-ngv2", "ima-sig", "ima-sigv2", "ima-buf"];

/// The `ima` template's binary records omit the template data length
const IMA_TEMPLATE: &str = "ima";

/// Size of the `d` field of the `ima` template
const IMA_DIGEST_SIZE: usize = 20;

/// First byte of an IMA signature: EVM_IMA_XATTR_DIGSIG or IMA_VERITY_DIGSIG
const SIGNATURE_HEADERS: [u8; 2] = [0x03, 0x06];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ImaOptions {
    /// Algorithm of the template hash column, fixed per kernel configuration
    pub template_hash_algorithm: DigestAlgorithm,
}

impl Default for ImaOptions {
    fn default() -> Self {
        Self { template_hash_algorithm: DigestAlgorithm::Sha1 }
    }
}

fn malformed(line: usize, reason: impl Into<String>) -> DecodeError {
    DecodeError::MalformedLine { line, reason: reason.into() }
}

/// Records one template per log instance
#[derive(Default)]
struct TemplateGuard {
    first: Option<String>,
}

impl TemplateGuard {
    fn check(&mut self, template_name: &str, line: usize) -> Result<(), DecodeError> {
        match &self.first {
            None => {
                self.first = Some(template_name.to_string());
                Ok(())
            },
            Some(first) if first == template_name => Ok(()),
            Some(first) => Err(malformed(
                line,
                format!("template {} differs from the log's template {}", template_name, first),
            )),
        }
    }
}

fn decode_hex(what: &str, text: &str) -> Result<Vec<u8>, String> {
    hex::decode(text).map_err(|e| format!("invalid {} hex {:?}: {}", what, text, e))
}

fn ng_digest(text: &str) -> Result<Vec<u8>, String> {
    match text.split_once(':') {
        Some((algorithm, digest)) if !algorithm.is_empty() => {
            Ok(digest_ng_value(algorithm, &decode_hex("file digest", digest)?))
        },
        _ => Err(format!("file digest {:?} is not <algorithm>:<hex>", text)),
    }
}

fn ngv2_digest(text: &str) -> Result<Vec<u8>, String> {
    let mut parts = text.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(digest_type), Some(algorithm), Some(digest))
            if !digest_type.is_empty() && !algorithm.is_empty() =>
        {
            Ok(digest_ngv2_value(digest_type, algorithm, &decode_hex("file digest", digest)?))
        },
        _ => Err(format!("file digest {:?} is not <type>:<algorithm>:<hex>", text)),
    }
}

/// Split off the next space separated column
fn next_column(text: &str) -> (&str, &str) {
    text.split_once(' ').unwrap_or((text, ""))
}

/// Split `<path> <signature>` when the last word is hex with a signature header
///
/// Names are printed raw, so any other last word belongs to the name.
fn trailing_signature(rest: &str) -> Option<(&str, Vec<u8>)> {
    let (name, tail) = rest.rsplit_once(' ')?;
    let signature = hex::decode(tail).ok()?;
    match signature.first() {
        Some(header) if SIGNATURE_HEADERS.contains(header) && !name.is_empty() => {
            Some((name, signature))
        },
        _ => None,
    }
}

/// Build template data from the file digest column and the rest of an ASCII line
fn ascii_template_data(template_name: &str, digest: &str, rest: &str) -> Result<Vec<u8>, String> {
    if rest.is_empty() {
        return Err(format!("{} line has no name", template_name));
    }
    let values: Vec<Vec<u8>> = match template_name {
        "ima" => vec![decode_hex("file digest", digest)?, name_value(rest)],
        "ima-ng" => vec![ng_digest(digest)?, name_value(rest)],
        "ima-ngv2" => vec![ngv2_digest(digest)?, name_value(rest)],
        "ima-sig" | "ima-sigv2" => {
            let file_digest =
                if template_name == "ima-sig" { ng_digest(digest)? } else { ngv2_digest(digest)? };
            let (name, signature) = trailing_signature(rest).unwrap_or((rest, Vec::new()));
            vec![file_digest, name_value(name), signature]
        },
        "ima-buf" => {
            let (name, buffer) =
                rest.rsplit_once(' ').ok_or_else(|| "ima-buf line has no buffer".to_string())?;
            vec![ng_digest(digest)?, name_value(name), decode_hex("buffer", buffer)?]
        },
        name => return Err(format!("unsupported template {:?}", name)),
    };
    Ok(join_template_data(&values))
}

/// Render template data as the template fields of an ASCII line
fn ascii_fields(template_name: &str, data: &[u8]) -> Result<Vec<String>, String> {
    if !ASCII_TEMPLATES.contains(&template_name) {
        return Err(format!("template {} has no ASCII form", template_name));
    }
    let measurement = ImaMeasurement::parse(template_name, data)?;
    let mut rendered = Vec::with_capacity(measurement.fields.len());
    for field in &measurement.fields {
        match field {
            TemplateField::FileDigest { digest_type, algorithm, digest } => {
                let prefix: Vec<&str> =
                    digest_type.iter().chain(algorithm.iter()).map(String::as_str).collect();
                if prefix.is_empty() {
                    rendered.push(digest.clone());
                } else {
                    rendered.push(format!("{}:{}", prefix.join(":"), digest));
                }
            },
            TemplateField::FileName(name) => {
                if name.is_empty() || name.contains(|c: char| c == '\n' || c == '\r') {
                    return Err(format!("name {:?} cannot be written on one ASCII line", name));
                }
                rendered.push(name.clone());
            },
            TemplateField::Signature(signature) => {
                if !signature.is_empty() {
                    rendered.push(signature.clone());
                }
            },
            TemplateField::Buffer(buffer) => {
                if buffer.is_empty() {
                    return Err("an empty buffer has no ASCII form".to_string());
                }
                rendered.push(buffer.clone());
            },
            other => return Err(format!("field {:?} has no ASCII form", other)),
        }
    }
    if let [_, TemplateField::FileName(name), TemplateField::Signature(signature)] =
        measurement.fields.as_slice()
    {
        if signature.is_empty() && trailing_signature(name).is_some() {
            return Err(format!("unsigned name {:?} would read back as signed", name));
        }
    }
    Ok(rendered)
}

/// Check that an event fits an IMA list and return its template name and template hash
fn ima_record<'e>(
    log: &EventLog,
    event: &'e Event,
    target: LogFormat,
    algorithm: DigestAlgorithm,
) -> Result<(&'e str, &'e Digest), EncodeError> {
    let unsupported = |reason: String| EncodeError::UnsupportedConversion {
        from: log.format,
        to: target,
        reason,
    };
    let sequence_number = event.sequence_number;
    let template_name = match &event.event_type {
        EventType::ImaTemplate(name) => name.as_str(),
        other => return Err(unsupported(format!("event {} has type {}", sequence_number, other))),
    };
    if lookup_template(template_name).is_none() {
        return Err(unsupported(format!(
            "event {} uses unknown template {}",
            sequence_number, template_name
        )));
    }
    if event.handle_kind != HandleKind::Pcr {
        return Err(unsupported(format!("event {} targets an NV index", sequence_number)));
    }
    match event.digests.as_slice() {
        [digest] if digest.algorithm() == algorithm => Ok((template_name, digest)),
        [digest] => Err(unsupported(format!(
            "event {} carries a {} template hash, the list uses {}",
            sequence_number,
            digest.algorithm(),
            algorithm
        ))),
        [] => Err(unsupported(format!("event {} carries no template hash", sequence_number))),
        digests => Err(EncodeError::LossyConversion {
            from: log.format,
            to: target,
            reason: format!("event {} carries {} digests", sequence_number, digests.len()),
        }),
    }
}

fn check_encoded_template(
    log: &EventLog,
    guard: &mut Option<String>,
    template_name: &str,
    target: LogFormat,
) -> Result<(), EncodeError> {
    match guard {
        Some(first) if first != template_name => Err(EncodeError::UnsupportedConversion {
            from: log.format,
            to: target,
            reason: format!("templates {} and {} are mixed", first, template_name),
        }),
        Some(_) => Ok(()),
        None => {
            *guard = Some(template_name.to_string());
            Ok(())
        },
    }
}

/// Text list as exported by `ascii_runtime_measurements`
#[derive(Debug, Clone, Default)]
pub struct ImaAsciiCodec {
    options: ImaOptions,
}

impl ImaAsciiCodec {
    pub fn new(options: ImaOptions) -> Self {
        Self { options }
    }

    /// Columns are single-space separated and the name runs to the end of the line
    fn parse_line(&self, line: &str, line_number: usize) -> Result<Event, DecodeError> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let (pcr, rest) = next_column(line);
        let (hash, rest) = next_column(rest);
        let (template_name, rest) = next_column(rest);
        let (digest, rest) = next_column(rest);
        if [pcr, hash, template_name, digest].iter().any(|column| column.is_empty()) {
            return Err(malformed(
                line_number,
                "expected PCR, template hash, template name and file digest columns",
            ));
        }

        let pcr_index = pcr
            .parse::<u32>()
            .map_err(|_| malformed(line_number, format!("invalid PCR index {:?}", pcr)))?;
        let hash_bytes =
            decode_hex("template hash", hash).map_err(|reason| malformed(line_number, reason))?;
        let template_hash = Digest::new(self.options.template_hash_algorithm, hash_bytes)?;
        let template_data = ascii_template_data(template_name, digest, rest)
            .map_err(|reason| malformed(line_number, reason))?;

        Ok(Event::new(
            pcr_index,
            EventType::ImaTemplate(template_name.to_string()),
            vec![template_hash],
            template_data,
        ))
    }
}

impl EventLogCodec for ImaAsciiCodec {
    fn format(&self) -> LogFormat {
        LogFormat::ImaAscii
    }

    fn decode(&self, data: &[u8]) -> Result<EventLog, DecodeError> {
        let mut log = EventLog::new(LogFormat::ImaAscii);
        log.algorithms.insert(self.options.template_hash_algorithm);
        let mut guard = TemplateGuard::default();

        for (index, raw_line) in data.split(|byte| *byte == b'\n').enumerate() {
            let line_number = index + 1;
            let line = str::from_utf8(raw_line)
                .map_err(|_| malformed(line_number, "line is not valid UTF-8"))?;
            if line.trim().is_empty() {
                continue;
            }
            let mut event = self.parse_line(line, line_number)?;
            if let EventType::ImaTemplate(name) = &event.event_type {
                guard.check(name, line_number)?;
            }
            event.sequence_number = log.events.len() as u64;
            log.events.push(event);
        }

        debug!("Decoded {} IMA ASCII records", log.events.len());
        Ok(log)
    }

    fn encode(&self, log: &EventLog) -> Result<Vec<u8>, EncodeError> {
        let algorithm = self.options.template_hash_algorithm;
        let mut guard = None;
        let mut text = String::new();
        for event in &log.events {
            let (template_name, template_hash) =
                ima_record(log, event, LogFormat::ImaAscii, algorithm)?;
            check_encoded_template(log, &mut guard, template_name, LogFormat::ImaAscii)?;
            let fields = ascii_fields(template_name, &event.event_data).map_err(|reason| {
                EncodeError::UnsupportedConversion {
                    from: log.format,
                    to: LogFormat::ImaAscii,
                    reason: format!("event {}: {}", event.sequence_number, reason),
                }
            })?;
            text.push_str(&format!(
                "{} {} {} {}\n",
                event.pcr_index,
                template_hash.to_hex(),
                template_name,
                fields.join(" ")
            ));
        }
        Ok(text.into_bytes())
    }
}

/// Binary list as exported by `binary_runtime_measurements`
///
/// Records are PCR index, template hash, length-prefixed template name and length-prefixed
/// template data. The `ima` template instead writes its raw 20 byte digest followed by the
/// length-prefixed name without its NUL; it is normalized into template data on decode.
#[derive(Debug, Clone, Default)]
pub struct ImaBinaryCodec {
    options: ImaOptions,
    limits: DecodeLimits,
}

impl ImaBinaryCodec {
    pub fn new(options: ImaOptions, limits: DecodeLimits) -> Self {
        Self { options, limits }
    }

    fn read_sized<'a>(
        &self,
        reader: &mut ByteReader<'a>,
        record: usize,
        what: &str,
    ) -> Result<&'a [u8], DecodeError> {
        let length = reader.read_u32()?;
        if length > self.limits.max_event_size {
            return Err(DecodeError::InvalidEventData(format!(
                "IMA record {} declares a {} byte {}, limit is {}",
                record, length, what, self.limits.max_event_size
            )));
        }
        reader.read_slice(length as usize)
    }

    fn read_ima_template(
        &self,
        reader: &mut ByteReader,
        record: usize,
    ) -> Result<Vec<u8>, DecodeError> {
        let digest = reader.read_slice(IMA_DIGEST_SIZE)?;
        let mut name = self.read_sized(reader, record, "file name")?.to_vec();
        name.push(0);
        Ok(join_template_data(&[digest, name.as_slice()]))
    }

    fn parse_record(&self, reader: &mut ByteReader, record: usize) -> Result<Event, DecodeError> {
        let algorithm = self.options.template_hash_algorithm;
        let pcr_index = reader.read_u32()?;
        let template_hash = Digest::new(algorithm, reader.read_bytes(algorithm.digest_size())?)?;

        let name = self.read_sized(reader, record, "template name")?;
        let template_name = str::from_utf8(name)
            .map_err(|_| malformed(record, "template name is not valid UTF-8"))?
            .to_string();
        if template_name == IMA_TEMPLATE {
            let template_data = self.read_ima_template(reader, record)?;
            return Ok(Event::new(
                pcr_index,
                EventType::ImaTemplate(template_name),
                vec![template_hash],
                template_data,
            ));
        }
        let template_data = self.read_sized(reader, record, "template data")?;

        let descriptor = lookup_template(&template_name)
            .ok_or_else(|| malformed(record, format!("unsupported template {:?}", template_name)))?;
        split_template_data(descriptor, template_data).map_err(|reason| malformed(record, reason))?;

        Ok(Event::new(
            pcr_index,
            EventType::ImaTemplate(template_name),
            vec![template_hash],
            template_data.to_vec(),
        ))
    }

    /// Write `ima` template data in the kernel's raw digest and unterminated name layout
    fn write_ima_template(
        &self,
        writer: &mut ByteWriter,
        log: &EventLog,
        event: &Event,
    ) -> Result<(), EncodeError> {
        let unsupported = |reason: String| EncodeError::UnsupportedConversion {
            from: log.format,
            to: LogFormat::ImaBinary,
            reason: format!("event {}: {}", event.sequence_number, reason),
        };
        let descriptor = lookup_template(IMA_TEMPLATE)
            .ok_or_else(|| unsupported("ima template is not registered".to_string()))?;
        let values = split_template_data(descriptor, &event.event_data).map_err(unsupported)?;
        let (digest, name) = match values.as_slice() {
            [digest, name] => (*digest, *name),
            _ => return Err(unsupported("ima template data needs d and n".to_string())),
        };
        if digest.len() != IMA_DIGEST_SIZE {
            return Err(unsupported(format!(
                "d is {} bytes, the ima template holds {}",
                digest.len(),
                IMA_DIGEST_SIZE
            )));
        }
        let name = name
            .strip_suffix(&[0])
            .ok_or_else(|| unsupported("n lacks its NUL terminator".to_string()))?;
        let name_length = u32::try_from(name.len()).map_err(|_| EncodeError::FieldOverflow {
            sequence_number: event.sequence_number,
            field: "file_name_length",
        })?;

        writer.write_bytes(digest);
        writer.write_u32(name_length);
        writer.write_bytes(name);
        Ok(())
    }
}

impl EventLogCodec for ImaBinaryCodec {
    fn format(&self) -> LogFormat {
        LogFormat::ImaBinary
    }

    /// Records are numbered from 1 in `MalformedLine` errors
    fn decode(&self, data: &[u8]) -> Result<EventLog, DecodeError> {
        let mut reader = ByteReader::new(data);
        let mut log = EventLog::new(LogFormat::ImaBinary);
        log.algorithms.insert(self.options.template_hash_algorithm);
        let mut guard = TemplateGuard::default();

        while !reader.is_end() {
            let record = log.events.len() + 1;
            let mut event = self.parse_record(&mut reader, record)?;
            if let EventType::ImaTemplate(name) = &event.event_type {
                guard.check(name, record)?;
            }
            event.sequence_number = log.events.len() as u64;
            log.events.push(event);
        }

        debug!("Decoded {} IMA binary records", log.events.len());
        Ok(log)
    }

    fn encode(&self, log: &EventLog) -> Result<Vec<u8>, EncodeError> {
        let algorithm = self.options.template_hash_algorithm;
        let mut guard = None;
        let mut writer = ByteWriter::new();
        for event in &log.events {
            let (template_name, template_hash) =
                ima_record(log, event, LogFormat::ImaBinary, algorithm)?;
            check_encoded_template(log, &mut guard, template_name, LogFormat::ImaBinary)?;

            writer.write_u32(event.pcr_index);
            writer.write_bytes(template_hash.value());
            writer.write_u32(template_name.len() as u32);
            writer.write_bytes(template_name.as_bytes());
            if template_name == IMA_TEMPLATE {
                self.write_ima_template(&mut writer, log, event)?;
                continue;
            }
            let data_length =
                u32::try_from(event.event_data.len()).map_err(|_| EncodeError::FieldOverflow {
                    sequence_number: event.sequence_number,
                    field: "template_data_length",
                })?;
            writer.write_u32(data_length);
            writer.write_bytes(&event.event_data);
        }
        Ok(writer.into_inner())
    }
}
