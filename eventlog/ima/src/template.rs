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

//! IMA template descriptors and template data
//!
//! Template data is the concatenation of the descriptor's fields, each written as a little-endian
//! u32 length followed by the field bytes. It is the exact input of the template hash.

use serde::Serialize;

use eventlog_common::byte_reader::ByteReader;
use eventlog_common::byte_writer::ByteWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateFieldId {
    D,
    N,
    DNg,
    DNgV2,
    DModsig,
    NNg,
    Sig,
    Modsig,
    Buf,
    EvmSig,
    Iuid,
    Igid,
    Imode,
    XattrNames,
    XattrLengths,
    XattrValues,
}

impl TemplateFieldId {
    pub fn name(self) -> &'static str {
        match self {
            TemplateFieldId::D => "d",
            TemplateFieldId::N => "n",
            TemplateFieldId::DNg => "d-ng",
            TemplateFieldId::DNgV2 => "d-ngv2",
            TemplateFieldId::DModsig => "d-modsig",
            TemplateFieldId::NNg => "n-ng",
            TemplateFieldId::Sig => "sig",
            TemplateFieldId::Modsig => "modsig",
            TemplateFieldId::Buf => "buf",
            TemplateFieldId::EvmSig => "evmsig",
            TemplateFieldId::Iuid => "iuid",
            TemplateFieldId::Igid => "igid",
            TemplateFieldId::Imode => "imode",
            TemplateFieldId::XattrNames => "xattrnames",
            TemplateFieldId::XattrLengths => "xattrlengths",
            TemplateFieldId::XattrValues => "xattrvalues",
        }
    }
}

#[derive(Debug)]
pub struct TemplateDescriptor {
    pub name: &'static str,
    pub fields: &'static [TemplateFieldId],
}

use TemplateFieldId::*;

static TEMPLATE_DESCRIPTORS: [TemplateDescriptor; 8] = [
    TemplateDescriptor { name: "ima", fields: &[D, N] },
    TemplateDescriptor { name: "ima-ng", fields: &[DNg, NNg] },
    TemplateDescriptor { name: "ima-ngv2", fields: &[DNgV2, NNg] },
    TemplateDescriptor { name: "ima-sig", fields: &[DNg, NNg, Sig] },
    TemplateDescriptor { name: "ima-sigv2", fields: &[DNgV2, NNg, Sig] },
    TemplateDescriptor { name: "ima-buf", fields: &[DNg, NNg, Buf] },
    TemplateDescriptor { name: "ima-modsig", fields: &[DNg, NNg, Sig, DModsig, Modsig] },
    TemplateDescriptor {
        name: "evm-sig",
        fields: &[DNg, NNg, EvmSig, XattrNames, XattrLengths, XattrValues, Iuid, Igid, Imode],
    },
];

pub fn template_descriptors() -> &'static [TemplateDescriptor] {
    &TEMPLATE_DESCRIPTORS
}

/// Look up a built-in template descriptor by name
pub fn lookup_template(name: &str) -> Option<&'static TemplateDescriptor> {
    TEMPLATE_DESCRIPTORS.iter().find(|descriptor| descriptor.name == name)
}

/// Split template data into the raw values of its length-prefixed fields
///
/// # Errors
/// Returns the reason when the data does not split exactly into `descriptor`'s fields.
pub fn split_template_data<'a>(
    descriptor: &TemplateDescriptor,
    data: &'a [u8],
) -> Result<Vec<&'a [u8]>, String> {
    let mut reader = ByteReader::new(data);
    let mut values = Vec::with_capacity(descriptor.fields.len());
    for field in descriptor.fields {
        let length = reader
            .read_u32()
            .map_err(|_| format!("template data ends before field {}", field.name()))?;
        let value = reader.read_slice(length as usize).map_err(|_| {
            format!(
                "field {} declares {} bytes past the end of template data",
                field.name(),
                length
            )
        })?;
        values.push(value);
    }
    if !reader.is_end() {
        return Err(format!(
            "{} bytes left after the {} fields",
            reader.remaining(),
            descriptor.name
        ));
    }
    Ok(values)
}

/// Join raw field values into template data
pub fn join_template_data<V: AsRef<[u8]>>(values: &[V]) -> Vec<u8> {
    let mut writer = ByteWriter::new();
    for value in values {
        writer.write_u32(value.as_ref().len() as u32);
        writer.write_bytes(value.as_ref());
    }
    writer.into_inner()
}

/// d-ng value: `<algorithm>:\0<digest>`
pub fn digest_ng_value(algorithm: &str, digest: &[u8]) -> Vec<u8> {
    let mut value = format!("{}:", algorithm).into_bytes();
    value.push(0);
    value.extend_from_slice(digest);
    value
}

/// d-ngv2 value: `<type>:<algorithm>:\0<digest>`
pub fn digest_ngv2_value(digest_type: &str, algorithm: &str, digest: &[u8]) -> Vec<u8> {
    digest_ng_value(&format!("{}:{}", digest_type, algorithm), digest)
}

/// n-ng value: the name with its NUL terminator
pub fn name_value(name: &str) -> Vec<u8> {
    let mut value = name.as_bytes().to_vec();
    value.push(0);
    value
}

/// Split `<prefix>:\0<digest>`, stripping exactly one NUL
fn split_prefixed_digest(raw: &[u8]) -> Result<(String, Vec<u8>), String> {
    let separator = raw
        .windows(2)
        .position(|pair| pair == b":\0")
        .ok_or_else(|| "digest field lacks the ':' NUL separator".to_string())?;
    let prefix = std::str::from_utf8(&raw[..separator])
        .map_err(|e| format!("digest prefix is not UTF-8: {}", e))?;
    Ok((prefix.to_string(), raw[separator + 2..].to_vec()))
}

pub fn parse_name(raw: &[u8]) -> Result<String, String> {
    let trimmed = raw.strip_suffix(&[0]).unwrap_or(raw);
    String::from_utf8(trimmed.to_vec()).map_err(|e| format!("name is not UTF-8: {}", e))
}

fn parse_le_integer(raw: &[u8], field: TemplateFieldId) -> Result<u64, String> {
    if raw.len() > 8 {
        return Err(format!("field {} is {} bytes long", field.name(), raw.len()));
    }
    let mut bytes = [0u8; 8];
    bytes[..raw.len()].copy_from_slice(raw);
    Ok(u64::from_le_bytes(bytes))
}

/// Typed value of one template field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateField {
    FileDigest {
        #[serde(skip_serializing_if = "Option::is_none")]
        digest_type: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        algorithm: Option<String>,
        digest: String,
    },
    FileName(String),
    Signature(String),
    ModsigDigest(String),
    Modsig(String),
    Buffer(String),
    EvmSignature(String),
    Uid(u64),
    Gid(u64),
    Mode(u64),
    XattrNames(Vec<String>),
    XattrLengths(Vec<u32>),
    XattrValues(String),
}

impl TemplateField {
    pub fn parse(field: TemplateFieldId, raw: &[u8]) -> Result<Self, String> {
        let parsed = match field {
            D => TemplateField::FileDigest {
                digest_type: None,
                algorithm: None,
                digest: hex::encode(raw),
            },
            DNg => {
                let (algorithm, digest) = split_prefixed_digest(raw)?;
                TemplateField::FileDigest {
                    digest_type: None,
                    algorithm: Some(algorithm),
                    digest: hex::encode(digest),
                }
            },
            DNgV2 => {
                let (prefix, digest) = split_prefixed_digest(raw)?;
                let (digest_type, algorithm) = prefix
                    .split_once(':')
                    .ok_or_else(|| format!("d-ngv2 prefix {:?} lacks a digest type", prefix))?;
                TemplateField::FileDigest {
                    digest_type: Some(digest_type.to_string()),
                    algorithm: Some(algorithm.to_string()),
                    digest: hex::encode(digest),
                }
            },
            N | NNg => TemplateField::FileName(parse_name(raw)?),
            Sig => TemplateField::Signature(hex::encode(raw)),
            DModsig => TemplateField::ModsigDigest(hex::encode(raw)),
            Modsig => TemplateField::Modsig(hex::encode(raw)),
            Buf => TemplateField::Buffer(hex::encode(raw)),
            EvmSig => TemplateField::EvmSignature(hex::encode(raw)),
            Iuid => TemplateField::Uid(parse_le_integer(raw, field)?),
            Igid => TemplateField::Gid(parse_le_integer(raw, field)?),
            Imode => TemplateField::Mode(parse_le_integer(raw, field)?),
            XattrNames => {
                let names = parse_name(raw)?;
                let names = if names.is_empty() {
                    Vec::new()
                } else {
                    names.split('|').map(str::to_string).collect()
                };
                TemplateField::XattrNames(names)
            },
            XattrLengths => {
                if raw.len() % 4 != 0 {
                    return Err(format!("xattrlengths is {} bytes long", raw.len()));
                }
                TemplateField::XattrLengths(
                    raw.chunks_exact(4)
                        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                        .collect(),
                )
            },
            XattrValues => TemplateField::XattrValues(hex::encode(raw)),
        };
        Ok(parsed)
    }
}

/// Typed view of an IMA measurement's template data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImaMeasurement {
    pub template_name: String,
    pub fields: Vec<TemplateField>,
}

impl ImaMeasurement {
    /// Interpret template data with the named built-in descriptor
    pub fn parse(template_name: &str, data: &[u8]) -> Result<Self, String> {
        let descriptor = lookup_template(template_name)
            .ok_or_else(|| format!("unsupported template {:?}", template_name))?;
        let values = split_template_data(descriptor, data)?;
        let fields = descriptor
            .fields
            .iter()
            .zip(values)
            .map(|(field, raw)| TemplateField::parse(*field, raw))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ImaMeasurement { template_name: template_name.to_string(), fields })
    }

    /// Measured file name or buffer name
    pub fn file_name(&self) -> Option<&str> {
        self.fields.iter().find_map(|field| match field {
            TemplateField::FileName(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Hex digest of the measured file
    pub fn file_digest(&self) -> Option<&str> {
        self.fields.iter().find_map(|field| match field {
            TemplateField::FileDigest { digest, .. } => Some(digest.as_str()),
            _ => None,
        })
    }
}
