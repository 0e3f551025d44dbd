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


use eventlog_common::algorithm::{Digest, DigestAlgorithm};
use eventlog_common::codec::{DecodeLimits, EventLogCodec};
use eventlog_common::error::{DecodeError, EncodeError};
use eventlog_common::model::{Event, EventLog, EventType, LogFormat};
use ima_eventlog::{ImaAsciiCodec, ImaBinaryCodec, ImaMeasurement, ImaOptions, TemplateField};
use openssl::sha::sha1;

mod utils;
use utils::{binary_record, ima_ng_data, ima_template_record, push_field, BASH_DIGEST};

fn two_record_list() -> Vec<u8> {
    let mut raw = Vec::new();
    let boot_aggregate = ima_ng_data("sha1", &[0x5a; 20], "boot_aggregate");
    binary_record(&mut raw, 10, &sha1(&boot_aggregate), "ima-ng", &boot_aggregate);
    let bash = ima_ng_data("sha256", &hex::decode(BASH_DIGEST).unwrap(), "/usr/bin/bash");
    binary_record(&mut raw, 10, &sha1(&bash), "ima-ng", &bash);
    raw
}

/// Test Objective: decode a binary measurement list
/// Expected Result: each record becomes an event whose data is the template data
#[test]
fn test_decode_binary_list() {
    let result = ImaBinaryCodec::default().decode(&two_record_list());
    assert!(result.is_ok(), "Failed to decode binary list: {:?}", result.err());
    let log = result.unwrap();

    assert_eq!(log.format, LogFormat::ImaBinary);
    assert_eq!(log.len(), 2);
    assert_eq!(log.events[1].sequence_number, 1);
    assert_eq!(log.events[1].event_type, EventType::ImaTemplate("ima-ng".to_string()));
    let measurement = ImaMeasurement::parse("ima-ng", &log.events[0].event_data).unwrap();
    assert_eq!(measurement.file_name(), Some("boot_aggregate"));
}

#[test]
fn test_binary_round_trip() {
    let raw = two_record_list();
    let codec = ImaBinaryCodec::default();
    let log = codec.decode(&raw).unwrap();
    assert_eq!(codec.encode(&log).unwrap(), raw);
}

/// Test Objective: convert between the ASCII and binary exports
/// Expected Result: both directions preserve every event
#[test]
fn test_ascii_binary_conversion() {
    let binary = ImaBinaryCodec::default();
    let ascii = ImaAsciiCodec::default();

    let from_binary = binary.decode(&two_record_list()).unwrap();
    let text = ascii.encode(&from_binary).unwrap();
    let from_ascii = ascii.decode(&text).unwrap();
    assert_eq!(from_ascii.events, from_binary.events);
    assert_eq!(binary.encode(&from_ascii).unwrap(), two_record_list());

    let first_line = String::from_utf8(text).unwrap().lines().next().unwrap().to_string();
    assert!(first_line.starts_with("10 "));
    assert!(first_line.ends_with(&format!("ima-ng sha1:{} boot_aggregate", "5a".repeat(20))));
}

#[test]
fn test_truncated_binary_records() {
    let raw = two_record_list();
    let first_len = 4 + 20 + 4 + 6 + 4 + ima_ng_data("sha1", &[0x5a; 20], "boot_aggregate").len();
    for cut in 1..raw.len() {
        if cut == first_len {
            continue;
        }
        let result = ImaBinaryCodec::default().decode(&raw[..cut]);
        assert!(
            matches!(result, Err(DecodeError::TruncatedRecord { .. })),
            "cut at {} gave {:?}",
            cut,
            result
        );
    }
}

#[test]
fn test_unknown_template_descriptor() {
    let mut raw = Vec::new();
    let data = ima_ng_data("sha1", &[1; 20], "/init");
    binary_record(&mut raw, 10, &sha1(&data), "ima-custom", &data);
    assert!(matches!(
        ImaBinaryCodec::default().decode(&raw),
        Err(DecodeError::MalformedLine { line: 1, .. })
    ));
}

/// Test Objective: template data must split exactly into the descriptor's fields
/// Expected Result: MalformedLine for missing fields and for trailing bytes
#[test]
fn test_template_data_must_match_descriptor() {
    let mut short = Vec::new();
    let mut data = Vec::new();
    push_field(&mut data, b"sha1:\0aaaaaaaaaaaaaaaaaaaa");
    binary_record(&mut short, 10, &sha1(&data), "ima-ng", &data);

    let mut trailing = Vec::new();
    let mut data = ima_ng_data("sha1", &[1; 20], "/init");
    data.push(0);
    binary_record(&mut trailing, 10, &sha1(&data), "ima-ng", &data);

    for raw in [short, trailing] {
        let result = ImaBinaryCodec::default().decode(&raw);
        assert!(matches!(result, Err(DecodeError::MalformedLine { line: 1, .. })), "{:?}", result);
    }
}

#[test]
fn test_mixed_binary_templates() {
    let mut raw = two_record_list();
    ima_template_record(&mut raw, 10, &[0x11; 20], &[2; 20], "/init");
    assert!(matches!(
        ImaBinaryCodec::default().decode(&raw),
        Err(DecodeError::MalformedLine { line: 3, .. })
    ));
}

/// Test Objective: decode an ima template list in the kernel's binary layout
/// Expected Result: the raw digest and unterminated name become length-prefixed template data,
/// and encoding writes the kernel layout back
#[test]
fn test_ima_template_kernel_layout() {
    let mut raw = Vec::new();
    ima_template_record(&mut raw, 10, &[0x11; 20], &[0x22; 20], "/bin/true");
    ima_template_record(&mut raw, 10, &[0x33; 20], &[0x44; 20], "/usr/bin/env");
    let codec = ImaBinaryCodec::default();
    let result = codec.decode(&raw);
    assert!(result.is_ok(), "Failed to decode ima records: {:?}", result.err());
    let log = result.unwrap();

    assert_eq!(log.len(), 2);
    assert_eq!(log.events[0].event_type, EventType::ImaTemplate("ima".to_string()));
    assert_eq!(log.events[0].digests[0].value(), &[0x11; 20][..]);
    let mut expected = Vec::new();
    push_field(&mut expected, &[0x22; 20]);
    push_field(&mut expected, b"/bin/true\0");
    assert_eq!(log.events[0].event_data, expected);
    let measurement = ImaMeasurement::parse("ima", &log.events[1].event_data).unwrap();
    assert_eq!(measurement.file_name(), Some("/usr/bin/env"));

    assert_eq!(codec.encode(&log).unwrap(), raw);
    let text = String::from_utf8(ImaAsciiCodec::default().encode(&log).unwrap()).unwrap();
    let first_line = text.lines().next().unwrap().to_string();
    assert_eq!(first_line, format!("10 {} ima {} /bin/true", "11".repeat(20), "22".repeat(20)));
}

#[test]
fn test_truncated_ima_template_records() {
    let mut raw = Vec::new();
    ima_template_record(&mut raw, 10, &[0x11; 20], &[0x22; 20], "/bin/true");
    for cut in [40, 50, 55, raw.len() - 1] {
        let result = ImaBinaryCodec::default().decode(&raw[..cut]);
        assert!(matches!(result, Err(DecodeError::TruncatedRecord { .. })), "{:?}", result);
    }
}

/// Test Objective: the kernel's ima layout holds a 20 byte digest only
/// Expected Result: UnsupportedConversion for a 32 byte d value
#[test]
fn test_ima_template_encode_rejects_long_digest() {
    let mut data = Vec::new();
    push_field(&mut data, &[0x22; 32]);
    push_field(&mut data, b"/bin/true\0");
    let mut log = EventLog::new(LogFormat::ImaAscii);
    log.algorithms.insert(DigestAlgorithm::Sha1);
    log.events.push(Event::new(
        10,
        EventType::ImaTemplate("ima".to_string()),
        vec![Digest::new(DigestAlgorithm::Sha1, sha1(&data).to_vec()).unwrap()],
        data,
    ));
    let result = ImaBinaryCodec::default().encode(&log);
    assert!(matches!(
        result,
        Err(EncodeError::UnsupportedConversion { to: LogFormat::ImaBinary, .. })
    ));
}

#[test]
fn test_template_size_limit() {
    let limits = DecodeLimits { max_event_size: 16, ..DecodeLimits::default() };
    let codec = ImaBinaryCodec::new(ImaOptions::default(), limits);
    assert!(matches!(codec.decode(&two_record_list()), Err(DecodeError::InvalidEventData(_))));
}

fn evm_sig_data() -> Vec<u8> {
    let mut data = Vec::new();
    push_field(&mut data, b"sha256:\0");
    push_field(&mut data, b"/etc/passwd\0");
    push_field(&mut data, &[0x05, 0x02, 0x04]);
    push_field(&mut data, b"security.ima|security.selinux\0");
    let mut lengths = 3u32.to_le_bytes().to_vec();
    lengths.extend_from_slice(&2u32.to_le_bytes());
    push_field(&mut data, &lengths);
    push_field(&mut data, &[0xaa, 0xbb, 0xcc, 0x01, 0x02]);
    push_field(&mut data, &1000u32.to_le_bytes());
    push_field(&mut data, &100u32.to_le_bytes());
    push_field(&mut data, &0o100644u16.to_le_bytes());
    data
}

/// Test Objective: decode a binary-only template
/// Expected Result: evm-sig fields are typed, the ASCII encoder refuses the record
#[test]
fn test_evm_sig_record() {
    let data = evm_sig_data();
    let mut raw = Vec::new();
    binary_record(&mut raw, 10, &sha1(&data), "evm-sig", &data);
    let log = ImaBinaryCodec::default().decode(&raw).unwrap();

    let measurement = ImaMeasurement::parse("evm-sig", &log.events[0].event_data).unwrap();
    assert_eq!(measurement.file_name(), Some("/etc/passwd"));
    assert_eq!(measurement.fields[2], TemplateField::EvmSignature("050204".to_string()));
    assert_eq!(
        measurement.fields[3],
        TemplateField::XattrNames(vec!["security.ima".to_string(), "security.selinux".to_string()])
    );
    assert_eq!(measurement.fields[4], TemplateField::XattrLengths(vec![3, 2]));
    assert_eq!(measurement.fields[6], TemplateField::Uid(1000));
    assert_eq!(measurement.fields[7], TemplateField::Gid(100));
    assert_eq!(measurement.fields[8], TemplateField::Mode(0o100644));

    let result = ImaAsciiCodec::default().encode(&log);
    assert!(matches!(result, Err(EncodeError::UnsupportedConversion { .. })));
}

#[test]
fn test_sha256_template_hash_records() {
    let data = ima_ng_data("sha256", &hex::decode(BASH_DIGEST).unwrap(), "/usr/bin/bash");
    let mut raw = Vec::new();
    binary_record(&mut raw, 10, &[0x77; 32], "ima-ng", &data);
    let options = ImaOptions { template_hash_algorithm: DigestAlgorithm::Sha256 };
    let log = ImaBinaryCodec::new(options, DecodeLimits::default()).decode(&raw).unwrap();
    assert_eq!(log.events[0].digests[0].value(), &[0x77; 32][..]);

    // the same bytes read as a sha1 list misalign the name length
    assert!(ImaBinaryCodec::default().decode(&raw).is_err());
}
