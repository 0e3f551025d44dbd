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
use eventlog_common::error::DecodeError;
use eventlog_common::model::{EventType, HandleKind, LogFormat};
use eventlog_common::pcr::replay;
use cel_eventlog::management::{CEL_TIMESTAMP, CEL_VERSION, FIRMWARE_END, STATE_TRANS};
use cel_eventlog::{CelManagementEvent, CelTlvCodec, StateTransition};
use openssl::sha::sha256;

mod utils;
use utils::{
    int_tlv, ima_content, management_content, pcclient_content, record, sha1_zero, tlv,
    version_value, SHA1, SHA256,
};

const EV_EFI_SPDM_FIRMWARE_CONFIG: u32 = 0x800000E2;

fn decode_one(raw: &[u8]) -> eventlog_common::model::Event {
    let log = CelTlvCodec::default().decode(raw).unwrap();
    assert_eq!(log.len(), 1);
    log.events.into_iter().next().unwrap()
}

#[test]
fn test_firmware_end_record() {
    let event = decode_one(&record(0, (1, 1), &sha1_zero(), management_content(FIRMWARE_END, &[])));
    assert_eq!(event.sequence_number, 0);
    assert_eq!(event.pcr_index, 1);
    assert_eq!(event.handle_kind, HandleKind::Pcr);
    assert_eq!(event.digests, vec![Digest::zero(DigestAlgorithm::Sha1)]);
    assert_eq!(event.event_type, EventType::CelManagement(FIRMWARE_END));
    assert!(event.event_data.is_empty());
}

#[test]
fn test_cel_version_record() {
    let content = management_content(CEL_VERSION, &version_value(2, 0));
    let event = decode_one(&record(0, (1, 1), &sha1_zero(), content));
    assert_eq!(event.event_type, EventType::CelManagement(CEL_VERSION));
    assert_eq!(
        CelManagementEvent::from_event_data(CEL_VERSION, &event.event_data).unwrap(),
        CelManagementEvent::CelVersion { major: 2, minor: 0 }
    );
}

/// Test Objective: decode a timestamp shorter than its maximum width
/// Expected Result: the value is kept and the event data holds the canonical 8 bytes
#[test]
fn test_cel_timestamp_record() {
    let value = 0xFF_FFFF_FFFFu64.to_be_bytes()[3..].to_vec();
    let content = management_content(CEL_TIMESTAMP, &value);
    let event = decode_one(&record(0, (1, 1), &sha1_zero(), content));
    assert_eq!(event.event_data, 0xFF_FFFF_FFFFu64.to_be_bytes().to_vec());
    assert_eq!(
        CelManagementEvent::from_event_data(CEL_TIMESTAMP, &event.event_data).unwrap(),
        CelManagementEvent::CelTimestamp(0xFF_FFFF_FFFF)
    );
}

#[test]
fn test_state_trans_record() {
    let event = decode_one(&record(0, (1, 1), &sha1_zero(), management_content(STATE_TRANS, &[2])));
    assert_eq!(
        CelManagementEvent::from_event_data(STATE_TRANS, &event.event_data).unwrap(),
        CelManagementEvent::StateTrans(StateTransition::Kexec)
    );
}

#[test]
fn test_pcclient_std_record() {
    let content = pcclient_content(EV_EFI_SPDM_FIRMWARE_CONFIG, b"falafel");
    let event = decode_one(&record(0, (1, 1), &sha1_zero(), content));
    assert_eq!(event.event_type, EventType::PcClient(EV_EFI_SPDM_FIRMWARE_CONFIG));
    assert_eq!(event.event_data, b"falafel".to_vec());
}

#[test]
fn test_ima_template_record() {
    let event = decode_one(&record(0, (1, 1), &sha1_zero(), ima_content("eat", b"falafel")));
    assert_eq!(event.event_type, EventType::ImaTemplate("eat".to_string()));
    assert_eq!(event.event_data, b"falafel".to_vec());
}

#[test]
fn test_content_fields_in_any_order() {
    let mut body = tlv(1, b"data");
    body.extend(int_tlv(0, 0x8, 1));
    let event = decode_one(&record(3, (1, 0), &sha1_zero(), tlv(5, &body)));
    assert_eq!(event.sequence_number, 3);
    assert_eq!(event.event_type, EventType::PcClient(0x8));
    assert_eq!(event.event_data, b"data".to_vec());
}

fn mixed_log() -> Vec<u8> {
    let digests = vec![(SHA1, vec![0x11; 20]), (SHA256, vec![0x22; 32])];
    let mut raw =
        record(0, (1, 0), &digests, management_content(CEL_VERSION, &version_value(1, 0)));
    raw.extend(record(1, (1, 0), &digests, pcclient_content(0x8, b"1.0")));
    raw.extend(record(2, (1, 10), &digests, ima_content("ima-ng", b"template")));
    raw.extend(record(3, (2, 0x0150_0016), &digests, pcclient_content(0x80000001, b"nv")));
    raw.extend(record(4, (1, 0), &digests, management_content(FIRMWARE_END, &[])));
    raw
}

/// Test Objective: encoding a decoded CEL-TLV log reproduces it
/// Expected Result: identical bytes and an identical log after decoding again
#[test]
fn test_tlv_round_trip() {
    let codec = CelTlvCodec::default();
    let log = codec.decode(&mixed_log()).unwrap();
    assert_eq!(log.format, LogFormat::CelTlv);
    assert_eq!(
        log.algorithms.iter().copied().collect::<Vec<_>>(),
        vec![DigestAlgorithm::Sha1, DigestAlgorithm::Sha256]
    );
    assert_eq!(log.events[3].handle_kind, HandleKind::NvIndex);
    assert_eq!(log.events[3].pcr_index, 0x0150_0016);

    let encoded = codec.encode(&log).unwrap();
    assert_eq!(encoded, mixed_log());
    assert_eq!(codec.decode(&encoded).unwrap(), log);
}

/// Test Objective: replay a CEL-TLV log holding a PCR 10 record and an NV index record
/// Expected Result: PCR 10 holds a single SHA256 extend and the NV index is left out
#[test]
fn test_nv_index_events_are_not_replayed() {
    let log = CelTlvCodec::default().decode(&mixed_log()).unwrap();
    let bank = replay(&log, DigestAlgorithm::Sha256, None).unwrap();
    assert!(bank.get(0x0150_0016, DigestAlgorithm::Sha256).is_none());

    let mut input = vec![0u8; 32];
    input.extend_from_slice(&[0x22; 32]);
    assert_eq!(bank.get(10, DigestAlgorithm::Sha256), Some(&sha256(&input)[..]));
}

fn assert_malformed(raw: &[u8]) {
    let result = CelTlvCodec::default().decode(raw);
    assert!(
        matches!(result, Err(DecodeError::MalformedTlv { .. })),
        "unexpected result {:?}",
        result
    );
}

#[test]
fn test_unconsumed_bytes() {
    let mut version = version_value(2, 0);
    version.push(0);
    assert_malformed(&record(0, (1, 1), &sha1_zero(), management_content(CEL_VERSION, &version)));

    let mut body = int_tlv(0, 0x8, 4);
    body.extend(tlv(1, b"falafel"));
    body.push(0);
    assert_malformed(&record(0, (1, 1), &sha1_zero(), tlv(5, &body)));

    let mut body = tlv(0, b"eat");
    body.extend(tlv(1, b"falafel"));
    body.push(0);
    assert_malformed(&record(0, (1, 1), &sha1_zero(), tlv(7, &body)));

    assert_malformed(&record(0, (1, 1), &sha1_zero(), management_content(FIRMWARE_END, &[0])));
}

#[test]
fn test_unexpected_types() {
    let mut version = int_tlv(0xff, 2, 2);
    version.extend(int_tlv(1, 0, 2));
    let raw = record(0, (1, 1), &sha1_zero(), management_content(CEL_VERSION, &version));
    match CelTlvCodec::default().decode(&raw) {
        Err(DecodeError::MalformedTlv { reason, .. }) => {
            assert!(reason.contains("unexpected type 255"), "{}", reason)
        },
        other => panic!("unexpected result {:?}", other),
    }

    // handle TLV in place of the record number
    assert_malformed(&int_tlv(1, 0, 4));
    // content type 6 is not defined
    assert_malformed(&record(0, (1, 1), &sha1_zero(), tlv(6, &[])));
}

#[test]
fn test_missing_and_repeated_fields() {
    assert_malformed(&record(0, (1, 1), &sha1_zero(), tlv(5, &int_tlv(0, 0x8, 4))));

    let mut body = int_tlv(0, 0x8, 4);
    body.extend(int_tlv(0, 0x9, 4));
    body.extend(tlv(1, b""));
    assert_malformed(&record(0, (1, 1), &sha1_zero(), tlv(5, &body)));

    assert_malformed(&record(
        0,
        (1, 1),
        &sha1_zero(),
        management_content(CEL_VERSION, &int_tlv(0, 2, 2)),
    ));
}

#[test]
fn test_length_overrun_and_short_header() {
    let mut raw = record(0, (1, 1), &sha1_zero(), pcclient_content(0x8, b"falafel"));
    raw.truncate(raw.len() - 3);
    assert_malformed(&raw);
    assert_malformed(&[0, 0, 0]);
}

#[test]
fn test_integer_width_limits() {
    let mut raw = tlv(0, &[0u8; 9]);
    raw.extend(int_tlv(1, 0, 4));
    assert_malformed(&raw);

    assert_malformed(&record(0, (1, 1), &sha1_zero(), management_content(STATE_TRANS, &[0, 1])));
    assert_malformed(&record(0, (1, 1), &sha1_zero(), management_content(STATE_TRANS, &[7])));
}

/// Test Objective: nesting deeper than the configured bound is refused
/// Expected Result: management records need three levels, PC Client records two
#[test]
fn test_tlv_depth_bound() {
    let codec = CelTlvCodec::new(DecodeLimits { max_tlv_depth: 2, ..DecodeLimits::default() });
    let result =
        codec.decode(&record(0, (1, 1), &sha1_zero(), management_content(FIRMWARE_END, &[])));
    match result {
        Err(DecodeError::MalformedTlv { reason, .. }) => {
            assert!(reason.contains("nesting"), "{}", reason)
        },
        other => panic!("unexpected result {:?}", other),
    }
    assert!(codec.decode(&record(0, (1, 1), &sha1_zero(), pcclient_content(0x8, b""))).is_ok());
}

#[test]
fn test_digest_errors() {
    let unknown = record(0, (1, 1), &[(0x99, vec![0; 32])], pcclient_content(0x8, b""));
    assert!(matches!(
        CelTlvCodec::default().decode(&unknown),
        Err(DecodeError::UnsupportedAlgorithm(_))
    ));

    let short = record(0, (1, 1), &[(SHA256, vec![0; 20])], pcclient_content(0x8, b""));
    assert!(matches!(
        CelTlvCodec::default().decode(&short),
        Err(DecodeError::DigestLengthMismatch { expected: 32, actual: 20, .. })
    ));

    let digests = [(SHA1, vec![0; 20]), (SHA1, vec![1; 20])];
    let repeated = record(5, (1, 1), &digests, pcclient_content(0x8, b""));
    assert!(matches!(
        CelTlvCodec::default().decode(&repeated),
        Err(DecodeError::InvalidDigestList { sequence_number: 5, .. })
    ));

    let empty = record(0, (1, 1), &[], pcclient_content(0x8, b""));
    assert!(matches!(
        CelTlvCodec::default().decode(&empty),
        Err(DecodeError::InvalidDigestList { .. })
    ));
}
