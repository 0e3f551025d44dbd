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
use eventlog_common::codec::EventLogCodec;
use eventlog_common::error::{DecodeError, EncodeError};
use eventlog_common::model::{Event, EventLog, EventType, HandleKind, LogFormat};
use cel_eventlog::management::{CEL_TIMESTAMP, FIRMWARE_END, STATE_TRANS};
use cel_eventlog::{CelJsonCodec, CelManagementEvent, CelTlvCodec, StateTransition};
use serde_json::{json, Value};

mod utils;
use utils::{ima_content, management_content, pcclient_content, record, version_value, SHA256};

fn sample_json() -> Value {
    json!([
        {
            "recnum": 0,
            "pcr": 0,
            "digests": [{"hashAlg": "sha256", "digest": "11".repeat(32)}],
            "content_type": "cel",
            "content": {"cel_version": {"major": 1, "minor": 2}}
        },
        {
            "recnum": 1,
            "pcr": 7,
            "digests": [
                {"hashAlg": "sha1", "digest": "22".repeat(20)},
                {"hashAlg": "sha256", "digest": "33".repeat(32)}
            ],
            "content_type": "pcclient_std",
            "content": {"event_type": 2147483649u32, "event_data": "ZmFsYWZlbA=="}
        },
        {
            "recnum": 2,
            "nv_index": 22020118,
            "digests": [{"hashAlg": "sha256", "digest": "44".repeat(32)}],
            "content_type": "ima_template",
            "content": {"template_name": "ima-ng", "template_data": "AAAA"}
        },
        {
            "recnum": 3,
            "pcr": 0,
            "digests": [{"hashAlg": "sha256", "digest": "00".repeat(32)}],
            "content_type": "cel",
            "content": {"firmware_end": null}
        },
        {
            "recnum": 4,
            "pcr": 0,
            "digests": [{"hashAlg": "sha256", "digest": "00".repeat(32)}],
            "content_type": "cel",
            "content": {"state_trans": "hibernate"}
        }
    ])
}

fn decode_value(value: &Value) -> Result<EventLog, DecodeError> {
    CelJsonCodec::default().decode(value.to_string().as_bytes())
}

/// Test Objective: decode every CEL-JSON content type
/// Expected Result: records map onto events with their handle, digests and content
#[test]
fn test_decode_cel_json() {
    let result = decode_value(&sample_json());
    assert!(result.is_ok(), "Failed to decode CEL-JSON: {:?}", result.err());
    let log = result.unwrap();

    assert_eq!(log.format, LogFormat::CelJson);
    assert_eq!(log.len(), 5);
    assert_eq!(
        log.algorithms.iter().copied().collect::<Vec<_>>(),
        vec![DigestAlgorithm::Sha1, DigestAlgorithm::Sha256]
    );

    let pcclient = &log.events[1];
    assert_eq!(pcclient.sequence_number, 1);
    assert_eq!(pcclient.pcr_index, 7);
    assert_eq!(pcclient.event_type, EventType::PcClient(0x80000001));
    assert_eq!(pcclient.event_data, b"falafel".to_vec());
    assert_eq!(pcclient.digests[0], Digest::new(DigestAlgorithm::Sha1, vec![0x22; 20]).unwrap());

    let ima = &log.events[2];
    assert_eq!(ima.handle_kind, HandleKind::NvIndex);
    assert_eq!(ima.pcr_index, 22020118);
    assert_eq!(ima.event_type, EventType::ImaTemplate("ima-ng".to_string()));
    assert_eq!(ima.event_data, vec![0, 0, 0]);

    assert_eq!(log.events[3].event_type, EventType::CelManagement(FIRMWARE_END));
    assert_eq!(
        CelManagementEvent::from_event_data(STATE_TRANS, &log.events[4].event_data).unwrap(),
        CelManagementEvent::StateTrans(StateTransition::Hibernate)
    );
}

#[test]
fn test_json_round_trip() {
    let codec = CelJsonCodec::default();
    let log = decode_value(&sample_json()).unwrap();
    let encoded = codec.encode(&log).unwrap();
    assert_eq!(codec.decode(&encoded).unwrap(), log);

    let reparsed: Value = serde_json::from_slice(&encoded).unwrap();
    assert_eq!(reparsed, sample_json());
}

/// Test Objective: convert between the two CEL encodings
/// Expected Result: TLV -> JSON -> TLV reproduces the original bytes
#[test]
fn test_tlv_json_conversion() {
    let digests = vec![(SHA256, vec![0x55; 32])];
    let mut raw = record(0, (1, 0), &digests, management_content(1, &version_value(2, 0)));
    raw.extend(record(1, (1, 0), &digests, pcclient_content(0x8, b"1.0")));
    raw.extend(record(2, (1, 10), &digests, ima_content("ima-ng", b"data")));
    let timestamp = management_content(CEL_TIMESTAMP, &42u64.to_be_bytes());
    raw.extend(record(3, (1, 0), &digests, timestamp));

    let tlv_log = CelTlvCodec::default().decode(&raw).unwrap();
    let json = CelJsonCodec::default().encode(&tlv_log).unwrap();
    let json_log = CelJsonCodec::default().decode(&json).unwrap();
    assert_eq!(json_log.events, tlv_log.events);
    assert_eq!(CelTlvCodec::default().encode(&json_log).unwrap(), raw);
}

#[test]
fn test_any_log_converts_to_cel() {
    let mut log = EventLog::new(LogFormat::LegacyTcg);
    log.algorithms.insert(DigestAlgorithm::Sha1);
    log.events.push(Event::new(
        0,
        EventType::PcClient(0x8),
        vec![Digest::zero(DigestAlgorithm::Sha1)],
        b"v".to_vec(),
    ));
    log.events.push(Event::new(
        10,
        EventType::ImaTemplate("ima".to_string()),
        vec![Digest::zero(DigestAlgorithm::Sha1)],
        Vec::new(),
    ));
    log.renumber();

    let encoded = CelJsonCodec::default().encode(&log).unwrap();
    let decoded = CelJsonCodec::default().decode(&encoded).unwrap();
    assert_eq!(decoded.events, log.events);
}

#[test]
fn test_encode_rejects_invalid_management_data() {
    let mut log = EventLog::new(LogFormat::CelTlv);
    log.algorithms.insert(DigestAlgorithm::Sha1);
    log.events.push(Event::new(
        0,
        EventType::CelManagement(STATE_TRANS),
        vec![Digest::zero(DigestAlgorithm::Sha1)],
        vec![9],
    ));
    assert!(matches!(
        CelJsonCodec::default().encode(&log),
        Err(EncodeError::UnsupportedConversion { .. })
    ));
    assert!(matches!(
        CelTlvCodec::default().encode(&log),
        Err(EncodeError::UnsupportedConversion { .. })
    ));
}

fn with_record(change: impl FnOnce(&mut Value)) -> Value {
    let mut value = sample_json();
    change(&mut value[1]);
    value
}

#[test]
fn test_schema_violations() {
    let cases = vec![
        json!({"recnum": 0}),
        with_record(|record| {
            record.as_object_mut().unwrap().remove("digests");
        }),
        with_record(|record| record["nv_index"] = json!(1)),
        with_record(|record| {
            record.as_object_mut().unwrap().remove("pcr");
        }),
        with_record(|record| record["content"]["event_data"] = json!("not base64!")),
        with_record(|record| record["digests"][0]["digest"] = json!("xyz")),
        with_record(|record| record["content_type"] = json!("pcclient_tlv")),
        with_record(|record| record["content"] = json!({"event_type": "eight", "event_data": ""})),
        with_record(|record| record["unknown"] = json!(true)),
        with_record(|record| {
            record["content_type"] = json!("cel");
            record["content"] = json!({"cel_timestamp": 1, "firmware_end": null});
        }),
        with_record(|record| {
            record["content_type"] = json!("cel");
            record["content"] = json!({"state_trans": "reboot"});
        }),
    ];
    for case in &cases {
        let result = decode_value(case);
        assert!(
            matches!(result, Err(DecodeError::SchemaViolation(_))),
            "{} gave {:?}",
            case,
            result
        );
    }
}

#[test]
fn test_digest_errors() {
    let unknown = with_record(|record| record["digests"][0]["hashAlg"] = json!("md5"));
    assert!(matches!(decode_value(&unknown), Err(DecodeError::UnsupportedAlgorithm(_))));

    let short = with_record(|record| record["digests"][1]["digest"] = json!("33".repeat(20)));
    assert!(matches!(
        decode_value(&short),
        Err(DecodeError::DigestLengthMismatch { expected: 32, actual: 20, .. })
    ));

    let empty = with_record(|record| record["digests"] = json!([]));
    assert!(matches!(
        decode_value(&empty),
        Err(DecodeError::InvalidDigestList { sequence_number: 1, .. })
    ));
}
