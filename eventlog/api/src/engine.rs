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


use log::{debug, info};
use serde_json::{json, Map, Value};

use cel_eventlog::management::{CEL_TIMESTAMP, CEL_VERSION, FIRMWARE_END, STATE_TRANS};
use cel_eventlog::{CelJsonCodec, CelTlvCodec};
use eventlog_common::algorithm::DigestAlgorithm;
use eventlog_common::codec::EventLogCodec;
use eventlog_common::error::{DecodeError, EncodeError, ReplayError};
use eventlog_common::model::{Event, EventLog, EventType, HandleKind, LogFormat};
use eventlog_common::pcr::{replay_all, replay_with_options, PcrBank};
use ima_eventlog::{ImaAsciiCodec, ImaBinaryCodec};
use tcg_eventlog::{event_type_name, CryptoAgileTcgCodec, LegacyTcgCodec};

use crate::config::EventLogConfig;
use crate::registry::EventDecoderRegistry;
use crate::EventLogError;

/// Order in which `detect_format` tries decoders; text formats first, then binary formats from
/// the most to the least self-describing
const DETECTION_ORDER: [LogFormat; 6] = [
    LogFormat::CelJson,
    LogFormat::ImaAscii,
    LogFormat::CryptoAgileTcg,
    LogFormat::CelTlv,
    LogFormat::ImaBinary,
    LogFormat::LegacyTcg,
];

/// Codecs, replay and rendering configured from one [`EventLogConfig`]
#[derive(Debug, Clone, Default)]
pub struct EventLogEngine {
    config: EventLogConfig,
}

impl EventLogEngine {
    pub fn new(config: EventLogConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EventLogConfig {
        &self.config
    }

    /// Codec for `format` built with the configured limits and IMA options
    pub fn codec(&self, format: LogFormat) -> Box<dyn EventLogCodec> {
        let limits = self.config.limits;
        match format {
            LogFormat::LegacyTcg => Box::new(LegacyTcgCodec::new(limits)),
            LogFormat::CryptoAgileTcg => Box::new(CryptoAgileTcgCodec::new(limits)),
            LogFormat::ImaAscii => Box::new(ImaAsciiCodec::new(self.config.ima)),
            LogFormat::ImaBinary => Box::new(ImaBinaryCodec::new(self.config.ima, limits)),
            LogFormat::CelTlv => Box::new(CelTlvCodec::new(limits)),
            LogFormat::CelJson => Box::new(CelJsonCodec::new(limits)),
        }
    }

    pub fn decode(&self, format: LogFormat, data: &[u8]) -> Result<EventLog, DecodeError> {
        let log = self.codec(format).decode(data)?;
        debug!("Decoded {} events from {} bytes of {} log", log.len(), data.len(), format);
        Ok(log)
    }

    pub fn encode(&self, format: LogFormat, log: &EventLog) -> Result<Vec<u8>, EncodeError> {
        self.codec(format).encode(log)
    }

    /// Decode `data` as `from` and re-encode it as `to`
    pub fn convert(
        &self,
        from: LogFormat,
        to: LogFormat,
        data: &[u8],
    ) -> Result<Vec<u8>, EventLogError> {
        let log = self.decode(from, data)?;
        let encoded = self.encode(to, &log)?;
        info!("Converted {} log of {} events to {}", from, log.len(), to);
        Ok(encoded)
    }

    /// Guess the format of `data`
    ///
    /// Returns the first format whose decoder accepts the input and finds at least one event
    /// (or a crypto-agile header). Empty input has no format.
    pub fn detect_format(&self, data: &[u8]) -> Option<LogFormat> {
        if data.is_empty() {
            return None;
        }
        DETECTION_ORDER.iter().copied().find(|format| match self.decode(*format, data) {
            Ok(log) => !log.is_empty() || log.header.is_some(),
            Err(e) => {
                debug!("Input is not a {} log: {}", format, e);
                false
            },
        })
    }

    /// Replay one algorithm with the configured policy and reset mode
    pub fn replay(
        &self,
        log: &EventLog,
        algorithm: DigestAlgorithm,
    ) -> Result<PcrBank, ReplayError> {
        replay_with_options(log, algorithm, None, &self.config.replay)
    }

    pub fn replay_seeded(
        &self,
        log: &EventLog,
        algorithm: DigestAlgorithm,
        initial_bank: &PcrBank,
    ) -> Result<PcrBank, ReplayError> {
        replay_with_options(log, algorithm, Some(initial_bank), &self.config.replay)
    }

    /// Replay every algorithm the log declares
    pub fn replay_all(&self, log: &EventLog) -> Result<PcrBank, ReplayError> {
        replay_all(log, &self.config.replay)
    }

    /// JSON rendering of a log with the typed payload of every event
    pub fn describe(&self, log: &EventLog) -> Value {
        let registry = EventDecoderRegistry::global();
        let events = log
            .events
            .iter()
            .map(|event| describe_event(registry, event))
            .collect::<Vec<_>>();
        json!({
            "format": log.format,
            "algorithms": log.algorithms.iter().map(|alg| alg.name()).collect::<Vec<_>>(),
            "events": events,
        })
    }
}

fn event_type_label(event_type: &EventType) -> String {
    match event_type {
        EventType::PcClient(value) => event_type_name(*value),
        EventType::ImaTemplate(name) => name.clone(),
        EventType::CelManagement(value) => management_type_name(*value),
    }
}

fn management_type_name(value: u8) -> String {
    match value {
        CEL_VERSION => "cel_version".to_string(),
        FIRMWARE_END => "firmware_end".to_string(),
        CEL_TIMESTAMP => "cel_timestamp".to_string(),
        STATE_TRANS => "state_trans".to_string(),
        other => format!("unknown_0x{:02x}", other),
    }
}

fn describe_event(registry: &EventDecoderRegistry, event: &Event) -> Value {
    let mut obj = Map::new();
    obj.insert("sequence_number".to_string(), json!(event.sequence_number));
    match event.handle_kind {
        HandleKind::Pcr => obj.insert("pcr_index".to_string(), json!(event.pcr_index)),
        HandleKind::NvIndex => obj.insert("nv_index".to_string(), json!(event.pcr_index)),
    };
    obj.insert("event_type".to_string(), json!(event_type_label(&event.event_type)));
    let digests = event
        .digests
        .iter()
        .map(|digest| json!({ "hash_alg": digest.algorithm().name(), "digest": digest.to_hex() }))
        .collect::<Vec<_>>();
    obj.insert("digests".to_string(), Value::Array(digests));
    let payload = serde_json::to_value(registry.interpret(event)).unwrap_or(Value::Null);
    obj.insert("event".to_string(), payload);
    Value::Object(obj)
}
