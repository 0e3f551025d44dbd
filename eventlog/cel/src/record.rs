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


//! Record layout shared by the TLV and JSON encodings

use eventlog_common::algorithm::Digest;
use eventlog_common::error::{DecodeError, EncodeError};
use eventlog_common::model::{Event, EventLog, EventType, HandleKind, LogFormat};

use crate::management::CelManagementEvent;

pub const RECNUM: u8 = 0;
pub const HANDLE_PCR: u8 = 1;
pub const HANDLE_NV_INDEX: u8 = 2;
pub const DIGESTS: u8 = 3;

pub const CONTENT_CEL: u8 = 4;
pub const CONTENT_PCCLIENT_STD: u8 = 5;
pub const CONTENT_IMA_TEMPLATE: u8 = 7;

pub const PCCLIENT_EVENT_TYPE: u8 = 0;
pub const PCCLIENT_EVENT_DATA: u8 = 1;
pub const IMA_TEMPLATE_NAME: u8 = 0;
pub const IMA_TEMPLATE_DATA: u8 = 1;

/// Content of one CEL record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CelContent {
    PcClientStd { event_type: u32, event_data: Vec<u8> },
    ImaTemplate { template_name: String, template_data: Vec<u8> },
    Management(CelManagementEvent),
}

impl CelContent {
    pub fn content_type(&self) -> u8 {
        match self {
            CelContent::PcClientStd { .. } => CONTENT_PCCLIENT_STD,
            CelContent::ImaTemplate { .. } => CONTENT_IMA_TEMPLATE,
            CelContent::Management(_) => CONTENT_CEL,
        }
    }

    /// Split an event into CEL content; management data must parse
    pub fn from_event(event: &Event) -> Result<Self, String> {
        let content = match &event.event_type {
            EventType::PcClient(event_type) => CelContent::PcClientStd {
                event_type: *event_type,
                event_data: event.event_data.clone(),
            },
            EventType::ImaTemplate(template_name) => CelContent::ImaTemplate {
                template_name: template_name.clone(),
                template_data: event.event_data.clone(),
            },
            EventType::CelManagement(management_type) => {
                let management =
                    CelManagementEvent::from_event_data(*management_type, &event.event_data)
                        .map_err(|e| {
                            format!(
                                "event {} holds an invalid management record: {}",
                                event.sequence_number, e
                            )
                        })?;
                CelContent::Management(management)
            },
        };
        Ok(content)
    }

    pub fn into_parts(self) -> Result<(EventType, Vec<u8>), EncodeError> {
        match self {
            CelContent::PcClientStd { event_type, event_data } => {
                Ok((EventType::PcClient(event_type), event_data))
            },
            CelContent::ImaTemplate { template_name, template_data } => {
                Ok((EventType::ImaTemplate(template_name), template_data))
            },
            CelContent::Management(management) => Ok((
                EventType::CelManagement(management.management_type()),
                management.to_event_data()?,
            )),
        }
    }
}

/// Build the unified event for a decoded record
pub fn record_event(
    recnum: u64,
    handle_kind: HandleKind,
    handle: u32,
    digests: Vec<Digest>,
    content: CelContent,
) -> Result<Event, DecodeError> {
    let (event_type, event_data) = content
        .into_parts()
        .map_err(|e| DecodeError::InvalidEventData(e.to_string()))?;
    let mut event = Event::new(handle, event_type, digests, event_data);
    event.sequence_number = recnum;
    event.handle_kind = handle_kind;
    event
        .check_digests()
        .map_err(|reason| DecodeError::InvalidDigestList { sequence_number: recnum, reason })?;
    Ok(event)
}

/// Add each event's algorithms to the log's declared set
pub fn collect_algorithms(log: &mut EventLog) {
    let algorithms: Vec<_> = log.events.iter().flat_map(|event| event.algorithms()).collect();
    log.algorithms.extend(algorithms);
}

/// Check that an event can be written as a CEL record
pub fn check_record(
    log: &EventLog,
    event: &Event,
    target: LogFormat,
) -> Result<CelContent, EncodeError> {
    let unsupported = |reason: String| EncodeError::UnsupportedConversion {
        from: log.format,
        to: target,
        reason,
    };
    event
        .check_digests()
        .map_err(|reason| unsupported(format!("event {}: {}", event.sequence_number, reason)))?;
    CelContent::from_event(event).map_err(unsupported)
}
