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


//! Event-type decoder registry
//!
//! Maps an event type tag, optionally narrowed to one PCR, to a function turning the raw
//! event data into a [`TypedEventPayload`]. The process-wide registry is fixed at first use and
//! only read afterwards.

use std::collections::HashMap;
use std::fmt;

use log::debug;
use once_cell::sync::OnceCell;
use serde::{Serialize, Serializer};

use cel_eventlog::management::MANAGEMENT_TYPES;
use cel_eventlog::CelManagementEvent;
use eventlog_common::byte_reader::{ByteParseable, ByteReader};
use eventlog_common::error::DecodeError;
use eventlog_common::model::{Event, EventType};
use ima_eventlog::{template_descriptors, ImaMeasurement};
use tcg_eventlog::uefi::model::{
    ActionEvent, BootOrderEvent, FirmwareBlobEvent, GptEvent, HandoffTablesEvent, ImageLoadEvent,
    NoActionEvent, SCrtmVersionEvent, SeparatorEvent, TaggedEvent, UefiVariableEvent, VariableEvent,
};
use tcg_eventlog::uefi::parser::{parse_typed_event, parse_variable_event};
use tcg_eventlog::TcgEventType;

/// Structured interpretation of an event's data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypedEventPayload {
    NoAction(NoActionEvent),
    Separator(SeparatorEvent),
    Action(ActionEvent),
    FirmwareBlob(FirmwareBlobEvent),
    SCrtmVersion(SCrtmVersionEvent),
    TaggedEvent(TaggedEvent),
    UefiVariable(UefiVariableEvent),
    BootOrder(BootOrderEvent),
    ImageLoad(ImageLoadEvent),
    GptEvent(GptEvent),
    HandoffTables(HandoffTablesEvent),
    ImaMeasurement(ImaMeasurement),
    CelManagement(CelManagementEvent),
    /// Event data no registered decoder accepted
    Unrecognized(#[serde(serialize_with = "serialize_hex")] Vec<u8>),
}

fn serialize_hex<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(data))
}

pub type EventDecoder = Box<dyn Fn(&Event) -> Result<TypedEventPayload, DecodeError> + Send + Sync>;

static GLOBAL_REGISTRY: OnceCell<EventDecoderRegistry> = OnceCell::new();

#[derive(Default)]
pub struct EventDecoderRegistry {
    decoders: HashMap<(EventType, Option<u32>), EventDecoder>,
}

impl fmt::Debug for EventDecoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDecoderRegistry")
            .field("decoders", &self.decoders.len())
            .finish()
    }
}

impl EventDecoderRegistry {
    /// Registry without any decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding decoders for every PC Client, IMA and CEL management payload the
    /// workspace can parse
    pub fn with_default_catalog() -> Self {
        let mut registry = Self::new();
        registry.register_tcg_catalog();
        registry.register_ima_catalog();
        registry.register_cel_catalog();
        registry
    }

    /// Register `decoder` for every event of `event_type`, replacing a previous one
    pub fn register<F>(&mut self, event_type: EventType, decoder: F)
    where
        F: Fn(&Event) -> Result<TypedEventPayload, DecodeError> + Send + Sync + 'static,
    {
        self.decoders.insert((event_type, None), Box::new(decoder));
    }

    /// Register `decoder` for events of `event_type` extended into `pcr` only
    ///
    /// A PCR-specific decoder takes precedence over the one registered for the type alone.
    pub fn register_for_pcr<F>(&mut self, event_type: EventType, pcr: u32, decoder: F)
    where
        F: Fn(&Event) -> Result<TypedEventPayload, DecodeError> + Send + Sync + 'static,
    {
        self.decoders.insert((event_type, Some(pcr)), Box::new(decoder));
    }

    pub fn lookup(&self, event: &Event) -> Option<&EventDecoder> {
        self.decoders
            .get(&(event.event_type.clone(), Some(event.pcr_index)))
            .or_else(|| self.decoders.get(&(event.event_type.clone(), None)))
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Interpret an event's data
    ///
    /// Never fails: an event without a decoder, or whose decoder rejects the data, is returned
    /// as `Unrecognized` with its raw data.
    pub fn interpret(&self, event: &Event) -> TypedEventPayload {
        let decoder = match self.lookup(event) {
            Some(decoder) => decoder,
            None => {
                debug!("No decoder for {} event {}", event.event_type, event.sequence_number);
                return TypedEventPayload::Unrecognized(event.event_data.clone());
            },
        };
        match decoder(event) {
            Ok(payload) => payload,
            Err(e) => {
                debug!(
                    "Event {} of type {} left uninterpreted: {}",
                    event.sequence_number, event.event_type, e
                );
                TypedEventPayload::Unrecognized(event.event_data.clone())
            },
        }
    }

    /// Install the process-wide registry
    ///
    /// # Errors
    /// Returns `registry` back when a registry is already installed or `global()` already
    /// initialised the default one.
    pub fn install(registry: EventDecoderRegistry) -> Result<(), EventDecoderRegistry> {
        GLOBAL_REGISTRY.set(registry)
    }

    /// The installed registry, or the default catalog when none was installed
    pub fn global() -> &'static EventDecoderRegistry {
        GLOBAL_REGISTRY.get_or_init(EventDecoderRegistry::with_default_catalog)
    }

    fn register_typed<T, W>(&mut self, event_type: TcgEventType, wrap: W)
    where
        T: ByteParseable + 'static,
        W: Fn(T) -> TypedEventPayload + Send + Sync + 'static,
    {
        self.register(event_type.tag(), move |event| {
            parse_typed_event::<T>(&event.event_data, event_type.name()).map(&wrap)
        });
    }

    fn register_tcg_catalog(&mut self) {
        use TcgEventType::*;

        self.register_typed(EvNoAction, TypedEventPayload::NoAction);
        self.register_typed(EvSeparator, TypedEventPayload::Separator);
        for event_type in [EvAction, EvEfiAction, EvIpl, EvOmitBootDeviceEvents, EvEfiHcrtmEvent] {
            self.register_typed(event_type, TypedEventPayload::Action);
        }
        for event_type in [
            EvPostCode,
            EvPostCode2,
            EvSCrtmContents,
            EvEfiPlatformFirmwareBlob,
            EvEfiPlatformFirmwareBlob2,
        ] {
            self.register_typed(event_type, TypedEventPayload::FirmwareBlob);
        }
        self.register_typed(EvSCrtmVersion, TypedEventPayload::SCrtmVersion);
        self.register_typed(EvEventTag, TypedEventPayload::TaggedEvent);
        for event_type in
            [EvEfiBootServicesApplication, EvEfiBootServicesDriver, EvEfiRuntimeServicesDriver]
        {
            self.register_typed(event_type, TypedEventPayload::ImageLoad);
        }
        for event_type in [EvEfiGptEvent, EvEfiGptEvent2] {
            self.register_typed(event_type, TypedEventPayload::GptEvent);
        }
        self.register_typed(EvEfiHandoffTables, TypedEventPayload::HandoffTables);

        for event_type in [
            EvEfiVariableDriverConfig,
            EvEfiVariableBoot,
            EvEfiVariableBoot2,
            EvEfiVariableAuthority,
            EvEfiSpdmDevicePolicy,
            EvEfiSpdmDeviceAuthority,
        ] {
            self.register(event_type.tag(), move |event| {
                let mut reader = ByteReader::new(&event.event_data);
                match parse_variable_event(event_type, &mut reader)? {
                    VariableEvent::Variable(variable) => {
                        Ok(TypedEventPayload::UefiVariable(variable))
                    },
                    VariableEvent::BootOrder(boot_order) => {
                        Ok(TypedEventPayload::BootOrder(boot_order))
                    },
                }
            });
        }
    }

    fn register_ima_catalog(&mut self) {
        for descriptor in template_descriptors() {
            let name = descriptor.name;
            self.register(EventType::ImaTemplate(name.to_string()), move |event| {
                ImaMeasurement::parse(name, &event.event_data)
                    .map(TypedEventPayload::ImaMeasurement)
                    .map_err(DecodeError::InvalidEventData)
            });
        }
    }

    fn register_cel_catalog(&mut self) {
        for management_type in MANAGEMENT_TYPES {
            self.register(EventType::CelManagement(management_type), move |event| {
                CelManagementEvent::from_event_data(management_type, &event.event_data)
                    .map(TypedEventPayload::CelManagement)
            });
        }
    }
}
