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

//! TCG PC Client event types
//!
//! Event types are kept as raw `u32` values in the unified model so that values introduced by
//! later revisions of the PC Client specification still decode. `TcgEventType` names the values
//! this crate knows how to interpret.

use std::fmt;

use eventlog_common::model::EventType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum TcgEventType {
    EvPrebootCert = 0x00000000,
    EvPostCode = 0x00000001,
    EvUnused = 0x00000002,
    EvNoAction = 0x00000003,
    EvSeparator = 0x00000004,
    EvAction = 0x00000005,
    EvEventTag = 0x00000006,
    EvSCrtmContents = 0x00000007,
    EvSCrtmVersion = 0x00000008,
    EvCpuMicrocode = 0x00000009,
    EvPlatformConfigFlags = 0x0000000A,
    EvTableOfDevices = 0x0000000B,
    EvCompactHash = 0x0000000C,
    EvIpl = 0x0000000D,
    EvIplPartitionData = 0x0000000E,
    EvNonhostCode = 0x0000000F,
    EvNonhostConfig = 0x00000010,
    EvNonhostInfo = 0x00000011,
    EvOmitBootDeviceEvents = 0x00000012,
    EvPostCode2 = 0x00000013,

    EvEfiEventBase = 0x80000000,
    EvEfiVariableDriverConfig = 0x80000001,
    EvEfiVariableBoot = 0x80000002,
    EvEfiBootServicesApplication = 0x80000003,
    EvEfiBootServicesDriver = 0x80000004,
    EvEfiRuntimeServicesDriver = 0x80000005,
    EvEfiGptEvent = 0x80000006,
    EvEfiAction = 0x80000007,
    EvEfiPlatformFirmwareBlob = 0x80000008,
    EvEfiHandoffTables = 0x80000009,
    EvEfiPlatformFirmwareBlob2 = 0x8000000A,
    EvEfiHandoffTables2 = 0x8000000B,
    EvEfiVariableBoot2 = 0x8000000C,
    EvEfiGptEvent2 = 0x8000000D,
    EvEfiHcrtmEvent = 0x80000010,
    EvEfiVariableAuthority = 0x800000E0,
    EvEfiSpdmFirmwareBlob = 0x800000E1,
    EvEfiSpdmFirmwareConfig = 0x800000E2,
    EvEfiSpdmDevicePolicy = 0x800000E3,
    EvEfiSpdmDeviceAuthority = 0x800000E4,
}

use TcgEventType::*;

const EVENT_TYPES: [(TcgEventType, &str); 40] = [
    (EvPrebootCert, "EV_PREBOOT_CERT"),
    (EvPostCode, "EV_POST_CODE"),
    (EvUnused, "EV_UNUSED"),
    (EvNoAction, "EV_NO_ACTION"),
    (EvSeparator, "EV_SEPARATOR"),
    (EvAction, "EV_ACTION"),
    (EvEventTag, "EV_EVENT_TAG"),
    (EvSCrtmContents, "EV_S_CRTM_CONTENTS"),
    (EvSCrtmVersion, "EV_S_CRTM_VERSION"),
    (EvCpuMicrocode, "EV_CPU_MICROCODE"),
    (EvPlatformConfigFlags, "EV_PLATFORM_CONFIG_FLAGS"),
    (EvTableOfDevices, "EV_TABLE_OF_DEVICES"),
    (EvCompactHash, "EV_COMPACT_HASH"),
    (EvIpl, "EV_IPL"),
    (EvIplPartitionData, "EV_IPL_PARTITION_DATA"),
    (EvNonhostCode, "EV_NONHOST_CODE"),
    (EvNonhostConfig, "EV_NONHOST_CONFIG"),
    (EvNonhostInfo, "EV_NONHOST_INFO"),
    (EvOmitBootDeviceEvents, "EV_OMIT_BOOT_DEVICE_EVENTS"),
    (EvPostCode2, "EV_POST_CODE2"),
    (EvEfiEventBase, "EV_EFI_EVENT_BASE"),
    (EvEfiVariableDriverConfig, "EV_EFI_VARIABLE_DRIVER_CONFIG"),
    (EvEfiVariableBoot, "EV_EFI_VARIABLE_BOOT"),
    (EvEfiBootServicesApplication, "EV_EFI_BOOT_SERVICES_APPLICATION"),
    (EvEfiBootServicesDriver, "EV_EFI_BOOT_SERVICES_DRIVER"),
    (EvEfiRuntimeServicesDriver, "EV_EFI_RUNTIME_SERVICES_DRIVER"),
    (EvEfiGptEvent, "EV_EFI_GPT_EVENT"),
    (EvEfiAction, "EV_EFI_ACTION"),
    (EvEfiPlatformFirmwareBlob, "EV_EFI_PLATFORM_FIRMWARE_BLOB"),
    (EvEfiHandoffTables, "EV_EFI_HANDOFF_TABLES"),
    (EvEfiPlatformFirmwareBlob2, "EV_EFI_PLATFORM_FIRMWARE_BLOB2"),
    (EvEfiHandoffTables2, "EV_EFI_HANDOFF_TABLES2"),
    (EvEfiVariableBoot2, "EV_EFI_VARIABLE_BOOT2"),
    (EvEfiGptEvent2, "EV_EFI_GPT_EVENT2"),
    (EvEfiHcrtmEvent, "EV_EFI_HCRTM_EVENT"),
    (EvEfiVariableAuthority, "EV_EFI_VARIABLE_AUTHORITY"),
    (EvEfiSpdmFirmwareBlob, "EV_EFI_SPDM_FIRMWARE_BLOB"),
    (EvEfiSpdmFirmwareConfig, "EV_EFI_SPDM_FIRMWARE_CONFIG"),
    (EvEfiSpdmDevicePolicy, "EV_EFI_SPDM_DEVICE_POLICY"),
    (EvEfiSpdmDeviceAuthority, "EV_EFI_SPDM_DEVICE_AUTHORITY"),
];

impl TcgEventType {
    pub fn from_u32(value: u32) -> Option<Self> {
        EVENT_TYPES
            .iter()
            .find(|(event_type, _)| *event_type as u32 == value)
            .map(|(event_type, _)| *event_type)
    }

    pub fn value(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        EVENT_TYPES
            .iter()
            .find(|(event_type, _)| *event_type == self)
            .map(|(_, name)| *name)
            .unwrap_or("UNKNOWN")
    }

    /// Tag of this event type in the unified model
    pub fn tag(self) -> EventType {
        EventType::PcClient(self as u32)
    }

    /// Events whose payload is the UEFI_VARIABLE_DATA structure
    pub fn is_variable_event(self) -> bool {
        matches!(
            self,
            EvEfiVariableDriverConfig
                | EvEfiVariableBoot
                | EvEfiVariableBoot2
                | EvEfiVariableAuthority
                | EvEfiSpdmDevicePolicy
                | EvEfiSpdmDeviceAuthority
        )
    }
}

impl fmt::Display for TcgEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Display name of a raw PC Client event type value
pub fn event_type_name(value: u32) -> String {
    match TcgEventType::from_u32(value) {
        Some(event_type) => event_type.name().to_string(),
        None => format!("UNKNOWN_0x{:08X}", value),
    }
}
