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

//! Typed views of PC Client event payloads
//!
//! These structures are derived from `Event::event_data` on request and never replace it.
//! Byte fields are kept as lowercase hex strings so that the structures serialize directly.

use serde::Serialize;

use eventlog_common::model::SpecIdHeader;

use crate::uefi::device_path::DevicePathNode;

pub const UEFI_PARTITION_NAME_UNITS: usize = 36;
pub const UEFI_PARTITION_ENTRY_MIN_SIZE: usize = 128;

/// EFI_GLOBAL_VARIABLE vendor GUID
pub const EFI_GLOBAL_VARIABLE_GUID: &str = "8be4df61-93ca-11d2-aa0d-00e098032b8c";
pub const EFI_CERT_X509_GUID: &str = "a5c059a1-94e4-4aa7-87b5-ab155c2bf072";
pub const EFI_CERT_SHA256_GUID: &str = "c1c41626-504c-4092-aca9-41f936934328";

/// EV_NO_ACTION payloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoActionEvent {
    SpecId(SpecIdHeader),
    StartupLocality { locality: u8 },
    Unknown { data: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeparatorEvent {
    Value(u32),
    Raw(String),
}

/// Free-form ASCII events such as EV_ACTION and EV_EFI_ACTION
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionEvent {
    pub action: String,
}

/// EV_POST_CODE, EV_S_CRTM_CONTENTS and EV_EFI_PLATFORM_FIRMWARE_BLOB(2)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FirmwareBlobEvent {
    Blob { blob_base: u64, blob_length: u64 },
    Blob2 { blob_description: String, blob_base: u64, blob_length: u64 },
    Description(String),
}

/// S-CRTM version as a GUID or a UCS-2 string
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SCrtmVersionEvent {
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaggedEvent {
    pub tagged_event_id: u32,
    pub tagged_event_data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureData {
    pub signature_owner: String,
    pub signature_data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureList {
    pub signature_type: String,
    pub signature_kind: &'static str,
    pub signature_list_size: u32,
    pub signature_header_size: u32,
    pub signature_size: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub signature_header: String,
    pub signatures: Vec<SignatureData>,
}

/// EFI_LOAD_OPTION stored in a Boot#### variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadOption {
    pub attributes: u32,
    pub active: bool,
    pub description: String,
    pub file_path_list: Vec<DevicePathNode>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub optional_data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UefiVariableData {
    SecureBoot { enabled: bool },
    SignatureLists(Vec<SignatureList>),
    SignatureData(SignatureData),
    SbatLevel(String),
    LoadOption(LoadOption),
    Raw(String),
}

/// UEFI_VARIABLE_DATA
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UefiVariableEvent {
    pub variable_guid: String,
    pub name: String,
    pub data: UefiVariableData,
}

/// The BootOrder variable, a list of Boot#### option numbers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootOrderEvent {
    pub variable_guid: String,
    pub entries: Vec<u16>,
}

impl BootOrderEvent {
    /// Variable names of the referenced load options, e.g. `Boot0001`
    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|entry| format!("Boot{:04X}", entry)).collect()
    }
}

/// A variable measurement is either a boot order or any other variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableEvent {
    Variable(UefiVariableEvent),
    BootOrder(BootOrderEvent),
}

/// UEFI_IMAGE_LOAD_EVENT
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageLoadEvent {
    pub image_location_in_memory: u64,
    pub image_length_in_memory: u64,
    pub image_link_time_address: u64,
    pub device_path: Vec<DevicePathNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionHeader {
    pub signature: String,
    pub revision: u32,
    pub header_size: u32,
    pub header_crc32: u32,
    pub my_lba: u64,
    pub alternate_lba: u64,
    pub first_usable_lba: u64,
    pub last_usable_lba: u64,
    pub disk_guid: String,
    pub partition_entries_lba: u64,
    pub number_of_partition_entries: u32,
    pub size_of_partition_entry: u32,
    pub partition_entry_array_crc32: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionEntry {
    pub partition_type_guid: String,
    pub unique_partition_guid: String,
    pub starting_lba: u64,
    pub ending_lba: u64,
    pub attributes: u64,
    pub partition_name: String,
}

/// UEFI_GPT_DATA
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GptEvent {
    pub header: PartitionHeader,
    pub partitions: Vec<PartitionEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandoffTable {
    pub vendor_guid: String,
    pub vendor_table: u64,
}

/// UEFI_HANDOFF_TABLE_POINTERS
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandoffTablesEvent {
    pub tables: Vec<HandoffTable>,
}
