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


//! TCG Canonical Event Log
//!
//! Both the TLV and the JSON encoding carry the same records: a record number, a PCR or NV
//! index handle, a digest list and one content block (PC Client event, IMA template or CEL
//! management record).

pub mod json_log;
pub mod management;
pub mod record;
pub mod tlv;
pub mod tlv_log;

pub use json_log::CelJsonCodec;
pub use management::{CelManagementEvent, StateTransition};
pub use tlv_log::CelTlvCodec;
