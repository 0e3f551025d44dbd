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

//! TCG firmware event logs
//!
//! Codecs for the SHA1-only log written by TPM 1.2 era firmware and the crypto-agile log of the
//! TCG PC Client Platform Firmware Profile, plus typed parsers for PC Client event payloads.

pub mod crypto_agile;
pub mod event_type;
pub mod legacy;
pub mod record;
pub mod spec_id;
pub mod uefi;

pub use crypto_agile::CryptoAgileTcgCodec;
pub use event_type::{event_type_name, TcgEventType};
pub use legacy::LegacyTcgCodec;
