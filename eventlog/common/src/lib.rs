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

pub mod algorithm;
pub mod byte_reader;
pub mod byte_writer;
pub mod codec;
pub mod editor;
pub mod error;
pub mod model;
pub mod pcr;

pub use algorithm::{Digest, DigestAlgorithm};
pub use codec::{DecodeLimits, EventLogCodec};
pub use error::{DecodeError, EditError, EncodeError, RegistryError, ReplayError};
pub use model::{Event, EventLog, EventType, HandleKind, LogFormat, SpecIdHeader};
pub use pcr::{PcrBank, ReplayOptions, ReplayPolicy, ResetMode};
