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


//! Linux IMA runtime measurement lists
//!
//! Each record extends one PCR (normally 10) with a template hash computed over the record's
//! template data. The ASCII and binary exports of the kernel are both supported.

pub mod measurement_log;
pub mod template;

pub use measurement_log::{ImaAsciiCodec, ImaBinaryCodec, ImaOptions};
pub use template::{lookup_template, template_descriptors, ImaMeasurement, TemplateField};
