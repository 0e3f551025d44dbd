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


use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use eventlog_common::codec::DecodeLimits;
use eventlog_common::pcr::ReplayOptions;
use ima_eventlog::ImaOptions;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Logger error: {0}")]
    Logger(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub log_directory: String,
    pub log_file_name: String,
    pub max_file_size: u64,
    pub max_zip_count: u32,
    pub level: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            log_directory: "logs".to_string(),
            log_file_name: "eventlog.log".to_string(),
            max_file_size: 10 * 1024 * 1024,
            max_zip_count: 6,
            level: "info".to_string(),
        }
    }
}

/// Toolkit configuration; every section falls back to its default when omitted
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct EventLogConfig {
    pub logging: LoggerConfig,
    pub limits: DecodeLimits,
    pub ima: ImaOptions,
    pub replay: ReplayOptions,
}

impl EventLogConfig {
    pub fn from_yaml(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let config_str = std::fs::read_to_string(path.into())?;
        Self::from_yaml_str(&config_str)
    }

    pub fn from_yaml_str(config_str: &str) -> Result<Self, ConfigError> {
        // an empty document deserializes to unit, not to an empty mapping
        if config_str.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(config_str)?)
    }
}
