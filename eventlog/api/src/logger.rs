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


//! log4rs initialisation
//!
//! Log records go to a size-rolled file; rolled files are gzip-compressed and kept up to
//! `max_zip_count`.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use chrono::{DateTime, Local};
use log::{info, LevelFilter};
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::{
    append::rolling_file::RollingFileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    Config, Handle,
};

use crate::config::{ConfigError, EventLogConfig, LoggerConfig};

const APPENDER_NAME: &str = "eventlog_appender";

static LOGGER: OnceLock<Logger> = OnceLock::new();

pub struct Logger {
    handle: Handle,
    config: Mutex<LoggerConfig>,
}

impl Logger {
    pub fn new(config: &LoggerConfig) -> Result<Self, ConfigError> {
        let handle = log4rs::init_config(Self::build_config(config)?)
            .map_err(|e| ConfigError::Logger(e.to_string()))?;
        Ok(Self { handle, config: Mutex::new(config.clone()) })
    }

    /// Switch the root level without touching the appender settings
    pub fn set_level(&self, level: &str) -> Result<(), ConfigError> {
        let mut config = self
            .config
            .lock()
            .map_err(|e| ConfigError::Logger(format!("Failed to lock logger config: {}", e)))?;
        config.level = level.to_string();
        self.handle.set_config(Self::build_config(&config)?);
        Ok(())
    }

    pub fn log_file(&self) -> Result<PathBuf, ConfigError> {
        let config = self
            .config
            .lock()
            .map_err(|e| ConfigError::Logger(format!("Failed to lock logger config: {}", e)))?;
        Ok(Path::new(&config.log_directory).join(&config.log_file_name))
    }

    fn build_config(config: &LoggerConfig) -> Result<Config, ConfigError> {
        let appender = Self::create_appender(config)?;
        let root = Root::builder()
            .appender(APPENDER_NAME)
            .build(Self::parse_level(&config.level));
        Config::builder()
            .appender(Appender::builder().build(APPENDER_NAME, Box::new(appender)))
            .build(root)
            .map_err(|e| ConfigError::Logger(e.to_string()))
    }

    fn create_appender(config: &LoggerConfig) -> Result<RollingFileAppender, ConfigError> {
        std::fs::create_dir_all(&config.log_directory)?;

        let now: DateTime<Local> = Local::now();
        let formatted_time = now.format("%Y%m%d%H%M%S%3f").to_string();

        let log_file = format!("{}/{}", config.log_directory, config.log_file_name);
        let archived_log_pattern = format!(
            "{}/{}-{{}}-{}.gz",
            config.log_directory, config.log_file_name, formatted_time
        );

        let size_trigger = SizeTrigger::new(config.max_file_size);
        let roller = FixedWindowRoller::builder()
            .build(&archived_log_pattern, config.max_zip_count)
            .map_err(|e| ConfigError::Logger(e.to_string()))?;
        let compound_policy = CompoundPolicy::new(Box::new(size_trigger), Box::new(roller));

        RollingFileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(
                "{d(%Y-%m-%d %H:%M:%S:%3f)} {l} [{M}:{L}] - {m}{n}",
            )))
            .build(log_file, Box::new(compound_policy))
            .map_err(ConfigError::Io)
    }

    fn parse_level(level: &str) -> LevelFilter {
        match level.to_lowercase().as_str() {
            "trace" => LevelFilter::Trace,
            "debug" => LevelFilter::Debug,
            "info" => LevelFilter::Info,
            "warn" => LevelFilter::Warn,
            "error" => LevelFilter::Error,
            "off" => LevelFilter::Off,
            _ => LevelFilter::Info,
        }
    }
}

/// Initialize logging from the `logging` section of a configuration
///
/// # Errors
/// * `ConfigError::Logger` when logging is already initialized or log4rs rejects the setup
/// * `ConfigError::Io` when the log directory cannot be created
pub fn init_with_config(config: &LoggerConfig) -> Result<(), ConfigError> {
    if LOGGER.get().is_some() {
        return Err(ConfigError::Logger("Logger already initialized".to_string()));
    }
    let logger = Logger::new(config)?;
    if LOGGER.set(logger).is_err() {
        return Err(ConfigError::Logger("Logger already initialized".to_string()));
    }
    info!("Logging to {}/{} at level {}", config.log_directory, config.log_file_name, config.level);
    Ok(())
}

/// Initialize logging from a toolkit configuration file
pub fn init_with_yaml(config_path: impl Into<PathBuf>) -> Result<(), ConfigError> {
    let config = EventLogConfig::from_yaml(config_path)?;
    init_with_config(&config.logging)
}

/// The process logger, once initialized
pub fn logger() -> Option<&'static Logger> {
    LOGGER.get()
}
