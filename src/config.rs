// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration module.
//!
//! Handles loading and saving application settings.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::observations::{ObservationType, UnitCode};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device settings.
    pub device: DeviceConfig,

    /// Emitted-observation settings.
    pub observation: ObservationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Device name advertised over Bluetooth.
    pub name: String,

    /// Manufacturer string exposed by the Device Information service.
    pub manufacturer: String,

    /// Model number string exposed by the Device Information service.
    pub model: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: "GHS Peripheral".to_string(),
            manufacturer: "Acme Medical".to_string(),
            model: "GHS-1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservationConfig {
    /// Milliseconds between emitted observations.
    pub interval_ms: u64,

    /// What the simulated sensor measures.
    pub observation_type: ObservationType,

    /// Unit of the emitted values.
    pub unit: UnitCode,

    /// Fractional digits carried by the emitted values.
    pub precision: u8,

    /// Center of the simulated value range.
    pub base_value: f32,

    /// Maximum deviation from `base_value`.
    pub spread: f32,
}

impl Default for ObservationConfig {
    fn default() -> Self {
        Self {
            interval_ms: 5000,
            observation_type: ObservationType::PulseRate,
            unit: UnitCode::Bpm,
            precision: 1,
            base_value: 85.0,
            spread: 4.0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            observation: ObservationConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file or create default.
    pub fn load() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ghs-peripheral");
        std::fs::create_dir_all(&config_dir)?;
        Self::load_from(&config_dir.join("config.toml"))
    }

    /// Load from an explicit path, writing defaults when it is missing.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            Ok(toml::from_str(&content)?)
        } else {
            let config = Self::default();
            let content = toml::to_string_pretty(&config)?;
            std::fs::write(config_path, content)?;
            Ok(config)
        }
    }

    /// Save configuration to file.
    pub fn save(&self) -> Result<()> {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ghs-peripheral");
        std::fs::create_dir_all(&config_dir)?;

        let config_path = config_dir.join("config.toml");
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;

        Ok(())
    }
}
