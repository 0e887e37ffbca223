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

//! GHS Peripheral demo binary.
//!
//! Runs the GATT server over the in-process simulated stack and scripts
//! a central that connects, negotiates an MTU and subscribes to
//! observations, so the full notification pipeline can be watched in the
//! logs.

use anyhow::Result;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ghs_peripheral::config::Config;
use ghs_peripheral::gatt::{uuids, GattServer};
use ghs_peripheral::services::{
    CurrentTimeService, DeviceInformationService, EmitterSettings, GenericHealthSensorService,
};
use ghs_peripheral::simulator::SimulatedTransport;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ghs_peripheral=info".parse()?),
        )
        .init();

    info!("Starting GHS Peripheral v{}...", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    info!("Configuration loaded; device name '{}'", config.device.name);

    let (transport, events) = SimulatedTransport::new();
    let server = GattServer::new(transport.clone());
    let manager = server.manager();

    server.register_service(GenericHealthSensorService::new(
        manager.clone(),
        EmitterSettings {
            observation_type: config.observation.observation_type,
            unit: config.observation.unit,
            precision: config.observation.precision,
            base_value: config.observation.base_value,
            spread: config.observation.spread,
            interval: Duration::from_millis(config.observation.interval_ms),
        },
    ));
    server.register_service(CurrentTimeService::new(manager.clone()));
    server.register_service(DeviceInformationService::new(
        config.device.manufacturer.clone(),
        config.device.model.clone(),
    ));

    let server_task = tokio::spawn(server.clone().run(events));

    // Script a demo central against the simulated stack.
    transport.central_connects("11:22:33:44:55:66", Some("demo-central"));
    transport.central_negotiates_mtu("11:22:33:44:55:66", 185);
    transport.central_writes_ccc(
        "11:22:33:44:55:66",
        uuids::OBSERVATION_CHARACTERISTIC_UUID,
        &uuids::ccc::ENABLE_NOTIFICATION,
    );

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    server.close();
    server_task.abort();
    info!("GHS Peripheral stopped");
    Ok(())
}
