//! Client library for the Ecowitt gateway binary API.
//!
//! Ecowitt gateways (GW1000, GW1100, GW2000, WH2650 and relatives) collect
//! readings from wireless weather sensors and expose them on the local
//! network through a small binary protocol on TCP port 45000. This crate
//! implements that protocol.
//!
//! # Features
//!
//! - **Framing**: command packet construction and response validation
//! - **Transport**: one TCP connection per command, with bounded retries
//! - **Decoding**: table driven decoding of live data and rain responses,
//!   plus every fixed-layout configuration response
//! - **Sensors**: per-model battery and signal interpretation
//! - **Discovery**: UDP broadcast and beacon listening, rediscovery by MAC
//! - **Testing**: a loopback mock gateway with failure injection
//!
//! # Protocol Layers
//!
//! | Layer | Module |
//! |-------|--------|
//! | Command codes | [`commands`] |
//! | Frame envelope | [`frame`] |
//! | Field decoders | [`decode`], [`fields`] |
//! | Response parsing | [`parser`] |
//! | Sensor state | [`sensors`] |
//! | TCP exchange | [`transport`], [`retry`] |
//! | UDP discovery | [`discovery`] |
//! | High level API | [`device`] |
//!
//! All I/O is blocking with explicit timeouts; there is no async runtime.
//!
//! # Quick Start
//!
//! ```no_run
//! use ecowitt_core::{Device, DiscoveryOptions};
//!
//! fn main() -> Result<(), ecowitt_core::Error> {
//!     // Find the first gateway on the network
//!     let mut device = Device::discover(DiscoveryOptions::default())?;
//!     println!("Firmware: {}", device.firmware_version()?);
//!
//!     // Read live data
//!     for (name, value) in device.livedata()?.iter() {
//!         match value {
//!             Some(value) => println!("{name}: {value}"),
//!             None => println!("{name}: --"),
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod commands;
pub mod config;
pub mod decode;
pub mod device;
pub mod discovery;
pub mod error;
pub mod fields;
pub mod frame;
pub mod mock;
pub mod parser;
pub mod retry;
pub mod sensors;
pub mod transport;

pub use commands::Command;
pub use config::DeviceConfig;
pub use device::{Calibration, CustomUpload, Device};
pub use discovery::{
    DiscoveredDevice, DiscoveryOptions, decode_broadcast_response, dedup_by_mac, discover, listen,
};
pub use error::{Error, Result};
pub use fields::{FieldDecoder, FieldSpec, FieldTable};
pub use frame::{LengthField, build_command, checksum, validate};
pub use mock::{FailureMode, MockBeacon, MockGateway};
pub use parser::{AddressedData, Parser, UnknownField, UnknownFieldPolicy, lightning_time};
pub use retry::{RetryConfig, with_retry};
pub use sensors::{SensorOptions, SensorRegistry, SensorState};
pub use transport::GatewayApi;

// Re-export types for convenience
pub use ecowitt_types;
pub use ecowitt_types::{DeviceModel, DiscoveryMethod, MacAddress, Observations, Value};
