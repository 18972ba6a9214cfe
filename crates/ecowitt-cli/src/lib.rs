//! Command-line interface for Ecowitt weather station gateways.
//!
//! The `ecowitt` binary talks to GW1000, GW1100, GW2000 and WH2650 class
//! gateways over their local binary API.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `discover` | Broadcast for gateways on the local network |
//! | `listen` | Collect the beacons gateways send periodically |
//! | `live-data` | Read live sensor data |
//! | `sensors` | List paired sensors with battery and signal state |
//! | `firmware` | Show the firmware version |
//! | `mac` | Show the gateway MAC address |
//! | `system-params` | Show frequency, sensor type and clock |
//! | `rain` | Show rain data |
//! | `calibration` | Show gain and offset calibration |
//! | `offsets` | Show per-channel sensor offsets |
//! | `services` | Show weather service upload settings |
//! | `config` | Manage CLI configuration |
//! | `completions` | Generate shell completions |
//!
//! # Output Formats
//!
//! - **Text** (default): aligned, human-readable output
//! - **JSON**: machine-readable, absent readings are `null`
//! - **CSV**: one record per line
//!
//! # Configuration
//!
//! The CLI reads `~/.config/ecowitt/config.toml` (or platform equivalent).
//! Top-level keys are `format` and `no_color`; the `[gateway]` table takes
//! the library's device settings:
//!
//! ```toml
//! format = "text"
//!
//! [gateway]
//! ip = "192.168.1.20"
//! port = 45000
//! socket_timeout = 2.0
//!
//! [gateway.retry]
//! max_tries = 3
//! retry_wait = 10.0
//!
//! [gateway.sensors]
//! show_battery = false
//! ```
//!
//! # Environment Variables
//!
//! - `ECOWITT_IP`: Gateway address (overridden by `--ip`)
//! - `ECOWITT_CONFIG`: Alternative config file
//! - `NO_COLOR`: Disable colored output when set
//! - `RUST_LOG`: Log filter when neither `--verbose` nor `--quiet` is given
//!
//! # Examples
//!
//! ```bash
//! ecowitt discover
//! ecowitt live-data --ip 192.168.1.20
//! ecowitt sensors --all --format json
//! ```

// Re-export core dependencies for convenience
pub use ecowitt_core;
pub use ecowitt_types;
