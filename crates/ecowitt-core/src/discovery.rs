//! Gateway discovery over UDP.
//!
//! Two strategies are supported:
//!
//! - [`discover`] sends a `CMD_BROADCAST` packet and collects the replies.
//! - [`listen`] binds the beacon port and collects the identity packets
//!   gateways emit on their own, for networks where broadcasts do not make
//!   it back.
//!
//! [`run`] picks one of the two according to [`DiscoveryOptions::method`].
//!
//! Both reply formats are identical. Their payload is
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 6 | MAC address |
//! | 6 | 4 | IPv4 address |
//! | 10 | 2 | API port (BE) |
//! | 12 | 1 | SSID length, ignored |
//! | 13 | .. | AP SSID |

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use socket2::{Domain, Protocol, Socket, Type};
use time::OffsetDateTime;
use tracing::{debug, info};

use ecowitt_types::{DeviceModel, DiscoveryMethod, MacAddress, ParseError};

use crate::commands::Command;
use crate::config::duration_secs;
use crate::error::{Error, Result};
use crate::frame::{self, hex};

/// Port gateways answer `CMD_BROADCAST` on.
pub const DEFAULT_BROADCAST_PORT: u16 = 46000;

/// Port gateways send unsolicited identity beacons to.
pub const DEFAULT_LISTEN_PORT: u16 = 59387;

/// Options for device discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryOptions {
    /// Strategy used by [`run`]: `broadcast` or `listen`.
    pub method: DiscoveryMethod,
    pub broadcast_address: IpAddr,
    pub broadcast_port: u16,
    /// How long to wait for broadcast replies.
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    pub listen_port: u16,
    /// How long to collect beacons for.
    #[serde(with = "duration_secs")]
    pub listen_period: Duration,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            method: DiscoveryMethod::Broadcast,
            broadcast_address: IpAddr::V4(Ipv4Addr::BROADCAST),
            broadcast_port: DEFAULT_BROADCAST_PORT,
            timeout: Duration::from_secs(5),
            listen_port: DEFAULT_LISTEN_PORT,
            listen_period: Duration::from_secs(5),
        }
    }
}

impl DiscoveryOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn method(mut self, method: DiscoveryMethod) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn broadcast_address(mut self, address: IpAddr) -> Self {
        self.broadcast_address = address;
        self
    }

    #[must_use]
    pub fn broadcast_port(mut self, port: u16) -> Self {
        self.broadcast_port = port;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn listen_port(mut self, port: u16) -> Self {
        self.listen_port = port;
        self
    }

    #[must_use]
    pub fn listen_period(mut self, period: Duration) -> Self {
        self.listen_period = period;
        self
    }
}

/// A gateway found on the local network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredDevice {
    pub mac: MacAddress,
    pub ip_address: Ipv4Addr,
    pub port: u16,
    pub ssid: String,
    /// Model derived from the SSID.
    pub model: Option<DeviceModel>,
    pub method: DiscoveryMethod,
    #[serde(with = "time::serde::rfc3339")]
    pub captured_at: OffsetDateTime,
}

impl DiscoveredDevice {
    /// Address of the gateway's binary API.
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(self.ip_address), self.port)
    }
}

/// Decode a validated broadcast reply or beacon.
pub fn decode_broadcast_response(raw: &[u8]) -> Result<DiscoveredDevice> {
    let data = frame::payload(raw, Command::Broadcast);
    if data.len() < 12 {
        return Err(ParseError::insufficient(12, data.len()).into());
    }
    let mac = MacAddress::from_slice(&data[0..6])?;
    let ip_address = Ipv4Addr::new(data[6], data[7], data[8], data[9]);
    let port = u16::from_be_bytes([data[10], data[11]]);
    let ssid: String = data
        .get(13..)
        .unwrap_or_default()
        .iter()
        .map(|&b| char::from(b))
        .collect();
    let model = DeviceModel::from_name(&ssid);

    Ok(DiscoveredDevice {
        mac,
        ip_address,
        port,
        ssid,
        model,
        method: DiscoveryMethod::Broadcast,
        captured_at: OffsetDateTime::now_utc(),
    })
}

/// Drop devices whose MAC was already seen, keeping the first occurrence.
pub fn dedup_by_mac(devices: Vec<DiscoveredDevice>) -> Vec<DiscoveredDevice> {
    let mut unique: Vec<DiscoveredDevice> = Vec::with_capacity(devices.len());
    for device in devices {
        if !unique.iter().any(|d| d.mac == device.mac) {
            unique.push(device);
        }
    }
    unique
}

/// Find gateways with the strategy selected by `options.method`.
///
/// `Configured` is not a discovery strategy and is rejected.
pub fn run(options: &DiscoveryOptions) -> Result<Vec<DiscoveredDevice>> {
    match options.method {
        DiscoveryMethod::Broadcast => discover(options),
        DiscoveryMethod::Listen => listen(options),
        DiscoveryMethod::Configured => Err(Error::invalid_config(
            "discovery.method must be broadcast or listen",
        )),
    }
}

/// Broadcast `CMD_BROADCAST` and collect replies until `options.timeout`
/// elapses.
///
/// No replies is not an error; the result is then empty.
pub fn discover(options: &DiscoveryOptions) -> Result<Vec<DiscoveredDevice>> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket.set_broadcast(true)?;
    socket.set_multicast_ttl_v4(1)?;

    let packet = frame::build_command(Command::Broadcast.code(), &[])?;
    let target = SocketAddr::new(options.broadcast_address, options.broadcast_port);
    debug!("Sending broadcast packet '{}' to {}", hex(&packet), target);
    socket.send_to(&packet, target)?;

    let devices = collect(&socket, options.timeout, DiscoveryMethod::Broadcast)?;
    info!("Discovery found {} device(s)", devices.len());
    Ok(devices)
}

/// Bind the beacon port and collect beacons for `options.listen_period`.
pub fn listen(options: &DiscoveryOptions) -> Result<Vec<DiscoveredDevice>> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    let bind = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), options.listen_port);
    socket.bind(&bind.into())?;
    let socket: UdpSocket = socket.into();
    debug!("Listening for beacons on {}", bind);

    let devices = collect(&socket, options.listen_period, DiscoveryMethod::Listen)?;
    info!("Listening found {} device(s)", devices.len());
    Ok(devices)
}

fn collect(
    socket: &UdpSocket,
    window: Duration,
    method: DiscoveryMethod,
) -> Result<Vec<DiscoveredDevice>> {
    let deadline = Instant::now() + window;
    let mut devices: Vec<DiscoveredDevice> = Vec::new();
    let mut buf = [0u8; 1024];

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        socket.set_read_timeout(Some(remaining))?;
        let (n, from) = match socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                break;
            }
            Err(e) => return Err(e.into()),
        };
        let response = &buf[..n];
        debug!("Received {} bytes from {}: {}", n, from, hex(response));

        if let Err(e) = frame::validate(response, Command::Broadcast.code()) {
            debug!("Ignoring invalid discovery reply from {}: {}", from, e);
            continue;
        }
        match decode_broadcast_response(response) {
            Ok(mut device) => {
                if devices.iter().any(|d| d.mac == device.mac) {
                    continue;
                }
                device.method = method;
                devices.push(device);
            }
            Err(e) => debug!("Ignoring undecodable discovery reply from {}: {}", from, e),
        }
    }
    Ok(devices)
}
