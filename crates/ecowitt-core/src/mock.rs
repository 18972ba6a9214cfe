//! Mock gateway implementation for testing.
//!
//! This module provides a loopback gateway that can be used for unit and
//! integration testing without real hardware.
//!
//! # Features
//!
//! - **Canned responses**: answer each command code with a fixed frame
//! - **Failure injection**: corrupt, misaddress or drop the next responses
//! - **Request counting**: observe how many attempts a client made
//! - **Discovery**: [`MockBeacon`] answers `CMD_BROADCAST` over UDP
//!
//! # Example
//!
//! ```
//! use ecowitt_core::{GatewayApi, mock::MockGateway};
//!
//! let mock = MockGateway::builder().firmware("GW1100A_V2.1.4").start().unwrap();
//! let api = GatewayApi::new(mock.address());
//! let response = api.get_firmware_version().unwrap();
//! assert_eq!(ecowitt_core::parser::parse_firmware_version(&response).unwrap(), "GW1100A_V2.1.4");
//! ```

use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::net::{Ipv4Addr, SocketAddr, TcpListener, TcpStream, UdpSocket};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::debug;

use crate::commands::Command;
use crate::error::Result;
use crate::frame::{self, LengthField, build_command_with};

/// Captured `CMD_GW1000_LIVEDATA` response.
pub const SAMPLE_LIVE_DATA: [u8; 66] = [
    0xFF, 0xFF, 0x27, 0x00, 0x40, 0x01, 0x01, 0x40, 0x06, 0x26, 0x08, 0x27, 0xD2, 0x09, 0x27, 0xD2,
    0x2A, 0x00, 0x5A, 0x4D, 0x00, 0x65, 0x2C, 0x27, 0x2E, 0x14, 0x1A, 0x00, 0xED, 0x22, 0x3A, 0x1B,
    0x01, 0x0B, 0x23, 0x3A, 0x4C, 0x06, 0x00, 0x00, 0x00, 0x05, 0xFF, 0xFF, 0x00, 0xF6, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x62, 0x00, 0x00, 0x00, 0x00, 0x61, 0xFF, 0xFF, 0xFF, 0xFF, 0x60,
    0xFF, 0xEC,
];

/// Captured `CMD_READ_SSSS` response.
pub const SAMPLE_SYSTEM_PARAMS: [u8; 13] = [
    0xFF, 0xFF, 0x30, 0x0B, 0x00, 0x01, 0x62, 0x66, 0x8E, 0x53, 0x5E, 0x03, 0x46,
];

/// `CMD_READ_FIRMWARE_VERSION` response for `GW2000C_V2.1.4`.
pub const SAMPLE_FIRMWARE: [u8; 20] = [
    0xFF, 0xFF, 0x50, 0x12, 0x0E, 0x47, 0x57, 0x32, 0x30, 0x30, 0x30, 0x43, 0x5F, 0x56, 0x32, 0x2E,
    0x31, 0x2E, 0x34, 0xBB,
];

/// `CMD_READ_STATION_MAC` response for `E8:68:E7:87:1A:4F`.
pub const SAMPLE_STATION_MAC: [u8; 11] = [
    0xFF, 0xFF, 0x26, 0x09, 0xE8, 0x68, 0xE7, 0x87, 0x1A, 0x4F, 0x56,
];

/// Sensor ID records (address, ID, battery, signal) for a WH65 and a WH31
/// on channel 1, with channel 2 searching.
pub const SAMPLE_SENSOR_IDS: [[u8; 7]; 3] = [
    [0x00, 0x00, 0x00, 0x00, 0xC4, 0x00, 0x04],
    [0x06, 0x00, 0x00, 0x00, 0x2D, 0x00, 0x04],
    [0x07, 0xFF, 0xFF, 0xFF, 0xFE, 0x1F, 0x00],
];

/// How an injected failure corrupts a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Send the response with a wrong checksum.
    CorruptChecksum,
    /// Echo a different command code, with a valid checksum.
    WrongCommand,
    /// Close the connection without answering.
    Drop,
}

/// Build a `CMD_BROADCAST` reply for a gateway with the given identity.
pub fn broadcast_reply(mac: [u8; 6], ip: Ipv4Addr, port: u16, ssid: &str) -> Result<Vec<u8>> {
    let mut data = Vec::with_capacity(13 + ssid.len());
    data.extend_from_slice(&mac);
    data.extend_from_slice(&ip.octets());
    data.extend_from_slice(&port.to_be_bytes());
    data.push(ssid.len().min(usize::from(u8::MAX)) as u8);
    data.extend_from_slice(ssid.as_bytes());
    build_command_with(Command::Broadcast.code(), &data, LengthField::Long)
}

#[derive(Debug)]
struct MockState {
    responses: Mutex<HashMap<u8, Vec<u8>>>,
    write_status: AtomicU8,
    requests: AtomicU32,
    remaining_failures: AtomicU32,
    failure_mode: Mutex<FailureMode>,
    last_request: Mutex<Option<Vec<u8>>>,
}

/// A loopback TCP gateway answering framed commands.
///
/// The server thread stops when the mock is dropped.
pub struct MockGateway {
    address: SocketAddr,
    state: Arc<MockState>,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for MockGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockGateway")
            .field("address", &self.address)
            .field("requests", &self.request_count())
            .finish()
    }
}

impl MockGateway {
    pub fn builder() -> MockGatewayBuilder {
        MockGatewayBuilder::new()
    }

    /// Address of the mock's API port.
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Number of requests received.
    pub fn request_count(&self) -> u32 {
        self.state.requests.load(Ordering::SeqCst)
    }

    pub fn reset_request_count(&self) {
        self.state.requests.store(0, Ordering::SeqCst);
    }

    /// The most recent request packet.
    pub fn last_request(&self) -> Option<Vec<u8>> {
        lock(&self.state.last_request).clone()
    }

    /// Fail the next `count` requests using `mode`.
    pub fn fail_next(&self, count: u32, mode: FailureMode) {
        *lock(&self.state.failure_mode) = mode;
        self.state.remaining_failures.store(count, Ordering::SeqCst);
    }

    /// Status byte returned to write commands, `0x00` meaning success.
    pub fn set_write_status(&self, status: u8) {
        self.state.write_status.store(status, Ordering::SeqCst);
    }

    /// Replace the response frame for `command`.
    pub fn set_response(&self, command: Command, response: Vec<u8>) {
        lock(&self.state.responses).insert(command.code(), response);
    }

    fn serve(listener: TcpListener, state: Arc<MockState>, shutdown: Arc<AtomicBool>) {
        for stream in listener.incoming() {
            if shutdown.load(Ordering::SeqCst) {
                break;
            }
            match stream {
                Ok(stream) => {
                    if let Err(e) = Self::handle(stream, &state) {
                        debug!("Mock gateway connection error: {}", e);
                    }
                }
                Err(e) => debug!("Mock gateway accept error: {}", e),
            }
        }
    }

    fn handle(mut stream: TcpStream, state: &MockState) -> io::Result<()> {
        stream.set_read_timeout(Some(Duration::from_secs(2)))?;
        let mut buf = [0u8; 1024];
        let n = stream.read(&mut buf)?;
        if n < 3 {
            return Ok(());
        }
        let request = &buf[..n];
        state.requests.fetch_add(1, Ordering::SeqCst);
        *lock(&state.last_request) = Some(request.to_vec());

        let code = request[2];
        let Some(mut response) = Self::response_for(code, state) else {
            return Ok(());
        };

        let failing = state
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            match *lock(&state.failure_mode) {
                FailureMode::Drop => return Ok(()),
                FailureMode::CorruptChecksum => {
                    if let Some(last) = response.last_mut() {
                        *last = last.wrapping_add(1);
                    }
                }
                FailureMode::WrongCommand => {
                    if response.len() >= frame::MIN_FRAME_LEN {
                        let last = response.len() - 1;
                        response[2] = response[2].wrapping_add(1);
                        response[last] = frame::checksum(&response[2..last]);
                    }
                }
            }
        }
        stream.write_all(&response)
    }

    fn response_for(code: u8, state: &MockState) -> Option<Vec<u8>> {
        if let Some(response) = lock(&state.responses).get(&code) {
            return Some(response.clone());
        }
        let command = Command::try_from(code).ok()?;
        if command.is_write() {
            let status = state.write_status.load(Ordering::SeqCst);
            return frame::build_command(code, &[status]).ok();
        }
        None
    }
}

impl Drop for MockGateway {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        // wake the accept loop
        let _ = TcpStream::connect_timeout(&self.address, Duration::from_millis(200));
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Builder for [`MockGateway`].
#[derive(Debug, Default)]
pub struct MockGatewayBuilder {
    responses: HashMap<u8, Vec<u8>>,
}

impl MockGatewayBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `command` with a frame carrying `payload`.
    #[must_use]
    pub fn response(mut self, command: Command, payload: &[u8]) -> Self {
        if let Ok(frame) = build_command_with(command.code(), payload, command.length_field()) {
            self.responses.insert(command.code(), frame);
        }
        self
    }

    /// Answer `command` with a complete, possibly malformed, frame.
    #[must_use]
    pub fn raw_response(mut self, command: Command, frame: &[u8]) -> Self {
        self.responses.insert(command.code(), frame.to_vec());
        self
    }

    #[must_use]
    pub fn firmware(self, version: &str) -> Self {
        let mut payload = Vec::with_capacity(1 + version.len());
        payload.push(version.len().min(usize::from(u8::MAX)) as u8);
        payload.extend_from_slice(version.as_bytes());
        self.response(Command::ReadFirmwareVersion, &payload)
    }

    #[must_use]
    pub fn mac(self, mac: [u8; 6]) -> Self {
        self.response(Command::ReadStationMac, &mac)
    }

    #[must_use]
    pub fn sensor_ids(self, records: &[[u8; 7]]) -> Self {
        let payload: Vec<u8> = records.iter().flatten().copied().collect();
        self.response(Command::ReadSensorIdNew, &payload)
    }

    /// Load the captured sample responses.
    #[must_use]
    pub fn with_sample_data(self) -> Self {
        self.raw_response(Command::LiveData, &SAMPLE_LIVE_DATA)
            .raw_response(Command::ReadSsss, &SAMPLE_SYSTEM_PARAMS)
            .raw_response(Command::ReadFirmwareVersion, &SAMPLE_FIRMWARE)
            .raw_response(Command::ReadStationMac, &SAMPLE_STATION_MAC)
            .sensor_ids(&SAMPLE_SENSOR_IDS)
    }

    /// Bind a loopback port and start serving.
    pub fn start(self) -> io::Result<MockGateway> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))?;
        let address = listener.local_addr()?;
        let state = Arc::new(MockState {
            responses: Mutex::new(self.responses),
            write_status: AtomicU8::new(0),
            requests: AtomicU32::new(0),
            remaining_failures: AtomicU32::new(0),
            failure_mode: Mutex::new(FailureMode::Drop),
            last_request: Mutex::new(None),
        });
        let shutdown = Arc::new(AtomicBool::new(false));
        let handle = {
            let state = Arc::clone(&state);
            let shutdown = Arc::clone(&shutdown);
            thread::Builder::new()
                .name("mock-gateway".to_string())
                .spawn(move || MockGateway::serve(listener, state, shutdown))?
        };
        Ok(MockGateway {
            address,
            state,
            shutdown,
            handle: Some(handle),
        })
    }
}

/// A loopback UDP responder answering `CMD_BROADCAST` with canned replies.
pub struct MockBeacon {
    address: SocketAddr,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for MockBeacon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBeacon")
            .field("address", &self.address)
            .finish()
    }
}

impl MockBeacon {
    /// Start answering broadcasts with every frame in `replies`, in order.
    pub fn start(replies: Vec<Vec<u8>>) -> io::Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0))?;
        socket.set_read_timeout(Some(Duration::from_millis(50)))?;
        let address = socket.local_addr()?;
        let shutdown = Arc::new(AtomicBool::new(false));
        let handle = {
            let shutdown = Arc::clone(&shutdown);
            thread::Builder::new()
                .name("mock-beacon".to_string())
                .spawn(move || Self::serve(socket, replies, shutdown))?
        };
        Ok(Self {
            address,
            shutdown,
            handle: Some(handle),
        })
    }

    pub fn port(&self) -> u16 {
        self.address.port()
    }

    /// Send `replies` as unsolicited beacons to `target`.
    pub fn send_beacons(target: SocketAddr, replies: &[Vec<u8>]) -> io::Result<()> {
        let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0))?;
        for reply in replies {
            socket.send_to(reply, target)?;
        }
        Ok(())
    }

    fn serve(socket: UdpSocket, replies: Vec<Vec<u8>>, shutdown: Arc<AtomicBool>) {
        let mut buf = [0u8; 64];
        while !shutdown.load(Ordering::SeqCst) {
            let Ok((n, from)) = socket.recv_from(&mut buf) else {
                continue;
            };
            if buf[..n].get(2) != Some(&Command::Broadcast.code()) {
                continue;
            }
            for reply in &replies {
                if let Err(e) = socket.send_to(reply, from) {
                    debug!("Mock beacon send error: {}", e);
                }
            }
        }
    }
}

impl Drop for MockBeacon {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
