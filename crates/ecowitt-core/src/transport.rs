//! TCP command transport.
//!
//! Each command opens a fresh TCP connection to the gateway, writes one
//! framed packet and reads one framed response. The gateway closes idle
//! connections quickly, so no connection is kept between commands.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use tracing::debug;

use crate::commands::Command;
use crate::config::DEFAULT_SOCKET_TIMEOUT;
use crate::error::{Error, Result};
use crate::frame::{self, hex};
use crate::retry::{RetryConfig, with_retry_exhausted};

const READ_CHUNK: usize = 1024;

/// Client for a gateway's binary API.
#[derive(Debug, Clone)]
pub struct GatewayApi {
    address: SocketAddr,
    socket_timeout: Duration,
    retry: RetryConfig,
}

impl GatewayApi {
    pub fn new(address: SocketAddr) -> Self {
        Self {
            address,
            socket_timeout: DEFAULT_SOCKET_TIMEOUT,
            retry: RetryConfig::default(),
        }
    }

    #[must_use]
    pub fn socket_timeout(mut self, timeout: Duration) -> Self {
        self.socket_timeout = timeout;
        self
    }

    #[must_use]
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn set_address(&mut self, address: SocketAddr) {
        self.address = address;
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Send a command and return its validated response frame.
    ///
    /// Timeouts, socket errors and invalid responses are retried. Once the
    /// budget is spent the last cause is wrapped in
    /// [`Error::RetriesExhausted`].
    pub fn send_command(&self, command: Command, payload: &[u8]) -> Result<Vec<u8>> {
        let packet = frame::build_command(command.code(), payload)?;
        with_retry_exhausted(&self.retry, command.name(), || {
            self.exchange(command, &packet)
        })
    }

    /// Send a command given by its symbolic name, e.g. `CMD_READ_SSSS`.
    pub fn send_command_str(&self, name: &str, payload: &[u8]) -> Result<Vec<u8>> {
        let command = Command::from_name(name)?;
        self.send_command(command, payload)
    }

    /// Send a write command and check the gateway's status byte.
    pub fn write_command(&self, command: Command, payload: &[u8]) -> Result<()> {
        let response = self.send_command(command, payload)?;
        frame::confirm_write(&response, command)
    }

    fn exchange(&self, command: Command, packet: &[u8]) -> Result<Vec<u8>> {
        debug!("Sending {} to {}: {}", command, self.address, hex(packet));
        let mut stream = TcpStream::connect_timeout(&self.address, self.socket_timeout)
            .map_err(|e| self.map_io(command, e))?;
        stream.set_read_timeout(Some(self.socket_timeout))?;
        stream.set_write_timeout(Some(self.socket_timeout))?;
        stream
            .write_all(packet)
            .map_err(|e| self.map_io(command, e))?;

        let length = command.length_field();
        let mut response = Vec::with_capacity(READ_CHUNK);
        let mut buf = [0u8; READ_CHUNK];
        loop {
            let n = stream
                .read(&mut buf)
                .map_err(|e| self.map_io(command, e))?;
            if n == 0 {
                break;
            }
            response.extend_from_slice(&buf[..n]);
            if let Some(expected) = frame::declared_frame_len(&response, length)
                && response.len() >= expected
            {
                response.truncate(expected);
                break;
            }
        }
        debug!("Received {} bytes: {}", response.len(), hex(&response));

        frame::validate(&response, command.code())?;
        Ok(response)
    }

    fn map_io(&self, command: Command, error: io::Error) -> Error {
        match error.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => {
                Error::timeout(command.name(), self.socket_timeout)
            }
            _ => Error::Io(error),
        }
    }

    pub fn get_livedata(&self) -> Result<Vec<u8>> {
        self.send_command(Command::LiveData, &[])
    }

    pub fn get_rain(&self) -> Result<Vec<u8>> {
        self.send_command(Command::ReadRain, &[])
    }

    pub fn get_raindata(&self) -> Result<Vec<u8>> {
        self.send_command(Command::ReadRainData, &[])
    }

    pub fn get_system_params(&self) -> Result<Vec<u8>> {
        self.send_command(Command::ReadSsss, &[])
    }

    pub fn get_ecowitt_net_params(&self) -> Result<Vec<u8>> {
        self.send_command(Command::ReadEcowitt, &[])
    }

    pub fn get_wunderground_params(&self) -> Result<Vec<u8>> {
        self.send_command(Command::ReadWunderground, &[])
    }

    pub fn get_wow_params(&self) -> Result<Vec<u8>> {
        self.send_command(Command::ReadWow, &[])
    }

    pub fn get_weathercloud_params(&self) -> Result<Vec<u8>> {
        self.send_command(Command::ReadWeathercloud, &[])
    }

    pub fn get_custom_params(&self) -> Result<Vec<u8>> {
        self.send_command(Command::ReadCustomized, &[])
    }

    pub fn get_usr_path(&self) -> Result<Vec<u8>> {
        self.send_command(Command::ReadUsrPath, &[])
    }

    pub fn get_mac_address(&self) -> Result<Vec<u8>> {
        self.send_command(Command::ReadStationMac, &[])
    }

    pub fn get_firmware_version(&self) -> Result<Vec<u8>> {
        self.send_command(Command::ReadFirmwareVersion, &[])
    }

    pub fn get_sensor_id_new(&self) -> Result<Vec<u8>> {
        self.send_command(Command::ReadSensorIdNew, &[])
    }

    pub fn get_mulch_offset(&self) -> Result<Vec<u8>> {
        self.send_command(Command::GetMulchOffset, &[])
    }

    pub fn get_mulch_t_offset(&self) -> Result<Vec<u8>> {
        self.send_command(Command::GetMulchTempOffset, &[])
    }

    pub fn get_pm25_offset(&self) -> Result<Vec<u8>> {
        self.send_command(Command::GetPm25Offset, &[])
    }

    pub fn get_co2_offset(&self) -> Result<Vec<u8>> {
        self.send_command(Command::GetCo2Offset, &[])
    }

    pub fn get_gain(&self) -> Result<Vec<u8>> {
        self.send_command(Command::ReadGain, &[])
    }

    pub fn get_calibration(&self) -> Result<Vec<u8>> {
        self.send_command(Command::ReadCalibration, &[])
    }

    pub fn get_soil_calibration(&self) -> Result<Vec<u8>> {
        self.send_command(Command::GetSoilHumiad, &[])
    }
}
