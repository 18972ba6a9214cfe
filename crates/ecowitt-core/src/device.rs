//! Gateway device interface.
//!
//! A [`Device`] ties together the command transport, the response parser and
//! the sensor registry for one gateway, and keeps the gateway's identity
//! so that it can be found again after its IP address changes.

use std::net::{IpAddr, SocketAddr};

use serde::Serialize;
use tracing::{debug, info, warn};

use ecowitt_types::{
    ChannelOffsets, Co2Offset, CustomizedParams, DeviceModel, DiscoveryMethod, EcowittParams,
    GainCalibration, MacAddress, MulchOffsets, Observations, OffsetCalibration, RainTotals,
    SoilCalibration, SystemParams, UserPaths, WeathercloudParams, WowParams, WundergroundParams,
};

use crate::config::DeviceConfig;
use crate::discovery::{self, DiscoveredDevice, DiscoveryOptions};
use crate::error::{Error, Result};
use crate::parser::{self, Parser};
use crate::sensors::SensorRegistry;
use crate::transport::GatewayApi;

/// Gain and offset calibration, read with two commands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Calibration {
    pub gain: GainCalibration,
    pub offset: OffsetCalibration,
}

/// Customized upload settings together with their request paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomUpload {
    #[serde(flatten)]
    pub params: CustomizedParams,
    #[serde(flatten)]
    pub paths: UserPaths,
}

/// A gateway on the local network.
///
/// Methods that refresh cached state take `&mut self`; callers sharing a
/// device between threads must serialize access themselves.
#[derive(Debug)]
pub struct Device {
    api: GatewayApi,
    parser: Parser,
    sensors: SensorRegistry,
    config: DeviceConfig,
    mac: Option<MacAddress>,
    model: Option<DeviceModel>,
    discovered_via: DiscoveryMethod,
}

impl Device {
    /// A device at a known address, using the default configuration.
    pub fn new(address: SocketAddr) -> Self {
        let config = DeviceConfig::new().ip(address.ip()).port(address.port());
        Self::build(address, config, DiscoveryMethod::Configured)
    }

    /// A device described by `config`.
    ///
    /// When `config.ip` is unset the first gateway found with the configured
    /// discovery method is used.
    pub fn from_config(config: DeviceConfig) -> Result<Self> {
        config.validate()?;
        match config.ip {
            Some(ip) => {
                let address = SocketAddr::new(ip, config.port);
                Ok(Self::build(address, config, DiscoveryMethod::Configured))
            }
            None => {
                let found = discovery::run(&config.discovery)?;
                let first = found.into_iter().next().ok_or(Error::NoDeviceFound)?;
                Ok(Self::from_discovered(&first, config))
            }
        }
    }

    /// The first gateway found with `options.method`.
    pub fn discover(options: DiscoveryOptions) -> Result<Self> {
        Self::from_config(DeviceConfig::new().discovery(options))
    }

    /// A device found by discovery.
    pub fn from_discovered(device: &DiscoveredDevice, config: DeviceConfig) -> Self {
        let mut built = Self::build(device.socket_addr(), config, device.method);
        built.mac = Some(device.mac);
        built.model = device.model;
        built
    }

    fn build(address: SocketAddr, config: DeviceConfig, discovered_via: DiscoveryMethod) -> Self {
        let api = GatewayApi::new(address)
            .socket_timeout(config.socket_timeout)
            .retry(config.retry.clone());
        let parser = Parser::new()
            .log_unknown_fields(config.log_unknown_fields)
            .unknown_policy(config.unknown_fields);
        Self {
            api,
            parser,
            sensors: SensorRegistry::new(config.sensors),
            config,
            mac: None,
            model: None,
            discovered_via,
        }
    }

    pub fn address(&self) -> SocketAddr {
        self.api.address()
    }

    pub fn ip_address(&self) -> IpAddr {
        self.api.address().ip()
    }

    pub fn port(&self) -> u16 {
        self.api.address().port()
    }

    pub fn discovered_via(&self) -> DiscoveryMethod {
        self.discovered_via
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn api(&self) -> &GatewayApi {
        &self.api
    }

    /// The sensor registry as of the last [`Device::update_sensor_ids`].
    pub fn sensors(&self) -> &SensorRegistry {
        &self.sensors
    }

    /// Live observations merged with sensor battery and signal data.
    ///
    /// The sensor registry is refreshed first. When that fails the registry
    /// is emptied and the observations carry no battery or signal fields.
    pub fn livedata(&mut self) -> Result<Observations> {
        if let Err(e) = self.update_sensor_ids() {
            warn!("Could not refresh sensor IDs from {}: {}", self.address(), e);
            self.sensors.set_sensor_id_data(None);
        }
        let response = self.api.get_livedata()?;
        let mut data = self.parser.parse_live_data(&response)?.into_observations();
        data.extend(self.sensors.battery_and_signal_data());
        Ok(data)
    }

    pub fn update_sensor_ids(&mut self) -> Result<()> {
        let response = self.api.get_sensor_id_new()?;
        self.sensors.set_sensor_id_data(Some(&response));
        debug!(
            "{} sensor addresses reported, {} connected",
            self.sensors.len(),
            self.sensors.connected_addresses().count()
        );
        Ok(())
    }

    pub fn raindata(&self) -> Result<RainTotals> {
        parser::parse_raindata(&self.api.get_raindata()?)
    }

    /// Traditional and piezo rain data.
    pub fn rain(&self) -> Result<Observations> {
        let response = self.api.get_rain()?;
        Ok(self.parser.parse_rain(&response)?.into_observations())
    }

    pub fn system_params(&self) -> Result<SystemParams> {
        parser::parse_system_params(&self.api.get_system_params()?)
    }

    /// Ecowitt.net upload settings, including the station MAC.
    pub fn ecowitt_params(&mut self) -> Result<EcowittParams> {
        let mut params = parser::parse_ecowitt(&self.api.get_ecowitt_net_params()?)?;
        params.mac = Some(self.mac_address()?);
        Ok(params)
    }

    pub fn wunderground_params(&self) -> Result<WundergroundParams> {
        parser::parse_wunderground(&self.api.get_wunderground_params()?)
    }

    pub fn weathercloud_params(&self) -> Result<WeathercloudParams> {
        parser::parse_weathercloud(&self.api.get_weathercloud_params()?)
    }

    pub fn wow_params(&self) -> Result<WowParams> {
        parser::parse_wow(&self.api.get_wow_params()?)
    }

    pub fn custom_params(&self) -> Result<CustomizedParams> {
        parser::parse_customized(&self.api.get_custom_params()?)
    }

    pub fn user_paths(&self) -> Result<UserPaths> {
        parser::parse_usr_path(&self.api.get_usr_path()?)
    }

    pub fn all_custom_params(&self) -> Result<CustomUpload> {
        Ok(CustomUpload {
            params: self.custom_params()?,
            paths: self.user_paths()?,
        })
    }

    /// The station MAC, read once and cached.
    pub fn mac_address(&mut self) -> Result<MacAddress> {
        if let Some(mac) = self.mac {
            return Ok(mac);
        }
        let mac = parser::parse_station_mac(&self.api.get_mac_address()?)?;
        self.mac = Some(mac);
        Ok(mac)
    }

    pub fn firmware_version(&self) -> Result<String> {
        parser::parse_firmware_version(&self.api.get_firmware_version()?)
    }

    /// The gateway model, taken from the firmware version string.
    ///
    /// `None` when the firmware string names no known model.
    pub fn model(&mut self) -> Result<Option<DeviceModel>> {
        if self.model.is_none() {
            let firmware = self.firmware_version()?;
            self.model = DeviceModel::from_name(&firmware);
        }
        Ok(self.model)
    }

    pub fn mulch_offset(&self) -> Result<MulchOffsets> {
        parser::parse_mulch_offset(&self.api.get_mulch_offset()?)
    }

    /// WN34 temperature offsets.
    pub fn mulch_t_offset(&self) -> Result<ChannelOffsets> {
        parser::parse_mulch_t_offset(&self.api.get_mulch_t_offset()?)
    }

    pub fn pm25_offset(&self) -> Result<ChannelOffsets> {
        parser::parse_pm25_offset(&self.api.get_pm25_offset()?)
    }

    pub fn co2_offset(&self) -> Result<Co2Offset> {
        parser::parse_co2_offset(&self.api.get_co2_offset()?)
    }

    pub fn gain(&self) -> Result<GainCalibration> {
        parser::parse_gain(&self.api.get_gain()?)
    }

    pub fn calibration(&self) -> Result<Calibration> {
        Ok(Calibration {
            gain: self.gain()?,
            offset: parser::parse_calibration(&self.api.get_calibration()?)?,
        })
    }

    pub fn soil_calibration(&self) -> Result<SoilCalibration> {
        parser::parse_soil_humiad(&self.api.get_soil_calibration()?)
    }

    /// Look for this gateway again by MAC and adopt its current address.
    ///
    /// Discovery uses the configured method. Returns `false`, keeping the old
    /// address, when no MAC is known, discovery fails or no reply carries
    /// this MAC.
    pub fn rediscover(&mut self) -> bool {
        let Some(mac) = self.mac else {
            info!("Cannot rediscover device at {}: MAC address unknown", self.address());
            return false;
        };
        info!("Attempting to rediscover device {}", mac);
        let devices = match discovery::run(&self.config.discovery) {
            Ok(devices) => devices,
            Err(e) => {
                warn!("Rediscovery of {} failed: {}", mac, e);
                return false;
            }
        };
        let Some(found) = devices.into_iter().find(|d| d.mac == mac) else {
            info!("Device {} not found during rediscovery", mac);
            return false;
        };

        let address = found.socket_addr();
        if address != self.address() {
            info!("Device {} rediscovered at {} (was {})", mac, address, self.address());
        } else {
            info!("Device {} rediscovered at unchanged address {}", mac, address);
        }
        self.api.set_address(address);
        self.discovered_via = found.method;
        if self.model.is_none() {
            self.model = found.model;
        }
        true
    }
}
