//! Integration tests for ecowitt-core
//!
//! Most tests run against the loopback mock gateway. Tests marked
//! `#[ignore]` need a real gateway and should be run with:
//! `ECOWITT_IP=192.168.1.20 cargo test --package ecowitt-core -- --ignored --nocapture`

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use ecowitt_core::mock::{SAMPLE_SENSOR_IDS, broadcast_reply};
use ecowitt_core::{
    Command, Device, DeviceConfig, DiscoveryOptions, Error, FailureMode, GatewayApi, MockBeacon,
    MockGateway, RetryConfig, UnknownFieldPolicy, Value,
};

fn config_for(address: SocketAddr) -> DeviceConfig {
    DeviceConfig::new()
        .ip(address.ip())
        .port(address.port())
        .socket_timeout(Duration::from_millis(500))
        .retry(RetryConfig::new(3).retry_wait(Duration::from_millis(10)))
}

/// Show library logs when running against hardware with `--nocapture`.
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Get the gateway address from the environment.
fn get_gateway_address() -> Option<SocketAddr> {
    let ip: IpAddr = env::var("ECOWITT_IP").ok()?.parse().ok()?;
    Some(SocketAddr::new(ip, 45000))
}

#[test]
fn test_poll_cycle() {
    let mock = MockGateway::builder().with_sample_data().start().unwrap();
    let mut device = Device::from_config(config_for(mock.address())).unwrap();

    let firmware = device.firmware_version().unwrap();
    assert_eq!(firmware, "GW2000C_V2.1.4");

    let params = device.system_params().unwrap();
    assert_eq!(params.frequency_mhz(), Some(433));
    assert_eq!(
        params.utc_datetime().unwrap().unix_timestamp(),
        1_650_888_275
    );

    let data = device.livedata().unwrap();
    assert_eq!(data.value("temp1"), Some(Value::Float(23.7)));
    assert_eq!(data.value("humid2"), Some(Value::Int(58)));
    assert_eq!(data.get("lightningdist"), Some(&None));
    assert!(data.contains("wh65_batt"));
    assert_eq!(
        device.sensors().connected_addresses().count(),
        SAMPLE_SENSOR_IDS.len() - 1
    );
}

#[test]
fn test_poll_survives_transient_corruption() {
    let mock = MockGateway::builder().with_sample_data().start().unwrap();
    let device = Device::from_config(config_for(mock.address())).unwrap();

    mock.fail_next(1, FailureMode::CorruptChecksum);
    assert!(device.firmware_version().is_ok());
    mock.fail_next(1, FailureMode::WrongCommand);
    assert!(device.firmware_version().is_ok());
    mock.fail_next(2, FailureMode::Drop);
    assert!(device.firmware_version().is_ok());
    assert_eq!(mock.request_count(), 7);
}

#[test]
fn test_persistent_failure_reports_command() {
    let mock = MockGateway::builder().with_sample_data().start().unwrap();
    let device = Device::from_config(config_for(mock.address())).unwrap();
    mock.fail_next(10, FailureMode::CorruptChecksum);

    let err = device.system_params().unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed to obtain response to command 'CMD_READ_SSSS' after 3 attempts"
    );
    let source = std::error::Error::source(&err).unwrap();
    assert!(source.to_string().starts_with("Invalid checksum"));
}

#[test]
fn test_unknown_field_policies() {
    // intemp, an undefined tag, then inhumid
    let payload = [0x01, 0x00, 0xEA, 0x71, 0x05, 0x06, 0x26];
    let mock = MockGateway::builder()
        .with_sample_data()
        .response(Command::LiveData, &payload)
        .start()
        .unwrap();

    let mut device = Device::from_config(config_for(mock.address())).unwrap();
    let data = device.livedata().unwrap();
    assert_eq!(data.value("intemp"), Some(Value::Float(23.4)));
    assert!(!data.contains("inhumid"));

    let mut strict = Device::from_config(
        config_for(mock.address()).unknown_fields(UnknownFieldPolicy::Fail),
    )
    .unwrap();
    assert!(matches!(
        strict.livedata(),
        Err(Error::UnknownFieldCode { tag: 0x71, offset: 3 })
    ));
}

#[test]
fn test_gateway_api_vocabulary() {
    let mock = MockGateway::builder()
        .response(Command::ReadRainData, &[0; 20])
        .start()
        .unwrap();
    let api = GatewayApi::new(mock.address()).retry(RetryConfig::none());

    assert!(api.send_command_str("CMD_READ_RAINDATA", &[]).is_ok());
    assert_eq!(mock.last_request().unwrap(), [0xFF, 0xFF, 0x34, 0x03, 0x37]);
    api.write_command(Command::WriteReboot, &[]).unwrap();
    assert_eq!(mock.request_count(), 2);
}

#[test]
fn test_discovery_then_poll() {
    let mock = MockGateway::builder().with_sample_data().start().unwrap();
    let beacon = MockBeacon::start(vec![
        broadcast_reply(
            [0xE8, 0x68, 0xE7, 0x87, 0x1A, 0x4F],
            Ipv4Addr::LOCALHOST,
            mock.address().port(),
            "GW2000C-WIFI1A4F",
        )
        .unwrap(),
    ])
    .unwrap();

    let options = DiscoveryOptions::new()
        .broadcast_address(IpAddr::V4(Ipv4Addr::LOCALHOST))
        .broadcast_port(beacon.port())
        .timeout(Duration::from_millis(300));
    let mut device = Device::discover(options).unwrap();

    assert_eq!(device.address(), mock.address());
    assert_eq!(
        device.mac_address().unwrap().to_string(),
        "E8:68:E7:87:1A:4F"
    );
    assert!(device.livedata().unwrap().contains("intemp"));
}

#[test]
#[ignore = "requires gateway hardware"]
fn test_real_gateway_livedata() {
    init_logging();
    let Some(address) = get_gateway_address() else {
        println!("ECOWITT_IP not set, skipping");
        return;
    };
    let mut device = Device::new(address);
    println!("Firmware: {}", device.firmware_version().unwrap());
    println!("Model: {:?}", device.model().unwrap());
    for (name, value) in device.livedata().unwrap().iter() {
        println!("  {name}: {value:?}");
    }
}

#[test]
#[ignore = "requires gateway hardware"]
fn test_real_gateway_discovery() {
    init_logging();
    let devices = ecowitt_core::discover(&DiscoveryOptions::default()).unwrap();
    println!("Found {} devices", devices.len());
    for device in devices {
        println!("  {:?} {} at {}", device.model, device.mac, device.socket_addr());
    }
}
