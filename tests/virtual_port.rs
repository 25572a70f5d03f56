use std::time::Duration;

use serial_interface::{
    LineFault, PortConfig, SerialChannel, SerialError, SerialInterface, SerialResult, VirtualPort,
};

fn config(device: &str) -> PortConfig {
    PortConfig {
        device: device.to_string(),
        rx_buffer_capacity: 8,
        max_write_len: 16,
        ..Default::default()
    }
}

fn code<T>(result: &Result<T, SerialError>) -> SerialResult {
    SerialResult::from(result)
}

#[test]
fn lifecycle_through_trait_object() {
    let (port, line) = VirtualPort::new("it-vtty0");
    let mut port: Box<dyn SerialInterface> = Box::new(port);
    let mut buf = [0u8; 4];

    assert_eq!(code(&port.read(&mut buf)), SerialResult::Closed);
    assert_eq!(code(&port.close()), SerialResult::Closed);

    assert_eq!(code(&port.open(&config("it-vtty0"))), SerialResult::Success);
    assert_eq!(code(&port.open(&config("it-vtty0"))), SerialResult::Fail);
    assert!(port.is_open());

    assert_eq!(code(&port.read(&mut buf)), SerialResult::NoData);
    assert_eq!(code(&port.read(&mut [])), SerialResult::InvalidParameter);
    assert_eq!(code(&port.write(&[0u8; 17])), SerialResult::InvalidParameter);

    assert_eq!(code(&port.send_string("hi\0there")), SerialResult::Success);
    assert_eq!(line.take_transmitted(), b"hi".to_vec());

    assert_eq!(code(&port.close()), SerialResult::Success);
    assert!(!line.is_open());
}

#[test]
fn overrun_is_reported_once_before_data() {
    let (mut port, line) = VirtualPort::new("it-vtty1");
    port.open(&config("it-vtty1")).unwrap();

    line.inject(b"0123456789");
    line.inject_fault(LineFault::Noise);
    assert!(port.has_data().unwrap());

    let mut buf = [0u8; 16];
    assert_eq!(code(&port.read(&mut buf)), SerialResult::OverRun);
    assert_eq!(code(&port.read(&mut buf)), SerialResult::NoiseError);

    let count = port.read(&mut buf).unwrap();
    assert_eq!(&buf[..count], b"01234567");
    assert_eq!(code(&port.read(&mut buf)), SerialResult::NoData);
}

#[test]
fn invalid_configuration_is_rejected() {
    let (mut port, _line) = VirtualPort::new("it-vtty2");
    let bad = PortConfig {
        baud_rate: 0,
        ..config("it-vtty2")
    };

    assert_eq!(code(&port.open(&bad)), SerialResult::InvalidParameter);
    assert!(!port.is_open());
}

#[test]
fn result_codes_round_trip() {
    for result in SerialResult::ALL {
        assert_eq!(SerialResult::try_from(i32::from(result)), Ok(result));
        assert_eq!(result.to_string().parse::<SerialResult>(), Ok(result));
    }
    assert_eq!(SerialResult::InvalidParameter.code(), 9);
}

#[tokio::test]
async fn channel_echoes_frames_on_loopback() {
    let (port, _line) = VirtualPort::loopback("it-vloop");
    let channel = SerialChannel::new(Box::new(port));
    channel.open(&config("it-vloop")).await.unwrap();

    channel.write_all(b"ping").await.unwrap();

    let mut buf = [0u8; 8];
    let count = channel
        .read_frame(&mut buf, Duration::from_millis(200), Duration::from_millis(20))
        .await
        .unwrap();
    assert_eq!(&buf[..count], b"ping");

    channel.close().await.unwrap();
    let stats = channel.stats().await;
    assert_eq!(stats.count(SerialResult::Success), 4);
    assert_eq!(stats.bytes_written, 4);
    assert_eq!(stats.bytes_read, 4);
}
