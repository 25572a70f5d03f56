mod counters;
mod hardware;
mod virtual_port;

pub use counters::FaultCounters;
pub use hardware::HardwarePort;
pub use virtual_port::{VirtualLine, VirtualPort};

use crate::{IoOperation, SerialError};

/// A serial device found on this machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    pub kind: String,
}

pub fn list_ports() -> Result<Vec<PortInfo>, SerialError> {
    let ports = serialport::available_ports().map_err(|e| {
        SerialError::fail(
            IoOperation::Control,
            "system",
            format!("failed to enumerate serial ports: {}", e.description),
        )
    })?;

    Ok(ports
        .into_iter()
        .map(|port| PortInfo {
            kind: describe(&port.port_type),
            name: port.port_name,
        })
        .collect())
}

fn describe(port_type: &serialport::SerialPortType) -> String {
    match port_type {
        serialport::SerialPortType::UsbPort(usb) => {
            let product = usb.product.as_deref().unwrap_or("unknown product");
            format!("USB {:04x}:{:04x} {}", usb.vid, usb.pid, product)
        }
        serialport::SerialPortType::PciPort => "PCI".to_string(),
        serialport::SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        serialport::SerialPortType::Unknown => "unknown".to_string(),
    }
}
