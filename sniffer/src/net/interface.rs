use thiserror::Error;

/// Name prefixes of wireless interfaces on Linux.
const WIRELESS_PREFIXES: [&str; 3] = ["wl", "mon", "ath"];

/// Read timeout of capture handles, so loops can check their stop flag.
pub const READ_TIMEOUT_MS: i32 = 250;
pub const SNAPLEN: i32 = 65535;

/// Devices that look like wireless adapters, first the ones already in
/// monitor mode.
pub fn wireless_sorted() -> Result<Vec<pcap::Device>, InterfaceError> {
    let mut interfaces: Vec<pcap::Device> = pcap::Device::list()
        .map_err(InterfaceError::PcapError)?
        .into_iter()
        .filter(|device| {
            WIRELESS_PREFIXES
                .iter()
                .any(|prefix| device.name.starts_with(prefix))
        })
        .collect();

    interfaces.sort_by_key(|device| !device.name.starts_with("mon"));

    Ok(interfaces)
}

pub fn get_network_interface_name(network_interface: &pcap::Device) -> String {
    #[cfg(target_os = "windows")]
    let name = if let Some(desc) = &network_interface.desc {
        desc.clone()
    } else {
        network_interface.name.clone()
    };

    #[cfg(not(target_os = "windows"))]
    let name = network_interface.name.clone();

    name
}

/// Get `Device` by its name, or the first wireless one when no name is given.
pub fn get_network_interface(device_name: Option<&str>) -> Result<pcap::Device, InterfaceError> {
    let device_name = match device_name {
        Some(value) => value,
        None => {
            return wireless_sorted()?
                .into_iter()
                .next()
                .ok_or(InterfaceError::NoWirelessInterface);
        },
    };

    let needed_interface = |device: &pcap::Device| {
        device.name == device_name || device.desc.as_deref() == Some(device_name)
    };

    pcap::Device::list()
        .map_err(InterfaceError::PcapError)?
        .into_iter()
        .find(needed_interface)
        .ok_or(InterfaceError::UnknownInterface)
}

/// Opens the device in monitor mode with an 802.11 link type, preferring
/// radiotap.
pub fn get_monitor_capture(
    device: pcap::Device,
) -> Result<pcap::Capture<pcap::Active>, InterfaceError> {
    let inactive = pcap::Capture::from_device(device)
        .map_err(InterfaceError::PcapError)?
        .promisc(true)
        .snaplen(SNAPLEN)
        .timeout(READ_TIMEOUT_MS)
        .immediate_mode(true);

    #[cfg(not(target_os = "windows"))]
    let inactive = inactive.rfmon(true);

    let mut capture = inactive.open().map_err(InterfaceError::PcapError)?;

    if let Err(err) = capture.set_datalink(pcap::Linktype::IEEE802_11_RADIOTAP) {
        log::debug!("Radiotap link type not available: {err}");
        if let Err(err) = capture.set_datalink(pcap::Linktype::IEEE802_11) {
            log::debug!("Raw 802.11 link type not available: {err}");
        }
    }

    let link_type = capture.get_datalink();
    if !is_wireless_link(link_type) {
        return Err(InterfaceError::NotMonitorMode(link_type.0));
    }

    Ok(capture)
}

pub fn is_wireless_link(link_type: pcap::Linktype) -> bool {
    link_type == pcap::Linktype::IEEE802_11_RADIOTAP || link_type == pcap::Linktype::IEEE802_11
}

#[derive(Debug, Error)]
pub enum InterfaceError {
    #[error("Pcap Library error.")]
    PcapError(pcap::Error),

    #[error("There are no interfaces with config interface name.")]
    UnknownInterface,

    #[error("No wireless interface found.")]
    NoWirelessInterface,

    #[error("Interface is not in monitor mode. Link type: {0}.")]
    NotMonitorMode(i32),
}

impl InterfaceError {
    pub fn additional_info(&self) -> Option<String> {
        match self {
            InterfaceError::PcapError(err) => Some(err.to_string()),
            _ => None,
        }
    }
}
