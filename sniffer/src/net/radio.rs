use crate::net::interface;
use capture::radio::{FrameCallback, RadioDriver, RadioError, RawFrame};
use dot11::radiotap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::thread::JoinHandle;

pub const RECEIVER_THREAD_NAME: &str = "radio-receiver";

/// Radio driver on top of a libpcap monitor-mode handle.
///
/// Reception runs on its own thread that owns the frame callback while
/// promiscuous mode is on; turning it off stops the thread and takes the
/// callback back.
pub struct PcapRadio {
    device: pcap::Device,
    callback: Option<FrameCallback>,
    receiver: Option<Receiver>,
    transmitter: Option<pcap::Capture<pcap::Active>>,
}

struct Receiver {
    stop_flag: Arc<AtomicBool>,
    handle: JoinHandle<Option<FrameCallback>>,
}

impl PcapRadio {
    pub fn new(device: pcap::Device) -> Self {
        Self {
            device,
            callback: None,
            receiver: None,
            transmitter: None,
        }
    }

    pub fn name(&self) -> String {
        interface::get_network_interface_name(&self.device)
    }

    fn open(&self) -> Result<pcap::Capture<pcap::Active>, RadioError> {
        interface::get_monitor_capture(self.device.clone())
            .map_err(|err| RadioError::DriverError(describe(&err)))
    }

    fn start_receiver(&mut self) -> Result<(), RadioError> {
        if self.receiver.is_some() {
            return Ok(());
        }
        if self.callback.is_none() {
            return Err(RadioError::NoCallback);
        }

        let mut capture = self.open()?;
        let stop_flag = Arc::new(AtomicBool::new(false));
        let thread_flag = Arc::clone(&stop_flag);

        // The callback is handed over only once the thread exists, so a
        // failed spawn cannot take it down with the closure.
        let (callback_tx, callback_rx) = crossbeam::channel::bounded::<FrameCallback>(1);

        let handle = thread::Builder::new()
            .name(RECEIVER_THREAD_NAME.to_string())
            .spawn(move || {
                let mut callback = callback_rx.recv().ok()?;
                let radiotap_link =
                    capture.get_datalink() == pcap::Linktype::IEEE802_11_RADIOTAP;

                while !thread_flag.load(Ordering::Acquire) {
                    match capture.next_packet() {
                        Ok(packet) => {
                            let length = packet.header.caplen as usize;
                            deliver(&mut callback, packet.data, length, radiotap_link);
                        },
                        Err(pcap::Error::TimeoutExpired) => continue,
                        Err(err) => {
                            log::error!("Capture error: {err}");
                            break;
                        },
                    }
                }

                Some(callback)
            })
            .map_err(RadioError::IOError)?;

        if let Some(callback) = self.callback.take()
            && let Err(err) = callback_tx.send(callback)
        {
            self.callback = Some(err.into_inner());
            let _ = handle.join();
            return Err(RadioError::DriverError(
                "Receiver thread exited before start.".to_string(),
            ));
        }

        self.receiver = Some(Receiver { stop_flag, handle });
        Ok(())
    }

    fn stop_receiver(&mut self) -> Result<(), RadioError> {
        let receiver = match self.receiver.take() {
            Some(value) => value,
            None => return Ok(()),
        };

        receiver.stop_flag.store(true, Ordering::Release);
        match receiver.handle.join() {
            Ok(Some(callback)) => {
                self.callback = Some(callback);
                Ok(())
            },
            Ok(None) | Err(_) => Err(RadioError::DriverError(
                "Receiver thread ended without returning the frame callback.".to_string(),
            )),
        }
    }
}

fn deliver(callback: &mut FrameCallback, data: &[u8], length: usize, radiotap_link: bool) {
    if !radiotap_link {
        callback(RawFrame {
            data,
            length,
            signal: None,
            channel: None,
        });
        return;
    }

    let captured = &data[..length.min(data.len())];
    if let Some((header, frame)) = radiotap::strip(captured) {
        callback(RawFrame {
            data: frame,
            length: frame.len(),
            signal: header.signal,
            channel: header.channel(),
        });
    }
}

fn describe(err: &interface::InterfaceError) -> String {
    match err.additional_info() {
        Some(info) => format!("{err} {info}"),
        None => err.to_string(),
    }
}

impl RadioDriver for PcapRadio {
    fn register_callback(&mut self, callback: FrameCallback) {
        self.callback = Some(callback);
    }

    fn set_promiscuous(&mut self, enabled: bool) -> Result<(), RadioError> {
        if enabled {
            self.start_receiver()
        } else {
            self.stop_receiver()
        }
    }

    #[cfg(target_os = "linux")]
    fn set_channel(&mut self, channel: u8) -> Result<(), RadioError> {
        let frequency =
            radiotap::channel_to_frequency(channel).ok_or(RadioError::UnsupportedChannel(channel))?;

        let status = std::process::Command::new("iw")
            .args(["dev", &self.device.name, "set", "freq", &frequency.to_string()])
            .status()?;

        if !status.success() {
            return Err(RadioError::DriverError(format!(
                "iw failed to set channel {channel}: {status}"
            )));
        }

        Ok(())
    }

    #[cfg(not(target_os = "linux"))]
    fn set_channel(&mut self, channel: u8) -> Result<(), RadioError> {
        Err(RadioError::UnsupportedChannel(channel))
    }

    fn transmit(&mut self, frame: &[u8]) -> Result<(), RadioError> {
        if self.transmitter.is_none() {
            let capture = self.open()?;
            self.transmitter = Some(capture);
        }
        let Some(transmitter) = self.transmitter.as_mut() else {
            return Err(RadioError::DriverError("Injection handle unavailable.".to_string()));
        };

        let result = if transmitter.get_datalink() == pcap::Linktype::IEEE802_11_RADIOTAP {
            let mut packet = Vec::with_capacity(radiotap::MINIMAL_HEADER.len() + frame.len());
            packet.extend_from_slice(&radiotap::MINIMAL_HEADER);
            packet.extend_from_slice(frame);
            transmitter.sendpacket(packet)
        } else {
            transmitter.sendpacket(frame)
        };

        result.map_err(|err| RadioError::DriverError(err.to_string()))
    }

    fn is_receiving(&mut self) -> bool {
        let finished = match &self.receiver {
            Some(receiver) => receiver.handle.is_finished(),
            None => return false,
        };

        if finished && let Err(err) = self.stop_receiver() {
            log::error!("{err}");
        }

        !finished
    }
}

impl Drop for PcapRadio {
    fn drop(&mut self) {
        if let Err(err) = self.stop_receiver() {
            log::warn!("{err}");
        }
    }
}
