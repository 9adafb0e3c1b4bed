use thiserror::Error;

/// A frame as handed over by the driver. Borrowed for one callback
/// invocation only; anything kept must be copied out before returning.
#[derive(Clone, Copy, Debug)]
pub struct RawFrame<'a> {
    pub data: &'a [u8],
    /// Length declared by the driver. May differ from `data.len()`.
    pub length: usize,
    /// Antenna signal, dBm.
    pub signal: Option<i8>,
    /// Channel the frame was received on, when the driver reports it.
    pub channel: Option<u8>,
}

impl<'a> RawFrame<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            length: data.len(),
            signal: None,
            channel: None,
        }
    }

    pub fn with_signal(mut self, signal: Option<i8>) -> Self {
        self.signal = signal;
        self
    }
}

/// Invoked by the driver for every received frame, possibly from a
/// driver-owned thread. Must not block.
pub type FrameCallback = Box<dyn FnMut(RawFrame<'_>) + Send>;

/// The radio primitives the capture pipeline needs.
pub trait RadioDriver {
    /// Replaces any previously registered callback.
    fn register_callback(&mut self, callback: FrameCallback);

    fn set_promiscuous(&mut self, enabled: bool) -> Result<(), RadioError>;

    fn set_channel(&mut self, channel: u8) -> Result<(), RadioError>;

    /// Sends raw 802.11 bytes on the current channel.
    fn transmit(&mut self, frame: &[u8]) -> Result<(), RadioError>;

    /// `false` once reception has ended without being turned off, e.g.
    /// after the driver lost the device.
    fn is_receiving(&mut self) -> bool {
        true
    }
}

#[derive(Debug, Error)]
pub enum RadioError {
    #[error("IO Error.")]
    IOError(#[from] std::io::Error),

    #[error("Driver error: {0}")]
    DriverError(String),

    #[error("Channel {0} is not supported by the radio.")]
    UnsupportedChannel(u8),

    #[error("No frame callback registered.")]
    NoCallback,
}

impl RadioError {
    pub fn additional_info(&self) -> Option<String> {
        match self {
            RadioError::IOError(err) => Some(err.to_string()),
            _ => None,
        }
    }
}
