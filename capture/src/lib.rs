// Library lints
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(unsafe_code)]

pub use controller::{CaptureController, ControllerError, ControllerState};
pub use radio::{FrameCallback, RadioDriver, RadioError, RawFrame};
pub use settings::CaptureSettings;
pub use stats::StatsSnapshot;
pub use writer::StorageWriter;

pub mod attack;
pub mod controller;
pub mod event;
pub mod injector;
pub mod pcap;
pub mod processor;
pub mod radio;
pub mod registry;
pub mod ring;
pub mod settings;
pub mod stats;
pub mod storage;
pub mod writer;

#[cfg(test)]
mod testing;
