// Library lints
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(unsafe_code)]

pub use classify::{Classification, classify};

pub mod builder;
pub mod classify;
pub mod control;
pub mod elements;
pub mod header;
pub mod llc;
pub mod mac;
pub mod parser;
pub mod radiotap;
