use crate::config::Config;
use crate::net::interface;
use crate::net::interface::InterfaceError;
use crate::net::radio::PcapRadio;
use capture::event::EventKind;
use capture::pcap::PcapWriter;
use capture::storage::DirectoryStorage;
use capture::controller::ControllerState;
use capture::{CaptureController, ControllerError, RadioDriver, StorageWriter};
use common::io::FileKind;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Main loop cadence. Well below the hop interval.
pub const TICK_INTERVAL: Duration = Duration::from_millis(20);

pub fn start(config: Config, shutdown_flag: Arc<AtomicBool>) -> Result<(), CoreError> {
    let device = interface::get_network_interface(config.interface.as_deref())?;
    let radio = PcapRadio::new(device);
    log::info!("Using interface {}.", radio.name());

    let capture_directory = match &config.capture_directory {
        Some(value) => value.clone(),
        None => common::io::get_storage_directory(FileKind::Captures)?,
    };
    log::info!("Capture directory: {}", capture_directory.display());

    let (mut controller, consumer) = CaptureController::new(radio, config.capture.clone())?;

    let mut pcap = PcapWriter::new(
        DirectoryStorage::new(capture_directory),
        config.capture.flush_interval,
    );
    if !pcap.open_new_file() {
        log::warn!("Storage not ready. Capture continues, files are retried.");
    }

    // The writer keeps running until the main loop raises its own flag,
    // so the last drain happens after the radio is stopped.
    let writer_flag = Arc::new(AtomicBool::new(false));
    let writer = StorageWriter::new(consumer, pcap, &config.capture)
        .spawn(Arc::clone(&writer_flag))?;

    controller.start()?;
    let result = run(&mut controller, &config, &shutdown_flag);

    if let Err(err) = controller.stop() {
        log::error!("Failed to stop capture: {err}");
    }
    writer_flag.store(true, Ordering::Release);
    if let Err(err) = writer.join() {
        log::error!("Failed to join storage writer thread handle: {:?}", err);
    }

    log_summary(&controller);
    result
}

fn run<R: RadioDriver>(
    controller: &mut CaptureController<R>, config: &Config, shutdown_flag: &AtomicBool,
) -> Result<(), CoreError> {
    let started = Instant::now();
    let mut last_status = started;
    let mut attack_pending = config.attack.is_some();

    loop {
        if shutdown_flag.load(Ordering::Acquire) {
            log::info!("Shutting down capture loop.");
            return Ok(());
        }

        let now = Instant::now();
        controller.tick(now);
        if controller.state() == ControllerState::Idle {
            return Err(CoreError::ReceptionLost);
        }

        if attack_pending
            && let Some(attack) = &config.attack
            && now.duration_since(started) >= attack.start_after
        {
            attack_pending = false;
            if let Err(err) = controller.start_attack(attack.mode.clone(), now) {
                log::error!("Failed to start attack: {err}");
            }
        }

        while let Some(event) = controller.poll_event() {
            match event.kind {
                EventKind::Handshake => log::warn!("{event}"),
                EventKind::AttackFired => log::debug!("{event}"),
                _ => log::info!("{event}"),
            }
        }

        if now.duration_since(last_status) >= config.status_interval {
            log::info!("{}", controller.stats());
            last_status = now;
        }

        thread::sleep(TICK_INTERVAL);
    }
}

fn log_summary<R: RadioDriver>(controller: &CaptureController<R>) {
    log::info!("{}", controller.stats());

    for record in controller.networks().records() {
        log::info!(
            "Network {} {} ch {} {} dBm{}",
            record.address,
            record.ssid,
            record.channel,
            record.signal,
            if record.handshake { ", handshake captured" } else { "" }
        );
    }
    for record in controller.clients().records() {
        log::info!("Client {} probing for {}", record.address, record.ssid);
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("IO Error.")]
    IOError(#[from] std::io::Error),

    #[error("Interface error.")]
    InterfaceError(#[from] InterfaceError),

    #[error("Capture controller error.")]
    ControllerError(#[from] ControllerError),

    #[error("Radio stopped receiving and could not be restarted.")]
    ReceptionLost,
}

impl CoreError {
    pub fn additional_info(&self) -> Option<String> {
        match self {
            CoreError::IOError(err) => Some(err.to_string()),
            CoreError::InterfaceError(err) => err.additional_info(),
            CoreError::ControllerError(err) => err.additional_info(),
            CoreError::ReceptionLost => None,
        }
    }
}
