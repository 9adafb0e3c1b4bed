use crate::attack::{Attack, AttackMode};
use crate::event::{CaptureEvent, EventKind};
use crate::injector::FrameInjector;
use crate::processor::{CaptureShared, FrameProcessor};
use crate::radio::{RadioDriver, RadioError};
use crate::registry::NetworkRegistry;
use crate::ring::{self, RingConsumer};
use crate::settings::CaptureSettings;
use crate::stats::StatsSnapshot;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use strum_macros::Display;
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq, Serialize)]
pub enum ControllerState {
    #[default]
    Idle,
    Capturing,
    Attacking,
}

/// Owns the radio and drives the capture lifecycle.
///
/// The frame callback is registered once, in [`CaptureController::new`],
/// with a [`FrameProcessor`] moved into it as its context. Everything the
/// callback touches is shared through atomics, so the controller never
/// locks against it.
pub struct CaptureController<R: RadioDriver> {
    radio: R,
    settings: CaptureSettings,
    shared: Arc<CaptureShared>,
    state: ControllerState,

    channel_index: usize,
    last_hop: Option<Instant>,

    injector: FrameInjector,
    attack: Option<Attack>,
}

impl<R: RadioDriver> CaptureController<R> {
    pub fn new(
        mut radio: R, settings: CaptureSettings,
    ) -> Result<(Self, RingConsumer), ControllerError> {
        if settings.channels.is_empty() {
            return Err(ControllerError::NoChannels);
        }

        let (producer, consumer) = ring::channel(settings.ring_capacity);
        let shared = Arc::new(CaptureShared::new(&settings));

        let mut processor = FrameProcessor::new(Arc::clone(&shared), producer);
        radio.register_callback(Box::new(move |frame| processor.handle(frame)));

        let injector = FrameInjector::new(settings.deauth_burst, settings.deauth_burst_delay);

        let controller = Self {
            radio,
            settings,
            shared,
            state: ControllerState::Idle,

            channel_index: 0,
            last_hop: None,

            injector,
            attack: None,
        };

        Ok((controller, consumer))
    }

    /// Tunes to the first channel of the hop list and turns on reception.
    pub fn start(&mut self) -> Result<(), ControllerError> {
        if self.state != ControllerState::Idle {
            return Ok(());
        }

        self.channel_index = 0;
        self.tune(self.hop_channel())?;
        self.radio.set_promiscuous(true)?;

        self.shared.set_capturing(true);
        self.last_hop = None;
        self.state = ControllerState::Capturing;
        log::info!("Capture started on channel {}.", self.hop_channel());

        Ok(())
    }

    /// Turns off reception and abandons any running attack.
    pub fn stop(&mut self) -> Result<(), ControllerError> {
        if self.state == ControllerState::Idle {
            return Ok(());
        }

        self.shared.set_capturing(false);
        self.attack = None;
        self.state = ControllerState::Idle;
        self.radio.set_promiscuous(false)?;
        log::info!("Capture stopped.");

        Ok(())
    }

    /// Advances timers. While capturing, hops to the next channel once the
    /// dwell time has passed; while attacking, fires the injector on its
    /// cadence and falls back to capturing on timeout.
    pub fn tick(&mut self, now: Instant) {
        match self.state {
            ControllerState::Idle => {},
            ControllerState::Capturing => self.hop_if_due(now),
            ControllerState::Attacking => self.run_attack(now),
        }
    }

    fn hop_if_due(&mut self, now: Instant) {
        let last_hop = *self.last_hop.get_or_insert(now);
        if now.duration_since(last_hop) < self.settings.hop_interval {
            return;
        }
        self.last_hop = Some(now);

        if !self.recover_reception() {
            return;
        }

        self.channel_index = (self.channel_index + 1) % self.settings.channels.len();
        let channel = self.hop_channel();
        match self.tune(channel) {
            Ok(_) => log::trace!("Hopped to channel {channel}."),
            Err(err) => log::warn!("Failed to switch to channel {channel}: {err}"),
        }
    }

    /// Restarts a receive path that ended on its own. When that fails
    /// the controller falls back to `Idle`.
    fn recover_reception(&mut self) -> bool {
        if self.radio.is_receiving() {
            return true;
        }

        log::warn!("Reception stopped unexpectedly, restarting.");
        match self.radio.set_promiscuous(true) {
            Ok(_) => true,
            Err(err) => {
                log::error!("Failed to restart reception: {err}");
                self.shared.set_capturing(false);
                self.state = ControllerState::Idle;
                false
            },
        }
    }

    pub fn start_attack(&mut self, mode: AttackMode, now: Instant) -> Result<(), ControllerError> {
        if self.state == ControllerState::Idle {
            return Err(ControllerError::NotCapturing);
        }
        if mode.is_empty() {
            return Err(ControllerError::EmptyAttack);
        }

        // Sustained transmission and scanning do not mix.
        self.radio.set_promiscuous(false)?;
        self.shared.set_capturing(false);

        let channel = self.attack_channel(&mode);
        if channel != self.shared.stats.channel()
            && let Err(err) = self.tune(channel)
        {
            log::warn!("Failed to switch to channel {channel}: {err}");
        }

        log::info!("Attack started: {mode} on channel {channel}.");
        self.attack = Some(Attack::new(mode, channel, now, StdRng::from_os_rng()));
        self.state = ControllerState::Attacking;

        Ok(())
    }

    /// Deauth attacks follow the target network's channel when it is known.
    fn attack_channel(&self, mode: &AttackMode) -> u8 {
        let current = self.shared.stats.channel();
        match mode {
            AttackMode::Deauth { bssid, .. } => self
                .shared
                .networks
                .find_by_address(bssid)
                .and_then(|index| self.shared.networks.get(index))
                .map(|record| record.channel)
                .filter(|channel| *channel != 0)
                .unwrap_or(current),
            AttackMode::BeaconSpam { .. } | AttackMode::ProbeFlood { .. } => current,
        }
    }

    fn run_attack(&mut self, now: Instant) {
        let attack = match self.attack.as_mut() {
            Some(value) => value,
            None => {
                self.resume_or_log();
                return;
            },
        };

        if attack.is_expired(now, self.settings.attack_timeout) {
            log::info!("Attack timed out: {}.", attack.mode());
            self.resume_or_log();
            return;
        }

        if !attack.is_due(now, self.settings.attack_interval) {
            return;
        }

        let sent = attack.fire(now, &mut self.injector, &mut self.radio);
        self.shared.events.post(CaptureEvent::new(
            EventKind::AttackFired,
            format_args!("{} sent {}", attack.mode(), sent),
        ));
    }

    pub fn stop_attack(&mut self) -> Result<(), ControllerError> {
        if self.state != ControllerState::Attacking {
            return Ok(());
        }

        log::info!("Attack stopped.");
        self.resume_capture()
    }

    fn resume_capture(&mut self) -> Result<(), ControllerError> {
        self.attack = None;
        self.tune(self.hop_channel())?;
        self.radio.set_promiscuous(true)?;

        self.shared.set_capturing(true);
        self.last_hop = None;
        self.state = ControllerState::Capturing;

        Ok(())
    }

    fn resume_or_log(&mut self) {
        if let Err(err) = self.resume_capture() {
            log::error!("Failed to resume capture: {err}");
        }
    }

    fn tune(&mut self, channel: u8) -> Result<(), RadioError> {
        self.radio.set_channel(channel)?;
        self.shared.stats.set_channel(channel);
        Ok(())
    }

    fn hop_channel(&self) -> u8 {
        self.settings.channels[self.channel_index % self.settings.channels.len()]
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn poll_event(&self) -> Option<CaptureEvent> {
        self.shared.events.poll()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot(self.state)
    }

    pub fn networks(&self) -> &NetworkRegistry {
        &self.shared.networks
    }

    pub fn clients(&self) -> &NetworkRegistry {
        &self.shared.clients
    }

    pub fn attack(&self) -> Option<&Attack> {
        self.attack.as_ref()
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Radio error.")]
    RadioError(#[from] RadioError),

    #[error("Channel list is empty.")]
    NoChannels,

    #[error("Attacks can only start while capturing.")]
    NotCapturing,

    #[error("Attack has nothing to transmit.")]
    EmptyAttack,
}

impl ControllerError {
    pub fn additional_info(&self) -> Option<String> {
        match self {
            ControllerError::RadioError(err) => Some(err.to_string()),
            _ => None,
        }
    }
}
