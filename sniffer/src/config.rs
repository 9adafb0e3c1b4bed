use capture::CaptureSettings;
use capture::attack::AttackMode;
use capture::settings;
use common::io::FileKind;
use dot11::elements::Ssid;
use dot11::mac::{MacAddress, MacError};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const CONFIG_FILENAME: &str = "config.toml";

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_STATUS_INTERVAL_SECS: u64 = 10;

const MAX_CHANNEL: u8 = 14;

pub struct Config {
    pub log_level: LevelFilter,
    pub log_format: String,

    pub interface: Option<String>,
    pub capture_directory: Option<PathBuf>,

    pub capture: CaptureSettings,
    pub status_interval: Duration,

    pub attack: Option<ScheduledAttack>,
}

/// Attack started automatically once capture has run for `start_after`.
#[derive(Debug, PartialEq)]
pub struct ScheduledAttack {
    pub mode: AttackMode,
    pub start_after: Duration,
}

impl Config {
    pub fn from_file() -> Result<Self, ConfigError> {
        let path = common::io::get_storage_file_path(CONFIG_FILENAME, FileKind::Config)?;

        let data = match std::fs::read_to_string(&path) {
            Ok(value) => value,
            Err(_) => {
                let dto = ConfigDto::default();
                common::io::create_parent_directories(&path)?;
                dto.save_to_file(&path)?;
                return Config::try_from(dto);
            },
        };

        let dto: ConfigDto =
            toml::from_str(&data).map_err(ConfigError::TomlDeserializationError)?;
        Config::try_from(dto)
    }
}

impl TryFrom<ConfigDto> for Config {
    type Error = ConfigError;

    fn try_from(dto: ConfigDto) -> Result<Self, Self::Error> {
        let log_level =
            LevelFilter::from_str(&dto.log_level).map_err(|_| ConfigError::UnknownLogLevel)?;

        if dto.channels.is_empty()
            || dto
                .channels
                .iter()
                .any(|channel| *channel == 0 || *channel > MAX_CHANNEL)
        {
            return Err(ConfigError::InvalidChannels);
        }

        if dto.ring_capacity < capture::ring::MIN_CAPACITY {
            return Err(ConfigError::InvalidRingCapacity);
        }

        let capture = CaptureSettings {
            channels: dto.channels,
            hop_interval: Duration::from_millis(dto.hop_interval_ms),

            ring_capacity: dto.ring_capacity,
            network_capacity: dto.network_capacity,
            client_capacity: dto.client_capacity,
            event_queue_depth: dto.event_queue_depth,

            flush_interval: Duration::from_secs(dto.flush_interval_secs),
            max_file_bytes: dto.max_file_bytes,
            drain_interval: Duration::from_millis(dto.drain_interval_ms),

            attack_interval: Duration::from_millis(dto.attack_interval_ms),
            attack_timeout: Duration::from_secs(dto.attack_timeout_secs),
            deauth_burst: dto.deauth_burst,
            deauth_burst_delay: settings::DEFAULT_DEAUTH_BURST_DELAY,
        };

        let attack = match dto.attack {
            Some(attack) => Some(ScheduledAttack::try_from(attack)?),
            None => None,
        };

        Ok(Self {
            log_level,
            log_format: dto.log_format,

            interface: dto.interface,
            capture_directory: dto.capture_directory,

            capture,
            status_interval: Duration::from_secs(dto.status_interval_secs),

            attack,
        })
    }
}

impl TryFrom<AttackDto> for ScheduledAttack {
    type Error = ConfigError;

    fn try_from(dto: AttackDto) -> Result<Self, Self::Error> {
        let ssids: Vec<Ssid> = dto.ssids.iter().map(|name| Ssid::from(name.as_str())).collect();

        let mode = match dto.mode {
            AttackKind::BeaconSpam => AttackMode::BeaconSpam { ssids },
            AttackKind::ProbeFlood => AttackMode::ProbeFlood { ssids },
            AttackKind::Deauth => {
                let bssid = dto.bssid.ok_or(ConfigError::MissingAttackBssid)?;
                let bssid =
                    MacAddress::try_from(bssid.as_str()).map_err(ConfigError::WrongMacAddress)?;
                let target = match dto.target {
                    Some(value) => MacAddress::try_from(value.as_str())
                        .map_err(ConfigError::WrongMacAddress)?,
                    None => MacAddress::BROADCAST,
                };
                AttackMode::Deauth { bssid, target }
            },
        };

        Ok(Self {
            mode,
            start_after: Duration::from_secs(dto.start_after_secs),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigDto {
    pub log_level: String,
    pub log_format: String,

    pub interface: Option<String>,
    pub capture_directory: Option<PathBuf>,

    pub channels: Vec<u8>,
    pub hop_interval_ms: u64,

    pub ring_capacity: usize,
    pub network_capacity: usize,
    pub client_capacity: usize,
    pub event_queue_depth: usize,

    pub flush_interval_secs: u64,
    pub max_file_bytes: u64,
    pub drain_interval_ms: u64,

    pub attack_interval_ms: u64,
    pub attack_timeout_secs: u64,
    pub deauth_burst: usize,

    pub status_interval_secs: u64,

    pub attack: Option<AttackDto>,
}

impl Default for ConfigDto {
    fn default() -> Self {
        let capture = CaptureSettings::default();

        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: common::logging::DEFAULT_FORMAT.to_string(),

            interface: None,
            capture_directory: None,

            channels: capture.channels,
            hop_interval_ms: capture.hop_interval.as_millis() as u64,

            ring_capacity: capture.ring_capacity,
            network_capacity: capture.network_capacity,
            client_capacity: capture.client_capacity,
            event_queue_depth: capture.event_queue_depth,

            flush_interval_secs: capture.flush_interval.as_secs(),
            max_file_bytes: capture.max_file_bytes,
            drain_interval_ms: capture.drain_interval.as_millis() as u64,

            attack_interval_ms: capture.attack_interval.as_millis() as u64,
            attack_timeout_secs: capture.attack_timeout.as_secs(),
            deauth_burst: capture.deauth_burst,

            status_interval_secs: DEFAULT_STATUS_INTERVAL_SECS,

            attack: None,
        }
    }
}

impl ConfigDto {
    pub fn save_to_file(&self, path: &PathBuf) -> Result<(), ConfigError> {
        let data = toml::to_string(&self).map_err(ConfigError::TomlSerializationError)?;

        std::fs::write(path, data).map_err(ConfigError::IOError)?;

        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AttackDto {
    pub mode: AttackKind,
    #[serde(default)]
    pub ssids: Vec<String>,
    pub bssid: Option<String>,
    pub target: Option<String>,
    #[serde(default)]
    pub start_after_secs: u64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackKind {
    BeaconSpam,
    Deauth,
    ProbeFlood,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO Error.")]
    IOError(#[from] std::io::Error),

    #[error("TOML Serialization Error.")]
    TomlSerializationError(#[from] toml::ser::Error),

    #[error("TOML Deserialization Error.")]
    TomlDeserializationError(#[from] toml::de::Error),

    #[error("Unknown log level.")]
    UnknownLogLevel,

    #[error("Channel list must be non-empty, with channels from 1 to 14.")]
    InvalidChannels,

    #[error("Ring capacity must be at least 64 bytes.")]
    InvalidRingCapacity,

    #[error("Deauth attack needs a BSSID.")]
    MissingAttackBssid,

    #[error("Wrong MAC address.")]
    WrongMacAddress(MacError),
}

impl ConfigError {
    pub fn additional_info(&self) -> Option<String> {
        match self {
            ConfigError::IOError(err) => Some(err.to_string()),
            ConfigError::TomlSerializationError(err) => Some(err.to_string()),
            ConfigError::TomlDeserializationError(err) => Some(err.to_string()),
            ConfigError::WrongMacAddress(err) => Some(err.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_round_trip() {
        let data = toml::to_string(&ConfigDto::default()).unwrap();
        let dto: ConfigDto = toml::from_str(&data).unwrap();
        let config = Config::try_from(dto).unwrap();

        assert_eq!(config.log_level, LevelFilter::Info);
        assert_eq!(config.log_format, common::logging::DEFAULT_FORMAT);
        assert_eq!(config.capture, CaptureSettings::default());
        assert_eq!(config.status_interval, Duration::from_secs(10));
        assert!(config.attack.is_none());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dto: ConfigDto = toml::from_str("log_level = \"debug\"\nchannels = [1, 6, 11]\n").unwrap();
        let config = Config::try_from(dto).unwrap();

        assert_eq!(config.log_level, LevelFilter::Debug);
        assert_eq!(config.capture.channels, vec![1, 6, 11]);
        assert_eq!(config.capture.hop_interval, Duration::from_millis(200));
    }

    #[test]
    fn test_unknown_log_level() {
        let dto = ConfigDto {
            log_level: "loud".to_string(),
            ..Default::default()
        };
        assert!(matches!(Config::try_from(dto), Err(ConfigError::UnknownLogLevel)));
    }

    #[test]
    fn test_invalid_channels() {
        for channels in [vec![], vec![1, 15], vec![0]] {
            let dto = ConfigDto {
                channels,
                ..Default::default()
            };
            assert!(matches!(Config::try_from(dto), Err(ConfigError::InvalidChannels)));
        }
    }

    #[test]
    fn test_invalid_ring_capacity() {
        let dto = ConfigDto {
            ring_capacity: 10,
            ..Default::default()
        };
        assert!(matches!(Config::try_from(dto), Err(ConfigError::InvalidRingCapacity)));
    }

    #[test]
    fn test_deauth_attack() {
        let data = "[attack]\nmode = \"deauth\"\nbssid = \"66:77:88:99:AA:BB\"\nstart_after_secs = 30\n";
        let dto: ConfigDto = toml::from_str(data).unwrap();
        let config = Config::try_from(dto).unwrap();

        let expected = ScheduledAttack {
            mode: AttackMode::Deauth {
                bssid: MacAddress::try_from("66:77:88:99:AA:BB").unwrap(),
                target: MacAddress::BROADCAST,
            },
            start_after: Duration::from_secs(30),
        };
        assert_eq!(config.attack, Some(expected));
    }

    #[test]
    fn test_deauth_attack_without_bssid() {
        let data = "[attack]\nmode = \"deauth\"\n";
        let dto: ConfigDto = toml::from_str(data).unwrap();
        assert!(matches!(Config::try_from(dto), Err(ConfigError::MissingAttackBssid)));
    }

    #[test]
    fn test_beacon_spam_attack() {
        let data = "[attack]\nmode = \"beacon_spam\"\nssids = [\"one\", \"two\"]\n";
        let dto: ConfigDto = toml::from_str(data).unwrap();
        let config = Config::try_from(dto).unwrap();

        let attack = config.attack.unwrap();
        assert_eq!(
            attack.mode,
            AttackMode::BeaconSpam {
                ssids: vec![Ssid::from("one"), Ssid::from("two")]
            }
        );
        assert_eq!(attack.start_after, Duration::ZERO);
    }
}
