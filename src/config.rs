//! Application configuration
//!
//! Stored as TOML in the platform config directory, e.g.
//! `~/.config/lan-voice-fx/config.toml` on Linux. Every field has a default,
//! so a missing file or a partial file both work.

use serde::{Deserialize, Serialize};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::*;
use crate::effects::{MAX_WOBBLE_RATE, MIN_WOBBLE_RATE};
use crate::error::{Error, NetworkError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub audio: AudioConfig,
    pub network: NetworkConfig,
    pub effects: EffectConfig,
}

/// Capture/playback settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    /// Samples per processed frame, constant for a session
    pub frame_size: usize,
    /// Frames buffered between the capture callback and its consumer
    pub queue_capacity: usize,
    /// Input device name; `None` selects the host default
    pub input_device: Option<String>,
    /// Output device name; `None` selects the host default
    pub output_device: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            frame_size: DEFAULT_FRAME_SIZE,
            queue_capacity: FRAME_QUEUE_CAPACITY,
            input_device: None,
            output_device: None,
        }
    }
}

impl AudioConfig {
    /// Bytes on the wire for one frame of i16 mono samples
    pub fn frame_bytes(&self) -> usize {
        self.frame_size * std::mem::size_of::<i16>()
    }

    /// Frame duration in milliseconds
    pub fn frame_duration_ms(&self) -> f32 {
        self.frame_size as f32 * 1000.0 / self.sample_rate as f32
    }
}

/// TCP endpoints for audio and control
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address the receiver side listens on
    pub bind_address: String,
    pub audio_port: u16,
    pub control_port: u16,
    /// Interval between forwarder checks of the active effect
    pub control_poll_ms: u64,
    /// Bounded read buffer for one control message
    pub control_buffer_size: usize,
    pub tcp_nodelay: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            audio_port: DEFAULT_AUDIO_PORT,
            control_port: DEFAULT_CONTROL_PORT,
            control_poll_ms: DEFAULT_CONTROL_POLL_MS,
            control_buffer_size: CONTROL_BUFFER_SIZE,
            tcp_nodelay: true,
        }
    }
}

impl NetworkConfig {
    pub fn audio_bind_addr(&self) -> std::result::Result<SocketAddr, NetworkError> {
        resolve(&self.bind_address, self.audio_port)
    }

    pub fn control_bind_addr(&self) -> std::result::Result<SocketAddr, NetworkError> {
        resolve(&self.bind_address, self.control_port)
    }

    /// Audio endpoint of a peer given its host name or IP
    pub fn audio_peer_addr(&self, host: &str) -> std::result::Result<SocketAddr, NetworkError> {
        resolve(host, self.audio_port)
    }

    /// Control endpoint of a peer given its host name or IP
    pub fn control_peer_addr(&self, host: &str) -> std::result::Result<SocketAddr, NetworkError> {
        resolve(host, self.control_port)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.control_poll_ms)
    }
}

fn resolve(host: &str, port: u16) -> std::result::Result<SocketAddr, NetworkError> {
    (host, port)
        .to_socket_addrs()
        .map_err(|e| NetworkError::InvalidAddress(format!("{}:{}: {}", host, port, e)))?
        .next()
        .ok_or_else(|| NetworkError::InvalidAddress(format!("{}:{}", host, port)))
}

/// Tuning values for the fixed effect set
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectConfig {
    /// Ratio used by `low`
    pub low_ratio: f32,
    /// Ratio used by `high`
    pub high_ratio: f32,
    /// Rate used by `wobble` without a parameter
    pub wobble_rate: f32,
    /// Robot carrier frequency in Hz
    pub robot_carrier_hz: f32,
    pub echo_delay_ms: f32,
    pub echo_feedback: f32,
    pub reverb_mix: f32,
    /// Hard clip threshold for distortion
    pub distortion_threshold: f32,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            low_ratio: 0.6,
            high_ratio: 1.4,
            wobble_rate: DEFAULT_WOBBLE_RATE,
            robot_carrier_hz: 80.0,
            echo_delay_ms: 500.0,
            echo_feedback: 0.5,
            reverb_mix: 0.4,
            distortion_threshold: 0.7,
        }
    }
}

impl EffectConfig {
    /// Clamp every value into the range the effect handlers can run with.
    pub fn sanitized(&self) -> Self {
        Self {
            low_ratio: self.low_ratio.clamp(MIN_PITCH_RATIO, MAX_PITCH_RATIO),
            high_ratio: self.high_ratio.clamp(MIN_PITCH_RATIO, MAX_PITCH_RATIO),
            wobble_rate: self.wobble_rate.clamp(MIN_WOBBLE_RATE, MAX_WOBBLE_RATE),
            robot_carrier_hz: self.robot_carrier_hz.clamp(20.0, 500.0),
            echo_delay_ms: self.echo_delay_ms.clamp(10.0, 2000.0),
            echo_feedback: self.echo_feedback.clamp(0.0, 0.95),
            reverb_mix: self.reverb_mix.clamp(0.0, 0.6),
            distortion_threshold: self.distortion_threshold.clamp(0.05, 1.0),
        }
    }
}

impl AppConfig {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "lan-voice-fx")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load from the default location, falling back to defaults when absent.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                tracing::info!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Reject settings no session can run with.
    pub fn validate(&self) -> Result<()> {
        if self.audio.frame_size == 0 {
            return Err(Error::Config("frame_size must be non-zero".into()));
        }
        if self.audio.sample_rate == 0 {
            return Err(Error::Config("sample_rate must be non-zero".into()));
        }
        if self.audio.queue_capacity < 2 {
            return Err(Error::Config("queue_capacity must be at least 2".into()));
        }
        if self.network.control_buffer_size == 0 {
            return Err(Error::Config("control_buffer_size must be non-zero".into()));
        }
        self.network.audio_bind_addr()?;
        self.network.control_bind_addr()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_wire_format() {
        let config = AppConfig::default();
        assert_eq!(config.audio.sample_rate, 44_100);
        assert_eq!(config.audio.frame_bytes(), config.audio.frame_size * 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [audio]
            frame_size = 256

            [network]
            audio_port = 7000
            "#,
        )
        .unwrap();

        assert_eq!(config.audio.frame_size, 256);
        assert_eq!(config.audio.sample_rate, DEFAULT_SAMPLE_RATE);
        assert_eq!(config.network.audio_port, 7000);
        assert_eq!(config.network.control_port, DEFAULT_CONTROL_PORT);
    }

    #[test]
    fn test_zero_frame_size_rejected() {
        let result = AppConfig::from_toml_str("[audio]\nframe_size = 0\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_effect_values_clamped() {
        let effects = EffectConfig {
            low_ratio: 0.1,
            echo_feedback: 1.5,
            ..Default::default()
        }
        .sanitized();

        assert_eq!(effects.low_ratio, MIN_PITCH_RATIO);
        assert!(effects.echo_feedback < 1.0);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = std::env::temp_dir().join(format!("lan-voice-fx-{}", uuid::Uuid::new_v4()));
        let path = dir.join("config.toml");

        let mut config = AppConfig::default();
        config.network.control_poll_ms = 250;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.network.poll_interval(), Duration::from_millis(250));

        let _ = std::fs::remove_dir_all(dir);
    }
}
