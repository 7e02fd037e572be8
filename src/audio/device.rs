//! Audio device lookup and stream configuration

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{SampleRate, StreamConfig, SupportedStreamConfigRange};

use crate::constants::CHANNELS;
use crate::error::AudioError;

/// What the host reports about one device
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    pub is_input: bool,
    pub is_output: bool,
    pub is_default: bool,
    pub sample_rates: Vec<u32>,
    pub channels: Vec<u16>,
}

/// List all available audio devices
pub fn list_devices() -> Vec<DeviceInfo> {
    let host = cpal::default_host();
    let mut devices: Vec<DeviceInfo> = Vec::new();

    let default_input = host.default_input_device().and_then(|d| d.name().ok());
    let default_output = host.default_output_device().and_then(|d| d.name().ok());

    if let Ok(inputs) = host.input_devices() {
        for device in inputs {
            let Ok(name) = device.name() else { continue };
            let (sample_rates, channels) = match device.supported_input_configs() {
                Ok(configs) => capabilities(configs),
                Err(_) => (Vec::new(), Vec::new()),
            };
            devices.push(DeviceInfo {
                is_default: default_input.as_ref() == Some(&name),
                name,
                is_input: true,
                is_output: false,
                sample_rates,
                channels,
            });
        }
    }

    if let Ok(outputs) = host.output_devices() {
        for device in outputs {
            let Ok(name) = device.name() else { continue };
            let is_default = default_output.as_ref() == Some(&name);

            // Duplex devices show up once
            if let Some(existing) = devices.iter_mut().find(|d| d.name == name) {
                existing.is_output = true;
                existing.is_default |= is_default;
                continue;
            }

            let (sample_rates, channels) = match device.supported_output_configs() {
                Ok(configs) => capabilities(configs),
                Err(_) => (Vec::new(), Vec::new()),
            };
            devices.push(DeviceInfo {
                name,
                is_input: false,
                is_output: true,
                is_default,
                sample_rates,
                channels,
            });
        }
    }

    devices
}

fn capabilities(configs: impl Iterator<Item = SupportedStreamConfigRange>) -> (Vec<u32>, Vec<u16>) {
    let mut rates = Vec::new();
    let mut channels = Vec::new();

    for config in configs {
        for rate in [22_050u32, 44_100, 48_000, 96_000] {
            let supported = SampleRate(rate) >= config.min_sample_rate()
                && SampleRate(rate) <= config.max_sample_rate();
            if supported && !rates.contains(&rate) {
                rates.push(rate);
            }
        }
        if !channels.contains(&config.channels()) {
            channels.push(config.channels());
        }
    }

    rates.sort_unstable();
    channels.sort_unstable();
    (rates, channels)
}

/// Input device by name, or the host default
pub fn input_device(name: Option<&str>) -> Result<cpal::Device, AudioError> {
    let host = cpal::default_host();
    match name {
        None => host
            .default_input_device()
            .ok_or_else(|| AudioError::DeviceNotFound("No default input device".to_string())),
        Some(name) => find_by_name(
            host.input_devices()
                .map_err(|e| AudioError::DeviceNotFound(e.to_string()))?,
            name,
        ),
    }
}

/// Output device by name, or the host default
pub fn output_device(name: Option<&str>) -> Result<cpal::Device, AudioError> {
    let host = cpal::default_host();
    match name {
        None => host
            .default_output_device()
            .ok_or_else(|| AudioError::DeviceNotFound("No default output device".to_string())),
        Some(name) => find_by_name(
            host.output_devices()
                .map_err(|e| AudioError::DeviceNotFound(e.to_string()))?,
            name,
        ),
    }
}

fn find_by_name(
    mut devices: impl Iterator<Item = cpal::Device>,
    name: &str,
) -> Result<cpal::Device, AudioError> {
    devices
        .find(|d| d.name().map(|n| n == name).unwrap_or(false))
        .ok_or_else(|| AudioError::DeviceNotFound(name.to_string()))
}

/// Stream config at `sample_rate`, mono when the device allows it.
///
/// There is no resampling, so a device that cannot run at `sample_rate`
/// is rejected.
pub fn stream_config(
    device: &cpal::Device,
    sample_rate: u32,
    is_input: bool,
) -> Result<StreamConfig, AudioError> {
    let configs: Vec<SupportedStreamConfigRange> = if is_input {
        device
            .supported_input_configs()
            .map_err(|e| AudioError::UnsupportedFormat(e.to_string()))?
            .collect()
    } else {
        device
            .supported_output_configs()
            .map_err(|e| AudioError::UnsupportedFormat(e.to_string()))?
            .collect()
    };

    let rate = SampleRate(sample_rate);
    let channels = configs
        .iter()
        .filter(|c| c.min_sample_rate() <= rate && rate <= c.max_sample_rate())
        .map(|c| c.channels())
        .min_by_key(|&ch| if ch == CHANNELS { 0 } else { ch })
        .ok_or_else(|| {
            AudioError::UnsupportedFormat(format!("device does not support {} Hz", sample_rate))
        })?;

    Ok(StreamConfig {
        channels,
        sample_rate: rate,
        buffer_size: cpal::BufferSize::Default,
    })
}

/// Print every device to stdout, the way the binaries show them at startup
pub fn print_devices() {
    println!("\n=== Available Audio Devices ===");
    for device in list_devices() {
        let device_type = match (device.is_input, device.is_output) {
            (true, true) => "Input/Output",
            (true, false) => "Input",
            (false, true) => "Output",
            _ => "Unknown",
        };
        let default_marker = if device.is_default { " [DEFAULT]" } else { "" };
        println!("  {} ({}){}:", device.name, device_type, default_marker);
        println!("    Sample rates: {:?}", device.sample_rates);
        println!("    Channels: {:?}", device.channels);
    }
    println!();
}
