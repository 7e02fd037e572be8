//! Audio subsystem module

pub mod bridge;
pub mod buffer;
pub mod capture;
pub mod device;
pub mod playback;
pub mod stream;

pub use bridge::{AudioBridge, BridgeState, FrameProcessor};
pub use buffer::{create_frame_queue, AudioFrame, FrameQueue, SharedFrameQueue};
pub use capture::AudioCapture;
pub use device::{list_devices, print_devices, DeviceInfo};
pub use playback::AudioPlayback;
