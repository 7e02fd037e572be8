//! TCP transport for processed audio and control messages

pub mod session;
pub mod transport;

pub use session::{ChannelKind, NetworkSession, Role, SessionListener};
pub use transport::{
    accept_and_receive, connect_and_send, receive_session, send_session, AudioReceiver,
    AudioSender, FrameSink, FrameSource,
};
