//! Control-channel wire format
//!
//! One message per effect change: a UTF-8 effect token, optionally followed
//! by one numeric parameter, terminated by a NUL byte. There is no length
//! prefix and no acknowledgment.
//!
//! ```text
//! "none\0"  "low\0"  "high\0"  "pitch 0.8\0"  "wobble\0"  "wobble 3.5\0"
//! "robot\0"  "echo\0"  "reverb\0"  "distortion\0"
//! ```
//!
//! Unknown tokens, `pitch` without a ratio and unparseable parameters all
//! decode to [`EffectSelector::None`]. Parameters on effects that take none
//! are ignored.

use bytes::{BufMut, BytesMut};
use std::borrow::Cow;
use std::fmt;

use crate::effects::EffectSelector;

/// Byte that ends one control message on the wire
pub const MESSAGE_TERMINATOR: u8 = 0;

/// One effect-change request
#[derive(Debug, Clone, PartialEq)]
pub struct ControlMessage {
    pub effect_name: String,
    pub parameter: Option<f32>,
}

impl ControlMessage {
    /// Split `text` into an effect token and optional parameter.
    ///
    /// Returns `None` for blank input. A parameter that is present but not
    /// a number is kept as NaN so that it decodes to `None` later.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim_matches(|c: char| c.is_whitespace() || c == '\0');
        let mut tokens = text.split_whitespace();
        let effect_name = tokens.next()?.to_ascii_lowercase();
        let parameter = tokens
            .next()
            .map(|token| token.parse::<f32>().unwrap_or(f32::NAN));

        Some(Self {
            effect_name,
            parameter,
        })
    }

    pub fn from_selector(selector: EffectSelector) -> Self {
        Self {
            effect_name: selector.name().to_string(),
            parameter: selector.parameter(),
        }
    }

    /// Map to a selector; anything malformed becomes `None`.
    pub fn to_selector(&self, default_wobble_rate: f32) -> EffectSelector {
        // Older peers announce effects as EFFECT_<NAME>
        let name = self
            .effect_name
            .strip_prefix("effect_")
            .unwrap_or(&self.effect_name);

        let selector = match (name, self.parameter) {
            ("low", _) => EffectSelector::PitchDown,
            ("high", _) => EffectSelector::PitchUp,
            ("pitch", Some(ratio)) => EffectSelector::Pitch(ratio),
            ("wobble", Some(rate)) => EffectSelector::Wobble(rate),
            ("wobble", None) => EffectSelector::Wobble(default_wobble_rate),
            ("robot", _) => EffectSelector::Robot,
            ("echo", _) => EffectSelector::Echo,
            ("reverb", _) => EffectSelector::Reverb,
            ("distortion", _) => EffectSelector::Distortion,
            _ => EffectSelector::None,
        };
        selector.clamped()
    }

    /// Append the NUL-terminated wire form to `buf`.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_slice(self.to_string().as_bytes());
        buf.put_u8(MESSAGE_TERMINATOR);
    }
}

impl fmt::Display for ControlMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parameter {
            Some(value) => write!(f, "{} {}", self.effect_name, value),
            None => f.write_str(&self.effect_name),
        }
    }
}

/// Messages contained in one received chunk.
///
/// A chunk normally carries exactly one message; if the stream coalesced
/// several, they come back in arrival order.
pub fn split_messages(chunk: &[u8]) -> impl Iterator<Item = Cow<'_, str>> {
    chunk
        .split(|&b| b == MESSAGE_TERMINATOR || b == b'\n')
        .filter(|segment| !segment.iter().all(|b| b.is_ascii_whitespace()))
        .map(String::from_utf8_lossy)
}
