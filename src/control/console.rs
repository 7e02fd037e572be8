//! Interactive effect selection from a terminal

use std::io::{self, BufRead, Write};

use crate::control::ControlChannel;

pub const PROMPT: &str = "Effect > ";

/// Read `effect_name [parameter]` lines until end of input.
///
/// Returns the number of effect changes applied.
pub fn run_console<R, W>(mut input: R, mut output: W, channel: &ControlChannel) -> io::Result<u64>
where
    R: BufRead,
    W: Write,
{
    let mut line = String::new();
    let mut applied = 0;

    loop {
        output.write_all(PROMPT.as_bytes())?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(applied);
        }

        if let Some(selector) = channel.apply(&line) {
            writeln!(output, "Effect changed to: {}", selector)?;
            applied += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EffectConfig;
    use crate::effects::EffectSelector;
    use crate::state::create_shared_state;

    #[test]
    fn test_console_session() {
        let channel = ControlChannel::new(create_shared_state(), &EffectConfig::default());
        let input = b"high\n\npitch 0.8\nbogus\n".as_slice();
        let mut output = Vec::new();

        let applied = run_console(input, &mut output, &channel).unwrap();
        assert_eq!(applied, 3);
        assert_eq!(channel.current(), EffectSelector::None);

        let text = String::from_utf8(output).unwrap();
        assert!(text.starts_with(PROMPT));
        assert!(text.contains("Effect changed to: high\n"));
        assert!(text.contains("Effect changed to: pitch 0.8\n"));
        assert_eq!(text.matches(PROMPT).count(), 5);
    }
}
