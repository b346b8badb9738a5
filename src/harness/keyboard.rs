//! Raw-terminal single keypress input for the interactive harness loop

use std::io;
use std::os::fd::AsRawFd;

use nix::sys::termios::{tcgetattr, tcsetattr, LocalFlags, SetArg, SpecialCharacterIndices};

use crate::error::{MqError, Result};

/// Read one character from stdin without waiting for a newline
///
/// Temporarily drops canonical mode (VMIN=1, VTIME=0 — block until one
/// byte), then restores the saved terminal state before returning.
pub fn read_one_char() -> Result<char> {
    let stdin = io::stdin();

    let saved = tcgetattr(&stdin)
        .map_err(|e| MqError::platform(format!("tcgetattr failed: {}", e)))?;

    let mut raw = saved.clone();
    raw.local_flags.remove(LocalFlags::ICANON);
    raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
    raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;

    tcsetattr(&stdin, SetArg::TCSANOW, &raw)
        .map_err(|e| MqError::platform(format!("tcsetattr failed: {}", e)))?;

    let mut buf = [0u8; 1];
    let read_result = nix::unistd::read(stdin.as_raw_fd(), &mut buf);

    // Restore before surfacing any read error
    tcsetattr(&stdin, SetArg::TCSANOW, &saved)
        .map_err(|e| MqError::platform(format!("tcsetattr restore failed: {}", e)))?;

    match read_result {
        Ok(1) => Ok(buf[0] as char),
        Ok(n) => Err(MqError::platform(format!(
            "expected 1 byte from stdin, got {}",
            n
        ))),
        Err(e) => Err(MqError::platform(format!("stdin read failed: {}", e))),
    }
}
