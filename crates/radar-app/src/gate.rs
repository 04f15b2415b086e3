//! Hidden unlock gesture and passcode prompt for the admin surface.

use std::time::Duration;

use subtle::ConstantTimeEq;
use tokio::time::Instant;

pub const GATE_TAPS: u32 = 5;
pub const GATE_WINDOW: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasscodeOutcome {
    Granted,
    Rejected,
}

/// Counts logo taps; five taps without a two-second gap open the prompt.
pub struct UnlockGate {
    secret: String,
    count: u32,
    deadline: Option<Instant>,
    prompt_open: bool,
}

impl std::fmt::Debug for UnlockGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnlockGate")
            .field("secret", &"[redacted]")
            .field("count", &self.count)
            .field("deadline", &self.deadline)
            .field("prompt_open", &self.prompt_open)
            .finish()
    }
}

impl UnlockGate {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            count: 0,
            deadline: None,
            prompt_open: false,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn prompt_open(&self) -> bool {
        self.prompt_open
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Registers one tap. Returns `true` when this tap opened the prompt.
    ///
    /// Taps while the prompt is already open are ignored.
    pub fn activate(&mut self, now: Instant) -> bool {
        if self.prompt_open {
            return false;
        }
        self.count += 1;
        if self.count >= GATE_TAPS {
            self.count = 0;
            self.deadline = None;
            self.prompt_open = true;
            return true;
        }
        self.deadline = Some(now + GATE_WINDOW);
        false
    }

    /// Resets the counter once the inactivity window has passed.
    ///
    /// Returns `true` if a partial sequence was discarded.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                let had_taps = self.count > 0;
                self.count = 0;
                had_taps
            }
            _ => false,
        }
    }

    /// Checks a code typed into the prompt. A match closes the prompt; a
    /// mismatch leaves it open for another try.
    pub fn submit(&mut self, code: &str) -> PasscodeOutcome {
        if bool::from(code.as_bytes().ct_eq(self.secret.as_bytes())) {
            self.prompt_open = false;
            PasscodeOutcome::Granted
        } else {
            PasscodeOutcome::Rejected
        }
    }

    pub fn close_prompt(&mut self) {
        self.prompt_open = false;
    }
}
