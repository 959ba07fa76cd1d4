//! This module provides the keypad state for the 16-key CHIP-8 keypad. The
//! host's input adapter writes key states; the core only reads them.

/// Keypad state for the [`super::Chip8`]. Keys are numbered `0x0..=0xF`;
/// updates for anything outside that range are ignored.
#[cfg_attr(
    feature = "persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
#[derive(Default)]
pub struct Input {
    state: [bool; 16],
}

impl Input {
    /// Creates a new [`Input`] with no keys pressed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates the pressed state of the given key code.
    pub fn update(&mut self, key_code: u8, pressed: bool) {
        if let Some(key) = self.state.get_mut(usize::from(key_code)) {
            *key = pressed;
        }
    }

    /// Returns whether the given key is currently pressed. Key codes above
    /// `0xF` are never pressed.
    #[must_use]
    pub fn is_key_pressed(&self, key_code: u8) -> bool {
        self.state
            .get(usize::from(key_code))
            .copied()
            .unwrap_or(false)
    }

    /// Returns the lowest-numbered pressed key, if any. The wait-for-key
    /// instruction polls this each step.
    #[must_use]
    pub fn first_pressed(&self) -> Option<u8> {
        self.state
            .iter()
            .position(|&pressed| pressed)
            .map(|key| key as u8)
    }
}
