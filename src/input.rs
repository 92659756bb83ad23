use crate::state::Register;

pub const NUM_KEYS: usize = 16;

/// Which of the 16 hex keys are currently held down.
#[derive(Default)]
pub struct Keypad {
    keys: [bool; NUM_KEYS],
}

impl Keypad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press_key(&mut self, key: u8) {
        if let Some(state) = self.keys.get_mut(usize::from(key)) {
            *state = true;
        }
    }

    pub fn release_key(&mut self, key: u8) {
        if let Some(state) = self.keys.get_mut(usize::from(key)) {
            *state = false;
        }
    }

    /// Values outside the keypad are never pressed.
    pub fn is_key_pressed(&self, key: u8) -> bool {
        self.keys.get(usize::from(key)).copied().unwrap_or(false)
    }

    pub fn release_all(&mut self) {
        self.keys = [false; NUM_KEYS];
    }
}

/// Progress of an `Fx0A` wait. A key only counts once it has been pressed
/// and then released.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyWait {
    #[default]
    Idle,
    AwaitingPress(Register),
    AwaitingRelease(Register, u8),
}

impl KeyWait {
    pub fn is_waiting(&self) -> bool {
        !matches!(self, KeyWait::Idle)
    }

    /// The wait instruction executed. Re-executions leave an ongoing wait
    /// untouched.
    pub fn begin(&mut self, register: Register) {
        if *self == KeyWait::Idle {
            *self = KeyWait::AwaitingPress(register);
        }
    }

    /// Values outside the keypad never start a release wait.
    pub fn key_down(&mut self, key: u8) {
        if usize::from(key) >= NUM_KEYS {
            return;
        }
        if let KeyWait::AwaitingPress(register) = *self {
            *self = KeyWait::AwaitingRelease(register, key);
        }
    }

    /// Returns the destination register and key once the tracked key is
    /// released.
    pub fn key_up(&mut self, key: u8) -> Option<(Register, u8)> {
        match *self {
            KeyWait::AwaitingRelease(register, tracked) if tracked == key => {
                *self = KeyWait::Idle;
                Some((register, key))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypad() {
        let mut keypad = Keypad::new();
        keypad.press_key(0xA);
        keypad.press_key(0x3);
        assert!(keypad.is_key_pressed(0xA));
        keypad.release_key(0xA);
        assert!(!keypad.is_key_pressed(0xA));
        assert!(keypad.is_key_pressed(0x3));
        assert!(!keypad.is_key_pressed(0x42));
        keypad.release_all();
        assert!(!keypad.is_key_pressed(0x3));
    }

    #[test]
    fn test_press_then_release() {
        let mut wait = KeyWait::default();
        wait.key_down(1);
        assert_eq!(wait, KeyWait::Idle);

        wait.begin(Register::V4);
        assert_eq!(wait, KeyWait::AwaitingPress(Register::V4));
        assert_eq!(wait.key_up(7), None);

        wait.key_down(7);
        assert_eq!(wait, KeyWait::AwaitingRelease(Register::V4, 7));
        wait.begin(Register::V4);
        assert_eq!(wait, KeyWait::AwaitingRelease(Register::V4, 7));

        assert_eq!(wait.key_up(7), Some((Register::V4, 7)));
        assert!(!wait.is_waiting());
    }

    #[test]
    fn test_other_keys_are_ignored_while_tracking() {
        let mut wait = KeyWait::default();
        wait.begin(Register::V0);
        wait.key_down(2);
        wait.key_down(9);
        assert_eq!(wait.key_up(9), None);
        assert_eq!(wait, KeyWait::AwaitingRelease(Register::V0, 2));
        assert_eq!(wait.key_up(2), Some((Register::V0, 2)));
    }

    #[test]
    fn test_out_of_range_key_is_ignored() {
        let mut wait = KeyWait::default();
        wait.begin(Register::V3);
        wait.key_down(0x42);
        assert_eq!(wait, KeyWait::AwaitingPress(Register::V3));
        assert_eq!(wait.key_up(0x42), None);
        assert!(wait.is_waiting());

        wait.key_down(0xF);
        assert_eq!(wait.key_up(0xF), Some((Register::V3, 0xF)));
    }
}
