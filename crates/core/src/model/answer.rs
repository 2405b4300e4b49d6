use serde::{Deserialize, Serialize};

/// Wire value reserved for "no answer".
pub const WIRE_NONE: u8 = 0;

/// The user's classification of a single flip.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Answer {
    #[default]
    Unanswered,
    Left,
    Right,
    Inappropriate,
}

impl Answer {
    /// In-memory option index, `None` while unanswered.
    #[must_use]
    pub const fn option_value(self) -> Option<u8> {
        match self {
            Self::Unanswered => None,
            Self::Left => Some(0),
            Self::Right => Some(1),
            Self::Inappropriate => Some(2),
        }
    }

    /// Reported-inappropriate counts as answered.
    #[must_use]
    pub const fn is_answered(self) -> bool {
        self.option_value().is_some()
    }

    /// Value sent to the node: option index shifted by one, so that 0 means no answer.
    #[must_use]
    pub const fn wire_value(self) -> u8 {
        match self.option_value() {
            Some(value) => value + 1,
            None => WIRE_NONE,
        }
    }
}
