use std::fmt::Display;

/// Looping behaviour of the playback engine.
///
/// The engine is authoritative; the session only mirrors what it confirms.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RepeatMode {
    #[default]
    Off = 0,
    All = 1,
    One = 2,
}

impl RepeatMode {
    /// Off -> All -> One -> Off
    pub fn next(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }
}

impl From<RepeatMode> for u8 {
    fn from(mode: RepeatMode) -> u8 {
        mode as u8
    }
}

impl TryFrom<u8> for RepeatMode {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(RepeatMode::Off),
            1 => Ok(RepeatMode::All),
            2 => Ok(RepeatMode::One),
            _ => Err(()),
        }
    }
}

impl Display for RepeatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepeatMode::Off => write!(f, "off"),
            RepeatMode::All => write!(f, "all"),
            RepeatMode::One => write!(f, "one"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_steps_return_to_off() {
        let mode = RepeatMode::Off.next().next().next();
        assert_eq!(mode, RepeatMode::Off);
    }

    #[test]
    fn u8_conversion_rejects_garbage() {
        assert_eq!(RepeatMode::try_from(2u8), Ok(RepeatMode::One));
        assert!(RepeatMode::try_from(9u8).is_err());
    }
}
