use serde::{Deserialize, Serialize};

/// A discrete protocol rule variant, keyed by block number.
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Fork {
    #[default]
    Frontier = 0,
    Homestead = 1,
    /// EIP-150, the Tangerine Whistle gas repricing.
    Tangerine = 2,
}

impl From<Fork> for &'static str {
    fn from(fork: Fork) -> Self {
        match fork {
            Fork::Frontier => "Frontier",
            Fork::Homestead => "Homestead",
            Fork::Tangerine => "Tangerine",
        }
    }
}
