//! Part categories

use core::fmt;
use serde::{Deserialize, Serialize};

/// Category of a part, used for attach-point compatibility checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartCategory {
    /// Main body
    Fuselage,
    Cockpit,
    Engine,
    Thruster,
    /// Antennas and other decorations
    Accessory,
}

impl PartCategory {
    /// Every category, in declaration order
    pub const ALL: [PartCategory; 5] = [
        Self::Fuselage,
        Self::Cockpit,
        Self::Engine,
        Self::Thruster,
        Self::Accessory,
    ];
}

impl fmt::Display for PartCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fuselage => "fuselage",
            Self::Cockpit => "cockpit",
            Self::Engine => "engine",
            Self::Thruster => "thruster",
            Self::Accessory => "accessory",
        };
        write!(f, "{}", name)
    }
}
