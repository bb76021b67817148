// Kit Instruments - Drum kit pieces and the limbs that strike them
// Instruments are listed in tablature row order (cymbals on top, feet at the bottom)

use serde::{Deserialize, Serialize};

/// A single playable surface on the kit
///
/// Ordering follows the tablature rows, so a `BTreeMap<Instrument, _>` iterates
/// in the order the rows are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instrument {
    /// Crash cymbal on the left side of the kit
    CrashLeft,

    /// Crash cymbal on the right side of the kit
    CrashRight,

    Splash,

    Ride,

    /// Hi-hat struck with a stick
    #[serde(rename = "hihat")]
    HiHat,

    /// Rack tom, highest pitch
    Tom1,

    /// Rack tom, second highest pitch
    Tom2,

    Snare,

    FloorTom1,

    /// Floor tom, lowest pitch
    FloorTom2,

    Kick,

    /// Hi-hat pedal (open/close with the foot)
    #[serde(rename = "hihat_foot", alias = "open_hihat")]
    HiHatFoot,
}

impl Instrument {
    /// Every instrument, in tablature row order
    pub const ALL: [Instrument; 12] = [
        Instrument::CrashLeft,
        Instrument::CrashRight,
        Instrument::Splash,
        Instrument::Ride,
        Instrument::HiHat,
        Instrument::Tom1,
        Instrument::Tom2,
        Instrument::Snare,
        Instrument::FloorTom1,
        Instrument::FloorTom2,
        Instrument::Kick,
        Instrument::HiHatFoot,
    ];

    /// Convert from string representation (groove files use snake_case)
    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "crash_left" => Some(Instrument::CrashLeft),
            "crash_right" => Some(Instrument::CrashRight),
            "splash" => Some(Instrument::Splash),
            "ride" => Some(Instrument::Ride),
            "hihat" => Some(Instrument::HiHat),
            "tom1" => Some(Instrument::Tom1),
            "tom2" => Some(Instrument::Tom2),
            "snare" => Some(Instrument::Snare),
            "floor_tom1" => Some(Instrument::FloorTom1),
            "floor_tom2" => Some(Instrument::FloorTom2),
            "kick" => Some(Instrument::Kick),
            "hihat_foot" | "open_hihat" => Some(Instrument::HiHatFoot),
            _ => None,
        }
    }

    /// Convert to string representation
    pub fn to_string(&self) -> &'static str {
        match self {
            Instrument::CrashLeft => "crash_left",
            Instrument::CrashRight => "crash_right",
            Instrument::Splash => "splash",
            Instrument::Ride => "ride",
            Instrument::HiHat => "hihat",
            Instrument::Tom1 => "tom1",
            Instrument::Tom2 => "tom2",
            Instrument::Snare => "snare",
            Instrument::FloorTom1 => "floor_tom1",
            Instrument::FloorTom2 => "floor_tom2",
            Instrument::Kick => "kick",
            Instrument::HiHatFoot => "hihat_foot",
        }
    }

    /// Row label used in tablature output
    pub fn label(&self) -> &'static str {
        match self {
            Instrument::CrashLeft => "CrashL",
            Instrument::CrashRight => "CrashR",
            Instrument::Splash => "Splash",
            Instrument::Ride => "Ride",
            Instrument::HiHat => "HiHat",
            Instrument::Tom1 => "Tom1",
            Instrument::Tom2 => "Tom2",
            Instrument::Snare => "Snare",
            Instrument::FloorTom1 => "Floortom1",
            Instrument::FloorTom2 => "Floortom2",
            Instrument::Kick => "Kick",
            Instrument::HiHatFoot => "Hihat foot",
        }
    }

    /// Pedal instruments are pinned to a foot and never alternate
    pub fn is_foot(&self) -> bool {
        matches!(self, Instrument::Kick | Instrument::HiHatFoot)
    }

    pub fn is_hand(&self) -> bool {
        !self.is_foot()
    }

    pub fn is_tom(&self) -> bool {
        self.tom_pitch().is_some()
    }

    /// Relative tom pitch, 0 = highest
    pub fn tom_pitch(&self) -> Option<u8> {
        match self {
            Instrument::Tom1 => Some(0),
            Instrument::Tom2 => Some(1),
            Instrument::FloorTom1 => Some(2),
            Instrument::FloorTom2 => Some(3),
            _ => None,
        }
    }

    /// Hi-hat and ride carry the subdivided time-keeping figure of a groove
    pub fn is_timekeeper(&self) -> bool {
        matches!(self, Instrument::HiHat | Instrument::Ride)
    }

    /// Cymbals used for accents rather than time keeping
    pub fn is_accent_cymbal(&self) -> bool {
        matches!(
            self,
            Instrument::CrashLeft | Instrument::CrashRight | Instrument::Splash
        )
    }
}

/// One of the drummer's two hands
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub fn opposite(&self) -> Hand {
        match self {
            Hand::Left => Hand::Right,
            Hand::Right => Hand::Left,
        }
    }

    /// The limb this hand corresponds to
    pub fn limb(&self) -> Limb {
        match self {
            Hand::Left => Limb::LeftHand,
            Hand::Right => Limb::RightHand,
        }
    }
}

/// A limb that can strike an instrument
///
/// A silent slot is `None` in an `Option<Limb>`, so every `Limb` value is a real stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Limb {
    LeftHand,
    RightHand,
    LeftFoot,
    RightFoot,
}

impl Limb {
    pub const ALL: [Limb; 4] = [Limb::LeftHand, Limb::RightHand, Limb::LeftFoot, Limb::RightFoot];

    pub fn is_hand(&self) -> bool {
        self.hand().is_some()
    }

    pub fn is_foot(&self) -> bool {
        !self.is_hand()
    }

    /// The hand behind this limb, if it is one
    pub fn hand(&self) -> Option<Hand> {
        match self {
            Limb::LeftHand => Some(Hand::Left),
            Limb::RightHand => Some(Hand::Right),
            Limb::LeftFoot | Limb::RightFoot => None,
        }
    }

    /// Default tablature letter for this limb
    pub fn letter(&self) -> char {
        match self {
            Limb::LeftHand => 'L',
            Limb::RightHand => 'R',
            Limb::LeftFoot => 'l',
            Limb::RightFoot => 'r',
        }
    }
}
