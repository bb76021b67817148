// Kit Layout - Which limb can reach which instrument
// Feet are pinned to one pedal each; hands share the cymbals and drums

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use super::instrument::{Hand, Instrument, Limb};

/// Errors raised while validating a kit layout
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KitError {
    #[error("Invalid kit layout: {0}")]
    InvalidKitLayout(String),
}

pub type KitResult<T> = Result<T, KitError>;

/// Mapping from limb to the instruments that limb may strike
///
/// Built through [`KitLayout::new`] (or deserialization, which goes through the
/// same checks), so a value of this type always satisfies the layout invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<Limb, Vec<Instrument>>",
    into = "BTreeMap<Limb, Vec<Instrument>>"
)]
pub struct KitLayout {
    reach: BTreeMap<Limb, BTreeSet<Instrument>>,
}

impl KitLayout {
    /// Create a validated layout from a limb → instruments mapping
    pub fn new(reach: BTreeMap<Limb, BTreeSet<Instrument>>) -> KitResult<Self> {
        let layout = KitLayout { reach };
        layout.validate()?;
        Ok(layout)
    }

    /// Conventional "1 up, 1 down" kit for a right-footed drummer:
    /// right foot on the kick, left foot on the hi-hat pedal, both hands reach
    /// every cymbal and drum
    pub fn conventional() -> Self {
        let hand_set: BTreeSet<Instrument> = Instrument::ALL
            .iter()
            .copied()
            .filter(Instrument::is_hand)
            .collect();

        let mut reach = BTreeMap::new();
        reach.insert(Limb::LeftHand, hand_set.clone());
        reach.insert(Limb::RightHand, hand_set);
        reach.insert(Limb::RightFoot, BTreeSet::from([Instrument::Kick]));
        reach.insert(Limb::LeftFoot, BTreeSet::from([Instrument::HiHatFoot]));

        KitLayout { reach }
    }

    /// Check the layout invariants
    /// - every limb is present and reaches at least one instrument
    /// - each foot reaches exactly one pedal instrument, and no two feet share it
    /// - hands only reach hand instruments
    pub fn validate(&self) -> KitResult<()> {
        for limb in Limb::ALL {
            let instruments = match self.reach.get(&limb) {
                Some(set) if !set.is_empty() => set,
                _ => {
                    return Err(KitError::InvalidKitLayout(format!(
                        "{:?} is mapped to no instruments",
                        limb
                    )))
                }
            };

            if limb.is_foot() {
                if instruments.len() != 1 {
                    return Err(KitError::InvalidKitLayout(format!(
                        "{:?} must be pinned to exactly one instrument, found {}",
                        limb,
                        instruments.len()
                    )));
                }
                if let Some(hand_piece) = instruments.iter().find(|i| i.is_hand()) {
                    return Err(KitError::InvalidKitLayout(format!(
                        "{:?} cannot play {}",
                        limb,
                        hand_piece.label()
                    )));
                }
            } else if let Some(pedal) = instruments.iter().find(|i| i.is_foot()) {
                return Err(KitError::InvalidKitLayout(format!(
                    "{:?} cannot play {}",
                    limb,
                    pedal.label()
                )));
            }
        }

        let left = self.reach.get(&Limb::LeftFoot);
        let right = self.reach.get(&Limb::RightFoot);
        if left.is_some() && left == right {
            return Err(KitError::InvalidKitLayout(
                "both feet are pinned to the same instrument".to_string(),
            ));
        }

        Ok(())
    }

    /// Fail if any of the given instruments cannot be struck by any limb
    pub fn ensure_reachable<'a>(
        &self,
        instruments: impl IntoIterator<Item = &'a Instrument>,
    ) -> KitResult<()> {
        for instrument in instruments {
            if self.limbs_for(*instrument).is_empty() {
                return Err(KitError::InvalidKitLayout(format!(
                    "{} is mapped to no limbs",
                    instrument.label()
                )));
            }
        }
        Ok(())
    }

    /// Whether a limb may strike an instrument
    pub fn can_reach(&self, limb: Limb, instrument: Instrument) -> bool {
        self.reach
            .get(&limb)
            .map(|set| set.contains(&instrument))
            .unwrap_or(false)
    }

    /// Whether a hand may strike an instrument
    pub fn hand_reaches(&self, hand: Hand, instrument: Instrument) -> bool {
        self.can_reach(hand.limb(), instrument)
    }

    /// Every limb that may strike an instrument
    pub fn limbs_for(&self, instrument: Instrument) -> Vec<Limb> {
        self.reach
            .iter()
            .filter(|(_, set)| set.contains(&instrument))
            .map(|(limb, _)| *limb)
            .collect()
    }

    /// The foot pinned to a pedal instrument
    pub fn foot_for(&self, instrument: Instrument) -> Option<Limb> {
        self.limbs_for(instrument)
            .into_iter()
            .find(|limb| limb.is_foot())
    }

    /// All instruments reachable by any limb, in row order
    pub fn instruments(&self) -> BTreeSet<Instrument> {
        self.reach.values().flatten().copied().collect()
    }
}

impl Default for KitLayout {
    fn default() -> Self {
        KitLayout::conventional()
    }
}

impl TryFrom<BTreeMap<Limb, Vec<Instrument>>> for KitLayout {
    type Error = KitError;

    fn try_from(raw: BTreeMap<Limb, Vec<Instrument>>) -> Result<Self, Self::Error> {
        let reach = raw
            .into_iter()
            .map(|(limb, instruments)| (limb, instruments.into_iter().collect()))
            .collect();
        KitLayout::new(reach)
    }
}

impl From<KitLayout> for BTreeMap<Limb, Vec<Instrument>> {
    fn from(layout: KitLayout) -> Self {
        layout
            .reach
            .into_iter()
            .map(|(limb, set)| (limb, set.into_iter().collect()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conventional_map() -> BTreeMap<Limb, BTreeSet<Instrument>> {
        KitLayout::conventional().reach
    }

    #[test]
    fn test_conventional_layout_is_valid() {
        let layout = KitLayout::conventional();
        assert!(layout.validate().is_ok());

        assert_eq!(layout.foot_for(Instrument::Kick), Some(Limb::RightFoot));
        assert_eq!(layout.foot_for(Instrument::HiHatFoot), Some(Limb::LeftFoot));
        assert!(layout.hand_reaches(Hand::Left, Instrument::Snare));
        assert!(layout.hand_reaches(Hand::Right, Instrument::Ride));
        assert!(!layout.can_reach(Limb::RightHand, Instrument::Kick));
    }

    #[test]
    fn test_limb_without_instruments_is_rejected() {
        let mut reach = conventional_map();
        reach.insert(Limb::LeftHand, BTreeSet::new());

        let result = KitLayout::new(reach);
        assert!(matches!(result, Err(KitError::InvalidKitLayout(_))));
    }

    #[test]
    fn test_foot_with_two_pedals_is_rejected() {
        let mut reach = conventional_map();
        reach.insert(
            Limb::RightFoot,
            BTreeSet::from([Instrument::Kick, Instrument::HiHatFoot]),
        );

        assert!(KitLayout::new(reach).is_err());
    }

    #[test]
    fn test_hand_on_pedal_is_rejected() {
        let mut reach = conventional_map();
        reach
            .get_mut(&Limb::LeftHand)
            .unwrap()
            .insert(Instrument::Kick);

        assert!(KitLayout::new(reach).is_err());
    }

    #[test]
    fn test_unreachable_instrument() {
        let mut reach = conventional_map();
        for hand in [Limb::LeftHand, Limb::RightHand] {
            reach.get_mut(&hand).unwrap().remove(&Instrument::Splash);
        }
        let layout = KitLayout::new(reach).unwrap();

        assert!(layout.ensure_reachable(&[Instrument::Snare]).is_ok());
        let err = layout.ensure_reachable(&[Instrument::Splash]).unwrap_err();
        assert_eq!(
            err,
            KitError::InvalidKitLayout("Splash is mapped to no limbs".to_string())
        );
    }

    #[test]
    fn test_layout_deserializes_through_validation() {
        let json = r#"{
            "left_hand": ["hihat", "snare"],
            "right_hand": ["hihat", "ride", "snare"],
            "left_foot": ["hihat_foot"],
            "right_foot": ["kick"]
        }"#;
        let layout: KitLayout = serde_json::from_str(json).unwrap();
        assert!(!layout.hand_reaches(Hand::Left, Instrument::Ride));

        let bad = r#"{
            "left_hand": ["hihat"],
            "right_hand": ["kick"],
            "left_foot": ["hihat_foot"],
            "right_foot": ["kick"]
        }"#;
        assert!(serde_json::from_str::<KitLayout>(bad).is_err());
    }
}
