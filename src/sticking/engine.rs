// Sticking Engine - Assigns a limb to every event of an expanded groove
// Single left-to-right pass; hand history is the only state and lives per call

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use super::explain::{StickingDecision, FIXED_FOOT, RESOLVED_CONFLICT};
use super::rules::{HandState, RuleSet, SlotContext};
use crate::groove::{BeatMap, FlatGrids, GrooveType};
use crate::kit::{Hand, Instrument, KitError, KitLayout, Limb};

/// Errors that can occur during sticking assignment
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StickingError {
    #[error("Unplayable chord at bar {bar} slot {slot}: {} cannot be split between two hands", .instruments.join(" + "))]
    UnplayableChord {
        bar: usize,
        slot: usize,
        instruments: Vec<String>,
    },

    #[error("Shape mismatch in {instrument}: expected {expected} slots, found {found}")]
    ShapeMismatch {
        instrument: String,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    Kit(#[from] KitError),

    #[error("Unknown rudiment '{0}'")]
    UnknownRudiment(String),
}

pub type StickingResult<T> = Result<T, StickingError>;

/// Limb per slot for every instrument (`None` = silent)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedGrid {
    pub beat_map: BeatMap,
    pub bars: usize,
    pub tracks: BTreeMap<Instrument, Vec<Option<Limb>>>,

    /// Every event in slot order, with the rule that placed it
    pub decisions: Vec<StickingDecision>,
}

impl AssignedGrid {
    pub fn total_slots(&self) -> usize {
        self.bars * self.beat_map.slots_per_bar
    }

    /// Limb playing an instrument at a slot, if any
    pub fn limb_at(&self, instrument: Instrument, slot: usize) -> Option<Limb> {
        self.tracks
            .get(&instrument)
            .and_then(|slots| slots.get(slot).copied().flatten())
    }

    /// Every limb striking something at a slot, in kit order
    pub fn limbs_in_slot(&self, slot: usize) -> Vec<(Instrument, Limb)> {
        self.tracks
            .iter()
            .filter_map(|(instrument, slots)| {
                slots.get(slot).copied().flatten().map(|limb| (*instrument, limb))
            })
            .collect()
    }

    /// Decisions made for hand events only
    pub fn hand_decisions(&self) -> impl Iterator<Item = &StickingDecision> {
        self.decisions.iter().filter(|decision| decision.is_hand())
    }
}

/// One hand event while its slot is being resolved
#[derive(Debug, Clone, Copy)]
struct HandPick {
    instrument: Instrument,
    hand: Hand,
    precedence: usize,
    rule: &'static str,
}

/// Assign limbs with one groove type for the whole song
pub fn assign(
    grids: &FlatGrids,
    layout: &KitLayout,
    rules: &RuleSet,
    groove_type: GrooveType,
) -> StickingResult<AssignedGrid> {
    assign_sections(grids, layout, rules, &vec![groove_type; grids.bars])
}

/// Assign limbs with a groove type per bar
pub fn assign_sections(
    grids: &FlatGrids,
    layout: &KitLayout,
    rules: &RuleSet,
    groove_types: &[GrooveType],
) -> StickingResult<AssignedGrid> {
    let total = grids.total_slots();
    for (instrument, slots) in &grids.tracks {
        if slots.len() != total {
            return Err(StickingError::ShapeMismatch {
                instrument: instrument.to_string().to_string(),
                expected: total,
                found: slots.len(),
            });
        }
    }
    if groove_types.len() != grids.bars {
        return Err(StickingError::ShapeMismatch {
            instrument: "groove_types".to_string(),
            expected: grids.bars,
            found: groove_types.len(),
        });
    }

    let played: Vec<&Instrument> = grids
        .tracks
        .iter()
        .filter(|(_, slots)| slots.iter().any(|&active| active))
        .map(|(instrument, _)| instrument)
        .collect();
    layout.ensure_reachable(played)?;

    let beat_map = &grids.beat_map;
    let handedness = rules.handedness();
    let mut state = HandState::default();
    let mut tracks: BTreeMap<Instrument, Vec<Option<Limb>>> = grids
        .tracks
        .keys()
        .map(|instrument| (*instrument, vec![None; total]))
        .collect();
    let mut decisions = Vec::new();

    for slot in 0..total {
        let active: Vec<Instrument> = grids
            .tracks
            .iter()
            .filter(|(_, slots)| slots[slot])
            .map(|(instrument, _)| *instrument)
            .collect();
        if active.is_empty() {
            continue;
        }

        let bar = slot / beat_map.slots_per_bar;
        let slot_in_bar = slot % beat_map.slots_per_bar;
        let position = beat_map.position(slot);
        let (feet, hands): (Vec<Instrument>, Vec<Instrument>) =
            active.into_iter().partition(|instrument| instrument.is_foot());

        for instrument in feet {
            let limb = layout.foot_for(instrument).ok_or_else(|| {
                KitError::InvalidKitLayout(format!("{} is not pinned to a foot", instrument.label()))
            })?;
            place(&mut tracks, instrument, slot, limb);
            decisions.push(StickingDecision {
                slot,
                position,
                instrument,
                limb,
                rule: FIXED_FOOT.to_string(),
            });
        }

        if hands.is_empty() {
            continue;
        }
        let unplayable = || StickingError::UnplayableChord {
            bar,
            slot: slot_in_bar,
            instruments: hands.iter().map(|i| i.label().to_string()).collect(),
        };
        if hands.len() > 2 {
            return Err(unplayable());
        }

        let mut picks: Vec<HandPick> = hands
            .iter()
            .map(|&instrument| {
                let ctx = SlotContext {
                    slot,
                    slot_in_bar,
                    instrument,
                    simultaneous: &hands,
                    groove_type: groove_types[bar],
                    beat_map,
                    handedness,
                    state: &state,
                };
                let decision = rules.decide(&ctx);
                let hand = if layout.hand_reaches(decision.hand, instrument) {
                    decision.hand
                } else {
                    decision.hand.opposite()
                };
                HandPick {
                    instrument,
                    hand,
                    precedence: decision.precedence,
                    rule: decision.rule,
                }
            })
            .collect();

        if let [first, second] = picks.as_mut_slice() {
            if first.hand == second.hand {
                // On a tie the timekeeper holds its hand
                let first_yields = second.precedence < first.precedence
                    || (second.precedence == first.precedence
                        && second.instrument.is_timekeeper()
                        && !first.instrument.is_timekeeper());
                let loser = if first_yields { first } else { second };
                loser.hand = loser.hand.opposite();
                loser.rule = RESOLVED_CONFLICT;
                if !layout.hand_reaches(loser.hand, loser.instrument) {
                    return Err(unplayable());
                }
            }
        }

        for pick in &picks {
            let limb = pick.hand.limb();
            log::debug!(
                "{} at {} -> {} ({})",
                pick.instrument.label(),
                position.describe(),
                limb.letter(),
                pick.rule
            );
            place(&mut tracks, pick.instrument, slot, limb);
            decisions.push(StickingDecision {
                slot,
                position,
                instrument: pick.instrument,
                limb,
                rule: pick.rule.to_string(),
            });
        }

        let played: Vec<(Instrument, Hand)> =
            picks.iter().map(|pick| (pick.instrument, pick.hand)).collect();
        state.record(slot, &played);
    }

    Ok(AssignedGrid {
        beat_map: beat_map.clone(),
        bars: grids.bars,
        tracks,
        decisions,
    })
}

fn place(
    tracks: &mut BTreeMap<Instrument, Vec<Option<Limb>>>,
    instrument: Instrument,
    slot: usize,
    limb: Limb,
) {
    if let Some(cell) = tracks.get_mut(&instrument).and_then(|slots| slots.get_mut(slot)) {
        *cell = Some(limb);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kit::KitLayout;
    use crate::sticking::rudiments::Rudiment;
    use crate::sticking::rules::Handedness;
    use std::collections::{BTreeSet, HashSet};

    fn beat_map(slots_per_bar: usize, slots_per_beat: usize, backbeats: &[usize]) -> BeatMap {
        BeatMap {
            slots_per_bar,
            slots_per_beat,
            backbeats: backbeats.iter().copied().collect::<BTreeSet<_>>(),
        }
    }

    fn slots(steps: &[u8]) -> Vec<bool> {
        steps.iter().map(|&s| s == 1).collect()
    }

    /// Sixteenth-note 4/4 grid with snare backbeats on 2 and 4
    fn four_four(bars: usize) -> FlatGrids {
        FlatGrids::new(beat_map(16, 4, &[4, 12]), bars)
    }

    fn letters(grid: &AssignedGrid, instrument: Instrument) -> String {
        grid.tracks[&instrument]
            .iter()
            .map(|limb| limb.map(|l| l.letter()).unwrap_or('.'))
            .collect()
    }

    #[test]
    fn test_alternation_law() {
        // 6/8: three slots per dotted-quarter pulse
        let grids = FlatGrids::new(beat_map(6, 3, &[3]), 1)
            .with_track(Instrument::HiHat, slots(&[1, 0, 1, 0, 1, 0]));
        let grid = assign(&grids, &KitLayout::default(), &RuleSet::default(), GrooveType::HiHatLed).unwrap();
        assert_eq!(letters(&grid, Instrument::HiHat), "R.L.R.");

        let lefty = RuleSet::conventional(Handedness {
            dominant: Hand::Left,
            backbeat: Hand::Right,
        });
        let grid = assign(&grids, &KitLayout::default(), &lefty, GrooveType::HiHatLed).unwrap();
        assert_eq!(letters(&grid, Instrument::HiHat), "L.R.L.");
    }

    #[test]
    fn test_quarter_notes_stay_on_dominant_hand() {
        let grids = four_four(1).with_track(
            Instrument::Ride,
            slots(&[1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0]),
        );
        let grid = assign(&grids, &KitLayout::default(), &RuleSet::default(), GrooveType::HiHatLed).unwrap();
        assert_eq!(letters(&grid, Instrument::Ride), "R...R...R...R...");
    }

    #[test]
    fn test_backbeat_invariant_and_crossed_hands() {
        let grids = four_four(2)
            .with_track(Instrument::HiHat, slots(&[1, 0, 1, 0].repeat(8)))
            .with_track(Instrument::Snare, slots(&[0, 0, 0, 0, 1, 0, 0, 0].repeat(4)))
            .with_track(Instrument::Kick, slots(&[1, 0, 0, 0, 0, 0, 0, 0].repeat(4)));
        let grid = assign(&grids, &KitLayout::default(), &RuleSet::default(), GrooveType::HiHatLed).unwrap();

        for slot in [4, 12, 20, 28] {
            assert_eq!(grid.limb_at(Instrument::Snare, slot), Some(Limb::LeftHand));
            assert_eq!(grid.limb_at(Instrument::HiHat, slot), Some(Limb::RightHand));
        }
        let snare_rules: Vec<&str> = grid
            .decisions
            .iter()
            .filter(|d| d.instrument == Instrument::Snare)
            .map(|d| d.rule.as_str())
            .collect();
        assert!(snare_rules.iter().all(|&rule| rule == "backbeat_snare"));
        let hihat_on_backbeat = grid
            .decisions
            .iter()
            .find(|d| d.instrument == Instrument::HiHat && d.slot == 4)
            .unwrap();
        assert_eq!(hihat_on_backbeat.rule, "crossed_hands");
    }

    #[test]
    fn test_foot_invariant() {
        let grids = four_four(1)
            .with_track(Instrument::Kick, slots(&[1, 0, 0, 1].repeat(4)))
            .with_track(Instrument::HiHatFoot, slots(&[0, 0, 1, 0].repeat(4)))
            .with_track(Instrument::HiHat, slots(&[1, 1, 1, 1].repeat(4)));
        let grid = assign(&grids, &KitLayout::default(), &RuleSet::default(), GrooveType::HiHatLed).unwrap();

        for slot in 0..grid.total_slots() {
            if let Some(limb) = grid.limb_at(Instrument::Kick, slot) {
                assert_eq!(limb, Limb::RightFoot);
            }
            if let Some(limb) = grid.limb_at(Instrument::HiHatFoot, slot) {
                assert_eq!(limb, Limb::LeftFoot);
            }
        }
        assert!(grid
            .decisions
            .iter()
            .filter(|d| d.limb.is_foot())
            .all(|d| d.rule == FIXED_FOOT));
    }

    #[test]
    fn test_no_double_booking() {
        let grids = four_four(2)
            .with_track(Instrument::HiHat, slots(&[1, 1, 1, 1].repeat(8)))
            .with_track(Instrument::Snare, slots(&[0, 1, 0, 0, 1, 0, 0, 1].repeat(4)))
            .with_track(Instrument::CrashLeft, slots(&[0, 0, 0, 0].repeat(8)))
            .with_track(Instrument::Kick, slots(&[1, 0, 0, 1].repeat(8)));
        let grid = assign(&grids, &KitLayout::default(), &RuleSet::default(), GrooveType::HiHatLed).unwrap();

        for slot in 0..grid.total_slots() {
            let limbs = grid.limbs_in_slot(slot);
            let unique: HashSet<Limb> = limbs.iter().map(|(_, limb)| *limb).collect();
            assert_eq!(unique.len(), limbs.len(), "slot {} double-booked", slot);
        }
    }

    #[test]
    fn test_conflict_flips_lower_precedence() {
        // Off-beat snare under alternating hi-hat: crossed hands decides both,
        // then a rudiment on the snare disagrees with the hi-hat
        let grids = four_four(1)
            .with_track(Instrument::HiHat, slots(&[1, 0, 0, 0].repeat(4)))
            .with_track(Instrument::Snare, slots(&[1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]));
        let rules = RuleSet::default()
            .with_rudiments(BTreeMap::from([(Instrument::Snare, Rudiment::DoubleStrokeRoll)]));
        let grid = assign(&grids, &KitLayout::default(), &rules, GrooveType::HiHatLed).unwrap();

        // Rudiment puts the snare on R; the hi-hat (crossed hands, also R) flips
        assert_eq!(grid.limb_at(Instrument::Snare, 0), Some(Limb::RightHand));
        assert_eq!(grid.limb_at(Instrument::HiHat, 0), Some(Limb::LeftHand));
        let hihat = grid.decisions.iter().find(|d| d.instrument == Instrument::HiHat).unwrap();
        assert_eq!(hihat.rule, RESOLVED_CONFLICT);
    }

    #[test]
    fn test_tied_conflict_keeps_timekeeper_hand() {
        // Quarter-note hi-hat in sixteenth triplets with a left crash on the downbeat
        let grids = FlatGrids::new(beat_map(12, 3, &[3, 9]), 1)
            .with_track(Instrument::HiHat, slots(&[1, 0, 0].repeat(4)))
            .with_track(Instrument::CrashLeft, slots(&[1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]));
        let grid = assign(&grids, &KitLayout::default(), &RuleSet::default(), GrooveType::HiHatLed).unwrap();

        assert_eq!(letters(&grid, Instrument::HiHat), "R..R..R..R..");
        assert_eq!(grid.limb_at(Instrument::CrashLeft, 0), Some(Limb::LeftHand));
        let crash = grid
            .decisions
            .iter()
            .find(|d| d.instrument == Instrument::CrashLeft)
            .unwrap();
        assert_eq!(crash.rule, RESOLVED_CONFLICT);

        // Two non-timekeepers tie: the later one in kit order moves
        let grids = FlatGrids::new(beat_map(12, 3, &[3, 9]), 1)
            .with_track(Instrument::Splash, slots(&[1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]))
            .with_track(Instrument::Snare, slots(&[1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]));
        let grid = assign(&grids, &KitLayout::default(), &RuleSet::default(), GrooveType::HiHatLed).unwrap();
        assert_eq!(grid.limb_at(Instrument::Splash, 0), Some(Limb::RightHand));
        assert_eq!(grid.limb_at(Instrument::Snare, 0), Some(Limb::LeftHand));
    }

    #[test]
    fn test_kit_error_survives_clone() {
        let err = StickingError::from(KitError::InvalidKitLayout("no hands".to_string()));
        assert_eq!(err.clone(), err);
        assert_eq!(err.to_string(), "Invalid kit layout: no hands");
    }

    #[test]
    fn test_open_hands_on_ride() {
        let grids = four_four(1)
            .with_track(Instrument::Ride, slots(&[1, 0, 1, 0].repeat(4)))
            .with_track(Instrument::Snare, slots(&[0, 0, 1, 0, 1, 0, 0, 0, 0, 0, 1, 0, 1, 0, 0, 0]))
            .with_track(Instrument::CrashRight, slots(&[1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]));
        let grid = assign(&grids, &KitLayout::default(), &RuleSet::default(), GrooveType::RideLed).unwrap();

        assert_eq!(letters(&grid, Instrument::Ride), "R.R.R.R.R.R.R.R.");
        assert_eq!(grid.limb_at(Instrument::CrashRight, 0), Some(Limb::LeftHand));
        assert_eq!(grid.limb_at(Instrument::Snare, 2), Some(Limb::LeftHand));
        assert_eq!(grid.limb_at(Instrument::Snare, 4), Some(Limb::LeftHand));
    }

    #[test]
    fn test_tom_fill_alternates() {
        let grids = four_four(1)
            .with_track(Instrument::Tom1, slots(&[1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]))
            .with_track(Instrument::Tom2, slots(&[0, 0, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]))
            .with_track(Instrument::FloorTom1, slots(&[0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 0, 0, 0, 0, 0, 0]));
        let grid = assign(&grids, &KitLayout::default(), &RuleSet::default(), GrooveType::HiHatLed).unwrap();

        assert_eq!(letters(&grid, Instrument::Tom1), "RL..............");
        assert_eq!(letters(&grid, Instrument::Tom2), "..RL............");
        // After a gap the tom change restarts on the dominant hand
        assert_eq!(letters(&grid, Instrument::FloorTom1), "........RL......");
    }

    #[test]
    fn test_unplayable_chord() {
        let grids = four_four(1)
            .with_track(Instrument::Snare, slots(&[0, 0, 1, 0].repeat(4)))
            .with_track(Instrument::CrashLeft, slots(&[0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]))
            .with_track(Instrument::Tom1, slots(&[0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]));
        let err = assign(&grids, &KitLayout::default(), &RuleSet::default(), GrooveType::HiHatLed).unwrap_err();

        assert_eq!(
            err,
            StickingError::UnplayableChord {
                bar: 0,
                slot: 2,
                instruments: vec!["CrashL".to_string(), "Tom1".to_string(), "Snare".to_string()],
            }
        );
    }

    #[test]
    fn test_one_handed_reach_flips_and_fails() {
        // Only the right hand reaches the ride
        let mut reach = BTreeMap::new();
        reach.insert(Limb::RightHand, BTreeSet::from([Instrument::Ride, Instrument::Snare]));
        reach.insert(Limb::LeftHand, BTreeSet::from([Instrument::Snare]));
        reach.insert(Limb::RightFoot, BTreeSet::from([Instrument::Kick]));
        reach.insert(Limb::LeftFoot, BTreeSet::from([Instrument::HiHatFoot]));
        let layout = KitLayout::new(reach).unwrap();

        let grids = FlatGrids::new(beat_map(6, 3, &[3]), 1)
            .with_track(Instrument::Ride, slots(&[1, 1, 1, 0, 0, 0]));
        let grid = assign(&grids, &layout, &RuleSet::default(), GrooveType::HiHatLed).unwrap();
        assert_eq!(letters(&grid, Instrument::Ride), "RRR...");

        // Ride and snare together with a rudiment forcing the snare onto the right
        let grids = grids.with_track(Instrument::Snare, slots(&[1, 0, 0, 0, 0, 0]));
        let rules = RuleSet::default()
            .with_rudiments(BTreeMap::from([(Instrument::Snare, Rudiment::SingleStroke)]));
        let err = assign(&grids, &layout, &rules, GrooveType::HiHatLed).unwrap_err();
        assert!(matches!(err, StickingError::UnplayableChord { bar: 0, slot: 0, .. }));
    }

    #[test]
    fn test_unreachable_instrument() {
        let mut reach = BTreeMap::new();
        reach.insert(Limb::RightHand, BTreeSet::from([Instrument::Snare]));
        reach.insert(Limb::LeftHand, BTreeSet::from([Instrument::Snare]));
        reach.insert(Limb::RightFoot, BTreeSet::from([Instrument::Kick]));
        reach.insert(Limb::LeftFoot, BTreeSet::from([Instrument::HiHatFoot]));
        let layout = KitLayout::new(reach).unwrap();

        let grids = four_four(1).with_track(Instrument::Splash, slots(&[1, 0, 0, 0].repeat(4)));
        let err = assign(&grids, &layout, &RuleSet::default(), GrooveType::HiHatLed).unwrap_err();
        assert!(matches!(err, StickingError::Kit(KitError::InvalidKitLayout(_))));
    }

    #[test]
    fn test_shape_mismatch() {
        let grids = four_four(1).with_track(Instrument::HiHat, slots(&[1, 0, 1]));
        let err = assign(&grids, &KitLayout::default(), &RuleSet::default(), GrooveType::HiHatLed).unwrap_err();
        assert_eq!(
            err,
            StickingError::ShapeMismatch {
                instrument: "hihat".to_string(),
                expected: 16,
                found: 3,
            }
        );
    }

    #[test]
    fn test_idempotent() {
        let grids = four_four(2)
            .with_track(Instrument::HiHat, slots(&[1, 0, 1, 1].repeat(8)))
            .with_track(Instrument::Snare, slots(&[0, 1, 0, 0, 1, 0, 0, 1].repeat(4)))
            .with_track(Instrument::Kick, slots(&[1, 0, 0, 0].repeat(8)));
        let rules = RuleSet::default();
        let first = assign(&grids, &KitLayout::default(), &rules, GrooveType::HiHatLed).unwrap();
        let second = assign(&grids, &KitLayout::default(), &rules, GrooveType::HiHatLed).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_groove_type_per_bar() {
        let grids = four_four(2)
            .with_track(Instrument::Ride, slots(&[1, 0, 1, 0].repeat(8)));
        let types = [GrooveType::HiHatLed, GrooveType::RideLed];
        let grid = assign_sections(&grids, &KitLayout::default(), &RuleSet::default(), &types).unwrap();

        assert_eq!(
            letters(&grid, Instrument::Ride),
            "R.L.R.L.R.L.R.L.R.R.R.R.R.R.R.R."
        );

        let err = assign_sections(&grids, &KitLayout::default(), &RuleSet::default(), &types[..1]).unwrap_err();
        assert!(matches!(err, StickingError::ShapeMismatch { .. }));
    }
}
