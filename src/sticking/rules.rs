// Sticking Rules - Drumming-technique predicates evaluated in precedence order
// Each rule looks at one event in its slot context and either picks a hand or abstains

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::engine::StickingError;
use super::rudiments::{get_rudiment, Rudiment};
use crate::groove::{BeatMap, GrooveType};
use crate::kit::{Hand, Instrument};

/// Which hand leads, and which hand owns the backbeat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handedness {
    /// Hand used by default and on single-hand cymbal time
    pub dominant: Hand,

    /// Hand that always plays the backbeat snare
    pub backbeat: Hand,
}

impl Default for Handedness {
    fn default() -> Self {
        Handedness {
            dominant: Hand::Right,
            backbeat: Hand::Left,
        }
    }
}

/// A tom hit remembered for fill alternation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TomHit {
    pub instrument: Instrument,
    pub hand: Hand,
    pub slot: usize,
}

/// Hand history carried from slot to slot during one assignment pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandState {
    /// Hand and slot of the previous lead hand event
    pub last_hand: Option<(Hand, usize)>,

    /// Most recent tom hit
    pub last_tom: Option<TomHit>,

    /// Events played so far, per instrument
    pub played: BTreeMap<Instrument, usize>,
}

impl HandState {
    /// Fold one slot's hand assignments into the history
    ///
    /// The lead event is the time-keeping cymbal when one played, otherwise the
    /// first event in kit order.
    pub fn record(&mut self, slot: usize, hands: &[(Instrument, Hand)]) {
        let lead = hands
            .iter()
            .find(|(instrument, _)| instrument.is_timekeeper())
            .or_else(|| hands.first());
        if let Some(&(_, hand)) = lead {
            self.last_hand = Some((hand, slot));
        }

        for &(instrument, hand) in hands {
            if instrument.is_tom() {
                self.last_tom = Some(TomHit {
                    instrument,
                    hand,
                    slot,
                });
            }
            *self.played.entry(instrument).or_insert(0) += 1;
        }
    }
}

/// Everything a rule may look at when deciding one event
#[derive(Debug, Clone, Copy)]
pub struct SlotContext<'a> {
    /// Flat slot index in the song
    pub slot: usize,

    /// Slot index within the bar
    pub slot_in_bar: usize,

    /// Instrument being decided
    pub instrument: Instrument,

    /// All hand instruments active in this slot (including `instrument`)
    pub simultaneous: &'a [Instrument],

    pub groove_type: GrooveType,
    pub beat_map: &'a BeatMap,
    pub handedness: Handedness,
    pub state: &'a HandState,
}

impl SlotContext<'_> {
    /// Whether another instrument fires in the same slot
    pub fn with(&self, other: Instrument) -> bool {
        other != self.instrument && self.simultaneous.contains(&other)
    }

    pub fn is_backbeat(&self) -> bool {
        self.beat_map.is_backbeat(self.slot_in_bar)
    }

    /// How many earlier events this instrument has played
    pub fn event_index(&self) -> usize {
        self.state.played.get(&self.instrument).copied().unwrap_or(0)
    }
}

/// A composable sticking predicate
///
/// Rules own no state; everything they need arrives through the context.
pub trait StickingRule: fmt::Debug + Send + Sync {
    /// Stable name, reported in decision records
    fn name(&self) -> &'static str;

    /// Pick a hand for the event, or `None` to defer to lower-precedence rules
    fn decide(&self, ctx: &SlotContext<'_>) -> Option<Hand>;
}

/// Backbeat snare is always the backbeat hand, never alternated
#[derive(Debug, Clone, Copy, Default)]
pub struct BackbeatSnare;

impl StickingRule for BackbeatSnare {
    fn name(&self) -> &'static str {
        "backbeat_snare"
    }

    fn decide(&self, ctx: &SlotContext<'_>) -> Option<Hand> {
        (ctx.instrument == Instrument::Snare && ctx.is_backbeat())
            .then_some(ctx.handedness.backbeat)
    }
}

/// Instruments bound to a rudiment follow its sticking note by note
#[derive(Debug, Clone, Default)]
pub struct RudimentSticking {
    bindings: BTreeMap<Instrument, Rudiment>,
}

impl RudimentSticking {
    pub fn new(bindings: BTreeMap<Instrument, Rudiment>) -> Self {
        RudimentSticking { bindings }
    }
}

impl StickingRule for RudimentSticking {
    fn name(&self) -> &'static str {
        "rudiment"
    }

    fn decide(&self, ctx: &SlotContext<'_>) -> Option<Hand> {
        self.bindings
            .get(&ctx.instrument)
            .map(|rudiment| rudiment.hand_at(ctx.event_index(), ctx.handedness.dominant))
    }
}

/// Hi-hat grooves: both hands may share the hi-hat, but when the snare fires
/// with it the backbeat hand takes the snare and the other hand the hi-hat
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossedHands;

impl StickingRule for CrossedHands {
    fn name(&self) -> &'static str {
        "crossed_hands"
    }

    fn decide(&self, ctx: &SlotContext<'_>) -> Option<Hand> {
        if ctx.groove_type != GrooveType::HiHatLed {
            return None;
        }
        let backbeat = ctx.handedness.backbeat;
        match ctx.instrument {
            Instrument::HiHat if ctx.with(Instrument::Snare) => Some(backbeat.opposite()),
            Instrument::Snare if ctx.with(Instrument::HiHat) => Some(backbeat),
            _ => None,
        }
    }
}

/// Ride grooves: only the dominant hand plays the ride; the other hand covers
/// snare and cymbal accents that land with it
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenHands;

impl StickingRule for OpenHands {
    fn name(&self) -> &'static str {
        "open_hands"
    }

    fn decide(&self, ctx: &SlotContext<'_>) -> Option<Hand> {
        if ctx.groove_type != GrooveType::RideLed {
            return None;
        }
        let dominant = ctx.handedness.dominant;
        match ctx.instrument {
            Instrument::Ride => Some(dominant),
            Instrument::Snare | Instrument::HiHat if ctx.with(Instrument::Ride) => {
                Some(dominant.opposite())
            }
            other if other.is_accent_cymbal() && ctx.with(Instrument::Ride) => {
                Some(dominant.opposite())
            }
            _ => None,
        }
    }
}

/// Tom fills: consecutive tom hits alternate hands, and a tom change that does
/// not follow straight on from another tom starts on the dominant hand
#[derive(Debug, Clone, Copy, Default)]
pub struct TomFill;

impl StickingRule for TomFill {
    fn name(&self) -> &'static str {
        "tom_fill"
    }

    fn decide(&self, ctx: &SlotContext<'_>) -> Option<Hand> {
        if !ctx.instrument.is_tom() {
            return None;
        }
        match ctx.state.last_tom {
            Some(prev) if prev.slot + 1 == ctx.slot => Some(prev.hand.opposite()),
            Some(prev) if prev.instrument == ctx.instrument => None,
            _ => Some(ctx.handedness.dominant),
        }
    }
}

/// Subdivided playing alternates from the previous hand event
///
/// "Subdivided" means the previous hand event lies less than a beat back.
/// Applies to the time-keeping cymbals and the snare.
#[derive(Debug, Clone, Copy, Default)]
pub struct Alternation;

impl StickingRule for Alternation {
    fn name(&self) -> &'static str {
        "alternation"
    }

    fn decide(&self, ctx: &SlotContext<'_>) -> Option<Hand> {
        let alternates = ctx.instrument.is_timekeeper() || ctx.instrument == Instrument::Snare;
        if !alternates {
            return None;
        }
        match ctx.state.last_hand {
            Some((hand, slot)) if ctx.slot.saturating_sub(slot) < ctx.beat_map.slots_per_beat => {
                Some(hand.opposite())
            }
            _ => None,
        }
    }
}

/// Fallback: the dominant hand
#[derive(Debug, Clone, Copy, Default)]
pub struct DominantHand;

impl StickingRule for DominantHand {
    fn name(&self) -> &'static str {
        "dominant_hand"
    }

    fn decide(&self, ctx: &SlotContext<'_>) -> Option<Hand> {
        Some(ctx.handedness.dominant)
    }
}

/// The hand a rule set picked for one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleDecision {
    pub hand: Hand,

    /// Index of the deciding rule; lower wins conflicts
    pub precedence: usize,

    pub rule: &'static str,
}

/// User-facing rule configuration, as found in groove files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    #[serde(default = "default_dominant")]
    pub dominant_hand: Hand,

    #[serde(default = "default_backbeat")]
    pub backbeat_hand: Hand,

    /// Rudiment name bound to an instrument
    #[serde(default)]
    pub rudiments: BTreeMap<Instrument, String>,
}

fn default_dominant() -> Hand {
    Handedness::default().dominant
}

fn default_backbeat() -> Hand {
    Handedness::default().backbeat
}

impl RuleConfig {
    pub fn handedness(&self) -> Handedness {
        Handedness {
            dominant: self.dominant_hand,
            backbeat: self.backbeat_hand,
        }
    }
}

impl Default for RuleConfig {
    fn default() -> Self {
        RuleConfig {
            dominant_hand: default_dominant(),
            backbeat_hand: default_backbeat(),
            rudiments: BTreeMap::new(),
        }
    }
}

/// Ordered list of sticking rules plus the player's handedness
///
/// Rules earlier in the list take precedence: backbeat snare, rudiments,
/// crossed/open hands, tom fills, plain alternation, dominant hand.
#[derive(Debug)]
pub struct RuleSet {
    handedness: Handedness,
    rules: Vec<Box<dyn StickingRule>>,
}

impl RuleSet {
    /// Conventional drum-set rules
    pub fn conventional(handedness: Handedness) -> Self {
        RuleSet {
            handedness,
            rules: vec![
                Box::new(BackbeatSnare),
                Box::new(CrossedHands),
                Box::new(OpenHands),
                Box::new(TomFill),
                Box::new(Alternation),
                Box::new(DominantHand),
            ],
        }
    }

    /// Bind rudiments to instruments, just below the backbeat rule
    pub fn with_rudiments(mut self, bindings: BTreeMap<Instrument, Rudiment>) -> Self {
        if !bindings.is_empty() {
            let at = self.rules.len().min(1);
            self.rules
                .insert(at, Box::new(RudimentSticking::new(bindings)));
        }
        self
    }

    /// Build from file configuration
    pub fn from_config(config: &RuleConfig) -> Result<Self, StickingError> {
        let handedness = config.handedness();

        let mut bindings = BTreeMap::new();
        for (instrument, name) in &config.rudiments {
            let rudiment =
                get_rudiment(name).ok_or_else(|| StickingError::UnknownRudiment(name.clone()))?;
            bindings.insert(*instrument, rudiment);
        }

        Ok(RuleSet::conventional(handedness).with_rudiments(bindings))
    }

    /// Insert a rule at a precedence slot (0 = highest)
    pub fn insert_rule(&mut self, precedence: usize, rule: Box<dyn StickingRule>) {
        let at = precedence.min(self.rules.len());
        self.rules.insert(at, rule);
    }

    pub fn handedness(&self) -> Handedness {
        self.handedness
    }

    /// Rule names in precedence order
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Ask each rule in turn; the first that answers decides
    pub fn decide(&self, ctx: &SlotContext<'_>) -> RuleDecision {
        self.rules
            .iter()
            .enumerate()
            .find_map(|(precedence, rule)| {
                rule.decide(ctx).map(|hand| RuleDecision {
                    hand,
                    precedence,
                    rule: rule.name(),
                })
            })
            .unwrap_or(RuleDecision {
                hand: self.handedness.dominant,
                precedence: self.rules.len(),
                rule: DominantHand.name(),
            })
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        RuleSet::conventional(Handedness::default())
    }
}
