//! # finger_state
//!
//! Raised/lowered finger tracking for two independently observed hands.
//!
//! Each hand side keeps the [`FingerSet`] it was last seen with.  Feeding a new
//! observation into the [`HandTracker`] compares it slot by slot with the
//! stored one and yields a [`FingerEdge`] for every finger that changed:
//!
//! * **Rising**: lowered → raised
//! * **Falling**: raised → lowered
//!
//! ```rust
//! use finger_state::{HandTracker, Hand, Finger, FingerSet, EdgeKind};
//!
//! let mut tracker = HandTracker::new();
//! let edges = tracker.observe(Hand::Left, FingerSet::from_bits(0b00001));
//! assert_eq!(edges.len(), 1);
//! assert_eq!(edges[0].finger, Finger::Thumb);
//! assert_eq!(edges[0].kind, EdgeKind::Rising);
//!
//! // Same vector again: nothing changed, no edges.
//! assert!(tracker.observe(Hand::Left, FingerSet::from_bits(0b00001)).is_empty());
//! ```

use std::fmt;

// ════════════════════════════════════════════════════════════════════════════
// Hand
// ════════════════════════════════════════════════════════════════════════════

/// Which hand an observation belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub const ALL: [Hand; 2] = [Hand::Left, Hand::Right];

    /// Slot index (left = 0, right = 1).
    pub fn index(self) -> usize {
        match self {
            Hand::Left  => 0,
            Hand::Right => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Hand::Left  => "left",
            Hand::Right => "right",
        }
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Finger
// ════════════════════════════════════════════════════════════════════════════

/// The five fingers, in detector order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb, Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky,
    ];

    pub fn index(self) -> usize {
        match self {
            Finger::Thumb  => 0,
            Finger::Index  => 1,
            Finger::Middle => 2,
            Finger::Ring   => 3,
            Finger::Pinky  => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Finger::Thumb  => "thumb",
            Finger::Index  => "index",
            Finger::Middle => "middle",
            Finger::Ring   => "ring",
            Finger::Pinky  => "pinky",
        }
    }
}

impl fmt::Display for Finger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FingerSet: 5 raised/lowered slots for one hand
// ════════════════════════════════════════════════════════════════════════════

/// Raised (`true`) / lowered (`false`) state of thumb..pinky on one hand.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FingerSet([bool; 5]);

impl FingerSet {
    /// All fingers lowered.
    pub const LOWERED: FingerSet = FingerSet([false; 5]);

    pub fn new(raised: [bool; 5]) -> Self { FingerSet(raised) }

    /// Build from a bitmask where bit 0 is the thumb and bit 4 the pinky.
    pub fn from_bits(bits: u8) -> Self {
        let mut raised = [false; 5];
        for (i, slot) in raised.iter_mut().enumerate() {
            *slot = bits & (1 << i) != 0;
        }
        FingerSet(raised)
    }

    /// Inverse of [`FingerSet::from_bits`].
    pub fn bits(&self) -> u8 {
        self.0.iter().enumerate()
            .fold(0u8, |acc, (i, &up)| if up { acc | (1 << i) } else { acc })
    }

    pub fn is_raised(&self, finger: Finger) -> bool { self.0[finger.index()] }

    pub fn set(&mut self, finger: Finger, raised: bool) {
        self.0[finger.index()] = raised;
    }

    pub fn any_raised(&self) -> bool { self.0.iter().any(|&up| up) }
}

impl From<[bool; 5]> for FingerSet {
    fn from(raised: [bool; 5]) -> Self { FingerSet(raised) }
}

impl fmt::Display for FingerSet {
    /// `01100` style, thumb first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &up in &self.0 {
            f.write_str(if up { "1" } else { "0" })?;
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Edges
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeKind {
    /// lowered → raised
    Rising,
    /// raised → lowered
    Falling,
}

/// One finger transition between two consecutive observations of a hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FingerEdge {
    pub hand:   Hand,
    pub finger: Finger,
    pub kind:   EdgeKind,
}

impl fmt::Display for FingerEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arrow = match self.kind {
            EdgeKind::Rising  => "up",
            EdgeKind::Falling => "down",
        };
        write!(f, "{} {} {}", self.hand, self.finger, arrow)
    }
}

/// Compare two vectors for one hand and list the transitions, thumb first.
pub fn edges_between(hand: Hand, prev: FingerSet, curr: FingerSet) -> Vec<FingerEdge> {
    Finger::ALL.iter()
        .filter_map(|&finger| {
            let kind = match (prev.is_raised(finger), curr.is_raised(finger)) {
                (false, true) => EdgeKind::Rising,
                (true, false) => EdgeKind::Falling,
                _             => return None,
            };
            Some(FingerEdge { hand, finger, kind })
        })
        .collect()
}

// ════════════════════════════════════════════════════════════════════════════
// AbsentHandPolicy
// ════════════════════════════════════════════════════════════════════════════

/// What a frame with no hands at all does to the stored state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AbsentHandPolicy {
    /// Keep the last vectors; edges resume when a hand reappears.
    #[default]
    Hold,
    /// Force a falling edge on every raised finger and reset both hands.
    ReleaseAll,
}

// ════════════════════════════════════════════════════════════════════════════
// HandTracker
// ════════════════════════════════════════════════════════════════════════════

/// Previous-frame finger state for both hands.
///
/// Owned by a session and passed in explicitly; there is no global state, so
/// any number of trackers can run side by side.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HandTracker {
    prev: [FingerSet; 2],
}

impl HandTracker {
    /// Both hands start with every finger lowered.
    pub fn new() -> Self { Self::default() }

    /// Stored vector for one hand.
    pub fn state(&self, hand: Hand) -> FingerSet { self.prev[hand.index()] }

    /// Feed one observation for `hand`, returning its edges and storing
    /// `raised` as the new previous vector.
    pub fn observe(&mut self, hand: Hand, raised: FingerSet) -> Vec<FingerEdge> {
        let slot  = &mut self.prev[hand.index()];
        let edges = edges_between(hand, *slot, raised);
        *slot = raised;
        edges
    }

    /// Falling edges for every raised finger on both hands, then reset.
    pub fn release_all(&mut self) -> Vec<FingerEdge> {
        let mut edges = Vec::new();
        for hand in Hand::ALL {
            edges.extend(self.observe(hand, FingerSet::LOWERED));
        }
        edges
    }

    /// Process one detector frame.
    ///
    /// `hands` is every `(side, raised)` pair the detector reported.  If a
    /// side appears more than once the last report wins.  Sides missing from
    /// the frame keep their state; a frame with no hands at all is handled by
    /// `policy`.
    pub fn process_frame(
        &mut self,
        hands:  &[(Hand, FingerSet)],
        policy: AbsentHandPolicy,
    ) -> Vec<FingerEdge> {
        if hands.is_empty() {
            return match policy {
                AbsentHandPolicy::Hold       => Vec::new(),
                AbsentHandPolicy::ReleaseAll => self.release_all(),
            };
        }

        let mut latest: [Option<FingerSet>; 2] = [None, None];
        for &(hand, raised) in hands {
            latest[hand.index()] = Some(raised);
        }

        let mut edges = Vec::new();
        for hand in Hand::ALL {
            if let Some(raised) = latest[hand.index()] {
                edges.extend(self.observe(hand, raised));
            }
        }
        edges
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn rising(hand: Hand, finger: Finger) -> FingerEdge {
        FingerEdge { hand, finger, kind: EdgeKind::Rising }
    }

    fn falling(hand: Hand, finger: Finger) -> FingerEdge {
        FingerEdge { hand, finger, kind: EdgeKind::Falling }
    }

    #[test]
    fn bits_round_trip_thumb_is_bit_zero() {
        let fs = FingerSet::from_bits(0b10001);
        assert!(fs.is_raised(Finger::Thumb));
        assert!(fs.is_raised(Finger::Pinky));
        assert!(!fs.is_raised(Finger::Middle));
        assert_eq!(fs.bits(), 0b10001);
        assert_eq!(fs.to_string(), "10001");
    }

    #[test]
    fn every_pair_of_vectors_yields_exact_transitions() {
        // Exhaustive over all 32×32 vector pairs.
        for p in 0u8..32 {
            for c in 0u8..32 {
                let edges = edges_between(
                    Hand::Right, FingerSet::from_bits(p), FingerSet::from_bits(c),
                );
                for finger in Finger::ALL {
                    let bit = 1 << finger.index();
                    let expected = match (p & bit != 0, c & bit != 0) {
                        (false, true) => Some(EdgeKind::Rising),
                        (true, false) => Some(EdgeKind::Falling),
                        _             => None,
                    };
                    let found: Vec<_> = edges.iter()
                        .filter(|e| e.finger == finger)
                        .map(|e| e.kind)
                        .collect();
                    assert_eq!(found, expected.into_iter().collect::<Vec<_>>());
                }
            }
        }
    }

    #[test]
    fn same_vector_twice_only_edges_once() {
        let mut t = HandTracker::new();
        let v = FingerSet::from_bits(0b01110);
        assert_eq!(t.observe(Hand::Left, v).len(), 3);
        assert!(t.observe(Hand::Left, v).is_empty());
    }

    #[test]
    fn hands_are_tracked_independently() {
        let mut t = HandTracker::new();
        t.observe(Hand::Left, FingerSet::from_bits(0b00001));
        let edges = t.observe(Hand::Right, FingerSet::from_bits(0b00001));
        assert_eq!(edges, vec![rising(Hand::Right, Finger::Thumb)]);
        assert_eq!(t.state(Hand::Left), FingerSet::from_bits(0b00001));
    }

    #[test]
    fn hold_policy_freezes_on_empty_frame() {
        let mut t = HandTracker::new();
        t.process_frame(&[(Hand::Left, FingerSet::from_bits(0b00011))], AbsentHandPolicy::Hold);
        assert!(t.process_frame(&[], AbsentHandPolicy::Hold).is_empty());
        assert_eq!(t.state(Hand::Left), FingerSet::from_bits(0b00011));

        // Reappearing with the same vector: still nothing.
        let edges = t.process_frame(
            &[(Hand::Left, FingerSet::from_bits(0b00011))], AbsentHandPolicy::Hold,
        );
        assert!(edges.is_empty());
    }

    #[test]
    fn release_all_policy_drops_only_raised_fingers() {
        let mut t = HandTracker::new();
        t.process_frame(
            &[
                (Hand::Left,  FingerSet::from_bits(0b00101)),
                (Hand::Right, FingerSet::from_bits(0b10000)),
            ],
            AbsentHandPolicy::ReleaseAll,
        );
        let edges = t.process_frame(&[], AbsentHandPolicy::ReleaseAll);
        assert_eq!(edges, vec![
            falling(Hand::Left,  Finger::Thumb),
            falling(Hand::Left,  Finger::Middle),
            falling(Hand::Right, Finger::Pinky),
        ]);
        assert_eq!(t, HandTracker::new());

        // A second empty frame has nothing left to release.
        assert!(t.process_frame(&[], AbsentHandPolicy::ReleaseAll).is_empty());
    }

    #[test]
    fn release_all_policy_keeps_missing_side_when_other_hand_present() {
        let mut t = HandTracker::new();
        t.process_frame(&[(Hand::Left, FingerSet::from_bits(0b00001))], AbsentHandPolicy::ReleaseAll);
        let edges = t.process_frame(
            &[(Hand::Right, FingerSet::LOWERED)], AbsentHandPolicy::ReleaseAll,
        );
        assert!(edges.is_empty());
        assert!(t.state(Hand::Left).is_raised(Finger::Thumb));
    }

    #[test]
    fn duplicate_side_in_frame_last_wins() {
        let mut t = HandTracker::new();
        let edges = t.process_frame(
            &[
                (Hand::Right, FingerSet::from_bits(0b00001)),
                (Hand::Right, FingerSet::from_bits(0b00010)),
            ],
            AbsentHandPolicy::Hold,
        );
        assert_eq!(edges, vec![rising(Hand::Right, Finger::Index)]);
    }

    #[test]
    fn edge_display_is_readable() {
        assert_eq!(rising(Hand::Left, Finger::Ring).to_string(), "left ring up");
        assert_eq!(falling(Hand::Right, Finger::Thumb).to_string(), "right thumb down");
    }
}
