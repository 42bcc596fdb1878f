//! Hand observations: from LeapMotion hardware, keyboard simulation, or a
//! fixed script.
//!
//! The session pulls one frame per cycle through [`PoseSource::detect`] and
//! doesn't care where it came from.

use std::collections::VecDeque;
use std::sync::mpsc::{Receiver, TryRecvError};

use finger_state::{FingerSet, Hand};

// ════════════════════════════════════════════════════════════════════════════
// HandObservation
// ════════════════════════════════════════════════════════════════════════════

/// Where the detector saw the hand, as fractions of the camera frame:
/// `(0, 0)` is the top-left corner, `(1, 1)` the bottom-right.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl BoundingBox {
    /// Clamp to the unit frame so the overlay can scale it directly.
    pub fn clamped(self) -> Self {
        let x = self.x.clamp(0.0, 1.0);
        let y = self.y.clamp(0.0, 1.0);
        BoundingBox {
            x, y,
            w: self.w.clamp(0.0, 1.0 - x),
            h: self.h.clamp(0.0, 1.0 - y),
        }
    }
}

/// One detected hand in one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandObservation {
    pub hand:   Hand,
    pub raised: FingerSet,
    pub bbox:   Option<BoundingBox>,
}

impl HandObservation {
    pub fn new(hand: Hand, raised: FingerSet) -> Self {
        HandObservation { hand, raised, bbox: None }
    }

    pub fn with_bbox(self, bbox: BoundingBox) -> Self {
        HandObservation { bbox: Some(bbox.clamped()), ..self }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PoseSource trait: unified interface for hw, sim and scripts
// ════════════════════════════════════════════════════════════════════════════

pub trait PoseSource {
    /// Hands seen in the next frame.  `None` when no frame could be acquired;
    /// the caller skips that cycle.
    fn detect(&mut self) -> Option<Vec<HandObservation>>;
}

// ════════════════════════════════════════════════════════════════════════════
// SimPoseSource: keyboard simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Key state sampled by the overlay window once per frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeySnapshot {
    /// Number keys `1`–`5`, thumb first.
    pub left:          FingerSet,
    /// Number keys `6`–`0`, thumb first.
    pub right:         FingerSet,
    /// Left Shift: the left hand is in view with every finger down.
    pub left_present:  bool,
    /// Right Shift: same for the right hand.
    pub right_present: bool,
}

impl KeySnapshot {
    /// Hands the snapshot shows.  A hand is in view when its presence key or
    /// any of its finger keys is held.
    pub fn observations(&self) -> Vec<HandObservation> {
        let mut hands = Vec::with_capacity(2);
        if self.left_present || self.left.any_raised() {
            hands.push(HandObservation::new(Hand::Left, self.left));
        }
        if self.right_present || self.right.any_raised() {
            hands.push(HandObservation::new(Hand::Right, self.right));
        }
        hands
    }
}

/// Raw input event from the simulation window.
#[derive(Clone, Copy, Debug)]
pub enum SimInput {
    Keys(KeySnapshot),
}

/// Pose source driven by [`SimInput`] events from the overlay window.
///
/// The window sends a snapshot every frame; this keeps only the newest.  A
/// cycle with no fresh snapshot counts as a missed frame.
///
/// Letting go of a hand's last key would make the hand vanish in the same
/// frame its fingers go down, so a hand that was in view last snapshot and
/// is gone now is reported once more with every finger lowered.
pub struct SimPoseSource {
    rx:           Receiver<SimInput>,
    was_present:  [bool; 2],
}

impl SimPoseSource {
    pub fn new(rx: Receiver<SimInput>) -> Self {
        SimPoseSource { rx, was_present: [false, false] }
    }
}

impl PoseSource for SimPoseSource {
    fn detect(&mut self) -> Option<Vec<HandObservation>> {
        let mut latest = None;
        loop {
            match self.rx.try_recv() {
                Ok(SimInput::Keys(keys)) => latest = Some(keys),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }

        let mut hands = latest?.observations();
        let mut present = [false, false];
        for h in &hands {
            present[h.hand.index()] = true;
        }
        for hand in Hand::ALL {
            if self.was_present[hand.index()] && !present[hand.index()] {
                hands.push(HandObservation::new(hand, FingerSet::LOWERED));
            }
        }
        self.was_present = present;
        Some(hands)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ScriptedPoseSource: fixed frame list (tests, demos)
// ════════════════════════════════════════════════════════════════════════════

/// Replays a list of frames; `None` entries stand for dropped frames.
/// Once the script runs out every call reports a dropped frame.
pub struct ScriptedPoseSource {
    frames: VecDeque<Option<Vec<HandObservation>>>,
}

impl ScriptedPoseSource {
    pub fn new(frames: impl IntoIterator<Item = Option<Vec<HandObservation>>>) -> Self {
        ScriptedPoseSource { frames: frames.into_iter().collect() }
    }

    pub fn remaining(&self) -> usize { self.frames.len() }
}

impl PoseSource for ScriptedPoseSource {
    fn detect(&mut self) -> Option<Vec<HandObservation>> {
        self.frames.pop_front().flatten()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapPoseSource: real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Pose source backed by a real LeapMotion controller.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
/// A finger counts as raised when its tip is far enough from its metacarpal
/// base (see [`finger_extension`]).
#[cfg(feature = "leap")]
pub struct LeapPoseSource {
    connection: leaprs::Connection,
}

/// Extension ratio above which a finger is raised.
#[cfg(feature = "leap")]
const RAISED_EXTENSION: f32 = 0.7;

#[cfg(feature = "leap")]
impl LeapPoseSource {
    pub fn open() -> Result<Self, String> {
        use leaprs::*;
        let mut connection = Connection::create(ConnectionConfig::default())
            .map_err(|e| format!("failed to create LeapC connection: {:?}", e))?;
        connection.open()
            .map_err(|e| format!("failed to open LeapMotion device: {:?}", e))?;
        Ok(LeapPoseSource { connection })
    }
}

#[cfg(feature = "leap")]
impl PoseSource for LeapPoseSource {
    fn detect(&mut self) -> Option<Vec<HandObservation>> {
        use leaprs::*;

        let msg = self.connection.poll(100).ok()?;
        let Event::Tracking(frame) = msg.event() else { return None };

        let observations = frame.hands()
            .map(|h| {
                let hand = if h.hand_type() == HandType::Left { Hand::Left } else { Hand::Right };
                let mut raised = FingerSet::LOWERED;
                for (finger, digit) in finger_state::Finger::ALL.iter().zip(h.digits()) {
                    raised.set(*finger, finger_extension(&digit) > RAISED_EXTENSION);
                }
                let palm = h.palm().position();
                HandObservation::new(hand, raised).with_bbox(palm_bbox(palm.x, palm.y))
            })
            .collect();
        Some(observations)
    }
}

/// Square around the palm, mapped from the tracking volume (x ±200 mm,
/// height 100–500 mm) into frame fractions.
#[cfg(feature = "leap")]
fn palm_bbox(x_mm: f32, y_mm: f32) -> BoundingBox {
    const SIDE: f32 = 0.2;
    let cx = (x_mm + 200.0) / 400.0;
    let cy = 1.0 - (y_mm - 100.0) / 400.0;
    BoundingBox { x: cx - SIDE / 2.0, y: cy - SIDE / 2.0, w: SIDE, h: SIDE }
}

#[cfg(feature = "leap")]
fn finger_extension(digit: &leaprs::Digit) -> f32 {
    // Ratio of (tip – metacarpal base) distance to full finger length.
    // 1.0 = fully extended, ~0.0 = fully curled.
    let base = digit.metacarpal().prev_joint();
    let tip  = digit.distal().next_joint();
    let dx   = tip.x - base.x;
    let dy   = tip.y - base.y;
    let dz   = tip.z - base.z;
    let dist = (dx*dx + dy*dy + dz*dz).sqrt();
    // Normalise to ~0–1 using typical finger length ≈ 80 mm
    (dist / 80.0).clamp(0.0, 1.0)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
