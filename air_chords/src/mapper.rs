//! Finger edges → musical actions.
//!
//! [`EventMapper`] handles the finger tables: a rising edge sounds the
//! finger's payload, a falling edge arms its release.  Drum hits are
//! percussive: the rising edge strikes and schedules its own short release,
//! the falling edge is ignored.
//!
//! [`SongCursor`] handles song mode, where finger identity doesn't matter:
//! every frame with a hand in view plays the next step of the song.

use std::time::{Duration, Instant};

use finger_midi::{InstrumentSelection, MappingTable, SongSequence};
use finger_state::{EdgeKind, Finger, FingerEdge, Hand};

// ════════════════════════════════════════════════════════════════════════════
// Action
// ════════════════════════════════════════════════════════════════════════════

/// What the session should do with the sound backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Sound `pitches` now on `hand`'s channel with `program`.
    NoteOn {
        hand:    Hand,
        program: u8,
        pitches: Vec<u8>,
        label:   Option<String>,
    },
    /// Turn `pitches` off on `hand`'s channel after `delay`.
    ReleaseAfter {
        hand:    Hand,
        pitches: Vec<u8>,
        delay:   Duration,
    },
    /// Note-on now plus an unconditional release after `release_after`.
    Strike {
        hand:          Hand,
        program:       u8,
        pitches:       Vec<u8>,
        label:         Option<String>,
        release_after: Duration,
    },
}

// ════════════════════════════════════════════════════════════════════════════
// EventMapper: finger tables
// ════════════════════════════════════════════════════════════════════════════

pub struct EventMapper {
    table:       MappingTable,
    instruments: InstrumentSelection,
    sustain:     Duration,
    drum_hit:    Duration,
}

impl EventMapper {
    pub fn new(
        table:       MappingTable,
        instruments: InstrumentSelection,
        sustain:     Duration,
        drum_hit:    Duration,
    ) -> Self {
        EventMapper { table, instruments, sustain, drum_hit }
    }

    /// Zero or one action for an edge.  Unmapped fingers produce nothing.
    pub fn map_edge(&self, edge: FingerEdge) -> Option<Action> {
        let payload = self.table.payload(edge.hand, edge.finger)?;
        let program = self.instruments.for_hand(edge.hand);
        let pitches = payload.pitches().to_vec();

        match (payload.is_percussive(), edge.kind) {
            (true, EdgeKind::Rising) => Some(Action::Strike {
                hand: edge.hand,
                program,
                pitches,
                label: None,
                release_after: self.drum_hit,
            }),
            (true, EdgeKind::Falling) => None,
            (false, EdgeKind::Rising) => Some(Action::NoteOn {
                hand: edge.hand,
                program,
                pitches,
                label: payload.label().map(str::to_string),
            }),
            (false, EdgeKind::Falling) => Some(Action::ReleaseAfter {
                hand: edge.hand,
                pitches,
                delay: self.sustain,
            }),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SongCursor: song mode
// ════════════════════════════════════════════════════════════════════════════

pub struct SongCursor {
    song:          SongSequence,
    instruments:   InstrumentSelection,
    next:          usize,
    last_step_at:  Option<Instant>,
    /// Minimum time between two steps.
    step_interval: Duration,
    note_duration: Duration,
}

impl SongCursor {
    pub fn new(
        song:          SongSequence,
        instruments:   InstrumentSelection,
        step_interval: Duration,
        note_duration: Duration,
    ) -> Self {
        SongCursor {
            song, instruments,
            next: 0,
            last_step_at: None,
            step_interval, note_duration,
        }
    }

    /// Feed one frame.  Plays the current step when a hand is present, the
    /// song isn't over, and the previous step is at least `step_interval` old.
    pub fn on_frame(&mut self, hand_present: bool, now: Instant) -> Option<Action> {
        if !hand_present { return None; }
        if let Some(last) = self.last_step_at {
            if now.saturating_duration_since(last) < self.step_interval { return None; }
        }

        let ((hand, finger), payload) = self.song.step(self.next)?;
        self.next += 1;
        self.last_step_at = Some(now);
        log::debug!("song '{}' step {}/{}", self.song.name, self.next, self.song.len());

        Some(Action::Strike {
            hand,
            program: self.instruments.for_hand(hand),
            pitches: payload.pitches().to_vec(),
            label: Some(format!("Raise: {} on {}", finger, hand)),
            release_after: self.note_duration,
        })
    }

    /// Index of the step that plays next.
    pub fn position(&self) -> usize { self.next }

    pub fn is_finished(&self) -> bool { self.next >= self.song.len() }

    /// Step played most recently.
    pub fn last_step(&self) -> Option<(Hand, Finger)> {
        self.next.checked_sub(1).and_then(|i| self.song.steps.get(i).copied())
    }

    pub fn song(&self) -> &SongSequence { &self.song }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
