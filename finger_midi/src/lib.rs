//! # finger_midi
//!
//! Musical vocabulary for finger-driven playing:
//!
//! * [`Payload`]: what a finger sounds: one note, a chord, or a drum hit.
//! * [`MappingTable`]: `(hand, finger) → payload`, chosen from a small
//!   catalog ([`TableKind`]).
//! * [`SongSequence`]: a fixed list of `(hand, finger)` steps played one per
//!   hand-presence frame.
//! * General MIDI program helpers for the instrument pickers.
//!
//! ## Quick start
//!
//! ```rust
//! use finger_midi::{MappingTable, TableKind, Payload};
//! use finger_state::{Hand, Finger};
//!
//! let table = MappingTable::for_kind(TableKind::FreeChord);
//! let payload = table.payload(Hand::Left, Finger::Thumb).unwrap();
//! assert_eq!(payload.pitches(), &[60, 64]);
//! ```

use std::fmt;

use finger_state::{Finger, Hand};

// ════════════════════════════════════════════════════════════════════════════
// General MIDI programs offered by the instrument pickers
// ════════════════════════════════════════════════════════════════════════════

pub const ACOUSTIC_GRAND_PIANO:  u8 = 0;
pub const ACOUSTIC_GUITAR_NYLON: u8 = 24;
/// Percussive program used by the drum kit.
pub const SYNTH_DRUM:            u8 = 118;

/// Velocity used for every note-on and note-off.
pub const FULL_VELOCITY: u8 = 127;

/// Programs listed by the instrument pickers, in program order.
pub const INSTRUMENT_CHOICES: &[(u8, &str)] = &[
    (0,  "Acoustic Grand Piano"),
    (1,  "Bright Acoustic Piano"),
    (2,  "Electric Grand Piano"),
    (3,  "Honky-tonk Piano"),
    (4,  "Electric Piano 1"),
    (5,  "Electric Piano 2"),
    (8,  "Celesta"),
    (9,  "Glockenspiel"),
    (10, "Music Box"),
    (11, "Vibraphone"),
    (12, "Marimba"),
    (16, "Hammond Organ"),
    (17, "Percussive Organ"),
    (24, "Acoustic Guitar (nylon)"),
    (25, "Acoustic Guitar (steel)"),
    (26, "Electric Guitar (jazz)"),
    (27, "Electric Guitar (clean)"),
    (32, "Acoustic Bass"),
    (33, "Electric Bass (finger)"),
    (34, "Electric Bass (pick)"),
    (38, "Synth Bass"),
    (40, "Violin"),
    (41, "Viola"),
    (42, "Cello"),
    (48, "String Ensemble 1"),
    (49, "String Ensemble 2"),
    (56, "Trumpet"),
    (57, "Trombone"),
    (64, "Saxophone"),
    (71, "Clarinet"),
    (80, "Synth Lead"),
    (88, "Synth Pad"),
    (118, "Synth Drum"),
];

/// Display name for a program, or a generic label for unlisted ones.
pub fn instrument_name(program: u8) -> &'static str {
    INSTRUMENT_CHOICES.iter()
        .find(|(p, _)| *p == program)
        .map(|(_, name)| *name)
        .unwrap_or("General MIDI Instrument")
}

/// `"24: Acoustic Guitar (nylon)"` style picker entry.
pub fn instrument_label(program: u8) -> String {
    format!("{}: {}", program, instrument_name(program))
}

/// Parse picker text into a program number.
///
/// Accepts a bare number (`"40"`) or a picker entry (`"40: Violin"`).  Anything
/// malformed or outside 0–127 falls back to program 0.
pub fn parse_program_text(text: &str) -> u8 {
    text.split(':')
        .next()
        .and_then(|head| head.trim().parse::<u8>().ok())
        .filter(|p| *p <= 127)
        .unwrap_or(ACOUSTIC_GRAND_PIANO)
}

/// The program each hand plays, fixed for a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InstrumentSelection {
    pub left:  u8,
    pub right: u8,
}

impl InstrumentSelection {
    pub fn new(left: u8, right: u8) -> Self {
        InstrumentSelection { left: left.min(127), right: right.min(127) }
    }

    /// Parse two picker entries; malformed text selects program 0.
    pub fn from_text(left: &str, right: &str) -> Self {
        InstrumentSelection::new(parse_program_text(left), parse_program_text(right))
    }

    pub fn for_hand(&self, hand: Hand) -> u8 {
        match hand {
            Hand::Left  => self.left,
            Hand::Right => self.right,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Payload
// ════════════════════════════════════════════════════════════════════════════

/// The musical content attached to a finger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    /// A single held note.
    SingleNote(u8),
    /// Several notes sounded together and released together.
    Chord(Vec<u8>),
    /// A percussive hit; released after a short fixed time, never held.
    DrumHit(u8),
}

impl Payload {
    /// Every pitch this payload sounds.
    pub fn pitches(&self) -> &[u8] {
        match self {
            Payload::SingleNote(p) | Payload::DrumHit(p) => std::slice::from_ref(p),
            Payload::Chord(ps) => ps,
        }
    }

    pub fn is_percussive(&self) -> bool { matches!(self, Payload::DrumHit(_)) }

    /// Overlay label: the sargam name of the lowest listed pitch.
    /// Drum hits have no label.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Payload::DrumHit(_) => None,
            _ => self.pitches().first().map(|&p| sargam_label(p)),
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::SingleNote(p) => write!(f, "note {}", p),
            Payload::Chord(ps)     => write!(f, "chord {:?}", ps),
            Payload::DrumHit(p)    => write!(f, "drum {}", p),
        }
    }
}

/// Sargam syllable for a pitch in the C4 octave (plus the upper Sa).
pub fn sargam_label(pitch: u8) -> &'static str {
    match pitch {
        60 | 72 => "Sa",
        62      => "Re",
        64      => "Ga",
        65      => "Ma",
        67      => "Pa",
        69      => "Dha",
        71      => "Ni",
        _       => "-",
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MappingTable
// ════════════════════════════════════════════════════════════════════════════

/// The closed catalog of finger tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableKind {
    /// Left-hand dyads, right-hand triads, each finger its own chord.
    FreeChord,
    /// The five lowest diatonic triads of D major on both hands.
    ScaleChord,
    /// Kick, snare, closed hat, open hat, crash on both hands.
    DrumKit,
}

impl TableKind {
    pub const ALL: [TableKind; 3] = [TableKind::FreeChord, TableKind::ScaleChord, TableKind::DrumKit];

    pub fn name(self) -> &'static str {
        match self {
            TableKind::FreeChord  => "Free chords",
            TableKind::ScaleChord => "D major chords",
            TableKind::DrumKit    => "Drum kit",
        }
    }

    /// Default `(left, right)` programs for a fresh session.
    pub fn default_instruments(self) -> (u8, u8) {
        match self {
            TableKind::FreeChord  => (ACOUSTIC_GRAND_PIANO, ACOUSTIC_GUITAR_NYLON),
            TableKind::ScaleChord => (ACOUSTIC_GRAND_PIANO, ACOUSTIC_GRAND_PIANO),
            TableKind::DrumKit    => (SYNTH_DRUM, SYNTH_DRUM),
        }
    }
}

const FREE_LEFT: [&[u8]; 5] = [
    &[60, 64], &[62, 67], &[64, 71], &[65, 69], &[67, 72],
];
const FREE_RIGHT: [&[u8]; 5] = [
    &[60, 64, 67], &[62, 66, 71], &[64, 69, 74], &[65, 70, 76], &[67, 72, 79],
];
const D_MAJOR_TRIADS: [&[u8]; 5] = [
    &[62, 66, 69], &[64, 67, 71], &[66, 69, 73], &[67, 71, 74], &[69, 73, 76],
];
const DRUMS: [u8; 5] = [36, 38, 42, 46, 49];

/// `(hand, finger) → payload` for one session.  Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MappingTable {
    slots: [[Option<Payload>; 5]; 2],
}

impl MappingTable {
    /// Build one of the catalog tables.
    pub fn for_kind(kind: TableKind) -> Self {
        let chords = |rows: [&[u8]; 5]| rows.map(|ps| Some(Payload::Chord(ps.to_vec())));
        let slots = match kind {
            TableKind::FreeChord  => [chords(FREE_LEFT), chords(FREE_RIGHT)],
            TableKind::ScaleChord => [chords(D_MAJOR_TRIADS), chords(D_MAJOR_TRIADS)],
            TableKind::DrumKit    => {
                let kit = DRUMS.map(|p| Some(Payload::DrumHit(p)));
                [kit.clone(), kit]
            }
        };
        MappingTable { slots }
    }

    /// Builder-style override of a single slot.
    pub fn with(mut self, hand: Hand, finger: Finger, payload: Option<Payload>) -> Self {
        self.slots[hand.index()][finger.index()] = payload;
        self
    }

    /// Payload for a finger; `None` when the slot is unmapped.
    pub fn payload(&self, hand: Hand, finger: Finger) -> Option<&Payload> {
        self.slots[hand.index()][finger.index()].as_ref()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SongSequence
// ════════════════════════════════════════════════════════════════════════════

/// C major triads used by every song, both hands alike.
const SONG_CHORDS: [&[u8]; 5] = [
    &[60, 64, 67], &[62, 65, 69], &[64, 67, 71], &[65, 69, 72], &[67, 71, 74],
];

/// A named, ordered list of finger steps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SongSequence {
    pub name:  String,
    pub steps: Vec<(Hand, Finger)>,
}

impl SongSequence {
    pub fn new(name: impl Into<String>, steps: Vec<(Hand, Finger)>) -> Self {
        SongSequence { name: name.into(), steps }
    }

    pub fn len(&self) -> usize { self.steps.len() }
    pub fn is_empty(&self) -> bool { self.steps.is_empty() }

    /// Step and chord at `index`, or `None` past the end.
    pub fn step(&self, index: usize) -> Option<((Hand, Finger), Payload)> {
        self.steps.get(index).map(|&(hand, finger)| {
            ((hand, finger), Payload::Chord(SONG_CHORDS[finger.index()].to_vec()))
        })
    }

    /// Look up a catalog song by name (case-insensitive).
    pub fn by_name(name: &str) -> Option<SongSequence> {
        song_catalog().into_iter().find(|s| s.name.eq_ignore_ascii_case(name.trim()))
    }
}

/// Every built-in song.
pub fn song_catalog() -> Vec<SongSequence> {
    use Finger::*;
    use Hand::*;
    vec![
        SongSequence::new("Happy Birthday", vec![
            (Left, Thumb), (Left, Index), (Right, Thumb),
            (Right, Index), (Left, Middle), (Right, Middle),
        ]),
        SongSequence::new("Twinkle Twinkle", vec![
            (Left, Thumb), (Left, Ring), (Right, Index), (Right, Pinky),
        ]),
    ]
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_chord_left_thumb_is_sa_ma_dyad() {
        let t = MappingTable::for_kind(TableKind::FreeChord);
        assert_eq!(t.payload(Hand::Left, Finger::Thumb), Some(&Payload::Chord(vec![60, 64])));
        assert_eq!(t.payload(Hand::Right, Finger::Pinky).unwrap().pitches(), &[67, 72, 79]);
    }

    #[test]
    fn scale_chords_match_on_both_hands() {
        let t = MappingTable::for_kind(TableKind::ScaleChord);
        for f in Finger::ALL {
            assert_eq!(t.payload(Hand::Left, f), t.payload(Hand::Right, f));
        }
        assert_eq!(t.payload(Hand::Left, Finger::Middle).unwrap().pitches(), &[66, 69, 73]);
    }

    #[test]
    fn drum_kit_is_percussive_and_unlabelled() {
        let t = MappingTable::for_kind(TableKind::DrumKit);
        let kick = t.payload(Hand::Right, Finger::Thumb).unwrap();
        assert!(kick.is_percussive());
        assert_eq!(kick.pitches(), &[36]);
        assert_eq!(kick.label(), None);
    }

    #[test]
    fn override_can_unmap_a_slot() {
        let t = MappingTable::for_kind(TableKind::FreeChord)
            .with(Hand::Left, Finger::Ring, None)
            .with(Hand::Right, Finger::Ring, Some(Payload::SingleNote(70)));
        assert!(t.payload(Hand::Left, Finger::Ring).is_none());
        assert_eq!(t.payload(Hand::Right, Finger::Ring).unwrap().pitches(), &[70]);
    }

    #[test]
    fn chord_label_uses_first_pitch() {
        assert_eq!(Payload::Chord(vec![62, 67]).label(), Some("Re"));
        assert_eq!(Payload::SingleNote(72).label(), Some("Sa"));
        assert_eq!(Payload::Chord(vec![66, 69, 73]).label(), Some("-"));
    }

    #[test]
    fn program_text_parsing() {
        assert_eq!(parse_program_text("24: Acoustic Guitar (nylon)"), 24);
        assert_eq!(parse_program_text(" 40 "), 40);
        assert_eq!(parse_program_text("Violin"), 0);
        assert_eq!(parse_program_text("200"), 0);
        assert_eq!(parse_program_text(""), 0);
        assert_eq!(instrument_label(56), "56: Trumpet");
    }

    #[test]
    fn instrument_selection_per_hand() {
        let sel = InstrumentSelection::from_text("40: Violin", "garbage");
        assert_eq!(sel.for_hand(Hand::Left), 40);
        assert_eq!(sel.for_hand(Hand::Right), 0);
        assert_eq!(InstrumentSelection::new(200, 5).left, 127);
    }

    #[test]
    fn song_steps_and_clamp() {
        let song = SongSequence::by_name("twinkle twinkle").unwrap();
        assert_eq!(song.len(), 4);
        let ((hand, finger), payload) = song.step(1).unwrap();
        assert_eq!((hand, finger), (Hand::Left, Finger::Ring));
        assert_eq!(payload.pitches(), &[65, 69, 72]);
        assert!(song.step(4).is_none());
        assert!(SongSequence::by_name("Nope").is_none());
    }
}
