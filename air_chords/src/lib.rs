//! # air_chords
//!
//! Play chords, drum hits and songs by raising and lowering fingers.
//!
//! Each frame the pose source reports which fingers of each hand are raised.
//! [`finger_state::HandTracker`] turns consecutive frames into rising and
//! falling edges, [`mapper`] turns edges into notes, and the [`backend`]
//! thread sends them to a MIDI port.  Lowered fingers release their notes
//! after a sustain delay ([`sustain`]).
//!
//! ## Modes
//!
//! | Mode | Rising edge | Falling edge |
//! |---|---|---|
//! | Free chords | Dyad (left) or triad (right) | Release after sustain |
//! | Scale chords | D-major triad | Release after sustain |
//! | Drums | Drum hit, released after 100 ms | Ignored |
//! | Song | Any visible hand plays the next chord | Ignored |
//!
//! Left hand plays on MIDI channel 1, right hand on channel 2, so each hand
//! keeps its own instrument.
//!
//! ## Feature flags
//!
//! * (default): **Simulation mode**: the overlay window's keyboard stands in
//!   for a hand detector.
//! * `leap`: **Hardware mode**: polls a real LeapMotion controller via LeapC.
//!
//! ### Simulation keys
//!
//! | Key | Meaning |
//! |---|---|
//! | `1`–`5` | Left thumb, index, middle, ring, pinky raised |
//! | `6`–`0` | Right thumb, index, middle, ring, pinky raised |
//! | Left / Right `Shift` | Hand in view with all fingers down |
//! | `Q` / `Escape` | Quit |

pub mod backend;
pub mod sustain;
pub mod mapper;
pub mod pose;
pub mod overlay;
pub mod session;
