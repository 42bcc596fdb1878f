//! A playing session: tracker, mapper and backend wired together.
//!
//! `Session` owns the [`HandTracker`], the mapping engine (finger table or
//! song cursor) and the channels to the sound backend.  It processes one
//! detector frame at a time; [`run`] drives it from a pose source and the
//! overlay window.

use std::fmt;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use finger_midi::{
    InstrumentSelection, MappingTable, SongSequence, TableKind, ACOUSTIC_GRAND_PIANO,
    FULL_VELOCITY,
};
use finger_state::{AbsentHandPolicy, FingerSet, Hand, HandTracker};

use crate::backend::{channel_for, spawn_backend, BackendCommand, BackendError, CommandSender, SoundBackend};
use crate::mapper::{Action, EventMapper, SongCursor};
use crate::overlay::{Overlay, SessionView};
use crate::pose::{BoundingBox, HandObservation, PoseSource, SimPoseSource};
use crate::sustain::SustainScheduler;

// ════════════════════════════════════════════════════════════════════════════
// SessionError
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
pub enum SessionError {
    Backend(BackendError),
    Window(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Backend(e) => write!(f, "{}", e),
            SessionError::Window(e)  => write!(f, "overlay window: {}", e),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Backend(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BackendError> for SessionError {
    fn from(e: BackendError) -> Self { SessionError::Backend(e) }
}

// ════════════════════════════════════════════════════════════════════════════
// SessionConfig
// ════════════════════════════════════════════════════════════════════════════

/// Which mapping the session plays.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    Table(TableKind),
    Song(SongSequence),
}

impl Mode {
    pub fn name(&self) -> String {
        match self {
            Mode::Table(kind) => kind.name().to_string(),
            Mode::Song(song)  => format!("Song: {}", song.name),
        }
    }
}

/// Configuration for one session.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub mode:          Mode,
    pub instruments:   InstrumentSelection,
    /// Delay between a finger going down and its notes stopping.
    pub sustain:       Duration,
    /// Length of a drum hit.
    pub drum_hit:      Duration,
    /// Length of each song chord.
    pub song_note:     Duration,
    /// Minimum time between two song steps.
    pub song_step_interval: Duration,
    pub absent_policy: AbsentHandPolicy,
    /// How long the latest chord label stays on screen.
    pub label_display: Duration,
}

impl SessionConfig {
    /// Defaults for `mode`, including its default instruments.
    pub fn for_mode(mode: Mode) -> Self {
        let (left, right) = match &mode {
            Mode::Table(kind) => kind.default_instruments(),
            Mode::Song(_)     => (ACOUSTIC_GRAND_PIANO, ACOUSTIC_GRAND_PIANO),
        };
        SessionConfig {
            mode,
            instruments:        InstrumentSelection::new(left, right),
            sustain:            Duration::from_secs(2),
            drum_hit:           Duration::from_millis(100),
            song_note:          Duration::from_secs(1),
            song_step_interval: Duration::from_secs(1),
            absent_policy:      AbsentHandPolicy::Hold,
            label_display:      Duration::from_millis(3500),
        }
    }

    /// Finger-table session with explicit instruments.
    pub fn with_instruments(kind: TableKind, left: u8, right: u8) -> Self {
        SessionConfig {
            instruments: InstrumentSelection::new(left, right),
            ..SessionConfig::for_mode(Mode::Table(kind))
        }
    }

    /// Song session for a catalog song.
    pub fn with_song(name: &str) -> Option<Self> {
        SongSequence::by_name(name).map(|song| SessionConfig::for_mode(Mode::Song(song)))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig::for_mode(Mode::Table(TableKind::FreeChord))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Session
// ════════════════════════════════════════════════════════════════════════════

enum Engine {
    Table(EventMapper),
    Song(SongCursor),
}

pub struct Session {
    tracker:       HandTracker,
    engine:        Engine,
    policy:        AbsentHandPolicy,
    mode_name:     String,

    backend:       CommandSender,
    scheduler:     SustainScheduler,
    /// Program last sent on each hand's channel.
    programs:      [Option<u8>; 2],

    label:         Option<(String, Instant)>,
    label_display: Duration,
    present:       [bool; 2],
    bboxes:        [Option<BoundingBox>; 2],
    pub status:    String,
}

impl Session {
    /// Start a session: set each hand's instrument and get ready for frames.
    pub fn start(cfg: SessionConfig, backend: CommandSender) -> Result<Self, SessionError> {
        let mode_name = cfg.mode.name();
        let engine = match cfg.mode {
            Mode::Table(kind) => Engine::Table(EventMapper::new(
                MappingTable::for_kind(kind),
                cfg.instruments,
                cfg.sustain,
                cfg.drum_hit,
            )),
            Mode::Song(song) => Engine::Song(SongCursor::new(
                song,
                cfg.instruments,
                cfg.song_step_interval,
                cfg.song_note,
            )),
        };

        let mut session = Session {
            tracker:   HandTracker::new(),
            engine,
            policy:    cfg.absent_policy,
            mode_name,
            scheduler: SustainScheduler::new(backend.clone()),
            backend,
            programs:  [None, None],
            label:     None,
            label_display: cfg.label_display,
            present:   [false, false],
            bboxes:    [None, None],
            status:    String::new(),
        };

        for hand in Hand::ALL {
            session.select_program(hand, cfg.instruments.for_hand(hand))?;
        }
        log::info!(
            "Session started: {}  left={}  right={}  absent-hand={:?}",
            session.mode_name, cfg.instruments.left, cfg.instruments.right, session.policy,
        );
        session.status = format!("Ready: {}", session.mode_name);
        Ok(session)
    }

    // ── process one detector frame ──────────────────────────────────────

    /// Run one frame through tracker and mapper and play the result.
    /// Returns the actions taken.
    pub fn process_frame(
        &mut self,
        hands: &[HandObservation],
        now:   Instant,
    ) -> Result<Vec<Action>, SessionError> {
        self.present = [false, false];
        self.bboxes = [None, None];
        let pairs: Vec<(Hand, FingerSet)> = hands.iter()
            .map(|h| {
                self.present[h.hand.index()] = true;
                self.bboxes[h.hand.index()] = h.bbox;
                (h.hand, h.raised)
            })
            .collect();

        let edges = self.tracker.process_frame(&pairs, self.policy);

        let actions: Vec<Action> = match &mut self.engine {
            Engine::Table(mapper) => edges.iter()
                .filter_map(|e| {
                    log::debug!("edge: {}", e);
                    mapper.map_edge(*e)
                })
                .collect(),
            Engine::Song(cursor) => cursor.on_frame(!hands.is_empty(), now).into_iter().collect(),
        };

        for action in &actions {
            self.execute(action, now)?;
        }
        Ok(actions)
    }

    fn execute(&mut self, action: &Action, now: Instant) -> Result<(), SessionError> {
        match action {
            Action::NoteOn { hand, program, pitches, label } => {
                self.note_on(*hand, *program, pitches)?;
                if let Some(l) = label { self.show_label(l, now); }
                self.status = format!("play {} {:?} on program {}", hand, pitches, program);
            }
            Action::ReleaseAfter { hand, pitches, delay } => {
                self.scheduler.schedule(channel_for(*hand), pitches.clone(), *delay);
                self.status = format!("release {} {:?} in {:?}", hand, pitches, delay);
            }
            Action::Strike { hand, program, pitches, label, release_after } => {
                self.note_on(*hand, *program, pitches)?;
                self.scheduler.schedule(channel_for(*hand), pitches.clone(), *release_after);
                if let Some(l) = label { self.show_label(l, now); }
                self.status = format!("hit {} {:?}", hand, pitches);
            }
        }
        log::debug!("{}", self.status);
        Ok(())
    }

    fn note_on(&mut self, hand: Hand, program: u8, pitches: &[u8]) -> Result<(), SessionError> {
        self.select_program(hand, program)?;
        let channel = channel_for(hand);
        for &pitch in pitches {
            self.backend.send(BackendCommand::NoteOn { channel, pitch, velocity: FULL_VELOCITY })?;
        }
        Ok(())
    }

    /// Send a program change only when the hand's channel isn't already on
    /// `program`.
    fn select_program(&mut self, hand: Hand, program: u8) -> Result<(), SessionError> {
        let slot = &mut self.programs[hand.index()];
        if *slot != Some(program) {
            self.backend.send(BackendCommand::SetInstrument { channel: channel_for(hand), program })?;
            *slot = Some(program);
        }
        Ok(())
    }

    fn show_label(&mut self, label: &str, now: Instant) {
        self.label = Some((label.to_string(), now));
    }

    // ── Accessors for the render loop ─────────────────────────────────────

    /// Latest label while it is still fresh.  Song hints stay up until the
    /// next step replaces them.
    pub fn overlay_text(&self, now: Instant) -> Option<&str> {
        let pinned = matches!(self.engine, Engine::Song(_));
        self.label.as_ref()
            .filter(|(_, at)| pinned || now.saturating_duration_since(*at) < self.label_display)
            .map(|(text, _)| text.as_str())
    }

    pub fn fingers(&self, hand: Hand) -> FingerSet { self.tracker.state(hand) }

    pub fn is_present(&self, hand: Hand) -> bool { self.present[hand.index()] }

    pub fn mode_name(&self) -> &str { &self.mode_name }

    /// `(played, total)` for song sessions.
    pub fn song_progress(&self) -> Option<(usize, usize)> {
        match &self.engine {
            Engine::Song(c)  => Some((c.position(), c.song().len())),
            Engine::Table(_) => None,
        }
    }

    pub fn view(&self, now: Instant) -> SessionView {
        SessionView {
            mode:    self.mode_name().to_string(),
            fingers: [self.fingers(Hand::Left), self.fingers(Hand::Right)],
            present: self.present,
            bboxes:  self.bboxes,
            label:   self.overlay_text(now).map(str::to_string),
            status:  match self.song_progress() {
                Some((done, total)) => format!("{}  [{}/{}]", self.status, done, total),
                None                => self.status.clone(),
            },
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run(): the main frame loop
// ════════════════════════════════════════════════════════════════════════════

/// Run a session until the overlay window closes or `Q` is pressed.
///
/// Creates the overlay window, the pose source (keyboard simulation by
/// default, hardware with `--features leap`) and the backend thread, then
/// processes one frame per window refresh.  Pending releases are abandoned
/// on exit.
pub fn run(cfg: SessionConfig, backend: Box<dyn SoundBackend>) -> Result<(), SessionError> {
    let (sim_tx, sim_rx) = mpsc::channel();
    let mut overlay = Overlay::new(sim_tx).map_err(SessionError::Window)?;

    let mut source = open_pose_source(sim_rx);
    let mut session = Session::start(cfg, spawn_backend(backend))?;

    while overlay.is_open() {
        if !overlay.poll_input() { break; }

        let now = Instant::now();
        match source.detect() {
            Some(hands) => { session.process_frame(&hands, now)?; }
            None        => log::debug!("no frame this cycle"),
        }

        overlay.render(&session.view(now));
    }

    log::info!("Session ended");
    Ok(())
}

#[cfg(not(feature = "leap"))]
fn open_pose_source(sim_rx: mpsc::Receiver<crate::pose::SimInput>) -> Box<dyn PoseSource> {
    log::info!("Hand source: keyboard simulation");
    Box::new(SimPoseSource::new(sim_rx))
}

#[cfg(feature = "leap")]
fn open_pose_source(sim_rx: mpsc::Receiver<crate::pose::SimInput>) -> Box<dyn PoseSource> {
    match crate::pose::LeapPoseSource::open() {
        Ok(leap) => {
            log::info!("Hand source: LeapMotion");
            Box::new(leap)
        }
        Err(e) => {
            log::warn!("{} — falling back to keyboard simulation", e);
            Box::new(SimPoseSource::new(sim_rx))
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::tests::Recorder;
    use crate::pose::{KeySnapshot, PoseSource, ScriptedPoseSource, SimInput};

    fn on(channel: u8, pitch: u8) -> BackendCommand {
        BackendCommand::NoteOn { channel, pitch, velocity: 127 }
    }
    fn off(channel: u8, pitch: u8) -> BackendCommand {
        BackendCommand::NoteOff { channel, pitch, velocity: 127 }
    }
    fn program(channel: u8, program: u8) -> BackendCommand {
        BackendCommand::SetInstrument { channel, program }
    }

    fn start(cfg: SessionConfig) -> (Session, Recorder) {
        let rec = Recorder::default();
        let session = Session::start(cfg, spawn_backend(Box::new(rec.clone()))).unwrap();
        (session, rec)
    }

    fn left(bits: u8) -> HandObservation {
        HandObservation::new(Hand::Left, FingerSet::from_bits(bits))
    }
    fn right(bits: u8) -> HandObservation {
        HandObservation::new(Hand::Right, FingerSet::from_bits(bits))
    }

    #[test]
    fn start_sets_each_hands_program_once() {
        let (_s, rec) = start(SessionConfig::with_instruments(TableKind::FreeChord, 40, 56));
        assert_eq!(rec.wait_for(2, Duration::from_secs(2)), vec![program(0, 40), program(1, 56)]);
    }

    #[test]
    fn left_thumb_free_chord_sounds_its_dyad() {
        let (mut s, rec) = start(SessionConfig::with_instruments(TableKind::FreeChord, 40, 56));
        let now = Instant::now();
        s.process_frame(&[left(0b00001)], now).unwrap();
        assert_eq!(rec.wait_for(4, Duration::from_secs(2)), vec![
            program(0, 40), program(1, 56), on(0, 60), on(0, 64),
        ]);
        assert_eq!(s.overlay_text(now), Some("Sa"));
        assert_eq!(s.overlay_text(now + Duration::from_secs(4)), None);
    }

    #[test]
    fn holding_a_finger_does_not_retrigger() {
        let (mut s, rec) = start(SessionConfig::default());
        let now = Instant::now();
        s.process_frame(&[right(0b00010)], now).unwrap();
        let again = s.process_frame(&[right(0b00010)], now).unwrap();
        assert!(again.is_empty());
        let got = rec.wait_for(5, Duration::from_millis(300));
        assert_eq!(got.iter().filter(|c| matches!(c, BackendCommand::NoteOn { .. })).count(), 3);
    }

    #[test]
    fn lowering_a_chord_releases_after_sustain_not_before() {
        let cfg = SessionConfig {
            sustain: Duration::from_millis(200),
            ..SessionConfig::for_mode(Mode::Table(TableKind::ScaleChord))
        };
        let (mut s, rec) = start(cfg);
        let now = Instant::now();
        s.process_frame(&[right(0b00001)], now).unwrap();
        let lowered_at = Instant::now();
        s.process_frame(&[right(0b00000)], now).unwrap();

        std::thread::sleep(Duration::from_millis(80));
        assert!(!rec.commands().iter().any(|c| matches!(c, BackendCommand::NoteOff { .. })));

        let got = rec.wait_for(2 + 3 + 3, Duration::from_secs(2));
        assert_eq!(&got[5..], &[off(1, 62), off(1, 66), off(1, 69)]);
        for (at, cmd) in rec.timed() {
            if matches!(cmd, BackendCommand::NoteOff { .. }) {
                assert!(at.duration_since(lowered_at) >= Duration::from_millis(200));
            }
        }
    }

    #[test]
    fn drum_hit_releases_after_hit_time_even_if_finger_stays_up() {
        let (mut s, rec) = start(SessionConfig::for_mode(Mode::Table(TableKind::DrumKit)));
        let hit_at = Instant::now();
        let actions = s.process_frame(&[left(0b00010)], hit_at).unwrap();
        assert_eq!(actions.len(), 1);

        let got = rec.wait_for(4, Duration::from_secs(2));
        assert_eq!(got, vec![program(0, 118), program(1, 118), on(0, 38), off(0, 38)]);

        let timed = rec.timed();
        let on_at  = timed[2].0;
        let off_at = timed[3].0;
        assert!(off_at.duration_since(on_at) >= Duration::from_millis(100));
        assert!(off_at.duration_since(hit_at) < Duration::from_millis(600));

        // Lowering afterwards plays nothing more.
        assert!(s.process_frame(&[left(0)], Instant::now()).unwrap().is_empty());
    }

    #[test]
    fn release_all_policy_releases_raised_fingers_on_empty_frame() {
        let cfg = SessionConfig {
            sustain: Duration::from_millis(10),
            absent_policy: AbsentHandPolicy::ReleaseAll,
            ..SessionConfig::default()
        };
        let (mut s, rec) = start(cfg);
        let now = Instant::now();
        s.process_frame(&[left(0b00001), right(0b10000)], now).unwrap();
        let released = s.process_frame(&[], now).unwrap();
        assert_eq!(released.len(), 2);
        assert!(released.iter().all(|a| matches!(a, Action::ReleaseAfter { .. })));
        assert_eq!(s.fingers(Hand::Left), FingerSet::LOWERED);

        // 2 programs + 2 + 3 note-ons + 2 + 3 note-offs.
        let got = rec.wait_for(12, Duration::from_secs(2));
        assert_eq!(got.iter().filter(|c| matches!(c, BackendCommand::NoteOff { .. })).count(), 5);
    }

    #[test]
    fn hold_policy_keeps_state_on_empty_frame() {
        let (mut s, _rec) = start(SessionConfig::default());
        let now = Instant::now();
        s.process_frame(&[left(0b00001)], now).unwrap();
        assert!(s.process_frame(&[], now).unwrap().is_empty());
        assert!(!s.is_present(Hand::Left));
        assert_eq!(s.fingers(Hand::Left), FingerSet::from_bits(0b00001));
    }

    #[test]
    fn song_session_steps_per_presence_frame() {
        let song = SongSequence::new("two", vec![
            (Hand::Left, finger_state::Finger::Thumb),
            (Hand::Left, finger_state::Finger::Index),
        ]);
        let cfg = SessionConfig {
            song_step_interval: Duration::ZERO,
            song_note: Duration::from_millis(20),
            ..SessionConfig::for_mode(Mode::Song(song))
        };
        let (mut s, rec) = start(cfg);
        let mut src = ScriptedPoseSource::new([
            Some(vec![right(0)]),
            Some(vec![]),
            Some(vec![left(0b11111)]),
            Some(vec![left(0)]),
        ]);
        let now = Instant::now();
        let mut played = 0;
        while let Some(hands) = src.detect() {
            played += s.process_frame(&hands, now).unwrap().len();
        }
        assert_eq!(played, 2);
        assert_eq!(s.song_progress(), Some((2, 2)));
        assert_eq!(s.overlay_text(now), Some("Raise: index on left"));
        assert_eq!(s.overlay_text(now + Duration::from_secs(60)), Some("Raise: index on left"));

        // 2 programs, two triads on, two triads off.
        let got = rec.wait_for(14, Duration::from_secs(2));
        assert_eq!(got.len(), 14);
        assert_eq!(&got[2..5], &[on(0, 60), on(0, 64), on(0, 67)]);
    }

    #[test]
    fn raising_again_during_sustain_retriggers_and_old_release_still_fires() {
        let cfg = SessionConfig {
            sustain: Duration::from_millis(150),
            ..SessionConfig::default()
        };
        let (mut s, rec) = start(cfg);
        let now = Instant::now();
        s.process_frame(&[left(0b00001)], now).unwrap();
        s.process_frame(&[left(0b00000)], now).unwrap();
        let again = s.process_frame(&[left(0b00001)], now).unwrap();
        assert!(matches!(again.as_slice(), [Action::NoteOn { .. }]));
        let second_on_at = Instant::now();

        let got = rec.wait_for(2 + 4 + 2, Duration::from_secs(2));
        assert_eq!(got, vec![
            program(0, 0), program(1, 24),
            on(0, 60), on(0, 64),
            on(0, 60), on(0, 64),
            off(0, 60), off(0, 64),
        ]);
        for (at, cmd) in rec.timed() {
            if matches!(cmd, BackendCommand::NoteOff { .. }) {
                assert!(at >= second_on_at);
            }
        }
    }

    #[test]
    fn keyboard_release_schedules_note_off() {
        let (tx, rx) = mpsc::channel();
        let mut src = SimPoseSource::new(rx);
        let (mut s, _rec) = start(SessionConfig::default());
        let now = Instant::now();

        tx.send(SimInput::Keys(KeySnapshot { left: FingerSet::from_bits(0b00001), ..Default::default() })).unwrap();
        let pressed = s.process_frame(&src.detect().unwrap(), now).unwrap();
        assert!(matches!(pressed.as_slice(), [Action::NoteOn { .. }]));

        tx.send(SimInput::Keys(KeySnapshot::default())).unwrap();
        let released = s.process_frame(&src.detect().unwrap(), now).unwrap();
        assert_eq!(released, vec![Action::ReleaseAfter {
            hand:    Hand::Left,
            pitches: vec![60, 64],
            delay:   Duration::from_secs(2),
        }]);
        assert_eq!(s.fingers(Hand::Left), FingerSet::LOWERED);
    }

    #[test]
    fn view_carries_mode_and_hand_boxes() {
        let (mut s, _rec) = start(SessionConfig::default());
        let bbox = BoundingBox { x: 0.1, y: 0.2, w: 0.3, h: 0.4 };
        s.process_frame(&[left(0).with_bbox(bbox)], Instant::now()).unwrap();
        let view = s.view(Instant::now());
        assert_eq!(view.mode, "Free chords");
        assert_eq!(view.bboxes, [Some(bbox), None]);
        assert_eq!(view.present, [true, false]);
    }

    #[test]
    fn dead_backend_surfaces_as_error() {
        let rec = Recorder { fail_after: Some(2), ..Recorder::default() };
        let mut s = Session::start(SessionConfig::default(), spawn_backend(Box::new(rec))).unwrap();

        // First note-on kills the backend thread; keep playing until sends fail.
        let deadline = Instant::now() + Duration::from_secs(2);
        let mut bits = 0u8;
        let err = loop {
            bits ^= 0b00001;
            if let Err(e) = s.process_frame(&[left(bits)], Instant::now()) { break Some(e); }
            if Instant::now() > deadline { break None; }
            std::thread::sleep(Duration::from_millis(5));
        };
        assert!(matches!(err, Some(SessionError::Backend(BackendError::Closed))));
    }
}
