//! Sound backend: the MIDI output and the thread that owns it.
//!
//! The frame loop and every pending release talk to the backend through a
//! cloned [`CommandSender`]; a single backend thread executes the commands in
//! arrival order.  A backend error is fatal: the thread logs it and exits, and
//! every later send reports [`BackendError::Closed`].

use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use finger_state::Hand;

// ════════════════════════════════════════════════════════════════════════════
// BackendError
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The MIDI subsystem could not be initialised.
    Init(String),
    /// A port was found but could not be opened.
    Connect(String),
    /// Writing a message to the port failed.
    Send(String),
    /// The backend thread has stopped; nothing more can be played.
    Closed,
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Init(e)    => write!(f, "MIDI init failed: {}", e),
            BackendError::Connect(e) => write!(f, "MIDI connect failed: {}", e),
            BackendError::Send(e)    => write!(f, "MIDI send failed: {}", e),
            BackendError::Closed     => write!(f, "sound backend is no longer running"),
        }
    }
}

impl std::error::Error for BackendError {}

// ════════════════════════════════════════════════════════════════════════════
// SoundBackend: abstraction over midir / logging (and test recorders)
// ════════════════════════════════════════════════════════════════════════════

/// Something that can play notes on numbered channels.
pub trait SoundBackend: Send {
    fn set_instrument(&mut self, channel: u8, program: u8) -> Result<(), BackendError>;
    fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8) -> Result<(), BackendError>;
    fn note_off(&mut self, channel: u8, pitch: u8, velocity: u8) -> Result<(), BackendError>;
}

/// MIDI channel a hand plays on.  Each hand gets its own so program changes
/// and note-offs never cross over.
pub fn channel_for(hand: Hand) -> u8 {
    hand.index() as u8
}

// ── midir backend ─────────────────────────────────────────────────────────

pub struct MidirBackend {
    conn: midir::MidiOutputConnection,
}

impl MidirBackend {
    fn send(&mut self, bytes: &[u8]) -> Result<(), BackendError> {
        self.conn.send(bytes).map_err(|e| BackendError::Send(e.to_string()))
    }
}

impl SoundBackend for MidirBackend {
    fn set_instrument(&mut self, channel: u8, program: u8) -> Result<(), BackendError> {
        self.send(&[0xC0 | (channel & 0x0F), program & 0x7F])
    }
    fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8) -> Result<(), BackendError> {
        self.send(&[0x90 | (channel & 0x0F), pitch & 0x7F, velocity & 0x7F])
    }
    fn note_off(&mut self, channel: u8, pitch: u8, velocity: u8) -> Result<(), BackendError> {
        self.send(&[0x80 | (channel & 0x0F), pitch & 0x7F, velocity & 0x7F])
    }
}

// ── logging backend (dry runs, or when no MIDI port is available) ─────────

pub struct LogBackend;

impl SoundBackend for LogBackend {
    fn set_instrument(&mut self, channel: u8, program: u8) -> Result<(), BackendError> {
        log::info!("[dry] ch{} program {}", channel, program);
        Ok(())
    }
    fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8) -> Result<(), BackendError> {
        log::info!("[dry] ch{} note on  {} vel {}", channel, pitch, velocity);
        Ok(())
    }
    fn note_off(&mut self, channel: u8, pitch: u8, velocity: u8) -> Result<(), BackendError> {
        log::info!("[dry] ch{} note off {} vel {}", channel, pitch, velocity);
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Port discovery
// ════════════════════════════════════════════════════════════════════════════

const CLIENT_NAME: &str = "air_chords";

/// Names of every MIDI output port.
pub fn list_ports() -> Result<Vec<String>, BackendError> {
    let midi_out = midir::MidiOutput::new(CLIENT_NAME)
        .map_err(|e| BackendError::Init(e.to_string()))?;
    Ok(midi_out.ports().iter()
        .enumerate()
        .map(|(i, p)| midi_out.port_name(p).unwrap_or_else(|_| format!("Unknown port {}", i)))
        .collect())
}

/// Index of the port to use: the first whose name contains `filter`
/// (case-insensitive), else a software synth, else the first port.
fn choose_port(names: &[String], filter: Option<&str>) -> Option<usize> {
    if names.is_empty() { return None; }

    if let Some(filter) = filter {
        let filter = filter.to_lowercase();
        match names.iter().position(|n| n.to_lowercase().contains(&filter)) {
            Some(i) => return Some(i),
            None    => log::warn!("No MIDI port matches '{}'", filter),
        }
    }

    let synth = names.iter().position(|n| {
        let n = n.to_lowercase();
        n.contains("fluid") || n.contains("timidity") ||
        n.contains("microsoft") || n.contains("gm") ||
        n.contains("synth")
    });
    Some(synth.unwrap_or(0))
}

/// Open a MIDI output port.
pub fn open_midir(filter: Option<&str>) -> Result<MidirBackend, BackendError> {
    let midi_out = midir::MidiOutput::new(CLIENT_NAME)
        .map_err(|e| BackendError::Init(e.to_string()))?;

    let ports = midi_out.ports();
    let names: Vec<String> = ports.iter()
        .enumerate()
        .map(|(i, p)| midi_out.port_name(p).unwrap_or_else(|_| format!("Unknown port {}", i)))
        .collect();

    let idx = choose_port(&names, filter)
        .ok_or_else(|| BackendError::Connect("no MIDI output ports found".to_string()))?;
    log::info!("Opening MIDI port: {}", names[idx]);

    let conn = midi_out.connect(&ports[idx], "air-chords-out")
        .map_err(|e| BackendError::Connect(e.to_string()))?;
    Ok(MidirBackend { conn })
}

/// The backend for a session: a real port when one opens, otherwise the
/// logging backend with a hint on how to get sound.
pub fn open_backend(filter: Option<&str>, dry_run: bool) -> Box<dyn SoundBackend> {
    if dry_run {
        log::info!("Dry run: MIDI commands are only logged");
        return Box::new(LogBackend);
    }
    match open_midir(filter) {
        Ok(out) => Box::new(out),
        Err(e)  => {
            log::warn!("{} — notes will only be logged", e);
            log::warn!("Install a MIDI synthesiser such as:");
            log::warn!("  • macOS: built-in CoreMIDI (always available)");
            log::warn!("  • Linux: `timidity -iA` or `fluidsynth`");
            log::warn!("  • Windows: built-in GS Wavetable Synth");
            Box::new(LogBackend)
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// BackendCommand + the backend thread
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendCommand {
    SetInstrument { channel: u8, program: u8 },
    NoteOn  { channel: u8, pitch: u8, velocity: u8 },
    NoteOff { channel: u8, pitch: u8, velocity: u8 },
}

impl BackendCommand {
    fn apply(self, backend: &mut dyn SoundBackend) -> Result<(), BackendError> {
        match self {
            BackendCommand::SetInstrument { channel, program }  => backend.set_instrument(channel, program),
            BackendCommand::NoteOn  { channel, pitch, velocity } => backend.note_on(channel, pitch, velocity),
            BackendCommand::NoteOff { channel, pitch, velocity } => backend.note_off(channel, pitch, velocity),
        }
    }
}

/// Cloneable, thread-safe way to reach the backend thread.
#[derive(Clone, Debug)]
pub struct CommandSender {
    tx: Sender<BackendCommand>,
}

impl CommandSender {
    pub fn send(&self, cmd: BackendCommand) -> Result<(), BackendError> {
        self.tx.send(cmd).map_err(|_| BackendError::Closed)
    }
}

/// Spawn the backend thread, which owns `backend` until every
/// [`CommandSender`] is dropped or a command fails.
pub fn spawn_backend(backend: Box<dyn SoundBackend>) -> CommandSender {
    let (tx, rx) = mpsc::channel::<BackendCommand>();
    thread::spawn(move || backend_thread(backend, rx));
    CommandSender { tx }
}

fn backend_thread(mut backend: Box<dyn SoundBackend>, rx: Receiver<BackendCommand>) {
    for cmd in rx {
        if let Err(e) = cmd.apply(backend.as_mut()) {
            log::error!("{} — stopping sound backend", e);
            return;
        }
    }
    log::debug!("sound backend channel closed");
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
