//! air_chords: command line and interactive entry point.

use std::io::{self, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use air_chords::backend::{list_ports, open_backend};
use air_chords::session::{self, Mode, SessionConfig};
use finger_midi::{
    instrument_label, parse_program_text, song_catalog, TableKind, INSTRUMENT_CHOICES,
};
use finger_state::AbsentHandPolicy;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    /// Dyads on the left hand, triads on the right
    Free,
    /// D-major scale triads
    Scale,
    /// Drum kit, one hit per raised finger
    Drums,
    /// Step through a song, one chord per frame with a hand in view
    Song,
}

#[derive(Parser, Debug)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None
)]
struct Cli {
    /// Mapping to play; prompts interactively when omitted
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Left-hand instrument, e.g. "24" or "24: Acoustic Guitar (nylon)"
    #[arg(long)]
    left: Option<String>,

    /// Right-hand instrument
    #[arg(long)]
    right: Option<String>,

    /// Song name for --mode song
    #[arg(long, default_value = "Happy Birthday")]
    song: String,

    /// Delay between lowering a finger and its notes stopping
    #[arg(long, value_name = "MS")]
    sustain_ms: Option<u64>,

    /// Release every raised finger when no hand is in view
    #[arg(long)]
    release_on_absent: bool,

    /// Use the first MIDI output whose name contains this text
    #[arg(long, value_name = "SUBSTRING")]
    port: Option<String>,

    /// Print MIDI output ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Log MIDI commands instead of sending them
    #[arg(long)]
    dry_run: bool,

    /// Start straight away with free chords on piano and guitar
    #[arg(long)]
    quick: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    if cli.list_ports {
        let ports = list_ports().context("Failed to query MIDI outputs")?;
        if ports.is_empty() {
            println!("No MIDI output ports found.");
        }
        for (i, name) in ports.iter().enumerate() {
            println!("  {}: {}", i, name);
        }
        return Ok(());
    }

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║          Air Chords — play music with raised fingers         ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    #[cfg(feature = "leap")]
    println!("  Hands: LeapMotion hardware");
    #[cfg(not(feature = "leap"))]
    println!("  Hands: keyboard simulation  (use --features leap for hardware)");
    println!();

    let mut cfg = if cli.quick {
        println!("  Quick-start: free chords, piano (left) and guitar (right)\n");
        SessionConfig::default()
    } else if let Some(mode) = cli.mode {
        config_from_args(mode, &cli)?
    } else {
        configure_interactively()
    };

    apply_overrides(&mut cfg, &cli);

    log::info!(
        "Mode: {}  |  left: {}  |  right: {}  |  sustain {:?}",
        cfg.mode.name(),
        instrument_label(cfg.instruments.left),
        instrument_label(cfg.instruments.right),
        cfg.sustain,
    );

    println!("  Opening overlay window…");
    println!();

    let backend = open_backend(cli.port.as_deref(), cli.dry_run);
    session::run(cfg, backend).context("Session stopped")?;
    Ok(())
}

fn table_kind(mode: ModeArg) -> Option<TableKind> {
    match mode {
        ModeArg::Free  => Some(TableKind::FreeChord),
        ModeArg::Scale => Some(TableKind::ScaleChord),
        ModeArg::Drums => Some(TableKind::DrumKit),
        ModeArg::Song  => None,
    }
}

fn config_from_args(mode: ModeArg, cli: &Cli) -> Result<SessionConfig> {
    let cfg = match table_kind(mode) {
        Some(kind) => SessionConfig::for_mode(Mode::Table(kind)),
        None => SessionConfig::with_song(&cli.song).with_context(|| {
            let names: Vec<String> = song_catalog().into_iter().map(|s| s.name).collect();
            format!("Unknown song '{}' (available: {})", cli.song, names.join(", "))
        })?,
    };
    Ok(cfg)
}

/// Flags that refine any session, however it was chosen.
fn apply_overrides(cfg: &mut SessionConfig, cli: &Cli) {
    if let Some(left) = &cli.left {
        cfg.instruments.left = parse_program_text(left);
    }
    if let Some(right) = &cli.right {
        cfg.instruments.right = parse_program_text(right);
    }
    if let Some(ms) = cli.sustain_ms {
        cfg.sustain = Duration::from_millis(ms);
    }
    if cli.release_on_absent {
        cfg.absent_policy = AbsentHandPolicy::ReleaseAll;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Interactive setup
// ════════════════════════════════════════════════════════════════════════════

fn configure_interactively() -> SessionConfig {
    println!("  Mode:");
    println!("    1.Free chords  2.Scale chords  3.Drums  4.Song");
    let kind = match read_line("    Choice (1–4, default 1): ").trim() {
        "2" => TableKind::ScaleChord,
        "3" => TableKind::DrumKit,
        "4" => return pick_song(),
        _   => TableKind::FreeChord,
    };

    let (left_default, right_default) = kind.default_instruments();
    println!("  Instruments (GM program 0–127):");
    for chunk in INSTRUMENT_CHOICES.chunks(4) {
        let row: Vec<String> = chunk.iter().map(|(p, n)| format!("{}={}", p, n)).collect();
        println!("    {}", row.join("  "));
    }
    let left  = pick_program("  Left hand", left_default);
    let right = pick_program("  Right hand", right_default);

    SessionConfig::with_instruments(kind, left, right)
}

fn pick_program(prompt: &str, default: u8) -> u8 {
    let text = read_line(&format!("{} (default {}): ", prompt, instrument_label(default)));
    if text.trim().is_empty() { default } else { parse_program_text(&text) }
}

fn pick_song() -> SessionConfig {
    let songs = song_catalog();
    for (i, song) in songs.iter().enumerate() {
        println!("    {}.{}  ({} chords)", i + 1, song.name, song.len());
    }
    let choice = read_line("    Song (default 1): ").trim().parse::<usize>().unwrap_or(1);
    let song = songs.into_iter()
        .nth(choice.saturating_sub(1))
        .or_else(|| song_catalog().into_iter().next());
    match song {
        Some(song) => SessionConfig::for_mode(Mode::Song(song)),
        None       => SessionConfig::default(),
    }
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_build_a_song_session() {
        let cli = Cli::parse_from(["air_chords", "--mode", "song", "--song", "twinkle twinkle"]);
        let cfg = config_from_args(ModeArg::Song, &cli).unwrap();
        assert!(matches!(cfg.mode, Mode::Song(ref s) if s.len() == 4));
    }

    #[test]
    fn cli_instrument_text_overrides_defaults() {
        let cli = Cli::parse_from([
            "air_chords", "--mode", "drums", "--left", "24: Acoustic Guitar (nylon)", "--right", "junk",
        ]);
        let mut cfg = config_from_args(ModeArg::Drums, &cli).unwrap();
        apply_overrides(&mut cfg, &cli);
        assert_eq!(cfg.mode, Mode::Table(TableKind::DrumKit));
        assert_eq!((cfg.instruments.left, cfg.instruments.right), (24, 0));
    }

    #[test]
    fn overrides_apply_to_quick_start_too() {
        let cli = Cli::parse_from([
            "air_chords", "--quick", "--left", "56", "--sustain-ms", "500", "--release-on-absent",
        ]);
        let mut cfg = SessionConfig::default();
        apply_overrides(&mut cfg, &cli);
        assert_eq!((cfg.instruments.left, cfg.instruments.right), (56, 24));
        assert_eq!(cfg.sustain, Duration::from_millis(500));
        assert_eq!(cfg.absent_policy, AbsentHandPolicy::ReleaseAll);
    }

    #[test]
    fn unknown_song_is_an_error() {
        let cli = Cli::parse_from(["air_chords", "--mode", "song", "--song", "nope"]);
        assert!(config_from_args(ModeArg::Song, &cli).is_err());
    }
}
