//! Browse the built-in finger tables, songs and instrument list.

use finger_midi::{
    instrument_label, song_catalog, MappingTable, TableKind, INSTRUMENT_CHOICES,
};
use finger_state::{Finger, Hand};
use std::io::{self, Write};

fn main() {
    println!();
    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║            Finger Table Browser                          ║");
    println!("╚══════════════════════════════════════════════════════════╝");
    println!();

    loop {
        println!("  Main menu:");
        println!("    1. Finger tables");
        println!("    2. Songs");
        println!("    3. Instruments");
        println!("    q. Quit");
        println!();

        match read_line("Choice: ").trim() {
            "1" => show_tables(),
            "2" => show_songs(),
            "3" => show_instruments(),
            "q" | "quit" => { println!("\nGoodbye!\n"); break; }
            _   => println!("  ⚠  Enter 1–3 or q.\n"),
        }
        println!();
    }
}

fn show_tables() {
    for kind in TableKind::ALL {
        let table = MappingTable::for_kind(kind);
        let (l, r) = kind.default_instruments();
        println!("\n  ── {} ──  (left {}, right {})", kind.name(), instrument_label(l), instrument_label(r));
        for hand in Hand::ALL {
            for finger in Finger::ALL {
                let shown = table.payload(hand, finger)
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "—".to_string());
                println!("    {:<5} {:<6}  {}", hand, finger, shown);
            }
        }
    }
}

fn show_songs() {
    for song in song_catalog() {
        println!("\n  ── {} ({} steps) ──", song.name, song.len());
        for i in 0..song.len() {
            if let Some(((hand, finger), payload)) = song.step(i) {
                println!("    [{:>2}] {:<5} {:<6}  {}", i, hand, finger, payload);
            }
        }
    }
}

fn show_instruments() {
    println!();
    for &(program, _) in INSTRUMENT_CHOICES {
        println!("    {}", instrument_label(program));
    }
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}
