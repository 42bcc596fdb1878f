//! Interactive edge explorer: type finger vectors, see the transitions.

use finger_state::{AbsentHandPolicy, FingerSet, Hand, HandTracker};
use std::io::{self, Write};

fn main() {
    println!();
    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║              Finger Edge Explorer                        ║");
    println!("╚══════════════════════════════════════════════════════════╝");
    println!();
    println!("  Enter one frame per line, e.g.  L 01100  R 10000");
    println!("  (thumb first, 1 = raised).  Empty line = no hands.  q = quit.");
    println!();

    let policy = match read_line("  Release everything when no hand is seen? (y/N): ")
        .trim().to_ascii_lowercase().as_str()
    {
        "y" | "yes" => AbsentHandPolicy::ReleaseAll,
        _           => AbsentHandPolicy::Hold,
    };

    let mut tracker = HandTracker::new();
    loop {
        let line = read_line("frame> ");
        if line.is_empty() || line.trim() == "q" { break; }

        let hands = match parse_frame(&line) {
            Ok(h)  => h,
            Err(e) => { println!("  ⚠  {}", e); continue; }
        };

        let edges = tracker.process_frame(&hands, policy);
        if edges.is_empty() {
            println!("  (no edges)");
        }
        for e in &edges {
            println!("  {}", e);
        }
        println!("  state: L={}  R={}", tracker.state(Hand::Left), tracker.state(Hand::Right));
    }
}

/// Parse `L 01100 R 10000` into per-hand vectors.
fn parse_frame(line: &str) -> Result<Vec<(Hand, FingerSet)>, String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let mut hands = Vec::new();
    for pair in tokens.chunks(2) {
        let hand = match pair[0].to_ascii_uppercase().as_str() {
            "L" => Hand::Left,
            "R" => Hand::Right,
            other => return Err(format!("unknown hand '{}'", other)),
        };
        let bits = pair.get(1).ok_or("missing finger vector")?;
        if bits.len() != 5 || !bits.chars().all(|c| c == '0' || c == '1') {
            return Err(format!("'{}' is not five 0/1 digits", bits));
        }
        let mut raised = [false; 5];
        for (slot, c) in raised.iter_mut().zip(bits.chars()) {
            *slot = c == '1';
        }
        hands.push((hand, FingerSet::new(raised)));
    }
    Ok(hands)
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}
