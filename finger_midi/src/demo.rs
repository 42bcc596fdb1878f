//! Shows what a short finger gesture sounds like under each table.

use finger_midi::{MappingTable, TableKind};
use finger_state::{AbsentHandPolicy, EdgeKind, FingerSet, Hand, HandTracker};

fn main() {
    println!("\n=== Finger Table Demo ===\n");

    let frames = [
        vec![(Hand::Left,  FingerSet::from_bits(0b00001))],
        vec![(Hand::Left,  FingerSet::from_bits(0b00011))],
        vec![(Hand::Right, FingerSet::from_bits(0b00100))],
        vec![(Hand::Left,  FingerSet::LOWERED)],
    ];

    for kind in TableKind::ALL {
        println!("── {} ──", kind.name());
        let table = MappingTable::for_kind(kind);
        let mut tracker = HandTracker::new();
        for frame in &frames {
            for edge in tracker.process_frame(frame, AbsentHandPolicy::Hold) {
                let Some(payload) = table.payload(edge.hand, edge.finger) else { continue };
                let verb = match edge.kind {
                    EdgeKind::Rising  => "on ",
                    EdgeKind::Falling => "off",
                };
                println!("   {:<18} {} {}", edge.to_string(), verb, payload);
            }
        }
        println!();
    }
}
