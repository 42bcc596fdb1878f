//! Walks a short scripted gesture through both absent-hand policies.

use finger_state::{AbsentHandPolicy, FingerSet, Hand, HandTracker};

fn main() {
    println!("\n=== HandTracker Demo ===\n");

    let script: Vec<Vec<(Hand, FingerSet)>> = vec![
        vec![(Hand::Left, FingerSet::from_bits(0b00001))],
        vec![
            (Hand::Left,  FingerSet::from_bits(0b00011)),
            (Hand::Right, FingerSet::from_bits(0b10000)),
        ],
        vec![],
        vec![(Hand::Left, FingerSet::from_bits(0b00010))],
    ];

    for policy in [AbsentHandPolicy::Hold, AbsentHandPolicy::ReleaseAll] {
        println!("── {:?} ──", policy);
        let mut tracker = HandTracker::new();
        for (i, frame) in script.iter().enumerate() {
            let edges = tracker.process_frame(frame, policy);
            let shown: Vec<String> = edges.iter().map(|e| e.to_string()).collect();
            println!("   frame {}: [{}]", i, shown.join(", "));
        }
        println!();
    }
}
