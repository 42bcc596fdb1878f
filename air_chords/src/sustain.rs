//! Deferred note-offs.
//!
//! Every release is its own detached thread: sleep, then send a note-off per
//! pitch.  Releases are never joined or cancelled, so one armed before a
//! re-trigger of the same finger still fires after the new note-on.

use std::thread;
use std::time::Duration;

use finger_midi::FULL_VELOCITY;

use crate::backend::{BackendCommand, CommandSender};

#[derive(Clone, Debug)]
pub struct SustainScheduler {
    tx: CommandSender,
}

impl SustainScheduler {
    pub fn new(tx: CommandSender) -> Self {
        SustainScheduler { tx }
    }

    /// Turn `pitches` off on `channel` once `delay` has passed.  Returns
    /// immediately.
    pub fn schedule(&self, channel: u8, pitches: Vec<u8>, delay: Duration) {
        let tx = self.tx.clone();
        thread::spawn(move || {
            thread::sleep(delay);
            for &pitch in &pitches {
                let off = BackendCommand::NoteOff { channel, pitch, velocity: FULL_VELOCITY };
                if tx.send(off).is_err() {
                    log::debug!("release of {:?} dropped: backend gone", pitches);
                    return;
                }
            }
            log::debug!("released {:?} on ch{} after {:?}", pitches, channel, delay);
        });
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::spawn_backend;
    use crate::backend::tests::Recorder;
    use std::time::Instant;

    fn off(pitch: u8) -> BackendCommand {
        BackendCommand::NoteOff { channel: 1, pitch, velocity: 127 }
    }

    #[test]
    fn schedule_does_not_block_and_fires_after_delay() {
        let rec = Recorder::default();
        let sched = SustainScheduler::new(spawn_backend(Box::new(rec.clone())));

        let armed = Instant::now();
        sched.schedule(1, vec![60, 64, 67], Duration::from_millis(150));
        assert!(armed.elapsed() < Duration::from_millis(50));
        assert!(rec.commands().is_empty());

        let got = rec.wait_for(3, Duration::from_secs(2));
        assert_eq!(got, vec![off(60), off(64), off(67)]);
        for (at, _) in rec.timed() {
            assert!(at.duration_since(armed) >= Duration::from_millis(150));
        }
    }

    #[test]
    fn overlapping_releases_of_same_payload_both_fire() {
        let rec = Recorder::default();
        let sched = SustainScheduler::new(spawn_backend(Box::new(rec.clone())));
        sched.schedule(1, vec![62], Duration::from_millis(40));
        sched.schedule(1, vec![62], Duration::from_millis(60));
        let got = rec.wait_for(2, Duration::from_secs(2));
        assert_eq!(got, vec![off(62), off(62)]);
    }
}
