//! Sound-cue selection. Actual synthesis belongs to whatever sink is wired
//! in; these are the pure mappings the sinks share.

use crate::types::Side;

/// Pitch of the one-shot trade cue.
pub fn cue_pitch(side: Side) -> &'static str {
    match side {
        Side::Buy => "G4",
        Side::Sell => "C4",
    }
}

/// Ambient noise level in dB for a given market volume, logarithmic so quiet
/// markets stay near the -40 dB floor.
pub fn ambient_level_db(volume: f64) -> f64 {
    let volume = volume.max(0.0);
    -40.0 + (volume + 1.0).ln() * 2.0
}
