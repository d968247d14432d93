//! Console sound sink.

use std::sync::Mutex;

use crate::usecase::{SoundEffect, SoundPlayer};

/// Records fired cues so the front end can print them after each redraw.
#[derive(Debug, Default)]
pub struct ConsoleSoundPlayer {
    fired: Mutex<Vec<SoundEffect>>,
}

impl ConsoleSoundPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every cue fired since the last call.
    pub fn drain(&self) -> Vec<SoundEffect> {
        match self.fired.lock() {
            Ok(mut fired) => std::mem::take(&mut *fired),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl SoundPlayer for ConsoleSoundPlayer {
    fn play(&self, effect: SoundEffect) {
        tracing::debug!("Playing sound: {}", effect.name());
        match self.fired.lock() {
            Ok(mut fired) => fired.push(effect),
            Err(poisoned) => poisoned.into_inner().push(effect),
        }
    }
}
