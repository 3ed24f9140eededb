//! Background sound beds and one-shot effects.
//!
//! Each ambient cue selects a looped wav bed (playroom music, charging
//! hum, siren); cue transitions kill the previous bed's player process
//! before starting the next so beds never overlap. One-shot effects play
//! on top of whatever bed is running.

use std::path::PathBuf;

use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{info, warn};

use presence_types::AmbientCue;

use crate::bus::CueReceiver;

/// One-shot sound effects, played over the current bed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// The robot drove off its charging ramp.
    OffRamp,
    /// A puzzle round was unlocked.
    LevelUnlocked,
    /// A puzzle level was completed.
    LevelComplete,
}

impl Effect {
    fn file(self) -> &'static str {
        match self {
            Effect::OffRamp => "off_ramp.wav",
            Effect::LevelUnlocked => "level_unlocked.wav",
            Effect::LevelComplete => "level_complete.wav",
        }
    }

    fn volume(self) -> f32 {
        match self {
            Effect::OffRamp => 0.2,
            Effect::LevelUnlocked => 1.0,
            Effect::LevelComplete => 1.0,
        }
    }
}

/// Bed file and volume for each cue.
fn bed_for(cue: AmbientCue) -> (&'static str, f32) {
    match cue {
        AmbientCue::Normal => ("playing.wav", 1.0),
        AmbientCue::Charging => ("charging.wav", 1.0),
        AmbientCue::Danger => ("siren.wav", 0.6),
    }
}

/// Audio player invocation.
#[derive(Debug, Clone)]
pub struct SoundConfig {
    /// Player program; must accept `-nodisp -volume <0-100>` plus
    /// `-loop 0` for beds and `-autoexit` for one-shots (ffplay flags).
    pub player: String,
    /// Directory holding the wav samples.
    pub sound_dir: PathBuf,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            player: "ffplay".to_string(),
            sound_dir: PathBuf::from("sounds"),
        }
    }
}

/// Sender half for one-shot effects, held by the speech pipeline.
pub type EffectSender = mpsc::Sender<Effect>;

/// Owns the currently looping bed player.
pub struct SoundEngine {
    config: SoundConfig,
    bed: Option<(AmbientCue, Child)>,
}

impl SoundEngine {
    pub fn new(config: SoundConfig) -> Self {
        Self { config, bed: None }
    }

    /// Switch the looped bed to the one for `cue`. Edge triggered; the
    /// previous bed's player is killed first so beds never overlap.
    pub fn apply(&mut self, cue: AmbientCue) {
        if matches!(self.bed, Some((current, _)) if current == cue) {
            return;
        }
        if let Some((_, mut child)) = self.bed.take() {
            if let Err(err) = child.start_kill() {
                warn!(%err, "failed to stop previous sound bed");
            }
        }

        let (file, volume) = bed_for(cue);
        info!(?cue, file, "switching sound bed");
        match self.spawn_player(file, volume, true) {
            Ok(child) => self.bed = Some((cue, child)),
            Err(err) => warn!(%err, file, "failed to start sound bed"),
        }
    }

    /// Play a one-shot effect over the current bed.
    pub fn play_effect(&mut self, effect: Effect) {
        info!(?effect, "playing sound effect");
        if let Err(err) = self.spawn_player(effect.file(), effect.volume(), false) {
            warn!(%err, ?effect, "failed to play sound effect");
        }
    }

    fn spawn_player(&self, file: &str, volume: f32, looped: bool) -> std::io::Result<Child> {
        let path = self.config.sound_dir.join(file);
        let mut command = Command::new(&self.config.player);
        command
            .arg("-nodisp")
            .arg("-volume")
            .arg(((volume * 100.0) as u32).to_string());
        if looped {
            command.args(["-loop", "0"]);
        } else {
            command.arg("-autoexit");
        }
        command.arg(path).kill_on_drop(looped).spawn()
    }

    /// Subscribe loop: start with the normal bed, then follow cue
    /// transitions and effect requests until both channels close.
    pub async fn run(mut self, mut cues: CueReceiver, mut effects: mpsc::Receiver<Effect>) {
        self.apply(AmbientCue::Normal);
        loop {
            tokio::select! {
                event = cues.recv() => match event {
                    Some(event) => self.apply(event.cue),
                    None => break,
                },
                effect = effects.recv() => match effect {
                    Some(effect) => self.play_effect(effect),
                    None => break,
                },
            }
        }
        info!("sound engine stopping");
    }
}
