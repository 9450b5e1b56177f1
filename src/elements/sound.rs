use serde::{Deserialize, Serialize};

use crate::core::builder::Actionable;
use crate::core::store::Storable;
use crate::core::transaction::{Rollback, Stateful};
use crate::schema::id::{ElementId, NodeId};

fn default_volume() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundConfig {
    pub src: String,
    #[serde(default)]
    pub looping: bool,
    #[serde(default = "default_volume")]
    pub volume: f64,
    /// Block the story until playback ends. Ignored for looping sounds.
    #[serde(default)]
    pub sync: bool,
}

impl SoundConfig {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            looping: false,
            volume: default_volume(),
            sync: false,
        }
    }

    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }

    pub fn sync(mut self) -> Self {
        self.sync = true;
        self
    }

    pub fn blocks(&self) -> bool {
        self.sync && !self.looping
    }
}

#[derive(Debug, Default)]
pub struct SoundState {
    pub playing: bool,
}

pub enum SoundRecord {
    Play { was_playing: bool },
    Stop { was_playing: bool },
}

impl Rollback for SoundState {
    type Record = SoundRecord;

    fn rollback(&mut self, record: SoundRecord, _store: &mut Storable) {
        match record {
            SoundRecord::Play { was_playing } | SoundRecord::Stop { was_playing } => {
                self.playing = was_playing
            }
        }
    }
}

#[derive(Debug)]
pub struct Sound {
    pub(crate) id: ElementId,
    name: String,
    config: SoundConfig,
    pending: Vec<NodeId>,
    pub(crate) stateful: Stateful<SoundState>,
}

impl Sound {
    pub fn new(id: ElementId, name: impl Into<String>, config: SoundConfig) -> Self {
        Self {
            id,
            name: name.into(),
            config,
            pending: Vec::new(),
            stateful: Stateful::new(SoundState::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &SoundConfig {
        &self.config
    }

    pub fn is_playing(&self) -> bool {
        self.stateful.state.playing
    }

    pub(crate) fn play(&mut self) {
        let was_playing = std::mem::replace(&mut self.stateful.state.playing, true);
        self.stateful.record(SoundRecord::Play { was_playing });
    }

    pub(crate) fn stop(&mut self) {
        let was_playing = std::mem::replace(&mut self.stateful.state.playing, false);
        self.stateful.record(SoundRecord::Stop { was_playing });
    }
}

impl Actionable for Sound {
    fn pending_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.pending
    }
}
