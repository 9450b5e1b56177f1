use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::ElementError;
use crate::core::builder::Actionable;
use crate::core::store::Storable;
use crate::core::transaction::{Rollback, Stateful};
use crate::schema::id::{ElementId, NodeId};

/// Where an image sits on the stage.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum ImagePosition {
    Left,
    #[default]
    Center,
    Right,
    /// Fractional anchor, both axes within `0.0..=1.0`.
    Align { x: f64, y: f64 },
    /// Absolute stage coordinates.
    Coord { x: f64, y: f64 },
}

impl ImagePosition {
    pub fn validate(&self) -> Result<(), ElementError> {
        if let Self::Align { x, y } = self {
            let range = 0.0..=1.0;
            if !range.contains(x) || !range.contains(y) {
                return Err(ElementError::InvalidConfig(format!(
                    "align ({}, {}) must be within 0..=1",
                    x, y
                )));
            }
        }
        Ok(())
    }
}

/// Target of an image animation. Unset fields are left as they are.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    #[serde(default)]
    pub position: Option<ImagePosition>,
    #[serde(default)]
    pub opacity: Option<f64>,
    #[serde(default)]
    pub scale: Option<f64>,
    #[serde(default)]
    pub rotation: Option<f64>,
    #[serde(default)]
    pub duration: Duration,
}

impl Transform {
    pub fn fade(duration: Duration) -> Self {
        Self {
            duration,
            ..Self::default()
        }
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn with_position(mut self, position: ImagePosition) -> Self {
        self.position = Some(position);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageConfig {
    pub src: String,
    #[serde(default)]
    pub position: ImagePosition,
    /// Whether the image is visible before any show action runs.
    #[serde(default)]
    pub display: bool,
    #[serde(default)]
    pub z_index: i32,
}

impl ImageConfig {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            position: ImagePosition::default(),
            display: false,
            z_index: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ElementError> {
        if self.src.is_empty() {
            return Err(ElementError::InvalidConfig("image src is required".to_string()));
        }
        self.position.validate()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageState {
    pub src: String,
    pub position: ImagePosition,
    pub displayed: bool,
    pub transform: Option<Transform>,
}

pub enum ImageRecord {
    SetSrc { previous: String },
    SetPosition { previous: ImagePosition },
    Show { was_displayed: bool },
    Hide { was_displayed: bool },
    Transform { previous: Option<Transform> },
}

impl Rollback for ImageState {
    type Record = ImageRecord;

    fn rollback(&mut self, record: ImageRecord, _store: &mut Storable) {
        match record {
            ImageRecord::SetSrc { previous } => self.src = previous,
            ImageRecord::SetPosition { previous } => self.position = previous,
            ImageRecord::Show { was_displayed } | ImageRecord::Hide { was_displayed } => {
                self.displayed = was_displayed
            }
            ImageRecord::Transform { previous } => self.transform = previous,
        }
    }
}

#[derive(Debug)]
pub struct Image {
    pub(crate) id: ElementId,
    name: String,
    config: ImageConfig,
    /// Presentation id, assigned the first time one of its actions runs.
    presented: Option<String>,
    pending: Vec<NodeId>,
    pub(crate) stateful: Stateful<ImageState>,
}

impl Image {
    pub fn new(id: ElementId, name: impl Into<String>, config: ImageConfig) -> Result<Self, ElementError> {
        config.validate()?;
        let state = ImageState {
            src: config.src.clone(),
            position: config.position.clone(),
            displayed: config.display,
            transform: None,
        };
        Ok(Self {
            id,
            name: name.into(),
            config,
            presented: None,
            pending: Vec::new(),
            stateful: Stateful::new(state),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ImageConfig {
        &self.config
    }

    pub fn state(&self) -> &ImageState {
        &self.stateful.state
    }

    pub fn presented_id(&self) -> Option<&str> {
        self.presented.as_deref()
    }

    /// Assign the presentation id. Returns false if one is already set.
    pub(crate) fn register(&mut self, id: String) -> bool {
        if self.presented.is_some() {
            return false;
        }
        self.presented = Some(id);
        true
    }

    pub(crate) fn set_src(&mut self, src: &str) {
        let previous = std::mem::replace(&mut self.stateful.state.src, src.to_string());
        self.stateful.record(ImageRecord::SetSrc { previous });
    }

    pub(crate) fn set_position(&mut self, position: &ImagePosition) {
        let previous = std::mem::replace(&mut self.stateful.state.position, position.clone());
        self.stateful.record(ImageRecord::SetPosition { previous });
    }

    pub(crate) fn show(&mut self) {
        let was_displayed = std::mem::replace(&mut self.stateful.state.displayed, true);
        self.stateful.record(ImageRecord::Show { was_displayed });
    }

    pub(crate) fn hide(&mut self) {
        let was_displayed = std::mem::replace(&mut self.stateful.state.displayed, false);
        self.stateful.record(ImageRecord::Hide { was_displayed });
    }

    pub(crate) fn apply_transform(&mut self, transform: &Transform) {
        let previous = self.stateful.state.transform.replace(transform.clone());
        self.stateful.record(ImageRecord::Transform { previous });
    }
}

impl Actionable for Image {
    fn pending_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.pending
    }
}
