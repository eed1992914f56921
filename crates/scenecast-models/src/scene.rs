//! Storyboard scene definitions.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reference to a binary asset uploaded alongside a storyboard.
///
/// For multipart submissions this is the form field name the image was
/// uploaded under.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(pub String);

impl AssetRef {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AssetRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Binary assets keyed by reference.
pub type AssetMap = BTreeMap<AssetRef, Vec<u8>>;

/// Where a scene's pixels come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SceneSource {
    /// Video clip fetched over HTTP and looped to the scene duration.
    RemoteVideo { url: String },
    /// Uploaded still image animated for the scene duration.
    StillImage { asset: AssetRef },
}

impl SceneSource {
    /// Asset referenced by this source, if any.
    pub fn asset(&self) -> Option<&AssetRef> {
        match self {
            SceneSource::StillImage { asset } => Some(asset),
            SceneSource::RemoteVideo { .. } => None,
        }
    }
}

/// One storyboard entry with its position in the submitted sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    /// Position in the original submission; the only key used for reordering.
    pub order_index: usize,
    pub source: SceneSource,
    /// Target segment length in seconds.
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph: Option<String>,
}

impl Scene {
    pub fn is_image(&self) -> bool {
        matches!(self.source, SceneSource::StillImage { .. })
    }
}

/// Scene as submitted by a client, before it has been positioned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneInput {
    #[serde(default)]
    pub paragraph: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub image_file: Option<String>,
    pub duration: f64,
}

/// Reasons a submitted storyboard is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneValidationError {
    #[error("storyboard contains no scenes")]
    Empty,

    #[error("scene {0} must reference exactly one of videoUrl or imageFile")]
    AmbiguousSource(usize),

    #[error("scene {index} has invalid duration {duration}")]
    InvalidDuration { index: usize, duration: f64 },

    #[error("scene {0} has an empty video URL")]
    EmptyUrl(usize),
}

impl SceneInput {
    /// Validate and convert into a positioned scene.
    pub fn into_scene(self, order_index: usize) -> Result<Scene, SceneValidationError> {
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(SceneValidationError::InvalidDuration {
                index: order_index,
                duration: self.duration,
            });
        }

        let source = match (self.video_url, self.image_file) {
            (Some(url), None) => {
                if url.trim().is_empty() {
                    return Err(SceneValidationError::EmptyUrl(order_index));
                }
                SceneSource::RemoteVideo { url }
            }
            (None, Some(field)) => SceneSource::StillImage {
                asset: AssetRef(field),
            },
            _ => return Err(SceneValidationError::AmbiguousSource(order_index)),
        };

        Ok(Scene {
            order_index,
            source,
            duration: self.duration,
            paragraph: self.paragraph,
        })
    }
}
