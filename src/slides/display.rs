//! Choosing which physical display hosts the slideshow

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::types::RenderSize;

/// Host-assigned identity of a display surface
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurfaceId(pub u32);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Position and logical size of a surface in the desktop coordinate space
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceFrame {
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// A physical display as reported by the host
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisplaySurface {
    pub id: SurfaceId,
    #[serde(default)]
    pub name: String,
    pub frame: SurfaceFrame,
    /// Device pixels per logical pixel
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f32,
    /// The surface showing the control UI
    #[serde(default)]
    pub is_control: bool,
    /// The system's designated main display
    #[serde(default)]
    pub is_primary: bool,
}

fn default_scale_factor() -> f32 {
    1.0
}

impl DisplaySurface {
    #[must_use]
    pub fn new(id: u32, width: u32, height: u32) -> Self {
        Self {
            id: SurfaceId(id),
            name: format!("Display {id}"),
            frame: SurfaceFrame {
                x: 0,
                y: 0,
                width,
                height,
            },
            scale_factor: default_scale_factor(),
            is_control: false,
            is_primary: false,
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_scale_factor(mut self, scale_factor: f32) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    #[must_use]
    pub fn control(mut self) -> Self {
        self.is_control = true;
        self
    }

    #[must_use]
    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }

    /// Pixel size slides should be rendered at for this surface
    #[must_use]
    pub fn render_size(&self) -> RenderSize {
        RenderSize::new(self.frame.width, self.frame.height).scaled(self.scale_factor)
    }
}

/// How the presentation surface is chosen
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DisplayPolicy {
    /// Prefer any display other than the control surface
    #[default]
    Automatic,
    /// 1-based position in the host's display list; 0 means automatic
    Explicit(usize),
}

impl fmt::Display for DisplayPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Automatic => f.write_str("auto"),
            Self::Explicit(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid display policy {0:?} (expected \"auto\" or a display number)")]
pub struct InvalidPolicy(pub String);

impl FromStr for DisplayPolicy {
    type Err = InvalidPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("auto") || trimmed.eq_ignore_ascii_case("automatic") {
            return Ok(Self::Automatic);
        }
        trimmed
            .parse::<usize>()
            .map(Self::Explicit)
            .map_err(|_| InvalidPolicy(s.to_string()))
    }
}

impl TryFrom<String> for DisplayPolicy {
    type Error = InvalidPolicy;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DisplayPolicy> for String {
    fn from(policy: DisplayPolicy) -> Self {
        policy.to_string()
    }
}

/// Pick the surface that hosts the slideshow.
///
/// Never fails: a degraded display configuration falls back to the primary
/// surface or to the control surface itself.
#[must_use]
pub fn resolve(
    policy: DisplayPolicy,
    surfaces: &[DisplaySurface],
    control: &DisplaySurface,
) -> DisplaySurface {
    match policy {
        DisplayPolicy::Automatic | DisplayPolicy::Explicit(0) => {
            if surfaces.len() > 1 {
                if let Some(other) = surfaces.iter().find(|s| s.id != control.id) {
                    return other.clone();
                }
            }
            control.clone()
        }
        DisplayPolicy::Explicit(n) => surfaces
            .get(n - 1)
            .cloned()
            .unwrap_or_else(|| primary(surfaces, control)),
    }
}

fn primary(surfaces: &[DisplaySurface], control: &DisplaySurface) -> DisplaySurface {
    surfaces
        .iter()
        .find(|s| s.is_primary)
        .cloned()
        .unwrap_or_else(|| control.clone())
}
