//! Slide transitions

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Every transition runs for the same fixed duration
pub const TRANSITION_DURATION: Duration = Duration::from_millis(600);

/// Navigation direction between slides
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// Edge the incoming slide enters from
    #[must_use]
    pub const fn edge(self) -> Edge {
        match self {
            Self::Forward => Edge::FromRight,
            Self::Backward => Edge::FromLeft,
        }
    }

    /// Direction implied by moving from `from` to `to`
    #[must_use]
    pub const fn between(from: usize, to: usize) -> Self {
        if to >= from {
            Self::Forward
        } else {
            Self::Backward
        }
    }
}

/// Screen edge an animated slide moves in from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Edge {
    FromRight,
    FromLeft,
}

/// Animation curve
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Timing {
    #[default]
    EaseInEaseOut,
}

/// Visual effect used between slides
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransitionStyle {
    #[default]
    Fade,
    Push,
    Reveal,
    MoveIn,
    Cube,
    Flip,
}

impl TransitionStyle {
    pub const ALL: [Self; 6] = [
        Self::Fade,
        Self::Push,
        Self::Reveal,
        Self::MoveIn,
        Self::Cube,
        Self::Flip,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fade => "fade",
            Self::Push => "push",
            Self::Reveal => "reveal",
            Self::MoveIn => "move-in",
            Self::Cube => "cube",
            Self::Flip => "flip",
        }
    }

    /// The following style in [`ALL`](Self::ALL), wrapping around
    #[must_use]
    pub fn next(self) -> Self {
        let pos = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(pos + 1) % Self::ALL.len()]
    }

    /// Whether the effect has a direction at all
    #[must_use]
    pub const fn is_directional(self) -> bool {
        !matches!(self, Self::Fade)
    }
}

impl fmt::Display for TransitionStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transition style {0:?} (expected one of fade, push, reveal, move-in, cube, flip)")]
pub struct UnknownStyle(pub String);

impl FromStr for TransitionStyle {
    type Err = UnknownStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        let normalized = if normalized == "movein" {
            "move-in".to_string()
        } else {
            normalized
        };
        Self::ALL
            .into_iter()
            .find(|style| style.as_str() == normalized)
            .ok_or_else(|| UnknownStyle(s.to_string()))
    }
}

/// Everything a host needs to animate one slide change
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransitionDescriptor {
    pub style: TransitionStyle,
    pub direction: Direction,
    pub duration: Duration,
    /// `None` for effects without a direction (fade)
    pub edge: Option<Edge>,
    pub timing: Timing,
}

/// Describe the transition for `style` moving in `direction`
#[must_use]
pub fn describe(style: TransitionStyle, direction: Direction) -> TransitionDescriptor {
    TransitionDescriptor {
        style,
        direction,
        duration: TRANSITION_DURATION,
        edge: style.is_directional().then(|| direction.edge()),
        timing: Timing::EaseInEaseOut,
    }
}

impl fmt::Display for TransitionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.style)?;
        match self.edge {
            Some(Edge::FromRight) => write!(f, " from right")?,
            Some(Edge::FromLeft) => write!(f, " from left")?,
            None => {}
        }
        write!(f, " ({:.1}s)", self.duration.as_secs_f32())
    }
}
