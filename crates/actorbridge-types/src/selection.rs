//! Actor-picker selection types.

use crate::actor::ActorReference;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The actor the user picked in the remote surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChosenActor {
    /// Reference naming the actor's public key.
    pub uri: ActorReference,
    /// Display name the remote surface attached to the actor, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

/// Why a selection ended without an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// The user clicked outside the presented surface.
    OutsideClick,
    /// The remote surface sent an explicit cancel notification.
    Remote,
    /// The remote surface reported a choice with no actor.
    EmptyChoice,
    /// The remote surface reported a choice whose reference was malformed.
    InvalidChoice,
    /// The host closed the surface itself.
    Programmatic,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CancelReason::OutsideClick => "clicked outside the actor picker",
            CancelReason::Remote => "canceled in the actor picker",
            CancelReason::EmptyChoice => "no actor chosen",
            CancelReason::InvalidChoice => "chosen actor reference was malformed",
            CancelReason::Programmatic => "actor picker closed by the host",
        };
        f.write_str(text)
    }
}

/// Terminal result of one presentation of the picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SelectionOutcome {
    /// An actor was chosen.
    Chosen(ChosenActor),
    /// The selection ended without an actor.
    Canceled { reason: CancelReason },
}

impl SelectionOutcome {
    /// The chosen actor, if there is one.
    pub fn chosen(&self) -> Option<&ChosenActor> {
        match self {
            SelectionOutcome::Chosen(actor) => Some(actor),
            SelectionOutcome::Canceled { .. } => None,
        }
    }
}

/// Lifecycle of the picker surface.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SelectionState {
    /// Never presented.
    #[default]
    Closed,
    /// Presented and awaiting a choice.
    Open,
    /// Closed after reaching a terminal outcome.
    Resolved(SelectionOutcome),
}

impl SelectionState {
    pub fn is_open(&self) -> bool {
        matches!(self, SelectionState::Open)
    }
}

/// What the bridge currently knows about the chosen actor.
///
/// `Unset` (nothing ever chosen) and `Cleared` (the remote explicitly
/// reported no actor) are distinct.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChosenActorState {
    #[default]
    Unset,
    Chosen(ChosenActor),
    Cleared,
}

impl ChosenActorState {
    pub fn actor(&self) -> Option<&ChosenActor> {
        match self {
            ChosenActorState::Chosen(actor) => Some(actor),
            _ => None,
        }
    }
}

/// Bounding box of the presented surface in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SurfaceRect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl SurfaceRect {
    /// True when the point lies inside the box. Edges count as inside.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        !(self.top > y
            || self.left > x
            || y > self.top + self.height
            || x > self.left + self.width)
    }
}
