//! Error types for boss construction and body restructuring.

use thiserror::Error;

use super::body_part::PartId;
use super::boss::WorldStyle;

/// Structural invariant violations in a boss body or its AI.
///
/// None of these can be triggered by play; they indicate a bug in how a boss
/// archetype drives its body.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BossError {
    /// No boss exists for this world style yet.
    #[error("No boss archetype is implemented for the {0:?} world style")]
    UnsupportedArchetype(WorldStyle),

    /// Only basic leaf parts can become weakpoints.
    #[error("{part} ({name}) cannot become a weakpoint: {reason}")]
    NotConvertible {
        part: PartId,
        name: &'static str,
        reason: &'static str,
    },

    /// The operation requires a part from the alive subtree.
    #[error("{0} is not part of the alive body")]
    NotAlive(PartId),

    /// Children can only be added to composites.
    #[error("{0} is not a composite and cannot own children")]
    NotComposite(PartId),

    /// A part can only belong to one composite at a time.
    #[error("{part} already belongs to {parent}")]
    AlreadyParented { part: PartId, parent: PartId },

    /// The part is not a direct child of the composite it was removed from.
    #[error("{part} is not a child of {parent}")]
    NotAChild { part: PartId, parent: PartId },

    /// Adding the part would make it its own ancestor.
    #[error("Adding {part} under {parent} would create a cycle")]
    Cycle { part: PartId, parent: PartId },
}
