//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Storage backends key their rows by `Entity::Id`, so the id must be cheap to
/// copy around and usable as a map key.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}
