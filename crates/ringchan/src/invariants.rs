//! Debug assertion macros for channel invariants.
//!
//! Only active in debug builds (`#[cfg(debug_assertions)]`), so there is
//! zero overhead in release builds.
//!
//! Used by both `RingChannel` and `Producer`.

// =============================================================================
// Position Range
// =============================================================================

/// Assert that a position lies inside the active buffer.
///
/// **Invariant**: `0 ≤ position < configured_size`
///
/// Used in: `consume_one()` and `publish_byte()` after computing the next position
macro_rules! debug_assert_position_in_range {
    ($name:literal, $pos:expr, $size:expr) => {
        debug_assert!(
            $pos < $size,
            "position invariant violated: {} {} outside buffer of size {}",
            $name,
            $pos,
            $size
        )
    };
}

// =============================================================================
// Ack Lifecycle
// =============================================================================

/// Assert that the consumer clears the ack bit only once it has caught up.
///
/// **Invariant**: `ack cleared by consumer ⟹ consumer_position == producer_position`
///
/// Used in: `consume_one()` before clearing `ACK_NEW_DATA`
macro_rules! debug_assert_drained_before_clear {
    ($consumer:expr, $producer:expr) => {
        debug_assert!(
            $consumer == $producer,
            "ack invariant violated: clearing ack with consumer {} behind producer {}",
            $consumer,
            $producer
        )
    };
}

// =============================================================================
// Single-Slot Reserved
// =============================================================================

/// Assert that the producer never advances onto the consumer's position.
///
/// **Invariant**: `next(producer_position) != consumer_position` after a publish
///
/// Used in: `publish_byte()` before publishing the new position
macro_rules! debug_assert_slot_reserved {
    ($next:expr, $consumer:expr) => {
        debug_assert!(
            $next != $consumer,
            "reserved-slot invariant violated: producer would advance onto consumer at {}",
            $consumer
        )
    };
}

// =============================================================================
// Re-exports for crate-internal use
// =============================================================================

pub(crate) use debug_assert_drained_before_clear;
pub(crate) use debug_assert_position_in_range;
pub(crate) use debug_assert_slot_reserved;
