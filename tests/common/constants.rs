//! Shared constants for end-to-end tests

// ============================================================================
// Post fixtures
// ============================================================================

/// Number of generated posts.
pub const POST_COUNT: usize = 60;

/// Every third post is a Tuesday-morning media post with high reactions.
pub const POST_PATTERN_EVERY: usize = 3;

/// Posts in the pattern group whose reactions clear the 75th percentile.
pub const POST_HIGH_REACTIONS: usize = 15;

// ============================================================================
// Video fixtures
// ============================================================================

/// Number of generated videos.
pub const VIDEO_COUNT: usize = 40;

/// Every fourth video is short, uses an original sound and gets shared a lot.
pub const VIDEO_PATTERN_EVERY: usize = 4;
