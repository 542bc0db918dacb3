//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

// =============================================================================
// Identity Providers
// =============================================================================

/// Provider tag for accounts with a locally stored password
pub const PROVIDER_LOCAL: &str = "local";

/// Provider tag for accounts federated through Google
pub const PROVIDER_GOOGLE: &str = "google";

// =============================================================================
// Validation
// =============================================================================

/// Minimum password length requirement (measured after trimming)
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Accepted prefixes for a profile photo reference (compared case-insensitively)
pub const PHOTO_PREFIXES: &[&str] = &["data:image", "http"];

// =============================================================================
// Password Reset
// =============================================================================

/// Smallest reset code that can be issued
pub const RESET_CODE_MIN: u32 = 100_000;

/// Largest reset code that can be issued
pub const RESET_CODE_MAX: u32 = 999_999;

/// Default lifetime of a reset code in minutes
pub const DEFAULT_RESET_TOKEN_TTL_MINUTES: i64 = 60;

// =============================================================================
// Slugs
// =============================================================================

/// Base slug used when a display name has no usable characters
pub const SLUG_FALLBACK: &str = "user";

/// Separator used between slug words and before a collision suffix
pub const SLUG_SEPARATOR: char = '_';

/// Upper bound on candidates checked against storage for one slug
pub const MAX_SLUG_CANDIDATES: usize = 10_000;

// =============================================================================
// Notifications
// =============================================================================

/// Notification type produced when a message is received
pub const NOTIFICATION_TYPE_MESSAGE: &str = "message";

// =============================================================================
// Profile Stats
// =============================================================================

/// Favorite kinds that count as following the target user
pub const FOLLOW_FAVORITE_KINDS: &[&str] = &["caregiver", "profile", "takip"];

/// Prefix of the card id under which moment reviews are filed
pub const MOMENT_CARD_PREFIX: &str = "moment_";
