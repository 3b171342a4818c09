//! Follow edges between users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A directed edge: `follower_id` subscribes to posts by `author_id`.
///
/// At most one edge exists per ordered pair (enforced by a UNIQUE constraint
/// in the backend). Self-follow is not rejected at this level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Follow {
  pub follower_id: i64,
  pub author_id:   i64,
  pub created_at:  DateTime<Utc>,
}

/// Edge counts shown on profile and post pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowStats {
  /// Incoming edges: how many users follow this one.
  pub followers: u64,
  /// Outgoing edges: how many users this one follows.
  pub following: u64,
}
