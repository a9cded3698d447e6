//! Display-name lookup for chat members.

use async_trait::async_trait;
use tracing::warn;

use crate::Result;

/// Shown when a member's display name cannot be resolved.
pub const UNKNOWN_DISPLAY_NAME: &str = "(unknown)";

/// Where a message came from on the chat platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatSource {
    Group { group_id: String, user_id: String },
    Room { room_id: String, user_id: String },
    User { user_id: String },
}

impl ChatSource {
    /// Namespace attendance is tracked under. One-to-one chats use the
    /// member's own id.
    pub fn group_id(&self) -> &str {
        match self {
            ChatSource::Group { group_id, .. } => group_id,
            ChatSource::Room { room_id, .. } => room_id,
            ChatSource::User { user_id } => user_id,
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            ChatSource::Group { user_id, .. }
            | ChatSource::Room { user_id, .. }
            | ChatSource::User { user_id } => user_id,
        }
    }
}

#[async_trait]
pub trait ProfileResolver: Send + Sync {
    async fn resolve_display_name(&self, source: &ChatSource) -> Result<String>;
}

/// Resolve the member's current name. `None` when the lookup failed or
/// returned a blank name, leaving the fallback to the caller.
pub async fn lookup_display_name<P: ProfileResolver + ?Sized>(
    resolver: &P,
    source: &ChatSource,
) -> Option<String> {
    match resolver.resolve_display_name(source).await {
        Ok(name) if !name.trim().is_empty() => Some(name),
        Ok(_) => None,
        Err(e) => {
            warn!(user_id = source.user_id(), "Profile lookup failed: {}", e);
            None
        }
    }
}
