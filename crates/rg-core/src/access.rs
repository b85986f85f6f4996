//! # Access Gate
//!
//! Every operation declares which roles may invoke it. The gate is a pure
//! predicate over the principal's role; it never touches storage.

use crate::error::{AppError, Result};
use crate::models::Role;

/// The fixed set of roles permitted to invoke an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowSet(&'static [Role]);

/// Account administration: blocking, unblocking, role changes.
pub const ADMIN_ONLY: AllowSet = AllowSet(&[Role::Admin]);

/// Moderation: comment/rating removal, tag edits.
pub const MODERATORS: AllowSet = AllowSet(&[Role::Admin, Role::Moderator]);

/// Any signed-in account.
pub const EVERYONE: AllowSet = AllowSet(&[Role::Admin, Role::Moderator, Role::User]);

impl AllowSet {
    pub fn roles(&self) -> &'static [Role] {
        self.0
    }

    pub fn permits(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn check(&self, role: Role) -> Result<()> {
        if self.permits(role) {
            Ok(())
        } else {
            log::debug!("role {} rejected by allow-set {:?}", role, self.0);
            Err(AppError::forbidden("Operation forbidden"))
        }
    }
}
