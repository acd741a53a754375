use crate::error::{Result, TrackerError};
use crate::models::UserId;

/// Answers "who is making this request". Every store and report call is
/// scoped by the id it returns.
pub(crate) trait IdentityProvider {
    fn current_user(&self) -> Result<UserId>;
}

/// Local single-user identity taken from configuration or the `--user` flag.
pub(crate) struct ConfiguredIdentity {
    user: Option<String>,
}

impl ConfiguredIdentity {
    pub(crate) fn new(user: Option<String>) -> Self {
        Self { user }
    }
}

impl IdentityProvider for ConfiguredIdentity {
    fn current_user(&self) -> Result<UserId> {
        self.user
            .as_deref()
            .and_then(UserId::new)
            .ok_or_else(|| {
                TrackerError::Unauthenticated(
                    "No user configured; pass --user or set EXPENSE_TRACKER_USER".into(),
                )
            })
    }
}
