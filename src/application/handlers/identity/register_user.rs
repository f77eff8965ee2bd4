//! RegisterUserHandler - records a user's chat handle on first contact.

use std::sync::Arc;

use crate::domain::attendance::AttendanceError;
use crate::domain::foundation::Username;
use crate::ports::{ChatUser, IdentityStore};

/// Handler for `/start`.
pub struct RegisterUserHandler {
    store: Arc<dyn IdentityStore>,
}

impl RegisterUserHandler {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    /// Maps the user's username to their chat handle, overwriting any
    /// previous handle.
    ///
    /// # Errors
    ///
    /// - `MissingUsername` if the user has no username to be looked up by
    #[tracing::instrument(skip(self, user), fields(chat = %user.handle))]
    pub async fn handle(&self, user: &ChatUser) -> Result<Username, AttendanceError> {
        let username = user
            .username
            .clone()
            .ok_or(AttendanceError::MissingUsername)?;

        self.store.register(&username, user.handle).await?;
        tracing::info!(%username, "Registered chat handle");
        Ok(username)
    }
}
