//! Local staging copy of a profile being edited.
//!
//! The staged fields are cloned from the first successful read and edited
//! in place; the cached user is never touched. A successful commit drops the
//! staged copy, so the next [`DraftBuffer::load`] rehydrates from the value
//! the backend returned after the update.

use loanscope_common::{ProfileUpdate, User, UserId};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::ApiError;
use crate::session::Session;

/// Whose profile the draft edits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftTarget {
    CurrentUser,
    User(UserId),
}

#[derive(Debug, Clone)]
struct Staged {
    user_id: UserId,
    fields: ProfileUpdate,
}

pub struct DraftBuffer {
    target: DraftTarget,
    staged: Mutex<Option<Staged>>,
    committing: AtomicBool,
}

/// Clears the in-flight flag even if the commit future is dropped
struct CommitGuard<'a>(&'a AtomicBool);

impl Drop for CommitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl DraftBuffer {
    pub fn new(target: DraftTarget) -> Self {
        Self {
            target,
            staged: Mutex::new(None),
            committing: AtomicBool::new(false),
        }
    }

    pub fn target(&self) -> DraftTarget {
        self.target
    }

    /// Read the target through the cache and stage its editable fields
    /// unless a staged copy already exists. Returns the entity as read.
    pub async fn load(&self, session: &Session) -> Result<Arc<User>, ApiError> {
        let user = match self.target {
            DraftTarget::CurrentUser => session.current_user().await?,
            DraftTarget::User(id) => session.user(id).await?,
        };
        self.hydrate(&user);
        Ok(user)
    }

    fn hydrate(&self, user: &User) {
        let mut staged = self.staged.lock();
        if staged.is_none() {
            tracing::debug!("Staging profile of user {}", user.id);
            *staged = Some(Staged {
                user_id: user.id,
                fields: user.profile(),
            });
        }
    }

    /// Current staged fields, if loaded
    pub fn staged(&self) -> Option<ProfileUpdate> {
        self.staged.lock().as_ref().map(|s| s.fields.clone())
    }

    pub fn is_loaded(&self) -> bool {
        self.staged.lock().is_some()
    }

    pub fn is_committing(&self) -> bool {
        self.committing.load(Ordering::SeqCst)
    }

    /// Apply `f` to the staged fields. Returns `false` if nothing is staged.
    pub fn edit(&self, f: impl FnOnce(&mut ProfileUpdate)) -> bool {
        match self.staged.lock().as_mut() {
            Some(staged) => {
                f(&mut staged.fields);
                true
            }
            None => false,
        }
    }

    pub fn set_first_name(&self, value: impl Into<String>) -> bool {
        let value = value.into();
        self.edit(|fields| fields.first_name = value)
    }

    pub fn set_last_name(&self, value: impl Into<String>) -> bool {
        let value = value.into();
        self.edit(|fields| fields.last_name = value)
    }

    /// Send the staged fields. Only first and last name ever leave the buffer.
    ///
    /// On failure the staged copy is kept as it was and nothing is retried.
    pub async fn commit(&self, session: &Session) -> Result<User, ApiError> {
        let staged = self.staged.lock().clone().ok_or(ApiError::NotLoaded)?;

        if self
            .committing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ApiError::CommitInFlight);
        }
        let _guard = CommitGuard(&self.committing);

        let updated = session
            .update_profile(staged.user_id, &staged.fields)
            .await?;

        *self.staged.lock() = None;
        Ok(updated)
    }

    /// Drop the staged copy without sending anything
    pub fn discard(&self) {
        *self.staged.lock() = None;
    }
}
