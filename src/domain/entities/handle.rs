//! Locally materialized resource handles and their lifecycle.

use bytes::Bytes;

use super::resolution::HandleId;

/// A revocable, locally-owned reference to in-memory image bytes.
///
/// Exactly one shell instance owns a handle at a time. Revocation drops the
/// bytes and is idempotent; a revoked handle can no longer back a display.
#[derive(Debug)]
pub struct ResourceHandle {
    id: HandleId,
    bytes: Option<Bytes>,
}

impl ResourceHandle {
    /// Wraps retrieved bytes in a new live handle.
    #[must_use]
    pub const fn new(id: HandleId, bytes: Bytes) -> Self {
        Self {
            id,
            bytes: Some(bytes),
        }
    }

    /// Returns the handle id.
    #[must_use]
    pub const fn id(&self) -> &HandleId {
        &self.id
    }

    /// Returns the backing bytes while the handle is live.
    #[must_use]
    pub const fn bytes(&self) -> Option<&Bytes> {
        self.bytes.as_ref()
    }

    /// Releases the backing bytes. Revoking an already-revoked handle is a
    /// no-op.
    pub fn revoke(&mut self) {
        self.bytes = None;
    }

    /// Returns true once the bytes have been released.
    #[must_use]
    pub const fn is_revoked(&self) -> bool {
        self.bytes.is_none()
    }
}

// A handle that never reached a lifecycle slot (for example because its
// shell was torn down while the run was in flight) still revokes itself.
impl Drop for ResourceHandle {
    fn drop(&mut self) {
        if !self.is_revoked() {
            tracing::debug!(handle = %self.id, "Revoking resource handle on drop");
            self.revoke();
        }
    }
}

/// Per-instance lifecycle manager tracking at most one live handle.
///
/// Every handle the pipeline creates for an instance is installed here; the
/// slot revokes it when the source changes, when a new handle supersedes it,
/// or when the instance is dropped. The creation and revocation counters
/// must balance once the instance is torn down.
#[derive(Debug, Default)]
pub struct HandleSlot {
    current: Option<ResourceHandle>,
    created: u64,
    revoked: u64,
}

impl HandleSlot {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a new handle, revoking any predecessor first so the
    /// instance never holds two live handles.
    pub fn install(&mut self, handle: ResourceHandle) {
        self.revoke();
        if handle.is_revoked() {
            // Already dead on arrival; count it so the books still balance.
            self.created += 1;
            self.revoked += 1;
            return;
        }
        self.created += 1;
        self.current = Some(handle);
    }

    /// Revokes the live handle, if any. Safe to call repeatedly.
    pub fn revoke(&mut self) {
        if let Some(mut handle) = self.current.take() {
            handle.revoke();
            self.revoked += 1;
            tracing::debug!(handle = %handle.id(), "Revoked resource handle");
        }
    }

    /// Returns the live handle, if any.
    #[must_use]
    pub const fn current(&self) -> Option<&ResourceHandle> {
        self.current.as_ref()
    }

    /// Number of handles installed over the slot's lifetime.
    #[must_use]
    pub const fn created_count(&self) -> u64 {
        self.created
    }

    /// Number of handles revoked over the slot's lifetime.
    #[must_use]
    pub const fn revoked_count(&self) -> u64 {
        self.revoked
    }
}

impl Drop for HandleSlot {
    fn drop(&mut self) {
        self.revoke();
    }
}
