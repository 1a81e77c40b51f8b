//! The read/write seam every state backend and overlay implements.
//!
//! Mirrors the teacher's `StateAccess` trait: a thin key/value surface that
//! both the authoritative store and in-flight overlays satisfy, so the
//! executor and block processor can be generic over "some state view"
//! without caring whether it's backed by the real store or a staged diff.

use gtos_types::error::ExecutionError;

/// Byte-oriented read/write access to one state view at a fixed height.
pub trait StateAccess: Send + Sync {
    /// Fetches the raw value at `key`, if present.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, ExecutionError>;

    /// Writes `value` at `key`, replacing any prior value.
    fn put(&mut self, key: &[u8], value: Vec<u8>) -> Result<(), ExecutionError>;

    /// Removes `key`, if present.
    fn delete(&mut self, key: &[u8]) -> Result<(), ExecutionError>;

    /// `true` iff `key` currently has a value.
    fn contains(&self, key: &[u8]) -> Result<bool, ExecutionError> {
        Ok(self.get(key)?.is_some())
    }
}

impl<T: StateAccess + ?Sized> StateAccess for Box<T> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, ExecutionError> {
        (**self).get(key)
    }

    fn put(&mut self, key: &[u8], value: Vec<u8>) -> Result<(), ExecutionError> {
        (**self).put(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), ExecutionError> {
        (**self).delete(key)
    }

    fn contains(&self, key: &[u8]) -> Result<bool, ExecutionError> {
        (**self).contains(key)
    }
}

impl<T: StateAccess + ?Sized> StateAccess for &mut T {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, ExecutionError> {
        (**self).get(key)
    }

    fn put(&mut self, key: &[u8], value: Vec<u8>) -> Result<(), ExecutionError> {
        (**self).put(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), ExecutionError> {
        (**self).delete(key)
    }

    fn contains(&self, key: &[u8]) -> Result<bool, ExecutionError> {
        (**self).contains(key)
    }
}
