// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Opaque reference to the channel that pushes results to the owning client.
///
/// The registry stores and forwards this handle and never sends on it or
/// closes it. Whoever created the underlying transport recovers it with
/// [`TransportHandle::downcast_ref`].
#[derive(Clone)]
pub struct TransportHandle {
    inner: Arc<dyn Any + Send + Sync>,
}

impl TransportHandle {
    pub fn new<T: Any + Send + Sync>(transport: T) -> Self {
        Self {
            inner: Arc::new(transport),
        }
    }

    /// A handle with no transport behind it (headless agents, tests).
    pub fn detached() -> Self {
        Self::new(())
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub fn is_detached(&self) -> bool {
        self.inner.is::<()>()
    }

    /// True when both handles point at the same transport instance.
    pub fn same_transport(&self, other: &TransportHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for TransportHandle {
    fn default() -> Self {
        Self::detached()
    }
}

impl fmt::Debug for TransportHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_detached() {
            f.write_str("TransportHandle(detached)")
        } else {
            f.write_str("TransportHandle(..)")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct WebSocketSink {
        client_id: String,
    }

    #[test]
    fn test_downcast_recovers_transport() {
        let handle = TransportHandle::new(WebSocketSink {
            client_id: "client-7".to_string(),
        });
        let sink = handle.downcast_ref::<WebSocketSink>().unwrap();
        assert_eq!(sink.client_id, "client-7");
        assert!(handle.downcast_ref::<String>().is_none());
        assert!(!handle.is_detached());
    }

    #[test]
    fn test_clones_share_transport() {
        let handle = TransportHandle::new(42u32);
        let clone = handle.clone();
        assert!(handle.same_transport(&clone));
        assert!(!handle.same_transport(&TransportHandle::new(42u32)));
    }

    #[test]
    fn test_detached_default() {
        let handle = TransportHandle::default();
        assert!(handle.is_detached());
        assert_eq!(format!("{:?}", handle), "TransportHandle(detached)");
    }
}
