use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use stack_blob::BlobStore;
use tracing::{debug, warn};

use crate::path::is_valid_scheme;
use crate::{MediaError, MediaResult, StreamWrapper};

/// Maps virtual scheme names to the blob store bound to them.
///
/// Owned by the controller and shared by reference with anything that has to
/// resolve a virtual path, instead of living in process-wide state. Binding a
/// scheme is a startup concern; lookups happen on every path operation.
pub struct SchemeRegistry {
    stores: RwLock<HashMap<String, Arc<dyn BlobStore>>>,
}

impl SchemeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            stores: RwLock::new(HashMap::new()),
        }
    }

    /// Bind `store` to `scheme`.
    ///
    /// Returns `false` and leaves the existing binding untouched when the
    /// scheme is already registered, or when the name is not a valid scheme.
    pub fn register<S>(&self, scheme: S, store: Arc<dyn BlobStore>) -> bool
    where
        S: Into<String>,
    {
        let scheme = scheme.into();
        if !is_valid_scheme(&scheme) {
            warn!("refusing to register invalid scheme {:?}", scheme);
            return false;
        }

        let mut stores = self.stores.write();
        if stores.contains_key(&scheme) {
            debug!("{}:// is already registered", scheme);
            return false;
        }

        debug!("registered {}:// -> {}", scheme, store.name());
        stores.insert(scheme, store);
        true
    }

    /// Remove the binding for `scheme`, returning the store it pointed to.
    pub fn unregister(&self, scheme: &str) -> Option<Arc<dyn BlobStore>> {
        let removed = self.stores.write().remove(scheme);
        if removed.is_some() {
            debug!("unregistered {}://", scheme);
        }
        removed
    }

    /// Look up the store bound to `scheme`.
    pub fn resolve(&self, scheme: &str) -> MediaResult<Arc<dyn BlobStore>> {
        self.stores
            .read()
            .get(scheme)
            .cloned()
            .ok_or_else(|| MediaError::SchemeNotRegistered {
                scheme: scheme.to_string(),
            })
    }

    pub fn is_registered(&self, scheme: &str) -> bool {
        self.stores.read().contains_key(scheme)
    }

    /// Registered scheme names, sorted.
    pub fn schemes(&self) -> Vec<String> {
        let mut schemes: Vec<String> = self.stores.read().keys().cloned().collect();
        schemes.sort();
        schemes
    }

    /// A fresh stream adapter for `scheme`.
    pub fn wrapper(&self, scheme: &str) -> MediaResult<StreamWrapper> {
        Ok(StreamWrapper::new(scheme, self.resolve(scheme)?))
    }
}

impl Default for SchemeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SchemeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemeRegistry")
            .field("schemes", &self.schemes())
            .finish()
    }
}
