//! Service registry and top-level dispatch.
//!
//! Services register into an explicit registry value rather than any
//! process-global table. A path is claimed by the registered service with
//! the longest matching base-URI prefix; a base of `/` is the catch-all.

use thiserror::Error;
use tracing::debug;

use crate::http::request::Request;
use crate::http::response::ResponseWriter;
use crate::service::{default_not_found, Service};

/// Setup faults raised while wiring services together.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Another service already claims this base URI.
    #[error("base URI '{0}' is already registered")]
    DuplicateBaseUri(String),
}

/// An owning collection of dispatch services.
#[derive(Default)]
pub struct Registry {
    services: Vec<Service>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `service` to the registry. Registering a base URI twice is a
    /// setup fault and leaves the registry unchanged.
    pub fn register(&mut self, service: Service) -> Result<(), RegistryError> {
        if self
            .services
            .iter()
            .any(|s| s.base_uri() == service.base_uri())
        {
            return Err(RegistryError::DuplicateBaseUri(
                service.base_uri().to_owned(),
            ));
        }
        debug!(base_uri = %service.base_uri(), "service registered");
        self.services.push(service);
        Ok(())
    }

    /// The service claiming `path`, if any: longest base-URI prefix wins.
    pub fn lookup(&self, path: &str) -> Option<&Service> {
        self.services
            .iter()
            .filter(|s| base_claims(s.base_uri(), path))
            .max_by_key(|s| s.base_uri().len())
    }

    /// Dispatch to the claiming service, or answer the built-in 404.
    pub fn serve(&self, w: &mut ResponseWriter, r: &mut Request) {
        match self.lookup(r.path()) {
            Some(service) => service.serve(w, r),
            None => {
                debug!(path = %r.path(), "no service claims path");
                default_not_found(w);
            }
        }
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

/// Whether a normalized base URI claims `path`: the base itself, or any
/// path below it. `/api` claims `/api` and `/api/...` but not `/apiary`.
fn base_claims(base: &str, path: &str) -> bool {
    if base == "/" {
        return true;
    }
    path == base
        || (path.starts_with(base) && path.as_bytes().get(base.len()) == Some(&b'/'))
}
