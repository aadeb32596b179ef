use std::any::{type_name, Any};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use crate::error::{DispatchError, RegistrationError};
use crate::handler::RequestBinding;
use crate::shape::ShapeKey;

struct StoredBinding {
    response: ShapeKey,
    binding: Arc<dyn Any + Send + Sync>,
}

#[derive(Default)]
pub(crate) struct RequestRegistry {
    handlers: DashMap<ShapeKey, StoredBinding>,
}

impl RequestRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Binds `binding` to the shape of `TRequest`. An existing binding is a
    /// conflict and is left untouched.
    pub(crate) fn register<TRequest, TResponse>(
        &self,
        binding: RequestBinding<TRequest, TResponse>,
    ) -> Result<(), RegistrationError>
    where
        TRequest: 'static,
        TResponse: 'static,
    {
        let key = ShapeKey::of::<TRequest>();
        match self.handlers.entry(key) {
            Entry::Occupied(_) => Err(RegistrationError::RequestHandlerAlreadyExists {
                request: key.name(),
            }),
            Entry::Vacant(slot) => {
                debug!(
                    request = key.short_name(),
                    response = type_name::<TResponse>(),
                    kind = binding.kind(),
                    "request handler registered"
                );
                slot.insert(StoredBinding {
                    response: ShapeKey::of::<TResponse>(),
                    binding: Arc::new(binding),
                });
                Ok(())
            }
        }
    }

    pub(crate) fn resolve<TRequest, TResponse>(
        &self,
    ) -> Result<RequestBinding<TRequest, TResponse>, DispatchError>
    where
        TRequest: 'static,
        TResponse: 'static,
    {
        let key = ShapeKey::of::<TRequest>();
        let stored = self
            .handlers
            .get(&key)
            .ok_or(DispatchError::RequestHandlerNotFound {
                request: key.name(),
            })?;

        let binding = stored
            .binding
            .downcast_ref::<RequestBinding<TRequest, TResponse>>()
            .cloned();
        let resolved = binding.ok_or_else(|| {
            debug!(
                request = key.short_name(),
                registered = stored.response.name(),
                expected = type_name::<TResponse>(),
                "request handler response type mismatch"
            );
            DispatchError::RequestHandlerNotValid {
                request: key.name(),
                response: type_name::<TResponse>(),
            }
        });
        resolved
    }

    pub(crate) fn contains<TRequest: 'static>(&self) -> bool {
        self.handlers.contains_key(&ShapeKey::of::<TRequest>())
    }

    pub(crate) fn len(&self) -> usize {
        self.handlers.len()
    }

    pub(crate) fn clear(&self) {
        self.handlers.clear();
    }
}
