use std::any::Any;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::error::{DispatchError, RegistrationError};
use crate::handler::NotificationBinding;
use crate::shape::ShapeKey;

#[derive(Default)]
pub(crate) struct NotificationRegistry {
    handlers: DashMap<ShapeKey, Vec<Arc<dyn Any + Send + Sync>>>,
}

impl NotificationRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends `binding` to the list for the shape of `TNotification`.
    pub(crate) fn register<TNotification: 'static>(
        &self,
        binding: NotificationBinding<TNotification>,
    ) {
        let key = ShapeKey::of::<TNotification>();
        // The entry guard holds the shard lock, so concurrent appends for
        // one shape are serialized and none is lost.
        let mut entry = self.handlers.entry(key).or_default();
        entry.push(Arc::new(binding));
        debug!(
            notification = key.short_name(),
            handlers = entry.len(),
            "notification handler registered"
        );
    }

    /// Registers every binding in order. An empty list is rejected.
    pub(crate) fn register_all<TNotification: 'static>(
        &self,
        bindings: Vec<NotificationBinding<TNotification>>,
    ) -> Result<(), RegistrationError> {
        if bindings.is_empty() {
            return Err(RegistrationError::NoHandlersProvided {
                notification: ShapeKey::of::<TNotification>().name(),
            });
        }
        for binding in bindings {
            self.register(binding);
        }
        Ok(())
    }

    /// Snapshot of the bindings for `TNotification` in registration order.
    /// No registrations is an empty list, not an error.
    pub(crate) fn resolve<TNotification: 'static>(
        &self,
    ) -> Result<Vec<NotificationBinding<TNotification>>, DispatchError> {
        let key = ShapeKey::of::<TNotification>();
        let Some(stored) = self.handlers.get(&key) else {
            return Ok(Vec::new());
        };

        let bindings = stored
            .iter()
            .map(|binding| {
                binding
                    .downcast_ref::<NotificationBinding<TNotification>>()
                    .cloned()
                    .ok_or(DispatchError::NotificationHandlerNotValid {
                        notification: key.name(),
                    })
            })
            .collect();
        bindings
    }

    pub(crate) fn count<TNotification: 'static>(&self) -> usize {
        self.handlers
            .get(&ShapeKey::of::<TNotification>())
            .map_or(0, |list| list.len())
    }

    pub(crate) fn clear(&self) {
        self.handlers.clear();
    }
}
