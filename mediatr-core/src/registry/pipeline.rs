use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::error::RegistrationError;
use crate::pipeline::{behavior_shape, PipelineBehavior};

#[derive(Default)]
pub(crate) struct PipelineRegistry {
    behaviors: RwLock<Vec<Arc<dyn PipelineBehavior>>>,
}

impl PipelineRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends behaviors in order. Stops at the first behavior whose shape is
    /// already present; behaviors appended before it stay registered.
    pub(crate) fn register_all(
        &self,
        behaviors: impl IntoIterator<Item = Arc<dyn PipelineBehavior>>,
    ) -> Result<(), RegistrationError> {
        let mut registered = self
            .behaviors
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        for behavior in behaviors {
            let shape = behavior_shape(behavior.as_ref());
            if registered
                .iter()
                .any(|existing| behavior_shape(existing.as_ref()) == shape)
            {
                return Err(RegistrationError::PipelineBehaviorAlreadyExists {
                    behavior: shape.name(),
                });
            }
            debug!(
                behavior = shape.short_name(),
                position = registered.len(),
                "pipeline behavior registered"
            );
            registered.push(behavior);
        }
        Ok(())
    }

    /// Point-in-time copy of the behavior list.
    pub(crate) fn snapshot(&self) -> Vec<Arc<dyn PipelineBehavior>> {
        self.behaviors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.behaviors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub(crate) fn clear(&self) {
        self.behaviors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
