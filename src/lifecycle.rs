//! Lifecycle hooks: resource-kind-specific create/acquire/release/destroy

use crate::errors::{PoolError, PoolResult};

/// Capability for resource kinds that can be switched on and off.
///
/// The default acquire/release hooks activate a resource when it is handed
/// out and deactivate it when it comes back. Kinds without this capability
/// either implement it or override the hooks in [`PoolLifecycle`].
pub trait Activatable {
    fn activate(&mut self);
    fn deactivate(&mut self);
}

/// Overridable lifecycle operations around a pooled resource.
///
/// All four operations run synchronously inside the pool operation that
/// triggered them, while the pool lock is held; they must not call back into
/// the pool for the same handle. Registry bookkeeping belongs to the pool,
/// not the hooks: `create` only builds the instance, the pool inserts it.
///
/// The default `on_acquire`/`on_release` bodies resolve the
/// [`Activatable`] capability through [`activation`](Self::activation) and
/// fail with [`PoolError::UnsupportedResource`] when the probe returns
/// `None`. Implementations for non-activatable kinds override the hooks
/// instead of the probe.
pub trait PoolLifecycle: Send + Sync + 'static {
    type Resource: Send + 'static;

    /// Construct a new instance. Called when the pool needs more resources
    /// than are idle, and once per slot of the initial capacity.
    fn create(&self) -> PoolResult<Self::Resource>;

    /// Capability probe used by the default acquire/release hooks.
    fn activation<'r>(
        &self,
        resource: &'r mut Self::Resource,
    ) -> Option<&'r mut dyn Activatable> {
        let _ = resource;
        None
    }

    /// Prepare a resource that is being handed out. Must be safe to call on
    /// a resource of unknown prior state.
    fn on_acquire(&self, resource: &mut Self::Resource) -> PoolResult<()> {
        match self.activation(resource) {
            Some(capability) => {
                capability.activate();
                Ok(())
            }
            None => Err(unsupported::<Self::Resource>()),
        }
    }

    /// Park a resource that has been handed back.
    fn on_release(&self, resource: &mut Self::Resource) -> PoolResult<()> {
        match self.activation(resource) {
            Some(capability) => {
                capability.deactivate();
                Ok(())
            }
            None => Err(unsupported::<Self::Resource>()),
        }
    }

    /// Permanently dispose of an instance. Irreversible; called at most once
    /// per resource.
    fn destroy(&self, resource: Self::Resource) {
        drop(resource);
    }
}

fn unsupported<T>() -> PoolError {
    PoolError::UnsupportedResource {
        pool: String::new(),
        kind: std::any::type_name::<T>(),
    }
}

/// Default lifecycle for [`Activatable`] resource kinds: a factory closure
/// plus the activation capability.
pub struct ActivationLifecycle<T, F> {
    factory: F,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T, F> ActivationLifecycle<T, F>
where
    F: Fn() -> T,
{
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T, F> PoolLifecycle for ActivationLifecycle<T, F>
where
    T: Activatable + Send + 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    type Resource = T;

    fn create(&self) -> PoolResult<T> {
        Ok((self.factory)())
    }

    fn activation<'r>(&self, resource: &'r mut T) -> Option<&'r mut dyn Activatable> {
        Some(resource)
    }
}

/// Factory-only lifecycle for resource kinds without the activation
/// capability. The default acquire/release hooks fail with
/// [`PoolError::UnsupportedResource`] until a specialized pool overrides
/// them, which is the intended signal that the kind needs its own hooks.
pub struct FactoryLifecycle<T, F> {
    factory: F,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T, F> FactoryLifecycle<T, F>
where
    F: Fn() -> T,
{
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T, F> PoolLifecycle for FactoryLifecycle<T, F>
where
    T: Send + 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    type Resource = T;

    fn create(&self) -> PoolResult<T> {
        Ok((self.factory)())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Lamp {
        lit: bool,
    }

    impl Activatable for Lamp {
        fn activate(&mut self) {
            self.lit = true;
        }

        fn deactivate(&mut self) {
            self.lit = false;
        }
    }

    #[test]
    fn default_hooks_toggle_activatable_resources() {
        let lifecycle = ActivationLifecycle::new(|| Lamp { lit: false });
        let mut lamp = lifecycle.create().unwrap();

        lifecycle.on_acquire(&mut lamp).unwrap();
        assert!(lamp.lit);

        lifecycle.on_release(&mut lamp).unwrap();
        assert!(!lamp.lit);
    }

    #[test]
    fn factory_lifecycle_rejects_default_hooks() {
        let lifecycle = FactoryLifecycle::new(|| 7_u32);
        let mut value = lifecycle.create().unwrap();

        let err = lifecycle.on_acquire(&mut value).unwrap_err();
        assert!(matches!(
            err,
            PoolError::UnsupportedResource { kind, .. } if kind == std::any::type_name::<u32>()
        ));
    }

    #[test]
    fn overridden_hooks_bypass_the_capability_probe() {
        struct Zeroing;

        impl PoolLifecycle for Zeroing {
            type Resource = u32;

            fn create(&self) -> PoolResult<u32> {
                Ok(42)
            }

            fn on_acquire(&self, _resource: &mut u32) -> PoolResult<()> {
                Ok(())
            }

            fn on_release(&self, resource: &mut u32) -> PoolResult<()> {
                *resource = 0;
                Ok(())
            }
        }

        let lifecycle = Zeroing;
        let mut value = lifecycle.create().unwrap();
        lifecycle.on_acquire(&mut value).unwrap();
        lifecycle.on_release(&mut value).unwrap();
        assert_eq!(value, 0);
    }
}
