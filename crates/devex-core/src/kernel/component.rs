use std::fmt::Debug;
use std::sync::Arc;
use async_trait::async_trait;
use crate::kernel::error::Result;

/// Core component lifecycle trait for all kernel components
#[async_trait]
pub trait KernelComponent: Send + Sync + Debug {
    fn name(&self) -> &'static str;
    async fn initialize(&self) -> Result<()>;
    async fn start(&self) -> Result<()>;
    async fn stop(&self) -> Result<()>;
}

/// Kernel components, kept in registration order.
///
/// The registry exists to drive the lifecycle: registration order is the
/// startup order, and shutdown walks the same list backwards so
/// dependents stop before what they depend on. Access to individual
/// subsystems goes through `Application`'s typed accessors, not through
/// lookups here.
#[derive(Default, Debug)]
pub struct ComponentRegistry {
    components: Vec<Arc<dyn KernelComponent>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a component. Later registrations initialize later and stop
    /// earlier.
    pub fn register<C: KernelComponent + 'static>(&mut self, component: Arc<C>) {
        self.components.push(component);
    }

    /// Components in startup (registration) order.
    pub fn in_startup_order(&self) -> &[Arc<dyn KernelComponent>] {
        &self.components
    }

    /// Components in shutdown order, the reverse of registration.
    pub fn in_shutdown_order(&self) -> impl Iterator<Item = &Arc<dyn KernelComponent>> {
        self.components.iter().rev()
    }
}
