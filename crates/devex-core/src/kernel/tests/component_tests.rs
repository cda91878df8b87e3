use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::kernel::component::{ComponentRegistry, KernelComponent};
use crate::kernel::error::Result;

#[derive(Debug, Default)]
struct CountingComponent {
    initialized: AtomicUsize,
    started: AtomicUsize,
    stopped: AtomicUsize,
}

#[async_trait]
impl KernelComponent for CountingComponent {
    fn name(&self) -> &'static str {
        "CountingComponent"
    }

    async fn initialize(&self) -> Result<()> {
        self.initialized.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        self.started.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.stopped.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct OtherComponent;

#[async_trait]
impl KernelComponent for OtherComponent {
    fn name(&self) -> &'static str {
        "OtherComponent"
    }

    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        Ok(())
    }
}

#[test]
fn startup_order_is_registration_order_and_shutdown_reverses_it() {
    let mut registry = ComponentRegistry::new();
    registry.register(Arc::new(CountingComponent::default()));
    registry.register(Arc::new(OtherComponent));

    let startup: Vec<_> = registry
        .in_startup_order()
        .iter()
        .map(|c| c.name())
        .collect();
    assert_eq!(startup, vec!["CountingComponent", "OtherComponent"]);

    let shutdown: Vec<_> = registry.in_shutdown_order().map(|c| c.name()).collect();
    assert_eq!(shutdown, vec!["OtherComponent", "CountingComponent"]);
}

#[tokio::test]
async fn lifecycle_runs_each_registered_component() {
    let component = Arc::new(CountingComponent::default());
    let mut registry = ComponentRegistry::new();
    registry.register(component.clone());

    for entry in registry.in_startup_order() {
        entry.initialize().await.expect("init");
        entry.start().await.expect("start");
    }
    for entry in registry.in_shutdown_order() {
        entry.stop().await.expect("stop");
    }

    assert_eq!(component.initialized.load(Ordering::SeqCst), 1);
    assert_eq!(component.started.load(Ordering::SeqCst), 1);
    assert_eq!(component.stopped.load(Ordering::SeqCst), 1);
}

#[test]
fn empty_registry_has_nothing_to_run() {
    let registry = ComponentRegistry::new();
    assert!(registry.in_startup_order().is_empty());
    assert_eq!(registry.in_shutdown_order().count(), 0);
}
