use std::sync::Arc;
use std::time::Duration;

use callboard_config::Settings;
use callboard_services::EventBus;
use callboard_services::enrichment::{EnrichmentBackend, EnrichmentTrigger, TaskBoard};
use callboard_services::ingest::{DedupGate, DualStoreWriter};
use callboard_services::recent::RecentLog;
use callboard_services::store::CallStore;

use crate::ws::storage::SubscriberRegistry;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub registry: Arc<SubscriberRegistry>,
    pub bus: EventBus,
    pub dedup: Arc<DedupGate>,
    pub writer: Arc<DualStoreWriter>,
    pub recent: Arc<dyn RecentLog>,
    pub calls: Arc<dyn CallStore>,
    pub tasks: Arc<TaskBoard>,
    pub trigger: Arc<EnrichmentTrigger>,
}

impl AppState {
    /// Wires the pipeline from injected store/backend seams. The caller
    /// still has to spawn the dedup window clear and the event pump.
    pub fn new(
        settings: Settings,
        recent: Arc<dyn RecentLog>,
        calls: Arc<dyn CallStore>,
        backend: Arc<dyn EnrichmentBackend>,
    ) -> Self {
        let bus = EventBus::new(256);
        let registry = Arc::new(SubscriberRegistry::new());
        let dedup = Arc::new(DedupGate::new(Duration::from_secs(settings.dedup.window_secs)));
        let tasks = Arc::new(TaskBoard::new(settings.tasks.checklist.clone()));
        let writer = Arc::new(DualStoreWriter::new(recent.clone(), calls.clone()));
        let trigger = Arc::new(EnrichmentTrigger::new(
            backend,
            recent.clone(),
            tasks.clone(),
            bus.clone(),
        ));

        Self {
            settings: Arc::new(settings),
            registry,
            bus,
            dedup,
            writer,
            recent,
            calls,
            tasks,
            trigger,
        }
    }
}
