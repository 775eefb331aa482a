use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tastemap::moderation::{ModerationService, StaticTokenGate};
use tastemap::newsletter::NewsletterService;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Moderation and newsletter services sharing one store and one admin gate.
pub(crate) struct Services<S> {
    pub(crate) moderation: Arc<ModerationService<S, StaticTokenGate>>,
    pub(crate) newsletter: Arc<NewsletterService<S, StaticTokenGate>>,
}

impl<S> Services<S>
where
    S: tastemap::moderation::SubmissionStore + tastemap::newsletter::SubscriberStore + 'static,
{
    pub(crate) fn new(store: Arc<S>, gate: StaticTokenGate) -> Self {
        let gate = Arc::new(gate);
        Self {
            moderation: Arc::new(ModerationService::new(store.clone(), gate.clone())),
            newsletter: Arc::new(NewsletterService::new(store, gate)),
        }
    }
}
