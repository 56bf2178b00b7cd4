//! Composition root: owns the process-wide bus and wires it into every service.

use std::sync::Arc;

use tracing::info;

use ticketing_events::{DomainEvent, EventBus, InMemoryEventBus, PlatformEvent};

use crate::config::PlatformConfig;
use crate::services::{TicketSales, UserService};
use crate::worker::{EventWorker, WorkerHandle};

/// The bus instance shared by the whole application.
pub type PlatformBus = Arc<InMemoryEventBus<PlatformEvent>>;

/// Running application: one bus, the services using it, and the audit worker.
#[derive(Debug)]
pub struct Platform {
    config: PlatformConfig,
    bus: PlatformBus,
    users: UserService<PlatformBus>,
    tickets: TicketSales<PlatformBus>,
    audit: Option<WorkerHandle>,
}

impl Platform {
    /// Initialize logging, then build and start the platform.
    pub fn start(config: PlatformConfig) -> anyhow::Result<Self> {
        ticketing_observability::init_with(&config.log);
        Self::build(config)
    }

    /// Build the platform without touching process-wide logging.
    pub fn build(config: PlatformConfig) -> anyhow::Result<Self> {
        let bus: PlatformBus = Arc::new(InMemoryEventBus::with_config(config.bus));
        let users = UserService::new(Arc::clone(&bus));
        let tickets = TicketSales::new(Arc::clone(&bus), config.default_currency.clone());

        let locale = config.locale;
        let audit = EventWorker::spawn("event-audit", bus.subscribe(), move |event: PlatformEvent| {
            match &event {
                PlatformEvent::UserCreated(e) => {
                    info!(kind = event.event_kind(), user_id = %e.user_id(), "audit");
                }
                PlatformEvent::TicketPurchased(e) => {
                    info!(
                        kind = event.event_kind(),
                        purchase_id = %e.purchase_id(),
                        total = %e.total().format(locale),
                        "audit"
                    );
                }
            }
            Ok(())
        })?;

        info!(
            bus_capacity = ?config.bus.subscriber_capacity,
            locale = %config.locale,
            currency = %config.default_currency,
            "platform started"
        );

        Ok(Self {
            config,
            bus,
            users,
            tickets,
            audit: Some(audit),
        })
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    pub fn bus(&self) -> &PlatformBus {
        &self.bus
    }

    pub fn users(&self) -> &UserService<PlatformBus> {
        &self.users
    }

    pub fn tickets(&self) -> &TicketSales<PlatformBus> {
        &self.tickets
    }

    /// Process teardown: close the bus and wait for the audit worker.
    pub fn shutdown(mut self) {
        self.bus.close();
        if let Some(audit) = self.audit.take() {
            audit.join();
        }
        info!("platform stopped");
    }
}
