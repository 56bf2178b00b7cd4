//! `ticketing-platform` — configuration, composition root and domain services.
//!
//! HTTP, persistence and UI layers sit outside this crate and talk to it only
//! through [`Platform`]'s services and bus.

pub mod app;
pub mod config;
pub mod services;
pub mod worker;

pub use app::{Platform, PlatformBus};
pub use config::{ConfigError, PlatformConfig};
pub use services::{TicketSales, User, UserProfile, UserService};
pub use worker::{EventWorker, WorkerHandle};
