//! Slot availability and appointment lifecycle for the booking services.

pub mod availability;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod memory;
pub mod models;
pub mod notify;
pub mod store;

pub use availability::AvailabilityEngine;
pub use config::SlotConfig;
pub use error::{BookingError, ConfigError, NotificationError, StoreError};
pub use lifecycle::LifecycleManager;
pub use memory::InMemoryAppointmentStore;
pub use models::*;
pub use notify::{
    Channel, ChannelOutcome, DeliveryReport, NotificationIntent, NotificationKind, Notifier,
    SimulatedNotifier,
};
pub use store::AppointmentStore;
