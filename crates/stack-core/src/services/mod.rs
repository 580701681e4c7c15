//! Service detection
//!
//! Turns flags and numbered slot keys into a concrete [`ServiceSet`]:
//!
//! - **Core** services run unless explicitly disabled
//! - **Optional** services run when `<NAME>_ENABLED=true`
//! - **Monitoring** is one flag for the whole observability bundle
//! - **Custom** services come from `CS_<n>` / `CUSTOM_SERVICE_<n>_*` slots
//! - **Frontend** apps come from `APP_<n>_*` slots or `FRONTEND_APPS`

pub mod catalog;
mod descriptor;
mod detector;
pub mod slots;

pub use descriptor::{ServiceDescriptor, ServiceSet, ServiceTier};
pub use detector::ServiceDetector;
