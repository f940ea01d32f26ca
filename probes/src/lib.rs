//! Protocol probe engines, one module per scan bus.
//!
//! Every entry point follows the same collaborator contract: it absorbs its
//! own partial failures and returns the devices it found — an empty list is
//! success, never an error. Per-address sub-units of work are gated by the
//! scan semaphore the orchestrator installs through [`semaphore`].

pub mod avahi;
pub mod ipmi;
pub mod nut_bus;
pub mod semaphore;
pub mod serial;
pub mod simulation;
pub mod snmp;
pub mod usb;
pub mod xml_http;
