//! Clinic management core: scheduling, access control, record mutation,
//! and audit logging for a multi-role clinic.
//!
//! The web-delivery collaborator parses forms and renders pages; this
//! crate owns everything in between. Hand it a [`store::Clinic`], the
//! current actor's id, and the parsed [`forms::FormFields`], and the
//! pipelines validate, authorize, persist, and audit atomically.

pub mod access;
pub mod audit;
pub mod availability;
pub mod error;
pub mod forms;
pub mod messages;
pub mod models;
pub mod records;
pub mod sanitize;
pub mod scheduler;
pub mod store;

pub use error::{ClinicError, ClinicResult};
pub use forms::FormFields;
pub use models::{
    Appointment, Hospital, Insurance, LogEntry, MedicalInformation, Message, MessageGroup,
    Person, Prescription, Role,
};
pub use scheduler::ValidationRules;
pub use store::{Clinic, Store};
