//! clinica-core: Shared records, outcomes, configuration, and error handling.
//!
//! This crate provides the foundational types used across all Clinica components:
//! - Node records (Medico, Paciente) and the PRESCREVE relationship (Prescricao)
//! - Operation outcomes and their transport status codes
//! - The error taxonomy returned by every manager operation
//! - Layered configuration loading

pub mod config;
pub mod error;
pub mod types;

pub use error::ClinicaError;
pub use types::{Medico, Outcome, Paciente, Prescricao};
