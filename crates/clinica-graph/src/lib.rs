//! Clinica Graph — Neo4j persistence for physicians, patients, and prescriptions.
//!
//! Every read and write goes through a [`CypherGateway`]: the pooled
//! [`GraphClient`] in production, or [`MemoryGraph`] in tests. The three
//! managers build parameterized statements, execute them through the
//! gateway, and shape the rows back into domain records or outcomes.

pub mod client;
pub mod medico;
pub mod memory;
pub mod paciente;
pub mod prescricao;
pub mod schema;
pub mod statement;

pub use client::{GraphClient, GraphConfig, GraphError, RetryPolicy};
pub use medico::MedicoManager;
pub use memory::MemoryGraph;
pub use paciente::PacienteManager;
pub use prescricao::PrescricaoManager;
pub use statement::{CypherGateway, Record, Statement, Value};

/// All three managers over one shared gateway.
pub struct Clinica<G> {
    pub medicos: MedicoManager<G>,
    pub pacientes: PacienteManager<G>,
    pub prescricoes: PrescricaoManager<G>,
}

impl<G: CypherGateway + Clone> Clinica<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            medicos: MedicoManager::new(gateway.clone()),
            pacientes: PacienteManager::new(gateway.clone()),
            prescricoes: PrescricaoManager::new(gateway),
        }
    }
}
