//! Prescription manager: PRESCREVE relationships from `Medico` to `Paciente`.
//!
//! A pair of endpoints carries at most one PRESCREVE edge; linking again
//! replaces its `descricao`. Endpoints are matched by `nome`.

use clinica_core::error::{MissingEndpoint, Result};
use clinica_core::{ClinicaError, Outcome, Prescricao};

use crate::client::GraphError;
use crate::statement::{single_count, CypherGateway, Record, Statement};

const ENTITY: &str = "Prescricao";

pub struct PrescricaoManager<G> {
    gateway: G,
}

impl<G: CypherGateway> PrescricaoManager<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    /// Link a Medico to a Paciente with a prescription text.
    ///
    /// Nothing is written unless both endpoints exist; a missing endpoint
    /// is reported as `Unresolved`. If both endpoints turn out to exist
    /// after the link matched nothing, a concurrent create landed in
    /// between and the link is attempted once more.
    pub async fn link(&self, medico: &str, paciente: &str, descricao: &str) -> Result<Outcome> {
        for attempt in 1..=2u32 {
            let linked = self.merge_edge(medico, paciente, descricao).await?;
            if linked > 0 {
                tracing::info!(medico, paciente, linked, "Prescription linked");
                return Ok(Outcome::Linked);
            }

            match self.missing_endpoint(medico, paciente).await? {
                Some(missing) => {
                    tracing::info!(medico, paciente, %missing, "Prescription link unresolved");
                    return Err(ClinicaError::Unresolved { missing });
                }
                None => {
                    tracing::warn!(medico, paciente, attempt, "Endpoints appeared after link matched nothing");
                }
            }
        }

        Err(ClinicaError::Store(format!(
            "Prescription link {medico} -> {paciente} matched nothing although both endpoints exist"
        )))
    }

    async fn merge_edge(&self, medico: &str, paciente: &str, descricao: &str) -> Result<i64> {
        let q = Statement::new(
            "prescricao.link",
            "MATCH (m:Medico {nome: $medico})
             MATCH (p:Paciente {nome: $paciente})
             MERGE (m)-[r:PRESCREVE]->(p)
             SET r.descricao = $descricao
             RETURN count(r) AS linked",
        )
        .param("medico", medico)
        .param("paciente", paciente)
        .param("descricao", descricao)
        .returning(&["linked"]);

        let rows = self.gateway.execute(q).await?;
        Ok(single_count(&rows, "linked")?)
    }

    /// One entry per PRESCREVE edge. Order is whatever the store yields.
    pub async fn list_with_prescriptions(&self) -> Result<Vec<Prescricao>> {
        let q = Statement::new(
            "prescricao.list",
            "MATCH (p:Paciente)<-[r:PRESCREVE]-(m:Medico)
             RETURN p.nome AS paciente, m.nome AS medico, r.descricao AS descricao",
        )
        .returning(&["paciente", "medico", "descricao"]);

        let rows = self.gateway.execute(q).await?;
        let entries = rows
            .iter()
            .map(prescricao_from_record)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Replace the `descricao` of the existing edge between the endpoints.
    pub async fn update(&self, medico: &str, paciente: &str, descricao: &str) -> Result<Outcome> {
        let q = Statement::new(
            "prescricao.update",
            "MATCH (m:Medico {nome: $medico})-[r:PRESCREVE]->(p:Paciente {nome: $paciente})
             SET r.descricao = $descricao
             RETURN count(r) AS updated",
        )
        .param("medico", medico)
        .param("paciente", paciente)
        .param("descricao", descricao)
        .returning(&["updated"]);

        let rows = self.gateway.execute(q).await?;
        let updated = single_count(&rows, "updated")?;
        if updated == 0 {
            return Err(ClinicaError::not_found(
                ENTITY,
                format!("{medico} -> {paciente}"),
            ));
        }
        tracing::info!(medico, paciente, updated, "Prescription updated");
        Ok(Outcome::Updated)
    }

    /// `None` when both endpoints exist.
    async fn missing_endpoint(
        &self,
        medico: &str,
        paciente: &str,
    ) -> Result<Option<MissingEndpoint>> {
        let q = Statement::new(
            "prescricao.endpoints",
            "OPTIONAL MATCH (m:Medico {nome: $medico})
             WITH count(m) AS medicos
             OPTIONAL MATCH (p:Paciente {nome: $paciente})
             RETURN medicos, count(p) AS pacientes",
        )
        .param("medico", medico)
        .param("paciente", paciente)
        .returning(&["medicos", "pacientes"]);

        let rows = self.gateway.execute(q).await?;
        let medicos = single_count(&rows, "medicos")?;
        let pacientes = single_count(&rows, "pacientes")?;
        Ok(match (medicos, pacientes) {
            (0, 0) => Some(MissingEndpoint::Both),
            (0, _) => Some(MissingEndpoint::Medico),
            (_, 0) => Some(MissingEndpoint::Paciente),
            _ => None,
        })
    }
}

fn prescricao_from_record(row: &Record) -> std::result::Result<Prescricao, GraphError> {
    Ok(Prescricao {
        paciente: row.require_text("paciente")?,
        medico: row.require_text("medico")?,
        descricao: row.text("descricao")?.unwrap_or_default(),
    })
}
