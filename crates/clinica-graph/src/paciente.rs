//! Patient manager: CRUD for `Paciente` nodes keyed on `(nome, sobrenome)`.

use clinica_core::error::Result;
use clinica_core::{ClinicaError, Outcome, Paciente};

use crate::client::GraphError;
use crate::statement::{single_count, CypherGateway, Record, Statement};

const ENTITY: &str = "Paciente";

pub struct PacienteManager<G> {
    gateway: G,
}

impl<G: CypherGateway> PacienteManager<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    /// Insert a Paciente. No existence check: the same `(nome, sobrenome)`
    /// pair may be created twice.
    pub async fn create(&self, nome: &str, sobrenome: &str) -> Result<Outcome> {
        let q = Statement::new(
            "paciente.create",
            "CREATE (p:Paciente {nome: $nome, sobrenome: $sobrenome})
             RETURN p.nome AS nome, p.sobrenome AS sobrenome",
        )
        .param("nome", nome)
        .param("sobrenome", sobrenome)
        .returning(&["nome", "sobrenome"]);

        self.gateway.execute(q).await?;
        tracing::info!(nome, sobrenome, "Paciente created");
        Ok(Outcome::Created)
    }

    pub async fn list(&self) -> Result<Vec<Paciente>> {
        let q = Statement::new(
            "paciente.list",
            "MATCH (p:Paciente)
             RETURN p.nome AS nome, p.sobrenome AS sobrenome",
        )
        .returning(&["nome", "sobrenome"]);

        let rows = self.gateway.execute(q).await?;
        let pacientes = rows
            .iter()
            .map(paciente_from_record)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(pacientes)
    }

    pub async fn get_by_name_and_surname(&self, nome: &str, sobrenome: &str) -> Result<Paciente> {
        let q = Statement::new(
            "paciente.get",
            "MATCH (p:Paciente {nome: $nome, sobrenome: $sobrenome})
             RETURN p.nome AS nome, p.sobrenome AS sobrenome",
        )
        .param("nome", nome)
        .param("sobrenome", sobrenome)
        .returning(&["nome", "sobrenome"]);

        let rows = self.gateway.execute(q).await?;
        match rows.as_slice() {
            [] => Err(ClinicaError::not_found(ENTITY, composite_key(nome, sobrenome))),
            [row] => Ok(paciente_from_record(row)?),
            _ => Err(ClinicaError::Ambiguous {
                entity: ENTITY,
                key: composite_key(nome, sobrenome),
                count: rows.len(),
            }),
        }
    }

    /// Set both key fields on every Paciente matching the old pair.
    /// `NotFound` when nothing matched.
    pub async fn rename(
        &self,
        old_nome: &str,
        old_sobrenome: &str,
        new_nome: &str,
        new_sobrenome: &str,
    ) -> Result<Outcome> {
        let q = Statement::new(
            "paciente.rename",
            "MATCH (p:Paciente {nome: $old_nome, sobrenome: $old_sobrenome})
             SET p.nome = $new_nome, p.sobrenome = $new_sobrenome
             RETURN count(p) AS updated",
        )
        .param("old_nome", old_nome)
        .param("old_sobrenome", old_sobrenome)
        .param("new_nome", new_nome)
        .param("new_sobrenome", new_sobrenome)
        .returning(&["updated"]);

        let rows = self.gateway.execute(q).await?;
        let updated = single_count(&rows, "updated")?;
        if updated == 0 {
            return Err(ClinicaError::not_found(
                ENTITY,
                composite_key(old_nome, old_sobrenome),
            ));
        }
        tracing::info!(old_nome, old_sobrenome, new_nome, new_sobrenome, updated, "Paciente renamed");
        Ok(Outcome::Updated)
    }

    /// Detach-delete the Paciente. Succeeds on zero matches.
    pub async fn delete(&self, nome: &str, sobrenome: &str) -> Result<Outcome> {
        let q = Statement::new(
            "paciente.delete",
            "MATCH (p:Paciente {nome: $nome, sobrenome: $sobrenome})
             DETACH DELETE p
             RETURN count(p) AS removed",
        )
        .param("nome", nome)
        .param("sobrenome", sobrenome)
        .returning(&["removed"]);

        let rows = self.gateway.execute(q).await?;
        let removed = single_count(&rows, "removed")?;
        tracing::info!(nome, sobrenome, removed, "Paciente removed");
        Ok(Outcome::Removed)
    }
}

fn composite_key(nome: &str, sobrenome: &str) -> String {
    format!("{nome} {sobrenome}")
}

fn paciente_from_record(row: &Record) -> std::result::Result<Paciente, GraphError> {
    Ok(Paciente {
        nome: row.require_text("nome")?,
        sobrenome: row.text("sobrenome")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryGraph;

    fn manager() -> (MemoryGraph, PacienteManager<MemoryGraph>) {
        let graph = MemoryGraph::new();
        (graph.clone(), PacienteManager::new(graph))
    }

    #[tokio::test]
    async fn create_get_and_list() {
        let (_, pacientes) = manager();
        assert_eq!(pacientes.create("Joao", "Silva").await, Ok(Outcome::Created));
        pacientes.create("Maria", "Souza").await.unwrap();

        let joao = pacientes.get_by_name_and_surname("Joao", "Silva").await.unwrap();
        assert_eq!(joao, Paciente::new("Joao", "Silva"));
        assert_eq!(pacientes.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn lookup_keys_on_both_fields() {
        let (_, pacientes) = manager();
        pacientes.create("Joao", "Silva").await.unwrap();

        let err = pacientes
            .get_by_name_and_surname("Joao", "Souza")
            .await
            .unwrap_err();
        assert_eq!(err, ClinicaError::not_found("Paciente", "Joao Souza"));
    }

    #[tokio::test]
    async fn create_does_not_check_for_duplicates() {
        // Legacy behaviour kept: unlike Medico, a repeated pair is inserted again.
        let (graph, pacientes) = manager();
        pacientes.create("Joao", "Silva").await.unwrap();
        pacientes.create("Joao", "Silva").await.unwrap();

        assert_eq!(graph.paciente_count("Joao"), 2);
        let err = pacientes
            .get_by_name_and_surname("Joao", "Silva")
            .await
            .unwrap_err();
        assert!(matches!(err, ClinicaError::Ambiguous { count: 2, .. }));
    }

    #[tokio::test]
    async fn rename_moves_the_composite_key() {
        let (_, pacientes) = manager();
        pacientes.create("Joao", "Silva").await.unwrap();

        let outcome = pacientes.rename("Joao", "Silva", "Joao", "Santos").await;
        assert_eq!(outcome, Ok(Outcome::Updated));
        assert!(pacientes.get_by_name_and_surname("Joao", "Silva").await.is_err());
        assert_eq!(
            pacientes.get_by_name_and_surname("Joao", "Santos").await.unwrap(),
            Paciente::new("Joao", "Santos")
        );
    }

    #[tokio::test]
    async fn rename_of_unknown_patient_is_not_found() {
        // Deviation from legacy behaviour, which reported success on zero matches.
        let (_, pacientes) = manager();
        let err = pacientes
            .rename("Ninguem", "Nada", "Alguem", "Algo")
            .await
            .unwrap_err();
        assert_eq!(err, ClinicaError::not_found("Paciente", "Ninguem Nada"));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (graph, pacientes) = manager();
        pacientes.create("Joao", "Silva").await.unwrap();

        assert_eq!(pacientes.delete("Joao", "Silva").await, Ok(Outcome::Removed));
        assert_eq!(pacientes.delete("Joao", "Silva").await, Ok(Outcome::Removed));
        assert_eq!(graph.paciente_count("Joao"), 0);
    }
}
