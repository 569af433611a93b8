//! Physician manager: CRUD and credential check for `Medico` nodes.
//!
//! Credentials are stored and compared as plaintext, exactly as the
//! existing data holds them.

use clinica_core::error::Result;
use clinica_core::{ClinicaError, Medico, Outcome};

use crate::client::GraphError;
use crate::statement::{single_count, CypherGateway, Record, Statement};

const ENTITY: &str = "Medico";

pub struct MedicoManager<G> {
    gateway: G,
}

impl<G: CypherGateway> MedicoManager<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    /// Succeeds iff exactly one Medico has this `(nome, senha)` pair.
    pub async fn login(&self, nome: &str, senha: &str) -> Result<Outcome> {
        let q = Statement::new(
            "medico.login",
            "MATCH (m:Medico {nome: $nome, senha: $senha})
             RETURN m.nome AS nome",
        )
        .param("nome", nome)
        .param("senha", senha)
        .returning(&["nome"]);

        let rows = self.gateway.execute(q).await?;
        match rows.len() {
            0 => {
                tracing::info!(nome, "Login rejected");
                Err(ClinicaError::Unauthorized)
            }
            1 => Ok(Outcome::Authenticated),
            count => Err(ClinicaError::Ambiguous {
                entity: ENTITY,
                key: nome.to_string(),
                count,
            }),
        }
    }

    /// Create a Medico unless one with the same `nome` exists.
    ///
    /// The existence check and the insert are a single statement; the
    /// store's uniqueness constraint turns a concurrent duplicate into a
    /// constraint violation, reported here as `Conflict`.
    pub async fn create(&self, nome: &str, senha: &str) -> Result<Outcome> {
        let q = Statement::new(
            "medico.create",
            "OPTIONAL MATCH (existing:Medico {nome: $nome})
             WITH count(existing) AS found
             WHERE found = 0
             CREATE (m:Medico {nome: $nome, senha: $senha})
             RETURN m.nome AS nome",
        )
        .param("nome", nome)
        .param("senha", senha)
        .returning(&["nome"]);

        let rows = match self.gateway.execute(q).await {
            Ok(rows) => rows,
            Err(GraphError::ConstraintViolation(_)) => {
                return Err(ClinicaError::conflict(ENTITY, nome))
            }
            Err(e) => return Err(e.into()),
        };

        if rows.is_empty() {
            return Err(ClinicaError::conflict(ENTITY, nome));
        }
        tracing::info!(nome, "Medico created");
        Ok(Outcome::Created)
    }

    pub async fn list(&self) -> Result<Vec<Medico>> {
        let q = Statement::new(
            "medico.list",
            "MATCH (m:Medico)
             RETURN m.nome AS nome, m.senha AS senha",
        )
        .returning(&["nome", "senha"]);

        let rows = self.gateway.execute(q).await?;
        let medicos = rows
            .iter()
            .map(medico_from_record)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(medicos)
    }

    pub async fn get_by_name(&self, nome: &str) -> Result<Medico> {
        let q = Statement::new(
            "medico.get",
            "MATCH (m:Medico {nome: $nome})
             RETURN m.nome AS nome, m.senha AS senha",
        )
        .param("nome", nome)
        .returning(&["nome", "senha"]);

        let rows = self.gateway.execute(q).await?;
        match rows.as_slice() {
            [] => Err(ClinicaError::not_found(ENTITY, nome)),
            [row] => Ok(medico_from_record(row)?),
            _ => Err(ClinicaError::Ambiguous {
                entity: ENTITY,
                key: nome.to_string(),
                count: rows.len(),
            }),
        }
    }

    pub async fn update_password(&self, nome: &str, senha: &str) -> Result<Outcome> {
        let q = Statement::new(
            "medico.update_senha",
            "MATCH (m:Medico {nome: $nome})
             SET m.senha = $senha
             RETURN m.nome AS nome",
        )
        .param("nome", nome)
        .param("senha", senha)
        .returning(&["nome"]);

        let rows = self.gateway.execute(q).await?;
        if rows.is_empty() {
            return Err(ClinicaError::not_found(ENTITY, nome));
        }
        tracing::info!(nome, "Medico credential updated");
        Ok(Outcome::Updated)
    }

    /// Detach-delete every Medico named `nome`. Succeeds on zero matches.
    pub async fn delete(&self, nome: &str) -> Result<Outcome> {
        let q = Statement::new(
            "medico.delete",
            "MATCH (m:Medico {nome: $nome})
             DETACH DELETE m
             RETURN count(m) AS removed",
        )
        .param("nome", nome)
        .returning(&["removed"]);

        let rows = self.gateway.execute(q).await?;
        let removed = single_count(&rows, "removed")?;
        tracing::info!(nome, removed, "Medico removed");
        Ok(Outcome::Removed)
    }
}

fn medico_from_record(row: &Record) -> std::result::Result<Medico, GraphError> {
    Ok(Medico {
        nome: row.require_text("nome")?,
        senha: row.text("senha")?,
    })
}
