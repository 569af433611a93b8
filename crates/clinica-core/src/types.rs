//! Domain records for the clinical graph.
//!
//! Field names match the property keys stored on the Neo4j nodes and
//! relationships, so records serialize the same way they are persisted.

use serde::{Deserialize, Serialize};

// ── Node Records ──────────────────────────────────────────────────

/// A physician. Label `Medico`, unique on `nome`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Medico {
    pub nome: String,
    /// Plaintext credential. Legacy records may lack it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub senha: Option<String>,
}

impl Medico {
    pub fn new(nome: impl Into<String>, senha: impl Into<String>) -> Self {
        Self {
            nome: nome.into(),
            senha: Some(senha.into()),
        }
    }
}

/// A patient. Label `Paciente`, identified by the `(nome, sobrenome)` pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Paciente {
    pub nome: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sobrenome: Option<String>,
}

impl Paciente {
    pub fn new(nome: impl Into<String>, sobrenome: impl Into<String>) -> Self {
        Self {
            nome: nome.into(),
            sobrenome: Some(sobrenome.into()),
        }
    }
}

// ── Relationship Records ──────────────────────────────────────────

/// One PRESCREVE edge, flattened to the names of its endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Prescricao {
    pub paciente: String,
    pub medico: String,
    pub descricao: String,
}

impl Prescricao {
    pub fn new(
        paciente: impl Into<String>,
        medico: impl Into<String>,
        descricao: impl Into<String>,
    ) -> Self {
        Self {
            paciente: paciente.into(),
            medico: medico.into(),
            descricao: descricao.into(),
        }
    }
}

// ── Outcomes ──────────────────────────────────────────────────────

/// Successful result of a write or credential operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Authenticated,
    Created,
    Updated,
    Removed,
    Linked,
}

impl Outcome {
    /// Status code a transport should answer with. Every outcome is a success.
    pub fn status_code(&self) -> u16 {
        200
    }

    /// Human-readable confirmation for the given entity kind.
    pub fn message(&self, entity: &str) -> String {
        match self {
            Self::Authenticated => "Login successful".to_string(),
            Self::Created => format!("{entity} created"),
            Self::Updated => format!("{entity} updated"),
            Self::Removed => format!("{entity} removed"),
            Self::Linked => format!("{entity} linked"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn medico_without_senha_omits_field() {
        let medico = Medico {
            nome: "Ana".to_string(),
            senha: None,
        };
        let json = serde_json::to_string(&medico).unwrap();
        assert_eq!(json, r#"{"nome":"Ana"}"#);

        let parsed: Medico = serde_json::from_str(r#"{"nome":"Ana"}"#).unwrap();
        assert_eq!(parsed, medico);
    }

    #[test]
    fn prescricao_field_names() {
        let p = Prescricao::new("Joao", "Ana", "Tomar 2x/dia");
        let value = serde_json::to_value(&p).unwrap();
        assert_eq!(value["paciente"], "Joao");
        assert_eq!(value["medico"], "Ana");
        assert_eq!(value["descricao"], "Tomar 2x/dia");
    }

    #[test]
    fn outcome_serializes_snake_case() {
        let json = serde_json::to_string(&Outcome::Authenticated).unwrap();
        assert_eq!(json, "\"authenticated\"");
        assert_eq!(Outcome::Linked.message("Prescricao"), "Prescricao linked");
        assert_eq!(Outcome::Removed.status_code(), 200);
    }
}
