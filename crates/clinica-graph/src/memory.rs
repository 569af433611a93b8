//! In-process gateway that interprets the statements the managers issue.
//!
//! Holds Medico and Paciente nodes and PRESCREVE edges in memory and applies
//! each named statement with the same semantics the Cypher text has against
//! Neo4j: detach-delete, MERGE on the edge, conditional create, and the
//! `Medico.nome` uniqueness constraint once the schema is installed.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use clinica_core::{Medico, Paciente};

use crate::client::GraphError;
use crate::statement::{CypherGateway, Record, Statement};

type NodeKey = u64;

#[derive(Debug, Clone)]
struct Edge {
    medico: NodeKey,
    paciente: NodeKey,
    descricao: String,
}

#[derive(Debug, Default)]
struct State {
    next_key: NodeKey,
    medicos: Vec<(NodeKey, Medico)>,
    pacientes: Vec<(NodeKey, Paciente)>,
    edges: Vec<Edge>,
    medico_nome_unique: bool,
    racing_creates: usize,
    pending_failures: VecDeque<GraphError>,
    executed: Vec<&'static str>,
}

impl State {
    fn key(&mut self) -> NodeKey {
        self.next_key += 1;
        self.next_key
    }

    fn medico_keys(&self, nome: &str) -> Vec<NodeKey> {
        self.medicos
            .iter()
            .filter(|(_, m)| m.nome == nome)
            .map(|(k, _)| *k)
            .collect()
    }

    fn paciente_keys_by_nome(&self, nome: &str) -> Vec<NodeKey> {
        self.pacientes
            .iter()
            .filter(|(_, p)| p.nome == nome)
            .map(|(k, _)| *k)
            .collect()
    }

    fn medico_nome(&self, key: NodeKey) -> Option<&str> {
        self.medicos
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, m)| m.nome.as_str())
    }

    fn paciente_nome(&self, key: NodeKey) -> Option<&str> {
        self.pacientes
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, p)| p.nome.as_str())
    }

    fn detach(&mut self, keys: &[NodeKey]) {
        self.edges
            .retain(|e| !keys.contains(&e.medico) && !keys.contains(&e.paciente));
    }
}

/// In-memory `CypherGateway`. Clone shares the same store.
#[derive(Clone, Default)]
pub struct MemoryGraph {
    state: Arc<Mutex<State>>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` executions fail with `error` before touching the store.
    pub fn fail_next(&self, n: usize, error: GraphError) {
        if let Ok(mut state) = self.state.lock() {
            state.pending_failures.extend(std::iter::repeat(error).take(n));
        }
    }

    /// Let the next Medico create miss a concurrent writer's node in its
    /// existence check, as two overlapping transactions would. The write
    /// then succeeds unless the uniqueness constraint is installed.
    pub fn race_next_create(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.racing_creates += 1;
        }
    }

    /// Insert a node directly, bypassing every check. Used to model legacy records.
    pub fn seed_medico(&self, medico: Medico) {
        if let Ok(mut state) = self.state.lock() {
            let key = state.key();
            state.medicos.push((key, medico));
        }
    }

    /// Names of the statements executed so far, in order.
    pub fn executed(&self) -> Vec<&'static str> {
        self.state
            .lock()
            .map(|s| s.executed.clone())
            .unwrap_or_default()
    }

    pub fn medico_count(&self, nome: &str) -> usize {
        self.state
            .lock()
            .map(|s| s.medico_keys(nome).len())
            .unwrap_or_default()
    }

    pub fn paciente_count(&self, nome: &str) -> usize {
        self.state
            .lock()
            .map(|s| s.paciente_keys_by_nome(nome).len())
            .unwrap_or_default()
    }

    pub fn edge_count(&self) -> usize {
        self.state.lock().map(|s| s.edges.len()).unwrap_or_default()
    }

    fn apply(&self, stmt: &Statement) -> Result<Vec<Record>, GraphError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| GraphError::Connection("memory graph lock poisoned".to_string()))?;

        if let Some(error) = state.pending_failures.pop_front() {
            return Err(error);
        }
        state.executed.push(stmt.name);

        let p = |key: &str| -> Result<String, GraphError> {
            stmt.get(key)
                .map(str::to_string)
                .ok_or_else(|| GraphError::Query(format!("Expected parameter missing: ${key}")))
        };

        let rows = match stmt.name {
            "health.ping" => vec![Record::new().with("ok", 1i64)],

            "schema.medico_nome_unique" => {
                let mut names: Vec<&str> = state.medicos.iter().map(|(_, m)| m.nome.as_str()).collect();
                let total = names.len();
                names.sort_unstable();
                names.dedup();
                if names.len() != total {
                    return Err(GraphError::Query(
                        "Unable to create constraint: duplicate Medico.nome values".to_string(),
                    ));
                }
                state.medico_nome_unique = true;
                Vec::new()
            }

            // ── Medico ───────────────────────────────────────────────
            "medico.login" => {
                let (nome, senha) = (p("nome")?, p("senha")?);
                state
                    .medicos
                    .iter()
                    .filter(|(_, m)| m.nome == nome && m.senha.as_deref() == Some(senha.as_str()))
                    .map(|(_, m)| Record::new().with("nome", m.nome.as_str()))
                    .collect()
            }
            "medico.create" => {
                let (nome, senha) = (p("nome")?, p("senha")?);
                let exists = !state.medico_keys(&nome).is_empty();
                let raced = state.racing_creates > 0;
                if raced {
                    state.racing_creates -= 1;
                }
                if exists && !raced {
                    Vec::new()
                } else if exists && state.medico_nome_unique {
                    return Err(GraphError::ConstraintViolation(format!(
                        "Node already exists with label `Medico` and property `nome` = '{nome}'"
                    )));
                } else {
                    let key = state.key();
                    state.medicos.push((key, Medico::new(nome.as_str(), senha)));
                    vec![Record::new().with("nome", nome)]
                }
            }
            "medico.list" => state
                .medicos
                .iter()
                .map(|(_, m)| medico_record(m))
                .collect(),
            "medico.get" => {
                let nome = p("nome")?;
                state
                    .medicos
                    .iter()
                    .filter(|(_, m)| m.nome == nome)
                    .map(|(_, m)| medico_record(m))
                    .collect()
            }
            "medico.update_senha" => {
                let (nome, senha) = (p("nome")?, p("senha")?);
                let mut rows = Vec::new();
                for (_, m) in state.medicos.iter_mut().filter(|(_, m)| m.nome == nome) {
                    m.senha = Some(senha.clone());
                    rows.push(Record::new().with("nome", m.nome.as_str()));
                }
                rows
            }
            "medico.delete" => {
                let nome = p("nome")?;
                let keys = state.medico_keys(&nome);
                state.detach(&keys);
                state.medicos.retain(|(k, _)| !keys.contains(k));
                vec![Record::new().with("removed", keys.len() as i64)]
            }

            // ── Paciente ─────────────────────────────────────────────
            "paciente.create" => {
                let (nome, sobrenome) = (p("nome")?, p("sobrenome")?);
                let key = state.key();
                state
                    .pacientes
                    .push((key, Paciente::new(nome.as_str(), sobrenome.as_str())));
                vec![Record::new().with("nome", nome).with("sobrenome", sobrenome)]
            }
            "paciente.list" => state
                .pacientes
                .iter()
                .map(|(_, p)| paciente_record(p))
                .collect(),
            "paciente.get" => {
                let (nome, sobrenome) = (p("nome")?, p("sobrenome")?);
                state
                    .pacientes
                    .iter()
                    .filter(|(_, p)| is_paciente(p, &nome, &sobrenome))
                    .map(|(_, p)| paciente_record(p))
                    .collect()
            }
            "paciente.rename" => {
                let (old_nome, old_sobrenome) = (p("old_nome")?, p("old_sobrenome")?);
                let (new_nome, new_sobrenome) = (p("new_nome")?, p("new_sobrenome")?);
                let mut updated = 0i64;
                for (_, pac) in state
                    .pacientes
                    .iter_mut()
                    .filter(|(_, pac)| is_paciente(pac, &old_nome, &old_sobrenome))
                {
                    pac.nome = new_nome.clone();
                    pac.sobrenome = Some(new_sobrenome.clone());
                    updated += 1;
                }
                vec![Record::new().with("updated", updated)]
            }
            "paciente.delete" => {
                let (nome, sobrenome) = (p("nome")?, p("sobrenome")?);
                let keys: Vec<NodeKey> = state
                    .pacientes
                    .iter()
                    .filter(|(_, pac)| is_paciente(pac, &nome, &sobrenome))
                    .map(|(k, _)| *k)
                    .collect();
                state.detach(&keys);
                state.pacientes.retain(|(k, _)| !keys.contains(k));
                vec![Record::new().with("removed", keys.len() as i64)]
            }

            // ── Prescricao ───────────────────────────────────────────
            "prescricao.link" => {
                let (medico, paciente, descricao) =
                    (p("medico")?, p("paciente")?, p("descricao")?);
                let medicos = state.medico_keys(&medico);
                let pacientes = state.paciente_keys_by_nome(&paciente);
                let mut linked = 0i64;
                for &m in &medicos {
                    for &pk in &pacientes {
                        let existing = state
                            .edges
                            .iter()
                            .position(|e| e.medico == m && e.paciente == pk);
                        match existing {
                            Some(i) => state.edges[i].descricao = descricao.clone(),
                            None => state.edges.push(Edge {
                                medico: m,
                                paciente: pk,
                                descricao: descricao.clone(),
                            }),
                        }
                        linked += 1;
                    }
                }
                vec![Record::new().with("linked", linked)]
            }
            "prescricao.endpoints" => {
                let (medico, paciente) = (p("medico")?, p("paciente")?);
                vec![Record::new()
                    .with("medicos", state.medico_keys(&medico).len() as i64)
                    .with("pacientes", state.paciente_keys_by_nome(&paciente).len() as i64)]
            }
            "prescricao.list" => state
                .edges
                .iter()
                .filter_map(|e| {
                    let paciente = state.paciente_nome(e.paciente)?;
                    let medico = state.medico_nome(e.medico)?;
                    Some(
                        Record::new()
                            .with("paciente", paciente)
                            .with("medico", medico)
                            .with("descricao", e.descricao.as_str()),
                    )
                })
                .collect(),
            "prescricao.update" => {
                let (medico, paciente, descricao) =
                    (p("medico")?, p("paciente")?, p("descricao")?);
                let medicos = state.medico_keys(&medico);
                let pacientes = state.paciente_keys_by_nome(&paciente);
                let mut updated = 0i64;
                for edge in state
                    .edges
                    .iter_mut()
                    .filter(|e| medicos.contains(&e.medico) && pacientes.contains(&e.paciente))
                {
                    edge.descricao = descricao.clone();
                    updated += 1;
                }
                vec![Record::new().with("updated", updated)]
            }

            other => {
                return Err(GraphError::Query(format!(
                    "Statement not supported by the in-memory graph: {other}"
                )))
            }
        };

        Ok(rows)
    }
}

impl CypherGateway for MemoryGraph {
    async fn execute(&self, statement: Statement) -> Result<Vec<Record>, GraphError> {
        self.apply(&statement)
    }
}

fn medico_record(m: &Medico) -> Record {
    Record::new()
        .with("nome", m.nome.as_str())
        .with("senha", m.senha.clone())
}

fn paciente_record(p: &Paciente) -> Record {
    Record::new()
        .with("nome", p.nome.as_str())
        .with("sobrenome", p.sobrenome.clone())
}

fn is_paciente(p: &Paciente, nome: &str, sobrenome: &str) -> bool {
    p.nome == nome && p.sobrenome.as_deref() == Some(sobrenome)
}
