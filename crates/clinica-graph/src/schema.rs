//! Store-level schema bootstrap and health probe.

use crate::client::GraphError;
use crate::statement::{CypherGateway, Statement};

/// Install the uniqueness constraint on `Medico.nome`. Safe to run repeatedly.
///
/// Fails if the store already holds duplicate names; those must be resolved
/// by hand first.
pub async fn ensure_schema<G: CypherGateway>(gateway: &G) -> Result<(), GraphError> {
    let q = Statement::new(
        "schema.medico_nome_unique",
        "CREATE CONSTRAINT medico_nome_unique IF NOT EXISTS
         FOR (m:Medico) REQUIRE m.nome IS UNIQUE",
    );
    gateway.execute(q).await?;
    tracing::info!("Medico.nome uniqueness constraint in place");
    Ok(())
}

/// Round-trip a trivial statement to prove the store is reachable.
pub async fn verify_connectivity<G: CypherGateway>(gateway: &G) -> Result<(), GraphError> {
    let q = Statement::new("health.ping", "RETURN 1 AS ok").returning(&["ok"]);
    let rows = gateway.execute(q).await?;
    match rows.first().map(|row| row.int("ok")) {
        Some(Ok(1)) => Ok(()),
        _ => Err(GraphError::Serialization(
            "Unexpected response to connectivity probe".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryGraph;

    #[tokio::test]
    async fn schema_is_idempotent() {
        let graph = MemoryGraph::new();
        ensure_schema(&graph).await.unwrap();
        ensure_schema(&graph).await.unwrap();
        assert_eq!(
            graph.executed(),
            vec!["schema.medico_nome_unique", "schema.medico_nome_unique"]
        );
    }

    #[tokio::test]
    async fn ping_reports_store_failure() {
        let graph = MemoryGraph::new();
        verify_connectivity(&graph).await.unwrap();

        graph.fail_next(1, GraphError::Connection("refused".into()));
        assert!(verify_connectivity(&graph).await.is_err());
    }
}
