//! Parameterized Cypher statements, materialized result rows, and the
//! gateway seam every manager executes through.

use std::collections::BTreeMap;
use std::future::Future;

use crate::client::GraphError;

/// A named, parameterized Cypher statement.
///
/// Values are always bound as parameters, never spliced into the text.
/// `columns` lists the `RETURN ... AS` aliases the caller will read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub name: &'static str,
    pub cypher: &'static str,
    pub params: BTreeMap<&'static str, String>,
    pub columns: &'static [&'static str],
}

impl Statement {
    pub fn new(name: &'static str, cypher: &'static str) -> Self {
        Self {
            name,
            cypher,
            params: BTreeMap::new(),
            columns: &[],
        }
    }

    pub fn param(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.params.insert(key, value.into());
        self
    }

    pub fn returning(mut self, columns: &'static [&'static str]) -> Self {
        self.columns = columns;
        self
    }

    /// Bound parameter value, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Build the driver query with every parameter bound.
    pub fn to_query(&self) -> neo4rs::Query {
        self.params
            .iter()
            .fold(neo4rs::query(self.cypher), |q, (key, value)| {
                q.param(key, value.clone())
            })
    }
}

/// A single scalar read from a result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Text(String),
    Int(i64),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Option<String>> for Value {
    fn from(s: Option<String>) -> Self {
        s.map_or(Self::Null, Self::Text)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

/// One fully materialized result row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    values: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.values.insert(column.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, column: &str, value: Value) {
        self.values.insert(column.to_string(), value);
    }

    /// Optional text column. Missing columns and nulls both read as `None`.
    pub fn text(&self, column: &str) -> Result<Option<String>, GraphError> {
        match self.values.get(column) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Text(s)) => Ok(Some(s.clone())),
            Some(Value::Int(_)) => Err(GraphError::Serialization(format!(
                "Column {column} is an integer, expected text"
            ))),
        }
    }

    /// Text column that must be present and non-null.
    pub fn require_text(&self, column: &str) -> Result<String, GraphError> {
        self.text(column)?
            .ok_or_else(|| GraphError::Serialization(format!("Column {column} is missing")))
    }

    /// Integer column, typically a `count(...)`.
    pub fn int(&self, column: &str) -> Result<i64, GraphError> {
        match self.values.get(column) {
            Some(Value::Int(n)) => Ok(*n),
            _ => Err(GraphError::Serialization(format!(
                "Column {column} is missing or not an integer"
            ))),
        }
    }
}

/// Something that can execute a statement and hand back every result row.
///
/// Implementations acquire a connection, run exactly one statement, drain
/// the result eagerly, and release the connection on every exit path.
pub trait CypherGateway: Send + Sync {
    fn execute(
        &self,
        statement: Statement,
    ) -> impl Future<Output = Result<Vec<Record>, GraphError>> + Send;
}

/// Read a single `count(...)` row, treating an empty result as zero.
pub(crate) fn single_count(rows: &[Record], column: &str) -> Result<i64, GraphError> {
    match rows.first() {
        Some(row) => row.int(column),
        None => Ok(0),
    }
}
