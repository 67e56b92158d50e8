//! Query slice of the state container
//!
//! Holds the database connection state, the three append-only response
//! lists, and the set of uploaded documents. Lists grow for the lifetime of
//! the session; nothing is evicted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::api::{AgentData, DbData, DocData, UploadData};

/// One agent round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub id: Uuid,
    pub query: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

impl From<AgentData> for AgentRecord {
    fn from(data: AgentData) -> Self {
        Self {
            id: Uuid::new_v4(),
            query: data.query,
            response: data.response,
            timestamp: Utc::now(),
        }
    }
}

/// One database round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbRecord {
    pub id: Uuid,
    pub query: String,
    pub sql_query: Option<String>,
    pub raw_response: Option<Value>,
    pub natural_language_response: String,
    pub timestamp: DateTime<Utc>,
}

impl From<DbData> for DbRecord {
    fn from(data: DbData) -> Self {
        Self {
            id: Uuid::new_v4(),
            query: data.query,
            sql_query: data.sql_query,
            raw_response: data.raw_response,
            natural_language_response: data.natural_language_response,
            timestamp: Utc::now(),
        }
    }
}

/// One document round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocRecord {
    pub id: Uuid,
    pub query: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

impl From<DocData> for DocRecord {
    fn from(data: DocData) -> Self {
        Self {
            id: Uuid::new_v4(),
            query: data.query,
            response: data.response,
            timestamp: Utc::now(),
        }
    }
}

/// A document the backend accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedDocument {
    pub filename: String,
    pub role: Option<String>,
    pub uploaded_at: Option<String>,
}

impl From<UploadData> for UploadedDocument {
    fn from(data: UploadData) -> Self {
        Self {
            filename: data.filename,
            role: data.role,
            uploaded_at: data.timestamp,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryState {
    db_schema: Option<Value>,
    db_connected: bool,
    agent_records: Vec<AgentRecord>,
    db_records: Vec<DbRecord>,
    doc_records: Vec<DocRecord>,
    uploaded_docs: Vec<UploadedDocument>,
    loading: bool,
    error: Option<String>,
}

impl QueryState {
    // Getters

    pub fn is_database_connected(&self) -> bool {
        self.db_connected
    }

    pub fn database_schema(&self) -> Option<&Value> {
        self.db_schema.as_ref()
    }

    pub fn agent_records(&self) -> &[AgentRecord] {
        &self.agent_records
    }

    pub fn db_records(&self) -> &[DbRecord] {
        &self.db_records
    }

    pub fn doc_records(&self) -> &[DocRecord] {
        &self.doc_records
    }

    /// Uploaded documents in first-upload order, one entry per filename.
    pub fn uploaded_docs(&self) -> &[UploadedDocument] {
        &self.uploaded_docs
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    // Mutations

    /// Record a schema; a schema only arrives on a successful connect.
    pub fn set_db_schema(&mut self, schema: Value) {
        self.db_schema = Some(schema);
        self.db_connected = true;
    }

    pub fn set_db_connection(&mut self, connected: bool) {
        self.db_connected = connected;
    }

    pub fn add_agent_record(&mut self, record: AgentRecord) {
        self.agent_records.push(record);
    }

    pub fn add_db_record(&mut self, record: DbRecord) {
        self.db_records.push(record);
    }

    pub fn add_doc_record(&mut self, record: DocRecord) {
        self.doc_records.push(record);
    }

    /// Add a document unless one with the same filename is already listed.
    ///
    /// Returns `true` when the document was new.
    pub fn add_uploaded_doc(&mut self, doc: UploadedDocument) -> bool {
        if self.uploaded_docs.iter().any(|d| d.filename == doc.filename) {
            return false;
        }
        self.uploaded_docs.push(doc);
        true
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(name: &str) -> UploadedDocument {
        UploadedDocument {
            filename: name.to_string(),
            role: None,
            uploaded_at: None,
        }
    }

    #[test]
    fn test_set_db_schema_marks_connected() {
        let mut state = QueryState::default();
        assert!(!state.is_database_connected());
        state.set_db_schema(json!({"tables": ["employees"]}));
        assert!(state.is_database_connected());
        assert_eq!(state.database_schema(), Some(&json!({"tables": ["employees"]})));

        state.set_db_connection(false);
        assert!(!state.is_database_connected());
        assert!(state.database_schema().is_some());
    }

    #[test]
    fn test_records_keep_insertion_order() {
        let mut state = QueryState::default();
        for q in ["first", "second", "third"] {
            state.add_agent_record(AgentRecord::from(AgentData {
                query: q.to_string(),
                response: format!("re: {}", q),
            }));
        }
        let queries: Vec<_> = state.agent_records().iter().map(|r| r.query.as_str()).collect();
        assert_eq!(queries, ["first", "second", "third"]);
        assert!(state.db_records().is_empty());
        assert!(state.doc_records().is_empty());
    }

    #[test]
    fn test_records_get_distinct_ids() {
        let a = DocRecord::from(DocData {
            query: "q".into(),
            response: "r".into(),
        });
        let b = DocRecord::from(DocData {
            query: "q".into(),
            response: "r".into(),
        });
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_uploaded_docs_are_set_like() {
        let mut state = QueryState::default();
        assert!(state.add_uploaded_doc(doc("a.pdf")));
        assert!(state.add_uploaded_doc(doc("b.pdf")));
        assert!(!state.add_uploaded_doc(doc("a.pdf")));

        let names: Vec<_> = state.uploaded_docs().iter().map(|d| d.filename.as_str()).collect();
        assert_eq!(names, ["a.pdf", "b.pdf"]);
    }

    #[test]
    fn test_db_record_from_data() {
        let record = DbRecord::from(DbData {
            query: "headcount?".into(),
            sql_query: Some("SELECT COUNT(*) FROM employees".into()),
            raw_response: Some(json!({"columns": ["count"], "rows": [[42]]})),
            natural_language_response: "There are 42 employees.".into(),
        });
        assert_eq!(record.sql_query.as_deref(), Some("SELECT COUNT(*) FROM employees"));
        assert_eq!(record.natural_language_response, "There are 42 employees.");
    }
}
