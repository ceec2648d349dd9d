//! In-memory record of query/answer exchanges within one run.

use serde::{Deserialize, Serialize};

/// One completed exchange. `answer` is `None` when generation failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exchange {
    pub query: String,
    pub answer: Option<String>,
    pub timestamp: String,
}

/// Exchange history owned by the caller and passed where needed.
///
/// Each batch run gets its own store; state never outlives the run and
/// two concurrent runs cannot see each other's exchanges.
#[derive(Debug, Default)]
pub struct SessionStore {
    exchanges: Vec<Exchange>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, query: impl Into<String>, answer: Option<String>) {
        self.exchanges.push(Exchange {
            query: query.into(),
            answer,
            timestamp: chrono::Utc::now().to_rfc3339(),
        });
    }

    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    pub fn last(&self) -> Option<&Exchange> {
        self.exchanges.last()
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_preserves_order() {
        let mut store = SessionStore::new();
        store.record("first", Some("a1".into()));
        store.record("second", None);

        assert_eq!(store.len(), 2);
        assert_eq!(store.exchanges()[0].query, "first");
        assert_eq!(store.last().unwrap().query, "second");
        assert!(store.last().unwrap().answer.is_none());
    }

    #[test]
    fn test_independent_stores() {
        let mut a = SessionStore::new();
        let b = SessionStore::new();
        a.record("only in a", Some("x".into()));
        assert_eq!(a.len(), 1);
        assert!(b.is_empty());
    }
}
