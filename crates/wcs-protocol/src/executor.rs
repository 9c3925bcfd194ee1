//! Boundary to the array engine that runs RasQL queries.

use std::collections::HashMap;

use tracing::debug;

use wcps_common::{WcpsError, WcpsResult};

/// Raw result of one query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryResult {
    /// Encoded result (CSV text for `csv(..)` queries)
    pub data: Vec<u8>,

    /// Spatial domain of the result array, e.g. `[0:19,0:9]`, when reported
    pub sdom: Option<String>,
}

impl QueryResult {
    pub fn csv(text: impl Into<String>) -> Self {
        Self {
            data: text.into().into_bytes(),
            sdom: None,
        }
    }

    pub fn with_sdom(mut self, sdom: impl Into<String>) -> Self {
        self.sdom = Some(sdom.into());
        self
    }

    /// Result data as UTF-8 text.
    pub fn text(&self) -> WcpsResult<&str> {
        std::str::from_utf8(&self.data)
            .map_err(|e| WcpsError::QueryExecution(format!("result is not text: {}", e)))
    }
}

/// Runs query text against an array engine.
pub trait QueryExecutor: Send + Sync {
    fn execute(&self, rasql: &str) -> WcpsResult<QueryResult>;
}

/// Executor answering from canned results.
///
/// Queries are matched exactly; anything else gets the fallback result or
/// fails.
#[derive(Debug, Clone, Default)]
pub struct StaticQueryExecutor {
    results: HashMap<String, QueryResult>,
    fallback: Option<QueryResult>,
}

impl StaticQueryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_result(mut self, rasql: impl Into<String>, result: QueryResult) -> Self {
        self.results.insert(rasql.into(), result);
        self
    }

    pub fn with_fallback(mut self, result: QueryResult) -> Self {
        self.fallback = Some(result);
        self
    }
}

impl QueryExecutor for StaticQueryExecutor {
    fn execute(&self, rasql: &str) -> WcpsResult<QueryResult> {
        debug!(rasql, "executing query");
        self.results
            .get(rasql)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| WcpsError::QueryExecution(format!("no result for query: {}", rasql)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_before_fallback() {
        let executor = StaticQueryExecutor::new()
            .with_result("select csv(c) from rgb as c", QueryResult::csv("{1,2,3}"))
            .with_fallback(QueryResult::csv("0"));

        let hit = executor.execute("select csv(c) from rgb as c").unwrap();
        assert_eq!(hit.text().unwrap(), "{1,2,3}");
        let miss = executor.execute("select 1").unwrap();
        assert_eq!(miss.text().unwrap(), "0");
    }

    #[test]
    fn test_unknown_query_fails() {
        let err = StaticQueryExecutor::new().execute("select 1").unwrap_err();
        assert!(matches!(err, WcpsError::QueryExecution(_)));
    }
}
