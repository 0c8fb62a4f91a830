//! Parallel Query Evaluation
//!
//! Uses Rayon to evaluate independent queries over one shared document.
//! The document is only read, so any number of workers may share it.

use rayon::prelude::*;

use crate::dom::{Document, NodeId};
use crate::error::Error;

/// Evaluate multiple queries in parallel from the synthetic root.
/// Results come back in the order of `queries`.
pub fn evaluate_parallel(doc: &Document, queries: &[&str]) -> Vec<Result<Vec<NodeId>, Error>> {
    queries.par_iter().map(|query| doc.query(query)).collect()
}

/// Evaluate one query and map its nodes in parallel
pub fn query_map<F, T>(doc: &Document, query: &str, mapper: F) -> Result<Vec<T>, Error>
where
    F: Fn(NodeId) -> T + Sync + Send,
    T: Send,
{
    let nodes = doc.query(query)?;
    Ok(nodes.par_iter().map(|&n| mapper(n)).collect())
}

/// Parallel xmap - evaluate keyed queries and collect the results.
/// Fails if any query fails.
pub fn xmap(doc: &Document, queries: &[(&str, &str)]) -> Result<Vec<(String, Vec<NodeId>)>, Error> {
    queries
        .par_iter()
        .map(|(key, query)| doc.query(query).map(|nodes| (key.to_string(), nodes)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Document {
        Document::parse(b"<root><a/><b/><b/><c/></root>").unwrap()
    }

    #[test]
    fn test_parallel_eval() {
        let doc = fixture();
        let results = evaluate_parallel(&doc, &["//a", "//b", "//c", "//b[9]"]);
        assert_eq!(results.len(), 4);
        let counts: Vec<_> = results[..3].iter().map(|r| r.as_ref().unwrap().len()).collect();
        assert_eq!(counts, [1, 2, 1]);
        assert!(matches!(results[3], Err(Error::Evaluation(_))));
    }

    #[test]
    fn test_query_map() {
        let doc = fixture();
        let names = query_map(&doc, "/root/*", |id| doc.node_name(id).unwrap_or_default().to_string()).unwrap();
        assert_eq!(names, ["a", "b", "b", "c"]);
    }

    #[test]
    fn test_xmap() {
        let doc = fixture();
        let results = xmap(&doc, &[("first", "//a"), ("second", "//b")]).unwrap();
        assert_eq!(results[0], ("first".to_string(), doc.query("//a").unwrap()));
        assert_eq!(results[1].0, "second");
        assert_eq!(results[1].1.len(), 2);

        assert!(matches!(xmap(&doc, &[("bad", "//a!")]), Err(Error::Compile(_))));
    }
}
