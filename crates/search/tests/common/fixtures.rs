//! Resource and request fixtures.

use std::sync::Arc;

use serde_json::{Value, json};

use helios_search::SearchConfig;
use helios_search::paging::{ListMatchProvider, MatchProvider, RequestContext};

/// Server base used by every fixture.
pub const SERVER_BASE: &str = "http://example.com/fhir";

/// Creates `n` patients with ids `p0..p{n-1}`.
pub fn patients(n: usize) -> Vec<Value> {
    (0..n).map(|i| patient(format!("p{}", i))).collect()
}

/// Creates a patient with the given id.
pub fn patient(id: impl Into<String>) -> Value {
    json!({
        "resourceType": "Patient",
        "id": id.into(),
        "name": [{"family": "Smith"}]
    })
}

/// Creates an OperationOutcome without an id.
pub fn operation_outcome() -> Value {
    json!({
        "resourceType": "OperationOutcome",
        "issue": [{"severity": "information", "code": "informational"}]
    })
}

/// Wraps resources in a provider with a known size.
pub fn provider(resources: Vec<Value>) -> Arc<dyn MatchProvider> {
    Arc::new(ListMatchProvider::new(resources))
}

/// A request context for a Patient search.
pub fn patient_context() -> RequestContext {
    RequestContext::new(SERVER_BASE, "Patient").with_parameter("name", "smith")
}

/// The self link matching [`patient_context`].
pub fn patient_self_link() -> String {
    format!("{}/Patient?name=smith", SERVER_BASE)
}

/// Configuration using literal identity predicates.
pub fn literal_config() -> SearchConfig {
    SearchConfig {
        disable_hash_based_searches: true,
        ..Default::default()
    }
}

/// Extracts the `id` of each resource.
pub fn ids(resources: &[Value]) -> Vec<String> {
    resources
        .iter()
        .filter_map(|r| r.get("id").and_then(Value::as_str).map(String::from))
        .collect()
}
