//! batch.rs
//! Parallel evaluation of independent requests against one shared registry.

use super::engine::{resolve, Resolution};
use super::ledger::ResolutionError;
use crate::store::{Characteristics, ComplianceSet, Registry, Timeframe};
use rayon::prelude::*;

/// One independent resolution request.
#[derive(Debug, Clone)]
pub struct Request {
    pub characteristics: Characteristics,
    pub compliance: ComplianceSet,
    pub timeframe: Timeframe,
}

impl Request {
    pub fn new(characteristics: Characteristics, timeframe: Timeframe) -> Self {
        Self { characteristics, compliance: ComplianceSet::new(), timeframe }
    }

    pub fn requiring(mut self, compliance: ComplianceSet) -> Self {
        self.compliance = compliance;
        self
    }
}

/// Resolves `goal` for every request, results in input order.
///
/// Each request gets its own context; only the registry is shared. A fatal error
/// in one request does not affect the others.
pub fn resolve_all(registry: &Registry, goal: &str, requests: &[Request]) -> Vec<Result<Resolution, ResolutionError>> {
    tracing::debug!(goal, requests = requests.len(), "batch resolution");
    requests
        .par_iter()
        .map(|req| resolve(registry, goal, req.characteristics.clone(), req.compliance.clone(), req.timeframe))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ComplianceTag, Strategy, Value};

    fn registry() -> Registry {
        let mut reg = Registry::new();
        reg.register("distance", vec![
            Strategy::new("from estimate", |i, _| Ok(Value::Number(i.number("distance_estimate")?)))
                .needs(["distance_estimate"])
                .universal(),
            Strategy::new("default", |_, _| Ok(Value::Number(80.0))).complies([ComplianceTag::GhgProtocolScope3]),
        ]);
        reg.register("loop", vec![Strategy::new("self", |i, _| Ok(i.get("loop")?.clone())).needs(["loop"])]);
        reg
    }

    #[test]
    fn test_results_keep_input_order() {
        let reg = registry();
        let tf = Timeframe::year(2011).unwrap();
        let requests: Vec<Request> = (0..64)
            .map(|n| Request::new(Characteristics::new().with("distance_estimate", n as f64), tf))
            .collect();

        let results = resolve_all(&reg, "distance", &requests);
        assert_eq!(results.len(), 64);
        for (n, res) in results.into_iter().enumerate() {
            assert_eq!(res.unwrap().outcome.number(), Some(n as f64));
        }
    }

    #[test]
    fn test_requests_are_isolated() {
        let reg = registry();
        let tf = Timeframe::year(2011).unwrap();
        let strict: ComplianceSet = [ComplianceTag::Iso].into_iter().collect();
        let requests = vec![
            Request::new(Characteristics::new(), tf),
            Request::new(Characteristics::new(), tf).requiring(strict),
        ];
        let results = resolve_all(&reg, "distance", &requests);
        assert_eq!(results[0].as_ref().unwrap().outcome.number(), Some(80.0));
        assert!(!results[1].as_ref().unwrap().is_resolved());

        let failing = resolve_all(&reg, "loop", &requests[..1]);
        assert!(matches!(failing[0], Err(ResolutionError::CircularDependency { .. })));
    }
}
