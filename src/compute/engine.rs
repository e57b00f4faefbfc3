//! A synchronous, single-threaded resolution engine.
use super::context::ResolutionContext;
use super::inputs::{Inputs, StrategyError};
use super::ledger::{Ledger, Outcome, Provenance, ResolutionError};
use crate::store::{Characteristics, Compliance, ComplianceSet, Node, Registry, Timeframe};
use serde::Serialize;
use smallvec::SmallVec;

pub struct Resolver<'a> {
    registry: &'a Registry,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Resolves `name` to a value or to `Unavailable`, computing dependencies on demand.
    ///
    /// Each name is evaluated at most once per context; later requests hit the ledger.
    /// Re-entering a name that is still being resolved is a fatal `CircularDependency`.
    pub fn resolve(&self, name: &str, ctx: &mut ResolutionContext) -> Result<Outcome, ResolutionError> {
        // 1. Memoized.
        if let Some(outcome) = ctx.ledger.get(name) {
            return Ok(outcome.clone());
        }

        // 2. Re-entry means the registry contains a cycle reachable from this request.
        if let Some(pos) = ctx.reentry(name) {
            let mut path = ctx.in_progress[pos..].to_vec();
            path.push(name.to_string());
            tracing::warn!(cycle = %path.join(" -> "), "circular dependency");
            return Err(ResolutionError::CircularDependency { path });
        }

        // 3. Direct input always wins over strategy search.
        if let Some(value) = ctx.characteristics.get(name) {
            let outcome = Outcome::Resolved { value: value.clone(), provenance: Provenance::client_input() };
            ctx.ledger.insert(name, outcome.clone());
            return Ok(outcome);
        }

        // 4. Unknown names simply have no data.
        let Some(node) = self.registry.get(name) else {
            tracing::trace!(node = name, "no characteristic and no node");
            return Ok(Outcome::Unavailable);
        };

        // 5-6. Walk the strategies with `name` marked as in progress.
        ctx.in_progress.push(name.to_string());
        let result = self.deliberate(node, ctx);
        ctx.in_progress.pop();

        let outcome = result?;
        ctx.ledger.insert(name, outcome.clone());
        Ok(outcome)
    }

    fn deliberate(&self, node: &'a Node, ctx: &mut ResolutionContext) -> Result<Outcome, ResolutionError> {
        let timeframe = ctx.timeframe;

        'strategies: for strategy in node.strategies() {
            // a. Filter before touching needs: resolving a need may call out to a collaborator.
            if !strategy.compliance().satisfies(&ctx.required) {
                tracing::trace!(node = node.name(), strategy = strategy.label(), "skipped: not compliant");
                continue;
            }

            // b. Every need must resolve.
            let mut values = SmallVec::new();
            for need in strategy.need_names() {
                match self.resolve(need, ctx)? {
                    Outcome::Resolved { value, .. } => values.push((need.as_str(), value)),
                    Outcome::Unavailable => {
                        tracing::trace!(node = node.name(), strategy = strategy.label(), need = %need, "skipped: need unavailable");
                        continue 'strategies;
                    }
                }
            }

            // c. Run it; a strategy-level failure falls through to the next candidate.
            match strategy.invoke(&Inputs::new(values), &timeframe) {
                Ok(value) => {
                    tracing::debug!(node = node.name(), strategy = strategy.label(), %value, "resolved");
                    return Ok(Outcome::Resolved { value, provenance: Provenance::from_strategy(strategy) });
                }
                Err(StrategyError::Collaborator(source)) if source.is_fatal() => {
                    tracing::error!(node = node.name(), strategy = strategy.label(), error = %source, "collaborator misconfigured");
                    return Err(ResolutionError::Collaborator {
                        node: node.name().to_string(),
                        label: strategy.label().to_string(),
                        source,
                    });
                }
                Err(e) => {
                    tracing::debug!(node = node.name(), strategy = strategy.label(), error = %e, "strategy yielded nothing");
                }
            }
        }

        tracing::debug!(node = node.name(), "unavailable");
        Ok(Outcome::Unavailable)
    }
}

/// The answer to a top-level request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub goal: String,
    pub outcome: Outcome,
    /// Standards the whole derivation complies with; `None` when the goal is unavailable.
    pub compliance: Option<Compliance>,
    pub ledger: Ledger,
}

impl Resolution {
    pub fn from_context(goal: &str, outcome: Outcome, ctx: ResolutionContext) -> Self {
        let ledger = ctx.into_ledger();
        let compliance = ledger.derivation_compliance(goal);
        Self { goal: goal.to_string(), outcome, compliance, ledger }
    }

    pub fn is_resolved(&self) -> bool { self.outcome.is_resolved() }
}

/// One-shot resolution of `goal` with a fresh context.
pub fn resolve(
    registry: &Registry,
    goal: &str,
    characteristics: Characteristics,
    required: ComplianceSet,
    timeframe: Timeframe,
) -> Result<Resolution, ResolutionError> {
    let mut ctx = ResolutionContext::new(characteristics, timeframe, required);
    let outcome = Resolver::new(registry).resolve(goal, &mut ctx)?;
    Ok(Resolution::from_context(goal, outcome, ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::CollaboratorError;
    use crate::store::{ComplianceTag::*, Record, Strategy, Value};
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const FULL: [crate::store::ComplianceTag; 3] = [GhgProtocolScope3, Iso, Tcr];

    fn date(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }
    fn year_2010() -> Timeframe { Timeframe::year(2010).unwrap() }
    fn required(tags: &[crate::store::ComplianceTag]) -> ComplianceSet { tags.iter().copied().collect() }

    fn rail_class(key: &str, speed: f64, distance: f64) -> Value {
        Value::record(Record::new("rail_class", key).with("speed", speed).with("distance", distance))
    }

    /// A miniature rail-trip registry covering the fallback shapes the engine must handle.
    fn trip_registry() -> Registry {
        let mut reg = Registry::new();
        reg.register("carbon", vec![
            Strategy::new("from distance and date", |i, tf| {
                let on = i.date("date")?;
                Ok(Value::Number(if tf.includes(on) { i.number("distance")? * 0.1 } else { 0.0 }))
            })
            .needs(["distance", "date"])
            .complies(FULL),
        ]);
        reg.register("distance", vec![
            Strategy::new("from distance estimate", |i, _| Ok(Value::Number(i.number("distance_estimate")?)))
                .needs(["distance_estimate"])
                .universal(),
            Strategy::new("from duration and speed", |i, _| Ok(Value::Number(i.number("duration")? * i.number("speed")?)))
                .needs(["duration", "speed"])
                .complies(FULL),
            Strategy::new("from rail class", |i, _| Ok(Value::Number(i.field("rail_class", "distance")?)))
                .needs(["rail_class"])
                .complies([GhgProtocolScope3]),
        ]);
        reg.register("speed", vec![
            Strategy::new("from rail class", |i, _| Ok(Value::Number(i.field("rail_class", "speed")?)))
                .needs(["rail_class"])
                .complies(FULL),
        ]);
        reg.register("rail_class", vec![
            Strategy::new("default", |_, _| Ok(rail_class("US average", 50.0, 100.0))).complies(FULL),
        ]);
        reg.register("date", vec![
            Strategy::new("from timeframe", |_, tf| Ok(Value::Date(tf.from()))).complies(FULL),
        ]);
        reg
    }

    fn run(reg: &Registry, goal: &str, chars: Characteristics, req: ComplianceSet) -> Resolution {
        resolve(reg, goal, chars, req, year_2010()).unwrap()
    }

    fn label_of(res: &Resolution) -> &str {
        res.outcome.provenance().map(|p| p.label.as_str()).unwrap_or("<unavailable>")
    }

    #[test]
    fn test_scenario_a_distance_from_estimate() {
        let res = run(&trip_registry(), "distance", Characteristics::new().with("distance_estimate", 500.0), ComplianceSet::new());
        assert_eq!(res.outcome.number(), Some(500.0));
        assert_eq!(label_of(&res), "from distance estimate");
        assert_eq!(res.compliance, Some(Compliance::Universal));
    }

    #[test]
    fn test_scenario_b_distance_from_duration_and_rail_class_speed() {
        let chars = Characteristics::new()
            .with("duration", 2.0)
            .with("rail_class", rail_class("X", 120.0, 10.0));
        let res = run(&trip_registry(), "distance", chars, ComplianceSet::new());
        assert_eq!(res.outcome.number(), Some(240.0));
        assert_eq!(label_of(&res), "from duration and speed");
        assert_eq!(res.ledger.get("speed").and_then(Outcome::number), Some(120.0));
        // Strategy 1 was skipped for its missing need, which is never cached as a node.
        assert!(res.ledger.get("distance_estimate").is_none());
    }

    #[test]
    fn test_scenario_c_default_rail_class_feeds_dependents() {
        let reg = trip_registry();
        let res = run(&reg, "speed", Characteristics::new(), ComplianceSet::new());
        assert_eq!(res.outcome.number(), Some(50.0));
        let rc = res.ledger.get("rail_class").unwrap();
        assert_eq!(rc.provenance().unwrap().label, "default");
        assert_eq!(rc.value().and_then(Value::as_record).map(|r| r.key.as_str()), Some("US average"));

        let res = run(&reg, "distance", Characteristics::new(), ComplianceSet::new());
        assert_eq!(res.outcome.number(), Some(100.0));
        assert_eq!(label_of(&res), "from rail class");
    }

    #[test]
    fn test_scenario_d_compliance_excludes_only_satisfiable_strategy() {
        let res = run(&trip_registry(), "distance", Characteristics::new(), required(&[Iso]));
        assert_eq!(res.outcome, Outcome::Unavailable);
        assert_eq!(res.compliance, None);
    }

    #[test]
    fn test_scenario_e_outside_timeframe_is_resolved_zero() {
        let chars = Characteristics::new()
            .with("distance_estimate", 500.0)
            .with("date", date(2009, 5, 1));
        let res = run(&trip_registry(), "carbon", chars, ComplianceSet::new());
        assert!(res.is_resolved());
        assert_eq!(res.outcome.number(), Some(0.0));

        let chars = Characteristics::new()
            .with("distance_estimate", 500.0)
            .with("date", date(2010, 5, 1));
        let res = run(&trip_registry(), "carbon", chars, ComplianceSet::new());
        assert_eq!(res.outcome.number(), Some(50.0));
    }

    #[test]
    fn test_date_defaults_to_timeframe_start() {
        let res = run(&trip_registry(), "carbon", Characteristics::new().with("distance_estimate", 10.0), ComplianceSet::new());
        assert_eq!(res.ledger.get("date").and_then(Outcome::value), Some(&Value::Date(date(2010, 1, 1))));
        assert_eq!(res.outcome.number(), Some(1.0));
    }

    #[test]
    fn test_preference_ordering_invokes_only_first_satisfiable() {
        let calls: Arc<[AtomicUsize; 3]> = Arc::new(Default::default());
        let counted = |k: usize, n: f64| {
            let calls = calls.clone();
            move |_: &Inputs<'_>, _: &Timeframe| -> Result<Value, StrategyError> {
                calls[k].fetch_add(1, Ordering::SeqCst);
                Ok(Value::Number(n))
            }
        };
        let mut reg = Registry::new();
        reg.register("x", vec![
            Strategy::new("s1", counted(0, 1.0)).needs(["a"]),
            Strategy::new("s2", counted(1, 2.0)).needs(["b"]),
            Strategy::new("s3", counted(2, 3.0)),
        ]);
        let res = run(&reg, "x", Characteristics::new().with("b", 0.0), ComplianceSet::new());
        assert_eq!(res.outcome.number(), Some(2.0));
        assert_eq!(label_of(&res), "s2");
        let counts: Vec<usize> = calls.iter().map(|c| c.load(Ordering::SeqCst)).collect();
        assert_eq!(counts, vec![0, 1, 0]);
    }

    #[test]
    fn test_determinism() {
        let reg = trip_registry();
        let chars = Characteristics::new().with("duration", 3.0);
        let first = run(&reg, "carbon", chars.clone(), required(&[Iso]));
        for _ in 0..5 {
            assert_eq!(run(&reg, "carbon", chars.clone(), required(&[Iso])), first);
        }
    }

    #[test]
    fn test_cycle_is_fatal_and_reports_path() {
        let mut reg = Registry::new();
        reg.register("a", vec![Strategy::new("from b", |i, _| Ok(i.get("b")?.clone())).needs(["b"])]);
        reg.register("b", vec![Strategy::new("from a", |i, _| Ok(i.get("a")?.clone())).needs(["a"])]);

        let err = resolve(&reg, "a", Characteristics::new(), ComplianceSet::new(), year_2010()).unwrap_err();
        assert_eq!(err, ResolutionError::CircularDependency { path: vec!["a".into(), "b".into(), "a".into()] });
    }

    #[test]
    fn test_cycle_broken_by_characteristic() {
        let mut reg = Registry::new();
        reg.register("a", vec![Strategy::new("from b", |i, _| Ok(i.get("b")?.clone())).needs(["b"])]);
        reg.register("b", vec![Strategy::new("from a", |i, _| Ok(i.get("a")?.clone())).needs(["a"])]);
        let res = run(&reg, "a", Characteristics::new().with("b", 7.0), ComplianceSet::new());
        assert_eq!(res.outcome.number(), Some(7.0));
    }

    #[test]
    fn test_shared_dependency_computed_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut reg = Registry::new();
        reg.register("shared", vec![Strategy::new("default", move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Number(4.0))
        })]);
        reg.register("left", vec![
            // Fails after resolving `shared`, so the sibling strategy reuses the cached value.
            Strategy::new("picky", |_, _| Err(StrategyError::NoResult)).needs(["shared"]),
            Strategy::new("plain", |i, _| Ok(Value::Number(i.number("shared")? + 1.0))).needs(["shared"]),
        ]);
        reg.register("right", vec![Strategy::new("plain", |i, _| Ok(Value::Number(i.number("shared")? * 2.0))).needs(["shared"])]);
        reg.register("top", vec![Strategy::new("sum", |i, _| Ok(Value::Number(i.number("left")? + i.number("right")?))).needs(["left", "right"])]);

        let res = run(&reg, "top", Characteristics::new(), ComplianceSet::new());
        assert_eq!(res.outcome.number(), Some(13.0));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_noncompliant_strategy_never_touches_needs() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut reg = Registry::new();
        reg.register("remote", vec![Strategy::new("call out", move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Number(1.0))
        }).complies(FULL)]);
        reg.register("x", vec![
            Strategy::new("scope 3 only", |i, _| Ok(i.get("remote")?.clone())).needs(["remote"]).complies([GhgProtocolScope3]),
            Strategy::new("default", |_, _| Ok(Value::Number(0.5))).complies(FULL),
        ]);
        let res = run(&reg, "x", Characteristics::new(), required(&[Iso, Tcr]));
        assert_eq!(res.outcome.number(), Some(0.5));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(res.compliance, Some(Compliance::tags(FULL)));
    }

    #[test]
    fn test_collaborator_failure_falls_through() {
        let mut reg = Registry::new();
        reg.register("distance", vec![
            Strategy::new("from router", |_, _| Err(CollaboratorError::status("router", 601).into())),
            Strategy::new("default", |_, _| Ok(Value::Number(42.0))),
        ]);
        let res = run(&reg, "distance", Characteristics::new(), ComplianceSet::new());
        assert_eq!(res.outcome.number(), Some(42.0));
    }

    #[test]
    fn test_configuration_failure_is_fatal() {
        let mut reg = Registry::new();
        reg.register("distance", vec![
            Strategy::new("from router", |_, _| Err(CollaboratorError::unauthorized("router", "bad key").into())),
            Strategy::new("default", |_, _| Ok(Value::Number(42.0))),
        ]);
        let err = resolve(&reg, "distance", Characteristics::new(), ComplianceSet::new(), year_2010()).unwrap_err();
        assert!(matches!(err, ResolutionError::Collaborator { ref node, ref label, .. } if node == "distance" && label == "from router"));
    }

    #[test]
    fn test_unknown_node_is_unavailable_not_error() {
        let res = run(&Registry::new(), "anything", Characteristics::new(), ComplianceSet::new());
        assert_eq!(res.outcome, Outcome::Unavailable);
    }

    #[test]
    fn test_characteristic_short_circuits_strategies() {
        let mut reg = Registry::new();
        reg.register("speed", vec![Strategy::new("default", |_, _| Ok(Value::Number(1.0)))]);
        let res = run(&reg, "speed", Characteristics::new().with("speed", 99.0), required(&[Iso]));
        assert_eq!(res.outcome.number(), Some(99.0));
        assert!(res.outcome.provenance().unwrap().is_client_input());
    }

    #[test]
    fn test_context_reusable_across_goals() {
        let reg = trip_registry();
        let resolver = Resolver::new(&reg);
        let mut ctx = ResolutionContext::new(Characteristics::new().with("duration", 1.0), year_2010(), ComplianceSet::new());
        let distance = resolver.resolve("distance", &mut ctx).unwrap();
        let carbon = resolver.resolve("carbon", &mut ctx).unwrap();
        assert_eq!(distance.number(), Some(50.0));
        assert_eq!(carbon.number(), Some(5.0));
        assert!(ctx.in_progress.is_empty());
    }
}
