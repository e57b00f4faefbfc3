//! The passenger rail trip impact model.
//!
//! Nodes are listed from the goal down. Within a node, strategies run from the most
//! specific to the least; every chain that can end the request ends in a default
//! read from the `country/fallback` row.

use crate::compute::inputs::StrategyError;
use crate::ports::{Geocoder, ReferenceData, Router};
use crate::store::{ComplianceTag, Registry, Strategy, Value};
use std::sync::Arc;

pub const GOAL: &str = "carbon";

const FULL: [ComplianceTag; 3] = [ComplianceTag::GhgProtocolScope3, ComplianceTag::Iso, ComplianceTag::Tcr];
const FALLBACK_COUNTRY: &str = "fallback";
const DEFAULT_RAIL_CLASS: &str = "US average";

/// Builds the registry, binding every strategy to its collaborators.
pub fn build_registry(
    reference: Arc<dyn ReferenceData>,
    geocoder: Arc<dyn Geocoder>,
    router: Arc<dyn Router>,
) -> Registry {
    let mut reg = Registry::new();

    reg.register("carbon", vec![
        Strategy::new("from distance, co2 emission factor, date, and timeframe", |i, tf| {
            let on = i.date("date")?;
            if !tf.includes(on) {
                return Ok(Value::Number(0.0));
            }
            Ok(Value::Number(i.number("distance")? * i.number("co2_emission_factor")?))
        })
        .needs(["distance", "co2_emission_factor", "date"])
        .complies(FULL),
    ]);

    reg.register("co2_emission_factor", factor_chain(&reference, "co2_emission_factor", "rail_trip_co2_emission_factor"));
    reg.register("diesel_consumption", vec![product("from distance and diesel intensity", "distance", "diesel_intensity")]);
    reg.register("electricity_consumption", vec![product("from distance and electricity intensity", "distance", "electricity_intensity")]);
    reg.register("diesel_intensity", factor_chain(&reference, "diesel_intensity", "rail_trip_diesel_intensity"));
    reg.register("electricity_intensity", factor_chain(&reference, "electricity_intensity", "rail_trip_electricity_intensity"));

    let route = Arc::clone(&router);
    reg.register("distance", vec![
        Strategy::new("from distance estimate", |i, _| Ok(Value::Number(i.number("distance_estimate")?)))
            .needs(["distance_estimate"])
            .universal(),
        Strategy::new("from origin and destination locations", move |i, _| {
            let origin = i.location("origin_location")?;
            let destination = i.location("destination_location")?;
            Ok(Value::Number(route.distance_km(origin.coordinates, destination.coordinates)?))
        })
        .needs(["origin_location", "destination_location"])
        .complies(FULL),
        product("from duration and speed", "duration", "speed"),
        from_field("from country rail class", "country_rail_class", "trip_distance"),
        from_field("from country", "country", "rail_trip_distance"),
        // Below the country: without client input `rail_class` is the global average.
        from_field("from rail class", "rail_class", "distance").complies([ComplianceTag::GhgProtocolScope3]),
        fallback(&reference, "rail_trip_distance"),
    ]);

    reg.register("speed", vec![
        from_field("from country rail class", "country_rail_class", "speed"),
        from_field("from country", "country", "rail_speed"),
        from_field("from rail class", "rail_class", "speed"),
        fallback(&reference, "rail_speed"),
    ]);

    let data = Arc::clone(&reference);
    reg.register("rail_class", vec![
        Strategy::new("default", move |_, _| lookup(&*data, "rail_class", DEFAULT_RAIL_CLASS)).complies(FULL),
    ]);

    reg.register("country_rail_traction_class", vec![
        composite(&reference, "from country, rail traction, and rail class", "country_rail_traction_class", &["country", "rail_traction", "rail_class"]),
    ]);
    reg.register("country_rail_class", vec![
        composite(&reference, "from country and rail class", "country_rail_class", &["country", "rail_class"]),
    ]);
    reg.register("country_rail_traction", vec![
        composite(&reference, "from country and rail traction", "country_rail_traction", &["country", "rail_traction"]),
    ]);

    let by_code = Arc::clone(&reference);
    let by_company = Arc::clone(&reference);
    reg.register("country", vec![
        Strategy::new("from origin and destination locations", move |i, _| {
            let origin = i.location("origin_location")?;
            let destination = i.location("destination_location")?;
            if origin.country_code != destination.country_code {
                return Err(StrategyError::NoResult);
            }
            lookup(&*by_code, "country", &origin.country_code)
        })
        .needs(["origin_location", "destination_location"])
        .complies(FULL),
        Strategy::new("from rail company", move |i, _| {
            let company = i.record("rail_company")?;
            let code = company.text("country").ok_or(StrategyError::NoResult)?;
            lookup(&*by_company, "country", code)
        })
        .needs(["rail_company"])
        .complies(FULL),
    ]);

    reg.register("destination_location", vec![geocode(&geocoder, "from destination", "destination")]);
    reg.register("origin_location", vec![geocode(&geocoder, "from origin", "origin")]);

    reg.register("date", vec![
        Strategy::new("from timeframe", |_, tf| Ok(Value::Date(tf.from()))).complies(FULL),
    ]);

    tracing::info!(nodes = reg.count(), "rail trip registry built");
    reg
}

/// A missing row is an ordinary miss, not a failure.
fn lookup(reference: &dyn ReferenceData, category: &str, key: &str) -> Result<Value, StrategyError> {
    reference.lookup(category, key)?.map(Value::record).ok_or(StrategyError::NoResult)
}

fn from_field(label: &'static str, need: &'static str, field: &'static str) -> Strategy {
    Strategy::new(label, move |i, _| Ok(Value::Number(i.field(need, field)?)))
        .needs([need])
        .complies(FULL)
}

fn product(label: &'static str, a: &'static str, b: &'static str) -> Strategy {
    Strategy::new(label, move |i, _| Ok(Value::Number(i.number(a)? * i.number(b)?)))
        .needs([a, b])
        .complies(FULL)
}

fn fallback(reference: &Arc<dyn ReferenceData>, field: &'static str) -> Strategy {
    let data = Arc::clone(reference);
    Strategy::new("default", move |_, _| {
        let row = data
            .lookup("country", FALLBACK_COUNTRY)?
            .ok_or(StrategyError::NoResult)?;
        let n = row.number(field).ok_or_else(|| StrategyError::MissingField {
            category: row.category.clone(),
            key: row.key.clone(),
            field: field.to_string(),
        })?;
        Ok(Value::Number(n))
    })
    .complies(FULL)
}

/// Emission factor and fuel intensities share one fallback order.
fn factor_chain(reference: &Arc<dyn ReferenceData>, field: &'static str, country_field: &'static str) -> Vec<Strategy> {
    vec![
        from_field("from country rail traction rail class", "country_rail_traction_class", field),
        from_field("from rail company", "rail_company", field),
        from_field("from country rail class", "country_rail_class", field),
        from_field("from country rail traction", "country_rail_traction", field),
        from_field("from country", "country", country_field),
        fallback(reference, country_field),
    ]
}

/// Looks up a row keyed by its parents' keys joined with spaces, e.g. `US diesel intercity`.
fn composite(reference: &Arc<dyn ReferenceData>, label: &'static str, category: &'static str, parts: &'static [&'static str]) -> Strategy {
    let data = Arc::clone(reference);
    Strategy::new(label, move |i, _| {
        let keys = parts
            .iter()
            .map(|p| i.record(p).map(|r| r.key.as_str()))
            .collect::<Result<Vec<_>, _>>()?;
        lookup(&*data, category, &keys.join(" "))
    })
    .needs(parts.iter().copied())
    .complies(FULL)
}

fn geocode(geocoder: &Arc<dyn Geocoder>, label: &'static str, need: &'static str) -> Strategy {
    let geo = Arc::clone(geocoder);
    Strategy::new(label, move |i, _| Ok(Value::Location(geo.geocode(i.text(need)?)?)))
        .needs([need])
        .complies(FULL)
}
