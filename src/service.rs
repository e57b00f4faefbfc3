//! Composition root: one registry, the characterization and a record store behind
//! a request-shaped API.
//!
//! The registry is shared read-only between requests and replaced as a whole, so a
//! request always sees one consistent set of strategies.

use crate::compute::{resolve, Resolution, ResolutionError};
use crate::config::EngineConfig;
use crate::model::{build_registry, Characterization, CharacterizationError};
use crate::ports::{Geocoder, RawCharacteristics, RecordStore, ReferenceData, Router, StoreError};
use crate::store::compliance::{parse_set, UnknownTag};
use crate::store::{ComplianceSet, Registry, Timeframe, TimeframeError};
use crate::validation::{ValidationError, Validator};
use std::sync::{Arc, RwLock};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Characterization(#[from] CharacterizationError),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Timeframe(#[from] TimeframeError),
    #[error(transparent)]
    Compliance(#[from] UnknownTag),
    #[error("No record '{0}'")]
    RecordNotFound(String),
    #[error("Registry failed validation with {} error(s)", .0.len())]
    InvalidRegistry(Vec<ValidationError>),
    #[error("Registry lock poisoned")]
    Poisoned,
}

pub struct Collaborators {
    pub reference: Arc<dyn ReferenceData>,
    pub geocoder: Arc<dyn Geocoder>,
    pub router: Arc<dyn Router>,
    pub records: Arc<dyn RecordStore>,
}

pub struct ImpactService {
    registry: RwLock<Arc<Registry>>,
    records: Arc<dyn RecordStore>,
    characterization: Characterization,
    goal: String,
    default_compliance: ComplianceSet,
}

impl ImpactService {
    pub fn new(registry: Registry, records: Arc<dyn RecordStore>, characterization: Characterization) -> Self {
        Self {
            registry: RwLock::new(Arc::new(registry)),
            records,
            characterization,
            goal: crate::model::GOAL.to_string(),
            default_compliance: ComplianceSet::new(),
        }
    }

    /// Builds the rail trip registry and checks it before serving.
    pub fn from_config(config: &EngineConfig, collaborators: Collaborators) -> Result<Self, ServiceError> {
        let Collaborators { reference, geocoder, router, records } = collaborators;
        let registry = build_registry(Arc::clone(&reference), geocoder, router);
        let characterization = Characterization::rail_trip(reference);

        if config.validate_on_build {
            let validator = Validator::new(&registry).with_characteristics(characterization.names());
            validator.validate().map_err(ServiceError::InvalidRegistry)?;
            for finding in validator.lint() {
                tracing::debug!(node = %finding.node_name, kind = ?finding.error_type, "{}", finding.message);
            }
            tracing::info!(nodes = registry.count(), "registry validated");
        }

        let mut service = Self::new(registry, records, characterization);
        service.goal = config.goal.clone();
        service.default_compliance = config.compliance.clone();
        Ok(service)
    }

    pub fn goal(&self) -> &str { &self.goal }

    /// The registry current at the time of the call.
    pub fn registry(&self) -> Result<Arc<Registry>, ServiceError> {
        let guard = self.registry.read().map_err(|_| ServiceError::Poisoned)?;
        Ok(Arc::clone(&guard))
    }

    /// Swaps in a new registry. Requests already running finish on the old one.
    pub fn replace_registry(&self, registry: Registry) -> Result<(), ServiceError> {
        let mut guard = self.registry.write().map_err(|_| ServiceError::Poisoned)?;
        *guard = Arc::new(registry);
        tracing::info!(nodes = guard.count(), "registry replaced");
        Ok(())
    }

    /// Estimates the goal for one request.
    ///
    /// `compliance` falls back to the configured default and `timeframe` to the
    /// current calendar year.
    pub fn impact(
        &self,
        raw: &RawCharacteristics,
        compliance: Option<&ComplianceSet>,
        timeframe: Option<Timeframe>,
    ) -> Result<Resolution, ServiceError> {
        let characteristics = self.characterization.characterize(raw)?;
        let timeframe = match timeframe {
            Some(tf) => tf,
            None => Timeframe::current_year()?,
        };
        let required = compliance.unwrap_or(&self.default_compliance).clone();
        let registry = self.registry()?;

        let resolution = resolve(&registry, &self.goal, characteristics, required, timeframe)?;
        tracing::debug!(goal = %self.goal, %timeframe, resolved = resolution.is_resolved(), "impact computed");
        Ok(resolution)
    }

    /// Same as [`impact`](Self::impact) with the standards given by name, as a
    /// client sends them (`["iso", "tcr"]`).
    pub fn impact_complying_with(
        &self,
        raw: &RawCharacteristics,
        standards: &[&str],
        timeframe: Option<Timeframe>,
    ) -> Result<Resolution, ServiceError> {
        let required = parse_set(standards.iter().copied())?;
        self.impact(raw, Some(&required), timeframe)
    }

    pub fn impact_for_record(
        &self,
        id: &str,
        compliance: Option<&ComplianceSet>,
        timeframe: Option<Timeframe>,
    ) -> Result<Resolution, ServiceError> {
        let raw = self.records.load(id)?.ok_or_else(|| ServiceError::RecordNotFound(id.to_string()))?;
        self.impact(&raw, compliance, timeframe)
    }

    pub fn save_record(&self, id: &str, raw: &RawCharacteristics) -> Result<(), ServiceError> {
        self.records.save(id, raw)?;
        Ok(())
    }
}
