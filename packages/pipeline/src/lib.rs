#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Address enrichment of building footprints.
//!
//! A run takes the selected buildings and:
//!
//! 1. Drops features that are not enrichable (open rings, disqualifying
//!    tags, complete addresses).
//! 2. Builds the padded working envelope over the rest and prefetches the
//!    parcels inside it.
//! 3. Resolves the city from municipal boundaries, once per run or per
//!    building.
//! 4. Per building, matches a parcel, resolves its street against the road
//!    dataset, and commits the merged address tags as one change.
//!
//! Buildings that fail resolution are skipped with a diagnostic (and a
//! review marker tag); only an empty selection, a missing municipality in
//! per-run mode, or a collaborator failure aborts the run.

pub mod city;
pub mod collaborators;
pub mod config;
pub mod eligibility;
pub mod merge;
pub mod progress;

use building_address_models::{
    Feature, FeatureKind, MunicipalityMode, ParcelView, PipelineConfig, RunReport, SkipReason,
};
use building_address_spatial::{Envelope, MunicipalityResolver, match_parcel, working_envelope};
use building_address_store::{FeatureSource, Predicate, QueryError};
use building_address_street::{StreetAddress, StreetCache, StreetResolver};

pub use collaborators::{ChangeLog, ChangeSink, CommitError, Selection, SelectionSet};
pub use merge::{MergePolicy, Resolution, TagChange, marker_change, merge_tags};
pub use progress::{NullProgress, ProgressCallback};

/// Errors that abort a run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// No buildings were selected.
    #[error("Nothing selected")]
    EmptySelection,

    /// No municipal boundary contains the working envelope.
    #[error("City not found: no admin_level={admin_level} boundary contains the selected buildings")]
    MunicipalityNotFound {
        /// `admin_level` that was searched.
        admin_level: String,
    },

    /// A dataset query failed.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// The host could not record a change.
    #[error(transparent)]
    Commit(#[from] CommitError),
}

/// Result of resolving one building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildingOutcome {
    /// Everything needed for the address was found.
    Resolved(Resolution),
    /// The building is left as is.
    Skipped(SkipReason),
}

/// The datasets a run reads from.
#[derive(Clone, Copy)]
pub struct Datasets<'a> {
    /// Cadastral parcels, searched by area.
    pub parcels: &'a dyn FeatureSource,
    /// Administrative boundaries, queried by `admin_level`.
    pub boundaries: &'a dyn FeatureSource,
    /// Named road segments, queried by name.
    pub roads: &'a dyn FeatureSource,
}

/// Enrichment pipeline bound to a configuration and its datasets.
pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
    datasets: Datasets<'a>,
    streets: StreetResolver<'a>,
}

impl<'a> Pipeline<'a> {
    /// Creates a pipeline.
    #[must_use]
    pub const fn new(config: &'a PipelineConfig, datasets: Datasets<'a>) -> Self {
        Self {
            config,
            datasets,
            streets: StreetResolver::new(&config.street),
        }
    }

    /// Enriches `buildings`, committing one change per touched building
    /// (and one marker change per failed building when enabled).
    ///
    /// On return the selection holds exactly the touched buildings.
    ///
    /// # Errors
    ///
    /// * [`PipelineError::EmptySelection`] if `buildings` is empty.
    /// * [`PipelineError::MunicipalityNotFound`] in per-run mode when no
    ///   boundary contains the working envelope and the place-name
    ///   fallback is off. Nothing is committed and the selection is left
    ///   alone.
    /// * [`PipelineError::Query`] / [`PipelineError::Commit`] if a
    ///   collaborator fails.
    pub fn run(
        &self,
        buildings: &[Feature],
        sink: &mut dyn ChangeSink,
        selection: &mut dyn Selection,
        progress: &dyn ProgressCallback,
    ) -> Result<RunReport, PipelineError> {
        if buildings.is_empty() {
            return Err(PipelineError::EmptySelection);
        }

        let eligible: Vec<&Feature> = buildings
            .iter()
            .filter(|b| match eligibility::check(b, &self.config.disqualifying_tags) {
                Ok(()) => true,
                Err(reason) => {
                    log::debug!("Not enriching {}: {reason}", b.id);
                    false
                }
            })
            .collect();

        log::info!(
            "{} of {} selected features are eligible for enrichment",
            eligible.len(),
            buildings.len()
        );

        let Some(envelope) =
            working_envelope(eligible.iter().copied(), self.config.envelope_padding)
        else {
            selection.clear();
            progress.finish("No eligible buildings".to_string());
            return Ok(RunReport::new(0));
        };

        let boundaries = self.datasets.boundaries.query(&self.boundary_predicate())?;
        let municipalities = MunicipalityResolver::new(boundaries);
        if municipalities.is_empty() {
            log::warn!(
                "No named admin_level={} boundaries in the boundary dataset",
                self.config.admin_level
            );
        }
        let run_city = self.run_city(&municipalities, &envelope)?;

        let candidates: Vec<&Feature> = self
            .datasets
            .parcels
            .search(&envelope)
            .into_iter()
            .filter(|f| f.kind == FeatureKind::Parcel)
            .collect();
        log::debug!("Prefetched {} candidate parcels", candidates.len());

        let policy = MergePolicy::from_config(self.config);
        let mut cache = StreetCache::new();
        let mut report = RunReport::new(eligible.len());

        progress.set_total(eligible.len() as u64);
        progress.set_message("Resolving addresses".to_string());

        for building in eligible {
            let outcome = self.resolve_building(
                building,
                &candidates,
                run_city,
                &municipalities,
                &mut cache,
            )?;

            match outcome {
                BuildingOutcome::Resolved(resolution) => {
                    let change = merge_tags(&building.tags, &resolution, &policy);
                    if change.is_empty() {
                        log::debug!("{} already carries its address", building.id);
                    } else {
                        sink.commit(change)?;
                    }
                    log::debug!(
                        "{} <- {} {}, {} (parcel {})",
                        building.id,
                        resolution.housenumber,
                        resolution.street,
                        resolution.city,
                        resolution.parcel
                    );
                    report.record_touched(building.id.clone());
                }
                BuildingOutcome::Skipped(reason) => {
                    log::warn!("Skipping {}: {reason}", building.id);
                    if self.config.mark_failures {
                        let change =
                            marker_change(&building.id, &building.tags, &self.config.marker_tag);
                        if !change.is_empty() {
                            sink.commit(change)?;
                        }
                    }
                    report.record_skipped(building.id.clone(), reason);
                }
            }

            progress.inc(1);
        }

        log::debug!("Resolved {} distinct streets", cache.len());

        selection.clear();
        selection.set(report.touched.clone());

        progress.finish(format!(
            "Updated {} of {} buildings",
            report.touched.len(),
            report.eligible
        ));
        log::info!("{}", report.summary());

        Ok(report)
    }

    fn boundary_predicate(&self) -> Predicate {
        Predicate::And(vec![
            Predicate::Type(FeatureKind::AdminBoundary),
            Predicate::Equals {
                key: "admin_level".to_string(),
                value: self.config.admin_level.clone(),
            },
        ])
    }

    /// City for the whole run in per-run mode.
    fn run_city<'m>(
        &self,
        municipalities: &MunicipalityResolver<'m>,
        envelope: &Envelope,
    ) -> Result<Option<&'m str>, PipelineError> {
        if self.config.municipality != MunicipalityMode::PerRun {
            return Ok(None);
        }

        if let Some(city) = municipalities.resolve_envelope(envelope) {
            log::info!("Working area is in {city}");
            return Ok(Some(city));
        }

        if self.config.placename_fallback {
            log::warn!("No boundary contains the working area, using parcel place names");
            return Ok(None);
        }

        Err(PipelineError::MunicipalityNotFound {
            admin_level: self.config.admin_level.clone(),
        })
    }

    /// Resolves everything one building needs, without side effects other
    /// than filling the street cache.
    fn resolve_building(
        &self,
        building: &Feature,
        candidates: &[&Feature],
        run_city: Option<&str>,
        municipalities: &MunicipalityResolver<'_>,
        cache: &mut StreetCache,
    ) -> Result<BuildingOutcome, QueryError> {
        let matched = match_parcel(building, candidates);
        let Some(view) = matched.parcel().and_then(|p| ParcelView::try_from(p).ok()) else {
            return Ok(BuildingOutcome::Skipped(SkipReason::UnmatchedParcel));
        };
        let parcel = &view.feature().id;

        let (Some(housenumber), Some(address)) =
            (view.house_number(), StreetAddress::from_parcel(&view))
        else {
            return Ok(BuildingOutcome::Skipped(
                SkipReason::MissingParcelAddress {
                    parcel: parcel.clone(),
                },
            ));
        };

        if let Some(site_address) = view.site_address() {
            log::trace!("{} matched parcel {parcel} ({site_address})", building.id);
        }

        let Some(city) = self.city_for(building, &view, run_city, municipalities) else {
            return Ok(BuildingOutcome::Skipped(SkipReason::MunicipalityNotFound));
        };

        let Some(street) = self
            .streets
            .resolve(&address, self.datasets.roads, cache)?
        else {
            return Ok(BuildingOutcome::Skipped(SkipReason::UnresolvedStreet {
                parcel: parcel.clone(),
                street: address.to_string(),
            }));
        };

        Ok(BuildingOutcome::Resolved(Resolution {
            building: building.id.clone(),
            parcel: parcel.clone(),
            city,
            street: street.name,
            housenumber: housenumber.to_string(),
            postcode: view.zipcode().map(ToString::to_string),
        }))
    }

    fn city_for(
        &self,
        building: &Feature,
        parcel: &ParcelView<'_>,
        run_city: Option<&str>,
        municipalities: &MunicipalityResolver<'_>,
    ) -> Option<String> {
        let boundary = match self.config.municipality {
            MunicipalityMode::PerRun => run_city,
            MunicipalityMode::PerBuilding => municipalities.resolve(building),
        };
        if let Some(city) = boundary {
            return Some(city.to_string());
        }

        if !self.config.placename_fallback {
            return None;
        }
        parcel
            .place_name()
            .and_then(|place| city::from_place_name(place, &self.config.city_aliases))
    }
}
