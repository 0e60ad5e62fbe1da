#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line driver for building address enrichment.
//!
//! Loads buildings, parcels, municipal boundaries and roads from `GeoJSON`
//! files, runs the enrichment pipeline against in-memory collaborators and
//! writes the updated buildings back out.

mod geojson_io;

use std::path::{Path, PathBuf};

use building_address_cli_utils::{IndicatifProgress, MultiProgress};
use building_address_models::{Feature, FeatureKind, MunicipalityMode, PipelineConfig};
use building_address_pipeline::{
    ChangeLog, Datasets, Pipeline, Selection, SelectionSet, config,
};
use building_address_store::{FeatureSource, FeatureStore, Predicate};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "building_address", about = "Building address enrichment from parcel data")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add address tags to buildings from parcel, boundary and road data
    Enrich {
        /// Building footprints (`GeoJSON` `FeatureCollection`)
        #[arg(long)]
        buildings: PathBuf,
        /// Cadastral parcels
        #[arg(long)]
        parcels: PathBuf,
        /// Municipal boundaries
        #[arg(long)]
        boundaries: PathBuf,
        /// Named road segments (features tagged `highway`)
        #[arg(long)]
        roads: PathBuf,
        /// TOML configuration; built-in defaults when omitted
        #[arg(long)]
        config: Option<PathBuf>,
        /// Comma-separated building ids to enrich (default: all)
        #[arg(long)]
        select: Option<String>,
        /// Override how the city is resolved (`per-run` or `per-building`)
        #[arg(long)]
        municipality: Option<MunicipalityMode>,
        /// Where to write the resulting buildings
        #[arg(long)]
        output: Option<PathBuf>,
        /// Only write buildings that were enriched
        #[arg(long)]
        changed_only: bool,
    },
    /// Evaluate a predicate such as `type:road AND name~"west oak street"`
    Query {
        /// Dataset to query
        #[arg(long)]
        input: PathBuf,
        /// Predicate expression
        predicate: String,
    },
}

struct EnrichArgs {
    buildings: PathBuf,
    parcels: PathBuf,
    boundaries: PathBuf,
    roads: PathBuf,
    config: Option<PathBuf>,
    select: Option<String>,
    municipality: Option<MunicipalityMode>,
    output: Option<PathBuf>,
    changed_only: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = building_address_cli_utils::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Enrich {
            buildings,
            parcels,
            boundaries,
            roads,
            config,
            select,
            municipality,
            output,
            changed_only,
        } => enrich(
            &multi,
            &EnrichArgs {
                buildings,
                parcels,
                boundaries,
                roads,
                config,
                select,
                municipality,
                output,
                changed_only,
            },
        )?,
        Commands::Query { input, predicate } => query(&input, &predicate)?,
    }

    Ok(())
}

fn load_config(args: &EnrichArgs) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => config::load(path)?,
        None => config::embedded_default()?,
    };
    if let Some(mode) = args.municipality {
        config.municipality = mode;
    }
    Ok(config)
}

fn enrich(multi: &MultiProgress, args: &EnrichArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(args)?;

    let mut buildings = geojson_io::load(&args.buildings, Some(FeatureKind::Building))?;
    let parcels = FeatureStore::new(geojson_io::load(&args.parcels, Some(FeatureKind::Parcel))?);
    let boundaries = FeatureStore::new(geojson_io::load(
        &args.boundaries,
        Some(FeatureKind::AdminBoundary),
    )?);
    let roads = FeatureStore::new(geojson_io::load(&args.roads, None)?);
    log::info!(
        "{} road segments among {} road features",
        roads.count_kind(FeatureKind::RoadSegment),
        roads.len()
    );

    let initial = args.select.as_deref().map_or_else(
        || buildings.iter().map(|b| b.id.clone()).collect(),
        geojson_io::parse_id_list,
    );
    for id in &initial {
        if !buildings.iter().any(|b| &b.id == id) {
            log::warn!("Selected id {id} is not in {}", args.buildings.display());
        }
    }
    let mut selection = SelectionSet::new(initial);

    let selected = selection.selected();
    let batch: Vec<Feature> = buildings
        .iter()
        .filter(|b| selected.contains(&b.id))
        .cloned()
        .collect();

    let datasets = Datasets {
        parcels: &parcels,
        boundaries: &boundaries,
        roads: &roads,
    };
    let progress = IndicatifProgress::batch_bar(multi, "Enriching buildings");
    let mut changes = ChangeLog::new();

    let report = Pipeline::new(&config, datasets).run(
        &batch,
        &mut changes,
        &mut selection,
        progress.as_ref(),
    )?;

    log::info!("Applying {} committed changes", changes.len());
    changes.apply_all(&mut buildings)?;
    println!("{}", report.summary());

    if let Some(output) = &args.output {
        write_buildings(output, buildings, args.changed_only.then_some(&selection))?;
    }

    Ok(())
}

fn write_buildings(
    output: &Path,
    buildings: Vec<Feature>,
    only: Option<&SelectionSet>,
) -> Result<(), Box<dyn std::error::Error>> {
    let buildings: Vec<Feature> = match only {
        Some(selection) => buildings
            .into_iter()
            .filter(|b| selection.contains(&b.id))
            .collect(),
        None => buildings,
    };
    geojson_io::write(output, &buildings)?;
    log::info!("Wrote {} buildings to {}", buildings.len(), output.display());
    Ok(())
}

fn query(input: &Path, predicate: &str) -> Result<(), Box<dyn std::error::Error>> {
    let predicate: Predicate = predicate.parse()?;
    let store = FeatureStore::new(geojson_io::load(input, None)?);

    let matches = store.query(&predicate)?;
    for feature in &matches {
        println!(
            "{:<20} {:<10} {}",
            feature.id.as_str(),
            feature.kind.as_ref(),
            feature.tag("name").unwrap_or("")
        );
    }
    log::info!("{} of {} features match `{predicate}`", matches.len(), store.len());

    Ok(())
}
