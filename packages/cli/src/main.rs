#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Renders and inspects evidence maps built from boundary and incident
//! files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use evidence_map::MapInstance;
use evidence_map_cli::{LoadOptions, filters, load_map, svg};
use evidence_map_incident_models::MainCategory;
use evidence_map_region_models::{RegionId, RegionLevel};
use evidence_map_spatial::ViewMode;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "evidence_map", about = "Evidence map toolkit")]
struct Cli {
    #[command(flatten)]
    data: DataArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DataArgs {
    /// Province boundaries (JSON array of region rows)
    #[arg(long)]
    provinces: PathBuf,

    /// District boundaries
    #[arg(long)]
    districts: Option<PathBuf>,

    /// Subdistrict boundaries
    #[arg(long)]
    subdistricts: Option<PathBuf>,

    /// Incident feed (JSON array)
    #[arg(long)]
    incidents: Option<PathBuf>,

    /// Map configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Province ids to select
    #[arg(long = "select-province")]
    select_provinces: Vec<i64>,

    /// District ids to select
    #[arg(long = "select-district")]
    select_districts: Vec<i64>,

    /// Subdistrict ids to select
    #[arg(long = "select-subdistrict")]
    select_subdistricts: Vec<i64>,

    /// Main category switch (`all`, `drugs`, `guns`)
    #[arg(long, default_value = "all", value_parser = parse_main_category)]
    main: MainCategory,

    /// Effective-type keys to switch off (e.g. `meth`, `gun`)
    #[arg(long = "disable")]
    disabled: Vec<String>,
}

impl DataArgs {
    fn load_options(&self) -> LoadOptions {
        let select = [
            (RegionLevel::Province, &self.select_provinces),
            (RegionLevel::District, &self.select_districts),
            (RegionLevel::Subdistrict, &self.select_subdistricts),
        ]
        .into_iter()
        .flat_map(|(level, ids)| ids.iter().map(move |id| (level, RegionId(*id))))
        .collect();

        LoadOptions {
            provinces: self.provinces.clone(),
            districts: self.districts.clone(),
            subdistricts: self.subdistricts.clone(),
            incidents: self.incidents.clone(),
            config: self.config.clone(),
            select,
            filters: filters(self.main, &self.disabled),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print per-region totals with their choropleth colours
    Aggregate {
        /// Tier to aggregate (`province`, `district`, `subdistrict`)
        #[arg(long, default_value = "province", value_parser = parse_level)]
        tier: RegionLevel,
    },
    /// Render the vector map as SVG
    Svg {
        /// Output file; stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,

        #[arg(long, default_value_t = 800)]
        width: u32,

        #[arg(long, default_value_t = 600)]
        height: u32,

        /// Zoom applied on top of the fitted view
        #[arg(long, default_value_t = 1.0)]
        zoom: f64,
    },
    /// Print clustered markers at a tile zoom
    Clusters {
        #[arg(long, default_value_t = 6.0)]
        zoom: f64,
    },
    /// Print the heatmap layer
    Heatmap,
    /// Print a tier as `GeoJSON` with styles attached
    Geojson {
        #[arg(long, default_value = "province", value_parser = parse_level)]
        tier: RegionLevel,
    },
    /// Print the region tree matching a search term
    Search { term: String },
}

fn parse_main_category(value: &str) -> Result<MainCategory, String> {
    value
        .parse()
        .map_err(|_| format!("unknown category '{value}' (expected all, drugs or guns)"))
}

fn parse_level(value: &str) -> Result<RegionLevel, String> {
    value
        .parse()
        .map_err(|_| format!("unknown tier '{value}' (expected province, district or subdistrict)"))
}

#[derive(Serialize)]
struct RegionTotal<'a> {
    name: &'a str,
    amount: f64,
    color: &'a str,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let mut map = load_map(&cli.data.load_options()).await?;

    match cli.command {
        Commands::Aggregate { tier } => print_totals(&mut map, tier)?,
        Commands::Svg {
            output,
            width,
            height,
            zoom,
        } => {
            let config = map.viewport().config();
            let mut state = map.viewport().state();
            state.zoom_level = zoom.clamp(config.min_zoom, config.max_zoom);
            map.restore_viewport(state);
            let document = svg::render(&mut map, width, height);
            match output {
                Some(path) => {
                    tokio::fs::write(&path, document).await?;
                    log::info!("SVG written to {}", path.display());
                }
                None => print!("{document}"),
            }
        }
        Commands::Clusters { zoom } => {
            map.set_view_mode(ViewMode::Markers);
            println!("{}", serde_json::to_string_pretty(&map.spatial_layer(zoom))?);
        }
        Commands::Heatmap => {
            map.set_view_mode(ViewMode::Heatmap);
            println!("{}", serde_json::to_string_pretty(&map.spatial_layer(0.0))?);
        }
        Commands::Geojson { tier } => {
            let visible = map.visible_levels();
            if !visible.is_visible(tier) {
                map.toggle_visible_level(tier);
            }
            println!("{}", serde_json::to_string(&map.tile_features(tier))?);
        }
        Commands::Search { term } => {
            for province in map.search(&term) {
                println!("{} ({})", province.province.name, province.province.id);
                for district in &province.districts {
                    println!("  {} ({})", district.district.name, district.district.id);
                    for subdistrict in &district.subdistricts {
                        println!("    {} ({})", subdistrict.name, subdistrict.id);
                    }
                }
            }
        }
    }

    Ok(())
}

fn print_totals(map: &mut MapInstance, tier: RegionLevel) -> Result<(), serde_json::Error> {
    let totals = map.totals(tier).clone();
    let palette = &map.config().palette;
    let rows: BTreeMap<i64, RegionTotal<'_>> = map
        .store()
        .regions(tier)
        .map(|region| {
            let amount = totals.get(&region.id).copied().unwrap_or(0.0);
            (
                region.id.0,
                RegionTotal {
                    name: &region.name,
                    amount,
                    color: palette.color_for(amount),
                },
            )
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}
