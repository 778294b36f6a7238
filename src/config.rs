use std::path::PathBuf;

use clap::Parser;

use crate::{collision::DEFAULT_COLLISION_RADIUS, mapfile::MapUnits, raycaster::CastSettings};

#[derive(Parser, Debug)]
#[command(name = "portalcast")]
#[command(about = "Sector and portal raycaster")]
pub struct Args {
    /// Map file to load
    #[arg(default_value = "map.txt")]
    pub map: PathBuf,

    /// Read coordinates as grid cells of this many world units (the editor uses 32)
    #[arg(long, value_name = "CELL", value_parser = parse_grid)]
    pub grid: Option<MapUnits>,

    /// Maximum wall hits traced per screen column
    #[arg(long, default_value_t = 10)]
    pub max_depth: usize,

    /// Horizontal field of view in degrees
    #[arg(long, default_value_t = 66.0)]
    pub fov: f32,

    /// Eye height above the floor of the current sector
    #[arg(long, default_value_t = 1.0)]
    pub eye_height: f32,

    /// Minimum distance kept from solid walls
    #[arg(long, default_value_t = DEFAULT_COLLISION_RADIUS)]
    pub radius: f32,

    /// Movement speed in world units per second
    #[arg(long, default_value_t = 3.0)]
    pub speed: f32,

    /// Starting position, x then y
    #[arg(long, num_args = 2, value_names = ["X", "Y"], allow_negative_numbers = true)]
    pub start: Option<Vec<f32>>,

    /// Height of the internal framebuffer in pixels
    #[arg(long, default_value_t = 480)]
    pub internal_height: usize,
}

fn parse_grid(s: &str) -> Result<MapUnits, String> {
    let cell: f32 = s.parse().map_err(|e| format!("{}", e))?;
    MapUnits::grid(cell).ok_or_else(|| format!("cell must be positive and finite, got {}", s))
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub map_path: PathBuf,
    pub units: MapUnits,
    pub cast: CastSettings,
    pub collision_radius: f32,
    pub fov_deg: f32,
    pub move_speed: f32, // units/s
    pub turn_speed: f32, // rad/s
    pub start_pos: [f32; 2],
    pub internal_height: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            map_path: PathBuf::from("map.txt"),
            units: MapUnits::World,
            cast: CastSettings::default(),
            collision_radius: DEFAULT_COLLISION_RADIUS,
            fov_deg: 66.0,
            move_speed: 3.0,
            turn_speed: std::f32::consts::PI,
            start_pos: [2.0, 2.0],
            internal_height: 480,
        }
    }
}

impl From<Args> for EngineConfig {
    fn from(args: Args) -> Self {
        let defaults = EngineConfig::default();
        let start_pos = match args.start.as_deref() {
            Some(&[x, y]) => [x, y],
            _ => defaults.start_pos,
        };
        Self {
            map_path: args.map,
            units: args.grid.unwrap_or_default(),
            cast: CastSettings {
                max_depth: args.max_depth,
                eye_offset: args.eye_height,
                ..defaults.cast
            },
            collision_radius: args.radius,
            fov_deg: args.fov,
            move_speed: args.speed,
            start_pos,
            internal_height: args.internal_height.max(60),
            ..defaults
        }
    }
}
