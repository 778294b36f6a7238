//! Text map format shared with the authoring tool.
//!
//! ```text
//! # comment
//! sectorIndex wallCount floorHeight ceilingHeight
//! x1 y1 x2 y2 isPortal adjoiningSector
//! ...
//! ```
//!
//! One header per sector followed by exactly `wallCount` wall lines and an
//! optional blank separator. The header's sector index is informational:
//! sectors are numbered by file order. An adjoining index of `-1` (or any
//! negative value) means "no sector".

use std::fmt::{self, Write as _};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::world::{Sector, Wall, World};

/// Grid cell size the authoring tool snaps to.
pub const EDITOR_GRID_SIZE: f32 = 32.0;

/// How coordinates in a map file relate to world units. The two are not
/// interchangeable; the caller must know which producer wrote the file.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum MapUnits {
    /// Coordinates are world units.
    #[default]
    World,
    /// Coordinates are grid cells of `cell` world units.
    Grid { cell: f32 },
}

impl MapUnits {
    /// Grid units, or `None` unless `cell` is finite and positive.
    pub fn grid(cell: f32) -> Option<Self> {
        (cell.is_finite() && cell > 0.0).then_some(MapUnits::Grid { cell })
    }

    #[inline]
    fn scale(self) -> f32 {
        match self {
            MapUnits::World => 1.0,
            MapUnits::Grid { cell } => cell,
        }
    }
}

#[derive(Debug)]
pub enum MapError {
    Io(std::io::Error),
    MalformedHeader { line: usize, text: String },
    MalformedWall { line: usize, text: String },
    UnexpectedEof {
        sector: usize,
        expected: usize,
        found: usize,
    },
}

impl From<std::io::Error> for MapError {
    fn from(e: std::io::Error) -> Self {
        MapError::Io(e)
    }
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::Io(e) => write!(f, "IO error: {}", e),
            MapError::MalformedHeader { line, text } => {
                write!(f, "Malformed sector header on line {}: {:?}", line, text)
            }
            MapError::MalformedWall { line, text } => {
                write!(f, "Malformed wall line on line {}: {:?}", line, text)
            }
            MapError::UnexpectedEof {
                sector,
                expected,
                found,
            } => write!(
                f,
                "Unexpected end of file in sector {}: expected {} walls, found {}",
                sector, expected, found
            ),
        }
    }
}

impl std::error::Error for MapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MapError::Io(e) => Some(e),
            _ => None,
        }
    }
}

struct Header {
    wall_count: usize,
    floor_z: f32,
    ceiling_z: f32,
}

fn field<T: FromStr>(it: &mut std::str::SplitWhitespace<'_>) -> Option<T> {
    it.next()?.parse().ok()
}

/// Like `field`, but `NaN` and the infinities count as malformed.
fn coord(it: &mut std::str::SplitWhitespace<'_>) -> Option<f32> {
    field::<f32>(it).filter(|v| v.is_finite())
}

fn parse_header(line: &str) -> Option<Header> {
    let mut it = line.split_whitespace();
    let _index: i64 = field(&mut it)?;
    Some(Header {
        wall_count: field(&mut it)?,
        floor_z: coord(&mut it)?,
        ceiling_z: coord(&mut it)?,
    })
}

fn parse_wall(line: &str, scale: f32) -> Option<Wall> {
    let mut it = line.split_whitespace();
    let x1 = coord(&mut it)?;
    let y1 = coord(&mut it)?;
    let x2 = coord(&mut it)?;
    let y2 = coord(&mut it)?;
    let portal: i64 = field(&mut it)?;
    let adjoining: i64 = field(&mut it)?;
    Some(Wall {
        start: [x1 * scale, y1 * scale],
        end: [x2 * scale, y2 * scale],
        is_portal: portal != 0,
        back_sector: usize::try_from(adjoining).ok(),
    })
}

impl World {
    /// Parses a whole map. Any malformed record fails the parse; nothing is
    /// returned partially.
    pub fn parse(text: &str, units: MapUnits) -> Result<World, MapError> {
        let scale = units.scale();
        let mut sectors = Vec::new();
        let mut lines = text.lines().enumerate();

        while let Some((idx, raw)) = lines.next() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let header = parse_header(line).ok_or_else(|| MapError::MalformedHeader {
                line: idx + 1,
                text: raw.to_string(),
            })?;

            let mut sector = Sector::new(header.floor_z, header.ceiling_z);
            for found in 0..header.wall_count {
                let (idx, raw) = lines.next().ok_or(MapError::UnexpectedEof {
                    sector: sectors.len(),
                    expected: header.wall_count,
                    found,
                })?;
                let wall = parse_wall(raw, scale).ok_or_else(|| MapError::MalformedWall {
                    line: idx + 1,
                    text: raw.to_string(),
                })?;
                sector.walls.push(wall);
            }
            sectors.push(sector);
        }

        Ok(World::new(sectors))
    }

    pub fn load(path: impl AsRef<Path>, units: MapUnits) -> Result<World, MapError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let world = World::parse(&text, units)?;
        log::info!(
            "Loaded map from {} with {} sectors ({} walls)",
            path.display(),
            world.sectors.len(),
            world.wall_count()
        );
        for issue in world.portal_issues() {
            log::warn!("{}", issue);
        }
        Ok(world)
    }

    /// Replaces `self` with the map at `path`. On error `self` is untouched.
    pub fn reload(&mut self, path: impl AsRef<Path>, units: MapUnits) -> Result<(), MapError> {
        *self = World::load(path, units)?;
        Ok(())
    }

    /// Dumps the map in the load format.
    pub fn to_map_string(&self, units: MapUnits) -> String {
        let scale = units.scale();
        let mut out = String::new();
        for (i, sector) in self.sectors.iter().enumerate() {
            let _ = writeln!(
                out,
                "{} {} {} {}",
                i,
                sector.walls.len(),
                sector.floor_z,
                sector.ceiling_z
            );
            for wall in &sector.walls {
                let adjoining = wall.back_sector.map_or(-1, |s| s as i64);
                let _ = writeln!(
                    out,
                    "{} {} {} {} {} {}",
                    wall.start[0] / scale,
                    wall.start[1] / scale,
                    wall.end[0] / scale,
                    wall.end[1] / scale,
                    u8::from(wall.is_portal),
                    adjoining
                );
            }
            out.push('\n');
        }
        out
    }

    pub fn save(&self, path: impl AsRef<Path>, units: MapUnits) -> Result<(), MapError> {
        let path = path.as_ref();
        fs::write(path, self.to_map_string(units))?;
        log::info!("Map saved to {}", path.display());
        Ok(())
    }
}
