use rayon::prelude::*;

use crate::{camera::Camera, geometry::intersect_ray_segment, renderer::pack_rgb, world::World};

pub const CEILING_COLOR: u32 = pack_rgb(100, 100, 255);
pub const FLOOR_COLOR: u32 = pack_rgb(100, 255, 100);
pub const SOLID_COLOR: u32 = pack_rgb(255, 105, 180);
// Debug tint so portals stay recognizable
pub const PORTAL_COLOR: u32 = pack_rgb(0, 105, 180);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CastSettings {
    /// Maximum wall hits traced per column.
    pub max_depth: usize,
    /// Eye height above the floor of the camera's sector.
    pub eye_offset: f32,
    /// How far past a portal the ray restarts, in ray-parameter units.
    pub portal_push: f32,
}

impl Default for CastSettings {
    fn default() -> Self {
        Self {
            max_depth: 10,
            eye_offset: 1.0,
            portal_push: 0.01,
        }
    }
}

/// Nearest wall along a ray, across every sector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub sector: usize,
    pub wall: usize,
    pub t: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    Ceiling,
    Wall,
    Portal,
    Floor,
}

/// One vertical run of pixels in a column, rows `top..bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub kind: SpanKind,
    pub top: usize,
    pub bottom: usize,
    pub color: u32,
}

impl Span {
    fn clamped(kind: SpanKind, top: i32, bottom: i32, height: usize, color: u32) -> Self {
        let h = height as i32;
        Self {
            kind,
            top: top.clamp(0, h) as usize,
            bottom: bottom.clamp(0, h) as usize,
            color,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.top >= self.bottom
    }
}

/// A wall struck while tracing a column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceHit {
    pub sector: usize,
    pub wall: usize,
    pub is_portal: bool,
    /// Sum of ray parameters up to and including this hit.
    pub depth: f32,
}

/// Everything one column draws, in draw order: three spans per hit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnTrace {
    pub hits: Vec<TraceHit>,
    pub spans: Vec<Span>,
}

impl ColumnTrace {
    pub fn last_hit(&self) -> Option<&TraceHit> {
        self.hits.last()
    }
}

/// Scans every wall of every sector. Ties keep the first wall in sector, then
/// wall, order.
pub fn nearest_hit(world: &World, origin: [f32; 2], dir: [f32; 2]) -> Option<RayHit> {
    let mut best: Option<RayHit> = None;
    for (si, sector) in world.sectors.iter().enumerate() {
        for (wi, wall) in sector.walls.iter().enumerate() {
            let Some(t) = intersect_ray_segment(origin, dir, wall.start, wall.end) else {
                continue;
            };
            if best.is_none_or(|b| t < b.t) {
                best = Some(RayHit {
                    sector: si,
                    wall: wi,
                    t,
                });
            }
        }
    }
    best
}

/// Traces one screen column through the portal graph.
///
/// The projection divisor is the plain sum of ray parameters over all hops,
/// not a folded path depth.
pub fn cast_column(
    world: &World,
    origin: [f32; 2],
    dir: [f32; 2],
    eye_z: f32,
    height: usize,
    settings: &CastSettings,
) -> ColumnTrace {
    let mut trace = ColumnTrace::default();
    let mut ray = origin;
    let mut total = 0.0f32;

    let h = height as f32;
    let center = 0.5 * h;
    let half_rows = (height / 2) as i32;

    for _ in 0..settings.max_depth {
        let Some(hit) = nearest_hit(world, ray, dir) else {
            break; // void, background only
        };
        total += hit.t;

        let sector = &world.sectors[hit.sector];
        let wall = &sector.walls[hit.wall];

        let ceil_y = ((center - (sector.ceiling_z - eye_z) * h / total) as i32).max(0);
        let floor_y =
            ((center + (eye_z - sector.floor_z) * h / total) as i32).min(height as i32 - 1);

        let (mut top, mut bottom) = (ceil_y, floor_y);
        if bottom < top {
            let line_height = (h / total) as i32;
            top = (half_rows - line_height / 2).max(0);
            bottom = (top + line_height).min(height as i32 - 1);
        }

        let (kind, color) = if wall.is_portal {
            (SpanKind::Portal, PORTAL_COLOR)
        } else {
            (SpanKind::Wall, SOLID_COLOR)
        };

        let rows = height as i32;
        trace.spans.extend([
            Span::clamped(SpanKind::Ceiling, 0, ceil_y, height, CEILING_COLOR),
            Span::clamped(kind, top, bottom, height, color),
            Span::clamped(SpanKind::Floor, floor_y, rows, height, FLOOR_COLOR),
        ]);
        trace.hits.push(TraceHit {
            sector: hit.sector,
            wall: hit.wall,
            is_portal: wall.is_portal,
            depth: total,
        });

        if !wall.is_portal {
            break;
        }

        let step = hit.t + settings.portal_push;
        ray = [ray[0] + dir[0] * step, ray[1] + dir[1] * step];

        if wall.passable_to(world.sectors.len()).is_none() {
            break; // dead end
        }
    }

    trace
}

/// Traces every column of a frame. Empty when the camera is in void space.
///
/// Columns only read the world, so they are traced in parallel.
pub fn trace_frame(
    world: &World,
    camera: &Camera,
    width: usize,
    height: usize,
    settings: &CastSettings,
) -> Vec<ColumnTrace> {
    let Some(own) = world.locate_sector(camera.pos) else {
        return Vec::new();
    };
    let eye_z = world.sectors[own].floor_z + settings.eye_offset;

    (0..width)
        .into_par_iter()
        .map(|x| {
            let dir = camera.ray_dir(x, width);
            cast_column(world, camera.pos, dir, eye_z, height, settings)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Sector, Wall};

    const H: usize = 480;

    fn square(x0: f32, y0: f32, size: f32) -> Sector {
        Sector::polygon(
            &[
                [x0, y0],
                [x0 + size, y0],
                [x0 + size, y0 + size],
                [x0, y0 + size],
            ],
            0.0,
            3.0,
        )
    }

    /// Room A is [0,2]x[0,2], room B is [2,4]x[0,2], portal along x = 2.
    fn two_rooms() -> World {
        let mut a = square(0.0, 0.0, 2.0);
        let mut b = square(2.0, 0.0, 2.0);
        a.walls[1] = Wall::portal([2.0, 0.0], [2.0, 2.0], 1);
        b.walls[3] = Wall::portal([2.0, 2.0], [2.0, 0.0], 0);
        World::new(vec![a, b])
    }

    /// `n` unit cells along +x, each linked to the next.
    fn corridor(n: usize) -> World {
        let mut sectors = Vec::new();
        for i in 0..n {
            let x = i as f32;
            let mut s = square(x, 0.0, 1.0);
            if i + 1 < n {
                s.walls[1] = Wall::portal([x + 1.0, 0.0], [x + 1.0, 1.0], i + 1);
            }
            if i > 0 {
                s.walls[3] = Wall::portal([x, 1.0], [x, 0.0], i - 1);
            }
            sectors.push(s);
        }
        World::new(sectors)
    }

    #[test]
    fn ray_through_portal_hits_far_wall() {
        let world = two_rooms();
        let trace = cast_column(&world, [1.0, 1.0], [1.0, 0.0], 1.0, H, &CastSettings::default());

        assert_eq!(trace.hits.len(), 2);
        assert!(trace.hits[0].is_portal);
        assert_eq!(trace.hits[0].sector, 0);

        let far = trace.last_hit().unwrap();
        assert!(!far.is_portal);
        assert_eq!(far.sector, 1);
        assert_eq!(far.wall, 1);
        // 1 to the portal, then 2 to the far wall minus the push
        assert!((far.depth - 3.0).abs() < 0.02, "depth {}", far.depth);

        let body = trace.spans[4];
        assert_eq!(body.kind, SpanKind::Wall);
        assert_eq!(body.color, SOLID_COLOR);
        assert_eq!(trace.spans[1].kind, SpanKind::Portal);
        assert_eq!(trace.spans.len(), 6);
    }

    #[test]
    fn solid_wall_stops_the_column() {
        let world = two_rooms();
        let trace = cast_column(&world, [1.0, 1.0], [-1.0, 0.0], 1.0, H, &CastSettings::default());
        assert_eq!(trace.hits.len(), 1);
        assert!(!trace.hits[0].is_portal);
        assert!((trace.hits[0].depth - 1.0).abs() < 1e-6);
        assert_eq!(trace.spans.len(), 3);
    }

    #[test]
    fn spans_cover_the_column_in_order() {
        let world = two_rooms();
        let trace = cast_column(&world, [1.0, 1.0], [-1.0, 0.0], 1.0, H, &CastSettings::default());
        let [ceil, wall, floor] = [trace.spans[0], trace.spans[1], trace.spans[2]];

        // depth 1, ceiling 2 above the eye, floor 1 below
        assert_eq!(ceil.top, 0);
        assert_eq!(ceil.bottom, 0);
        assert_eq!((wall.top, wall.bottom), (0, 479));
        assert_eq!((floor.top, floor.bottom), (479, 480));
        assert!(ceil.is_empty());
    }

    #[test]
    fn far_wall_projects_inside_the_screen() {
        let mut world = two_rooms();
        world.sectors[1].ceiling_z = 1.5;
        let trace = cast_column(&world, [1.0, 1.0], [1.0, 0.0], 1.0, H, &CastSettings::default());
        let wall = trace.spans[4];
        let depth = trace.hits[1].depth;
        let expected_top = (240.0 - 0.5 * 480.0 / depth) as usize;
        let expected_bottom = (240.0 + 480.0 / depth) as usize;
        assert_eq!(wall.top, expected_top);
        assert_eq!(wall.bottom, expected_bottom);
        assert_eq!(trace.spans[3].bottom, expected_top);
        assert_eq!(trace.spans[5].top, expected_bottom);
    }

    #[test]
    fn inverted_body_is_recentred() {
        let mut world = two_rooms();
        // ceiling below the floor
        world.sectors[0].floor_z = 5.0;
        world.sectors[0].ceiling_z = 4.0;
        let settings = CastSettings::default();
        let trace = cast_column(&world, [1.0, 1.0], [-1.0, 0.0], 0.0, 100, &settings);
        let wall = trace.spans[1];
        // line height 100 rows at depth 1
        assert_eq!((wall.top, wall.bottom), (0, 99));
    }

    #[test]
    fn void_ray_draws_nothing() {
        let world = two_rooms();
        let trace = cast_column(&world, [10.0, 10.0], [1.0, 0.0], 1.0, H, &CastSettings::default());
        assert!(trace.hits.is_empty());
        assert!(trace.spans.is_empty());
    }

    #[test]
    fn depth_bound_limits_hits() {
        let world = corridor(15);
        let settings = CastSettings::default();
        let trace = cast_column(&world, [0.5, 0.5], [1.0, 0.0], 1.0, H, &settings);
        assert_eq!(trace.hits.len(), settings.max_depth);
        assert_eq!(trace.spans.len(), 3 * settings.max_depth);
        assert!(trace.hits.iter().all(|h| h.is_portal));
    }

    #[test]
    fn short_corridor_ends_on_solid_wall() {
        let world = corridor(4);
        let trace = cast_column(&world, [0.5, 0.5], [1.0, 0.0], 1.0, H, &CastSettings::default());
        assert_eq!(trace.hits.len(), 4);
        let last = trace.last_hit().unwrap();
        assert!(!last.is_portal);
        assert_eq!(last.sector, 3);
    }

    #[test]
    fn dangling_portal_is_a_dead_end() {
        let mut world = two_rooms();
        world.sectors[0].walls[1].back_sector = Some(9);
        // remove the far room's copy so the first hit is the dangling one
        world.sectors[1].walls[3] = Wall::solid([2.0, 2.0], [2.0, 2.0]);
        let trace = cast_column(&world, [1.0, 1.0], [1.0, 0.0], 1.0, H, &CastSettings::default());
        assert_eq!(trace.hits.len(), 1);
        assert!(trace.hits[0].is_portal);
    }

    #[test]
    fn ties_keep_first_sector() {
        let world = two_rooms();
        let hit = nearest_hit(&world, [1.0, 1.0], [1.0, 0.0]).unwrap();
        assert_eq!((hit.sector, hit.wall), (0, 1));
    }

    #[test]
    fn frame_is_empty_outside_the_map() {
        let world = two_rooms();
        let camera = Camera::new([9.0, 9.0], [1.0, 0.0], 66.0);
        assert!(trace_frame(&world, &camera, 64, 48, &CastSettings::default()).is_empty());
    }

    #[test]
    fn frame_traces_every_column() {
        let world = two_rooms();
        let camera = Camera::new([1.0, 1.0], [1.0, 0.0], 66.0);
        let columns = trace_frame(&world, &camera, 64, 48, &CastSettings::default());
        assert_eq!(columns.len(), 64);
        assert!(columns.iter().all(|c| !c.hits.is_empty()));

        let center = &columns[32];
        let direct = cast_column(&world, [1.0, 1.0], [1.0, 0.0], 1.0, 48, &CastSettings::default());
        assert_eq!(center, &direct);
    }

    #[test]
    fn eye_height_follows_camera_sector_floor() {
        let mut world = two_rooms();
        world.sectors[0].floor_z = 0.5;
        let settings = CastSettings::default();
        let camera = Camera::new([0.5, 1.0], [1.0, 0.0], 66.0);
        let columns = trace_frame(&world, &camera, 64, 48, &settings);

        let raised = cast_column(&world, [0.5, 1.0], [1.0, 0.0], 1.5, 48, &settings);
        let level = cast_column(&world, [0.5, 1.0], [1.0, 0.0], 1.0, 48, &settings);
        assert_eq!(columns[32], raised);
        assert_ne!(columns[32], level);

        // the raised floor sits one unit below the eye at depth 1.5
        assert_eq!(columns[32].spans[2].top, 47);
    }
}
