use crate::{geometry::point_to_segment_distance, world::World};

pub const DEFAULT_COLLISION_RADIUS: f32 = 0.1;

/// True when `p` is in void space or closer than `radius` to a solid wall of
/// the sector containing it. Portals never block.
pub fn is_blocked(world: &World, p: [f32; 2], radius: f32) -> bool {
    let Some(sector) = world.locate_sector(p) else {
        return true;
    };

    world.sectors[sector]
        .walls
        .iter()
        .filter(|w| !w.is_portal)
        .any(|w| point_to_segment_distance(p, w.start, w.end) < radius)
}

/// Applies `delta` one axis at a time, X first, keeping whichever axis is
/// free. Moving diagonally into a wall slides along it.
pub fn slide_move(world: &World, pos: [f32; 2], delta: [f32; 2], radius: f32) -> [f32; 2] {
    let mut out = pos;
    if !is_blocked(world, [pos[0] + delta[0], out[1]], radius) {
        out[0] = pos[0] + delta[0];
    }
    if !is_blocked(world, [out[0], pos[1] + delta[1]], radius) {
        out[1] = pos[1] + delta[1];
    }
    out
}
