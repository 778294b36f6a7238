use std::fmt;

use crate::geometry::point_in_polygon;

#[derive(Debug, Clone, PartialEq)]
pub struct Wall {
    pub start: [f32; 2], // (x, y) start point in world space
    pub end: [f32; 2],   // (x, y) end point in world space
    pub is_portal: bool,
    pub back_sector: Option<usize>, // None is the file's -1 sentinel
}

impl Wall {
    pub fn solid(start: [f32; 2], end: [f32; 2]) -> Self {
        Self {
            start,
            end,
            is_portal: false,
            back_sector: None,
        }
    }

    pub fn portal(start: [f32; 2], end: [f32; 2], to: usize) -> Self {
        Self {
            start,
            end,
            is_portal: true,
            back_sector: Some(to),
        }
    }

    /// Sector a ray or mover continues into, if this portal leads anywhere valid.
    #[inline]
    pub fn passable_to(&self, sector_count: usize) -> Option<usize> {
        if !self.is_portal {
            return None;
        }
        self.back_sector.filter(|&s| s < sector_count)
    }

    /// Same segment, either winding.
    fn mirrors(&self, other: &Wall) -> bool {
        (self.start == other.start && self.end == other.end)
            || (self.start == other.end && self.end == other.start)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sector {
    pub walls: Vec<Wall>,
    pub floor_z: f32,
    pub ceiling_z: f32,
}

impl Sector {
    pub fn new(floor_z: f32, ceiling_z: f32) -> Self {
        Self {
            walls: Vec::new(),
            floor_z,
            ceiling_z,
        }
    }

    /// Closed loop of solid walls through `points`, last point joining the first.
    pub fn polygon(points: &[[f32; 2]], floor_z: f32, ceiling_z: f32) -> Self {
        let walls = points
            .iter()
            .zip(points.iter().cycle().skip(1))
            .map(|(&a, &b)| Wall::solid(a, b))
            .collect();
        Self {
            walls,
            floor_z,
            ceiling_z,
        }
    }

    pub fn contains(&self, p: [f32; 2]) -> bool {
        point_in_polygon(p, &self.walls)
    }
}

/// Problems in portal wiring. The raycaster and collision code never consult
/// these; they only show up as load-time warnings.
#[derive(Debug, Clone, PartialEq)]
pub enum PortalIssue {
    NoTarget { sector: usize, wall: usize },
    TargetOutOfRange { sector: usize, wall: usize, target: usize },
    MissingBackLink { sector: usize, wall: usize, target: usize },
}

impl fmt::Display for PortalIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortalIssue::NoTarget { sector, wall } => {
                write!(f, "sector {} wall {}: portal has no target", sector, wall)
            }
            PortalIssue::TargetOutOfRange {
                sector,
                wall,
                target,
            } => write!(
                f,
                "sector {} wall {}: portal target {} does not exist",
                sector, wall, target
            ),
            PortalIssue::MissingBackLink {
                sector,
                wall,
                target,
            } => write!(
                f,
                "sector {} wall {}: sector {} has no portal leading back",
                sector, wall, target
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct World {
    pub sectors: Vec<Sector>,
}

impl World {
    pub fn new(sectors: Vec<Sector>) -> Self {
        Self { sectors }
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    pub fn wall_count(&self) -> usize {
        self.sectors.iter().map(|s| s.walls.len()).sum()
    }

    /// First sector (in collection order) containing `p`. Overlapping sectors
    /// resolve to the lowest index; `None` means void space.
    pub fn locate_sector(&self, p: [f32; 2]) -> Option<usize> {
        self.sectors.iter().position(|s| s.contains(p))
    }

    /// Centroid of the first sector's vertices.
    pub fn spawn_point(&self) -> Option<[f32; 2]> {
        let sector = self.sectors.first()?;
        if sector.walls.is_empty() {
            return None;
        }
        let n = sector.walls.len() as f32;
        let (sx, sy) = sector
            .walls
            .iter()
            .fold((0.0, 0.0), |(x, y), w| (x + w.start[0], y + w.start[1]));
        Some([sx / n, sy / n])
    }

    pub fn portal_issues(&self) -> Vec<PortalIssue> {
        let mut issues = Vec::new();
        for (si, sector) in self.sectors.iter().enumerate() {
            for (wi, wall) in sector.walls.iter().enumerate() {
                if !wall.is_portal {
                    continue;
                }
                let Some(target) = wall.back_sector else {
                    issues.push(PortalIssue::NoTarget {
                        sector: si,
                        wall: wi,
                    });
                    continue;
                };
                let Some(other) = self.sectors.get(target) else {
                    issues.push(PortalIssue::TargetOutOfRange {
                        sector: si,
                        wall: wi,
                        target,
                    });
                    continue;
                };
                let linked_back = other
                    .walls
                    .iter()
                    .any(|w| w.is_portal && w.back_sector == Some(si) && w.mirrors(wall));
                if !linked_back {
                    issues.push(PortalIssue::MissingBackLink {
                        sector: si,
                        wall: wi,
                        target,
                    });
                }
            }
        }
        issues
    }

    /// Removes a sector and renumbers every portal reference past it. Portals
    /// that led into the removed sector become solid walls. Solid walls keep
    /// whatever index they carry.
    pub fn remove_sector(&mut self, index: usize) -> Option<Sector> {
        if index >= self.sectors.len() {
            return None;
        }
        let removed = self.sectors.remove(index);

        for wall in self.sectors.iter_mut().flat_map(|s| s.walls.iter_mut()) {
            match wall.back_sector {
                Some(t) if wall.is_portal && t == index => {
                    wall.is_portal = false;
                    wall.back_sector = None;
                }
                Some(t) if wall.is_portal && t > index => wall.back_sector = Some(t - 1),
                _ => {}
            }
        }

        log::info!(
            "Removed sector {} ({} sectors left)",
            index,
            self.sectors.len()
        );
        Some(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    /// Two 2x2 rooms side by side, joined along x = 2.
    fn two_rooms() -> World {
        let mut a = square(0.0, 0.0, 2.0);
        let mut b = square(2.0, 0.0, 2.0);
        a.walls[1] = Wall::portal([2.0, 0.0], [2.0, 2.0], 1);
        b.walls[3] = Wall::portal([2.0, 2.0], [2.0, 0.0], 0);
        World::new(vec![a, b])
    }

    #[test]
    fn polygon_closes_the_loop() {
        let s = square(0.0, 0.0, 1.0);
        assert_eq!(s.walls.len(), 4);
        assert_eq!(s.walls[3].start, [0.0, 1.0]);
        assert_eq!(s.walls[3].end, [0.0, 0.0]);
    }

    #[test]
    fn locate_finds_containing_sector() {
        let world = two_rooms();
        assert_eq!(world.locate_sector([1.0, 1.0]), Some(0));
        assert_eq!(world.locate_sector([3.0, 1.0]), Some(1));
        assert_eq!(world.locate_sector([5.0, 1.0]), None);
        assert_eq!(world.locate_sector([1.0, -0.5]), None);
    }

    #[test]
    fn overlapping_sectors_resolve_to_lowest_index() {
        let world = World::new(vec![square(0.0, 0.0, 4.0), square(1.0, 1.0, 4.0)]);
        for _ in 0..3 {
            assert_eq!(world.locate_sector([2.0, 2.0]), Some(0));
        }
        assert_eq!(world.locate_sector([4.5, 4.5]), Some(1));
    }

    #[test]
    fn empty_world_is_void() {
        let world = World::default();
        assert_eq!(world.locate_sector([0.0, 0.0]), None);
        assert_eq!(world.spawn_point(), None);
    }

    #[test]
    fn passable_rejects_solid_and_dangling() {
        assert_eq!(Wall::solid([0.0, 0.0], [1.0, 0.0]).passable_to(3), None);
        assert_eq!(Wall::portal([0.0, 0.0], [1.0, 0.0], 2).passable_to(3), Some(2));
        assert_eq!(Wall::portal([0.0, 0.0], [1.0, 0.0], 3).passable_to(3), None);
    }

    #[test]
    fn linked_rooms_have_no_issues() {
        assert!(two_rooms().portal_issues().is_empty());
    }

    #[test]
    fn reports_broken_portals() {
        let mut world = two_rooms();
        world.sectors[1].walls[3] = Wall::solid([2.0, 2.0], [2.0, 0.0]);
        world.sectors[1].walls[0].is_portal = true;
        world.sectors[0].walls[0].is_portal = true;
        world.sectors[0].walls[0].back_sector = Some(7);

        let issues = world.portal_issues();
        assert!(issues.contains(&PortalIssue::MissingBackLink {
            sector: 0,
            wall: 1,
            target: 1
        }));
        assert!(issues.contains(&PortalIssue::TargetOutOfRange {
            sector: 0,
            wall: 0,
            target: 7
        }));
        assert!(issues.contains(&PortalIssue::NoTarget { sector: 1, wall: 0 }));
        assert_eq!(issues.len(), 3);
    }

    #[test]
    fn remove_sector_renumbers_links_once() {
        let mut a = square(0.0, 0.0, 2.0);
        let mut b = square(2.0, 0.0, 2.0);
        let mut c = square(4.0, 0.0, 2.0);
        let mut d = square(6.0, 0.0, 2.0);
        a.walls[1] = Wall::portal([2.0, 0.0], [2.0, 2.0], 1);
        b.walls[3] = Wall::portal([2.0, 2.0], [2.0, 0.0], 0);
        b.walls[1] = Wall::portal([4.0, 0.0], [4.0, 2.0], 2);
        c.walls[3] = Wall::portal([4.0, 2.0], [4.0, 0.0], 1);
        c.walls[1] = Wall::portal([6.0, 0.0], [6.0, 2.0], 3);
        d.walls[3] = Wall::portal([6.0, 2.0], [6.0, 0.0], 2);
        let mut world = World::new(vec![a, b, c, d]);

        let removed = world.remove_sector(1).unwrap();
        assert_eq!(removed.walls[0].start, [2.0, 0.0]);
        assert_eq!(world.sectors.len(), 3);

        // a's and c's links into the removed sector are now solid
        assert!(!world.sectors[0].walls[1].is_portal);
        assert_eq!(world.sectors[0].walls[1].back_sector, None);
        assert!(!world.sectors[1].walls[3].is_portal);

        // c <-> d shifted by exactly one
        assert_eq!(world.sectors[1].walls[1].back_sector, Some(2));
        assert_eq!(world.sectors[2].walls[3].back_sector, Some(1));
        assert!(world.portal_issues().is_empty());
    }

    #[test]
    fn remove_sector_leaves_solid_walls_alone() {
        let mut world = two_rooms();
        world.sectors.push(square(4.0, 0.0, 2.0));
        world.sectors[0].walls[0].back_sector = Some(2);
        world.sectors[1].walls[0].back_sector = Some(1);

        world.remove_sector(1).unwrap();

        let stale = &world.sectors[0].walls[0];
        assert!(!stale.is_portal);
        assert_eq!(stale.back_sector, Some(2));
        assert_eq!(world.sectors[0].walls[1], Wall::solid([2.0, 0.0], [2.0, 2.0]));
    }

    #[test]
    fn remove_out_of_range_is_noop() {
        let mut world = two_rooms();
        assert!(world.remove_sector(2).is_none());
        assert_eq!(world, two_rooms());
    }

    #[test]
    fn spawn_point_is_first_sector_centroid() {
        assert_eq!(two_rooms().spawn_point(), Some([1.0, 1.0]));
    }

    #[test]
    fn counts_walls_across_sectors() {
        assert_eq!(two_rooms().wall_count(), 8);
    }
}
