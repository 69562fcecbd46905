//! Minecart track collision generated from rail objects.
//!
//! Rail objects placed in a room are rasterized into a 64×64 occupancy grid
//! (one cell per 8×8 tile). Every occupied cell is then classified from its
//! four neighbors into one of the track tile attributes the game reads from
//! the room's custom collision.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::collision::{COLLISION_SIZE, COLLISION_TILES, CollisionMap};
use crate::error::{Error, Result};
use crate::room::{ROOM_COUNT, Room, RoomObject};

/// Direction bits, used both for neighbor patterns and for the exits of a tile.
pub mod direction {
    pub const UP: u8 = 1 << 0;
    pub const DOWN: u8 = 1 << 1;
    pub const LEFT: u8 = 1 << 2;
    pub const RIGHT: u8 = 1 << 3;
    pub const ALL: u8 = UP | DOWN | LEFT | RIGHT;
}

use direction::{DOWN, LEFT, RIGHT, UP};

/// Rail object placed by the stock dungeon object set.
pub const DEFAULT_RAIL_OBJECT: u16 = 0x31;

/// Track tile attributes with the codes the game engine expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TrackTileType {
    HorizStraight = 0xB0,
    VertStraight = 0xB1,
    CornerTL = 0xB2,
    CornerBL = 0xB3,
    CornerTR = 0xB4,
    CornerBR = 0xB5,
    Intersection = 0xB6,
    StopNorth = 0xB7,
    StopSouth = 0xB8,
    StopWest = 0xB9,
    StopEast = 0xBA,
    TJuncNorth = 0xBB,
    TJuncSouth = 0xBC,
    TJuncEast = 0xBD,
    TJuncWest = 0xBE,
    SwitchTL = 0xD0,
    SwitchBL = 0xD1,
    SwitchTR = 0xD2,
    SwitchBR = 0xD3,
}

impl TrackTileType {
    pub const ALL: [Self; 19] = [
        Self::HorizStraight,
        Self::VertStraight,
        Self::CornerTL,
        Self::CornerBL,
        Self::CornerTR,
        Self::CornerBR,
        Self::Intersection,
        Self::StopNorth,
        Self::StopSouth,
        Self::StopWest,
        Self::StopEast,
        Self::TJuncNorth,
        Self::TJuncSouth,
        Self::TJuncEast,
        Self::TJuncWest,
        Self::SwitchTL,
        Self::SwitchBL,
        Self::SwitchTR,
        Self::SwitchBR,
    ];

    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|tile| tile.code() == code)
    }

    #[must_use]
    pub const fn is_corner(self) -> bool {
        matches!(
            self,
            Self::CornerTL | Self::CornerBL | Self::CornerTR | Self::CornerBR
        )
    }

    #[must_use]
    pub const fn is_switch(self) -> bool {
        matches!(
            self,
            Self::SwitchTL | Self::SwitchBL | Self::SwitchTR | Self::SwitchBR
        )
    }

    #[must_use]
    pub const fn is_stop(self) -> bool {
        matches!(
            self,
            Self::StopNorth | Self::StopSouth | Self::StopWest | Self::StopEast
        )
    }

    #[must_use]
    pub const fn is_junction(self) -> bool {
        matches!(
            self,
            Self::TJuncNorth | Self::TJuncSouth | Self::TJuncEast | Self::TJuncWest
        )
    }

    /// The switch covering the same quadrant as a corner. Anything else is
    /// returned unchanged, switches included.
    #[must_use]
    pub const fn to_switch(self) -> Self {
        match self {
            Self::CornerTL => Self::SwitchTL,
            Self::CornerBL => Self::SwitchBL,
            Self::CornerTR => Self::SwitchTR,
            Self::CornerBR => Self::SwitchBR,
            other => other,
        }
    }

    /// Directions a cart can leave the tile through, as [`direction`] bits.
    #[must_use]
    pub const fn exits(self) -> u8 {
        match self {
            Self::HorizStraight => LEFT | RIGHT,
            Self::VertStraight => UP | DOWN,
            Self::CornerTL | Self::SwitchTL => DOWN | RIGHT,
            Self::CornerBL | Self::SwitchBL => UP | RIGHT,
            Self::CornerTR | Self::SwitchTR => DOWN | LEFT,
            Self::CornerBR | Self::SwitchBR => UP | LEFT,
            Self::Intersection => direction::ALL,
            Self::StopNorth => DOWN,
            Self::StopSouth => UP,
            Self::StopWest => RIGHT,
            Self::StopEast => LEFT,
            Self::TJuncNorth => UP | LEFT | RIGHT,
            Self::TJuncSouth => DOWN | LEFT | RIGHT,
            Self::TJuncEast => UP | DOWN | RIGHT,
            Self::TJuncWest => UP | DOWN | LEFT,
        }
    }

    /// Character used by [`visualize`].
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::HorizStraight => '-',
            Self::VertStraight => '|',
            Self::CornerTL | Self::CornerBR => '/',
            Self::CornerBL | Self::CornerTR => '\\',
            Self::Intersection => '+',
            Self::StopNorth | Self::StopSouth | Self::StopWest | Self::StopEast => 'S',
            Self::TJuncNorth | Self::TJuncSouth | Self::TJuncEast | Self::TJuncWest => 'T',
            Self::SwitchTL | Self::SwitchBL | Self::SwitchTR | Self::SwitchBR => '*',
        }
    }
}

/// Classification of an occupied cell, indexed by its neighbor pattern
/// (`UP | DOWN | LEFT | RIGHT` bits).
///
/// Stops and T-junctions are NOT named after the neighbors that were found:
/// a stop is named for the side the cart arrives from (a lone neighbor below
/// gives `StopNorth`) and a T-junction for the side that is missing.
const NEIGHBOR_TABLE: [TrackTileType; 16] = [
    // 0: isolated
    TrackTileType::Intersection,
    // 1: up only, inverted
    TrackTileType::StopSouth,
    // 2: down only, inverted
    TrackTileType::StopNorth,
    // 3: up + down
    TrackTileType::VertStraight,
    // 4: left only, inverted
    TrackTileType::StopEast,
    // 5: up + left
    TrackTileType::CornerBR,
    // 6: down + left
    TrackTileType::CornerTR,
    // 7: right missing
    TrackTileType::TJuncWest,
    // 8: right only, inverted
    TrackTileType::StopWest,
    // 9: up + right
    TrackTileType::CornerBL,
    // 10: down + right
    TrackTileType::CornerTL,
    // 11: left missing
    TrackTileType::TJuncEast,
    // 12: left + right
    TrackTileType::HorizStraight,
    // 13: down missing
    TrackTileType::TJuncNorth,
    // 14: up missing
    TrackTileType::TJuncSouth,
    // 15: all four
    TrackTileType::Intersection,
];

/// Classifies a cell from its neighbor bits.
#[must_use]
pub const fn classify_neighbors(neighbors: u8) -> TrackTileType {
    NEIGHBOR_TABLE[(neighbors & direction::ALL) as usize]
}

/// Which tiles carry track.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OccupancyGrid {
    cells: Box<[bool; COLLISION_TILES]>,
}

impl Default for OccupancyGrid {
    fn default() -> Self {
        Self {
            cells: Box::new([false; COLLISION_TILES]),
        }
    }
}

impl OccupancyGrid {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `(x, y)`. Cells outside the grid are ignored.
    pub fn set(&mut self, x: usize, y: usize, occupied: bool) {
        if x < COLLISION_SIZE && y < COLLISION_SIZE {
            self.cells[CollisionMap::offset(x, y)] = occupied;
        }
    }

    #[must_use]
    pub fn is_occupied(&self, x: usize, y: usize) -> bool {
        x < COLLISION_SIZE && y < COLLISION_SIZE && self.cells[CollisionMap::offset(x, y)]
    }

    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Neighbor bits of `(x, y)`. Cells past the grid edge count as empty.
    #[must_use]
    pub fn neighbors(&self, x: usize, y: usize) -> u8 {
        let mut bits = 0;
        if y > 0 && self.is_occupied(x, y - 1) {
            bits |= UP;
        }
        if self.is_occupied(x, y + 1) {
            bits |= DOWN;
        }
        if x > 0 && self.is_occupied(x - 1, y) {
            bits |= LEFT;
        }
        if self.is_occupied(x + 1, y) {
            bits |= RIGHT;
        }
        bits
    }

    /// Rasterizes the footprints of rail objects, clipped to the grid.
    ///
    /// Objects whose type isn't in `rail_ids` are ignored. A rail object with
    /// an empty footprint is an error.
    pub fn from_objects(room_id: usize, objects: &[RoomObject], rail_ids: &[u16]) -> Result<Self> {
        let mut grid = Self::new();

        for (index, object) in objects.iter().enumerate() {
            if !rail_ids.contains(&object.type_id) {
                continue;
            }

            if object.width == 0 || object.height == 0 {
                return Err(Error::MalformedObject {
                    room_id,
                    index,
                    reason: "rail object has an empty footprint",
                });
            }

            let x_end = object.tile_x.saturating_add(object.width).min(COLLISION_SIZE);
            let y_end = object.tile_y.saturating_add(object.height).min(COLLISION_SIZE);
            for y in object.tile_y..y_end {
                for x in object.tile_x..x_end {
                    grid.set(x, y, true);
                }
            }
        }

        Ok(grid)
    }
}

/// A forced tile type at one grid position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopOverride {
    pub x: usize,
    pub y: usize,
    pub tile: TrackTileType,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorOptions {
    /// Object types treated as rails.
    pub rail_object_ids: Vec<u16>,
    /// Corners at these positions become switches.
    pub switch_positions: Vec<(usize, usize)>,
    pub stop_overrides: Vec<StopOverride>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            rail_object_ids: vec![DEFAULT_RAIL_OBJECT],
            switch_positions: Vec::new(),
            stop_overrides: Vec::new(),
        }
    }
}

/// Classifies every occupied cell. Empty cells stay 0.
#[must_use]
pub fn classify(grid: &OccupancyGrid) -> CollisionMap {
    let mut map = CollisionMap::new();
    for y in 0..COLLISION_SIZE {
        for x in 0..COLLISION_SIZE {
            if grid.is_occupied(x, y) {
                map.set(x, y, classify_neighbors(grid.neighbors(x, y)).code());
            }
        }
    }
    map
}

/// Turns corners at `positions` into switches. Other cells are left alone,
/// so promoting twice changes nothing.
pub fn promote_switches(map: &mut CollisionMap, positions: &[(usize, usize)]) -> usize {
    let mut promoted = 0;
    for &(x, y) in positions {
        match TrackTileType::from_code(map.get(x, y)) {
            Some(tile) if tile.is_corner() => {
                map.set(x, y, tile.to_switch().code());
                promoted += 1;
            }
            _ => debug!("switch at ({x}, {y}) has no corner to promote"),
        }
    }
    promoted
}

/// Forces tile types on cells that already carry track.
pub fn apply_stop_overrides(map: &mut CollisionMap, overrides: &[StopOverride]) -> usize {
    let mut applied = 0;
    for stop in overrides {
        if map.get(stop.x, stop.y) == 0 {
            debug!("override at ({}, {}) is not on track", stop.x, stop.y);
            continue;
        }
        map.set(stop.x, stop.y, stop.tile.code());
        applied += 1;
    }
    applied
}

/// Renders the bounding box of the non-zero cells, one line per row.
///
/// Unknown codes are drawn as `?` and empty cells as `.`. An empty map gives
/// an empty string.
#[must_use]
pub fn visualize(map: &CollisionMap) -> String {
    let Some((min_x, min_y, max_x, max_y)) = bounding_box(map) else {
        return String::new();
    };

    let mut out = String::with_capacity((max_x - min_x + 2) * (max_y - min_y + 1));
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            out.push(match map.get(x, y) {
                0 => '.',
                code => TrackTileType::from_code(code).map_or('?', TrackTileType::glyph),
            });
        }
        out.push('\n');
    }
    out
}

fn bounding_box(map: &CollisionMap) -> Option<(usize, usize, usize, usize)> {
    map.non_zero().fold(None, |bounds, (offset, _)| {
        let (x, y) = (offset % COLLISION_SIZE, offset / COLLISION_SIZE);
        Some(match bounds {
            None => (x, y, x, y),
            Some((min_x, min_y, max_x, max_y)) => (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y)),
        })
    })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackCollisionResult {
    pub map: CollisionMap,
    /// Cells carrying track.
    pub tiles_generated: usize,
    pub stop_count: usize,
    /// Plain corners; promoted ones are counted as switches.
    pub corner_count: usize,
    pub switch_count: usize,
    pub ascii: String,
}

impl TrackCollisionResult {
    fn from_map(map: CollisionMap) -> Self {
        let tiles = || map.non_zero().filter_map(|(_, code)| TrackTileType::from_code(code));

        Self {
            tiles_generated: map.non_zero_count(),
            stop_count: tiles().filter(|t| t.is_stop()).count(),
            corner_count: tiles().filter(|t| t.is_corner()).count(),
            switch_count: tiles().filter(|t| t.is_switch()).count(),
            ascii: visualize(&map),
            map,
        }
    }
}

/// Classifies `grid` and applies the switch and stop options.
#[must_use]
pub fn generate(grid: &OccupancyGrid, options: &GeneratorOptions) -> TrackCollisionResult {
    let mut map = classify(grid);
    promote_switches(&mut map, &options.switch_positions);
    apply_stop_overrides(&mut map, &options.stop_overrides);
    TrackCollisionResult::from_map(map)
}

/// Builds the track collision of a loaded room from its rail objects.
pub fn generate_track_collision(room: &Room, options: &GeneratorOptions) -> Result<TrackCollisionResult> {
    if room.id() >= ROOM_COUNT {
        return Err(Error::RoomOutOfRange {
            room_id: room.id(),
            room_count: ROOM_COUNT,
        });
    }
    if !room.is_loaded() {
        return Err(Error::RoomNotLoaded { room_id: room.id() });
    }

    let grid = OccupancyGrid::from_objects(room.id(), room.objects(), &options.rail_object_ids)?;
    let result = generate(&grid, options);

    info!(
        "room 0x{:03X}: generated {} track tiles ({} stops, {} corners, {} switches)",
        room.id(),
        result.tiles_generated,
        result.stop_count,
        result.corner_count,
        result.switch_count
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::Rng;

    fn grid_of(cells: &[(usize, usize)]) -> OccupancyGrid {
        let mut grid = OccupancyGrid::new();
        for &(x, y) in cells {
            grid.set(x, y, true);
        }
        grid
    }

    fn tile_at(map: &CollisionMap, x: usize, y: usize) -> Option<TrackTileType> {
        TrackTileType::from_code(map.get(x, y))
    }

    #[test]
    fn codes_round_trip() {
        for tile in TrackTileType::ALL {
            assert_eq!(TrackTileType::from_code(tile.code()), Some(tile));
        }
        assert_eq!(TrackTileType::StopNorth.code(), 0xB7);
        assert_eq!(TrackTileType::SwitchBR.code(), 0xD3);
        assert_eq!(TrackTileType::from_code(0xBF), None);
    }

    #[test]
    fn horizontal_run() {
        let map = classify(&grid_of(&[(10, 5), (11, 5), (12, 5)]));
        assert_eq!(tile_at(&map, 10, 5), Some(TrackTileType::StopWest));
        assert_eq!(tile_at(&map, 11, 5), Some(TrackTileType::HorizStraight));
        assert_eq!(tile_at(&map, 12, 5), Some(TrackTileType::StopEast));
        assert_eq!(map.non_zero_count(), 3);
    }

    #[test]
    fn vertical_run_stops() {
        let map = classify(&grid_of(&[(3, 3), (3, 4), (3, 5)]));
        assert_eq!(tile_at(&map, 3, 3), Some(TrackTileType::StopNorth));
        assert_eq!(tile_at(&map, 3, 4), Some(TrackTileType::VertStraight));
        assert_eq!(tile_at(&map, 3, 5), Some(TrackTileType::StopSouth));
    }

    #[test]
    fn l_shape_corner() {
        let map = classify(&grid_of(&[(0, 0), (1, 0), (1, 1)]));
        assert_eq!(tile_at(&map, 1, 0), Some(TrackTileType::CornerTR));
        assert_eq!(map.get(1, 0), 0xB4);
    }

    #[test]
    fn all_corners() {
        // A 3×3 ring: the four corners of the ring are track corners.
        let ring = [(0, 0), (1, 0), (2, 0), (0, 1), (2, 1), (0, 2), (1, 2), (2, 2)];
        let map = classify(&grid_of(&ring));
        assert_eq!(tile_at(&map, 0, 0), Some(TrackTileType::CornerTL));
        assert_eq!(tile_at(&map, 2, 0), Some(TrackTileType::CornerTR));
        assert_eq!(tile_at(&map, 0, 2), Some(TrackTileType::CornerBL));
        assert_eq!(tile_at(&map, 2, 2), Some(TrackTileType::CornerBR));
        assert_eq!(tile_at(&map, 1, 1), None);
    }

    #[test]
    fn junctions_named_by_missing_side() {
        // Plus shape without its top arm.
        let map = classify(&grid_of(&[(5, 5), (4, 5), (6, 5), (5, 6)]));
        assert_eq!(tile_at(&map, 5, 5), Some(TrackTileType::TJuncSouth));

        let map = classify(&grid_of(&[(5, 5), (4, 5), (6, 5), (5, 4)]));
        assert_eq!(tile_at(&map, 5, 5), Some(TrackTileType::TJuncNorth));

        let map = classify(&grid_of(&[(5, 5), (5, 4), (5, 6), (6, 5)]));
        assert_eq!(tile_at(&map, 5, 5), Some(TrackTileType::TJuncEast));

        let map = classify(&grid_of(&[(5, 5), (5, 4), (5, 6), (4, 5)]));
        assert_eq!(tile_at(&map, 5, 5), Some(TrackTileType::TJuncWest));
    }

    #[test]
    fn intersections() {
        let map = classify(&grid_of(&[(20, 20)]));
        assert_eq!(tile_at(&map, 20, 20), Some(TrackTileType::Intersection));

        let map = classify(&grid_of(&[(5, 5), (4, 5), (6, 5), (5, 4), (5, 6)]));
        assert_eq!(tile_at(&map, 5, 5), Some(TrackTileType::Intersection));
    }

    #[test]
    fn grid_edges_count_as_empty() {
        let map = classify(&grid_of(&[(0, 63), (1, 63), (63, 0)]));
        assert_eq!(tile_at(&map, 0, 63), Some(TrackTileType::StopWest));
        assert_eq!(tile_at(&map, 63, 0), Some(TrackTileType::Intersection));
    }

    #[test]
    fn switch_promotion_is_idempotent() {
        let mut map = classify(&grid_of(&[(0, 0), (1, 0), (1, 1)]));
        let positions = [(1, 0), (0, 0), (40, 40)];

        assert_eq!(promote_switches(&mut map, &positions), 1);
        let once = map.clone();
        assert_eq!(promote_switches(&mut map, &positions), 0);

        assert_eq!(map, once);
        assert_eq!(tile_at(&map, 1, 0), Some(TrackTileType::SwitchTR));
        assert_eq!(tile_at(&map, 0, 0), Some(TrackTileType::StopWest));
    }

    #[test]
    fn stop_overrides_only_touch_track() {
        let mut map = classify(&grid_of(&[(10, 5), (11, 5), (12, 5)]));
        let overrides = [
            StopOverride {
                x: 11,
                y: 5,
                tile: TrackTileType::StopNorth,
            },
            StopOverride {
                x: 30,
                y: 30,
                tile: TrackTileType::StopSouth,
            },
        ];

        assert_eq!(apply_stop_overrides(&mut map, &overrides), 1);
        assert_eq!(tile_at(&map, 11, 5), Some(TrackTileType::StopNorth));
        assert_eq!(map.get(30, 30), 0);
    }

    #[test]
    fn generate_counts_final_tiles() {
        let grid = grid_of(&[(0, 0), (1, 0), (1, 1), (5, 5), (6, 5), (6, 6)]);
        let options = GeneratorOptions {
            switch_positions: vec![(6, 5)],
            ..GeneratorOptions::default()
        };

        let result = generate(&grid, &options);
        assert_eq!(result.tiles_generated, 6);
        assert_eq!(result.stop_count, 4);
        assert_eq!(result.corner_count, 1);
        assert_eq!(result.switch_count, 1);
    }

    #[test]
    fn ascii_is_cropped() {
        let result = generate(
            &grid_of(&[(10, 5), (11, 5), (12, 5)]),
            &GeneratorOptions::default(),
        );
        assert_eq!(result.ascii, "S-S\n");

        let result = generate(
            &grid_of(&[(0, 0), (1, 0), (1, 1)]),
            &GeneratorOptions::default(),
        );
        assert_eq!(result.ascii, "S\\\n.S\n");
        assert_eq!(visualize(&result.map), result.ascii);
    }

    #[test]
    fn ascii_marks_unknown_codes() {
        let mut map = CollisionMap::new();
        map.set(2, 2, 0x01);
        map.set(3, 2, TrackTileType::Intersection.code());
        assert_eq!(visualize(&map), "?+\n");
        assert_eq!(visualize(&CollisionMap::new()), "");
    }

    #[test]
    fn from_objects_clips_and_filters() {
        let objects = [
            RoomObject {
                type_id: DEFAULT_RAIL_OBJECT,
                tile_x: 62,
                tile_y: 10,
                width: 4,
                height: 1,
                layer: 0,
            },
            RoomObject {
                type_id: 0x20,
                tile_x: 0,
                tile_y: 0,
                width: 8,
                height: 8,
                layer: 0,
            },
        ];

        let grid = OccupancyGrid::from_objects(1, &objects, &[DEFAULT_RAIL_OBJECT]).unwrap();
        assert_eq!(grid.occupied_count(), 2);
        assert!(grid.is_occupied(63, 10));
        assert!(!grid.is_occupied(0, 0));
    }

    #[test]
    fn rail_far_off_grid_is_clipped() {
        let objects = [
            RoomObject {
                type_id: DEFAULT_RAIL_OBJECT,
                tile_x: usize::MAX - 1,
                tile_y: 3,
                width: 4,
                height: 1,
                layer: 0,
            },
            RoomObject {
                type_id: DEFAULT_RAIL_OBJECT,
                tile_x: 5,
                tile_y: usize::MAX,
                width: 1,
                height: usize::MAX,
                layer: 0,
            },
        ];

        let grid = OccupancyGrid::from_objects(1, &objects, &[DEFAULT_RAIL_OBJECT]).unwrap();
        assert_eq!(grid.occupied_count(), 0);
    }

    #[test]
    fn empty_rail_footprint_is_malformed() {
        let objects = [RoomObject {
            type_id: DEFAULT_RAIL_OBJECT,
            tile_x: 1,
            tile_y: 1,
            width: 0,
            height: 2,
            layer: 0,
        }];

        let err = OccupancyGrid::from_objects(7, &objects, &[DEFAULT_RAIL_OBJECT]).unwrap_err();
        assert!(matches!(err, Error::MalformedObject { room_id: 7, index: 0, .. }));
    }

    #[test]
    fn exits_match_neighbors() {
        let mut rng = rand::thread_rng();
        let mut grid = OccupancyGrid::new();
        for _ in 0..1500 {
            grid.set(rng.gen_range(0..COLLISION_SIZE), rng.gen_range(0..COLLISION_SIZE), true);
        }

        let map = classify(&grid);
        for y in 0..COLLISION_SIZE {
            for x in 0..COLLISION_SIZE {
                assert_eq!(grid.is_occupied(x, y), map.get(x, y) != 0);
                if !grid.is_occupied(x, y) {
                    continue;
                }

                let neighbors = grid.neighbors(x, y);
                let tile = tile_at(&map, x, y).unwrap();
                if neighbors == 0 {
                    assert_eq!(tile, TrackTileType::Intersection);
                } else {
                    assert_eq!(tile.exits(), neighbors);
                }
            }
        }
    }
}
