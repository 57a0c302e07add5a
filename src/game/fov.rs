//! # Visibility Engine
//!
//! Per-turn field-of-view computation over the dungeon map's tile grid.
//!
//! The algorithm casts a Bresenham ray from the viewpoint to every tile
//! within the sight radius (Euclidean metric: `dx² + dy² <= radius²`). An
//! opaque tile is itself visible but occludes everything behind it. The
//! `visible` overlay is replaced wholesale on every call; the `encountered`
//! overlay then grows by union with it and is never cleared.

use crate::game::{DungeonMap, Position};
use crate::utils::bresenham_line;

/// Recomputes the `visible` overlay from `viewpoint` within `radius`, then
/// merges it into the `encountered` overlay.
pub fn update_visibility(map: &mut DungeonMap, viewpoint: Position, radius: i32) {
    for tile in map.tiles_mut() {
        tile.visible = false;
    }

    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let target = viewpoint.translated(dx, dy);
            if !map.bounds_check(target.x, target.y) {
                continue;
            }
            if line_of_sight(map, viewpoint, target) {
                if let Some(tile) = map.tile_mut(target) {
                    tile.visible = true;
                    tile.encountered = true;
                }
            }
        }
    }
}

/// Whether `to` can be seen from `from`: no opaque tile sits strictly
/// between them. The endpoint itself may be opaque: walls are visible, you
/// just cannot see past them.
pub fn line_of_sight(map: &DungeonMap, from: Position, to: Position) -> bool {
    for position in bresenham_line(from, to) {
        if position == from {
            continue;
        }
        if !map.bounds_check(position.x, position.y) {
            return false;
        }
        if !map.is_transparent(position) {
            return position == to;
        }
        if position == to {
            return true;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::TileType;

    /// An open floor area with the map border left as wall.
    fn open_map(width: u32, height: u32) -> DungeonMap {
        let mut map = DungeonMap::new(width, height);
        for y in 1..height as i32 - 1 {
            for x in 1..width as i32 - 1 {
                map.set_tile(Position::new(x, y), TileType::Floor).unwrap();
            }
        }
        map
    }

    #[test]
    fn test_visibility_stays_within_radius() {
        let mut map = open_map(40, 40);
        let viewpoint = Position::new(20, 20);
        update_visibility(&mut map, viewpoint, 8);

        for y in 0..40 {
            for x in 0..40 {
                let pos = Position::new(x, y);
                if map.is_visible(pos) {
                    let dx = (x - 20) as f64;
                    let dy = (y - 20) as f64;
                    assert!(dx * dx + dy * dy <= 64.0, "({}, {}) outside radius", x, y);
                }
            }
        }
        assert!(map.is_visible(viewpoint));
        assert!(map.is_visible(Position::new(28, 20)));
        assert!(!map.is_visible(Position::new(29, 20)));
    }

    #[test]
    fn test_wall_occludes_tiles_behind_it() {
        let mut map = open_map(20, 20);
        let viewpoint = Position::new(5, 10);
        // A wall segment directly east of the viewpoint.
        for y in 8..13 {
            map.set_tile(Position::new(8, y), TileType::Wall).unwrap();
        }
        update_visibility(&mut map, viewpoint, 8);

        assert!(map.is_visible(Position::new(8, 10)), "wall face is visible");
        assert!(
            !map.is_visible(Position::new(9, 10)),
            "tile behind the wall is occluded"
        );
        assert!(
            !map.is_visible(Position::new(10, 10)),
            "farther tiles behind the wall are occluded"
        );
    }

    #[test]
    fn test_visible_overlay_is_replaced_each_call() {
        let mut map = open_map(30, 20);
        update_visibility(&mut map, Position::new(5, 10), 8);
        assert!(map.is_visible(Position::new(5, 10)));

        update_visibility(&mut map, Position::new(24, 10), 8);
        assert!(!map.is_visible(Position::new(5, 10)));
        assert!(map.is_visible(Position::new(24, 10)));
    }

    #[test]
    fn test_encountered_grows_monotonically() {
        let mut map = open_map(30, 20);
        update_visibility(&mut map, Position::new(5, 10), 8);

        let first_pass: Vec<Position> = (0..20)
            .flat_map(|y| (0..30).map(move |x| Position::new(x, y)))
            .filter(|&p| map.is_encountered(p))
            .collect();
        assert!(!first_pass.is_empty());

        update_visibility(&mut map, Position::new(24, 10), 8);
        update_visibility(&mut map, Position::new(24, 10), 8);

        for pos in first_pass {
            assert!(
                map.is_encountered(pos),
                "({}, {}) was forgotten",
                pos.x,
                pos.y
            );
        }
    }

    #[test]
    fn test_line_of_sight_is_clear_on_open_floor() {
        let map = open_map(20, 20);
        assert!(line_of_sight(
            &map,
            Position::new(2, 2),
            Position::new(10, 7)
        ));
    }
}
