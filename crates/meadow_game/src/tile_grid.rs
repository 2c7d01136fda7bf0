//! Finite tile pool that covers an unbounded field.
//!
//! The pool holds exactly `(2r+1)²` tiles for the lifetime of the grid. On
//! every `recenter` any tile that fell outside the window around the new center
//! cell is moved to a cell that just entered it, so coverage stays gapless and
//! duplicate-free without creating or destroying drawables.
//!
//! Relocation is done per axis by reflecting through the midpoint of the old
//! and new centers (`x' = old_cx + cx - x`). For a one-cell step that is the
//! usual "trailing edge to leading edge" move; for larger jumps it is still a
//! bijection from the cells that left the window onto the cells that entered.

use std::collections::HashSet;

use glam::{IVec2, Vec2};
use meadow_core::draw::{DrawBackend, DrawHandle};

use crate::error::ConfigError;

/// Builds the drawable for one tile, in tile-local coordinates with the
/// origin at the tile's top-left corner.
pub trait TileDecorator {
    fn decorate(&mut self, tile_size: f32, backend: &mut dyn DrawBackend) -> DrawHandle;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRecord {
    pub grid_x: i32,
    pub grid_y: i32,
    pub handle: DrawHandle,
}

pub struct TileGrid {
    view_radius: i32,
    tile_size: f32,
    center: IVec2,
    tiles: Vec<TileRecord>,
    recycled_total: u64,
}

impl TileGrid {
    pub fn initialize(
        view_radius: i32,
        tile_size: f32,
        focus: Vec2,
        decorator: &mut dyn TileDecorator,
        backend: &mut dyn DrawBackend,
    ) -> Result<Self, ConfigError> {
        if view_radius <= 0 {
            return Err(ConfigError::NonPositiveViewRadius(view_radius));
        }
        if tile_size <= 0.0 {
            return Err(ConfigError::NonPositiveTileSize(tile_size));
        }

        let center = cell_for(focus, tile_size);
        let side = (2 * view_radius + 1) as usize;
        let mut tiles = Vec::with_capacity(side * side);
        for dy in -view_radius..=view_radius {
            for dx in -view_radius..=view_radius {
                let grid_x = center.x + dx;
                let grid_y = center.y + dy;
                let handle = decorator.decorate(tile_size, backend);
                backend.reposition(handle, grid_x as f32 * tile_size, grid_y as f32 * tile_size);
                backend.set_depth(handle, 0.0);
                tiles.push(TileRecord {
                    grid_x,
                    grid_y,
                    handle,
                });
            }
        }
        log::info!(
            "Tile grid ready: {} tiles (radius {}, size {}) around cell ({}, {})",
            tiles.len(),
            view_radius,
            tile_size,
            center.x,
            center.y
        );

        Ok(Self {
            view_radius,
            tile_size,
            center,
            tiles,
            recycled_total: 0,
        })
    }

    /// Move every tile outside the window around `focus` into the window.
    /// Returns how many tiles were relocated.
    pub fn recenter(&mut self, focus: Vec2, backend: &mut dyn DrawBackend) -> usize {
        let new_center = cell_for(focus, self.tile_size);
        if new_center == self.center {
            return 0;
        }
        let old_center = self.center;
        let r = self.view_radius;
        let mut moved = 0;

        for tile in &mut self.tiles {
            let out_x = axis_distance(tile.grid_x, new_center.x) > r as i64;
            let out_y = axis_distance(tile.grid_y, new_center.y) > r as i64;
            if !out_x && !out_y {
                continue;
            }
            if out_x {
                tile.grid_x = reflect(tile.grid_x, old_center.x, new_center.x);
            }
            if out_y {
                tile.grid_y = reflect(tile.grid_y, old_center.y, new_center.y);
            }
            backend.reposition(
                tile.handle,
                tile.grid_x as f32 * self.tile_size,
                tile.grid_y as f32 * self.tile_size,
            );
            moved += 1;
        }

        self.center = new_center;
        self.recycled_total += moved as u64;
        debug_assert!(
            self.covers_window(),
            "tile pool no longer covers the window around ({}, {})",
            new_center.x,
            new_center.y
        );
        if moved > 0 {
            log::trace!(
                "Recentered to ({}, {}), relocated {} tiles",
                new_center.x,
                new_center.y,
                moved
            );
        }
        moved
    }

    /// True when the tile coordinates are exactly the window around `center`.
    pub fn covers_window(&self) -> bool {
        let r = self.view_radius;
        let side = (2 * r + 1) as usize;
        if self.tiles.len() != side * side {
            return false;
        }
        let mut seen = HashSet::with_capacity(self.tiles.len());
        self.tiles.iter().all(|t| {
            axis_distance(t.grid_x, self.center.x) <= r as i64
                && axis_distance(t.grid_y, self.center.y) <= r as i64
                && seen.insert((t.grid_x, t.grid_y))
        })
    }

    pub fn center(&self) -> IVec2 {
        self.center
    }

    pub fn tiles(&self) -> &[TileRecord] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn recycled_total(&self) -> u64 {
        self.recycled_total
    }

    /// Destroy every tile drawable. The grid is empty afterwards.
    pub fn release(&mut self, backend: &mut dyn DrawBackend) {
        for tile in self.tiles.drain(..) {
            backend.destroy(tile.handle);
        }
    }
}

/// Center cells are kept within half the `i32` range so every window around
/// them, and every reflection between two of them, is representable.
const CELL_LIMIT: i32 = i32::MAX / 2;

/// Grid cell containing `focus`: `floor(focus / tile_size)` per axis.
pub fn cell_for(focus: Vec2, tile_size: f32) -> IVec2 {
    (focus / tile_size)
        .floor()
        .as_ivec2()
        .clamp(IVec2::splat(-CELL_LIMIT), IVec2::splat(CELL_LIMIT))
}

fn axis_distance(a: i32, b: i32) -> i64 {
    (a as i64 - b as i64).abs()
}

/// `old + new - g`, evaluated wide. The result lies in the new window, which
/// fits in `i32` because both centers are within `CELL_LIMIT`.
fn reflect(g: i32, old_center: i32, new_center: i32) -> i32 {
    (old_center as i64 + new_center as i64 - g as i64) as i32
}
