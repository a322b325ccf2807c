// Copyright 2026 The Gridlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Scene Config
//!
//! Scenes on disk are TOML.  Everything is optional; an empty file is the default 20×20 grid with
//! nothing on it.
//!
//! ```toml
//! rectangles = [[2.0, 2.0, 5.0, 3.0]]   # x, y, width, height
//! circles = [[10.0, 10.0, 4.0]]          # cx, cy, radius
//! lights = [[15.0, 5.0, 1.0, 0.8]]       # x, y, z, intensity
//!
//! [grid]
//! width = 20
//! height = 20
//! initial_value = 0.0
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::prelude::*;
use crate::scene::{
    Circle, DEFAULT_GRID_HEIGHT, DEFAULT_GRID_WIDTH, Grid, LightSource, Rectangle, Scene,
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    pub width: u32,
    pub height: u32,
    pub initial_value: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            width: DEFAULT_GRID_WIDTH,
            height: DEFAULT_GRID_HEIGHT,
            initial_value: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    pub grid: GridConfig,
    pub rectangles: Vec<[f32; 4]>,
    pub circles: Vec<[f32; 3]>,
    pub lights: Vec<[f32; 4]>,
}

impl SceneConfig {
    pub fn from_toml(text: &str) -> Result<Self, GridlightError> {
        let config: SceneConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, GridlightError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    fn validate(&self) -> Result<(), GridlightError> {
        if self.grid.width == 0 || self.grid.height == 0 {
            return Err(GridlightError::Scene(format!(
                "grid must not be empty, got {}x{}",
                self.grid.width, self.grid.height
            )));
        }
        if let Some(r) = self.rectangles.iter().find(|r| r[2] < 0.0 || r[3] < 0.0) {
            return Err(GridlightError::Scene(format!(
                "rectangle has negative extent: {r:?}"
            )));
        }
        if let Some(c) = self.circles.iter().find(|c| c[2] < 0.0) {
            return Err(GridlightError::Scene(format!(
                "circle has negative radius: {c:?}"
            )));
        }
        Ok(())
    }

    /// Overwrite the grid dimensions, keeping everything else, and check the result.
    pub fn resize(&mut self, width: Option<u32>, height: Option<u32>) -> Result<(), GridlightError> {
        if let Some(w) = width {
            self.grid.width = w;
        }
        if let Some(h) = height {
            self.grid.height = h;
        }
        self.validate()
    }

    pub fn to_scene(&self) -> Scene {
        Scene {
            grid: Grid::new(self.grid.width, self.grid.height, self.grid.initial_value),
            rectangles: self
                .rectangles
                .iter()
                .map(|&[x, y, w, h]| Rectangle::new(x, y, w, h))
                .collect(),
            circles: self
                .circles
                .iter()
                .map(|&[cx, cy, r]| Circle::new(cx, cy, r))
                .collect(),
            lights: self
                .lights
                .iter()
                .map(|&[x, y, z, i]| LightSource::new(x, y, z, i))
                .collect(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_file_is_default_scene() {
        let config = SceneConfig::from_toml("").unwrap();
        assert_eq!(config, SceneConfig::default());
        let scene = config.to_scene();
        assert_eq!(scene.grid.len(), 400);
        assert!(scene.rectangles.is_empty());
        assert!(scene.circles.is_empty());
        assert!(scene.lights.is_empty());
    }

    #[test]
    fn parses_shapes_and_lights() {
        let text = r#"
            rectangles = [[2.0, 2.0, 5.0, 3.0]]
            circles = [[10.0, 10.0, 4.0], [1.0, 1.0, 0.5]]
            lights = [[15.0, 5.0, 1.0, 0.8]]

            [grid]
            width = 8
            height = 4
            initial_value = 0.5
        "#;
        let scene = SceneConfig::from_toml(text).unwrap().to_scene();
        assert_eq!(scene.grid.width(), 8);
        assert_eq!(scene.grid.height(), 4);
        assert_eq!(scene.grid.cells()[0].value, 0.5);
        assert_eq!(scene.rectangles, vec![Rectangle::new(2.0, 2.0, 5.0, 3.0)]);
        assert_eq!(scene.circles.len(), 2);
        assert_eq!(scene.circles[1], Circle::new(1.0, 1.0, 0.5));
        assert_eq!(scene.lights[0], LightSource::new(15.0, 5.0, 1.0, 0.8));
    }

    #[test]
    fn rejects_bad_scenes() {
        assert!(matches!(
            SceneConfig::from_toml("[grid]\nwidth = 0"),
            Err(GridlightError::Scene(_))
        ));
        assert!(matches!(
            SceneConfig::from_toml("circles = [[0.0, 0.0, -1.0]]"),
            Err(GridlightError::Scene(_))
        ));
        assert!(matches!(
            SceneConfig::from_toml("squares = []"),
            Err(GridlightError::Toml(_))
        ));
        assert!(matches!(
            SceneConfig::from_toml("circles = [[0.0, 0.0]]"),
            Err(GridlightError::Toml(_))
        ));
    }

    #[test]
    fn resize_overrides_grid() {
        let mut config = SceneConfig::default();
        config.resize(Some(512), None).unwrap();
        assert_eq!(config.grid.width, 512);
        assert_eq!(config.grid.height, DEFAULT_GRID_HEIGHT);
    }

    #[test]
    fn resize_to_empty_rejected() {
        let mut config = SceneConfig::default();
        assert!(matches!(
            config.resize(None, Some(0)),
            Err(GridlightError::Scene(_))
        ));
    }
}
