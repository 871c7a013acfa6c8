//! Editor-side object drafts and input parsing.
//!
//! A draft is what the object form holds before it becomes a spawn payload.
//! All checks here run before anything touches the exchange directory.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::protocol::{
    BitmapTextDescriptor, GameObjectDescriptor, OBJECT_KIND_BITMAP_TEXT, OBJECT_KIND_CUSTOM, Position,
};

/// Sprite object being edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDraft {
    pub name: String,
    pub texture_path: String,
    pub has_collision: bool,
    pub script_path: Option<String>,
    pub parent_node: String,
}

impl Default for ObjectDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            texture_path: String::new(),
            has_collision: false,
            script_path: None,
            parent_node: "root".to_string(),
        }
    }
}

impl ObjectDraft {
    pub fn has_script(&self) -> bool {
        self.script_path.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Texture, then name, then parent: the order the form reports them in.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.texture_path.is_empty() {
            return Err(ValidationError::MissingSelection("texture"));
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.parent_node.is_empty() {
            return Err(ValidationError::MissingSelection("parent node"));
        }
        Ok(())
    }

    pub fn descriptor(&self, position: Position) -> GameObjectDescriptor {
        GameObjectDescriptor {
            kind: OBJECT_KIND_CUSTOM.to_string(),
            name: self.name.trim().to_string(),
            position,
            texture_path: self.texture_path.clone(),
            has_collision: self.has_collision,
            has_script: self.has_script(),
            script_path: self.script_path.clone().unwrap_or_default(),
            parent_node: self.parent_node.clone(),
            is_mode7: position.is_world(),
        }
    }
}

/// Score text rendered from the bitmap font sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BitmapTextDraft {
    pub name: String,
    pub parent_node: Option<String>,
    pub x: i32,
    pub y: i32,
    pub initial_score: i32,
}

impl Default for BitmapTextDraft {
    fn default() -> Self {
        Self { name: String::new(), parent_node: None, x: 10, y: 10, initial_score: 0 }
    }
}

impl BitmapTextDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.parent_node.as_deref().is_none_or(str::is_empty) {
            return Err(ValidationError::MissingSelection("parent node"));
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(())
    }

    pub fn descriptor(&self, texture_path: &str) -> BitmapTextDescriptor {
        BitmapTextDescriptor {
            kind: OBJECT_KIND_BITMAP_TEXT.to_string(),
            name: self.name.trim().to_string(),
            position: Position::Pixel { x: self.x, y: self.y },
            initial_score: self.initial_score,
            parent_node: self.parent_node.clone().unwrap_or_default(),
            texture_path: texture_path.to_string(),
        }
    }
}

/// Parse an integer form field.
pub fn parse_int(field: &'static str, raw: &str) -> Result<i32, ValidationError> {
    raw.trim()
        .parse()
        .map_err(|_| ValidationError::InvalidNumber { field, raw: raw.to_string() })
}

/// Mode7 placement accepts `[0, 1]` on both axes only.
pub fn check_world_coords(x: f64, y: f64) -> Result<(), ValidationError> {
    let unit = 0.0..=1.0;
    if unit.contains(&x) && unit.contains(&y) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange { x, y })
    }
}

/// Parse and range-check textual Mode7 coordinates.
pub fn parse_world_coords(raw_x: &str, raw_y: &str) -> Result<(f64, f64), ValidationError> {
    let parse = |field: &'static str, raw: &str| {
        raw.trim()
            .parse::<f64>()
            .map_err(|_| ValidationError::InvalidNumber { field, raw: raw.to_string() })
    };
    let x = parse("x", raw_x)?;
    let y = parse("y", raw_y)?;
    check_world_coords(x, y)?;
    Ok((x, y))
}
