use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::{
    archive::{
        naming::DEFAULT_NAME_TEMPLATE,
        packager::{ExportFormat, ExportOptions},
    },
    assets::store::AssetKey,
    batch::runner::{BatchThreading, DEFAULT_GENERATE_COUNT, validate_count},
    foundation::core::Canvas,
    foundation::error::{ForgeError, ForgeResult},
    model::{
        layers::{DEFAULT_RARITY, LayerStack, MAX_RARITY},
        photos::{PhotoSet, Selection},
    },
    render::filter::{ColorFilter, FilterPreset},
};

/// A project file: layers to generate from, photos to edit, and every run parameter.
///
/// Asset paths are relative to the directory containing the project file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub canvas: Canvas,
    pub generate_count: usize,
    /// Fixed seed for reproducible runs; drawn from the OS when absent.
    pub seed: Option<u64>,
    pub meta_name_template: String,
    pub meta_description: String,
    pub export: ExportOptions,
    pub filter: ColorFilter,
    /// Overrides `filter` when set.
    pub preset: Option<FilterPreset>,
    pub threading: BatchThreading,
    pub layers: Vec<LayerConfig>,
    pub photos: Vec<PhotoConfig>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            generate_count: DEFAULT_GENERATE_COUNT,
            seed: None,
            meta_name_template: DEFAULT_NAME_TEMPLATE.to_string(),
            meta_description: String::new(),
            export: ExportOptions::default(),
            filter: ColorFilter::default(),
            preset: None,
            threading: BatchThreading::default(),
            layers: Vec::new(),
            photos: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub name: String,
    #[serde(default)]
    pub collapsed: bool,
    #[serde(default)]
    pub traits: Vec<TraitConfig>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraitConfig {
    pub source: String,
    /// Defaults to the file name without its extension.
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default = "default_rarity")]
    pub rarity: f64,
}

fn default_rarity() -> f64 {
    DEFAULT_RARITY
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhotoConfig {
    pub source: String,
    #[serde(default)]
    pub rotation_degrees: f64,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub selected: bool,
}

fn default_scale() -> f64 {
    1.0
}

impl ProjectConfig {
    /// Read and validate a project file.
    pub fn from_path(path: &Path) -> ForgeResult<Self> {
        let f = File::open(path).with_context(|| format!("open project '{}'", path.display()))?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse project JSON '{}'", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check every parameter and asset path.
    pub fn validate(&self) -> ForgeResult<()> {
        self.canvas.validate()?;
        validate_count(self.generate_count)?;
        self.export.validate()?;
        self.filter.validate()?;
        if let Some(n) = self.threading.threads
            && n == 0
        {
            return Err(ForgeError::validation(
                "threading.threads must be >= 1 when set",
            ));
        }

        for layer in &self.layers {
            for t in &layer.traits {
                AssetKey::from_rel_path(&t.source)?;
                if !t.rarity.is_finite() || !(0.0..=MAX_RARITY).contains(&t.rarity) {
                    return Err(ForgeError::validation(format!(
                        "trait '{}' in layer '{}' has rarity {} outside [0, {MAX_RARITY}]",
                        t.source, layer.name, t.rarity
                    )));
                }
            }
        }
        for p in &self.photos {
            AssetKey::from_rel_path(&p.source)?;
            if !p.rotation_degrees.is_finite() {
                return Err(ForgeError::validation(format!(
                    "photo '{}' rotation must be finite",
                    p.source
                )));
            }
            if !p.scale.is_finite() || p.scale <= 0.0 {
                return Err(ForgeError::validation(format!(
                    "photo '{}' scale must be finite and > 0",
                    p.source
                )));
            }
        }
        Ok(())
    }

    /// The filter to apply: the preset if one is set, else the explicit parameters.
    pub fn effective_filter(&self) -> ColorFilter {
        self.preset.map_or(self.filter, FilterPreset::filter)
    }

    /// Build the layer stack in file order.
    pub fn build_layers(&self) -> ForgeResult<LayerStack> {
        let mut stack = LayerStack::new();
        for (li, layer) in self.layers.iter().enumerate() {
            stack.add_named_layer(layer.name.clone());
            if layer.collapsed {
                stack.toggle_collapsed(li)?;
            }
            for (ti, t) in layer.traits.iter().enumerate() {
                let key = AssetKey::from_rel_path(&t.source)?;
                let file_name = key.file_name().to_string();
                stack.add_trait(li, file_name, key)?;
                if let Some(name) = &t.display_name {
                    stack.rename_trait(li, ti, name.clone())?;
                }
                stack.set_rarity(li, ti, t.rarity)?;
            }
        }
        Ok(stack)
    }

    /// Build the photo set and the initial selection.
    pub fn build_photos(&self) -> ForgeResult<(PhotoSet, Selection)> {
        let mut photos = PhotoSet::new();
        let mut selection = Selection::new();
        for p in &self.photos {
            let key = AssetKey::from_rel_path(&p.source)?;
            let id = photos.add(key.file_name().to_string(), key);
            photos.rotate(id, p.rotation_degrees)?;
            photos.set_scale(id, p.scale)?;
            if p.selected {
                selection.insert(id);
            }
        }
        Ok((photos, selection))
    }

    /// Replace photo-edit parameters with their defaults, as "reset all edits" does.
    pub fn reset_edit_parameters(&mut self) {
        self.filter = ColorFilter::default();
        self.preset = None;
        self.export = ExportOptions {
            format: ExportFormat::Png,
            ..ExportOptions::default()
        };
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/project.rs"]
mod tests;
