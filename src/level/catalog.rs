// src/level/catalog.rs
//! Data-driven segment templates + loader.

use std::collections::HashMap;
use std::sync::Arc;

use bevy::asset::{io::Reader, AssetLoader, LoadContext};
use bevy::prelude::*;

use super::core::{
    CollectibleKind, CollectibleSpawnPoint, GroupPattern, HazardSpawnPoint, SegmentTemplate,
    TemplateId,
};

// ---------- Public plugin to register asset+loader ----------

pub struct SegmentCatalogAssetPlugin;

impl Plugin for SegmentCatalogAssetPlugin {
    fn build(&self, app: &mut App) {
        app.init_asset::<SegmentCatalog>()
            .register_asset_loader(SegmentCatalogLoader);
    }
}

// ---------- Runtime catalog asset ----------

#[derive(Asset, TypePath, Clone, Debug)]
pub struct SegmentCatalog {
    /// Ordered list; index in this vector is the `TemplateId.0`.
    templates: Vec<Arc<SegmentTemplate>>,
    /// Name → index for quick lookups.
    name_to_index: HashMap<String, u32>,
}

impl SegmentCatalog {
    /// Validate and index a list of templates.
    pub fn from_templates(defs: Vec<SegmentTemplate>) -> Result<Self, CatalogLoadError> {
        if defs.is_empty() {
            return Err(CatalogLoadError::Empty);
        }
        for def in &defs {
            validate_template(def)?;
        }

        let mut name_to_index = HashMap::with_capacity(defs.len());
        for (i, def) in defs.iter().enumerate() {
            if let Some(prev) = name_to_index.insert(def.name.clone(), i as u32) {
                return Err(CatalogLoadError::DuplicateName {
                    name: def.name.clone(),
                    first: prev,
                    second: i as u32,
                });
            }
        }

        Ok(Self { templates: defs.into_iter().map(Arc::new).collect(), name_to_index })
    }

    /// Parse a `.catalog.ron` document (a list of templates).
    pub fn from_ron(bytes: &[u8]) -> Result<Self, CatalogLoadError> {
        let defs: Vec<SegmentTemplate> =
            ron::de::from_bytes(bytes).map_err(|e| CatalogLoadError::Ron(e.to_string()))?;
        Self::from_templates(defs)
    }

    pub fn index_of(&self, name: &str) -> Option<TemplateId> {
        self.name_to_index.get(name).map(|&i| TemplateId(i))
    }

    pub fn get(&self, id: TemplateId) -> Option<&Arc<SegmentTemplate>> {
        self.templates.get(id.0 as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TemplateId, &Arc<SegmentTemplate>)> + '_ {
        self.templates.iter().enumerate().map(|(i, t)| (TemplateId(i as u32), t))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Small hand-authored set used when no catalog file can be loaded.
    pub fn builtin() -> Self {
        let v = Vec3::new;
        let defs = vec![
            SegmentTemplate::new("straight", 30.0)
                .with_difficulty(0.1)
                .with_collectible(
                    CollectibleSpawnPoint::new(CollectibleKind::CoinGroup, v(0.0, 0.5, 4.0))
                        .always()
                        .with_group(8, 2.5, GroupPattern::Line),
                ),
            SegmentTemplate::new("hop", 24.0)
                .with_difficulty(0.35)
                .with_obstacle(HazardSpawnPoint::new("barrier", v(0.0, 0.0, 12.0)).with_chance(0.8))
                .with_collectible(
                    CollectibleSpawnPoint::new(CollectibleKind::CoinGroup, v(0.0, 0.5, 8.0))
                        .always()
                        .with_group(6, 1.6, GroupPattern::Jump),
                ),
            SegmentTemplate::new("slalom", 36.0)
                .with_difficulty(0.55)
                .with_obstacle(HazardSpawnPoint::new("cone", v(-1.5, 0.0, 10.0)).always())
                .with_obstacle(HazardSpawnPoint::new("cone", v(1.5, 0.0, 22.0)).always())
                .with_collectible(
                    CollectibleSpawnPoint::new(CollectibleKind::CoinGroup, v(0.0, 0.5, 6.0))
                        .with_chance(0.9)
                        .with_group(10, 2.4, GroupPattern::Zigzag),
                )
                .with_collectible(
                    CollectibleSpawnPoint::new(CollectibleKind::SpeedBoost, v(0.0, 1.0, 30.0))
                        .with_chance(0.2),
                ),
            SegmentTemplate::new("gauntlet", 40.0)
                .with_difficulty(0.85)
                .no_repeat()
                .with_enemy(HazardSpawnPoint::new("drone", v(0.0, 2.0, 15.0)).with_chance(0.6))
                .with_enemy(HazardSpawnPoint::new("crawler", v(1.5, 0.0, 28.0)).with_chance(0.4))
                .with_collectible(
                    CollectibleSpawnPoint::new(CollectibleKind::CoinGroup, v(0.0, 0.5, 18.0))
                        .always()
                        .with_group(7, 3.0, GroupPattern::Arc),
                )
                .with_collectible(
                    CollectibleSpawnPoint::new(CollectibleKind::Magnet, v(-1.5, 1.0, 34.0))
                        .with_chance(0.15),
                ),
            SegmentTemplate::new("tower", 28.0)
                .with_difficulty(0.6)
                .no_repeat()
                .with_collectible(
                    CollectibleSpawnPoint::new(CollectibleKind::CoinGroup, v(0.0, 0.5, 14.0))
                        .always()
                        .with_group(6, 1.5, GroupPattern::Vertical),
                )
                .with_collectible(
                    CollectibleSpawnPoint::new(CollectibleKind::Multiplier, v(1.5, 1.0, 20.0))
                        .with_chance(0.1),
                ),
        ];

        let name_to_index = defs
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name.clone(), i as u32))
            .collect();
        Self { templates: defs.into_iter().map(Arc::new).collect(), name_to_index }
    }
}

/// Reject values the streamer can't work with; warn about ones it can.
fn validate_template(def: &SegmentTemplate) -> Result<(), CatalogLoadError> {
    if !def.length.is_finite() || def.length <= 0.0 {
        return Err(CatalogLoadError::InvalidLength { name: def.name.clone(), length: def.length });
    }
    if !(0.0..=1.0).contains(&def.difficulty_weight) {
        return Err(CatalogLoadError::OutOfRange {
            name: def.name.clone(),
            field: "difficulty_weight",
            value: def.difficulty_weight,
        });
    }

    let chances = def
        .collectibles
        .iter()
        .map(|p| p.spawn_chance)
        .chain(def.enemies.iter().chain(def.obstacles.iter()).map(|p| p.spawn_chance));
    for chance in chances {
        if !(0.0..=1.0).contains(&chance) {
            return Err(CatalogLoadError::OutOfRange {
                name: def.name.clone(),
                field: "spawn_chance",
                value: chance,
            });
        }
    }

    for point in def.collectibles.iter().filter(|p| p.kind.is_group()) {
        if !point.group.spacing.is_finite() {
            return Err(CatalogLoadError::OutOfRange {
                name: def.name.clone(),
                field: "group.spacing",
                value: point.group.spacing,
            });
        }
        if point.group.count == 1
            && matches!(point.group.pattern, GroupPattern::Arc | GroupPattern::Jump)
        {
            warn!(
                "Catalog: '{}' has a one-coin {:?} group; it will spawn a single coin at its anchor",
                def.name, point.group.pattern
            );
        }
    }
    Ok(())
}

// ---------- Asset loader for `.catalog.ron` ----------

#[derive(Default)]
pub struct SegmentCatalogLoader;

impl AssetLoader for SegmentCatalogLoader {
    type Asset = SegmentCatalog;
    type Settings = ();
    type Error = CatalogLoadError;

    fn extensions(&self) -> &[&str] {
        &["catalog.ron"]
    }

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &Self::Settings,
        _load_context: &mut LoadContext<'_>,
    ) -> Result<Self::Asset, Self::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        SegmentCatalog::from_ron(&bytes)
    }
}

// ---------- Loader errors ----------

#[derive(thiserror::Error, Debug)]
pub enum CatalogLoadError {
    #[error("I/O while reading catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(String),
    #[error("Catalog has no templates")]
    Empty,
    #[error("Duplicate template name '{name}' (first idx {first}, second idx {second})")]
    DuplicateName { name: String, first: u32, second: u32 },
    #[error("Template '{name}' has unusable length {length}")]
    InvalidLength { name: String, length: f32 },
    #[error("Template '{name}': {field} = {value} is outside its valid range")]
    OutOfRange { name: String, field: &'static str, value: f32 },
}
