//! Level plugin wiring (glue).
//! - Catalog asset/loader, with a built-in fallback
//! - Provider, spawners and generator as resources, built once the catalog is ready
//! - Streaming, restart and reveal systems, ordered by `LevelSet`

use bevy::asset::LoadState;
use bevy::prelude::*;

use super::catalog::{SegmentCatalog, SegmentCatalogAssetPlugin};
use super::config::StreamingConfig;
use super::core::FORWARD;
use super::generator::LevelGenerator;
use super::provider::{ActiveProvider, CatalogProvider};
use crate::spawn::{CollectibleSpawner, CollectibleTable, ContentSpawner, HazardSpawners};
use crate::state::GameState;

/// Where the catalog lives and the seed everything random derives from.
#[derive(Resource, Clone)]
pub struct LevelSettings {
    pub catalog_path: String,
    pub world_seed: u64,
}
impl Default for LevelSettings {
    fn default() -> Self {
        Self {
            catalog_path: "level/segments.catalog.ron".to_string(),
            world_seed: 1337,
        }
    }
}

/// Handle to the loaded SegmentCatalog asset.
#[derive(Resource, Default)]
pub struct SegmentCatalogHandle(pub Handle<SegmentCatalog>);

/// Flush the level and rebuild the initial window at `start`.
#[derive(Event, Clone, Copy, Debug)]
pub struct RestartRun {
    pub start: f32,
}

/// The entity whose track position drives the streaming window.
#[derive(Component)]
pub struct StreamFocus;

/// Per-frame ordering: restarts land before the window is maintained.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum LevelSet {
    Restart,
    Stream,
    Reveal,
}

pub struct LevelPlugin;
impl Plugin for LevelPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(SegmentCatalogAssetPlugin)
            .init_resource::<LevelSettings>()
            .init_resource::<SegmentCatalogHandle>()
            .init_resource::<StreamingConfig>()
            .init_resource::<CollectibleTable>()
            .add_event::<RestartRun>()
            .configure_sets(
                Update,
                (
                    LevelSet::Restart,
                    LevelSet::Stream.after(LevelSet::Restart),
                    LevelSet::Reveal.after(LevelSet::Stream),
                )
                    .run_if(in_state(GameState::Running)),
            )
            .add_systems(Startup, load_catalog)
            .add_systems(Update, start_level_when_ready.run_if(in_state(GameState::Loading)))
            .add_systems(Update, handle_restart.in_set(LevelSet::Restart))
            .add_systems(Update, stream_segments.in_set(LevelSet::Stream))
            .add_systems(Update, (advance_reveals, age_collectibles).in_set(LevelSet::Reveal))
            .add_systems(Last, teardown_on_exit);
    }
}

/// Everything the generator drives, built and initialized together.
pub struct LevelAssembly {
    pub generator: LevelGenerator,
    pub provider: ActiveProvider,
    pub collectibles: CollectibleSpawner,
    pub hazards: HazardSpawners,
}

impl LevelAssembly {
    pub fn build(
        catalog: &SegmentCatalog,
        config: &StreamingConfig,
        table: &CollectibleTable,
        seed: u64,
    ) -> Self {
        let mut provider = CatalogProvider::new(catalog, seed);
        let mut collectibles = CollectibleSpawner::new(table, seed);
        let mut hazards = HazardSpawners::new(config.hazard_prewarm, seed);
        let mut generator = LevelGenerator::new(config.clone());
        generator.initialize(&mut provider, &mut spawner_set(&mut collectibles, &mut hazards));

        Self {
            generator,
            provider: ActiveProvider(Box::new(provider)),
            collectibles,
            hazards,
        }
    }

    pub fn insert(self, commands: &mut Commands) {
        commands.insert_resource(self.generator);
        commands.insert_resource(self.provider);
        commands.insert_resource(self.collectibles);
        commands.insert_resource(self.hazards);
    }
}

/// Every spawner the generator populates segments through.
pub fn spawner_set<'a>(
    collectibles: &'a mut CollectibleSpawner,
    hazards: &'a mut HazardSpawners,
) -> [&'a mut dyn ContentSpawner; 3] {
    let HazardSpawners { enemies, obstacles } = hazards;
    [collectibles, enemies, obstacles]
}

/// Startup: request loading the catalog, store handle.
fn load_catalog(
    mut handle_res: ResMut<SegmentCatalogHandle>,
    settings: Res<LevelSettings>,
    assets: Res<AssetServer>,
) {
    if handle_res.0.is_strong() {
        return;
    }
    handle_res.0 = assets.load(settings.catalog_path.as_str());
    info!(
        "Level: loading catalog from '{}', world_seed={}",
        settings.catalog_path, settings.world_seed
    );
}

/// Loading: once the catalog is in (or failed to load), assemble the level and run.
fn start_level_when_ready(
    mut commands: Commands,
    handle_res: Res<SegmentCatalogHandle>,
    catalogs: Res<Assets<SegmentCatalog>>,
    assets: Res<AssetServer>,
    settings: Res<LevelSettings>,
    config: Res<StreamingConfig>,
    table: Res<CollectibleTable>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    let builtin;
    let catalog = match catalogs.get(&handle_res.0) {
        Some(catalog) => {
            info!("Level: catalog loaded ({} templates)", catalog.len());
            catalog
        }
        None => match assets.load_state(handle_res.0.id()) {
            LoadState::Failed(err) => {
                warn!("Level: catalog failed to load ({err}); using the built-in set");
                builtin = SegmentCatalog::builtin();
                &builtin
            }
            _ => return,
        },
    };

    LevelAssembly::build(catalog, &config, &table, settings.world_seed).insert(&mut commands);
    next_state.set(GameState::Running);
}

pub fn stream_segments(
    focus: Query<&Transform, With<StreamFocus>>,
    mut generator: ResMut<LevelGenerator>,
    mut provider: ResMut<ActiveProvider>,
    mut collectibles: ResMut<CollectibleSpawner>,
    mut hazards: ResMut<HazardSpawners>,
) {
    let Ok(tf) = focus.single() else {
        return;
    };
    let reference = tf.translation.dot(FORWARD);
    generator.tick(
        reference,
        provider.0.as_mut(),
        &mut spawner_set(&mut collectibles, &mut hazards),
    );
}

pub fn handle_restart(
    mut restarts: EventReader<RestartRun>,
    mut generator: ResMut<LevelGenerator>,
    mut provider: ResMut<ActiveProvider>,
    mut collectibles: ResMut<CollectibleSpawner>,
    mut hazards: ResMut<HazardSpawners>,
) {
    // Several requests in one frame collapse into the last one.
    let Some(restart) = restarts.read().last().copied() else {
        return;
    };
    generator.reset(
        restart.start,
        provider.0.as_mut(),
        &mut spawner_set(&mut collectibles, &mut hazards),
    );
}

fn advance_reveals(time: Res<Time>, mut generator: ResMut<LevelGenerator>) {
    let finished = generator.advance_reveals(time.delta());
    if finished > 0 {
        trace!("Level: {} reveals finished", finished);
    }
}

/// Coin age drives the debug view's bobbing markers.
fn age_collectibles(time: Res<Time>, mut collectibles: ResMut<CollectibleSpawner>) {
    collectibles.tick_age(time.delta_secs());
}

/// Last: on app exit, drop every segment, collectible and hazard pool.
/// Resources are optional since the level may still be loading.
pub fn teardown_on_exit(
    mut exits: EventReader<AppExit>,
    generator: Option<ResMut<LevelGenerator>>,
    collectibles: Option<ResMut<CollectibleSpawner>>,
    hazards: Option<ResMut<HazardSpawners>>,
) {
    if exits.read().last().is_none() {
        return;
    }
    if let Some(mut generator) = generator {
        generator.teardown();
    }
    if let Some(mut collectibles) = collectibles {
        collectibles.teardown();
    }
    if let Some(mut hazards) = hazards {
        hazards.teardown();
    }
}
