//! Level walkthrough
//!
//! Loads the vault level from RON data, walks a camera down the corridor,
//! pulls the lever and watches the cascade open the gate and the exit.
//! Once the exit is open the level is reloaded to show a clean switch.
//!
//! Usage: `level_walkthrough [data_dir]` (defaults to `level_app/data`).

mod data;

use std::path::PathBuf;
use std::sync::Arc;
use tile_engine::content::{Asset, AssetGeometry};
use tile_engine::foundation::logging;
use tile_engine::foundation::math::Point3;
use tile_engine::prelude::*;

const FRAME_TIME: f32 = 1.0 / 30.0;
const MAX_FRAMES: u32 = 600;
const NAV_REBUILD_INTERVAL: u32 = 10;
const LEVER_FRAME: u32 = 45;

/// Camera that walks a straight line at constant speed
struct WalkCamera {
    start: Vec3,
    end: Vec3,
    speed: f32,
    travelled: f32,
}

impl WalkCamera {
    fn new(start: Vec3, end: Vec3, speed: f32) -> Self {
        Self { start, end, speed, travelled: 0.0 }
    }

    fn advance(&mut self, delta_time: f32) {
        self.travelled = (self.travelled + self.speed * delta_time).min((self.end - self.start).norm());
    }

    fn reset(&mut self) {
        self.travelled = 0.0;
    }

    fn position(&self) -> Vec3 {
        let direction = (self.end - self.start).try_normalize(f32::EPSILON).unwrap_or_else(Vec3::z);
        self.start + direction * self.travelled
    }

    fn frustum(&self) -> Frustum {
        let eye = self.position();
        let target = eye + (self.end - self.start).try_normalize(f32::EPSILON).unwrap_or_else(Vec3::z);
        let projection = Mat4::new_perspective(16.0 / 9.0, 70f32.to_radians(), 0.1, 100.0);
        let view = Mat4::look_at_rh(&Point3::from(eye), &Point3::from(target), &Vec3::y());
        Frustum::from_matrix(&(projection * view))
    }
}

fn main() -> Result<(), RuntimeError> {
    logging::init();

    let data_dir = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("level_app/data"), PathBuf::from);
    log::info!("Reading level data from {}", data_dir.display());

    let config = EngineConfig::load_from_file(&data_dir.join("engine.toml").to_string_lossy())?;
    let assets: Vec<Asset> = data::load_ron(&data_dir.join("assets.ron"))?;
    let geometry: Vec<AssetGeometry> = data::load_ron(&data_dir.join("content.ron"))?;
    let level: Level = data::load_ron(&data_dir.join("vault.ron"))?;

    let library = Arc::new(AssetLibrary::from_assets(assets));
    let content = Box::new(StaticContent::from_geometry(geometry));
    let mut runtime = LevelRuntime::new(config, content, DeferredNavMesh::new());
    let mut camera = WalkCamera::new(Vec3::new(2.0, 1.6, 0.5), Vec3::new(2.0, 1.6, 14.0), 1.5);

    runtime.begin_load(level.clone(), Arc::clone(&library));

    let mut ready_frame = None;
    let mut reloaded = false;

    for frame in 0..MAX_FRAMES {
        runtime.update(FRAME_TIME, camera.position(), &camera.frustum());
        if frame % NAV_REBUILD_INTERVAL == 0 {
            runtime.nav_mut().process();
        }

        if let Some(ready) = ready_frame {
            camera.advance(FRAME_TIME);
            if frame == ready + LEVER_FRAME {
                match runtime.interact("lever")? {
                    Some(_) => log::info!("Pulled the lever"),
                    None => log::warn!("The lever did not move"),
                }
            }
        }

        let mut exit_opened = false;
        for event in runtime.drain_events() {
            match event {
                RuntimeEvent::LevelReady(name) => {
                    if let Some(report) = runtime.last_report() {
                        for message in report.messages() {
                            log::warn!("Load of '{}': {}", name, message);
                        }
                    }
                    ready_frame = Some(frame);
                }
                RuntimeEvent::LevelFailed(name) => {
                    log::error!("Level '{}' failed to load", name);
                    return match runtime.last_report().and_then(LoadReport::error) {
                        Some(error) => Err(error.clone().into()),
                        None => Ok(()),
                    };
                }
                RuntimeEvent::Trigger(TriggerEvent::Started { item, trigger, .. }) => {
                    log::info!("Frame {}: '{}' ran '{}'", frame, item, trigger);
                }
                RuntimeEvent::Trigger(TriggerEvent::Completed(completion)) => {
                    log::info!(
                        "Frame {}: '{}' settled, {} objects affected",
                        frame,
                        completion.starter_trigger,
                        completion.affected.len()
                    );
                    if let Some(loaded) = runtime.level() {
                        for &index in &completion.affected {
                            let Some(item) = loaded.triggers.item(index) else {
                                continue;
                            };
                            for emitter in item.emitters().iter().filter(|emitter| emitter.active) {
                                log::info!("  '{}' emits '{}' at {:.1?}", item.id(), emitter.name, emitter.position.as_slice());
                            }
                        }
                    }
                }
                RuntimeEvent::ExitOpened(id) => {
                    log::info!("Frame {}: exit '{}' is open", frame, id);
                    exit_opened = true;
                }
                RuntimeEvent::GraphUpdated(update) => {
                    log::debug!(
                        "Frame {}: navmesh generation {} ({} obstacles, {} links)",
                        frame,
                        update.generation,
                        update.obstacles,
                        update.connections
                    );
                }
            }
        }

        if frame % 30 == 0 && runtime.is_ready() {
            let visible = runtime.visible_set().items().len();
            let shown = runtime.level().map_or(0, |loaded| {
                loaded
                    .pools
                    .all_slots()
                    .filter(|slot| loaded.pools.instance(*slot).is_some_and(|instance| instance.is_visible()))
                    .count()
            });
            log::info!(
                "Frame {}: camera at {:.1?}, {} placements visible, {} instances drawn",
                frame,
                camera.position().as_slice(),
                visible,
                shown
            );
        }

        if exit_opened {
            if reloaded {
                log::info!("Walkthrough finished");
                return Ok(());
            }
            log::info!("Reloading '{}'", level.name);
            runtime.begin_load(level.clone(), Arc::clone(&library));
            camera.reset();
            ready_frame = None;
            reloaded = true;
        }
    }

    log::warn!("Walkthrough ran out of frames");
    Ok(())
}
