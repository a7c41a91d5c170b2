//! Per-frame level driver

use super::loader::{LevelLoader, LoadReport, LoadStatus, LoadedLevel};
use super::RuntimeError;
use crate::animation::KeyframeAnimator;
use crate::config::EngineConfig;
use crate::content::{AssetLibrary, ContentResolver, Level, ObjectFlags};
use crate::foundation::collections::CallbackKey;
use crate::foundation::math::Vec3;
use crate::navigation::{GraphUpdated, NavigationEngine, ObstacleSynchronizer};
use crate::spatial::Frustum;
use crate::trigger::{TriggerError, TriggerEvent};
use crate::visibility::VisibleSet;
use std::sync::Arc;

/// Things that happened during [`LevelRuntime::update`]
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeEvent {
    /// A level finished loading and accepts interaction
    LevelReady(String),
    /// A level load was aborted
    LevelFailed(String),
    /// Trigger engine notification
    Trigger(TriggerEvent),
    /// An exit object was left passable by a completed cascade
    ExitOpened(String),
    /// The navigation engine finished a rebuild
    GraphUpdated(GraphUpdated),
}

struct ActiveLevel {
    loaded: LoadedLevel,
    obstacles: ObstacleSynchronizer,
}

/// Owns the current level and drives it frame by frame
pub struct LevelRuntime<N: NavigationEngine> {
    config: EngineConfig,
    content: Box<dyn ContentResolver>,
    nav: N,
    animator: KeyframeAnimator,
    loader: Option<LevelLoader>,
    active: Option<ActiveLevel>,
    report: Option<LoadReport>,
    visible: VisibleSet,
    events: Vec<RuntimeEvent>,
}

impl<N: NavigationEngine> LevelRuntime<N> {
    /// Create a runtime with no level
    pub fn new(config: EngineConfig, content: Box<dyn ContentResolver>, nav: N) -> Self {
        Self {
            config,
            content,
            nav,
            animator: KeyframeAnimator::new(),
            loader: None,
            active: None,
            report: None,
            visible: VisibleSet::default(),
            events: Vec::new(),
        }
    }

    /// Drop the current level and start loading `level`
    ///
    /// The previous level stops accepting interaction immediately: its
    /// in-flight callbacks are discarded and its obstacles deregistered.
    /// A load still in progress is abandoned.
    pub fn begin_load(&mut self, level: Level, library: Arc<AssetLibrary>) {
        self.unload();
        if let Some(loader) = self.loader.take() {
            log::info!("Abandoning load of level '{}'", loader.level_name());
        }
        self.report = None;
        self.loader = Some(LevelLoader::new(level, library, self.config.clone()));
    }

    /// Load `level` to completion before returning
    pub fn load_blocking(&mut self, level: Level, library: Arc<AssetLibrary>) -> Result<&LoadReport, RuntimeError> {
        self.begin_load(level, library);
        while self.step_load() == LoadStatus::Pending {}

        match &self.report {
            Some(report) => match report.error() {
                Some(error) => Err(error.clone().into()),
                None => Ok(report),
            },
            None => Err(TriggerError::NotReady.into()),
        }
    }

    /// Tear down the current level, if any
    pub fn unload(&mut self) {
        if let Some(mut active) = self.active.take() {
            log::info!("Unloading level '{}'", active.loaded.level.name);
            active.loaded.triggers.discard_callbacks();
            active.obstacles.teardown(&mut self.nav);
        }
        self.animator.clear();
        self.visible = VisibleSet::default();
    }

    /// Run one loading step if a load is in progress
    pub fn step_load(&mut self) -> LoadStatus {
        let Some(loader) = self.loader.as_mut() else {
            return if self.active.is_some() { LoadStatus::Ready } else { LoadStatus::Failed };
        };

        let status = loader.step(self.content.as_ref());
        if status == LoadStatus::Pending {
            return status;
        }

        let Some(loader) = self.loader.take() else {
            return status;
        };
        let name = loader.level_name().to_string();
        match loader.finish() {
            Ok((loaded, report)) => {
                self.activate(loaded);
                self.report = Some(report);
                log::info!("Level '{}' ready", name);
                self.events.push(RuntimeEvent::LevelReady(name));
                LoadStatus::Ready
            }
            Err(report) => {
                self.report = Some(report);
                self.events.push(RuntimeEvent::LevelFailed(name));
                LoadStatus::Failed
            }
        }
    }

    fn activate(&mut self, loaded: LoadedLevel) {
        let mut obstacles = ObstacleSynchronizer::new(self.config.navigation.clone(), &mut self.nav);
        obstacles.register_connections(&loaded.level, &loaded.triggers, &loaded.pools, &mut self.nav);
        obstacles.register_initial(&loaded.triggers, &loaded.pools, &mut self.nav);
        self.active = Some(ActiveLevel { loaded, obstacles });
    }

    /// Advance one frame
    ///
    /// Order: loading step, animations, trigger callbacks, obstacle
    /// updates, graph notifications, visibility.
    pub fn update(&mut self, delta_time: f32, camera_position: Vec3, frustum: &Frustum) {
        if self.loader.is_some() {
            self.step_load();
        }

        let Some(active) = self.active.as_mut() else {
            return;
        };
        let loaded = &mut active.loaded;

        self.animator.update(delta_time, &mut loaded.pools);

        let completions = loaded.triggers.poll(&self.animator);
        self.events
            .extend(loaded.triggers.drain_events().into_iter().map(RuntimeEvent::Trigger));

        for completion in &completions {
            active
                .obstacles
                .on_completion(completion, &loaded.triggers, &loaded.pools, &mut self.nav);

            for &index in &completion.affected {
                let Some(item) = loaded.triggers.item(index) else {
                    continue;
                };
                if item.flags().contains(ObjectFlags::EXIT) && !self.config.navigation.is_blocking(item.current_state()) {
                    log::info!("Exit '{}' opened", item.id());
                    self.events.push(RuntimeEvent::ExitOpened(item.id().to_string()));
                }
            }
        }
        self.events.extend(
            active
                .obstacles
                .poll_graph_updates()
                .into_iter()
                .map(RuntimeEvent::GraphUpdated),
        );

        self.visible = loaded.graph.visible_set(camera_position, frustum);
        loaded.graph.apply_visibility(
            &self.visible,
            frustum,
            &mut loaded.pools,
            self.config.visibility.cull_loose_objects,
        );
    }

    /// Player interaction with an item
    ///
    /// A `Started` event is queued before this returns.
    pub fn interact(&mut self, item_id: &str) -> Result<Option<CallbackKey>, RuntimeError> {
        let active = self.active.as_mut().ok_or(TriggerError::NotReady)?;
        let key = active.loaded.triggers.interact(item_id, &mut self.animator)?;
        self.events
            .extend(active.loaded.triggers.drain_events().into_iter().map(RuntimeEvent::Trigger));
        Ok(key)
    }

    /// Run a named trigger on an item
    ///
    /// A `Started` event is queued before this returns.
    pub fn invoke(&mut self, item_id: &str, trigger: &str) -> Result<Option<CallbackKey>, RuntimeError> {
        let active = self.active.as_mut().ok_or(TriggerError::NotReady)?;
        let key = active.loaded.triggers.invoke(item_id, trigger, &mut self.animator)?;
        self.events
            .extend(active.loaded.triggers.drain_events().into_iter().map(RuntimeEvent::Trigger));
        Ok(key)
    }

    /// Whether a level is loaded and accepts interaction
    pub fn is_ready(&self) -> bool {
        self.active.is_some()
    }

    /// Whether a load is in progress
    pub fn is_loading(&self) -> bool {
        self.loader.is_some()
    }

    /// The ready level
    pub fn level(&self) -> Option<&LoadedLevel> {
        self.active.as_ref().map(|active| &active.loaded)
    }

    /// Obstacle state of the ready level
    pub fn obstacles(&self) -> Option<&ObstacleSynchronizer> {
        self.active.as_ref().map(|active| &active.obstacles)
    }

    /// Report of the last finished load
    pub fn last_report(&self) -> Option<&LoadReport> {
        self.report.as_ref()
    }

    /// Result of the last visibility query
    pub fn visible_set(&self) -> &VisibleSet {
        &self.visible
    }

    /// Navigation engine
    pub fn nav(&self) -> &N {
        &self.nav
    }

    /// Mutable navigation engine
    pub fn nav_mut(&mut self) -> &mut N {
        &mut self.nav
    }

    /// Take all queued events
    pub fn drain_events(&mut self) -> Vec<RuntimeEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{
        AnimationPlan, Asset, AssetGeometry, AssetReference, Keyframe, MapPlacement, ObjectReference, ObjectTarget,
        PathfindingUsage, PortalConnection, PortalKind, StaticContent, Trigger, TriggerAction,
    };
    use crate::foundation::math::{Mat4, Point3, Transform};
    use crate::navigation::DeferredNavMesh;
    use crate::spatial::AABB;

    fn geometry(name: &str, size: Vec3) -> AssetGeometry {
        AssetGeometry { name: name.to_string(), bounds: AABB::new(Vec3::zeros(), size), lights: Vec::new() }
    }

    /// Two 4x4 rooms side by side along x, joined by an open portal
    fn library() -> Arc<AssetLibrary> {
        let room = Asset {
            name: "room".to_string(),
            references: vec![AssetReference {
                id: Some("floor".to_string()),
                asset: "floor".to_string(),
                transform: Transform::identity(),
                pathfinding: PathfindingUsage::Walkable,
            }],
            connections: vec![
                PortalConnection { position: Vec3::new(4.0, 0.0, 2.0), direction: Vec3::x(), kind: PortalKind::Open },
                PortalConnection { position: Vec3::new(0.0, 0.0, 2.0), direction: -Vec3::x(), kind: PortalKind::Open },
            ],
            pathfinding: PathfindingUsage::Walkable,
        };
        let gate = Asset {
            name: "gate".to_string(),
            references: Vec::new(),
            connections: Vec::new(),
            pathfinding: PathfindingUsage::DynamicObstacle,
        };
        Arc::new(AssetLibrary::from_assets([room, gate]))
    }

    fn content() -> Box<dyn ContentResolver> {
        Box::new(StaticContent::from_geometry([
            geometry("floor", Vec3::new(4.0, 3.0, 4.0)),
            geometry("gate", Vec3::new(0.2, 2.0, 2.0)),
        ]))
    }

    fn gate(id: &str, flags: ObjectFlags, actions: Vec<TriggerAction>) -> ObjectReference {
        ObjectReference {
            id: Some(id.to_string()),
            target: ObjectTarget::Asset {
                name: "gate".to_string(),
                transform: Transform::from_position(Vec3::new(3.9, 0.0, 1.0)),
            },
            flags,
            initial_state: "closed".to_string(),
            animations: vec![AnimationPlan {
                name: "lift".to_string(),
                keyframes: vec![
                    Keyframe { time: 0.0, offset: Transform::identity() },
                    Keyframe { time: 0.5, offset: Transform::from_position(Vec3::new(0.0, 2.5, 0.0)) },
                ],
            }],
            triggers: vec![Trigger {
                name: "open".to_string(),
                state_from: "closed".to_string(),
                state_to: "open".to_string(),
                animation: Some("lift".to_string()),
                actions,
            }],
            emitters: Vec::new(),
            nav_link: None,
        }
    }

    fn two_rooms(name: &str) -> Level {
        Level {
            name: name.to_string(),
            map: vec![
                MapPlacement { asset: "room".to_string(), transform: Transform::identity() },
                MapPlacement {
                    asset: "room".to_string(),
                    transform: Transform::from_position(Vec3::new(4.0, 0.0, 0.0)),
                },
            ],
            objects: vec![
                gate(
                    "gate",
                    ObjectFlags::DOOR,
                    vec![TriggerAction { item_id: "exit".to_string(), action_name: "open".to_string() }],
                ),
                gate("exit", ObjectFlags::EXIT, Vec::new()),
            ],
        }
    }

    fn runtime() -> LevelRuntime<DeferredNavMesh> {
        LevelRuntime::new(EngineConfig::default(), content(), DeferredNavMesh::new())
    }

    fn camera(eye: Vec3, target: Vec3) -> Frustum {
        let projection = Mat4::new_perspective(16.0 / 9.0, 1.2, 0.1, 100.0);
        let view = Mat4::look_at_rh(&Point3::from(eye), &Point3::from(target), &Vec3::y());
        Frustum::from_matrix(&(projection * view))
    }

    #[test]
    fn test_interaction_requires_ready_level() {
        let mut runtime = runtime();
        assert!(matches!(runtime.interact("gate"), Err(RuntimeError::Trigger(TriggerError::NotReady))));

        runtime.begin_load(two_rooms("a"), library());
        assert!(runtime.is_loading());
        assert!(matches!(runtime.invoke("gate", "open"), Err(RuntimeError::Trigger(TriggerError::NotReady))));
    }

    #[test]
    fn test_cascade_opens_exit_and_clears_obstacles() {
        let mut runtime = runtime();
        runtime.load_blocking(two_rooms("a"), library()).unwrap();
        assert_eq!(runtime.obstacles().unwrap().obstacle_count(), 2);

        runtime.invoke("gate", "open").unwrap().unwrap();
        let frustum = camera(Vec3::new(2.0, 1.5, 2.0), Vec3::new(6.0, 1.5, 2.0));
        runtime.update(0.25, Vec3::new(2.0, 1.5, 2.0), &frustum);
        assert_eq!(runtime.obstacles().unwrap().obstacle_count(), 2);

        runtime.update(0.25, Vec3::new(2.0, 1.5, 2.0), &frustum);
        runtime.update(0.0, Vec3::new(2.0, 1.5, 2.0), &frustum);
        assert_eq!(runtime.obstacles().unwrap().obstacle_count(), 0);

        let events = runtime.drain_events();
        let completed = events
            .iter()
            .filter(|event| matches!(event, RuntimeEvent::Trigger(TriggerEvent::Completed(_))))
            .count();
        assert_eq!(completed, 1);
        assert!(events.contains(&RuntimeEvent::ExitOpened("exit".to_string())));
        assert!(!events.contains(&RuntimeEvent::ExitOpened("gate".to_string())));
    }

    #[test]
    fn test_started_event_is_queued_by_invoke_and_survives_switch() {
        let mut runtime = runtime();
        runtime.load_blocking(two_rooms("a"), library()).unwrap();
        runtime.drain_events();

        let key = runtime.invoke("gate", "open").unwrap().unwrap();
        let events = runtime.drain_events();
        assert_eq!(
            events,
            vec![RuntimeEvent::Trigger(TriggerEvent::Started {
                callback: key,
                item: "gate".to_string(),
                trigger: "open".to_string(),
            })]
        );

        // Switching before anyone drained the queue still reports the start once
        runtime.load_blocking(two_rooms("b"), library()).unwrap();
        runtime.invoke("gate", "open").unwrap().unwrap();
        runtime.begin_load(two_rooms("c"), library());
        let frustum = camera(Vec3::new(2.0, 1.5, 2.0), Vec3::new(6.0, 1.5, 2.0));
        while runtime.is_loading() {
            runtime.update(0.1, Vec3::new(2.0, 1.5, 2.0), &frustum);
        }

        let started = runtime
            .drain_events()
            .iter()
            .filter(|event| matches!(event, RuntimeEvent::Trigger(TriggerEvent::Started { .. })))
            .count();
        assert_eq!(started, 1);
    }

    #[test]
    fn test_switching_levels_discards_old_state() {
        let mut runtime = runtime();
        runtime.load_blocking(two_rooms("a"), library()).unwrap();
        runtime.invoke("gate", "open").unwrap();
        runtime.nav_mut().process();
        assert_eq!(runtime.nav().active_obstacles().count(), 2);

        runtime.begin_load(two_rooms("b"), library());
        assert!(!runtime.is_ready());
        runtime.nav_mut().process();
        assert_eq!(runtime.nav().active_obstacles().count(), 0);

        let frustum = camera(Vec3::new(2.0, 1.5, 2.0), Vec3::new(6.0, 1.5, 2.0));
        while runtime.is_loading() {
            runtime.update(0.1, Vec3::new(2.0, 1.5, 2.0), &frustum);
        }
        runtime.update(1.0, Vec3::new(2.0, 1.5, 2.0), &frustum);

        let events = runtime.drain_events();
        assert!(events.contains(&RuntimeEvent::LevelReady("b".to_string())));
        assert!(!events
            .iter()
            .any(|event| matches!(event, RuntimeEvent::Trigger(TriggerEvent::Completed(_)))));
        assert_eq!(runtime.level().unwrap().triggers.item_by_id("gate").unwrap().current_state(), "closed");
        assert_eq!(runtime.obstacles().unwrap().obstacle_count(), 2);
    }

    #[test]
    fn test_failed_load_leaves_runtime_not_ready() {
        let mut runtime = runtime();
        let mut level = two_rooms("broken");
        level.objects.push(gate("gate", ObjectFlags::DOOR, Vec::new()));

        let result = runtime.load_blocking(level, library());
        assert!(matches!(result, Err(RuntimeError::Level(_))));
        assert!(!runtime.is_ready());
        assert!(runtime.last_report().unwrap().is_failed());
        assert_eq!(runtime.drain_events(), vec![RuntimeEvent::LevelFailed("broken".to_string())]);
    }

    #[test]
    fn test_visibility_follows_camera_room() {
        let mut runtime = runtime();
        runtime.load_blocking(two_rooms("a"), library()).unwrap();

        let eye = Vec3::new(2.0, 1.5, 2.0);
        runtime.update(0.0, eye, &camera(eye, Vec3::new(6.0, 1.5, 2.0)));
        assert_eq!(runtime.visible_set().items(), &[0, 1]);

        let outside = Vec3::new(-10.0, 1.5, 2.0);
        runtime.update(0.0, outside, &camera(outside, Vec3::new(0.0, 1.5, 2.0)));
        assert!(runtime.visible_set().is_empty());
        let pools = &runtime.level().unwrap().pools;
        assert!(pools.all_slots().all(|slot| !pools.instance(slot).unwrap().is_visible()));
    }
}
