//! Cooperative level loading

use crate::config::EngineConfig;
use crate::content::{AssetGeometry, AssetLibrary, ContentResolver, IdAllocator, Level, LevelError};
use crate::pool::{InstancePools, PoolPlan};
use crate::trigger::{SceneryItem, TriggerEngine};
use crate::visibility::PortalGraph;
use std::collections::HashMap;
use std::sync::Arc;

/// Outcome of a load, good or bad
///
/// Warnings collected along the way and the fatal error (if any) end up
/// here, so callers get one result to inspect instead of a trail of logs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    messages: Vec<String>,
    error: Option<LevelError>,
    complete: bool,
}

impl LoadReport {
    fn warn(&mut self, message: String) {
        log::warn!("{}", message);
        self.messages.push(message);
    }

    fn fail(&mut self, error: LevelError) {
        log::error!("Level load failed: {}", error);
        self.messages.push(error.to_string());
        self.error = Some(error);
    }

    /// Warnings and errors, in the order they happened
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Fatal error that stopped the load
    pub fn error(&self) -> Option<&LevelError> {
        self.error.as_ref()
    }

    /// Whether the level finished loading
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Whether the load was aborted
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Result of one [`LevelLoader::step`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// More steps are needed
    Pending,
    /// The level is built; take it with [`LevelLoader::finish`]
    Ready,
    /// The load was aborted; see [`LevelLoader::report`]
    Failed,
}

/// Everything the runtime needs to drive one level
#[derive(Debug)]
pub struct LoadedLevel {
    /// Level data as loaded
    pub level: Level,
    /// Asset library the level was built against
    pub library: Arc<AssetLibrary>,
    /// Instance pools
    pub pools: InstancePools,
    /// Portal graph over the map placements
    pub graph: PortalGraph,
    /// Interactive objects
    pub triggers: TriggerEngine,
}

#[derive(Debug)]
enum Stage {
    Plan,
    Resolve {
        plan: PoolPlan,
        pending: Vec<String>,
        resolved: HashMap<String, Arc<AssetGeometry>>,
    },
    Allocate {
        plan: PoolPlan,
        resolved: HashMap<String, Arc<AssetGeometry>>,
    },
    Graph(InstancePools),
    Scenery(InstancePools, PortalGraph),
    Ready(Box<LoadedLevel>),
    Failed,
    Taken,
}

impl Stage {
    fn name(&self) -> &'static str {
        match self {
            Stage::Plan => "plan",
            Stage::Resolve { .. } => "resolve content",
            Stage::Allocate { .. } => "allocate pools",
            Stage::Graph(_) => "build portal graph",
            Stage::Scenery(..) => "build scenery",
            Stage::Ready(_) => "ready",
            Stage::Failed => "failed",
            Stage::Taken => "taken",
        }
    }
}

/// Builds a [`LoadedLevel`] one step at a time
///
/// Content is resolved one asset per step so a frame loop can keep
/// running while a large level comes in.
#[derive(Debug)]
pub struct LevelLoader {
    name: String,
    level: Option<Level>,
    library: Arc<AssetLibrary>,
    config: EngineConfig,
    stage: Stage,
    report: LoadReport,
}

impl LevelLoader {
    /// Prepare to load `level` against `library`
    pub fn new(level: Level, library: Arc<AssetLibrary>, config: EngineConfig) -> Self {
        log::info!("Loading level '{}'", level.name);
        Self {
            name: level.name.clone(),
            level: Some(level),
            library,
            config,
            stage: Stage::Plan,
            report: LoadReport::default(),
        }
    }

    /// Name of the level being loaded
    pub fn level_name(&self) -> &str {
        &self.name
    }

    /// Warnings and errors so far
    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Run one loading step
    pub fn step(&mut self, content: &dyn ContentResolver) -> LoadStatus {
        let stage = std::mem::replace(&mut self.stage, Stage::Taken);
        let before = stage.name();

        self.stage = match self.advance(stage, content) {
            Ok(next) => next,
            Err(error) => {
                self.report.fail(error);
                Stage::Failed
            }
        };
        if self.stage.name() != before {
            log::info!("Level '{}': {} -> {}", self.level_name(), before, self.stage.name());
        }

        match self.stage {
            Stage::Ready(_) => LoadStatus::Ready,
            Stage::Failed | Stage::Taken => LoadStatus::Failed,
            _ => LoadStatus::Pending,
        }
    }

    /// Step until the load finishes either way
    pub fn run_to_end(&mut self, content: &dyn ContentResolver) -> LoadStatus {
        loop {
            match self.step(content) {
                LoadStatus::Pending => continue,
                status => return status,
            }
        }
    }

    /// Take the built level, or the report explaining why there is none
    pub fn finish(mut self) -> Result<(LoadedLevel, LoadReport), LoadReport> {
        match std::mem::replace(&mut self.stage, Stage::Taken) {
            Stage::Ready(loaded) => {
                self.report.complete = true;
                Ok((*loaded, self.report))
            }
            _ => Err(self.report),
        }
    }

    fn advance(&mut self, stage: Stage, content: &dyn ContentResolver) -> Result<Stage, LevelError> {
        let level = match self.level.as_ref() {
            Some(level) => level,
            None => return Ok(stage),
        };

        match stage {
            Stage::Plan => {
                let plan = PoolPlan::new(level, &self.library)?;
                let mut pending: Vec<String> = plan.asset_names().map(str::to_string).collect();
                pending.reverse();
                Ok(Stage::Resolve { plan, pending, resolved: HashMap::new() })
            }
            Stage::Resolve { plan, mut pending, mut resolved } => match pending.pop() {
                Some(name) => {
                    match content.resolve(&name) {
                        Some(geometry) => {
                            resolved.insert(name, geometry);
                        }
                        None => self.report.warn(format!("Missing content for asset '{}'", name)),
                    }
                    Ok(Stage::Resolve { plan, pending, resolved })
                }
                None => Ok(Stage::Allocate { plan, resolved }),
            },
            Stage::Allocate { plan, resolved } => Ok(Stage::Graph(plan.allocate(&resolved))),
            Stage::Graph(pools) => {
                let graph = PortalGraph::build(level, &self.library, &pools, self.config.visibility.portal_epsilon)?;
                Ok(Stage::Scenery(pools, graph))
            }
            Stage::Scenery(pools, graph) => {
                let items = build_scenery(level, &self.library, &pools)?;
                let triggers = TriggerEngine::new(items, &self.config.triggers);
                let level = self.level.take().unwrap_or_default();
                Ok(Stage::Ready(Box::new(LoadedLevel {
                    level,
                    library: Arc::clone(&self.library),
                    pools,
                    graph,
                    triggers,
                })))
            }
            done @ (Stage::Ready(_) | Stage::Failed | Stage::Taken) => Ok(done),
        }
    }
}

/// Pair every object with an id and its pool slot
fn build_scenery(level: &Level, library: &AssetLibrary, pools: &InstancePools) -> Result<Vec<SceneryItem>, LevelError> {
    let mut ids = IdAllocator::new();
    for object in &level.objects {
        if let Some(id) = &object.id {
            if !ids.reserve(id) {
                return Err(LevelError::DuplicateObjectId(id.clone()));
            }
        }
    }

    let mut items = Vec::with_capacity(level.objects.len());
    for (index, object) in level.objects.iter().enumerate() {
        let id = object.id.clone().unwrap_or_else(|| ids.allocate());
        let slot = pools.resolve_object(level, library, index, object, &id)?;
        if slot.is_none() {
            log::debug!("Object '{}' has no instance", id);
        }
        items.push(SceneryItem::new(id, index, object, slot, pools));
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{
        Asset, AssetReference, MapPlacement, ObjectFlags, ObjectReference, ObjectTarget, PathfindingUsage,
        StaticContent,
    };
    use crate::foundation::math::{Transform, Vec3};
    use crate::spatial::AABB;

    fn geometry(name: &str) -> AssetGeometry {
        AssetGeometry {
            name: name.to_string(),
            bounds: AABB::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0)),
            lights: Vec::new(),
        }
    }

    fn library() -> Arc<AssetLibrary> {
        let room = Asset {
            name: "room".to_string(),
            references: vec![
                AssetReference {
                    id: Some("floor".to_string()),
                    asset: "floor".to_string(),
                    transform: Transform::identity(),
                    pathfinding: PathfindingUsage::Walkable,
                },
                AssetReference {
                    id: Some("door".to_string()),
                    asset: "door".to_string(),
                    transform: Transform::from_position(Vec3::new(0.5, 0.0, 1.0)),
                    pathfinding: PathfindingUsage::DynamicObstacle,
                },
            ],
            connections: Vec::new(),
            pathfinding: PathfindingUsage::Walkable,
        };
        let crate_asset = Asset {
            name: "crate".to_string(),
            references: Vec::new(),
            connections: Vec::new(),
            pathfinding: PathfindingUsage::StaticObstacle,
        };
        Arc::new(AssetLibrary::from_assets([room, crate_asset]))
    }

    fn object(id: Option<&str>, target: ObjectTarget) -> ObjectReference {
        ObjectReference {
            id: id.map(str::to_string),
            target,
            flags: ObjectFlags::FURNITURE,
            initial_state: String::new(),
            animations: Vec::new(),
            triggers: Vec::new(),
            emitters: Vec::new(),
            nav_link: None,
        }
    }

    fn level(objects: Vec<ObjectReference>) -> Level {
        Level {
            name: "test".to_string(),
            map: vec![MapPlacement { asset: "room".to_string(), transform: Transform::identity() }],
            objects,
        }
    }

    fn crate_at(x: f32) -> ObjectTarget {
        ObjectTarget::Asset {
            name: "crate".to_string(),
            transform: Transform::from_position(Vec3::new(x, 0.0, 0.0)),
        }
    }

    #[test]
    fn test_load_steps_until_ready() {
        let content = StaticContent::from_geometry([geometry("floor"), geometry("door"), geometry("crate")]);
        let objects = vec![
            object(None, crate_at(0.0)),
            object(
                Some("front_door"),
                ObjectTarget::SubPlacement { placement: 0, reference: "door".to_string() },
            ),
            object(None, crate_at(2.0)),
        ];
        let mut loader = LevelLoader::new(level(objects), library(), EngineConfig::default());

        let mut steps = 0;
        while loader.step(&content) == LoadStatus::Pending {
            steps += 1;
        }
        // plan, three assets, end of resolve, allocate, graph
        assert_eq!(steps, 7);

        let (loaded, report) = loader.finish().unwrap();
        assert!(report.is_complete());
        assert!(report.messages().is_empty());
        assert_eq!(loaded.pools.instance_count(), 4);
        assert_eq!(loaded.graph.items().len(), 1);

        let ids: Vec<&str> = loaded.triggers.items().iter().map(|item| item.id()).collect();
        assert_eq!(ids, vec!["object_0", "front_door", "object_1"]);
        assert!(loaded.triggers.item_by_id("front_door").unwrap().owns_dynamic_obstacle());
    }

    #[test]
    fn test_missing_content_is_reported_but_not_fatal() {
        let content = StaticContent::from_geometry([geometry("floor"), geometry("door")]);
        let mut loader = LevelLoader::new(level(vec![object(Some("box"), crate_at(0.0))]), library(), EngineConfig::default());

        assert_eq!(loader.run_to_end(&content), LoadStatus::Ready);
        let (loaded, report) = loader.finish().unwrap();

        assert_eq!(report.messages().len(), 1);
        assert!(report.messages()[0].contains("crate"));
        assert!(loaded.pools.pool("crate").is_none());
        assert_eq!(loaded.triggers.item_by_id("box").unwrap().slot(), None);
    }

    #[test]
    fn test_corrupt_map_reference_fails_load() {
        let content = StaticContent::from_geometry([geometry("floor"), geometry("door"), geometry("crate")]);
        let objects = vec![object(
            Some("ghost"),
            ObjectTarget::SubPlacement { placement: 3, reference: "door".to_string() },
        )];
        let mut loader = LevelLoader::new(level(objects), library(), EngineConfig::default());

        assert_eq!(loader.run_to_end(&content), LoadStatus::Failed);
        let report = loader.finish().unwrap_err();
        assert!(report.is_failed());
        assert!(!report.is_complete());
        assert_eq!(report.error(), Some(&LevelError::CorruptMapReference { placement: 3, map_len: 1 }));
    }

    #[test]
    fn test_failure_report_keeps_earlier_warnings() {
        crate::foundation::logging::init_for_tests();
        let content = StaticContent::from_geometry([geometry("floor"), geometry("door")]);
        let objects = vec![object(Some("box"), crate_at(0.0)), object(Some("box"), crate_at(1.0))];
        let mut loader = LevelLoader::new(level(objects), library(), EngineConfig::default());

        assert_eq!(loader.run_to_end(&content), LoadStatus::Failed);
        let report = loader.finish().unwrap_err();
        assert_eq!(report.messages().len(), 2);
        assert_eq!(report.error(), Some(&LevelError::DuplicateObjectId("box".to_string())));
    }

    #[test]
    fn test_unknown_map_asset_fails_at_planning() {
        let content = StaticContent::new();
        let mut bad = level(Vec::new());
        bad.map[0].asset = "cathedral".to_string();
        let mut loader = LevelLoader::new(bad, library(), EngineConfig::default());

        assert_eq!(loader.step(&content), LoadStatus::Failed);
        assert!(matches!(loader.report().error(), Some(LevelError::UnknownAsset { .. })));
    }
}
