use bevy::prelude::*;
use std::collections::BTreeMap;

pub mod catalog;
pub mod coaster;
pub mod config;
pub mod coords;
pub mod rcd;
pub mod sim_rng;
pub mod simulation_sets;
pub mod track;
pub mod voxel_world;

#[cfg(any(test, feature = "bench"))]
pub mod test_harness;

#[cfg(test)]
mod integration_tests;

pub use simulation_sets::SimulationSet;

// ---------------------------------------------------------------------------
// Saveable trait + registry for park persistence
// ---------------------------------------------------------------------------

/// Trait for resources that are persisted in a park save.
///
/// Each resource owns its encoding; a save is the map from `SAVE_KEY` to the
/// encoded bytes. A plugin registers its resources in its `build()`.
pub trait Saveable: Resource + Default + Send + Sync + 'static {
    /// Unique and stable key of this resource in a save.
    const SAVE_KEY: &'static str;

    /// Serialize this resource. `None` skips it (e.g. nothing worth saving).
    fn save_to_bytes(&self) -> Option<Vec<u8>>;

    /// Deserialize a resource saved by `save_to_bytes`.
    fn load_from_bytes(bytes: &[u8]) -> Self;
}

/// Decode bytes via `bitcode::decode`, logging a warning on failure.
pub fn decode_or_warn<T: bitcode::DecodeOwned>(key: &str, bytes: &[u8]) -> Option<T> {
    match bitcode::decode(bytes) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(
                "Saveable {}: failed to decode {} bytes, falling back to default: {}",
                key,
                bytes.len(),
                e
            );
            None
        }
    }
}

pub type SaveFn = Box<dyn Fn(&World) -> Option<Vec<u8>> + Send + Sync>;
pub type LoadFn = Box<dyn Fn(&mut World, &[u8]) + Send + Sync>;
pub type ResetFn = Box<dyn Fn(&mut World) + Send + Sync>;

/// Type-erased save/load/reset operations for one registered resource.
pub struct SaveableEntry {
    pub key: String,
    pub save_fn: SaveFn,
    pub load_fn: LoadFn,
    pub reset_fn: ResetFn,
}

/// Registry of every saveable resource, filled during plugin setup.
#[derive(Resource, Default)]
pub struct SaveableRegistry {
    pub entries: Vec<SaveableEntry>,
}

impl SaveableRegistry {
    /// Register a resource type. A duplicate `SAVE_KEY` is ignored with a
    /// warning (and panics in debug builds).
    pub fn register<T: Saveable>(&mut self) {
        let key = T::SAVE_KEY.to_string();
        if self.entries.iter().any(|e| e.key == key) {
            warn!("SaveableRegistry: duplicate key '{}', ignoring", key);
            debug_assert!(false, "SaveableRegistry: duplicate key '{}'", key);
            return;
        }
        self.entries.push(SaveableEntry {
            key,
            save_fn: Box::new(|world: &World| {
                world.get_resource::<T>().and_then(|r| r.save_to_bytes())
            }),
            load_fn: Box::new(|world: &mut World, bytes: &[u8]| {
                world.insert_resource(T::load_from_bytes(bytes));
            }),
            reset_fn: Box::new(|world: &mut World| {
                world.insert_resource(T::default());
            }),
        });
    }

    /// Encode every registered resource that has something to save.
    pub fn save_all(&self, world: &World) -> BTreeMap<String, Vec<u8>> {
        self.entries
            .iter()
            .filter_map(|entry| (entry.save_fn)(world).map(|bytes| (entry.key.clone(), bytes)))
            .collect()
    }

    /// Restore registered resources from a save. Resources whose key is
    /// absent keep their current value.
    pub fn load_all(&self, world: &mut World, save: &BTreeMap<String, Vec<u8>>) {
        for entry in &self.entries {
            if let Some(bytes) = save.get(&entry.key) {
                (entry.load_fn)(world, bytes);
            }
        }
    }

    /// Reset every registered resource (new park).
    pub fn reset_all(&self, world: &mut World) {
        for entry in &self.entries {
            (entry.reset_fn)(world);
        }
    }
}

// ---------------------------------------------------------------------------
// Core resources
// ---------------------------------------------------------------------------

/// Fixed ticks simulated so far.
#[derive(Resource, Default)]
pub struct TickCounter(pub u64);

pub fn tick_counter(mut tick: ResMut<TickCounter>) {
    tick.0 += 1;
}

/// The coaster core: fixed-rate clock, ride registry, voxel world and RNG.
///
/// The [`catalog::Catalog`] is inserted by the application after loading;
/// an empty one is used otherwise.
pub struct CoasterSimPlugin;

impl Plugin for CoasterSimPlugin {
    fn build(&self, app: &mut App) {
        simulation_sets::configure_simulation_sets(app);
        app.insert_resource(Time::<Fixed>::from_hz(config::TICK_HZ))
            .init_resource::<TickCounter>()
            .init_resource::<catalog::Catalog>()
            .add_systems(FixedUpdate, tick_counter.in_set(SimulationSet::PreSim))
            .add_plugins((sim_rng::SimRngPlugin, coaster::CoasterPlugin));
    }
}

#[cfg(test)]
mod saveable_tests {
    use super::*;

    #[derive(Resource, Default, Debug, PartialEq)]
    struct TestCounter {
        value: u32,
    }

    impl Saveable for TestCounter {
        const SAVE_KEY: &'static str = "test_counter";

        fn save_to_bytes(&self) -> Option<Vec<u8>> {
            (self.value != 0).then(|| bitcode::encode(&self.value))
        }

        fn load_from_bytes(bytes: &[u8]) -> Self {
            TestCounter {
                value: decode_or_warn(Self::SAVE_KEY, bytes).unwrap_or_default(),
            }
        }
    }

    #[test]
    fn test_registry_save_and_load() {
        let mut world = World::new();
        world.insert_resource(TestCounter { value: 42 });
        let mut registry = SaveableRegistry::default();
        registry.register::<TestCounter>();

        let save = registry.save_all(&world);
        assert_eq!(save.len(), 1);

        world.insert_resource(TestCounter::default());
        registry.load_all(&mut world, &save);
        assert_eq!(world.resource::<TestCounter>().value, 42);
    }

    #[test]
    fn test_registry_save_skips_default() {
        let mut world = World::new();
        world.insert_resource(TestCounter::default());
        let mut registry = SaveableRegistry::default();
        registry.register::<TestCounter>();
        assert!(registry.save_all(&world).is_empty());
    }

    #[test]
    fn test_registry_reset_all() {
        let mut world = World::new();
        world.insert_resource(TestCounter { value: 999 });
        let mut registry = SaveableRegistry::default();
        registry.register::<TestCounter>();
        registry.reset_all(&mut world);
        assert_eq!(world.resource::<TestCounter>().value, 0);
    }

    #[test]
    fn test_registry_load_ignores_unknown_keys() {
        let mut world = World::new();
        world.insert_resource(TestCounter { value: 5 });
        let mut registry = SaveableRegistry::default();
        registry.register::<TestCounter>();

        let mut save = BTreeMap::new();
        save.insert("unknown_feature".to_string(), vec![0xFF, 0xFF]);
        registry.load_all(&mut world, &save);
        assert_eq!(world.resource::<TestCounter>().value, 5);
    }

    #[test]
    fn test_corrupt_bytes_fall_back() {
        assert_eq!(decode_or_warn::<u32>("test", &[]), None);
    }

    #[test]
    #[should_panic(expected = "duplicate key")]
    fn test_registry_duplicate_key_panics_in_debug() {
        let mut registry = SaveableRegistry::default();
        registry.register::<TestCounter>();
        registry.register::<TestCounter>();
    }
}
