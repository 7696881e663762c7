use sparse_ecs::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Velocity {
    x: f32,
    y: f32,
}

#[test]
fn test_query_cache_basic() {
    let mut world = World::new();

    for i in 0..100 {
        let e = world.create();
        world.add_component(e, "position", Position { x: i as f32, y: 0.0 });
        world.add_component(e, "velocity", Velocity { x: 1.0, y: 1.0 });
    }

    // First read builds the cache with a full scan
    let moving = world.include(["position", "velocity"]);
    assert_eq!(moving.len(), 100);
    assert_eq!(world.query_count(), 1);

    // Same filter hits the memoized query
    assert_eq!(world.include(["position", "velocity"]).len(), 100);
    assert_eq!(world.query_count(), 1);
}

#[test]
fn test_query_cache_incremental_invalidation() {
    let mut world = World::new();

    for i in 0..50 {
        let e = world.create();
        world.add_component(e, "position", Position { x: i as f32, y: 0.0 });
    }
    assert_eq!(world.include(["position"]).len(), 50);

    // New entities after the cache was built
    for i in 0..25 {
        let e = world.create();
        world.add_component(e, "position", Position { x: i as f32, y: 1.0 });
    }
    assert_eq!(world.include(["position"]).len(), 75);
}

#[test]
fn test_stale_matches_are_dropped() {
    let mut world = World::new();
    let a = world.create();
    let b = world.create();
    world.add_component(a, "position", Position { x: 0.0, y: 0.0 });
    world.add_component(b, "position", Position { x: 1.0, y: 1.0 });
    assert_eq!(world.include(["position"]).len(), 2);

    world.remove_component(a, "position");
    let ids = world.include(["position"]).ids();
    assert!(!ids.has(&a));
    assert!(ids.has(&b));
}

#[test]
fn test_only_holder_matches_until_removed() {
    let mut world = World::new();
    let ids: Vec<_> = (0..3).map(|_| world.create()).collect();
    assert_eq!(ids[0], EntityId::from_raw(0));

    world.add_component(ids[0], "hp", 100i32);
    assert_eq!(&*world.include(["hp"]).entities(), &[ids[0]]);

    world.remove_component(ids[0], "hp");
    assert!(world.include(["hp"]).entities().is_empty());
    assert_eq!(world.entity_count(), 3);
}

#[test]
fn test_exclude_filter() {
    let mut world = World::new();
    let alive = world.create();
    let frozen = world.create();
    world.add_component(alive, "position", Position { x: 0.0, y: 0.0 });
    world.add_component(frozen, "position", Position { x: 0.0, y: 0.0 });
    world.add_component(frozen, "frozen", ());

    let filter = QueryConfig::new()
        .with_include(["position"])
        .with_exclude(["frozen"]);
    assert_eq!(&*world.query(filter.clone()).entities(), &[alive]);

    world.remove_component(frozen, "frozen");
    assert_eq!(world.query(filter).len(), 2);

    // only excludes: every live entity without the key
    assert_eq!(world.exclude(["velocity"]).len(), 2);
}

#[test]
fn test_component_order_makes_distinct_queries() {
    let mut world = World::new();
    let e = world.create();
    world.add_component(e, "position", Position { x: 0.0, y: 0.0 });
    world.add_component(e, "velocity", Velocity { x: 0.0, y: 0.0 });

    let pv = world.include(["position", "velocity"]);
    let vp = world.include(["velocity", "position"]);
    assert_ne!(pv.hash(), vp.hash());
    assert_eq!(pv.entities(), vp.entities());
    assert_eq!(world.query_count(), 2);
}

#[test]
fn test_entities_above_cache_threshold_are_shared() {
    let mut world = World::with_config(WorldConfig {
        entity_cache_threshold: 10,
        ..WorldConfig::default()
    });
    for _ in 0..20 {
        let e = world.create();
        world.add_component(e, "tag", ());
    }

    let first = world.include(["tag"]).entities();
    let second = world.include(["tag"]).entities();
    assert!(std::rc::Rc::ptr_eq(&first, &second));

    let e = world.create();
    world.add_component(e, "tag", ());
    let third = world.include(["tag"]).entities();
    assert_eq!(third.len(), 21);
    assert!(!std::rc::Rc::ptr_eq(&first, &third));
}

#[test]
fn test_query_config_from_json() {
    let config: QueryConfig =
        serde_json::from_str(r#"{ "include": ["position"], "exclude": [" frozen "] }"#).unwrap();

    let mut world = World::new();
    let e = world.create();
    world.add_component(e, "position", Position { x: 0.0, y: 0.0 });

    let query = world.query(config);
    assert_eq!(query.config().exclude, vec!["frozen".to_string()]);
    assert!(query.contains(e));
}
