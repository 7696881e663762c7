//! Example: Basic ECS usage
//!
//! Creates entities, attaches keyed components, reads them back through
//! memoized queries and watches query membership change.

use sparse_ecs::prelude::*;

#[derive(Debug)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Debug)]
struct Velocity {
    x: f32,
    y: f32,
}

#[derive(Debug)]
struct Health(u32);

fn main() -> Result<()> {
    let mut world = World::new();

    println!("Creating entities...");

    let entity1 = world.create();
    world.add_component(entity1, "position", Position { x: 0.0, y: 0.0 });
    world.add_component(entity1, "velocity", Velocity { x: 1.0, y: 0.5 });
    println!("Created entity {entity1}");

    let entity2 = world.create();
    world
        .entity_mut(entity2)?
        .add("position", Position { x: 10.0, y: 20.0 })
        .add("velocity", Velocity { x: -1.0, y: 2.0 })
        .add("health", Health(100));
    println!("Created entity {entity2}");

    let entity3 = world.create();
    world.add_component(entity3, "position", Position { x: 5.0, y: 5.0 });
    println!("Created entity {entity3}");

    let moving = world.include(["position", "velocity"]);
    moving.on(
        QueryEventKind::Removed,
        listener(|event: &QueryEvent| println!("  entity {} left the moving set", event.entity_id())),
    );

    println!("\nMoving entities:");
    for &id in moving.entities().iter() {
        let pos = world.get_component::<Position>(id, "position");
        let vel = world.get_component::<Velocity>(id, "velocity");
        if let (Some(pos), Some(vel)) = (pos, vel) {
            println!(
                "  Entity {id} at ({}, {}) with velocity ({}, {})",
                pos.x, pos.y, vel.x, vel.y
            );
        }
    }

    if let Some(Health(hp)) = world.get_component::<Health>(entity2, "health") {
        println!("\nEntity {entity2} has {hp} hp");
    }

    world.destroy(entity2);
    println!("\nDestroyed entity {entity2}");
    if world.entity(entity2).is_err() {
        println!("Entity {entity2} no longer exists");
    }

    world.remove_component(entity1, "velocity");
    println!(
        "\nStill moving: {}, without health: {}",
        world.include(["position", "velocity"]).len(),
        world.exclude(["health"]).len()
    );

    println!("\n{world:?}");
    Ok(())
}
