//! Example: systems driven by a clock
//!
//! A movement system integrates velocity, a lifetime system despawns
//! expired entities, and a fixed-step clock drives the frames.

use glam::Vec2;
use sparse_ecs::prelude::*;
use std::time::Duration;

struct MovementSystem;

impl System for MovementSystem {
    fn name(&self) -> &'static str {
        "movement_system"
    }

    fn update(&mut self, world: &mut World) -> Result<()> {
        let dt = world.delta_seconds();
        let moving = world.include(["position", "velocity"]).entities();
        for &id in moving.iter() {
            let Some(velocity) = world.get_component::<Vec2>(id, "velocity").copied() else {
                continue;
            };
            if let Some(position) = world.get_component_mut::<Vec2>(id, "position") {
                *position += velocity * dt;
            }
        }
        Ok(())
    }
}

struct LifetimeSystem;

impl System for LifetimeSystem {
    fn name(&self) -> &'static str {
        "lifetime_system"
    }

    // after movement
    fn priority(&self) -> i32 {
        10
    }

    fn update(&mut self, world: &mut World) -> Result<()> {
        let dt = world.delta_seconds();
        let mut expired = Vec::new();
        let mortal = world.include(["lifetime"]).entities();
        for &id in mortal.iter() {
            if let Some(remaining) = world.get_component_mut::<f32>(id, "lifetime") {
                *remaining -= dt;
                if *remaining <= 0.0 {
                    expired.push(id);
                }
            }
        }
        for id in expired {
            println!("  entity {id} expired");
            world.destroy(id);
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    let mut world = World::new();

    let player = world.create();
    world.add_component(player, "position", Vec2::ZERO);
    world.add_component(player, "velocity", Vec2::new(1.0, 0.5));

    for i in 0..3 {
        let bullet = world.create();
        world.add_component(bullet, "position", Vec2::new(0.0, i as f32));
        world.add_component(bullet, "velocity", Vec2::new(10.0, 0.0));
        world.add_component(bullet, "lifetime", 0.1 * (i + 1) as f32);
    }

    world.add_system(MovementSystem)?;
    world.add_system(LifetimeSystem)?;

    let mut clock = Clock::new();
    clock.start();
    for frame in 0..6 {
        clock.tick_with(Duration::from_millis(50));
        world.advance(&clock)?;
        println!(
            "frame {frame}: t={:.2}s entities={} player={:?}",
            world.elapsed().as_secs_f32(),
            world.entity_count(),
            world.get_component::<Vec2>(player, "position")
        );
    }

    Ok(())
}
