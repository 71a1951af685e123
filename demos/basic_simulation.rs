//! Basic collision example
//!
//! A ball falls towards a static floor. The collision core only tracks
//! contacts, so motion comes from a small solver plugged into the world:
//! it applies gravity and stops the ball once a contact with the floor is
//! confirmed.
//!
//! Run with `RUST_LOG=debug` to see the pipeline logs.

use rigidsim::collision::ContactGraph;
use rigidsim::prelude::*;

const GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

#[derive(Debug, Default)]
struct FallingSolver;

impl ContactSolver for FallingSolver {
    fn solve(&mut self, contacts: &ContactGraph, entities: &mut Entities<'_>, dt: f32) {
        for (handle, entity) in entities.iter_mut() {
            let resting = contacts
                .active_edges()
                .any(|edge| edge.involves(handle));

            let transform = *entity.transform();
            let Some(body) = entity.rigid_body_mut() else {
                continue;
            };
            if resting {
                body.linear_velocity = Vec3::ZERO;
                continue;
            }

            body.linear_velocity = body.linear_velocity + GRAVITY * dt;
            let position = transform.position + body.linear_velocity * dt;
            entity.set_transform(Transform::new(position, transform.rotation));
        }
    }
}

fn main() -> Result<(), SimError> {
    env_logger::init();

    println!("rigidsim - Basic Collision Example");
    println!("==================================\n");

    let mut world = World::default();
    world.set_solver(Box::new(FallingSolver));

    let floor = world.create_entity(EntityDesc::fixed(Shape::cuboid(Vec3::new(10.0, 0.5, 10.0))?))?;
    println!("Created floor at Y=0 (top surface at Y=0.5)");

    let ball = world.create_entity(
        EntityDesc::rigid_body(Shape::sphere(0.5)?)
            .with_position(Vec3::new(0.0, 5.0, 0.0))
            .with_mass(1.0),
    )?;
    println!("Created ball at Y=5.0 (radius=0.5)\n");

    let dt = 1.0 / 60.0;
    let steps = 180;

    for i in 0..steps {
        let report = world.step(dt);

        if i % 30 == 0 || report.created > 0 {
            let position = world.entity(ball).map(Entity::position).unwrap_or(Vec3::ZERO);
            println!(
                "t={:.2}s: ball y={:.3}, {} candidates, {} contacts",
                world.time(),
                position.y,
                report.candidates,
                world.contacts().len()
            );
        }
    }

    match world.contacts().edge(floor, ball) {
        Some(edge) => println!(
            "\nBall rests on the floor: {} confirmations, age {}",
            edge.confirmations(),
            edge.age()
        ),
        None => println!("\nBall never reached the floor"),
    }

    let probe = Ray::new(Vec3::new(0.0, 10.0, 0.0), -Vec3::Y)?;
    if let Some(hit) = world.ray_cast(&probe, 20.0) {
        println!("Ray from Y=10 first hits {:?} at distance {:.3}", hit.entity, hit.distance);
    }

    Ok(())
}
