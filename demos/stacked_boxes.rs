use bonk_detect::*;
use glam::Vec2;

fn build(world: &mut World) {
    let floor = Geometry::rectangle(40.0, 2.0).expect("floor size");
    let crate_box = Geometry::rectangle(4.0, 4.0).expect("box size");
    let ball = Geometry::circle(1.5).expect("ball radius");

    world.add_body(Body::new(floor, Vec2::new(0.0, -1.0)).fixed());
    // Slightly sunk into the floor and into each other
    world.add_body(Body::new(crate_box.clone(), Vec2::new(0.0, 1.8)));
    world.add_body(Body::new(crate_box.clone(), Vec2::new(0.3, 5.6)).with_angle(0.1));
    world.add_body(Body::new(crate_box, Vec2::new(12.0, 1.9)).fixed());
    world.add_body(Body::new(ball.clone(), Vec2::new(-6.0, 1.4)));
    world.add_body(Body::new(ball, Vec2::new(-3.5, 1.4)));
}

fn report(world: &mut World) {
    for (channel, event) in world.drain_events() {
        match event {
            Event::Candidates(batch) => {
                println!("[{channel}] {} candidate pair(s)", batch.candidates.len());
            }
            Event::Step { dt } => println!("[{channel}] step dt={dt:.4}"),
            Event::Collisions(batch) => {
                for c in batch.collisions {
                    println!(
                        "[{channel}] {:?} vs {:?} overlap={:.3} n=({:.2},{:.2}) pos=({:.2},{:.2})",
                        c.body_a, c.body_b, c.overlap, c.norm.x, c.norm.y, c.pos.x, c.pos.y
                    );
                }
            }
        }
    }
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    println!("-- candidate mode (grid broad phase) --");
    let mut world = World::new(WorldConfig { cell_size: Some(4.0) });
    build(&mut world);
    let detector = world.add_behavior(Box::new(BodyCollisionDetection::new(DetectorConfig::default())));
    world.step(1.0 / 60.0);
    report(&mut world);
    world.remove_behavior(detector);

    println!("-- every-step mode (all pairs) --");
    let cfg = DetectorConfig::from_toml_str("check = true\nchannel = \"demo:hits\"").expect("demo config");
    let mut world = World::new(WorldConfig::default());
    build(&mut world);
    world.add_behavior(Box::new(BodyCollisionDetection::new(cfg)));
    world.step(1.0 / 60.0);
    report(&mut world);
}
