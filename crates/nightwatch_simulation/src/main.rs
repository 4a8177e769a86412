//! Headless симуляция NIGHTWATCH
//!
//! Запускает Bevy App без рендера: двое часовых на маршрутах, один
//! нарушитель, скриптованный шум на тике 300. Для просмотра поведения
//! ядра и проверки детерминизма.

use bevy::prelude::*;
use nightwatch_simulation::*;

fn main() {
    let seed = 42;
    println!("Starting NIGHTWATCH headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);

    // Двое часовых с патрульными маршрутами
    let world = app.world_mut();
    world.spawn((
        Transform::from_xyz(0.0, 0.0, 0.0),
        Actor { faction_id: 1 },
        Sentry,
        PatrolRoute::new(vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(12.0, 0.0, 0.0),
            Vec3::new(12.0, 0.0, 12.0),
            Vec3::new(0.0, 0.0, 12.0),
        ]),
    ));
    world.spawn((
        Transform::from_xyz(20.0, 0.0, 20.0),
        Actor { faction_id: 1 },
        Sentry,
        PatrolRoute::new(vec![
            Vec3::new(20.0, 0.0, 20.0),
            Vec3::new(8.0, 0.0, 20.0),
        ]),
    ));

    // Нарушитель (чужая фракция), крадётся по миру
    let intruder = world
        .spawn((Transform::from_xyz(6.0, 0.0, 6.0), Actor { faction_id: 2 }))
        .id();

    for tick in 0..1000 {
        // Нарушитель медленно ползёт — движущаяся цель для зрения
        if let Some(mut transform) = app.world_mut().get_mut::<Transform>(intruder) {
            transform.translation.x += 0.02;
        }

        // Скриптованный шум: что-то упало
        if tick == 300 {
            app.world_mut().send_event(NoiseEvent {
                position: Vec3::new(10.0, 0.0, 10.0),
                range: 40.0,
                intensity: 120.0,
            });
        }

        app.update();

        if tick % 100 == 0 {
            let world = app.world_mut();
            let mut sentries = world.query_filtered::<(Entity, &AIState, &Alert), With<Sentry>>();
            for (entity, state, alert) in sentries.iter(world) {
                println!(
                    "Tick {}: {:?} {} alert {:.1}",
                    tick,
                    entity,
                    state.name(),
                    alert.level
                );
            }
        }
    }

    println!("Simulation complete!");
}
