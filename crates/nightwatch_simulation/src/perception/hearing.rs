//! Noise Broadcast — доставка шумов всем слушающим агентам
//!
//! Реестр слушателей — сам ECS: NoiseEvent разлетается через Bevy Events,
//! система синхронно прогоняет hear-логику по каждому агенту в том же тике.
//! Broadcast-слой сам дистанции не считает — релевантность (дистанция ≤
//! range) решает каждый агент.

use bevy::prelude::*;

use crate::ai::{AIState, CaptureState, NoiseEvent, NoiseHeard};
use crate::components::{AgentConfig, Alert, Sentry};
use crate::services::{NavMeshService, OcclusionService, RayHit};

/// Высота ушей над опорной точкой агента (метры)
pub const EAR_HEIGHT: f32 = 1.6;

/// Система: доставка NoiseEvent каждому слушателю
///
/// Порядок hear-логики на агенте:
/// 1. occlusion от уха к источнику — перекрытая поверхность глушит вдвое
/// 2. effective = intensity × hearing_sensitivity
/// 3. alert += effective (clamp в конце обработки агента)
/// 4. выше noise floor — NoiseHeard нотификация для UI
/// 5. не Alerted и alert ≥ 100 — снап источника на navmesh, вход в
///    Investigating; повторный шум только двигает точку, elapsed НЕ
///    сбрасывается — серией далёких шумов поиск не затянуть бесконечно
///
/// Агенты в capture sequence шумы не слышат (кооперативная приостановка).
pub fn deliver_noise_events(
    mut noises: EventReader<NoiseEvent>,
    mut listeners: Query<
        (Entity, &Transform, &AgentConfig, &mut Alert, &mut AIState),
        (With<Sentry>, Without<CaptureState>),
    >,
    occlusion: Res<OcclusionService>,
    navmesh: Res<NavMeshService>,
    mut heard: EventWriter<NoiseHeard>,
) {
    for noise in noises.read() {
        for (agent, transform, config, mut alert, mut state) in listeners.iter_mut() {
            let distance = transform.translation.distance(noise.position);
            if distance > noise.range {
                continue;
            }

            let ear = transform.translation + Vec3::Y * EAR_HEIGHT;
            let mut intensity = noise.intensity;
            if !matches!(occlusion.0.cast(ear, noise.position), RayHit::Clear) {
                intensity *= 0.5;
            }
            let effective = intensity * config.hearing_sensitivity;
            alert.level += effective;

            if effective > config.noise_floor {
                heard.write(NoiseHeard {
                    agent,
                    intensity: effective,
                });
            }

            if !matches!(*state, AIState::Alerted { .. }) && alert.is_high() {
                match navmesh.0.sample_position(noise.position, config.nav_snap_distance) {
                    Some(point) => match state.clone() {
                        AIState::Investigating { elapsed, .. } => {
                            // Таймер расследования сохраняем, look-around начнётся заново
                            *state = AIState::Investigating {
                                point,
                                elapsed,
                                look_around: 0.0,
                            };
                        }
                        _ => {
                            crate::logger::log(&format!(
                                "👂 {:?} heard noise ({:.0}) → Investigating at {:?}",
                                agent, effective, point
                            ));
                            *state = AIState::Investigating {
                                point,
                                elapsed: 0.0,
                                look_around: 0.0,
                            };
                        }
                    },
                    None => {
                        // Источник вне navmesh — тревога поднята, идти некуда
                        crate::logger::log_warning(&format!(
                            "👂 {:?} heard noise but no navigable point near {:?}",
                            agent, noise.position
                        ));
                    }
                }
            }

            alert.clamp();
        }
    }
}
