//! Behavior State Machine: Searching / Investigating / Alerted
//!
//! Конечный автомат часового:
//! Searching (патруль) → Investigating (шум/потеря цели) → Alerted (погоня)
//!
//! Архитектура:
//! - agent_decision работает на decision clock (медленнее кадра),
//!   Δt = decision interval
//! - Переходы читают кешированную перцепцию (VisibleSet) + Alert Engine
//! - sync_movement конвертирует состояние → MovementCommand каждый кадр

use bevy::prelude::*;

use crate::ai::{alert, CaptureState};
use crate::components::{AgentConfig, Alert, DecisionClock, MovementCommand, PatrolRoute, Sentry};
use crate::components::Actor;
use crate::navigation::NavAgent;
use crate::perception::{collect_moving_targets, LastKnownPositions, VisibleSet};
use crate::services::AnimationSinkService;

/// FSM состояния часового
///
/// threatTarget существует ровно пока агент Alerted — инвариант держится
/// структурно, payload варианта.
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub enum AIState {
    /// Searching — патруль по маршруту, начальное состояние
    Searching,

    /// Investigating — идём смотреть на источник шума / точку даунгрейда
    Investigating {
        /// Точка на navmesh, куда идём
        point: Vec3,
        /// Секунды с входа в состояние (повторный шум НЕ сбрасывает)
        elapsed: f32,
        /// Секунды оглядывания на точке (сбрасывается при смене точки)
        look_around: f32,
    },

    /// Alerted — активная погоня за конкретной целью
    Alerted {
        target: Entity,
        /// Где цель видели в последний раз
        last_seen: Vec3,
    },
}

impl Default for AIState {
    fn default() -> Self {
        Self::Searching
    }
}

impl AIState {
    /// Цель погони; Some ровно в Alerted
    pub fn threat_target(&self) -> Option<Entity> {
        match self {
            AIState::Alerted { target, .. } => Some(*target),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AIState::Searching => "Searching",
            AIState::Investigating { .. } => "Investigating",
            AIState::Alerted { .. } => "Alerted",
        }
    }
}

/// Система: decision tick агента (FSM transitions + Alert Engine)
///
/// Агенты в capture sequence приостановлены (Without<CaptureState>).
pub fn agent_decision(
    mut commands: Commands,
    mut agents: Query<
        (
            Entity,
            &mut Transform,
            &AgentConfig,
            &mut DecisionClock,
            &mut AIState,
            &mut Alert,
            &VisibleSet,
            &mut LastKnownPositions,
            &mut PatrolRoute,
            &mut NavAgent,
            &mut MovementCommand,
        ),
        (With<Sentry>, Without<CaptureState>),
    >,
    targets: Query<&Transform, (With<Actor>, Without<Sentry>)>,
    anim: Res<AnimationSinkService>,
    time: Res<Time<Fixed>>,
) {
    let frame_dt = time.delta_secs();

    for (
        entity,
        mut transform,
        config,
        mut clock,
        mut state,
        mut alert,
        visible,
        mut memory,
        mut route,
        mut nav,
        mut command,
    ) in agents.iter_mut()
    {
        // Cadence решений задаёт конфиг агента
        clock.interval = config.decision_interval;
        if !clock.tick(frame_dt) {
            continue;
        }
        let dt = clock.interval;

        let moving = collect_moving_targets(visible, &mut memory, dt, config.movement_threshold);

        let new_state = match state.clone() {
            AIState::Searching => {
                alert::apply_search_rules(&mut alert, config, !moving.is_empty(), dt);

                // Патруль: advance индекса по прибытии на waypoint (цикл)
                if route.current_waypoint().is_some()
                    && !nav.is_path_pending()
                    && nav.remaining_distance() <= config.arrival_tolerance
                {
                    route.advance();
                    crate::logger::log(&format!(
                        "🧭 {:?} waypoint reached, next #{}",
                        entity, route.current
                    ));
                }

                match moving.first() {
                    Some(&(target, position)) if alert.level >= Alert::MAX => {
                        alert.since_sighting = 0.0;
                        crate::logger::log(&format!(
                            "⚔️ {:?} Searching → Alerted (target {:?})",
                            entity, target
                        ));
                        AIState::Alerted {
                            target,
                            last_seen: position,
                        }
                    }
                    _ => AIState::Searching,
                }
            }

            AIState::Investigating {
                point,
                elapsed,
                look_around,
            } => {
                let moving_first = moving.first().copied();
                alert::apply_investigating_rules(&mut alert, config, moving_first.is_some(), dt);

                // Эскалация: движущаяся цель дотянула тревогу до потолка
                if let Some((target, position)) = moving_first {
                    if alert.level >= Alert::MAX {
                        anim.0.set_bool_parameter(entity, "look_around", false);
                        alert.since_sighting = 0.0;
                        crate::logger::log(&format!(
                            "⚔️ {:?} Investigating → Alerted (target {:?})",
                            entity, target
                        ));
                        *state = AIState::Alerted {
                            target,
                            last_seen: position,
                        };
                        continue;
                    }
                }

                if alert.level < Alert::CALM_EXIT {
                    // Интерес угас — бросаем расследование
                    anim.0.set_bool_parameter(entity, "look_around", false);
                    crate::logger::log(&format!(
                        "🚶 {:?} Investigating → Searching (calmed to {:.0})",
                        entity, alert.level
                    ));
                    AIState::Searching
                } else if transform.translation.distance(point) <= config.arrival_tolerance {
                    // На точке: оглядываемся investigate_wait_time секунд
                    if look_around == 0.0 {
                        anim.0.set_bool_parameter(entity, "look_around", true);
                    }
                    let look_around = look_around + dt;
                    if look_around >= config.investigate_wait_time {
                        anim.0.set_bool_parameter(entity, "look_around", false);
                        crate::logger::log(&format!(
                            "🚶 {:?} Investigating → Searching (nothing found)",
                            entity
                        ));
                        AIState::Searching
                    } else {
                        AIState::Investigating {
                            point,
                            elapsed: elapsed + dt,
                            look_around,
                        }
                    }
                } else {
                    AIState::Investigating {
                        point,
                        elapsed: elapsed + dt,
                        look_around,
                    }
                }
            }

            AIState::Alerted { target, last_seen } => {
                let live = targets.get(target).ok().map(|t| t.translation);

                let next = match live {
                    // Цель всё ещё в видимом множестве — преследуем живую позицию
                    Some(live_pos) if visible.seen.contains_key(&target) => {
                        alert.since_sighting = 0.0;
                        let distance = transform.translation.distance(live_pos);
                        if distance <= config.capture_distance {
                            // --- Старт capture sequence: глушим локомоцию,
                            // ориентируемся, pickup-анимация. Для этой погони
                            // всё: тревога в ноль, FSM в Searching ---
                            nav.set_stopped(true);
                            *command = MovementCommand::Stop;
                            let face = live_pos - transform.translation;
                            let flat = Vec3::new(face.x, 0.0, face.z);
                            if flat.length_squared() > 1e-6 {
                                transform.look_to(flat, Vec3::Y);
                            }
                            anim.0.trigger_transition(entity, "pickup");
                            commands
                                .entity(entity)
                                .insert(CaptureState::Reaching { target });
                            alert.level = 0.0;
                            alert.since_sighting = 0.0;
                            crate::logger::log(&format!(
                                "🫳 {:?} capture start on {:?}",
                                entity, target
                            ));
                            *state = AIState::Searching;
                            continue;
                        }
                        AIState::Alerted {
                            target,
                            last_seen: live_pos,
                        }
                    }

                    // Цель не видна (или уничтожена — это та же потеря цели)
                    _ => {
                        alert.since_sighting += dt;

                        if let Some(&(new_target, position)) =
                            moving.iter().find(|(e, _)| *e != target)
                        {
                            // Другая движущаяся цель — мгновенное переключение
                            alert.level = Alert::MAX;
                            alert.since_sighting = 0.0;
                            crate::logger::log(&format!(
                                "🔄 {:?} switching pursuit {:?} → {:?}",
                                entity, target, new_target
                            ));
                            AIState::Alerted {
                                target: new_target,
                                last_seen: position,
                            }
                        } else if transform.translation.distance(last_seen)
                            <= config.arrival_tolerance
                            && alert.since_sighting > config.alerted_memory_window
                        {
                            // Дошли до last_seen, память погони истекла — даунгрейд
                            alert.level = Alert::DOWNGRADE;
                            crate::logger::log(&format!(
                                "🔎 {:?} Alerted → Investigating (lost {:?})",
                                entity, target
                            ));
                            AIState::Investigating {
                                point: transform.translation,
                                elapsed: 0.0,
                                look_around: 0.0,
                            }
                        } else {
                            AIState::Alerted { target, last_seen }
                        }
                    }
                };

                // Безусловный спад погони; проверка ПОСЛЕ ветки — свежее
                // переключение цели в этом же тике (alert = 200) её гасит
                alert::apply_alerted_decay(&mut alert, config, dt);
                if alert.level < Alert::HIGH_BAND && matches!(next, AIState::Alerted { .. }) {
                    crate::logger::log(&format!(
                        "💤 {:?} Alerted → Searching (alert cooled to {:.0})",
                        entity, alert.level
                    ));
                    AIState::Searching
                } else {
                    next
                }
            }
        };

        if *state != new_state {
            if matches!(new_state, AIState::Searching) && route.waypoints.is_empty() {
                crate::logger::log_warning(&format!(
                    "{:?} has no patrol route — idling in place",
                    entity
                ));
            }
            *state = new_state;
        }
    }
}

/// Система: состояние → MovementCommand (каждый кадр, не только decision tick)
///
/// Follow держит погоню за живой позицией между decision tick'ами.
/// Change-guard: не спамим Changed<MovementCommand>.
pub fn sync_movement(
    mut agents: Query<
        (
            &AIState,
            &AgentConfig,
            &VisibleSet,
            &PatrolRoute,
            &mut MovementCommand,
            &mut NavAgent,
        ),
        (With<Sentry>, Without<CaptureState>),
    >,
) {
    for (state, config, visible, route, mut command, mut nav) in agents.iter_mut() {
        let (desired, speed) = match state {
            AIState::Searching => match route.current_waypoint() {
                Some(waypoint) => (MovementCommand::MoveTo { target: waypoint }, config.patrol_speed),
                None => (MovementCommand::Idle, config.patrol_speed),
            },

            AIState::Investigating { point, .. } => (
                MovementCommand::MoveTo { target: *point },
                config.investigate_speed,
            ),

            AIState::Alerted { target, last_seen } => {
                if visible.seen.contains_key(target) {
                    (MovementCommand::Follow { target: *target }, config.chase_speed)
                } else {
                    (
                        MovementCommand::MoveTo { target: *last_seen },
                        config.chase_speed,
                    )
                }
            }
        };

        if *command != desired {
            *command = desired;
        }
        nav.set_speed(speed);
    }
}
