//! AI-агент: уровень тревоги, тюнинг, патрульный маршрут, decision clock

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Непрерывный уровень подозрения агента
///
/// Инвариант: 0 ≤ level ≤ 200, clamp в конце каждого прохода
/// (decision tick и доставка шумов).
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Alert {
    pub level: f32,
    /// Секунды с последнего наблюдения движущейся цели
    pub since_sighting: f32,
}

impl Alert {
    /// Потолок шкалы
    pub const MAX: f32 = 200.0;
    /// Граница low/medium полос; порог входа в Investigating по шуму
    pub const HIGH_BAND: f32 = 100.0;
    /// Ниже этого Investigating бросается немедленно
    pub const CALM_EXIT: f32 = 50.0;
    /// Уровень после даунгрейда Alerted → Investigating
    pub const DOWNGRADE: f32 = 150.0;

    pub fn clamp(&mut self) {
        self.level = self.level.clamp(0.0, Self::MAX);
    }

    pub fn is_high(&self) -> bool {
        self.level >= Self::HIGH_BAND
    }
}

impl Default for Alert {
    fn default() -> Self {
        Self {
            level: 0.0,
            since_sighting: 0.0,
        }
    }
}

/// Параметры AI (слух, скорости полос тревоги, тайминги, дистанции)
///
/// Serde — для data-driven тюнинг-таблиц.
#[derive(Component, Debug, Clone, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct AgentConfig {
    /// Множитель слуха (глухой 0.0 .. чуткий > 1.0)
    pub hearing_sensitivity: f32,
    /// Ниже этой effective intensity не шлём NoiseHeard нотификацию
    pub noise_floor: f32,

    /// Рост тревоги при движущейся цели, level < 100 (units/sec)
    pub low_increase_rate: f32,
    /// Рост тревоги при движущейся цели, level ≥ 100 (units/sec)
    pub medium_increase_rate: f32,
    /// Спад без стимулов, level < 100 (units/sec)
    pub low_decrease_rate: f32,
    /// Спад без стимулов, level ≥ 100, после grace period (units/sec)
    pub medium_decrease_rate: f32,
    /// Безусловный спад в Alerted (units/sec)
    pub high_decrease_rate: f32,
    /// Сколько секунд держим level ≥ 100 после потери цели до начала спада
    pub sighting_grace_period: f32,

    /// Порог скорости (м/с), выше которого цель считается движущейся
    pub movement_threshold: f32,
    /// Сколько секунд оглядываемся на точке расследования
    pub investigate_wait_time: f32,
    /// Память преследования: секунды без новой цели у last_seen до даунгрейда
    pub alerted_memory_window: f32,
    /// Дистанция срабатывания capture sequence (метры)
    pub capture_distance: f32,

    /// Скорость патруля (м/с)
    pub patrol_speed: f32,
    /// Скорость похода к точке расследования (быстрее патруля)
    pub investigate_speed: f32,
    /// Скорость погони (м/с)
    pub chase_speed: f32,
    /// Допуск прибытия к waypoint/точке (метры)
    pub arrival_tolerance: f32,

    /// Интервал decision tick (сек); медленнее кадрового 60Hz
    pub decision_interval: f32,
    /// Макс. дистанция снапа источника шума на navmesh (метры)
    pub nav_snap_distance: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            hearing_sensitivity: 1.0,
            noise_floor: 5.0,

            low_increase_rate: 60.0,
            medium_increase_rate: 100.0,
            low_decrease_rate: 20.0,
            medium_decrease_rate: 30.0,
            high_decrease_rate: 10.0,
            sighting_grace_period: 3.0,

            movement_threshold: 0.5,
            investigate_wait_time: 4.0,
            alerted_memory_window: 2.0,
            capture_distance: 1.5,

            patrol_speed: 2.0,
            investigate_speed: 3.5,
            chase_speed: 5.0,
            arrival_tolerance: 0.6,

            decision_interval: 0.2,
            nav_snap_distance: 4.0,
        }
    }
}

/// Циклический патрульный маршрут
///
/// Пустой маршрут — валидная деградация: агент стоит на месте (Searching
/// без движения), логируется один раз при входе в состояние.
#[derive(Component, Debug, Clone, Default)]
pub struct PatrolRoute {
    pub waypoints: Vec<Vec3>,
    pub current: usize,
}

impl PatrolRoute {
    pub fn new(waypoints: Vec<Vec3>) -> Self {
        Self {
            waypoints,
            current: 0,
        }
    }

    pub fn current_waypoint(&self) -> Option<Vec3> {
        self.waypoints.get(self.current).copied()
    }

    /// Следующий waypoint (цикличный обход)
    pub fn advance(&mut self) {
        if !self.waypoints.is_empty() {
            self.current = (self.current + 1) % self.waypoints.len();
        }
    }
}

/// Decision clock: AI-решения на фиксированном интервале, реже кадра
///
/// Накапливаем fixed delta; выстрел раз в interval ограничивает стоимость
/// перцепции/решений при большом числе агентов.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct DecisionClock {
    pub interval: f32,
    pub elapsed: f32,
}

impl Default for DecisionClock {
    fn default() -> Self {
        Self {
            interval: 0.2,
            elapsed: 0.0,
        }
    }
}

impl DecisionClock {
    /// true — пора делать decision tick. Эпсилон гасит дрейф f32-аккумуляции.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        if self.elapsed >= self.interval - 1e-4 {
            self.elapsed -= self.interval;
            if self.elapsed < 0.0 {
                self.elapsed = 0.0;
            }
            true
        } else {
            false
        }
    }
}
