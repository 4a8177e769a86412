//! Alert State Engine — полосовые правила роста/спада тревоги
//!
//! Чистые функции над Alert + AgentConfig, вызываются из decision tick.
//! Правило выбора полосы: всегда полоса на момент применения, без
//! двойного учёта при переходах между состояниями.

use crate::components::{AgentConfig, Alert};

/// Правила состояния Searching
///
/// Движущаяся цель: рост low-полосы ниже 100, medium — выше.
/// Без цели: ниже 100 спад непрерывный; на 100 и выше спад начинается
/// только после grace period с последнего наблюдения.
pub fn apply_search_rules(alert: &mut Alert, config: &AgentConfig, moving_seen: bool, dt: f32) {
    if moving_seen {
        let rate = if alert.level < Alert::HIGH_BAND {
            config.low_increase_rate
        } else {
            config.medium_increase_rate
        };
        alert.level += rate * dt;
        alert.since_sighting = 0.0;
    } else {
        alert.since_sighting += dt;
        if alert.level < Alert::HIGH_BAND {
            alert.level -= config.low_decrease_rate * dt;
        } else if alert.since_sighting >= config.sighting_grace_period {
            alert.level -= config.medium_decrease_rate * dt;
        }
    }
    alert.clamp();
}

/// Правила состояния Investigating
///
/// Движущаяся цель эскалирует medium-рейтом; иначе спад половиной
/// medium-рейта, и только пока level выше 100.
pub fn apply_investigating_rules(
    alert: &mut Alert,
    config: &AgentConfig,
    moving_seen: bool,
    dt: f32,
) {
    if moving_seen {
        alert.level += config.medium_increase_rate * dt;
        alert.since_sighting = 0.0;
    } else {
        alert.since_sighting += dt;
        if alert.level > Alert::HIGH_BAND {
            alert.level -= config.medium_decrease_rate * 0.5 * dt;
        }
    }
    alert.clamp();
}

/// Безусловный спад в Alerted: преследование само по себе дорого
pub fn apply_alerted_decay(alert: &mut Alert, config: &AgentConfig, dt: f32) {
    alert.level -= config.high_decrease_rate * dt;
    alert.clamp();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AgentConfig {
        AgentConfig::default()
    }

    #[test]
    fn test_low_band_increase() {
        let config = config();
        let mut alert = Alert::default();

        apply_search_rules(&mut alert, &config, true, 0.5);
        assert_eq!(alert.level, config.low_increase_rate * 0.5);
        assert_eq!(alert.since_sighting, 0.0);
    }

    #[test]
    fn test_medium_band_increase_above_100() {
        let config = config();
        let mut alert = Alert {
            level: 120.0,
            since_sighting: 0.0,
        };

        apply_search_rules(&mut alert, &config, true, 0.2);
        assert_eq!(alert.level, 120.0 + config.medium_increase_rate * 0.2);
    }

    #[test]
    fn test_increase_clamped_at_max() {
        let config = config();
        let mut alert = Alert {
            level: 199.0,
            since_sighting: 0.0,
        };

        apply_search_rules(&mut alert, &config, true, 1.0);
        assert_eq!(alert.level, Alert::MAX);
    }

    #[test]
    fn test_low_band_decays_continuously() {
        let config = config();
        let mut alert = Alert {
            level: 60.0,
            since_sighting: 0.0,
        };

        apply_search_rules(&mut alert, &config, false, 0.5);
        assert_eq!(alert.level, 60.0 - config.low_decrease_rate * 0.5);
    }

    #[test]
    fn test_high_band_waits_for_grace_period() {
        let config = config();
        let mut alert = Alert {
            level: 150.0,
            since_sighting: 0.0,
        };

        // До grace period спада нет
        apply_search_rules(&mut alert, &config, false, 1.0);
        assert_eq!(alert.level, 150.0);
        apply_search_rules(&mut alert, &config, false, 1.0);
        assert_eq!(alert.level, 150.0);

        // since_sighting дошёл до 3.0 — спад пошёл
        apply_search_rules(&mut alert, &config, false, 1.0);
        assert_eq!(alert.level, 150.0 - config.medium_decrease_rate * 1.0);
    }

    #[test]
    fn test_decay_clamped_at_zero() {
        let config = config();
        let mut alert = Alert {
            level: 1.0,
            since_sighting: 10.0,
        };

        apply_search_rules(&mut alert, &config, false, 1.0);
        assert_eq!(alert.level, 0.0);
    }

    #[test]
    fn test_investigating_decay_stops_at_100() {
        let config = config();
        let mut alert = Alert {
            level: 101.0,
            since_sighting: 0.0,
        };

        // Спад половиной medium-рейта, но только выше 100
        apply_investigating_rules(&mut alert, &config, false, 0.2);
        let expected = 101.0 - config.medium_decrease_rate * 0.5 * 0.2;
        assert!((alert.level - expected).abs() < 1e-5);

        let mut at_floor = Alert {
            level: 100.0,
            since_sighting: 0.0,
        };
        apply_investigating_rules(&mut at_floor, &config, false, 1.0);
        assert_eq!(at_floor.level, 100.0);
    }

    #[test]
    fn test_alerted_decay_unconditional() {
        let config = config();
        let mut alert = Alert {
            level: 200.0,
            since_sighting: 0.0,
        };

        apply_alerted_decay(&mut alert, &config, 1.0);
        assert_eq!(alert.level, 200.0 - config.high_decrease_rate);
    }
}
