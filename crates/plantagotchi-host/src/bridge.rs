//! Line protocol between a host process and the plant service.
//!
//! Each stdin line is either a JSON [`SensorReading`], e.g.
//! `{"ambient_lux": 1250.0, "accelerometer": {"x": 0.1, "y": 9.8, "z": 0.0}}`,
//! or the bare word `new-game`. Blank lines are ignored and malformed lines
//! are logged and skipped.

use plantagotchi_core::PlantService;
use plantagotchi_types::{PlantSnapshot, SensorReading};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// One decoded input line.
#[derive(Debug, Clone, PartialEq)]
pub enum HostInput {
    /// Fresh sensor values.
    Sensor(SensorReading),
    /// Reset every stat and write a new game document.
    NewGame,
}

/// Decode one input line; `None` for blank lines.
pub fn parse_line(line: &str) -> Result<Option<HostInput>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if line == "new-game" {
        return Ok(Some(HostInput::NewGame));
    }
    serde_json::from_str(line).map(|reading| Some(HostInput::Sensor(reading)))
}

/// Forward lines from `reader` into `service` until end of input.
///
/// Returns the number of lines applied.
pub async fn forward_lines<R>(reader: R, service: &PlantService) -> usize
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut applied: usize = 0;
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "failed to read input line");
                break;
            }
        };
        let input = match parse_line(&line) {
            Ok(Some(input)) => input,
            Ok(None) => continue,
            Err(e) => {
                warn!(error = %e, line = line.as_str(), "ignoring malformed input line");
                continue;
            }
        };
        let sent = match input {
            HostInput::Sensor(reading) => service.push_sensor(reading).await,
            HostInput::NewGame => service.create_new_game().await,
        };
        if let Err(e) = sent {
            warn!(error = %e, "plant service rejected input");
            break;
        }
        applied = applied.saturating_add(1);
    }
    debug!(applied, "input closed");
    applied
}

/// Log presentation-level changes (position, weather, day/night, load
/// phase) until the service stops.
pub async fn report_snapshots(mut snapshots: watch::Receiver<PlantSnapshot>) {
    let mut last = Summary::of(&snapshots.borrow_and_update());
    while snapshots.changed().await.is_ok() {
        let snapshot = snapshots.borrow_and_update().clone();
        let current = Summary::of(&snapshot);
        if current != last {
            info!(
                position = current.position,
                weather = current.weather,
                day_night = current.day_night,
                load = current.load,
                lux = snapshot.game.player_state.lux,
                "plant status"
            );
            last = current;
        }
    }
}

/// The text fields a screen would show.
#[derive(Debug, PartialEq, Eq)]
struct Summary {
    position: String,
    weather: String,
    day_night: String,
    load: String,
}

impl Summary {
    fn of(snapshot: &PlantSnapshot) -> Self {
        Self {
            position: snapshot.position.describe(),
            weather: snapshot.weather_text().to_owned(),
            day_night: snapshot.day_night_text().to_owned(),
            load: format!("{:?}", snapshot.load_phase),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use plantagotchi_core::config::PlantConfig;
    use plantagotchi_core::{
        Collaborators, FixedLocation, LogOnlyPermissionHost, MemoryStore, ServiceSettings,
    };
    use plantagotchi_clients::{OpenWeatherClient, SunriseSunsetClient};
    use plantagotchi_types::{Accelerometer, PlayerId};

    use super::*;

    #[test]
    fn parses_sensor_json() {
        let input = parse_line(r#"{"ambient_lux": 1250.5}"#).unwrap();
        assert_eq!(
            input,
            Some(HostInput::Sensor(SensorReading {
                ambient_lux: 1250.5,
                accelerometer: None,
            }))
        );
    }

    #[test]
    fn parses_new_game_and_blank() {
        assert_eq!(parse_line("  new-game \n").unwrap(), Some(HostInput::NewGame));
        assert_eq!(parse_line("   ").unwrap(), None);
        assert!(parse_line("lux=5").is_err());
    }

    #[tokio::test]
    async fn forwards_readings_and_skips_garbage() {
        let config = PlantConfig::default();
        let collaborators = Collaborators {
            location: Arc::new(FixedLocation::unavailable()),
            permissions: Arc::new(LogOnlyPermissionHost),
            weather: Arc::new(OpenWeatherClient::new(&config.weather).unwrap()),
            day_night: Arc::new(SunriseSunsetClient::new(&config.daynight).unwrap()),
            store: Arc::new(MemoryStore::new()),
        };
        let service = PlantService::start(
            PlayerId::new(),
            ServiceSettings::from_config(&config),
            collaborators,
        );
        let mut rx = service.subscribe();

        let input: &[u8] = b"{\"ambient_lux\": 10.0, \"accelerometer\": {\"x\": 1.0, \"y\": 2.0, \"z\": 3.0}}\n\
            not json\n\
            \n\
            {\"ambient_lux\": 2000.0}\n";
        let applied = forward_lines(input, &service).await;
        assert_eq!(applied, 2);

        let snap = tokio::time::timeout(
            Duration::from_secs(5),
            rx.wait_for(|s| s.sensor.ambient_lux > 1000.0),
        )
        .await
        .expect("reading not applied")
        .expect("service stopped")
        .clone();
        // Light-only update keeps the earlier accelerometer sample.
        assert_eq!(
            snap.sensor.accelerometer,
            Some(Accelerometer {
                x: 1.0,
                y: 2.0,
                z: 3.0
            })
        );

        service.shutdown().await.unwrap();
    }
}
