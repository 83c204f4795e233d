use async_trait::async_trait;
use std::sync::Arc;
use weather_poller_core::{ObservationSink, Result, WeatherObservation};

/// Prints each observation before handing the batch to the real sink.
#[derive(Debug)]
pub struct ConsoleSink {
    inner: Arc<dyn ObservationSink>,
}

impl ConsoleSink {
    pub fn new(inner: Arc<dyn ObservationSink>) -> Self {
        Self { inner }
    }
}

pub fn observation_lines(observations: &[WeatherObservation]) -> Vec<String> {
    observations.iter().map(ToString::to_string).collect()
}

#[async_trait]
impl ObservationSink for ConsoleSink {
    async fn add_range(&self, observations: &[WeatherObservation]) -> Result<()> {
        for line in observation_lines(observations) {
            println!("{line}");
        }
        self.inner.add_range(observations).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use weather_poller_core::MemorySink;

    fn obs(city: &str) -> WeatherObservation {
        WeatherObservation {
            city: city.to_owned(),
            temperature_c: 10,
            precipitation_pct: 85,
            wind_speed_kph: 6.0,
            summary: "Mild".to_owned(),
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn formats_one_line_per_observation() {
        let lines = observation_lines(&[obs("Vilnius"), obs("Kaunas")]);
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "City: Vilnius Temperature: 10 Precipitation: 85 WindSpeed: 6 Summary: Mild"
        );
        assert!(lines[1].starts_with("City: Kaunas"));
    }

    #[tokio::test]
    async fn forwards_batch_to_inner_sink() {
        let memory = MemorySink::new();
        let sink = ConsoleSink::new(Arc::new(memory.clone()));

        sink.add_range(&[obs("Vilnius")]).await.expect("forwarded");

        assert_eq!(memory.len(), 1);
    }
}
