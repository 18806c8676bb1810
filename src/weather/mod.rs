use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use sunrise::{Coordinates, SolarDay, SolarEvent};
use tracing::{debug, instrument};

use crate::models::{Location, StartDate, WeatherDay, WeatherReport, parse_start_date};
use crate::Result;

pub mod open_meteo;

pub use open_meteo::{OpenMeteoClient, weather_code_to_description};

/// Total precipitation from which the whole trip reads as rainy (mm)
const RAINY_TRIP_MM: f32 = 5.0;

/// Geocodes a destination and summarizes its forecast for the trip dates
#[derive(Clone)]
pub struct WeatherService {
    client: OpenMeteoClient,
}

impl WeatherService {
    pub fn new(client: OpenMeteoClient) -> Self {
        Self { client }
    }

    /// Weather report for `days` days starting at the caller's start date
    pub async fn report(
        &self,
        city: &str,
        start_date: Option<&str>,
        days: u32,
    ) -> Result<WeatherReport> {
        let start = parse_start_date(start_date)?;
        self.report_from(city, start, days, Utc::now().date_naive())
            .await
    }

    #[instrument(skip(self))]
    pub async fn report_from(
        &self,
        city: &str,
        start: StartDate,
        days: u32,
        today: NaiveDate,
    ) -> Result<WeatherReport> {
        let geo = self.client.geocode(city).await?;
        let start = start.resolve(today);

        let mut forecast = self.client.daily_forecast(&geo, start, days).await?;
        for day in &mut forecast {
            attach_sun_times(&geo, day);
        }

        let overview = summarize_weather(&forecast);
        debug!("Weather overview for {}: {}", geo.name, overview);

        Ok(WeatherReport {
            geo,
            days: forecast,
            overview,
        })
    }
}

/// One-paragraph overview of the whole period
#[must_use]
pub fn summarize_weather(days: &[WeatherDay]) -> String {
    if days.is_empty() {
        return "Sin datos meteorológicos.".to_string();
    }

    let total_rain: f32 = days.iter().map(|d| d.precipitation_sum).sum();
    let overall = if total_rain >= RAINY_TRIP_MM {
        "lluvioso"
    } else if days.iter().any(WeatherDay::is_cloudy) {
        "nublado"
    } else {
        "soleado"
    };

    let min_temp = days.iter().map(|d| d.temp_min).fold(f32::INFINITY, f32::min);
    let max_temp = days
        .iter()
        .map(|d| d.temp_max)
        .fold(f32::NEG_INFINITY, f32::max);

    format!(
        "Panorama general: {overall}. Temperaturas entre {min_temp:.0}°C y {max_temp:.0}°C. Lluvia acumulada aprox. {total_rain:.1} mm."
    )
}

pub fn get_sunrise_sunset(
    location: &Location,
    date: NaiveDate,
) -> anyhow::Result<Option<(DateTime<Utc>, DateTime<Utc>)>> {
    let coordinates =
        Coordinates::new(location.latitude, location.longitude).with_context(|| {
            format!(
                "Invalid coordinates: lat={}, lng={}",
                location.latitude, location.longitude
            )
        })?;

    let solar_day = SolarDay::new(coordinates, date);

    // No sunrise or sunset during polar day and night
    let sunrise = solar_day.event_time(SolarEvent::Sunrise);
    let sunset = solar_day.event_time(SolarEvent::Sunset);

    Ok(sunrise.zip(sunset))
}

/// Fill local sunrise/sunset when the destination timezone is known
fn attach_sun_times(location: &Location, day: &mut WeatherDay) {
    let Some(tz) = location.tz() else {
        return;
    };
    let Ok(date) = NaiveDate::parse_from_str(&day.date, "%Y-%m-%d") else {
        return;
    };

    match get_sunrise_sunset(location, date) {
        Ok(Some((sunrise, sunset))) => {
            day.sunrise = Some(sunrise.with_timezone(&tz).format("%H:%M").to_string());
            day.sunset = Some(sunset.with_timezone(&tz).format("%H:%M").to_string());
        }
        Ok(None) => {}
        Err(e) => debug!("No sun times for {}: {}", day.date, e),
    }
}
