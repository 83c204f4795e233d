//! Startup gate deciding which requested cities will ever be polled.

use std::collections::HashSet;
use tracing::warn;

use crate::{
    error::{Result, ValidationError},
    model::CityName,
    provider::WeatherProvider,
};

/// Outcome of validating the operator's city list against the live API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CityValidation {
    /// Working set: supported names in first-seen order, without duplicates.
    pub accepted: Vec<CityName>,
    /// Names that passed the syntax check but are not supported.
    pub rejected: Vec<CityName>,
}

/// Syntax check and split of a raw list such as `"Vilnius, Kaunas"`.
///
/// Order is kept and duplicates are not removed here.
pub fn parse_city_list(raw: &str) -> Result<Vec<CityName>, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }

    trimmed
        .split(',')
        .map(|candidate| {
            CityName::parse(candidate).map_err(|_| ValidationError::BadFormat(raw.to_owned()))
        })
        .collect()
}

/// Keep the candidates the API supports.
pub fn filter_supported(candidates: Vec<CityName>, supported: &[String]) -> CityValidation {
    let supported: HashSet<&str> = supported.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    let mut result = CityValidation::default();

    for city in candidates {
        if !seen.insert(city.clone()) {
            continue;
        }
        if supported.contains(city.as_str()) {
            result.accepted.push(city);
        } else {
            warn!(city = %city, "city is not supported and will be skipped");
            result.rejected.push(city);
        }
    }

    result
}

/// Full validation: syntax, then membership in the live supported-city set.
///
/// An empty `accepted` list is not an error here; the caller decides whether
/// the run can go on.
pub async fn validate_city_list(
    raw: &str,
    provider: &dyn WeatherProvider,
) -> Result<CityValidation> {
    let candidates = parse_city_list(raw)?;
    let supported = provider.list_supported_cities().await?;
    Ok(filter_supported(candidates, &supported))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::Error,
        model::WeatherObservation,
    };
    use async_trait::async_trait;

    #[derive(Debug)]
    struct FixedCities(Vec<&'static str>);

    #[async_trait]
    impl WeatherProvider for FixedCities {
        async fn list_supported_cities(&self) -> Result<Vec<String>> {
            if self.0.is_empty() {
                return Err(Error::NoSupportedCities);
            }
            Ok(self.0.iter().map(|c| (*c).to_owned()).collect())
        }

        async fn fetch_weather(&self, _city: &CityName) -> Option<WeatherObservation> {
            None
        }
    }

    fn names(cities: &[CityName]) -> Vec<&str> {
        cities.iter().map(CityName::as_str).collect()
    }

    #[test]
    fn blank_input_is_empty_error() {
        assert_eq!(parse_city_list(""), Err(ValidationError::Empty));
        assert_eq!(parse_city_list("   \t"), Err(ValidationError::Empty));
    }

    #[test]
    fn digits_and_symbols_are_bad_format() {
        for raw in [
            "Vilnius1",
            "Vilnius, Kaunas2",
            "Vilnius; Kaunas",
            "Vilnius,,Kaunas",
            "Vilnius,",
            ",Vilnius",
            "Vil_nius",
            "Kaunas, @",
            "New York",
        ] {
            assert!(
                matches!(parse_city_list(raw), Err(ValidationError::BadFormat(_))),
                "{raw:?} should be a format error"
            );
        }
    }

    #[test]
    fn splits_and_trims_preserving_order_and_duplicates() {
        let cities = parse_city_list(" Vilnius, Kaunas ,Klaipėda,Vilnius ").expect("valid list");
        assert_eq!(names(&cities), ["Vilnius", "Kaunas", "Klaipėda", "Vilnius"]);
    }

    #[test]
    fn filter_is_ordered_first_seen_intersection() {
        let candidates = parse_city_list("Kaunas, Jonava, Vilnius, Kaunas").expect("valid list");
        let supported = vec!["Vilnius".to_owned(), "Kaunas".to_owned(), "Alytus".to_owned()];

        let result = filter_supported(candidates, &supported);

        assert_eq!(names(&result.accepted), ["Kaunas", "Vilnius"]);
        assert_eq!(names(&result.rejected), ["Jonava"]);
    }

    #[test]
    fn membership_is_case_sensitive() {
        let candidates = parse_city_list("vilnius").expect("valid list");
        let result = filter_supported(candidates, &["Vilnius".to_owned()]);
        assert!(result.accepted.is_empty());
    }

    #[tokio::test]
    async fn validate_filters_against_provider() {
        let provider = FixedCities(vec!["Vilnius", "Kaunas"]);
        let result = validate_city_list("Vilnius, Jonava", &provider).await.expect("validates");

        assert_eq!(names(&result.accepted), ["Vilnius"]);
        assert_eq!(names(&result.rejected), ["Jonava"]);
    }

    #[tokio::test]
    async fn validate_reports_empty_working_set_without_error() {
        let provider = FixedCities(vec!["Vilnius"]);
        let result = validate_city_list("Jonava", &provider).await.expect("validates");
        assert!(result.accepted.is_empty());
    }

    #[tokio::test]
    async fn validate_escalates_missing_supported_cities() {
        let provider = FixedCities(Vec::new());
        let err = validate_city_list("Vilnius", &provider).await.unwrap_err();
        assert!(matches!(err, Error::NoSupportedCities));
    }

    #[tokio::test]
    async fn syntax_errors_short_circuit_before_network() {
        let provider = FixedCities(Vec::new());
        let err = validate_city_list("Vilnius2", &provider).await.unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::BadFormat(_))));
    }
}
