use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use campfinder::services::text_generation::{ERROR_TEXT, MISSING_KEY_TEXT};
use campfinder::services::{
    GeminiClient, Geocoder, LightPollutionLookup, PlaceLookup, TextGenerator, TrailLookup, WeatherLookup,
};
use campfinder::config::TextGenerationConfig;
use campfinder::{
    Collaborators, Coordinate, GeneratedText, GeocodedLocation, LightPollutionReading, MemoCache,
    RecommendationService, RecommendationSettings, ScoringPolicy, Trail, UserPreferences, Venue,
    WeatherSnapshot,
};
use std::sync::Mutex;
use std::time::Duration;

fn coordinate(lat: f64, lon: f64) -> Coordinate {
    Coordinate::new(lat, lon).unwrap()
}

fn snapshot(temp: f64, clouds: f64, rain: bool) -> WeatherSnapshot {
    let mut weather = WeatherSnapshot::unavailable("fake");
    weather.temperature_c = Some(temp);
    weather.cloud_cover_pct = Some(clouds);
    weather.is_raining = Some(rain);
    weather
}

#[derive(Default)]
struct FakePlaces {
    venues: Vec<Venue>,
    trails: Vec<Trail>,
    venue_calls: AtomicUsize,
    trail_calls: AtomicUsize,
}

#[async_trait]
impl PlaceLookup for FakePlaces {
    async fn nearby_venues(&self, _center: &Coordinate, _radius_km: f64, _place_type: &str) -> Vec<Venue> {
        self.venue_calls.fetch_add(1, Ordering::SeqCst);
        self.venues.clone()
    }
}

#[async_trait]
impl TrailLookup for FakePlaces {
    async fn nearby_trails(&self, _center: &Coordinate, _radius_km: f64) -> Vec<Trail> {
        self.trail_calls.fetch_add(1, Ordering::SeqCst);
        self.trails.clone()
    }
}

/// Weather keyed by venue latitude; unknown venues get an unavailable snapshot
#[derive(Default)]
struct FakeWeather {
    by_latitude: HashMap<String, WeatherSnapshot>,
    calls: AtomicUsize,
}

impl FakeWeather {
    fn with(mut self, lat: f64, weather: WeatherSnapshot) -> Self {
        self.by_latitude.insert(lat.to_string(), weather);
        self
    }
}

#[async_trait]
impl WeatherLookup for FakeWeather {
    async fn current_weather(&self, location: &Coordinate) -> WeatherSnapshot {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.by_latitude
            .get(&location.latitude().to_string())
            .cloned()
            .unwrap_or_else(|| WeatherSnapshot::unavailable("unavailable"))
    }
}

#[derive(Default)]
struct FakeLightPollution {
    by_latitude: HashMap<String, u8>,
    calls: AtomicUsize,
}

impl FakeLightPollution {
    fn with(mut self, lat: f64, level: u8) -> Self {
        self.by_latitude.insert(lat.to_string(), level);
        self
    }
}

#[async_trait]
impl LightPollutionLookup for FakeLightPollution {
    async fn light_pollution(&self, location: &Coordinate) -> LightPollutionReading {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.by_latitude.get(&location.latitude().to_string()) {
            Some(level) => LightPollutionReading::new(*level).unwrap(),
            None => LightPollutionReading::default(),
        }
    }
}

#[derive(Default)]
struct RecordingText {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl TextGenerator for RecordingText {
    async fn generate(&self, prompt: &str) -> GeneratedText {
        self.prompts.lock().unwrap().push(prompt.to_string());
        GeneratedText::generated("Pine Lake is the best choice.")
    }
}

/// Resolves one known address; counts every call
#[derive(Default)]
struct FakeGeocoder {
    calls: AtomicUsize,
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn geocode(&self, address: &str) -> Option<GeocodedLocation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (address == "Pine Lake Road").then(|| GeocodedLocation::new(coordinate(45.0, -75.0), "Pine Lake Road, Ontario"))
    }
}

struct Harness {
    places: Arc<FakePlaces>,
    weather: Arc<FakeWeather>,
    light_pollution: Arc<FakeLightPollution>,
    text: Arc<RecordingText>,
    geocoder: Arc<FakeGeocoder>,
}

impl Harness {
    fn new(places: FakePlaces, weather: FakeWeather, light_pollution: FakeLightPollution) -> Self {
        Self {
            places: Arc::new(places),
            weather: Arc::new(weather),
            light_pollution: Arc::new(light_pollution),
            text: Arc::new(RecordingText::default()),
            geocoder: Arc::new(FakeGeocoder::default()),
        }
    }

    fn service(&self, settings: RecommendationSettings) -> RecommendationService {
        self.service_with_text(settings, self.text.clone())
    }

    fn service_with_text(&self, settings: RecommendationSettings, text: Arc<dyn TextGenerator>) -> RecommendationService {
        let collaborators = Collaborators {
            places: self.places.clone(),
            trails: self.places.clone(),
            weather: self.weather.clone(),
            light_pollution: self.light_pollution.clone(),
            text,
            geocoder: self.geocoder.clone(),
        };
        RecommendationService::new(collaborators, settings, ScoringPolicy::default())
    }
}

fn example_harness() -> Harness {
    let places = FakePlaces {
        venues: vec![
            Venue::new("Cedar Flats", coordinate(46.0, -76.0)),
            Venue::new("Pine Lake", coordinate(45.1, -75.1)),
        ],
        ..FakePlaces::default()
    };
    let weather = FakeWeather::default()
        .with(45.1, snapshot(20.0, 10.0, false))
        .with(46.0, snapshot(5.0, 90.0, true));
    let light_pollution = FakeLightPollution::default().with(45.1, 1).with(46.0, 8);
    Harness::new(places, weather, light_pollution)
}

#[tokio::test]
async fn test_favorable_close_venue_ranks_first() {
    let harness = example_harness();
    let service = harness.service(RecommendationSettings::default());

    let bundle = service
        .recommend(&coordinate(45.0, -75.0), &UserPreferences::default())
        .await;

    let names: Vec<&str> = bundle.results.iter().map(|r| r.venue.name.as_str()).collect();
    assert_eq!(names, vec!["Pine Lake", "Cedar Flats"]);
    assert!(bundle.results[0].score > bundle.results[1].score);
    assert!(bundle.results[1].score < 0.0);
    assert_eq!(bundle.summary.text, "Pine Lake is the best choice.");
    assert!(!bundle.summary.is_fallback);
}

#[tokio::test]
async fn test_each_collaborator_is_called_the_expected_number_of_times() {
    let harness = example_harness();
    let service = harness.service(RecommendationSettings::default());

    service
        .recommend(&coordinate(45.0, -75.0), &UserPreferences::default())
        .await;

    assert_eq!(harness.places.venue_calls.load(Ordering::SeqCst), 1);
    assert_eq!(harness.places.trail_calls.load(Ordering::SeqCst), 1);
    assert_eq!(harness.weather.calls.load(Ordering::SeqCst), 2);
    assert_eq!(harness.light_pollution.calls.load(Ordering::SeqCst), 2);
    assert_eq!(harness.text.prompts.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_trails_are_skipped_when_disabled() {
    let harness = example_harness();
    let settings = RecommendationSettings {
        include_trails: false,
        ..RecommendationSettings::default()
    };
    let bundle = harness
        .service(settings)
        .recommend(&coordinate(45.0, -75.0), &UserPreferences::default())
        .await;

    assert_eq!(harness.places.trail_calls.load(Ordering::SeqCst), 0);
    assert!(bundle.trails.is_empty());
}

#[tokio::test]
async fn test_prompt_contains_only_top_k_but_bundle_keeps_all() {
    let venues: Vec<Venue> = (0..8)
        .map(|i| Venue::new(format!("Site {i}"), coordinate(45.0 + f64::from(i) * 0.1, -75.0)))
        .collect();
    let places = FakePlaces {
        venues,
        ..FakePlaces::default()
    };
    let harness = Harness::new(places, FakeWeather::default(), FakeLightPollution::default());
    let service = harness.service(RecommendationSettings::default());

    let bundle = service
        .recommend(&coordinate(45.0, -75.0), &UserPreferences::default())
        .await;

    assert_eq!(bundle.results.len(), 8);
    for pair in bundle.results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }

    let prompts = harness.text.prompts.lock().unwrap();
    let prompt = &prompts[0];
    for result in bundle.top(5) {
        assert!(prompt.contains(&result.venue.name));
    }
    assert!(prompt.contains("5. Site 4 "));
    assert!(!prompt.contains("6. "));
    assert!(!prompt.contains("Site 7"));
}

#[tokio::test]
async fn test_require_availability_removes_closed_venues() {
    let places = FakePlaces {
        venues: vec![
            Venue::new("Closed Camp", coordinate(45.05, -75.0)).with_open(false),
            Venue::new("Open Camp", coordinate(45.2, -75.0)).with_open(true),
            Venue::new("Unknown Camp", coordinate(45.3, -75.0)),
        ],
        ..FakePlaces::default()
    };
    let harness = Harness::new(places, FakeWeather::default(), FakeLightPollution::default());
    let service = harness.service(RecommendationSettings::default());
    let user = coordinate(45.0, -75.0);

    let everything = service.recommend(&user, &UserPreferences::default()).await;
    assert_eq!(everything.results.len(), 3);

    let prefs = UserPreferences {
        require_availability: true,
        ..UserPreferences::default()
    };
    let available = service.recommend(&user, &prefs).await;
    let names: Vec<&str> = available.results.iter().map(|r| r.venue.name.as_str()).collect();
    assert_eq!(names, vec!["Open Camp", "Unknown Camp"]);
}

#[tokio::test]
async fn test_nearby_trail_satisfies_hiking_preference() {
    let places = FakePlaces {
        venues: vec![
            Venue::new("Lakeside", coordinate(45.1, -75.0)),
            Venue::new("Ridge Camp", coordinate(45.1, -75.0)),
        ],
        trails: vec![Trail::new("Ridge Loop", coordinate(45.12, -75.0))],
        ..FakePlaces::default()
    };
    let harness = Harness::new(places, FakeWeather::default(), FakeLightPollution::default());
    let service = harness.service(RecommendationSettings::default());
    let user = coordinate(45.0, -75.0);

    let neutral = service.recommend(&user, &UserPreferences::default()).await;
    let hiking = service
        .recommend(
            &user,
            &UserPreferences {
                prefers_hiking: true,
                ..UserPreferences::default()
            },
        )
        .await;

    assert_eq!(hiking.trails.len(), 1);
    let delta = hiking.results[0].score - neutral.results[0].score;
    assert!((delta - 2.0).abs() < 1e-9);
    // Both venues share a location, so equal scores keep input order
    assert_eq!(hiking.results[0].venue.name, "Lakeside");
}

#[tokio::test]
async fn test_no_candidates_still_produces_a_summary() {
    let harness = Harness::new(FakePlaces::default(), FakeWeather::default(), FakeLightPollution::default());
    let bundle = harness
        .service(RecommendationSettings::default())
        .recommend(&coordinate(45.0, -75.0), &UserPreferences::default())
        .await;

    assert!(bundle.results.is_empty());
    assert_eq!(harness.weather.calls.load(Ordering::SeqCst), 0);
    let prompts = harness.text.prompts.lock().unwrap();
    assert!(prompts[0].contains("No candidate campsites found."));
}

#[tokio::test]
async fn test_unconfigured_text_generation_falls_back() {
    let harness = example_harness();
    let cache = Arc::new(MemoCache::new(8, Duration::from_secs(60)));
    let gemini = Arc::new(GeminiClient::new(&TextGenerationConfig::default(), cache).unwrap());
    let service = harness.service_with_text(RecommendationSettings::default(), gemini);

    let bundle = service
        .recommend(&coordinate(45.0, -75.0), &UserPreferences::default())
        .await;

    assert_eq!(bundle.results.len(), 2);
    assert_eq!(bundle.summary.text, MISSING_KEY_TEXT);
    assert!(bundle.summary.is_fallback);
}

#[tokio::test]
async fn test_unreachable_text_generation_falls_back() {
    let harness = example_harness();
    let cache = Arc::new(MemoCache::new(8, Duration::from_secs(60)));
    let mut config = TextGenerationConfig::default();
    config.service.api_key = Some("test-gemini-key".to_string());
    config.service.base_url = Some("http://127.0.0.1:9".to_string());
    config.service.max_retries = 0;
    let gemini = Arc::new(GeminiClient::new(&config, cache).unwrap());
    let service = harness.service_with_text(RecommendationSettings::default(), gemini);

    let bundle = service
        .recommend(&coordinate(45.0, -75.0), &UserPreferences::default())
        .await;

    assert_eq!(bundle.results.len(), 2);
    assert_eq!(bundle.summary.text, ERROR_TEXT);
}

#[tokio::test]
async fn test_recommend_at_rejects_invalid_coordinates() {
    let harness = example_harness();
    let service = harness.service(RecommendationSettings::default());

    let err = service
        .recommend_at(120.0, -75.0, &UserPreferences::default())
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(harness.places.venue_calls.load(Ordering::SeqCst), 0);

    let bundle = service
        .recommend_at(45.0, -75.0, &UserPreferences::default())
        .await
        .unwrap();
    assert_eq!(bundle.results.len(), 2);
}

#[tokio::test]
async fn test_located_address_feeds_recommendation() {
    let harness = example_harness();
    let service = harness.service(RecommendationSettings::default());

    let found = service.locate("  Pine Lake Road ").await.unwrap().unwrap();
    assert_eq!(found.address, "Pine Lake Road, Ontario");

    let bundle = service
        .recommend_at(found.lat, found.lon, &UserPreferences::default())
        .await
        .unwrap();
    assert_eq!(bundle.results[0].venue.name, "Pine Lake");
}

#[tokio::test]
async fn test_unknown_address_and_blank_address() {
    let harness = example_harness();
    let service = harness.service(RecommendationSettings::default());

    assert!(service.locate("Atlantis").await.unwrap().is_none());
    assert!(service.locate("").await.unwrap_err().is_validation());
    // blank input never reaches the geocoder
    assert_eq!(harness.geocoder.calls.load(Ordering::SeqCst), 1);
    assert_eq!(harness.places.venue_calls.load(Ordering::SeqCst), 0);
}
