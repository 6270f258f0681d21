//! HTTP handler functions for the livability API.

use std::path::Path;

use actix_web::{Either, HttpResponse, web};
use livability_scoring::ScoreRequest;
use livability_server_models::{ApiError, ApiHealth, ApiPrediction, PredictRequest};

use crate::{AppState, STATIC_PREFIX};

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health))
            .route("/predict", web::post().to(predict)),
    );
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `POST /api/predict`
///
/// Accepts JSON or form fields and returns the aggregate score. Component
/// failures are absorbed into the score; only malformed coordinates are
/// rejected.
pub async fn predict(
    state: web::Data<AppState>,
    body: Either<web::Json<PredictRequest>, web::Form<PredictRequest>>,
) -> HttpResponse {
    let request = match body {
        Either::Left(json) => json.into_inner(),
        Either::Right(form) => form.into_inner(),
    };

    let request = match to_score_request(request) {
        Ok(request) => request,
        Err(message) => {
            log::debug!("Rejected predict request: {message}");
            return HttpResponse::BadRequest().json(ApiError { error: message });
        }
    };

    let score = state.aggregator.score(&request).await;
    let map_url = score.map_file.as_deref().and_then(map_url);

    HttpResponse::Ok().json(ApiPrediction::new(&score, map_url))
}

fn to_score_request(request: PredictRequest) -> Result<ScoreRequest, String> {
    if !request.location().is_valid() {
        return Err(format!(
            "Invalid coordinates ({}, {})",
            request.lat, request.lng
        ));
    }

    Ok(ScoreRequest {
        location: request.location(),
        crime_district: request.crime_district,
        disaster_district: request.disaster_district,
        pincode: request.pincode,
        city: request.city,
    })
}

/// URL a published map is served at.
fn map_url(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| format!("{STATIC_PREFIX}/{name}"))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use actix_web::test as actix_test;
    use actix_web::{App, http::StatusCode};
    use livability_dataset::Table;
    use livability_disaster::DisasterTables;
    use livability_geocoder::StaticGeocoder;
    use livability_house::forest::ForestParams;
    use livability_places::StaticPlaces;
    use livability_price::map::LeafletMapRenderer;
    use livability_score_models::Coordinates;
    use livability_score_models::progress::null_progress;
    use livability_scoring::{Aggregator, ScoringContext};

    use super::*;

    const CHENNAI: Coordinates = Coordinates::new(13.0827, 80.2707);

    const CRIME_CSV: &str = "District,Death due to negligence relating to road accidents - I,Hit and Run - I,Other Accidents - I\n\
                             Chennai,120,45,300\n";

    const SALES_CSV: &str = "AREA,INT_SQFT,DATE_SALE,DIST_MAINROAD,N_BEDROOM,N_BATHROOM,N_ROOM,SALE_COND,PARK_FACIL,DATE_BUILD,SALES_PRICE\n\
                             Adyar,1000,04-05-2010,100,2,1,4,Normal Sale,Yes,15-05-1990,8000000\n\
                             Adyar,1100,04-05-2012,100,2,1,4,Normal Sale,Yes,15-05-1992,9000000\n\
                             Adyar,1200,04-05-2014,100,3,2,5,Normal Sale,Yes,15-05-1994,10000000\n";

    fn table(csv: &str) -> Table {
        Table::from_reader(csv.as_bytes()).unwrap()
    }

    fn state(maps: &std::path::Path) -> web::Data<AppState> {
        let disasters = DisasterTables {
            all: table("Year,Chennai\n2000,40\n2001,42\n2002,45\n2003,47\n"),
            earthquakes: table("Year,Chennai\n2000,\n"),
            floods: table("Year,Chennai\n2000,3\n"),
            cyclones: table("Year,Chennai\n2000,\n"),
        };
        let forest = ForestParams {
            n_trees: 5,
            ..ForestParams::default()
        };
        let context = ScoringContext::from_tables(
            table(CRIME_CSV),
            &disasters,
            &table(SALES_CSV),
            2024,
            &forest,
            &null_progress(),
        )
        .unwrap();

        let aggregator = Aggregator::new(
            Arc::new(context),
            Arc::new(StaticGeocoder::new([("600001".to_string(), CHENNAI)])),
            Arc::new(StaticPlaces::new([("hospital".to_string(), vec![CHENNAI])])),
            Arc::new(LeafletMapRenderer::new(maps)),
        );

        web::Data::new(AppState {
            aggregator: Arc::new(aggregator),
        })
    }

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("livability_{name}_{}", uuid::Uuid::new_v4()))
    }

    fn request(lat: f64, lng: f64) -> PredictRequest {
        PredictRequest {
            crime_district: "Chennai".to_string(),
            disaster_district: "Chennai".to_string(),
            pincode: "600001".to_string(),
            city: "Adyar".to_string(),
            lat,
            lng,
        }
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let app = actix_test::init_service(App::new().configure(configure)).await;
        let req = actix_test::TestRequest::get().uri("/api/health").to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["healthy"], true);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn predict_accepts_json() {
        let maps = temp_dir("server_maps_json");
        let app = actix_test::init_service(
            App::new().app_data(state(&maps)).configure(configure),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/api/predict")
            .set_json(serde_json::json!({
                "crime_district": "Chennai",
                "disaster_district": "Chennai",
                "pincode": "600001",
                "city": "Adyar",
                "lat": 13.0827,
                "lng": 80.2707
            }))
            .to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["crimeScore"], 13.35);
        assert_eq!(body["proximityScore"], 14.0);
        assert!(body["priceScore"].as_f64().unwrap() > 0.0);
        assert!(
            body["mapUrl"]
                .as_str()
                .unwrap()
                .starts_with("/static/development_map_")
        );
        assert!(body.get("mapFile").is_none());

        std::fs::remove_dir_all(&maps).unwrap();
    }

    #[actix_web::test]
    async fn predict_accepts_form_fields() {
        let maps = temp_dir("server_maps_form");
        let app = actix_test::init_service(
            App::new().app_data(state(&maps)).configure(configure),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/api/predict")
            .set_form([
                ("crime_district", "Chennai"),
                ("disaster_district", "Chennai"),
                ("pincode", "000000"),
                ("city", "Adyar"),
                ("lat", "13.0827"),
                ("lng", "80.2707"),
            ])
            .to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["crimeScore"], 13.35);
        assert_eq!(body["priceScore"], 0.0);
        assert!(body["mapUrl"].is_null());

        let _ = std::fs::remove_dir_all(&maps);
    }

    #[actix_web::test]
    async fn predict_rejects_invalid_coordinates() {
        let maps = temp_dir("server_maps_invalid");
        let app = actix_test::init_service(
            App::new().app_data(state(&maps)).configure(configure),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/api/predict")
            .set_json(serde_json::json!({
                "crime_district": "Chennai",
                "disaster_district": "Chennai",
                "pincode": "600001",
                "city": "Adyar",
                "lat": 95.0,
                "lng": 80.2707
            }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: ApiError = actix_test::read_body_json(resp).await;
        assert!(body.error.contains("Invalid coordinates"));
        assert!(!maps.exists());
    }

    #[test]
    fn converts_valid_request() {
        let converted = to_score_request(request(13.0827, 80.2707)).unwrap();
        assert_eq!(converted.city, "Adyar");
        assert!((converted.location.longitude - 80.2707).abs() < 1e-12);
    }

    #[test]
    fn rejects_out_of_range_or_nan_coordinates() {
        assert!(to_score_request(request(91.0, 0.0)).is_err());
        assert!(to_score_request(request(0.0, -181.0)).is_err());
        assert!(to_score_request(request(f64::NAN, 0.0)).is_err());
    }

    #[test]
    fn map_url_uses_file_name() {
        assert_eq!(
            map_url(Path::new("/srv/static/development_map_1.html")).as_deref(),
            Some("/static/development_map_1.html")
        );
        assert_eq!(map_url(Path::new("/")), None);
    }
}
