//! Summary Lambda - Shareable web view of attendance.
//!
//! Endpoints:
//! - GET /summary?date=YYYY-MM-DD - Today's check-in ratio for every group
//! - GET /groups/{group_id}/table?month=YYYY-MM - Month table for one group
//! - GET /groups/{group_id}/users/{user_id}/calendar?month=YYYY-MM - One member's calendar

use chrono::NaiveDate;
use lambda_http::{run, service_fn, Body, Error, Request, RequestExt, Response};
use shared::grid::{self, GridStyle};
use shared::http::{error_response, from_error, json_response, ApiResponse};
use shared::models::{count_text, CalendarResponse, GroupSummary, SummaryResponse};
use shared::profile::UNKNOWN_DISPLAY_NAME;
use shared::{
    Config, HolidayCache, HolidaySource, HttpHolidaySource, KeyValueStore, Ledger, PgStore,
    Reporter, YearMonth,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use validator::{Validate, ValidationError};

#[derive(Debug, PartialEq, Eq)]
enum Route {
    Summary,
    GroupTable { group_id: String },
    Calendar { group_id: String, user_id: String },
}

impl Route {
    fn parse(method: &str, path: &str) -> Option<Self> {
        if method != "GET" {
            return None;
        }
        // Strip /api stage prefix if present (API Gateway REST API includes stage in path)
        let path = path.strip_prefix("/api").unwrap_or(path);
        let segments: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| urlencoding::decode(s).map(|d| d.into_owned()).unwrap_or_else(|_| s.to_string()))
            .collect();

        match segments.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
            ["summary"] => Some(Route::Summary),
            ["groups", group_id, "table"] => Some(Route::GroupTable {
                group_id: group_id.to_string(),
            }),
            ["groups", group_id, "users", user_id, "calendar"] => Some(Route::Calendar {
                group_id: group_id.to_string(),
                user_id: user_id.to_string(),
            }),
            _ => None,
        }
    }

    /// Path ids that end up in store keys.
    fn ids(&self) -> Vec<PathId> {
        let ids = match self {
            Route::Summary => vec![],
            Route::GroupTable { group_id } => vec![group_id],
            Route::Calendar { group_id, user_id } => vec![group_id, user_id],
        };
        ids.into_iter().map(|id| PathId { id: id.clone() }).collect()
    }
}

/// Ids end up inside `{group}:{user}:{month}` keys.
fn no_key_separator(value: &str) -> Result<(), ValidationError> {
    if value.contains(':') {
        return Err(ValidationError::new("key_separator"));
    }
    Ok(())
}

#[derive(Debug, Validate)]
struct PathId {
    #[validate(length(min = 1, max = 64), custom(function = "no_key_separator"))]
    id: String,
}

/// Everything the routes read from.
struct Api<S, H> {
    ledger: Ledger<S>,
    reporter: Reporter<S>,
    holidays: HolidayCache<H>,
    style: GridStyle,
}

impl<S: KeyValueStore, H: HolidaySource> Api<S, H> {
    fn new(store: Arc<S>, holidays: HolidayCache<H>) -> Self {
        Self {
            ledger: Ledger::new(Arc::clone(&store)),
            reporter: Reporter::new(store),
            holidays,
            style: GridStyle::default(),
        }
    }

    async fn summary(&self, date: NaiveDate) -> shared::Result<SummaryResponse> {
        let groups = self
            .reporter
            .summarize_all(date)
            .await?
            .into_iter()
            .map(|(group_id, tally)| GroupSummary::new(group_id, tally))
            .collect();
        Ok(SummaryResponse {
            date: date.to_string(),
            groups,
        })
    }

    async fn calendar(
        &self,
        group_id: &str,
        user_id: &str,
        month: YearMonth,
    ) -> shared::Result<CalendarResponse> {
        let record = self.ledger.load_or_default(group_id, user_id, month).await?;
        let display_name = self
            .ledger
            .display_name(user_id)
            .await?
            .unwrap_or_else(|| UNKNOWN_DISPLAY_NAME.to_string());
        let holidays = self.holidays.get_holidays(month).await;
        let grid = grid::build(&record.days, month.first_weekday(), &holidays, &self.style)?;

        Ok(CalendarResponse {
            group_id: group_id.to_string(),
            user_id: user_id.to_string(),
            display_name,
            month,
            present_count: record.present_count(),
            header: count_text(record.present_count()),
            grid,
        })
    }

    async fn route(&self, event: &Request, today: NaiveDate) -> Result<Response<Body>, Error> {
        let raw_path = event.uri().path();
        let method = event.method().as_str();
        info!("Received request: method={}, path={}", method, raw_path);

        let Some(route) = Route::parse(method, raw_path) else {
            return error_response(404, "Not found");
        };

        let params = event.query_string_parameters();

        for id in route.ids() {
            if let Err(e) = id.validate() {
                return error_response(400, format!("Invalid id '{}': {}", id.id, e));
            }
        }

        // Only the per-month routes read this, so a bad value is reported there
        let month = params
            .first("month")
            .map_or(Ok(YearMonth::of(today)), |raw| raw.parse::<YearMonth>());

        match route {
            Route::Summary => {
                let date = match params.first("date") {
                    Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                        Ok(date) => date,
                        Err(e) => return error_response(400, format!("Invalid date '{}': {}", raw, e)),
                    },
                    None => today,
                };
                match self.summary(date).await {
                    Ok(summary) => json_response(200, &ApiResponse::success(summary)),
                    Err(e) => {
                        error!("Failed to build summary: {}", e);
                        from_error(&e)
                    }
                }
            }
            Route::GroupTable { group_id } => {
                let month = match month {
                    Ok(month) => month,
                    Err(e) => return from_error(&e),
                };
                match self.reporter.table_for_group(&group_id, month).await {
                    Ok(Some(table)) => json_response(200, &ApiResponse::success(table)),
                    Ok(None) => error_response(404, format!("No records for {} in {}", group_id, month)),
                    Err(e) => {
                        error!("Failed to build table for {}: {}", group_id, e);
                        from_error(&e)
                    }
                }
            }
            Route::Calendar { group_id, user_id } => {
                let month = match month {
                    Ok(month) => month,
                    Err(e) => return from_error(&e),
                };
                match self.calendar(&group_id, &user_id, month).await {
                    Ok(calendar) => json_response(200, &ApiResponse::success(calendar)),
                    Err(e) => {
                        error!("Failed to build calendar for {}: {}", user_id, e);
                        from_error(&e)
                    }
                }
            }
        }
    }
}

/// Application state
struct AppState {
    config: Config,
    api: Api<PgStore, Option<HttpHolidaySource>>,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let secrets_client = aws_sdk_secretsmanager::Client::new(&aws_config);

        let db_credentials =
            shared::get_database_credentials(&secrets_client, &config.db_secret_arn).await?;
        let store = Arc::new(shared::db::connect_store(&config, &db_credentials).await?);

        let holiday_source = config.holiday_api_url.clone().map(|url| {
            HttpHolidaySource::new(reqwest::Client::new(), url, config.holiday_api_key.clone())
        });

        Ok(Self {
            api: Api::new(store, HolidayCache::new(holiday_source)),
            config,
        })
    }
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    state.api.route(&event, state.config.local_today()).await
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new().await?);

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shared::{HolidaySet, MemoryStore};
    use std::collections::HashMap;

    struct NoHolidays;

    #[async_trait]
    impl HolidaySource for NoHolidays {
        async fn fetch(&self, _month: YearMonth) -> shared::Result<HolidaySet> {
            Ok(HolidaySet::new())
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 12).unwrap()
    }

    async fn seeded_api() -> Api<MemoryStore, NoHolidays> {
        let store = Arc::new(MemoryStore::new());
        let api = Api::new(store, HolidayCache::new(NoHolidays));
        let march = YearMonth::of(today());
        api.ledger.check_in("A", "U1", "Kim", march, 12, true).await.unwrap();
        api.ledger.check_in("A", "U2", "Lee", march, 1, true).await.unwrap();
        api.ledger.check_in("B", "U3", "Park", march, 2, true).await.unwrap();
        api
    }

    fn request(path: &str, query: &[(&str, &str)]) -> Request {
        let mut request = Request::default();
        *request.uri_mut() = path.parse().unwrap();
        let query: HashMap<String, String> = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        request.with_query_string_parameters(query)
    }

    fn body_json(response: &Response<Body>) -> serde_json::Value {
        serde_json::from_slice(response.body().as_ref()).unwrap()
    }

    #[test]
    fn test_route_parse() {
        assert_eq!(Route::parse("GET", "/summary"), Some(Route::Summary));
        assert_eq!(Route::parse("GET", "/api/summary"), Some(Route::Summary));
        assert_eq!(
            Route::parse("GET", "/groups/C1/table"),
            Some(Route::GroupTable { group_id: "C1".into() })
        );
        assert_eq!(
            Route::parse("GET", "/groups/C1/users/U%201/calendar"),
            Some(Route::Calendar {
                group_id: "C1".into(),
                user_id: "U 1".into()
            })
        );
        assert_eq!(Route::parse("POST", "/summary"), None);
        assert_eq!(Route::parse("GET", "/groups/C1"), None);
    }

    #[tokio::test]
    async fn test_summary_endpoint() {
        let api = seeded_api().await;
        let response = api
            .route(&request("/summary", &[("date", "2024-03-12")]), today())
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body = body_json(&response);
        let groups = body["data"]["groups"].as_array().unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0]["group_id"], "A");
        assert_eq!(groups[0]["present_today"], 1);
        assert_eq!(groups[0]["members"], 2);
        assert_eq!(groups[1]["present_today"], 0);
    }

    #[tokio::test]
    async fn test_table_endpoint() {
        let api = seeded_api().await;
        let response = api
            .route(&request("/groups/A/table", &[("month", "2024-03")]), today())
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let rows = body_json(&response)["data"]["rows"].as_array().unwrap().clone();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["display_name"], "Kim");
        assert_eq!(rows[0]["days"].as_str().unwrap().len(), 31);

        let missing = api
            .route(&request("/groups/Z/table", &[]), today())
            .await
            .unwrap();
        assert_eq!(missing.status(), 404);
    }

    #[tokio::test]
    async fn test_calendar_endpoint() {
        let api = seeded_api().await;
        let response = api
            .route(&request("/groups/A/users/U1/calendar", &[]), today())
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body = body_json(&response);
        assert_eq!(body["data"]["display_name"], "Kim");
        assert_eq!(body["data"]["present_count"], 1);
        assert_eq!(body["data"]["header"], "1회 달성!");
        // March 2024 starts on a Friday
        let rows = body["data"]["grid"]["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0][5]["kind"], "day_label");
    }

    #[tokio::test]
    async fn test_bad_input() {
        let api = seeded_api().await;
        let bad_month = api
            .route(&request("/groups/A/table", &[("month", "2024-13")]), today())
            .await
            .unwrap();
        assert_eq!(bad_month.status(), 400);

        let bad_calendar_month = api
            .route(&request("/groups/A/users/U1/calendar", &[("month", "March")]), today())
            .await
            .unwrap();
        assert_eq!(bad_calendar_month.status(), 400);

        // The summary route ignores month
        let summary = api
            .route(&request("/summary", &[("month", "bad")]), today())
            .await
            .unwrap();
        assert_eq!(summary.status(), 200);

        let bad_date = api
            .route(&request("/summary", &[("date", "yesterday")]), today())
            .await
            .unwrap();
        assert_eq!(bad_date.status(), 400);

        let bad_id = api
            .route(&request("/groups/A%3AB/table", &[]), today())
            .await
            .unwrap();
        assert_eq!(bad_id.status(), 400);

        let unknown = api.route(&request("/nope", &[]), today()).await.unwrap();
        assert_eq!(unknown.status(), 404);
    }
}
