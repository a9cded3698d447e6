//! Public holidays for calendar coloring.
//!
//! Holidays are only used to tint day labels, so every failure here degrades
//! to "no holidays" instead of failing the request.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::month::YearMonth;
use crate::{Error, Result};

/// Day-of-month numbers that are holidays.
pub type HolidaySet = BTreeSet<u32>;

#[async_trait]
pub trait HolidaySource: Send + Sync {
    async fn fetch(&self, month: YearMonth) -> Result<HolidaySet>;
}

/// An unconfigured source never has holidays.
#[async_trait]
impl<H: HolidaySource> HolidaySource for Option<H> {
    async fn fetch(&self, month: YearMonth) -> Result<HolidaySet> {
        match self {
            Some(source) => source.fetch(month).await,
            None => Ok(HolidaySet::new()),
        }
    }
}

#[derive(Debug, Clone)]
struct CachedMonth {
    month: YearMonth,
    holidays: HolidaySet,
}

/// Single-slot cache holding the most recently fetched month.
///
/// The lock is released while fetching, so concurrent misses for different
/// months may both fetch and the last one to finish owns the slot.
pub struct HolidayCache<H> {
    source: H,
    slot: RwLock<Option<CachedMonth>>,
}

impl<H: HolidaySource> HolidayCache<H> {
    pub fn new(source: H) -> Self {
        Self {
            source,
            slot: RwLock::new(None),
        }
    }

    /// Holidays for `month`, fetching on a miss. Failed fetches return an
    /// empty set and are retried on the next call.
    pub async fn get_holidays(&self, month: YearMonth) -> HolidaySet {
        if let Some(cached) = self.slot.read().await.as_ref() {
            if cached.month == month {
                return cached.holidays.clone();
            }
        }

        match self.source.fetch(month).await {
            Ok(holidays) => {
                debug!(month = %month, count = holidays.len(), "Cached holidays");
                *self.slot.write().await = Some(CachedMonth {
                    month,
                    holidays: holidays.clone(),
                });
                holidays
            }
            Err(e) => {
                warn!(month = %month, "Holiday lookup failed: {}", e);
                HolidaySet::new()
            }
        }
    }
}

/// Client for a public-holiday REST API (`getRestDeInfo` response shape).
pub struct HttpHolidaySource {
    http_client: reqwest::Client,
    base_url: String,
    service_key: Option<String>,
}

impl HttpHolidaySource {
    pub fn new(http_client: reqwest::Client, base_url: String, service_key: Option<String>) -> Self {
        Self {
            http_client,
            base_url,
            service_key,
        }
    }

    fn url(&self, month: YearMonth) -> String {
        let mut url = format!(
            "{}?solYear={}&solMonth={:02}&_type=json&numOfRows=50",
            self.base_url, month.year, month.month
        );
        if let Some(key) = &self.service_key {
            url.push_str("&ServiceKey=");
            url.push_str(&urlencoding::encode(key));
        }
        url
    }
}

#[async_trait]
impl HolidaySource for HttpHolidaySource {
    async fn fetch(&self, month: YearMonth) -> Result<HolidaySet> {
        let response = self
            .http_client
            .get(self.url(month))
            .send()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("Holiday request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::UpstreamUnavailable(format!(
                "Holiday service returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("Holiday response unreadable: {}", e)))?;

        parse_holidays(&body, month)
    }
}

/// Extract holiday days of `month` from a `getRestDeInfo` JSON body.
///
/// `items.item` is an array, a single object, or absent (`items: ""`) when
/// the month has no holidays.
pub fn parse_holidays(body: &str, month: YearMonth) -> Result<HolidaySet> {
    if body.trim().is_empty() {
        return Err(Error::UpstreamUnavailable("Empty holiday response".to_string()));
    }

    let json: Value = serde_json::from_str(body)
        .map_err(|e| Error::UpstreamUnavailable(format!("Malformed holiday response: {}", e)))?;

    let response_body = json
        .pointer("/response/body")
        .ok_or_else(|| Error::UpstreamUnavailable("Holiday response has no body".to_string()))?;

    let items = match response_body.pointer("/items/item") {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(item @ Value::Object(_)) => vec![item],
        _ => Vec::new(),
    };

    let prefix = month.year as i64 * 100 + month.month as i64;
    Ok(items
        .into_iter()
        .filter(|item| item.get("isHoliday").and_then(Value::as_str).unwrap_or("Y") == "Y")
        .filter_map(|item| locdate(item.get("locdate")?))
        .filter(|date| date / 100 == prefix)
        .map(|date| (date % 100) as u32)
        .collect())
}

/// `locdate` is `YYYYMMDD`, as a number or a string.
fn locdate(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingSource {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HolidaySource for CountingSource {
        async fn fetch(&self, month: YearMonth) -> Result<HolidaySet> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::UpstreamUnavailable("down".to_string()));
            }
            Ok(HolidaySet::from([month.month]))
        }
    }

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    #[tokio::test]
    async fn test_same_month_fetches_once() {
        let cache = HolidayCache::new(CountingSource::new(false));
        assert_eq!(cache.get_holidays(ym(2024, 3)).await, HolidaySet::from([3]));
        assert_eq!(cache.get_holidays(ym(2024, 3)).await, HolidaySet::from([3]));
        assert_eq!(cache.source.calls(), 1);
    }

    #[tokio::test]
    async fn test_month_change_evicts() {
        let cache = HolidayCache::new(CountingSource::new(false));
        cache.get_holidays(ym(2024, 3)).await;
        assert_eq!(cache.get_holidays(ym(2024, 5)).await, HolidaySet::from([5]));
        assert_eq!(cache.source.calls(), 2);
        // March was evicted
        cache.get_holidays(ym(2024, 3)).await;
        assert_eq!(cache.source.calls(), 3);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let cache = HolidayCache::new(CountingSource::new(true));
        assert!(cache.get_holidays(ym(2024, 3)).await.is_empty());
        assert!(cache.get_holidays(ym(2024, 3)).await.is_empty());
        assert_eq!(cache.source.calls(), 2);
    }

    #[tokio::test]
    async fn test_unconfigured_source() {
        let cache = HolidayCache::new(None::<CountingSource>);
        assert!(cache.get_holidays(ym(2024, 3)).await.is_empty());
    }

    #[test]
    fn test_parse_item_array() {
        let body = r#"{"response":{"header":{"resultCode":"00"},"body":{"items":{"item":[
            {"dateKind":"01","dateName":"삼일절","isHoliday":"Y","locdate":20240301,"seq":1},
            {"dateKind":"01","dateName":"국회의원선거","isHoliday":"Y","locdate":20240410,"seq":1}
        ]},"numOfRows":50,"pageNo":1,"totalCount":2}}}"#;
        let holidays = parse_holidays(body, ym(2024, 3)).unwrap();
        // April's entry is filtered out
        assert_eq!(holidays, HolidaySet::from([1]));
    }

    #[test]
    fn test_parse_single_item_and_none() {
        let single = r#"{"response":{"body":{"items":{"item":
            {"dateName":"광복절","isHoliday":"Y","locdate":"20240815"}},"totalCount":1}}}"#;
        assert_eq!(parse_holidays(single, ym(2024, 8)).unwrap(), HolidaySet::from([15]));

        let none = r#"{"response":{"body":{"items":"","totalCount":0}}}"#;
        assert!(parse_holidays(none, ym(2024, 11)).unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_empty_and_malformed() {
        assert!(parse_holidays("", ym(2024, 3)).is_err());
        assert!(parse_holidays("<xml/>", ym(2024, 3)).is_err());
        assert!(parse_holidays(r#"{"error":"quota"}"#, ym(2024, 3)).is_err());
    }
}
