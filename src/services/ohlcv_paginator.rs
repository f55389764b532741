//! OHLCV pagination engine
//!
//! Turns one `(symbol, timeframe, total_limit, until)` request into as many
//! page fetches as the exchange's page limit requires, walking backward in time
//! from either the latest candle or `until`.
//!
//! Pages are fetched strictly one after another: each page's `since` is derived
//! from the oldest candle collected so far. Anything the exchange returns that
//! is not strictly older than that candle is treated as overlap and dropped.

use crate::constants::{DEFAULT_MAX_RETRIES_PER_REQUEST, RETRY_PAGE_SIZE};
use crate::error::{AppError, Result};
use crate::models::{Candle, FetchCompletion, FetchRequest, OhlcvFetch, ProgressCallback, RawCandle};
use crate::services::exchange::ExchangeConnector;
use tracing::{debug, warn};

pub struct OhlcvPaginator<'a> {
    connector: &'a dyn ExchangeConnector,
    page_limit: usize,
    max_retries: usize,
    progress: Option<&'a ProgressCallback>,
}

/// Counters shared by every page of one request
#[derive(Default)]
struct PageStats {
    pages_fetched: usize,
    retries_used: usize,
}

impl<'a> OhlcvPaginator<'a> {
    pub fn new(connector: &'a dyn ExchangeConnector) -> Self {
        Self {
            connector,
            page_limit: connector.page_limit().max(1),
            max_retries: DEFAULT_MAX_RETRIES_PER_REQUEST,
            progress: None,
        }
    }

    /// Cap on page-size reduction retries across one request
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_progress(mut self, progress: Option<&'a ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    pub async fn fetch(&self, request: &FetchRequest) -> Result<OhlcvFetch> {
        if request.total_limit == 0 {
            return Err(AppError::InvalidInput(
                "limit must be greater than zero".to_string(),
            ));
        }

        let total = request.total_limit;
        let single_page = total <= self.page_limit;

        debug!(
            "Fetching {} {} candles for {} on {} (page limit {}, until {:?})",
            total,
            request.timeframe,
            request.symbol,
            self.connector.id(),
            self.page_limit,
            request.until
        );

        let mut stats = PageStats::default();
        let mut collected: Vec<RawCandle> = Vec::with_capacity(total.min(self.page_limit));
        let mut oldest: Option<i64> = None;
        // Pages end just before the anchor; `None` asks for the most recent candles
        let mut anchor = request.until;
        // Set while the next page is the window ending at `until`
        let mut until_window = request.until.is_some();

        let completion = loop {
            let size = (total - collected.len()).min(self.page_limit);
            let (mut page, requested) = self.fetch_page(request, size, anchor, &mut stats).await?;

            if page.is_empty() {
                if until_window {
                    debug!("Nothing in the window before until, re-anchoring on the newest candles");
                    anchor = None;
                    until_window = false;
                    continue;
                }
                debug!("Empty page, history exhausted after {} candles", collected.len());
                break FetchCompletion::HistoryExhausted;
            }
            let returned = page.len();

            if let Some(until) = request.until {
                page.retain(|c| c.timestamp <= until);
                if page.is_empty() {
                    debug!("Every candle of the page lies past until={}", until);
                    break FetchCompletion::UntilBoundaryReached;
                }
            }

            if let Some(oldest) = oldest {
                page.retain(|c| c.timestamp < oldest);
            }
            let Some(page_oldest) = page.iter().map(|c| c.timestamp).min() else {
                debug!("Page added no older candles, history exhausted");
                break FetchCompletion::HistoryExhausted;
            };

            collected.extend(page);
            oldest = Some(page_oldest);
            self.report(collected.len().min(total), total);

            if collected.len() >= total {
                break FetchCompletion::Complete;
            }
            // A reduced retry leaves the rest of a single-page request to later pages
            if single_page && requested == size {
                break FetchCompletion::HistoryExhausted;
            }
            // A short page ending at `until` only means `until` is past the newest candle
            if returned < requested && !until_window {
                debug!("Short page ({} of {}), history exhausted", returned, requested);
                break FetchCompletion::HistoryExhausted;
            }

            anchor = oldest;
            until_window = false;
        };

        let candles = finish(collected, total, request.timeframe.duration_ms());

        debug!(
            "Collected {} candles in {} pages ({} retries, {:?})",
            candles.len(),
            stats.pages_fetched,
            stats.retries_used,
            completion
        );

        Ok(OhlcvFetch {
            candles,
            completion,
            pages_fetched: stats.pages_fetched,
            retries_used: stats.retries_used,
        })
    }

    /// Fetch one page ending before `anchor`, retrying once at a smaller size on failure
    ///
    /// Returns the page together with the size actually requested.
    async fn fetch_page(
        &self,
        request: &FetchRequest,
        size: usize,
        anchor: Option<i64>,
        stats: &mut PageStats,
    ) -> Result<(Vec<RawCandle>, usize)> {
        let duration = request.timeframe.duration_ms();
        let since_for = |size: usize| anchor.map(|a| a - size as i64 * duration);

        stats.pages_fetched += 1;
        let first_attempt = self
            .connector
            .fetch_ohlcv_page(&request.symbol, request.timeframe, size, since_for(size))
            .await;

        match first_attempt {
            Ok(page) => Ok((page, size)),
            Err(e) if size > RETRY_PAGE_SIZE && stats.retries_used < self.max_retries => {
                warn!(
                    "Page fetch of {} candles failed on {} ({}), retrying with {}",
                    size,
                    self.connector.id(),
                    e,
                    RETRY_PAGE_SIZE
                );
                stats.retries_used += 1;
                stats.pages_fetched += 1;
                let page = self
                    .connector
                    .fetch_ohlcv_page(
                        &request.symbol,
                        request.timeframe,
                        RETRY_PAGE_SIZE,
                        since_for(RETRY_PAGE_SIZE),
                    )
                    .await?;
                Ok((page, RETRY_PAGE_SIZE))
            }
            Err(e) => Err(e),
        }
    }

    fn report(&self, completed: usize, total: usize) {
        if let Some(progress) = self.progress {
            progress(completed, total);
        }
    }
}

/// Sort, dedup, keep the newest `total` candles and attach datetimes
fn finish(mut collected: Vec<RawCandle>, total: usize, duration: i64) -> Vec<Candle> {
    collected.sort_by_key(|c| c.timestamp);
    collected.dedup_by_key(|c| c.timestamp);
    if collected.len() > total {
        collected.drain(..collected.len() - total);
    }

    debug_assert!(collected.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    for w in collected.windows(2) {
        let gap = w[1].timestamp - w[0].timestamp;
        if gap != duration {
            debug!("Irregular candle spacing: {}ms between {} and {}", gap, w[0].timestamp, w[1].timestamp);
        }
    }

    collected.into_iter().map(Candle::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Timeframe;
    use crate::services::mock_exchange::{MockExchange, PageCall, LAST_OPEN};
    use std::sync::{Arc, Mutex};

    const HOUR: i64 = 3_600_000;

    fn latest(total: usize) -> FetchRequest {
        FetchRequest::latest("BTCUSDT", Timeframe::Hour1, total)
    }

    fn assert_contiguous(candles: &[Candle]) {
        for w in candles.windows(2) {
            assert_eq!(w[1].timestamp - w[0].timestamp, HOUR);
        }
    }

    #[tokio::test]
    async fn test_small_request_is_one_latest_page() {
        let exchange = MockExchange::hourly(1000, 5000);
        let result = OhlcvPaginator::new(&exchange).fetch(&latest(50)).await.unwrap();

        assert_eq!(exchange.calls(), vec![PageCall { limit: 50, since: None }]);
        assert_eq!(result.candles.len(), 50);
        assert_eq!(result.completion, FetchCompletion::Complete);
        assert_eq!(result.pages_fetched, 1);
        assert_contiguous(&result.candles);
    }

    #[tokio::test]
    async fn test_large_request_splits_into_pages() {
        let exchange = MockExchange::hourly(1000, 5000);
        let result = OhlcvPaginator::new(&exchange).fetch(&latest(2500)).await.unwrap();

        let limits: Vec<usize> = exchange.calls().iter().map(|c| c.limit).collect();
        assert_eq!(limits, vec![1000, 1000, 500]);
        assert_eq!(result.candles.len(), 2500);
        assert_eq!(result.completion, FetchCompletion::Complete);
        assert_contiguous(&result.candles);
    }

    #[tokio::test]
    async fn test_later_pages_anchor_on_oldest_candle() {
        let exchange = MockExchange::hourly(1000, 5000);
        OhlcvPaginator::new(&exchange).fetch(&latest(2500)).await.unwrap();

        let calls = exchange.calls();
        let oldest_first_page = LAST_OPEN - 999 * HOUR;
        assert_eq!(calls[0].since, None);
        assert_eq!(calls[1].since, Some(oldest_first_page - 1000 * HOUR));
        assert_eq!(calls[2].since, Some(oldest_first_page - 1500 * HOUR));
    }

    #[tokio::test]
    async fn test_latest_mode_ends_at_newest_candle() {
        let exchange = MockExchange::hourly(100, 1000);
        let result = OhlcvPaginator::new(&exchange).fetch(&latest(250)).await.unwrap();

        assert_eq!(result.candles.last().unwrap().timestamp, LAST_OPEN);
        assert_eq!(result.candles.first().unwrap().timestamp, LAST_OPEN - 249 * HOUR);
    }

    #[tokio::test]
    async fn test_until_single_page_window() {
        let until = 1_700_000_000_000;
        let exchange = MockExchange::hourly(1000, 5000);
        let request = FetchRequest::until("BTCUSDT", Timeframe::Hour1, 100, until);
        let result = OhlcvPaginator::new(&exchange).fetch(&request).await.unwrap();

        assert_eq!(
            exchange.calls(),
            vec![PageCall { limit: 100, since: Some(until - 100 * HOUR) }]
        );
        assert!(result.candles.len() <= 100);
        assert!(result.candles.iter().all(|c| c.timestamp <= until));
    }

    #[tokio::test]
    async fn test_until_multi_page_respects_boundary() {
        let until = LAST_OPEN - 10 * HOUR;
        let exchange = MockExchange::hourly(100, 1000);
        let request = FetchRequest::until("BTCUSDT", Timeframe::Hour1, 250, until);
        let result = OhlcvPaginator::new(&exchange).fetch(&request).await.unwrap();

        let calls = exchange.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].since, Some(until - 100 * HOUR));
        assert_eq!(result.candles.len(), 250);
        assert!(result.candles.iter().all(|c| c.timestamp <= until));
        assert_contiguous(&result.candles);
    }

    #[tokio::test]
    async fn test_until_past_newest_candle_keeps_paging() {
        let until = LAST_OPEN + 50 * HOUR;
        let exchange = MockExchange::hourly(100, 1000);
        let request = FetchRequest::until("BTCUSDT", Timeframe::Hour1, 250, until);
        let result = OhlcvPaginator::new(&exchange).fetch(&request).await.unwrap();

        assert_eq!(exchange.calls().len(), 3);
        assert_eq!(result.completion, FetchCompletion::Complete);
        assert_eq!(result.candles.len(), 250);
        assert_eq!(result.candles.last().unwrap().timestamp, LAST_OPEN);
    }

    #[tokio::test]
    async fn test_until_before_listing_reaches_boundary() {
        let exchange = MockExchange::hourly(1000, 500);
        let until = exchange.first_open() - 5 * HOUR;
        let request = FetchRequest::until("BTCUSDT", Timeframe::Hour1, 100, until);
        let result = OhlcvPaginator::new(&exchange).fetch(&request).await.unwrap();

        assert!(result.candles.is_empty());
        assert_eq!(result.completion, FetchCompletion::UntilBoundaryReached);
        assert!(result.is_partial());
    }

    #[tokio::test]
    async fn test_history_exhausted_returns_partial_result() {
        let exchange = MockExchange::hourly(1000, 1500);
        let result = OhlcvPaginator::new(&exchange).fetch(&latest(2500)).await.unwrap();

        assert_eq!(result.candles.len(), 1500);
        assert_eq!(result.completion, FetchCompletion::HistoryExhausted);
        assert_eq!(result.candles.first().unwrap().timestamp, exchange.first_open());
        assert_contiguous(&result.candles);
    }

    #[tokio::test]
    async fn test_empty_history() {
        let exchange = MockExchange::hourly(1000, 0);
        let result = OhlcvPaginator::new(&exchange).fetch(&latest(10)).await.unwrap();

        assert!(result.candles.is_empty());
        assert_eq!(result.completion, FetchCompletion::HistoryExhausted);
        assert_eq!(exchange.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_short_single_page() {
        let exchange = MockExchange::hourly(1000, 30);
        let result = OhlcvPaginator::new(&exchange).fetch(&latest(50)).await.unwrap();

        assert_eq!(result.candles.len(), 30);
        assert_eq!(result.completion, FetchCompletion::HistoryExhausted);
        assert_eq!(exchange.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_overlapping_pages_are_deduplicated() {
        let exchange = MockExchange::hourly(100, 1000).with_overshoot(5);
        let result = OhlcvPaginator::new(&exchange).fetch(&latest(250)).await.unwrap();

        assert_eq!(exchange.calls().len(), 3);
        assert_eq!(result.candles.len(), 250);
        assert!(result.candles.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_contiguous(&result.candles);
    }

    #[tokio::test]
    async fn test_failed_page_retries_at_reduced_size() {
        let exchange = MockExchange::hourly(1000, 5000).with_failures(&[true]);
        let result = OhlcvPaginator::new(&exchange).fetch(&latest(2000)).await.unwrap();

        let calls = exchange.calls();
        assert_eq!(calls[0], PageCall { limit: 1000, since: None });
        assert_eq!(calls[1], PageCall { limit: 50, since: None });
        assert_eq!(calls[2].limit, 1000);
        assert_eq!(calls[2].since, Some(LAST_OPEN - 49 * HOUR - 1000 * HOUR));
        assert_eq!(result.retries_used, 1);
        assert_eq!(result.candles.len(), 2000);
        assert_contiguous(&result.candles);
    }

    #[tokio::test]
    async fn test_failed_retry_is_fatal() {
        let exchange = MockExchange::hourly(1000, 5000).with_failures(&[true, true]);
        let err = OhlcvPaginator::new(&exchange).fetch(&latest(2000)).await.unwrap_err();

        assert!(matches!(err, AppError::Network(_)));
        assert_eq!(exchange.calls().len(), 2);
        assert_eq!(exchange.calls()[1].limit, 50);
    }

    #[tokio::test]
    async fn test_small_page_failure_is_not_retried() {
        let exchange = MockExchange::hourly(1000, 5000).failing();
        let err = OhlcvPaginator::new(&exchange).fetch(&latest(40)).await.unwrap_err();

        assert!(matches!(err, AppError::Network(_)));
        assert_eq!(exchange.calls(), vec![PageCall { limit: 40, since: None }]);
    }

    #[tokio::test]
    async fn test_retry_budget_is_enforced() {
        let exchange = MockExchange::hourly(1000, 5000).with_failures(&[true, false, true]);
        let err = OhlcvPaginator::new(&exchange)
            .with_max_retries(1)
            .fetch(&latest(2000))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Network(_)));
        assert_eq!(exchange.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_huge_limit_returns_available_history() {
        let exchange = MockExchange::hourly(1000, 1500);
        let result = OhlcvPaginator::new(&exchange).fetch(&latest(usize::MAX)).await.unwrap();

        assert_eq!(result.candles.len(), 1500);
        assert_eq!(result.completion, FetchCompletion::HistoryExhausted);
        assert_contiguous(&result.candles);
    }

    #[tokio::test]
    async fn test_until_far_past_newest_candle_reanchors() {
        let until = LAST_OPEN + 168 * HOUR;
        let exchange = MockExchange::hourly(1000, 5000);
        let request = FetchRequest::until("BTCUSDT", Timeframe::Hour1, 100, until);
        let result = OhlcvPaginator::new(&exchange).fetch(&request).await.unwrap();

        assert_eq!(
            exchange.calls(),
            vec![
                PageCall { limit: 100, since: Some(until - 100 * HOUR) },
                PageCall { limit: 100, since: None },
            ]
        );
        assert_eq!(result.completion, FetchCompletion::Complete);
        assert_eq!(result.candles.len(), 100);
        assert_eq!(result.candles.last().unwrap().timestamp, LAST_OPEN);
        assert_contiguous(&result.candles);
    }

    #[tokio::test]
    async fn test_until_far_past_newest_candle_multi_page() {
        let until = LAST_OPEN + 1000 * HOUR;
        let exchange = MockExchange::hourly(100, 1000);
        let request = FetchRequest::until("BTCUSDT", Timeframe::Hour1, 250, until);
        let result = OhlcvPaginator::new(&exchange).fetch(&request).await.unwrap();

        let calls = exchange.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[1], PageCall { limit: 100, since: None });
        assert_eq!(result.completion, FetchCompletion::Complete);
        assert_eq!(result.candles.len(), 250);
        assert_eq!(result.candles.last().unwrap().timestamp, LAST_OPEN);
        assert_contiguous(&result.candles);
    }

    #[tokio::test]
    async fn test_single_page_retry_continues_for_remainder() {
        let exchange = MockExchange::hourly(1000, 5000).with_failures(&[true]);
        let result = OhlcvPaginator::new(&exchange).fetch(&latest(100)).await.unwrap();

        assert_eq!(
            exchange.calls(),
            vec![
                PageCall { limit: 100, since: None },
                PageCall { limit: 50, since: None },
                PageCall { limit: 50, since: Some(LAST_OPEN - 49 * HOUR - 50 * HOUR) },
            ]
        );
        assert_eq!(result.completion, FetchCompletion::Complete);
        assert_eq!(result.retries_used, 1);
        assert_eq!(result.candles.len(), 100);
        assert_eq!(result.candles.last().unwrap().timestamp, LAST_OPEN);
        assert_contiguous(&result.candles);
    }

    #[tokio::test]
    async fn test_zero_limit_rejected() {
        let exchange = MockExchange::hourly(1000, 100);
        let err = OhlcvPaginator::new(&exchange).fetch(&latest(0)).await.unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(exchange.calls().is_empty());
    }

    #[tokio::test]
    async fn test_progress_reported_per_page() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress: ProgressCallback = Box::new(move |done, total| {
            sink.lock().unwrap().push((done, total));
        });

        let exchange = MockExchange::hourly(1000, 5000);
        OhlcvPaginator::new(&exchange)
            .with_progress(Some(&progress))
            .fetch(&latest(2500))
            .await
            .unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![(1000, 2500), (2000, 2500), (2500, 2500)]
        );
    }

    #[test]
    fn test_finish_keeps_newest_candles() {
        let raw: Vec<RawCandle> = [3, 1, 2, 2, 4]
            .iter()
            .map(|&i| RawCandle::new(i * HOUR, 1.0, 1.0, 1.0, 1.0, 1.0))
            .collect();
        let candles = finish(raw, 3, HOUR);

        let stamps: Vec<i64> = candles.iter().map(|c| c.timestamp).collect();
        assert_eq!(stamps, vec![2 * HOUR, 3 * HOUR, 4 * HOUR]);
        assert_eq!(candles[0].datetime, "1970-01-01T02:00:00.000Z");
    }
}
