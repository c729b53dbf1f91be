//! Staleness-bounded cache for the bridge market price.
//!
//! At most one fetch against the external source is outstanding at any time.
//! Callers arriving while a fetch is in flight await that same fetch and
//! receive its outcome, success or failure.

use super::clock::{Clock, SystemClock};
use super::error::ExchangeError;
use super::market::{MarketPair, MarketPriceSnapshot, MarketPriceSource};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub const DEFAULT_STALE_AFTER: Duration = Duration::from_millis(30_000);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(8);

type SharedFetch = Shared<BoxFuture<'static, Result<MarketPriceSnapshot, String>>>;

struct InFlight {
    id: u64,
    generation: u64,
    fetch: SharedFetch,
}

#[derive(Default)]
struct CacheState {
    snapshot: Option<MarketPriceSnapshot>,
    in_flight: Option<InFlight>,
    // Bumped on every invalidation; fetches started under an older
    // generation are not stored.
    generation: u64,
    next_fetch_id: u64,
}

pub struct MarketPriceCache {
    source: Arc<dyn MarketPriceSource>,
    clock: Arc<dyn Clock>,
    pair: MarketPair,
    stale_after: Duration,
    fetch_timeout: Duration,
    state: Mutex<CacheState>,
}

impl MarketPriceCache {
    pub fn new(source: Arc<dyn MarketPriceSource>, pair: MarketPair) -> Self {
        Self::with_clock(source, pair, Arc::new(SystemClock))
    }

    pub fn with_clock(
        source: Arc<dyn MarketPriceSource>,
        pair: MarketPair,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            clock,
            pair,
            stale_after: DEFAULT_STALE_AFTER,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    pub fn fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    pub fn pair(&self) -> &MarketPair {
        &self.pair
    }

    /// Returns the cached price while fresh, otherwise fetches (or joins the
    /// fetch already in flight).
    pub async fn get_price(&self) -> Result<MarketPriceSnapshot, ExchangeError> {
        self.acquire(false).await
    }

    /// Fetches regardless of freshness, still coalescing with an in-flight fetch.
    pub async fn refresh(&self) -> Result<MarketPriceSnapshot, ExchangeError> {
        self.acquire(true).await
    }

    /// Drops the stored price and detaches any in-flight fetch from the cache.
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        state.snapshot = None;
        state.in_flight = None;
        state.generation += 1;
        debug!(pair = %self.pair, "Cache CLEAR");
    }

    /// Last stored snapshot, fresh or not.
    pub async fn snapshot(&self) -> Option<MarketPriceSnapshot> {
        self.state.lock().await.snapshot
    }

    async fn acquire(&self, force: bool) -> Result<MarketPriceSnapshot, ExchangeError> {
        let (id, fetch) = {
            let mut state = self.state.lock().await;
            self.settle_finished(&mut state);

            if !force {
                if let Some(snapshot) = state
                    .snapshot
                    .filter(|s| s.is_fresh(self.clock.now(), self.stale_after))
                {
                    debug!(pair = %self.pair, price = snapshot.price, "Cache HIT");
                    return Ok(snapshot);
                }
            }

            match &state.in_flight {
                Some(in_flight) => {
                    debug!(pair = %self.pair, "Joining in-flight market price fetch");
                    (in_flight.id, in_flight.fetch.clone())
                }
                None => {
                    debug!(pair = %self.pair, "Cache MISS");
                    let id = state.next_fetch_id;
                    state.next_fetch_id += 1;
                    let fetch = self.start_fetch();
                    state.in_flight = Some(InFlight {
                        id,
                        generation: state.generation,
                        fetch: fetch.clone(),
                    });
                    (id, fetch)
                }
            }
        };

        let outcome = fetch.await;

        let mut state = self.state.lock().await;
        if state.in_flight.as_ref().is_some_and(|f| f.id == id) {
            if let Some(in_flight) = state.in_flight.take() {
                self.store(&mut state, &in_flight, &outcome);
            }
        }

        outcome.map_err(ExchangeError::MarketUnavailable)
    }

    /// Records a completed fetch whose caller went away before storing it, so
    /// it is judged by the normal freshness rule instead of being re-joined.
    fn settle_finished(&self, state: &mut CacheState) {
        let finished = state
            .in_flight
            .as_ref()
            .and_then(|in_flight| in_flight.fetch.peek().cloned());
        if let Some(outcome) = finished {
            if let Some(in_flight) = state.in_flight.take() {
                debug!(pair = %self.pair, "Settling abandoned market price fetch");
                self.store(state, &in_flight, &outcome);
            }
        }
    }

    fn store(
        &self,
        state: &mut CacheState,
        in_flight: &InFlight,
        outcome: &Result<MarketPriceSnapshot, String>,
    ) {
        if let Ok(snapshot) = outcome {
            if in_flight.generation == state.generation {
                debug!(pair = %self.pair, price = snapshot.price, "Cache PUT");
                state.snapshot = Some(*snapshot);
            }
        }
    }

    fn start_fetch(&self) -> SharedFetch {
        let source = Arc::clone(&self.source);
        let clock = Arc::clone(&self.clock);
        let pair = self.pair.clone();
        let timeout = self.fetch_timeout;

        async move {
            let fetched =
                tokio::time::timeout(timeout, source.fetch_best_offer(&pair.asset, &pair.fiat))
                    .await;
            let price = match fetched {
                Ok(Ok(price)) => price,
                Ok(Err(e)) => {
                    warn!(pair = %pair, error = %e, "Market price fetch failed");
                    return Err(e.to_string());
                }
                Err(_) => {
                    warn!(pair = %pair, ?timeout, "Market price fetch timed out");
                    return Err(format!("request timed out after {timeout:?}"));
                }
            };

            if !(price.is_finite() && price > 0.0) {
                warn!(pair = %pair, price, "Market price source returned unusable price");
                return Err(format!("unusable price {price} for {pair}"));
            }

            Ok(MarketPriceSnapshot {
                price,
                fetched_at: clock.now(),
            })
        }
        .boxed()
        .shared()
    }
}
