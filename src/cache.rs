//! Time-bounded value cache with single-flight refresh
//!
//! A [`CachedValue`] holds the last successfully loaded value and the instant
//! it expires. Callers that find the value missing or expired share one
//! in-flight load: the first caller starts it, later callers await the same
//! future and all of them observe the same outcome.
//!
//! A failed load leaves the previous value in place. It is no longer served by
//! [`CachedValue::get`] once expired, but stays readable through
//! [`CachedValue::last_known`] until a later load succeeds.

use crate::{Result, SwirlError};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

type LoadOutcome<T> = std::result::Result<Arc<T>, Arc<SwirlError>>;
type SharedLoad<T> = Shared<BoxFuture<'static, LoadOutcome<T>>>;
type Loader<T> = Box<dyn Fn() -> BoxFuture<'static, Result<T>> + Send + Sync>;

struct Entry<T> {
    value: Arc<T>,
    expires_at: Instant,
}

struct InFlight<T> {
    generation: u64,
    load: SharedLoad<T>,
}

struct State<T> {
    current: Option<Entry<T>>,
    in_flight: Option<InFlight<T>>,
    generation: u64,
}

pub struct CachedValue<T> {
    ttl: Duration,
    loader: Loader<T>,
    state: Mutex<State<T>>,
}

impl<T> CachedValue<T>
where
    T: Send + Sync + 'static,
{
    pub fn new<F>(ttl: Duration, loader: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<T>> + Send + Sync + 'static,
    {
        Self {
            ttl,
            loader: Box::new(loader),
            state: Mutex::new(State {
                current: None,
                in_flight: None,
                generation: 0,
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached value, loading it first if missing or expired
    pub async fn get(&self) -> Result<Arc<T>> {
        let (generation, load) = {
            let mut state = self.lock();

            if let Some(entry) = &state.current {
                if Instant::now() < entry.expires_at {
                    return Ok(entry.value.clone());
                }
            }

            match &state.in_flight {
                Some(in_flight) => (in_flight.generation, in_flight.load.clone()),
                None => {
                    state.generation += 1;
                    let generation = state.generation;
                    let load = (self.loader)()
                        .map(|r| r.map(Arc::new).map_err(Arc::new))
                        .boxed()
                        .shared();
                    state.in_flight = Some(InFlight {
                        generation,
                        load: load.clone(),
                    });
                    (generation, load)
                }
            }
        };

        let outcome = load.await;

        // Whichever waiter gets here first publishes the outcome.
        let mut state = self.lock();
        if matches!(&state.in_flight, Some(f) if f.generation == generation) {
            state.in_flight = None;
            if let Ok(value) = &outcome {
                state.current = Some(Entry {
                    value: value.clone(),
                    expires_at: Instant::now() + self.ttl,
                });
            }
        }

        outcome.map_err(SwirlError::Shared)
    }

    /// Last successfully loaded value, even if expired
    pub fn last_known(&self) -> Option<Arc<T>> {
        self.lock().current.as_ref().map(|e| e.value.clone())
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct Counter {
        loads: AtomicUsize,
        fail: AtomicBool,
    }

    fn counting_cache(ttl: Duration) -> (Arc<Counter>, CachedValue<usize>) {
        let counter = Arc::new(Counter {
            loads: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        });
        let c = counter.clone();
        let cache = CachedValue::new(ttl, move || {
            let c = c.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let n = c.loads.fetch_add(1, Ordering::SeqCst) + 1;
                if c.fail.load(Ordering::SeqCst) {
                    Err(SwirlError::Backend("manager unavailable".to_string()))
                } else {
                    Ok(n)
                }
            }
            .boxed()
        });
        (counter, cache)
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_load() {
        let (counter, cache) = counting_cache(Duration::from_secs(60));

        let results = futures::future::join_all((0..16).map(|_| cache.get())).await;

        assert_eq!(counter.loads.load(Ordering::SeqCst), 1);
        for r in results {
            assert_eq!(*r.unwrap(), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_after_expiry() {
        let (counter, cache) = counting_cache(Duration::from_secs(60));

        assert_eq!(*cache.get().await.unwrap(), 1);
        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(*cache.get().await.unwrap(), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        let results = futures::future::join_all((0..4).map(|_| cache.get())).await;
        for r in results {
            assert_eq!(*r.unwrap(), 2);
        }
        assert_eq!(counter.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_shared_and_previous_value_retained() {
        let (counter, cache) = counting_cache(Duration::from_secs(60));
        assert_eq!(*cache.get().await.unwrap(), 1);

        tokio::time::advance(Duration::from_secs(61)).await;
        counter.fail.store(true, Ordering::SeqCst);

        let results = futures::future::join_all((0..3).map(|_| cache.get())).await;
        assert_eq!(counter.loads.load(Ordering::SeqCst), 2);
        for r in results {
            let err = r.unwrap_err();
            assert!(err.to_string().contains("manager unavailable"));
        }
        assert_eq!(cache.last_known().map(|v| *v), Some(1));

        counter.fail.store(false, Ordering::SeqCst);
        assert_eq!(*cache.get().await.unwrap(), 3);
        assert_eq!(cache.last_known().map(|v| *v), Some(3));
    }

    #[tokio::test]
    async fn test_empty_cache_has_no_last_known() {
        let (_, cache) = counting_cache(Duration::from_secs(60));
        assert!(cache.last_known().is_none());
        assert_eq!(cache.ttl(), Duration::from_secs(60));
    }
}
