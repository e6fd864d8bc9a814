//! Driving a shared session's timers from a background thread.
//!
//! Interactive surfaces block on terminal prompts, so the autosave deadline
//! cannot wait for the next keypress. A [`Ticker`] pumps the session at a fixed
//! period until it is dropped.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use super::{Dispatch, Session};
use crate::cache::LocalCache;

pub const DEFAULT_TICK: Duration = Duration::from_millis(250);

pub type SharedSession<D, C> = Arc<Mutex<Session<D, C>>>;

/// Lock a shared session, recovering it if a holder panicked.
pub fn lock<D, C>(session: &Mutex<Session<D, C>>) -> MutexGuard<'_, Session<D, C>> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Ticker {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn spawn<D, C>(session: SharedSession<D, C>, period: Duration) -> Self
    where
        D: Dispatch + Send + 'static,
        C: LocalCache + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = std::thread::Builder::new()
            .name("limeflow-autosave".to_string())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(period) {
                        Err(RecvTimeoutError::Timeout) => lock(&*session).pump(Instant::now()),
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .ok();
        if handle.is_none() {
            tracing::error!("could not start the autosave thread; saves wait for the next action");
        }
        Self {
            stop: Some(stop_tx),
            handle,
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::deck::{Slide, SlideEdit};
    use crate::link::LaunchParams;
    use crate::session::{Inline, SessionOptions, SyncState};
    use crate::store::{RemoteStore, StoreError};

    #[derive(Clone, Default)]
    struct Counting {
        saves: Arc<Mutex<Vec<Vec<Slide>>>>,
    }

    impl RemoteStore for Counting {
        fn load(&self, _endpoint: &str) -> Result<Vec<Slide>, StoreError> {
            Ok(Vec::new())
        }

        fn save(&self, _endpoint: &str, slides: &[Slide]) -> Result<(), StoreError> {
            self.saves.lock().unwrap().push(slides.to_vec());
            Ok(())
        }
    }

    #[test]
    fn test_ticker_saves_while_caller_is_idle() {
        let store = Counting::default();
        let saves = store.saves.clone();
        let params = LaunchParams {
            sheet: Some("https://x".into()),
            ..LaunchParams::default()
        };
        let mut session = Session::bootstrap(
            &params,
            MemoryCache::new(),
            Inline::new(store),
            SessionOptions {
                debounce: Duration::from_millis(20),
            },
        );
        session.pump(Instant::now());
        session
            .edit_slide(SlideEdit::Title("idle".into()))
            .unwrap();

        let shared = Arc::new(Mutex::new(session));
        let ticker = Ticker::spawn(shared.clone(), Duration::from_millis(5));

        let give_up = Instant::now() + Duration::from_secs(5);
        while saves.lock().unwrap().is_empty() && Instant::now() < give_up {
            std::thread::sleep(Duration::from_millis(10));
        }
        drop(ticker);

        let saves = saves.lock().unwrap();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0][0].title, "idle");
        assert_eq!(lock(&*shared).status().state, SyncState::Synced);
    }
}
