//! Running remote store calls off the session's event loop.
//!
//! The session never calls the store directly. It hands a [`SyncJob`] to a
//! [`Dispatch`] and later receives a [`SyncOutcome`] carrying the same
//! [`Ticket`], which it checks against its current generation.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::deck::Slide;
use crate::store::{RemoteStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    Bootstrap,
    Connect,
    Autosave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub generation: u64,
    pub purpose: Purpose,
}

#[derive(Debug, Clone)]
pub enum SyncJob {
    Load {
        ticket: Ticket,
        endpoint: String,
    },
    Save {
        ticket: Ticket,
        endpoint: String,
        slides: Vec<Slide>,
    },
}

impl SyncJob {
    pub fn ticket(&self) -> Ticket {
        match self {
            Self::Load { ticket, .. } | Self::Save { ticket, .. } => *ticket,
        }
    }

    pub fn endpoint(&self) -> &str {
        match self {
            Self::Load { endpoint, .. } | Self::Save { endpoint, .. } => endpoint,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completed {
    Loaded(Vec<Slide>),
    Saved,
}

#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub ticket: Ticket,
    pub endpoint: String,
    pub result: Result<Completed, StoreError>,
}

/// Execute one job against a store.
pub fn run_job<S: RemoteStore + ?Sized>(store: &S, job: SyncJob) -> SyncOutcome {
    match job {
        SyncJob::Load { ticket, endpoint } => SyncOutcome {
            ticket,
            result: store.load(&endpoint).map(Completed::Loaded),
            endpoint,
        },
        SyncJob::Save {
            ticket,
            endpoint,
            slides,
        } => SyncOutcome {
            ticket,
            result: store.save(&endpoint, &slides).map(|()| Completed::Saved),
            endpoint,
        },
    }
}

pub trait Dispatch {
    fn dispatch(&mut self, job: SyncJob);

    /// A finished outcome, if one is ready.
    fn poll(&mut self) -> Option<SyncOutcome>;

    /// Block up to `timeout` for the next outcome.
    fn wait(&mut self, _timeout: Duration) -> Option<SyncOutcome> {
        self.poll()
    }
}

/// Runs jobs on a single background thread, in submission order.
pub struct Worker {
    jobs: Option<Sender<SyncJob>>,
    outcomes: Receiver<SyncOutcome>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    pub fn spawn<S: RemoteStore + Send + 'static>(store: S) -> Self {
        let (job_tx, job_rx) = mpsc::channel::<SyncJob>();
        let (outcome_tx, outcome_rx) = mpsc::channel();
        let handle = std::thread::Builder::new()
            .name("limeflow-sync".to_string())
            .spawn(move || {
                for job in job_rx {
                    let outcome = run_job(&store, job);
                    if outcome_tx.send(outcome).is_err() {
                        break;
                    }
                }
            })
            .ok();
        if handle.is_none() {
            tracing::error!("could not start the sync thread; remote sync is disabled");
        }
        Self {
            jobs: Some(job_tx),
            outcomes: outcome_rx,
            handle,
        }
    }
}

impl Dispatch for Worker {
    fn dispatch(&mut self, job: SyncJob) {
        let Some(jobs) = &self.jobs else { return };
        if let Err(e) = jobs.send(job) {
            tracing::error!(endpoint = e.0.endpoint(), "sync thread is gone, dropping job");
        }
    }

    fn poll(&mut self) -> Option<SyncOutcome> {
        self.outcomes.try_recv().ok()
    }

    fn wait(&mut self, timeout: Duration) -> Option<SyncOutcome> {
        match self.outcomes.recv_timeout(timeout) {
            Ok(outcome) => Some(outcome),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        // Closing the channel ends the thread once queued jobs are done.
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Runs each job synchronously as it is dispatched.
pub struct Inline<S> {
    store: S,
    ready: VecDeque<SyncOutcome>,
}

impl<S: RemoteStore> Inline<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            ready: VecDeque::new(),
        }
    }
}

impl<S: RemoteStore> Dispatch for Inline<S> {
    fn dispatch(&mut self, job: SyncJob) {
        let outcome = run_job(&self.store, job);
        self.ready.push_back(outcome);
    }

    fn poll(&mut self) -> Option<SyncOutcome> {
        self.ready.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::default_deck;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recording {
        saves: Arc<Mutex<Vec<String>>>,
    }

    impl RemoteStore for Recording {
        fn load(&self, endpoint: &str) -> Result<Vec<Slide>, StoreError> {
            if endpoint == "bad" {
                return Err(StoreError::Http(500));
            }
            Ok(default_deck().slides().to_vec())
        }

        fn save(&self, endpoint: &str, _slides: &[Slide]) -> Result<(), StoreError> {
            self.saves.lock().unwrap().push(endpoint.to_string());
            Ok(())
        }
    }

    fn ticket(generation: u64) -> Ticket {
        Ticket {
            generation,
            purpose: Purpose::Autosave,
        }
    }

    #[test]
    fn test_worker_runs_jobs_in_order() {
        let store = Recording::default();
        let saves = store.saves.clone();
        let mut worker = Worker::spawn(store);
        for generation in 1..=3 {
            worker.dispatch(SyncJob::Save {
                ticket: ticket(generation),
                endpoint: format!("e{generation}"),
                slides: Vec::new(),
            });
        }

        let mut seen = Vec::new();
        while seen.len() < 3 {
            let outcome = worker
                .wait(Duration::from_secs(5))
                .expect("worker outcome");
            assert_eq!(outcome.result, Ok(Completed::Saved));
            seen.push(outcome.ticket.generation);
        }
        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(*saves.lock().unwrap(), vec!["e1", "e2", "e3"]);
    }

    #[test]
    fn test_inline_reports_errors() {
        let mut inline = Inline::new(Recording::default());
        inline.dispatch(SyncJob::Load {
            ticket: ticket(7),
            endpoint: "bad".into(),
        });
        let outcome = inline.poll().unwrap();
        assert_eq!(outcome.ticket.generation, 7);
        assert_eq!(outcome.endpoint, "bad");
        assert_eq!(outcome.result, Err(StoreError::Http(500)));
        assert!(inline.poll().is_none());
    }

    #[test]
    fn test_inline_wait_returns_ready_outcome_without_blocking() {
        let mut inline = Inline::new(Recording::default());
        assert!(inline.wait(Duration::from_secs(60)).is_none());
        inline.dispatch(SyncJob::Load {
            ticket: ticket(1),
            endpoint: "ok".into(),
        });
        let outcome = inline.wait(Duration::ZERO).unwrap();
        assert!(matches!(outcome.result, Ok(Completed::Loaded(_))));
    }
}
