//! The session controller.
//!
//! A [`Session`] owns the document, the undo history and the sync state for one
//! launch of the app. Surfaces read from it and call its mutators; they never
//! touch the document directly.
//!
//! Remote calls are asynchronous from the session's point of view: jobs go out
//! through a [`Dispatch`] and come back as outcomes via [`Session::pump`]. Every
//! job is stamped with the session generation, which moves on each committed
//! edit, connect and disconnect; an outcome whose generation is no longer
//! current is dropped, so a slow response never overwrites newer state.
//! A connect is the exception: it is only superseded by another connect or a
//! disconnect, and edits made while it runs are kept.

pub mod status;
pub mod ticker;
pub mod worker;

use std::time::{Duration, Instant};

use crate::ai::{self, AiError};
use crate::cache::{DOCUMENT_KEY, ENDPOINT_KEY, LocalCache};
use crate::deck::{Document, Slide, SlideEdit, SlideIds, SlideType, default_deck};
use crate::history::History;
use crate::link::{self, LaunchParams, LinkError, ShareLinks};
use crate::store::{StoreError, clean_endpoint};

pub use status::{FatalError, Mode, SessionConfig, SyncState, SyncStatus};
pub use ticker::{SharedSession, Ticker};
pub use worker::{Completed, Dispatch, Inline, Purpose, SyncJob, SyncOutcome, Ticket, Worker};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("this deck is open read-only")]
    ReadOnly,

    #[error("enter a store endpoint first")]
    EmptyEndpoint,

    #[error("could not generate: {0}")]
    Ai(#[from] AiError),

    #[error(transparent)]
    Link(#[from] LinkError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Quiet time after the last edit before an autosave goes out.
    pub debounce: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

pub struct Session<D, C> {
    config: SessionConfig,
    document: Document,
    selected: usize,
    history: History<Document>,
    status: SyncStatus,
    fatal: Option<FatalError>,
    generation: u64,
    /// Generation stamped on the connect that is still awaited, if any.
    pending_connect: Option<u64>,
    save_deadline: Option<Instant>,
    in_flight: usize,
    presentation_loading: bool,
    had_local_document: bool,
    ids: SlideIds,
    options: SessionOptions,
    dispatcher: D,
    cache: C,
}

impl<D: Dispatch, C: LocalCache> Session<D, C> {
    /// Start a session from launch parameters and whatever the cache holds.
    ///
    /// The endpoint comes from the decoded `data` token, else `sheet`, else the
    /// cached endpoint. When one is found a load is dispatched straight away.
    pub fn bootstrap(
        params: &LaunchParams,
        mut cache: C,
        dispatcher: D,
        options: SessionOptions,
    ) -> Self {
        let cached_endpoint = cache
            .get(ENDPOINT_KEY)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let url_endpoint = params.endpoint();
        if let Some(endpoint) = &url_endpoint {
            if let Err(e) = cache.set(ENDPOINT_KEY, endpoint) {
                tracing::warn!(error = %e, "could not remember endpoint");
            }
        }
        let endpoint = url_endpoint.or(cached_endpoint).unwrap_or_default();

        let cached_document = cache.get(DOCUMENT_KEY).and_then(|raw| {
            serde_json::from_str::<Document>(&raw)
                .inspect_err(|e| tracing::warn!(error = %e, "ignoring unreadable cached document"))
                .ok()
        });
        let had_local_document = cached_document.is_some();
        let document = cached_document.unwrap_or_else(default_deck);

        let read_only = params.present;
        let mode = if read_only {
            Mode::Present
        } else if endpoint.is_empty() {
            Mode::Welcome
        } else {
            Mode::Edit
        };

        let mut ids = SlideIds::new();
        ids.observe(&document);

        tracing::info!(
            endpoint = %endpoint,
            read_only,
            cached = had_local_document,
            "starting session"
        );

        let mut session = Self {
            config: SessionConfig {
                endpoint,
                mode,
                read_only,
            },
            history: History::new(document.clone()),
            document,
            selected: 0,
            status: SyncStatus::idle(),
            fatal: None,
            generation: 0,
            pending_connect: None,
            save_deadline: None,
            in_flight: 0,
            presentation_loading: false,
            had_local_document,
            ids,
            options,
            dispatcher,
            cache,
        };

        if session.config.has_endpoint() {
            session.status = SyncStatus::loading("Syncing…");
            session.presentation_loading = read_only;
            let endpoint = session.config.endpoint.clone();
            session.dispatch_load(Purpose::Bootstrap, endpoint);
        }
        session
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn history(&self) -> &History<Document> {
        &self.history
    }

    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    pub fn fatal(&self) -> Option<&FatalError> {
        self.fatal.as_ref()
    }

    pub fn mode(&self) -> Mode {
        self.config.mode
    }

    pub fn is_read_only(&self) -> bool {
        self.config.read_only
    }

    /// True while a read-only session waits for its first load.
    pub fn is_presentation_loading(&self) -> bool {
        self.presentation_loading
    }

    pub fn has_pending_save(&self) -> bool {
        self.save_deadline.is_some()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn current_slide(&self) -> &Slide {
        &self.document.slides()[self.selected]
    }

    // ----- navigation and modes -----

    pub fn select_slide(&mut self, index: usize) -> usize {
        self.selected = self.document.clamp_index(index);
        self.selected
    }

    pub fn next_slide(&mut self) -> bool {
        if self.selected + 1 >= self.document.len() {
            return false;
        }
        self.selected += 1;
        true
    }

    pub fn previous_slide(&mut self) -> bool {
        if self.selected == 0 {
            return false;
        }
        self.selected -= 1;
        true
    }

    /// Leave the welcome screen or the presenter for the editor.
    pub fn enter_edit(&mut self) -> Result<(), SessionError> {
        self.ensure_writable()?;
        self.config.mode = Mode::Edit;
        Ok(())
    }

    pub fn enter_present(&mut self) {
        self.config.mode = Mode::Present;
    }

    // ----- document mutations -----

    /// Insert a placeholder slide after the selected one and select it.
    pub fn add_slide(&mut self, kind: SlideType) -> Result<&Document, SessionError> {
        self.ensure_writable()?;
        let mut next = self.document.clone();
        let slide = Slide::placeholder(self.ids.next_id(), kind);
        self.selected = next.insert_after(self.selected, slide);
        self.commit(next);
        Ok(&self.document)
    }

    /// Remove the slide at `index`. The last remaining slide is never removed.
    pub fn delete_slide(&mut self, index: usize) -> Result<&Document, SessionError> {
        self.ensure_writable()?;
        let mut next = self.document.clone();
        if next.remove(index) {
            self.selected = self.selected.min(next.len() - 1);
            self.commit(next);
        }
        Ok(&self.document)
    }

    /// Swap the slide at `index` with its neighbour; the selection follows it.
    pub fn move_slide(
        &mut self,
        index: usize,
        direction: Direction,
    ) -> Result<&Document, SessionError> {
        self.ensure_writable()?;
        let target = match direction {
            Direction::Up => index.checked_sub(1),
            Direction::Down => index.checked_add(1),
        };
        let Some(target) = target else {
            return Ok(&self.document);
        };
        let mut next = self.document.clone();
        if next.swap(index, target) {
            self.selected = target;
            self.commit(next);
        }
        Ok(&self.document)
    }

    /// Replace the selected slide. Its id is kept whatever `slide` carries.
    pub fn update_slide(&mut self, mut slide: Slide) -> Result<&Document, SessionError> {
        self.ensure_writable()?;
        slide.id = self.current_slide().id.clone();
        self.replace_selected(slide);
        Ok(&self.document)
    }

    pub fn edit_slide(&mut self, edit: SlideEdit) -> Result<&Document, SessionError> {
        self.ensure_writable()?;
        if let Some(slide) = edit.apply(self.current_slide()) {
            self.replace_selected(slide);
        }
        Ok(&self.document)
    }

    /// Replace the selected slide's content with AI-generated lines.
    pub fn apply_generated_content(&mut self, text: &str) -> Result<&Document, SessionError> {
        self.ensure_writable()?;
        let items = ai::parse_content_lines(text)?;
        self.edit_slide(SlideEdit::ReplaceContent(items))
    }

    /// Restyle the selected slide from a slide-shaped JSON answer.
    pub fn apply_redesign(&mut self, json: &str) -> Result<&Document, SessionError> {
        self.ensure_writable()?;
        let patch = ai::parse_slide_patch(json)?;
        let slide = patch.apply_to(self.current_slide());
        self.replace_selected(slide);
        Ok(&self.document)
    }

    pub fn undo(&mut self) -> Result<&Document, SessionError> {
        self.ensure_writable()?;
        if let Some(snapshot) = self.history.undo().cloned() {
            self.restore(snapshot);
        }
        Ok(&self.document)
    }

    pub fn redo(&mut self) -> Result<&Document, SessionError> {
        self.ensure_writable()?;
        if let Some(snapshot) = self.history.redo().cloned() {
            self.restore(snapshot);
        }
        Ok(&self.document)
    }

    // ----- store connection -----

    /// Try `endpoint` as the new store. Nothing changes until the load succeeds.
    pub fn connect(&mut self, endpoint: &str) -> Result<(), SessionError> {
        self.ensure_writable()?;
        let endpoint = clean_endpoint(endpoint)
            .map_err(|_| SessionError::EmptyEndpoint)?
            .to_string();
        self.generation += 1;
        self.pending_connect = Some(self.generation);
        self.status = SyncStatus::loading("Connecting…");
        self.dispatch_load(Purpose::Connect, endpoint);
        Ok(())
    }

    /// Log out: forget the cached deck and endpoint and start over.
    pub fn disconnect(&mut self) -> Result<(), SessionError> {
        self.ensure_writable()?;
        if let Err(e) = self.cache.clear() {
            tracing::warn!(error = %e, "could not clear local cache");
        }
        self.generation += 1;
        self.pending_connect = None;
        self.save_deadline = None;
        self.config.endpoint.clear();
        self.config.mode = Mode::Welcome;
        self.document = default_deck();
        self.history.reset(self.document.clone());
        self.selected = 0;
        self.status = SyncStatus::idle();
        self.fatal = None;
        self.presentation_loading = false;
        self.had_local_document = false;
        tracing::info!("logged out");
        Ok(())
    }

    pub fn share_links(&self, base: &str) -> Result<ShareLinks, SessionError> {
        Ok(link::share_links(base, &self.config.endpoint)?)
    }

    // ----- event loop -----

    /// Fire the autosave if its deadline has passed.
    pub fn tick(&mut self, now: Instant) {
        if self.save_deadline.is_some_and(|deadline| now >= deadline) {
            self.fire_save();
        }
    }

    /// Send a pending autosave now instead of waiting for the debounce.
    pub fn flush(&mut self) {
        if self.save_deadline.is_some() {
            self.fire_save();
        }
    }

    /// Run timers and apply every outcome that is ready.
    pub fn pump(&mut self, now: Instant) {
        self.tick(now);
        while let Some(outcome) = self.dispatcher.poll() {
            self.complete(outcome);
        }
    }

    /// Block until in-flight jobs finish or `timeout` runs out. Returns true
    /// when nothing is left in flight.
    pub fn settle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.in_flight > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.dispatcher.wait(remaining) {
                Some(outcome) => self.complete(outcome),
                None => break,
            }
        }
        self.in_flight == 0
    }

    /// Apply one outcome, unless a newer edit or connection superseded it.
    pub fn complete(&mut self, outcome: SyncOutcome) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let SyncOutcome {
            ticket,
            endpoint,
            result,
        } = outcome;

        if ticket.purpose == Purpose::Bootstrap {
            self.presentation_loading = false;
        }
        if ticket.purpose == Purpose::Connect {
            if self.pending_connect == Some(ticket.generation) {
                self.pending_connect = None;
                self.complete_connect(ticket.generation, endpoint, result);
            } else {
                tracing::debug!(
                    generation = ticket.generation,
                    "dropping superseded connect outcome"
                );
                self.settle_status();
            }
            return;
        }
        if ticket.generation != self.generation {
            tracing::debug!(
                generation = ticket.generation,
                current = self.generation,
                purpose = ?ticket.purpose,
                "dropping stale sync outcome"
            );
            self.settle_status();
            return;
        }

        match (ticket.purpose, result) {
            (Purpose::Bootstrap, Ok(Completed::Loaded(slides))) => {
                match Document::new(slides) {
                    Some(document) => {
                        tracing::info!(slides = document.len(), "loaded deck from store");
                        self.adopt(document);
                        self.persist_document();
                        self.status = SyncStatus::synced("Synced");
                    }
                    None => self.status = SyncStatus::synced("New project"),
                }
            }
            (Purpose::Bootstrap, Err(e)) => {
                tracing::warn!(error = %e, "initial load failed");
                if self.config.read_only && !self.had_local_document {
                    self.fatal = Some(FatalError::LinkFailed(e.to_string()));
                }
                self.status = SyncStatus::error(describe(&e));
            }
            (Purpose::Autosave, Ok(_)) => {
                self.status = SyncStatus::synced("Saved to cloud");
            }
            (Purpose::Autosave, Err(e)) => {
                tracing::warn!(error = %e, "autosave failed");
                self.status = SyncStatus::error(format!("Save failed: {}", describe(&e)));
            }
            (purpose, Ok(Completed::Saved)) => {
                tracing::debug!(?purpose, "ignoring save acknowledgement for a load job");
            }
            (Purpose::Connect, _) => {}
        }
    }

    /// Apply the outcome of the awaited connect, stamped with `generation`.
    ///
    /// Without edits since the connect was issued the remote deck replaces the
    /// local one. Otherwise the endpoint is adopted, the local document is kept
    /// and an autosave is queued to push it to the new store.
    fn complete_connect(
        &mut self,
        generation: u64,
        endpoint: String,
        result: Result<Completed, StoreError>,
    ) {
        let slides = match result {
            Ok(Completed::Loaded(slides)) => slides,
            Ok(Completed::Saved) => {
                tracing::debug!("ignoring save acknowledgement for a connect");
                self.settle_status();
                return;
            }
            Err(e) => {
                tracing::warn!(endpoint = %endpoint, error = %e, "connect failed");
                self.status = SyncStatus::error(format!("Could not connect: {}", describe(&e)));
                return;
            }
        };

        tracing::info!(endpoint = %endpoint, "connected to store");
        if let Err(e) = self.cache.set(ENDPOINT_KEY, &endpoint) {
            tracing::warn!(error = %e, "could not remember endpoint");
        }
        self.config.endpoint = endpoint;
        self.config.mode = Mode::Edit;

        if generation == self.generation {
            // The remote deck wins; a queued save would overwrite it.
            self.save_deadline = None;
            let document = Document::new(slides).unwrap_or_else(|| self.document.clone());
            self.adopt(document);
            self.persist_document();
            self.status = SyncStatus::synced("Connected");
        } else {
            tracing::info!("keeping edits made while connecting");
            self.save_deadline = Some(Instant::now() + self.options.debounce);
            self.status = SyncStatus::loading("Connected, saving local edits…");
        }
    }

    /// Clear a leftover loading badge once nothing is pending.
    fn settle_status(&mut self) {
        if self.in_flight == 0
            && self.save_deadline.is_none()
            && self.status.state == SyncState::Loading
        {
            self.status = SyncStatus::idle();
        }
    }

    // ----- internals -----

    fn ensure_writable(&self) -> Result<(), SessionError> {
        if self.config.read_only {
            Err(SessionError::ReadOnly)
        } else {
            Ok(())
        }
    }

    fn replace_selected(&mut self, slide: Slide) {
        if *self.current_slide() == slide {
            return;
        }
        let mut next = self.document.clone();
        if let Some(target) = next.slide_mut(self.selected) {
            *target = slide;
        }
        self.commit(next);
    }

    fn commit(&mut self, document: Document) {
        self.document = document;
        self.selected = self.document.clamp_index(self.selected);
        self.history.record(self.document.clone());
        self.changed();
    }

    fn restore(&mut self, snapshot: Document) {
        self.document = snapshot;
        self.selected = self.document.clamp_index(self.selected);
        self.changed();
    }

    /// Bookkeeping shared by every change to the document.
    fn changed(&mut self) {
        self.generation += 1;
        self.persist_document();
        if self.config.has_endpoint() {
            self.save_deadline = Some(Instant::now() + self.options.debounce);
            self.status = SyncStatus::loading("Saving…");
        }
    }

    /// Replace the document wholesale, e.g. after a load.
    fn adopt(&mut self, document: Document) {
        self.ids.observe(&document);
        self.history.reset(document.clone());
        self.document = document;
        self.selected = self.document.clamp_index(self.selected);
    }

    fn persist_document(&mut self) {
        if self.config.read_only {
            return;
        }
        match serde_json::to_string(&self.document) {
            Ok(json) => {
                if let Err(e) = self.cache.set(DOCUMENT_KEY, &json) {
                    tracing::warn!(error = %e, "could not write local copy");
                }
            }
            Err(e) => tracing::warn!(error = %e, "could not serialize document"),
        }
    }

    fn dispatch_load(&mut self, purpose: Purpose, endpoint: String) {
        let ticket = Ticket {
            generation: self.generation,
            purpose,
        };
        self.in_flight += 1;
        self.dispatcher.dispatch(SyncJob::Load { ticket, endpoint });
    }

    fn fire_save(&mut self) {
        self.save_deadline = None;
        if self.config.read_only || !self.config.has_endpoint() {
            return;
        }
        let ticket = Ticket {
            generation: self.generation,
            purpose: Purpose::Autosave,
        };
        tracing::debug!(generation = self.generation, "autosave");
        self.in_flight += 1;
        self.dispatcher.dispatch(SyncJob::Save {
            ticket,
            endpoint: self.config.endpoint.clone(),
            slides: self.document.slides().to_vec(),
        });
    }
}

/// A status-badge message for a store failure.
fn describe(err: &StoreError) -> String {
    match err {
        StoreError::Network(_) => "Offline or unreachable".to_string(),
        other => other.to_string(),
    }
}
