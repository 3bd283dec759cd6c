//! Conversation watcher.
//!
//! Two states, `Idle` and `Viewing`. The host gives no change notifications,
//! so the driver calls [`ChatWatcher::tick`] on a timer; a push-capable host
//! can call [`ChatWatcher::check_location`] directly instead. Every URL change
//! emits a provisional view at once and schedules follow-up re-detections,
//! because the host renders titles asynchronously. Emissions are
//! latest-wins: a later view for the same URL supersedes earlier ones.

use chatfold_core::{ConversationView, ViewSource};
use chatfold_page::{HostPage, TitleResolver, TitleSource};
use chatfold_store::NavigationContext;
use serde::{Deserialize, Serialize};

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
pub const DEFAULT_REDETECT_DELAYS_MS: [u64; 2] = [500, 1200];

/// Receiver of emitted views.
pub trait ViewSink {
    fn emit(&mut self, view: ConversationView);
}

impl<F: FnMut(ConversationView)> ViewSink for F {
    fn emit(&mut self, view: ConversationView) {
        self(view)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WatcherConfig {
    pub poll_interval_ms: u64,
    /// Delays after a URL change at which the full chain runs again.
    pub redetect_delays_ms: Vec<u64>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            redetect_delays_ms: DEFAULT_REDETECT_DELAYS_MS.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Viewing,
}

pub struct ChatWatcher {
    resolver: TitleResolver,
    config: WatcherConfig,
    state: WatchState,
    last_url: Option<String>,
    next_poll_ms: u64,
    /// Due times of scheduled re-detections, ascending.
    pending: Vec<u64>,
}

impl ChatWatcher {
    pub fn new(resolver: TitleResolver, config: WatcherConfig) -> Self {
        Self {
            resolver,
            config,
            state: WatchState::Idle,
            last_url: None,
            next_poll_ms: 0,
            pending: Vec::new(),
        }
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    pub fn last_url(&self) -> Option<&str> {
        self.last_url.as_deref()
    }

    pub fn resolver(&self) -> &TitleResolver {
        &self.resolver
    }

    /// Earliest time the watcher has work to do.
    pub fn next_wakeup(&self) -> u64 {
        self.pending
            .first()
            .map_or(self.next_poll_ms, |&due| due.min(self.next_poll_ms))
    }

    /// Timer entry point: poll the location when the interval has elapsed,
    /// then run any re-detections that are due.
    pub fn tick(
        &mut self,
        now_ms: u64,
        page: &dyn HostPage,
        ctx: &mut NavigationContext,
        sink: &mut dyn ViewSink,
    ) {
        if now_ms >= self.next_poll_ms {
            self.next_poll_ms = now_ms + self.config.poll_interval_ms;
            self.check_location(now_ms, page, ctx, sink);
        }
        self.run_due(now_ms, page, ctx, sink);
    }

    /// Compare the live URL with the last one seen. Returns true on change.
    pub fn check_location(
        &mut self,
        now_ms: u64,
        page: &dyn HostPage,
        ctx: &mut NavigationContext,
        sink: &mut dyn ViewSink,
    ) -> bool {
        let url = page.location();
        if self.last_url.as_deref() == Some(url.as_str()) {
            return false;
        }
        ctx.invalidate_for(&url);
        self.last_url = Some(url.clone());

        let view = if !self.resolver.codec().is_conversation_url(&url) {
            self.state = WatchState::Idle;
            self.idle_view(url)
        } else {
            self.state = WatchState::Viewing;
            match ctx
                .override_for(&url)
                .filter(|rec| !rec.title.trim().is_empty())
            {
                Some(rec) => ConversationView {
                    url,
                    title: chatfold_core::text::truncate_title(&rec.title),
                    is_valid_conversation: true,
                    source: ViewSource::Context,
                    context: Some(rec.clone()),
                },
                None => ConversationView {
                    url,
                    title: self.resolver.profile().loading_title.clone(),
                    is_valid_conversation: false,
                    source: ViewSource::Fallback,
                    context: None,
                },
            }
        };
        tracing::info!(url = %view.url, state = ?self.state, "location changed");
        sink.emit(view);

        for delay in &self.config.redetect_delays_ms {
            self.pending.push(now_ms + delay);
        }
        self.pending.sort_unstable();
        true
    }

    /// Run every re-detection due at `now_ms`. Returns how many ran.
    pub fn run_due(
        &mut self,
        now_ms: u64,
        page: &dyn HostPage,
        ctx: &mut NavigationContext,
        sink: &mut dyn ViewSink,
    ) -> usize {
        let due = self.pending.iter().take_while(|&&t| t <= now_ms).count();
        for _ in 0..due {
            sink.emit(self.detect(page, ctx));
        }
        self.pending.drain(..due);
        due
    }

    /// Re-run the resolution chain now, e.g. when the user reopens the chat
    /// already on screen.
    pub fn force_detect(
        &mut self,
        page: &dyn HostPage,
        ctx: &NavigationContext,
        sink: &mut dyn ViewSink,
    ) {
        sink.emit(self.detect(page, ctx));
    }

    /// One full detection pass for the page's current location.
    pub fn detect(&self, page: &dyn HostPage, ctx: &NavigationContext) -> ConversationView {
        let url = page.location();
        if !self.resolver.codec().is_conversation_url(&url) {
            return self.idle_view(url);
        }
        let resolved = self.resolver.resolve(page, ctx.get());
        let context = match resolved.source {
            TitleSource::Context => ctx.get().cloned(),
            _ => None,
        };
        ConversationView {
            url,
            title: resolved.title,
            is_valid_conversation: true,
            source: resolved.source.view_source(),
            context,
        }
    }

    fn idle_view(&self, url: String) -> ConversationView {
        ConversationView {
            url,
            title: self.resolver.profile().idle_title.clone(),
            is_valid_conversation: false,
            source: ViewSource::Fallback,
            context: None,
        }
    }
}
