use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Local, TimeZone};
use itertools::Itertools as _;
use serde::Serialize;
use tracing::instrument;

use super::auth::ImplicitFlow;
use super::cache::{LocalCache, PeriodLoad};
use super::client::{FetchError, RemoteClient};
use super::state::{Action, ViewState, ZoomLevel};
use super::streamers::TrackedStreamers;
use super::view::{DayView, MonthView, NavControls, TimeView, View, YearView};
use crate::model::{ChannelSuggestion, FollowedChannel, HelixUser, LiveStream, Login, StreamerIdentity};
use crate::time::{local_date, Clock};

pub const MIN_SUGGESTION_QUERY: usize = 2;
pub const SUGGESTION_LIMIT: usize = 5;
/// Quiet period after the last edit before suggestions are searched.
pub const SUGGESTION_DEBOUNCE: Duration = Duration::from_millis(300);
/// Upper bound of `user_login` parameters per live-status request.
pub const LIVE_STATUS_BATCH: usize = 100;

/// The presentation layer. Calls arrive in the order the user should see them.
pub trait Renderer {
    /// Start the exit animation of the current view. The host calls
    /// [Timeline::finish_transition] once it has played.
    fn animate_out(&mut self);
    fn render(&mut self, controls: &NavControls, view: &View);
    fn show_streamers(&mut self, tags: &[StreamerTag]);
    /// An empty slice hides the suggestion list.
    fn show_suggestions(&mut self, suggestions: &[ChannelSuggestion]);
    fn notify(&mut self, notice: Notice);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamerTag {
    pub login: Login,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    ChannelNotFound { input: String },
    LoginRequired { authorize_url: Option<String> },
    ProxyFailure { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyTracked,
    Empty,
    NotFound,
    Failed,
}

/// Identifies one edit of the streamer input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputTicket(u64);

/// Edit counter shared with whatever waits out [SUGGESTION_DEBOUNCE]. Only the latest
/// edit is ever current, so a burst of keystrokes leads to a single search.
#[derive(Debug, Clone, Default)]
pub struct Debounce(Arc<AtomicU64>);

impl Debounce {
    fn bump(&self) -> InputTicket {
        InputTicket(self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: InputTicket) -> bool {
        self.0.load(Ordering::SeqCst) == ticket.0
    }

    /// Sleep through the quiet period, then report whether no later edit arrived.
    pub async fn settled(&self, ticket: InputTicket) -> bool {
        tokio::time::sleep(SUGGESTION_DEBOUNCE).await;
        self.is_current(ticket)
    }
}

#[derive(Debug)]
pub struct Timeline<R, Tz = Local> {
    client: RemoteClient,
    cache: LocalCache,
    streamers: TrackedStreamers,
    state: ViewState,
    input: String,
    debounce: Debounce,
    renderer: R,
    zone: Tz,
    flow: Option<ImplicitFlow>,
    login_prompted: bool,
}

impl<R: Renderer, Tz: TimeZone> Timeline<R, Tz> {
    /// `zone` decides which calendar day a broadcast belongs to; hosts pass [Local].
    pub fn new(
        client: RemoteClient,
        renderer: R,
        clock: &dyn Clock,
        zone: Tz,
        flow: Option<ImplicitFlow>,
    ) -> Self {
        let today = local_date(clock.now(), &zone);
        Self {
            client,
            cache: LocalCache::default(),
            streamers: TrackedStreamers::default(),
            state: ViewState::new(today),
            input: String::new(),
            debounce: Debounce::default(),
            renderer,
            zone,
            flow,
            login_prompted: false,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn streamers(&self) -> &TrackedStreamers {
        &self.streamers
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn debounce(&self) -> Debounce {
        self.debounce.clone()
    }

    /// Seed the tracked set and paint the first view. Signed-in sessions track the
    /// channels the user follows; guest sessions start empty.
    #[instrument(skip(self))]
    pub async fn start(&mut self) {
        if !self.client.is_proxied() {
            if let Err(error) = self.seed_followed().await {
                self.report(error);
            }
        }

        self.show_streamers();
        self.refresh().await;
    }

    async fn seed_followed(&mut self) -> Result<(), FetchError> {
        let me: Vec<HelixUser> = self.client.fetch_all("users", false).await?;
        let Some(me) = me.into_iter().next() else {
            tracing::warn!("signed-in user lookup returned nothing");
            return Ok(());
        };

        let endpoint = format!("channels/followed?user_id={}", me.id);
        let followed: Vec<FollowedChannel> = self.client.fetch_all(&endpoint, true).await?;
        tracing::info!(user = %me.login, followed = followed.len(), "loaded followed channels");

        for identity in followed.into_iter().filter_map(StreamerIdentity::from_followed) {
            self.streamers.add(identity.login.clone());
            self.cache.remember(identity);
        }

        Ok(())
    }

    /// Accept `action` unless it is ignored by the state machine. An accepted action
    /// starts the exit animation; the new view is painted by [Self::finish_transition].
    pub fn dispatch(&mut self, action: Action) -> bool {
        let Some(next) = self.state.apply(action) else {
            tracing::trace!(?action, state = ?self.state, "ignoring navigation");
            return false;
        };

        self.state = next;
        self.renderer.animate_out();
        true
    }

    pub async fn finish_transition(&mut self) {
        if !self.state.transitioning {
            return;
        }

        self.refresh().await;
        self.state.settle();
    }

    /// [Self::dispatch] and [Self::finish_transition] back to back, for hosts without
    /// an exit animation.
    pub async fn navigate(&mut self, action: Action) -> bool {
        let accepted = self.dispatch(action);
        if accepted {
            self.finish_transition().await;
        }
        accepted
    }

    /// Load whatever the current state needs and render it. However many requests fail
    /// along the way, the user hears about the first one only.
    pub async fn refresh(&mut self) {
        let (view, failure) = self.load_view().await;
        if let Some(error) = failure {
            self.report(error);
        }

        let controls = NavControls::for_state(&self.state);
        self.renderer.render(&controls, &view);
    }

    async fn load_view(&mut self) -> (View, Option<FetchError>) {
        let anchor = self.state.anchor;

        match self.state.zoom {
            ZoomLevel::Year => (View::Year(YearView::rolling(self.state.current_year)), None),
            ZoomLevel::Month => {
                let (load, failure) = self.load_year(anchor.year()).await;
                let view = MonthView::tally(anchor.year(), load.all_records(), &self.zone);
                (View::Month(view), failure)
            }
            ZoomLevel::Day => {
                let (load, failure) = self.load_year(anchor.year()).await;
                let view = DayView::tally(anchor.year(), anchor.month(), load.all_records(), &self.zone);
                (View::Day(view), failure)
            }
            ZoomLevel::Time if self.streamers.is_empty() => (View::NoChannels, None),
            ZoomLevel::Time => {
                let (load, load_failure) = self.load_year(anchor.year()).await;
                let (live, live_failure) = self.live_status().await;
                let view = TimeView::build(
                    anchor,
                    self.streamers.as_slice(),
                    |login| self.cache.cached_identity(login),
                    |login| load.records.get(login).map(Vec::as_slice).unwrap_or_default(),
                    &live,
                    &self.zone,
                );
                (View::Time(view), load_failure.or(live_failure))
            }
        }
    }

    async fn load_year(&mut self, year: i32) -> (PeriodLoad, Option<FetchError>) {
        let mut load = self
            .cache
            .year(&self.client, self.streamers.as_slice(), year, &self.zone)
            .await;

        let failure = std::mem::take(&mut load.failures)
            .into_iter()
            .next()
            .map(|(_, error)| error);

        (load, failure)
    }

    async fn live_status(&self) -> (HashSet<Login>, Option<FetchError>) {
        let queries: Vec<String> = self
            .streamers
            .as_slice()
            .chunks(LIVE_STATUS_BATCH)
            .map(|batch| batch.iter().map(|login| format!("user_login={login}")).join("&"))
            .collect();

        let mut live = HashSet::new();
        for query in queries {
            match self
                .client
                .fetch_all::<LiveStream>(&format!("streams?{query}"), false)
                .await
            {
                Ok(streams) => live.extend(
                    streams
                        .into_iter()
                        .filter_map(|stream| stream.user_login.parse::<Login>().ok()),
                ),
                Err(error) => return (live, Some(error)),
            }
        }

        (live, None)
    }

    /// Replace the input text. Searching for the returned ticket only happens once it
    /// has outlived [SUGGESTION_DEBOUNCE], see [Debounce::settled].
    pub fn set_input(&mut self, text: impl Into<String>) -> InputTicket {
        self.input = text.into();
        self.debounce.bump()
    }

    /// Suggest channels for the input edit `ticket`. A superseded edit does nothing;
    /// short queries hide the list without asking upstream.
    pub async fn search_suggestions(&mut self, ticket: InputTicket) {
        if !self.debounce.is_current(ticket) {
            tracing::trace!(?ticket, "skipping superseded suggestion search");
            return;
        }

        let query = self.input.trim();
        if query.chars().count() < MIN_SUGGESTION_QUERY {
            self.renderer.show_suggestions(&[]);
            return;
        }

        let query: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        let endpoint = format!("search/channels?query={query}&first={SUGGESTION_LIMIT}");

        match self.client.fetch_all::<ChannelSuggestion>(&endpoint, false).await {
            Ok(suggestions) => self.renderer.show_suggestions(&suggestions),
            Err(error) => {
                self.renderer.show_suggestions(&[]);
                self.report(error);
            }
        }
    }

    pub async fn pick_suggestion(&mut self, suggestion: &ChannelSuggestion) -> AddOutcome {
        self.add_streamer(&suggestion.broadcaster_login).await
    }

    /// Track `name`. The input and the suggestion list are cleared whatever happens.
    #[instrument(skip(self))]
    pub async fn add_streamer(&mut self, name: &str) -> AddOutcome {
        let outcome = self.try_add(name).await;

        self.input.clear();
        self.debounce.bump();
        self.renderer.show_suggestions(&[]);

        outcome
    }

    async fn try_add(&mut self, name: &str) -> AddOutcome {
        if name.trim().is_empty() {
            return AddOutcome::Empty;
        }

        let Ok(login) = name.parse::<Login>() else {
            self.not_found(name);
            return AddOutcome::NotFound;
        };

        if self.streamers.contains(&login) {
            return AddOutcome::AlreadyTracked;
        }

        match self.cache.identity(&self.client, &login).await {
            Ok(Some(identity)) => {
                tracing::info!(login = %identity.login, "tracking channel");
                self.streamers.add(login);
                self.membership_changed().await;
                AddOutcome::Added
            }
            Ok(None) => {
                self.not_found(login.as_str());
                AddOutcome::NotFound
            }
            Err(error) => {
                self.report(error);
                AddOutcome::Failed
            }
        }
    }

    pub async fn remove_streamer(&mut self, login: &Login) -> bool {
        if !self.streamers.remove(login) {
            return false;
        }

        tracing::info!(%login, "stopped tracking channel");
        self.membership_changed().await;
        true
    }

    async fn membership_changed(&mut self) {
        self.cache.invalidate_periods();
        self.show_streamers();
        self.refresh().await;
    }

    fn show_streamers(&mut self) {
        let tags: Vec<StreamerTag> = self
            .streamers
            .as_slice()
            .iter()
            .map(|login| StreamerTag {
                login: login.clone(),
                display_name: self
                    .cache
                    .cached_identity(login)
                    .map(|identity| identity.display_name.clone())
                    .unwrap_or_else(|| login.to_string()),
            })
            .collect();

        self.renderer.show_streamers(&tags);
    }

    fn not_found(&mut self, input: &str) {
        self.renderer.notify(Notice::ChannelNotFound {
            input: input.trim().to_string(),
        });
    }

    fn report(&mut self, error: FetchError) {
        match error {
            FetchError::LoginRequired => {
                if self.login_prompted {
                    return;
                }
                self.login_prompted = true;

                let authorize_url = self.flow.as_ref().map(|flow| flow.authorize_url().to_string());
                self.renderer.notify(Notice::LoginRequired { authorize_url });
            }
            error if self.client.is_proxied() => {
                tracing::error!(%error, "proxy request failed");
                let message = match error {
                    FetchError::Status {
                        message: Some(message),
                        ..
                    } => message,
                    error => error.to_string(),
                };
                self.renderer.notify(Notice::ProxyFailure { message });
            }
            error => tracing::error!(%error, "request failed"),
        }
    }
}
