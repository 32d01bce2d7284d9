//! # Playback Engine
//!
//! Coordinates the host audio engine, the playlist and the UI.
//!
//! ## Overview
//!
//! [`PlaybackEngine`] owns three things:
//! - the host [`AudioPlayer`],
//! - a [`NavigablePlaylist`] of [`TrackItem`]s,
//! - four broadcast topics: engine snapshots, playlist navigation flags,
//!   playlist contents and the current track.
//!
//! Snapshots are recomputed from three sources: the player's raw event
//! stream, a fixed-interval ticker, and explicit commands. All three funnel
//! through one mutation path. The engine cell (snapshot, playlist, error
//! latch) sits behind a single mutex that stays locked across merge and
//! broadcast, so subscribers see snapshots in commit order and never a torn
//! one.
//!
//! ## Lifecycle
//!
//! ```text
//! new() ──> configure() ──> commands ... ──> dispose()
//!              │                                 │
//!              ├─ spawns ticker                  ├─ cancels both tasks
//!              └─ spawns event listener          ├─ releases the player
//!                                                └─ closes all topics
//! ```
//!
//! ## Failure Policy
//!
//! Commands return `()`. Player failures are logged and turned into an error
//! snapshot (`errorCode = "decode"`, or `"source"` when a track has no
//! usable URL). The error stays latched across ticker and event recomputes
//! until the next explicit transport or navigation command.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_playback::{EngineConfig, PlaybackEngine};
//!
//! let engine = PlaybackEngine::new(player, EngineConfig::default())?;
//! engine.configure()?;
//!
//! let mut snapshots = engine.snapshots();
//! engine.init_playlist_from(tracks).await;
//!
//! while let Ok(snapshot) = snapshots.recv().await {
//!     render(snapshot);
//! }
//! ```

use crate::config::EngineConfig;
use crate::error::{PlaybackError, Result};
use crate::navigation::{NavigablePlaylist, TrackChange};
use crate::snapshot::{EngineSnapshot, PlaylistContents, PlaylistSnapshot, SnapshotUpdate};
use crate::state::{map_state, EngineState};
use crate::track::{TrackId, TrackItem};
use bridge_traits::{AudioPlayer, PlaybackEventStream, ProcessingState, RawPlaybackEvent};
use core_runtime::events::{EventBus, EventStream};
use core_runtime::logging::redact_url_query;
use futures::StreamExt;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Counters for conditions that are recovered from rather than surfaced as
/// errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineDiagnostics {
    /// `init_playlist_from_with_track` calls whose selection was not found.
    pub fallback_count: u64,
    /// Emissions attempted on a closed topic.
    pub dropped_emissions: u64,
    /// Failures converted into an error snapshot.
    pub failures: u64,
}

#[derive(Default)]
struct Counters {
    fallback_count: AtomicU64,
    dropped_emissions: AtomicU64,
    failures: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> EngineDiagnostics {
        EngineDiagnostics {
            fallback_count: self.fallback_count.load(Ordering::Relaxed),
            dropped_emissions: self.dropped_emissions.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// State mutated only through [`EngineInner::commit`] and the playlist
/// helpers, always under one lock.
struct EngineCell {
    snapshot: EngineSnapshot,
    playlist: NavigablePlaylist<TrackItem>,
    /// Latched error code, cleared by explicit commands.
    fault: Option<&'static str>,
}

enum Lifecycle {
    Created,
    Running(Vec<JoinHandle<()>>),
    Disposed,
}

/// What the player currently reports.
struct Observation {
    state: EngineState,
    position: Duration,
    duration: Option<Duration>,
}

struct EngineInner {
    player: Arc<dyn AudioPlayer>,
    config: EngineConfig,
    cell: Mutex<EngineCell>,
    snapshots: EventBus<EngineSnapshot>,
    playlist_snapshots: EventBus<PlaylistSnapshot>,
    playlist_contents: EventBus<PlaylistContents>,
    current_tracks: EventBus<TrackItem>,
    lifecycle: Mutex<Lifecycle>,
    disposed: AtomicBool,
    shutdown: CancellationToken,
    counters: Counters,
}

/// Handle to the playback coordinator.
///
/// Cloning is cheap and every clone drives the same engine. The host's
/// composition root is expected to create exactly one.
#[derive(Clone)]
pub struct PlaybackEngine {
    inner: Arc<EngineInner>,
}

impl fmt::Debug for PlaybackEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackEngine")
            .field("player", &"AudioPlayer { ... }")
            .field("config", &self.inner.config)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl PlaybackEngine {
    /// Create an engine around `player`.
    ///
    /// Nothing runs until [`configure`](Self::configure) is called.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::InvalidConfig`] if `config` fails validation.
    pub fn new(player: Arc<dyn AudioPlayer>, config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let capacity = config.channel_capacity;
        let inner = EngineInner {
            player,
            config,
            cell: Mutex::new(EngineCell {
                snapshot: EngineSnapshot::default(),
                playlist: NavigablePlaylist::new(),
                fault: None,
            }),
            snapshots: EventBus::new("engine_snapshot", capacity),
            playlist_snapshots: EventBus::new("playlist_snapshot", capacity),
            playlist_contents: EventBus::new("playlist_contents", capacity),
            current_tracks: EventBus::new("current_track", capacity),
            lifecycle: Mutex::new(Lifecycle::Created),
            disposed: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
            counters: Counters::default(),
        };

        // Seed the latest-value caches so early subscribers have something
        // to render.
        inner.emit_snapshot(EngineSnapshot::default());
        inner.emit_playlist(&inner.cell.lock());

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Subscribe to player events and start the ticker.
    ///
    /// Calling this again while running is a no-op; it never creates a
    /// second ticker or event subscription.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::Disposed`] after [`dispose`](Self::dispose)
    /// - [`PlaybackError::RuntimeUnavailable`] outside a Tokio runtime
    pub fn configure(&self) -> Result<()> {
        let mut lifecycle = self.inner.lifecycle.lock();
        match *lifecycle {
            Lifecycle::Disposed => return Err(PlaybackError::Disposed),
            Lifecycle::Running(_) => {
                debug!("Playback engine already configured");
                return Ok(());
            }
            Lifecycle::Created => {}
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| PlaybackError::RuntimeUnavailable(e.to_string()))?;

        let weak = Arc::downgrade(&self.inner);
        let ticker = runtime.spawn(run_ticker(
            weak.clone(),
            self.inner.config.tick_interval,
            self.inner.shutdown.child_token(),
        ));
        let listener = runtime.spawn(run_event_listener(
            weak,
            self.inner.player.playback_events(),
            self.inner.shutdown.child_token(),
        ));

        *lifecycle = Lifecycle::Running(vec![ticker, listener]);
        info!(
            tick_interval_ms = self.inner.config.tick_interval.as_millis() as u64,
            "Playback engine configured"
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------

    /// Start playback. No-op if the player is already playing.
    ///
    /// Only issues the command; buffering completes asynchronously.
    pub fn play(&self) {
        let inner = &self.inner;
        if inner.is_disposed() || inner.player.player_state().playing {
            return;
        }

        inner.clear_fault();
        match inner.player.play() {
            Ok(()) => inner.refresh(),
            Err(e) => inner.fail(e.into()),
        }
    }

    /// Pause playback. No-op if not playing.
    #[instrument(skip(self))]
    pub async fn pause(&self) {
        let inner = &self.inner;
        if inner.is_disposed() || !inner.player.player_state().playing {
            return;
        }

        inner.clear_fault();
        match inner.player.pause().await {
            Ok(()) => inner.refresh(),
            Err(e) => inner.fail(e.into()),
        }
    }

    /// Stop playback, leaving the engine idle. No-op if not playing.
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        let inner = &self.inner;
        if inner.is_disposed() || !inner.player.player_state().playing {
            return;
        }

        inner.clear_fault();
        match inner.player.stop().await {
            Ok(()) => {
                let mut observation = inner.observe();
                observation.state = EngineState::Idle;
                inner.publish_observation(observation);
            }
            Err(e) => inner.fail(e.into()),
        }
    }

    /// Seek within the current source. Range checking is left to the player.
    #[instrument(skip_all, fields(position_ms = position.as_millis() as u64))]
    pub async fn seek(&self, position: Duration) {
        let inner = &self.inner;
        if inner.is_disposed() {
            return;
        }

        inner.clear_fault();
        match inner.player.seek(position).await {
            Ok(()) => inner.refresh(),
            Err(e) => inner.fail(e.into()),
        }
    }

    // ------------------------------------------------------------------
    // Playlist
    // ------------------------------------------------------------------

    /// Replace the playlist and load its first track, even if that track is
    /// already current.
    ///
    /// Playback starts when [`EngineConfig::autoplay_on_init`] is set.
    #[instrument(skip_all, fields(count = tracks.len()))]
    pub async fn init_playlist_from(&self, tracks: Vec<TrackItem>) {
        self.init_playlist_at(tracks, 0).await;
    }

    /// Replace the playlist and load the track whose id matches `selected`.
    ///
    /// An unknown `selected` falls back to the first track; the fallback is
    /// logged and counted in [`EngineDiagnostics::fallback_count`].
    #[instrument(skip_all, fields(count = tracks.len(), selected = %selected))]
    pub async fn init_playlist_from_with_track(&self, tracks: Vec<TrackItem>, selected: &TrackId) {
        if self.inner.is_disposed() {
            return;
        }

        let index = match tracks.iter().position(|track| &track.id == selected) {
            Some(index) => index,
            None => {
                self.inner
                    .counters
                    .fallback_count
                    .fetch_add(1, Ordering::Relaxed);
                warn!(
                    selected = %selected,
                    "Selected track not in playlist, falling back to the first track"
                );
                0
            }
        };

        self.init_playlist_at(tracks, index).await;
    }

    async fn init_playlist_at(&self, tracks: Vec<TrackItem>, index: usize) {
        let inner = &self.inner;
        if inner.is_disposed() {
            return;
        }

        let change = inner.cell.lock().playlist.init_from_list_at(tracks, index);
        inner.apply(change, inner.config.autoplay_on_init).await;
        inner.emit_all();
    }

    /// Move to the next track and play it. No-op on the last track.
    ///
    /// Moving onto an entry with the same id as the current one keeps the
    /// loaded source but still emits on every topic.
    #[instrument(skip(self))]
    pub async fn next_track(&self) {
        let inner = &self.inner;
        if inner.is_disposed() {
            return;
        }

        let step = inner.cell.lock().playlist.next();
        if step.moved {
            inner.apply(step.change, true).await;
            inner.emit_all();
        }
    }

    /// Move to the previous track and play it. No-op on the first track.
    #[instrument(skip(self))]
    pub async fn previous_track(&self) {
        let inner = &self.inner;
        if inner.is_disposed() {
            return;
        }

        let step = inner.cell.lock().playlist.previous();
        if step.moved {
            inner.apply(step.change, true).await;
            inner.emit_all();
        }
    }

    /// Jump to `index` (clamped) and play that track. No-op if the cursor
    /// does not move.
    #[instrument(skip(self))]
    pub async fn skip_to(&self, index: usize) {
        let inner = &self.inner;
        if inner.is_disposed() {
            return;
        }

        let step = inner.cell.lock().playlist.set_index(index);
        if step.moved {
            inner.apply(step.change, true).await;
            inner.emit_all();
        }
    }

    /// Append `track`. When it is the only track it is loaded but not
    /// played.
    #[instrument(skip_all, fields(track = %track.id))]
    pub async fn add_to_end(&self, track: TrackItem) {
        let inner = &self.inner;
        if inner.is_disposed() {
            return;
        }

        let change = inner.cell.lock().playlist.add_to_end(track);
        inner.apply(change, false).await;
        inner.emit_all();
    }

    /// Insert `track` right after the current one. Into an empty playlist it
    /// is loaded but not played.
    #[instrument(skip_all, fields(track = %track.id))]
    pub async fn insert_next(&self, track: TrackItem) {
        let inner = &self.inner;
        if inner.is_disposed() {
            return;
        }

        let change = inner.cell.lock().playlist.insert_next(track);
        inner.apply(change, false).await;
        inner.emit_all();
    }

    /// Empty the playlist and stop the player.
    #[instrument(skip(self))]
    pub async fn clear_playlist(&self) {
        let inner = &self.inner;
        if inner.is_disposed() {
            return;
        }

        let change = inner.cell.lock().playlist.clear();
        inner.apply(change, false).await;
        inner.emit_all();
    }

    // ------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------

    /// Stop background tasks, release the player and close every topic.
    ///
    /// Idempotent. Every other method becomes a no-op afterwards.
    #[instrument(skip(self))]
    pub async fn dispose(&self) {
        let inner = &self.inner;
        let handles = {
            let mut lifecycle = inner.lifecycle.lock();
            match std::mem::replace(&mut *lifecycle, Lifecycle::Disposed) {
                Lifecycle::Disposed => return,
                Lifecycle::Running(handles) => handles,
                Lifecycle::Created => Vec::new(),
            }
        };
        inner.disposed.store(true, Ordering::Release);

        inner.shutdown.cancel();
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Background task ended abnormally: {}", e);
            }
        }

        if let Err(e) = inner.player.dispose().await {
            warn!("Failed to release audio player: {}", e);
        }

        inner.snapshots.close();
        inner.playlist_snapshots.close();
        inner.playlist_contents.close();
        inner.current_tracks.close();

        info!("Playback engine disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Latest committed snapshot.
    pub fn snapshot(&self) -> EngineSnapshot {
        self.inner.cell.lock().snapshot.clone()
    }

    pub fn playlist_snapshot(&self) -> PlaylistSnapshot {
        PlaylistSnapshot::of(self.inner.cell.lock().playlist.playlist())
    }

    /// Copy of the playlist, in order.
    pub fn playlist(&self) -> Vec<TrackItem> {
        self.inner.cell.lock().playlist.playlist().to_vec()
    }

    pub fn current_track(&self) -> Option<TrackItem> {
        self.inner.cell.lock().playlist.current().cloned()
    }

    pub fn diagnostics(&self) -> EngineDiagnostics {
        self.inner.counters.snapshot()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    pub fn snapshots(&self) -> EventStream<EngineSnapshot> {
        self.inner.stream(&self.inner.snapshots)
    }

    pub fn playlist_snapshots(&self) -> EventStream<PlaylistSnapshot> {
        self.inner.stream(&self.inner.playlist_snapshots)
    }

    pub fn playlist_contents(&self) -> EventStream<PlaylistContents> {
        self.inner.stream(&self.inner.playlist_contents)
    }

    pub fn current_tracks(&self) -> EventStream<TrackItem> {
        self.inner.stream(&self.inner.current_tracks)
    }
}

impl EngineInner {
    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    fn stream<T: Clone + Send + 'static>(&self, bus: &EventBus<T>) -> EventStream<T> {
        if self.config.replay_latest {
            bus.stream_with_latest()
        } else {
            bus.stream()
        }
    }

    fn observe(&self) -> Observation {
        let player_state = self.player.player_state();
        Observation {
            state: map_state(&player_state.processing_state, player_state.playing),
            position: self.player.position(),
            duration: self.player.duration(),
        }
    }

    fn refresh(&self) {
        self.publish_observation(self.observe());
    }

    fn on_player_event(&self, event: RawPlaybackEvent) {
        let playing = self.player.player_state().playing;
        self.publish_observation(Observation {
            state: map_state(&event.processing_state, playing),
            position: event.position,
            duration: event.duration,
        });
    }

    /// Merge an observation, keeping a latched error in place.
    fn publish_observation(&self, observation: Observation) {
        let mut cell = self.cell.lock();
        let mut update = SnapshotUpdate::new().position(observation.position);
        if let Some(duration) = observation.duration {
            update = update.duration(duration);
        }
        update = match cell.fault {
            Some(code) => update.state(EngineState::Error).error_code(code),
            None => update.state(observation.state).clear_error(),
        };
        self.commit(&mut cell, update);
    }

    fn publish(&self, update: SnapshotUpdate) {
        let mut cell = self.cell.lock();
        self.commit(&mut cell, update);
    }

    /// The single mutation path for the engine snapshot. The caller holds
    /// the cell lock until the broadcast returns.
    fn commit(&self, cell: &mut EngineCell, update: SnapshotUpdate) {
        cell.snapshot = cell.snapshot.merge(update);
        self.emit_snapshot(cell.snapshot.clone());
    }

    fn clear_fault(&self) {
        self.cell.lock().fault = None;
    }

    fn fail(&self, err: PlaybackError) {
        let code = err.error_code();
        self.counters.failures.fetch_add(1, Ordering::Relaxed);
        error!(error_code = code, transient = err.is_transient(), "Playback failure: {}", err);

        let mut cell = self.cell.lock();
        cell.fault = Some(code);
        self.commit(&mut cell, SnapshotUpdate::failure(code));
    }

    async fn apply(&self, change: Option<TrackChange<TrackItem>>, autoplay: bool) {
        match change {
            Some(TrackChange::Load(track)) => self.load_track(&track, autoplay).await,
            Some(TrackChange::Stop) => self.unload().await,
            None => {}
        }
    }

    /// Bring the player in line with a new current track.
    async fn load_track(&self, track: &TrackItem, autoplay: bool) {
        self.clear_fault();

        let Some(url) = track.preferred_url(&self.config.preferred_encodings) else {
            self.fail(PlaybackError::NoPlayableSource(track.id.to_string()));
            return;
        };

        // Never have two sources loading at once.
        if self.player.player_state().processing_state != ProcessingState::Idle {
            if let Err(e) = self.player.stop().await {
                warn!(track = %track.id, "Failed to stop previous source: {}", e);
            }
        }

        self.publish(
            SnapshotUpdate::new()
                .state(EngineState::Loading)
                .position(Duration::ZERO)
                .duration(Duration::ZERO)
                .clear_error(),
        );

        debug!(track = %track.id, url = redact_url_query(url), autoplay, "Loading track");
        let duration_hint = match self.player.set_source(url).await {
            Ok(duration) => duration,
            Err(e) => {
                self.fail(e.into());
                return;
            }
        };

        let started = if autoplay {
            self.player.play()
        } else {
            self.player.load().await
        };
        if let Err(e) = started {
            self.fail(e.into());
            return;
        }

        let mut observation = self.observe();
        observation.duration = observation.duration.or(duration_hint);
        self.publish_observation(observation);
    }

    async fn unload(&self) {
        self.clear_fault();
        if let Err(e) = self.player.stop().await {
            self.fail(e.into());
            return;
        }

        self.publish(
            SnapshotUpdate::new()
                .state(EngineState::Idle)
                .position(Duration::ZERO)
                .duration(Duration::ZERO)
                .clear_error(),
        );
    }

    /// Emit all four topics, in order: snapshot, navigation flags,
    /// contents, current track.
    fn emit_all(&self) {
        let cell = self.cell.lock();
        self.emit_snapshot(cell.snapshot.clone());
        self.emit_playlist(&cell);
    }

    fn emit_playlist(&self, cell: &EngineCell) {
        let playlist = cell.playlist.playlist();
        self.emit(&self.playlist_snapshots, PlaylistSnapshot::of(playlist));
        self.emit(&self.playlist_contents, PlaylistContents::of(playlist));
        if let Some(track) = playlist.current() {
            self.emit(&self.current_tracks, track.clone());
        }
    }

    fn emit_snapshot(&self, snapshot: EngineSnapshot) {
        self.emit(&self.snapshots, snapshot);
    }

    fn emit<T: Clone + Send + 'static>(&self, bus: &EventBus<T>, value: T) {
        if let Err(e) = bus.emit(value) {
            self.counters
                .dropped_emissions
                .fetch_add(1, Ordering::Relaxed);
            debug!(topic = bus.name(), "Dropped emission: {}", e);
        }
    }
}

impl Drop for EngineInner {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn run_ticker(engine: Weak<EngineInner>, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let Some(engine) = engine.upgrade() else { break };
                engine.refresh();
            }
        }
    }

    debug!("Playback ticker stopped");
}

async fn run_event_listener(
    engine: Weak<EngineInner>,
    mut events: PlaybackEventStream,
    cancel: CancellationToken,
) {
    loop {
        let item = tokio::select! {
            _ = cancel.cancelled() => break,
            item = events.next() => item,
        };

        let Some(item) = item else {
            debug!("Player event stream ended");
            break;
        };
        let Some(engine) = engine.upgrade() else { break };

        match item {
            Ok(event) => engine.on_player_event(event),
            Err(e) => engine.fail(e.into()),
        }
    }

    debug!("Player event listener stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{DECODE_ERROR_CODE, SOURCE_ERROR_CODE};
    use bridge_traits::{MockAudioPlayer, PlayerState};

    fn playing() -> PlayerState {
        PlayerState::new(ProcessingState::Ready, true)
    }

    fn paused() -> PlayerState {
        PlayerState::new(ProcessingState::Ready, false)
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = EngineConfig::default().with_channel_capacity(0);
        let err = PlaybackEngine::new(Arc::new(MockAudioPlayer::new()), config).unwrap_err();
        assert!(matches!(err, PlaybackError::InvalidConfig(_)));
    }

    #[test]
    fn test_configure_requires_runtime() {
        let engine =
            PlaybackEngine::new(Arc::new(MockAudioPlayer::new()), EngineConfig::default()).unwrap();
        assert!(matches!(
            engine.configure(),
            Err(PlaybackError::RuntimeUnavailable(_))
        ));
    }

    #[test]
    fn test_new_engine_starts_idle_and_empty() {
        let engine =
            PlaybackEngine::new(Arc::new(MockAudioPlayer::new()), EngineConfig::default()).unwrap();

        assert_eq!(engine.snapshot(), EngineSnapshot::default());
        assert_eq!(engine.playlist_snapshot(), PlaylistSnapshot::default());
        assert!(engine.current_track().is_none());

        let mut snapshots = engine.snapshots();
        assert_eq!(snapshots.try_recv().unwrap().unwrap().state, EngineState::Idle);
    }

    #[test]
    fn test_play_is_noop_when_already_playing() {
        let mut player = MockAudioPlayer::new();
        player.expect_player_state().returning(playing);
        player.expect_play().never();

        let engine = PlaybackEngine::new(Arc::new(player), EngineConfig::default()).unwrap();
        engine.play();
    }

    #[test]
    fn test_play_issues_command_and_emits() {
        let mut player = MockAudioPlayer::new();
        let mut calls = 0;
        player.expect_player_state().returning(move || {
            calls += 1;
            if calls == 1 {
                paused()
            } else {
                playing()
            }
        });
        player.expect_play().times(1).returning(|| Ok(()));
        player
            .expect_position()
            .returning(|| Duration::from_secs(1));
        player
            .expect_duration()
            .returning(|| Some(Duration::from_secs(90)));

        let engine = PlaybackEngine::new(Arc::new(player), EngineConfig::default()).unwrap();
        engine.play();

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.state, EngineState::Playing);
        assert_eq!(snapshot.duration, Duration::from_secs(90));
    }

    #[test]
    fn test_play_failure_becomes_error_snapshot() {
        let mut player = MockAudioPlayer::new();
        player.expect_player_state().returning(paused);
        player
            .expect_play()
            .returning(|| Err(bridge_traits::BridgeError::Decode("bad header".into())));

        let engine = PlaybackEngine::new(Arc::new(player), EngineConfig::default()).unwrap();
        engine.play();

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.state, EngineState::Error);
        assert_eq!(snapshot.error_code.as_deref(), Some(DECODE_ERROR_CODE));
        assert_eq!(engine.diagnostics().failures, 1);
    }

    #[tokio::test]
    async fn test_pause_is_noop_when_not_playing() {
        let mut player = MockAudioPlayer::new();
        player.expect_player_state().returning(paused);
        player.expect_pause().never();

        let engine = PlaybackEngine::new(Arc::new(player), EngineConfig::default()).unwrap();
        engine.pause().await;
    }

    #[tokio::test]
    async fn test_dispose_without_configure_releases_player_once() {
        let mut player = MockAudioPlayer::new();
        player.expect_dispose().times(1).returning(|| Ok(()));

        let engine = PlaybackEngine::new(Arc::new(player), EngineConfig::default()).unwrap();
        engine.dispose().await;
        engine.dispose().await;

        assert!(engine.is_disposed());
        assert!(matches!(engine.configure(), Err(PlaybackError::Disposed)));
    }

    #[tokio::test]
    async fn test_track_without_url_reports_source_error() {
        let mut player = MockAudioPlayer::new();
        player.expect_set_source().never();

        let engine = PlaybackEngine::new(Arc::new(player), EngineConfig::default()).unwrap();
        engine
            .add_to_end(TrackItem::new("t-1", "No Urls"))
            .await;

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.state, EngineState::Error);
        assert_eq!(snapshot.error_code.as_deref(), Some(SOURCE_ERROR_CODE));
        assert_eq!(engine.current_track().map(|t| t.id), Some(TrackId::new("t-1")));
    }
}
