//! Foreground window watcher.
//!
//! A dedicated thread polls the foreground window at a fixed interval,
//! detects when the reported window changes, applies the blocklist and
//! notifies the attached sink. The watcher can be started and stopped from
//! any thread; every `start` allocates a fresh stop channel so a stale stop
//! from a previous run can never affect a new one.

use crate::error::WatchError;
use crate::monitor::blocklist::{normalize_executable, BlocklistLookup};
use crate::monitor::sink::{NotificationSink, EVENT_WARNING_DETECTED, EVENT_WINDOW_CHANGED};
use crossbeam_channel::{select, tick, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Title and owning executable of a window at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSnapshot {
    /// Window title, trimmed. May be empty.
    pub title: String,

    /// Executable name of the owning process, lower-cased.
    pub executable: String,
}

impl WindowSnapshot {
    pub fn new(title: impl Into<String>, executable: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            executable: executable.into(),
        }
    }

    /// True when both fields are empty, which is never a usable window.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.executable.is_empty()
    }
}

/// Source of foreground window snapshots.
pub trait WindowQuery: Send + Sync {
    /// Queries the OS for the current foreground window.
    ///
    /// Returns [`WatchError::NoForegroundWindow`] when nothing has focus and
    /// [`WatchError::QueryFailed`] when the title or process lookup fails.
    fn query(&self) -> Result<WindowSnapshot, WatchError>;
}

/// Payload of the `warning-detected` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockWarning {
    pub executable: String,
    pub display_name: String,
    pub title: String,
}

/// Configuration for the window watcher.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// How often to poll the foreground window (default: 1s).
    pub poll_interval: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// Result of a single poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollOutcome {
    /// The OS query failed; nothing changed.
    Failed,
    /// The query returned an empty snapshot.
    Skipped,
    Unchanged,
    Changed,
}

/// Handle on the currently running loop.
struct RunHandle {
    /// Dropping the sender disconnects the loop's stop channel.
    stop_tx: Sender<()>,
    thread: JoinHandle<()>,
}

#[derive(Default)]
struct WatcherState {
    /// Most recently reported window (not the most recently polled one).
    last_snapshot: WindowSnapshot,

    /// Present iff a polling loop is active.
    run: Option<RunHandle>,

    /// Executable currently warned for. Empty when no warning is active.
    last_warned_executable: String,

    sink: Option<Arc<dyn NotificationSink>>,
}

struct Inner {
    query: Arc<dyn WindowQuery>,
    blocklist: Arc<dyn BlocklistLookup>,
    config: WatcherConfig,
    state: Mutex<WatcherState>,
}

/// Polls the foreground window and reports changes.
///
/// Cloning yields another handle on the same watcher.
#[derive(Clone)]
pub struct WindowWatcher {
    inner: Arc<Inner>,
}

impl WindowWatcher {
    /// Creates an idle watcher. No thread is spawned until [`start`](Self::start).
    pub fn new(
        query: Arc<dyn WindowQuery>,
        blocklist: Arc<dyn BlocklistLookup>,
        config: WatcherConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                query,
                blocklist,
                config,
                state: Mutex::new(WatcherState::default()),
            }),
        }
    }

    /// Starts the polling loop on a background thread.
    ///
    /// Returns immediately. Fails with [`WatchError::AlreadyRunning`] if a
    /// loop is active; callers racing to start can treat that as success.
    pub fn start(&self) -> Result<(), WatchError> {
        let mut state = self.inner.state.lock();
        if state.run.is_some() {
            return Err(WatchError::AlreadyRunning);
        }

        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);
        let inner = Arc::clone(&self.inner);
        let thread = thread::Builder::new()
            .name("window-poller".to_string())
            .spawn(move || inner.run_loop(stop_rx))
            .map_err(WatchError::Spawn)?;

        state.run = Some(RunHandle { stop_tx, thread });

        tracing::info!(
            interval_ms = self.inner.config.poll_interval.as_millis(),
            "Window monitoring started"
        );
        Ok(())
    }

    /// Stops the polling loop. Does nothing if the watcher is idle.
    ///
    /// Waits for the loop thread to exit, which takes at most one in-flight
    /// poll cycle. When called from the loop thread itself (e.g. from a
    /// sink) the loop is signalled but not joined.
    pub fn stop(&self) {
        let run = self.inner.state.lock().run.take();
        let Some(RunHandle { stop_tx, thread }) = run else {
            return;
        };

        drop(stop_tx);

        if thread.thread().id() == thread::current().id() {
            tracing::debug!("Stop requested from polling thread");
            return;
        }

        if thread.join().is_err() {
            tracing::error!("Window polling thread panicked");
        }
        tracing::info!("Window monitoring stopped");
    }

    pub fn is_running(&self) -> bool {
        self.inner.state.lock().run.is_some()
    }

    /// Queries the OS for the current foreground window.
    ///
    /// Always performs a fresh query; the cached snapshot only moves on
    /// change. An empty result is reported as
    /// [`WatchError::NoForegroundWindow`].
    pub fn get_active_window(&self) -> Result<WindowSnapshot, WatchError> {
        let snapshot = self.inner.query.query()?;
        if snapshot.is_empty() {
            return Err(WatchError::NoForegroundWindow);
        }
        Ok(snapshot)
    }

    /// Returns the most recently reported window, if any.
    pub fn last_snapshot(&self) -> Option<WindowSnapshot> {
        let state = self.inner.state.lock();
        (!state.last_snapshot.is_empty()).then(|| state.last_snapshot.clone())
    }

    /// Attaches a sink, replacing any previous one.
    pub fn attach_sink(&self, sink: Arc<dyn NotificationSink>) {
        self.inner.state.lock().sink = Some(sink);
        tracing::debug!("Notification sink attached");
    }

    /// Detaches the sink. Later events are dropped until one is attached.
    pub fn detach_sink(&self) {
        self.inner.state.lock().sink = None;
        tracing::debug!("Notification sink detached");
    }

    pub fn poll_interval(&self) -> Duration {
        self.inner.config.poll_interval
    }
}

impl Inner {
    fn run_loop(&self, stop_rx: Receiver<()>) {
        tracing::debug!("Window polling thread started");

        let ticker = tick(self.config.poll_interval);
        let mut first_since_start = true;

        loop {
            select! {
                recv(stop_rx) -> _ => break,
                recv(ticker) -> _ => {
                    // Both channels may be ready at once; stop wins.
                    if stop_requested(&stop_rx) {
                        break;
                    }
                    if self.poll_cycle(first_since_start) == PollOutcome::Changed {
                        first_since_start = false;
                    }
                }
            }
        }

        tracing::debug!("Window polling thread shutting down");
    }

    /// Performs a single poll cycle.
    fn poll_cycle(&self, first_since_start: bool) -> PollOutcome {
        let snapshot = match self.query.query() {
            Ok(snapshot) => snapshot,
            Err(WatchError::NoForegroundWindow) => {
                tracing::trace!("No foreground window");
                return PollOutcome::Failed;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error getting active window");
                return PollOutcome::Failed;
            }
        };

        if snapshot.is_empty() {
            return PollOutcome::Skipped;
        }

        {
            let mut state = self.state.lock();
            if !first_since_start && state.last_snapshot == snapshot {
                return PollOutcome::Unchanged;
            }
            state.last_snapshot = snapshot.clone();
        }

        tracing::debug!(
            exe = %snapshot.executable,
            title = %snapshot.title,
            "Active window changed"
        );

        let executable = normalize_executable(&snapshot.executable);
        let warning = self.check_blocklist(&executable, &snapshot.title);

        let sink = self.state.lock().sink.clone();
        let Some(sink) = sink else {
            tracing::trace!("No sink attached, dropping window events");
            return PollOutcome::Changed;
        };

        if let Some(warning) = warning {
            emit(sink.as_ref(), EVENT_WARNING_DETECTED, &warning);
        }
        emit(sink.as_ref(), EVENT_WINDOW_CHANGED, &snapshot);

        PollOutcome::Changed
    }

    /// Applies the blocklist to a newly reported executable.
    ///
    /// Returns the warning to emit, if any. A warning is raised once per
    /// stretch of focus on a blocked executable; lookup failures count as
    /// not blocked.
    fn check_blocklist(&self, executable: &str, title: &str) -> Option<BlockWarning> {
        let blocked = self.blocklist.is_blocked(executable).unwrap_or_else(|e| {
            tracing::warn!(exe = %executable, error = %e, "Blocklist lookup failed");
            false
        });

        {
            let mut state = self.state.lock();
            if !blocked {
                if !state.last_warned_executable.is_empty() {
                    tracing::debug!(
                        exe = %state.last_warned_executable,
                        "Blocked app no longer active, warning re-armed"
                    );
                    state.last_warned_executable.clear();
                }
                return None;
            }
            if state.last_warned_executable == executable {
                return None;
            }
            state.last_warned_executable = executable.to_string();
        }

        let display_name = match self.blocklist.entry_for(executable) {
            Ok(Some(entry)) if !entry.display_name.trim().is_empty() => entry.display_name,
            Ok(_) => executable.to_string(),
            Err(e) => {
                tracing::warn!(exe = %executable, error = %e, "Blocklist entry lookup failed");
                executable.to_string()
            }
        };

        tracing::warn!(exe = %executable, title = %title, "Blocked app detected");

        Some(BlockWarning {
            executable: executable.to_string(),
            display_name,
            title: title.to_string(),
        })
    }
}

fn stop_requested(stop_rx: &Receiver<()>) -> bool {
    !matches!(stop_rx.try_recv(), Err(TryRecvError::Empty))
}

fn emit(sink: &dyn NotificationSink, event: &str, payload: &impl Serialize) {
    match serde_json::to_value(payload) {
        Ok(value) => sink.emit(event, &value),
        Err(e) => tracing::warn!(event, error = %e, "Failed to serialize event payload"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BlocklistError;
    use crate::monitor::blocklist::BlockedApp;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Instant;

    enum Step {
        Window(&'static str, &'static str),
        NoWindow,
        Fail,
    }

    /// Replays a script of query results, then reports no window.
    #[derive(Default)]
    struct ScriptedQuery {
        steps: Mutex<VecDeque<Step>>,
        calls: AtomicUsize,
    }

    impl ScriptedQuery {
        fn new(steps: Vec<Step>) -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(steps.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl WindowQuery for ScriptedQuery {
        fn query(&self) -> Result<WindowSnapshot, WatchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.steps.lock().pop_front() {
                Some(Step::Window(title, exe)) => Ok(WindowSnapshot::new(title, exe)),
                Some(Step::Fail) => Err(WatchError::QueryFailed("access denied".into())),
                Some(Step::NoWindow) | None => Err(WatchError::NoForegroundWindow),
            }
        }
    }

    /// Always returns the same window.
    struct FixedQuery(WindowSnapshot, AtomicUsize);

    impl WindowQuery for FixedQuery {
        fn query(&self) -> Result<WindowSnapshot, WatchError> {
            self.1.fetch_add(1, Ordering::SeqCst);
            Ok(self.0.clone())
        }
    }

    #[derive(Default)]
    struct MemoryBlocklist {
        apps: Mutex<HashMap<String, String>>,
        failing: AtomicBool,
    }

    impl MemoryBlocklist {
        fn with(entries: &[(&str, &str)]) -> Arc<Self> {
            let list = Self::default();
            for (exe, display) in entries {
                list.apps.lock().insert(exe.to_string(), display.to_string());
            }
            Arc::new(list)
        }
    }

    impl BlocklistLookup for MemoryBlocklist {
        fn is_blocked(&self, executable: &str) -> Result<bool, BlocklistError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(BlocklistError::Unavailable("store offline".into()));
            }
            Ok(self.apps.lock().contains_key(executable))
        }

        fn entry_for(&self, executable: &str) -> Result<Option<BlockedApp>, BlocklistError> {
            Ok(self.apps.lock().get(executable).map(|display| BlockedApp {
                executable_name: executable.to_string(),
                display_name: display.clone(),
            }))
        }
    }

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<(String, serde_json::Value)>>);

    impl RecordingSink {
        fn events(&self) -> Vec<(String, serde_json::Value)> {
            self.0.lock().clone()
        }

        fn count(&self, event: &str) -> usize {
            self.0.lock().iter().filter(|(e, _)| e == event).count()
        }
    }

    impl NotificationSink for RecordingSink {
        fn emit(&self, event: &str, payload: &serde_json::Value) {
            self.0.lock().push((event.to_string(), payload.clone()));
        }
    }

    fn watcher_with(
        query: Arc<dyn WindowQuery>,
        blocklist: Arc<dyn BlocklistLookup>,
    ) -> (WindowWatcher, Arc<RecordingSink>) {
        let watcher = WindowWatcher::new(
            query,
            blocklist,
            WatcherConfig {
                poll_interval: Duration::from_millis(10),
            },
        );
        let sink = Arc::new(RecordingSink::default());
        watcher.attach_sink(sink.clone());
        (watcher, sink)
    }

    /// Runs one poll cycle per scripted step.
    fn drive(watcher: &WindowWatcher, cycles: usize) -> Vec<PollOutcome> {
        (0..cycles)
            .map(|i| watcher.inner.poll_cycle(i == 0))
            .collect()
    }

    fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        cond()
    }

    #[test]
    fn test_watcher_config_default() {
        let config = WatcherConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_identical_snapshots_emit_once() {
        let query = ScriptedQuery::new(vec![
            Step::Window("Notepad", "notepad.exe"),
            Step::Window("Notepad", "notepad.exe"),
            Step::Window("Notepad", "notepad.exe"),
        ]);
        let (watcher, sink) = watcher_with(query, MemoryBlocklist::with(&[]));

        let outcomes = drive(&watcher, 3);
        assert_eq!(
            outcomes,
            vec![
                PollOutcome::Changed,
                PollOutcome::Unchanged,
                PollOutcome::Unchanged
            ]
        );
        assert_eq!(sink.count(EVENT_WINDOW_CHANGED), 1);
    }

    #[test]
    fn test_title_or_executable_change_emits_new_snapshot() {
        let query = ScriptedQuery::new(vec![
            Step::Window("Notepad", "notepad.exe"),
            Step::Window("Untitled - Notepad", "notepad.exe"),
            Step::Window("Untitled - Notepad", "wordpad.exe"),
        ]);
        let (watcher, sink) = watcher_with(query, MemoryBlocklist::with(&[]));

        drive(&watcher, 3);

        let events = sink.events();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[1].1,
            serde_json::json!({"title": "Untitled - Notepad", "executable": "notepad.exe"})
        );
        assert_eq!(
            events[2].1,
            serde_json::json!({"title": "Untitled - Notepad", "executable": "wordpad.exe"})
        );
        assert_eq!(
            watcher.last_snapshot(),
            Some(WindowSnapshot::new("Untitled - Notepad", "wordpad.exe"))
        );
    }

    #[test]
    fn test_errors_and_empty_snapshots_are_skipped() {
        let query = ScriptedQuery::new(vec![
            Step::Fail,
            Step::NoWindow,
            Step::Window("", ""),
            Step::Window("", "explorer.exe"),
        ]);
        let (watcher, sink) = watcher_with(query, MemoryBlocklist::with(&[]));

        let outcomes = drive(&watcher, 4);
        assert_eq!(
            outcomes,
            vec![
                PollOutcome::Failed,
                PollOutcome::Failed,
                PollOutcome::Skipped,
                PollOutcome::Changed
            ]
        );
        // Empty title is a valid window
        assert_eq!(sink.events()[0].1["executable"], "explorer.exe");
        assert_eq!(sink.events()[0].1["title"], "");
    }

    #[test]
    fn test_first_snapshot_after_start_is_reported() {
        let query = ScriptedQuery::new(vec![
            Step::Window("Notepad", "notepad.exe"),
            Step::Window("Notepad", "notepad.exe"),
        ]);
        let (watcher, sink) = watcher_with(query, MemoryBlocklist::with(&[]));

        assert_eq!(watcher.inner.poll_cycle(true), PollOutcome::Changed);
        // Same window, but first valid snapshot of a new run
        assert_eq!(watcher.inner.poll_cycle(true), PollOutcome::Changed);
        assert_eq!(sink.count(EVENT_WINDOW_CHANGED), 2);
    }

    #[test]
    fn test_blocked_app_warns_once_while_focused() {
        let query = ScriptedQuery::new(vec![
            Step::Window("Notepad", "notepad.exe"),
            Step::Window("Notepad", "notepad.exe"),
            Step::Window("Chrome", "chrome.exe"),
            Step::Window("Chrome", "chrome.exe"),
            Step::Window("New Tab - Chrome", "chrome.exe"),
        ]);
        let blocklist = MemoryBlocklist::with(&[("chrome.exe", "Google Chrome")]);
        let (watcher, sink) = watcher_with(query, blocklist);

        drive(&watcher, 5);

        assert_eq!(sink.count(EVENT_WARNING_DETECTED), 1);
        assert_eq!(sink.count(EVENT_WINDOW_CHANGED), 3);

        let events = sink.events();
        // Warning precedes the change notification of the same cycle
        assert_eq!(events[1].0, EVENT_WARNING_DETECTED);
        assert_eq!(
            events[1].1,
            serde_json::json!({
                "executable": "chrome.exe",
                "displayName": "Google Chrome",
                "title": "Chrome"
            })
        );
        assert_eq!(events[2].0, EVENT_WINDOW_CHANGED);
        assert_eq!(
            events[2].1,
            serde_json::json!({"title": "Chrome", "executable": "chrome.exe"})
        );
    }

    #[test]
    fn test_display_name_falls_back_to_executable() {
        let query = ScriptedQuery::new(vec![Step::Window("Chrome", "Chrome.EXE ")]);
        let blocklist = MemoryBlocklist::with(&[("chrome.exe", "")]);
        let (watcher, sink) = watcher_with(query, blocklist);

        drive(&watcher, 1);

        let events = sink.events();
        assert_eq!(events[0].0, EVENT_WARNING_DETECTED);
        assert_eq!(events[0].1["displayName"], "chrome.exe");
        assert_eq!(events[0].1["executable"], "chrome.exe");
    }

    #[test]
    fn test_switching_between_blocked_apps_rearms_warning() {
        let query = ScriptedQuery::new(vec![
            Step::Window("Chrome", "chrome.exe"),
            Step::Window("Discord", "discord.exe"),
            Step::Window("Chrome", "chrome.exe"),
        ]);
        let blocklist = MemoryBlocklist::with(&[("chrome.exe", "Chrome"), ("discord.exe", "Discord")]);
        let (watcher, sink) = watcher_with(query, blocklist);

        drive(&watcher, 3);

        let warned: Vec<_> = sink
            .events()
            .into_iter()
            .filter(|(e, _)| e == EVENT_WARNING_DETECTED)
            .map(|(_, p)| p["executable"].as_str().unwrap_or_default().to_string())
            .collect();
        assert_eq!(warned, vec!["chrome.exe", "discord.exe", "chrome.exe"]);
    }

    #[test]
    fn test_unblocked_app_clears_active_warning() {
        let query = ScriptedQuery::new(vec![
            Step::Window("Chrome", "chrome.exe"),
            Step::Window("Notepad", "notepad.exe"),
            Step::Window("Chrome", "chrome.exe"),
        ]);
        let blocklist = MemoryBlocklist::with(&[("chrome.exe", "Chrome")]);
        let (watcher, sink) = watcher_with(query, blocklist);

        watcher.inner.poll_cycle(true);
        assert_eq!(watcher.inner.state.lock().last_warned_executable, "chrome.exe");

        watcher.inner.poll_cycle(false);
        assert!(watcher.inner.state.lock().last_warned_executable.is_empty());

        watcher.inner.poll_cycle(false);
        assert_eq!(sink.count(EVENT_WARNING_DETECTED), 2);
    }

    #[test]
    fn test_blocklist_failure_is_fail_open() {
        let query = ScriptedQuery::new(vec![Step::Window("Chrome", "chrome.exe")]);
        let blocklist = MemoryBlocklist::with(&[("chrome.exe", "Chrome")]);
        blocklist.failing.store(true, Ordering::SeqCst);
        let (watcher, sink) = watcher_with(query, blocklist);

        drive(&watcher, 1);

        assert_eq!(sink.count(EVENT_WARNING_DETECTED), 0);
        assert_eq!(sink.count(EVENT_WINDOW_CHANGED), 1);
    }

    #[test]
    fn test_events_dropped_without_sink() {
        let query = ScriptedQuery::new(vec![
            Step::Window("Notepad", "notepad.exe"),
            Step::Window("Notepad", "notepad.exe"),
            Step::Window("Calc", "calc.exe"),
        ]);
        let (watcher, sink) = watcher_with(query, MemoryBlocklist::with(&[]));
        watcher.detach_sink();

        drive(&watcher, 2);
        assert!(sink.events().is_empty());
        // State still tracks the reported window
        assert_eq!(
            watcher.last_snapshot(),
            Some(WindowSnapshot::new("Notepad", "notepad.exe"))
        );

        // Dropped events are not replayed on attach
        watcher.attach_sink(sink.clone());
        watcher.inner.poll_cycle(false);
        assert_eq!(sink.events().len(), 1);
        assert_eq!(sink.events()[0].1["executable"], "calc.exe");
    }

    #[test]
    fn test_scenario_notepad_then_blocked_chrome() {
        let query = ScriptedQuery::new(vec![
            Step::Window("Notepad", "notepad.exe"),
            Step::Window("Notepad", "notepad.exe"),
            Step::Window("Chrome", "chrome.exe"),
        ]);
        let blocklist = MemoryBlocklist::with(&[("chrome.exe", "")]);
        let (watcher, sink) = watcher_with(query, blocklist);

        watcher.inner.poll_cycle(true);
        sink.0.lock().clear();
        assert_eq!(watcher.inner.poll_cycle(false), PollOutcome::Unchanged);
        assert_eq!(watcher.inner.poll_cycle(false), PollOutcome::Changed);

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].0, EVENT_WARNING_DETECTED);
        assert_eq!(events[0].1["displayName"], "chrome.exe");
        assert_eq!(events[1].0, EVENT_WINDOW_CHANGED);
        assert_eq!(events[1].1["title"], "Chrome");
    }

    #[test]
    fn test_get_active_window_is_fresh_query() {
        let query = ScriptedQuery::new(vec![
            Step::Window("Notepad", "notepad.exe"),
            Step::Window("Calc", "calc.exe"),
        ]);
        let (watcher, _sink) = watcher_with(query.clone(), MemoryBlocklist::with(&[]));

        watcher.inner.poll_cycle(true);
        let current = watcher.get_active_window().unwrap();

        assert_eq!(current, WindowSnapshot::new("Calc", "calc.exe"));
        assert_eq!(query.calls(), 2);
        // Cached state is unaffected by on-demand queries
        assert_eq!(
            watcher.last_snapshot(),
            Some(WindowSnapshot::new("Notepad", "notepad.exe"))
        );
    }

    #[test]
    fn test_get_active_window_without_window() {
        let query = ScriptedQuery::new(vec![Step::NoWindow, Step::Window("", "")]);
        let (watcher, _sink) = watcher_with(query, MemoryBlocklist::with(&[]));

        assert!(matches!(
            watcher.get_active_window(),
            Err(WatchError::NoForegroundWindow)
        ));
        assert!(matches!(
            watcher.get_active_window(),
            Err(WatchError::NoForegroundWindow)
        ));
    }

    #[test]
    fn test_stop_when_idle_is_noop() {
        let (watcher, _sink) = watcher_with(ScriptedQuery::new(vec![]), MemoryBlocklist::with(&[]));
        watcher.stop();
        watcher.stop();
        assert!(!watcher.is_running());
    }

    #[test]
    fn test_start_stop_emits_from_background_thread() {
        let query = Arc::new(FixedQuery(
            WindowSnapshot::new("Notepad", "notepad.exe"),
            AtomicUsize::new(0),
        ));
        let (watcher, sink) = watcher_with(query, MemoryBlocklist::with(&[]));

        watcher.start().unwrap();
        assert!(watcher.is_running());
        assert!(wait_until(Duration::from_secs(2), || {
            sink.count(EVENT_WINDOW_CHANGED) == 1
        }));

        watcher.stop();
        watcher.stop();
        assert!(!watcher.is_running());
        assert_eq!(sink.count(EVENT_WINDOW_CHANGED), 1);
    }

    #[test]
    fn test_stop_is_prompt_with_long_interval() {
        let query = Arc::new(FixedQuery(
            WindowSnapshot::new("Notepad", "notepad.exe"),
            AtomicUsize::new(0),
        ));
        let watcher = WindowWatcher::new(
            query.clone(),
            MemoryBlocklist::with(&[]),
            WatcherConfig {
                poll_interval: Duration::from_secs(5),
            },
        );

        watcher.start().unwrap();
        let started = Instant::now();
        watcher.stop();

        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(!watcher.is_running());
        assert_eq!(query.1.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_double_start_leaves_no_orphan_loop() {
        let query = Arc::new(FixedQuery(
            WindowSnapshot::new("Notepad", "notepad.exe"),
            AtomicUsize::new(0),
        ));
        let (watcher, _sink) = watcher_with(query.clone(), MemoryBlocklist::with(&[]));

        watcher.start().unwrap();
        assert!(matches!(watcher.start(), Err(WatchError::AlreadyRunning)));
        assert!(wait_until(Duration::from_secs(2), || {
            query.1.load(Ordering::SeqCst) >= 2
        }));

        watcher.stop();
        let polled = query.1.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(60));
        assert_eq!(query.1.load(Ordering::SeqCst), polled);
    }

    #[test]
    fn test_restart_reports_current_window_again() {
        let query = Arc::new(FixedQuery(
            WindowSnapshot::new("Notepad", "notepad.exe"),
            AtomicUsize::new(0),
        ));
        let (watcher, sink) = watcher_with(query, MemoryBlocklist::with(&[]));

        for expected in 1..=2 {
            watcher.start().unwrap();
            assert!(wait_until(Duration::from_secs(2), || {
                sink.count(EVENT_WINDOW_CHANGED) == expected
            }));
            watcher.stop();
        }
        assert_eq!(sink.count(EVENT_WINDOW_CHANGED), 2);
    }

    #[test]
    fn test_concurrent_start_stop_callers() {
        let query = Arc::new(FixedQuery(
            WindowSnapshot::new("Notepad", "notepad.exe"),
            AtomicUsize::new(0),
        ));
        let (watcher, _sink) = watcher_with(query.clone(), MemoryBlocklist::with(&[]));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let watcher = watcher.clone();
                thread::spawn(move || {
                    for _ in 0..20 {
                        if i % 2 == 0 {
                            let _ = watcher.start();
                        } else {
                            watcher.stop();
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        watcher.stop();
        assert!(!watcher.is_running());
        let polled = query.1.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(60));
        assert_eq!(query.1.load(Ordering::SeqCst), polled);
    }

    #[test]
    fn test_stop_from_sink_on_polling_thread() {
        struct StopOnEvent(Mutex<Option<WindowWatcher>>);

        impl NotificationSink for StopOnEvent {
            fn emit(&self, _event: &str, _payload: &serde_json::Value) {
                if let Some(watcher) = self.0.lock().take() {
                    watcher.stop();
                }
            }
        }

        let query = Arc::new(FixedQuery(
            WindowSnapshot::new("Notepad", "notepad.exe"),
            AtomicUsize::new(0),
        ));
        let (watcher, _sink) = watcher_with(query, MemoryBlocklist::with(&[]));
        watcher.attach_sink(Arc::new(StopOnEvent(Mutex::new(Some(watcher.clone())))));

        watcher.start().unwrap();
        assert!(wait_until(Duration::from_secs(2), || !watcher.is_running()));
    }
}
