// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Single-flight recompile scheduler.
//!
//! The scheduler owns the three pieces of shared dev-server state:
//!
//! - the [`Broadcaster`] with every connected session
//! - the guard that keeps compiles from overlapping
//! - the last published [`RouteTable`]
//!
//! A cycle announces `recompiling`, runs the compiler on a blocking thread,
//! then either publishes the new table and announces `reload`, or logs the
//! failure and leaves clients on the previous build.
//!
//! Triggers that arrive while a cycle is running are coalesced: the most
//! recent one is remembered and exactly one follow-up cycle runs once the
//! active cycle ends.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::compiler::{CompileReport, Compiler};
use crate::error::CompileResult;
use crate::reload::{Broadcaster, ReloadEvent, SessionId};
use crate::route::RouteTable;

/// Something that can run a full compile pass.
pub trait Recompile: Send + Sync + 'static {
    /// Runs one pass. Called from a blocking thread.
    fn recompile(&self) -> CompileResult<CompileReport>;
}

impl Recompile for Compiler {
    fn recompile(&self) -> CompileResult<CompileReport> {
        self.compile()
    }
}

/// Whether a compile is currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No compile running.
    Idle,
    /// A compile cycle is running.
    Recompiling,
}

/// Outcome of a single compile cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStatus {
    /// The cycle is still running.
    Running,
    /// The compile succeeded and `reload` was announced.
    Succeeded,
    /// The compile failed; no `reload` was announced.
    Failed,
}

/// Record of one watch-triggered compile.
#[derive(Debug, Clone)]
pub struct CompileCycle {
    /// When the cycle started.
    pub started_at: Instant,
    /// File whose change triggered the cycle.
    pub trigger_file: String,
    /// Current status.
    pub status: CycleStatus,
    /// Files transformed or copied.
    pub file_count: usize,
    /// Files skipped.
    pub skipped_count: usize,
    /// Failure message, if the cycle failed.
    pub error: Option<String>,
    /// Wall time, once finished.
    pub duration: Option<Duration>,
}

impl CompileCycle {
    fn start(trigger_file: String) -> Self {
        Self {
            started_at: Instant::now(),
            trigger_file,
            status: CycleStatus::Running,
            file_count: 0,
            skipped_count: 0,
            error: None,
            duration: None,
        }
    }

    fn finish(&mut self, result: &Result<CompileReport, String>) {
        match result {
            Ok(report) => {
                self.status = CycleStatus::Succeeded;
                self.file_count = report.stats.files;
                self.skipped_count = report.stats.skipped;
            }
            Err(message) => {
                self.status = CycleStatus::Failed;
                self.error = Some(message.clone());
            }
        }
        self.duration = Some(self.started_at.elapsed());
    }
}

/// What happened to a trigger.
#[derive(Debug, Clone)]
pub enum TriggerOutcome {
    /// This call ran one or more cycles; the last entry is the most recent.
    Ran(Vec<CompileCycle>),
    /// A cycle was already running; the trigger was queued for a follow-up.
    Coalesced,
}

#[derive(Debug, Default)]
struct Flight {
    running: bool,
    pending: Option<String>,
}

/// Clears the flight if a trigger future is dropped mid-cycle.
///
/// A compile already handed to the blocking pool keeps running; the
/// scheduler's compile lock keeps the next one waiting until it ends.
struct FlightReset<'a> {
    flight: &'a Mutex<Flight>,
    armed: bool,
}

impl Drop for FlightReset<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut flight = self.flight.lock();
            flight.running = false;
            flight.pending = None;
        }
    }
}

/// Drives compile cycles and the live-reload broadcaster.
pub struct RecompileScheduler {
    compiler: Arc<dyn Recompile>,
    broadcaster: Broadcaster,
    routes: RwLock<Arc<RouteTable>>,
    flight: Mutex<Flight>,
    compile_lock: Arc<Mutex<()>>,
    last_cycle: Mutex<Option<CompileCycle>>,
}

impl std::fmt::Debug for RecompileScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecompileScheduler")
            .field("state", &self.state())
            .field("broadcaster", &self.broadcaster)
            .field("routes", &self.routes.read().len())
            .finish()
    }
}

impl RecompileScheduler {
    /// Creates a scheduler that publishes `routes` until the first cycle.
    pub fn new(compiler: Arc<dyn Recompile>, routes: RouteTable) -> Self {
        Self {
            compiler,
            broadcaster: Broadcaster::new(),
            routes: RwLock::new(Arc::new(routes)),
            flight: Mutex::new(Flight::default()),
            compile_lock: Arc::new(Mutex::new(())),
            last_cycle: Mutex::new(None),
        }
    }

    /// The broadcaster holding connected sessions.
    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// Registers a channel-backed live-reload session.
    pub fn subscribe(&self) -> (SessionId, tokio::sync::mpsc::Receiver<ReloadEvent>) {
        self.broadcaster.subscribe()
    }

    /// The last published route table.
    ///
    /// Tables are replaced whole, so a reader sees either the previous or
    /// the next table, never a partial one.
    pub fn routes(&self) -> Arc<RouteTable> {
        self.routes.read().clone()
    }

    /// The most recently finished cycle.
    pub fn last_cycle(&self) -> Option<CompileCycle> {
        self.last_cycle.lock().clone()
    }

    /// Whether a cycle is in flight.
    pub fn state(&self) -> SchedulerState {
        if self.flight.lock().running {
            SchedulerState::Recompiling
        } else {
            SchedulerState::Idle
        }
    }

    /// Handles a relevant file change.
    ///
    /// Runs a cycle now, or queues it behind the running one. Compile
    /// failures are logged and recorded in the returned cycle; they never
    /// surface as errors here, so a watcher loop can keep going.
    pub async fn trigger(&self, file: impl Into<String>) -> TriggerOutcome {
        let file = file.into();
        {
            let mut flight = self.flight.lock();
            if flight.running {
                tracing::debug!("Compile in flight, queueing {}", file);
                flight.pending = Some(file);
                return TriggerOutcome::Coalesced;
            }
            flight.running = true;
        }

        let mut reset = FlightReset {
            flight: &self.flight,
            armed: true,
        };
        let mut cycles = Vec::new();
        let mut next = file;

        loop {
            cycles.push(self.run_cycle(next).await);

            let mut flight = self.flight.lock();
            match flight.pending.take() {
                Some(pending) => next = pending,
                None => {
                    flight.running = false;
                    reset.armed = false;
                    break;
                }
            }
        }

        TriggerOutcome::Ran(cycles)
    }

    async fn run_cycle(&self, trigger_file: String) -> CompileCycle {
        tracing::info!("File changed: {}", trigger_file);
        let mut cycle = CompileCycle::start(trigger_file);

        self.broadcaster.announce(&ReloadEvent::Recompiling);

        let compiler = self.compiler.clone();
        let compile_lock = self.compile_lock.clone();
        let compile = move || {
            let _guard = compile_lock.lock();
            compiler.recompile()
        };
        let result = match tokio::task::spawn_blocking(compile).await {
            Ok(Ok(report)) => Ok(report),
            Ok(Err(e)) => Err(e.to_string()),
            Err(e) => Err(format!("compile task failed: {}", e)),
        };

        cycle.finish(&result);
        match result {
            Ok(report) => {
                *self.routes.write() = Arc::new(report.routes);
                let delivered = self.broadcaster.announce(&ReloadEvent::Reload {
                    file: cycle.trigger_file.clone(),
                });
                tracing::info!(
                    "Recompiled {} file(s) in {}ms, reloading {} client(s)",
                    cycle.file_count,
                    report.duration.as_millis(),
                    delivered
                );
            }
            Err(message) => {
                tracing::error!("Recompilation failed: {}", message);
            }
        }

        *self.last_cycle.lock() = Some(cycle.clone());
        cycle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::CompileStats;
    use crate::error::CompileError;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Fake compiler that sleeps, counts calls and tracks overlap.
    #[derive(Default)]
    struct FakeCompiler {
        calls: AtomicUsize,
        active: AtomicUsize,
        max_active: AtomicUsize,
        fail: bool,
        delay_ms: u64,
    }

    impl Recompile for FakeCompiler {
        fn recompile(&self) -> CompileResult<CompileReport> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(self.delay_ms));
            self.active.fetch_sub(1, Ordering::SeqCst);

            if self.fail {
                return Err(CompileError::Transform {
                    path: PathBuf::from("pages/b.jsx"),
                    message: "Unexpected token".to_string(),
                });
            }
            Ok(CompileReport {
                stats: CompileStats { files: 3, skipped: 1 },
                routes: RouteTable::default(),
                router: None,
                duration: Duration::from_millis(self.delay_ms),
            })
        }
    }

    fn drain(rx: &mut tokio::sync::mpsc::Receiver<ReloadEvent>) -> Vec<ReloadEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_successful_cycle_announces_in_order() {
        let scheduler = RecompileScheduler::new(Arc::new(FakeCompiler::default()), RouteTable::default());
        let (_, mut rx) = scheduler.subscribe();

        let outcome = scheduler.trigger("pages/a.jsx").await;
        let TriggerOutcome::Ran(cycles) = outcome else {
            panic!("expected the trigger to run");
        };
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].status, CycleStatus::Succeeded);
        assert_eq!(cycles[0].file_count, 3);
        assert_eq!(cycles[0].skipped_count, 1);

        assert_eq!(
            drain(&mut rx),
            vec![
                ReloadEvent::Recompiling,
                ReloadEvent::Reload { file: "pages/a.jsx".to_string() },
            ]
        );
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[tokio::test]
    async fn test_failed_cycle_never_reloads() {
        let compiler = FakeCompiler {
            fail: true,
            ..Default::default()
        };
        let scheduler = RecompileScheduler::new(Arc::new(compiler), RouteTable::default());
        let (_, mut rx) = scheduler.subscribe();

        let TriggerOutcome::Ran(cycles) = scheduler.trigger("pages/b.jsx").await else {
            panic!("expected the trigger to run");
        };
        assert_eq!(cycles[0].status, CycleStatus::Failed);
        assert!(cycles[0].error.as_deref().unwrap().contains("pages/b.jsx"));
        assert_eq!(drain(&mut rx), vec![ReloadEvent::Recompiling]);
        assert_eq!(scheduler.last_cycle().unwrap().status, CycleStatus::Failed);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[tokio::test]
    async fn test_overlapping_triggers_coalesce() {
        let compiler = Arc::new(FakeCompiler {
            delay_ms: 150,
            ..Default::default()
        });
        let scheduler = Arc::new(RecompileScheduler::new(compiler.clone(), RouteTable::default()));

        let first = {
            let scheduler = scheduler.clone();
            tokio::spawn(async move { scheduler.trigger("a.jsx").await })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(scheduler.state(), SchedulerState::Recompiling);

        assert!(matches!(scheduler.trigger("b.jsx").await, TriggerOutcome::Coalesced));
        assert!(matches!(scheduler.trigger("c.jsx").await, TriggerOutcome::Coalesced));

        let TriggerOutcome::Ran(cycles) = first.await.unwrap() else {
            panic!("expected the first trigger to run");
        };
        let triggers: Vec<&str> = cycles.iter().map(|c| c.trigger_file.as_str()).collect();
        assert_eq!(triggers, vec!["a.jsx", "c.jsx"]);
        assert_eq!(compiler.calls.load(Ordering::SeqCst), 2);
        assert_eq!(compiler.max_active.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[tokio::test]
    async fn test_dropped_trigger_does_not_overlap_next_compile() {
        let compiler = Arc::new(FakeCompiler {
            delay_ms: 300,
            ..Default::default()
        });
        let scheduler = RecompileScheduler::new(compiler.clone(), RouteTable::default());

        let dropped =
            tokio::time::timeout(Duration::from_millis(50), scheduler.trigger("a.jsx")).await;
        assert!(dropped.is_err());
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        let TriggerOutcome::Ran(cycles) = scheduler.trigger("b.jsx").await else {
            panic!("expected the trigger to run");
        };
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].status, CycleStatus::Succeeded);
        assert_eq!(compiler.calls.load(Ordering::SeqCst), 2);
        assert_eq!(compiler.max_active.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_success_publishes_routes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src/pages")).unwrap();
        std::fs::write(dir.path().join("src/pages/index.js"), "").unwrap();

        let compiler = Compiler::for_project(
            dir.path(),
            Arc::new(|s: &str, _: crate::transform::Loader| {
                Ok::<_, crate::transform::TransformError>(s.to_string())
            }),
        );
        let scheduler = RecompileScheduler::new(Arc::new(compiler), RouteTable::default());
        assert!(scheduler.routes().is_empty());

        let before = scheduler.routes();
        scheduler.trigger("pages/index.js").await;
        assert!(before.is_empty());
        assert_eq!(scheduler.routes().len(), 1);
        assert!(scheduler.routes().match_path("/").is_some());
    }
}
