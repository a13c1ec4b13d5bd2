//! Interference Signals
//!
//! A trial is only trustworthy if the host runtime did nothing disruptive
//! while it ran. The probe captures cumulative interference counters before
//! and after the timed region; any counter that moved marks the trial as
//! disturbed.
//!
//! The default [`RuntimeSignalProbe`] follows a structured text log the host
//! runtime appends to (for example a JVM started with
//! `-Xlog:gc,jit+compilation,class+load:file=gc.log`). Without a log, or
//! until a configured log first appears, every marker is unknown and unknown
//! never counts as interference.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Once};
use tracing::{debug, warn};

/// Kinds of runtime interference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterferenceKind {
    /// Garbage collection pause
    Gc,
    /// Just-in-time compilation
    Compilation,
    /// Class loading or unloading
    ClassLoading,
}

impl InterferenceKind {
    /// All kinds, in reporting order
    pub const ALL: [InterferenceKind; 3] = [
        InterferenceKind::Gc,
        InterferenceKind::Compilation,
        InterferenceKind::ClassLoading,
    ];

    fn index(self) -> usize {
        match self {
            InterferenceKind::Gc => 0,
            InterferenceKind::Compilation => 1,
            InterferenceKind::ClassLoading => 2,
        }
    }
}

impl std::fmt::Display for InterferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            InterferenceKind::Gc => "gc",
            InterferenceKind::Compilation => "compilation",
            InterferenceKind::ClassLoading => "class loading",
        })
    }
}

/// Cumulative interference counters at one point in time.
///
/// `None` means the counter is unknown on this host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InterferenceSnapshot {
    /// Garbage collection marker
    pub gc: Option<u64>,
    /// Compilation marker
    pub compilation: Option<u64>,
    /// Class loading marker
    pub class_loading: Option<u64>,
}

impl InterferenceSnapshot {
    /// Snapshot with every marker unknown
    pub const UNKNOWN: InterferenceSnapshot = InterferenceSnapshot {
        gc: None,
        compilation: None,
        class_loading: None,
    };

    /// Marker for one kind
    pub fn marker(&self, kind: InterferenceKind) -> Option<u64> {
        match kind {
            InterferenceKind::Gc => self.gc,
            InterferenceKind::Compilation => self.compilation,
            InterferenceKind::ClassLoading => self.class_loading,
        }
    }
}

/// Which kinds of interference a trial saw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Interference {
    /// A collection happened during the trial
    pub gc: bool,
    /// Code was compiled during the trial
    pub compilation: bool,
    /// Classes were loaded or unloaded during the trial
    pub class_loading: bool,
}

impl Interference {
    /// No interference
    pub const NONE: Interference = Interference {
        gc: false,
        compilation: false,
        class_loading: false,
    };

    /// Interference of a single kind
    pub fn only(kind: InterferenceKind) -> Self {
        let mut interference = Self::NONE;
        interference.set(kind);
        interference
    }

    /// Classify the difference between two snapshots
    pub fn between(
        probe: &dyn SignalProbe,
        before: &InterferenceSnapshot,
        after: &InterferenceSnapshot,
    ) -> Self {
        Self {
            gc: probe.occurred(before, after, InterferenceKind::Gc),
            compilation: probe.occurred(before, after, InterferenceKind::Compilation),
            class_loading: probe.occurred(before, after, InterferenceKind::ClassLoading),
        }
    }

    /// Whether the given kind was seen
    pub fn contains(&self, kind: InterferenceKind) -> bool {
        match kind {
            InterferenceKind::Gc => self.gc,
            InterferenceKind::Compilation => self.compilation,
            InterferenceKind::ClassLoading => self.class_loading,
        }
    }

    fn set(&mut self, kind: InterferenceKind) {
        match kind {
            InterferenceKind::Gc => self.gc = true,
            InterferenceKind::Compilation => self.compilation = true,
            InterferenceKind::ClassLoading => self.class_loading = true,
        }
    }

    /// True when nothing was seen
    pub fn is_clean(&self) -> bool {
        !(self.gc || self.compilation || self.class_loading)
    }
}

/// Source of interference counters
pub trait SignalProbe {
    /// Capture the current cumulative counters
    fn snapshot(&mut self) -> InterferenceSnapshot;

    /// Whether interference of `kind` happened between two snapshots.
    ///
    /// Only two known, differing markers report interference; a marker that
    /// is unknown on either side never does.
    fn occurred(
        &self,
        before: &InterferenceSnapshot,
        after: &InterferenceSnapshot,
        kind: InterferenceKind,
    ) -> bool {
        matches!(
            (before.marker(kind), after.marker(kind)),
            (Some(b), Some(a)) if b != a
        )
    }
}

// ─── Log patterns ────────────────────────────────────────────────────────────

/// Regexes classifying interference log lines
#[derive(Debug, Clone)]
pub struct LogPatterns {
    /// Lines reporting a collection
    pub gc: Regex,
    /// Lines reporting a compilation; `None` leaves compilation unknown
    pub compilation: Option<Regex>,
    /// Lines reporting class loading; `None` leaves class loading unknown
    pub class_loading: Option<Regex>,
}

/// Default pattern for collection lines (`[gc]`, `[gc,heap]`, `GC(12)`)
pub const DEFAULT_GC_PATTERN: &str = r"\[gc[,\]]|\bGC\(\d+\)";
/// Default pattern for compilation lines (`[jit]`, `[jit,compilation]`)
pub const DEFAULT_COMPILATION_PATTERN: &str = r"\[jit[,\]]";
/// Default pattern for class load/unload lines
pub const DEFAULT_CLASS_LOADING_PATTERN: &str = r"\[class,(?:load|unload)";

impl LogPatterns {
    /// Compile custom patterns
    pub fn new(
        gc: &str,
        compilation: Option<&str>,
        class_loading: Option<&str>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            gc: Regex::new(gc)?,
            compilation: compilation.map(Regex::new).transpose()?,
            class_loading: class_loading.map(Regex::new).transpose()?,
        })
    }
}

impl Default for LogPatterns {
    fn default() -> Self {
        static DEFAULTS: LazyLock<LogPatterns> = LazyLock::new(|| {
            LogPatterns::new(
                DEFAULT_GC_PATTERN,
                Some(DEFAULT_COMPILATION_PATTERN),
                Some(DEFAULT_CLASS_LOADING_PATTERN),
            )
            .unwrap_or_else(|e| unreachable!("default interference patterns are valid: {e}"))
        });
        DEFAULTS.clone()
    }
}

// ─── Interference log ────────────────────────────────────────────────────────

/// Incremental reader of an interference log.
///
/// Counts matching lines since the reader was opened. Only complete lines are
/// classified; a trailing partial line waits for the next refresh. Markers
/// stay unknown until the file has been read once.
#[derive(Debug)]
pub struct InterferenceLog {
    path: PathBuf,
    patterns: LogPatterns,
    offset: u64,
    pending: String,
    counts: [u64; 3],
    present: bool,
}

impl InterferenceLog {
    /// Follow the log at `path` using the default patterns.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::with_patterns(path, LogPatterns::default())
    }

    /// Follow the log at `path` using custom patterns.
    pub fn with_patterns(path: impl Into<PathBuf>, patterns: LogPatterns) -> Self {
        Self {
            path: path.into(),
            patterns,
            offset: 0,
            pending: String::new(),
            counts: [0; 3],
            present: false,
        }
    }

    /// Path being followed
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the log has been read successfully at least once
    pub fn is_present(&self) -> bool {
        self.present
    }

    /// Read whatever was appended since the last refresh.
    ///
    /// A log that does not exist yet is not an error; it leaves the markers
    /// as they were.
    pub fn refresh(&mut self) -> std::io::Result<()> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };
        self.read_appended(&mut file)?;
        self.present = true;
        Ok(())
    }

    fn read_appended(&mut self, file: &mut File) -> std::io::Result<()> {
        let len = file.metadata()?.len();
        if len < self.offset {
            debug!(path = %self.path.display(), "interference log truncated, rereading");
            self.offset = 0;
            self.pending.clear();
        }

        file.seek(SeekFrom::Start(self.offset))?;
        let mut appended = Vec::with_capacity((len - self.offset) as usize);
        file.read_to_end(&mut appended)?;
        self.offset += appended.len() as u64;
        self.pending.push_str(&String::from_utf8_lossy(&appended));

        let complete = match self.pending.rfind('\n') {
            Some(idx) => idx + 1,
            None => return Ok(()),
        };
        let lines: String = self.pending.drain(..complete).collect();
        for line in lines.lines() {
            self.classify(line);
        }
        Ok(())
    }

    fn classify(&mut self, line: &str) {
        if self.patterns.gc.is_match(line) {
            self.counts[InterferenceKind::Gc.index()] += 1;
        }
        if let Some(re) = &self.patterns.compilation {
            if re.is_match(line) {
                self.counts[InterferenceKind::Compilation.index()] += 1;
            }
        }
        if let Some(re) = &self.patterns.class_loading {
            if re.is_match(line) {
                self.counts[InterferenceKind::ClassLoading.index()] += 1;
            }
        }
    }

    /// Current markers
    pub fn markers(&self) -> InterferenceSnapshot {
        if !self.present {
            return InterferenceSnapshot::UNKNOWN;
        }
        InterferenceSnapshot {
            gc: Some(self.counts[InterferenceKind::Gc.index()]),
            compilation: self
                .patterns
                .compilation
                .as_ref()
                .map(|_| self.counts[InterferenceKind::Compilation.index()]),
            class_loading: self
                .patterns
                .class_loading
                .as_ref()
                .map(|_| self.counts[InterferenceKind::ClassLoading.index()]),
        }
    }
}

// ─── RuntimeSignalProbe ──────────────────────────────────────────────────────

static DETECTION_DISABLED_WARNING: Once = Once::new();

/// Probe backed by the host runtime's interference log
#[derive(Debug)]
pub struct RuntimeSignalProbe {
    log: Option<InterferenceLog>,
    missing_reported: bool,
    read_error_reported: bool,
}

impl RuntimeSignalProbe {
    /// Probe following `log`, or a degraded probe when `log` is `None`.
    ///
    /// The degraded probe reports every marker as unknown and emits a single
    /// process-wide warning.
    pub fn new(log: Option<InterferenceLog>) -> Self {
        if log.is_none() {
            DETECTION_DISABLED_WARNING.call_once(|| {
                warn!(
                    "no interference log configured; GC detection is disabled and \
                     collections during trials will go unnoticed"
                );
            });
        }
        Self {
            log,
            missing_reported: false,
            read_error_reported: false,
        }
    }

    /// Probe following the log at `path` with the default patterns
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(Some(InterferenceLog::open(path)))
    }

    /// Whether GC detection is available: a log is configured and has been read
    pub fn detects_gc(&self) -> bool {
        self.log.as_ref().is_some_and(InterferenceLog::is_present)
    }
}

impl SignalProbe for RuntimeSignalProbe {
    /// Refresh the log and return its markers.
    ///
    /// A missing log is reported once per probe. A failing read is reported
    /// once until the log reads cleanly again.
    fn snapshot(&mut self) -> InterferenceSnapshot {
        let Some(log) = self.log.as_mut() else {
            return InterferenceSnapshot::UNKNOWN;
        };
        match log.refresh() {
            Ok(()) => {
                self.read_error_reported = false;
                if !log.is_present() && !self.missing_reported {
                    self.missing_reported = true;
                    warn!(
                        path = %log.path().display(),
                        "interference log not found; GC detection is disabled until it appears"
                    );
                }
            }
            Err(e) => {
                if !self.read_error_reported {
                    self.read_error_reported = true;
                    warn!(
                        path = %log.path().display(),
                        error = %e,
                        "failed to read interference log"
                    );
                }
            }
        }
        log.markers()
    }
}

/// Find the interference log in host runtime startup flags.
///
/// Recognizes unified logging (`-Xlog:gc*:file=path`, `-Xlog:gc:path`) and
/// the legacy `-Xloggc:path` flag. The first match wins.
pub fn discover_log_path<I, S>(args: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    static UNIFIED: LazyLock<Option<Regex>> =
        LazyLock::new(|| Regex::new(r"^-Xlog:gc[^:]*:(?:file=)?([^:\s]+)").ok());
    static LEGACY: LazyLock<Option<Regex>> =
        LazyLock::new(|| Regex::new(r"^-Xloggc:(\S+)").ok());

    args.into_iter().find_map(|arg| {
        let arg = arg.as_ref();
        [&*UNIFIED, &*LEGACY]
            .into_iter()
            .flatten()
            .find_map(|re| re.captures(arg))
            .and_then(|caps| caps.get(1))
            .map(|m| PathBuf::from(m.as_str().trim_matches('"')))
    })
}

// ─── ScriptedProbe ───────────────────────────────────────────────────────────

/// Deterministic probe that replays a script of per-trial verdicts.
///
/// Each trial takes a "before" and an "after" snapshot; the "after" snapshot
/// bumps the counters named by the next scripted verdict. Once the script is
/// exhausted every further trial is clean.
#[derive(Debug, Default, Clone)]
pub struct ScriptedProbe {
    script: VecDeque<Interference>,
    counters: [u64; 3],
    snapshots: u64,
}

impl ScriptedProbe {
    /// Probe replaying `script`, one entry per trial
    pub fn new(script: impl IntoIterator<Item = Interference>) -> Self {
        Self {
            script: script.into_iter().collect(),
            counters: [0; 3],
            snapshots: 0,
        }
    }

    /// Append `count` trials disturbed by `kind`
    pub fn then(mut self, kind: InterferenceKind, count: usize) -> Self {
        self.script
            .extend(std::iter::repeat_n(Interference::only(kind), count));
        self
    }

    /// Append `count` clean trials
    pub fn then_clean(mut self, count: usize) -> Self {
        self.script
            .extend(std::iter::repeat_n(Interference::NONE, count));
        self
    }

    /// Number of snapshots taken so far
    pub fn snapshots_taken(&self) -> u64 {
        self.snapshots
    }

    /// Verdicts not yet consumed
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl SignalProbe for ScriptedProbe {
    fn snapshot(&mut self) -> InterferenceSnapshot {
        self.snapshots += 1;
        let is_after = self.snapshots % 2 == 0;
        if is_after {
            if let Some(verdict) = self.script.pop_front() {
                for kind in InterferenceKind::ALL {
                    if verdict.contains(kind) {
                        self.counters[kind.index()] += 1;
                    }
                }
            }
        }
        InterferenceSnapshot {
            gc: Some(self.counters[0]),
            compilation: Some(self.counters[1]),
            class_loading: Some(self.counters[2]),
        }
    }
}
