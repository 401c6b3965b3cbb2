use cgff::engine::progress::{Progress, ProgressCallback};
use cgff::engine::validator::ResolutionTally;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Draws one bar per potential kind while entries are resolved, and keeps a
/// per-kind summary of what the conflict policy did with repeated definitions.
#[derive(Clone)]
pub struct CliProgressHandler {
    state: Arc<Mutex<KindProgress>>,
}

struct KindProgress {
    bar: ProgressBar,
    /// Outcomes of the kind currently being resolved.
    running: ResolutionTally,
    summaries: Vec<String>,
}

impl KindProgress {
    fn handle(&mut self, event: Progress) {
        match event {
            Progress::BeadTypesDeclared { count } => {
                self.bar.set_message(format!("{} bead type(s) declared", count));
            }
            Progress::KindStart { kind, entries } => {
                self.running = ResolutionTally::default();
                self.bar.reset();
                self.bar.set_style(kind_style());
                self.bar.set_length(entries as u64);
                self.bar.set_prefix(kind);
                self.bar.set_message("");
            }
            Progress::EntryResolved { tally, .. } => {
                self.running.add(&tally);
                self.bar.inc(1);
                self.bar.set_message(outcome_summary(&self.running));
            }
            Progress::KindFinish { kind, tally } => {
                self.bar.finish_and_clear();
                self.summaries
                    .push(format!("{}: {}", kind, outcome_summary(&tally)));
            }
        }
    }
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr());
        bar.finish_and_clear();
        Self {
            state: Arc::new(Mutex::new(KindProgress {
                bar,
                running: ResolutionTally::default(),
                summaries: Vec::new(),
            })),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let state = self.state.clone();
        Box::new(move |event: Progress| match state.lock() {
            Ok(mut state) => state.handle(event),
            Err(_) => warn!("Progress state mutex was poisoned; dropping {:?}.", event),
        })
    }

    /// One line per finished kind, e.g. `gaussian: 8 instance(s), 1 replaced`.
    pub fn summaries(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|state| state.summaries.clone())
            .unwrap_or_default()
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Instance count followed by the non-zero policy outcomes.
fn outcome_summary(tally: &ResolutionTally) -> String {
    let mut summary = format!("{} instance(s)", tally.instances());
    for (count, outcome) in [
        (tally.kept, "identical kept"),
        (tally.replaced, "replaced"),
        (tally.layered, "layered"),
    ] {
        if count > 0 {
            summary.push_str(&format!(", {} {}", count, outcome));
        }
    }
    summary
}

/// A bar counting files, used when several inputs are processed in one run.
pub fn file_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stderr())
        .with_style(file_style());
    pb.set_message("Checking files");
    pb
}

fn kind_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:>24.bold} [{bar:30.cyan/blue}] {pos}/{len} entries {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

fn file_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg:<16} [{bar:30.green}] {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}
