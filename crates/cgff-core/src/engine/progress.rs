use super::validator::ResolutionTally;

/// Events emitted while a force field is normalized.
///
/// Kinds are reported one after another in document order. Every `KindStart` is
/// followed by one `EntryResolved` per entry and a closing `KindFinish`, unless
/// normalization fails part way.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    BeadTypesDeclared {
        count: usize,
    },
    KindStart {
        kind: String,
        entries: usize,
    },
    /// One entry was expanded and each of its instances resolved against the
    /// definitions seen so far.
    EntryResolved {
        kind: String,
        entry: usize,
        tally: ResolutionTally,
    },
    KindFinish {
        kind: String,
        tally: ResolutionTally,
    },
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn reporter_without_callback_ignores_events() {
        ProgressReporter::new().report(Progress::BeadTypesDeclared { count: 2 });
    }

    #[test]
    fn reporter_forwards_events_in_order() {
        let seen = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event: Progress| {
            seen.lock().unwrap().push(event);
        }));
        let tally = ResolutionTally {
            inserted: 3,
            ..Default::default()
        };
        reporter.report(Progress::KindStart {
            kind: "gaussian".into(),
            entries: 1,
        });
        reporter.report(Progress::KindFinish {
            kind: "gaussian".into(),
            tally,
        });
        drop(reporter);

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(matches!(&seen[0], Progress::KindStart { entries: 1, .. }));
        assert_eq!(
            seen[1],
            Progress::KindFinish {
                kind: "gaussian".into(),
                tally
            }
        );
    }
}
