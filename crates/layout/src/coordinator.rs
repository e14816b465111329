//! Defer a layout pass until every node has a measured size.
//!
//! ```text
//! Collecting ──(last node reports)──> Ready ──(callback runs)──> Done
//! ```
//!
//! Reports may arrive from any thread in any order. The first valid size per node is kept,
//! later ones are ignored. The ready callback runs exactly once, outside the internal lock.

use crate::geometry::Size;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Measured sizes handed to the ready callback
pub type MeasuredSizes = HashMap<String, Size>;

type ReadyCallback = Box<dyn FnOnce(MeasuredSizes) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Collecting,
    Ready,
    Done,
}

/// What happened to a size report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// First valid size for the node
    Recorded,
    /// Width or height not positive; the node stays unmeasured
    Degenerate,
    /// The node already reported a size
    AlreadyReported,
    /// The node was never registered
    UnknownNode,
}

struct Inner {
    phase: Phase,
    sizes: HashMap<String, Option<Size>>,
    reported: usize,
    callback: Option<ReadyCallback>,
    layout_performed: bool,
}

impl Inner {
    fn all_reported(&self) -> bool {
        self.reported == self.sizes.len()
    }

    fn measured(&self) -> MeasuredSizes {
        self.sizes
            .iter()
            .filter_map(|(id, size)| size.map(|size| (id.clone(), size)))
            .collect()
    }

    /// Move to Done and hand back the callback with its input, if a pass is due
    fn take_pass(&mut self) -> Option<(ReadyCallback, MeasuredSizes)> {
        if self.phase != Phase::Ready || self.layout_performed {
            return None;
        }
        let callback = self.callback.take()?;
        self.layout_performed = true;
        self.phase = Phase::Done;
        Some((callback, self.measured()))
    }
}

pub struct GeometryCoordinator {
    inner: Mutex<Inner>,
}

impl GeometryCoordinator {
    /// Register every participating node as "size unknown".
    ///
    /// With no nodes the coordinator is Ready immediately.
    pub fn new<I, S>(nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sizes: HashMap<String, Option<Size>> =
            nodes.into_iter().map(|id| (id.into(), None)).collect();
        let phase = if sizes.is_empty() {
            Phase::Ready
        } else {
            Phase::Collecting
        };

        Self {
            inner: Mutex::new(Inner {
                phase,
                sizes,
                reported: 0,
                callback: None,
                layout_performed: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    pub fn node_count(&self) -> usize {
        self.lock().sizes.len()
    }

    /// Nodes that have reported a valid size so far
    pub fn reported_count(&self) -> usize {
        self.lock().reported
    }

    /// Record a node's size. Completing the set fires the ready callback if one is registered.
    pub fn report_size(&self, id: &str, size: Size) -> ReportOutcome {
        let (outcome, pass) = {
            let mut inner = self.lock();
            let outcome = match inner.sizes.get_mut(id) {
                None => ReportOutcome::UnknownNode,
                Some(Some(_)) => ReportOutcome::AlreadyReported,
                Some(slot) if size.is_measured() => {
                    *slot = Some(size);
                    ReportOutcome::Recorded
                }
                Some(_) => ReportOutcome::Degenerate,
            };

            if outcome == ReportOutcome::Recorded {
                inner.reported += 1;
                if inner.phase == Phase::Collecting && inner.all_reported() {
                    inner.phase = Phase::Ready;
                    log::debug!("All {} nodes measured", inner.sizes.len());
                }
            }
            (outcome, inner.take_pass())
        };

        if outcome != ReportOutcome::Recorded {
            log::debug!("Size report for {id} ignored: {outcome:?}");
        }
        if let Some((callback, sizes)) = pass {
            callback(sizes);
        }
        outcome
    }

    /// Register the layout pass. Runs it at once when every node has already reported.
    ///
    /// A callback registered after the pass has run is dropped.
    pub fn on_ready<F>(&self, callback: F)
    where
        F: FnOnce(MeasuredSizes) + Send + 'static,
    {
        let pass = {
            let mut inner = self.lock();
            if inner.layout_performed {
                log::debug!("Layout already performed; ignoring ready callback");
                return;
            }
            inner.callback = Some(Box::new(callback));
            inner.take_pass()
        };

        if let Some((callback, sizes)) = pass {
            callback(sizes);
        }
    }

    /// Ask for the layout pass. Only does something while Ready with a callback registered;
    /// returns whether the pass ran.
    pub fn request_layout(&self) -> bool {
        let pass = self.lock().take_pass();
        match pass {
            Some((callback, sizes)) => {
                callback(sizes);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting(coordinator: &GeometryCoordinator) -> Arc<AtomicUsize> {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        coordinator.on_ready(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        fired
    }

    #[test]
    fn fires_once_when_last_node_reports() {
        let coordinator = GeometryCoordinator::new(["A", "B"]);
        let fired = counting(&coordinator);

        assert_eq!(
            coordinator.report_size("A", Size::new(10.0, 10.0)),
            ReportOutcome::Recorded
        );
        assert_eq!(coordinator.phase(), Phase::Collecting);
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        coordinator.report_size("B", Size::new(20.0, 5.0));
        assert_eq!(coordinator.phase(), Phase::Done);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn duplicate_and_late_reports_do_not_refire() {
        let coordinator = GeometryCoordinator::new(["A"]);
        let fired = counting(&coordinator);

        coordinator.report_size("A", Size::new(10.0, 10.0));
        assert_eq!(
            coordinator.report_size("A", Size::new(99.0, 99.0)),
            ReportOutcome::AlreadyReported
        );
        assert!(!coordinator.request_layout());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn degenerate_sizes_are_not_reports() {
        let coordinator = GeometryCoordinator::new(["A"]);
        let fired = counting(&coordinator);

        assert_eq!(
            coordinator.report_size("A", Size::new(0.0, 10.0)),
            ReportOutcome::Degenerate
        );
        assert_eq!(
            coordinator.report_size("Z", Size::new(10.0, 10.0)),
            ReportOutcome::UnknownNode
        );
        assert_eq!(coordinator.phase(), Phase::Collecting);
        assert_eq!(coordinator.reported_count(), 0);

        coordinator.report_size("A", Size::new(5.0, 10.0));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn first_valid_size_wins() {
        let coordinator = GeometryCoordinator::new(["A"]);
        coordinator.report_size("A", Size::new(10.0, 20.0));
        coordinator.report_size("A", Size::new(30.0, 40.0));

        let seen = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&seen);
        coordinator.on_ready(move |sizes| {
            *slot.lock().unwrap() = sizes.get("A").copied();
        });

        assert_eq!(*seen.lock().unwrap(), Some(Size::new(10.0, 20.0)));
    }

    #[test]
    fn ready_without_callback_waits_for_registration() {
        let coordinator = GeometryCoordinator::new(["A"]);
        coordinator.report_size("A", Size::new(1.0, 1.0));
        assert_eq!(coordinator.phase(), Phase::Ready);
        assert!(!coordinator.request_layout());

        let fired = counting(&coordinator);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(coordinator.phase(), Phase::Done);

        // a second registration after the pass is dropped
        let again = counting(&coordinator);
        assert_eq!(again.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn request_while_collecting_is_a_noop() {
        let coordinator = GeometryCoordinator::new(["A", "B"]);
        let fired = counting(&coordinator);
        assert!(!coordinator.request_layout());
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn no_nodes_means_ready_immediately() {
        let coordinator = GeometryCoordinator::new(Vec::<String>::new());
        assert_eq!(coordinator.phase(), Phase::Ready);
        let fired = counting(&coordinator);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_reports_fire_exactly_once() {
        let ids: Vec<String> = (0..64).map(|i| format!("n{i}")).collect();
        let coordinator = Arc::new(GeometryCoordinator::new(ids.clone()));
        let fired = counting(&coordinator);

        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let coordinator = Arc::clone(&coordinator);
                let ids = ids.clone();
                std::thread::spawn(move || {
                    // every worker reports every node; only the first per node counts
                    for id in ids.iter().cycle().skip(worker * 16).take(ids.len()) {
                        coordinator.report_size(id, Size::new(10.0, 10.0));
                        coordinator.request_layout();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(coordinator.reported_count(), 64);
        assert_eq!(coordinator.phase(), Phase::Done);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
