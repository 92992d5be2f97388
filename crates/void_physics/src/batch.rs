//! Deferred line traces resolved in one batch per frame
//!
//! Callers enqueue segment traces at any point during the frame. At the
//! frame's flush point the whole queue is traced in one go (fanned out on the
//! rayon pool for large batches) and each answer is handed back to its
//! receiver in enqueue order. Every caller therefore sees exactly one frame of
//! latency.

use crate::config::QueryConfig;
use crate::error::Result;
use crate::trace::GroundTracer;
use crossbeam_channel::{Receiver, Sender};
use glam::Vec3;
use rayon::prelude::*;

/// A pending segment trace
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryRequest<R> {
    /// Segment start
    pub origin: Vec3,
    /// Segment end
    pub target: Vec3,
    /// Layers the trace may hit
    pub mask: u32,
    /// Who gets the answer
    pub receiver: R,
    /// Caller-chosen tag echoed back in the result
    pub request_id: u64,
}

/// Answer to a [`QueryRequest`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryResult {
    pub request_id: u64,
    pub hit: bool,
    /// Hit point, or the segment target when nothing was hit
    pub point: Vec3,
    /// Surface normal, zero when nothing was hit
    pub normal: Vec3,
}

impl QueryResult {
    fn resolve<R, T: GroundTracer + ?Sized>(tracer: &T, request: &QueryRequest<R>) -> Self {
        match tracer.trace_segment(request.origin, request.target, request.mask) {
            Some(hit) => Self {
                request_id: request.request_id,
                hit: true,
                point: hit.point,
                normal: hit.normal,
            },
            None => Self {
                request_id: request.request_id,
                hit: false,
                point: request.target,
                normal: Vec3::ZERO,
            },
        }
    }
}

/// Receives flushed results.
///
/// Returning `false` means the receiver no longer exists; the result is
/// dropped and counted as skipped.
pub trait ResultDispatch<R> {
    fn deliver(&mut self, receiver: R, result: &QueryResult) -> bool;
}

impl<R, F> ResultDispatch<R> for F
where
    F: FnMut(R, &QueryResult) -> bool,
{
    fn deliver(&mut self, receiver: R, result: &QueryResult) -> bool {
        self(receiver, result)
    }
}

/// What one flush did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushStats {
    /// Traces executed
    pub traced: usize,
    /// Results accepted by a live receiver
    pub delivered: usize,
    /// Results whose receiver had disappeared
    pub skipped: usize,
    /// Whether the batch ran on the rayon pool
    pub parallel: bool,
}

/// Sending half for enqueueing from other threads.
///
/// Staged requests join the queue at the start of the next flush, after every
/// request enqueued directly on the scheduler.
#[derive(Debug, Clone)]
pub struct QueryStager<R> {
    sender: Sender<QueryRequest<R>>,
}

impl<R> QueryStager<R> {
    /// Stage a segment trace
    pub fn enqueue(&self, origin: Vec3, target: Vec3, mask: u32, receiver: R, request_id: u64) {
        // The scheduler owns the receiving half, so this only fails once it is dropped
        let _ = self.sender.send(QueryRequest {
            origin,
            target,
            mask,
            receiver,
            request_id,
        });
    }
}

/// Collects segment traces during a frame and resolves them together
pub struct QueryScheduler<R> {
    config: QueryConfig,
    pending: Vec<QueryRequest<R>>,
    results: Vec<QueryResult>,
    staged_tx: Sender<QueryRequest<R>>,
    staged_rx: Receiver<QueryRequest<R>>,
}

impl<R> QueryScheduler<R>
where
    R: Copy + Send + Sync,
{
    /// Create a scheduler
    pub fn new(config: QueryConfig) -> Result<Self> {
        config.validate()?;
        let (staged_tx, staged_rx) = crossbeam_channel::unbounded();
        Ok(Self {
            pending: Vec::with_capacity(config.initial_capacity),
            results: Vec::with_capacity(config.initial_capacity),
            config,
            staged_tx,
            staged_rx,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Queue a segment trace for the next flush
    pub fn enqueue(&mut self, origin: Vec3, target: Vec3, mask: u32, receiver: R, request_id: u64) {
        self.pending.push(QueryRequest {
            origin,
            target,
            mask,
            receiver,
            request_id,
        });
    }

    /// Handle for enqueueing from worker threads
    pub fn stager(&self) -> QueryStager<R> {
        QueryStager {
            sender: self.staged_tx.clone(),
        }
    }

    /// Requests waiting for the next flush, staged ones included
    pub fn pending_len(&self) -> usize {
        self.pending.len() + self.staged_rx.len()
    }

    /// Whether the next flush would be a no-op
    pub fn is_empty(&self) -> bool {
        self.pending_len() == 0
    }

    /// Trace every pending request and hand each result to `dispatch` in
    /// enqueue order. The queue is empty afterwards.
    pub fn flush<T, D>(&mut self, tracer: &T, dispatch: &mut D) -> FlushStats
    where
        T: GroundTracer + ?Sized,
        D: ResultDispatch<R> + ?Sized,
    {
        self.pending.extend(self.staged_rx.try_iter());
        if self.pending.is_empty() {
            return FlushStats::default();
        }

        let parallel = self.pending.len() >= self.config.parallel_threshold;
        self.results.clear();
        if parallel {
            self.results.par_extend(
                self.pending
                    .par_iter()
                    .map(|request| QueryResult::resolve(tracer, request)),
            );
        } else {
            self.results.extend(
                self.pending
                    .iter()
                    .map(|request| QueryResult::resolve(tracer, request)),
            );
        }

        let mut stats = FlushStats {
            traced: self.pending.len(),
            parallel,
            ..Default::default()
        };
        for (request, result) in self.pending.iter().zip(&self.results) {
            if dispatch.deliver(request.receiver, result) {
                stats.delivered += 1;
            } else {
                stats.skipped += 1;
            }
        }

        log::trace!(
            "query flush: traced={} delivered={} skipped={} parallel={}",
            stats.traced,
            stats.delivered,
            stats.skipped,
            stats.parallel
        );

        self.pending.clear();
        self.results.clear();
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::GROUND_MASK;
    use crate::trace::FlatGround;

    fn down(x: f32) -> (Vec3, Vec3) {
        (Vec3::new(x, 1.0, 0.0), Vec3::new(x, -1.0, 0.0))
    }

    #[test]
    fn test_empty_flush_is_noop() {
        let mut scheduler = QueryScheduler::<u32>::new(QueryConfig::default()).unwrap();
        let mut calls = 0;
        let stats = scheduler.flush(&FlatGround::new(0.0), &mut |_: u32, _: &QueryResult| {
            calls += 1;
            true
        });
        assert_eq!(stats, FlushStats::default());
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_results_in_enqueue_order() {
        let ground = FlatGround::new(0.0).with_hole([1.5, -1.0], [2.5, 1.0]);
        let mut scheduler = QueryScheduler::new(QueryConfig::serial()).unwrap();
        for i in 0..4u32 {
            let (from, to) = down(i as f32);
            scheduler.enqueue(from, to, GROUND_MASK, i, 100 + i as u64);
        }

        let mut seen = Vec::new();
        let stats = scheduler.flush(&ground, &mut |receiver: u32, result: &QueryResult| {
            seen.push((receiver, result.request_id, result.hit));
            true
        });

        assert_eq!(stats.traced, 4);
        assert_eq!(stats.delivered, 4);
        assert!(!stats.parallel);
        assert_eq!(
            seen,
            vec![(0, 100, true), (1, 101, true), (2, 102, false), (3, 103, true)]
        );
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_missing_receivers_are_skipped() {
        let mut scheduler = QueryScheduler::new(QueryConfig::default()).unwrap();
        for i in 0..6u32 {
            let (from, to) = down(i as f32);
            scheduler.enqueue(from, to, GROUND_MASK, i, i as u64);
        }

        let stats = scheduler.flush(&FlatGround::new(0.0), &mut |receiver: u32, _: &QueryResult| {
            receiver % 2 == 0
        });
        assert_eq!(stats.delivered, 3);
        assert_eq!(stats.skipped, 3);
    }

    #[test]
    fn test_staged_requests_follow_direct_ones() {
        let mut scheduler = QueryScheduler::new(QueryConfig::serial()).unwrap();
        let stager = scheduler.stager();

        std::thread::scope(|scope| {
            scope.spawn(|| {
                let (from, to) = down(0.0);
                stager.enqueue(from, to, GROUND_MASK, 9u32, 9);
            });
        });
        let (from, to) = down(1.0);
        scheduler.enqueue(from, to, GROUND_MASK, 1, 1);
        assert_eq!(scheduler.pending_len(), 2);

        let mut order = Vec::new();
        scheduler.flush(&FlatGround::new(0.0), &mut |receiver: u32, _: &QueryResult| {
            order.push(receiver);
            true
        });
        assert_eq!(order, vec![1, 9]);
    }
}
