//! Average likelihood over a tree ensemble, evaluated on a fixed worker pool.

use crate::ensemble::TreeEnsemble;
use crate::error::{ConfigurationError, LikelihoodError};
use crate::likelihood::{TreeEvaluator, check_taxa, log_mean_exp, partition_boundaries};
use crate::model::Tree;
use rayon::prelude::*;
use std::ops::Range;

/// Number of worker threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadCount {
    Fixed(usize),
    /// As many as [std::thread::available_parallelism] reports.
    Available,
}

impl ThreadCount {
    /// Resolves to a concrete, positive number of threads.
    ///
    /// # Errors
    /// Returns [ConfigurationError::ZeroThreads] for `Fixed(0)`.
    pub fn resolve(self) -> Result<usize, ConfigurationError> {
        match self {
            ThreadCount::Fixed(0) => Err(ConfigurationError::ZeroThreads),
            ThreadCount::Fixed(n) => Ok(n),
            ThreadCount::Available => Ok(std::thread::available_parallelism().map_or(1, |n| n.get())),
        }
    }
}

/// A worker's pipeline and the trees it owns.
struct Worker<E> {
    pipeline: E,
    range: Range<usize>,
}

impl<E: TreeEvaluator> Worker<E> {
    fn evaluate(&mut self, worker: usize, trees: &[Tree], out: &mut [f64]) -> Result<(), LikelihoodError> {
        let wrap = |source| LikelihoodError::Worker {
            worker,
            start: self.range.start,
            end: self.range.end,
            source: Box::new(source),
        };
        for (slot, tree) in out.iter_mut().zip(&trees[self.range.clone()]) {
            self.pipeline.set_tree(tree).map_err(wrap)?;
            *slot = self.pipeline.calculate_log_p().map_err(wrap)?;
        }
        Ok(())
    }
}

/// [TreeSetLikelihood](crate::likelihood::TreeSetLikelihood) with the ensemble
/// split across workers.
///
/// Worker `k` of `W` owns trees `[T·k/W, T·(k+1)/W)` and a structural clone
/// of the pipeline, both fixed at construction. Each call evaluates all
/// partitions concurrently on a pool built once, writes into disjoint chunks
/// of one result vector, and reduces as in the sequential version.
///
/// With one worker, everything runs on the calling thread.
pub struct ThreadedTreeSetLikelihood<E> {
    workers: Vec<Worker<E>>,
    ensemble: TreeEnsemble,
    pool: Option<rayon::ThreadPool>,
    tree_log_ps: Vec<f64>,
    log_p: f64,
}

impl<E: TreeEvaluator> ThreadedTreeSetLikelihood<E> {
    /// Creates the likelihood with one clone of `pipeline` per worker.
    ///
    /// The number of workers is clamped to the number of trees.
    ///
    /// # Errors
    /// Returns a [ConfigurationError] if the ensemble is empty or its taxa
    /// differ from the pipeline's, the thread count is zero, cloning fails,
    /// or the pool cannot be built.
    pub fn new(pipeline: E, ensemble: TreeEnsemble, threads: ThreadCount) -> Result<Self, ConfigurationError> {
        if ensemble.is_empty() {
            return Err(ConfigurationError::EmptyEnsemble(""));
        }
        check_taxa(&pipeline, &ensemble)?;
        let ranges = partition_boundaries(ensemble.len(), threads.resolve()?);

        let workers = ranges
            .into_iter()
            .enumerate()
            .map(|(k, range)| {
                log::debug!("Worker {k} evaluates trees [{}, {})", range.start, range.end);
                Ok(Worker {
                    pipeline: pipeline.structural_clone(k)?,
                    range,
                })
            })
            .collect::<Result<Vec<_>, ConfigurationError>>()?;

        let pool = if workers.len() > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers.len())
                .thread_name(|k| format!("treeset-worker-{k}"))
                .build()
                .map_err(|e| ConfigurationError::ThreadPool(e.to_string()))?;
            Some(pool)
        } else {
            None
        };
        log::info!(
            "Evaluating {} trees with {} worker(s)",
            ensemble.len(),
            workers.len()
        );

        Ok(Self {
            workers,
            tree_log_ps: vec![f64::NEG_INFINITY; ensemble.len()],
            ensemble,
            pool,
            log_p: f64::NEG_INFINITY,
        })
    }

    /// Evaluates every tree and returns the log of the mean likelihood.
    ///
    /// Blocks until all workers are done.
    ///
    /// # Errors
    /// Returns [LikelihoodError::Worker] naming the failing worker and its trees.
    pub fn calculate_log_p(&mut self) -> Result<f64, LikelihoodError> {
        let Self {
            workers,
            ensemble,
            pool,
            tree_log_ps,
            ..
        } = self;
        let trees = ensemble.trees();

        let mut jobs = Vec::with_capacity(workers.len());
        let mut rest = tree_log_ps.as_mut_slice();
        for (k, worker) in workers.iter_mut().enumerate() {
            let (chunk, tail) = rest.split_at_mut(worker.range.len());
            jobs.push((k, worker, chunk));
            rest = tail;
        }

        match pool {
            Some(pool) => pool.install(|| {
                jobs.into_par_iter()
                    .try_for_each(|(k, worker, chunk)| worker.evaluate(k, trees, chunk))
            })?,
            None => {
                for (k, worker, chunk) in jobs {
                    worker.evaluate(k, trees, chunk)?;
                }
            }
        }

        self.log_p = log_mean_exp(&self.tree_log_ps);
        Ok(self.log_p)
    }

    /// Returns the result of the last evaluation, `-inf` before the first.
    pub fn log_p(&self) -> f64 {
        self.log_p
    }

    /// Returns the per-tree log-likelihoods of the last evaluation.
    pub fn tree_log_ps(&self) -> &[f64] {
        &self.tree_log_ps
    }

    /// Returns the tree ranges of all workers.
    pub fn partitions(&self) -> Vec<Range<usize>> {
        self.workers.iter().map(|w| w.range.clone()).collect()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn ensemble(&self) -> &TreeEnsemble {
        &self.ensemble
    }

    /// Returns every worker's pipeline, e.g. to apply the same model change to all.
    pub fn pipelines_mut(&mut self) -> impl Iterator<Item = &mut E> {
        self.workers.iter_mut().map(|w| &mut w.pipeline)
    }
}
