// Copyright 2026 The Myba Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Bounded-concurrency fan-out for per-file encrypt/decrypt jobs.
//!
//! Jobs run on a fixed-size thread pool. Human-readable output a job wants
//! to emit goes into a per-job log buffer, and all buffers are replayed in
//! job order after the pool drains, so concurrent jobs never interleave on
//! the parent's output. When any job fails the whole batch still drains,
//! logs are replayed, and the first error is returned.

use std::io;
use std::io::Write;

use rayon::iter::IntoParallelIterator as _;
use rayon::iter::ParallelIterator as _;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("Could not start the worker pool")]
    Build(#[source] rayon::ThreadPoolBuildError),
}

/// Captured output channel handed to each job.
#[derive(Default)]
pub struct JobLog {
    buf: Vec<u8>,
}

impl JobLog {
    pub fn line(&mut self, text: impl AsRef<str>) {
        self.buf.extend_from_slice(text.as_ref().as_bytes());
        self.buf.push(b'\n');
    }
}

impl Write for JobLog {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub struct WorkerPool {
    pool: rayon::ThreadPool,
}

impl WorkerPool {
    /// Creates a pool of `n_jobs` workers. Jobs block only in their own
    /// bodies (file and cipher I/O), so the pool size maps directly to
    /// concurrent encrypt/decrypt streams.
    pub fn new(n_jobs: usize) -> Result<Self, PoolError> {
        let n_jobs = if n_jobs == 0 { num_cpus::get() } else { n_jobs };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n_jobs)
            .thread_name(|i| format!("myba-worker-{i}"))
            .build()
            .map_err(PoolError::Build)?;
        Ok(Self { pool })
    }

    /// Runs `body` over every job, replaying captured logs to stderr after
    /// the pool drains. Results come back in input order; the first job
    /// error fails the batch (after the drain and the replay).
    pub fn run_all<I, T, E, F>(&self, jobs: Vec<I>, body: F) -> Result<Vec<T>, E>
    where
        I: Send,
        T: Send,
        E: Send,
        F: Fn(I, &mut JobLog) -> Result<T, E> + Sync,
    {
        self.run_all_with_output(jobs, body, &mut io::stderr())
    }

    pub fn run_all_with_output<I, T, E, F>(
        &self,
        jobs: Vec<I>,
        body: F,
        output: &mut dyn Write,
    ) -> Result<Vec<T>, E>
    where
        I: Send,
        T: Send,
        E: Send,
        F: Fn(I, &mut JobLog) -> Result<T, E> + Sync,
    {
        let outcomes: Vec<(JobLog, Result<T, E>)> = self.pool.install(|| {
            jobs.into_par_iter()
                .map(|job| {
                    let mut log = JobLog::default();
                    let result = body(job, &mut log);
                    (log, result)
                })
                .collect()
        });

        for (log, _) in &outcomes {
            if !log.buf.is_empty() {
                let _ = output.write_all(&log.buf);
            }
        }
        let _ = output.flush();

        let mut results = Vec::with_capacity(outcomes.len());
        for (_, result) in outcomes {
            results.push(result?);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use super::*;

    #[test]
    fn results_come_back_in_input_order() {
        let pool = WorkerPool::new(4).unwrap();
        let jobs: Vec<usize> = (0..32).collect();
        let results: Vec<usize> = pool
            .run_all(jobs, |n, _log| {
                // Stagger completion so out-of-order finishes are likely.
                std::thread::sleep(std::time::Duration::from_millis((32 - n as u64) % 5));
                Ok::<_, std::convert::Infallible>(n * 2)
            })
            .unwrap();
        assert_eq!(results, (0..32).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[test]
    fn logs_are_replayed_in_job_order_without_interleaving() {
        let pool = WorkerPool::new(8).unwrap();
        let jobs: Vec<usize> = (0..8).collect();
        let mut output = Vec::new();
        pool.run_all_with_output(
            jobs,
            |n, log| {
                log.line(format!("job {n} start"));
                log.line(format!("job {n} end"));
                Ok::<_, std::convert::Infallible>(())
            },
            &mut output,
        )
        .unwrap();
        let text = String::from_utf8(output).unwrap();
        let expected: String = (0..8)
            .map(|n| format!("job {n} start\njob {n} end\n"))
            .collect();
        assert_eq!(text, expected);
    }

    #[test]
    fn a_failing_job_drains_the_batch_before_failing() {
        let pool = WorkerPool::new(2).unwrap();
        let ran = AtomicUsize::new(0);
        let result: Result<Vec<()>, String> = pool.run_all((0..16).collect(), |n, _log| {
            ran.fetch_add(1, Ordering::SeqCst);
            if n == 3 {
                Err(format!("job {n} failed"))
            } else {
                Ok(())
            }
        });
        assert_eq!(result.unwrap_err(), "job 3 failed");
        assert_eq!(ran.load(Ordering::SeqCst), 16);
    }

    #[test]
    fn zero_resolves_to_the_cpu_count() {
        // Just proves the pool builds and runs; the exact width is host
        // dependent.
        let pool = WorkerPool::new(0).unwrap();
        let results = pool
            .run_all(vec![1, 2, 3], |n, _| Ok::<_, std::convert::Infallible>(n))
            .unwrap();
        assert_eq!(results, vec![1, 2, 3]);
    }
}
