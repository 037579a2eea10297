use crate::batcher::make_batches;
use crate::config::Config;
use crate::error::{MrError, Result};
use crate::grouper::group;
use crate::splitter::split_documents;
use crate::worker_node::{make_worker, Worker};
use crate::worker_pool::{run_phase, PhaseRun};
use crate::{Document, OutputRecord, Task};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Where a coordinator is in its run. Phases only ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Mapping,
    GroupingAndBatching,
    Reducing,
    Done,
}

/// Wall-clock time spent in each phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseTimings {
    pub map: Duration,
    /// Grouping and batching together
    pub group: Duration,
    pub reduce: Duration,
}

/// Everything a successful run produces
#[derive(Debug, Clone)]
pub struct JobReport {
    pub output: OutputRecord,
    pub map: PhaseRun,
    pub reduce: PhaseRun,
    pub timings: PhaseTimings,
}

impl JobReport {
    pub fn distinct_words(&self) -> usize {
        self.output.len()
    }
}

/// Sequences split, map, group, batch and reduce over a set of documents.
/// A coordinator runs once; every phase waits for all tasks of the previous one.
pub struct Coordinator {
    config: Config,
    phase: RwLock<Phase>,
    worker: Arc<Worker>,
}

impl Coordinator {
    pub fn new(config: Config) -> Result<Coordinator> {
        let worker = make_worker(config.keep_empty_words);
        Coordinator::with_worker(config, worker)
    }

    /// Use a worker with custom map/reduce functions
    pub fn with_worker(config: Config, worker: Worker) -> Result<Coordinator> {
        config.validate()?;
        Ok(Coordinator {
            config,
            phase: RwLock::new(Phase::Idle),
            worker: Arc::new(worker),
        })
    }

    pub fn phase(&self) -> Phase {
        match self.phase.read() {
            Ok(phase) => *phase,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn switch_to(&self, next: Phase) {
        info!("Switching to {:?}", next);
        match self.phase.write() {
            Ok(mut phase) => *phase = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    /// Claim the coordinator for a run, moving it from `Idle` to `Mapping`
    fn begin(&self) -> Result<()> {
        let mut phase = match self.phase.write() {
            Ok(phase) => phase,
            Err(poisoned) => poisoned.into_inner(),
        };
        if *phase != Phase::Idle {
            return Err(MrError::invalid(format!(
                "coordinator already ran (phase {:?})",
                *phase
            )));
        }
        info!("Switching to {:?}", Phase::Mapping);
        *phase = Phase::Mapping;
        Ok(())
    }

    /// Run the whole pipeline over `documents`.
    /// Any failing task fails the run; no partial output is returned.
    pub async fn start(&self, documents: &[Document]) -> Result<JobReport> {
        self.begin()?;
        let mut timings = PhaseTimings::default();

        // MAP
        let chunks = split_documents(documents, self.config.lines_per_chunk)?;
        debug!(
            "split {} documents into {} chunks",
            documents.len(),
            chunks.len()
        );
        let map_started = Instant::now();
        let tasks = chunks.into_iter().map(Task::Map).collect();
        let map = run_phase(
            Phase::Mapping,
            self.worker.clone(),
            tasks,
            self.config.max_workers,
        )
        .await?;
        timings.map = map_started.elapsed();
        info!("{} map tasks completed on {} workers", map.tasks, map.workers);

        // GROUP
        self.switch_to(Phase::GroupingAndBatching);
        let group_started = Instant::now();
        let items = self.worker.map_collector().take()?;
        let index = group(items);
        info!(
            "grouped {} occurrences into {} words",
            index.occurrences(),
            index.len()
        );
        let batches = make_batches(index, self.config.reduce_batch_size)?;
        timings.group = group_started.elapsed();

        // REDUCE
        self.switch_to(Phase::Reducing);
        let reduce_started = Instant::now();
        let tasks = batches.into_iter().map(Task::Reduce).collect();
        let reduce = run_phase(
            Phase::Reducing,
            self.worker.clone(),
            tasks,
            self.config.max_workers,
        )
        .await?;
        let output = self.worker.output_collector().take()?;
        timings.reduce = reduce_started.elapsed();
        info!(
            "{} reduce tasks completed on {} workers",
            reduce.tasks, reduce.workers
        );

        self.switch_to(Phase::Done);
        Ok(JobReport {
            output,
            map,
            reduce,
            timings,
        })
    }
}

/// Create a coordinator for `config` and run it over `documents`
pub async fn make_coordinator(documents: Vec<Document>, config: Config) -> Result<JobReport> {
    let coordinator = Coordinator::new(config)?;
    coordinator.start(&documents).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker_node::{map, reduce};
    use crate::MappedItem;
    use std::collections::BTreeMap;

    fn sample_documents() -> Vec<Document> {
        vec![
            Document::new("doc1", "cat dog"),
            Document::new("doc2", "cat CAT."),
            Document::new("doc3", "dog"),
        ]
    }

    #[tokio::test]
    async fn counts_words_per_document() {
        let report = make_coordinator(sample_documents(), Config::default())
            .await
            .unwrap();

        assert_eq!(report.distinct_words(), 2);
        assert_eq!(
            report.output.get("cat").unwrap(),
            &BTreeMap::from([("doc1".to_string(), 1), ("doc2".to_string(), 2)])
        );
        assert_eq!(
            report.output.get("dog").unwrap(),
            &BTreeMap::from([("doc1".to_string(), 1), ("doc3".to_string(), 1)])
        );
        assert_eq!(report.map, PhaseRun { tasks: 3, workers: 3 });
        assert_eq!(report.reduce, PhaseRun { tasks: 1, workers: 1 });
    }

    #[tokio::test]
    async fn bounded_pool_reports_workers_spawned() {
        let config = Config::default()
            .with_lines_per_chunk(1)
            .with_reduce_batch_size(1)
            .with_max_workers(Some(2));
        let documents = vec![
            Document::new("doc1", "cat\ndog\nbird"),
            Document::new("doc2", "cat"),
            Document::new("doc3", "fish"),
        ];
        let report = make_coordinator(documents, config).await.unwrap();

        assert_eq!(report.map, PhaseRun { tasks: 5, workers: 2 });
        assert_eq!(report.reduce, PhaseRun { tasks: 4, workers: 2 });
    }

    #[tokio::test]
    async fn phase_moves_from_idle_to_done() {
        let coordinator = Coordinator::new(Config::default()).unwrap();
        assert_eq!(coordinator.phase(), Phase::Idle);

        coordinator.start(&sample_documents()).await.unwrap();
        assert_eq!(coordinator.phase(), Phase::Done);
    }

    #[tokio::test]
    async fn coordinator_runs_once() {
        let coordinator = Coordinator::new(Config::default()).unwrap();
        coordinator.start(&sample_documents()).await.unwrap();

        let err = coordinator.start(&sample_documents()).await.unwrap_err();
        assert!(matches!(err, MrError::InvalidConfiguration(_)));
    }

    #[test]
    fn invalid_config_is_rejected_before_any_phase() {
        let err = Coordinator::new(Config::default().with_reduce_batch_size(0)).err();
        assert!(matches!(err, Some(MrError::InvalidConfiguration(_))));

        let err = Coordinator::new(Config::default().with_lines_per_chunk(0)).err();
        assert!(matches!(err, Some(MrError::InvalidConfiguration(_))));
    }

    #[tokio::test]
    async fn no_documents_gives_empty_output() {
        let report = make_coordinator(Vec::new(), Config::default()).await.unwrap();
        assert!(report.output.is_empty());
        assert_eq!(report.map.tasks, 0);
        assert_eq!(report.reduce.workers, 0);
    }

    fn failing_reduce(word: &str, occurrences: &[String]) -> BTreeMap<String, usize> {
        if word == "dog" {
            panic!("reducer exploded on {word}");
        }
        reduce(word, occurrences)
    }

    #[tokio::test]
    async fn failing_reduce_task_fails_the_run() {
        let worker = Worker::new(map, failing_reduce, true);
        let coordinator =
            Coordinator::with_worker(Config::default().with_reduce_batch_size(1), worker).unwrap();

        let err = coordinator.start(&sample_documents()).await.unwrap_err();
        assert!(matches!(
            err,
            MrError::WorkerTaskFailure {
                phase: Phase::Reducing,
                ..
            }
        ));
        assert_eq!(coordinator.phase(), Phase::Reducing);
    }

    fn failing_map(_document: &str, _contents: &str) -> Vec<MappedItem> {
        panic!("mapper exploded");
    }

    #[tokio::test]
    async fn failing_map_task_stops_before_grouping() {
        let worker = Worker::new(failing_map, reduce, true);
        let coordinator = Coordinator::with_worker(Config::default(), worker).unwrap();

        let err = coordinator.start(&sample_documents()).await.unwrap_err();
        assert!(matches!(
            err,
            MrError::WorkerTaskFailure {
                phase: Phase::Mapping,
                ..
            }
        ));
        assert_eq!(coordinator.phase(), Phase::Mapping);
    }
}
