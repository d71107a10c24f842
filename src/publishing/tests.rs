//! Publishing Module Tests
//!
//! ## Test Scopes
//! - **Queue**: FIFO order, empty dequeue, many producers.
//! - **Formatter**: validation and normalization of job fields.
//! - **Intake**: QUEUED entry and optional existence check.
//! - **Worker**: the per-job state machine and its failure paths.
//! - **Scheduler**: idempotent start/stop, fixed-delay cadence and resilience to
//!   failing ticks (paused clock).

#[cfg(test)]
mod tests {
    use crate::app::Publisher;
    use crate::catalog::{
        CatalogInput, CatalogRecord, Genre, MemoryBackend, RecordBackend, ScanOrder,
        UuidDocumentIds,
    };
    use crate::config::Config;
    use crate::error::{Error, Result};
    use crate::publishing::formatter::{CatalogFormatter, Formatter};
    use crate::publishing::queue::SubmissionQueue;
    use crate::publishing::types::{PublishJob, PublishRequest};
    use crate::status::{PublishingRecordId, PublishingStatus, StatusEntry};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn request(document_id: Option<&str>, title: &str) -> PublishRequest {
        PublishRequest {
            document_id: document_id.map(String::from),
            author: "A".to_string(),
            title: title.to_string(),
            body: "Chapter one.".to_string(),
            genre: "FANTASY".to_string(),
        }
    }

    fn job(title: &str) -> PublishJob {
        PublishJob::from_request(PublishingRecordId::new(), request(None, title))
    }

    fn statuses(history: &[StatusEntry]) -> Vec<PublishingStatus> {
        history.iter().map(|entry| entry.status).collect()
    }

    fn config(tick_interval_ms: u64) -> Config {
        let mut config = Config::default();
        config.scheduler.tick_interval_ms = tick_interval_ms;
        config
    }

    /// Panics on a job titled "panic", otherwise defers to `CatalogFormatter`.
    struct PanickingFormatter;

    impl Formatter for PanickingFormatter {
        fn format(&self, job: &PublishJob) -> Result<CatalogInput> {
            if job.title == "panic" {
                panic!("formatter blew up");
            }
            CatalogFormatter.format(job)
        }
    }

    /// `MemoryBackend` whose conditional writes take `delay`, tracking how many
    /// of them are in flight at once.
    struct SlowBackend {
        inner: Arc<MemoryBackend>,
        delay: Duration,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl SlowBackend {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                inner: MemoryBackend::new(),
                delay,
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl RecordBackend for SlowBackend {
        async fn get(&self, document_id: &str, version: u32) -> Result<Option<CatalogRecord>> {
            self.inner.get(document_id, version).await
        }

        async fn query(
            &self,
            document_id: &str,
            order: ScanOrder,
            limit: Option<usize>,
        ) -> Result<Vec<CatalogRecord>> {
            self.inner.query(document_id, order, limit).await
        }

        async fn put(&self, record: CatalogRecord) -> Result<()> {
            self.inner.put(record).await
        }

        async fn put_if_absent(&self, record: CatalogRecord) -> Result<()> {
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(running, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.inner.put_if_absent(record).await
        }
    }

    fn worn_out_record() -> CatalogRecord {
        CatalogRecord {
            document_id: "worn-out".to_string(),
            version: u32::MAX,
            active: true,
            author: "A".into(),
            title: "T".into(),
            body: String::new(),
            genre: Genre::Drama,
        }
    }

    // ============================================================
    // QUEUE
    // ============================================================

    #[test]
    fn test_queue_is_fifo_and_empty_returns_none() {
        // ARRANGE
        let queue = SubmissionQueue::new();
        let a = job("A");
        let b = job("B");

        // ACT
        queue.enqueue(a.clone());
        queue.enqueue(b.clone());

        // ASSERT: Dequeued in insertion order, then empty
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.try_dequeue(), Some(a));
        assert_eq!(queue.try_dequeue(), Some(b));
        assert_eq!(queue.try_dequeue(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_concurrent_producers_keep_per_producer_order() {
        let queue = Arc::new(SubmissionQueue::new());

        // ACT: Four producers enqueue concurrently
        let handles: Vec<_> = (0..4)
            .map(|producer| {
                let queue = queue.clone();
                std::thread::spawn(move || {
                    for n in 0..250 {
                        queue.enqueue(job(&format!("{}-{}", producer, n)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // ASSERT: Every producer's jobs come out in the order it sent them
        let mut last_seen = [-1i64; 4];
        let mut total = 0;
        while let Some(job) = queue.try_dequeue() {
            let (producer, n) = job.title.split_once('-').unwrap();
            let producer: usize = producer.parse().unwrap();
            let n: i64 = n.parse().unwrap();
            assert!(n > last_seen[producer], "producer {} out of order", producer);
            last_seen[producer] = n;
            total += 1;
        }
        assert_eq!(total, 1000);
    }

    #[test]
    fn test_queue_concurrent_consumers_never_share_a_job() {
        let queue = Arc::new(SubmissionQueue::new());
        for n in 0..1000 {
            queue.enqueue(job(&n.to_string()));
        }

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let queue = queue.clone();
                std::thread::spawn(move || {
                    let mut taken = Vec::new();
                    while let Some(job) = queue.try_dequeue() {
                        taken.push(job.publishing_record_id);
                    }
                    taken
                })
            })
            .collect();

        let mut all: Vec<PublishingRecordId> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();
        let total = all.len();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all.dedup();
        assert_eq!(total, 1000);
        assert_eq!(all.len(), 1000);
    }

    // ============================================================
    // FORMATTER
    // ============================================================

    #[test]
    fn test_formatter_trims_and_parses() {
        let mut job = job("  Dune  ");
        job.author = " Frank Herbert ".to_string();
        job.genre = "science fiction".to_string();
        job.body = "line one\r\nline two\n\n  ".to_string();

        let input = CatalogFormatter.format(&job).unwrap();

        assert_eq!(input.title, "Dune");
        assert_eq!(input.author, "Frank Herbert");
        assert_eq!(input.genre, Genre::ScienceFiction);
        assert_eq!(input.body, "line one\nline two");
        assert_eq!(input.document_id, None);
    }

    #[test]
    fn test_formatter_rejects_missing_fields_and_unknown_genre() {
        let mut no_title = job("   ");
        no_title.author = "x".to_string();
        let mut bad_genre = job("T");
        bad_genre.genre = "cookbook".to_string();

        assert!(matches!(CatalogFormatter.format(&no_title), Err(Error::Validation(_))));
        assert!(matches!(CatalogFormatter.format(&bad_genre), Err(Error::Validation(_))));
    }

    // ============================================================
    // INTAKE
    // ============================================================

    #[tokio::test]
    async fn test_submit_records_queued_and_enqueues() {
        // ARRANGE
        let publisher = Publisher::new(&Config::default());

        // ACT
        let id = publisher.intake.submit(request(None, "T")).await.unwrap();

        // ASSERT: QUEUED is recorded and the job waits in the queue
        let history = publisher.intake.status(&id).unwrap();
        assert_eq!(statuses(&history), vec![PublishingStatus::Queued]);
        assert_eq!(publisher.queue.len(), 1);
    }

    #[tokio::test]
    async fn test_submit_with_verification_rejects_unknown_document() {
        let mut config = Config::default();
        config.intake.verify_document_exists = true;
        let publisher = Publisher::new(&config);

        let err = publisher.intake.submit(request(Some("ghost"), "T")).await.unwrap_err();

        assert!(err.is_not_found());
        assert!(publisher.queue.is_empty());
        assert_eq!(publisher.status.record_count(), 0);
    }

    #[tokio::test]
    async fn test_submit_with_verification_accepts_known_document() {
        let mut config = Config::default();
        config.intake.verify_document_exists = true;
        let publisher = Publisher::new(&config);
        let created = publisher
            .catalog
            .upsert(CatalogInput {
                document_id: None,
                author: "A".into(),
                title: "T".into(),
                body: String::new(),
                genre: Genre::Drama,
            })
            .await
            .unwrap();

        let result = publisher
            .intake
            .submit(request(Some(&created.document_id), "T2"))
            .await;

        assert!(result.is_ok());
    }

    // ============================================================
    // WORKER
    // ============================================================

    #[tokio::test]
    async fn test_process_next_on_empty_queue_is_noop() {
        let publisher = Publisher::new(&Config::default());

        let outcome = publisher.worker.process_next().await.unwrap();

        assert!(outcome.is_none());
        assert_eq!(publisher.status.record_count(), 0);
    }

    #[tokio::test]
    async fn test_new_document_is_published() {
        // ARRANGE
        let publisher = Publisher::new(&Config::default());
        let id = publisher.intake.submit(request(None, "T")).await.unwrap();

        // ACT
        let terminal = publisher.worker.process_next().await.unwrap().unwrap();

        // ASSERT: Full happy-path history and a version 1 in the catalog
        let history = publisher.status.history(&id).unwrap();
        assert_eq!(
            statuses(&history),
            vec![
                PublishingStatus::Queued,
                PublishingStatus::InProgress,
                PublishingStatus::Successful
            ]
        );
        let document_id = terminal.document_id.expect("success names the document");
        let record = publisher.catalog.get_active(&document_id).await.unwrap();
        assert_eq!(record.version, 1);
        assert_eq!(record.title, "T");
        assert_eq!(record.author, "A");
        assert_eq!(record.genre, Genre::Fantasy);
    }

    #[tokio::test]
    async fn test_update_of_unknown_document_fails_once() {
        // ARRANGE
        let publisher = Publisher::new(&Config::default());
        let id = publisher.intake.submit(request(Some("ghost"), "T")).await.unwrap();

        // ACT
        let terminal = publisher.worker.process_next().await.unwrap().unwrap();

        // ASSERT: One FAILED entry and nothing written to the catalog
        assert_eq!(terminal.status, PublishingStatus::Failed);
        let history = publisher.status.history(&id).unwrap();
        assert_eq!(
            statuses(&history),
            vec![
                PublishingStatus::Queued,
                PublishingStatus::InProgress,
                PublishingStatus::Failed
            ],
            "FAILED is terminal: no SUCCESSFUL after it"
        );
        let message = history.last().unwrap().message.clone().unwrap();
        assert!(message.contains("does not exist"));
        assert!(publisher.catalog.get_active("ghost").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_create_then_update_through_pipeline() {
        // ARRANGE: Publish version 1
        let publisher = Publisher::new(&Config::default());
        publisher.intake.submit(request(None, "First")).await.unwrap();
        let created = publisher.worker.process_next().await.unwrap().unwrap();
        let document_id = created.document_id.unwrap();

        // ACT: Update it through the pipeline
        let mut update = request(Some(&document_id), "Second");
        update.author = "B".to_string();
        update.genre = "horror".to_string();
        publisher.intake.submit(update).await.unwrap();
        publisher.worker.process_next().await.unwrap().unwrap();

        // ASSERT: Version 1 retired, version 2 active with the new fields
        let versions = publisher.catalog.versions(&document_id).await.unwrap();
        assert_eq!(versions.len(), 2);
        assert!(!versions[0].active);
        assert!(versions[1].active);
        let active = publisher.catalog.get_active(&document_id).await.unwrap();
        assert_eq!(active.version, 2);
        assert_eq!(active.title, "Second");
        assert_eq!(active.author, "B");
        assert_eq!(active.genre, Genre::Horror);
    }

    #[tokio::test]
    async fn test_invalid_job_fails_with_validation_message() {
        let publisher = Publisher::new(&Config::default());
        let mut bad = request(None, "T");
        bad.genre = "cookbook".to_string();
        let id = publisher.intake.submit(bad).await.unwrap();

        let terminal = publisher.worker.process_next().await.unwrap().unwrap();

        assert_eq!(terminal.status, PublishingStatus::Failed);
        assert!(terminal.message.unwrap().contains("unknown genre"));
        assert_eq!(publisher.status.history(&id).unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_jobs_are_processed_in_submission_order() {
        let publisher = Publisher::new(&Config::default());
        let first = publisher.intake.submit(request(None, "1")).await.unwrap();
        let second = publisher.intake.submit(request(None, "2")).await.unwrap();

        let a = publisher.worker.process_next().await.unwrap().unwrap();
        let b = publisher.worker.process_next().await.unwrap().unwrap();

        assert_eq!(a.publishing_record_id, first);
        assert_eq!(b.publishing_record_id, second);
        assert!(publisher.worker.process_next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_logic_error_is_recorded_then_propagated() {
        // ARRANGE: A document whose version space is exhausted
        let backend = MemoryBackend::new();
        backend.put(worn_out_record()).await.unwrap();
        let publisher = Publisher::with_backend(
            &Config::default(),
            backend,
            Arc::new(UuidDocumentIds),
            Arc::new(CatalogFormatter),
        );
        let id = publisher.intake.submit(request(Some("worn-out"), "T")).await.unwrap();

        // ACT
        let err = publisher.worker.process_next().await.unwrap_err();

        // ASSERT: FAILED is written before the error escapes
        assert!(err.is_fatal());
        let history = publisher.status.history(&id).unwrap();
        assert_eq!(history.last().unwrap().status, PublishingStatus::Failed);
        assert_eq!(history.iter().filter(|e| e.status.is_terminal()).count(), 1);
    }

    #[tokio::test]
    async fn test_panicking_formatter_fails_the_job() {
        // ARRANGE
        let backend = MemoryBackend::new();
        let publisher = Publisher::with_backend(
            &Config::default(),
            backend.clone(),
            Arc::new(UuidDocumentIds),
            Arc::new(PanickingFormatter),
        );
        let id = publisher.intake.submit(request(None, "panic")).await.unwrap();

        // ACT
        let terminal = publisher.worker.process_next().await.unwrap().unwrap();

        // ASSERT: The panic becomes the job's single FAILED entry
        assert_eq!(terminal.status, PublishingStatus::Failed);
        let message = terminal.message.unwrap();
        assert!(message.contains("formatter panicked: formatter blew up"), "{}", message);
        assert_eq!(
            statuses(&publisher.status.history(&id).unwrap()),
            vec![
                PublishingStatus::Queued,
                PublishingStatus::InProgress,
                PublishingStatus::Failed
            ]
        );
        assert_eq!(backend.record_count(), 0);
    }

    #[tokio::test]
    async fn test_status_write_failure_propagates() {
        let publisher = Publisher::new(&Config::default());
        let mut broken = job("T");
        broken.publishing_record_id = PublishingRecordId(String::new());
        publisher.queue.enqueue(broken);

        let result = publisher.worker.process_next().await;

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    // ============================================================
    // SCHEDULER
    // ============================================================

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_tick_publishes_queued_job() {
        let publisher = Publisher::new(&config(1_000));
        let id = publisher.intake.submit(request(None, "T")).await.unwrap();

        publisher.scheduler.start().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        publisher.scheduler.stop().await;

        let history = publisher.status.history(&id).unwrap();
        assert_eq!(
            statuses(&history),
            vec![
                PublishingStatus::Queued,
                PublishingStatus::InProgress,
                PublishingStatus::Successful
            ]
        );
        let document_id = history.last().unwrap().document_id.clone().unwrap();
        assert_eq!(publisher.catalog.get_active(&document_id).await.unwrap().version, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_double_start_runs_one_loop() {
        let publisher = Publisher::new(&config(1_000));
        assert!(!publisher.scheduler.is_running());

        publisher.scheduler.start().await;
        publisher.scheduler.start().await;
        assert!(publisher.scheduler.is_running());

        // Ticks at t = 0, 1s, 2s, 3s with a single loop; a duplicate loop would double that.
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        let ticks = publisher.scheduler.ticks();
        assert!((3..=5).contains(&ticks), "expected ~4 ticks, got {}", ticks);

        publisher.scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_stop_then_start_resumes() {
        // ARRANGE: Run for a while, then stop
        let publisher = Publisher::new(&config(1_000));
        publisher.scheduler.start().await;
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        publisher.scheduler.stop().await;
        assert!(!publisher.scheduler.is_running());

        // ACT: Idle while stopped
        let stopped_at = publisher.scheduler.ticks();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(publisher.scheduler.ticks(), stopped_at, "no ticks while stopped");

        // ACT: Restart with work queued
        let id = publisher.intake.submit(request(None, "after restart")).await.unwrap();
        publisher.scheduler.start().await;
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        publisher.scheduler.stop().await;

        // ASSERT: Ticking resumed and drained the queue
        assert!(publisher.scheduler.ticks() > stopped_at);
        let latest = publisher.status.latest(&id).unwrap();
        assert_eq!(latest.status, PublishingStatus::Successful);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_stop_when_stopped_is_noop() {
        let publisher = Publisher::new(&config(1_000));

        publisher.scheduler.stop().await;

        assert!(!publisher.scheduler.is_running());
        assert_eq!(publisher.scheduler.ticks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_tick_delays_the_next_one_without_overlap() {
        // ARRANGE: Each publish holds the catalog for 2.5 periods
        let backend = SlowBackend::new(Duration::from_millis(2_500));
        let publisher = Publisher::with_backend(
            &config(1_000),
            backend.clone(),
            Arc::new(UuidDocumentIds),
            Arc::new(CatalogFormatter),
        );
        let mut ids = Vec::new();
        for n in 0..3 {
            ids.push(publisher.intake.submit(request(None, &n.to_string())).await.unwrap());
        }

        // ACT: Tick 1 at t=0 runs until 2.5s; tick 2 fires late, at 2.5s
        publisher.scheduler.start().await;
        tokio::time::sleep(Duration::from_millis(3_200)).await;

        // ASSERT: Missed ticks were not replayed
        assert_eq!(publisher.scheduler.ticks(), 2);
        assert_eq!(backend.max_in_flight.load(Ordering::SeqCst), 1);

        // ACT: Jobs finish at 2.5s, 5s, 7.5s; empty ticks follow at 8.5s and 9.5s
        tokio::time::sleep(Duration::from_millis(7_000)).await;
        publisher.scheduler.stop().await;

        // ASSERT: One tick per slot on the delayed schedule, never two at once
        assert_eq!(publisher.scheduler.ticks(), 6);
        assert_eq!(backend.max_in_flight.load(Ordering::SeqCst), 1);
        for id in &ids {
            assert_eq!(
                publisher.status.latest(id).unwrap().status,
                PublishingStatus::Successful
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_survives_failing_ticks_and_panicking_formatter() {
        // ARRANGE: A fatal job, a job whose formatter panics, then a healthy one
        let backend = MemoryBackend::new();
        backend.put(worn_out_record()).await.unwrap();
        let publisher = Publisher::with_backend(
            &config(1_000),
            backend,
            Arc::new(UuidDocumentIds),
            Arc::new(PanickingFormatter),
        );
        let worn_out = publisher.intake.submit(request(Some("worn-out"), "T")).await.unwrap();
        let panicking = publisher.intake.submit(request(None, "panic")).await.unwrap();
        let healthy = publisher.intake.submit(request(None, "fine")).await.unwrap();

        // ACT
        publisher.scheduler.start().await;
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        publisher.scheduler.stop().await;

        // ASSERT: Every job reached a terminal status and the loop kept going
        assert!(publisher.scheduler.ticks() >= 3);
        assert_eq!(
            publisher.status.latest(&worn_out).unwrap().status,
            PublishingStatus::Failed
        );
        assert_eq!(
            publisher.status.latest(&panicking).unwrap().status,
            PublishingStatus::Failed
        );
        assert_eq!(
            publisher.status.latest(&healthy).unwrap().status,
            PublishingStatus::Successful
        );
    }
}
