use std::path::PathBuf;
use std::time::Duration;

use chrono::{Local, NaiveDate};

use crate::collectors::PostCollector;
use crate::delivery::{ArtifactWriter, Mailer, OutgoingMail};
use crate::digest::build_report;
use crate::digest::reporter::{ReportOptions, render};
use crate::error::AppError;
use crate::models::policy::Policy;
use crate::models::post::Source;

/// What one run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub counts: Vec<(Source, usize)>,
    pub artifact: Option<PathBuf>,
    pub failures: Vec<String>,
    pub delivered: bool,
}

impl RunOutcome {
    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, c)| c).sum()
    }
}

/// One fetch → classify → render → deliver pass, with its collaborators.
pub struct Runner {
    pub policy: Policy,
    pub snippet_cap: usize,
    pub options: ReportOptions,
    pub collectors: Vec<Box<dyn PostCollector>>,
    pub writer: Box<dyn ArtifactWriter>,
    /// `None` for dry runs.
    pub mailer: Option<Box<dyn Mailer>>,
}

impl Runner {
    pub async fn run_once(&self, run_date: NaiveDate) -> Result<RunOutcome, AppError> {
        tracing::info!("Starting job scrape for {run_date}");

        let mut batches = Vec::with_capacity(self.collectors.len());
        let mut failures = Vec::new();
        for collector in &self.collectors {
            let source = collector.source();
            match collector.collect().await {
                Ok(collected) => {
                    failures.extend(collected.failures.iter().map(ToString::to_string));
                    batches.push((source, collected.posts));
                }
                Err(e) => {
                    tracing::warn!("{source} unavailable: {e}");
                    failures.push(format!("{source}: {e}"));
                }
            }
        }

        let report = build_report(&self.policy, self.snippet_cap, batches);
        let rendered = render(&report, run_date, &failures, &self.options)?;

        let matched = rendered.summary.total();
        let attachment = match &rendered.artifact {
            Some(artifact) => Some(self.writer.write(artifact).await?),
            None => None,
        };
        let artifact = attachment.as_ref().map(|a| a.path.clone());

        let delivered = match &self.mailer {
            Some(mailer) => {
                mailer
                    .send(OutgoingMail {
                        subject: rendered.summary.subject.clone(),
                        html: rendered.summary.html.clone(),
                        attachment,
                    })
                    .await?;
                true
            }
            None => {
                tracing::info!(
                    "Dry run, not sending '{}':\n{}",
                    rendered.summary.subject,
                    rendered.summary.html
                );
                false
            }
        };

        let outcome = RunOutcome {
            counts: rendered.summary.counts,
            artifact,
            failures,
            delivered,
        };
        if matched == 0 {
            tracing::info!("No jobs found today");
        } else {
            for (source, count) in &outcome.counts {
                tracing::info!("Found {count} {source} jobs");
            }
        }
        Ok(outcome)
    }

    /// Scheduler loop: run now, then every `interval_secs` until SIGINT.
    /// A failed run is logged and the loop keeps going.
    pub async fn watch(&self, interval_secs: u64) -> anyhow::Result<()> {
        tracing::info!("Watching, running every {interval_secs}s");

        loop {
            tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received, exiting gracefully");
                    break;
                }
                _ = async {
                    let today = Local::now().date_naive();
                    if let Err(e) = self.run_once(today).await {
                        tracing::error!(stage = e.stage(), "Run failed: {e}");
                    }
                    tokio::time::sleep(Duration::from_secs(interval_secs)).await;
                } => {}
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::{Collected, SubsourceFailure};
    use crate::delivery::PersistedArtifact;
    use crate::digest::reporter::{TabularArtifact, XLSX_CONTENT_TYPE};
    use crate::models::policy::AcceptanceRule;
    use crate::models::post::RawPost;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::{Arc, Mutex};

    struct FakeCollector {
        source: Source,
        posts: Vec<RawPost>,
        failures: Vec<SubsourceFailure>,
        down: bool,
    }

    #[async_trait]
    impl PostCollector for FakeCollector {
        fn source(&self) -> Source {
            self.source
        }

        async fn collect(&self) -> Result<Collected, AppError> {
            if self.down {
                return Err(AppError::Fetch("login refused".to_string()));
            }
            Ok(Collected {
                posts: self.posts.clone(),
                failures: self.failures.clone(),
            })
        }
    }

    #[derive(Default)]
    struct FakeWriter {
        written: Arc<Mutex<Vec<TabularArtifact>>>,
    }

    #[async_trait]
    impl ArtifactWriter for FakeWriter {
        async fn write(&self, artifact: &TabularArtifact) -> Result<PersistedArtifact, AppError> {
            self.written.lock().unwrap().push(artifact.clone());
            Ok(PersistedArtifact {
                path: PathBuf::from("/tmp").join(&artifact.file_name),
                file_name: artifact.file_name.clone(),
                content_type: XLSX_CONTENT_TYPE.to_string(),
                bytes: vec![1, 2, 3],
            })
        }
    }

    #[derive(Default)]
    struct FakeMailer {
        sent: Arc<Mutex<Vec<OutgoingMail>>>,
        fail: bool,
    }

    #[async_trait]
    impl Mailer for FakeMailer {
        async fn send(&self, mail: OutgoingMail) -> Result<(), AppError> {
            if self.fail {
                return Err(AppError::Delivery("connection refused".to_string()));
            }
            self.sent.lock().unwrap().push(mail);
            Ok(())
        }
    }

    fn post(source: Source, title: &str, url: &str) -> RawPost {
        RawPost {
            source,
            channel: source.to_string(),
            title: title.to_string(),
            body: String::new(),
            url: url.to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap(),
            author: Some("someone".to_string()),
        }
    }

    fn collector(source: Source, posts: Vec<RawPost>) -> Box<dyn PostCollector> {
        Box::new(FakeCollector {
            source,
            posts,
            failures: vec![],
            down: false,
        })
    }

    fn policy() -> Policy {
        Policy::new(
            vec!["psych".into(), "research assistant".into()],
            vec!["nyc".into()],
            vec![],
            AcceptanceRule::default(),
        )
    }

    fn runner(
        collectors: Vec<Box<dyn PostCollector>>,
        writer: FakeWriter,
        mailer: Option<FakeMailer>,
    ) -> Runner {
        Runner {
            policy: policy(),
            snippet_cap: 500,
            options: ReportOptions::default(),
            collectors,
            writer: Box::new(writer),
            mailer: mailer.map(|m| Box::new(m) as Box<dyn Mailer>),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    #[tokio::test]
    async fn matches_are_written_and_attached() {
        let writer = FakeWriter::default();
        let written = writer.written.clone();
        let mailer = FakeMailer::default();
        let sent = mailer.sent.clone();

        let runner = runner(
            vec![
                collector(
                    Source::Reddit,
                    vec![
                        post(
                            Source::Reddit,
                            "Research Assistant needed, NYC, psych lab",
                            "https://reddit.com/r/jobs/1",
                        ),
                        post(Source::Reddit, "Selling a couch", "https://reddit.com/r/jobs/2"),
                    ],
                ),
                collector(Source::Bluesky, vec![]),
            ],
            writer,
            Some(mailer),
        );

        let outcome = runner.run_once(today()).await.unwrap();
        assert_eq!(outcome.total(), 1);
        assert!(outcome.delivered);
        assert_eq!(
            outcome.artifact,
            Some(PathBuf::from("/tmp/psych_jobs_20261017.xlsx"))
        );
        assert_eq!(written.lock().unwrap().len(), 1);

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].attachment.is_some());
        assert!(sent[0].html.contains("<strong>Reddit:</strong> 1 new posts"));
    }

    #[tokio::test]
    async fn zero_matches_still_notifies_without_attachment() {
        let writer = FakeWriter::default();
        let written = writer.written.clone();
        let mailer = FakeMailer::default();
        let sent = mailer.sent.clone();

        let runner = runner(
            vec![collector(
                Source::Reddit,
                vec![post(Source::Reddit, "Selling a couch", "https://reddit.com/r/x/1")],
            )],
            writer,
            Some(mailer),
        );

        let outcome = runner.run_once(today()).await.unwrap();
        assert_eq!(outcome.total(), 0);
        assert!(outcome.artifact.is_none());
        assert!(written.lock().unwrap().is_empty());

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].attachment.is_none());
        assert!(sent[0].html.contains("No new jobs found today."));
    }

    #[tokio::test]
    async fn source_failures_do_not_abort_the_run() {
        let mailer = FakeMailer::default();
        let sent = mailer.sent.clone();

        let partial = Box::new(FakeCollector {
            source: Source::Reddit,
            posts: vec![post(
                Source::Reddit,
                "psych research assistant, NYC",
                "https://reddit.com/r/jobs/3",
            )],
            failures: vec![SubsourceFailure {
                subsource: "Reddit/r/postbac".to_string(),
                error: "Fetch error: r/postbac returned 503".to_string(),
            }],
            down: false,
        });
        let down = Box::new(FakeCollector {
            source: Source::Bluesky,
            posts: vec![],
            failures: vec![],
            down: true,
        });

        let runner = runner(vec![partial, down], FakeWriter::default(), Some(mailer));
        let outcome = runner.run_once(today()).await.unwrap();

        assert_eq!(outcome.total(), 1);
        assert_eq!(outcome.failures.len(), 2);
        assert!(outcome.failures[1].starts_with("Bluesky:"));
        assert!(outcome.counts.contains(&(Source::Bluesky, 0)));
        assert!(sent.lock().unwrap()[0].html.contains("could not be fetched"));
    }

    #[tokio::test]
    async fn huge_body_with_huge_cap_still_writes_workbook() {
        use crate::delivery::workbook::XlsxWriter;

        let dir = std::env::temp_dir().join(format!("jobdigest-runner-{}", std::process::id()));
        let mut long = post(
            Source::Reddit,
            "psych research assistant, NYC",
            "https://reddit.com/r/jobs/9",
        );
        long.body = "b".repeat(40_000);

        let mut runner = runner(
            vec![collector(Source::Reddit, vec![long])],
            FakeWriter::default(),
            Some(FakeMailer::default()),
        );
        runner.snippet_cap = 40_000;
        runner.writer = Box::new(XlsxWriter::new(dir.clone()));

        let outcome = runner.run_once(today()).await.unwrap();
        assert_eq!(outcome.total(), 1);
        assert!(outcome.artifact.as_ref().is_some_and(|p| p.exists()));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn delivery_failure_is_fatal() {
        let mailer = FakeMailer {
            fail: true,
            ..FakeMailer::default()
        };
        let runner = runner(vec![], FakeWriter::default(), Some(mailer));
        let err = runner.run_once(today()).await.unwrap_err();
        assert_eq!(err.stage(), "delivery");
    }

    #[tokio::test]
    async fn dry_run_skips_delivery() {
        let runner = runner(
            vec![collector(
                Source::Bluesky,
                vec![post(
                    Source::Bluesky,
                    "psych lab hiring in NYC",
                    "https://bsky.app/profile/a/post/1",
                )],
            )],
            FakeWriter::default(),
            None,
        );
        let outcome = runner.run_once(today()).await.unwrap();
        assert!(!outcome.delivered);
        assert!(outcome.artifact.is_some());
        assert!(outcome.counts.contains(&(Source::Bluesky, 1)));
    }
}
