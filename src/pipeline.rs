use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::settings::Settings;
use crate::records::{EnrichedRecord, Record};
use crate::report::{ReportBuilder, ReportError, ReportSummary};
use crate::summary::{Normalizer, Summarizer, SummaryOutcome};

pub fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:30.cyan/blue}] {percent}% ({pos}/{len})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

/// Summarize every record, one at a time, in input order.
///
/// Per-record failures become fallback summaries, so the returned report always
/// holds exactly one row per record.
pub async fn enrich<S: Summarizer>(
    summarizer: &mut S,
    normalizer: &Normalizer,
    records: Vec<Record>,
    report: &mut ReportBuilder,
    pb: &ProgressBar,
) {
    for record in records {
        let outcome = summarizer.summarize(&record.link).await;
        match &outcome {
            SummaryOutcome::Success(_) => {}
            SummaryOutcome::Timeout => {
                warn!(rank = record.rank, link = %record.link, "Summary timed out")
            }
            SummaryOutcome::ServiceError(text) => {
                warn!(rank = record.rank, link = %record.link, response = %text, "Summary service failed")
            }
            SummaryOutcome::TransportError(e) => {
                warn!(rank = record.rank, link = %record.link, error = %e, "Summary page unreachable")
            }
        }

        let summary = normalizer.normalize(&outcome);
        report.push(EnrichedRecord::new(record, summary));
        pb.inc(1);
    }
    pb.finish_and_clear();
}

/// Enrich all records and write the report. Only the final write can fail the run.
pub async fn run<S: Summarizer>(
    summarizer: &mut S,
    records: Vec<Record>,
    settings: &Settings,
    intermediate: Option<&Path>,
    pb: ProgressBar,
) -> Result<ReportSummary, ReportError> {
    let normalizer = Normalizer::from_settings(settings);
    let mut report = ReportBuilder::new(&settings.sheet_name);

    info!("Summarizing {} articles", records.len());
    enrich(summarizer, &normalizer, records, &mut report, &pb).await;

    report.finalize(&settings.xlsx_path, intermediate)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::intermediate;
    use crate::summary::normalize::{is_fallback, PAGE_UNREACHABLE, SERVICE_UNAVAILABLE};

    /// Replays canned outcomes and records which links were asked for.
    struct ScriptedSummarizer {
        outcomes: VecDeque<SummaryOutcome>,
        calls: Vec<String>,
    }

    impl ScriptedSummarizer {
        fn new(outcomes: Vec<SummaryOutcome>) -> Self {
            ScriptedSummarizer {
                outcomes: outcomes.into(),
                calls: Vec::new(),
            }
        }
    }

    impl Summarizer for ScriptedSummarizer {
        async fn summarize(&mut self, link: &str) -> SummaryOutcome {
            self.calls.push(link.to_string());
            self.outcomes
                .pop_front()
                .unwrap_or(SummaryOutcome::TransportError("script exhausted".into()))
        }
    }

    fn records(n: u32) -> Vec<Record> {
        (1..=n)
            .map(|i| {
                Record::new(i, &format!("Article number {}", i), &format!("https://example.com/{}", i))
                    .unwrap()
            })
            .collect()
    }

    fn short_success(i: usize) -> SummaryOutcome {
        SummaryOutcome::Success(format!("Article {} explains one thing. Then it trails off", i))
    }

    async fn enrich_all(summarizer: &mut ScriptedSummarizer, input: Vec<Record>) -> ReportBuilder {
        let normalizer = Normalizer::new("Something wrong happened..", 400);
        let mut report = ReportBuilder::new("Hacker News Top 10 Articles");
        enrich(summarizer, &normalizer, input, &mut report, &ProgressBar::hidden()).await;
        report
    }

    #[tokio::test]
    async fn all_successes_fill_every_row() {
        let mut s = ScriptedSummarizer::new((1..=10).map(short_success).collect());
        let report = enrich_all(&mut s, records(10)).await;

        assert_eq!(report.layout().row_count, 11);
        assert_eq!(report.rows().len(), 10);
        for row in report.rows() {
            assert!(!is_fallback(&row.summary));
            assert!(row.summary.ends_with('.'));
        }
    }

    #[tokio::test]
    async fn timeout_on_third_only_affects_rank_three() {
        let outcomes = (1..=10)
            .map(|i| if i == 3 { SummaryOutcome::Timeout } else { short_success(i) })
            .collect();
        let mut s = ScriptedSummarizer::new(outcomes);
        let report = enrich_all(&mut s, records(10)).await;

        for row in report.rows() {
            if row.rank() == 3 {
                assert_eq!(row.summary, PAGE_UNREACHABLE);
            } else {
                assert!(!is_fallback(&row.summary));
            }
        }
    }

    #[tokio::test]
    async fn rows_follow_input_order() {
        let mut s = ScriptedSummarizer::new((1..=5).map(short_success).collect());
        let input = records(5);
        let expected_links: Vec<String> = input.iter().map(|r| r.link.clone()).collect();
        let report = enrich_all(&mut s, input).await;

        assert_eq!(s.calls, expected_links);
        for (i, row) in report.rows().iter().enumerate() {
            // rank i sits on sheet row i + 1
            assert_eq!(row.rank() as usize, i + 1);
        }
    }

    #[tokio::test]
    async fn every_failure_kind_still_yields_a_row() {
        let outcomes = vec![
            SummaryOutcome::Timeout,
            SummaryOutcome::ServiceError("Something wrong happened..".into()),
            SummaryOutcome::TransportError("net::ERR_CONNECTION_RESET".into()),
            SummaryOutcome::Success("Something wrong happened.. again".into()),
        ];
        let mut s = ScriptedSummarizer::new(outcomes);
        let report = enrich_all(&mut s, records(4)).await;

        let summaries: Vec<&str> = report.rows().iter().map(|r| r.summary.as_str()).collect();
        assert_eq!(
            summaries,
            [PAGE_UNREACHABLE, SERVICE_UNAVAILABLE, PAGE_UNREACHABLE, SERVICE_UNAVAILABLE]
        );
        assert_eq!(report.layout().row_count, 5);
    }

    #[tokio::test]
    async fn formatting_is_stable_across_runs() {
        let mut a = ScriptedSummarizer::new((1..=10).map(short_success).collect());
        let mut b = ScriptedSummarizer::new((1..=10).map(short_success).collect());
        let first = enrich_all(&mut a, records(10)).await.layout();
        let second = enrich_all(&mut b, records(10)).await.layout();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn run_writes_report_and_removes_intermediate() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("articles.csv");
        let input = records(10);
        intermediate::write_records(&csv, &input).unwrap();

        let settings = Settings {
            xlsx_path: dir.path().join("report.xlsx"),
            csv_path: csv.clone(),
            ..Settings::default()
        };
        let mut s = ScriptedSummarizer::new((1..=10).map(short_success).collect());
        let summary = run(&mut s, input, &settings, Some(csv.as_path()), ProgressBar::hidden())
            .await
            .unwrap();

        assert_eq!(summary.rows, 10);
        assert_eq!(summary.fallbacks, 0);
        assert!(settings.xlsx_path.exists());
        assert!(!csv.exists());
    }

    #[tokio::test]
    async fn run_failure_keeps_intermediate() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("articles.csv");
        let input = records(2);
        intermediate::write_records(&csv, &input).unwrap();

        let settings = Settings {
            xlsx_path: dir.path().join("no-such-dir").join("report.xlsx"),
            ..Settings::default()
        };
        let mut s = ScriptedSummarizer::new(vec![SummaryOutcome::Timeout, short_success(2)]);
        let result = run(&mut s, input, &settings, Some(csv.as_path()), ProgressBar::hidden()).await;

        assert!(result.is_err());
        assert!(csv.exists());
        assert_eq!(s.calls.len(), 2);
    }
}
