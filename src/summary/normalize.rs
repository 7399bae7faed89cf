use super::{is_service_error, SummaryOutcome};
use crate::report::{clip_chars, MAX_CELL_CHARS};
use crate::settings::Settings;

pub const SERVICE_UNAVAILABLE: &str = "Summary Unavailable.";
pub const PAGE_UNREACHABLE: &str = "Summary Unavailable, URL page could not be accessed.";

/// Turns any [`SummaryOutcome`] into text fit for a report cell. Never returns an empty string.
#[derive(Debug, Clone)]
pub struct Normalizer {
    error_marker: String,
    max_words: usize,
}

impl Normalizer {
    pub fn new(error_marker: impl Into<String>, max_words: usize) -> Self {
        Normalizer {
            error_marker: error_marker.into(),
            max_words: max_words.max(1),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.error_marker.clone(), settings.max_words)
    }

    pub fn normalize(&self, outcome: &SummaryOutcome) -> String {
        match outcome {
            SummaryOutcome::Success(raw) => {
                if is_service_error(raw, &self.error_marker) {
                    return SERVICE_UNAVAILABLE.to_string();
                }
                let text = truncate_summary(raw, self.max_words);
                if text.is_empty() {
                    SERVICE_UNAVAILABLE.to_string()
                } else {
                    text
                }
            }
            SummaryOutcome::ServiceError(_) => SERVICE_UNAVAILABLE.to_string(),
            SummaryOutcome::Timeout | SummaryOutcome::TransportError(_) => {
                PAGE_UNREACHABLE.to_string()
            }
        }
    }
}

/// Keep the first `max_words` words, then cut after the last full stop in that window.
/// Without a full stop the word window is returned as is. The window never exceeds
/// one sheet cell.
pub fn truncate_summary(raw: &str, max_words: usize) -> String {
    let words = raw
        .split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ");
    let excerpt = clip_chars(&words, MAX_CELL_CHARS);

    match excerpt.rfind('.') {
        Some(idx) => excerpt[..=idx].to_string(),
        None => excerpt.to_string(),
    }
}

pub fn is_fallback(summary: &str) -> bool {
    summary == SERVICE_UNAVAILABLE || summary == PAGE_UNREACHABLE
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = "Something wrong happened..";

    fn normalizer() -> Normalizer {
        Normalizer::new(MARKER, 400)
    }

    fn numbered_words(count: usize, periods_after: &[usize]) -> String {
        (1..=count)
            .map(|i| {
                if periods_after.contains(&i) {
                    format!("w{}.", i)
                } else {
                    format!("w{}", i)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn cuts_at_last_period_inside_window() {
        let raw = numbered_words(500, &[50, 200, 450]);
        let out = normalizer().normalize(&SummaryOutcome::Success(raw));

        let words: Vec<&str> = out.split(' ').collect();
        assert_eq!(words.len(), 200);
        assert_eq!(*words.last().unwrap(), "w200.");
        assert!(out.ends_with('.'));
        assert!(!words.iter().any(|w| w.trim_end_matches('.') == "w401"));
    }

    #[test]
    fn no_period_keeps_whole_window() {
        let raw = numbered_words(400, &[]);
        let out = normalizer().normalize(&SummaryOutcome::Success(raw.clone()));
        assert_eq!(out, raw);
        assert!(!out.ends_with("..."));
    }

    #[test]
    fn no_period_beyond_window_is_cut_to_window() {
        let raw = numbered_words(450, &[]);
        let out = truncate_summary(&raw, 400);
        assert_eq!(out.split(' ').count(), 400);
        assert!(out.ends_with("w400"));
    }

    #[test]
    fn whitespace_collapses_to_single_spaces() {
        assert_eq!(truncate_summary("One  two\n\tthree. four", 400), "One two three.");
    }

    #[test]
    fn trailing_partial_sentence_dropped() {
        let out = normalizer().normalize(&SummaryOutcome::Success(
            "First sentence. Second sentence. And a trailing".into(),
        ));
        assert_eq!(out, "First sentence. Second sentence.");
    }

    #[test]
    fn sentinel_maps_to_service_fallback() {
        let raw = format!("{} The server said no. Really.", MARKER);
        assert_eq!(
            normalizer().normalize(&SummaryOutcome::Success(raw)),
            SERVICE_UNAVAILABLE
        );
        assert_eq!(
            normalizer().normalize(&SummaryOutcome::ServiceError(MARKER.into())),
            SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn configured_marker_is_used() {
        let n = Normalizer::new("ERR:", 400);
        assert_eq!(
            n.normalize(&SummaryOutcome::Success("ERR: quota exceeded.".into())),
            SERVICE_UNAVAILABLE
        );
        assert_eq!(
            n.normalize(&SummaryOutcome::Success(format!("{} fine.", MARKER))),
            format!("{} fine.", MARKER)
        );
    }

    #[test]
    fn timeout_and_transport_map_to_unreachable() {
        let n = normalizer();
        assert_eq!(n.normalize(&SummaryOutcome::Timeout), PAGE_UNREACHABLE);
        assert_eq!(
            n.normalize(&SummaryOutcome::TransportError("net::ERR_NAME_NOT_RESOLVED".into())),
            PAGE_UNREACHABLE
        );
    }

    #[test]
    fn empty_success_is_never_blank() {
        assert_eq!(
            normalizer().normalize(&SummaryOutcome::Success("   ".into())),
            SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn oversized_word_is_clipped_to_one_cell() {
        let out = normalizer().normalize(&SummaryOutcome::Success("x".repeat(40_000)));
        assert_eq!(out.chars().count(), MAX_CELL_CHARS);
    }

    #[test]
    fn oversized_window_cuts_at_last_period_that_fits() {
        let raw = format!("{}. {}. tail", "a".repeat(20_000), "b".repeat(20_000));
        let out = truncate_summary(&raw, 400);
        assert_eq!(out, format!("{}.", "a".repeat(20_000)));
    }

    #[test]
    fn fallbacks_recognised() {
        assert!(is_fallback(SERVICE_UNAVAILABLE));
        assert!(is_fallback(PAGE_UNREACHABLE));
        assert!(!is_fallback("A real summary."));
    }
}
