//! Property tests for document invariants and normalization functions.

use proptest::prelude::*;

use mender::core::document::{parse_document, ScanDocument};
use mender::core::types::{ScanId, Severity};
use mender::knowledge::{filter_passages, Passage, MAX_PASSAGES, RELEVANCE_FLOOR};
use mender::model::{classify_response, recover_fix};
use mender::pipeline::normalize_findings;
use mender::scanner::{RawExtra, RawPosition, RawResult};

fn raw_result_strategy() -> impl Strategy<Value = RawResult> {
    (
        "[a-z][a-z0-9.-]{0,30}",
        "[a-z][a-z0-9/_.]{0,40}",
        0u64..10_000,
        prop_oneof![
            Just("ERROR".to_string()),
            Just("WARNING".to_string()),
            Just("INFO".to_string()),
            Just("error".to_string()),
            "[A-Za-z]{0,12}",
        ],
        ".{0,80}",
        ".{0,80}",
    )
        .prop_map(|(check_id, path, line, severity, message, lines)| RawResult {
            check_id,
            path,
            start: RawPosition { line },
            end: None,
            extra: RawExtra {
                severity,
                message,
                lines,
            },
        })
}

proptest! {
    /// stats.total_findings == len(findings) after the scanner builds a
    /// document, whatever the tool emitted.
    #[test]
    fn total_findings_always_matches(raw in prop::collection::vec(raw_result_strategy(), 0..20)) {
        let findings = normalize_findings(&raw);
        let doc = ScanDocument::new(
            ScanId::new("scan_prop").unwrap(),
            "https://example.com/repo.git",
            findings,
        );
        prop_assert_eq!(doc.stats.total_findings as usize, doc.findings.len());
        prop_assert!(doc.validate().is_ok());
    }

    /// The named severity sub-counts never exceed the total, and the
    /// difference is exactly the unknown-severity findings.
    #[test]
    fn severity_sub_counts_exclude_unknown(raw in prop::collection::vec(raw_result_strategy(), 0..20)) {
        let findings = normalize_findings(&raw);
        let doc = ScanDocument::new(
            ScanId::new("scan_prop").unwrap(),
            "https://example.com/repo.git",
            findings,
        );
        let named = doc.stats.high_severity + doc.stats.medium_severity + doc.stats.low_severity;
        let unknown = doc
            .findings
            .iter()
            .filter(|f| f.severity == Severity::Unknown)
            .count() as u64;
        prop_assert_eq!(named + unknown, doc.stats.total_findings);
    }

    /// Normalization is deterministic and id assignment is positional.
    #[test]
    fn normalization_is_idempotent(raw in prop::collection::vec(raw_result_strategy(), 0..20)) {
        let first = normalize_findings(&raw);
        let second = normalize_findings(&raw);
        prop_assert_eq!(&first, &second);
        for (index, finding) in first.iter().enumerate() {
            prop_assert_eq!(&finding.id, &format!("finding_{index}"));
        }
    }

    /// Documents survive a JSON round trip bit-for-bit.
    #[test]
    fn document_round_trips(raw in prop::collection::vec(raw_result_strategy(), 0..12)) {
        let doc = ScanDocument::new(
            ScanId::new("scan_prop").unwrap(),
            "https://example.com/repo.git",
            normalize_findings(&raw),
        );
        let json = doc.to_json_pretty().unwrap();
        let parsed = parse_document(&json).unwrap();
        prop_assert_eq!(parsed, doc);
    }

    /// Passage filtering keeps only scores strictly above the floor,
    /// at most MAX_PASSAGES, in descending order, drawn from the input.
    #[test]
    fn passage_filter_properties(scores in prop::collection::vec(0.0f64..1.0, 0..12)) {
        let passages: Vec<Passage> = scores
            .iter()
            .map(|&score| Passage { text: format!("p{score}"), score, source: None })
            .collect();
        let kept = filter_passages(passages.clone());

        prop_assert!(kept.len() <= MAX_PASSAGES);
        prop_assert!(kept.iter().all(|p| p.score > RELEVANCE_FLOOR));
        prop_assert!(kept.windows(2).all(|w| w[0].score >= w[1].score));
        for p in &kept {
            prop_assert!(passages.iter().any(|q| q.score == p.score && q.text == p.text));
        }

        let expected = scores.iter().filter(|&&s| s > RELEVANCE_FLOOR).count().min(MAX_PASSAGES);
        prop_assert_eq!(kept.len(), expected);
    }

    /// Fix recovery never panics: any response text yields either the
    /// parsed record or the zero-confidence sentinel carrying the
    /// original snippet.
    #[test]
    fn fix_recovery_total(text in ".{0,200}", snippet in ".{0,50}") {
        let fix = recover_fix(classify_response(&text), &snippet);
        if fix.is_sentinel() {
            prop_assert_eq!(fix.confidence, 0.0);
            prop_assert_eq!(fix.code, snippet);
        }
    }
}
