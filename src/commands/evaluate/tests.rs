use std::collections::BTreeMap;

use crate::model::{GroupCounts, Judgment, ScoredDocument};

use super::error::FairnessError;
use super::groups::{ProtectedGroup, TieBreaking, group_counts, select_protected_group};
use super::measure::FairnessMeasure;
use super::pipeline;
use super::rnd::normalized_discounted_difference;

fn judgment(query_id: &str, doc_id: &str, group: &str) -> Judgment {
    let mut attrs = BTreeMap::new();
    attrs.insert("group".to_string(), group.to_string());
    Judgment {
        query_id: query_id.to_string(),
        doc_id: doc_id.to_string(),
        attrs,
    }
}

fn ranked_doc(query_id: &str, doc_id: &str, score: f64, rank: usize, group: &str) -> ScoredDocument {
    let mut attrs = BTreeMap::new();
    attrs.insert("group".to_string(), group.to_string());
    ScoredDocument {
        query_id: query_id.to_string(),
        doc_id: doc_id.to_string(),
        score,
        rank: Some(rank),
        stance_value: None,
        stance_label: None,
        attrs,
    }
}

fn counts(entries: &[(&str, usize)]) -> GroupCounts {
    entries
        .iter()
        .map(|(group, count)| (group.to_string(), *count))
        .collect()
}

#[test]
fn group_counts_defaults_absent_groups_to_zero() {
    let judgments = vec![
        judgment("q1", "d1", "A"),
        judgment("q1", "d2", "A"),
        judgment("q1", "d3", "B"),
    ];

    let counted = group_counts(&judgments, "group").expect("counts should compute");
    assert_eq!(counted.count("A"), 2);
    assert_eq!(counted.count("B"), 1);
    assert_eq!(counted.count("C"), 0);
    assert_eq!(counted.total(), 3);
}

#[test]
fn group_counts_tolerates_empty_judgments() {
    let counted = group_counts(&[], "group").expect("empty counts should compute");
    assert!(counted.is_empty());
    assert_eq!(counted.count("anything"), 0);
}

#[test]
fn group_counts_rejects_missing_group_column() {
    let judgments = vec![judgment("q1", "d1", "A")];
    let error = group_counts(&judgments, "stance").expect_err("missing column should fail");
    assert!(matches!(error, FairnessError::Validation { .. }));
}

#[test]
fn minority_selection_with_unique_minimum_needs_no_tie_breaking() {
    let counted = counts(&[("A", 3), ("B", 1), ("C", 2)]);
    let selected = select_protected_group(&counted, &ProtectedGroup::Minority, None, 7)
        .expect("unique minimum should select");
    assert_eq!(selected, "B");
}

#[test]
fn majority_selection_picks_largest_count() {
    let counted = counts(&[("A", 3), ("B", 1), ("C", 2)]);
    let selected = select_protected_group(&counted, &ProtectedGroup::Majority, None, 7)
        .expect("unique maximum should select");
    assert_eq!(selected, "A");
}

#[test]
fn tied_minimum_without_tie_breaking_is_a_configuration_error() {
    let counted = counts(&[("A", 1), ("B", 1), ("C", 2)]);
    let error = select_protected_group(&counted, &ProtectedGroup::Minority, None, 7)
        .expect_err("unresolved tie should fail");

    assert!(matches!(error, FairnessError::Configuration { .. }));
    let message = error.to_string();
    assert!(message.contains("A") && message.contains("B"), "unexpected: {message}");
    assert!(message.contains("1 time(s)"), "unexpected: {message}");
}

#[test]
fn tie_breaking_by_group_order_is_deterministic() {
    let counted = counts(&[("alpha", 1), ("beta", 1)]);

    let ascending = select_protected_group(
        &counted,
        &ProtectedGroup::Minority,
        Some(&TieBreaking::GroupAscending),
        7,
    )
    .expect("ascending tie break should select");
    assert_eq!(ascending, "alpha");

    let descending = select_protected_group(
        &counted,
        &ProtectedGroup::Minority,
        Some(&TieBreaking::GroupDescending),
        7,
    )
    .expect("descending tie break should select");
    assert_eq!(descending, "beta");
}

#[test]
fn tie_breaking_by_preference_list_picks_first_listed_tied_group() {
    let counted = counts(&[("A", 1), ("B", 1), ("C", 1)]);
    let preference = TieBreaking::parse("C,B");

    let selected = select_protected_group(
        &counted,
        &ProtectedGroup::Minority,
        Some(&preference),
        7,
    )
    .expect("preference tie break should select");
    assert_eq!(selected, "C");
}

#[test]
fn tie_breaking_preference_without_overlap_is_a_validation_error() {
    let counted = counts(&[("A", 1), ("B", 1)]);
    let preference = TieBreaking::parse("X,Y");

    let error = select_protected_group(
        &counted,
        &ProtectedGroup::Minority,
        Some(&preference),
        7,
    )
    .expect_err("non-overlapping preference should fail");
    assert!(matches!(error, FairnessError::Validation { .. }));
}

#[test]
fn random_tie_breaking_is_seed_deterministic_and_picks_a_tied_group() {
    let counted = counts(&[("A", 1), ("B", 1), ("C", 2)]);

    let first = select_protected_group(
        &counted,
        &ProtectedGroup::Minority,
        Some(&TieBreaking::Random),
        0xC0FFEE,
    )
    .expect("random tie break should select");
    let second = select_protected_group(
        &counted,
        &ProtectedGroup::Minority,
        Some(&TieBreaking::Random),
        0xC0FFEE,
    )
    .expect("random tie break should select");

    assert_eq!(first, second, "same seed should pick the same group");
    assert!(first == "A" || first == "B", "unexpected pick: {first}");
}

#[test]
fn explicit_protected_group_bypasses_counting() {
    let counted = counts(&[]);
    let selected = select_protected_group(
        &counted,
        &ProtectedGroup::Explicit("B".to_string()),
        None,
        7,
    )
    .expect("explicit group should select");
    assert_eq!(selected, "B");
}

#[test]
fn counting_selection_over_empty_counts_is_a_configuration_error() {
    let error = select_protected_group(&counts(&[]), &ProtectedGroup::Minority, None, 7)
        .expect_err("empty counts should fail");
    assert!(matches!(error, FairnessError::Configuration { .. }));
}

#[test]
fn rnd_matches_the_worked_three_document_example() {
    let counted = counts(&[("A", 2), ("B", 1)]);
    let ranking = vec![
        ranked_doc("q1", "d1", 3.0, 1, "A"),
        ranked_doc("q1", "d2", 2.0, 2, "A"),
        ranked_doc("q1", "d3", 1.0, 3, "B"),
    ];

    let value = normalized_discounted_difference(&ranking, "group", &counted, "B")
        .expect("rnd should compute");
    let expected = 1.0 / 3.0 + (1.0 / 3.0_f64.log2()) * (1.0 / 3.0);
    assert!((value - expected).abs() < 1e-9, "value = {value}");
}

#[test]
fn rnd_is_zero_when_every_prefix_matches_the_population_share() {
    let counted = counts(&[("A", 2)]);
    let ranking = vec![
        ranked_doc("q1", "d1", 2.0, 1, "A"),
        ranked_doc("q1", "d2", 1.0, 2, "A"),
    ];

    let value = normalized_discounted_difference(&ranking, "group", &counted, "A")
        .expect("rnd should compute");
    assert!(value.abs() < 1e-12, "value = {value}");
}

#[test]
fn rnd_is_invariant_to_zero_based_rank_inputs() {
    let counted = counts(&[("A", 2), ("B", 1)]);
    let one_based = vec![
        ranked_doc("q1", "d1", 3.0, 1, "A"),
        ranked_doc("q1", "d2", 2.0, 2, "B"),
        ranked_doc("q1", "d3", 1.0, 3, "A"),
    ];
    let zero_based = vec![
        ranked_doc("q1", "d1", 3.0, 0, "A"),
        ranked_doc("q1", "d2", 2.0, 1, "B"),
        ranked_doc("q1", "d3", 1.0, 2, "A"),
    ];

    let from_one = normalized_discounted_difference(&one_based, "group", &counted, "B")
        .expect("rnd should compute");
    let from_zero = normalized_discounted_difference(&zero_based, "group", &counted, "B")
        .expect("rnd should compute");
    assert!((from_one - from_zero).abs() < 1e-12);
    assert!(from_one >= 0.0);
}

#[test]
fn rnd_rejects_an_empty_judged_population() {
    let ranking = vec![ranked_doc("q1", "d1", 1.0, 1, "A")];
    let error = normalized_discounted_difference(&ranking, "group", &counts(&[]), "A")
        .expect_err("empty population should fail");
    assert!(matches!(error, FairnessError::Validation { .. }));
}

#[test]
fn measure_parsing_round_trips_canonical_forms() {
    for raw in [
        "rND",
        "rND@10",
        "rND@10(protected_group=majority)",
        "rND(group_col=stance,protected_group=B)",
        "rND@5(tie_breaking=group-ascending)",
    ] {
        let measure = FairnessMeasure::parse(raw).expect("measure should parse");
        assert_eq!(measure.to_string(), raw);
    }
}

#[test]
fn measure_parsing_keeps_comma_preference_lists_intact() {
    let measure = FairnessMeasure::parse("rND(tie_breaking='B,A')").expect("measure should parse");
    assert_eq!(
        measure.tie_breaking,
        Some(TieBreaking::Preference(vec!["B".to_string(), "A".to_string()]))
    );
    assert_eq!(measure.to_string(), "rND(tie_breaking='B,A')");
}

#[test]
fn measure_parsing_omits_defaulted_parameters() {
    let measure = FairnessMeasure::parse("rND@10(group_col=group,protected_group=minority)")
        .expect("measure should parse");
    assert_eq!(measure.to_string(), "rND@10");
}

#[test]
fn unknown_measure_names_and_parameters_are_configuration_errors() {
    let unknown_name = FairnessMeasure::parse("nDCG@10").expect_err("unknown name should fail");
    assert!(matches!(unknown_name, FairnessError::Configuration { .. }));

    let unknown_param =
        FairnessMeasure::parse("rND(depth=3)").expect_err("unknown parameter should fail");
    assert!(matches!(unknown_param, FairnessError::Configuration { .. }));
}

#[test]
fn pipeline_emits_one_metric_per_query_and_measure() {
    let qrels = vec![
        judgment("q1", "d1", "A"),
        judgment("q1", "d2", "A"),
        judgment("q1", "d3", "B"),
        judgment("q2", "d4", "A"),
        judgment("q2", "d5", "B"),
        judgment("q2", "d6", "B"),
    ];
    let run = vec![
        ranked_doc("q2", "d4", 2.0, 1, "A"),
        ranked_doc("q2", "d5", 1.0, 2, "B"),
        ranked_doc("q1", "d1", 3.0, 1, "A"),
        ranked_doc("q1", "d2", 2.0, 2, "A"),
        ranked_doc("q1", "d3", 1.0, 3, "B"),
    ];
    let measures = vec![FairnessMeasure::parse("rND").expect("measure should parse")];

    let metrics = pipeline::evaluate(&qrels, &run, &measures, 7).expect("pipeline should run");
    assert_eq!(metrics.len(), 2);
    assert_eq!(metrics[0].query_id, "q1");
    assert_eq!(metrics[1].query_id, "q2");
    assert!(metrics.iter().all(|record| record.measure == "rND"));
    assert!(metrics.iter().all(|record| record.value >= 0.0));
}

#[test]
fn pipeline_truncates_rankings_to_the_measure_cutoff() {
    let qrels = vec![
        judgment("q1", "d1", "A"),
        judgment("q1", "d2", "A"),
        judgment("q1", "d3", "B"),
    ];
    let run = vec![
        ranked_doc("q1", "d1", 3.0, 1, "A"),
        ranked_doc("q1", "d2", 2.0, 2, "A"),
        ranked_doc("q1", "d3", 1.0, 3, "B"),
    ];
    let full = vec![FairnessMeasure::parse("rND").expect("measure should parse")];
    let cut = vec![FairnessMeasure::parse("rND@1").expect("measure should parse")];

    let full_metrics = pipeline::evaluate(&qrels, &run, &full, 7).expect("pipeline should run");
    let cut_metrics = pipeline::evaluate(&qrels, &run, &cut, 7).expect("pipeline should run");

    // Only the first prefix term remains under the cutoff.
    let expected_cut = (0.0_f64 / 1.0 - 1.0 / 3.0).abs();
    assert!((cut_metrics[0].value - expected_cut).abs() < 1e-9);
    assert!(full_metrics[0].value > cut_metrics[0].value);
}

#[test]
fn pipeline_fails_fast_when_a_query_has_no_judgments() {
    let qrels = vec![judgment("q1", "d1", "A"), judgment("q1", "d2", "B")];
    let run = vec![
        ranked_doc("q1", "d1", 2.0, 1, "A"),
        ranked_doc("q9", "d9", 1.0, 1, "A"),
    ];
    let measures = vec![FairnessMeasure::parse("rND").expect("measure should parse")];

    let error = pipeline::evaluate(&qrels, &run, &measures, 7)
        .expect_err("unjudged query should fail selection");
    assert!(matches!(error, FairnessError::Configuration { .. }));
}

#[test]
fn pipeline_rejects_explicit_protected_group_outside_known_groups() {
    let qrels = vec![judgment("q1", "d1", "A"), judgment("q1", "d2", "B")];
    let run = vec![
        ranked_doc("q1", "d1", 2.0, 1, "A"),
        ranked_doc("q1", "d2", 1.0, 2, "B"),
    ];
    let measures =
        vec![FairnessMeasure::parse("rND(protected_group=Z)").expect("measure should parse")];

    let error = pipeline::evaluate(&qrels, &run, &measures, 7)
        .expect_err("unknown explicit group should fail");
    assert!(matches!(error, FairnessError::Validation { .. }));
}
