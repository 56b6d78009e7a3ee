// Property-based tests for identity sets, field comparison and propagation.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::BTreeSet;

use proptest::prelude::*;
use skuflow_recon::family::{Propagation, SeedSet};
use skuflow_recon::identity::{compare, key_set};
use skuflow_recon::model::CheckOutcome;
use skuflow_recon::predicate::Condition;
use skuflow_recon::reconcile::{reconcile, ComparisonRule, JoinSuffixes, Side};
use skuflow_recon::schema::validate;
use skuflow_recon::{Cell, Table};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Identifier: small alphabet so the two sides overlap, sometimes padded or blank.
fn arb_key() -> impl Strategy<Value = Cell> {
    prop_oneof![
        6 => r"S[0-9]{1,2}".prop_map(Some),
        1 => r" S[0-9] ".prop_map(Some),
        1 => Just(Some("  ".to_string())),
        1 => Just(None),
    ]
}

fn arb_value() -> impl Strategy<Value = Cell> {
    prop_oneof![
        3 => r"[a-c]{1,2}".prop_map(Some),
        1 => Just(Some(String::new())),
        1 => Just(None),
    ]
}

fn arb_flag() -> impl Strategy<Value = Cell> {
    prop_oneof![
        Just(Some("No".to_string())),
        Just(Some("no".to_string())),
        Just(Some("Yes".to_string())),
        Just(None),
    ]
}

fn arb_group() -> impl Strategy<Value = Cell> {
    prop_oneof![
        4 => r"G[0-3]".prop_map(Some),
        1 => Just(None),
    ]
}

/// Table with columns `sku`, `color`, `kind`.
fn arb_table() -> impl Strategy<Value = Table> {
    prop::collection::vec((arb_key(), arb_value(), arb_flag()), 0..24).prop_map(|rows| {
        let rows = rows.into_iter().map(|(k, v, f)| vec![k, v, f]).collect();
        Table::from_rows(["sku", "color", "kind"], rows).unwrap()
    })
}

/// Export with columns `sku`, `group`, `retired`.
fn arb_export() -> impl Strategy<Value = Table> {
    prop::collection::vec((arb_key(), arb_group(), arb_flag()), 0..32).prop_map(|rows| {
        let rows = rows.into_iter().map(|(k, g, f)| vec![k, g, f]).collect();
        Table::from_rows(["sku", "group", "retired"], rows).unwrap()
    })
}

fn rules(side: Side) -> Vec<ComparisonRule> {
    vec![ComparisonRule {
        field: "color".into(),
        skip_when: vec![Condition::new("kind", "yes")],
        side,
    }]
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn missing_keys_cover_b_and_avoid_a(a in arb_table(), b in arb_table()) {
        let diff = compare(&a, &b, "sku").unwrap();
        let keys_a = key_set(&a, "sku");
        let keys_b = key_set(&b, "sku");

        prop_assert!(diff.missing_in_a.is_disjoint(&keys_a));
        let union: BTreeSet<String> = diff.missing_in_a.union(&keys_a).cloned().collect();
        prop_assert!(union.is_superset(&keys_b));
        prop_assert!(diff.extra_in_a.is_disjoint(&keys_b));
        prop_assert!(diff.missing_in_a.iter().chain(&diff.extra_in_a).all(|k| k.trim() == k && !k.is_empty()));
    }

    #[test]
    fn reconcile_is_symmetric_under_swap(a in arb_table(), b in arb_table()) {
        let suffixes = JoinSuffixes::default();
        let forward = reconcile(&a, &b, "sku", &rules(Side::A), &suffixes).unwrap();
        let backward = reconcile(&b, &a, "sku", &rules(Side::B), &suffixes.swapped()).unwrap();

        prop_assert_eq!(forward.joined_rows, backward.joined_rows);
        let (CheckOutcome::Ran(f), CheckOutcome::Ran(r)) = (&forward.fields[0].outcome, &backward.fields[0].outcome) else {
            panic!("color is present on both sides");
        };
        prop_assert_eq!(f.skipped_rows, r.skipped_rows);

        let col_a = "color_ImportFile";
        let col_b = "color_SkuList";
        let mut fwd: Vec<(Option<&str>, Option<&str>, Option<&str>)> = (0..f.table.len())
            .map(|i| (f.table.value(i, "sku"), f.table.value(i, col_a), f.table.value(i, col_b)))
            .collect();
        // Swapped suffixes keep each input's values under its own suffix.
        let mut bwd: Vec<(Option<&str>, Option<&str>, Option<&str>)> = (0..r.table.len())
            .map(|i| (r.table.value(i, "sku"), r.table.value(i, col_a), r.table.value(i, col_b)))
            .collect();
        fwd.sort();
        bwd.sort();
        prop_assert_eq!(fwd, bwd);
    }

    #[test]
    fn propagation_never_mutates_and_stays_in_family(export in arb_export(), seeds in prop::collection::vec(r"S[0-9]{1,2}", 0..4)) {
        let before = export.clone();
        let seeds = SeedSet::from_keys(&seeds);
        let prop = Propagation::new("sku", "group");
        let eligibility = [Condition::new("retired", "no")];
        let sel = prop.propagate(&export, &seeds, &eligibility).unwrap();

        prop_assert_eq!(&export, &before);
        prop_assert!(sel.eligible.rows.iter().all(|i| sel.family.rows.contains(i)));
        prop_assert!(sel.eligible.rows.windows(2).all(|w| w[0] < w[1]));
        for r in sel.eligible.table.rows() {
            let group = r.get("group").map(str::trim).unwrap_or("");
            prop_assert!(sel.group_ids.contains(group));
            prop_assert!(eligibility[0].holds(r));
        }
        for i in &sel.base.rows {
            prop_assert!(seeds.contains(export.value(*i, "sku")));
        }
    }

    #[test]
    fn schema_validation_is_idempotent(t in arb_table(), required in prop::collection::vec("(sku|color|kind|size|batch)", 0..6)) {
        let first = validate(&t, &required);
        prop_assert_eq!(&first, &validate(&t, &required));
        prop_assert_eq!(first.present, first.missing.is_empty());
        prop_assert!(first.missing.iter().all(|m| m == "size" || m == "batch"));
    }
}
