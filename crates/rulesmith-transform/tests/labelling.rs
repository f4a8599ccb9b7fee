//! Labelling behavior of compiled plans on concrete tables.

use polars::prelude::{Column, DataFrame};
use proptest::prelude::*;

use rulesmith_ingest::{any_to_string, count_missing};
use rulesmith_model::{
    Clause, Condition, LabelConfig, Literal, Operator, Rule, RuleSet, TieBreakPolicy,
};
use rulesmith_transform::{apply_plan, compile_plan, label_frame};

fn gt(column: &str, value: f64) -> Clause {
    Clause::new(column, Operator::Gt, Literal::Number(value))
}

fn lt(column: &str, value: f64) -> Clause {
    Clause::new(column, Operator::Lt, Literal::Number(value))
}

fn inventory_rules() -> RuleSet {
    RuleSet::new(vec![
        Rule::new("R1", "Liquidation", Condition::all(vec![gt("age", 180.0)]), "liquidate", 1),
        Rule::new("R2", "Low margin", Condition::all(vec![lt("profit", 5.0)]), "review", 2),
        Rule::new(
            "R3",
            "VIP exemption",
            Condition::all(vec![gt("age", 180.0), gt("profit", 20.0)]),
            "vip_exempt",
            0,
        ),
    ])
}

fn frame(ages: Vec<Option<i64>>, profits: Vec<Option<f64>>) -> DataFrame {
    DataFrame::new(vec![
        Column::new("age".into(), ages),
        Column::new("profit".into(), profits),
    ])
    .unwrap()
}

fn statuses(df: &DataFrame) -> Vec<String> {
    let column = df.column("Status").unwrap();
    (0..column.len())
        .map(|idx| any_to_string(column.get(idx).unwrap()))
        .collect()
}

#[test]
fn inventory_scenarios_pick_expected_labels() {
    let df = frame(
        vec![Some(200), Some(200), Some(50), Some(10)],
        vec![Some(25.0), Some(4.0), Some(2.0), Some(9.0)],
    );
    let out = label_frame(
        &df,
        &inventory_rules(),
        TieBreakPolicy::default(),
        &LabelConfig::default(),
    )
    .unwrap();
    assert_eq!(statuses(&out), vec!["vip_exempt", "liquidate", "review", "Normal"]);
    assert_eq!(out.width(), 3);
}

#[test]
fn more_specific_rule_wins_even_with_worse_priority() {
    let rules = RuleSet::new(vec![
        Rule::new("broad", "broad", Condition::all(vec![gt("age", 10.0)]), "broad", 0),
        Rule::new(
            "narrow",
            "narrow",
            Condition::all(vec![gt("age", 10.0), gt("profit", 1.0)]),
            "narrow",
            9,
        ),
    ]);
    let df = frame(vec![Some(20), Some(20)], vec![Some(5.0), Some(0.0)]);
    let out = label_frame(&df, &rules, TieBreakPolicy::default(), &LabelConfig::default()).unwrap();
    assert_eq!(statuses(&out), vec!["narrow", "broad"]);

    let out = label_frame(
        &df,
        &rules,
        TieBreakPolicy::PriorityThenSpecificity,
        &LabelConfig::default(),
    )
    .unwrap();
    assert_eq!(statuses(&out), vec!["broad", "broad"]);
}

#[test]
fn always_match_rule_labels_every_unmatched_row() {
    let rules = RuleSet::new(vec![
        Rule::new("R1", "old", Condition::all(vec![gt("age", 180.0)]), "liquidate", 1),
        Rule::new("R0", "fallback", Condition::always(), "ok", 5),
    ]);
    let df = frame(vec![Some(1), Some(2), Some(3)], vec![Some(1.0), Some(2.0), Some(3.0)]);
    let out = label_frame(&df, &rules, TieBreakPolicy::default(), &LabelConfig::default()).unwrap();
    assert_eq!(statuses(&out), vec!["ok", "ok", "ok"]);
}

#[test]
fn null_cells_never_match() {
    let df = frame(vec![None, Some(200)], vec![Some(25.0), None]);
    let out = label_frame(
        &df,
        &inventory_rules(),
        TieBreakPolicy::default(),
        &LabelConfig::default(),
    )
    .unwrap();
    assert_eq!(statuses(&out), vec!["Normal", "liquidate"]);
}

#[test]
fn text_clauses_and_custom_labels() {
    let rules = RuleSet::new(vec![Rule::new(
        "eu",
        "EU",
        Condition::all(vec![Clause::new("region", Operator::Eq, Literal::Text("EU".into()))]),
        "gdpr",
        0,
    )]);
    let df = DataFrame::new(vec![Column::new("region".into(), ["EU", "US"])]).unwrap();
    let labels = LabelConfig {
        status_column: "Flag".into(),
        default_label: "none".into(),
    };
    let plan = compile_plan(&rules, TieBreakPolicy::default(), &labels);
    let out = apply_plan(&df, &plan).unwrap();
    let column = out.column("Flag").unwrap();
    assert_eq!(any_to_string(column.get(0).unwrap()), "gdpr");
    assert_eq!(any_to_string(column.get(1).unwrap()), "none");
}

proptest! {
    #[test]
    fn labelling_preserves_row_count(
        rows in prop::collection::vec(
            (prop::option::of(0i64..400), prop::option::of(-10.0f64..50.0)),
            0..64,
        )
    ) {
        let (ages, profits): (Vec<_>, Vec<_>) = rows.into_iter().unzip();
        let df = frame(ages, profits);
        let out = label_frame(
            &df,
            &inventory_rules(),
            TieBreakPolicy::default(),
            &LabelConfig::default(),
        )
        .unwrap();
        prop_assert_eq!(out.height(), df.height());
        prop_assert_eq!(count_missing(out.column("Status").unwrap()), 0);
    }
}
