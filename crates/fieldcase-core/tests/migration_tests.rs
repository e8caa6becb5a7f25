use fieldcase_core::prelude::*;
use fieldcase_core::scope::Binding;
use fieldcase_test_utils::{
    arcade_item, arcade_widget, dashboard, dashboard_with_arcade, feature_set_script, item_widget,
    target_dataset, OTHER_ID, TARGET_ID,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn vocabulary(policy: CasePolicy) -> Vocabulary {
    Vocabulary::new(&target_dataset(), ["PopDensity", "Tract_ID"], policy).unwrap()
}

fn arcade_script(script_id: &str) -> Binding {
    Binding::ArcadeScript {
        script_id: script_id.into(),
    }
}

fn authoritative() -> Migrator {
    Migrator::new(MigrationConfig::new().with_case_policy(CasePolicy::Authoritative))
}

#[test]
fn test_single_field_example() {
    let doc = dashboard(vec![item_widget(TARGET_ID, json!({"fieldName": "POPDENSITY"}))]);

    let outcome = authoritative()
        .migrate_with_vocabulary(&doc, &vocabulary(CasePolicy::Authoritative))
        .unwrap();
    assert!(outcome.changed);
    assert_eq!(
        outcome.document.pointer("/desktopView/widgets/0/fieldName"),
        Some(&json!("PopDensity"))
    );

    let outcome = Migrator::default()
        .migrate_with_vocabulary(&doc, &vocabulary(CasePolicy::Lowercase))
        .unwrap();
    assert!(outcome.changed);
    assert_eq!(
        outcome.document.pointer("/desktopView/widgets/0/fieldName"),
        Some(&json!("popdensity"))
    );
}

#[test]
fn test_template_example() {
    let doc = dashboard(vec![item_widget(
        TARGET_ID,
        json!({"text": "Population is {POPDENSITY} per {tract_id}"}),
    )]);
    let outcome = authoritative()
        .migrate_with_vocabulary(&doc, &vocabulary(CasePolicy::Authoritative))
        .unwrap();
    assert_eq!(
        outcome.document.pointer("/desktopView/widgets/0/text"),
        Some(&json!("Population is {PopDensity} per {Tract_ID}"))
    );
}

#[test]
fn test_ordering_example() {
    let doc = dashboard(vec![item_widget(
        TARGET_ID,
        json!({"orderByFields": ["POPDENSITY DESC"]}),
    )]);
    let outcome = authoritative()
        .migrate_with_vocabulary(&doc, &vocabulary(CasePolicy::Authoritative))
        .unwrap();
    assert_eq!(
        outcome.document.pointer("/desktopView/widgets/0/orderByFields"),
        Some(&json!(["PopDensity DESC"]))
    );
}

#[test]
fn test_noop_run() {
    let doc = dashboard(vec![item_widget(
        TARGET_ID,
        json!({"fieldName": "Other", "text": "no tokens", "orderByFields": ["Y ASC"]}),
    )]);
    let v = Vocabulary::new(&target_dataset(), ["X"], CasePolicy::Lowercase).unwrap();
    let outcome = Migrator::default().migrate_with_vocabulary(&doc, &v).unwrap();

    assert!(!outcome.changed);
    assert_eq!(outcome.document.to_json().unwrap(), doc.to_json().unwrap());
}

#[test]
fn test_scope_isolation() {
    let doc = dashboard(vec![
        item_widget(TARGET_ID, json!({"valueField": "POPDENSITY"})),
        item_widget(OTHER_ID, json!({"valueField": "POPDENSITY", "text": "{TRACT_ID}"})),
        json!({"type": "textWidget", "text": "{POPDENSITY}"}),
    ]);
    let outcome = Migrator::default()
        .migrate_with_vocabulary(&doc, &vocabulary(CasePolicy::Lowercase))
        .unwrap();

    let widgets = outcome.document.pointer("/desktopView/widgets").unwrap();
    assert_eq!(widgets[0]["valueField"], json!("popdensity"));
    assert_eq!(widgets[1]["valueField"], json!("POPDENSITY"));
    assert_eq!(widgets[1]["text"], json!("{TRACT_ID}"));
    assert_eq!(widgets[2]["text"], json!("{POPDENSITY}"));
}

#[test]
fn test_token_boundary() {
    let doc = dashboard(vec![item_widget(
        TARGET_ID,
        json!({"expression": "$feature.SURNAME + ', ' + $feature.NAME"}),
    )]);
    let v = Vocabulary::new(&target_dataset(), ["NAME"], CasePolicy::Lowercase).unwrap();
    let outcome = Migrator::default().migrate_with_vocabulary(&doc, &v).unwrap();
    assert_eq!(
        outcome.document.pointer("/desktopView/widgets/0/expression"),
        Some(&json!("$feature.SURNAME + ', ' + $feature.name"))
    );
}

#[test]
fn test_sentinel_preserved() {
    let doc = dashboard(vec![item_widget(TARGET_ID, json!({"valueField": "absoluteValue"}))]);
    let v = Vocabulary::new(&target_dataset(), ["AbsoluteValue"], CasePolicy::Authoritative)
        .unwrap();
    let outcome = authoritative().migrate_with_vocabulary(&doc, &v).unwrap();
    assert!(!outcome.changed);
    assert_eq!(outcome.document, doc);
}

#[test]
fn test_ambiguous_arcade_rejected() {
    let script = feature_set_script(&[TARGET_ID, OTHER_ID], &["POPDENSITY"]);
    let doc = dashboard_with_arcade(
        vec![
            item_widget(TARGET_ID, json!({"valueField": "POPDENSITY"})),
            arcade_widget("expr-1", json!({"fieldName": "POPDENSITY"})),
        ],
        vec![arcade_item("expr-1", &script)],
    );
    let before = doc.to_json().unwrap();

    let err = Migrator::default()
        .migrate_with_vocabulary(&doc, &vocabulary(CasePolicy::Lowercase))
        .unwrap_err();
    assert!(matches!(
        err,
        MigrationError::AmbiguousScope { ref script_id, .. } if script_id == "expr-1"
    ));
    assert!(err.to_string().contains("expr-1"));
    assert!(err.requires_manual_edit());
    assert_eq!(doc.to_json().unwrap(), before);
}

#[test]
fn test_arcade_scopes() {
    let script = feature_set_script(&[TARGET_ID], &["POPDENSITY", "TRACT_ID"]);
    let doc = dashboard_with_arcade(
        vec![
            arcade_widget("expr-1", json!({"fieldName": "POPDENSITY"})),
            arcade_widget("expr-2", json!({"fieldName": "POPDENSITY"})),
        ],
        vec![
            arcade_item("expr-1", &script),
            arcade_item("expr-2", &feature_set_script(&[OTHER_ID], &["POPDENSITY"])),
        ],
    );
    let outcome = Migrator::default()
        .migrate_with_vocabulary(&doc, &vocabulary(CasePolicy::Lowercase))
        .unwrap();

    let bindings: Vec<(&str, &Binding)> = outcome
        .scopes
        .iter()
        .map(|s| (s.pointer.as_str(), &s.binding))
        .collect();
    assert_eq!(
        bindings,
        vec![
            ("/arcadeDataSourceItems/0/script", &arcade_script("expr-1")),
            ("/desktopView/widgets/0", &Binding::ArcadeDataSource { script_id: "expr-1".into() }),
        ]
    );

    let d = &outcome.document;
    assert_eq!(d.pointer("/desktopView/widgets/0/fieldName"), Some(&json!("popdensity")));
    assert_eq!(d.pointer("/desktopView/widgets/1/fieldName"), Some(&json!("POPDENSITY")));
    let rewritten = d.pointer("/arcadeDataSourceItems/0/script").and_then(|v| v.as_str()).unwrap();
    assert!(rewritten.contains("['popdensity', 'tract_id']"));
    let untouched = d.pointer("/arcadeDataSourceItems/1/script").and_then(|v| v.as_str()).unwrap();
    assert!(untouched.contains("['POPDENSITY']"));
}

#[test]
fn test_chart_datasets_bind_whole_widget() {
    let chart = |source: serde_json::Value| {
        json!({
            "type": "serialChartWidget",
            "category": {"fieldName": "POPDENSITY"},
            "datasets": [{"type": "serialChartDataset", "dataSource": source}]
        })
    };
    let doc = dashboard_with_arcade(
        vec![
            chart(json!({"type": "itemDataSource", "itemId": TARGET_ID, "layerId": 0})),
            chart(json!({"type": "arcadeDataSource", "itemId": "expr-1"})),
        ],
        vec![arcade_item("expr-1", &feature_set_script(&[TARGET_ID], &["POPDENSITY"]))],
    );

    let outcome = Migrator::default()
        .migrate_with_vocabulary(&doc, &vocabulary(CasePolicy::Lowercase))
        .unwrap();
    let bindings: Vec<(&str, &Binding)> = outcome
        .scopes
        .iter()
        .map(|s| (s.pointer.as_str(), &s.binding))
        .collect();
    assert_eq!(
        bindings,
        vec![
            ("/arcadeDataSourceItems/0/script", &arcade_script("expr-1")),
            ("/desktopView/widgets/0", &Binding::Datasets),
            ("/desktopView/widgets/1", &Binding::ArcadeDataSource { script_id: "expr-1".into() }),
        ]
    );

    let d = &outcome.document;
    assert_eq!(d.pointer("/desktopView/widgets/0/category/fieldName"), Some(&json!("popdensity")));
    assert_eq!(d.pointer("/desktopView/widgets/1/category/fieldName"), Some(&json!("popdensity")));
    let script = d.pointer("/arcadeDataSourceItems/0/script").and_then(|v| v.as_str()).unwrap();
    assert!(script.contains("['popdensity']"));
}

#[test]
fn test_unsafe_mode_ignores_bindings() {
    let doc = dashboard(vec![
        item_widget(OTHER_ID, json!({"valueField": "POPDENSITY"})),
        json!({"type": "textWidget", "text": "{tract_id}"}),
    ]);
    let migrator = Migrator::new(MigrationConfig::new().with_mode(ScopeMode::Unsafe));
    let outcome = migrator
        .migrate_with_vocabulary(&doc, &vocabulary(CasePolicy::Lowercase))
        .unwrap();
    assert_eq!(outcome.scopes.len(), 1);
    assert_eq!(outcome.edits(), 2);
    assert_eq!(
        outcome.document.pointer("/desktopView/widgets/0/valueField"),
        Some(&json!("popdensity"))
    );
}

#[test]
fn test_second_run_is_byte_identical() {
    let script = feature_set_script(&[TARGET_ID], &["POPDENSITY"]);
    let doc = dashboard_with_arcade(
        vec![
            item_widget(
                TARGET_ID,
                json!({
                    "valueField": "POPDENSITY",
                    "text": "{field/TRACT_ID} has {POPDENSITY}",
                    "orderByFields": ["tract_id ASC"],
                    "groupByFields": ["TRACT_ID"],
                    "field": {"name": "POPDENSITY", "type": "esriFieldTypeDouble"}
                }),
            ),
            arcade_widget("expr-1", json!({"labelExpression": "$feature.POPDENSITY"})),
        ],
        vec![arcade_item("expr-1", &script)],
    );
    let migrator = authoritative();
    let v = vocabulary(CasePolicy::Authoritative);

    let first = migrator.migrate_with_vocabulary(&doc, &v).unwrap();
    assert!(first.changed);
    let second = migrator.migrate_with_vocabulary(&first.document, &v).unwrap();
    assert!(!second.changed);
    assert_eq!(second.document.to_json().unwrap(), first.document.to_json().unwrap());
}

#[test]
fn test_retarget_with_rewrite() {
    let new_id = "abcdefabcdefabcdefabcdefabcdefab";
    let doc = dashboard(vec![item_widget(TARGET_ID, json!({"valueField": "POPDENSITY"}))]);
    let migrator = Migrator::new(MigrationConfig::new().with_retarget(new_id));
    let outcome = migrator
        .migrate_with_vocabulary(&doc, &vocabulary(CasePolicy::Lowercase))
        .unwrap();

    assert_eq!(
        outcome.document.pointer("/desktopView/widgets/0"),
        Some(&json!({
            "type": "chartWidget",
            "dataSource": {"type": "itemDataSource", "itemId": new_id, "layerId": 0},
            "valueField": "popdensity"
        }))
    );
}
