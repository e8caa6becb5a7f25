use fieldcase_core::prelude::*;
use fieldcase_test_utils::{dashboard, item_widget, target_dataset, OTHER_ID, TARGET_ID};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

const NAMES: [&str; 5] = ["PopDensity", "Tract_ID", "NAME", "Shape__Area", "Pop"];
const KEYS: [&str; 8] = [
    "fieldName",
    "valueField",
    "groupByFields",
    "orderByFields",
    "text",
    "expression",
    "field",
    "label",
];

fn casing(name: &str, mask: u64) -> String {
    name.chars()
        .enumerate()
        .map(|(i, c)| {
            if (mask >> (i % 64)) & 1 == 1 {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            }
        })
        .collect()
}

fn entry(key: &str, name: &str) -> Value {
    match key {
        "groupByFields" => json!([name]),
        "orderByFields" => json!([format!("{name} DESC")]),
        "text" => json!(format!("<b>{{{name}}}</b> and {name} in prose")),
        "expression" => json!(format!("$feature.{name} + $feature.SUR{name}")),
        "field" => json!({"name": name, "type": "esriFieldTypeString"}),
        _ => json!(name),
    }
}

fn build(entries: &[(usize, usize, u64)], bound: bool) -> Document {
    let mut body = Map::new();
    for (key, name, mask) in entries {
        let key = KEYS[*key];
        body.insert(key.to_string(), entry(key, &casing(NAMES[*name], *mask)));
    }
    let owner = if bound { TARGET_ID } else { OTHER_ID };
    dashboard(vec![item_widget(owner, Value::Object(body))])
}

fn vocabulary(policy: CasePolicy) -> Vocabulary {
    Vocabulary::new(&target_dataset(), NAMES, policy).unwrap()
}

proptest! {
    #[test]
    fn prop_second_run_is_noop(
        entries in proptest::collection::vec((0..KEYS.len(), 0..NAMES.len(), any::<u64>()), 0..12),
        bound in any::<bool>(),
        authoritative in any::<bool>(),
    ) {
        let policy = if authoritative { CasePolicy::Authoritative } else { CasePolicy::Lowercase };
        let migrator = Migrator::new(MigrationConfig::new().with_case_policy(policy));
        let v = vocabulary(policy);
        let doc = build(&entries, bound);

        let first = migrator.migrate_with_vocabulary(&doc, &v).unwrap();
        let second = migrator.migrate_with_vocabulary(&first.document, &v).unwrap();

        prop_assert!(!second.changed);
        prop_assert_eq!(second.document.to_json().unwrap(), first.document.to_json().unwrap());
    }

    #[test]
    fn prop_unbound_widget_is_untouched(
        entries in proptest::collection::vec((0..KEYS.len(), 0..NAMES.len(), any::<u64>()), 0..12),
    ) {
        let doc = build(&entries, false);
        let outcome = Migrator::default()
            .migrate_with_vocabulary(&doc, &vocabulary(CasePolicy::Lowercase))
            .unwrap();
        prop_assert!(!outcome.changed);
        prop_assert_eq!(outcome.document, doc);
    }

    #[test]
    fn prop_embedded_names_are_not_tokens(
        prefix in "[A-Za-z_][A-Za-z0-9_]{0,6}",
        suffix in "[A-Za-z0-9_]{1,6}",
    ) {
        let v = Vocabulary::new(&target_dataset(), ["NAME"], CasePolicy::Lowercase).unwrap();
        let text = format!("$feature.{prefix}NAME + $feature.NAME{suffix}");
        prop_assert_eq!(v.replace_tokens(&text).into_owned(), text);
    }
}
