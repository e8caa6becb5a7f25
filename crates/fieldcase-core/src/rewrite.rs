//! Reference rewriting within a bound scope
//!
//! Every mapping entry in the scope is looked up in the [`KeyTable`]; the
//! category decides which part of the value is a field reference. Matching
//! is case-insensitive and whole-token, so rewriting an already canonical
//! document changes nothing.

use crate::keys::{KeyCategory, KeyTable, ABSOLUTE_VALUE_SENTINEL};
use crate::vocabulary::Vocabulary;
use crate::walk::{walk_mut, Descend, VisitorMut};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

/// Namespace marker allowed in front of a templated field token
pub const FIELD_NAMESPACE: &str = "field";

static TEMPLATE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{(?:(?P<ns>[^{}/]+)/)?(?P<name>[^{}/]+)\}")
        .expect("template token pattern must compile")
});

/// Applies one vocabulary to scope subtrees
#[derive(Debug, Clone, Copy)]
pub struct Rewriter<'a> {
    vocabulary: &'a Vocabulary,
    keys: &'a KeyTable,
}

impl<'a> Rewriter<'a> {
    /// Create rewriter
    #[inline]
    #[must_use]
    pub fn new(vocabulary: &'a Vocabulary, keys: &'a KeyTable) -> Self {
        Self { vocabulary, keys }
    }

    /// Rewrite every recognized entry below `root`
    ///
    /// Returns the number of values whose text changed.
    pub fn rewrite(&self, root: &mut Value) -> usize {
        let mut visitor = EntryRewriter {
            rewriter: *self,
            edits: 0,
        };
        walk_mut(root, &mut visitor);
        visitor.edits
    }

    /// Rewrite a single value as if it sat under a key of `category`
    ///
    /// Returns the number of values whose text changed.
    pub fn rewrite_value(&self, category: KeyCategory, value: &mut Value) -> usize {
        match (category, value) {
            (KeyCategory::Field, Value::String(s)) => usize::from(self.field(s)),
            (KeyCategory::FieldList, Value::String(s)) => usize::from(self.field(s)),
            (KeyCategory::FieldList, Value::Array(items)) => items
                .iter_mut()
                .filter_map(|item| match item {
                    Value::String(s) => Some(self.field(s)),
                    _ => None,
                })
                .filter(|changed| *changed)
                .count(),
            (KeyCategory::Ordering, Value::String(s)) => usize::from(self.ordering(s)),
            (KeyCategory::Ordering, Value::Array(items)) => items
                .iter_mut()
                .filter_map(|item| match item {
                    Value::String(s) => Some(self.ordering(s)),
                    _ => None,
                })
                .filter(|changed| *changed)
                .count(),
            (KeyCategory::Template, Value::String(s)) => usize::from(self.template(s)),
            (KeyCategory::Expression, Value::String(s)) => usize::from(self.expression(s)),
            (KeyCategory::FieldObject, Value::String(s)) => usize::from(self.field(s)),
            (KeyCategory::FieldObject, Value::Object(map)) => match map.get_mut("name") {
                Some(Value::String(s)) => usize::from(self.field(s)),
                _ => 0,
            },
            _ => 0,
        }
    }

    fn field(&self, value: &mut String) -> bool {
        if value.as_str() == ABSOLUTE_VALUE_SENTINEL {
            return false;
        }
        match self.vocabulary.canonical(value) {
            Some(canonical) if canonical != value.as_str() => {
                *value = canonical.to_string();
                true
            }
            _ => false,
        }
    }

    /// `"<field> <direction>"`: only the leading token is a field
    fn ordering(&self, value: &mut String) -> bool {
        let split = value.find(char::is_whitespace).unwrap_or(value.len());
        let (head, rest) = value.split_at(split);
        match self.vocabulary.canonical(head) {
            Some(canonical) if canonical != head => {
                *value = format!("{canonical}{rest}");
                true
            }
            _ => false,
        }
    }

    /// Only `{NAME}` and `{field/NAME}` tokens are fields; prose is left alone
    fn template(&self, value: &mut String) -> bool {
        let replaced = TEMPLATE_TOKEN
            .replace_all(value, |caps: &Captures<'_>| {
                let whole = &caps[0];
                let namespace = caps.name("ns").map(|m| m.as_str());
                if namespace.is_some_and(|ns| !ns.eq_ignore_ascii_case(FIELD_NAMESPACE)) {
                    return whole.to_string();
                }
                match self.vocabulary.canonical(&caps["name"]) {
                    Some(canonical) => match namespace {
                        Some(ns) => format!("{{{ns}/{canonical}}}"),
                        None => format!("{{{canonical}}}"),
                    },
                    None => whole.to_string(),
                }
            })
            .into_owned();
        commit(value, replaced)
    }

    fn expression(&self, value: &mut String) -> bool {
        let replaced = self.vocabulary.replace_tokens(value).into_owned();
        commit(value, replaced)
    }
}

fn commit(value: &mut String, replaced: String) -> bool {
    if replaced == *value {
        return false;
    }
    *value = replaced;
    true
}

struct EntryRewriter<'a> {
    rewriter: Rewriter<'a>,
    edits: usize,
}

impl VisitorMut for EntryRewriter<'_> {
    fn visit_entry(&mut self, key: &str, value: &mut Value) -> Descend {
        if let Some(category) = self.rewriter.keys.category(key) {
            self.edits += self.rewriter.rewrite_value(category, value);
        }
        Descend::Into
    }
}

/// Rewrite `scope_root` with the default key table
///
/// Returns whether any text changed.
pub fn rewrite(scope_root: &mut Value, vocabulary: &Vocabulary) -> bool {
    let keys = KeyTable::with_defaults();
    Rewriter::new(vocabulary, &keys).rewrite(scope_root) > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborator::DatasetRef;
    use crate::vocabulary::CasePolicy;
    use serde_json::json;

    fn vocab(names: &[&str], policy: CasePolicy) -> Vocabulary {
        let dataset = DatasetRef::new("0123456789abcdef0123456789abcdef", 0);
        Vocabulary::new(&dataset, names, policy).unwrap()
    }

    fn authoritative() -> Vocabulary {
        vocab(&["PopDensity", "Tract_ID"], CasePolicy::Authoritative)
    }

    #[test]
    fn single_field_key() {
        let mut value = json!({"fieldName": "POPDENSITY"});
        assert!(rewrite(&mut value, &authoritative()));
        assert_eq!(value, json!({"fieldName": "PopDensity"}));

        let mut value = json!({"fieldName": "POPDENSITY"});
        assert!(rewrite(&mut value, &vocab(&["PopDensity"], CasePolicy::Lowercase)));
        assert_eq!(value, json!({"fieldName": "popdensity"}));
    }

    #[test]
    fn template_tokens_only() {
        let mut value = json!({"text": "{POPDENSITY} per {tract_id}; popdensity rises"});
        assert!(rewrite(&mut value, &authoritative()));
        assert_eq!(value, json!({"text": "{PopDensity} per {Tract_ID}; popdensity rises"}));
    }

    #[test]
    fn template_namespaces() {
        let mut value =
            json!({"text": "<p>{field/POPDENSITY} {expression/POPDENSITY} {Field/tract_id}</p>"});
        assert!(rewrite(&mut value, &authoritative()));
        assert_eq!(
            value,
            json!({"text": "<p>{field/PopDensity} {expression/POPDENSITY} {Field/Tract_ID}</p>"})
        );
    }

    #[test]
    fn ordering_keeps_direction() {
        let mut value = json!({"orderByFields": ["POPDENSITY DESC", "tract_id  asc", "Other ASC"]});
        assert!(rewrite(&mut value, &authoritative()));
        assert_eq!(
            value,
            json!({"orderByFields": ["PopDensity DESC", "Tract_ID  asc", "Other ASC"]})
        );
    }

    #[test]
    fn bare_string_lists_are_single_references() {
        let mut value = json!({"groupByFields": "TRACT_ID", "seriesOrderByFields": "POPDENSITY"});
        assert!(rewrite(&mut value, &authoritative()));
        assert_eq!(
            value,
            json!({"groupByFields": "Tract_ID", "seriesOrderByFields": "PopDensity"})
        );
    }

    #[test]
    fn field_lists() {
        let mut value = json!({"valueFields": ["POPDENSITY", 3, "unknown"], "outFields": ["*"]});
        assert!(rewrite(&mut value, &authoritative()));
        assert_eq!(value, json!({"valueFields": ["PopDensity", 3, "unknown"], "outFields": ["*"]}));
    }

    #[test]
    fn field_object_name_and_bare_string() {
        let mut value = json!({"filters": [
            {"field": {"name": "TRACT_ID", "type": "esriFieldTypeString"}},
            {"field": "popdensity"}
        ]});
        assert!(rewrite(&mut value, &authoritative()));
        assert_eq!(
            value,
            json!({"filters": [
                {"field": {"name": "Tract_ID", "type": "esriFieldTypeString"}},
                {"field": "PopDensity"}
            ]})
        );
    }

    #[test]
    fn expression_whole_tokens() {
        let v = vocab(&["NAME"], CasePolicy::Lowercase);
        let mut value = json!({"expression": "$feature.SURNAME + ' ' + $feature.NAME"});
        assert!(rewrite(&mut value, &v));
        assert_eq!(value, json!({"expression": "$feature.SURNAME + ' ' + $feature.name"}));
    }

    #[test]
    fn sentinel_survives() {
        let v = vocab(&["AbsoluteValue"], CasePolicy::Authoritative);
        let mut value = json!({"valueField": "absoluteValue"});
        assert!(!rewrite(&mut value, &v));
        assert_eq!(value, json!({"valueField": "absoluteValue"}));
    }

    #[test]
    fn unrecognized_keys_untouched() {
        let original = json!({"label": "POPDENSITY", "count": 4, "items": [{"name": "TRACT_ID"}]});
        let mut value = original.clone();
        assert!(!rewrite(&mut value, &authoritative()));
        assert_eq!(value, original);
    }

    #[test]
    fn nested_keys_are_found() {
        let mut value = json!({"a": [{"b": {"categoryField": "tract_id"}}]});
        assert!(rewrite(&mut value, &authoritative()));
        assert_eq!(value, json!({"a": [{"b": {"categoryField": "Tract_ID"}}]}));
    }

    #[test]
    fn second_pass_is_noop() {
        let v = authoritative();
        let mut value = json!({
            "fieldName": "popdensity",
            "text": "{tract_id}",
            "orderByFields": ["POPDENSITY DESC"],
            "expression": "$feature.TRACT_ID"
        });
        assert!(rewrite(&mut value, &v));
        let once = value.clone();
        assert!(!rewrite(&mut value, &v));
        assert_eq!(value, once);
    }

    #[test]
    fn custom_table_entry() {
        let v = authoritative();
        let keys = KeyTable::with_defaults().with_key("xField", KeyCategory::Field);
        let mut value = json!({"xField": "POPDENSITY", "fieldName": "TRACT_ID"});
        assert_eq!(Rewriter::new(&v, &keys).rewrite(&mut value), 2);
        assert_eq!(value, json!({"xField": "PopDensity", "fieldName": "Tract_ID"}));
    }
}
