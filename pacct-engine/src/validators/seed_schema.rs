//! Seed document schema validation
//!
//! A seed is `{schema_version, methodology, mappings: [...]}`. The whole
//! document is checked before the import touches the store and every
//! violation is reported, not just the first one. A seed with any violation
//! is rejected as a unit.
//!
//! Numeric fields accept JSON numbers or numeric strings, so review feeds
//! coming from CSV go through the same mapping parser.

use crate::identity::{canonical_alias, normalize_whitespace};
use crate::models::{clean_text, AliasEvidence, DateField, SourceKind};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// One validated alias mapping
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeedMapping {
    pub actor_person_name: String,
    pub person_full_name: String,
    pub source_kind: SourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_canonical_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_record_id: Option<String>,
    #[serde(flatten)]
    pub evidence: AliasEvidence,
    /// Lookup key derived from `actor_person_name`
    #[serde(skip)]
    pub canonical_alias: String,
}

/// A validated seed document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeedDocument {
    pub schema_version: String,
    pub methodology: Value,
    pub mappings: Vec<SeedMapping>,
}

/// Outcome of validating raw seed JSON
pub type SeedValidation = Result<SeedDocument, Vec<String>>;

/// Validate a parsed seed document
pub fn validate_seed(raw: &Value) -> SeedValidation {
    let mut errors = Vec::new();

    let Some(root) = raw.as_object() else {
        return Err(vec!["seed: expected a JSON object".to_string()]);
    };

    let schema_version = match root.get("schema_version") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => {
            errors.push("schema_version: required non-empty string".to_string());
            String::new()
        }
    };

    let methodology = root.get("methodology").cloned().unwrap_or(Value::Null);

    let mut mappings = Vec::new();
    match root.get("mappings") {
        Some(Value::Array(items)) => {
            let mut first_seen: HashMap<String, usize> = HashMap::new();
            for (index, item) in items.iter().enumerate() {
                let label = format!("mappings[{index}]");
                let Some(obj) = item.as_object() else {
                    errors.push(format!("{label}: expected an object"));
                    continue;
                };
                match parse_mapping_object(obj, &label) {
                    Ok(mapping) => {
                        if let Some(previous) = first_seen.get(&mapping.canonical_alias) {
                            errors.push(format!(
                                "{label}.actor_person_name: duplicate of mappings[{previous}] ('{}')",
                                mapping.canonical_alias
                            ));
                        } else {
                            first_seen.insert(mapping.canonical_alias.clone(), index);
                            mappings.push(mapping);
                        }
                    }
                    Err(mut mapping_errors) => errors.append(&mut mapping_errors),
                }
            }
        }
        _ => errors.push("mappings: required array".to_string()),
    }

    if errors.is_empty() {
        Ok(SeedDocument {
            schema_version,
            methodology,
            mappings,
        })
    } else {
        Err(errors)
    }
}

/// Parse and validate one mapping object; `label` prefixes error messages
pub fn parse_mapping_object(obj: &Map<String, Value>, label: &str) -> Result<SeedMapping, Vec<String>> {
    let mut errors = Vec::new();
    let mut field = FieldReader {
        obj,
        label,
        errors: &mut errors,
    };

    let actor_person_name = field.required_text("actor_person_name");
    let person_full_name = field.required_text("person_full_name");
    let source_kind = field.source_kind("source_kind");
    let person_id = field.positive_int("person_id");
    let person_canonical_key = field.text("person_canonical_key");
    let source_id = field.text("source_id");
    let source_record_id = field.text("source_record_id");
    let source_record_pk = field.positive_int("source_record_pk");
    let source_url = field.text("source_url");
    let evidence_date = field.date("evidence_date");
    let evidence_quote = field.text("evidence_quote");
    let confidence = field.unit_interval("confidence");
    let note = field.text("note");

    match (actor_person_name, person_full_name, source_kind) {
        (Some(actor), Some(full_name), Some(kind)) if errors.is_empty() => {
            let actor_person_name = normalize_whitespace(&actor);
            Ok(SeedMapping {
                canonical_alias: canonical_alias(&actor_person_name),
                actor_person_name,
                person_full_name: normalize_whitespace(&full_name),
                source_kind: kind,
                person_id,
                person_canonical_key,
                source_id,
                source_record_id,
                evidence: AliasEvidence {
                    source_url,
                    evidence_date,
                    evidence_quote,
                    source_record_pk,
                    confidence,
                    note,
                },
            })
        }
        _ => Err(errors),
    }
}

struct FieldReader<'a> {
    obj: &'a Map<String, Value>,
    label: &'a str,
    errors: &'a mut Vec<String>,
}

impl FieldReader<'_> {
    fn fail(&mut self, key: &str, message: String) {
        self.errors.push(format!("{}.{}: {}", self.label, key, message));
    }

    fn text(&mut self, key: &str) -> Option<String> {
        match self.obj.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => clean_text(Some(s)),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(other) => {
                self.fail(key, format!("expected a string, got {}", other));
                None
            }
        }
    }

    fn required_text(&mut self, key: &str) -> Option<String> {
        let before = self.errors.len();
        let value = self.text(key);
        if value.is_none() && self.errors.len() == before {
            self.fail(key, "required non-empty string".to_string());
        }
        value
    }

    fn number(&mut self, key: &str) -> Option<f64> {
        match self.obj.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(Value::String(s)) => match s.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => Some(v),
                _ => {
                    self.fail(key, format!("expected a number, got '{}'", s.trim()));
                    None
                }
            },
            Some(other) => {
                self.fail(key, format!("expected a number, got {}", other));
                None
            }
        }
    }

    fn positive_int(&mut self, key: &str) -> Option<i64> {
        let value = self.number(key)?;
        if value.fract() != 0.0 || value < 1.0 || value > i64::MAX as f64 {
            self.fail(key, format!("expected a positive integer, got {}", value));
            return None;
        }
        Some(value as i64)
    }

    fn unit_interval(&mut self, key: &str) -> Option<f64> {
        let value = self.number(key)?;
        if !(0.0..=1.0).contains(&value) {
            self.fail(key, format!("must be within [0, 1], got {}", value));
            return None;
        }
        Some(value)
    }

    fn date(&mut self, key: &str) -> Option<String> {
        let text = self.text(key)?;
        match DateField::parse(Some(&text)) {
            DateField::Date(date) => Some(date.format("%Y-%m-%d").to_string()),
            _ => {
                self.fail(key, format!("expected YYYY-MM-DD, got '{}'", text));
                None
            }
        }
    }

    fn source_kind(&mut self, key: &str) -> Option<SourceKind> {
        let Some(text) = self.text(key) else {
            self.fail(key, "required ('manual_seed' or 'official_*')".to_string());
            return None;
        };
        match SourceKind::parse(&text) {
            Ok(kind) => Some(kind),
            Err(e) => {
                self.fail(key, e);
                None
            }
        }
    }
}
