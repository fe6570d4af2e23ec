use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::observability::{Diagnostic, Severity};
use crate::types::{DataType, Schema};

/// Final type per column, in column order, plus the diagnostics emitted during the pass.
///
/// Serializes as a JSON object mapping column names to type names, e.g.
/// `{"id": "int8", "joined": "datetime"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeReport {
    columns: Vec<(String, DataType)>,
    diagnostics: Vec<Diagnostic>,
}

impl TypeReport {
    pub(crate) fn from_schema(schema: &Schema, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            columns: schema
                .fields
                .iter()
                .map(|f| (f.name.clone(), f.data_type))
                .collect(),
            diagnostics,
        }
    }

    /// Assigned type of `column`.
    pub fn get(&self, column: &str) -> Option<DataType> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, dt)| *dt)
    }

    /// `(column, type)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, DataType)> {
        self.columns.iter().map(|(name, dt)| (name.as_str(), *dt))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Diagnostics at or above `severity`.
    pub fn diagnostics_at_or_above(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.severity >= severity)
    }
}

impl Serialize for TypeReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, dt) in &self.columns {
            map.serialize_entry(name, dt.as_str())?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::TypeReport;
    use crate::observability::{Diagnostic, Severity};
    use crate::types::{DataType, Field, Schema};

    #[test]
    fn serializes_in_column_order() {
        let schema = Schema::new(vec![
            Field::new("z", DataType::Int8),
            Field::new("a", DataType::Utf8),
        ]);
        let report = TypeReport::from_schema(&schema, Vec::new());
        assert_eq!(
            serde_json::to_string(&report).unwrap(),
            r#"{"z":"int8","a":"text"}"#
        );
        assert_eq!(report.get("a"), Some(DataType::Utf8));
        assert_eq!(report.iter().count(), 2);
    }

    #[test]
    fn filters_diagnostics_by_severity() {
        let schema = Schema::new(vec![Field::new("a", DataType::Utf8)]);
        let diags = vec![
            Diagnostic {
                column: "a".to_string(),
                severity: Severity::Info,
                message: "i".to_string(),
            },
            Diagnostic {
                column: "a".to_string(),
                severity: Severity::Warning,
                message: "w".to_string(),
            },
        ];
        let report = TypeReport::from_schema(&schema, diags);
        assert_eq!(report.diagnostics().len(), 2);
        assert_eq!(report.diagnostics_at_or_above(Severity::Warning).count(), 1);
    }
}
