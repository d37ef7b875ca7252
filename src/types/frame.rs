use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{PipelineError, Result};

/// String-keyed numeric table handed over by the outer layer.
///
/// All columns share one length. Deserializes from a JSON object of arrays,
/// e.g. `{"Open": [..], "Close": [..]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, Vec<f64>>", into = "BTreeMap<String, Vec<f64>>")]
pub struct Frame {
    columns: BTreeMap<String, Vec<f64>>,
    rows: usize,
}

impl Frame {
    pub fn new(columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
        let mut frame = Frame::default();
        for (name, values) in columns {
            if frame.columns.contains_key(&name) {
                return Err(PipelineError::invalid(format!("duplicate column '{}'", name)));
            }
            frame.insert(name, values)?;
        }
        Ok(frame)
    }

    pub(crate) fn from_columns_unchecked(columns: Vec<(String, Vec<f64>)>) -> Self {
        let rows = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        Self {
            columns: columns.into_iter().collect(),
            rows,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Look up several columns at once, reporting every missing name together.
    pub fn require(&self, names: &[&str]) -> Result<Vec<&[f64]>> {
        let missing: Vec<String> = names
            .iter()
            .filter(|n| !self.columns.contains_key(**n))
            .map(|n| n.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(PipelineError::Schema { missing });
        }
        Ok(names
            .iter()
            .filter_map(|n| self.column(n))
            .collect())
    }

    /// Insert or replace a column. The first column fixes the row count.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        let replacing_only_column = self.columns.len() == 1 && self.columns.contains_key(&name);
        if !self.columns.is_empty() && !replacing_only_column && values.len() != self.rows {
            return Err(PipelineError::invalid(format!(
                "column '{}' has {} rows, frame has {}",
                name,
                values.len(),
                self.rows
            )));
        }
        self.rows = values.len();
        self.columns.insert(name, values);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<f64>> {
        let removed = self.columns.remove(name);
        if self.columns.is_empty() {
            self.rows = 0;
        }
        removed
    }

}

impl TryFrom<BTreeMap<String, Vec<f64>>> for Frame {
    type Error = PipelineError;

    fn try_from(map: BTreeMap<String, Vec<f64>>) -> Result<Self> {
        Frame::new(map.into_iter().collect())
    }
}

impl From<Frame> for BTreeMap<String, Vec<f64>> {
    fn from(frame: Frame) -> Self {
        frame.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_ragged_columns() {
        let result = Frame::new(vec![
            ("a".to_string(), vec![1.0, 2.0]),
            ("b".to_string(), vec![1.0]),
        ]);
        assert!(matches!(result, Err(PipelineError::InvalidInput { .. })));
    }

    #[test]
    fn test_rejects_duplicate_columns() {
        let result = Frame::new(vec![
            ("a".to_string(), vec![1.0]),
            ("a".to_string(), vec![2.0]),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_require_reports_all_missing() {
        let frame = Frame::new(vec![("Close".to_string(), vec![1.0, 2.0])]).unwrap();
        match frame.require(&["Open", "Close", "Volume"]) {
            Err(PipelineError::Schema { missing }) => {
                assert_eq!(missing, vec!["Open".to_string(), "Volume".to_string()]);
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_require_preserves_requested_order() {
        let frame = Frame::new(vec![
            ("b".to_string(), vec![2.0]),
            ("a".to_string(), vec![1.0]),
        ])
        .unwrap();
        let cols = frame.require(&["b", "a"]).unwrap();
        assert_eq!(cols[0], &[2.0]);
        assert_eq!(cols[1], &[1.0]);
    }

    #[test]
    fn test_json_deserialize() {
        let frame: Frame = serde_json::from_str(r#"{"Close": [1.0, 2.0], "Open": [0.5, 1.5]}"#).unwrap();
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.column("Open"), Some(&[0.5, 1.5][..]));

        let ragged: std::result::Result<Frame, _> =
            serde_json::from_str(r#"{"Close": [1.0, 2.0], "Open": [0.5]}"#);
        assert!(ragged.is_err());
    }

    #[test]
    fn test_remove_last_column_empties_frame() {
        let mut frame = Frame::new(vec![("x".to_string(), vec![1.0, 2.0, 3.0])]).unwrap();
        assert_eq!(frame.remove("x"), Some(vec![1.0, 2.0, 3.0]));
        assert!(frame.is_empty());
    }
}
