use std::collections::{HashMap, HashSet};

use tracing::debug;
use welldepth_parser::WellIdCorrectionRow;

/// Maps field-recorded well ids onto analysis ids and, when a list is given, rejects the rest.
#[derive(Debug, Clone, Default)]
pub struct WellRegistry {
    valid: Option<HashSet<String>>,
    corrections: HashMap<String, String>,
}

impl WellRegistry {
    pub fn new(valid_ids: Option<Vec<String>>, corrections: Vec<WellIdCorrectionRow>) -> Self {
        Self {
            valid: valid_ids.map(|ids| ids.into_iter().collect()),
            corrections: corrections
                .into_iter()
                .map(|row| (row.well_field_id, row.well_id))
                .collect(),
        }
    }

    /// Applies id corrections only.
    pub fn canonical(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        match self.corrections.get(trimmed) {
            Some(corrected) => {
                debug!(from = trimmed, to = %corrected, "corrected well id");
                corrected.clone()
            }
            None => trimmed.to_string(),
        }
    }

    /// Corrected id, or `None` if it is not on the valid-id list.
    pub fn resolve(&self, raw: &str) -> Option<String> {
        let id = self.canonical(raw);
        match &self.valid {
            Some(valid) if !valid.contains(&id) => None,
            _ => Some(id),
        }
    }
}
