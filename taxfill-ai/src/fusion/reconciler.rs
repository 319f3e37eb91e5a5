//! First-wins reconciler

use crate::assembler::mask_ssn;
use crate::record::TaxRecord;
use crate::types::{ExtractedFieldSet, FieldName, FieldValue, MissingFieldSet};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Two documents disagree on a field
///
/// SSN values are stored masked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldConflict {
    pub field: FieldName,
    /// Index of the document whose value was kept
    pub kept_index: usize,
    pub kept_value: String,
    /// Index of the later document that was ignored
    pub other_index: usize,
    pub other_value: String,
}

/// Reconciler output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciliation {
    pub record: TaxRecord,
    pub missing: MissingFieldSet,
    /// Field → index of the document that supplied the kept value
    pub provenance: BTreeMap<FieldName, usize>,
    pub conflicts: Vec<FieldConflict>,
}

impl Reconciliation {
    pub fn into_parts(self) -> (TaxRecord, MissingFieldSet) {
        (self.record, self.missing)
    }
}

fn display_value(field: FieldName, value: &FieldValue) -> String {
    match (field, value) {
        (FieldName::Ssn, FieldValue::Text(ssn)) => mask_ssn(ssn),
        _ => value.to_string(),
    }
}

/// Merge `field_sets` in caller order
///
/// Error-marked sets contribute nothing. Never fails; whatever is still
/// absent is reported in `missing`.
pub fn reconcile(field_sets: &[ExtractedFieldSet]) -> Reconciliation {
    let mut kept: BTreeMap<FieldName, (usize, &FieldValue)> = BTreeMap::new();
    let mut conflicts = Vec::new();

    for (index, set) in field_sets.iter().enumerate() {
        let Some(fields) = set.fields() else {
            debug!(
                document_id = %set.document_id,
                index,
                "Skipping error-marked field set"
            );
            continue;
        };

        for (field, value) in fields.iter() {
            match kept.get(&field) {
                None => {
                    kept.insert(field, (index, value));
                }
                Some((kept_index, kept_value)) if *kept_value != value => {
                    conflicts.push(FieldConflict {
                        field,
                        kept_index: *kept_index,
                        kept_value: display_value(field, kept_value),
                        other_index: index,
                        other_value: display_value(field, value),
                    });
                }
                Some(_) => {}
            }
        }
    }

    let mut record = TaxRecord::new();
    let mut provenance = BTreeMap::new();
    for (field, (index, value)) in &kept {
        record.set(*field, (*value).clone());
        provenance.insert(*field, *index);
    }

    for conflict in &conflicts {
        warn!(
            field = %conflict.field,
            kept_index = conflict.kept_index,
            kept_value = %conflict.kept_value,
            other_index = conflict.other_index,
            other_value = %conflict.other_value,
            "Conflicting values across documents, keeping the first"
        );
    }

    let missing = record.missing_fields();
    debug!(
        documents = field_sets.len(),
        fields_filled = kept.len(),
        missing = missing.len(),
        conflicts = conflicts.len(),
        "Reconciliation complete"
    );

    Reconciliation {
        record,
        missing,
        provenance,
        conflicts,
    }
}
