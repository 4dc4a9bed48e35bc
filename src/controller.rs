//! Per-entry edit buffer.
//!
//! A controller mirrors one committed entry as text. Edits that parse are
//! committed to the [`FaultConfigSet`] at once; edits that do not parse stay
//! in the draft as pending, so a half-typed number survives while the set
//! keeps the last good value.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::config_set::FaultConfigSet;
use crate::entry::{EntryId, FaultEntry, FieldUpdate};
use crate::error::{EditError, EntryIssue};
use crate::kind::{FaultKind, Field, FieldSet};
use crate::topology::TopologySnapshot;
use crate::validate::{Issues, validate_entry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Parsed and committed to the set.
    Committed,
    /// Kept as draft text only; the set still holds the previous value.
    Pending { reason: String },
}

#[derive(Debug, Clone, Default)]
struct DraftField {
    text: String,
    /// Parse error of an uncommitted draft.
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ConfigEntryController {
    id: EntryId,
    kind: FaultKind,
    draft: FxHashMap<Field, DraftField>,
}

impl ConfigEntryController {
    pub fn new(entry: &FaultEntry) -> Self {
        let mut controller = Self {
            id: entry.id,
            kind: entry.kind(),
            draft: FxHashMap::default(),
        };
        controller.sync(entry);
        controller
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn kind(&self) -> FaultKind {
        self.kind
    }

    /// Fields shown for the current kind.
    pub fn visible_fields(&self) -> FieldSet {
        self.kind.relevant_fields()
    }

    /// Draft text of `field`; empty for hidden fields.
    pub fn text(&self, field: Field) -> &str {
        self.draft.get(&field).map_or("", |d| d.text.as_str())
    }

    pub fn is_pending(&self, field: Field) -> bool {
        self.draft.get(&field).is_some_and(|d| d.error.is_some())
    }

    pub fn has_pending(&self) -> bool {
        self.draft.values().any(|d| d.error.is_some())
    }

    /// Edit one field from operator text.
    pub fn edit(
        &mut self,
        field: Field,
        text: &str,
        set: &mut FaultConfigSet,
        topology: Option<&TopologySnapshot>,
    ) -> Result<EditOutcome, EditError> {
        if !self.visible_fields().contains(field) {
            return Err(EditError::IrrelevantField {
                field,
                kind: self.kind,
            });
        }

        let update = match FieldUpdate::parse(field, text) {
            Ok(update) => update,
            Err(reason) => {
                debug!(entry = %self.id, %field, %reason, "edit kept as draft");
                self.draft.insert(
                    field,
                    DraftField {
                        text: text.to_string(),
                        error: Some(reason.clone()),
                    },
                );
                return Ok(EditOutcome::Pending { reason });
            }
        };

        let entry = set.update(self.id, update, topology)?;
        self.draft.remove(&field);
        self.sync(entry);
        Ok(EditOutcome::Committed)
    }

    /// Drop a pending draft and show the committed value again.
    pub fn discard(&mut self, field: Field, entry: &FaultEntry) {
        self.draft.remove(&field);
        self.sync(entry);
    }

    /// Refresh the draft from the committed entry.
    ///
    /// Pending drafts of fields that are still visible are left alone;
    /// everything else mirrors the entry. A kind change drops drafts of
    /// fields the new kind hides.
    pub fn sync(&mut self, entry: &FaultEntry) {
        debug_assert_eq!(entry.id, self.id);
        self.kind = entry.kind();
        let visible = self.visible_fields();
        self.draft.retain(|field, _| visible.contains(*field));

        for field in visible.iter() {
            let slot = self.draft.entry(field).or_default();
            if slot.error.is_none() {
                slot.text = entry.value_text(field);
            }
        }
    }

    /// Selectable values for a selector field, in discovery order.
    pub fn options(&self, field: Field, topology: &TopologySnapshot) -> Vec<String> {
        if !self.visible_fields().contains(field) {
            return Vec::new();
        }
        match field {
            Field::Kind => FaultKind::ALL.iter().map(|k| k.to_string()).collect(),
            Field::TargetNode | Field::LoopNode1 | Field::LoopNode2 => topology.nodes.clone(),
            Field::TargetInterface => topology.interfaces(self.text(Field::TargetNode)).to_vec(),
            Field::TargetLink => topology.link_keys().collect(),
            _ => Vec::new(),
        }
    }

    /// Validation issues of the committed entry plus pending parse errors.
    pub fn issues(&self, entry: &FaultEntry) -> Issues {
        let mut issues = validate_entry(entry);
        for field in self.visible_fields().iter() {
            if let Some(DraftField {
                text,
                error: Some(reason),
            }) = self.draft.get(&field)
            {
                issues.push(EntryIssue {
                    entry: self.id,
                    field,
                    reason: format!("draft {text:?} not applied: {reason}"),
                });
            }
        }
        issues
    }
}
