//! The ordered batch of fault entries.

use tracing::debug;

use crate::entry::{EntryId, FaultEntry, FieldUpdate};
use crate::error::EditError;
use crate::kind::Field;
use crate::resolver::{
    cascade_interface, clear_irrelevant, reanchor_to_link, resolve, resolve_in_place,
};
use crate::topology::TopologySnapshot;

/// Ordered fault entries; insertion order is display and submission order.
///
/// Never empty: removing the last entry reseeds a fresh default one. Ids come
/// from a monotonic counter and are never handed out twice.
#[derive(Debug, Clone)]
pub struct FaultConfigSet {
    entries: Vec<FaultEntry>,
    next_id: u64,
}

impl FaultConfigSet {
    /// A set holding one default entry resolved against `topology`.
    pub fn new(topology: &TopologySnapshot) -> Self {
        let mut set = Self {
            entries: Vec::with_capacity(4),
            next_id: 1,
        };
        set.add(topology);
        set
    }

    fn allocate_id(&mut self) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append a default entry seeded by the resolver.
    pub fn add(&mut self, topology: &TopologySnapshot) -> EntryId {
        let id = self.allocate_id();
        let blank = FaultEntry::new(id);
        self.entries.push(resolve(blank.kind(), topology, &blank));
        debug!(entry = %id, "entry added");
        id
    }

    /// Delete `id`. When that empties the set, one fresh default entry is
    /// created immediately and its id returned.
    pub fn remove(
        &mut self,
        id: EntryId,
        topology: &TopologySnapshot,
    ) -> Result<Option<EntryId>, EditError> {
        let idx = self.index_of(id)?;
        self.entries.remove(idx);
        debug!(entry = %id, "entry removed");
        if self.entries.is_empty() {
            return Ok(Some(self.add(topology)));
        }
        Ok(None)
    }

    /// Apply one field edit and run the cascade it triggers.
    ///
    /// - kind: re-resolve under the new kind (irrelevant fields cleared)
    /// - target node: interface recomputed (rule 2)
    /// - target link: node re-anchored to the link, interface recomputed
    ///
    /// Without a topology (never fetched, or the last refresh failed) the
    /// value is stored as given and no cascade runs; the next successful
    /// refresh re-resolves it.
    pub fn update(
        &mut self,
        id: EntryId,
        update: FieldUpdate,
        topology: Option<&TopologySnapshot>,
    ) -> Result<&FaultEntry, EditError> {
        let idx = self.index_of(id)?;
        let entry = &mut self.entries[idx];
        let field = update.field();

        if let FieldUpdate::Kind(kind) = update {
            match topology {
                Some(topology) => *entry = resolve(kind, topology, entry),
                None => {
                    entry.set_kind(kind);
                    clear_irrelevant(entry);
                }
            }
            return Ok(&*entry);
        }

        entry
            .apply(update)
            .map_err(|field| EditError::IrrelevantField {
                field,
                kind: entry.kind(),
            })?;

        let Some(topology) = topology else {
            debug!(entry = %id, %field, "no topology, cascade deferred");
            return Ok(&*entry);
        };
        match field {
            Field::TargetNode if !entry.kind().is_routing_loop() => {
                // An unknown node goes back through full resolution.
                if topology.contains_node(&entry.target.node) {
                    cascade_interface(topology, entry);
                } else {
                    resolve_in_place(topology, entry);
                }
            }
            Field::TargetLink => {
                resolve_in_place(topology, entry);
                reanchor_to_link(topology, entry);
            }
            Field::TargetInterface | Field::LoopNode1 | Field::LoopNode2 => {
                resolve_in_place(topology, entry);
            }
            _ => {}
        }
        Ok(&*entry)
    }

    /// Re-resolve every entry against a new topology. Values that are still
    /// valid are kept; only stale references are replaced.
    pub fn on_topology_changed(&mut self, topology: &TopologySnapshot) -> usize {
        let mut corrected = 0;
        for entry in &mut self.entries {
            let resolved = resolve(entry.kind(), topology, entry);
            if resolved != *entry {
                corrected += 1;
                *entry = resolved;
            }
        }
        debug!(corrected, total = self.entries.len(), "entries re-resolved");
        corrected
    }

    pub fn get(&self, id: EntryId) -> Option<&FaultEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn entries(&self) -> &[FaultEntry] {
        &self.entries
    }

    pub fn ids(&self) -> impl Iterator<Item = EntryId> + '_ {
        self.entries.iter().map(|e| e.id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 1-based display position of `id`.
    pub fn position(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id).map(|i| i + 1)
    }

    fn index_of(&self, id: EntryId) -> Result<usize, EditError> {
        self.entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(EditError::UnknownEntry(id))
    }
}
