use std::collections::HashMap;

use crate::{Change, ChangeAction, ChangeSetDescription, PolicyCheckResult};

/// Aggregate of every `Modify` change the change set holds for one logical resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifiedResource {
    /// Template-defined resource name.
    pub logical_resource_id: String,
    /// Resource type of the first change seen.
    pub resource_type: String,
    /// Physical id of the first change seen, if it carried one.
    pub physical_resource_id: Option<String>,
    /// Raw change entries in change-set order.
    pub changes: Vec<Change>,
    /// Violated check ids in scan order.
    pub check_ids: Vec<String>,
    /// Violated check names, parallel to `check_ids`.
    pub check_names: Vec<String>,
}

impl ModifiedResource {
    fn from_first_change(change: &Change) -> Self {
        let resource_change = &change.resource_change;
        Self {
            logical_resource_id: resource_change.logical_resource_id.clone(),
            resource_type: resource_change.resource_type.clone(),
            physical_resource_id: resource_change.physical_resource_id.clone(),
            changes: vec![change.clone()],
            check_ids: Vec::new(),
            check_names: Vec::new(),
        }
    }

    /// Returns the number of violated checks attached to the resource.
    #[must_use]
    pub fn check_count(&self) -> usize {
        self.check_ids.len()
    }

    /// Iterates `(check_id, check_name)` pairs in scan order.
    pub fn checks(&self) -> impl Iterator<Item = (&str, &str)> {
        self.check_ids
            .iter()
            .zip(self.check_names.iter())
            .map(|(id, name)| (id.as_str(), name.as_str()))
    }

    fn record_check(&mut self, check: &PolicyCheckResult) {
        self.check_ids.push(check.check_id.clone());
        self.check_names.push(check.check_name.clone());
    }
}

/// Modified resources keyed by logical id, iterated in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModifiedResources {
    resources: Vec<ModifiedResource>,
    index: HashMap<String, usize>,
}

impl ModifiedResources {
    /// Groups the `Modify` changes of a change set by logical resource id.
    ///
    /// Changes with any other action are skipped. Repeated logical ids only
    /// append to the change list; type and physical id stay as first seen.
    #[must_use]
    pub fn from_change_set(change_set: &ChangeSetDescription) -> Self {
        let mut resources = Self::default();

        for change in &change_set.changes {
            if change.resource_change.action != ChangeAction::Modify {
                continue;
            }

            let logical_id = change.resource_change.logical_resource_id.as_str();
            match resources.index.get(logical_id) {
                Some(&position) => resources.resources[position].changes.push(change.clone()),
                None => {
                    resources
                        .index
                        .insert(logical_id.to_owned(), resources.resources.len());
                    resources
                        .resources
                        .push(ModifiedResource::from_first_change(change));
                }
            }
        }

        resources
    }

    /// Attaches failing checks to the resources they target.
    ///
    /// Checks whose reference yields no logical id, or whose logical id is not
    /// part of the modify set, are discarded. Returns how many were attached.
    pub fn attach_findings(&mut self, findings: &[PolicyCheckResult]) -> usize {
        let mut attached = 0_usize;

        for finding in findings {
            let Some(logical_id) = finding.logical_resource_id() else {
                continue;
            };

            if let Some(&position) = self.index.get(logical_id) {
                self.resources[position].record_check(finding);
                attached = attached.saturating_add(1);
            }
        }

        attached
    }

    /// Returns the resource with the given logical id.
    #[must_use]
    pub fn get(&self, logical_resource_id: &str) -> Option<&ModifiedResource> {
        self.index
            .get(logical_resource_id)
            .map(|&position| &self.resources[position])
    }

    /// Iterates resources in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &ModifiedResource> {
        self.resources.iter()
    }

    /// Returns the number of distinct modified resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Returns whether no resource would be modified.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Returns the total number of checks attached across all resources.
    #[must_use]
    pub fn total_check_count(&self) -> usize {
        self.resources.iter().map(ModifiedResource::check_count).sum()
    }
}
