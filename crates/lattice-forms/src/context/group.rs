//! Group registry and property partitioning.

use std::sync::Arc;

use lattice_forms_core::annotation::Group;
use lattice_forms_core::{DEFAULT_GROUP_ID, GroupDetail, Metadata};

use crate::logging::targets;

/// The properties of one group, in declaration order.
#[derive(Debug, Clone)]
pub struct GroupEntry {
    group: GroupDetail,
    properties: Vec<Arc<Metadata>>,
}

impl GroupEntry {
    /// The resolved group id.
    pub fn group_id(&self) -> u32 {
        self.group.group_id()
    }

    /// The resolved group.
    pub fn group(&self) -> &GroupDetail {
        &self.group
    }

    /// The group's priority.
    pub fn priority(&self) -> i32 {
        self.group.priority()
    }

    /// Member properties.
    pub fn properties(&self) -> &[Arc<Metadata>] {
        &self.properties
    }
}

/// Registered groups in discovery order. The default group is implicit.
#[derive(Debug, Default)]
pub(crate) struct GroupRegistry {
    groups: Vec<GroupDetail>,
}

impl GroupRegistry {
    /// Register or replace a group, keeping its original position.
    pub(crate) fn add(&mut self, group: GroupDetail) {
        if group.is_default() {
            tracing::warn!(
                target: targets::CONTEXT,
                title = group.title(),
                "group id 0 is reserved for the default group; ignoring"
            );
            return;
        }
        match self.groups.iter_mut().find(|g| g.group_id() == group.group_id()) {
            Some(existing) => *existing = group,
            None => self.groups.push(group),
        }
    }

    pub(crate) fn contains(&self, group_id: u32) -> bool {
        self.groups.iter().any(|g| g.group_id() == group_id)
    }

    /// The registered group, or the default group.
    pub(crate) fn resolve(&self, group_id: u32) -> GroupDetail {
        self.groups
            .iter()
            .find(|g| g.group_id() == group_id)
            .cloned()
            .unwrap_or_else(GroupDetail::default_group)
    }

    /// The default group followed by every registered group, sorted by
    /// descending priority. Ties keep discovery order.
    pub(crate) fn details(&self) -> Vec<GroupDetail> {
        let mut details = Vec::with_capacity(self.groups.len() + 1);
        details.push(GroupDetail::default_group());
        details.extend(self.groups.iter().cloned());
        details.sort_by(|a, b| b.priority().cmp(&a.priority()));
        details
    }

    /// Partition properties by group.
    ///
    /// A property belongs to its `Group` annotation's id when that group is
    /// registered, and to the default group otherwise. Entries are sorted by
    /// descending priority; ties keep the order in which the groups first
    /// appeared among the properties.
    pub(crate) fn partition(&self, properties: &[Arc<Metadata>]) -> Vec<GroupEntry> {
        let mut entries: Vec<GroupEntry> = Vec::new();
        for property in properties {
            let declared = property.annotation::<Group>().map_or(DEFAULT_GROUP_ID, |g| g.0);
            let group_id = if declared == DEFAULT_GROUP_ID || self.contains(declared) {
                declared
            } else {
                tracing::warn!(
                    target: targets::CONTEXT,
                    property = property.name(),
                    group_id = declared,
                    "unregistered group; using the default group"
                );
                DEFAULT_GROUP_ID
            };

            match entries.iter_mut().find(|e| e.group_id() == group_id) {
                Some(entry) => entry.properties.push(property.clone()),
                None => entries.push(GroupEntry {
                    group: self.resolve(group_id),
                    properties: vec![property.clone()],
                }),
            }
        }
        entries.sort_by(|a, b| b.priority().cmp(&a.priority()));
        entries
    }
}
