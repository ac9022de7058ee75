use std::collections::HashMap;

use crate::client::{ClientHandle, ClientId};

/// The set of handles currently eligible for broadcast delivery.
///
/// Keyed by `ClientId`, so a handle is present at most once. Only the hub's
/// control loop holds one of these; it is never shared.
#[derive(Debug)]
pub struct Membership<C> {
    members: HashMap<ClientId, ClientHandle<C>>,
}

impl<C> Default for Membership<C> {
    fn default() -> Self {
        Self {
            members: HashMap::new(),
        }
    }
}

impl<C> Membership<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the handle. Returns `false` and leaves the set untouched if it is
    /// already a member.
    pub fn insert(&mut self, handle: ClientHandle<C>) -> bool {
        if self.members.contains_key(handle.id()) {
            return false;
        }
        self.members.insert(handle.id().clone(), handle);
        true
    }

    /// Removes and returns the member with this id, if any.
    pub fn remove(&mut self, id: &ClientId) -> Option<ClientHandle<C>> {
        self.members.remove(id)
    }

    pub fn contains(&self, id: &ClientId) -> bool {
        self.members.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClientHandle<C>> {
        self.members.values()
    }

    /// Empties the set, yielding every member.
    pub fn drain(&mut self) -> impl Iterator<Item = ClientHandle<C>> + '_ {
        self.members.drain().map(|(_, handle)| handle)
    }
}
