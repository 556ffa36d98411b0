// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::event::EventKind;

/// Per-event-kind re-entrancy flags.
///
/// A flag is raised for the duration of one fan-out pass and checked at the
/// top of dispatch: a delivery of the same kind arriving while its flag is
/// raised is the engine's own write echoing back and must be dropped. Flags
/// are scoped to one kind only, a `RoleSet` pass does not suppress
/// `RoleAdded` or `RoleRemoved` deliveries.
#[derive(Debug, Default)]
pub(crate) struct EventGuards {
    active: [bool; EventKind::ALL.len()],
}

impl EventGuards {
    pub(crate) fn is_active(&self, kind: EventKind) -> bool {
        self.active[kind.index()]
    }

    pub(crate) fn activate(&mut self, kind: EventKind) {
        debug_assert!(!self.is_active(kind));
        self.active[kind.index()] = true;
    }

    pub(crate) fn deactivate(&mut self, kind: EventKind) {
        self.active[kind.index()] = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_scoped_to_one_kind() {
        let mut guards = EventGuards::default();
        guards.activate(EventKind::RoleSet);

        assert!(guards.is_active(EventKind::RoleSet));
        for kind in [
            EventKind::SiteCreated,
            EventKind::UserCreated,
            EventKind::RoleAdded,
            EventKind::RoleRemoved,
        ] {
            assert!(!guards.is_active(kind));
        }

        guards.deactivate(EventKind::RoleSet);
        assert!(!guards.is_active(EventKind::RoleSet));
    }
}
