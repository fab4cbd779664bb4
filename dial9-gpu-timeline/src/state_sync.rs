//! Optional hook for backends that mirror vertex-array state.
//!
//! Backends that keep no shadow state simply rely on the defaults.

use crate::telemetry::error::ProfilerError;

pub const MAX_VERTEX_ATTRIBS: usize = 16;
pub const MAX_VERTEX_ATTRIB_BINDINGS: usize = 16;

/// Which parts of a vertex array changed since the last sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VertexArrayDirtyBits {
    /// Array-level dirty bits (element buffer binding etc.).
    pub array: u64,
    /// Per-attribute dirty masks, indexed by attribute slot.
    pub attribs: [u32; MAX_VERTEX_ATTRIBS],
    /// Per-binding dirty masks, indexed by binding slot.
    pub bindings: [u32; MAX_VERTEX_ATTRIB_BINDINGS],
}

impl VertexArrayDirtyBits {
    pub fn is_clean(&self) -> bool {
        self.array == 0
            && self.attribs.iter().all(|&m| m == 0)
            && self.bindings.iter().all(|&m| m == 0)
    }

    /// Attribute slots with any dirty bit set.
    pub fn dirty_attribs(&self) -> impl Iterator<Item = usize> + '_ {
        self.attribs
            .iter()
            .enumerate()
            .filter(|(_, m)| **m != 0)
            .map(|(i, _)| i)
    }

    /// Binding slots with any dirty bit set.
    pub fn dirty_bindings(&self) -> impl Iterator<Item = usize> + '_ {
        self.bindings
            .iter()
            .enumerate()
            .filter(|(_, m)| **m != 0)
            .map(|(i, _)| i)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Unchanged,
    Synced,
}

pub trait VertexArraySync {
    fn sync_state(&mut self, _dirty: &VertexArrayDirtyBits) -> Result<SyncOutcome, ProfilerError> {
        Ok(SyncOutcome::Unchanged)
    }

    fn destroy(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoShadowState;
    impl VertexArraySync for NoShadowState {}

    #[derive(Default)]
    struct Shadow {
        synced_attribs: Vec<usize>,
        destroyed: bool,
    }

    impl VertexArraySync for Shadow {
        fn sync_state(
            &mut self,
            dirty: &VertexArrayDirtyBits,
        ) -> Result<SyncOutcome, ProfilerError> {
            if dirty.is_clean() {
                return Ok(SyncOutcome::Unchanged);
            }
            if dirty.dirty_bindings().any(|b| b >= 8) {
                return Err(ProfilerError::StateSync("binding out of range".to_string()));
            }
            self.synced_attribs.extend(dirty.dirty_attribs());
            Ok(SyncOutcome::Synced)
        }

        fn destroy(&mut self) {
            self.destroyed = true;
        }
    }

    #[test]
    fn test_default_is_a_no_op() {
        let mut vao = NoShadowState;
        let mut dirty = VertexArrayDirtyBits::default();
        dirty.attribs[3] = 1;
        assert_eq!(vao.sync_state(&dirty).unwrap(), SyncOutcome::Unchanged);
        vao.destroy();
    }

    #[test]
    fn test_override_sees_dirty_slots() {
        let mut vao = Shadow::default();
        let mut dirty = VertexArrayDirtyBits::default();
        assert_eq!(vao.sync_state(&dirty).unwrap(), SyncOutcome::Unchanged);

        dirty.attribs[0] = 0b1;
        dirty.attribs[15] = 0b100;
        assert_eq!(vao.sync_state(&dirty).unwrap(), SyncOutcome::Synced);
        assert_eq!(vao.synced_attribs, vec![0, 15]);

        dirty.bindings[9] = 1;
        assert!(matches!(
            vao.sync_state(&dirty),
            Err(ProfilerError::StateSync(_))
        ));

        vao.destroy();
        assert!(vao.destroyed);
    }
}
