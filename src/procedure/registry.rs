// Metadata Registry
// Process-wide cache of procedure descriptors, built once per procedure type

use super::descriptor::{ProcedureDescriptor, StoredProcedure};
use parking_lot::Mutex;
use std::any::TypeId;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

const BUCKETS: usize = 64;

/// One published descriptor. Entries are never removed or replaced; `next` is set at most once.
struct Entry {
    type_id: TypeId,
    descriptor: Arc<ProcedureDescriptor>,
    next: OnceLock<Box<Entry>>,
}

type Slot = OnceLock<Box<Entry>>;

/// Registry of procedure descriptors keyed by procedure type.
///
/// Each bucket is an append-only chain of `OnceLock` cells. Lookups only read cells that
/// are already set, so steady-state resolution takes no lock. Population is serialized by
/// `build_lock`, which only guards "declare type T if absent".
pub struct MetadataRegistry {
    buckets: [Slot; BUCKETS],
    count: AtomicUsize,
    build_lock: Mutex<()>,
}

impl MetadataRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        const EMPTY: Slot = OnceLock::new();
        Self {
            buckets: [EMPTY; BUCKETS],
            count: AtomicUsize::new(0),
            build_lock: Mutex::new(()),
        }
    }

    /// The registry shared by the whole process
    pub fn global() -> &'static MetadataRegistry {
        static GLOBAL: OnceLock<MetadataRegistry> = OnceLock::new();
        GLOBAL.get_or_init(MetadataRegistry::new)
    }

    /// Resolve the descriptor for a procedure type, declaring it on first use
    pub fn resolve<P: StoredProcedure>(&self) -> Arc<ProcedureDescriptor> {
        let type_id = TypeId::of::<P>();
        if let Some(descriptor) = self.lookup(type_id) {
            return descriptor;
        }

        let _guard = self.build_lock.lock();
        // Another thread may have published while we waited
        if let Some(descriptor) = self.lookup(type_id) {
            return descriptor;
        }

        let descriptor = Arc::new(P::declare());
        tracing::debug!(
            "[Registry] Declared {} with {} parameters and {} result sets",
            descriptor.name,
            descriptor.parameters.len(),
            descriptor.result_set_count()
        );
        for row in descriptor.result_sets.iter().filter(|r| r.constructor.is_none()) {
            tracing::debug!(
                "[Registry] {} has no designated constructor; parsing it will fail",
                row.row_type
            );
        }

        self.publish(type_id, Arc::clone(&descriptor));
        descriptor
    }

    /// Check if a descriptor has been built for a procedure type
    pub fn is_resolved<P: StoredProcedure>(&self) -> bool {
        self.lookup(TypeId::of::<P>()).is_some()
    }

    /// Number of procedure types resolved so far
    pub fn len(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, type_id: TypeId) -> Option<Arc<ProcedureDescriptor>> {
        let mut slot = self.bucket(type_id);
        while let Some(entry) = slot.get() {
            if entry.type_id == type_id {
                return Some(Arc::clone(&entry.descriptor));
            }
            slot = &entry.next;
        }
        None
    }

    /// Append to the end of the bucket's chain. Callers hold `build_lock`.
    fn publish(&self, type_id: TypeId, descriptor: Arc<ProcedureDescriptor>) {
        let mut slot = self.bucket(type_id);
        while let Some(entry) = slot.get() {
            slot = &entry.next;
        }
        let entry = Box::new(Entry {
            type_id,
            descriptor,
            next: OnceLock::new(),
        });
        if slot.set(entry).is_err() {
            tracing::error!("[Registry] Slot for {:?} was filled outside the build lock", type_id);
            return;
        }
        self.count.fetch_add(1, Ordering::Release);
    }

    fn bucket(&self, type_id: TypeId) -> &Slot {
        let mut hasher = DefaultHasher::new();
        type_id.hash(&mut hasher);
        &self.buckets[(hasher.finish() as usize) % BUCKETS]
    }
}

impl Default for MetadataRegistry {
    fn default() -> Self {
        Self::new()
    }
}
