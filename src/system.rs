//! System trait and priority-ordered system registry

use slotmap::{new_key_type, SlotMap};

use crate::error::{EcsError, Result};
use crate::World;

new_key_type! {
    /// Handle of a registered system
    pub struct SystemId;
}

/// System trait
///
/// Systems run once per [`World::update`], lowest priority first.
pub trait System: 'static {
    /// Get system name
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Ordering key; lower runs earlier. Read once at registration.
    fn priority(&self) -> i32 {
        0
    }

    /// Called when the system is registered
    fn init(&mut self, _world: &mut World) -> Result<()> {
        Ok(())
    }

    /// Called when the system is removed
    fn exit(&mut self, _world: &mut World) -> Result<()> {
        Ok(())
    }

    /// Run system logic against the world
    fn update(&mut self, world: &mut World) -> Result<()>;
}

/// Boxed system
pub type BoxedSystem = Box<dyn System>;

struct SystemEntry {
    name: &'static str,
    priority: i32,
    /// `None` while the system is running
    system: Option<BoxedSystem>,
}

/// Registered systems sorted by ascending priority.
///
/// Equal priorities keep registration order.
#[derive(Default)]
pub struct SystemManager {
    systems: SlotMap<SystemId, SystemEntry>,
    order: Vec<SystemId>,
}

impl SystemManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, system: BoxedSystem) -> SystemId {
        let id = self.systems.insert(SystemEntry {
            name: system.name(),
            priority: system.priority(),
            system: Some(system),
        });
        self.order.push(id);
        self.reorder();
        id
    }

    fn reorder(&mut self) {
        let systems = &self.systems;
        self.order
            .sort_by_key(|id| systems.get(*id).map_or(i32::MAX, |entry| entry.priority));
    }

    /// Unregister `id`. The inner `None` means the system is currently
    /// running and will be handed back when its update returns.
    pub(crate) fn remove(&mut self, id: SystemId) -> Result<Option<BoxedSystem>> {
        let entry = self.systems.remove(id).ok_or(EcsError::SystemNotFound)?;
        self.order.retain(|other| *other != id);
        Ok(entry.system)
    }

    /// Take a system out to run it
    pub(crate) fn take(&mut self, id: SystemId) -> Option<BoxedSystem> {
        self.systems.get_mut(id)?.system.take()
    }

    /// Put a system back after it ran. Returns it if it was removed in the
    /// meantime.
    pub(crate) fn restore(&mut self, id: SystemId, system: BoxedSystem) -> Option<BoxedSystem> {
        match self.systems.get_mut(id) {
            Some(entry) => {
                entry.system = Some(system);
                None
            }
            None => Some(system),
        }
    }

    /// Ids in execution order
    pub fn order(&self) -> &[SystemId] {
        &self.order
    }

    pub fn contains(&self, id: SystemId) -> bool {
        self.systems.contains_key(id)
    }

    pub fn name(&self, id: SystemId) -> Option<&'static str> {
        self.systems.get(id).map(|entry| entry.name)
    }

    pub fn priority(&self, id: SystemId) -> Option<i32> {
        self.systems.get(id).map(|entry| entry.priority)
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}

impl std::fmt::Debug for SystemManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.order.iter().filter_map(|id| self.name(*id)))
            .finish()
    }
}
