//! System registration and in-order execution.
//!
//! A [`Schedule`] is an ordered list of system callbacks over a
//! host-defined world type `W`, each registered as *immutable* (shared
//! access) or *mutable* (exclusive access). Running the schedule invokes
//! them in insertion order.
//!
//! This is intentionally minimal: no dependency graph, no access-set
//! planning, no parallel dispatch. Hosts that need more build it on top.

/// The callback behind one registered system.
enum SystemFn<W> {
    Immutable(Box<dyn Fn(&W)>),
    Mutable(Box<dyn FnMut(&mut W)>),
}

/// A named system within a schedule.
struct System<W> {
    name: &'static str,
    run: SystemFn<W>,
}

/// Ordered list of systems over a host world type.
///
/// ## Example
/// ```ignore
/// let mut schedule = Schedule::new();
/// schedule.add_system("report", |game: &Game| { /* read-only */ });
/// schedule.add_system_mut("integrate", |game: &mut Game| { /* mutate */ });
/// schedule.run(&mut game);
/// ```
pub struct Schedule<W> {
    systems: Vec<System<W>>,
}

impl<W> Default for Schedule<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W> Schedule<W> {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
        }
    }

    /// Number of registered systems.
    #[inline]
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Returns `true` if no systems are registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Removes all systems.
    pub fn clear(&mut self) {
        self.systems.clear();
    }

    /// Registers a read-only system at the end of the schedule.
    pub fn add_system<F: Fn(&W) + 'static>(&mut self, name: &'static str, system: F) {
        self.systems.push(System {
            name,
            run: SystemFn::Immutable(Box::new(system)),
        });
    }

    /// Registers a mutating system at the end of the schedule.
    pub fn add_system_mut<F: FnMut(&mut W) + 'static>(&mut self, name: &'static str, system: F) {
        self.systems.push(System {
            name,
            run: SystemFn::Mutable(Box::new(system)),
        });
    }

    /// Names of the registered systems, in execution order.
    pub fn system_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.systems.iter().map(|s| s.name)
    }

    /// Runs every system once, in insertion order.
    pub fn run(&mut self, world: &mut W) {
        for system in &mut self.systems {
            match &mut system.run {
                SystemFn::Immutable(f) => f(world),
                SystemFn::Mutable(f) => f(world),
            }
        }
    }
}
