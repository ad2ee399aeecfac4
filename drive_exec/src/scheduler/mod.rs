//! # Command scheduler
//!
//! The scheduler owns every command and arbitrates the resources (subsystems) they require. It is
//! driven by calling [`Scheduler::run`] once per control cycle, and each call processes one tick
//! in four phases:
//!
//! 1. Subsystem periodic hooks.
//! 2. Start events: triggers are polled, then queued cancellations and starts are applied. A
//!    start interrupts the current owners of every resource the new command requires, ending
//!    them with `end(true)`, before the new command is initialised.
//! 3. Running commands: each one whose completion predicate holds is ended with `end(false)`,
//!    every other one executes once.
//! 4. Default commands: every resource left without an owner has its default command started,
//!    if it has one and it is not already running.
//!
//! As all interruptions happen in phase 2 no command is executed after it has been interrupted,
//! and no actuator demand is produced by an old owner once a new owner has been chosen.
//!
//! Commands report failures by returning an error from `initialise` or `execute`. These never
//! leave the scheduler, the command is logged and interrupted instead.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod trigger;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};
use serde::Serialize;
use std::{
    cell::{Ref, RefCell, RefMut},
    collections::{BTreeMap, BTreeSet},
    fmt,
    rc::Rc,
};

// Internal
use crate::cmd::{Command, TickCtx};
pub use trigger::{ButtonTrigger, Trigger};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A unit of hardware that commands can take exclusive ownership of.
pub trait Subsystem {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Called once at the start of every tick, whether or not the subsystem is owned.
    fn periodic(&mut self) {}
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Identity of a registered subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ResourceId(pub usize);

/// Identity of a command added to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CmdId(pub usize);

/// Shared handle to a registered subsystem.
///
/// Commands hold clones of the handle to read from and command the subsystem. The scheduler only
/// ever starts one owner of a resource at a time, so only the owning command mutates it.
pub struct Resource<S> {
    id: ResourceId,
    inner: Rc<RefCell<S>>,
}

/// The scheduler itself.
pub struct Scheduler {
    period_s: f64,

    cycle: u64,

    subsystems: Vec<SubsystemSlot>,

    commands: Vec<CmdSlot>,

    /// Running commands, in the order they were started.
    running: Vec<CmdId>,

    /// Current owner of each resource.
    owners: BTreeMap<ResourceId, Option<CmdId>>,

    defaults: BTreeMap<ResourceId, CmdId>,

    bindings: Vec<Binding>,

    pending_starts: Vec<CmdId>,

    pending_cancels: Vec<CmdId>,
}

struct SubsystemSlot {
    id: ResourceId,
    name: String,
    inner: Rc<RefCell<dyn Subsystem>>,
}

struct CmdSlot {
    cmd: Box<dyn Command>,
    name: String,
    requirements: BTreeSet<ResourceId>,
    status: CmdStatus,
    last_end: Option<EndReason>,
}

struct Binding {
    trigger: Box<dyn Trigger>,
    cmd: CmdId,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Lifecycle state of a command as seen by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CmdStatus {
    Idle,
    Running,
}

/// How a command's last run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EndReason {
    /// The completion predicate (or a timeout) was satisfied.
    Finished,

    /// Another command took one of its resources, it was cancelled, or it failed.
    Interrupted,
}

/// Errors in building the schedule. None of these can occur once the scheduler is running.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SchedulerError {
    #[error("Scheduler period must be a finite, positive number of seconds, got {0}")]
    InvalidPeriod(f64),

    #[error("No command with id {0} has been added")]
    UnknownCommand(CmdId),

    #[error("No subsystem is registered as resource {0}")]
    UnknownResource(ResourceId),

    #[error("Default command {0} for resource {1} does not require that resource")]
    DefaultMissingRequirement(String, ResourceId),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<S> Resource<S> {
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Immutably borrow the subsystem.
    ///
    /// # Panics
    ///
    /// If the subsystem is currently mutably borrowed.
    pub fn borrow(&self) -> Ref<S> {
        self.inner.borrow()
    }

    /// Mutably borrow the subsystem.
    ///
    /// # Panics
    ///
    /// If the subsystem is currently borrowed.
    pub fn borrow_mut(&self) -> RefMut<S> {
        self.inner.borrow_mut()
    }
}

impl<S> Clone for Resource<S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            inner: self.inner.clone(),
        }
    }
}

impl Scheduler {
    /// Create an empty scheduler which will be run every `period_s` seconds.
    pub fn new(period_s: f64) -> Result<Self, SchedulerError> {
        if !period_s.is_finite() || period_s <= 0.0 {
            return Err(SchedulerError::InvalidPeriod(period_s));
        }

        Ok(Self {
            period_s,
            cycle: 0,
            subsystems: Vec::new(),
            commands: Vec::new(),
            running: Vec::new(),
            owners: BTreeMap::new(),
            defaults: BTreeMap::new(),
            bindings: Vec::new(),
            pending_starts: Vec::new(),
            pending_cancels: Vec::new(),
        })
    }

    // ---- SCHEDULE CONSTRUCTION ----

    /// Register a subsystem as a resource and get back the handle commands use to access it.
    pub fn register_subsystem<S>(&mut self, subsystem: S) -> Resource<S>
    where
        S: Subsystem + 'static,
    {
        let id = ResourceId(self.subsystems.len());
        let name = String::from(subsystem.name());
        let inner = Rc::new(RefCell::new(subsystem));

        self.subsystems.push(SubsystemSlot {
            id,
            name: name.clone(),
            inner: inner.clone(),
        });
        self.owners.insert(id, None);

        debug!("Registered subsystem {} as resource {}", name, id);

        Resource { id, inner }
    }

    /// Hand a command to the scheduler. It stays idle until scheduled.
    pub fn add_command<C>(&mut self, cmd: C) -> Result<CmdId, SchedulerError>
    where
        C: Command + 'static,
    {
        let requirements: BTreeSet<ResourceId> = cmd.requirements().iter().copied().collect();

        for r in requirements.iter() {
            if !self.owners.contains_key(r) {
                return Err(SchedulerError::UnknownResource(*r));
            }
        }

        let id = CmdId(self.commands.len());
        self.commands.push(CmdSlot {
            name: String::from(cmd.name()),
            cmd: Box::new(cmd),
            requirements,
            status: CmdStatus::Idle,
            last_end: None,
        });

        Ok(id)
    }

    /// Run `cmd` whenever `resource` has no other owner. The command must require the resource.
    ///
    /// The default is started at the end of the next tick in which all of its requirements are
    /// free, it never takes a resource from another command. A previous default for the same
    /// resource that is still running is interrupted on the next tick.
    pub fn set_default_command(
        &mut self,
        resource: ResourceId,
        cmd: CmdId,
    ) -> Result<(), SchedulerError> {
        if !self.owners.contains_key(&resource) {
            return Err(SchedulerError::UnknownResource(resource));
        }
        let slot = self.slot(cmd)?;

        if !slot.requirements.contains(&resource) {
            return Err(SchedulerError::DefaultMissingRequirement(
                slot.name.clone(),
                resource,
            ));
        }

        if let Some(prev) = self.defaults.insert(resource, cmd) {
            if prev != cmd && self.is_running(prev) {
                self.pending_cancels.push(prev);
            }
        }

        Ok(())
    }

    /// Start `cmd` on every tick where `trigger` fires.
    pub fn on_trigger<T>(&mut self, trigger: T, cmd: CmdId) -> Result<(), SchedulerError>
    where
        T: Trigger + 'static,
    {
        self.slot(cmd)?;

        self.bindings.push(Binding {
            trigger: Box::new(trigger),
            cmd,
        });

        Ok(())
    }

    // ---- REQUESTS ----

    /// Request `cmd` is started on the next tick. A running command is restarted.
    pub fn schedule(&mut self, cmd: CmdId) -> Result<(), SchedulerError> {
        self.slot(cmd)?;
        self.pending_starts.push(cmd);
        Ok(())
    }

    /// Request `cmd` is interrupted on the next tick, if it is running then.
    pub fn cancel(&mut self, cmd: CmdId) -> Result<(), SchedulerError> {
        self.slot(cmd)?;
        self.pending_cancels.push(cmd);
        Ok(())
    }

    /// Request every running command is interrupted on the next tick.
    ///
    /// Default commands restart at the end of that same tick.
    pub fn cancel_all(&mut self) {
        self.pending_cancels.extend(self.running.iter().copied());
    }

    // ---- TICK ----

    /// Process one tick.
    pub fn run(&mut self) {
        let ctx = TickCtx {
            cycle: self.cycle,
            period_s: self.period_s,
        };

        // Subsystem hooks
        for s in self.subsystems.iter() {
            s.inner.borrow_mut().periodic();
        }

        // Start events
        let mut fired = Vec::new();
        for b in self.bindings.iter_mut() {
            if b.trigger.poll() {
                fired.push(b.cmd);
            }
        }
        self.pending_starts.extend(fired);

        for id in std::mem::take(&mut self.pending_cancels) {
            if self.is_running(id) {
                self.end_command(id, EndReason::Interrupted);
            }
        }

        let mut starts = std::mem::take(&mut self.pending_starts);
        dedup_in_order(&mut starts);
        for id in starts {
            self.start_command(id, &ctx);
        }

        // Running commands
        for id in self.running.clone() {
            if !self.is_running(id) {
                continue;
            }

            let slot = &mut self.commands[id.0];

            if slot.cmd.is_finished(&ctx) {
                self.end_command(id, EndReason::Finished);
            } else if let Err(e) = slot.cmd.execute(&ctx) {
                warn!("{} failed during execution: {}", slot.name, e);
                self.end_command(id, EndReason::Interrupted);
            }
        }

        // Default commands, only onto resources that are all free
        let defaults: Vec<CmdId> = self.defaults.values().copied().collect();
        for id in defaults {
            if self.is_running(id) {
                continue;
            }

            let all_free = self.commands[id.0]
                .requirements
                .iter()
                .all(|r| self.owner(*r).is_none());

            if all_free {
                trace!("Starting default command {}", self.commands[id.0].name);
                self.start_command(id, &ctx);
            }
        }

        self.cycle += 1;
    }

    // ---- QUERIES ----

    pub fn is_running(&self, cmd: CmdId) -> bool {
        self.status(cmd) == Some(CmdStatus::Running)
    }

    pub fn status(&self, cmd: CmdId) -> Option<CmdStatus> {
        self.commands.get(cmd.0).map(|s| s.status)
    }

    /// How the last run of the command ended, `None` if it has never ended.
    pub fn last_end(&self, cmd: CmdId) -> Option<EndReason> {
        self.commands.get(cmd.0).and_then(|s| s.last_end)
    }

    /// Command currently owning the resource.
    pub fn owner(&self, resource: ResourceId) -> Option<CmdId> {
        self.owners.get(&resource).copied().flatten()
    }

    pub fn default_command(&self, resource: ResourceId) -> Option<CmdId> {
        self.defaults.get(&resource).copied()
    }

    pub fn command_name(&self, cmd: CmdId) -> Option<&str> {
        self.commands.get(cmd.0).map(|s| s.name.as_str())
    }

    pub fn subsystem_name(&self, resource: ResourceId) -> Option<&str> {
        self.subsystems
            .iter()
            .find(|s| s.id == resource)
            .map(|s| s.name.as_str())
    }

    /// Running commands, in the order they were started.
    pub fn running(&self) -> &[CmdId] {
        &self.running
    }

    /// Number of the next tick to be run.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn period_s(&self) -> f64 {
        self.period_s
    }

    /// Time of the next tick to be run, in seconds since the first tick.
    pub fn now_s(&self) -> f64 {
        self.cycle as f64 * self.period_s
    }

    // ---- INTERNAL ----

    fn slot(&self, cmd: CmdId) -> Result<&CmdSlot, SchedulerError> {
        self.commands
            .get(cmd.0)
            .ok_or(SchedulerError::UnknownCommand(cmd))
    }

    /// Interrupt the owners of the command's requirements, then initialise it.
    fn start_command(&mut self, id: CmdId, ctx: &TickCtx) {
        if self.is_running(id) {
            info!("{} restarted", self.commands[id.0].name);
            self.end_command(id, EndReason::Interrupted);
        }

        let mut to_interrupt = Vec::new();
        for r in self.commands[id.0].requirements.iter() {
            if let Some(owner) = self.owners.get(r).copied().flatten() {
                if !to_interrupt.contains(&owner) {
                    to_interrupt.push(owner);
                }
            }
        }

        for owner in to_interrupt {
            info!(
                "{} interrupted by {}",
                self.commands[owner.0].name, self.commands[id.0].name
            );
            self.end_command(owner, EndReason::Interrupted);
        }

        let slot = &mut self.commands[id.0];
        slot.status = CmdStatus::Running;
        for r in slot.requirements.iter() {
            self.owners.insert(*r, Some(id));
        }
        self.running.push(id);

        debug!("Starting {}", slot.name);

        if let Err(e) = slot.cmd.initialise(ctx) {
            warn!("{} failed to initialise: {}", slot.name, e);
            self.end_command(id, EndReason::Interrupted);
        }
    }

    /// Call the command's end hook and release its resources.
    fn end_command(&mut self, id: CmdId, reason: EndReason) {
        let slot = &mut self.commands[id.0];

        slot.cmd.end(reason == EndReason::Interrupted);
        slot.status = CmdStatus::Idle;
        slot.last_end = Some(reason);

        for r in slot.requirements.iter() {
            if self.owners.get(r).copied().flatten() == Some(id) {
                self.owners.insert(*r, None);
            }
        }
        self.running.retain(|&c| c != id);

        match reason {
            EndReason::Finished => debug!("{} finished", slot.name),
            EndReason::Interrupted => debug!("{} ended (interrupted)", slot.name),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

impl fmt::Display for CmdId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Remove repeated ids, keeping the first occurrence.
fn dedup_in_order(ids: &mut Vec<CmdId>) {
    let mut seen = BTreeSet::new();
    ids.retain(|id| seen.insert(*id));
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::{CmdError, CommandExt};
    use std::cell::Cell;

    type EventLog = Rc<RefCell<Vec<String>>>;

    struct Dummy {
        name: &'static str,
        periodic_calls: u32,
    }

    impl Subsystem for Dummy {
        fn name(&self) -> &str {
            self.name
        }

        fn periodic(&mut self) {
            self.periodic_calls += 1;
        }
    }

    /// Command recording its lifecycle calls.
    struct Probe {
        name: &'static str,
        reqs: Vec<ResourceId>,
        log: EventLog,
        finish_after: Option<u32>,
        fail_init: bool,
        fail_after: Option<u32>,
        executes: u32,
    }

    impl Probe {
        fn new(name: &'static str, reqs: &[ResourceId], log: &EventLog) -> Self {
            Self {
                name,
                reqs: reqs.to_vec(),
                log: log.clone(),
                finish_after: None,
                fail_init: false,
                fail_after: None,
                executes: 0,
            }
        }

        fn finish_after(mut self, n: u32) -> Self {
            self.finish_after = Some(n);
            self
        }
    }

    impl Command for Probe {
        fn name(&self) -> &str {
            self.name
        }

        fn requirements(&self) -> &[ResourceId] {
            &self.reqs
        }

        fn initialise(&mut self, _ctx: &TickCtx) -> Result<(), CmdError> {
            self.executes = 0;
            self.log.borrow_mut().push(format!("{}:init", self.name));
            if self.fail_init {
                return Err(CmdError::Failed(String::from("init")));
            }
            Ok(())
        }

        fn execute(&mut self, _ctx: &TickCtx) -> Result<(), CmdError> {
            self.executes += 1;
            self.log.borrow_mut().push(format!("{}:exec", self.name));
            match self.fail_after {
                Some(n) if self.executes >= n => Err(CmdError::Failed(String::from("exec"))),
                _ => Ok(()),
            }
        }

        fn is_finished(&mut self, _ctx: &TickCtx) -> bool {
            self.finish_after.map_or(false, |n| self.executes >= n)
        }

        fn end(&mut self, interrupted: bool) {
            self.log
                .borrow_mut()
                .push(format!("{}:end({})", self.name, interrupted));
        }
    }

    fn setup() -> (Scheduler, Resource<Dummy>, EventLog) {
        let mut sched = Scheduler::new(0.02).unwrap();
        let res = sched.register_subsystem(Dummy {
            name: "dummy",
            periodic_calls: 0,
        });
        (sched, res, Rc::new(RefCell::new(Vec::new())))
    }

    fn take(log: &EventLog) -> Vec<String> {
        log.borrow_mut().drain(..).collect()
    }

    #[test]
    fn test_interrupt_before_initialise() {
        let (mut sched, res, log) = setup();
        let a = sched.add_command(Probe::new("A", &[res.id()], &log)).unwrap();
        let b = sched.add_command(Probe::new("B", &[res.id()], &log)).unwrap();

        sched.schedule(a).unwrap();
        sched.run();
        assert_eq!(take(&log), vec!["A:init", "A:exec"]);
        assert_eq!(sched.owner(res.id()), Some(a));

        sched.schedule(b).unwrap();
        sched.run();
        assert_eq!(take(&log), vec!["A:end(true)", "B:init", "B:exec"]);
        assert_eq!(sched.owner(res.id()), Some(b));
        assert_eq!(sched.last_end(a), Some(EndReason::Interrupted));
        assert_eq!(sched.status(a), Some(CmdStatus::Idle));
        assert_eq!(sched.running(), &[b]);
    }

    #[test]
    fn test_disjoint_resources_run_together() {
        let (mut sched, res, log) = setup();
        let other = sched.register_subsystem(Dummy {
            name: "other",
            periodic_calls: 0,
        });
        let a = sched.add_command(Probe::new("A", &[res.id()], &log)).unwrap();
        let b = sched
            .add_command(Probe::new("B", &[other.id()], &log))
            .unwrap();
        let c = sched
            .add_command(Probe::new("C", &[res.id(), other.id()], &log))
            .unwrap();

        sched.schedule(a).unwrap();
        sched.schedule(b).unwrap();
        sched.run();
        assert!(sched.is_running(a) && sched.is_running(b));

        // Needing both resources interrupts both owners, each exactly once
        take(&log);
        sched.schedule(c).unwrap();
        sched.run();
        assert_eq!(take(&log), vec!["A:end(true)", "B:end(true)", "C:init", "C:exec"]);
        assert_eq!(sched.owner(res.id()), Some(c));
        assert_eq!(sched.owner(other.id()), Some(c));
    }

    #[test]
    fn test_finish_releases_and_default_restarts() {
        let (mut sched, res, log) = setup();
        let def = sched.add_command(Probe::new("D", &[res.id()], &log)).unwrap();
        let a = sched
            .add_command(Probe::new("A", &[res.id()], &log).finish_after(2))
            .unwrap();
        sched.set_default_command(res.id(), def).unwrap();

        sched.run();
        assert_eq!(take(&log), vec!["D:init"]);
        sched.run();
        assert_eq!(take(&log), vec!["D:exec"]);

        sched.schedule(a).unwrap();
        sched.run();
        assert_eq!(take(&log), vec!["D:end(true)", "A:init", "A:exec"]);
        sched.run();
        assert_eq!(take(&log), vec!["A:exec"]);

        // A finishes, the default is running again in the same tick
        sched.run();
        assert_eq!(take(&log), vec!["A:end(false)", "D:init"]);
        assert_eq!(sched.last_end(a), Some(EndReason::Finished));
        assert!(sched.is_running(def));
        assert_eq!(sched.owner(res.id()), Some(def));

        sched.run();
        assert_eq!(take(&log), vec!["D:exec"]);
    }

    #[test]
    fn test_default_never_takes_owned_resources() {
        let (mut sched, res, log) = setup();
        let other = sched.register_subsystem(Dummy {
            name: "other",
            periodic_calls: 0,
        });
        let def = sched
            .add_command(Probe::new("D", &[res.id(), other.id()], &log))
            .unwrap();
        let x = sched
            .add_command(Probe::new("X", &[other.id()], &log))
            .unwrap();
        sched.set_default_command(res.id(), def).unwrap();

        sched.run();
        assert!(sched.is_running(def));
        take(&log);

        // X takes one of the default's resources, the default must not take it back
        sched.schedule(x).unwrap();
        sched.run();
        assert_eq!(take(&log), vec!["D:end(true)", "X:init", "X:exec"]);
        assert!(sched.is_running(x));
        assert!(!sched.is_running(def));
        assert_eq!(sched.owner(other.id()), Some(x));
        assert_eq!(sched.owner(res.id()), None);

        sched.run();
        assert!(sched.is_running(x));
        assert!(!sched.is_running(def));

        // Once X is gone the default comes back
        sched.cancel(x).unwrap();
        sched.run();
        assert_eq!(take(&log), vec!["X:exec", "X:end(true)", "D:init"]);
        assert_eq!(sched.owner(other.id()), Some(def));
    }

    #[test]
    fn test_replacing_running_default() {
        let (mut sched, res, log) = setup();
        let first = sched.add_command(Probe::new("D1", &[res.id()], &log)).unwrap();
        let second = sched.add_command(Probe::new("D2", &[res.id()], &log)).unwrap();

        sched.set_default_command(res.id(), first).unwrap();
        sched.run();
        assert!(sched.is_running(first));
        take(&log);

        sched.set_default_command(res.id(), second).unwrap();
        assert_eq!(sched.default_command(res.id()), Some(second));
        sched.run();
        assert_eq!(take(&log), vec!["D1:end(true)", "D2:init"]);
        assert!(!sched.is_running(first));
        assert!(sched.is_running(second));

        // Setting the same default again leaves it running
        sched.set_default_command(res.id(), second).unwrap();
        sched.run();
        assert_eq!(take(&log), vec!["D2:exec"]);
    }

    #[test]
    fn test_timeout_finishes_on_boundary() {
        let (mut sched, res, log) = setup();
        let a = sched
            .add_command(Probe::new("A", &[res.id()], &log).with_timeout(5.0).unwrap())
            .unwrap();

        sched.schedule(a).unwrap();
        for _ in 0..250 {
            sched.run();
        }
        assert!(sched.is_running(a));

        sched.run();
        assert!(!sched.is_running(a));
        assert_eq!(sched.last_end(a), Some(EndReason::Finished));

        let log = take(&log);
        assert_eq!(log.iter().filter(|e| *e == "A:exec").count(), 250);
        assert_eq!(log.last().map(String::as_str), Some("A:end(false)"));
    }

    #[test]
    fn test_retrigger_restarts() {
        let (mut sched, res, log) = setup();
        let a = sched.add_command(Probe::new("A", &[res.id()], &log)).unwrap();

        sched.schedule(a).unwrap();
        sched.run();
        take(&log);

        // Scheduling twice in one tick is a single start
        sched.schedule(a).unwrap();
        sched.schedule(a).unwrap();
        sched.run();
        assert_eq!(take(&log), vec!["A:end(true)", "A:init", "A:exec"]);
        assert!(sched.is_running(a));
    }

    #[test]
    fn test_errors_become_interruptions() {
        let (mut sched, res, log) = setup();
        let def = sched.add_command(Probe::new("D", &[res.id()], &log)).unwrap();
        sched.set_default_command(res.id(), def).unwrap();

        let mut failing = Probe::new("E", &[res.id()], &log);
        failing.fail_after = Some(1);
        let e = sched.add_command(failing).unwrap();

        let mut bad_init = Probe::new("I", &[res.id()], &log);
        bad_init.fail_init = true;
        let i = sched.add_command(bad_init).unwrap();

        sched.run();
        take(&log);

        sched.schedule(e).unwrap();
        sched.run();
        assert_eq!(
            take(&log),
            vec!["D:end(true)", "E:init", "E:exec", "E:end(true)", "D:init"]
        );
        assert_eq!(sched.last_end(e), Some(EndReason::Interrupted));

        sched.schedule(i).unwrap();
        sched.run();
        assert_eq!(
            take(&log),
            vec!["D:end(true)", "I:init", "I:end(true)", "D:init"]
        );
        assert!(!sched.is_running(i));
        assert_eq!(sched.owner(res.id()), Some(def));
    }

    #[test]
    fn test_cancel() {
        let (mut sched, res, log) = setup();
        let a = sched.add_command(Probe::new("A", &[res.id()], &log)).unwrap();

        sched.schedule(a).unwrap();
        sched.run();
        sched.cancel(a).unwrap();
        sched.run();
        assert!(!sched.is_running(a));
        assert_eq!(sched.owner(res.id()), None);
        assert_eq!(take(&log).last().map(String::as_str), Some("A:end(true)"));

        // Cancelling an idle command does nothing
        sched.cancel(a).unwrap();
        sched.run();
        assert!(take(&log).is_empty());

        sched.schedule(a).unwrap();
        sched.run();
        sched.cancel_all();
        sched.run();
        assert!(sched.running().is_empty());
    }

    #[test]
    fn test_triggers() {
        let (mut sched, res, log) = setup();
        let a = sched.add_command(Probe::new("A", &[res.id()], &log)).unwrap();

        let fire = Rc::new(Cell::new(false));
        let f = fire.clone();
        sched.on_trigger(move || f.replace(false), a).unwrap();

        sched.run();
        assert!(!sched.is_running(a));

        fire.set(true);
        sched.run();
        assert!(sched.is_running(a));
        assert_eq!(take(&log), vec!["A:init", "A:exec"]);
    }

    #[test]
    fn test_periodic_and_clock() {
        let (mut sched, res, _log) = setup();
        for _ in 0..3 {
            sched.run();
        }
        assert_eq!(res.borrow().periodic_calls, 3);
        assert_eq!(sched.cycle(), 3);
        assert!((sched.now_s() - 0.06).abs() < 1e-12);
        assert_eq!(sched.subsystem_name(res.id()), Some("dummy"));
    }

    #[test]
    fn test_construction_errors() {
        assert_eq!(
            Scheduler::new(0.0).err(),
            Some(SchedulerError::InvalidPeriod(0.0))
        );

        let (mut sched, res, log) = setup();
        assert_eq!(
            sched
                .add_command(Probe::new("X", &[ResourceId(7)], &log))
                .err(),
            Some(SchedulerError::UnknownResource(ResourceId(7)))
        );
        assert_eq!(
            sched.schedule(CmdId(3)),
            Err(SchedulerError::UnknownCommand(CmdId(3)))
        );

        let free = sched.add_command(Probe::new("F", &[], &log)).unwrap();
        assert_eq!(
            sched.set_default_command(res.id(), free),
            Err(SchedulerError::DefaultMissingRequirement(
                String::from("F"),
                res.id()
            ))
        );
    }
}
