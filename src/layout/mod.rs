pub mod physics;
pub mod protocol;
pub mod simulation;
pub mod worker;

pub use physics::PhysicsConfig;
pub use protocol::{
    LayoutLink, LayoutNode, Outbound, Pin, StalenessPolicy, Tick, TickOutcome, TickSink,
    apply_tick,
};
pub use simulation::Simulation;
pub use worker::LayoutWorker;
