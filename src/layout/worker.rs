use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use super::physics::PhysicsConfig;
use super::protocol::{LayoutLink, LayoutNode, Outbound, Pin, Tick};
use super::simulation::Simulation;
use crate::graph::{GraphError, GraphResult};

const FRAME: Duration = Duration::from_millis(16);

/// Handle to the layout thread. The thread owns its [`Simulation`]; the two
/// sides only exchange [`Outbound`] messages and [`Tick`] buffers.
pub struct LayoutWorker {
    config: PhysicsConfig,
    commands: Sender<Outbound>,
    ticks_tx: Sender<Tick>,
    ticks: Receiver<Tick>,
    handle: Option<JoinHandle<()>>,
    generation: u64,
    last_update: Option<(Vec<LayoutNode>, Vec<LayoutLink>)>,
    last_area: Option<(bool, f32, f32)>,
    restarts: usize,
}

impl LayoutWorker {
    pub fn spawn(config: PhysicsConfig) -> GraphResult<Self> {
        let (ticks_tx, ticks) = mpsc::channel();
        let (commands, handle) = start_thread(config, ticks_tx.clone())?;
        info!("layout worker started");
        Ok(Self {
            config,
            commands,
            ticks_tx,
            ticks,
            handle: Some(handle),
            generation: 0,
            last_update: None,
            last_area: None,
            restarts: 0,
        })
    }

    /// Generation of the most recent `update` sent.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn restarts(&self) -> usize {
        self.restarts
    }

    pub fn is_alive(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Sends a new topology and returns its generation.
    pub fn update(&mut self, nodes: Vec<LayoutNode>, links: Vec<LayoutLink>) -> GraphResult<u64> {
        self.generation += 1;
        debug!(
            generation = self.generation,
            nodes = nodes.len(),
            links = links.len(),
            "sending layout update"
        );
        self.last_update = Some((nodes.clone(), links.clone()));
        self.send(Outbound::Update {
            generation: self.generation,
            nodes,
            links,
        })?;
        Ok(self.generation)
    }

    pub fn restart(&mut self, pins: Vec<Pin>) -> GraphResult<()> {
        if pins.is_empty() {
            return Ok(());
        }
        self.send(Outbound::Restart { pins })
    }

    pub fn release(&mut self, hashes: Vec<i32>) -> GraphResult<()> {
        if hashes.is_empty() {
            return Ok(());
        }
        self.send(Outbound::Release { hashes })
    }

    pub fn set_area_forces(&mut self, active: bool, width: f32, height: f32) -> GraphResult<()> {
        self.last_area = Some((active, width, height));
        self.send(Outbound::SetAreaForces {
            active,
            width,
            height,
        })
    }

    /// Latest tick produced since the last call. Older ones are dropped.
    pub fn drain(&mut self) -> Option<Tick> {
        let mut latest = None;
        loop {
            match self.ticks.try_recv() {
                Ok(tick) => latest = Some(tick),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        if let Some(tick) = &latest {
            trace!(generation = tick.generation, len = tick.buffer.len(), "layout tick");
        }
        latest
    }

    fn send(&mut self, message: Outbound) -> GraphResult<()> {
        if !self.is_alive() {
            return self.respawn_with(message);
        }
        match self.commands.send(message) {
            Ok(()) => Ok(()),
            Err(mpsc::SendError(message)) => self.respawn_with(message),
        }
    }

    /// Starts a fresh thread and replays the last area setting and topology
    /// before `message`. Ticks of the dead thread are left to the staleness
    /// check.
    fn respawn_with(&mut self, message: Outbound) -> GraphResult<()> {
        warn!(message = message.name(), "layout worker is gone, restarting");
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }

        let (commands, handle) = start_thread(self.config, self.ticks_tx.clone())?;
        self.commands = commands;
        self.handle = Some(handle);
        self.restarts += 1;
        info!(restarts = self.restarts, "layout worker restarted");

        let unavailable = |_| GraphError::WorkerUnavailable("restarted worker hung up".to_owned());
        if let Some((active, width, height)) = self.last_area {
            self.commands
                .send(Outbound::SetAreaForces {
                    active,
                    width,
                    height,
                })
                .map_err(unavailable)?;
        }
        let replays_update = matches!(message, Outbound::Update { .. });
        if !replays_update && let Some((nodes, links)) = &self.last_update {
            self.commands
                .send(Outbound::Update {
                    generation: self.generation,
                    nodes: nodes.clone(),
                    links: links.clone(),
                })
                .map_err(unavailable)?;
        }
        self.commands.send(message).map_err(unavailable)
    }
}

impl Drop for LayoutWorker {
    fn drop(&mut self) {
        let _ = self.commands.send(Outbound::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        info!("layout worker stopped");
    }
}

fn start_thread(
    config: PhysicsConfig,
    ticks: Sender<Tick>,
) -> GraphResult<(Sender<Outbound>, JoinHandle<()>)> {
    let (commands, inbox) = mpsc::channel();
    let handle = thread::Builder::new()
        .name("layout-worker".to_owned())
        .spawn(move || run(Simulation::new(config), &inbox, &ticks))
        .map_err(|error| GraphError::WorkerUnavailable(error.to_string()))?;
    Ok((commands, handle))
}

fn run(mut simulation: Simulation, inbox: &Receiver<Outbound>, ticks: &Sender<Tick>) {
    loop {
        loop {
            match inbox.try_recv() {
                Ok(message) => {
                    if !handle_message(&mut simulation, message) {
                        return;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return,
            }
        }

        match simulation.tick() {
            Some(tick) => {
                if ticks.send(tick).is_err() {
                    return;
                }
                thread::sleep(FRAME);
            }
            // Settled: sleep until someone has something to say.
            None => match inbox.recv() {
                Ok(message) => {
                    if !handle_message(&mut simulation, message) {
                        return;
                    }
                }
                Err(_) => return,
            },
        }
    }
}

fn handle_message(simulation: &mut Simulation, message: Outbound) -> bool {
    match message {
        Outbound::Update {
            generation,
            nodes,
            links,
        } => simulation.update(generation, &nodes, &links),
        Outbound::Restart { pins } => simulation.restart(&pins),
        Outbound::Release { hashes } => simulation.release(&hashes),
        Outbound::SetAreaForces {
            active,
            width,
            height,
        } => simulation.set_area_forces(active, width, height),
        Outbound::Shutdown => {
            debug!("layout worker received shutdown");
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    fn topology() -> (Vec<LayoutNode>, Vec<LayoutLink>) {
        let nodes = (1..=3)
            .map(|hash| LayoutNode {
                hash,
                mass: 1.0,
                radius: 6.0,
                fx: None,
                fy: None,
            })
            .collect();
        let links = vec![LayoutLink {
            hash: 42,
            source: 1,
            target: 2,
        }];
        (nodes, links)
    }

    fn wait_for_tick(worker: &mut LayoutWorker, generation: u64) -> Tick {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(tick) = worker.drain()
                && tick.generation == generation
            {
                return tick;
            }
            assert!(Instant::now() < deadline, "no tick for generation {generation}");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn update_produces_ticks_for_its_generation() {
        let mut worker = LayoutWorker::spawn(PhysicsConfig::default()).unwrap();
        let (nodes, links) = topology();
        let generation = worker.update(nodes, links).unwrap();

        let tick = wait_for_tick(&mut worker, generation);
        assert_eq!(tick.node_count(), 3);
        assert_eq!(tick.buffer.len(), 1 + 3 * 3 + 5);
    }

    #[test]
    fn generations_increase_per_update() {
        let mut worker = LayoutWorker::spawn(PhysicsConfig::default()).unwrap();
        let (nodes, links) = topology();
        let first = worker.update(nodes.clone(), links.clone()).unwrap();
        let second = worker.update(nodes, links).unwrap();
        assert!(second > first);
        assert_eq!(worker.generation(), second);
    }

    #[test]
    fn dead_worker_is_restarted_with_last_topology() {
        let mut worker = LayoutWorker::spawn(PhysicsConfig::default()).unwrap();
        let (nodes, links) = topology();
        let generation = worker.update(nodes, links).unwrap();

        worker.commands.send(Outbound::Shutdown).unwrap();
        if let Some(handle) = worker.handle.take() {
            handle.join().unwrap();
        }
        assert!(!worker.is_alive());

        worker
            .restart(vec![Pin {
                hash: 1,
                x: 3.0,
                y: 4.0,
            }])
            .unwrap();
        assert!(worker.is_alive());
        assert_eq!(worker.restarts(), 1);

        let tick = wait_for_tick(&mut worker, generation);
        assert_eq!(tick.node_count(), 3);
    }
}
