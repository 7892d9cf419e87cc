use super::{
    simulator::{EpisodeStats, Simulator},
    BatchIter, ExpReplayConfig,
};
use crate::{error::AsyncTrainerError, InitGate, PopulateJob};
use anyhow::Result;
use crossbeam_channel::{bounded, Receiver, Sender};
use landmark_core::{
    record::{Record, RecordValue::Scalar, Recorder, STEP_KEY},
    replay_memory::ReplayMemory,
    Callback, Player, Predictor, StatCounter,
};
use log::{info, warn};
use rand::{rngs::StdRng, SeedableRng};
use std::{
    sync::{Arc, Mutex},
    thread::JoinHandle,
};

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Experience replay fed by a simulator thread.
///
/// Owns a [`ReplayMemory`] shared between one writer, the simulator, and the
/// consumer of [`ExpReplay::batches`]. The data flow is:
///
/// 1. [`ExpReplay::init_memory`] plays until the memory holds
///    `init_memory_size` transitions, then opens the [`InitGate`].
/// 2. [`ExpReplay::start`] moves the simulator into its own thread, where it
///    waits for [`PopulateJob`]s.
/// 3. The batch iterator sends a job for every batch consumed. The job
///    queue is bounded by `populate_queue_size`, so the simulator stays at
///    most that many jobs behind the learner.
///
/// ```mermaid
/// graph LR
///     A[BatchIter]-->|PopulateJob|B[Simulator]
///     B -->|Experience|C[ReplayMemory]
///     C -->|TransitionBatch|A
/// ```
///
/// As a [`Callback`], it initializes the memory and starts the simulator in
/// `before_train`, and records statistics of the episodes played by the
/// simulator in `trigger`.
pub struct ExpReplay<L, P> {
    config: ExpReplayConfig,
    player: Arc<Mutex<L>>,
    memory: Arc<Mutex<ReplayMemory>>,
    exploration: Arc<Mutex<f32>>,
    stats: Arc<Mutex<EpisodeStats>>,
    gate: Arc<InitGate>,
    sender: Sender<PopulateJob>,
    receiver: Option<Receiver<PopulateJob>>,
    simulator: Option<Simulator<L, P>>,
    stop: Arc<Mutex<bool>>,
    handle: Option<JoinHandle<()>>,
    n_batch_iters: u64,
}

impl<L, P> ExpReplay<L, P>
where
    L: Player + Send + 'static,
    P: Predictor + 'static,
{
    /// Builds the experience replay and resets the player.
    pub fn build(config: &ExpReplayConfig, mut player: L, predictor: Arc<P>) -> Result<Self> {
        let memory = Arc::new(Mutex::new(ReplayMemory::build(
            &config.replay_memory_config(),
        )?));
        let current_ob = player.reset()?;
        let player = Arc::new(Mutex::new(player));
        let exploration = Arc::new(Mutex::new(config.init_exploration));
        let stats = Arc::new(Mutex::new(EpisodeStats::default()));
        let (sender, receiver) = bounded(config.populate_queue_size);

        let simulator = Simulator {
            player: player.clone(),
            predictor,
            memory: memory.clone(),
            exploration: exploration.clone(),
            stats: stats.clone(),
            current_ob,
            rng: StdRng::seed_from_u64(config.seed),
        };

        Ok(Self {
            config: config.clone(),
            player,
            memory,
            exploration,
            stats,
            gate: Arc::new(InitGate::new()),
            sender,
            receiver: Some(receiver),
            simulator: Some(simulator),
            stop: Arc::new(Mutex::new(false)),
            handle: None,
            n_batch_iters: 0,
        })
    }

    /// Fills the replay memory up to `init_memory_size` transitions with the
    /// current exploration rate, then opens the init gate.
    pub fn init_memory(&mut self) -> Result<()> {
        let simulator = self
            .simulator
            .as_mut()
            .ok_or(AsyncTrainerError::SimulatorStarted)?;
        let target = self.config.init_memory_size;
        let log_interval = (target / 10).max(1);
        info!("Populating replay memory with epsilon={}", *self.exploration.lock().unwrap());

        loop {
            let len = self.memory.lock().unwrap().len();
            if len >= target || len == self.config.memory_size {
                break;
            }
            simulator.populate()?;
            if (len + 1) % log_interval == 0 {
                info!("Replay memory: {}/{}", len + 1, target);
            }
        }

        info!("{} transitions in replay memory", self.len());
        self.gate.open();
        Ok(())
    }

    /// Starts the simulator thread.
    pub fn start(&mut self) -> Result<()> {
        let simulator = self
            .simulator
            .take()
            .ok_or(AsyncTrainerError::SimulatorStarted)?;
        let receiver = self
            .receiver
            .take()
            .ok_or(AsyncTrainerError::SimulatorStarted)?;
        let update_frequency = self.config.update_frequency;
        let stop = self.stop.clone();

        self.handle = Some(std::thread::spawn(move || {
            simulator.run(receiver, update_frequency, stop);
        }));
        Ok(())
    }

    /// Returns an endless iterator over training batches.
    ///
    /// Each iterator draws indices with its own generator, seeded from the
    /// configured seed and the number of iterators created before.
    pub fn batches(&mut self) -> BatchIter {
        self.n_batch_iters += 1;
        BatchIter {
            memory: self.memory.clone(),
            gate: self.gate.clone(),
            sender: self.sender.clone(),
            rng: StdRng::seed_from_u64(self.config.seed.wrapping_add(self.n_batch_iters)),
            batch_size: self.config.batch_size,
            min_index: self.config.min_sample_index(),
            job_pending: false,
        }
    }

    /// Number of transitions in the replay memory.
    pub fn len(&self) -> usize {
        self.memory.lock().unwrap().len()
    }

    /// `true` if the replay memory is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current probability of a random action.
    pub fn exploration(&self) -> f32 {
        *self.exploration.lock().unwrap()
    }

    /// Sets the probability of a random action, e.g. from an annealing
    /// schedule. Takes effect with the next transition.
    pub fn set_exploration(&self, exploration: f32) {
        *self.exploration.lock().unwrap() = exploration;
    }

    /// Stops the simulator thread and waits for it.
    pub fn stop(&mut self) {
        *self.stop.lock().unwrap() = true;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Simulator thread panicked");
            }
        }
    }

    fn episode_record(stats: &EpisodeStats) -> Result<Record> {
        Ok(Record::from_slice(&[
            ("expreplay/mean_score", Scalar(stats.score.average()?)),
            ("expreplay/max_score", Scalar(stats.score.max()?)),
            ("expreplay/mean_dist", Scalar(stats.dist.average()?)),
            ("expreplay/max_dist", Scalar(stats.dist.max()?)),
        ]))
    }

    fn game_record(num_games: &StatCounter, num_success: &StatCounter) -> Record {
        let n_games = num_games.sum();
        let n_success = num_success.sum();
        let ratio = if num_success.count() > 0 && n_games > 0.0 {
            n_success / n_games
        } else {
            0.0
        };

        Record::from_slice(&[
            ("n_games", Scalar(n_games)),
            ("n_success", Scalar(n_success)),
            ("n_success_ratio", Scalar(ratio)),
        ])
    }
}

impl<L, P> Callback for ExpReplay<L, P>
where
    L: Player + Send + 'static,
    P: Predictor + 'static,
{
    fn setup(&mut self) -> Result<()> {
        let num_actions = self.player.lock().unwrap().num_actions();
        info!("Number of legal actions: {}", num_actions);
        Ok(())
    }

    fn before_train(&mut self) -> Result<()> {
        self.init_memory()?;
        self.start()
    }

    fn trigger(&mut self, opt_steps: usize, recorder: &mut dyn Recorder) -> Result<()> {
        let mut record = Record::from_scalar(STEP_KEY, opt_steps as f32);

        {
            let mut stats = self.stats.lock().unwrap();
            match Self::episode_record(&stats) {
                Ok(r) => record.merge_inplace(r),
                Err(e) => warn!("Cannot log training scores: {}", e),
            }
            stats.score.reset();
            stats.dist.reset();
        }

        {
            let mut player = self.player.lock().unwrap();
            record.merge_inplace(Self::game_record(player.num_games(), player.num_success()));
            player.reset_stat();
        }

        recorder.write(record);
        Ok(())
    }

    fn after_train(&mut self) -> Result<()> {
        self.stop();
        Ok(())
    }
}

impl<L, P> Drop for ExpReplay<L, P> {
    fn drop(&mut self) {
        if let Ok(mut stop) = self.stop.lock() {
            *stop = true;
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use landmark_core::{
        dummy::{DummyPlayer, DummyPredictor},
        record::BufferedRecorder,
    };
    use test_log::test;

    fn config() -> ExpReplayConfig {
        ExpReplayConfig::default()
            .batch_size(4)
            .memory_size(200)
            .init_memory_size(50)
            .update_frequency(2)
            .history_len(3)
            .state_shape(vec![2, 2, 2])
            .populate_queue_size(5)
    }

    fn exp_replay(config: &ExpReplayConfig) -> ExpReplay<DummyPlayer, DummyPredictor> {
        let player = DummyPlayer::new(vec![2, 2, 2], 4, 6).target_action(1);
        let predictor = Arc::new(DummyPredictor::greedy(4, 1));
        ExpReplay::build(config, player, predictor).unwrap()
    }

    #[test]
    fn test_init_memory() -> Result<()> {
        let mut exp_replay = exp_replay(&config());
        assert!(exp_replay.is_empty());
        exp_replay.init_memory()?;
        assert_eq!(exp_replay.len(), 50);
        assert!(exp_replay.gate.is_open());
        Ok(())
    }

    #[test]
    fn test_init_memory_bounded_by_capacity() -> Result<()> {
        let config = config().memory_size(30).init_memory_size(100);
        let mut exp_replay = exp_replay(&config);
        exp_replay.init_memory()?;
        assert_eq!(exp_replay.len(), 30);
        Ok(())
    }

    #[test]
    fn test_greedy_population() -> Result<()> {
        let config = config().init_exploration(0.0);
        let mut exp_replay = exp_replay(&config);
        exp_replay.init_memory()?;

        // Beyond the first history_len + 1 transitions, every action is greedy
        let memory = exp_replay.memory.lock().unwrap();
        let batch = memory.batch(&(4..40).collect::<Vec<_>>())?;
        assert!(batch.actions.iter().all(|&a| a == 1));
        Ok(())
    }

    #[test]
    fn test_next_episode_starts_from_reset_observation() -> Result<()> {
        // Episodes last 6 steps; observations hold the step count
        let config = config().init_memory_size(8);
        let mut exp_replay = exp_replay(&config);
        exp_replay.init_memory()?;

        let memory = exp_replay.memory.lock().unwrap();
        let frames = memory
            .recent_state()
            .iter()
            .map(|frame| frame[[0, 0, 0]])
            .collect::<Vec<_>>();
        assert_eq!(frames, vec![0u8, 1]);
        Ok(())
    }

    #[test]
    fn test_exploration_is_settable() {
        let exp_replay = exp_replay(&config());
        assert_eq!(exp_replay.exploration(), 1.0);
        exp_replay.set_exploration(0.1);
        assert_eq!(exp_replay.exploration(), 0.1);
    }

    #[test]
    fn test_batches_drive_simulator() -> Result<()> {
        let config = config();
        let mut exp_replay = exp_replay(&config);
        exp_replay.init_memory()?;
        exp_replay.start()?;

        let mut batches = exp_replay.batches();
        for _ in 0..20 {
            let batch = batches.next().unwrap()?;
            assert_eq!(batch.len(), 4);
            assert_eq!(batch.states.shape(), &[4, 2, 2, 2, 4]);
        }

        // At most populate_queue_size jobs are pending, each of
        // update_frequency transitions
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while exp_replay.len() < 50 + 19 * 2 && std::time::Instant::now() < deadline {
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert_eq!(exp_replay.len(), 50 + 19 * 2);

        exp_replay.stop();
        assert!(exp_replay.start().is_err());
        Ok(())
    }

    #[test]
    fn test_batches_fail_on_small_memory() -> Result<()> {
        let config = config().init_memory_size(10);
        let mut exp_replay = exp_replay(&config);
        exp_replay.init_memory()?;
        let batch = exp_replay.batches().next().unwrap();
        assert!(batch.is_err());
        Ok(())
    }

    #[test]
    fn test_trigger_records_statistics() -> Result<()> {
        let mut exp_replay = exp_replay(&config().init_exploration(0.0));
        let mut recorder = BufferedRecorder::new();

        // No episode finished yet
        exp_replay.setup()?;
        exp_replay.trigger(1, &mut recorder)?;
        assert_eq!(recorder.last_scalar("expreplay/mean_score"), None);
        assert_eq!(recorder.last_scalar("n_games"), Some(0.0));
        assert_eq!(recorder.last_scalar("n_success_ratio"), Some(0.0));

        exp_replay.init_memory()?;
        exp_replay.trigger(2, &mut recorder)?;
        let n_games = recorder.last_scalar("n_games").unwrap();
        assert!(n_games >= 8.0);
        assert!(recorder.last_scalar("expreplay/max_score").is_some());
        assert!(recorder.last_scalar("expreplay/max_dist").is_some());
        assert_eq!(recorder.last_scalar(STEP_KEY), Some(2.0));

        // Counters are reset by the trigger
        exp_replay.trigger(3, &mut recorder)?;
        assert_eq!(recorder.last_scalar("n_games"), Some(0.0));
        Ok(())
    }
}
