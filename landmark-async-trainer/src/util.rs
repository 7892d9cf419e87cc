//! Utility function.
use crate::{ExpReplay, ExpReplayConfig};
use anyhow::Result;
use landmark_core::{
    evaluator::Evaluator, replay_memory::TransitionBatch, Learner, Player, Predictor, Trainer,
    TrainerConfig,
};
use landmark_tensorboard::TensorboardRecorder;
use log::info;
use std::{path::Path, sync::Arc};

/// Runs DQN training with experience replay.
///
/// The simulator thread of [`ExpReplay`] plays `player` epsilon-greedily with
/// `predictor` while the [`Trainer`] feeds batches to `learner`. Every
/// `trigger_interval` optimization steps, the predictor is evaluated on
/// `nr_eval` episodes played on players built by `make_eval_player`.
/// Training logs are recorded for tensorboard.
///
/// * `model_dir` - Directory where the tensorboard log will be saved.
/// * `learner` - Consumer of the batches, typically the Q-network with its
///   optimizer. `predictor` must reflect its parameters.
/// * `exp_replay_config` - Configuration of [`ExpReplay`].
/// * `trainer_config` - Configuration of [`Trainer`].
///
/// Returns the number of optimization steps done.
#[allow(clippy::too_many_arguments)]
pub fn train_dqn<M, Ln, L, E, P, F>(
    model_dir: &M,
    learner: &mut Ln,
    player: L,
    predictor: Arc<P>,
    exp_replay_config: &ExpReplayConfig,
    trainer_config: &TrainerConfig,
    nr_eval: usize,
    make_eval_player: F,
) -> Result<usize>
where
    M: AsRef<Path> + ?Sized,
    Ln: Learner<Batch = TransitionBatch>,
    L: Player + Send + 'static,
    E: Player + 'static,
    P: Predictor + 'static,
    F: Fn() -> Result<E> + Send + Sync + 'static,
{
    let mut recorder = TensorboardRecorder::new(model_dir);
    let mut exp_replay = ExpReplay::build(exp_replay_config, player, predictor.clone())?;
    let mut evaluator = Evaluator::new(
        predictor,
        nr_eval,
        exp_replay_config.history_len,
        make_eval_player,
    );
    let mut trainer = Trainer::build(trainer_config.clone());

    let batches = exp_replay.batches();
    let opt_steps = trainer.train(
        learner,
        batches,
        &mut [&mut exp_replay, &mut evaluator],
        &mut recorder,
    )?;
    exp_replay.stop();
    info!("Replay memory holds {} transitions", exp_replay.len());

    Ok(opt_steps)
}
