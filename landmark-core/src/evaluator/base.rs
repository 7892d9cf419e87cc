use super::play_one_episode;
use crate::{error::LandmarkError, Player, Predictor, StatCounter};
use anyhow::Result;
use crossbeam_channel::{unbounded, Sender};
use log::{info, warn};
use ndarray::ArrayD;
use std::{
    sync::{Arc, Mutex},
    thread::{self, JoinHandle},
    time::Duration,
};

/// Statistics of evaluation episodes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EvalStats {
    /// Mean of the scores.
    pub mean_score: f32,

    /// Maximum of the scores.
    pub max_score: f32,

    /// Mean of the final distances to the landmark.
    pub mean_dist: f32,

    /// Maximum of the final distances to the landmark.
    pub max_dist: f32,
}

/// Predictor failing with [`LandmarkError::Stopped`] once the stop flag is set.
struct StoppablePredictor<P> {
    inner: P,
    stop: Arc<Mutex<bool>>,
}

impl<P: Predictor> Predictor for StoppablePredictor<P> {
    fn predict(&self, input: &ArrayD<u8>) -> Result<Vec<f32>> {
        if *self.stop.lock().unwrap() {
            return Err(LandmarkError::Stopped.into());
        }
        self.inner.predict(input)
    }
}

fn is_stopped(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<LandmarkError>(), Some(LandmarkError::Stopped))
}

/// Plays episodes until stopped, sending `(score, dist_error)` of each.
fn run_worker<P, L, F>(
    id: usize,
    predictor: StoppablePredictor<P>,
    make_player: Arc<F>,
    history_len: usize,
    sender: Sender<(f32, f32)>,
) where
    P: Predictor,
    L: Player,
    F: Fn() -> Result<L>,
{
    let mut player = match make_player() {
        Ok(player) => player,
        Err(e) => {
            warn!("Evaluation worker {} failed to build a player: {}", id, e);
            return;
        }
    };

    while !*predictor.stop.lock().unwrap() {
        match play_one_episode(&mut player, &predictor, history_len) {
            Ok(r) => {
                if sender.send((r.score, r.dist_error)).is_err() {
                    break;
                }
            }
            Err(e) if is_stopped(&e) => break,
            Err(e) => {
                warn!("Evaluation worker {} failed: {}", id, e);
                break;
            }
        }
    }
}

/// Plays episodes in parallel, one worker thread per predictor.
///
/// Each worker builds its own player with `make_player` and plays episodes
/// until stopped. Once `nr_eval` results have arrived, the workers are
/// stopped and joined; results they sent in the meantime are included in the
/// statistics. All statistics are zero if no episode finished, which happens
/// when every worker failed.
pub fn eval_with_predictors<P, L, F>(
    predictors: Vec<P>,
    nr_eval: usize,
    history_len: usize,
    make_player: F,
) -> Result<EvalStats>
where
    P: Predictor + 'static,
    L: Player + 'static,
    F: Fn() -> Result<L> + Send + Sync + 'static,
{
    let stop = Arc::new(Mutex::new(false));
    let make_player = Arc::new(make_player);
    let (sender, receiver) = unbounded();

    let handles: Vec<JoinHandle<()>> = predictors
        .into_iter()
        .enumerate()
        .map(|(id, inner)| {
            let predictor = StoppablePredictor {
                inner,
                stop: stop.clone(),
            };
            let make_player = make_player.clone();
            let sender = sender.clone();
            let handle = thread::spawn(move || {
                run_worker(id, predictor, make_player, history_len, sender);
            });
            // Stagger the start of the workers
            thread::sleep(Duration::from_millis(100));
            handle
        })
        .collect();
    drop(sender);

    let mut score = StatCounter::new();
    let mut dist = StatCounter::new();
    for _ in 0..nr_eval {
        match receiver.recv() {
            Ok((s, d)) => {
                score.feed(s);
                dist.feed(d);
            }
            // All workers exited
            Err(_) => break,
        }
    }

    info!("Waiting for all the workers to finish the last run...");
    *stop.lock().unwrap() = true;
    for h in handles {
        if h.join().is_err() {
            warn!("Evaluation worker panicked");
        }
    }
    for (s, d) in receiver.try_iter() {
        score.feed(s);
        dist.feed(d);
    }

    if score.count() == 0 {
        return Ok(EvalStats::default());
    }

    Ok(EvalStats {
        mean_score: score.average()?,
        max_score: score.max()?,
        mean_dist: dist.average()?,
        max_dist: dist.max()?,
    })
}

/// Number of evaluation workers, half the available cores bounded by `max`.
pub(crate) fn num_workers(max: usize) -> usize {
    let n_cpus = thread::available_parallelism().map_or(2, |n| n.get());
    (n_cpus / 2).clamp(1, max)
}

/// Evaluates a trained predictor with up to 8 worker threads and logs the
/// statistics.
pub fn eval_model_multithread<P, L, F>(
    predictor: Arc<P>,
    nr_eval: usize,
    history_len: usize,
    make_player: F,
) -> Result<EvalStats>
where
    P: Predictor + 'static,
    L: Player + 'static,
    F: Fn() -> Result<L> + Send + Sync + 'static,
{
    let predictors = vec![predictor; num_workers(8)];
    let stats = eval_with_predictors(predictors, nr_eval, history_len, make_player)?;
    info!(
        "Average Score: {}; Max Score: {}; Average Distance: {}; Max Distance: {}",
        stats.mean_score, stats.max_score, stats.mean_dist, stats.max_dist
    );
    Ok(stats)
}
