use super::{base::num_workers, eval_with_predictors};
use crate::{
    record::{
        Record, Recorder,
        RecordValue::{DateTime, Scalar},
        STEP_KEY,
    },
    Callback, Player, Predictor,
};
use anyhow::Result;
use chrono::Local;
use log::info;
use std::{
    marker::PhantomData,
    sync::Arc,
    time::{Duration, Instant},
};

/// Evaluations slower than this shrink the number of episodes.
const MAX_EVAL_TIME: Duration = Duration::from_secs(10 * 60);

/// Callback evaluating the predictor under training with worker threads.
///
/// Records `mean_score`, `max_score`, `mean_distance` and `max_distance`,
/// along with the `timestamp` of the evaluation.
pub struct Evaluator<P, L, F> {
    predictor: Arc<P>,
    predictors: Vec<Arc<P>>,
    nr_eval: usize,
    history_len: usize,
    make_player: Arc<F>,
    phantom: PhantomData<fn() -> L>,
}

impl<P, L, F> Evaluator<P, L, F>
where
    P: Predictor + 'static,
    L: Player + 'static,
    F: Fn() -> Result<L> + Send + Sync + 'static,
{
    /// Creates an evaluator playing `nr_eval` episodes at each trigger.
    pub fn new(predictor: Arc<P>, nr_eval: usize, history_len: usize, make_player: F) -> Self {
        Self {
            predictor,
            predictors: vec![],
            nr_eval,
            history_len,
            make_player: Arc::new(make_player),
            phantom: PhantomData,
        }
    }

    /// Number of episodes of the next evaluation.
    pub fn nr_eval(&self) -> usize {
        self.nr_eval
    }

    fn shrink_if_slow(&mut self, elapsed: Duration) {
        if elapsed > MAX_EVAL_TIME {
            self.nr_eval = (self.nr_eval as f32 * 0.94) as usize;
            info!("Evaluation took {:?}, reduced to {} episodes", elapsed, self.nr_eval);
        }
    }
}

impl<P, L, F> Callback for Evaluator<P, L, F>
where
    P: Predictor + 'static,
    L: Player + 'static,
    F: Fn() -> Result<L> + Send + Sync + 'static,
{
    fn setup(&mut self) -> Result<()> {
        self.predictors = vec![self.predictor.clone(); num_workers(20)];
        info!("Evaluator uses {} workers", self.predictors.len());
        Ok(())
    }

    fn trigger(&mut self, opt_steps: usize, recorder: &mut dyn Recorder) -> Result<()> {
        if self.predictors.is_empty() {
            self.setup()?;
        }

        let make_player = self.make_player.clone();
        let timer = Instant::now();
        let stats = eval_with_predictors(
            self.predictors.clone(),
            self.nr_eval,
            self.history_len,
            move || make_player(),
        )?;
        self.shrink_if_slow(timer.elapsed());

        let mut record = Record::from_slice(&[
            ("mean_score", Scalar(stats.mean_score)),
            ("max_score", Scalar(stats.max_score)),
            ("mean_distance", Scalar(stats.mean_dist)),
            ("max_distance", Scalar(stats.max_dist)),
        ]);
        record.insert("timestamp", DateTime(Local::now()));
        record.insert(STEP_KEY, Scalar(opt_steps as f32));
        recorder.write(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dummy::{DummyPlayer, DummyPredictor},
        record::{BufferedRecorder, RecordValue},
    };

    #[test]
    fn test_evaluator_records_stats() -> Result<()> {
        let mut evaluator = Evaluator::new(Arc::new(DummyPredictor::greedy(2, 0)), 4, 2, || {
            Ok(DummyPlayer::new(vec![1, 1], 2, 3).target_action(0))
        });
        let mut recorder = BufferedRecorder::new();
        evaluator.setup()?;
        evaluator.trigger(10, &mut recorder)?;

        assert_eq!(recorder.last_scalar("mean_score"), Some(3.0));
        assert_eq!(recorder.last_scalar("max_score"), Some(3.0));
        assert_eq!(recorder.last_scalar("mean_distance"), Some(0.0));
        assert_eq!(recorder.last_scalar("max_distance"), Some(0.0));
        assert_eq!(recorder.last_scalar(STEP_KEY), Some(10.0));
        let record = recorder.iter().last().unwrap();
        assert!(matches!(record.get("timestamp"), Some(RecordValue::DateTime(_))));
        Ok(())
    }

    #[test]
    fn test_shrink_if_slow() {
        let mut evaluator = Evaluator::new(Arc::new(DummyPredictor::greedy(2, 0)), 100, 2, || {
            Ok(DummyPlayer::new(vec![1, 1], 2, 3))
        });
        evaluator.shrink_if_slow(Duration::from_secs(60));
        assert_eq!(evaluator.nr_eval(), 100);
        evaluator.shrink_if_slow(Duration::from_secs(11 * 60));
        assert_eq!(evaluator.nr_eval(), 94);
    }
}
