//! Train a [`Learner`].
mod config;
use crate::{
    record::{Record, RecordValue::Scalar, Recorder},
    Callback, Learner,
};
use anyhow::Result;
pub use config::TrainerConfig;
use log::{info, warn};
use std::time::Instant;

fn is_due(steps: usize, interval: usize) -> bool {
    interval > 0 && steps % interval == 0
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages the training loop and the callbacks around it.
///
/// # Training loop
///
/// 0. Given a learner implementing [`Learner`], a source of batches, callbacks
///    implementing [`Callback`] and a recorder implementing [`Recorder`].
/// 1. Call [`Callback::setup`], then [`Callback::before_train`], of every
///    callback.
/// 2. Take the next batch. Finish if the source is exhausted.
/// 3. Do an optimization step, `opt_steps += 1`, and store the returned
///    record into the recorder.
/// 4. If `opt_steps % trigger_interval == 0`, call [`Callback::trigger`] of
///    every callback. Errors are logged and training goes on.
/// 5. If `opt_steps % flush_record_interval == 0`, store the optimization
///    steps per second as `"opt_steps_per_sec"` and flush the recorder.
/// 6. If `opt_steps == max_opts`, finish the loop, otherwise back to 2.
/// 7. Call [`Callback::after_train`] of every callback.
///
/// # Interaction of objects
///
/// ```mermaid
/// graph LR
///     A[Player]-->|Experience|B[ReplayMemory]
///     B -->|TransitionBatch|C[Learner]
///     C -->|Record|D[Recorder]
///     E[Callback]-->|Record|D
/// ```
///
/// With experience replay, the batches are drawn from a replay memory that
/// a simulator thread fills concurrently, see the `landmark-async-trainer`
/// crate.
pub struct Trainer {
    /// The maximal number of optimization steps.
    max_opts: usize,

    /// Interval of triggering callbacks in optimization steps.
    trigger_interval: usize,

    /// Interval of flushing records in optimization steps.
    flush_record_interval: usize,
}

impl Trainer {
    /// Constructs a trainer.
    pub fn build(config: TrainerConfig) -> Self {
        Self {
            max_opts: config.max_opts,
            trigger_interval: config.trigger_interval,
            flush_record_interval: config.flush_record_interval,
        }
    }

    /// Trains the learner, returning the number of optimization steps done.
    pub fn train<L, I>(
        &mut self,
        learner: &mut L,
        batches: I,
        callbacks: &mut [&mut dyn Callback],
        recorder: &mut dyn Recorder,
    ) -> Result<usize>
    where
        L: Learner,
        I: IntoIterator<Item = Result<L::Batch>>,
    {
        for cb in callbacks.iter_mut() {
            cb.setup()?;
        }
        for cb in callbacks.iter_mut() {
            cb.before_train()?;
        }

        let mut opt_steps = 0;
        let mut opt_steps_for_ops = 0;
        let mut timer = Instant::now();
        let mut batches = batches.into_iter();
        info!("Starts training loop");

        while opt_steps < self.max_opts {
            let batch = match batches.next() {
                Some(batch) => batch?,
                None => {
                    info!("Batch source exhausted at {} optimization steps", opt_steps);
                    break;
                }
            };

            let record = learner.opt(batch)?;
            opt_steps += 1;
            opt_steps_for_ops += 1;
            if !record.is_empty() {
                recorder.store(record);
            }

            if is_due(opt_steps, self.trigger_interval) {
                for cb in callbacks.iter_mut() {
                    if let Err(e) = cb.trigger(opt_steps, recorder) {
                        warn!("Callback failed at {} optimization steps: {}", opt_steps, e);
                    }
                }
            }

            if is_due(opt_steps, self.flush_record_interval) {
                let osps = opt_steps_for_ops as f32 / timer.elapsed().as_secs_f32();
                recorder.store(Record::from_scalar("opt_steps_per_sec", osps));
                recorder.flush(opt_steps as _);
                opt_steps_for_ops = 0;
                timer = Instant::now();
            }
        }

        for cb in callbacks.iter_mut() {
            cb.after_train()?;
        }
        info!("Finished training after {} optimization steps", opt_steps);

        Ok(opt_steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{BufferedRecorder, NullRecorder, STEP_KEY};
    use anyhow::bail;

    /// Learner returning the batch as its loss.
    struct EchoLearner;

    impl Learner for EchoLearner {
        type Batch = f32;

        fn opt(&mut self, batch: f32) -> Result<Record> {
            Ok(Record::from_scalar("loss", batch))
        }
    }

    #[derive(Default)]
    struct Probe {
        calls: Vec<String>,
        fail: bool,
    }

    impl Callback for Probe {
        fn setup(&mut self) -> Result<()> {
            self.calls.push("setup".into());
            Ok(())
        }

        fn before_train(&mut self) -> Result<()> {
            self.calls.push("before_train".into());
            Ok(())
        }

        fn trigger(&mut self, opt_steps: usize, _recorder: &mut dyn Recorder) -> Result<()> {
            self.calls.push(format!("trigger {}", opt_steps));
            if self.fail {
                bail!("evaluation failed");
            }
            Ok(())
        }

        fn after_train(&mut self) -> Result<()> {
            self.calls.push("after_train".into());
            Ok(())
        }
    }

    #[test]
    fn test_train_calls_callbacks_in_order() -> Result<()> {
        let config = TrainerConfig::default()
            .max_opts(7)
            .trigger_interval(3)
            .flush_record_interval(0);
        let mut trainer = Trainer::build(config);
        let mut probe = Probe {
            fail: true,
            ..Default::default()
        };
        let mut recorder = BufferedRecorder::new();
        let batches = (0..100).map(|i| Ok(i as f32));

        let opt_steps = trainer.train(&mut EchoLearner, batches, &mut [&mut probe], &mut recorder)?;

        assert_eq!(opt_steps, 7);
        assert_eq!(
            probe.calls,
            vec!["setup", "before_train", "trigger 3", "trigger 6", "after_train"]
        );
        Ok(())
    }

    #[test]
    fn test_train_flushes_records() -> Result<()> {
        let config = TrainerConfig::default()
            .max_opts(10)
            .trigger_interval(0)
            .flush_record_interval(4);
        let mut trainer = Trainer::build(config);
        let mut recorder = BufferedRecorder::new();
        let batches = (1..=10).map(|i| Ok(i as f32));

        trainer.train(&mut EchoLearner, batches, &mut [], &mut recorder)?;

        let flushed = recorder.iter().collect::<Vec<_>>();
        assert_eq!(flushed.len(), 2);
        assert_eq!(flushed[0].get_scalar(STEP_KEY)?, 4.0);
        assert_eq!(flushed[0].get_scalar("loss_mean")?, 2.5);
        assert_eq!(flushed[1].get_scalar(STEP_KEY)?, 8.0);
        assert_eq!(flushed[1].get_scalar("loss_max")?, 8.0);
        Ok(())
    }

    #[test]
    fn test_train_stops_when_source_ends() -> Result<()> {
        let config = TrainerConfig::default().max_opts(100);
        let mut trainer = Trainer::build(config);
        let batches = (0..5).map(|i| Ok(i as f32));
        let opt_steps = trainer.train(&mut EchoLearner, batches, &mut [], &mut NullRecorder::new())?;
        assert_eq!(opt_steps, 5);
        Ok(())
    }

    #[test]
    fn test_train_propagates_batch_errors() {
        let config = TrainerConfig::default().max_opts(100);
        let mut trainer = Trainer::build(config);
        let batches = vec![Ok(1.0), Err(anyhow::anyhow!("broken batch"))];
        let result = trainer.train(&mut EchoLearner, batches, &mut [], &mut BufferedRecorder::new());
        assert!(result.is_err());
    }
}
