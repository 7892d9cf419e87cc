//! Ring buffer of experiences.
use super::{Experience, ReplayMemoryConfig, Sample, TransitionBatch};
use crate::{error::LandmarkError, ExperienceBufferBase};
use anyhow::Result;
use ndarray::{concatenate, stack, ArrayD, ArrayView, Axis, IxDyn, Slice};
use std::collections::VecDeque;

/// Stacks frames of the same shape on a new trailing axis.
pub fn stack_frames(frames: &[ArrayD<u8>]) -> Result<ArrayD<u8>> {
    let views = frames.iter().map(|f| f.view()).collect::<Vec<_>>();
    let axis = frames.first().map_or(0, |f| f.ndim());
    Ok(stack(Axis(axis), &views)?)
}

fn window<T: Copy>(v: &[T], start: usize, k: usize, size: usize) -> Vec<T> {
    (0..k).map(|j| v[(start + j) % size]).collect()
}

/// Fixed-capacity ring buffer of [`Experience`]s.
///
/// States, actions, rewards and terminal flags are kept in four parallel
/// arrays of length `capacity`, written together at the same index. Once
/// `capacity` experiences have been appended, every append overwrites the
/// oldest one.
///
/// The buffer does no locking. It assumes a single writer; readers running
/// concurrently with the writer must be serialized by the caller.
pub struct ReplayMemory {
    capacity: usize,

    history_len: usize,

    state_shape: Vec<usize>,

    /// Position of the next write.
    cursor: usize,

    /// Number of valid slots.
    size: usize,

    /// Shape `(capacity,) + state_shape`.
    state: ArrayD<u8>,

    action: Vec<i32>,

    reward: Vec<f32>,

    is_over: Vec<bool>,

    /// Non-terminal experiences of the current episode, at most
    /// `history_len - 1`.
    recent: VecDeque<Experience>,
}

impl ReplayMemory {
    /// Builds a replay memory, allocating all storage up front.
    pub fn build(config: &ReplayMemoryConfig) -> Result<Self> {
        if config.capacity == 0 {
            return Err(LandmarkError::InvalidConfig("capacity must be positive".into()).into());
        }
        if config.history_len == 0 {
            return Err(LandmarkError::InvalidConfig("history_len must be positive".into()).into());
        }
        if config.state_shape.is_empty() {
            return Err(LandmarkError::InvalidConfig("state_shape must not be empty".into()).into());
        }

        let capacity = config.capacity;
        let mut shape = vec![capacity];
        shape.extend_from_slice(&config.state_shape);

        Ok(Self {
            capacity,
            history_len: config.history_len,
            state_shape: config.state_shape.clone(),
            cursor: 0,
            size: 0,
            state: ArrayD::zeros(IxDyn(&shape)),
            action: vec![0; capacity],
            reward: vec![0.; capacity],
            is_over: vec![false; capacity],
            recent: VecDeque::with_capacity(config.history_len - 1),
        })
    }

    /// Maximum number of experiences.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of stacked frames in a state.
    pub fn history_len(&self) -> usize {
        self.history_len
    }

    /// Shape of a single observation.
    pub fn state_shape(&self) -> &[usize] {
        &self.state_shape
    }

    /// Number of valid experiences, at most `capacity`.
    pub fn len(&self) -> usize {
        self.size
    }

    /// `true` if nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// `true` once `capacity` experiences have been appended.
    pub fn is_full(&self) -> bool {
        self.size == self.capacity
    }

    /// Appends an experience, overwriting the oldest one if full.
    ///
    /// Fails without writing anything if the shape of the state differs
    /// from the configured shape.
    pub fn append(&mut self, exp: Experience) -> Result<()> {
        if exp.state.shape() != self.state_shape.as_slice() {
            return Err(LandmarkError::ShapeMismatch {
                expected: self.state_shape.clone(),
                actual: exp.state.shape().to_vec(),
            }
            .into());
        }

        self.assign(self.cursor, &exp);
        self.cursor = (self.cursor + 1) % self.capacity;
        if self.size < self.capacity {
            self.size += 1;
        }

        if exp.is_over {
            self.recent.clear();
        } else if self.history_len > 1 {
            if self.recent.len() == self.history_len - 1 {
                self.recent.pop_front();
            }
            self.recent.push_back(exp);
        }

        Ok(())
    }

    fn assign(&mut self, pos: usize, exp: &Experience) {
        self.state.index_axis_mut(Axis(0), pos).assign(&exp.state);
        self.action[pos] = exp.action;
        self.reward[pos] = exp.reward;
        self.is_over[pos] = exp.is_over;
    }

    /// Returns `history_len - 1` frames of the episode in progress, oldest
    /// first, left-padded with zero frames.
    ///
    /// Appending the current observation gives the full history to act on.
    pub fn recent_state(&self) -> Vec<ArrayD<u8>> {
        let n_pad = self.history_len - 1 - self.recent.len();
        let zero = ArrayD::<u8>::zeros(IxDyn(&self.state_shape));
        let mut states = vec![zero; n_pad];
        states.extend(self.recent.iter().map(|exp| exp.state.clone()));
        states
    }

    /// Returns the training sample at `logical_index`, `0` being the oldest
    /// valid experience.
    ///
    /// The sample reads `history_len + 1` consecutive experiences. The
    /// returned reward, action and terminal flag are those of the
    /// second-to-last one. If one of the first `history_len - 1` experiences
    /// ends an episode, the frames up to and including the latest such
    /// experience are zeroed.
    pub fn sample(&self, logical_index: usize) -> Result<Sample> {
        let k = self.history_len + 1;
        if logical_index + k > self.size {
            return Err(LandmarkError::InsufficientHistory {
                index: logical_index,
                window: k,
                size: self.size,
            }
            .into());
        }

        let start = (self.cursor + logical_index) % self.size;
        let state = self.slice_state(start, k)?;
        let reward = window(&self.reward, start, k, self.size);
        let action = window(&self.action, start, k, self.size);
        let is_over = window(&self.is_over, start, k, self.size);

        Ok(self.pad_sample(state, &reward, &action, &is_over))
    }

    /// Reads `k` frames starting at physical index `start`, continuing from
    /// the beginning of the storage when the end is reached.
    fn slice_state(&self, start: usize, k: usize) -> Result<ArrayD<u8>> {
        let end = start + k;
        if end <= self.size {
            Ok(self
                .state
                .slice_axis(Axis(0), Slice::from(start..end))
                .to_owned())
        } else {
            let end = end - self.size;
            let s1 = self.state.slice_axis(Axis(0), Slice::from(start..self.size));
            let s2 = self.state.slice_axis(Axis(0), Slice::from(0..end));
            Ok(concatenate(Axis(0), &[s1, s2])?)
        }
    }

    fn pad_sample(
        &self,
        mut state: ArrayD<u8>,
        reward: &[f32],
        action: &[i32],
        is_over: &[bool],
    ) -> Sample {
        // The next state starts a new episode if the current step is terminal,
        // so only the frames before the current step are scanned.
        for j in (0..self.history_len - 1).rev() {
            if is_over[j] {
                state.slice_axis_mut(Axis(0), Slice::from(0..j + 1)).fill(0);
                break;
            }
        }

        // Frames to the last axis
        let mut axes = (1..state.ndim()).collect::<Vec<_>>();
        axes.push(0);
        let state = state.permuted_axes(axes).as_standard_layout().into_owned();

        let n = reward.len();
        Sample {
            state,
            reward: reward[n - 2],
            action: action[n - 2],
            is_over: is_over[n - 2],
        }
    }

    /// Samples every logical index in `ixs` and stacks the samples.
    pub fn batch(&self, ixs: &[usize]) -> Result<TransitionBatch> {
        let samples = ixs
            .iter()
            .map(|&ix| self.sample(ix))
            .collect::<Result<Vec<_>>>()?;
        let views: Vec<ArrayView<u8, IxDyn>> = samples.iter().map(|s| s.state.view()).collect();

        Ok(TransitionBatch {
            states: stack(Axis(0), &views)?,
            actions: samples.iter().map(|s| s.action).collect(),
            rewards: samples.iter().map(|s| s.reward).collect(),
            is_over: samples.iter().map(|s| s.is_over).collect(),
        })
    }
}

impl ExperienceBufferBase for ReplayMemory {
    type Item = Experience;

    fn push(&mut self, tr: Self::Item) -> Result<()> {
        self.append(tr)
    }

    fn len(&self) -> usize {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::ArrayD;

    fn memory(capacity: usize, history_len: usize) -> ReplayMemory {
        let config = ReplayMemoryConfig::default()
            .capacity(capacity)
            .state_shape(vec![1, 1])
            .history_len(history_len);
        ReplayMemory::build(&config).unwrap()
    }

    fn exp(v: u8, is_over: bool) -> Experience {
        Experience::new(ArrayD::from_elem(vec![1, 1], v), v as i32, v as f32 * 0.5, is_over)
    }

    fn frames(sample: &Sample) -> Vec<u8> {
        sample.state.iter().copied().collect()
    }

    /// capacity=5, history_len=2, states [1],[2],[3](terminal),[4],[5].
    fn scenario() -> ReplayMemory {
        let mut mem = memory(5, 2);
        for (v, is_over) in [(1, false), (2, false), (3, true), (4, false), (5, false)] {
            mem.append(exp(v, is_over)).unwrap();
        }
        mem
    }

    #[test]
    fn test_len_counts_appends_until_capacity() {
        let mut mem = memory(4, 2);
        assert!(mem.is_empty());
        for i in 0..4 {
            mem.append(exp(i, false)).unwrap();
            assert_eq!(mem.len(), i as usize + 1);
        }
        assert!(mem.is_full());
        for i in 4..10 {
            mem.append(exp(i, false)).unwrap();
            assert_eq!(mem.len(), 4);
        }
    }

    #[test]
    fn test_ring_overwrite_keeps_latest() {
        let mut mem = memory(4, 1);
        for i in 1..=10 {
            mem.append(exp(i, false)).unwrap();
        }
        // Oldest surviving experience is the 4th most recent append
        let sample = mem.sample(0).unwrap();
        assert_eq!(frames(&sample), vec![7, 8]);
        assert_eq!(sample.action, 7);
        let sample = mem.sample(2).unwrap();
        assert_eq!(frames(&sample), vec![9, 10]);
    }

    #[test]
    fn test_shape_mismatch() {
        let mut mem = memory(4, 2);
        let bad = Experience::new(ArrayD::zeros(vec![2, 1]), 0, 0.0, false);
        let err = mem.append(bad).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LandmarkError>(),
            Some(LandmarkError::ShapeMismatch { .. })
        ));
        assert_eq!(mem.len(), 0);
        assert_eq!(mem.recent_state(), vec![ArrayD::<u8>::zeros(vec![1, 1])]);
    }

    #[test]
    fn test_invalid_config() {
        let config = ReplayMemoryConfig::default().capacity(0);
        assert!(ReplayMemory::build(&config).is_err());
        let config = ReplayMemoryConfig::default().capacity(3).history_len(0);
        assert!(ReplayMemory::build(&config).is_err());
    }

    #[test]
    fn test_recent_state_after_terminal_is_zero() {
        let mut mem = memory(10, 4);
        mem.append(exp(1, false)).unwrap();
        mem.append(exp(2, true)).unwrap();
        let states = mem.recent_state();
        assert_eq!(states.len(), 3);
        assert!(states.iter().all(|s| s.iter().all(|&v| v == 0)));
    }

    #[test]
    fn test_recent_state_left_pads() {
        let mut mem = memory(10, 4);
        mem.append(exp(9, true)).unwrap();
        mem.append(exp(1, false)).unwrap();
        mem.append(exp(2, false)).unwrap();
        let states = mem.recent_state();
        let vs = states.iter().map(|s| s[[0, 0]]).collect::<Vec<_>>();
        assert_eq!(vs, vec![0, 1, 2]);

        // Bounded to history_len - 1 frames
        mem.append(exp(3, false)).unwrap();
        mem.append(exp(4, false)).unwrap();
        let vs = mem.recent_state().iter().map(|s| s[[0, 0]]).collect::<Vec<_>>();
        assert_eq!(vs, vec![2, 3, 4]);
    }

    #[test]
    fn test_recent_state_without_history() {
        let mut mem = memory(10, 1);
        mem.append(exp(1, false)).unwrap();
        assert!(mem.recent_state().is_empty());
    }

    #[test]
    fn test_scenario_len() {
        assert_eq!(scenario().len(), 5);
    }

    #[test]
    fn test_scenario_sample_0() {
        let sample = scenario().sample(0).unwrap();
        assert_eq!(sample.state.shape(), &[1, 1, 3]);
        assert_eq!(frames(&sample), vec![1, 2, 3]);
        assert_eq!(sample.action, 2);
        assert_eq!(sample.reward, 1.0);
        assert!(!sample.is_over);
    }

    #[test]
    fn test_scenario_sample_1_terminal_outside_scanned_prefix() {
        // The terminal flag of frame 3 belongs to the current step, not to
        // the scanned prefix, so nothing is zeroed.
        let sample = scenario().sample(1).unwrap();
        assert_eq!(frames(&sample), vec![2, 3, 4]);
        assert_eq!(sample.action, 3);
        assert!(sample.is_over);
    }

    #[test]
    fn test_scenario_sample_2_zeroes_previous_episode() {
        let sample = scenario().sample(2).unwrap();
        assert_eq!(frames(&sample), vec![0, 4, 5]);
        assert_eq!(sample.action, 4);
        assert_eq!(sample.reward, 2.0);
        assert!(!sample.is_over);
    }

    #[test]
    fn test_scenario_insufficient_history() {
        let err = scenario().sample(3).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LandmarkError>(),
            Some(LandmarkError::InsufficientHistory {
                index: 3,
                window: 3,
                size: 5
            })
        ));
    }

    #[test]
    fn test_no_padding_within_episode() {
        let mut mem = memory(20, 4);
        for i in 1..=10 {
            mem.append(exp(i, false)).unwrap();
        }
        for ix in 0..=5 {
            let sample = mem.sample(ix).unwrap();
            let expected = (ix as u8 + 1..=ix as u8 + 5).collect::<Vec<_>>();
            assert_eq!(frames(&sample), expected);
        }
    }

    #[test]
    fn test_padding_zeroes_up_to_latest_boundary() {
        let mut mem = memory(20, 4);
        // window of sample(0): [1, 2T, 3, 4T, 5]; scanned positions 2, 1, 0
        for (v, is_over) in [(1, false), (2, true), (3, false), (4, true), (5, false)] {
            mem.append(exp(v, is_over)).unwrap();
        }
        let sample = mem.sample(0).unwrap();
        assert_eq!(frames(&sample), vec![0, 0, 3, 4, 5]);
        assert_eq!(sample.action, 4);
        assert!(sample.is_over);

        let mut mem = memory(20, 4);
        // Boundary at position 2 zeroes frames 0..=2
        for (v, is_over) in [(1, false), (2, false), (3, true), (4, false), (5, false)] {
            mem.append(exp(v, is_over)).unwrap();
        }
        let sample = mem.sample(0).unwrap();
        assert_eq!(frames(&sample), vec![0, 0, 0, 4, 5]);
    }

    #[test]
    fn test_sample_wraps_physical_end() {
        let mut mem = memory(5, 2);
        for i in 1..=7 {
            mem.append(exp(i, false)).unwrap();
        }
        // Physical layout [6, 7, 3, 4, 5], oldest at slot 2
        let sample = mem.sample(1).unwrap();
        assert_eq!(frames(&sample), vec![4, 5, 6]);
        assert_eq!(sample.action, 5);
        let sample = mem.sample(2).unwrap();
        assert_eq!(frames(&sample), vec![5, 6, 7]);
        assert_eq!(sample.action, 6);
        assert!(mem.sample(3).is_err());
    }

    #[test]
    fn test_fields_match_appended_values() {
        let mut mem = memory(8, 3);
        for i in 1..=6u8 {
            let is_over = i == 5;
            mem.append(Experience::new(
                ArrayD::from_elem(vec![1, 1], i),
                10 + i as i32,
                -(i as f32),
                is_over,
            ))
            .unwrap();
        }
        // The window ending at the latest experience has it as the next state,
        // the experience before it as the current step.
        let ix = mem.len() - mem.history_len() - 1;
        let sample = mem.sample(ix).unwrap();
        assert_eq!(sample.action, 15);
        assert_eq!(sample.reward, -5.0);
        assert!(sample.is_over);
    }

    #[test]
    fn test_channel_last_layout() {
        let config = ReplayMemoryConfig::default()
            .capacity(4)
            .state_shape(vec![2, 3])
            .history_len(1);
        let mut mem = ReplayMemory::build(&config).unwrap();
        for i in 0..2u8 {
            let state = ArrayD::from_shape_vec(vec![2, 3], (0..6).map(|v| v + 10 * i).collect())
                .unwrap();
            mem.append(Experience::new(state, 0, 0.0, false)).unwrap();
        }
        let sample = mem.sample(0).unwrap();
        assert_eq!(sample.state.shape(), &[2, 3, 2]);
        assert_eq!(sample.state[[1, 2, 0]], 5);
        assert_eq!(sample.state[[1, 2, 1]], 15);
        assert_eq!(sample.state[[0, 1, 1]], 11);
    }

    #[test]
    fn test_batch() {
        let mem = scenario();
        let batch = mem.batch(&[0, 2, 1]).unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.states.shape(), &[3, 1, 1, 3]);
        assert_eq!(batch.actions, vec![2, 4, 3]);
        assert_eq!(batch.is_over, vec![false, false, true]);
        assert_eq!(batch.states[[1, 0, 0, 0]], 0);
        assert!(mem.batch(&[0, 3]).is_err());
    }

    #[test]
    fn test_stack_frames() {
        let frames = vec![ArrayD::from_elem(vec![2, 2], 1u8), ArrayD::from_elem(vec![2, 2], 2u8)];
        let stacked = stack_frames(&frames).unwrap();
        assert_eq!(stacked.shape(), &[2, 2, 2]);
        assert_eq!(stacked[[1, 0, 1]], 2);
    }
}
