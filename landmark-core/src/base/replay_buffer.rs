//! Replay buffer interface.
use anyhow::Result;

/// Interface for buffers that store experiences from a [`Player`](crate::Player).
///
/// Writers only need this trait, so a data-collection thread can be handed
/// a buffer without knowing how batches are drawn from it.
///
/// # Examples
///
/// ```ignore
/// struct SimpleBuffer<T> {
///     items: Vec<T>,
/// }
///
/// impl<T> ExperienceBufferBase for SimpleBuffer<T> {
///     type Item = T;
///
///     fn push(&mut self, tr: T) -> Result<()> {
///         self.items.push(tr);
///         Ok(())
///     }
///
///     fn len(&self) -> usize {
///         self.items.len()
///     }
/// }
/// ```
pub trait ExperienceBufferBase {
    /// The type of items stored in the buffer.
    type Item;

    /// Pushes a new experience into the buffer.
    fn push(&mut self, tr: Self::Item) -> Result<()>;

    /// Returns the current number of experiences in the buffer.
    fn len(&self) -> usize;

    /// Returns `true` if no experience has been pushed yet.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
