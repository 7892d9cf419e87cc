/// Token allowing the simulator thread to collect `update_frequency`
/// transitions.
///
/// The batch iterator sends one for every batch consumed. Tokens travel
/// through a bounded channel, so the iterator blocks once the simulator is
/// `populate_queue_size` jobs behind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PopulateJob;
