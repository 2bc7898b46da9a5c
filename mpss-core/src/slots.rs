//! Per-phase accumulation buffers.

use crate::ProtocolError;

/// One slot per party plus a received-counter.
///
/// Storing a value and bumping the counter happen in the same call, which the
/// owner runs under its state lock, so exactly one caller sees the counter
/// reach `n`. That caller gets `true` back and the counter starts over.
#[derive(Clone)]
pub(crate) struct Slots<T> {
    values: Vec<Option<T>>,
    count: usize,
}

impl<T> Slots<T> {
    pub(crate) fn new(parties: u16) -> Self {
        Self {
            values: (0..parties).map(|_| None).collect(),
            count: 0,
        }
    }

    /// Stores `value` for party `sender` and reports whether this completed
    /// the quorum.
    pub(crate) fn insert(&mut self, sender: u16, value: T) -> Result<bool, ProtocolError> {
        let slot = usize::from(sender)
            .checked_sub(1)
            .and_then(|i| self.values.get_mut(i))
            .ok_or(crate::Error::InvalidPartyIndex { index: sender })?;
        if slot.is_some() {
            return Err(ProtocolError::DuplicateMessage { sender });
        }
        *slot = Some(value);
        self.count += 1;
        if self.count == self.values.len() {
            self.count = 0;
            return Ok(true);
        }
        Ok(false)
    }

    /// Empties every slot, returning the stored values in party order.
    pub(crate) fn take(&mut self) -> Vec<T> {
        self.count = 0;
        self.values.iter_mut().filter_map(Option::take).collect()
    }

    /// Clones out a full set of values, failing on the first empty slot.
    pub(crate) fn snapshot(&self) -> Result<Vec<T>, ProtocolError>
    where
        T: Clone,
    {
        self.values
            .iter()
            .zip(1u16..)
            .map(|(value, party)| value.clone().ok_or(ProtocolError::MissingPost { party }))
            .collect()
    }

    pub(crate) fn clear(&mut self) {
        self.count = 0;
        self.values.iter_mut().for_each(|v| *v = None);
    }
}
