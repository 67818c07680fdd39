use crate::infer::{InferError, InferResult};

/// Double-buffered storage for the messages of all directed arcs of a graph
///
/// Both buffers are flat, a message of an arc occupies the
/// `edge_id * n_states..(edge_id + 1) * n_states` range. Synchronous
/// policies write a sweep into the "next" buffer and make it visible with an
/// O(1) [`MessageStore::swap`]; asynchronous policies update the "current"
/// buffer in place. The store lives for exactly one inference call and is
/// released when dropped
#[derive(Debug)]
pub(crate) struct MessageStore {
    msg: Vec<f64>,
    msg_temp: Vec<f64>,
    n_states: usize,
    swapped: bool,
}

impl MessageStore {
    /// Allocates both buffers for `n_edges` arcs of `n_states` states each,
    /// filled with `value`
    ///
    /// # Notes
    ///
    /// Allocation failure of either buffer surfaces as
    /// [`InferError::OutOfMemory`]; no other component allocates message
    /// memory
    pub(crate) fn create(n_edges: usize, n_states: usize, value: f64) -> InferResult<Self> {
        let len = n_edges * n_states;
        let mut msg = Vec::new();
        msg.try_reserve_exact(len)
            .map_err(|_| InferError::OutOfMemory { requested: len })?;
        msg.resize(len, value);
        let mut msg_temp = Vec::new();
        msg_temp
            .try_reserve_exact(len)
            .map_err(|_| InferError::OutOfMemory { requested: len })?;
        msg_temp.resize(len, value);
        Ok(MessageStore {
            msg,
            msg_temp,
            n_states,
            swapped: false,
        })
    }

    /// Exchanges the identities of the current and the next buffer
    #[inline]
    pub(crate) fn swap(&mut self) {
        self.swapped = !self.swapped;
    }

    /// Returns the message of the arc `edge` in the current buffer
    #[inline]
    pub(crate) fn message(&self, edge: usize) -> &[f64] {
        let start = edge * self.n_states;
        let current = if self.swapped {
            &self.msg_temp
        } else {
            &self.msg
        };
        &current[start..start + self.n_states]
    }

    /// Returns mutable access to the message of the arc `edge` in the
    /// current buffer, for policies updating messages in place
    #[inline]
    pub(crate) fn message_mut(&mut self, edge: usize) -> &mut [f64] {
        let start = edge * self.n_states;
        let current = if self.swapped {
            &mut self.msg_temp
        } else {
            &mut self.msg
        };
        &mut current[start..start + self.n_states]
    }

    /// Returns the whole current buffer
    #[inline]
    pub(crate) fn current(&self) -> &[f64] {
        if self.swapped {
            &self.msg_temp
        } else {
            &self.msg
        }
    }

    /// Splits the store into the read-only current buffer and the writable
    /// next buffer for a synchronous sweep
    #[inline]
    pub(crate) fn split(&mut self) -> (&[f64], &mut [f64]) {
        if self.swapped {
            (&self.msg_temp, &mut self.msg)
        } else {
            (&self.msg, &mut self.msg_temp)
        }
    }
}
