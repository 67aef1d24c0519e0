use nalgebra::DVector;
use oe_core::State;

/// Oldest entry dropped by [`HistoryCache::shift`], kept so the shift can be
/// undone.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Evicted {
    time: f64,
    state: DVector<f64>,
    derivative: Option<DVector<f64>>,
}

/// Fixed-length history of times, states and derivatives, oldest first.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryCache {
    times: Vec<f64>,
    states: Vec<DVector<f64>>,
    derivatives: Vec<DVector<f64>>,
    ready: bool,
    cursor: usize,
}

impl HistoryCache {
    pub fn new(len: usize) -> Self {
        Self {
            times: vec![0.0; len],
            states: vec![DVector::zeros(1); len],
            derivatives: vec![DVector::zeros(1); len],
            ready: false,
            cursor: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.states.first().map_or(0, DVector::len)
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Index of the next cached state handed out during startup replay.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn states(&self) -> &[DVector<f64>] {
        &self.states
    }

    pub fn derivatives(&self) -> &[DVector<f64>] {
        &self.derivatives
    }

    /// Re-derive slot shapes from the state dimension.
    pub(crate) fn reshape(&mut self, dim: usize) {
        if self.dim() != dim {
            let len = self.len();
            self.states = vec![DVector::zeros(dim); len];
            self.derivatives = vec![DVector::zeros(dim); len];
        }
    }

    pub(crate) fn set_slot(&mut self, slot: usize, state: &State, derivative: DVector<f64>) {
        self.times[slot] = state.t;
        self.states[slot] = state.y.clone();
        self.derivatives[slot] = derivative;
    }

    pub(crate) fn mark_ready(&mut self) {
        self.ready = true;
        self.cursor = 1;
    }

    pub(crate) fn clear_ready(&mut self) {
        self.ready = false;
        self.cursor = 1;
    }

    pub(crate) fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor;
    }

    /// Hand out the next startup state, if any remain.
    pub(crate) fn next_cached(&mut self) -> Option<State> {
        if self.cursor >= self.len() {
            return None;
        }
        let idx = self.cursor;
        self.cursor += 1;
        Some(State::new(self.times[idx], self.states[idx].clone()))
    }

    /// Drop the oldest entry and append a new newest one, returning the
    /// dropped entry.
    ///
    /// Derivative history only advances when a derivative is supplied.
    pub(crate) fn shift(&mut self, state: &State, derivative: Option<DVector<f64>>) -> Evicted {
        self.times.rotate_left(1);
        self.states.rotate_left(1);
        let mut evicted = Evicted {
            time: state.t,
            state: state.y.clone(),
            derivative: None,
        };
        if let (Some(t), Some(y)) = (self.times.last_mut(), self.states.last_mut()) {
            std::mem::swap(t, &mut evicted.time);
            std::mem::swap(y, &mut evicted.state);
        }
        if let Some(dy) = derivative {
            self.derivatives.rotate_left(1);
            if let Some(last) = self.derivatives.last_mut() {
                evicted.derivative = Some(std::mem::replace(last, dy));
            }
        }
        evicted
    }

    /// Undo the `shift` that returned `evicted`.
    pub(crate) fn unshift(&mut self, evicted: Evicted) {
        self.times.rotate_right(1);
        self.states.rotate_right(1);
        if let (Some(t), Some(y)) = (self.times.first_mut(), self.states.first_mut()) {
            *t = evicted.time;
            *y = evicted.state;
        }
        if let Some(dy) = evicted.derivative {
            self.derivatives.rotate_right(1);
            if let Some(first) = self.derivatives.first_mut() {
                *first = dy;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_hands_out_slots_after_the_first() {
        let mut cache = HistoryCache::new(3);
        cache.reshape(1);
        for slot in 0..3 {
            let s = State::scalar(slot as f64, 10.0 * slot as f64);
            cache.set_slot(slot, &s, DVector::zeros(1));
        }
        cache.mark_ready();

        assert_eq!(cache.next_cached(), Some(State::scalar(1.0, 10.0)));
        assert_eq!(cache.next_cached(), Some(State::scalar(2.0, 20.0)));
        assert_eq!(cache.next_cached(), None);
    }

    #[test]
    fn shift_keeps_oldest_first_order() {
        let mut cache = HistoryCache::new(2);
        cache.reshape(1);
        cache.set_slot(0, &State::scalar(0.0, 1.0), DVector::from_element(1, 1.0));
        cache.set_slot(1, &State::scalar(1.0, 2.0), DVector::from_element(1, 2.0));

        cache.shift(&State::scalar(2.0, 3.0), Some(DVector::from_element(1, 3.0)));
        assert_eq!(cache.times(), &[1.0, 2.0]);
        assert_eq!(cache.states()[1][0], 3.0);
        assert_eq!(cache.derivatives()[0][0], 2.0);

        cache.shift(&State::scalar(3.0, 4.0), None);
        assert_eq!(cache.states()[0][0], 3.0);
        assert_eq!(cache.derivatives()[1][0], 3.0);
    }

    #[test]
    fn unshift_restores_the_evicted_entry() {
        let mut cache = HistoryCache::new(3);
        cache.reshape(1);
        for slot in 0..3 {
            let s = State::scalar(slot as f64, 10.0 * slot as f64);
            cache.set_slot(slot, &s, DVector::from_element(1, slot as f64));
        }
        cache.mark_ready();
        let before = cache.clone();

        let evicted = cache.shift(&State::scalar(3.0, 30.0), Some(DVector::from_element(1, 3.0)));
        assert_eq!(cache.times(), &[1.0, 2.0, 3.0]);
        cache.unshift(evicted);
        assert_eq!(cache, before);

        let evicted = cache.shift(&State::scalar(3.0, 30.0), None);
        assert_eq!(cache.derivatives()[0][0], 0.0);
        cache.unshift(evicted);
        assert_eq!(cache, before);
    }

    #[test]
    fn reshape_follows_dimension() {
        let mut cache = HistoryCache::new(2);
        cache.reshape(3);
        assert_eq!(cache.dim(), 3);
        assert!(cache.derivatives().iter().all(|d| d.len() == 3));
    }
}
