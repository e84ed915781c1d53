use crate::config::BoundaryPolicy;

/// Tracks the selected scene within a fixed-length tour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneNavigator {
    len: usize,
    current: usize,
    policy: BoundaryPolicy,
}

impl SceneNavigator {
    pub fn new(len: usize, start: usize, policy: BoundaryPolicy) -> Self {
        let current = if len == 0 { 0 } else { start.min(len - 1) };
        Self {
            len,
            current,
            policy,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn policy(&self) -> BoundaryPolicy {
        self.policy
    }

    /// Selects `index` when it lies inside the tour. Out-of-range requests are
    /// rejected under both boundary policies.
    pub fn go_to(&mut self, index: usize) -> bool {
        if index >= self.len {
            if self.len > 0 {
                log::debug!("ignoring navigation to scene {index}; tour has {}", self.len);
            }
            return false;
        }
        self.current = index;
        true
    }

    pub fn next_index(&self) -> Option<usize> {
        if self.len < 2 {
            return None;
        }
        match self.policy {
            BoundaryPolicy::Wrap => Some((self.current + 1) % self.len),
            BoundaryPolicy::Clamp if self.current + 1 < self.len => Some(self.current + 1),
            BoundaryPolicy::Clamp => None,
        }
    }

    pub fn previous_index(&self) -> Option<usize> {
        if self.len < 2 {
            return None;
        }
        match self.policy {
            BoundaryPolicy::Wrap => Some(match self.current {
                0 => self.len - 1,
                idx => idx - 1,
            }),
            BoundaryPolicy::Clamp => self.current.checked_sub(1),
        }
    }

    pub fn next(&mut self) -> bool {
        match self.next_index() {
            Some(index) => self.go_to(index),
            None => false,
        }
    }

    pub fn previous(&mut self) -> bool {
        match self.previous_index() {
            Some(index) => self.go_to(index),
            None => false,
        }
    }

    pub fn has_next(&self) -> bool {
        self.next_index().is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.previous_index().is_some()
    }
}
