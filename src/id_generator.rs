use crate::layer::LayerId;

/// Hands out layer ids in increasing order and never repeats one.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> LayerId {
        let id = LayerId(self.next);
        self.next += 1;
        id
    }

    /// Records an id that was issued elsewhere (e.g. restored from history)
    /// so it is never handed out again.
    pub fn observe(&mut self, id: LayerId) {
        self.next = self.next.max(id.0 + 1);
    }
}
