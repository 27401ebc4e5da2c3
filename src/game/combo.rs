/// Consecutive cascade steps within one player action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComboTracker {
    count: u32,
}

impl ComboTracker {
    /// Called whenever a new player action begins.
    pub fn reset(&mut self) {
        self.count = 0;
    }

    /// Count one cascade step and return the new combo count.
    pub fn step(&mut self) -> u32 {
        self.count += 1;
        self.count
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}
