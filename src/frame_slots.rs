use std::rc::Rc;

/// Load bookkeeping for a 1-based frame sequence, independent of what a loaded
/// frame actually is.
#[derive(Clone, Debug, PartialEq)]
enum Slot<T> {
    Pending,
    Ready(T),
    Substituted(T),
    Missing,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadProgress {
    pub loaded: u32,
    pub failed: u32,
    pub total: u32,
}

impl LoadProgress {
    pub fn settled(&self) -> u32 {
        self.loaded + self.failed
    }

    pub fn is_complete(&self) -> bool {
        self.settled() >= self.total
    }
}

#[derive(Clone, Debug)]
pub struct FrameSlots<T> {
    slots: Vec<Slot<T>>,
}

impl<T> FrameSlots<T> {
    pub fn new(frame_count: u32) -> Self {
        let mut slots = Vec::with_capacity(frame_count as usize);
        slots.resize_with(frame_count as usize, || Slot::Pending);
        Self { slots }
    }

    pub fn len(&self) -> u32 {
        self.slots.len() as u32
    }

    fn slot_mut(&mut self, index: u32) -> Option<&mut Slot<T>> {
        let position = index.checked_sub(1)? as usize;
        self.slots.get_mut(position)
    }

    /// The renderable frame at `index`, including generated substitutes.
    /// `None` for pending, failed, and out-of-range indices.
    pub fn get(&self, index: u32) -> Option<&T> {
        let position = index.checked_sub(1)? as usize;
        match self.slots.get(position)? {
            Slot::Ready(asset) | Slot::Substituted(asset) => Some(asset),
            Slot::Pending | Slot::Missing => None,
        }
    }

    pub fn is_settled(&self, index: u32) -> bool {
        index
            .checked_sub(1)
            .and_then(|position| self.slots.get(position as usize))
            .is_some_and(|slot| !matches!(slot, Slot::Pending))
    }

    /// Returns `false` when `index` is outside the sequence.
    pub fn mark_loaded(&mut self, index: u32, asset: T) -> bool {
        match self.slot_mut(index) {
            Some(slot) => {
                *slot = Slot::Ready(asset);
                true
            }
            None => false,
        }
    }

    /// Records a failed load, optionally filling the slot with a stand-in.
    pub fn mark_failed(&mut self, index: u32, substitute: Option<T>) -> bool {
        match self.slot_mut(index) {
            Some(slot) => {
                *slot = match substitute {
                    Some(asset) => Slot::Substituted(asset),
                    None => Slot::Missing,
                };
                true
            }
            None => false,
        }
    }

    pub fn progress(&self) -> LoadProgress {
        let mut progress = LoadProgress {
            total: self.len(),
            ..LoadProgress::default()
        };

        for slot in &self.slots {
            match slot {
                Slot::Ready(_) => progress.loaded += 1,
                Slot::Substituted(_) | Slot::Missing => progress.failed += 1,
                Slot::Pending => {}
            }
        }

        progress
    }
}

/// Stand-in shared by every failed frame. Built on first use; a failed build
/// is remembered so it is not attempted again for the next frame.
#[derive(Debug)]
pub struct SharedSubstitute<T> {
    state: SubstituteState<T>,
}

#[derive(Debug)]
enum SubstituteState<T> {
    Untried,
    Built(Rc<T>),
    Unavailable,
}

impl<T> Default for SharedSubstitute<T> {
    fn default() -> Self {
        Self {
            state: SubstituteState::Untried,
        }
    }
}

impl<T> SharedSubstitute<T> {
    pub fn get_or_build(&mut self, build: impl FnOnce() -> Option<T>) -> Option<Rc<T>> {
        match &self.state {
            SubstituteState::Built(shared) => return Some(Rc::clone(shared)),
            SubstituteState::Unavailable => return None,
            SubstituteState::Untried => {}
        }

        match build() {
            Some(value) => {
                let shared = Rc::new(value);
                self.state = SubstituteState::Built(Rc::clone(&shared));
                Some(shared)
            }
            None => {
                self.state = SubstituteState::Unavailable;
                None
            }
        }
    }
}
