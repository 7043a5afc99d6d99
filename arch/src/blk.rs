use crate::Shared;

/// A logical emulation block driven by the coroutine scheduler.
pub trait Block {
    /// Checks whether the block has work to perform this cycle.
    fn ready(&self) -> bool {
        true
    }

    /// Emulates a single cycle of the block.
    fn cycle(&mut self) {}

    /// Resets the block to its powered-on state.
    fn reset(&mut self) {}
}

impl<B: Block> Block for Shared<B> {
    fn ready(&self) -> bool {
        self.borrow().ready()
    }

    fn cycle(&mut self) {
        self.borrow_mut().cycle();
    }

    fn reset(&mut self) {
        self.borrow_mut().reset();
    }
}
