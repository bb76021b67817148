// Kit - Instruments, limbs, and the layout that binds them

pub mod instrument;
pub mod layout;

pub use instrument::{Hand, Instrument, Limb};
pub use layout::{KitError, KitLayout, KitResult};
