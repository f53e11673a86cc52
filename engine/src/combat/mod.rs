pub mod attack;
pub mod morale;
pub mod soak;

pub use attack::resolve_attack;
pub use morale::{apply_hit, morale_loss_for};
pub use soak::defender_soak;
