pub mod cli;
pub mod inspect;
pub mod predict;
pub mod train;
pub mod util;
