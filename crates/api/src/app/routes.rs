pub mod ingredients;
pub mod orders;
pub mod recipes;
pub mod system;
pub mod units;
