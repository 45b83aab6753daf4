pub mod power;
pub mod profiles;
pub mod translate;
pub mod wait;
