pub mod descriptor;
pub mod natural;
pub mod sequence;
