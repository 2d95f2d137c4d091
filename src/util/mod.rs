/*!
Small building blocks shared by the compiler and the match engine.
*/

pub(crate) mod alphabet;
pub(crate) mod escape;
pub mod look;
