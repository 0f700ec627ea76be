pub mod cell;
pub mod grid;
pub mod map;
pub mod report;
pub mod rules;
