pub mod ai;
pub mod entity;
pub mod ghost;
pub mod grid;
pub mod motion;
pub mod player;
pub mod rules;
pub mod tile;
