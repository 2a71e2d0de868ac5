pub mod event;
pub mod highscore;
pub mod level;
pub mod menu;
pub mod snapshot;
pub mod step;
pub mod world;
