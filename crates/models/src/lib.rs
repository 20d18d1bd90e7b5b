//! Domain types and pure planning for bed allocation and weekly attendance
//! sessions. Nothing in this crate performs I/O.

pub mod attendance;
pub mod audit;
pub mod course;
pub mod days;
pub mod error;
pub mod housing;
pub mod matcher;
pub mod materialize;
pub mod scope;
pub mod timetable;
pub mod week;
