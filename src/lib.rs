//! Gradebook ("diário") aggregation for a class-based essay course.
//!
//! For a student, class and study period, the engine pulls attendance,
//! participation, essays, simulated exams, whiteboard activities, exercises
//! and the optional in-person evaluation, normalizes them onto a 0-10 scale
//! and computes the final grade. See [`engine::Gradebook`] for the entry
//! points.

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod grade;
pub mod models;
pub mod report;
pub mod store;
pub mod summary;
pub mod turma;

#[cfg(test)]
mod fixtures;
#[cfg(test)]
mod memory;
