//! proxops - proximity-operations visualization dashboard
//!
//! A reactive pipeline for spacecraft relative-motion scenarios: a store of
//! named state cells feeds a static derivation graph whose nodes run
//! fixed-step trajectory simulations and publish named scene traces for an
//! egui display shell.

pub mod app;
pub mod astro;
pub mod error;
pub mod fov;
pub mod graph;
pub mod pipeline;
pub mod scene;
pub mod sim;
pub mod store;
pub mod ui;
pub mod validate;
