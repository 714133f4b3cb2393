//! Baremo map - shipping rate zones on vector maps
//!
//! Loads the iberia, world or europe base map, resolves which logistics zone
//! each shape stands for, and colors it by the rate code ("baremo") that
//! applies from the selected origin under the selected service.

pub mod api;
pub mod catalog;
pub mod colors;
pub mod config;
pub mod country;
pub mod identity;
pub mod legend;
pub mod map;
pub mod report;
pub mod router;
pub mod state;
