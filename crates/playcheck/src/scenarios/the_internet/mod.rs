//! The Internet suites, one module per feature area.

mod auth;
mod data_tables;
mod dynamic;
mod elements;
mod files;
mod frames;
mod interactions;
mod miscellaneous;
mod navigation;
mod ui_layout;

use crate::harness::Suite;
use crate::sites::Site;

/// All suites for The Internet
#[must_use]
pub fn suites() -> Vec<Suite> {
    [
        auth::suites(),
        data_tables::suites(),
        dynamic::suites(),
        elements::suites(),
        files::suites(),
        frames::suites(),
        interactions::suites(),
        miscellaneous::suites(),
        navigation::suites(),
        ui_layout::suites(),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Suite on The Internet that opens `path` before every scenario
fn suite(id: &str, title: &str, path: &'static str) -> Suite {
    Suite::new(format!("the_internet::{id}"), title)
        .with_tag("the_internet")
        .start_at(Site::TheInternet, path)
}
