#![deny(
    unused_variables,
    unused_mut,
    unused_attributes,
    dead_code,
    clippy::unnecessary_mut_passed,
    unused_results,
    clippy::let_underscore_future,
    unused_must_use,
    unconditional_recursion
)]

use tracing::Level;
use tracing_subscriber::{
    prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt, Layer,
};

pub mod general;

pub mod apis;
pub mod cmd_arg;
pub mod config;
pub mod result;
pub mod sys;
pub mod util;

pub fn start_tracing() {
    let my_filter = tracing_subscriber::filter::filter_fn(|v| {
        if let Some(mp) = v.module_path() {
            if mp.contains("hyper") {
                return false;
            }
            if *v.level() == Level::DEBUG && mp.contains("tower_http") {
                return false;
            }
        }
        v.level() != &tracing::Level::TRACE
    });
    let my_layer = tracing_subscriber::fmt::layer();
    let _ = tracing_subscriber::registry()
        .with(my_layer.with_filter(my_filter))
        .try_init();
}
