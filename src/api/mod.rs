//! HTTP adapter over [`RateService`](crate::service::RateService)

pub mod handlers;
pub mod html;
pub mod response;
pub mod server;

pub use server::{AppState, router, run};
