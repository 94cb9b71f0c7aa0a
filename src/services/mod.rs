//! Servizi di tracciamento dei job asincroni
//!
//! La tabella dei job è costruita una volta all'avvio e condivisa tra gli
//! handler tramite `Arc`.

pub mod dispatch;
pub mod ids;
pub mod jobs;
pub mod store;

pub use dispatch::{spawn_dispatch, DispatchRequest, Dispatcher, HttpDispatcher};
pub use ids::{IdGenerator, UuidV4Ids};
pub use jobs::{normalize_result_urls, CallbackOutcome, JobService};
pub use store::{JobStore, SharedJobStore, Transition};
