pub mod classifier;
pub mod config;
pub mod dto;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod materializer;
pub mod model;
pub mod pipeline;
pub mod pool;
pub mod reconciler;
pub mod records;
pub mod reference;
pub mod resolver;
pub mod riot_api;
pub mod store;
pub mod summoners;
