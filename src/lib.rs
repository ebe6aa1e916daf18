pub mod config;
pub mod export;
pub mod http_client;
pub mod line_cache;
pub mod lines_fetch;
pub mod matcher;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod projections;
pub mod recommend;
