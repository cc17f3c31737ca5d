//! Tower layers for the transport pipeline
//!
//! ## Available Layers
//!
//! - [`LoggingLayer`] - Emits one access record per request/response cycle

mod logging;

pub use logging::{
    ACCESS_LOG_TARGET, LogSink, LoggingLayer, LoggingService, RequestLogRecord, TracingSink,
};
