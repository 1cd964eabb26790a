/// Per-run file logger built on `fern`, with rotation of older runs.
pub mod loggerlocal;

pub use loggerlocal::{
    build_dispatch, parse_level, rotate_logs, setup_logging, LoggerError, LoggerLocalOptions,
};
