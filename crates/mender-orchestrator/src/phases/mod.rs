//! The four check phases. Each one reads through the resilient store and
//! returns its typed result; pure evaluation lives next to the loading code.

pub mod business;
pub mod schema;
pub mod storage;
