//! 数据传输对象
//!
//! 请求体、查询参数和统一响应结构

pub mod request;
pub mod response;

pub use request::*;
pub use response::*;
