pub mod rate_limit;
pub mod rejection;
pub mod request_id;
pub mod timing;
