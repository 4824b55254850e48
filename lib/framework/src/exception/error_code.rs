pub const BAD_REQUEST: &str = "BAD_REQUEST";
pub const NOT_FOUND: &str = "NOT_FOUND";
pub const REMOTE_SERVICE_ERROR: &str = "REMOTE_SERVICE_ERROR";
