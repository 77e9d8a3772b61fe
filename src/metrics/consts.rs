pub(crate) const HTTP_REQUEST_DURATION_SECS: &str =
    "http_request_duration_seconds";
pub(crate) const HTTP_REQUEST_SIZE_BYTES: &str = "http_request_size_bytes";
pub(crate) const HTTP_RESPONSE_SIZE_BYTES: &str = "http_response_size_bytes";
pub(crate) const HTTP_RESPONSE_SUCCESS: &str = "http_response_success";
pub(crate) const HTTP_RESPONSE_FAILURE: &str = "http_response_failure";
pub(crate) const PROXY_HTTP_SERVER_ERROR: &str = "proxy_http_server_error";

pub(crate) const UPSTREAM_REQUEST_DURATION_SECS: &str =
    "upstream_request_duration_seconds";
pub(crate) const UPSTREAM_TRANSPORT_FAILURE: &str = "upstream_transport_failure";
pub(crate) const RESPONSE_URLS_REWRITTEN: &str = "response_urls_rewritten";

pub(crate) const APPROOV_REQUEST_ADMITTED: &str = "approov_request_admitted";
pub(crate) const APPROOV_REQUEST_REJECTED: &str = "approov_request_rejected";
pub(crate) const APPROOV_REQUEST_SOFT_FAILED: &str = "approov_request_soft_failed";
