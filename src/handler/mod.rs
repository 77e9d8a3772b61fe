pub(crate) mod approov_token;
pub(crate) mod assets;
pub(crate) mod enforcement;
pub(crate) mod errors;
pub(crate) mod forwarder;
pub(crate) mod middleware;
pub(crate) mod proxy;
pub(crate) mod rewrite;
pub(crate) mod routes;
pub(crate) mod state;
pub(crate) mod token_binding;
pub(crate) mod upstream;

#[cfg(test)]
pub(crate) mod test_support;

fn uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}
