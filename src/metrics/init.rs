use std::{net::SocketAddr, num::NonZero, time::Duration};

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{self, PrometheusBuilder};

const BUCKET_DURATION: Duration = Duration::from_secs(60);
const BUCKET_COUNT: NonZero<u32> = match NonZero::new(5) {
    Some(count) => count,
    None => unreachable!(),
};

pub(crate) fn init(addr: SocketAddr) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_bucket_duration(BUCKET_DURATION)?
        .set_bucket_count(BUCKET_COUNT)
        .install()
        .with_context(|| format!("Couldn't start the metrics listener on {addr}"))
}
