use anyhow::{Context as AnyhowContext, Result};
use std::net::SocketAddr;

/// Resolves `bind` and, unless `public`, insists every address is loopback.
pub(crate) async fn resolve_guarded_bind_addrs(
    bind: &str,
    public: bool,
) -> Result<Vec<SocketAddr>> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host(bind)
        .await
        .with_context(|| format!("Cannot resolve bind address {bind}"))?
        .collect();
    if addrs.is_empty() {
        anyhow::bail!("Bind address {bind} resolved to nothing")
    }
    if !public {
        require_loopback(bind, &addrs)?;
    }
    Ok(addrs)
}

fn require_loopback(bind: &str, addrs: &[SocketAddr]) -> Result<()> {
    match addrs.iter().find(|addr| !addr.ip().is_loopback()) {
        Some(exposed) => anyhow::bail!(
            "Refusing to bind {bind} ({exposed} is not loopback) without --public. The listings server has no authentication; pass --public only on a trusted network."
        ),
        None => Ok(()),
    }
}
