use anyhow::Context;
use holding_core::config::Config;
use std::path::Path;

pub fn run(root: &Path, port: u16) -> anyhow::Result<()> {
    Config::load(root).context("workspace not initialized; run `holding init` first")?;

    let rt = tokio::runtime::Runtime::new()?;
    let root_buf = root.to_path_buf();

    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
        let actual_port = listener.local_addr()?.port();
        println!("holding API → http://localhost:{actual_port}");
        holding_server::serve_on(root_buf, listener).await
    })
}
