use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    router_lib::init_tracing();
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    router_lib::run(config_path.as_deref()).await
}
