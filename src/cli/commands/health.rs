use crate::config::Config;
use crate::errors::AppResult;
use crate::ui::messages::{success, warning};
use crate::{connect, open_store};

pub async fn handle(cfg: &Config) -> AppResult<()> {
    let engine = connect(cfg, open_store(cfg)?).await;

    if engine.check_server_reachable().await {
        success(format!("Server {} is reachable", cfg.api_endpoint));
    } else {
        warning(format!("Server {} is not reachable", cfg.api_endpoint));
    }
    Ok(())
}
