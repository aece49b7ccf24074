pub mod default_routers;
pub mod http_serve;
pub mod routers;
pub mod update_dedupe;
