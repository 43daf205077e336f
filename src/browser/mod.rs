pub mod connection;
pub mod headless;

pub use connection::connect_to_browser_and_page;
pub use headless::launch_headless_browser;

use chromiumoxide::{Browser, Page};

use crate::config::Config;
use crate::error::Result;

/// 按配置获取浏览器会话
///
/// 指定了调试端口就连接既有浏览器，否则启动无头浏览器；
/// 两条路径都会把页面导航到查询入口
pub async fn acquire_session(config: &Config) -> Result<(Browser, Page)> {
    match config.browser_debug_port {
        Some(port) => connect_to_browser_and_page(port, &config.target_url).await,
        None => launch_headless_browser(&config.target_url, config.chrome_path.as_deref()).await,
    }
}
