//! Platform adapter selection.
//!
//! | Kind | Adapter |
//! |------|---------|
//! | `wmctrl` | [`wmctrl::WmctrlPlatform`], X11 via `wmctrl`/`xprop` |
//! | `mock` | [`MockPlatform`], seeded from `[[platform.mock_windows]]` |

pub mod wmctrl;

use anyhow::Result;
use std::sync::Arc;

pub use devsnap_core::platform::mock::MockPlatform;
pub use devsnap_core::platform::PlatformAdapter;

use devsnap_core::matcher::WindowMatcher;

use crate::config::Config;

/// Build the adapter named by `platform.kind`.
pub fn create_platform(config: &Config) -> Result<Arc<dyn PlatformAdapter>> {
    let matcher = WindowMatcher::new(config.matching);
    match config.platform.kind.as_str() {
        "wmctrl" => Ok(Arc::new(wmctrl::WmctrlPlatform::new(matcher))),
        "mock" => {
            let mock = MockPlatform::with_matcher(matcher);
            mock.set_windows(config.platform.mock_windows.clone());
            Ok(Arc::new(mock))
        }
        other => anyhow::bail!("Unknown platform kind: '{}'", other),
    }
}
