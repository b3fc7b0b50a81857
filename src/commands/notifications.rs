use crate::args::NotificationsArgs;
use crate::commands::Out;
use crate::{Config, Result};
use tracing::debug;

/// Turns budget alerts on or off for every later command.
pub async fn notifications(mut config: Config, args: NotificationsArgs) -> Result<Out<()>> {
    let enabled = args.state().is_on();
    if config.notifications_enabled() == enabled {
        debug!("Notifications are already {}", args.state());
    }
    config.set_notifications_enabled(enabled);
    config.save().await?;
    Ok(format!("Budget notifications are {}", args.state()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::OnOff;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_toggle_persists() {
        let env = TestEnv::new().await;
        let out = notifications(env.config(), NotificationsArgs::new(OnOff::Off))
            .await
            .unwrap();
        assert_eq!(out.message(), "Budget notifications are off");
        let home = env.config().root().to_path_buf();
        assert!(!Config::load(&home).await.unwrap().notifications_enabled());

        notifications(env.config(), NotificationsArgs::new(OnOff::On))
            .await
            .unwrap();
        assert!(Config::load(&home).await.unwrap().notifications_enabled());
    }
}
