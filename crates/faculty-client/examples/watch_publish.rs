//! Waits for a template publish of the project given as the first argument.
//!
//! Reads `FACULTY_*` settings from the environment or a `.env` file; the
//! optional second argument bounds the wait in seconds (default 300).

use std::time::Duration;

use faculty_client::init_observability;
use faculty_client::prelude::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ClientError> {
    let _ = dotenvy::dotenv();
    init_observability();

    let mut args = std::env::args().skip(1);
    let project_id = args
        .next()
        .and_then(|raw| uuid::Uuid::parse_str(&raw).ok())
        .ok_or_else(|| ClientError::Validation("usage: watch_publish <project-id> [timeout-secs]".into()))?;
    let timeout = args
        .next()
        .and_then(|raw| raw.parse::<u64>().ok())
        .map_or(Duration::from_secs(300), Duration::from_secs);

    let session = Session::from_env()?;
    let user = User::me(&session).await?;
    let notifications = NotificationClient::new(&session);
    let events = notifications.user_updates(user.id).await?;

    let wait = notifications.check_publish_template_result(events, project_id);
    match tokio::time::timeout(timeout, wait).await {
        Ok(Ok(())) => println!("template published"),
        Ok(Err(ClientError::TemplatePublishing(err))) => eprintln!("{err}"),
        Ok(Err(err)) => return Err(err),
        Err(_) => eprintln!("no publish result within {}s", timeout.as_secs()),
    }
    Ok(())
}
