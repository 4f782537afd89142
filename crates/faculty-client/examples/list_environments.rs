use faculty_client::init_observability;
use faculty_client::prelude::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ClientError> {
    let _ = dotenvy::dotenv();
    init_observability();

    let project_id = std::env::args()
        .nth(1)
        .and_then(|raw| uuid::Uuid::parse_str(&raw).ok())
        .ok_or_else(|| ClientError::Validation("usage: list_environments <project-id>".into()))?;

    let session = Session::from_env()?;
    let environments = EnvironmentClient::new(&session).list(project_id).await?;
    for environment in environments {
        println!(
            "{}  {}  updated {}",
            environment.id,
            environment.name,
            environment.updated_at.to_rfc3339()
        );
    }
    Ok(())
}
