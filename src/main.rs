use anyhow::Context;
use sparkify_kernel::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load sparkify settings")?;
    sparkify_telemetry::init(&settings.telemetry);
    tracing::debug!(
        env = ?settings.environment,
        database = %settings.database.name,
        statements_file = ?settings.schema.statements_file,
        "settings loaded"
    );

    let statements = sparkify_app::load_statements(&settings)?;
    sparkify_app::run(&settings, &statements).await
}
