use sparkify_kernel::settings::DatabaseSettings;

use crate::error::DbError;
use crate::ident::{encoding_literal, quote_identifier};
use crate::session::Session;

/// The `DROP DATABASE` and `CREATE DATABASE` statements for the target database.
pub fn recreate_statements(settings: &DatabaseSettings) -> Result<[String; 2], DbError> {
    let name = quote_identifier(&settings.name)?;
    let template = quote_identifier(&settings.template)?;
    let encoding = encoding_literal(&settings.encoding)?;
    let force = if settings.force_drop {
        " WITH (FORCE)"
    } else {
        ""
    };

    Ok([
        format!("DROP DATABASE IF EXISTS {name}{force}"),
        format!("CREATE DATABASE {name} WITH ENCODING {encoding} TEMPLATE {template}"),
    ])
}

/// Drop and recreate the target database, then return a session connected to it.
///
/// The administrative session is closed before the target session is opened.
/// A failure aborts the sequence without cleanup; rerunning is the recovery.
pub async fn bootstrap_database(settings: &DatabaseSettings) -> Result<Session, DbError> {
    if settings.admin_database == settings.name {
        return Err(DbError::SameDatabase(settings.name.clone()));
    }
    let statements = recreate_statements(settings)?;

    let admin = Session::connect(settings, &settings.admin_database).await?;
    for statement in &statements {
        tracing::info!(database = %settings.name, statement = %statement, "recreating database");
        if let Err(error) = admin.execute(statement).await {
            admin.close().await;
            return Err(error);
        }
    }
    admin.close().await;

    Session::connect(settings, &settings.name).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn default_settings_render_utf8_template0() {
        let [drop, create] = recreate_statements(&DatabaseSettings::default()).unwrap();
        assert_eq!(drop, "DROP DATABASE IF EXISTS \"sparkifydb\"");
        assert_eq!(
            create,
            "CREATE DATABASE \"sparkifydb\" WITH ENCODING 'utf8' TEMPLATE \"template0\""
        );
    }

    #[test]
    fn force_drop_appends_force_option() {
        let settings = DatabaseSettings {
            force_drop: true,
            ..DatabaseSettings::default()
        };
        let [drop, _] = recreate_statements(&settings).unwrap();
        assert_eq!(drop, "DROP DATABASE IF EXISTS \"sparkifydb\" WITH (FORCE)");
    }

    #[test]
    fn invalid_encoding_is_a_configuration_error() {
        let settings = DatabaseSettings {
            encoding: "utf8' TEMPLATE x --".to_string(),
            ..DatabaseSettings::default()
        };
        let err = recreate_statements(&settings).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn refuses_to_drop_the_admin_database() {
        let settings = DatabaseSettings {
            name: "postgres".to_string(),
            ..DatabaseSettings::default()
        };
        let err = bootstrap_database(&settings).await.err().unwrap();
        assert!(matches!(err, DbError::SameDatabase(ref name) if name == "postgres"));
    }

    #[tokio::test]
    async fn invalid_name_fails_before_connecting() {
        let settings = DatabaseSettings {
            name: String::new(),
            // Unroutable port: a connection attempt would surface as Connect.
            port: 1,
            ..DatabaseSettings::default()
        };
        let err = bootstrap_database(&settings).await.err().unwrap();
        assert!(matches!(err, DbError::InvalidIdentifier { .. }));
    }
}
