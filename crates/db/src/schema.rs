use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Create offices table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS offices (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name VARCHAR(255) NOT NULL UNIQUE,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create users table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            employee_id VARCHAR(64) NOT NULL UNIQUE,
            full_name VARCHAR(255) NOT NULL,
            office_id UUID NULL REFERENCES offices(id),
            role VARCHAR(64) NOT NULL DEFAULT 'STAFF',
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create user_secondary_offices table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_secondary_offices (
            user_id UUID NOT NULL REFERENCES users(id),
            office_id UUID NOT NULL REFERENCES offices(id),
            PRIMARY KEY (user_id, office_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create permissions table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS permissions (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            slug VARCHAR(128) NOT NULL UNIQUE,
            is_active BOOLEAN NOT NULL DEFAULT TRUE
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create role_permissions table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS role_permissions (
            role VARCHAR(64) NOT NULL,
            permission_id UUID NOT NULL REFERENCES permissions(id),
            PRIMARY KEY (role, permission_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create user_permissions table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_permissions (
            user_id UUID NOT NULL REFERENCES users(id),
            permission_id UUID NOT NULL REFERENCES permissions(id),
            PRIMARY KEY (user_id, permission_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create schedules table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schedules (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name VARCHAR(255) NOT NULL,
            start_time TIME NOT NULL,
            end_time TIME NOT NULL,
            office_id UUID NULL REFERENCES offices(id),
            shift_type VARCHAR(64) NULL,
            alias VARCHAR(64) NULL,
            status VARCHAR(32) NOT NULL DEFAULT 'active',
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_time_range CHECK (end_time > start_time)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Same shift may not be defined twice within one office; NULL office_id
    // rows are global templates and need their own uniqueness index.
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS uq_schedules_office_shift
            ON schedules (name, office_id, start_time, end_time)
            WHERE office_id IS NOT NULL;
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS uq_schedules_global_shift
            ON schedules (name, start_time, end_time)
            WHERE office_id IS NULL;
        "#,
    )
    .execute(pool)
    .await?;

    // Create duty_charts table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS duty_charts (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            office_id UUID NOT NULL REFERENCES offices(id),
            effective_date DATE NOT NULL,
            end_date DATE NULL,
            name VARCHAR(255) NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_chart_window CHECK (end_date IS NULL OR end_date >= effective_date)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create duty_chart_schedules table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS duty_chart_schedules (
            duty_chart_id UUID NOT NULL REFERENCES duty_charts(id),
            schedule_id UUID NOT NULL REFERENCES schedules(id),
            PRIMARY KEY (duty_chart_id, schedule_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create duties table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS duties (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id UUID NOT NULL REFERENCES users(id),
            office_id UUID NOT NULL REFERENCES offices(id),
            schedule_id UUID NOT NULL REFERENCES schedules(id),
            date DATE NOT NULL,
            duty_chart_id UUID NULL REFERENCES duty_charts(id),
            is_completed BOOLEAN NOT NULL DEFAULT FALSE,
            currently_available BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Backstop behind the conflict validator: one row per user, chart,
    // schedule and date. COALESCE folds chartless duties into one bucket so
    // the index still applies when duty_chart_id is NULL.
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS uq_duties_user_chart_schedule_date
            ON duties (
                user_id,
                COALESCE(duty_chart_id, '00000000-0000-0000-0000-000000000000'::uuid),
                schedule_id,
                date
            );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes (one statement per query; prepared statements cannot
    // contain multiple commands)
    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_users_office_id ON users(office_id);",
        "CREATE INDEX IF NOT EXISTS idx_schedules_office_id ON schedules(office_id);",
        "CREATE INDEX IF NOT EXISTS idx_duty_charts_office_id ON duty_charts(office_id);",
        "CREATE INDEX IF NOT EXISTS idx_duty_charts_effective_date ON duty_charts(effective_date);",
        "CREATE INDEX IF NOT EXISTS idx_duties_user_date ON duties(user_id, date);",
        "CREATE INDEX IF NOT EXISTS idx_duties_office_date ON duties(office_id, date);",
        "CREATE INDEX IF NOT EXISTS idx_duties_duty_chart_id ON duties(duty_chart_id);",
    ] {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("Database schema initialized successfully.");
    Ok(())
}
