//! # Settings Repository
//!
//! The settings row is a per-tenant singleton, created lazily with zeroed
//! rates and mutated only through an explicit save. The employee roster
//! lives here too because its only consumer is the derived labor rate.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use forno_core::{Employee, Settings};

/// Repository for settings and the employee roster.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Gets the settings row of a tenant, if one has been saved.
    pub async fn get(&self, tenant_id: &str) -> DbResult<Option<Settings>> {
        let settings = sqlx::query_as::<_, Settings>(
            "SELECT tenant_id, labor_cost_per_minute, fixed_overhead_rate, \
             monthly_revenue_estimate, default_tax_rate, debit_fee_rate, credit_fee_rate, \
             updated_at \
             FROM settings WHERE tenant_id = ?1",
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(settings)
    }

    /// Saves the settings row (insert or full overwrite).
    pub async fn save(&self, settings: &Settings) -> DbResult<()> {
        debug!(tenant_id = %settings.tenant_id, "Saving settings");

        sqlx::query(
            r#"
            INSERT INTO settings (
                tenant_id, labor_cost_per_minute, fixed_overhead_rate,
                monthly_revenue_estimate, default_tax_rate,
                debit_fee_rate, credit_fee_rate, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT (tenant_id) DO UPDATE SET
                labor_cost_per_minute = excluded.labor_cost_per_minute,
                fixed_overhead_rate = excluded.fixed_overhead_rate,
                monthly_revenue_estimate = excluded.monthly_revenue_estimate,
                default_tax_rate = excluded.default_tax_rate,
                debit_fee_rate = excluded.debit_fee_rate,
                credit_fee_rate = excluded.credit_fee_rate,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&settings.tenant_id)
        .bind(settings.labor_cost_per_minute)
        .bind(settings.fixed_overhead_rate)
        .bind(settings.monthly_revenue_estimate)
        .bind(settings.default_tax_rate)
        .bind(settings.debit_fee_rate)
        .bind(settings.credit_fee_rate)
        .bind(settings.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Employee Roster
    // =========================================================================

    /// Lists the employee roster of a tenant.
    pub async fn list_employees(&self, tenant_id: &str) -> DbResult<Vec<Employee>> {
        let employees = sqlx::query_as::<_, Employee>(
            "SELECT id, tenant_id, name, salary, hours_per_month, created_at, updated_at \
             FROM employees WHERE tenant_id = ?1 ORDER BY name",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(employees)
    }

    /// Inserts or overwrites one employee.
    pub async fn upsert_employee(&self, employee: &Employee) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO employees (
                id, tenant_id, name, salary, hours_per_month, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                salary = excluded.salary,
                hours_per_month = excluded.hours_per_month,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&employee.id)
        .bind(&employee.tenant_id)
        .bind(&employee.name)
        .bind(employee.salary)
        .bind(employee.hours_per_month)
        .bind(employee.created_at)
        .bind(employee.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Removes an employee from the roster.
    pub async fn delete_employee(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM employees WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Employee", id));
        }

        Ok(())
    }
}
