use crate::models::{ExpenseRow, MonthlyTotalRow, ReceivableRow};
use sqlx::PgPool;

/// Status of a receivable whose payment has been received
pub const RECEIVED_STATUS: &str = "Recebido";
/// Status of a payable that has been paid
pub const PAID_STATUS: &str = "Pago";

/// Receivables created within the last `months` months, newest month first
pub async fn list_receivables(
    pool: &PgPool,
    months: u32,
) -> Result<Vec<ReceivableRow>, sqlx::Error> {
    sqlx::query_as::<_, ReceivableRow>(
        r#"
        SELECT DATE_TRUNC('month', cr.created_at)::date AS month,
               u.nome AS unit,
               COALESCE(cr.origem, 'unspecified') AS origin,
               c.nome AS payer,
               COALESCE(cr.valor_bruto, 0) AS gross_amount,
               COALESCE(cr.valor_liquido, 0) AS net_amount,
               COALESCE(cr.valor_glosa, 0) AS denied_amount,
               COALESCE(cr.status, '') AS status
        FROM contas_receber cr
        JOIN unidades u ON cr.unidade_id = u.id
        LEFT JOIN convenios c ON cr.convenio_id = c.id
        WHERE cr.created_at >= CURRENT_DATE - make_interval(months => $1)
        ORDER BY month DESC, cr.created_at
        "#,
    )
    .bind(months_param(months))
    .fetch_all(pool)
    .await
}

/// Received net revenue per month, oldest month first
pub async fn monthly_received_revenue(
    pool: &PgPool,
    months: u32,
) -> Result<Vec<MonthlyTotalRow>, sqlx::Error> {
    sqlx::query_as::<_, MonthlyTotalRow>(
        r#"
        SELECT DATE_TRUNC('month', created_at)::date AS month,
               COALESCE(SUM(valor_liquido), 0) AS total
        FROM contas_receber
        WHERE created_at >= CURRENT_DATE - make_interval(months => $1)
          AND status = $2
        GROUP BY DATE_TRUNC('month', created_at)
        ORDER BY month
        "#,
    )
    .bind(months_param(months))
    .bind(RECEIVED_STATUS)
    .fetch_all(pool)
    .await
}

/// Paid expenses per month and category, oldest month first
pub async fn monthly_paid_expenses(
    pool: &PgPool,
    months: u32,
) -> Result<Vec<ExpenseRow>, sqlx::Error> {
    sqlx::query_as::<_, ExpenseRow>(
        r#"
        SELECT DATE_TRUNC('month', created_at)::date AS month,
               COALESCE(categoria, 'unspecified') AS category,
               COALESCE(SUM(valor), 0) AS total
        FROM contas_pagar
        WHERE created_at >= CURRENT_DATE - make_interval(months => $1)
          AND status = $2
        GROUP BY DATE_TRUNC('month', created_at), categoria
        ORDER BY month
        "#,
    )
    .bind(months_param(months))
    .bind(PAID_STATUS)
    .fetch_all(pool)
    .await
}

/// make_interval takes an int4
fn months_param(months: u32) -> i32 {
    i32::try_from(months).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn months_param_saturates() {
        assert_eq!(months_param(12), 12);
        assert_eq!(months_param(u32::MAX), i32::MAX);
    }
}
