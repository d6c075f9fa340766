use sqlx::PgPool;

use super::repo_types::ReportRow;

/// Food items joined up to their device, most recent first within each
/// user and device.
pub async fn list_entries(
    db: &PgPool,
    mac: Option<&str>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<ReportRow>> {
    let rows = sqlx::query_as::<_, ReportRow>(
        r#"
        SELECT d.user_id,
               d.mac,
               m.id                    AS meal_id,
               m.eaten_at,
               ds.id                   AS dish_id,
               fi.id                   AS food_item_id,
               ft.origin,
               g.code                  AS group_code,
               b.ean,
               b.name                  AS product_name,
               fi.weight_g,
               fi.weight_g * ft.kcal_g AS kcal
        FROM devices d
        JOIN food_items fi     ON fi.user_id = d.user_id
        JOIN food_types ft     ON ft.id = fi.food_type_id
        LEFT JOIN food_groups g ON g.food_type_id = ft.id
        LEFT JOIN barcodes b   ON b.food_type_id = ft.id
        JOIN dishes ds         ON ds.id = fi.dish_id
        JOIN meals m           ON m.id = ds.meal_id
        WHERE ($1::text IS NULL OR upper(d.mac) = upper($1))
        ORDER BY d.user_id, d.mac, m.id DESC, ds.id DESC, fi.id DESC
        LIMIT $2 OFFSET $3
    "#,
    )
    .bind(mac)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
