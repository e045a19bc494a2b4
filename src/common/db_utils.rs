// src/common/db_utils.rs

// ---
// Helpers de erro do Postgres
// ---

/// `true` se o erro é uma violação de chave única numa constraint cujo
/// nome contém `fragment` (ex.: "unique_code", "company_slug").
pub(crate) fn unique_violation_on(err: &sqlx::Error, fragment: &str) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or_default();
            return constraint.contains(fragment);
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_never_unique_violations() {
        assert!(!unique_violation_on(&sqlx::Error::RowNotFound, "unique_code"));
        assert!(!unique_violation_on(&sqlx::Error::PoolTimedOut, "pkey"));
    }
}
