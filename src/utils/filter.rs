use sea_orm::sea_query::{Expr, Func, IntoColumnRef, LikeExpr, SimpleExpr};

const ESCAPE: char = '\\';

/// Build a `%needle%` pattern with LIKE wildcards in the input matched literally.
pub fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | ESCAPE) {
            pattern.push(ESCAPE);
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Case-insensitive substring match on a text column.
///
/// Case folding is the database's `LOWER()`: full Unicode on Postgres, ASCII only on SQLite.
pub fn icontains<C>(column: C, needle: &str) -> SimpleExpr
where
    C: IntoColumnRef,
{
    Expr::expr(Func::lower(Expr::col(column)))
        .like(LikeExpr::new(contains_pattern(needle)).escape(ESCAPE))
}

/// Treat empty query parameters as absent. Other values are matched as given, whitespace included.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
