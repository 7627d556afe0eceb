use sqlx::SqliteConnection;

use crate::{db_types::Widget, traits::PersistenceError};

pub async fn fetch_widget(id: i64, conn: &mut SqliteConnection) -> Result<Option<Widget>, PersistenceError> {
    let widget =
        sqlx::query_as::<_, Widget>("SELECT * FROM widgets WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(widget)
}
