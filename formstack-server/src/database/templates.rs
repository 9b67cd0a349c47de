use super::{column_list, read_slot_row, slot_values, Database, Viewer};
use crate::error::{AppError, AppResult};
use crate::slots::{decode_questions, question_columns, SlotRow};
use chrono::Utc;
use formstack_models::{TagCount, Template, TemplateMode, TemplateSummary};
use rusqlite::{params, params_from_iter, types::Value as SqlValue, OptionalExtension, Transaction};

/// Template metadata plus its encoded question slots, as written to storage.
#[derive(Debug, Clone)]
pub struct TemplateDraft {
    pub title: String,
    pub description: String,
    pub topic: String,
    pub tags: Vec<String>,
    pub mode: TemplateMode,
    pub slots: SlotRow,
}

#[derive(Debug, Clone)]
pub struct StoredTemplate {
    pub summary: TemplateSummary,
    pub slots: SlotRow,
}

impl StoredTemplate {
    pub fn into_template(self) -> Template {
        let questions = decode_questions(&self.slots);
        Template {
            summary: self.summary,
            questions,
        }
    }

    pub fn is_visible_to(&self, viewer: &Viewer) -> bool {
        self.summary.mode == TemplateMode::Public
            || viewer.is_admin
            || viewer.user_id == Some(self.summary.author_id)
    }
}

const SUMMARY_COLUMNS: &str = "t.id, t.author_id, u.name, t.title, t.description, t.topic, t.tags, t.mode,
    (SELECT COUNT(*) FROM forms f WHERE f.template_id = t.id) AS submission_count, t.created_at, t.updated_at";
const SUMMARY_WIDTH: usize = 11;
const SUMMARY_FROM: &str = "templates t JOIN users u ON u.id = t.author_id";

fn summary_from_row(row: &rusqlite::Row) -> rusqlite::Result<TemplateSummary> {
    let tags_json: String = row.get(6)?;
    let tags: Vec<String> = serde_json::from_str(&tags_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let mode: String = row.get(7)?;

    Ok(TemplateSummary {
        id: row.get(0)?,
        author_id: row.get(1)?,
        author_name: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        topic: row.get(5)?,
        tags,
        mode: TemplateMode::parse(&mode).unwrap_or_default(),
        submission_count: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn index_for_search(tx: &Transaction, id: i64, draft: &TemplateDraft) -> rusqlite::Result<()> {
    tx.execute("DELETE FROM templates_fts WHERE rowid = ?", [id])?;
    tx.execute(
        "INSERT INTO templates_fts (rowid, title, description, topic, tags) VALUES (?, ?, ?, ?, ?)",
        params![id, draft.title, draft.description, draft.topic, draft.tags.join(" ")],
    )?;
    Ok(())
}

impl Database {
    pub fn create_template(&self, author_id: i64, draft: &TemplateDraft) -> AppResult<i64> {
        let columns = question_columns();
        let placeholders = vec!["?"; 8 + columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO templates (author_id, title, description, topic, tags, mode, created_at, updated_at, {})
             VALUES ({placeholders})",
            column_list(&columns)
        );

        let now = Utc::now().timestamp();
        let mut values: Vec<SqlValue> = vec![
            author_id.into(),
            draft.title.clone().into(),
            draft.description.clone().into(),
            draft.topic.clone().into(),
            serde_json::to_string(&draft.tags)?.into(),
            draft.mode.as_str().to_string().into(),
            now.into(),
            now.into(),
        ];
        values.extend(slot_values(&draft.slots, &columns));

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(&sql, params_from_iter(values))?;
        let id = tx.last_insert_rowid();
        index_for_search(&tx, id, draft)?;
        tx.commit()?;

        tracing::info!("Created template: {} ({})", draft.title, id);
        Ok(id)
    }

    pub fn get_template(&self, id: i64) -> AppResult<StoredTemplate> {
        let columns = question_columns();
        let sql = format!(
            "SELECT {SUMMARY_COLUMNS}, {} FROM {SUMMARY_FROM} WHERE t.id = ?",
            column_list(&columns)
        );

        let conn = self.conn()?;
        let template = conn
            .query_row(&sql, [id], |row| {
                Ok(StoredTemplate {
                    summary: summary_from_row(row)?,
                    slots: read_slot_row(row, SUMMARY_WIDTH, &columns)?,
                })
            })
            .optional()?;

        template.ok_or_else(|| AppError::NotFound(format!("Template not found: {id}")))
    }

    /// Rewrites every slot column, so questions dropped from `draft` are cleared.
    pub fn update_template(&self, id: i64, draft: &TemplateDraft) -> AppResult<()> {
        let columns = question_columns();
        let assignments = columns
            .iter()
            .map(|c| format!("{} = ?", c.name))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE templates SET title = ?, description = ?, topic = ?, tags = ?, mode = ?, updated_at = ?, {assignments}
             WHERE id = ?"
        );

        let mut values: Vec<SqlValue> = vec![
            draft.title.clone().into(),
            draft.description.clone().into(),
            draft.topic.clone().into(),
            serde_json::to_string(&draft.tags)?.into(),
            draft.mode.as_str().to_string().into(),
            Utc::now().timestamp().into(),
        ];
        values.extend(slot_values(&draft.slots, &columns));
        values.push(id.into());

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let updated = tx.execute(&sql, params_from_iter(values))?;
        if updated == 0 {
            return Err(AppError::NotFound(format!("Template not found: {id}")));
        }
        index_for_search(&tx, id, draft)?;
        tx.commit()?;

        tracing::info!("Updated template: {}", id);
        Ok(())
    }

    /// Deletes a template and, through the foreign key cascade, its forms.
    pub fn delete_template(&self, id: i64) -> AppResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM templates_fts WHERE rowid = ?", [id])?;
        let deleted = tx.execute("DELETE FROM templates WHERE id = ?", [id])?;
        if deleted == 0 {
            return Err(AppError::NotFound(format!("Template not found: {id}")));
        }

        tx.commit()?;
        tracing::info!("Deleted template: {}", id);
        Ok(())
    }

    /// Templates visible to `viewer`, most recently updated first.
    pub fn list_templates(
        &self,
        viewer: &Viewer,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<TemplateSummary>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {SUMMARY_COLUMNS} FROM {SUMMARY_FROM}
             WHERE (t.mode = 'public' OR t.author_id = ?1 OR ?2 = 1)
             ORDER BY t.updated_at DESC, t.id DESC
             LIMIT ?3 OFFSET ?4"
        ))?;
        let templates = stmt
            .query_map(
                params![viewer.id_param(), viewer.is_admin, limit, offset],
                summary_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(templates)
    }

    /// Runs an FTS5 `MATCH` expression against template metadata.
    /// Malformed expressions are reported as invalid requests.
    pub fn search_templates(
        &self,
        match_expression: &str,
        viewer: &Viewer,
        limit: i64,
    ) -> AppResult<Vec<TemplateSummary>> {
        let conn = self.conn()?;

        let result = conn
            .prepare(&format!(
                "SELECT {SUMMARY_COLUMNS} FROM {SUMMARY_FROM}
                 WHERE t.id IN (SELECT rowid FROM templates_fts WHERE templates_fts MATCH ?1)
                   AND (t.mode = 'public' OR t.author_id = ?2 OR ?3 = 1)
                 ORDER BY t.updated_at DESC, t.id DESC
                 LIMIT ?4"
            ))
            .and_then(|mut stmt| {
                let templates = stmt
                    .query_map(
                        params![match_expression, viewer.id_param(), viewer.is_admin, limit],
                        summary_from_row,
                    )?
                    .collect::<Result<Vec<_>, _>>();
                templates
            });

        // The statement itself is fixed, so a generic SQLITE_ERROR comes from the MATCH expression
        result.map_err(|e| match &e {
            rusqlite::Error::SqliteFailure(failure, _)
                if failure.code == rusqlite::ErrorCode::Unknown =>
            {
                AppError::InvalidRequest(format!("Invalid search query: {e}"))
            }
            _ => AppError::Database(e),
        })
    }

    /// Public templates with the most submissions.
    pub fn popular_templates(&self, limit: i64) -> AppResult<Vec<TemplateSummary>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {SUMMARY_COLUMNS} FROM {SUMMARY_FROM}
             WHERE t.mode = 'public'
             ORDER BY submission_count DESC, t.id DESC
             LIMIT ?"
        ))?;
        let templates = stmt
            .query_map([limit], summary_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(templates)
    }

    /// Tag usage across public templates, most used first.
    pub fn list_tags(&self) -> AppResult<Vec<TagCount>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT j.value, COUNT(*) AS uses
             FROM templates t, json_each(t.tags) j
             WHERE t.mode = 'public'
             GROUP BY j.value
             ORDER BY uses DESC, j.value ASC",
        )?;
        let tags = stmt
            .query_map([], |row| {
                Ok(TagCount {
                    tag: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tags)
    }
}
