use super::{column_list, read_slot_row, slot_values, Database};
use crate::error::{AppError, AppResult};
use crate::slots::{answer_columns, decode_answers, SlotRow};
use chrono::Utc;
use formstack_models::{Answer, FormSummary};
use rusqlite::{params_from_iter, types::Value as SqlValue, OptionalExtension};

#[derive(Debug, Clone)]
pub struct StoredForm {
    pub summary: FormSummary,
    pub slots: SlotRow,
}

impl StoredForm {
    pub fn answers(&self) -> Vec<Answer> {
        decode_answers(&self.slots)
    }
}

const SUMMARY_COLUMNS: &str =
    "f.id, f.template_id, t.title, f.user_id, u.name, f.created_at, f.updated_at";
const SUMMARY_WIDTH: usize = 7;
const SUMMARY_FROM: &str =
    "forms f JOIN templates t ON t.id = f.template_id JOIN users u ON u.id = f.user_id";

fn summary_from_row(row: &rusqlite::Row) -> rusqlite::Result<FormSummary> {
    Ok(FormSummary {
        id: row.get(0)?,
        template_id: row.get(1)?,
        template_title: row.get(2)?,
        user_id: row.get(3)?,
        user_name: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

impl Database {
    /// Stores a user's submission for a template. The existence check and the
    /// insert are one statement, so a second submission always conflicts.
    pub fn create_form(&self, template_id: i64, user_id: i64, slots: &SlotRow) -> AppResult<i64> {
        let columns = answer_columns();
        let placeholders = vec!["?"; 4 + columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO forms (template_id, user_id, created_at, updated_at, {})
             SELECT {placeholders}
             WHERE NOT EXISTS (SELECT 1 FROM forms WHERE template_id = ? AND user_id = ?)",
            column_list(&columns)
        );

        let now = Utc::now().timestamp();
        let mut values: Vec<SqlValue> =
            vec![template_id.into(), user_id.into(), now.into(), now.into()];
        values.extend(slot_values(slots, &columns));
        values.extend([SqlValue::from(template_id), SqlValue::from(user_id)]);

        let conn = self.conn()?;
        let inserted = conn.execute(&sql, params_from_iter(values))?;
        if inserted == 0 {
            return Err(AppError::Conflict(format!(
                "User {user_id} has already submitted template {template_id}"
            )));
        }
        let id = conn.last_insert_rowid();

        tracing::info!(
            "Created form {} for template {} by user {}",
            id,
            template_id,
            user_id
        );
        Ok(id)
    }

    pub fn get_form(&self, id: i64) -> AppResult<StoredForm> {
        let columns = answer_columns();
        let sql = format!(
            "SELECT {SUMMARY_COLUMNS}, {} FROM {SUMMARY_FROM} WHERE f.id = ?",
            column_list(&columns)
        );

        let conn = self.conn()?;
        let form = conn
            .query_row(&sql, [id], |row| {
                Ok(StoredForm {
                    summary: summary_from_row(row)?,
                    slots: read_slot_row(row, SUMMARY_WIDTH, &columns)?,
                })
            })
            .optional()?;

        form.ok_or_else(|| AppError::NotFound(format!("Form not found: {id}")))
    }

    pub fn update_form(&self, id: i64, slots: &SlotRow) -> AppResult<()> {
        let columns = answer_columns();
        let assignments = columns
            .iter()
            .map(|c| format!("{} = ?", c.name))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("UPDATE forms SET updated_at = ?, {assignments} WHERE id = ?");

        let mut values: Vec<SqlValue> = vec![Utc::now().timestamp().into()];
        values.extend(slot_values(slots, &columns));
        values.push(id.into());

        let conn = self.conn()?;
        let updated = conn.execute(&sql, params_from_iter(values))?;
        if updated == 0 {
            return Err(AppError::NotFound(format!("Form not found: {id}")));
        }

        tracing::info!("Updated form: {}", id);
        Ok(())
    }

    pub fn delete_form(&self, id: i64) -> AppResult<()> {
        let conn = self.conn()?;

        let deleted = conn.execute("DELETE FROM forms WHERE id = ?", [id])?;
        if deleted == 0 {
            return Err(AppError::NotFound(format!("Form not found: {id}")));
        }

        tracing::info!("Deleted form: {}", id);
        Ok(())
    }

    pub fn list_forms_by_user(&self, user_id: i64) -> AppResult<Vec<FormSummary>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {SUMMARY_COLUMNS} FROM {SUMMARY_FROM}
             WHERE f.user_id = ?
             ORDER BY f.updated_at DESC, f.id DESC"
        ))?;
        let forms = stmt
            .query_map([user_id], summary_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(forms)
    }

    /// Every submission of a template, answers included.
    pub fn list_forms_by_template(&self, template_id: i64) -> AppResult<Vec<StoredForm>> {
        let columns = answer_columns();
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {SUMMARY_COLUMNS}, {} FROM {SUMMARY_FROM}
             WHERE f.template_id = ?
             ORDER BY f.created_at ASC, f.id ASC",
            column_list(&columns)
        ))?;
        let forms = stmt
            .query_map([template_id], |row| {
                Ok(StoredForm {
                    summary: summary_from_row(row)?,
                    slots: read_slot_row(row, SUMMARY_WIDTH, &columns)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(forms)
    }

    pub fn list_all_forms(&self, limit: i64, offset: i64) -> AppResult<Vec<FormSummary>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {SUMMARY_COLUMNS} FROM {SUMMARY_FROM}
             ORDER BY f.updated_at DESC, f.id DESC
             LIMIT ? OFFSET ?"
        ))?;
        let forms = stmt
            .query_map([limit, offset], summary_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(forms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::TemplateDraft;
    use crate::slots::{encode_answer_row, encode_question_row};
    use formstack_models::{Question, TemplateMode, TypeTag, User};
    use serde_json::json;
    use std::sync::{Arc, Barrier};
    use std::thread;

    struct Fixture {
        db: Database,
        user_id: i64,
        template_id: i64,
    }

    fn setup() -> Fixture {
        let db = Database::in_memory().unwrap();
        let user_id = db
            .create_user(&User::new("filler".into(), "filler@example.com".into(), "hash".into()))
            .unwrap();
        let questions = vec![
            Question::new(TypeTag::Int, "Age", ""),
            Question::new(TypeTag::Bool, "Agree?", ""),
        ];
        let template_id = db
            .create_template(
                user_id,
                &TemplateDraft {
                    title: "Survey".into(),
                    description: String::new(),
                    topic: String::new(),
                    tags: vec![],
                    mode: TemplateMode::Public,
                    slots: encode_question_row(&questions),
                },
            )
            .unwrap();

        Fixture {
            db,
            user_id,
            template_id,
        }
    }

    #[test]
    fn test_form_round_trip_keeps_answer_types() {
        let f = setup();
        let answers = vec![
            Answer::new(TypeTag::Int, 30),
            Answer::new(TypeTag::Bool, true),
        ];

        let id = f
            .db
            .create_form(f.template_id, f.user_id, &encode_answer_row(&answers))
            .unwrap();
        let form = f.db.get_form(id).unwrap();

        assert_eq!(form.summary.template_title, "Survey");
        assert_eq!(form.summary.user_name, "filler");
        assert_eq!(form.answers(), answers);
        assert_eq!(form.slots["customBool1Answer"], json!(true));
        assert_eq!(form.slots["customInt2Answer"], serde_json::Value::Null);
    }

    #[test]
    fn test_update_and_delete() {
        let f = setup();
        let id = f
            .db
            .create_form(
                f.template_id,
                f.user_id,
                &encode_answer_row(&[Answer::new(TypeTag::Int, 1)]),
            )
            .unwrap();

        f.db.update_form(id, &encode_answer_row(&[Answer::new(TypeTag::Bool, false)]))
            .unwrap();
        assert_eq!(
            f.db.get_form(id).unwrap().answers(),
            vec![Answer::new(TypeTag::Bool, false)]
        );

        f.db.delete_form(id).unwrap();
        assert!(matches!(f.db.get_form(id), Err(AppError::NotFound(_))));
        assert!(matches!(f.db.delete_form(id), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_submission_count_and_cascade() {
        let f = setup();
        f.db.create_form(f.template_id, f.user_id, &SlotRow::new())
            .unwrap();

        let template = f.db.get_template(f.template_id).unwrap();
        assert_eq!(template.summary.submission_count, 1);
        assert_eq!(f.db.list_forms_by_template(f.template_id).unwrap().len(), 1);
        assert_eq!(f.db.list_forms_by_user(f.user_id).unwrap().len(), 1);

        f.db.delete_template(f.template_id).unwrap();
        assert!(f.db.list_all_forms(10, 0).unwrap().is_empty());
    }

    #[test]
    fn test_second_submission_conflicts() {
        let f = setup();
        let first = f
            .db
            .create_form(f.template_id, f.user_id, &SlotRow::new())
            .unwrap();

        let second = f.db.create_form(
            f.template_id,
            f.user_id,
            &encode_answer_row(&[Answer::new(TypeTag::Int, 2)]),
        );
        assert!(matches!(second, Err(AppError::Conflict(_))));

        // The original submission is untouched
        let forms = f.db.list_forms_by_user(f.user_id).unwrap();
        assert_eq!(forms.len(), 1);
        assert_eq!(forms[0].id, first);
        assert!(f.db.get_form(first).unwrap().answers().is_empty());
    }

    #[test]
    fn test_concurrent_submissions_store_one_form() {
        let f = setup();
        let db = Arc::new(f.db);
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let db = Arc::clone(&db);
                let barrier = Arc::clone(&barrier);
                let (template_id, user_id) = (f.template_id, f.user_id);
                thread::spawn(move || {
                    barrier.wait();
                    db.create_form(template_id, user_id, &SlotRow::new())
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, AppError::Conflict(_))));
        assert_eq!(db.list_forms_by_user(f.user_id).unwrap().len(), 1);
    }
}
