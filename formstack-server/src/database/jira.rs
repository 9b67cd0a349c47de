use super::Database;
use crate::error::AppResult;
use formstack_models::{JiraTicket, TicketPriority};
use rusqlite::params;

impl Database {
    pub fn create_jira_ticket(&self, ticket: &JiraTicket) -> AppResult<i64> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO jira_tickets (user_id, issue_key, url, summary, priority, template_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                ticket.user_id,
                ticket.issue_key,
                ticket.url,
                ticket.summary,
                ticket.priority.as_str(),
                ticket.template_id,
                ticket.created_at,
            ],
        )?;

        let id = conn.last_insert_rowid();
        tracing::info!("Recorded Jira ticket {} for user {}", ticket.issue_key, ticket.user_id);
        Ok(id)
    }

    pub fn list_jira_tickets(&self, user_id: i64) -> AppResult<Vec<JiraTicket>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, user_id, issue_key, url, summary, priority, template_id, created_at
             FROM jira_tickets WHERE user_id = ?
             ORDER BY created_at DESC, id DESC",
        )?;
        let tickets = stmt
            .query_map([user_id], |row| {
                let priority: String = row.get(5)?;
                Ok(JiraTicket {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    issue_key: row.get(2)?,
                    url: row.get(3)?,
                    summary: row.get(4)?,
                    priority: TicketPriority::parse(&priority).unwrap_or(TicketPriority::Average),
                    template_id: row.get(6)?,
                    created_at: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tickets)
    }
}
